mod confidence;
mod fallback;
mod intent;

pub use confidence::{ConfidenceRouter, RouteDecision};
pub use fallback::FallbackTemplates;
pub use intent::{Intent, IntentClassifier};
