mod ranker;
mod similarity;

pub use ranker::{VectorIndex, DEFAULT_TOP_K};
pub use similarity::{cosine_similarity, l2_norm};
