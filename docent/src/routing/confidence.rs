use crate::config::RetrievalConfig;
use crate::error::{DocentError, Result};
use crate::models::{ConfidenceTier, ScoredChunk};

use super::{FallbackTemplates, Intent, IntentClassifier};

#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub tier: ConfidenceTier,
    pub intent: Intent,
    pub top_score: f32,
    /// Set only for `Low`; the caller returns it instead of generating.
    pub fallback: Option<String>,
}

impl RouteDecision {
    pub fn should_generate(&self) -> bool {
        self.fallback.is_none()
    }
}

/// Maps ranker scores to a confidence tier and picks a fallback for low tiers.
#[derive(Debug, Clone)]
pub struct ConfidenceRouter {
    high_threshold: f32,
    medium_threshold: f32,
    intents: IntentClassifier,
    templates: FallbackTemplates,
}

impl ConfidenceRouter {
    pub fn new(config: &RetrievalConfig, templates: FallbackTemplates) -> Result<Self> {
        let (high, medium) = (config.high_threshold, config.medium_threshold);
        if !high.is_finite() || !medium.is_finite() || high < medium {
            return Err(DocentError::InvalidArgument(format!(
                "Confidence thresholds must satisfy high >= medium (got high={high}, medium={medium})"
            )));
        }

        Ok(Self {
            high_threshold: high,
            medium_threshold: medium,
            intents: IntentClassifier::new()?,
            templates,
        })
    }

    pub fn tier_for(&self, top_score: f32) -> ConfidenceTier {
        if top_score >= self.high_threshold {
            ConfidenceTier::High
        } else if top_score >= self.medium_threshold {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn classify(&self, results: &[ScoredChunk], query: &str) -> RouteDecision {
        let intent = self.intents.classify(query);
        let top_score = results.first().map(|r| r.score);
        let tier = top_score.map_or(ConfidenceTier::Low, |s| self.tier_for(s));

        let fallback = match tier {
            ConfidenceTier::Low => Some(self.templates.for_intent(intent)),
            ConfidenceTier::High | ConfidenceTier::Medium => None,
        };

        RouteDecision {
            tier,
            intent,
            top_score: top_score.unwrap_or(0.0),
            fallback,
        }
    }

    pub fn templates(&self) -> &FallbackTemplates {
        &self.templates
    }
}
