use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{DocentError, Result};

/// Coarse purpose of a visitor message, used to pick a fallback template.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Pricing,
    Contact,
    Unknown,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pricing => write!(f, "pricing"),
            Self::Contact => write!(f, "contact"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

const PRICING_KEYWORDS: &[&str] = &[
    "price",
    "prices",
    "pricing",
    "cost",
    "costs",
    "fee",
    "fees",
    "rate",
    "rates",
    "quote",
    "budget",
    "how much",
    "expensive",
    "cheap",
    "afford",
];

const CONTACT_KEYWORDS: &[&str] = &[
    "contact",
    "email",
    "phone",
    "call",
    "reach",
    "talk to",
    "speak",
    "human",
    "person",
    "representative",
    "schedule",
    "consultation",
    "meeting",
    "book",
];

/// Keyword matcher over whole words, case-insensitive.
///
/// A message asking to reach someone is treated as contact intent even when it
/// also mentions price.
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    pricing: Regex,
    contact: Regex,
}

impl IntentClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            pricing: keyword_pattern(PRICING_KEYWORDS)?,
            contact: keyword_pattern(CONTACT_KEYWORDS)?,
        })
    }

    pub fn classify(&self, query: &str) -> Intent {
        if self.contact.is_match(query) {
            Intent::Contact
        } else if self.pricing.is_match(query) {
            Intent::Pricing
        } else {
            Intent::Unknown
        }
    }
}

fn keyword_pattern(keywords: &[&str]) -> Result<Regex> {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    RegexBuilder::new(&format!(r"\b(?:{alternation})\b"))
        .case_insensitive(true)
        .build()
        .map_err(|e| DocentError::Internal(format!("Invalid intent pattern: {e}")))
}
