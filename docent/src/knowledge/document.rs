//! Structured knowledge document as stored on disk (JSON).
//!
//! Keyed sections (`services`, `pricing`, `team.leadership`, `contact`) stay
//! as ordered JSON maps so chunk order follows document order; their entries
//! are decoded on demand and a malformed entry is reported with its key.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DocentError, Result};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub services: Option<Map<String, Value>>,
    #[serde(default)]
    pub pricing: Option<Map<String, Value>>,
    #[serde(default)]
    pub faq: Option<Faq>,
    #[serde(default)]
    pub team: Option<Team>,
    #[serde(default)]
    pub contact: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub mission: Option<String>,
    #[serde(default)]
    pub vision: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub details: Vec<String>,
    #[serde(default)]
    pub process: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Faq {
    #[serde(default)]
    pub common_questions: Vec<FaqEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Team {
    #[serde(default)]
    pub leadership: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub background: Option<String>,
}

/// Ways a visitor can reach a human. At least one field is always set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPath {
    pub email: Option<String>,
    pub website: Option<String>,
    pub phone: Option<String>,
}

impl ContactPath {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.website.is_none() && self.phone.is_none()
    }

    /// Values from `overrides` win field by field.
    pub fn overridden_by(mut self, overrides: &ContactPath) -> Self {
        if overrides.email.is_some() {
            self.email = overrides.email.clone();
        }
        if overrides.website.is_some() {
            self.website = overrides.website.clone();
        }
        if overrides.phone.is_some() {
            self.phone = overrides.phone.clone();
        }
        self
    }

    /// Human-readable "how to reach us" sentence fragment.
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if let Some(email) = &self.email {
            parts.push(format!("email us at {email}"));
        }
        if let Some(phone) = &self.phone {
            parts.push(format!("call {phone}"));
        }
        if let Some(website) = &self.website {
            parts.push(format!("visit {website}"));
        }

        match parts.len() {
            0 => String::new(),
            1 => parts.remove(0),
            _ => {
                let last = parts.pop().unwrap_or_default();
                format!("{} or {last}", parts.join(", "))
            }
        }
    }
}

impl KnowledgeDocument {
    pub fn services(&self) -> Result<Vec<(String, Service)>> {
        decode_entries(self.services.as_ref(), "services")
    }

    pub fn team_members(&self) -> Result<Vec<(String, TeamMember)>> {
        decode_entries(self.team.as_ref().map(|t| &t.leadership), "team.leadership")
    }

    /// Flattened `(key, value)` string pairs of the contact section.
    ///
    /// Accepts both nested sections (`{"office": {"email": ...}}`) and
    /// top-level string values.
    pub fn contact_pairs(&self) -> Vec<(String, String)> {
        let Some(contact) = &self.contact else {
            return Vec::new();
        };

        let mut pairs = Vec::new();
        for (key, value) in contact {
            match value {
                Value::String(s) => pairs.push((key.clone(), s.clone())),
                Value::Object(details) => {
                    for (k, v) in details {
                        if let Value::String(s) = v {
                            pairs.push((k.clone(), s.clone()));
                        }
                    }
                }
                _ => {}
            }
        }
        pairs
    }

    /// The first email, website and phone entry found in the contact section.
    pub fn contact_path(&self) -> ContactPath {
        let mut path = ContactPath::default();
        for (key, value) in self.contact_pairs() {
            let key = key.to_lowercase();
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let slot = if key.contains("email") {
                &mut path.email
            } else if key.contains("phone") {
                &mut path.phone
            } else if key.contains("website") || key.contains("url") || key == "web" {
                &mut path.website
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(value.to_string());
            }
        }
        path
    }
}

fn decode_entries<T: DeserializeOwned>(
    section: Option<&Map<String, Value>>,
    label: &str,
) -> Result<Vec<(String, T)>> {
    let Some(section) = section else {
        return Ok(Vec::new());
    };

    section
        .iter()
        .map(|(key, value)| {
            serde_json::from_value(value.clone())
                .map(|entry| (key.clone(), entry))
                .map_err(|e| DocentError::Segmentation(format!("Invalid {label} entry '{key}': {e}")))
        })
        .collect()
}
