use serde_json::Value;

use crate::error::{DocentError, Result};
use crate::models::{Category, Chunk};

use super::KnowledgeDocument;

/// Split a knowledge document into retrievable chunks.
///
/// One chunk per logical sub-entity: the company overview, each service (plus
/// its process steps when present), each pricing tier, each FAQ entry, each
/// leadership member and the combined contact details. Each chunk repeats the
/// name of the entity it belongs to so it reads standalone.
///
/// `company`, `services` and `contact` are required; the contact section must
/// name at least one email, website or phone entry.
pub fn segment(document: &KnowledgeDocument) -> Result<Vec<Chunk>> {
    let company = document
        .company
        .as_ref()
        .ok_or_else(|| missing_section("company"))?;
    if document.services.is_none() {
        return Err(missing_section("services"));
    }
    if document.contact.is_none() {
        return Err(missing_section("contact"));
    }
    if document.contact_path().is_empty() {
        return Err(DocentError::Segmentation(
            "Contact section has no email, website or phone entry".to_string(),
        ));
    }

    let mut chunks = Vec::new();

    let mut overview = vec![
        format!("Company: {}", company.name),
        clause(&company.description).to_string(),
    ];
    if let Some(mission) = &company.mission {
        overview.push(format!("Mission: {}", clause(mission)));
    }
    if let Some(vision) = &company.vision {
        overview.push(format!("Vision: {}", clause(vision)));
    }
    chunks.push(
        Chunk::new("company_overview", Category::Company, sentences(&overview))
            .with_metadata("type", "overview")
            .with_metadata("section", "company"),
    );

    for (key, service) in document.services()? {
        let mut content = format!("{}: {}.", service.name, clause(&service.description));
        if !service.details.is_empty() {
            content.push_str(&format!(" Details: {}", service.details.join(" ")));
        }
        chunks.push(
            Chunk::new(format!("service_{key}_main"), Category::Services, content)
                .with_metadata("type", "service")
                .with_metadata("service_name", key.as_str()),
        );

        if !service.process.is_empty() {
            chunks.push(
                Chunk::new(
                    format!("service_{key}_process"),
                    Category::Services,
                    format!("{} process: {}", service.name, service.process.join(" -> ")),
                )
                .with_metadata("type", "process")
                .with_metadata("service_name", key.as_str()),
            );
        }
    }

    if let Some(pricing) = &document.pricing {
        for (pricing_type, info) in pricing {
            let details = match info {
                Value::String(s) => s.clone(),
                Value::Object(fields) => fields
                    .iter()
                    .filter_map(|(k, v)| v.as_str().map(|v| format!("{k}: {v}")))
                    .collect::<Vec<_>>()
                    .join(". "),
                _ => String::new(),
            };
            if details.trim().is_empty() {
                tracing::debug!(pricing_type = %pricing_type, "Skipping pricing entry without text");
                continue;
            }
            chunks.push(
                Chunk::new(
                    format!("pricing_{pricing_type}"),
                    Category::Pricing,
                    format!("Pricing - {pricing_type}: {details}"),
                )
                .with_metadata("type", "pricing")
                .with_metadata("pricing_type", pricing_type.as_str()),
            );
        }
    }

    if let Some(faq) = &document.faq {
        for (idx, entry) in faq.common_questions.iter().enumerate() {
            chunks.push(
                Chunk::new(
                    format!("faq_{idx}"),
                    Category::Faq,
                    format!("Q: {} A: {}", entry.question.trim(), entry.answer.trim()),
                )
                .with_metadata("type", "faq")
                .with_metadata("category", entry.category.as_deref().unwrap_or("general")),
            );
        }
    }

    for (role, member) in document.team_members()? {
        let content = match member.background.as_deref().map(str::trim) {
            Some(background) if !background.is_empty() => {
                format!("{}, {}: {background}", member.name, member.title)
            }
            _ => format!("{}, {}", member.name, member.title),
        };
        chunks.push(
            Chunk::new(format!("team_{role}"), Category::Team, content)
                .with_metadata("type", "leadership")
                .with_metadata("role", role.as_str()),
        );
    }

    let contact = document
        .contact_pairs()
        .into_iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join(". ");
    chunks.push(
        Chunk::new(
            "contact_info",
            Category::Contact,
            format!("Contact information: {contact}"),
        )
        .with_metadata("type", "contact"),
    );

    tracing::debug!(chunks = chunks.len(), "Segmented knowledge document");
    Ok(chunks)
}

fn missing_section(name: &str) -> DocentError {
    DocentError::Segmentation(format!("Knowledge document is missing required section '{name}'"))
}

/// Text without its trailing full stop, so clauses can be joined uniformly.
fn clause(text: &str) -> &str {
    text.trim().trim_end_matches('.')
}

fn sentences(parts: &[impl AsRef<str>]) -> String {
    let joined = parts
        .iter()
        .map(|p| p.as_ref().trim().trim_end_matches('.'))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(". ");
    format!("{joined}.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> KnowledgeDocument {
        serde_json::from_value(json!({
            "company": {
                "name": "Acme Talent",
                "description": "A recruitment and business support company.",
                "mission": "Connect people with work",
                "vision": "Talent everywhere"
            },
            "services": {
                "rpo": {
                    "name": "Recruitment Process Outsourcing (RPO)",
                    "description": "End-to-end hiring handled for you",
                    "details": ["60% faster hiring.", "95% retention."],
                    "process": ["Discovery", "Sourcing", "Placement"]
                },
                "bpo": {
                    "name": "Business Process Outsourcing",
                    "description": "Back-office support"
                }
            },
            "pricing": {
                "rpo": {"model": "Per hire", "fees": "15% lower than market average", "tiers": 3},
                "custom": "Quoted per engagement"
            },
            "faq": {
                "common_questions": [
                    {"question": "How fast can you fill roles?", "answer": "Usually within 3 weeks.", "category": "timeline"},
                    {"question": "Do you hire remotely?", "answer": "Yes."}
                ]
            },
            "team": {
                "leadership": {
                    "founder": {"name": "Jordan Lee", "title": "Founder & CEO", "background": "20 years in staffing."}
                }
            },
            "contact": {
                "general": {"email": "info@acme.example", "website": "www.acme.example"}
            }
        }))
        .expect("sample document")
    }

    #[test]
    fn one_chunk_per_sub_entity() {
        let chunks = segment(&sample()).unwrap();
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "company_overview",
                "service_rpo_main",
                "service_rpo_process",
                "service_bpo_main",
                "pricing_rpo",
                "pricing_custom",
                "faq_0",
                "faq_1",
                "team_founder",
                "contact_info",
            ]
        );
    }

    #[test]
    fn company_overview_reads_as_sentences() {
        let chunks = segment(&sample()).unwrap();
        assert_eq!(
            chunks[0].content,
            "Company: Acme Talent. A recruitment and business support company. Mission: Connect people with work. Vision: Talent everywhere."
        );
        assert_eq!(chunks[0].category, Category::Company);
    }

    #[test]
    fn service_chunks_carry_service_name() {
        let chunks = segment(&sample()).unwrap();
        let main = &chunks[1];
        assert!(main.content.starts_with("Recruitment Process Outsourcing (RPO): "));
        assert!(main.content.contains("60% faster hiring."));
        assert_eq!(main.metadata.get("service_name").map(String::as_str), Some("rpo"));

        let process = &chunks[2];
        assert_eq!(
            process.content,
            "Recruitment Process Outsourcing (RPO) process: Discovery -> Sourcing -> Placement"
        );
    }

    #[test]
    fn pricing_keeps_only_text_fields() {
        let chunks = segment(&sample()).unwrap();
        let rpo = chunks.iter().find(|c| c.id == "pricing_rpo").unwrap();
        assert_eq!(
            rpo.content,
            "Pricing - rpo: model: Per hire. fees: 15% lower than market average"
        );
        let custom = chunks.iter().find(|c| c.id == "pricing_custom").unwrap();
        assert_eq!(custom.content, "Pricing - custom: Quoted per engagement");
    }

    #[test]
    fn faq_defaults_category_to_general() {
        let chunks = segment(&sample()).unwrap();
        let faq = chunks.iter().find(|c| c.id == "faq_1").unwrap();
        assert_eq!(faq.content, "Q: Do you hire remotely? A: Yes.");
        assert_eq!(faq.metadata.get("category").map(String::as_str), Some("general"));
    }

    #[test]
    fn missing_required_section_fails() {
        let mut document = sample();
        document.services = None;
        let err = segment(&document).unwrap_err();
        assert!(matches!(err, DocentError::Segmentation(ref msg) if msg.contains("services")));
    }

    #[test]
    fn contact_without_reachable_channel_fails() {
        let mut document = sample();
        document.contact = serde_json::from_value(json!({"office": {"hours": "9-5"}})).unwrap();
        assert!(matches!(segment(&document), Err(DocentError::Segmentation(_))));
    }

    #[test]
    fn optional_sections_may_be_absent() {
        let mut document = sample();
        document.pricing = None;
        document.faq = None;
        document.team = None;
        let chunks = segment(&document).unwrap();
        assert_eq!(chunks.len(), 5);
        assert_eq!(chunks.last().unwrap().category, Category::Contact);
    }

    #[test]
    fn segmentation_is_deterministic() {
        let document = sample();
        assert_eq!(segment(&document).unwrap(), segment(&document).unwrap());
    }
}
