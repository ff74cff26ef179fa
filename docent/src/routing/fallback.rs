use crate::knowledge::ContactPath;

use super::Intent;

/// Canned replies used instead of the generative model. Every text names a way
/// to reach a person.
#[derive(Debug, Clone)]
pub struct FallbackTemplates {
    company: String,
    contact: String,
}

impl FallbackTemplates {
    pub fn new(company: impl Into<String>, contact: &ContactPath) -> Self {
        Self {
            company: company.into(),
            contact: contact.describe(),
        }
    }

    /// Reply for a low-confidence retrieval, chosen by intent.
    pub fn for_intent(&self, intent: Intent) -> String {
        match intent {
            Intent::Pricing => format!(
                "Pricing at {} depends on the scope of your needs, so I'd rather not guess. \
                 For an accurate quote, please {}.",
                self.company, self.contact
            ),
            Intent::Contact => format!(
                "You can reach the {} team directly: {}. We're happy to set up a consultation.",
                self.company, self.contact
            ),
            Intent::Unknown => format!(
                "I'm not sure I have the right information to answer that. \
                 For help from our team, please {}.",
                self.contact
            ),
        }
    }

    /// Reply used when an external call failed and no answer could be produced.
    pub fn service_error(&self) -> String {
        format!(
            "I'm having trouble answering right now. Please try again in a moment, \
             or {} and the {} team will help you directly.",
            self.contact, self.company
        )
    }

    /// Appended to medium-confidence answers.
    pub fn handoff_suggestion(&self) -> String {
        format!(
            "If you need more detail, our team can help: {}.",
            self.contact
        )
    }

    pub fn contact(&self) -> &str {
        &self.contact
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> FallbackTemplates {
        FallbackTemplates::new(
            "Acme Talent",
            &ContactPath {
                email: Some("info@acme.example".into()),
                website: Some("www.acme.example".into()),
                phone: None,
            },
        )
    }

    #[test]
    fn every_template_names_the_contact_path() {
        let t = templates();
        let texts = [
            t.for_intent(Intent::Pricing),
            t.for_intent(Intent::Contact),
            t.for_intent(Intent::Unknown),
            t.service_error(),
            t.handoff_suggestion(),
        ];
        for text in texts {
            assert!(text.contains("info@acme.example"), "{text}");
            assert!(text.contains("www.acme.example"), "{text}");
        }
    }

    #[test]
    fn templates_differ_by_intent() {
        let t = templates();
        assert_ne!(t.for_intent(Intent::Pricing), t.for_intent(Intent::Unknown));
        assert_ne!(t.for_intent(Intent::Contact), t.for_intent(Intent::Unknown));
    }

    #[test]
    fn contact_sentence_joins_channels() {
        assert_eq!(
            templates().contact(),
            "email us at info@acme.example or visit www.acme.example"
        );
    }
}
