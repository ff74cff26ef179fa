//! Prompt templates for answer generation
//!
//! These templates use basic `format!()` interpolation for type safety.

/// System instruction for the visitor-facing assistant.
///
/// # Arguments
/// * `company` - Company name taken from the knowledge document
/// * `description` - One-line description of what the company does
/// * `contact` - Contact sentence fragment, e.g. "email us at info@acme.example"
///
/// # Example
/// ```
/// use docent::llm::prompts::system_instruction;
///
/// let prompt = system_instruction("Acme", "A staffing company.", "email us at hi@acme.example");
/// assert!(prompt.contains("Acme"));
/// assert!(prompt.contains("hi@acme.example"));
/// ```
pub fn system_instruction(company: &str, description: &str, contact: &str) -> String {
    let description = description.trim().trim_end_matches('.');
    format!(
        r#"You are a helpful AI assistant for {company}. {description}.

Your role is to:
1. Answer questions about {company}'s services, pricing, timelines and processes
2. Help visitors schedule consultations and find contact information
3. Maintain a professional, friendly, and helpful tone

Always base your answers on the provided context from the knowledge base. Do not invent facts, prices or commitments that the context does not state.

When you don't know something specific, be honest and encourage the visitor to {contact}."#
    )
}

/// Numbered context blocks, one per retrieved chunk.
pub fn format_context(chunks: &[String]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, content)| format!("[Context {}]: {content}", i + 1))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User turn sent to the model: retrieved context followed by the question.
pub fn answer_prompt(context: &[String], message: &str) -> String {
    let context = if context.is_empty() {
        "(no relevant context found)".to_string()
    } else {
        format_context(context)
    };

    format!(
        r#"Context from the knowledge base:
{context}

User question: {message}

Please answer the user's question using the provided context. If the context doesn't contain enough information, acknowledge this and suggest contacting the team directly."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_blocks_are_numbered() {
        let context = vec!["RPO fees are 15% lower.".to_string(), "BPO covers payroll.".to_string()];
        assert_eq!(
            format_context(&context),
            "[Context 1]: RPO fees are 15% lower.\n\n[Context 2]: BPO covers payroll."
        );
    }

    #[test]
    fn test_answer_prompt_contains_question_and_context() {
        let prompt = answer_prompt(
            &["RPO fees are 15% lower.".to_string()],
            "How much does RPO cost?",
        );
        assert!(prompt.contains("[Context 1]: RPO fees are 15% lower."));
        assert!(prompt.contains("User question: How much does RPO cost?"));
        assert!(prompt.contains("contacting the team directly"));
    }

    #[test]
    fn test_answer_prompt_without_context() {
        let prompt = answer_prompt(&[], "Hello?");
        assert!(prompt.contains("no relevant context found"));
    }

    #[test]
    fn test_system_instruction_does_not_double_full_stop() {
        let prompt = system_instruction("Acme", "A staffing company.", "visit acme.example");
        assert!(prompt.contains("for Acme. A staffing company.\n"));
        assert!(prompt.ends_with("encourage the visitor to visit acme.example."));
    }
}
