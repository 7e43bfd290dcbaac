//! Prompt builder: grounding policy as system message + labelled context block.

use rag_store::RetrievedContext;

/// System instructions implementing the answer policy.
pub const SYSTEM_PROMPT: &str = r#"You are an assistant that answers questions using retrieved company documents.

Follow these steps for every question:
1. Classify the provided context as RELEVANT, PARTIALLY RELEVANT or NOT RELEVANT to the question. An empty context counts as NOT RELEVANT.
2. If the context is RELEVANT or PARTIALLY RELEVANT, answer only from the context. Do not add outside knowledge.
3. If the context is NOT RELEVANT, you may answer from general knowledge, and you must say clearly that the answer does not come from the provided documents.
4. If you are not confident, say that you do not know. Never invent facts, numbers or sources.
5. Format the reply as: a short answer, then a concise explanation, then the sources you used as [Source: <filename>]. List sources only when the answer is based on the documents."#;

/// Rendered in place of context blocks when retrieval returned nothing.
pub const NO_CONTEXT_MARKER: &str = "(no documents retrieved)";

/// Renders `Source: …\nContent: …` blocks separated by a blank line.
pub fn format_context(context: &[RetrievedContext]) -> String {
    if context.is_empty() {
        return NO_CONTEXT_MARKER.to_string();
    }
    context
        .iter()
        .map(|c| format!("Source: {}\nContent: {}", c.source, c.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the user message: context section followed by the question.
///
/// # Example
/// ```
/// # use contextor::prompt::build_user_prompt;
/// let prompt = build_user_prompt("How to X?", &[]);
/// assert!(prompt.starts_with("Context:\n"));
/// assert!(prompt.ends_with("Question: How to X?"));
/// ```
pub fn build_user_prompt(query: &str, context: &[RetrievedContext]) -> String {
    format!("Context:\n{}\n\nQuestion: {}", format_context(context), query.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(source: &str, content: &str) -> RetrievedContext {
        RetrievedContext {
            content: content.into(),
            source: source.into(),
            score: 0.5,
        }
    }

    #[test]
    fn blocks_keep_rank_order_and_labels() {
        let prompt = build_user_prompt(
            " What does Error 504 mean? ",
            &[
                ctx("errors.txt", "Error 504: gateway timeout."),
                ctx("Unknown", "Retry after 30 seconds."),
            ],
        );
        assert_eq!(
            prompt,
            "Context:\nSource: errors.txt\nContent: Error 504: gateway timeout.\n\n\
             Source: Unknown\nContent: Retry after 30 seconds.\n\n\
             Question: What does Error 504 mean?"
        );
    }

    #[test]
    fn empty_context_is_explicit() {
        let prompt = build_user_prompt("Anything?", &[]);
        assert!(prompt.contains(NO_CONTEXT_MARKER));
    }

    #[test]
    fn system_prompt_covers_every_policy_step() {
        for needle in [
            "RELEVANT",
            "NOT RELEVANT",
            "only from the context",
            "general knowledge",
            "do not know",
            "[Source: <filename>]",
        ] {
            assert!(SYSTEM_PROMPT.contains(needle), "missing {needle}");
        }
    }
}
