pub static ANSWER_SYSTEM_PROMPT: &str =
    "You answer user questions based on provided context. Only use the supplied \
     document excerpts; if they do not contain the answer, say so instead of guessing.";

/// Renders the fixed instructional template around the retrieved context and
/// the user's question.
pub fn create_user_message(context: &str, question: &str) -> String {
    format!(
        r#"You are a helpful assistant. Answer the question based on the context below.

Context:
{context}

Question:
{question}

Answer:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_embeds_context_and_question() {
        let message = create_user_message("chunk one chunk two", "what is this about?");

        assert!(message.contains("Context:\nchunk one chunk two"));
        assert!(message.contains("Question:\nwhat is this about?"));
        assert!(message.ends_with("Answer:"));
    }
}
