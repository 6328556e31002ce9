#![allow(clippy::missing_docs_in_private_items)]

pub mod prompt;

use std::sync::Arc;

use async_openai::types::{
    ChatCompletionRequestSystemMessage, ChatCompletionRequestUserMessage,
    CreateChatCompletionRequestArgs,
};
use tracing::{debug, error};

use common::{
    error::AppError,
    utils::{config::AppConfig, embedding::EmbeddingProvider},
    vector::VectorStore,
};

use prompt::{create_user_message, ANSWER_SYSTEM_PROMPT};

/// Advisory reply for empty or whitespace-only questions.
pub const EMPTY_QUESTION_REPLY: &str = "Please ask a valid question.";
/// Literal reply when the session has no matching chunks.
pub const NO_CONTEXT_REPLY: &str = "No relevant context found for this session.";
/// Generic reply covering any embedding, retrieval or LLM failure.
pub const ERROR_REPLY: &str = "An error occurred while generating the answer.";

/// Answers a question from the chunks a session has uploaded.
///
/// Failures past input validation are swallowed into a textual reply; the
/// caller always gets an answer string, never a protocol-level error.
pub struct QaPipeline {
    vectors: Arc<dyn VectorStore>,
    embedder: Arc<EmbeddingProvider>,
    openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
    chat_model: String,
    top_k: usize,
}

impl QaPipeline {
    pub fn new(
        vectors: Arc<dyn VectorStore>,
        embedder: Arc<EmbeddingProvider>,
        openai_client: Arc<async_openai::Client<async_openai::config::OpenAIConfig>>,
        config: &AppConfig,
    ) -> Self {
        Self {
            vectors,
            embedder,
            openai_client,
            chat_model: config.chat_model.clone(),
            top_k: config.retrieval_top_k,
        }
    }

    pub async fn answer(&self, question: &str, session_id: &str) -> String {
        if question.trim().is_empty() {
            return EMPTY_QUESTION_REPLY.to_owned();
        }

        match self.answer_inner(question, session_id).await {
            Ok(Some(answer)) => answer,
            Ok(None) => NO_CONTEXT_REPLY.to_owned(),
            Err(err) => {
                error!(%session_id, error = %err, "Failed to answer question");
                ERROR_REPLY.to_owned()
            }
        }
    }

    /// `Ok(None)` means the vector query matched nothing for this session.
    async fn answer_inner(
        &self,
        question: &str,
        session_id: &str,
    ) -> Result<Option<String>, AppError> {
        let query_vector = self.embedder.embed(question).await?;

        let matches = self
            .vectors
            .query(query_vector, self.top_k, session_id)
            .await?;
        if matches.is_empty() {
            return Ok(None);
        }
        debug!(%session_id, matches = matches.len(), "Retrieved context chunks");

        let context = matches
            .iter()
            .map(|m| m.metadata.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let user_message = create_user_message(&context, question);

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.chat_model.clone())
            .messages([
                ChatCompletionRequestSystemMessage::from(ANSWER_SYSTEM_PROMPT).into(),
                ChatCompletionRequestUserMessage::from(user_message).into(),
            ])
            .build()?;

        let response = self.openai_client.chat().create(request).await?;

        let answer = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_ref())
            .ok_or_else(|| AppError::Processing("No content found in LLM response".into()))?;

        Ok(Some(answer.trim().to_owned()))
    }
}
