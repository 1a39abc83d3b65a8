//! Question answering over a PDF's extracted text.
//!
//! The document text is joined with page labels, cut down to the
//! configured character budget, and sent with the question as a single
//! chat-completion request.

use tracing::debug;

use crate::chat::{ChatCompleter, ChatMessage};
use crate::error::ServiceResult;
use crate::pdf::text::PageText;

/// Returned verbatim for a blank question; no model call is made
pub const EMPTY_QUESTION_MESSAGE: &str = "Please enter a question.";

const SYSTEM_PROMPT: &str =
    "You are an expert assistant helping summarize and answer questions about a PDF document.";

/// Answer a free-form question against already-extracted page texts.
///
/// Blank questions short-circuit with [`EMPTY_QUESTION_MESSAGE`]. The
/// answer is returned trimmed of surrounding whitespace.
pub async fn answer<C: ChatCompleter>(
    chat: &C,
    pages: &[PageText],
    question: &str,
    context_char_budget: usize,
) -> ServiceResult<String> {
    let question = question.trim();
    if question.is_empty() {
        return Ok(EMPTY_QUESTION_MESSAGE.to_string());
    }

    let messages = build_messages(pages, question, context_char_budget);
    debug!(pages = pages.len(), "Sending chat completion request");

    let reply = chat.complete(messages).await?;
    Ok(reply.trim().to_string())
}

/// Assemble the prompt: page-labelled text truncated to the character
/// budget, followed by the question. Pages past the budget are not sent.
fn build_messages(pages: &[PageText], question: &str, context_char_budget: usize) -> Vec<ChatMessage> {
    let combined = pages
        .iter()
        .map(|p| format!("Page {}:\n{}", p.page, p.text))
        .collect::<Vec<_>>()
        .join("\n\n");
    let truncated = truncate_chars(&combined, context_char_budget);

    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "The following text is extracted from a PDF:\n\n{}\n\nQuestion: {}",
            truncated, question
        )),
    ]
}

/// Truncate to at most `budget` characters without splitting a character
fn truncate_chars(s: &str, budget: usize) -> &str {
    match s.char_indices().nth(budget) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ChatError;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeChat {
        /// `Err` holds the message of a simulated completion failure
        reply: Result<String, String>,
        calls: AtomicUsize,
    }

    impl FakeChat {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                reply: Err(message.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ChatCompleter for FakeChat {
        fn complete(
            &self,
            _messages: Vec<ChatMessage>,
        ) -> impl Future<Output = ServiceResult<String>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let result = match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(message) => Err(ChatError::Completion {
                    status: 500,
                    message: message.clone(),
                }
                .into()),
            };
            async move { result }
        }
    }

    fn pages() -> Vec<PageText> {
        vec![
            PageText {
                page: 1,
                text: "Invoice Total: 500".to_string(),
            },
            PageText {
                page: 2,
                text: "Payment due in 30 days".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn blank_question_short_circuits_without_a_model_call() {
        let chat = FakeChat::replying("should never be seen");

        let reply = answer(&chat, &pages(), "   \n", 3000).await.expect("answer");

        assert_eq!(reply, EMPTY_QUESTION_MESSAGE);
        assert_eq!(chat.call_count(), 0);
    }

    #[tokio::test]
    async fn answer_is_the_mocked_reply_trimmed() {
        let chat = FakeChat::replying("  The total is 500. \n");

        let reply = answer(&chat, &pages(), "What is the total?", 3000)
            .await
            .expect("answer");

        assert_eq!(reply, "The total is 500.");
        assert_eq!(chat.call_count(), 1);
    }

    #[tokio::test]
    async fn completion_failures_carry_the_error_label_and_message() {
        let chat = FakeChat::failing("rate limit exceeded");

        let err = answer(&chat, &pages(), "What is the total?", 3000)
            .await
            .expect_err("completion failure must propagate");

        let message = err.to_string();
        assert!(message.starts_with("Chat completion request failed"));
        assert!(message.contains("rate limit exceeded"));
    }

    #[test]
    fn prompt_labels_pages_and_embeds_the_question() {
        let messages = build_messages(&pages(), "What is the total?", 3000);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("Page 1:\nInvoice Total: 500"));
        assert!(messages[1].content.contains("Page 2:\nPayment due in 30 days"));
        assert!(messages[1].content.ends_with("Question: What is the total?"));
    }

    #[test]
    fn context_is_cut_at_the_character_budget() {
        let long_pages = vec![PageText {
            page: 1,
            text: "x".repeat(10_000),
        }];

        let messages = build_messages(&long_pages, "anything", 3000);

        // The page-labelled body is cut to exactly the budget
        let content = &messages[1].content;
        let body_start = content.find("Page 1:").expect("page label");
        let body_end = content.find("\n\nQuestion:").expect("question suffix");
        assert_eq!(body_end - body_start, 3000);
    }

    #[test]
    fn short_context_is_sent_whole() {
        let messages = build_messages(&pages(), "anything", 3000);
        assert!(messages[1].content.contains("Payment due in 30 days"));
    }
}
