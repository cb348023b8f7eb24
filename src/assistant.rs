use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

const EMPTY_QUESTION: &str = "Please ask a question about our health analytics project. For example: \"What is this project about?\" or \"Tell me about cancer search patterns.\"";
const BACKEND_FAILED: &str = "Sorry, I encountered an error. Please try again.";
const UNREACHABLE: &str = "Sorry, I'm having trouble connecting. Please check your internet connection.";

const CANNED: [(&[&str], &str); 5] = [
    (
        &["trend"],
        "Health search trends show a significant increase over the years, with cancer being the most searched condition across all states.",
    ),
    (
        &["correlation"],
        "Strong correlations exist between depression, diabetes, and obesity searches, suggesting comorbidity awareness among users.",
    ),
    (
        &["cancer"],
        "Cancer remains the most searched health condition, with particularly high interest in California, Texas, and New York.",
    ),
    (
        &["state", "california", "texas"],
        "California shows the highest overall search volume, followed by Texas and New York. Regional variations reflect population density and health awareness.",
    ),
    (
        &["help"],
        "I can help you explore health search trends, correlations between conditions, regional patterns, and data insights. Try asking about specific conditions, states, or trends.",
    ),
];

const DEFAULT_ANSWER: &str = "I understand you're interested in health search data. I can provide insights on trends, correlations, regional patterns, and specific health conditions. Could you be more specific about what you'd like to know?";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedQuestion {
    pub category: String,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub success: bool,
    pub response: String,
    #[serde(default)]
    pub suggested_questions: Vec<SuggestedQuestion>,
    #[serde(default)]
    pub session_id: Option<String>,
}

fn suggestions(category: &str, questions: &[&str]) -> Vec<SuggestedQuestion> {
    questions
        .iter()
        .map(|question| SuggestedQuestion {
            category: category.to_string(),
            question: question.to_string(),
        })
        .collect()
}

fn general_suggestions() -> Vec<SuggestedQuestion> {
    suggestions(
        "general",
        &[
            "What are the key findings?",
            "Explain the methodology",
            "Show me health conditions list",
            "Who worked on this project?",
        ],
    )
}

fn fallback_suggestions() -> Vec<SuggestedQuestion> {
    suggestions(
        "fallback",
        &[
            "What is this project about?",
            "Show me key findings",
            "Explain the methodology",
        ],
    )
}

/// Keyword-matched answer used when no chat backend is configured.
pub fn canned_answer(question: &str) -> &'static str {
    let lowered = question.to_lowercase();
    CANNED
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, answer)| *answer)
        .unwrap_or(DEFAULT_ANSWER)
}

pub struct Assistant {
    client: reqwest::Client,
    backend: Option<String>,
    delay: Duration,
}

impl Assistant {
    pub fn new(backend: Option<String>, delay: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            backend,
            delay,
        }
    }

    /// Always produces a reply; backend trouble becomes a soft error.
    pub async fn answer(&self, request: ChatRequest) -> ChatReply {
        let question = request.question.trim().to_string();
        let session_id = request
            .session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("session-{}", Utc::now().timestamp_millis()));

        if question.is_empty() {
            return ChatReply {
                success: false,
                response: EMPTY_QUESTION.to_string(),
                suggested_questions: general_suggestions(),
                session_id: Some(session_id),
            };
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mut reply = match &self.backend {
            Some(url) => self.ask_backend(url, &question, &session_id).await,
            None => ChatReply {
                success: true,
                response: canned_answer(&question).to_string(),
                suggested_questions: general_suggestions(),
                session_id: None,
            },
        };
        reply.session_id = Some(session_id);
        reply
    }

    async fn ask_backend(&self, url: &str, question: &str, session_id: &str) -> ChatReply {
        let payload = ChatRequest {
            question: question.to_string(),
            session_id: Some(session_id.to_string()),
        };
        let response = match self.client.post(url).json(&payload).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!("chat backend unreachable: {err}");
                return soft_error(UNREACHABLE);
            }
        };

        match response.json::<ChatReply>().await {
            Ok(reply) if reply.success => reply,
            Ok(_) => soft_error(BACKEND_FAILED),
            Err(err) => {
                warn!("chat backend sent an unreadable reply: {err}");
                soft_error(BACKEND_FAILED)
            }
        }
    }
}

fn soft_error(message: &str) -> ChatReply {
    ChatReply {
        success: false,
        response: message.to_string(),
        suggested_questions: fallback_suggestions(),
        session_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_answers_match_keywords_in_order() {
        assert!(canned_answer("Show me the TREND lines").starts_with("Health search trends"));
        assert!(canned_answer("cancer in texas").starts_with("Cancer remains"));
        assert!(canned_answer("what about Texas?").starts_with("California shows"));
        assert_eq!(canned_answer("hello"), DEFAULT_ANSWER);
    }

    #[tokio::test]
    async fn empty_question_is_a_soft_failure() {
        let assistant = Assistant::new(None, Duration::ZERO);
        let reply = assistant
            .answer(ChatRequest { question: "   ".into(), session_id: Some("abc".into()) })
            .await;
        assert!(!reply.success);
        assert_eq!(reply.session_id.as_deref(), Some("abc"));
        assert_eq!(reply.suggested_questions.len(), 4);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_soft_failure() {
        let assistant = Assistant::new(Some("http://127.0.0.1:9/api/chat".into()), Duration::ZERO);
        let reply = assistant
            .answer(ChatRequest { question: "trends?".into(), session_id: None })
            .await;
        assert!(!reply.success);
        assert_eq!(reply.response, UNREACHABLE);
        assert!(reply.session_id.is_some_and(|id| id.starts_with("session-")));
    }
}
