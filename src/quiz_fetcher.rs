use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::errors::GenerationError;
use crate::models::{Difficulty, GeneratedQuestion, GeneratedQuizContent, GenerationTarget};
use crate::quiz_api::QuizApi;
use crate::topic_resolver::with_timeout;

// Import logging macros
use crate::{log_performance, log_service_error};

/// Requests one generated question set per call. Generation is expensive and
/// is never retried here.
#[derive(Clone)]
pub struct QuizFetcher {
    api: Arc<dyn QuizApi>,
    request_timeout: Duration,
}

impl QuizFetcher {
    pub fn new(api: Arc<dyn QuizApi>, request_timeout: Duration) -> Self {
        Self { api, request_timeout }
    }

    pub async fn fetch(
        &self,
        target: &GenerationTarget,
        difficulty: Difficulty,
    ) -> Result<Vec<GeneratedQuestion>, GenerationError> {
        Ok(self.fetch_content(target, difficulty).await?.questions)
    }

    /// Like `fetch`, keeping the title and difficulty the service reported
    pub async fn fetch_content(
        &self,
        target: &GenerationTarget,
        difficulty: Difficulty,
    ) -> Result<GeneratedQuizContent, GenerationError> {
        let started = Instant::now();

        let call = async {
            match target {
                GenerationTarget::Topic(id) => self.api.generate_topic_quiz(id, difficulty).await,
                GenerationTarget::Resume(id) => self.api.generate_resume_quiz(id).await,
            }
        };

        let content = with_timeout(self.request_timeout, call).await.map_err(|source| {
            log_service_error!("quiz_fetcher", "fetch", topic = target, error = source);
            GenerationError::Service {
                target: target.to_string(),
                source,
            }
        })?;

        validate_questions(target, &content.questions)?;

        log_performance!("fetch", duration_ms = started.elapsed().as_millis() as u64);
        Ok(content)
    }
}

fn validate_questions(target: &GenerationTarget, questions: &[GeneratedQuestion]) -> Result<(), GenerationError> {
    if questions.is_empty() {
        return Err(GenerationError::NoQuestions {
            target: target.to_string(),
        });
    }

    for (index, question) in questions.iter().enumerate() {
        question
            .validate()
            .map_err(|reason| GenerationError::MalformedQuestion {
                target: target.to_string(),
                index,
                reason,
            })?;
    }
    Ok(())
}
