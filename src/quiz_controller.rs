use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::{ErrorContext, SessionError};
use crate::models::{AnswerMap, Difficulty, Quiz, ScoreSummary};
use crate::quiz_aggregator::QuizAggregator;
use crate::quiz_session::{GenerationOutcome, QuizSession, SessionState, TopicSelection};
use crate::resume::ResumeUpload;

// Import logging macros
use crate::{log_service_start, log_service_success};

const SERVICE: &str = "quiz_controller";

/// Drives a `QuizSession` against the aggregation pipeline.
///
/// The session lock is never held across an await, so a second `generate`
/// may start while the first is still in flight; only the latest one lands.
#[derive(Clone)]
pub struct QuizController {
    session: Arc<Mutex<QuizSession>>,
    aggregator: Arc<QuizAggregator>,
}

impl QuizController {
    pub fn new(aggregator: Arc<QuizAggregator>) -> Self {
        Self {
            session: Arc::new(Mutex::new(QuizSession::new())),
            aggregator,
        }
    }

    fn lock(&self) -> MutexGuard<'_, QuizSession> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reject(&self, operation: &str, error: SessionError) -> SessionError {
        let id = self.lock().id().to_string();
        error.log_with_context(&ErrorContext::new(operation, "quiz_session").with_id(&id));
        error
    }

    pub fn configure(&self, topics: &[String], difficulty: Option<Difficulty>) -> Result<(), SessionError> {
        let result = self.lock().configure(topics, difficulty);
        result.map_err(|e| self.reject("configure", e))
    }

    pub fn add_topic(&self, name: &str) -> Result<(), SessionError> {
        let result = self.lock().add_topic(name);
        result.map_err(|e| self.reject("add_topic", e))
    }

    pub fn remove_topic(&self, name: &str) -> Result<bool, SessionError> {
        let result = self.lock().remove_topic(name);
        result.map_err(|e| self.reject("remove_topic", e))
    }

    pub fn toggle_topic(&self, name: &str) -> Result<(), SessionError> {
        let result = self.lock().toggle_topic(name);
        result.map_err(|e| self.reject("toggle_topic", e))
    }

    pub fn set_difficulty(&self, difficulty: Difficulty) -> Result<(), SessionError> {
        let result = self.lock().set_difficulty(difficulty);
        result.map_err(|e| self.reject("set_difficulty", e))
    }

    /// Generate a quiz for the current selection.
    ///
    /// Invalid selections are rejected before any remote call. A failed
    /// aggregation is reported as `GenerationOutcome::Failed` with the session
    /// back in `Configuring`.
    pub async fn generate(&self) -> Result<GenerationOutcome, SessionError> {
        let ticket = {
            let result = self.lock().begin_generation();
            result.map_err(|e| self.reject("generate", e))?
        };
        log_service_start!(SERVICE, "generate", topic_count = ticket.topics.len());

        let result = self.aggregator.aggregate(&ticket.topics, ticket.difficulty).await;

        let outcome = self.lock().complete_generation(ticket.token, result);
        if outcome == GenerationOutcome::Applied {
            log_service_success!(SERVICE, "generate", "quiz ready");
        }
        Ok(outcome)
    }

    /// Generate a quiz from a resume file instead of a topic selection
    pub async fn generate_from_resume(&self, file_name: &str, bytes: Vec<u8>) -> Result<GenerationOutcome, SessionError> {
        let upload = ResumeUpload::new(file_name, bytes)
            .map_err(|e| self.reject("generate_from_resume", SessionError::Validation(e)))?;

        let token = {
            let result = self.lock().begin_resume_generation();
            result.map_err(|e| self.reject("generate_from_resume", e))?
        };
        log_service_start!(SERVICE, "generate_from_resume", topic = file_name);

        let result = self.aggregator.aggregate_resume(upload).await;

        let outcome = self.lock().complete_generation(token, result);
        if outcome == GenerationOutcome::Applied {
            log_service_success!(SERVICE, "generate_from_resume", topic = file_name, "quiz ready");
        }
        Ok(outcome)
    }

    pub fn select_answer(&self, question_index: usize, option_index: usize) -> Result<(), SessionError> {
        let result = self.lock().select_answer(question_index, option_index);
        result.map_err(|e| self.reject("select_answer", e))
    }

    pub fn submit(&self) -> Result<ScoreSummary, SessionError> {
        let result = self.lock().submit();
        result.map_err(|e| self.reject("submit", e))
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    pub fn selection(&self) -> TopicSelection {
        self.lock().selection().clone()
    }

    pub fn quiz(&self) -> Option<Quiz> {
        self.lock().quiz().cloned()
    }

    pub fn answers(&self) -> AnswerMap {
        self.lock().answers().clone()
    }

    pub fn answered_count(&self) -> usize {
        self.lock().answered_count()
    }

    pub fn score(&self) -> Option<ScoreSummary> {
        self.lock().score().cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error().map(str::to_string)
    }
}
