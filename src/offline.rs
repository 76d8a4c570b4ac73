//! Explicit offline/demo backend.
//!
//! Selected only through configuration (`QUIZ_OFFLINE_MODE=true`). It is never
//! substituted after a remote failure; its questions are labelled as samples.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::errors::ServiceError;
use crate::models::{Difficulty, GeneratedQuestion, GeneratedQuizContent, ResumeId, Topic, TopicId};
use crate::quiz_api::QuizApi;

#[derive(Debug, Default)]
struct OfflineState {
    topics: Vec<Topic>,
    resumes: Vec<(ResumeId, String)>,
    next_id: u64,
}

impl OfflineState {
    fn allocate_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }
}

/// In-memory quiz service producing sample questions
#[derive(Debug, Default)]
pub struct OfflineQuizApi {
    state: Mutex<OfflineState>,
}

impl OfflineQuizApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, OfflineState>, ServiceError> {
        self.state
            .lock()
            .map_err(|_| ServiceError::Unavailable("offline catalog lock poisoned".to_string()))
    }
}

/// Deterministic sample questions, answer index cycling through the options
pub fn sample_questions(subject: &str, difficulty: Difficulty, count: usize) -> Vec<GeneratedQuestion> {
    (0..count)
        .map(|i| GeneratedQuestion {
            q: format!("Sample {} question {} about {}", difficulty, i + 1, subject),
            options: ["A", "B", "C", "D"]
                .iter()
                .map(|letter| format!("Option {} about {}", letter, subject))
                .collect(),
            answer_index: i % 4,
        })
        .collect()
}

#[async_trait]
impl QuizApi for OfflineQuizApi {
    async fn create_topic(&self, name: &str) -> Result<Topic, ServiceError> {
        let mut state = self.lock()?;
        let wanted = name.trim().to_lowercase();
        if state.topics.iter().any(|t| t.name.trim().to_lowercase() == wanted) {
            return Err(ServiceError::Conflict(format!("Topic '{}' already exists", name)));
        }

        let topic = Topic {
            id: TopicId(state.allocate_id()),
            name: name.to_string(),
        };
        state.topics.push(topic.clone());
        Ok(topic)
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, ServiceError> {
        Ok(self.lock()?.topics.clone())
    }

    async fn generate_topic_quiz(
        &self,
        topic_id: &TopicId,
        difficulty: Difficulty,
    ) -> Result<GeneratedQuizContent, ServiceError> {
        let state = self.lock()?;
        let topic = state
            .topics
            .iter()
            .find(|t| &t.id == topic_id)
            .ok_or_else(|| ServiceError::Status {
                status: 404,
                body: format!("Topic {} not found", topic_id),
            })?;

        Ok(GeneratedQuizContent {
            title: Some(format!("Quiz: {}", topic.name)),
            difficulty: Some(difficulty.to_string()),
            questions: sample_questions(&topic.name, difficulty, difficulty.questions_per_topic()),
        })
    }

    async fn upload_resume(&self, file_name: &str, _bytes: Vec<u8>) -> Result<ResumeId, ServiceError> {
        let mut state = self.lock()?;
        let id = ResumeId(state.allocate_id());
        state.resumes.push((id.clone(), file_name.to_string()));
        Ok(id)
    }

    async fn generate_resume_quiz(&self, resume_id: &ResumeId) -> Result<GeneratedQuizContent, ServiceError> {
        let state = self.lock()?;
        let (_, file_name) = state
            .resumes
            .iter()
            .find(|(id, _)| id == resume_id)
            .ok_or_else(|| ServiceError::Status {
                status: 404,
                body: "Resume upload not found".to_string(),
            })?;

        Ok(GeneratedQuizContent {
            title: Some(format!("Resume Assessment: {}", file_name)),
            difficulty: Some(Difficulty::Medium.to_string()),
            questions: sample_questions(file_name, Difficulty::Medium, Difficulty::Medium.questions_per_topic()),
        })
    }

    fn backend_name(&self) -> &'static str {
        "offline"
    }
}
