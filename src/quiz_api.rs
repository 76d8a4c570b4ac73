use async_trait::async_trait;
use reqwest::{multipart, Client};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{ApiMode, ServiceConfig};
use crate::errors::{classify_status, ServiceError};
use crate::models::{
    Difficulty, GeneratedQuizContent, ResumeId, ResumeQuizResponse, ResumeUploadResponse, Topic,
    TopicId, TopicQuizResponse,
};
use crate::offline::OfflineQuizApi;

// Import logging macros
use crate::log_remote_call;

/// Contract of the remote quiz-generation service
#[async_trait]
pub trait QuizApi: Send + Sync {
    /// `POST /topics`. A conflict comes back as `ServiceError::Conflict`.
    async fn create_topic(&self, name: &str) -> Result<Topic, ServiceError>;

    /// `GET /topics`
    async fn list_topics(&self) -> Result<Vec<Topic>, ServiceError>;

    /// `POST /topics/{id}/generate-quiz`
    async fn generate_topic_quiz(
        &self,
        topic_id: &TopicId,
        difficulty: Difficulty,
    ) -> Result<GeneratedQuizContent, ServiceError>;

    /// `POST /resume/upload`
    async fn upload_resume(&self, file_name: &str, bytes: Vec<u8>) -> Result<ResumeId, ServiceError>;

    /// `POST /resume/generate-quiz/{id}`
    async fn generate_resume_quiz(&self, resume_id: &ResumeId) -> Result<GeneratedQuizContent, ServiceError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

#[derive(Debug, Serialize)]
struct CreateTopicRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateQuizRequest {
    difficulty: Difficulty,
}

/// HTTP implementation of the quiz service boundary
#[derive(Debug, Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: String,
}

impl HttpQuizApi {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn read_json<T>(&self, operation: &str, response: reqwest::Response, started: Instant) -> Result<T, ServiceError>
    where
        T: serde::de::DeserializeOwned,
    {
        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let error = classify_status(status, body);
            if !matches!(error, ServiceError::Conflict(_)) {
                log_remote_call!(error, operation, backend = self.backend_name(), error = error);
            }
            return Err(error);
        }

        let body = response.text().await?;
        let parsed = serde_json::from_str::<T>(&body)
            .map_err(|e| ServiceError::Decode(format!("{}: {}", operation, e)))?;

        log_remote_call!(
            success,
            operation,
            backend = self.backend_name(),
            duration_ms = started.elapsed().as_millis() as u64
        );
        Ok(parsed)
    }
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn create_topic(&self, name: &str) -> Result<Topic, ServiceError> {
        log_remote_call!(start, "create_topic", backend = self.backend_name());
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/topics", self.base_url))
            .json(&CreateTopicRequest { name })
            .send()
            .await?;

        self.read_json("create_topic", response, started).await
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, ServiceError> {
        log_remote_call!(start, "list_topics", backend = self.backend_name());
        let started = Instant::now();

        let response = self
            .client
            .get(format!("{}/topics", self.base_url))
            .send()
            .await?;

        self.read_json("list_topics", response, started).await
    }

    async fn generate_topic_quiz(
        &self,
        topic_id: &TopicId,
        difficulty: Difficulty,
    ) -> Result<GeneratedQuizContent, ServiceError> {
        log_remote_call!(start, "generate_topic_quiz", backend = self.backend_name());
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/topics/{}/generate-quiz", self.base_url, topic_id))
            .json(&GenerateQuizRequest { difficulty })
            .send()
            .await?;

        let body: TopicQuizResponse = self.read_json("generate_topic_quiz", response, started).await?;
        Ok(body.content)
    }

    async fn upload_resume(&self, file_name: &str, bytes: Vec<u8>) -> Result<ResumeId, ServiceError> {
        log_remote_call!(start, "upload_resume", backend = self.backend_name());
        let started = Instant::now();

        let part = multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/resume/upload", self.base_url))
            .multipart(form)
            .send()
            .await?;

        let body: ResumeUploadResponse = self.read_json("upload_resume", response, started).await?;
        Ok(body.id)
    }

    async fn generate_resume_quiz(&self, resume_id: &ResumeId) -> Result<GeneratedQuizContent, ServiceError> {
        log_remote_call!(start, "generate_resume_quiz", backend = self.backend_name());
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/resume/generate-quiz/{}", self.base_url, resume_id))
            .send()
            .await?;

        let body: ResumeQuizResponse = self.read_json("generate_resume_quiz", response, started).await?;
        Ok(body.quiz_content)
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}

/// Factory for creating the quiz service backend from configuration
pub struct QuizApiFactory;

impl QuizApiFactory {
    pub fn create(config: &ServiceConfig) -> Result<Arc<dyn QuizApi>, ServiceError> {
        match config.mode {
            ApiMode::Remote => Ok(Arc::new(HttpQuizApi::new(
                &config.base_url,
                config.request_timeout(),
            )?)),
            ApiMode::Offline => Ok(Arc::new(OfflineQuizApi::new())),
        }
    }
}
