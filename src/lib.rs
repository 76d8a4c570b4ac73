pub mod logging;

pub mod config;
pub mod errors;
pub mod models;
pub mod offline;
pub mod quiz_aggregator;
pub mod quiz_api;
pub mod quiz_controller;
pub mod quiz_fetcher;
pub mod quiz_session;
pub mod resume;
pub mod topic_resolver;


pub use config::{AggregatorConfig, ApiMode, Config, LoggingConfig, ResolverConfig, ServiceConfig};
pub use errors::*;
pub use models::*;
pub use offline::OfflineQuizApi;
pub use quiz_aggregator::QuizAggregator;
pub use quiz_api::{HttpQuizApi, QuizApi, QuizApiFactory};
pub use quiz_controller::QuizController;
pub use quiz_fetcher::QuizFetcher;
pub use quiz_session::{GenerationOutcome, GenerationTicket, QuizSession, SessionState, TopicSelection};
pub use resume::{ResumeResolver, ResumeUpload};
pub use topic_resolver::{MatchKind, ResolvedTopic, TopicResolver};
