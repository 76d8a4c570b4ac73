use reqwest::StatusCode;
use tracing::{error, info, warn};

/// Failures at the remote quiz service boundary
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Request timed out after {after_ms} ms")]
    Timeout { after_ms: u64 },

    #[error("Failed to decode service response: {0}")]
    Decode(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Whether retrying the same request could reasonably succeed
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| s.is_server_error())
            }
            ServiceError::Status { status, .. } => *status >= 500 || *status == 429,
            ServiceError::Timeout { .. } | ServiceError::Unavailable(_) => true,
            ServiceError::Conflict(_) | ServiceError::Decode(_) => false,
        }
    }
}

/// Map a non-success HTTP status onto the service error taxonomy
pub fn classify_status(status: StatusCode, body: String) -> ServiceError {
    match status {
        StatusCode::CONFLICT | StatusCode::BAD_REQUEST => ServiceError::Conflict(body),
        _ => ServiceError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

/// Local configuration problems. Never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select at least one topic")]
    NoTopics,

    #[error("You can select maximum {max} topics (got {count})")]
    TooManyTopics { count: usize, max: usize },

    #[error("Please enter a topic name")]
    EmptyTopicName,

    #[error("Topic '{0}' already selected")]
    DuplicateTopic(String),

    #[error("Please select a difficulty level")]
    MissingDifficulty,

    #[error("Unknown difficulty '{0}', expected easy, medium or hard")]
    UnknownDifficulty(String),

    #[error("Unsupported file type '{0}', please upload a PDF or Word document")]
    UnsupportedFileType(String),

    #[error("File too large ({size} bytes), maximum is {max} bytes")]
    FileTooLarge { size: usize, max: usize },

    #[error("File '{0}' is empty")]
    EmptyFile(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolutionError {
    #[error("Topic '{topic}' could not be resolved: {source}")]
    Unreachable {
        topic: String,
        #[source]
        source: ServiceError,
    },

    #[error("Topic '{topic}' could not be resolved: {reason} (catalog: [{}])", .catalog_snapshot.join(", "))]
    NotFound {
        topic: String,
        reason: String,
        catalog_snapshot: Vec<String>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Quiz generation failed for {target}: {source}")]
    Service {
        target: String,
        #[source]
        source: ServiceError,
    },

    #[error("Question {index} from {target} is malformed: {reason}")]
    MalformedQuestion {
        target: String,
        index: usize,
        reason: String,
    },

    #[error("Service returned no questions for {target}")]
    NoQuestions { target: String },
}

/// Why one branch of an aggregation failed
#[derive(Debug, thiserror::Error)]
pub enum BranchError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

#[derive(Debug)]
pub struct BranchFailure {
    pub topic: String,
    pub error: BranchError,
}

/// Why no quiz was built
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// Rejected before any branch started
    #[error("Invalid topic selection: {0}")]
    InvalidSelection(#[from] ValidationError),

    /// One or more branches failed permanently
    #[error("Failed to generate quiz for topic(s): {}", join_topics(.failures))]
    BranchesFailed { failures: Vec<BranchFailure> },

    #[error("Generated quiz contains no questions")]
    EmptyQuiz,
}

fn join_topics(failures: &[BranchFailure]) -> String {
    failures
        .iter()
        .map(|f| f.topic.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

impl AggregationError {
    pub fn failures(&self) -> &[BranchFailure] {
        match self {
            AggregationError::BranchesFailed { failures } => failures,
            AggregationError::InvalidSelection(_) | AggregationError::EmptyQuiz => &[],
        }
    }

    pub fn failed_topics(&self) -> Vec<String> {
        self.failures().iter().map(|f| f.topic.clone()).collect()
    }

    /// Human-readable summary naming every failed topic and its cause
    pub fn summary(&self) -> String {
        if self.failures().is_empty() {
            return self.to_string();
        }
        let details = self
            .failures()
            .iter()
            .map(|f| format!("{}: {}", f.topic, f.error))
            .collect::<Vec<_>>()
            .join("; ");
        format!("{} ({})", self, details)
    }
}

/// Rejections raised by the quiz session state machine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Quiz incomplete: {answered} of {total} questions answered")]
    IncompleteSubmission { answered: usize, total: usize },

    #[error("Question index {index} out of range (quiz has {len} questions)")]
    QuestionOutOfRange { index: usize, len: usize },

    #[error("Option index {index} out of range for question {question}")]
    OptionOutOfRange { question: usize, index: usize },

    #[error("Cannot {action} while session is {state}")]
    InvalidTransition { state: String, action: String },
}

/// Error context for structured logging
#[derive(Debug)]
pub struct ErrorContext {
    pub operation: String,
    pub resource_id: Option<String>,
    pub resource_type: String,
}

impl ErrorContext {
    pub fn new(operation: &str, resource_type: &str) -> Self {
        Self {
            operation: operation.to_string(),
            resource_id: None,
            resource_type: resource_type.to_string(),
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.resource_id = Some(id.to_string());
        self
    }
}

impl AggregationError {
    /// Log the failure with context and return the message shown to the user
    pub fn log_with_context(&self, context: &ErrorContext) -> String {
        match self {
            AggregationError::InvalidSelection(e) => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %e,
                    "Quiz aggregation rejected"
                );
                e.to_string()
            }
            AggregationError::BranchesFailed { .. } | AggregationError::EmptyQuiz => {
                error!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    failed_topics = ?self.failed_topics(),
                    error = %self.summary(),
                    "Quiz aggregation failed"
                );
                self.to_string()
            }
        }
    }
}

impl SessionError {
    /// Log the rejection with context and return the message shown to the user
    pub fn log_with_context(&self, context: &ErrorContext) -> String {
        match self {
            SessionError::Validation(_) | SessionError::IncompleteSubmission { .. } => {
                info!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Request rejected"
                );
            }
            SessionError::QuestionOutOfRange { .. }
            | SessionError::OptionOutOfRange { .. }
            | SessionError::InvalidTransition { .. } => {
                warn!(
                    operation = %context.operation,
                    resource_type = %context.resource_type,
                    resource_id = ?context.resource_id,
                    error = %self,
                    "Precondition violated"
                );
            }
        }
        match self {
            SessionError::Validation(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}
