use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::errors::{AggregationError, ErrorContext, SessionError, ValidationError};
use crate::models::{validate_topic_names, AnswerMap, Difficulty, Quiz, ScoreSummary, MAX_TOPICS, OPTIONS_PER_QUESTION};

// Import logging macros
use crate::{log_session_transition, log_validation};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Idle,
    Configuring,
    Generating,
    InProgress,
    Submitted,
}

/// Topics and difficulty picked by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopicSelection {
    pub topics: Vec<String>,
    pub difficulty: Option<Difficulty>,
}

impl TopicSelection {
    pub fn contains(&self, name: &str) -> bool {
        let wanted = name.trim().to_lowercase();
        self.topics.iter().any(|t| t.to_lowercase() == wanted)
    }

    /// Check a selection is ready to generate from
    pub fn validate(&self) -> Result<Difficulty, ValidationError> {
        validate_topic_names(&self.topics)?;
        self.difficulty.ok_or(ValidationError::MissingDifficulty)
    }
}

/// Handed out when generation starts and required to commit its result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub token: u64,
    pub topics: Vec<String>,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    Applied,
    Failed(String),
    /// A newer generation or a reset superseded this one
    Stale,
}

/// State machine for one user taking generated quizzes
#[derive(Debug)]
pub struct QuizSession {
    id: Uuid,
    state: SessionState,
    selection: TopicSelection,
    quiz: Option<Quiz>,
    answers: AnswerMap,
    score: Option<ScoreSummary>,
    generation: u64,
    last_error: Option<String>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: SessionState::Idle,
            selection: TopicSelection::default(),
            quiz: None,
            answers: AnswerMap::new(),
            score: None,
            generation: 0,
            last_error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn selection(&self) -> &TopicSelection {
        &self.selection
    }

    pub fn quiz(&self) -> Option<&Quiz> {
        self.quiz.as_ref()
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn score(&self) -> Option<&ScoreSummary> {
        self.score.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn transition(&mut self, to: SessionState, reason: &str) {
        if self.state != to {
            log_session_transition!(self.id, from = self.state, to = to, reason);
        }
        self.state = to;
    }

    fn invalid(&self, action: &str) -> SessionError {
        SessionError::InvalidTransition {
            state: format!("{:?}", self.state),
            action: action.to_string(),
        }
    }

    fn ensure_configurable(&mut self, action: &str) -> Result<(), SessionError> {
        match self.state {
            SessionState::Idle => {
                self.transition(SessionState::Configuring, "configuration started");
                Ok(())
            }
            SessionState::Configuring => Ok(()),
            _ => Err(self.invalid(action)),
        }
    }

    /// Replace the whole selection at once
    pub fn configure(&mut self, topics: &[String], difficulty: Option<Difficulty>) -> Result<(), SessionError> {
        self.ensure_configurable("configure")?;

        let mut selection = TopicSelection {
            topics: Vec::with_capacity(topics.len()),
            difficulty,
        };
        for topic in topics {
            push_topic(&mut selection, topic)?;
        }

        self.selection = selection;
        Ok(())
    }

    pub fn add_topic(&mut self, name: &str) -> Result<(), SessionError> {
        self.ensure_configurable("add topic")?;
        push_topic(&mut self.selection, name)?;
        Ok(())
    }

    /// Returns whether the topic was selected
    pub fn remove_topic(&mut self, name: &str) -> Result<bool, SessionError> {
        self.ensure_configurable("remove topic")?;
        let wanted = name.trim().to_lowercase();
        let before = self.selection.topics.len();
        self.selection.topics.retain(|t| t.to_lowercase() != wanted);
        Ok(self.selection.topics.len() != before)
    }

    /// Add the topic if absent, remove it if present
    pub fn toggle_topic(&mut self, name: &str) -> Result<(), SessionError> {
        if self.selection.contains(name) {
            self.remove_topic(name)?;
            Ok(())
        } else {
            self.add_topic(name)
        }
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), SessionError> {
        self.ensure_configurable("set difficulty")?;
        self.selection.difficulty = Some(difficulty);
        Ok(())
    }

    /// Configuring -> Generating. Calling it again while generating supersedes
    /// the earlier attempt.
    pub fn begin_generation(&mut self) -> Result<GenerationTicket, SessionError> {
        if !matches!(self.state, SessionState::Configuring | SessionState::Generating) {
            return Err(self.invalid("generate"));
        }

        let difficulty = self.selection.validate().map_err(|e| {
            log_validation!(failure, "selection", error = e);
            SessionError::Validation(e)
        })?;
        log_validation!(success, "selection", "selection ready for generation");

        let token = self.start_generating();
        Ok(GenerationTicket {
            token,
            topics: self.selection.topics.clone(),
            difficulty,
        })
    }

    /// Enter Generating for a resume quiz; no topic selection is involved
    pub fn begin_resume_generation(&mut self) -> Result<u64, SessionError> {
        if !matches!(
            self.state,
            SessionState::Idle | SessionState::Configuring | SessionState::Generating
        ) {
            return Err(self.invalid("generate from resume"));
        }
        Ok(self.start_generating())
    }

    fn start_generating(&mut self) -> u64 {
        self.generation += 1;
        self.quiz = None;
        self.answers.clear();
        self.score = None;
        self.last_error = None;
        self.transition(SessionState::Generating, "generation started");
        self.generation
    }

    /// Commit the result of the generation identified by `token`. A quiz with
    /// no questions or no topics is treated as a failed generation.
    pub fn complete_generation(&mut self, token: u64, result: Result<Quiz, AggregationError>) -> GenerationOutcome {
        if token != self.generation || self.state != SessionState::Generating {
            debug!(
                session_id = %self.id,
                token,
                current = self.generation,
                state = ?self.state,
                "Discarding stale generation result"
            );
            return GenerationOutcome::Stale;
        }

        let result = result.and_then(|quiz| {
            if quiz.is_empty() || quiz.topics.is_empty() {
                Err(AggregationError::EmptyQuiz)
            } else {
                Ok(quiz)
            }
        });

        match result {
            Ok(quiz) => {
                self.quiz = Some(quiz);
                self.answers.clear();
                self.transition(SessionState::InProgress, "quiz ready");
                GenerationOutcome::Applied
            }
            Err(error) => {
                let context = ErrorContext::new("generate", "quiz").with_id(&self.id.to_string());
                let message = error.log_with_context(&context);
                self.last_error = Some(message.clone());
                self.transition(SessionState::Configuring, "generation failed");
                GenerationOutcome::Failed(message)
            }
        }
    }

    /// Record an answer, overwriting any earlier one. A no-op once submitted.
    pub fn select_answer(&mut self, question_index: usize, option_index: usize) -> Result<(), SessionError> {
        match self.state {
            SessionState::Submitted => {
                debug!(
                    session_id = %self.id,
                    question_index,
                    option_index,
                    "Ignoring answer selection after submission"
                );
                return Ok(());
            }
            SessionState::InProgress => {}
            _ => return Err(self.invalid("select answer")),
        }

        let len = self.quiz.as_ref().map_or(0, Quiz::len);
        if question_index >= len {
            return Err(SessionError::QuestionOutOfRange {
                index: question_index,
                len,
            });
        }
        if option_index >= OPTIONS_PER_QUESTION {
            return Err(SessionError::OptionOutOfRange {
                question: question_index,
                index: option_index,
            });
        }

        self.answers.insert(question_index, option_index);
        Ok(())
    }

    /// InProgress -> Submitted, only with every question answered
    pub fn submit(&mut self) -> Result<ScoreSummary, SessionError> {
        if self.state != SessionState::InProgress {
            return Err(self.invalid("submit"));
        }
        let Some(quiz) = self.quiz.as_ref() else {
            return Err(self.invalid("submit"));
        };

        let total = quiz.len();
        if !self.answers.is_complete_for(total) {
            return Err(SessionError::IncompleteSubmission {
                answered: self.answers.len(),
                total,
            });
        }

        let score = ScoreSummary::compute(quiz, &self.answers);
        self.score = Some(score.clone());
        self.transition(SessionState::Submitted, "quiz submitted");
        Ok(score)
    }

    /// Back to Idle from anywhere; any in-flight generation becomes stale
    pub fn reset(&mut self) {
        self.generation += 1;
        self.quiz = None;
        self.answers.clear();
        self.score = None;
        self.selection = TopicSelection::default();
        self.last_error = None;
        self.transition(SessionState::Idle, "reset");
    }
}

fn push_topic(selection: &mut TopicSelection, name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTopicName);
    }
    if selection.contains(trimmed) {
        return Err(ValidationError::DuplicateTopic(trimmed.to_string()));
    }
    if selection.topics.len() >= MAX_TOPICS {
        return Err(ValidationError::TooManyTopics {
            count: selection.topics.len() + 1,
            max: MAX_TOPICS,
        });
    }
    selection.topics.push(trimmed.to_string());
    Ok(())
}
