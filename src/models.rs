use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;

/// Number of options every multiple choice question carries
pub const OPTIONS_PER_QUESTION: usize = 4;

/// Most topics one quiz may span
pub const MAX_TOPICS: usize = 3;

/// Identifiers arrive as JSON numbers from some backends and strings from others
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

fn deserialize_opaque_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

/// Server-assigned topic identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct TopicId(#[serde(deserialize_with = "deserialize_opaque_id")] pub String);

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned identifier of an uploaded resume
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct ResumeId(#[serde(deserialize_with = "deserialize_opaque_id")] pub String);

impl fmt::Display for ResumeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Questions requested per topic at this difficulty
    pub fn questions_per_topic(&self) -> usize {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Medium => 5,
            Difficulty::Hard => 7,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ValidationError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// What a single generation request is aimed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationTarget {
    Topic(TopicId),
    Resume(ResumeId),
}

impl fmt::Display for GenerationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationTarget::Topic(id) => write!(f, "topic:{}", id),
            GenerationTarget::Resume(id) => write!(f, "resume:{}", id),
        }
    }
}

/// Question as produced by the generation service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedQuestion {
    pub q: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

impl GeneratedQuestion {
    /// Check the shape invariants a question must satisfy before it enters a quiz
    pub fn validate(&self) -> Result<(), String> {
        if self.options.len() != OPTIONS_PER_QUESTION {
            return Err(format!(
                "expected {} options, got {}",
                OPTIONS_PER_QUESTION,
                self.options.len()
            ));
        }
        if self.answer_index >= OPTIONS_PER_QUESTION {
            return Err(format!("answer_index {} out of range", self.answer_index));
        }
        Ok(())
    }

    /// Attach the source topic. Callers validate first.
    pub fn into_question(self, source_topic: &str) -> Question {
        Question {
            prompt: self.q,
            options: self.options,
            answer_index: self.answer_index,
            source_topic: source_topic.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedQuizContent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    pub questions: Vec<GeneratedQuestion>,
}

/// Response body of `POST /topics/{id}/generate-quiz`
#[derive(Debug, Clone, Deserialize)]
pub struct TopicQuizResponse {
    pub content: GeneratedQuizContent,
}

/// Response body of `POST /resume/generate-quiz/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct ResumeQuizResponse {
    pub quiz_content: GeneratedQuizContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResumeUploadResponse {
    pub id: ResumeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub answer_index: usize,
    pub source_topic: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Quiz {
    pub title: String,
    pub difficulty: Difficulty,
    pub topics: Vec<String>,
    pub questions: Vec<Question>,
    pub generated_at: DateTime<Utc>,
}

/// A topic list is usable when it has 1..=MAX_TOPICS entries, none blank and
/// none repeated ignoring case and surrounding whitespace
pub fn validate_topic_names(topics: &[String]) -> Result<(), ValidationError> {
    if topics.is_empty() {
        return Err(ValidationError::NoTopics);
    }
    if topics.len() > MAX_TOPICS {
        return Err(ValidationError::TooManyTopics {
            count: topics.len(),
            max: MAX_TOPICS,
        });
    }

    let mut seen: Vec<String> = Vec::with_capacity(topics.len());
    for topic in topics {
        let trimmed = topic.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyTopicName);
        }
        let key = trimmed.to_lowercase();
        if seen.contains(&key) {
            return Err(ValidationError::DuplicateTopic(trimmed.to_string()));
        }
        seen.push(key);
    }
    Ok(())
}

impl Quiz {
    pub fn multi_topic_title(topics: &[String]) -> String {
        format!("Multi-Topic Quiz: {}", topics.join(", "))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Selected option per question index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnswerMap(BTreeMap<usize, usize>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_index: usize) -> Option<usize> {
        self.0.get(&question_index).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when the key set is exactly `0..total`
    pub fn is_complete_for(&self, total: usize) -> bool {
        self.0.len() == total && (0..total).all(|i| self.0.contains_key(&i))
    }

    pub(crate) fn insert(&mut self, question_index: usize, option_index: usize) {
        self.0.insert(question_index, option_index);
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PerformanceBand {
    Excellent,
    Good,
    KeepPracticing,
    ReviewBasics,
}

impl PerformanceBand {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            80.. => PerformanceBand::Excellent,
            60..=79 => PerformanceBand::Good,
            40..=59 => PerformanceBand::KeepPracticing,
            _ => PerformanceBand::ReviewBasics,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            PerformanceBand::Excellent => {
                "Excellent! You have a strong understanding of this topic."
            }
            PerformanceBand::Good => "Good job! You're on the right track.",
            PerformanceBand::KeepPracticing => {
                "Keep practicing! More study time will help you improve."
            }
            PerformanceBand::ReviewBasics => "Consider reviewing the basics of this topic.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionOutcome {
    pub selected: usize,
    pub correct_index: usize,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoreSummary {
    pub correct: usize,
    pub total: usize,
    pub percentage: u32,
    pub outcomes: Vec<QuestionOutcome>,
}

impl ScoreSummary {
    /// Score a complete answer map against a quiz
    pub fn compute(quiz: &Quiz, answers: &AnswerMap) -> Self {
        let outcomes: Vec<QuestionOutcome> = quiz
            .questions
            .iter()
            .enumerate()
            .filter_map(|(i, question)| {
                answers.get(i).map(|selected| QuestionOutcome {
                    selected,
                    correct_index: question.answer_index,
                    is_correct: selected == question.answer_index,
                })
            })
            .collect();

        let correct = outcomes.iter().filter(|o| o.is_correct).count();
        let total = quiz.questions.len();
        let percentage = if total == 0 {
            0
        } else {
            (100.0 * correct as f64 / total as f64).round() as u32
        };

        Self {
            correct,
            total,
            percentage,
            outcomes,
        }
    }

    pub fn incorrect(&self) -> usize {
        self.total - self.correct
    }

    pub fn performance(&self) -> PerformanceBand {
        PerformanceBand::from_percentage(self.percentage)
    }
}
