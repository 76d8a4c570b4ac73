use chrono::Utc;
use futures_util::future::join_all;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::config::{AggregatorConfig, ResolverConfig};
use crate::errors::{AggregationError, BranchError, BranchFailure};
use crate::models::{
    validate_topic_names, Difficulty, GeneratedQuestion, GeneratedQuizContent, GenerationTarget, Question, Quiz,
};
use crate::quiz_api::QuizApi;
use crate::quiz_fetcher::QuizFetcher;
use crate::resume::{ResumeResolver, ResumeUpload};
use crate::topic_resolver::TopicResolver;

// Import logging macros
use crate::{log_performance, log_service_error, log_service_start, log_service_success, log_validation};

const SERVICE: &str = "quiz_aggregator";

/// Fans resolve-then-fetch out across topics and merges the results into one quiz
pub struct QuizAggregator {
    resolver: TopicResolver,
    resume_resolver: ResumeResolver,
    fetcher: QuizFetcher,
    config: AggregatorConfig,
    rng: Mutex<StdRng>,
}

impl QuizAggregator {
    pub fn new(api: Arc<dyn QuizApi>, resolver_config: ResolverConfig, config: AggregatorConfig) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            resolver: TopicResolver::new(api.clone(), resolver_config),
            resume_resolver: ResumeResolver::new(api.clone(), config.request_timeout()),
            fetcher: QuizFetcher::new(api, config.request_timeout()),
            config,
            rng: Mutex::new(rng),
        }
    }

    /// Build one quiz from 1..=3 distinct topic names.
    ///
    /// The topic list is checked before anything touches the service. Every
    /// branch runs concurrently on the calling task and all of them settle
    /// before anything is merged. A single failed branch fails the whole call.
    pub async fn aggregate(&self, topics: &[String], difficulty: Difficulty) -> Result<Quiz, AggregationError> {
        if let Err(e) = validate_topic_names(topics) {
            log_validation!(failure, SERVICE, error = e);
            return Err(AggregationError::InvalidSelection(e));
        }
        log_service_start!(SERVICE, "aggregate", topic_count = topics.len());
        let started = Instant::now();

        let branches = topics.iter().map(|topic| async move {
            let result = self.run_branch(topic, difficulty).await;
            (topic.clone(), result)
        });
        let settled = join_all(branches).await;

        let mut collected = Vec::with_capacity(settled.len());
        let mut failures = Vec::new();
        for (topic, result) in settled {
            match result {
                Ok(questions) => collected.push((topic, questions)),
                Err(error) => {
                    log_service_error!(SERVICE, "branch", topic = topic, error = error);
                    failures.push(BranchFailure { topic, error });
                }
            }
        }

        if !failures.is_empty() {
            return Err(AggregationError::BranchesFailed { failures });
        }

        let questions = self.merge(collected);

        log_performance!("aggregate", duration_ms = started.elapsed().as_millis() as u64, branches = topics.len());
        log_service_success!(
            SERVICE,
            "aggregate",
            question_count = questions.len(),
            duration_ms = started.elapsed().as_millis() as u64
        );

        Ok(Quiz {
            title: Quiz::multi_topic_title(topics),
            difficulty,
            topics: topics.to_vec(),
            questions,
            generated_at: Utc::now(),
        })
    }

    /// Build a quiz from an uploaded resume; the file name stands in for the topic
    pub async fn aggregate_resume(&self, upload: ResumeUpload) -> Result<Quiz, AggregationError> {
        let label = upload.file_name().to_string();
        log_service_start!(SERVICE, "aggregate_resume", topic = label);

        let content = self.run_resume_branch(upload).await.map_err(|error| AggregationError::BranchesFailed {
            failures: vec![BranchFailure {
                topic: label.clone(),
                error,
            }],
        })?;

        let difficulty = content
            .difficulty
            .as_deref()
            .and_then(|d| d.parse::<Difficulty>().ok())
            .unwrap_or(Difficulty::Medium);
        let title = content
            .title
            .unwrap_or_else(|| format!("Resume Assessment: {}", label));
        let questions = self.merge(vec![(label.clone(), content.questions)]);

        log_service_success!(SERVICE, "aggregate_resume", topic = label, format!("{} questions", questions.len()));

        Ok(Quiz {
            title,
            difficulty,
            topics: vec![label],
            questions,
            generated_at: Utc::now(),
        })
    }

    async fn run_branch(&self, topic: &str, difficulty: Difficulty) -> Result<Vec<GeneratedQuestion>, BranchError> {
        let resolved = self.resolver.resolve(topic).await?;
        let target = GenerationTarget::Topic(resolved.id);
        Ok(self.fetcher.fetch(&target, difficulty).await?)
    }

    async fn run_resume_branch(&self, upload: ResumeUpload) -> Result<GeneratedQuizContent, BranchError> {
        let target = self.resume_resolver.resolve(upload).await?;
        Ok(self.fetcher.fetch_content(&target, Difficulty::Medium).await?)
    }

    /// Cap, tag, concatenate and shuffle
    fn merge(&self, branches: Vec<(String, Vec<GeneratedQuestion>)>) -> Vec<Question> {
        let mut questions: Vec<Question> = branches
            .into_iter()
            .flat_map(|(topic, generated)| {
                let keep = self.config.per_topic_limit.unwrap_or(generated.len());
                generated
                    .into_iter()
                    .take(keep)
                    .map(move |q| q.into_question(&topic))
                    .collect::<Vec<_>>()
            })
            .collect();

        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        fisher_yates(&mut questions, &mut *rng);
        questions
    }
}

/// Uniform in-place Fisher-Yates shuffle
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
