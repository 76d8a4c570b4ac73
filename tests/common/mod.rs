#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use topic_quiz::{
    AggregatorConfig, Difficulty, GeneratedQuestion, GeneratedQuizContent, QuizAggregator, QuizApi,
    QuizController, ResolverConfig, ResumeId, ServiceError, Topic, TopicId,
};

/// How a scripted generation call misbehaves
#[derive(Debug, Clone, Copy)]
pub enum GenerationFault {
    Unavailable,
    NoQuestions,
    ThreeOptions,
}

#[derive(Default)]
struct Script {
    catalog: Vec<Topic>,
    next_id: u64,
    hidden: HashSet<String>,
    create_failures: HashSet<String>,
    list_failures: VecDeque<u16>,
    generation_faults: HashMap<String, GenerationFault>,
    delays: HashMap<String, Duration>,
}

/// In-memory quiz service with injectable faults, keyed by topic name
#[derive(Default)]
pub struct ScriptedQuizApi {
    script: Mutex<Script>,
    pub create_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub generate_calls: AtomicUsize,
}

impl ScriptedQuizApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Topics already present before any create call
    pub fn with_catalog(self, names: &[&str]) -> Self {
        {
            let mut script = self.script.lock().unwrap();
            for name in names {
                script.next_id += 1;
                let id = TopicId(script.next_id.to_string());
                script.catalog.push(Topic {
                    id,
                    name: name.to_string(),
                });
            }
        }
        self
    }

    /// Creates for this name succeed but never show up in the catalog
    pub fn hide_from_catalog(self, name: &str) -> Self {
        self.script.lock().unwrap().hidden.insert(name.to_string());
        self
    }

    /// Creates for this name fail with a 500
    pub fn fail_create(self, name: &str) -> Self {
        self.script.lock().unwrap().create_failures.insert(name.to_string());
        self
    }

    /// Upcoming catalog reads fail with these statuses, in order
    pub fn fail_list_with(self, statuses: &[u16]) -> Self {
        self.script.lock().unwrap().list_failures.extend(statuses);
        self
    }

    pub fn fail_generation(self, name: &str, fault: GenerationFault) -> Self {
        self.script
            .lock()
            .unwrap()
            .generation_faults
            .insert(name.to_string(), fault);
        self
    }

    pub fn delay_generation(self, name: &str, delay: Duration) -> Self {
        self.script.lock().unwrap().delays.insert(name.to_string(), delay);
        self
    }

    pub fn catalog_names(&self) -> Vec<String> {
        self.script
            .lock()
            .unwrap()
            .catalog
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn generations(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
    }
}

pub fn questions_for(name: &str, count: usize) -> Vec<GeneratedQuestion> {
    (0..count)
        .map(|i| GeneratedQuestion {
            q: format!("{} question {}", name, i + 1),
            options: vec!["w".into(), "x".into(), "y".into(), "z".into()],
            answer_index: i % 4,
        })
        .collect()
}

#[async_trait]
impl QuizApi for ScriptedQuizApi {
    async fn create_topic(&self, name: &str) -> Result<Topic, ServiceError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();

        if script.create_failures.contains(name) {
            return Err(ServiceError::Status {
                status: 500,
                body: "create exploded".to_string(),
            });
        }
        if script.catalog.iter().any(|t| t.name == name) {
            return Err(ServiceError::Conflict(format!("{} exists", name)));
        }

        script.next_id += 1;
        let topic = Topic {
            id: TopicId(script.next_id.to_string()),
            name: name.to_string(),
        };
        if !script.hidden.contains(name) {
            script.catalog.push(topic.clone());
        }
        Ok(topic)
    }

    async fn list_topics(&self) -> Result<Vec<Topic>, ServiceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        if let Some(status) = script.list_failures.pop_front() {
            return Err(ServiceError::Status {
                status,
                body: "catalog unavailable".to_string(),
            });
        }
        Ok(script.catalog.clone())
    }

    async fn generate_topic_quiz(
        &self,
        topic_id: &TopicId,
        difficulty: Difficulty,
    ) -> Result<GeneratedQuizContent, ServiceError> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        let (name, fault, delay) = {
            let script = self.script.lock().unwrap();
            let name = script
                .catalog
                .iter()
                .find(|t| &t.id == topic_id)
                .map(|t| t.name.clone())
                .ok_or_else(|| ServiceError::Status {
                    status: 404,
                    body: format!("no topic {}", topic_id),
                })?;
            let fault = script.generation_faults.get(&name).copied();
            let delay = script.delays.get(&name).copied();
            (name, fault, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut questions = questions_for(&name, difficulty.questions_per_topic());
        match fault {
            Some(GenerationFault::Unavailable) => {
                return Err(ServiceError::Status {
                    status: 503,
                    body: "generator overloaded".to_string(),
                });
            }
            Some(GenerationFault::NoQuestions) => questions.clear(),
            Some(GenerationFault::ThreeOptions) => {
                questions[1].options.pop();
            }
            None => {}
        }

        Ok(GeneratedQuizContent {
            title: Some(format!("Quiz: {}", name)),
            difficulty: Some(difficulty.to_string()),
            questions,
        })
    }

    async fn upload_resume(&self, file_name: &str, _bytes: Vec<u8>) -> Result<ResumeId, ServiceError> {
        Ok(ResumeId(format!("resume-{}", file_name)))
    }

    async fn generate_resume_quiz(&self, resume_id: &ResumeId) -> Result<GeneratedQuizContent, ServiceError> {
        Ok(GeneratedQuizContent {
            title: None,
            difficulty: None,
            questions: questions_for(&resume_id.0, 5),
        })
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

pub fn fast_resolver_config() -> ResolverConfig {
    ResolverConfig {
        max_attempts: 3,
        retry_delay_ms: 1,
        request_timeout_ms: 2_000,
    }
}

pub fn seeded_aggregator_config(seed: u64) -> AggregatorConfig {
    AggregatorConfig {
        shuffle_seed: Some(seed),
        request_timeout_ms: Some(2_000),
        ..AggregatorConfig::default()
    }
}

pub fn aggregator(api: Arc<ScriptedQuizApi>) -> QuizAggregator {
    QuizAggregator::new(api, fast_resolver_config(), seeded_aggregator_config(17))
}

pub fn controller(api: Arc<ScriptedQuizApi>) -> QuizController {
    QuizController::new(Arc::new(aggregator(api)))
}

pub fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
