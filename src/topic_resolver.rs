use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::ResolverConfig;
use crate::errors::{ResolutionError, ServiceError};
use crate::models::{Topic, TopicId};
use crate::quiz_api::QuizApi;

// Import logging macros
use crate::{log_remote_call, log_service_start, log_service_success, log_service_warn};

const SERVICE: &str = "topic_resolver";

/// How a requested name was matched against the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Fuzzy { catalog_name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTopic {
    pub id: TopicId,
    pub requested: String,
    pub matched: MatchKind,
}

/// Maps a topic name onto a stable server-side identifier, creating it if needed
#[derive(Clone)]
pub struct TopicResolver {
    api: Arc<dyn QuizApi>,
    config: ResolverConfig,
}

impl TopicResolver {
    pub fn new(api: Arc<dyn QuizApi>, config: ResolverConfig) -> Self {
        Self { api, config }
    }

    /// Resolve `name` to a topic id. Safe to call repeatedly for the same name.
    pub async fn resolve(&self, name: &str) -> Result<ResolvedTopic, ResolutionError> {
        log_service_start!(SERVICE, "resolve", topic = name);

        self.ensure_created(name).await;

        let catalog = self
            .fetch_catalog_with_retry()
            .await
            .map_err(|source| ResolutionError::Unreachable {
                topic: name.to_string(),
                source,
            })?;

        if let Some(topic) = find_exact(&catalog, name) {
            log_service_success!(SERVICE, "resolve", topic = name, "exact match");
            return Ok(ResolvedTopic {
                id: topic.id.clone(),
                requested: name.to_string(),
                matched: MatchKind::Exact,
            });
        }

        if let Some(topic) = find_fuzzy(&catalog, name) {
            log_service_warn!(
                SERVICE,
                "resolve",
                topic = name,
                format!("no exact match, falling back to catalog entry '{}'", topic.name)
            );
            return Ok(ResolvedTopic {
                id: topic.id.clone(),
                requested: name.to_string(),
                matched: MatchKind::Fuzzy {
                    catalog_name: topic.name.clone(),
                },
            });
        }

        Err(ResolutionError::NotFound {
            topic: name.to_string(),
            reason: "not found after creation".to_string(),
            catalog_snapshot: catalog.into_iter().map(|t| t.name).collect(),
        })
    }

    /// Create the topic; "already exists" counts as success
    async fn ensure_created(&self, name: &str) {
        match with_timeout(self.config.request_timeout(), self.api.create_topic(name)).await {
            Ok(topic) => debug!(topic = %name, topic_id = %topic.id, "Created topic"),
            Err(ServiceError::Conflict(_)) => debug!(topic = %name, "Topic already exists"),
            // The catalog lookup decides whether the topic is usable
            Err(e) => {
                log_service_warn!(SERVICE, "create", topic = name, format!("create failed: {}", e));
            }
        }
    }

    async fn fetch_catalog_with_retry(&self) -> Result<Vec<Topic>, ServiceError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match with_timeout(self.config.request_timeout(), self.api.list_topics()).await {
                Ok(catalog) => return Ok(catalog),
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    log_remote_call!(
                        retry,
                        "list_topics",
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = e
                    );
                    tokio::time::sleep(self.config.retry_delay()).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Bound a service call; expiry is reported as a transient `Timeout`
pub(crate) async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout {
            after_ms: limit.as_millis() as u64,
        }),
    }
}

/// Case-insensitive equality after trimming
pub fn find_exact<'a>(catalog: &'a [Topic], name: &str) -> Option<&'a Topic> {
    let wanted = name.trim().to_lowercase();
    catalog.iter().find(|t| t.name.trim().to_lowercase() == wanted)
}

/// Lowercase and drop all whitespace
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// First catalog entry whose normalized name contains, or is contained in, the
/// normalized request. Empty normalized names never match.
pub fn find_fuzzy<'a>(catalog: &'a [Topic], name: &str) -> Option<&'a Topic> {
    let wanted = normalize(name);
    if wanted.is_empty() {
        return None;
    }

    catalog.iter().find(|t| {
        let candidate = normalize(&t.name);
        !candidate.is_empty() && (candidate.contains(&wanted) || wanted.contains(&candidate))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: &str, name: &str) -> Topic {
        Topic {
            id: TopicId(id.to_string()),
            name: name.to_string(),
        }
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let catalog = vec![topic("1", "Python"), topic("2", "JavaScript")];
        assert_eq!(find_exact(&catalog, "javascript").unwrap().id.0, "2");
        assert_eq!(find_exact(&catalog, "  PYTHON ").unwrap().id.0, "1");
        assert!(find_exact(&catalog, "java script").is_none());
    }

    #[test]
    fn test_fuzzy_match_ignores_case_and_whitespace() {
        let catalog = vec![topic("1", "Python"), topic("2", "JavaScript")];
        assert_eq!(find_fuzzy(&catalog, "java script").unwrap().name, "JavaScript");
        assert_eq!(find_fuzzy(&catalog, "Advanced Python Patterns").unwrap().name, "Python");
        assert_eq!(find_fuzzy(&catalog, "script").unwrap().name, "JavaScript");
        assert!(find_fuzzy(&catalog, "Haskell").is_none());
    }

    #[test]
    fn test_fuzzy_match_picks_first_in_catalog_order() {
        let catalog = vec![topic("1", "Java"), topic("2", "JavaScript")];
        assert_eq!(find_fuzzy(&catalog, "javascript tutorial").unwrap().id.0, "1");
    }

    #[test]
    fn test_blank_names_never_match() {
        let catalog = vec![topic("1", "   "), topic("2", "Rust")];
        assert_eq!(find_fuzzy(&catalog, "Rust lang").unwrap().id.0, "2");
        assert!(find_fuzzy(&catalog, "  ").is_none());
    }

    #[tokio::test]
    async fn test_timeout_maps_to_transient_error() {
        let result: Result<(), ServiceError> = with_timeout(Duration::from_millis(5), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            Ok(())
        })
        .await;

        let error = result.unwrap_err();
        assert!(matches!(error, ServiceError::Timeout { after_ms: 5 }));
        assert!(error.is_transient());
    }
}
