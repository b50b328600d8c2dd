pub mod backend;
pub mod prompt;

pub use backend::{IntentBackend, OllamaBackend};

use crate::config::SemanticConfig;
use crate::fingerprint::VoiceFingerprint;
use shared::ResolvedIntent;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Parameters that usually carry the entity a user was trying to say.
const ENTITY_PARAMETERS: &[&str] = &[
    "artist", "album", "song", "track", "title", "query", "genre", "playlist",
];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntentError {
    #[error("semantic extraction is disabled")]
    Disabled,

    #[error("semantic service unavailable")]
    ServiceUnavailable,

    #[error("semantic service timed out")]
    Timeout,

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub intent: ResolvedIntent,
    pub raw: String,
    pub cached: bool,
}

/// Exact-text cache with insertion-order eviction.
struct IntentCache {
    entries: HashMap<String, (ResolvedIntent, String)>,
    order: VecDeque<String>,
    capacity: usize,
}

impl IntentCache {
    fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    fn get(&self, key: &str) -> Option<&(ResolvedIntent, String)> {
        self.entries.get(key)
    }

    fn insert(&mut self, key: String, intent: ResolvedIntent, raw: String) {
        if self.entries.contains_key(&key) {
            self.entries.insert(key, (intent, raw));
            return;
        }

        while self.entries.len() >= self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, (intent, raw));
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Wraps the semantic-extraction service and owns the voice fingerprint it
/// feeds. Reports whatever confidence the service returns; accepting or
/// rejecting it is the router's call.
pub struct IntentResolver {
    backend: Box<dyn IntentBackend>,
    fingerprint: VoiceFingerprint,
    enabled: bool,
    request_timeout: Duration,
    max_hints: usize,
    health: Option<bool>,
    cache: IntentCache,
}

impl IntentResolver {
    pub fn new(backend: Box<dyn IntentBackend>, fingerprint: VoiceFingerprint, config: &SemanticConfig) -> Self {
        Self {
            backend,
            fingerprint,
            enabled: config.enabled,
            request_timeout: Duration::from_secs(config.timeout_seconds),
            max_hints: config.max_hints,
            health: None,
            cache: IntentCache::new(config.cache_capacity),
        }
    }

    pub async fn extract_intent(
        &mut self,
        text: &str,
        known_entities: &[String],
    ) -> Result<Extraction, IntentError> {
        if !self.enabled {
            return Err(IntentError::Disabled);
        }

        let key = text.trim().to_lowercase();
        if let Some((intent, raw)) = self.cache.get(&key) {
            debug!(text = %key, intent = %intent.name, "Intent cache hit");
            return Ok(Extraction {
                intent: intent.clone(),
                raw: raw.clone(),
                cached: true,
            });
        }

        if !self.ensure_healthy().await {
            return Err(IntentError::ServiceUnavailable);
        }

        let hints = self.fingerprint.correction_hints(&key, self.max_hints);
        let prompt = prompt::build_prompt(&key, &hints, known_entities);
        debug!(
            hints = hints.len(),
            entities = known_entities.len(),
            "Requesting semantic extraction"
        );

        let raw = match timeout(self.request_timeout, self.backend.generate(&prompt)).await {
            Ok(result) => result?,
            Err(_) => return Err(IntentError::Timeout),
        };

        let intent = prompt::parse_response(&raw)?;
        info!(
            text = %key,
            intent = %intent.name,
            confidence = intent.confidence,
            "Semantic extraction succeeded"
        );

        self.cache.insert(key, intent.clone(), raw.clone());
        Ok(Extraction {
            intent,
            raw,
            cached: false,
        })
    }

    /// Runs the liveness probe once; the answer sticks for the process lifetime.
    async fn ensure_healthy(&mut self) -> bool {
        if let Some(healthy) = self.health {
            return healthy;
        }

        let healthy = timeout(self.request_timeout, self.backend.health_check())
            .await
            .unwrap_or(false);
        if healthy {
            info!("Semantic service is available");
        } else {
            warn!("Semantic service is unavailable, using keyword routing only");
        }
        self.health = Some(healthy);
        healthy
    }

    /// Passive learning from a dispatched semantic intent.
    pub fn learn_from(&mut self, heard: &str, intent: &ResolvedIntent) -> bool {
        let Some(entity) = ENTITY_PARAMETERS.iter().find_map(|key| intent.param(key)) else {
            return false;
        };
        self.fingerprint
            .add_passive_correction(heard, entity, &intent.name)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn health(&self) -> Option<bool> {
        self.health
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
        info!("Intent cache cleared");
    }

    pub fn fingerprint(&self) -> &VoiceFingerprint {
        &self.fingerprint
    }

    pub fn fingerprint_mut(&mut self) -> &mut VoiceFingerprint {
        &mut self.fingerprint
    }
}
