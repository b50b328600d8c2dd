pub mod pattern;

pub use pattern::{compute_confidence, extract_correction_pair, Pattern};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::{PatternInfo, PatternSource};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

const FINGERPRINT_VERSION: &str = "1.0";

#[derive(Error, Debug)]
pub enum FingerprintError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Metadata {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "Utc::now")]
    pub created: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> String {
    FINGERPRINT_VERSION.to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: default_version(),
            created: now,
            last_updated: now,
        }
    }
}

/// On-disk document. Unknown fields are ignored so older daemons can read
/// files written by newer ones.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct FingerprintStore {
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub asr_patterns: BTreeMap<String, Pattern>,
    #[serde(default)]
    pub command_frequency: BTreeMap<String, u64>,
}

/// A correction hint handed to the semantic prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionHint {
    pub token: String,
    pub correction: String,
    pub confidence: f64,
}

/// Per-user store of learned ASR error patterns.
///
/// Pattern mutations are written through to disk immediately; command
/// frequency is flushed in batches. If a write ever fails the fingerprint
/// keeps working in memory and stops touching the file.
pub struct VoiceFingerprint {
    path: Option<PathBuf>,
    store: FingerprintStore,
    min_confidence: f64,
    manual_weight: u32,
    flush_interval: u32,
    pending_commands: u32,
    persistence_disabled: bool,
}

impl VoiceFingerprint {
    /// Load from `path`. A missing or unreadable file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let store = Self::read_store(&path);
        info!(
            path = %path.display(),
            patterns = store.asr_patterns.len(),
            "Voice fingerprint loaded"
        );

        Self {
            path: Some(path),
            ..Self::from_store(store)
        }
    }

    /// A fingerprint that never touches disk.
    pub fn in_memory() -> Self {
        Self::from_store(FingerprintStore::default())
    }

    fn from_store(store: FingerprintStore) -> Self {
        Self {
            path: None,
            store,
            min_confidence: 0.5,
            manual_weight: 3,
            flush_interval: 10,
            pending_commands: 0,
            persistence_disabled: false,
        }
    }

    pub fn with_settings(mut self, min_confidence: f64, manual_weight: u32, flush_interval: u32) -> Self {
        self.min_confidence = min_confidence;
        self.manual_weight = manual_weight.max(1);
        self.flush_interval = flush_interval.max(1);
        self
    }

    fn read_store(path: &Path) -> FingerprintStore {
        if !path.exists() {
            debug!("No fingerprint at {:?}, starting empty", path);
            return FingerprintStore::default();
        }

        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read fingerprint {:?}: {}", path, e);
                return FingerprintStore::default();
            }
        };

        match serde_json::from_str::<FingerprintStore>(&contents) {
            Ok(mut store) => {
                for pattern in store.asr_patterns.values_mut() {
                    pattern.refresh();
                }
                store
            }
            Err(e) => {
                warn!("Failed to parse fingerprint {:?}: {}", path, e);
                FingerprintStore::default()
            }
        }
    }

    pub fn add_passive_correction(&mut self, asr_heard: &str, resolved: &str, intent_label: &str) -> bool {
        let Some((error_token, correct_token)) = extract_correction_pair(asr_heard, resolved) else {
            debug!(heard = asr_heard, resolved, "No correction pair to learn");
            return false;
        };

        let pattern = self
            .store
            .asr_patterns
            .entry(error_token.clone())
            .or_insert_with(|| Pattern::new(PatternSource::Passive));
        pattern.record(&correct_token, 1);
        pattern.intent = Some(intent_label.to_string());

        info!(
            error = %error_token,
            correct = %correct_token,
            confidence = pattern.confidence,
            count = pattern.count,
            intent = intent_label,
            "Learned passive correction"
        );

        self.persist();
        true
    }

    /// Explicit training carries more weight than inferred corrections.
    pub fn add_manual_correction(&mut self, expected: &str, heard: &str) -> bool {
        let Some((error_token, correct_token)) = extract_correction_pair(heard, expected) else {
            debug!(expected, heard, "Nothing to train");
            return false;
        };

        let pattern = self
            .store
            .asr_patterns
            .entry(error_token.clone())
            .or_insert_with(|| Pattern::new(PatternSource::Manual));
        pattern.record(&correct_token, self.manual_weight);
        pattern.source = PatternSource::Manual;

        info!(
            error = %error_token,
            correct = %correct_token,
            confidence = pattern.confidence,
            "Learned manual correction"
        );

        self.persist();
        true
    }

    pub fn get_corrections_for(&self, text: &str) -> BTreeMap<String, String> {
        self.trusted_tokens(text)
            .into_iter()
            .map(|hint| (hint.token, hint.correction))
            .collect()
    }

    pub fn get_correction_with_confidence(&self, token: &str) -> Option<(String, f64)> {
        let pattern = self.store.asr_patterns.get(&token.to_lowercase())?;
        let (correction, _) = pattern.most_common()?;
        Some((correction.to_string(), pattern.confidence))
    }

    /// Trusted corrections for tokens in `text`, in order of appearance.
    pub fn correction_hints(&self, text: &str, limit: usize) -> Vec<CorrectionHint> {
        let mut hints = self.trusted_tokens(text);
        hints.truncate(limit);
        hints
    }

    fn trusted_tokens(&self, text: &str) -> Vec<CorrectionHint> {
        let text = text.to_lowercase();
        let mut hints: Vec<CorrectionHint> = Vec::new();

        for token in text.split_whitespace() {
            if hints.iter().any(|h| h.token == token) {
                continue;
            }
            let Some(pattern) = self.store.asr_patterns.get(token) else {
                continue;
            };
            if pattern.confidence < self.min_confidence {
                continue;
            }
            if let Some((correction, _)) = pattern.most_common() {
                hints.push(CorrectionHint {
                    token: token.to_string(),
                    correction: correction.to_string(),
                    confidence: pattern.confidence,
                });
            }
        }

        hints
    }

    /// User-initiated deletion of a whole pattern.
    pub fn remove_pattern(&mut self, token: &str) -> bool {
        let removed = self.store.asr_patterns.remove(&token.to_lowercase()).is_some();
        if removed {
            info!(token, "Removed fingerprint pattern");
            self.persist();
        }
        removed
    }

    pub fn record_command(&mut self, text: &str) {
        let key = text.trim().to_lowercase();
        if key.is_empty() {
            return;
        }

        *self.store.command_frequency.entry(key).or_insert(0) += 1;
        self.pending_commands += 1;

        if self.pending_commands >= self.flush_interval {
            self.flush();
        }
    }

    pub fn command_count(&self, text: &str) -> u64 {
        self.store
            .command_frequency
            .get(&text.trim().to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    /// Write out any batched command-frequency updates.
    pub fn flush(&mut self) {
        if self.pending_commands > 0 {
            self.pending_commands = 0;
            self.persist();
        }
    }

    pub fn pattern(&self, token: &str) -> Option<&Pattern> {
        self.store.asr_patterns.get(&token.to_lowercase())
    }

    pub fn patterns(&self) -> Vec<PatternInfo> {
        self.store
            .asr_patterns
            .iter()
            .filter_map(|(token, pattern)| {
                let (correction, _) = pattern.most_common()?;
                Some(PatternInfo {
                    token: token.clone(),
                    correction: correction.to_string(),
                    confidence: pattern.confidence,
                    count: pattern.count,
                    source: pattern.source,
                })
            })
            .collect()
    }

    pub fn store(&self) -> &FingerprintStore {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.asr_patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.asr_patterns.is_empty()
    }

    /// True while writes still reach the backing file.
    pub fn is_persistent(&self) -> bool {
        self.path.is_some() && !self.persistence_disabled
    }

    fn persist(&mut self) {
        if !self.is_persistent() {
            return;
        }

        if let Err(e) = self.save() {
            error!(
                "Failed to save voice fingerprint, continuing in memory only: {}",
                e
            );
            self.persistence_disabled = true;
        }
    }

    /// Atomically write the store: temp file first, then rename over the target.
    pub fn save(&mut self) -> Result<(), FingerprintError> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        self.store.metadata.last_updated = Utc::now();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let temp_path = PathBuf::from(format!("{}.tmp", path.display()));
        let json = serde_json::to_string_pretty(&self.store)?;
        std::fs::write(&temp_path, json)?;
        std::fs::rename(&temp_path, &path)?;

        debug!("Saved voice fingerprint to {:?}", path);
        Ok(())
    }
}
