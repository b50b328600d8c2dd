use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which route produced an intent.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IntentSource {
    Keyword,
    Semantic,
}

/// A fully resolved action for one utterance.
///
/// Built once by the router (keyword handlers) or the intent resolver
/// (semantic extraction) and handed to the dispatcher exactly once.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResolvedIntent {
    pub name: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    pub confidence: f32,
    pub source: IntentSource,
}

impl ResolvedIntent {
    /// Keyword matches are deterministic, so they always carry full confidence.
    pub fn keyword(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
            confidence: 1.0,
            source: IntentSource::Keyword,
        }
    }

    pub fn semantic(
        name: impl Into<String>,
        parameters: BTreeMap<String, String>,
        confidence: f32,
    ) -> Self {
        Self {
            name: name.into(),
            parameters,
            confidence: confidence.clamp(0.0, 1.0),
            source: IntentSource::Semantic,
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}

/// Process-wide flags the router reads at call time.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutingMode {
    pub gaming_active: bool,
    pub selection_active: bool,
}

/// How a learned pattern entered the fingerprint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PatternSource {
    #[default]
    Passive,
    Manual,
}

/// Summary of one learned pattern, as reported over IPC.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PatternInfo {
    pub token: String,
    pub correction: String,
    pub confidence: f64,
    pub count: u32,
    pub source: PatternSource,
}
