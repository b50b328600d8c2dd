use crate::intent::PatternInfo;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Command {
    /// Route one normalized utterance.
    Process(String),
    Status,
    SetGameMode(bool),
    /// Supervised training: what the user said vs. what ASR produced.
    Train { expected: String, heard: String },
    Forget(String),
    ListPatterns,
    Corrections(String),
    ClearCache,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Response {
    Ok,
    Error(String),
    /// Result of `Process`: false once a quit command was routed.
    Continue(bool),
    Status(StatusInfo),
    Patterns(Vec<PatternInfo>),
    Corrections(BTreeMap<String, String>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StatusInfo {
    pub is_running: bool,
    pub gaming_active: bool,
    pub semantic_enabled: bool,
    /// None until the semantic service has been probed once.
    pub semantic_available: Option<bool>,
    pub pattern_count: usize,
    pub cached_intents: usize,
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection refused: is voxrouted running?")]
    ConnectionRefused,

    #[error("Connection timeout")]
    Timeout,
}
