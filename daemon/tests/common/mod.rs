// Common test helpers for voxrouted integration tests
//
// Every fake writes into one shared call log so tests can assert both what
// happened and in which order.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use shared::RoutingMode;
use std::sync::{Arc, Mutex};
use voxrouted::collaborators::{
    Collaborators, GameCommands, LogMenu, MediaCapabilities, MediaPlayer, Notifier, PlayOutcome,
};
use voxrouted::config::SemanticConfig;
use voxrouted::intent::{IntentBackend, IntentError};
use voxrouted::{ActionDispatcher, CommandRouter, IntentResolver, VoiceFingerprint};

pub type CallLog = Arc<Mutex<Vec<String>>>;

fn record(log: &CallLog, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

pub struct RecordingMedia {
    log: CallLog,
    capabilities: MediaCapabilities,
    search: PlayOutcome,
}

impl MediaPlayer for RecordingMedia {
    fn play_pause(&mut self) -> Result<()> {
        record(&self.log, "media:play_pause");
        Ok(())
    }
    fn stop(&mut self) -> Result<()> {
        record(&self.log, "media:stop");
        Ok(())
    }
    fn next_track(&mut self) -> Result<()> {
        record(&self.log, "media:next_track");
        Ok(())
    }
    fn previous_track(&mut self) -> Result<()> {
        record(&self.log, "media:previous_track");
        Ok(())
    }
    fn volume_up(&mut self) -> Result<()> {
        record(&self.log, "media:volume_up");
        Ok(())
    }
    fn volume_down(&mut self) -> Result<()> {
        record(&self.log, "media:volume_down");
        Ok(())
    }
    fn whats_playing(&mut self) -> Result<Option<String>> {
        record(&self.log, "media:whats_playing");
        Ok(None)
    }
    fn play_any(&mut self, query: &str) -> Result<PlayOutcome> {
        record(&self.log, format!("media:play_any({})", query));
        Ok(self.search.clone())
    }
    fn capabilities(&self) -> MediaCapabilities {
        self.capabilities
    }
    fn play_random(&mut self) -> Result<PlayOutcome> {
        record(&self.log, "media:play_random");
        Ok(PlayOutcome::Started("shuffle".to_string()))
    }
    fn play_random_genre(&mut self, genre: &str) -> Result<PlayOutcome> {
        record(&self.log, format!("media:play_random_genre({})", genre));
        Ok(PlayOutcome::Started(genre.to_string()))
    }
}

/// Accepts a fixed set of game phrases while enabled.
pub struct RecordingGame {
    log: CallLog,
    enabled: bool,
}

impl GameCommands for RecordingGame {
    fn handle_command(&mut self, text: &str) -> (bool, Option<String>) {
        record(&self.log, format!("game:{}", text));
        let known = ["fire", "reload", "land"].contains(&text);
        (known, known.then(|| format!("did {}", text)))
    }
    fn game_mode_enabled(&self) -> bool {
        self.enabled
    }
    fn set_enabled(&mut self, enabled: bool) {
        record(&self.log, format!("game:enabled({})", enabled));
        self.enabled = enabled;
    }
}

pub struct RecordingNotifier {
    log: CallLog,
}

impl Notifier for RecordingNotifier {
    fn announce(&mut self, message: &str) {
        record(&self.log, format!("announce:{}", message));
    }
}

pub struct ScriptedBackend {
    log: CallLog,
    healthy: bool,
    reply: Result<String, IntentError>,
}

#[async_trait]
impl IntentBackend for ScriptedBackend {
    async fn health_check(&self) -> bool {
        record(&self.log, "semantic:health");
        self.healthy
    }

    async fn generate(&self, _prompt: &str) -> Result<String, IntentError> {
        record(&self.log, "semantic:generate");
        self.reply.clone()
    }
}

/// Knobs for one router under test.
pub struct Setup {
    pub semantic_enabled: bool,
    pub healthy: bool,
    pub reply: Result<String, IntentError>,
    pub capabilities: MediaCapabilities,
    pub search: PlayOutcome,
    pub gaming: bool,
}

impl Default for Setup {
    fn default() -> Self {
        Self {
            semantic_enabled: true,
            healthy: false,
            reply: Err(IntentError::ServiceUnavailable),
            capabilities: MediaCapabilities::default(),
            search: PlayOutcome::Started("it".to_string()),
            gaming: false,
        }
    }
}

impl Setup {
    /// A healthy service that always answers with `json`.
    pub fn replying(json: &str) -> Self {
        Self {
            healthy: true,
            reply: Ok(json.to_string()),
            ..Self::default()
        }
    }

    pub fn build(self) -> Harness {
        let log: CallLog = Arc::new(Mutex::new(Vec::new()));

        let backend = ScriptedBackend {
            log: log.clone(),
            healthy: self.healthy,
            reply: self.reply,
        };
        let config = SemanticConfig {
            enabled: self.semantic_enabled,
            ..SemanticConfig::default()
        };
        let resolver = IntentResolver::new(Box::new(backend), VoiceFingerprint::in_memory(), &config);

        let dispatcher = ActionDispatcher::new(Collaborators {
            media: Box::new(RecordingMedia {
                log: log.clone(),
                capabilities: self.capabilities,
                search: self.search,
            }),
            game: Box::new(RecordingGame {
                log: log.clone(),
                enabled: self.gaming,
            }),
            menu: Box::new(LogMenu::new()),
            notifier: Box::new(RecordingNotifier { log: log.clone() }),
        });

        Harness {
            router: CommandRouter::new(dispatcher, resolver, &config),
            log,
        }
    }
}

pub struct Harness {
    pub router: CommandRouter,
    pub log: CallLog,
}

impl Harness {
    /// Route under the mode the collaborators currently report.
    pub async fn say(&mut self, text: &str) -> bool {
        let mode = self.router.current_mode();
        self.router.process(text, mode).await
    }

    pub async fn say_with(&mut self, text: &str, mode: RoutingMode) -> bool {
        self.router.process(text, mode).await
    }

    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == entry).count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.calls().iter().position(|c| c.starts_with(prefix))
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

pub fn confident(intent: &str, param: &str, value: &str) -> String {
    format!(
        r#"{{"intent": "{}", "parameters": {{"{}": "{}"}}, "confidence": 0.95}}"#,
        intent, param, value
    )
}
