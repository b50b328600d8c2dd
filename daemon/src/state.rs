use crate::collaborators::{BindingGameCommands, Collaborators, LogMenu, LogNotifier, PlayerctlMedia};
use crate::config::Config;
use crate::dispatch::ActionDispatcher;
use crate::fingerprint::VoiceFingerprint;
use crate::intent::{IntentResolver, OllamaBackend};
use crate::router::CommandRouter;
use anyhow::Result;
use shared::{PatternInfo, StatusInfo};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::info;

pub struct DaemonState {
    pub config: Config,
    router: CommandRouter,
}

impl DaemonState {
    /// Wire the default adapters from config.
    pub fn new(config: Config) -> Result<Self> {
        let fingerprint_path = config.fingerprint.resolve_path()?;
        let fingerprint = VoiceFingerprint::load(fingerprint_path).with_settings(
            config.fingerprint.min_confidence,
            config.fingerprint.manual_weight,
            config.fingerprint.frequency_flush_interval,
        );

        let backend = OllamaBackend::new(
            config.semantic.base_url.clone(),
            config.semantic.model.clone(),
            Duration::from_secs(config.semantic.timeout_seconds),
            Duration::from_secs(config.semantic.health_timeout_seconds),
        )?;
        let resolver = IntentResolver::new(Box::new(backend), fingerprint, &config.semantic);

        let dispatcher = ActionDispatcher::new(Collaborators {
            media: Box::new(PlayerctlMedia::new(config.player.name.clone())),
            game: Box::new(BindingGameCommands::new(
                config.game.bindings.clone(),
                config.game.enabled,
            )),
            menu: Box::new(LogMenu::new()),
            notifier: Box::new(LogNotifier),
        });

        let router = CommandRouter::new(dispatcher, resolver, &config.semantic);
        Ok(Self::with_router(config, router))
    }

    pub fn with_router(config: Config, router: CommandRouter) -> Self {
        info!(
            semantic = config.semantic.enabled,
            model = %config.semantic.model,
            "Command router ready"
        );
        Self { config, router }
    }

    /// Route one utterance under the collaborators' current mode.
    pub async fn process(&mut self, text: &str) -> bool {
        let mode = self.router.current_mode();
        self.router.process(text, mode).await
    }

    pub fn set_game_mode(&mut self, enabled: bool) {
        self.router.set_game_mode(enabled);
    }

    pub fn train(&mut self, expected: &str, heard: &str) -> bool {
        self.router
            .resolver_mut()
            .fingerprint_mut()
            .add_manual_correction(expected, heard)
    }

    pub fn forget(&mut self, token: &str) -> bool {
        self.router.resolver_mut().fingerprint_mut().remove_pattern(token)
    }

    pub fn patterns(&self) -> Vec<PatternInfo> {
        self.router.resolver().fingerprint().patterns()
    }

    pub fn corrections(&self, text: &str) -> BTreeMap<String, String> {
        self.router.resolver().fingerprint().get_corrections_for(text)
    }

    pub fn clear_cache(&mut self) {
        self.router.resolver_mut().clear_cache();
    }

    pub fn get_status(&self) -> StatusInfo {
        let resolver = self.router.resolver();
        StatusInfo {
            is_running: true,
            gaming_active: self.router.current_mode().gaming_active,
            semantic_enabled: resolver.is_enabled(),
            semantic_available: resolver.health(),
            pattern_count: resolver.fingerprint().len(),
            cached_intents: resolver.cache_len(),
        }
    }

    pub fn shutdown(&mut self) {
        self.router.shutdown();
        info!("Daemon state flushed");
    }
}
