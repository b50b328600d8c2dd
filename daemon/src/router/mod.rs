pub mod rules;

use crate::config::SemanticConfig;
use crate::dispatch::ActionDispatcher;
use crate::intent::{IntentError, IntentResolver};
use shared::{ResolvedIntent, RoutingMode};
use tracing::{debug, info, warn};

const HELP_TEXT: &str = "Say play followed by an artist, album or song. \
    Say next, previous, pause, stop, volume up or volume down to control playback. \
    Say enable game mode or disable game mode to toggle game commands. Say quit to exit.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Handled,
    Declined,
    Quit,
}

/// One row of the keyword table: a cheap predicate and the handler it guards.
struct KeywordRule {
    name: &'static str,
    matches: fn(&str, RoutingMode) -> bool,
    handle: fn(&mut CommandRouter, &str) -> Outcome,
}

const QUIT_RULE: KeywordRule = KeywordRule {
    name: "quit",
    matches: |text, _| rules::is_quit(text),
    handle: CommandRouter::handle_quit,
};

const HELP_RULE: KeywordRule = KeywordRule {
    name: "help",
    matches: |text, _| rules::is_help(text),
    handle: CommandRouter::handle_help,
};

const GAME_TOGGLE_RULE: KeywordRule = KeywordRule {
    name: "game_toggle",
    matches: |text, _| rules::game_mode_toggle(text).is_some(),
    handle: CommandRouter::handle_game_toggle,
};

const PLAYER_SWITCH_RULE: KeywordRule = KeywordRule {
    name: "player_switch",
    matches: |text, _| rules::player_switch_target(text).is_some(),
    handle: CommandRouter::handle_player_switch,
};

const GAME_COMMAND_RULE: KeywordRule = KeywordRule {
    name: "game_command",
    matches: |_, mode| mode.gaming_active,
    handle: CommandRouter::handle_game_command,
};

const MEDIA_CONTROL_RULE: KeywordRule = KeywordRule {
    name: "media_control",
    matches: |text, _| rules::media_control_intent(text).is_some(),
    handle: CommandRouter::handle_media_control,
};

const PLAYBACK_RULE: KeywordRule = KeywordRule {
    name: "playback",
    matches: |text, _| rules::is_playback(text),
    handle: CommandRouter::handle_playback,
};

/// Priority order for text that does not look like a music request.
const GENERAL_RULES: &[KeywordRule] = &[
    QUIT_RULE,
    HELP_RULE,
    GAME_TOGGLE_RULE,
    PLAYER_SWITCH_RULE,
    GAME_COMMAND_RULE,
    MEDIA_CONTROL_RULE,
    PLAYBACK_RULE,
];

/// Deterministic fallback once semantic extraction has had its chance.
const MUSIC_FALLBACK_RULES: &[KeywordRule] = &[MEDIA_CONTROL_RULE, PLAYBACK_RULE];

/// Top-level entry point for recognized utterances.
///
/// Routing, first match wins:
/// 1. open selection menu follow-ups;
/// 2. head fixes for misheard "play";
/// 3. fast-path controls, never semantic;
/// 4. music-shaped text: semantic extraction first, then media/playback keywords;
/// 5. everything else through [`GENERAL_RULES`].
pub struct CommandRouter {
    dispatcher: ActionDispatcher,
    resolver: IntentResolver,
    confidence_threshold: f32,
    max_entities: usize,
    library_artists: Option<Vec<String>>,
}

impl CommandRouter {
    pub fn new(dispatcher: ActionDispatcher, resolver: IntentResolver, config: &SemanticConfig) -> Self {
        Self {
            dispatcher,
            resolver,
            confidence_threshold: config.confidence_threshold,
            max_entities: config.max_entities,
            library_artists: None,
        }
    }

    /// Route one utterance. Returns false only when the user asked to quit.
    pub async fn process(&mut self, text: &str, mode: RoutingMode) -> bool {
        let text = text.trim();
        if text.is_empty() {
            self.report_ignored(text);
            return true;
        }

        self.resolver.fingerprint_mut().record_command(text);

        if mode.selection_active {
            if let Some(item) = self.dispatcher.menu_selection(text) {
                info!(choice = %item.label, "Menu selection");
                let intent = ResolvedIntent::keyword("play_selection").with_param("query", item.value);
                self.dispatcher.dispatch(&intent);
                return true;
            }
            debug!(text, "Not a menu choice, closing menu");
            self.dispatcher.clear_menu();
        }

        let text = rules::apply_misheard_prefixes(text);

        if let Some(intent) = rules::fast_path_intent(&text) {
            debug!(text = %text, intent, "Fast path");
            if self.dispatcher.dispatch(&ResolvedIntent::keyword(intent)) {
                return true;
            }
            self.report_ignored(&text);
            return true;
        }

        if rules::is_music_likely(&text) {
            let strategy = if mode.gaming_active {
                "semantic-first (gaming)"
            } else {
                "semantic-first"
            };
            debug!(text = %text, strategy, "Music-shaped utterance");

            if self.try_semantic(&text).await {
                return true;
            }
            return self.run_rules(MUSIC_FALLBACK_RULES, &text, mode);
        }

        self.run_rules(GENERAL_RULES, &text, mode)
    }

    fn run_rules(&mut self, table: &[KeywordRule], text: &str, mode: RoutingMode) -> bool {
        for rule in table {
            if !(rule.matches)(text, mode) {
                continue;
            }
            match (rule.handle)(self, text) {
                Outcome::Handled => {
                    debug!(rule = rule.name, "Keyword rule handled utterance");
                    return true;
                }
                Outcome::Quit => return false,
                Outcome::Declined => debug!(rule = rule.name, "Keyword rule declined"),
            }
        }

        self.report_ignored(text);
        true
    }

    /// Semantic path. Every failure is absorbed here so keyword routing
    /// always gets its turn.
    async fn try_semantic(&mut self, text: &str) -> bool {
        if !self.resolver.is_enabled() {
            return false;
        }

        let entities = self.library_entities();
        let extraction = match self.resolver.extract_intent(text, &entities).await {
            Ok(extraction) => extraction,
            Err(IntentError::Disabled) => return false,
            Err(IntentError::Timeout) => {
                warn!(text, "Semantic extraction timed out, falling back to keywords");
                return false;
            }
            Err(e) => {
                warn!(text, error = %e, "Semantic extraction failed, falling back to keywords");
                return false;
            }
        };

        let intent = extraction.intent;
        // Written so a NaN confidence never clears the threshold.
        if !(intent.confidence > self.confidence_threshold) {
            info!(
                intent = %intent.name,
                confidence = intent.confidence,
                threshold = self.confidence_threshold,
                "Semantic result below threshold"
            );
            return false;
        }

        if !self.dispatcher.dispatch(&intent) {
            debug!(intent = %intent.name, "Semantic intent not actionable");
            return false;
        }

        self.resolver.learn_from(text, &intent);
        true
    }

    fn library_entities(&mut self) -> Vec<String> {
        if self.library_artists.is_none() {
            self.library_artists = Some(self.dispatcher.library_artists(self.max_entities));
        }
        self.library_artists.clone().unwrap_or_default()
    }

    fn handle_quit(&mut self, _text: &str) -> Outcome {
        info!("Quit command received");
        self.dispatcher.stop_playback();
        self.dispatcher.announce("Goodbye");
        self.resolver.fingerprint_mut().flush();
        Outcome::Quit
    }

    fn handle_help(&mut self, _text: &str) -> Outcome {
        self.dispatcher.announce(HELP_TEXT);
        Outcome::Handled
    }

    fn handle_game_toggle(&mut self, text: &str) -> Outcome {
        let Some(enabled) = rules::game_mode_toggle(text) else {
            return Outcome::Declined;
        };
        self.dispatcher.set_game_mode(enabled);
        self.dispatcher
            .announce(if enabled { "Game mode on" } else { "Game mode off" });
        Outcome::Handled
    }

    fn handle_player_switch(&mut self, text: &str) -> Outcome {
        let Some(name) = rules::player_switch_target(text) else {
            return Outcome::Declined;
        };
        self.dispatcher.switch_player(name);
        Outcome::Handled
    }

    fn handle_game_command(&mut self, text: &str) -> Outcome {
        match self.dispatcher.game_command(text) {
            (true, message) => {
                if let Some(message) = message {
                    debug!(message = %message, "Game command handled");
                }
                Outcome::Handled
            }
            (false, _) => Outcome::Declined,
        }
    }

    fn handle_media_control(&mut self, text: &str) -> Outcome {
        match rules::media_control_intent(text) {
            Some(intent) if self.dispatcher.dispatch(&ResolvedIntent::keyword(intent)) => {
                Outcome::Handled
            }
            _ => Outcome::Declined,
        }
    }

    fn handle_playback(&mut self, text: &str) -> Outcome {
        match rules::playback_intent(text) {
            Some(intent) if self.dispatcher.dispatch(&intent) => Outcome::Handled,
            _ => Outcome::Declined,
        }
    }

    fn report_ignored(&mut self, text: &str) {
        info!(text, "Command ignored");
        self.dispatcher.announce("Command ignored");
    }

    /// Routing flags as currently reported by the collaborators.
    pub fn current_mode(&self) -> RoutingMode {
        RoutingMode {
            gaming_active: self.dispatcher.game_mode_enabled(),
            selection_active: self.dispatcher.menu_active(),
        }
    }

    pub fn set_game_mode(&mut self, enabled: bool) {
        self.dispatcher.set_game_mode(enabled);
    }

    pub fn resolver(&self) -> &IntentResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut IntentResolver {
        &mut self.resolver
    }

    /// Persist anything still batched in memory.
    pub fn shutdown(&mut self) {
        self.resolver.fingerprint_mut().flush();
    }
}
