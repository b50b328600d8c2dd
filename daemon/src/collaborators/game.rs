use super::GameCommands;
use crate::config::GameBinding;
use tracing::info;

/// Phrase → action table loaded from `[game]` in the config.
///
/// Key injection lives outside this daemon; a matched binding is logged and
/// its action reported back to the user.
pub struct BindingGameCommands {
    bindings: Vec<GameBinding>,
    enabled: bool,
}

impl BindingGameCommands {
    pub fn new(bindings: Vec<GameBinding>, enabled: bool) -> Self {
        let mut bindings: Vec<GameBinding> = bindings
            .into_iter()
            .map(|b| GameBinding {
                phrase: b.phrase.trim().to_lowercase(),
                action: b.action,
            })
            .filter(|b| !b.phrase.is_empty())
            .collect();
        // Longest phrase first so "fire missiles" beats "fire".
        bindings.sort_by(|a, b| b.phrase.len().cmp(&a.phrase.len()));

        info!("Loaded {} game bindings", bindings.len());
        Self { bindings, enabled }
    }
}

impl GameCommands for BindingGameCommands {
    fn handle_command(&mut self, text: &str) -> (bool, Option<String>) {
        if !self.enabled {
            return (false, None);
        }

        let padded = format!(" {} ", text.trim().to_lowercase());
        match self
            .bindings
            .iter()
            .find(|b| padded.contains(&format!(" {} ", b.phrase)))
        {
            Some(binding) => {
                info!(phrase = %binding.phrase, action = %binding.action, "Game command");
                (true, Some(binding.action.clone()))
            }
            None => (false, None),
        }
    }

    fn game_mode_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        info!("Game mode {}", if enabled { "enabled" } else { "disabled" });
    }
}
