//! Ports to the world outside the router: media player, game input,
//! selection menu and speech output. The daemon wires in the adapters from
//! the submodules; tests wire in recording fakes.

pub mod console;
pub mod game;
pub mod playerctl;

pub use console::{LogMenu, LogNotifier};
pub use game::BindingGameCommands;
pub use playerctl::PlayerctlMedia;

use anyhow::Result;

/// Optional media features, declared once by the player and read by the
/// dispatcher at construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaCapabilities {
    pub play_random: bool,
    pub play_random_genre: bool,
    pub artist_albums: bool,
    pub library_artists: bool,
    pub switch_player: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub label: String,
    pub value: String,
}

impl MenuItem {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayOutcome {
    /// Playback started; carries a description of what is playing.
    Started(String),
    /// Several matches; the user has to pick one.
    Choices(Vec<MenuItem>),
    NotFound,
}

pub trait MediaPlayer: Send {
    fn play_pause(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn next_track(&mut self) -> Result<()>;
    fn previous_track(&mut self) -> Result<()>;
    fn volume_up(&mut self) -> Result<()>;
    fn volume_down(&mut self) -> Result<()>;
    fn whats_playing(&mut self) -> Result<Option<String>>;
    fn play_any(&mut self, query: &str) -> Result<PlayOutcome>;

    fn capabilities(&self) -> MediaCapabilities {
        MediaCapabilities::default()
    }

    fn play_random(&mut self) -> Result<PlayOutcome> {
        Ok(PlayOutcome::NotFound)
    }

    fn play_random_genre(&mut self, _genre: &str) -> Result<PlayOutcome> {
        Ok(PlayOutcome::NotFound)
    }

    fn get_artist_albums(&mut self, _artist: &str) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn get_all_artists(&mut self, _limit: usize) -> Result<Vec<String>> {
        Ok(Vec::new())
    }

    fn switch_player(&mut self, _name: &str) -> Result<bool> {
        Ok(false)
    }
}

pub trait GameCommands: Send {
    /// Returns whether the text was a game command, plus an optional message
    /// for the user.
    fn handle_command(&mut self, text: &str) -> (bool, Option<String>);
    fn game_mode_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
}

pub trait SelectionMenu: Send {
    fn set_items(&mut self, items: Vec<MenuItem>, label: &str);
    fn speak_options(&mut self);
    fn clear(&mut self);
    fn is_active(&self) -> bool;
    /// Resolve a follow-up like "two" or "option 3" against the open menu.
    fn handle_selection(&mut self, text: &str) -> Option<MenuItem>;
}

/// Speech output boundary.
pub trait Notifier: Send {
    fn announce(&mut self, message: &str);
}

pub struct Collaborators {
    pub media: Box<dyn MediaPlayer>,
    pub game: Box<dyn GameCommands>,
    pub menu: Box<dyn SelectionMenu>,
    pub notifier: Box<dyn Notifier>,
}
