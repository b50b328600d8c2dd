use crate::collaborators::{
    Collaborators, GameCommands, MediaCapabilities, MediaPlayer, MenuItem, Notifier, PlayOutcome,
    SelectionMenu,
};
use anyhow::Result;
use shared::ResolvedIntent;
use tracing::{debug, info, warn};

/// Genre words that really mean "anything at all".
const GENERIC_GENRES: &[&str] = &[
    "anything", "something", "music", "whatever", "songs", "any", "stuff",
];

/// Executes resolved intents against the collaborators.
pub struct ActionDispatcher {
    media: Box<dyn MediaPlayer>,
    game: Box<dyn GameCommands>,
    menu: Box<dyn SelectionMenu>,
    notifier: Box<dyn Notifier>,
    capabilities: MediaCapabilities,
}

impl ActionDispatcher {
    pub fn new(collaborators: Collaborators) -> Self {
        let capabilities = collaborators.media.capabilities();
        debug!(?capabilities, "Media capabilities resolved");
        Self {
            media: collaborators.media,
            game: collaborators.game,
            menu: collaborators.menu,
            notifier: collaborators.notifier,
            capabilities,
        }
    }

    pub fn capabilities(&self) -> MediaCapabilities {
        self.capabilities
    }

    /// Run one intent. Returns false when the intent is not something this
    /// dispatcher can act on, or the collaborator failed before doing anything.
    pub fn dispatch(&mut self, intent: &ResolvedIntent) -> bool {
        info!(
            intent = %intent.name,
            source = ?intent.source,
            confidence = intent.confidence,
            "Dispatching intent"
        );

        match intent.name.as_str() {
            "next_track" => self.control("next track", |m| m.next_track()),
            "previous_track" => self.control("previous track", |m| m.previous_track()),
            "pause" | "resume" | "play_pause" => self.control("play/pause", |m| m.play_pause()),
            "stop" => self.control("stop", |m| m.stop()),
            "volume_up" => self.control("volume up", |m| m.volume_up()),
            "volume_down" => self.control("volume down", |m| m.volume_down()),
            "whats_playing" => self.whats_playing(),
            "play_random" | "play_genre" => self.play_random(intent.param("genre")),
            "list_albums" => match intent.param("artist") {
                Some(artist) => self.list_albums(artist),
                None => false,
            },
            "play_artist" | "play_album" | "play_song" | "play_playlist" | "search"
            | "play_any" | "play_selection" => match entity_query(intent) {
                Some(query) => self.play_query(&query),
                None => false,
            },
            other => {
                debug!("No action for intent '{}'", other);
                false
            }
        }
    }

    fn control<F>(&mut self, label: &str, action: F) -> bool
    where
        F: FnOnce(&mut dyn MediaPlayer) -> Result<()>,
    {
        match action(self.media.as_mut()) {
            Ok(()) => {
                debug!("Media control: {}", label);
                true
            }
            Err(e) => {
                warn!("Media control '{}' failed: {}", label, e);
                false
            }
        }
    }

    fn whats_playing(&mut self) -> bool {
        match self.media.whats_playing() {
            Ok(Some(now)) => {
                self.notifier.announce(&format!("Now playing {}", now));
                true
            }
            Ok(None) => {
                self.notifier.announce("Nothing is playing");
                true
            }
            Err(e) => {
                warn!("Could not read what is playing: {}", e);
                false
            }
        }
    }

    /// Random play degrades from genre-random to generic random to a plain
    /// search, depending on what the player supports.
    fn play_random(&mut self, genre: Option<&str>) -> bool {
        let genre = genre
            .map(str::trim)
            .filter(|g| !g.is_empty() && !GENERIC_GENRES.contains(g));

        let outcome = match genre {
            Some(genre) if self.capabilities.play_random_genre => {
                self.media.play_random_genre(genre)
            }
            Some(genre) if !self.capabilities.play_random => self.media.play_any(genre),
            _ if self.capabilities.play_random => self.media.play_random(),
            _ => self.media.play_any("random"),
        };

        let label = genre.unwrap_or("random music");
        self.finish_play(outcome, label)
    }

    fn play_query(&mut self, query: &str) -> bool {
        let outcome = self.media.play_any(query);
        self.finish_play(outcome, query)
    }

    fn finish_play(&mut self, outcome: Result<PlayOutcome>, label: &str) -> bool {
        match outcome {
            Ok(PlayOutcome::Started(description)) => {
                self.notifier.announce(&format!("Playing {}", description));
                true
            }
            Ok(PlayOutcome::Choices(items)) if !items.is_empty() => {
                self.offer(items, &format!("Results for {}", label));
                true
            }
            Ok(_) => {
                self.notifier
                    .announce(&format!("Couldn't find anything for {}", label));
                true
            }
            Err(e) => {
                warn!("Playback of '{}' failed: {}", label, e);
                false
            }
        }
    }

    fn list_albums(&mut self, artist: &str) -> bool {
        if !self.capabilities.artist_albums {
            debug!("Player cannot list albums, searching instead");
            return self.play_query(artist);
        }

        match self.media.get_artist_albums(artist) {
            Ok(albums) if !albums.is_empty() => {
                let items = albums
                    .into_iter()
                    .map(|album| MenuItem::new(album.clone(), album))
                    .collect();
                self.offer(items, &format!("Albums by {}", artist));
                true
            }
            Ok(_) => {
                self.notifier
                    .announce(&format!("No albums found for {}", artist));
                true
            }
            Err(e) => {
                warn!("Listing albums for '{}' failed: {}", artist, e);
                false
            }
        }
    }

    fn offer(&mut self, items: Vec<MenuItem>, label: &str) {
        self.menu.set_items(items, label);
        self.menu.speak_options();
    }

    /// Library artists used to ground semantic extraction.
    pub fn library_artists(&mut self, limit: usize) -> Vec<String> {
        if !self.capabilities.library_artists {
            return Vec::new();
        }
        match self.media.get_all_artists(limit) {
            Ok(mut artists) => {
                artists.truncate(limit);
                artists
            }
            Err(e) => {
                warn!("Could not list library artists: {}", e);
                Vec::new()
            }
        }
    }

    pub fn switch_player(&mut self, name: &str) -> bool {
        if !self.capabilities.switch_player {
            self.notifier.announce("Switching players is not supported");
            return false;
        }
        match self.media.switch_player(name) {
            Ok(true) => {
                self.notifier.announce(&format!("Switched to {}", name));
                true
            }
            Ok(false) => {
                self.notifier.announce(&format!("No player called {}", name));
                false
            }
            Err(e) => {
                warn!("Switching player to '{}' failed: {}", name, e);
                false
            }
        }
    }

    pub fn stop_playback(&mut self) {
        if let Err(e) = self.media.stop() {
            warn!("Failed to stop playback: {}", e);
        }
    }

    pub fn game_command(&mut self, text: &str) -> (bool, Option<String>) {
        self.game.handle_command(text)
    }

    pub fn game_mode_enabled(&self) -> bool {
        self.game.game_mode_enabled()
    }

    pub fn set_game_mode(&mut self, enabled: bool) {
        self.game.set_enabled(enabled);
    }

    pub fn menu_active(&self) -> bool {
        self.menu.is_active()
    }

    pub fn menu_selection(&mut self, text: &str) -> Option<MenuItem> {
        self.menu.handle_selection(text)
    }

    pub fn clear_menu(&mut self) {
        self.menu.clear();
    }

    pub fn announce(&mut self, message: &str) {
        self.notifier.announce(message);
    }
}

/// Search text for a play intent: the entity plus the artist when both exist.
fn entity_query(intent: &ResolvedIntent) -> Option<String> {
    let entity = ["song", "track", "title", "album", "playlist", "query", "artist"]
        .iter()
        .find_map(|key| intent.param(key))?;

    match intent.param("artist") {
        Some(artist) if artist != entity => Some(format!("{} {}", entity, artist)),
        _ => Some(entity.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{LogMenu, LogNotifier};
    use std::sync::{Arc, Mutex};

    type Calls = Arc<Mutex<Vec<String>>>;

    struct FakeMedia {
        calls: Calls,
        capabilities: MediaCapabilities,
        search: PlayOutcome,
    }

    impl FakeMedia {
        fn record(&self, call: impl Into<String>) {
            self.calls.lock().unwrap().push(call.into());
        }
    }

    impl MediaPlayer for FakeMedia {
        fn play_pause(&mut self) -> Result<()> {
            self.record("play_pause");
            Ok(())
        }
        fn stop(&mut self) -> Result<()> {
            self.record("stop");
            Ok(())
        }
        fn next_track(&mut self) -> Result<()> {
            self.record("next_track");
            Ok(())
        }
        fn previous_track(&mut self) -> Result<()> {
            self.record("previous_track");
            Ok(())
        }
        fn volume_up(&mut self) -> Result<()> {
            Err(anyhow::anyhow!("mixer gone"))
        }
        fn volume_down(&mut self) -> Result<()> {
            self.record("volume_down");
            Ok(())
        }
        fn whats_playing(&mut self) -> Result<Option<String>> {
            Ok(Some("Dancing Queen by ABBA".to_string()))
        }
        fn play_any(&mut self, query: &str) -> Result<PlayOutcome> {
            self.record(format!("play_any({})", query));
            Ok(self.search.clone())
        }
        fn capabilities(&self) -> MediaCapabilities {
            self.capabilities
        }
        fn play_random(&mut self) -> Result<PlayOutcome> {
            self.record("play_random");
            Ok(PlayOutcome::Started("shuffle".to_string()))
        }
        fn play_random_genre(&mut self, genre: &str) -> Result<PlayOutcome> {
            self.record(format!("play_random_genre({})", genre));
            Ok(PlayOutcome::Started(genre.to_string()))
        }
        fn get_artist_albums(&mut self, _artist: &str) -> Result<Vec<String>> {
            Ok(vec!["Arrival".to_string(), "Voulez-Vous".to_string()])
        }
    }

    struct NoGame;

    impl GameCommands for NoGame {
        fn handle_command(&mut self, _text: &str) -> (bool, Option<String>) {
            (false, None)
        }
        fn game_mode_enabled(&self) -> bool {
            false
        }
        fn set_enabled(&mut self, _enabled: bool) {}
    }

    fn dispatcher(capabilities: MediaCapabilities, search: PlayOutcome) -> (ActionDispatcher, Calls) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let media = FakeMedia {
            calls: calls.clone(),
            capabilities,
            search,
        };
        let dispatcher = ActionDispatcher::new(Collaborators {
            media: Box::new(media),
            game: Box::new(NoGame),
            menu: Box::new(LogMenu::new()),
            notifier: Box::new(LogNotifier),
        });
        (dispatcher, calls)
    }

    fn started() -> PlayOutcome {
        PlayOutcome::Started("it".to_string())
    }

    #[test]
    fn test_transport_controls() {
        let (mut d, calls) = dispatcher(MediaCapabilities::default(), started());
        assert!(d.dispatch(&ResolvedIntent::keyword("next_track")));
        assert!(d.dispatch(&ResolvedIntent::keyword("resume")));
        assert!(d.dispatch(&ResolvedIntent::keyword("stop")));
        assert_eq!(*calls.lock().unwrap(), vec!["next_track", "play_pause", "stop"]);
    }

    #[test]
    fn test_failed_control_is_not_handled() {
        let (mut d, _) = dispatcher(MediaCapabilities::default(), started());
        assert!(!d.dispatch(&ResolvedIntent::keyword("volume_up")));
    }

    #[test]
    fn test_unknown_intent_is_not_handled() {
        let (mut d, calls) = dispatcher(MediaCapabilities::default(), started());
        assert!(!d.dispatch(&ResolvedIntent::keyword("unknown")));
        assert!(!d.dispatch(&ResolvedIntent::keyword("play_artist")));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_random_prefers_genre_capability() {
        let caps = MediaCapabilities {
            play_random: true,
            play_random_genre: true,
            ..MediaCapabilities::default()
        };
        let (mut d, calls) = dispatcher(caps, started());
        d.dispatch(&ResolvedIntent::keyword("play_random").with_param("genre", "jazz"));
        assert_eq!(*calls.lock().unwrap(), vec!["play_random_genre(jazz)"]);
    }

    #[test]
    fn test_random_generic_genre_uses_plain_random() {
        let caps = MediaCapabilities {
            play_random: true,
            ..MediaCapabilities::default()
        };
        let (mut d, calls) = dispatcher(caps, started());
        d.dispatch(&ResolvedIntent::keyword("play_random").with_param("genre", "anything"));
        assert_eq!(*calls.lock().unwrap(), vec!["play_random"]);
    }

    #[test]
    fn test_random_genre_without_genre_capability_uses_plain_random() {
        let caps = MediaCapabilities {
            play_random: true,
            ..MediaCapabilities::default()
        };
        let (mut d, calls) = dispatcher(caps, started());
        d.dispatch(&ResolvedIntent::keyword("play_genre").with_param("genre", "jazz"));
        assert_eq!(*calls.lock().unwrap(), vec!["play_random"]);
    }

    #[test]
    fn test_random_without_capabilities_searches() {
        let (mut d, calls) = dispatcher(MediaCapabilities::default(), started());
        d.dispatch(&ResolvedIntent::keyword("play_random").with_param("genre", "jazz"));
        d.dispatch(&ResolvedIntent::keyword("play_random"));
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["play_any(jazz)", "play_any(random)"]
        );
    }

    #[test]
    fn test_play_song_with_artist_builds_query() {
        let (mut d, calls) = dispatcher(MediaCapabilities::default(), started());
        let intent = ResolvedIntent::keyword("play_song")
            .with_param("song", "waterloo")
            .with_param("artist", "abba");
        assert!(d.dispatch(&intent));
        assert_eq!(*calls.lock().unwrap(), vec!["play_any(waterloo abba)"]);
    }

    #[test]
    fn test_multiple_results_open_menu() {
        let choices = PlayOutcome::Choices(vec![
            MenuItem::new("Waterloo (live)", "waterloo live"),
            MenuItem::new("Waterloo", "waterloo"),
        ]);
        let (mut d, _) = dispatcher(MediaCapabilities::default(), choices);
        assert!(d.dispatch(&ResolvedIntent::keyword("play_any").with_param("query", "waterloo")));
        assert!(d.menu_active());

        let picked = d.menu_selection("two").unwrap();
        assert_eq!(picked.value, "waterloo");
        assert!(!d.menu_active());
    }

    #[test]
    fn test_clear_menu_closes_open_choices() {
        let choices = PlayOutcome::Choices(vec![
            MenuItem::new("Waterloo (live)", "waterloo live"),
            MenuItem::new("Waterloo", "waterloo"),
        ]);
        let (mut d, _) = dispatcher(MediaCapabilities::default(), choices);
        d.dispatch(&ResolvedIntent::keyword("play_any").with_param("query", "waterloo"));
        assert!(d.menu_active());

        d.clear_menu();
        assert!(!d.menu_active());
        assert_eq!(d.menu_selection("two"), None);
    }

    #[test]
    fn test_list_albums_opens_menu_when_supported() {
        let caps = MediaCapabilities {
            artist_albums: true,
            ..MediaCapabilities::default()
        };
        let (mut d, _) = dispatcher(caps, started());
        assert!(d.dispatch(&ResolvedIntent::keyword("list_albums").with_param("artist", "abba")));
        assert!(d.menu_active());
    }

    #[test]
    fn test_library_artists_requires_capability() {
        let (mut d, _) = dispatcher(MediaCapabilities::default(), started());
        assert!(d.library_artists(50).is_empty());
    }

    #[test]
    fn test_switch_player_without_capability() {
        let (mut d, _) = dispatcher(MediaCapabilities::default(), started());
        assert!(!d.switch_player("spotify"));
    }
}
