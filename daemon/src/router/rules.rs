//! Phrase tables and text predicates for keyword routing.
//!
//! Everything here is literal prefix/substring matching on text that the
//! upstream normalizer has already lower-cased.

use shared::ResolvedIntent;

/// Head substitutions for common mishearings of "play".
pub const MISHEARD_PLAY: &[(&str, &str)] = &[
    ("lay ", "play "),
    ("clay ", "play "),
    ("plate ", "play "),
    ("pray ", "play "),
    ("blay ", "play "),
    ("flay ", "play "),
];

/// Short controls dispatched without ever touching the semantic service.
pub const FAST_PATH: &[(&str, &str)] = &[
    ("next", "next_track"),
    ("skip", "next_track"),
    ("previous", "previous_track"),
    ("back", "previous_track"),
    ("pause", "pause"),
    ("stop", "stop"),
    ("resume", "resume"),
    ("volume up", "volume_up"),
    ("volume down", "volume_down"),
    ("louder", "volume_up"),
    ("quieter", "volume_down"),
    ("what's playing", "whats_playing"),
    ("whats playing", "whats_playing"),
    ("what is playing", "whats_playing"),
    ("now playing", "whats_playing"),
];

/// Media keywords for the first-two-token music heuristic.
pub const MUSIC_KEYWORDS: &[&str] = &[
    "play", "playing", "listen", "put", "shuffle", "queue", "music", "song", "album", "artist",
    "track", "random", "playlist",
];

pub const QUIT_PHRASES: &[&str] = &[
    "quit",
    "exit",
    "goodbye",
    "good bye",
    "terminate",
    "stop listening",
    "shut down",
];

pub const HELP_PHRASES: &[&str] = &["help", "what can i say", "list commands"];

pub const GAME_MODE_ON: &[&str] = &[
    "enable game mode",
    "game mode on",
    "activate game mode",
    "turn on game mode",
    "gaming mode on",
    "start gaming",
];

pub const GAME_MODE_OFF: &[&str] = &[
    "disable game mode",
    "game mode off",
    "deactivate game mode",
    "turn off game mode",
    "gaming mode off",
    "stop gaming",
];

pub const PLAYER_SWITCH_PREFIXES: &[&str] = &[
    "switch player to ",
    "change player to ",
    "switch to ",
    "use player ",
];

/// Contained media controls; compound phrases come before their parts.
pub const MEDIA_CONTROLS: &[(&str, &str)] = &[
    ("what's playing", "whats_playing"),
    ("whats playing", "whats_playing"),
    ("what is playing", "whats_playing"),
    ("now playing", "whats_playing"),
    ("volume up", "volume_up"),
    ("turn it up", "volume_up"),
    ("louder", "volume_up"),
    ("volume down", "volume_down"),
    ("turn it down", "volume_down"),
    ("quieter", "volume_down"),
    ("next", "next_track"),
    ("skip", "next_track"),
    ("previous", "previous_track"),
    ("go back", "previous_track"),
    ("unpause", "resume"),
    ("resume", "resume"),
    ("continue", "resume"),
    ("pause", "pause"),
    ("stop", "stop"),
];

pub const RANDOM_PREFIXES: &[&str] = &["play random", "play something random", "shuffle"];

/// (prefix, intent, parameter). Longer prefixes first.
pub const PLAYBACK_PREFIXES: &[(&str, &str, &str)] = &[
    ("list albums by ", "list_albums", "artist"),
    ("albums by ", "list_albums", "artist"),
    ("play songs by ", "play_artist", "artist"),
    ("play music by ", "play_artist", "artist"),
    ("play artist ", "play_artist", "artist"),
    ("play album ", "play_album", "album"),
    ("play the album ", "play_album", "album"),
    ("play playlist ", "play_playlist", "playlist"),
    ("play genre ", "play_genre", "genre"),
    ("listen to ", "play_any", "query"),
    ("put on ", "play_any", "query"),
    ("queue ", "play_any", "query"),
    ("play ", "play_any", "query"),
];

/// Whole-word (or whole-phrase) containment.
pub fn contains_phrase(text: &str, phrase: &str) -> bool {
    format!(" {} ", text).contains(&format!(" {} ", phrase))
}

/// Equal to, or starting with, `phrase` as a whole word.
pub fn starts_with_phrase(text: &str, phrase: &str) -> bool {
    text == phrase
        || text
            .strip_prefix(phrase)
            .is_some_and(|rest| rest.starts_with(' '))
}

pub fn apply_misheard_prefixes(text: &str) -> String {
    for (wrong, right) in MISHEARD_PLAY {
        if let Some(rest) = text.strip_prefix(wrong) {
            return format!("{}{}", right, rest);
        }
    }
    text.to_string()
}

/// Longer commands that begin with a fast-path word, e.g. "stop listening".
fn shadows_fast_path(text: &str) -> bool {
    QUIT_PHRASES
        .iter()
        .chain(GAME_MODE_ON)
        .chain(GAME_MODE_OFF)
        .any(|phrase| starts_with_phrase(text, phrase))
}

pub fn fast_path_intent(text: &str) -> Option<&'static str> {
    if shadows_fast_path(text) {
        return None;
    }
    FAST_PATH
        .iter()
        .find(|(phrase, _)| starts_with_phrase(text, phrase))
        .map(|(_, intent)| *intent)
}

pub fn is_music_likely(text: &str) -> bool {
    text.split_whitespace()
        .take(2)
        .any(|token| MUSIC_KEYWORDS.contains(&token))
}

pub fn is_quit(text: &str) -> bool {
    QUIT_PHRASES.iter().any(|p| contains_phrase(text, p))
}

pub fn is_help(text: &str) -> bool {
    HELP_PHRASES.iter().any(|p| contains_phrase(text, p))
}

pub fn game_mode_toggle(text: &str) -> Option<bool> {
    if GAME_MODE_ON.iter().any(|p| contains_phrase(text, p)) {
        Some(true)
    } else if GAME_MODE_OFF.iter().any(|p| contains_phrase(text, p)) {
        Some(false)
    } else {
        None
    }
}

pub fn player_switch_target(text: &str) -> Option<&str> {
    PLAYER_SWITCH_PREFIXES
        .iter()
        .find_map(|prefix| text.strip_prefix(prefix))
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

pub fn media_control_intent(text: &str) -> Option<&'static str> {
    MEDIA_CONTROLS
        .iter()
        .find(|(phrase, _)| contains_phrase(text, phrase))
        .map(|(_, intent)| *intent)
}

pub fn is_playback(text: &str) -> bool {
    RANDOM_PREFIXES.iter().any(|p| starts_with_phrase(text, p))
        || PLAYBACK_PREFIXES
            .iter()
            .any(|(prefix, _, _)| text.starts_with(prefix))
}

/// Turn a playback command into a keyword intent.
pub fn playback_intent(text: &str) -> Option<ResolvedIntent> {
    for prefix in RANDOM_PREFIXES {
        if starts_with_phrase(text, prefix) {
            let genre = text[prefix.len()..].trim();
            let intent = ResolvedIntent::keyword("play_random");
            return Some(if genre.is_empty() {
                intent
            } else {
                intent.with_param("genre", genre)
            });
        }
    }

    PLAYBACK_PREFIXES
        .iter()
        .find_map(|(prefix, intent, param)| {
            let value = text.strip_prefix(prefix)?.trim();
            (!value.is_empty()).then(|| ResolvedIntent::keyword(*intent).with_param(*param, value))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_misheard_play_is_fixed_at_head_only() {
        assert_eq!(apply_misheard_prefixes("lay abba"), "play abba");
        assert_eq!(apply_misheard_prefixes("clay some jazz"), "play some jazz");
        assert_eq!(apply_misheard_prefixes("tell me the lay of the land"), "tell me the lay of the land");
        assert_eq!(apply_misheard_prefixes("play abba"), "play abba");
    }

    #[test]
    fn test_fast_path_prefix_and_exact() {
        assert_eq!(fast_path_intent("next"), Some("next_track"));
        assert_eq!(fast_path_intent("next song"), Some("next_track"));
        assert_eq!(fast_path_intent("volume up"), Some("volume_up"));
        assert_eq!(fast_path_intent("what's playing"), Some("whats_playing"));
        assert_eq!(fast_path_intent("nextdoor"), None);
        assert_eq!(fast_path_intent("play next"), None);
    }

    #[test]
    fn test_longer_commands_shadow_fast_path() {
        assert_eq!(fast_path_intent("stop listening"), None);
        assert_eq!(fast_path_intent("stop gaming"), None);
        assert_eq!(fast_path_intent("stop the music"), Some("stop"));
        assert!(is_quit("stop listening"));
        assert_eq!(game_mode_toggle("stop gaming"), Some(false));
        assert_eq!(game_mode_toggle("start gaming"), Some(true));
    }

    #[test]
    fn test_music_heuristic_looks_at_two_tokens() {
        assert!(is_music_likely("play ever"));
        assert!(is_music_likely("some music please"));
        assert!(!is_music_likely("fire the main gun and play"));
        assert!(!is_music_likely("deploy landing gear"));
    }

    #[test]
    fn test_quit_matches_whole_phrases() {
        assert!(is_quit("quit"));
        assert!(is_quit("ok goodbye"));
        assert!(is_quit("please shut down now"));
        assert!(!is_quit("quitting time playlist"));
    }

    #[test]
    fn test_game_mode_toggle() {
        assert_eq!(game_mode_toggle("enable game mode"), Some(true));
        assert_eq!(game_mode_toggle("game mode off"), Some(false));
        assert_eq!(game_mode_toggle("game over"), None);
    }

    #[test]
    fn test_player_switch_target() {
        assert_eq!(player_switch_target("switch to spotify"), Some("spotify"));
        assert_eq!(player_switch_target("switch player to vlc"), Some("vlc"));
        assert_eq!(player_switch_target("switch to "), None);
        assert_eq!(player_switch_target("play spotify"), None);
    }

    #[test]
    fn test_media_control_prefers_compound_phrases() {
        assert_eq!(media_control_intent("turn the volume up"), Some("volume_up"));
        assert_eq!(media_control_intent("continue please"), Some("resume"));
        assert_eq!(media_control_intent("please volume up"), Some("volume_up"));
        assert_eq!(media_control_intent("unpause it"), Some("resume"));
        assert_eq!(media_control_intent("skip this one"), Some("next_track"));
        assert_eq!(media_control_intent("hold position"), None);
    }

    #[test]
    fn test_playback_intents() {
        let intent = playback_intent("play random anything").unwrap();
        assert_eq!(intent.name, "play_random");
        assert_eq!(intent.param("genre"), Some("anything"));

        let intent = playback_intent("shuffle").unwrap();
        assert_eq!(intent.name, "play_random");
        assert!(intent.parameters.is_empty());

        let intent = playback_intent("play album arrival").unwrap();
        assert_eq!(intent.name, "play_album");
        assert_eq!(intent.param("album"), Some("arrival"));

        let intent = playback_intent("play songs by abba").unwrap();
        assert_eq!(intent.name, "play_artist");
        assert_eq!(intent.param("artist"), Some("abba"));

        let intent = playback_intent("listen to waterloo").unwrap();
        assert_eq!(intent.name, "play_any");
        assert_eq!(intent.param("query"), Some("waterloo"));

        assert!(playback_intent("play ").is_none());
        assert!(playback_intent("open the pod bay doors").is_none());
    }

    #[test]
    fn test_randomize_is_not_random() {
        assert!(!is_playback("shuffleboard"));
        assert!(is_playback("shuffle jazz"));
    }
}
