use super::IntentError;
use crate::fingerprint::CorrectionHint;
use serde_json::Value;
use shared::ResolvedIntent;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Mishearings common to most speech engines, independent of the speaker.
const ASR_CONFUSIONS: &[(&str, &str)] = &[
    ("lay", "play"),
    ("clay", "play"),
    ("ever", "abba"),
    ("a bar", "abba"),
    ("metallic a", "metallica"),
    ("queens", "queen"),
    ("pink lloyd", "pink floyd"),
    ("the beetles", "the beatles"),
    ("nervana", "nirvana"),
];

const INTENT_SCHEMA: &str = r#"Intents and parameters:
- play_artist: {"artist"}
- play_album: {"album", optional "artist"}
- play_song: {"song", optional "artist"}
- play_genre: {"genre"}
- play_random: {optional "genre"}
- play_playlist: {"playlist"}
- search: {"query"}
- list_albums: {"artist"}
- next_track, previous_track, pause, resume, stop, volume_up, volume_down, whats_playing: {}
- unknown: {} when the text is not a media command"#;

const WORKED_EXAMPLES: &str = r#"Examples:
"play ever" -> {"intent": "play_artist", "parameters": {"artist": "abba"}, "confidence": 0.9}
"play the album thriller" -> {"intent": "play_album", "parameters": {"album": "thriller"}, "confidence": 0.95}
"play some jazz" -> {"intent": "play_genre", "parameters": {"genre": "jazz"}, "confidence": 0.9}
"play random rock" -> {"intent": "play_random", "parameters": {"genre": "rock"}, "confidence": 0.9}
"play bohemian rhapsody by queen" -> {"intent": "play_song", "parameters": {"song": "bohemian rhapsody", "artist": "queen"}, "confidence": 0.95}"#;

/// Assemble the extraction prompt for one utterance.
pub fn build_prompt(text: &str, hints: &[CorrectionHint], entities: &[String]) -> String {
    let mut prompt = String::from(
        "You convert voice commands for a music player into JSON. \
         The text comes from speech recognition and may contain mishearings.\n\n",
    );

    prompt.push_str("Known speech recognition confusions:\n");
    for (heard, meant) in ASR_CONFUSIONS {
        let _ = writeln!(prompt, "- \"{}\" usually means \"{}\"", heard, meant);
    }

    if !hints.is_empty() {
        prompt.push_str("\nThis user's voice is often misheard as follows:\n");
        for hint in hints {
            let _ = writeln!(
                prompt,
                "- \"{}\" usually means \"{}\" (confidence {:.2})",
                hint.token, hint.correction, hint.confidence
            );
        }
    }

    if !entities.is_empty() {
        let _ = writeln!(
            prompt,
            "\nArtists in the user's library: {}",
            entities.join(", ")
        );
    }

    let _ = write!(
        prompt,
        "\n{}\n\n{}\n\nRespond with only a JSON object with the fields \
         \"intent\", \"parameters\" and \"confidence\" (0.0 to 1.0).\n\n\
         Command: \"{}\"\n",
        INTENT_SCHEMA, WORKED_EXAMPLES, text
    );

    prompt
}

/// Parse the model output. Accepts the outermost `{...}` span so that stray
/// prose around the object does not reject an otherwise valid answer.
pub fn parse_response(raw: &str) -> Result<ResolvedIntent, IntentError> {
    let start = raw
        .find('{')
        .ok_or_else(|| IntentError::MalformedResponse("no JSON object in response".to_string()))?;
    let end = raw
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| IntentError::MalformedResponse("unterminated JSON object".to_string()))?;

    let value: Value = serde_json::from_str(&raw[start..=end])
        .map_err(|e| IntentError::MalformedResponse(e.to_string()))?;

    let intent = value
        .get("intent")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| IntentError::MalformedResponse("missing \"intent\" field".to_string()))?;

    let mut parameters = BTreeMap::new();
    if let Some(Value::Object(map)) = value.get("parameters") {
        for (key, value) in map {
            let text = match value {
                Value::Null => continue,
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            };
            parameters.insert(key.clone(), text);
        }
    }

    let confidence = match value.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    let confidence = if confidence.is_finite() { confidence } else { 0.0 };

    Ok(ResolvedIntent::semantic(
        intent.to_lowercase(),
        parameters,
        confidence as f32,
    ))
}
