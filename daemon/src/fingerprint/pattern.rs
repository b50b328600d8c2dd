use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::PatternSource;
use std::collections::BTreeSet;

/// History needed before a fully consistent pattern reaches confidence 1.0.
const SATURATION_SAMPLES: f64 = 10.0;

/// Learned corrections for a single misheard token.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Pattern {
    #[serde(default)]
    pub likely_meant: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub source: PatternSource,
    #[serde(default = "Utc::now")]
    pub last_seen: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
}

impl Pattern {
    pub fn new(source: PatternSource) -> Self {
        Self {
            likely_meant: Vec::new(),
            confidence: 0.0,
            count: 0,
            source,
            last_seen: Utc::now(),
            intent: None,
        }
    }

    /// Append `times` copies of a correction and recompute the derived fields.
    pub fn record(&mut self, correction: &str, times: u32) {
        for _ in 0..times {
            self.likely_meant.push(correction.to_string());
        }
        self.last_seen = Utc::now();
        self.refresh();
    }

    /// Re-derive `count` and `confidence` from the history.
    pub fn refresh(&mut self) {
        self.count = self.likely_meant.len() as u32;
        self.confidence = compute_confidence(&self.likely_meant);
    }

    /// Most frequent correction; ties go to the one seen first.
    pub fn most_common(&self) -> Option<(&str, usize)> {
        most_common(&self.likely_meant)
    }
}

pub fn most_common(history: &[String]) -> Option<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in history {
        match counts.iter_mut().find(|(seen, _)| *seen == value.as_str()) {
            Some(entry) => entry.1 += 1,
            None => counts.push((value.as_str(), 1)),
        }
    }

    counts
        .into_iter()
        .fold(None, |best, candidate| match best {
            Some((_, best_count)) if best_count >= candidate.1 => best,
            _ => Some(candidate),
        })
}

/// `round(consistency * min(1, sqrt(total / 10)), 2)`.
pub fn compute_confidence(history: &[String]) -> f64 {
    let total = history.len();
    let Some((_, top)) = most_common(history) else {
        return 0.0;
    };

    let consistency = top as f64 / total as f64;
    let sample_factor = (total as f64 / SATURATION_SAMPLES).sqrt().min(1.0);
    round2(consistency * sample_factor)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pull an (error token, correct token) pair out of what ASR heard and what
/// the user meant.
///
/// When exactly one word differs on each side, that pair wins. Otherwise the
/// last words are compared, since entities tend to sit at the end of a
/// command. This can learn a wrong pair when several non-final words differ.
pub fn extract_correction_pair(heard: &str, resolved: &str) -> Option<(String, String)> {
    let heard = heard.to_lowercase();
    let resolved = resolved.to_lowercase();

    let heard_words: BTreeSet<&str> = heard.split_whitespace().collect();
    let resolved_words: BTreeSet<&str> = resolved.split_whitespace().collect();

    let only_heard: Vec<&str> = heard_words.difference(&resolved_words).copied().collect();
    let only_resolved: Vec<&str> = resolved_words.difference(&heard_words).copied().collect();

    if let ([error], [correct]) = (only_heard.as_slice(), only_resolved.as_slice()) {
        return Some((error.to_string(), correct.to_string()));
    }

    let heard_last = heard.split_whitespace().last()?;
    let resolved_last = resolved.split_whitespace().last()?;
    if heard_last == resolved_last {
        return None;
    }

    Some((heard_last.to_string(), resolved_last.to_string()))
}
