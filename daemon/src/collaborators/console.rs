use super::{MenuItem, Notifier, SelectionMenu};
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

const NUMBER_WORDS: &[&str] = &[
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
];

/// Parse a spoken menu choice into a 1-based index.
///
/// Only bare choices count: "2", "two", "option 3", "number two", "the first one".
/// Anything longer, like "play track 2", is not a choice.
pub fn parse_selection(text: &str) -> Option<usize> {
    static CHOICE: OnceLock<Option<Regex>> = OnceLock::new();
    let choice = CHOICE.get_or_init(|| {
        Regex::new(r"^(?:the\s+)?(?:(?:option|number|choice)\s+)?([a-z0-9]+)(\s+one)?$").ok()
    });

    let text = text.trim().trim_end_matches(['.', '!', '?']).to_lowercase();
    let caps = choice.as_ref()?.captures(&text)?;
    let word = caps.get(1)?.as_str();

    let index = match word {
        "first" => Some(1),
        "second" => Some(2),
        "third" => Some(3),
        // "the first one", never "two one"
        _ if caps.get(2).is_some() => None,
        "to" | "too" => Some(2),
        "for" => Some(4),
        _ => match word.parse::<usize>() {
            Ok(n) => Some(n),
            Err(_) => NUMBER_WORDS.iter().position(|w| *w == word).map(|i| i + 1),
        },
    };
    index.filter(|n| *n > 0)
}

/// Selection menu that speaks through the log.
#[derive(Default)]
pub struct LogMenu {
    items: Vec<MenuItem>,
    label: String,
}

impl LogMenu {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SelectionMenu for LogMenu {
    fn set_items(&mut self, items: Vec<MenuItem>, label: &str) {
        self.items = items;
        self.label = label.to_string();
    }

    fn speak_options(&mut self) {
        info!("{}:", self.label);
        for (i, item) in self.items.iter().enumerate() {
            info!("  {}. {}", i + 1, item.label);
        }
    }

    fn clear(&mut self) {
        self.items.clear();
        self.label.clear();
    }

    fn is_active(&self) -> bool {
        !self.items.is_empty()
    }

    fn handle_selection(&mut self, text: &str) -> Option<MenuItem> {
        let index = parse_selection(text)?;
        let item = self.items.get(index - 1).cloned()?;
        self.clear();
        Some(item)
    }
}

#[derive(Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn announce(&mut self, message: &str) {
        info!(target: "voxroute::speech", "{}", message);
    }
}
