//! Emoji shortcode expansion.
//!
//! Forum bodies contain `:shortcode:` spellings that Discord would show
//! verbatim inside an embed. They are expanded to glyphs before the HTML is
//! parsed. A few spellings used by the forums differ from the gemoji names
//! and are mapped first.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};
use tracing::{debug, warn};

/// Forum spelling -> gemoji spelling.
const ALIASES: [(&str, &str); 3] = [
    ("first_place_medal", "1st_place_medal"),
    ("second_place_medal", "2nd_place_medal"),
    ("third_place_medal", "3rd_place_medal"),
];

fn shortcode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r":([a-z][a-z0-9_+-]*):").expect("valid shortcode regex"))
}

/// Standard spelling for a shortcode name (without colons).
pub fn canonical_shortcode(name: &str) -> &str {
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map_or(name, |(_, canonical)| canonical)
}

/// Replace every known `:shortcode:` in `text` with its emoji. Unknown ones
/// are left as they are and logged.
pub fn emojize(text: &str) -> String {
    let mut unsupported = BTreeSet::new();

    let out = shortcode_regex().replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        let canonical = canonical_shortcode(name);
        if canonical != name {
            debug!("EmojiConverter: :{name}: -> :{canonical}:");
        }
        match emojis::get_by_shortcode(canonical) {
            Some(emoji) => emoji.as_str().to_string(),
            None => {
                unsupported.insert(caps[0].to_string());
                caps[0].to_string()
            }
        }
    });

    if !unsupported.is_empty() {
        warn!("Unsupported emojis detected: {unsupported:?}");
    }

    out.into_owned()
}
