//! GitHub-style `:shortcode:` substitution

use regex::{Captures, Regex};
use std::sync::LazyLock;

static SHORTCODE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r":([a-z0-9_+\-]+):").expect("shortcode pattern is valid"));

/// Replace known shortcodes with their glyph; unknown ones are left as written
pub fn emojize(text: &str) -> String {
  SHORTCODE
    .replace_all(text, |caps: &Captures| match emojis::get_by_shortcode(&caps[1]) {
      Some(emoji) => emoji.as_str().to_string(),
      None => caps[0].to_string(),
    })
    .into_owned()
}
