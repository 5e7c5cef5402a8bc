// src/normalize.rs
//! Text normalization applied before any lexicon matching.
//!
//! Steps, in order:
//! 1) lower-case
//! 2) drop bracketed annotations (`[Chorus]`, `[Verse 2: ...]`) → single space
//! 3) curly quotes → straight ASCII quotes
//! 4) collapse whitespace runs, trim

use once_cell::sync::Lazy;
use regex::Regex;

static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("bracket annotation regex"));

/// Normalize raw lyrics / synopsis text. Total: always returns a string, possibly empty.
pub fn normalize(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = BRACKETED.replace_all(&lowered, " ");

    let mut out = String::with_capacity(stripped.len());
    for word in stripped.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.extend(word.chars().map(straighten_quote));
    }
    out
}

#[inline]
fn straighten_quote(ch: char) -> char {
    match ch {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_annotations_and_collapses_space() {
        let raw = "[Chorus]\n  Holy,   HOLY\t[x2]  is the Lord ";
        assert_eq!(normalize(raw), "holy, holy is the lord");
    }

    #[test]
    fn straightens_curly_quotes() {
        assert_eq!(
            normalize("Don\u{2019}t say \u{201C}never\u{201D}"),
            "don't say \"never\""
        );
    }

    #[test]
    fn empty_and_annotation_only_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   [Intro]   [Outro] "), "");
    }

    #[test]
    fn unclosed_bracket_is_kept() {
        assert_eq!(normalize("oh [yeah"), "oh [yeah");
    }

    #[test]
    fn idempotent_on_samples() {
        for s in [
            "[Verse 1]  I PRAISE you Lord",
            "[[nested] tail]",
            "f.u.c.k  \u{201C}this\u{201D}",
            "\u{3A3}\u{391}\u{3A3} [x] ok",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once, "input: {s:?}");
        }
    }
}
