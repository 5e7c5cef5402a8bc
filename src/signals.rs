// src/signals.rs
//! Signal extraction: runs the lexicon over normalized text and collects evidence.
//!
//! Output is a fresh `Signals` value per call. Empty and absent lists mean the same
//! thing ("no evidence"); accessors return empty slices for missing buckets.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::lexicon::{Lexicon, SignalTarget};

/// Theological framings flagged by doctrinal rules (`false-gospel`, `deity-of-christ`).
pub const CONCERNING_CLAIMS: &[&str] = &[
    "all paths lead to god",
    "works-based salvation",
    "jesus is just a teacher",
    "jesus was just a good man",
    "earn your way to heaven",
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signals {
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub explicit: BTreeMap<String, Vec<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blasphemy: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub selfharm: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bible_refs: Vec<String>,
}

impl Signals {
    /// Excerpts under `explicit.<sub>`; empty when the bucket is absent.
    pub fn explicit(&self, sub: &str) -> &[String] {
        self.explicit.get(sub).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_theme(&self, tag: &str) -> bool {
        self.themes.iter().any(|t| t == tag)
    }

    /// Merge externally supplied theme tags (e.g. AI tags), keeping set semantics.
    pub fn with_themes<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for t in tags {
            push_unique(&mut self.themes, t.into());
        }
        self
    }

    /// True when no bucket carries any evidence.
    pub fn is_empty(&self) -> bool {
        self.themes.is_empty()
            && self.explicit.values().all(Vec::is_empty)
            && self.blasphemy.is_empty()
            && self.selfharm.is_empty()
            && self.claims.is_empty()
            && self.bible_refs.is_empty()
    }

    fn bucket_mut(&mut self, target: &SignalTarget) -> Option<&mut Vec<String>> {
        match target {
            SignalTarget::Explicit(sub) => Some(self.explicit.entry(sub.clone()).or_default()),
            SignalTarget::Blasphemy => Some(&mut self.blasphemy),
            SignalTarget::SelfHarm => Some(&mut self.selfharm),
            SignalTarget::Theme(_) => None,
        }
    }
}

fn push_unique(list: &mut Vec<String>, item: String) {
    if !list.iter().any(|x| *x == item) {
        list.push(item);
    }
}

/// Extract all signals from already-normalized text.
pub fn extract(normalized: &str, lexicon: &Lexicon) -> Signals {
    let mut signals = Signals::default();

    for cat in lexicon.categories() {
        match &cat.signal {
            SignalTarget::Theme(tag) => {
                if cat.is_match(normalized) {
                    push_unique(&mut signals.themes, tag.clone());
                }
            }
            target => {
                let found = cat.excerpts(normalized);
                if found.is_empty() {
                    continue;
                }
                if let Some(bucket) = signals.bucket_mut(target) {
                    for m in found {
                        push_unique(bucket, m);
                    }
                }
            }
        }
    }

    signals.claims = extract_claims(normalized);
    signals.bible_refs = extract_bible_refs(normalized);
    signals
}

/// Plain containment check against `CONCERNING_CLAIMS`, independent of the lexicon.
pub fn extract_claims(normalized: &str) -> Vec<String> {
    CONCERNING_CLAIMS
        .iter()
        .filter(|phrase| normalized.contains(*phrase))
        .map(|phrase| phrase.to_string())
        .collect()
}

/* ----------------------------
Scripture references
---------------------------- */

/// (lower-case spelling, display name); aliases map onto the canonical display name.
const BOOKS: &[(&str, &str)] = &[
    ("genesis", "Genesis"),
    ("exodus", "Exodus"),
    ("leviticus", "Leviticus"),
    ("numbers", "Numbers"),
    ("deuteronomy", "Deuteronomy"),
    ("joshua", "Joshua"),
    ("judges", "Judges"),
    ("ruth", "Ruth"),
    ("1 samuel", "1 Samuel"),
    ("2 samuel", "2 Samuel"),
    ("1 kings", "1 Kings"),
    ("2 kings", "2 Kings"),
    ("1 chronicles", "1 Chronicles"),
    ("2 chronicles", "2 Chronicles"),
    ("ezra", "Ezra"),
    ("nehemiah", "Nehemiah"),
    ("esther", "Esther"),
    ("job", "Job"),
    ("psalms", "Psalms"),
    ("psalm", "Psalms"),
    ("proverbs", "Proverbs"),
    ("ecclesiastes", "Ecclesiastes"),
    ("song of solomon", "Song of Solomon"),
    ("song of songs", "Song of Solomon"),
    ("isaiah", "Isaiah"),
    ("jeremiah", "Jeremiah"),
    ("lamentations", "Lamentations"),
    ("ezekiel", "Ezekiel"),
    ("daniel", "Daniel"),
    ("hosea", "Hosea"),
    ("joel", "Joel"),
    ("amos", "Amos"),
    ("obadiah", "Obadiah"),
    ("jonah", "Jonah"),
    ("micah", "Micah"),
    ("nahum", "Nahum"),
    ("habakkuk", "Habakkuk"),
    ("zephaniah", "Zephaniah"),
    ("haggai", "Haggai"),
    ("zechariah", "Zechariah"),
    ("malachi", "Malachi"),
    ("matthew", "Matthew"),
    ("mark", "Mark"),
    ("luke", "Luke"),
    ("john", "John"),
    ("acts", "Acts"),
    ("romans", "Romans"),
    ("1 corinthians", "1 Corinthians"),
    ("2 corinthians", "2 Corinthians"),
    ("galatians", "Galatians"),
    ("ephesians", "Ephesians"),
    ("philippians", "Philippians"),
    ("colossians", "Colossians"),
    ("1 thessalonians", "1 Thessalonians"),
    ("2 thessalonians", "2 Thessalonians"),
    ("1 timothy", "1 Timothy"),
    ("2 timothy", "2 Timothy"),
    ("titus", "Titus"),
    ("philemon", "Philemon"),
    ("hebrews", "Hebrews"),
    ("james", "James"),
    ("1 peter", "1 Peter"),
    ("2 peter", "2 Peter"),
    ("1 john", "1 John"),
    ("2 john", "2 John"),
    ("3 john", "3 John"),
    ("jude", "Jude"),
    ("revelation", "Revelation"),
];

static BIBLE_REF: Lazy<Regex> = Lazy::new(|| {
    let mut names: Vec<&str> = BOOKS.iter().map(|(k, _)| *k).collect();
    // Longest first so "psalms" wins over "psalm" and "1 john" over "john".
    names.sort_by_key(|n| std::cmp::Reverse(n.len()));
    let alt = names
        .iter()
        .map(|n| regex::escape(n))
        .collect::<Vec<_>>()
        .join("|");
    let expr = format!(
        r"(?i)\b(?P<book>{alt})\s+(?P<ch>\d{{1,3}}):(?P<v>\d{{1,3}})(?:\s*-\s*(?P<end>\d{{1,3}}))?\b"
    );
    Regex::new(&expr).expect("bible reference regex")
});

fn display_book(spelling: &str) -> Option<&'static str> {
    let key = spelling.to_lowercase();
    let key = key.split_whitespace().collect::<Vec<_>>().join(" ");
    BOOKS.iter().find(|(k, _)| *k == key).map(|(_, d)| *d)
}

/// Scripture references quoted in the text, canonicalized ("John 3:16", "Psalms 23:1-4").
pub fn extract_bible_refs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    for caps in BIBLE_REF.captures_iter(text) {
        let (Some(book), Some(ch), Some(v)) = (caps.name("book"), caps.name("ch"), caps.name("v"))
        else {
            continue;
        };
        let Some(name) = display_book(book.as_str()) else {
            continue;
        };
        let mut r = format!("{name} {}:{}", ch.as_str(), v.as_str());
        if let Some(end) = caps.name("end") {
            r.push('-');
            r.push_str(end.as_str());
        }
        push_unique(&mut out, r);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn signals_for(raw: &str) -> Signals {
        extract(&normalize(raw), Lexicon::builtin())
    }

    #[test]
    fn empty_text_has_no_signals() {
        let s = signals_for("");
        assert!(s.is_empty());
        assert_eq!(s, Signals::default());
    }

    #[test]
    fn profanity_and_violence_are_separate_buckets() {
        let s = signals_for("fuck this shit, I wanna kill em");
        assert_eq!(s.explicit("language"), ["fuck", "shit"]);
        assert_eq!(s.explicit("violence"), ["kill"]);
        assert!(s.explicit("sexual").is_empty());
        assert!(s.themes.is_empty());
    }

    #[test]
    fn surface_forms_deduplicated() {
        let s = signals_for("f.u.c.k damn fuck");
        let lang = s.explicit("language");
        assert_eq!(lang, ["f.u.c.k", "damn"]);
    }

    #[test]
    fn worship_is_a_theme_not_an_excerpt() {
        let s = signals_for("I praise you Lord, holy holy");
        assert_eq!(s.themes, vec!["worship"]);
        assert!(s.explicit.is_empty());
    }

    #[test]
    fn annotations_never_match() {
        let s = signals_for("[Produced by Killa Beats] sunshine all day");
        assert!(s.is_empty(), "{s:?}");
    }

    #[test]
    fn one_text_many_categories() {
        let s = signals_for("jesus christ, the devil got me drunk and I repent");
        assert_eq!(s.blasphemy, vec!["jesus christ"]);
        assert_eq!(s.explicit("occult"), ["devil"]);
        assert_eq!(s.explicit("substances"), ["drunk"]);
        assert!(s.has_theme("repentance-hope"));
    }

    #[test]
    fn claims_by_containment() {
        let s = signals_for("They told me all paths lead to God and Jesus is just a teacher");
        assert_eq!(
            s.claims,
            vec!["all paths lead to god", "jesus is just a teacher"]
        );
    }

    #[test]
    fn bible_refs_are_canonicalized() {
        let refs = extract_bible_refs("read john 3:16, 1 John 4:7-8 and psalm 23:1 then john 3:16");
        assert_eq!(refs, vec!["John 3:16", "1 John 4:7-8", "Psalms 23:1"]);
    }

    #[test]
    fn external_themes_merge_as_set() {
        let s = Signals::default()
            .with_themes(["Redemption arc", "worship"])
            .with_themes(["worship"]);
        assert_eq!(s.themes, vec!["Redemption arc", "worship"]);
    }

    #[test]
    fn serializes_with_camel_case_and_skips_empty() {
        let s = signals_for("see romans 8:28");
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["bibleRefs"][0], "Romans 8:28");
        assert!(v.get("blasphemy").is_none());
    }
}
