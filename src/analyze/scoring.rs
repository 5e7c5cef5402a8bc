//! Rule scoring: `Signals` + rule list → raw `ScoreResult`.
//!
//! Start at the neutral baseline (50), add the signed contribution of every rule that
//! fires, clamp to [0,100]. Which signal a rule reads is decided by its id through the
//! `EVALUATORS` table; ids missing from the table are inert.
//!
//! Polarity is fixed per id, not taken from the sign in the rule file: negative-content
//! rules always subtract `|weight|`, affirming rules always add it.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use super::rules::Rule;
use crate::signals::Signals;

pub const NEUTRAL_BASELINE: i32 = 50;
pub const MAX_SCORE: i32 = 100;
/// Excerpts quoted in a reason before it is cut with `...`.
pub const REASON_EXCERPTS: usize = 3;

/// One rule that fired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hit {
    pub rule_id: String,
    pub refs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub total: u8,
    /// Only rules that fired; a silent rule is absent, never zero.
    pub subscores: BTreeMap<String, i32>,
    pub hits: Vec<Hit>,
}

impl ScoreResult {
    pub fn neutral() -> Self {
        Self {
            total: NEUTRAL_BASELINE as u8,
            subscores: BTreeMap::new(),
            hits: Vec::new(),
        }
    }

    pub fn hit(&self, rule_id: &str) -> Option<&Hit> {
        self.hits.iter().find(|h| h.rule_id == rule_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Negative,
    Affirming,
}

impl Polarity {
    /// Signed integer contribution of a configured weight.
    pub fn apply(self, weight: f64) -> i32 {
        let magnitude = if weight.is_finite() {
            weight.abs().round().min(f64::from(i32::MAX)) as i32
        } else {
            0
        };
        match self {
            Self::Negative => -magnitude,
            Self::Affirming => magnitude,
        }
    }
}

/// What an evaluator saw when its rule matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    pub excerpts: Vec<String>,
    pub reason: String,
}

pub type EvalFn = fn(&Signals) -> Option<Evidence>;

#[derive(Clone, Copy)]
pub struct Evaluator {
    pub polarity: Polarity,
    pub eval: EvalFn,
}

static EVALUATORS: Lazy<HashMap<&'static str, Evaluator>> = Lazy::new(|| {
    use Polarity::{Affirming, Negative};

    let table: [(&'static str, Polarity, EvalFn); 14] = [
        ("explicit-language", Negative, eval_explicit_language),
        ("explicit-sexual", Negative, eval_explicit_sexual),
        ("explicit-violence", Negative, eval_explicit_violence),
        ("substance-abuse", Negative, eval_substance_abuse),
        ("blasphemy", Negative, eval_blasphemy),
        ("self-harm", Negative, eval_self_harm),
        ("worship", Affirming, eval_worship),
        ("repentance-hope", Affirming, eval_repentance_hope),
        ("occult-practices", Negative, eval_occult_practices),
        ("sexual-purity", Negative, eval_sexual_purity),
        ("violence-glorification", Negative, eval_violence_glorification),
        ("love-and-compassion", Affirming, eval_love_and_compassion),
        ("false-gospel", Negative, eval_doctrinal_claims),
        ("deity-of-christ", Negative, eval_doctrinal_claims),
    ];
    table
        .into_iter()
        .map(|(id, polarity, eval)| (id, Evaluator { polarity, eval }))
        .collect()
});

pub fn evaluator_for(rule_id: &str) -> Option<&'static Evaluator> {
    EVALUATORS.get(rule_id)
}

/// Sorted list of rule ids the scorer understands.
pub fn recognized_rule_ids() -> Vec<&'static str> {
    let mut ids: Vec<&'static str> = EVALUATORS.keys().copied().collect();
    ids.sort_unstable();
    ids
}

/// Score with the neutral baseline of 50.
pub fn score(signals: &Signals, rules: &[Rule]) -> ScoreResult {
    score_from_baseline(signals, rules, NEUTRAL_BASELINE)
}

pub fn score_from_baseline(signals: &Signals, rules: &[Rule], baseline: i32) -> ScoreResult {
    let mut total = i64::from(baseline);
    let mut subscores = BTreeMap::new();
    let mut hits = Vec::new();

    for rule in rules {
        let Some(evaluator) = evaluator_for(&rule.id) else {
            debug!(rule = %rule.id, "no evaluator for rule id; inert");
            continue;
        };
        let Some(evidence) = (evaluator.eval)(signals) else {
            continue;
        };

        let contribution = evaluator.polarity.apply(rule.weight);
        hits.push(Hit {
            rule_id: rule.id.clone(),
            refs: rule.anchors.clone(),
            reason: Some(evidence.reason),
        });
        subscores.insert(rule.id.clone(), contribution);
        total = total.saturating_add(i64::from(contribution));
    }

    ScoreResult {
        total: clamp_total(total),
        subscores,
        hits,
    }
}

pub(crate) fn clamp_total(total: i64) -> u8 {
    total.clamp(0, i64::from(MAX_SCORE)) as u8
}

/// `"<label>: a, b, c..."` with at most `REASON_EXCERPTS` items.
pub fn summarize(label: &str, excerpts: &[String]) -> String {
    let shown = excerpts
        .iter()
        .take(REASON_EXCERPTS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let more = if excerpts.len() > REASON_EXCERPTS { "..." } else { "" };
    format!("{label}: {shown}{more}")
}

/* ----------------------------
Evaluators
---------------------------- */

fn excerpt_rule(excerpts: &[String], label: &str) -> Option<Evidence> {
    if excerpts.is_empty() {
        return None;
    }
    Some(Evidence {
        excerpts: excerpts.to_vec(),
        reason: summarize(label, excerpts),
    })
}

fn theme_rule(signals: &Signals, tag: &str, reason: &str) -> Option<Evidence> {
    signals.has_theme(tag).then(|| Evidence {
        excerpts: Vec::new(),
        reason: reason.to_string(),
    })
}

fn eval_explicit_language(s: &Signals) -> Option<Evidence> {
    excerpt_rule(s.explicit("language"), "Profanity detected")
}

fn eval_explicit_sexual(s: &Signals) -> Option<Evidence> {
    excerpt_rule(s.explicit("sexual"), "Sexual content")
}

fn eval_explicit_violence(s: &Signals) -> Option<Evidence> {
    excerpt_rule(s.explicit("violence"), "Violence glorification")
}

fn eval_substance_abuse(s: &Signals) -> Option<Evidence> {
    excerpt_rule(s.explicit("substances"), "Substance references")
}

fn eval_blasphemy(s: &Signals) -> Option<Evidence> {
    excerpt_rule(&s.blasphemy, "Irreverent use of God's name")
}

fn eval_self_harm(s: &Signals) -> Option<Evidence> {
    excerpt_rule(&s.selfharm, "Self-harm themes")
}

fn eval_worship(s: &Signals) -> Option<Evidence> {
    theme_rule(s, "worship", "Direct worship and praise of God")
}

fn eval_repentance_hope(s: &Signals) -> Option<Evidence> {
    theme_rule(s, "repentance-hope", "Themes of repentance and hope in Christ")
}

// Media rules list every excerpt.
fn eval_occult_practices(s: &Signals) -> Option<Evidence> {
    let occult = s.explicit("occult");
    (!occult.is_empty()).then(|| Evidence {
        excerpts: occult.to_vec(),
        reason: format!("Occult elements: {}", occult.join(", ")),
    })
}

fn eval_sexual_purity(s: &Signals) -> Option<Evidence> {
    let sexual = s.explicit("sexual");
    (!sexual.is_empty()).then(|| Evidence {
        excerpts: sexual.to_vec(),
        reason: format!("Sexual content: {}", sexual.join(", ")),
    })
}

fn eval_violence_glorification(s: &Signals) -> Option<Evidence> {
    let extreme: Vec<String> = s
        .explicit("violence")
        .iter()
        .filter(|v| v.contains("graphic") || v.contains("extreme"))
        .cloned()
        .collect();
    (!extreme.is_empty()).then(|| Evidence {
        excerpts: extreme,
        reason: "Extreme violence detected".to_string(),
    })
}

const POSITIVE_THEME_MARKERS: &[&str] = &["love", "compassion", "redemption", "forgiveness"];

fn eval_love_and_compassion(s: &Signals) -> Option<Evidence> {
    let positive: Vec<String> = s
        .themes
        .iter()
        .filter(|t| {
            let t = t.to_lowercase();
            POSITIVE_THEME_MARKERS.iter().any(|m| t.contains(m))
        })
        .cloned()
        .collect();
    (!positive.is_empty()).then(|| Evidence {
        reason: format!("Positive themes: {}", positive.join(", ")),
        excerpts: positive,
    })
}

fn eval_doctrinal_claims(s: &Signals) -> Option<Evidence> {
    let concerning: Vec<String> = s
        .claims
        .iter()
        .filter(|c| {
            let c = c.to_lowercase();
            crate::signals::CONCERNING_CLAIMS
                .iter()
                .any(|phrase| c.contains(phrase))
        })
        .cloned()
        .collect();
    let first = concerning.first()?.clone();
    Some(Evidence {
        excerpts: concerning,
        reason: format!("Theological concern: {first}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn language(words: &[&str]) -> Signals {
        let mut s = Signals::default();
        s.explicit.insert(
            "language".into(),
            words.iter().map(|w| w.to_string()).collect(),
        );
        s
    }

    #[test]
    fn empty_signals_score_neutral() {
        let rules = vec![Rule::new("explicit-language", -25.0), Rule::new("worship", 30.0)];
        let r = score(&Signals::default(), &rules);
        assert_eq!(r, ScoreResult::neutral());
    }

    #[test]
    fn negative_rule_subtracts_regardless_of_sign() {
        let s = language(&["shit"]);
        let r = score(&s, &[Rule::new("explicit-language", 25.0)]);
        assert_eq!(r.total, 25);
        assert_eq!(r.subscores["explicit-language"], -25);
        let r = score(&s, &[Rule::new("explicit-language", -25.0)]);
        assert_eq!(r.total, 25);
    }

    #[test]
    fn reason_truncates_after_three() {
        let s = language(&["a", "b", "c", "d"]);
        let r = score(&s, &[Rule::new("explicit-language", 10.0)]);
        assert_eq!(
            r.hits[0].reason.as_deref(),
            Some("Profanity detected: a, b, c...")
        );
        let s = language(&["a", "b", "c"]);
        let r = score(&s, &[Rule::new("explicit-language", 10.0)]);
        assert_eq!(r.hits[0].reason.as_deref(), Some("Profanity detected: a, b, c"));
    }

    #[test]
    fn hit_carries_anchors_and_empty_anchors_are_legal() {
        let s = Signals::default().with_themes(["worship"]);
        let rules = vec![
            Rule::new("worship", 30.0).with_anchors(["Psalms 95:6"]),
            Rule::new("repentance-hope", 20.0),
        ];
        let r = score(&s, &rules);
        assert_eq!(r.total, 80);
        assert_eq!(r.hits.len(), 1);
        assert_eq!(r.hits[0].refs, vec!["Psalms 95:6"]);

        let s = s.with_themes(["repentance-hope"]);
        let r = score(&s, &rules);
        assert_eq!(r.total, 100);
        assert!(r.hit("repentance-hope").unwrap().refs.is_empty());
    }

    #[test]
    fn stacking_rules_on_same_signal() {
        let mut s = Signals::default();
        s.explicit
            .insert("violence".into(), vec!["graphic violence".into(), "gun".into()]);
        let rules = vec![
            Rule::new("explicit-violence", -20.0),
            Rule::new("violence-glorification", -15.0),
        ];
        let r = score(&s, &rules);
        assert_eq!(r.hits.len(), 2);
        assert_eq!(r.subscores["explicit-violence"], -20);
        assert_eq!(r.subscores["violence-glorification"], -15);
        assert_eq!(r.total, 15);
    }

    #[test]
    fn violence_glorification_needs_extreme_marker() {
        let mut s = Signals::default();
        s.explicit.insert("violence".into(), vec!["gun".into()]);
        let r = score(&s, &[Rule::new("violence-glorification", -15.0)]);
        assert!(r.hits.is_empty());
        assert_eq!(r.total, 50);
    }

    #[test]
    fn unknown_rule_is_inert() {
        let s = language(&["shit"]).with_themes(["worship"]);
        let r = score(&s, &[Rule::new("future-rule", -99.0)]);
        assert_eq!(r, ScoreResult::neutral());
    }

    #[test]
    fn clamps_both_ends() {
        let s = language(&["x"]);
        let r = score(&s, &[Rule::new("explicit-language", 500.0)]);
        assert_eq!(r.total, 0);
        let s = Signals::default().with_themes(["worship"]);
        let r = score(&s, &[Rule::new("worship", f64::MAX)]);
        assert_eq!(r.total, 100);
    }

    #[test]
    fn hits_follow_rule_order() {
        let s = language(&["x"]).with_themes(["worship"]);
        let rules = vec![Rule::new("worship", 10.0), Rule::new("explicit-language", 10.0)];
        let r = score(&s, &rules);
        let ids: Vec<_> = r.hits.iter().map(|h| h.rule_id.as_str()).collect();
        assert_eq!(ids, ["worship", "explicit-language"]);
    }

    #[test]
    fn doctrinal_rules_filter_claims() {
        let mut s = Signals::default();
        s.claims = vec!["some harmless claim".into(), "All paths lead to God".into()];
        let rules = vec![Rule::new("false-gospel", -30.0), Rule::new("deity-of-christ", -30.0)];
        let r = score(&s, &rules);
        assert_eq!(r.hits.len(), 2);
        assert_eq!(
            r.hits[0].reason.as_deref(),
            Some("Theological concern: All paths lead to God")
        );
        assert_eq!(r.total, 0);
    }

    #[test]
    fn love_and_compassion_reads_free_form_themes() {
        let s = Signals::default().with_themes(["Sacrificial Love", "heist"]);
        let r = score(&s, &[Rule::new("love-and-compassion", 15.0)]);
        assert_eq!(r.total, 65);
        assert_eq!(
            r.hits[0].reason.as_deref(),
            Some("Positive themes: Sacrificial Love")
        );
    }

    #[test]
    fn legacy_occult_reason_lists_everything() {
        let mut s = Signals::default();
        s.explicit.insert(
            "occult".into(),
            vec!["tarot".into(), "devil".into(), "seance".into(), "ouija".into()],
        );
        let r = score(&s, &[Rule::new("occult-practices", 25.0)]);
        assert_eq!(r.subscores["occult-practices"], -25);
        assert_eq!(
            r.hits[0].reason.as_deref(),
            Some("Occult elements: tarot, devil, seance, ouija")
        );
    }

    #[test]
    fn recognized_ids_cover_table() {
        let ids = recognized_rule_ids();
        assert_eq!(ids.len(), 14);
        assert!(ids.contains(&"false-gospel"));
    }
}
