//! Deterministic rewrite pipeline.
//!
//! Each [`Stage`] is a pure `&str -> String` transform and [`PIPELINE`] fixes
//! their order. Stages after name canonicalization are idempotent; the whole
//! pipeline is idempotent once names are consistent.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, warn};

use crate::catalog::{word_alternation, Catalog, CLICHE_REPLACEMENTS, COLLOQUIAL_REPLACEMENTS};
use crate::characters::{is_stopword, CanonicalNameMap, ConsistencyDetector};
use crate::config::EngineConfig;
use crate::text::{capitalize_first, sentence_ranges, snap_to_char_boundary, ScriptText};

static CLICHE_RE: Lazy<Regex> = Lazy::new(|| table_regex(CLICHE_REPLACEMENTS));

static COLLOQUIAL_RE: Lazy<Regex> = Lazy::new(|| table_regex(COLLOQUIAL_REPLACEMENTS));

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").unwrap());

static PARAGRAPH_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n\s*").unwrap());

static SPACE_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]{2,}").unwrap());

static SPACE_BEFORE_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]+([,.!?;:])").unwrap());

static NAME_BEFORE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\p{Lu}\p{L}+)[ \t]+$").unwrap());

static NAME_AFTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]+(\p{Lu}\p{L}+)").unwrap());

/// Bytes inspected on each side of a name to find a neighbouring word.
const NEIGHBOUR_BYTES: usize = 48;

static TRAILING_SPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

fn table_regex(table: &[(&str, &str)]) -> Regex {
    let keys: Vec<&str> = table.iter().map(|(k, _)| *k).collect();
    word_alternation(&keys)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CanonicalizeNames,
    StripCtas,
    ReplaceCliches,
    SplitLongSentences,
    Colloquialize,
}

/// Stage order. Later stages never reintroduce what earlier ones removed.
pub const PIPELINE: [Stage; 5] = [
    Stage::CanonicalizeNames,
    Stage::StripCtas,
    Stage::ReplaceCliches,
    Stage::SplitLongSentences,
    Stage::Colloquialize,
];

#[derive(Debug, Clone)]
pub struct Normalizer<'c> {
    catalog: &'c Catalog,
    detector: ConsistencyDetector,
    long_sentence_words: usize,
    split_window_words: usize,
}

impl<'c> Normalizer<'c> {
    pub fn new(catalog: &'c Catalog, config: &EngineConfig) -> Self {
        Self {
            catalog,
            detector: ConsistencyDetector::new(config),
            long_sentence_words: config.long_sentence_words,
            split_window_words: config.split_window_words,
        }
    }

    pub fn run(&self, script: &ScriptText) -> ScriptText {
        if script.is_blank() {
            return script.clone();
        }
        let report = self.detector.detect(script);
        let names = report.canonical_names();
        if report.has_findings() {
            warn!(
                findings = report.findings.len(),
                "name inconsistencies found, normalizing character names"
            );
        }

        let mut text = script.as_str().to_string();
        for stage in PIPELINE {
            text = self.apply(stage, &text, names.as_ref());
        }
        ScriptText::parse(text)
    }

    /// Apply a single stage. `names` is only consulted by
    /// [`Stage::CanonicalizeNames`].
    pub fn apply(&self, stage: Stage, text: &str, names: Option<&CanonicalNameMap>) -> String {
        match stage {
            Stage::CanonicalizeNames => match names {
                Some(map) => canonicalize_names(text, map),
                None => text.to_string(),
            },
            Stage::StripCtas => self.strip_ctas(text),
            Stage::ReplaceCliches => replace_from_table(text, &CLICHE_RE, CLICHE_REPLACEMENTS),
            Stage::SplitLongSentences => {
                split_long_sentences(text, self.long_sentence_words, self.split_window_words)
            }
            Stage::Colloquialize => {
                replace_from_table(text, &COLLOQUIAL_RE, COLLOQUIAL_REPLACEMENTS)
            }
        }
    }

    /// Delete every generic CTA, repeating until none is left; removing one
    /// can join its neighbours into another.
    fn strip_ctas(&self, text: &str) -> String {
        let mut current = text.to_string();
        while let Some(next) = self.strip_ctas_once(&current) {
            current = next;
        }
        current
    }

    /// `None` when the text holds no CTA.
    fn strip_ctas_once(&self, text: &str) -> Option<String> {
        let mut spans: Vec<_> = self
            .catalog
            .generic_ctas()
            .iter()
            .flat_map(|m| m.find_spans(text))
            .collect();
        if spans.is_empty() {
            return None;
        }
        spans.sort();

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for span in spans {
            if span.start > cursor {
                out.push_str(&text[cursor..span.start]);
            }
            cursor = cursor.max(span.end);
        }
        out.push_str(&text[cursor..]);

        let out = SPACE_RUN_RE.replace_all(&out, " ");
        let out = SPACE_BEFORE_PUNCT_RE.replace_all(&out, "$1");
        Some(TRAILING_SPACE_RE.replace_all(&out, "").into_owned())
    }
}

/// Whole-word, single-pass substitution of every non-canonical form.
///
/// Canonical forms take part in the match so that a full name is consumed
/// whole and its short form inside it is never rewritten. A variant directly
/// next to another capitalized word belongs to a longer name and is kept.
pub fn canonicalize_names(text: &str, map: &CanonicalNameMap) -> String {
    if map.is_empty() {
        return text.to_string();
    }
    let lookup: HashMap<&str, &str> = map
        .substitutions()
        .iter()
        .map(|(from, to)| (from.as_str(), to.as_str()))
        .collect();
    for (from, to) in map.substitutions() {
        debug!(from = %from, to = %to, "substituting character name");
    }

    let mut surfaces: Vec<&str> = lookup.keys().copied().chain(map.canonical_forms()).collect();
    surfaces.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    surfaces.dedup();
    let alt = surfaces
        .iter()
        .map(|v| regex::escape(v))
        .collect::<Vec<_>>()
        .join("|");
    let Ok(re) = Regex::new(&format!(r"\b(?:{alt})\b")) else {
        return text.to_string();
    };
    re.replace_all(text, |caps: &Captures| {
        let Some(m) = caps.get(0) else {
            return String::new();
        };
        let found = m.as_str();
        match lookup.get(found) {
            Some(to) if !inside_longer_name(text, m.start(), m.end()) => to.to_string(),
            _ => found.to_string(),
        }
    })
    .into_owned()
}

/// True when a capitalized non-stopword sits right before or after `start..end`.
fn inside_longer_name(text: &str, start: usize, end: usize) -> bool {
    let lo = snap_to_char_boundary(text, start.saturating_sub(NEIGHBOUR_BYTES), false);
    let hi = snap_to_char_boundary(text, end + NEIGHBOUR_BYTES, true);
    let capitalized_neighbour = |re: &Regex, haystack: &str| {
        re.captures(haystack)
            .and_then(|c| c.get(1))
            .is_some_and(|w| !is_stopword(w.as_str()))
    };
    capitalized_neighbour(&NAME_BEFORE_RE, &text[lo..start])
        || capitalized_neighbour(&NAME_AFTER_RE, &text[end..hi])
}

/// Replace every key of `table` (matched by `re`) with its value, keeping an
/// uppercase initial.
fn replace_from_table(text: &str, re: &Regex, table: &[(&str, &str)]) -> String {
    re.replace_all(text, |caps: &Captures| {
        let found = &caps[0];
        let key = found.to_lowercase();
        let Some((_, replacement)) = table.iter().find(|(k, _)| *k == key) else {
            return found.to_string();
        };
        if found.chars().next().is_some_and(char::is_uppercase) {
            capitalize_first(replacement)
        } else {
            replacement.to_string()
        }
    })
    .into_owned()
}

/// Split sentences over `max_words` words at the comma nearest their midpoint,
/// within `window` words of it. Paragraph breaks are kept verbatim.
pub fn split_long_sentences(text: &str, max_words: usize, window: usize) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    let mut last = 0;
    for m in PARAGRAPH_BREAK_RE.find_iter(text) {
        split_segment(&text[last..m.start()], max_words, window, &mut out);
        out.push_str(m.as_str());
        last = m.end();
    }
    split_segment(&text[last..], max_words, window, &mut out);
    out
}

fn split_segment(segment: &str, max_words: usize, window: usize, out: &mut String) {
    for (start, end) in sentence_ranges(segment) {
        out.push_str(&split_sentence(&segment[start..end], max_words, window));
    }
}

fn split_sentence(sentence: &str, max_words: usize, window: usize) -> String {
    let words: Vec<_> = TOKEN_RE.find_iter(sentence).collect();
    if words.len() <= max_words || words.len() < 2 {
        return sentence.to_string();
    }
    let mid = words.len() / 2;
    let lo = mid.saturating_sub(window);
    let hi = (mid + window).min(words.len().saturating_sub(2));
    let Some(j) = (lo..=hi)
        .filter(|&j| words[j].as_str().ends_with(','))
        .min_by_key(|&j| (j.abs_diff(mid), j))
    else {
        return sentence.to_string();
    };

    let comma = words[j].end() - 1;
    let head = format!("{}.", &sentence[..comma]);
    let gap = &sentence[words[j].end()..words[j + 1].start()];
    let tail = capitalize_first(&sentence[words[j + 1].start()..]);

    let mut out = split_sentence(&head, max_words, window);
    out.push_str(gap);
    out.push_str(&split_sentence(&tail, max_words, window));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sentence_with_comma(words: usize, comma_after: usize) -> String {
        (1..=words)
            .map(|i| {
                if i == comma_after {
                    format!("palavra{i},")
                } else {
                    format!("palavra{i}")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
            + "."
    }

    #[test]
    fn splits_at_comma_near_midpoint() {
        let s = sentence_with_comma(45, 21);
        let out = split_long_sentences(&s, 35, 5);
        assert!(out.contains("palavra21. Palavra22"), "{out}");
        assert!(out.ends_with("palavra45."));
        assert_eq!(split_long_sentences(&out, 35, 5), out);
    }

    #[test]
    fn no_comma_in_window_leaves_sentence_alone() {
        let s = sentence_with_comma(45, 3);
        assert_eq!(split_long_sentences(&s, 35, 5), s);
    }

    #[test]
    fn very_long_sentences_split_until_stable() {
        let words: Vec<String> = (1..=90)
            .map(|i| if i % 10 == 0 { format!("w{i},") } else { format!("w{i}") })
            .collect();
        let s = words.join(" ") + ".";
        let once = split_long_sentences(&s, 35, 5);
        assert_eq!(split_long_sentences(&once, 35, 5), once);
        for sentence in crate::text::split_sentences(&once) {
            assert!(sentence.split_whitespace().count() <= 35, "{sentence}");
        }
    }

    #[test]
    fn paragraph_breaks_survive_splitting() {
        let s = format!("{}\n\nCurta.", sentence_with_comma(45, 22));
        let out = split_long_sentences(&s, 35, 5);
        assert!(out.ends_with(".\n\nCurta."), "{out}");
    }

    #[test]
    fn cliche_replacement_keeps_capitalization() {
        let out = replace_from_table(
            "Sem saber, ela riu. Foi a moral da história.",
            &CLICHE_RE,
            CLICHE_REPLACEMENTS,
        );
        assert_eq!(out, "Não imaginava, ela riu. Foi a o que aprendemos.");
    }

    #[test]
    fn colloquialize_is_idempotent() {
        let once = replace_from_table(
            "Porém, era extremamente tarde. Contudo ficou.",
            &COLLOQUIAL_RE,
            COLLOQUIAL_REPLACEMENTS,
        );
        assert_eq!(once, "Mas, era muito tarde. Mas ficou.");
        assert_eq!(
            replace_from_table(&once, &COLLOQUIAL_RE, COLLOQUIAL_REPLACEMENTS),
            once
        );
    }

    #[test]
    fn nested_ctas_are_stripped_to_a_fixed_point() {
        let normalizer = Normalizer::new(Catalog::builtin(), &EngineConfig::default());
        let out = normalizer.apply(
            Stage::StripCtas,
            "Obrigado por assistir, deixe seu deixe seu like like.",
            None,
        );
        assert!(!out.to_lowercase().contains("deixe seu like"), "{out}");
        assert_eq!(normalizer.apply(Stage::StripCtas, &out, None), out);
    }

    #[test]
    fn full_name_is_not_extended_by_its_short_form() {
        let text = "Maria Silva entrou cedo. Maria Silva chegou ao balcão. Maria Silva trabalha ali.\n\n\
                    Maria entrou depois. Maria chegou tarde.";
        let normalizer = Normalizer::new(Catalog::builtin(), &EngineConfig::default());
        let once = normalizer.run(&ScriptText::parse(text)).into_string();
        assert!(!once.contains("Silva Silva"), "{once}");
        assert_eq!(once.matches("Maria Silva").count(), 5, "{once}");
        assert_eq!(normalizer.run(&ScriptText::parse(once.clone())).into_string(), once);
    }

    #[test]
    fn sentence_openers_do_not_block_renaming() {
        let text = "Maria entrou cedo. Maria chegou ao balcão. Maria trabalha ali.\n\n\
                    Então Sarah entrou. Sarah chegou tarde.";
        let normalizer = Normalizer::new(Catalog::builtin(), &EngineConfig::default());
        let once = normalizer.run(&ScriptText::parse(text)).into_string();
        assert!(once.contains("Então Maria entrou"), "{once}");
        assert!(!once.contains("Sarah"));
    }

    #[test]
    fn tiny_sentence_limits_do_not_underflow() {
        assert_eq!(split_long_sentences("palavra,", 0, 0), "palavra,");
        assert_eq!(split_long_sentences("um, dois.", 1, 0), "um, dois.");
        let out = split_long_sentences("um, dois, três, quatro.", 1, 1);
        assert_eq!(split_long_sentences(&out, 1, 1), out);
    }

    #[test]
    fn strip_ctas_tidies_leftover_spacing() {
        let normalizer = Normalizer::new(Catalog::builtin(), &EngineConfig::default());
        let out = normalizer.apply(
            Stage::StripCtas,
            "Fim da história. Deixe seu like e comente abaixo !",
            None,
        );
        assert_eq!(out, "Fim da história. e!");
        assert_eq!(normalizer.apply(Stage::StripCtas, &out, None), out);
    }
}
