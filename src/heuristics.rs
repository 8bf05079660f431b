//! Rule-based checks that do not depend on character names.
//!
//! Each rule returns its findings in detection order; the engine files them
//! under the matching [`crate::DefectCategory`].

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::catalog::{
    word_alternation, Catalog, Matcher, EMOTIONAL_ADJECTIVES, HOOK_CUES, REVERSAL_MARKERS,
};
use crate::config::EngineConfig;
use crate::text::{char_prefix, excerpt, word_count, ScriptText};

static HOOK_RE: Lazy<Regex> = Lazy::new(|| word_alternation(HOOK_CUES));

static REVERSAL_RE: Lazy<Regex> = Lazy::new(|| word_alternation(REVERSAL_MARKERS));

static EMOTIONAL_RE: Lazy<Regex> = Lazy::new(|| word_alternation(EMOTIONAL_ADJECTIVES));

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").unwrap());

static ELLIPSIS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\.\.\.|\u{2026}").unwrap());

// ---------------------------------------------------------------------------
// Catalog scans
// ---------------------------------------------------------------------------

/// One finding per AI-indicator occurrence, quoting the matched text.
pub fn ai_indicators(text: &str, catalog: &Catalog, config: &EngineConfig) -> Vec<String> {
    let mut out = Vec::new();
    for matcher in catalog.ai_indicators() {
        for span in matcher.find_spans(text) {
            out.push(format!(
                "AI pattern detected: \"{}\"",
                excerpt(span.as_str(text), config.excerpt_chars)
            ));
        }
    }
    out
}

/// One entry (the catalog phrase) per occurrence of each matcher.
pub fn phrase_hits(text: &str, matchers: &[Box<dyn Matcher>]) -> Vec<String> {
    let mut out = Vec::new();
    for matcher in matchers {
        let hits = matcher.find_spans(text).len();
        out.extend(std::iter::repeat(matcher.label().to_string()).take(hits));
    }
    out
}

// ---------------------------------------------------------------------------
// Retention
// ---------------------------------------------------------------------------

/// The five structural retention checks. Every check runs.
pub fn retention_issues(script: &ScriptText, config: &EngineConfig) -> Vec<String> {
    let text = script.as_str();
    let mut issues = Vec::new();

    let opening = char_prefix(text, config.hook_window_chars).to_lowercase();
    if !HOOK_RE.is_match(&opening) {
        issues.push(format!(
            "Weak hook: nothing in the first {} characters addresses the viewer or sparks curiosity",
            config.hook_window_chars
        ));
    }

    if !char_prefix(text, config.question_window_chars).contains('?') {
        issues.push(format!(
            "No rhetorical question in the first {} characters to open curiosity",
            config.question_window_chars
        ));
    }

    let paragraphs = script.paragraphs().len();
    if paragraphs < config.min_paragraphs {
        issues.push(format!(
            "Only {paragraphs} paragraphs (minimum {}) - the pacing may feel monotonous",
            config.min_paragraphs
        ));
    }

    let loops = text.matches('?').count();
    if loops < config.min_story_loops {
        issues.push(format!(
            "Only {loops} story loops (minimum {}) - leave more questions unresolved",
            config.min_story_loops
        ));
    }

    if !REVERSAL_RE.is_match(text) {
        issues.push("No reversal marker (but/however) - the story lacks setbacks".to_string());
    }

    issues
}

// ---------------------------------------------------------------------------
// Authenticity
// ---------------------------------------------------------------------------

pub fn authenticity_issues(script: &ScriptText, config: &EngineConfig) -> Vec<String> {
    let text = script.as_str();
    let mut issues = Vec::new();

    let lowered = text.to_lowercase();
    let mut order: Vec<&str> = Vec::new();
    let mut freq: HashMap<&str, usize> = HashMap::new();
    for m in WORD_RE.find_iter(&lowered) {
        let w = m.as_str();
        if w.chars().count() <= config.repeated_word_min_chars {
            continue;
        }
        let count = freq.entry(w).or_insert(0);
        if *count == 0 {
            order.push(w);
        }
        *count += 1;
    }
    let overused: Vec<&str> = order
        .into_iter()
        .filter(|w| freq[w] > config.repeated_word_min_count)
        .collect();
    if overused.len() > config.repeated_word_limit {
        issues.push(format!(
            "Too many repeated words: {}",
            overused.iter().take(5).copied().collect::<Vec<_>>().join(", ")
        ));
    }

    let long_sentences = script
        .paragraphs()
        .iter()
        .flat_map(|p| p.sentences.iter())
        .filter(|s| word_count(s) > config.long_sentence_report_words)
        .count();
    if long_sentences > 0 {
        issues.push(format!(
            "{long_sentences} sentences longer than {} words",
            config.long_sentence_report_words
        ));
    }

    let emotional = EMOTIONAL_RE.find_iter(text).count();
    if emotional > config.emotional_adjective_limit {
        issues.push(format!("Too many emotional adjectives ({emotional})"));
    }

    let ellipses = ELLIPSIS_RE.find_iter(text).count();
    if ellipses > config.ellipsis_limit {
        issues.push(format!("Too many ellipses ({ellipses}) - reads as artificial"));
    }

    issues
}

// ---------------------------------------------------------------------------
// Niche
// ---------------------------------------------------------------------------

/// Keyword coverage for a known niche. Unknown niches produce nothing.
pub fn niche_issues(text: &str, niche: &str, catalog: &Catalog) -> Vec<String> {
    let Some(profile) = catalog.niche(niche) else {
        return Vec::new();
    };
    let keywords = profile.keywords();
    let found = keywords.iter().filter(|k| k.is_match(text)).count();
    if (found as f64) < keywords.len() as f64 / 2.0 {
        vec![format!(
            "Script does not read like the '{}' niche ({found}/{} expected keywords)",
            profile.label,
            keywords.len()
        )]
    } else {
        Vec::new()
    }
}
