//! Hand-off to an external rewriting service.
//!
//! The engine never talks to a provider. Callers implement [`Rewriter`] over
//! whatever client they use; this module builds the correction prompt from an
//! [`Analysis`] and checks what comes back.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::catalog::{Catalog, Matcher, GIVEN_NAMES};
use crate::defects::DefectCategory;
use crate::text::word_count;
use crate::Analysis;

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}+").unwrap());

const MAX_PROBLEMS: usize = 10;
const MAX_CLICHES: usize = 8;
const MAX_AI_INDICATORS: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("rewriter failed: {0}")]
    Provider(String),
    #[error("rewritten script too short: {len} characters (minimum {min})")]
    TooShort { len: usize, min: usize },
}

/// An opaque `prompt -> text` service, typically an LLM client.
pub trait Rewriter {
    fn rewrite(&self, prompt: &str) -> Result<String, RewriteError>;
}

impl<F> Rewriter for F
where
    F: Fn(&str) -> Result<String, RewriteError>,
{
    fn rewrite(&self, prompt: &str) -> Result<String, RewriteError> {
        self(prompt)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CorrectionRequest<'a> {
    pub script: &'a str,
    pub niche: &'a str,
    pub title: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Correction {
    pub text: String,
    pub original_chars: usize,
    pub corrected_chars: usize,
    pub improvements: Vec<String>,
}

fn quality_label(overall: f64) -> &'static str {
    if overall < 3.0 {
        "total disaster"
    } else if overall < 6.0 {
        "poor"
    } else {
        "average"
    }
}

fn numbered(out: &mut String, items: impl IntoIterator<Item = impl AsRef<str>>) {
    for (i, item) in items.into_iter().enumerate() {
        out.push_str(&format!("{}. {}\n", i + 1, item.as_ref()));
    }
    out.push('\n');
}

/// Build the instruction prompt a rewriting service receives.
pub fn build_correction_prompt(analysis: &Analysis, request: &CorrectionRequest<'_>) -> String {
    let d = &analysis.defects;
    let title = if request.title.trim().is_empty() {
        "not provided"
    } else {
        request.title
    };
    let niche = if request.niche.trim().is_empty() {
        "general"
    } else {
        request.niche
    };

    let mut p = String::new();
    p.push_str("# SCRIPT THAT NEEDS CORRECTION\n\n## Details\n");
    p.push_str(&format!("- Title: {title}\n"));
    p.push_str(&format!("- Niche: {niche}\n"));
    p.push_str(&format!("- Current score: {:.1}/10\n", analysis.scores.overall));
    p.push_str(&format!(
        "- Quality: {}\n\n## Problems detected\n\n",
        quality_label(analysis.scores.overall)
    ));

    if d.has(DefectCategory::NameInconsistency) {
        p.push_str("### Name inconsistencies (critical)\n");
        numbered(&mut p, d.get(DefectCategory::NameInconsistency));
        p.push_str("Required: pick ONE name per character and use it everywhere.\n\n");
    }

    let problems: Vec<&String> = [
        DefectCategory::RetentionIssue,
        DefectCategory::AuthenticityIssue,
        DefectCategory::NicheIssue,
    ]
    .into_iter()
    .flat_map(|c| d.get(c))
    .take(MAX_PROBLEMS)
    .collect();
    if !problems.is_empty() {
        p.push_str("### Structural problems\n");
        numbered(&mut p, problems);
    }

    if d.has(DefectCategory::Cliche) {
        let mut seen = HashSet::new();
        let cliches: Vec<String> = d
            .get(DefectCategory::Cliche)
            .iter()
            .filter(|c| seen.insert(c.as_str()))
            .take(MAX_CLICHES)
            .map(|c| format!("\"{c}\""))
            .collect();
        p.push_str("### Cliches (remove)\n");
        numbered(&mut p, cliches);
    }

    if d.has(DefectCategory::AiIndicator) {
        p.push_str("### AI patterns (rewrite)\n");
        numbered(
            &mut p,
            d.get(DefectCategory::AiIndicator).iter().take(MAX_AI_INDICATORS),
        );
    }

    let words = word_count(request.script);
    p.push_str("## Original script\n\n");
    p.push_str(request.script.trim());
    p.push_str("\n\n## Task\n\n");
    p.push_str(
        "Rewrite the script completely so that it:\n\
         1. Keeps exactly one name per character from start to finish.\n\
         2. Replaces every cliche with concrete, specific language.\n\
         3. Opens with a strong hook and a question in the first 15 seconds.\n\
         4. Builds conflict, escalation, a climax and a resolution.\n\
         5. Uses direct dialogue instead of long narration.\n\
         6. Adds specific details: numbers, dates, real places.\n\
         7. Contains no generic calls to action and no obvious emotional manipulation.\n\n",
    );
    p.push_str(&format!(
        "Reply with the corrected script only, as plain text, between {} and {} words.\n",
        words * 9 / 10,
        words * 12 / 10
    ));
    p
}

/// Compare a script with its rewrite along the dimensions the prompt asks for.
pub fn summarize_improvements(original: &str, corrected: &str, catalog: &Catalog) -> Vec<String> {
    let mut out = vec![format!(
        "Words: {} -> {}",
        word_count(original),
        word_count(corrected)
    )];

    let removed = catalog
        .cliches()
        .iter()
        .filter(|m| m.is_match(original) && !m.is_match(corrected))
        .count();
    if removed > 0 {
        out.push(format!("Cliches removed: {removed}"));
    }

    let quotes = |t: &str| {
        t.chars()
            .filter(|c| matches!(c, '"' | '\'' | '\u{201C}' | '\u{201D}'))
            .count()
    };
    let (before, after) = (quotes(original), quotes(corrected));
    if after > before {
        out.push(format!("Direct dialogue increased: {before} -> {after}"));
    }

    let (before, after) = (
        DIGITS_RE.find_iter(original).count(),
        DIGITS_RE.find_iter(corrected).count(),
    );
    if after > before {
        out.push(format!("Specific details (numbers) increased: {before} -> {after}"));
    }

    let (before, after) = (distinct_given_names(original), distinct_given_names(corrected));
    if after < before {
        out.push(format!("Distinct character names reduced: {before} -> {after}"));
    }
    out
}

fn distinct_given_names(text: &str) -> usize {
    WORD_RE
        .find_iter(text)
        .map(|w| w.as_str().to_lowercase())
        .filter(|w| GIVEN_NAMES.contains(&w.as_str()))
        .collect::<HashSet<_>>()
        .len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defects::DefectReport;
    use crate::scoring::ScoreCard;

    fn analysis(defects: DefectReport, overall: f64) -> Analysis {
        Analysis {
            word_count: 0,
            scores: ScoreCard {
                retention: overall,
                authenticity: overall,
                niche_alignment: overall,
                overall,
            },
            defects,
            suggestions: Vec::new(),
        }
    }

    fn request(script: &str) -> CorrectionRequest<'_> {
        CorrectionRequest {
            script,
            niche: "",
            title: "",
        }
    }

    #[test]
    fn name_section_lists_findings() {
        let mut d = DefectReport::default();
        d.push(DefectCategory::NameInconsistency, "two names for one role");
        let p = build_correction_prompt(&analysis(d, 0.5), &request("Texto curto."));
        assert!(p.contains("### Name inconsistencies (critical)\n1. two names for one role\n"));
        assert!(p.contains("- Quality: total disaster\n"));
        assert!(p.contains("- Title: not provided\n"));
        assert!(p.contains("- Niche: general\n"));
    }

    #[test]
    fn clean_analysis_has_no_problem_sections() {
        let p = build_correction_prompt(&analysis(DefectReport::default(), 10.0), &request("Ok."));
        assert!(!p.contains("###"));
        assert!(p.contains("- Quality: average\n"));
    }

    #[test]
    fn problems_are_capped_at_ten() {
        let mut d = DefectReport::default();
        d.extend(
            DefectCategory::RetentionIssue,
            (0..12).map(|i| format!("retention {i}")),
        );
        d.push(DefectCategory::NicheIssue, "off niche");
        let p = build_correction_prompt(&analysis(d, 4.0), &request("Texto."));
        assert!(p.contains("### Structural problems\n1. retention 0\n"));
        assert!(p.contains("10. retention 9\n"));
        assert!(!p.contains("retention 10"));
        assert!(!p.contains("off niche"));
        assert!(p.contains("- Quality: poor\n"));
    }

    #[test]
    fn cliches_are_distinct_and_capped_at_eight() {
        let mut d = DefectReport::default();
        d.push(DefectCategory::Cliche, "sem saber");
        d.push(DefectCategory::Cliche, "sem saber");
        d.extend(DefectCategory::Cliche, (0..9).map(|i| format!("cliche{i}")));
        let p = build_correction_prompt(&analysis(d, 8.0), &request("Texto."));
        assert!(p.contains("### Cliches (remove)\n1. \"sem saber\"\n2. \"cliche0\"\n"));
        assert!(p.contains("8. \"cliche6\"\n"));
        assert!(!p.contains("cliche7"));
    }

    #[test]
    fn ai_indicators_are_capped_at_five() {
        let mut d = DefectReport::default();
        d.extend(DefectCategory::AiIndicator, (0..7).map(|i| format!("pattern {i}")));
        let p = build_correction_prompt(&analysis(d, 5.0), &request("Texto."));
        assert!(p.contains("5. pattern 4\n"));
        assert!(!p.contains("pattern 5"));
    }

    #[test]
    fn word_range_follows_script_length() {
        let script = "um dois três quatro cinco seis sete oito nove dez";
        let p = build_correction_prompt(&analysis(DefectReport::default(), 10.0), &request(script));
        assert!(p.contains(script));
        assert!(p.ends_with("between 9 and 12 words.\n"), "{p}");
    }

    #[test]
    fn improvements_cover_dialogue_numbers_and_names() {
        let original = "Maria falou. Sarah falou. Ana falou.";
        let corrected = "\"Oi\", disse Maria em 2020.";
        assert_eq!(
            summarize_improvements(original, corrected, Catalog::builtin()),
            vec![
                "Words: 6 -> 5",
                "Direct dialogue increased: 0 -> 2",
                "Specific details (numbers) increased: 0 -> 1",
                "Distinct character names reduced: 3 -> 1",
            ]
        );
    }

    #[test]
    fn unchanged_text_reports_only_word_counts() {
        let text = "Sem saber, Maria saiu.";
        assert_eq!(
            summarize_improvements(text, text, Catalog::builtin()),
            vec!["Words: 4 -> 4"]
        );
    }
}
