//! Rule-based quality analysis and normalization for short-form video scripts.
//!
//! [`Engine::analyze`] scores a script and explains what is wrong with it,
//! [`Engine::optimize`] applies the deterministic rewrite pipeline, and
//! [`Engine::correct`] hands a correction prompt to a caller-supplied
//! [`Rewriter`].

pub mod catalog;
pub mod characters;
pub mod config;
pub mod defects;
pub mod heuristics;
pub mod normalize;
pub mod prompt;
pub mod report;
pub mod scoring;
pub mod suggestions;
pub mod text;

use serde::Serialize;
use tracing::{debug, info};

pub use catalog::Catalog;
pub use characters::{ConsistencyDetector, NameFinding, RoleBucket};
pub use config::{ConfigError, EngineConfig};
pub use defects::{DefectCategory, DefectReport};
pub use normalize::Normalizer;
pub use prompt::{Correction, CorrectionRequest, RewriteError, Rewriter};
pub use report::render_report;
pub use scoring::ScoreCard;
pub use text::ScriptText;

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub word_count: usize,
    pub scores: ScoreCard,
    pub defects: DefectReport,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Engine<'c> {
    catalog: &'c Catalog,
    config: EngineConfig,
}

impl Default for Engine<'static> {
    fn default() -> Self {
        Self::new(Catalog::builtin(), EngineConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

impl<'c> Engine<'c> {
    /// `config` is used as given. Configs loaded through
    /// [`EngineConfig::from_json_file`] are already validated; hand-built ones
    /// can be checked with [`EngineConfig::validate`].
    pub fn new(catalog: &'c Catalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn analyze(&self, text: &str, niche: &str) -> Analysis {
        let script = ScriptText::parse(text);
        if script.is_blank() {
            return Analysis {
                word_count: 0,
                scores: ScoreCard::perfect(&self.config),
                defects: DefectReport::default(),
                suggestions: Vec::new(),
            };
        }

        let raw = script.as_str();
        let mut defects = DefectReport::default();

        let names = ConsistencyDetector::new(&self.config).detect(&script);
        defects.extend(
            DefectCategory::NameInconsistency,
            names.findings.iter().map(ToString::to_string),
        );
        defects.extend(
            DefectCategory::AiIndicator,
            heuristics::ai_indicators(raw, self.catalog, &self.config),
        );
        defects.extend(
            DefectCategory::Cliche,
            heuristics::phrase_hits(raw, self.catalog.cliches()),
        );
        defects.extend(
            DefectCategory::Manipulation,
            heuristics::phrase_hits(raw, self.catalog.manipulation()),
        );
        defects.extend(
            DefectCategory::GenericCta,
            heuristics::phrase_hits(raw, self.catalog.generic_ctas()),
        );
        defects.extend(
            DefectCategory::RetentionIssue,
            heuristics::retention_issues(&script, &self.config),
        );
        defects.extend(
            DefectCategory::AuthenticityIssue,
            heuristics::authenticity_issues(&script, &self.config),
        );
        defects.extend(
            DefectCategory::NicheIssue,
            heuristics::niche_issues(raw, niche, self.catalog),
        );

        let scores = ScoreCard::compute(&defects, &self.config);
        let suggestions = suggestions::suggestions(&defects, self.config.suggested_cliche_count);
        debug!(
            words = script.word_count(),
            defects = defects.total(),
            overall = scores.overall,
            niche,
            "analyzed script"
        );

        Analysis {
            word_count: script.word_count(),
            scores,
            defects,
            suggestions,
        }
    }

    pub fn optimize(&self, text: &str) -> String {
        let script = ScriptText::parse(text);
        Normalizer::new(self.catalog, &self.config)
            .run(&script)
            .into_string()
    }

    /// Analyze `request.script`, ask `rewriter` for a corrected version and
    /// summarize what changed.
    pub fn correct(
        &self,
        rewriter: &dyn Rewriter,
        request: &CorrectionRequest<'_>,
    ) -> Result<Correction, RewriteError> {
        let analysis = self.analyze(request.script, request.niche);
        let instructions = prompt::build_correction_prompt(&analysis, request);
        let rewritten = rewriter.rewrite(&instructions)?;
        let text = rewritten.trim().to_string();

        let len = text.chars().count();
        if len < self.config.min_rewrite_chars {
            return Err(RewriteError::TooShort {
                len,
                min: self.config.min_rewrite_chars,
            });
        }

        let improvements = prompt::summarize_improvements(request.script, &text, self.catalog);
        let correction = Correction {
            original_chars: request.script.chars().count(),
            corrected_chars: len,
            improvements,
            text,
        };
        info!(
            original_chars = correction.original_chars,
            corrected_chars = correction.corrected_chars,
            improvements = correction.improvements.len(),
            "script corrected"
        );
        Ok(correction)
    }
}

// ---------------------------------------------------------------------------
// Convenience
// ---------------------------------------------------------------------------

/// Analyze with the built-in catalog and default configuration.
pub fn analyze(text: &str, niche: &str) -> Analysis {
    Engine::default().analyze(text, niche)
}

/// Normalize with the built-in catalog and default configuration.
pub fn optimize(text: &str) -> String {
    Engine::default().optimize(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_rewrite() -> String {
        "Clara abriu a porta da oficina às 7 horas e encontrou 3 caixas. ".repeat(12)
    }

    #[test]
    fn correct_returns_rewrite_and_summary() {
        let engine = Engine::default();
        let script = "Sem saber, Maria entrou. Sem saber, ela saiu.";
        let rewriter = |prompt: &str| -> Result<String, RewriteError> {
            assert!(prompt.contains("sem saber"));
            Ok(long_rewrite())
        };
        let request = CorrectionRequest {
            script,
            niche: "geral",
            title: "",
        };
        let correction = engine.correct(&rewriter, &request).unwrap();
        assert_eq!(correction.original_chars, script.chars().count());
        assert_eq!(correction.corrected_chars, correction.text.chars().count());
        assert!(correction
            .improvements
            .iter()
            .any(|i| i == "Cliches removed: 1"));
    }

    #[test]
    fn short_rewrite_is_rejected() {
        let rewriter = |_: &str| -> Result<String, RewriteError> { Ok("curto".to_string()) };
        let request = CorrectionRequest {
            script: "Uma história.",
            niche: "",
            title: "",
        };
        match Engine::default().correct(&rewriter, &request) {
            Err(RewriteError::TooShort { len, min }) => {
                assert_eq!(len, 5);
                assert_eq!(min, 500);
            }
            other => panic!("expected TooShort, got {other:?}"),
        }
    }

    #[test]
    fn provider_errors_pass_through() {
        let rewriter =
            |_: &str| -> Result<String, RewriteError> { Err(RewriteError::Provider("timeout".into())) };
        let request = CorrectionRequest {
            script: "Uma história.",
            niche: "",
            title: "",
        };
        let err = Engine::default().correct(&rewriter, &request).unwrap_err();
        assert_eq!(err.to_string(), "rewriter failed: timeout");
    }
}
