//! Engine tuning knobs.
//!
//! Every threshold and penalty the analysis uses lives here so that a deployment
//! can resolve one `EngineConfig` at startup (defaults or a JSON file) and hand it
//! to [`crate::Engine::new`]. Nothing reads configuration during an analysis.

use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Character consistency
    pub context_window_chars: usize,

    // Structural retention checks
    pub hook_window_chars: usize,
    pub question_window_chars: usize,
    pub min_paragraphs: usize,
    pub min_story_loops: usize,

    // Authenticity heuristics (reported, not scored)
    pub repeated_word_min_chars: usize,
    pub repeated_word_min_count: usize,
    pub repeated_word_limit: usize,
    pub long_sentence_report_words: usize,
    pub emotional_adjective_limit: usize,
    pub ellipsis_limit: usize,

    // Penalties
    pub score_max: f64,
    pub retention_issue_penalty: f64,
    pub name_inconsistency_penalty: f64,
    pub ai_indicator_penalty: f64,
    pub cliche_penalty: f64,
    pub niche_issue_penalty: f64,
    pub name_clamp_threshold: usize,
    pub name_clamp_ceiling: f64,

    // Normalizer
    pub long_sentence_words: usize,
    pub split_window_words: usize,

    // Reporting
    pub excerpt_chars: usize,
    pub suggested_cliche_count: usize,

    // Correction round-trip
    pub min_rewrite_chars: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            context_window_chars: 50,
            hook_window_chars: 150,
            question_window_chars: 300,
            min_paragraphs: 6,
            min_story_loops: 2,
            repeated_word_min_chars: 5,
            repeated_word_min_count: 5,
            repeated_word_limit: 10,
            long_sentence_report_words: 40,
            emotional_adjective_limit: 5,
            ellipsis_limit: 10,
            score_max: 10.0,
            retention_issue_penalty: 2.0,
            name_inconsistency_penalty: 3.0,
            ai_indicator_penalty: 1.5,
            cliche_penalty: 0.5,
            niche_issue_penalty: 2.0,
            name_clamp_threshold: 2,
            name_clamp_ceiling: 1.0,
            long_sentence_words: 35,
            split_window_words: 5,
            excerpt_chars: 50,
            suggested_cliche_count: 3,
            min_rewrite_chars: 500,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context_window_chars == 0 {
            return Err(ConfigError::Invalid(
                "context_window_chars must be greater than zero".into(),
            ));
        }
        if !(self.score_max.is_finite() && self.score_max > 0.0) {
            return Err(ConfigError::Invalid("score_max must be positive".into()));
        }
        let penalties = [
            ("retention_issue_penalty", self.retention_issue_penalty),
            ("name_inconsistency_penalty", self.name_inconsistency_penalty),
            ("ai_indicator_penalty", self.ai_indicator_penalty),
            ("cliche_penalty", self.cliche_penalty),
            ("niche_issue_penalty", self.niche_issue_penalty),
        ];
        for (name, value) in penalties {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number"
                )));
            }
        }
        if !(0.0..=self.score_max).contains(&self.name_clamp_ceiling) {
            return Err(ConfigError::Invalid(
                "name_clamp_ceiling must lie between 0 and score_max".into(),
            ));
        }
        // A split part must stay non-empty on both sides of the window.
        if self.split_window_words * 2 >= self.long_sentence_words {
            return Err(ConfigError::Invalid(
                "split_window_words must be less than half of long_sentence_words".into(),
            ));
        }
        Ok(())
    }
}
