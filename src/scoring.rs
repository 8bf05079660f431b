use serde::Serialize;

use crate::config::EngineConfig;
use crate::defects::{DefectCategory, DefectReport};

/// Sub-scores and composite, each in `[0, score_max]`, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreCard {
    pub retention: f64,
    pub authenticity: f64,
    pub niche_alignment: f64,
    pub overall: f64,
}

impl ScoreCard {
    pub fn perfect(config: &EngineConfig) -> Self {
        Self {
            retention: config.score_max,
            authenticity: config.score_max,
            niche_alignment: config.score_max,
            overall: config.score_max,
        }
    }

    /// Every penalty is applied to unrounded values; rounding happens last.
    pub fn compute(defects: &DefectReport, config: &EngineConfig) -> Self {
        let names = defects.count(DefectCategory::NameInconsistency) as f64;
        let name_penalty = names * config.name_inconsistency_penalty;

        let retention = floor(
            config.score_max
                - defects.count(DefectCategory::RetentionIssue) as f64
                    * config.retention_issue_penalty
                - name_penalty,
        );
        let authenticity = floor(
            config.score_max
                - defects.count(DefectCategory::AiIndicator) as f64 * config.ai_indicator_penalty
                - defects.count(DefectCategory::Cliche) as f64 * config.cliche_penalty
                - name_penalty,
        );
        let niche_alignment = floor(
            config.score_max
                - defects.count(DefectCategory::NicheIssue) as f64 * config.niche_issue_penalty,
        );

        let mut overall = (retention + authenticity + niche_alignment) / 3.0;
        // Severe continuity failure dominates every other signal.
        if defects.count(DefectCategory::NameInconsistency) > config.name_clamp_threshold {
            overall = overall.min(config.name_clamp_ceiling);
        }

        Self {
            retention: round1(retention),
            authenticity: round1(authenticity),
            niche_alignment: round1(niche_alignment),
            overall: round1(overall),
        }
    }
}

fn floor(score: f64) -> f64 {
    score.max(0.0)
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(entries: &[(DefectCategory, usize)]) -> DefectReport {
        let mut r = DefectReport::default();
        for &(category, n) in entries {
            for i in 0..n {
                r.push(category, format!("finding {i}"));
            }
        }
        r
    }

    #[test]
    fn empty_report_scores_max() {
        let c = EngineConfig::default();
        assert_eq!(ScoreCard::compute(&DefectReport::default(), &c), ScoreCard::perfect(&c));
    }

    #[test]
    fn penalties_floor_at_zero() {
        let s = ScoreCard::compute(
            &report(&[(DefectCategory::RetentionIssue, 5), (DefectCategory::AiIndicator, 9)]),
            &EngineConfig::default(),
        );
        assert_eq!(s.retention, 0.0);
        assert_eq!(s.authenticity, 0.0);
        assert_eq!(s.niche_alignment, 10.0);
        assert_eq!(s.overall, 3.3);
    }

    #[test]
    fn clamp_only_above_threshold() {
        let c = EngineConfig::default();
        let two = ScoreCard::compute(&report(&[(DefectCategory::NameInconsistency, 2)]), &c);
        assert_eq!(two.retention, 4.0);
        assert_eq!(two.authenticity, 4.0);
        assert_eq!(two.overall, 6.0);

        let three = ScoreCard::compute(&report(&[(DefectCategory::NameInconsistency, 3)]), &c);
        assert_eq!(three.overall, 1.0);
    }

    #[test]
    fn rounding_happens_once() {
        // 10 - 0.5 * 3 = 8.5; mean of (10, 8.5, 10) = 9.5
        let s = ScoreCard::compute(
            &report(&[(DefectCategory::Cliche, 3)]),
            &EngineConfig::default(),
        );
        assert_eq!(s.authenticity, 8.5);
        assert_eq!(s.overall, 9.5);
    }
}
