use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Defect classes, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectCategory {
    NameInconsistency,
    AiIndicator,
    Cliche,
    Manipulation,
    GenericCta,
    RetentionIssue,
    AuthenticityIssue,
    NicheIssue,
}

impl DefectCategory {
    pub const ALL: [DefectCategory; 8] = [
        DefectCategory::NameInconsistency,
        DefectCategory::AiIndicator,
        DefectCategory::Cliche,
        DefectCategory::Manipulation,
        DefectCategory::GenericCta,
        DefectCategory::RetentionIssue,
        DefectCategory::AuthenticityIssue,
        DefectCategory::NicheIssue,
    ];

    pub fn key(self) -> &'static str {
        match self {
            DefectCategory::NameInconsistency => "name_inconsistency",
            DefectCategory::AiIndicator => "ai_indicator",
            DefectCategory::Cliche => "cliche",
            DefectCategory::Manipulation => "manipulation",
            DefectCategory::GenericCta => "generic_cta",
            DefectCategory::RetentionIssue => "retention_issue",
            DefectCategory::AuthenticityIssue => "authenticity_issue",
            DefectCategory::NicheIssue => "niche_issue",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            DefectCategory::NameInconsistency => "Name inconsistencies",
            DefectCategory::AiIndicator => "AI patterns",
            DefectCategory::Cliche => "Cliches",
            DefectCategory::Manipulation => "Emotional manipulation",
            DefectCategory::GenericCta => "Generic calls to action",
            DefectCategory::RetentionIssue => "Retention",
            DefectCategory::AuthenticityIssue => "Authenticity",
            DefectCategory::NicheIssue => "Niche alignment",
        }
    }
}

impl fmt::Display for DefectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Findings per category in detection order. Empty categories are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DefectReport {
    findings: BTreeMap<DefectCategory, Vec<String>>,
}

impl DefectReport {
    pub fn push(&mut self, category: DefectCategory, finding: impl Into<String>) {
        self.findings
            .entry(category)
            .or_default()
            .push(finding.into());
    }

    pub fn extend<I, S>(&mut self, category: DefectCategory, findings: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for f in findings {
            self.push(category, f);
        }
    }

    pub fn get(&self, category: DefectCategory) -> &[String] {
        self.findings
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn count(&self, category: DefectCategory) -> usize {
        self.get(category).len()
    }

    pub fn has(&self, category: DefectCategory) -> bool {
        self.count(category) > 0
    }

    pub fn is_empty(&self) -> bool {
        self.findings.values().all(Vec::is_empty)
    }

    pub fn total(&self) -> usize {
        self.findings.values().map(Vec::len).sum()
    }

    /// Non-empty categories in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (DefectCategory, &[String])> {
        self.findings
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (*k, v.as_slice()))
    }
}
