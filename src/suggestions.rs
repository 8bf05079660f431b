use crate::defects::{DefectCategory, DefectReport};

const NAME_REWRITE: &str = "CRITICAL: rewrite the whole script keeping exactly one name per \
     character. This script reads like several drafts pasted together.";

const ALWAYS: [&str; 3] = [
    "Add specific details (numbers, dates, real places)",
    "Use more direct dialogue and less narration",
    "Plant smaller plot twists before the main one",
];

/// Remediation steps, ordered by category. The output depends only on which
/// categories are non-empty (and, for clichés, on which phrases were found).
pub fn suggestions(defects: &DefectReport, cliche_examples: usize) -> Vec<String> {
    let mut out = Vec::new();

    for category in DefectCategory::ALL {
        if !defects.has(category) {
            continue;
        }
        let line = match category {
            DefectCategory::NameInconsistency => NAME_REWRITE.to_string(),
            DefectCategory::AiIndicator => {
                "Remove every AI pattern found and rewrite those passages in natural language"
                    .to_string()
            }
            DefectCategory::Cliche => {
                let mut distinct: Vec<&str> = Vec::new();
                for c in defects.get(DefectCategory::Cliche) {
                    if !distinct.contains(&c.as_str()) {
                        distinct.push(c);
                    }
                }
                distinct.truncate(cliche_examples);
                format!(
                    "Replace cliches with specific descriptions: {}",
                    distinct.join(", ")
                )
            }
            DefectCategory::Manipulation => {
                "Drop the explicit emotional cues and let the events carry the feeling".to_string()
            }
            DefectCategory::GenericCta => {
                "Cut the generic calls to action; close with one ask tied to the story".to_string()
            }
            DefectCategory::RetentionIssue => {
                "Restructure as Hook > Conflict > Escalation > Climax > Resolution".to_string()
            }
            DefectCategory::AuthenticityIssue => {
                "Vary sentence structure and use more colloquial language".to_string()
            }
            DefectCategory::NicheIssue => {
                "Work in the vocabulary and framing this niche's audience expects".to_string()
            }
        };
        out.push(line);
    }

    out.extend(ALWAYS.iter().map(|s| s.to_string()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_rewrite_comes_first() {
        let mut d = DefectReport::default();
        d.push(DefectCategory::RetentionIssue, "weak hook");
        d.push(DefectCategory::NameInconsistency, "two names");
        let s = suggestions(&d, 3);
        assert_eq!(s[0], NAME_REWRITE);
        assert!(s[1].starts_with("Restructure"));
        assert_eq!(s.len(), 2 + ALWAYS.len());
    }

    #[test]
    fn cliche_examples_are_distinct_and_capped() {
        let mut d = DefectReport::default();
        d.extend(
            DefectCategory::Cliche,
            ["sem saber", "sem saber", "karma", "o destino", "prestes a"],
        );
        let s = suggestions(&d, 3);
        assert_eq!(
            s[0],
            "Replace cliches with specific descriptions: sem saber, karma, o destino"
        );
    }

    #[test]
    fn clean_report_gets_only_general_advice() {
        assert_eq!(suggestions(&DefectReport::default(), 3), ALWAYS.to_vec());
    }
}
