use crate::defects::DefectCategory;
use crate::Analysis;

const RULE_WIDTH: usize = 60;

/// Plain-text summary of an analysis. Presentation only.
pub fn render_report(analysis: &Analysis) -> String {
    let banner = "=".repeat(RULE_WIDTH);
    let rule = "-".repeat(RULE_WIDTH);
    let s = &analysis.scores;
    let mut out = String::new();

    out.push_str(&format!("{banner}\n  SCRIPT ANALYSIS\n{banner}\n\n"));

    out.push_str(&format!("SCORES\n{rule}\n"));
    out.push_str(&format!("  Overall:          {:.1}/10\n", s.overall));
    out.push_str(&format!("  Retention:        {:.1}/10\n", s.retention));
    out.push_str(&format!("  Authenticity:     {:.1}/10\n", s.authenticity));
    out.push_str(&format!("  Niche alignment:  {:.1}/10\n", s.niche_alignment));
    out.push_str(&format!("  Words:            {}\n", analysis.word_count));

    let total = analysis.defects.total();
    out.push_str(&format!("\nPROBLEMS ({total})\n{rule}\n"));
    if total == 0 {
        out.push_str("  none\n");
    }
    for (category, findings) in analysis.defects.iter() {
        if category == DefectCategory::Cliche {
            out.push_str(&format!("  [{}] {}\n", category.title(), findings.join(", ")));
            continue;
        }
        for (i, finding) in findings.iter().enumerate() {
            out.push_str(&format!("  [{}] {}. {}\n", category.title(), i + 1, finding));
        }
    }

    out.push_str(&format!(
        "\nSUGGESTIONS ({})\n{rule}\n",
        analysis.suggestions.len()
    ));
    for (i, suggestion) in analysis.suggestions.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, suggestion));
    }
    out.push_str(&format!("{banner}\n"));
    out
}
