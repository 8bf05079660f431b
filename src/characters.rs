//! Character-name consistency.
//!
//! Generated scripts are often several drafts pasted together, so the same
//! narrative role ends up with two or three different names. The detector
//! extracts capitalized name candidates, assigns them to [`RoleBucket`]s from
//! the cue words found near each occurrence, and reports every bucket that is
//! served by more than one name. A second pass compares the protagonist name
//! of each pair of adjacent paragraphs, which catches splices where every
//! paragraph is internally consistent.

use std::collections::{HashMap, HashSet};
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::catalog::{word_alternation, Span, GIVEN_NAMES, NAME_STOPLIST, ORGANIZATION_SUFFIXES};
use crate::config::EngineConfig;
use crate::text::{snap_to_char_boundary, window_around, ScriptText};

/// One or two capitalized words on the same line.
static CANDIDATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\p{Lu}\p{L}+(?:[ \t]+\p{Lu}\p{L}+)?").unwrap());

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{L}+").unwrap());

static ACTION_CUES: Lazy<Regex> = Lazy::new(|| {
    word_alternation(&[
        "entrou", "chegou", "trabalha", "trabalhava", "saiu", "correu", "abriu", "olhou",
        "sorriu", "respirou", "pegou", "voltou", "entered", "arrived", "works", "worked",
        "walked", "ran", "opened", "looked", "smiled", "returned",
    ])
});

static AUTHORITY_CUES: Lazy<Regex> = Lazy::new(|| {
    word_alternation(&[
        "gerente",
        "chefe",
        "supervisor",
        "supervisora",
        "patrão",
        "manager",
        "boss",
    ])
});

static ELDER_CUES: Lazy<Regex> = Lazy::new(|| {
    word_alternation(&[
        "idoso", "idosa", "senhor", "senhora", "sr.", "sra.", "velho", "velha", "cliente",
        "elderly", "sir", "mr.", "mrs.", "customer", "old man",
    ])
});

static ORGANIZATION_CUES: Lazy<Regex> = Lazy::new(|| {
    word_alternation(&[
        "empresa",
        "companhia",
        "company",
        "cafeteria",
        "café",
        "restaurante",
        "restaurant",
        "loja",
        "store",
        "shop",
        "padaria",
        "bakery",
        "investments",
    ])
});

/// Extra bytes scanned past a window so cue words ending at its edge see their
/// real right-hand neighbour.
const BOUNDARY_SLACK: usize = 16;

// ---------------------------------------------------------------------------
// Roles
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleBucket {
    Protagonist,
    Authority,
    ElderOrBystander,
    Organization,
}

impl RoleBucket {
    pub const ALL: [RoleBucket; 4] = [
        RoleBucket::Protagonist,
        RoleBucket::Authority,
        RoleBucket::ElderOrBystander,
        RoleBucket::Organization,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RoleBucket::Protagonist => "protagonist",
            RoleBucket::Authority => "manager/boss",
            RoleBucket::ElderOrBystander => "elder/customer",
            RoleBucket::Organization => "company/venue",
        }
    }

    /// Cue words that must appear in the same sentence as the name.
    /// For the protagonist these are action verbs; a given name is also required.
    fn cues(self) -> &'static Regex {
        match self {
            RoleBucket::Protagonist => &ACTION_CUES,
            RoleBucket::Authority => &AUTHORITY_CUES,
            RoleBucket::ElderOrBystander => &ELDER_CUES,
            RoleBucket::Organization => &ORGANIZATION_CUES,
        }
    }

    fn consequence(self) -> &'static str {
        match self {
            RoleBucket::Protagonist => "viewers will notice within 30 seconds",
            RoleBucket::Authority => "the narrative breaks",
            RoleBucket::ElderOrBystander => "the cast becomes impossible to follow",
            RoleBucket::Organization => "the setting contradicts itself",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for RoleBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Entities and buckets
// ---------------------------------------------------------------------------

/// A proper-noun candidate and where it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedEntity {
    pub surface: String,
    /// Paragraph of the first occurrence (0-based).
    pub paragraph: usize,
    /// Sentence of the first occurrence within that paragraph (0-based).
    pub sentence: usize,
    pub frequency: usize,
    #[serde(skip)]
    pub occurrences: Vec<Span>,
}

/// Surface forms per role, each list in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleBuckets {
    members: [Vec<String>; 4],
}

impl RoleBuckets {
    pub fn get(&self, role: RoleBucket) -> &[String] {
        &self.members[role.index()]
    }

    pub fn contains(&self, role: RoleBucket, surface: &str) -> bool {
        self.get(role).iter().any(|s| s == surface)
    }

    pub fn is_inconsistent(&self, role: RoleBucket) -> bool {
        self.get(role).len() > 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (RoleBucket, &[String])> {
        RoleBucket::ALL.into_iter().map(move |r| (r, self.get(r)))
    }

    fn insert(&mut self, role: RoleBucket, surface: &str) {
        if !self.contains(role, surface) {
            self.members[role.index()].push(surface.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NameFinding {
    /// One role served by several names.
    RoleConflict { role: RoleBucket, names: Vec<String> },
    /// Adjacent paragraphs name the protagonist differently. Paragraphs are 1-based.
    VersionSplice {
        first_paragraph: usize,
        second_paragraph: usize,
        first_name: String,
        second_name: String,
    },
}

impl fmt::Display for NameFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameFinding::RoleConflict { role, names } => write!(
                f,
                "{} has multiple names: {} - {}",
                role.label().to_uppercase(),
                names.join(", "),
                role.consequence()
            ),
            NameFinding::VersionSplice {
                first_paragraph,
                second_paragraph,
                first_name,
                second_name,
            } => write!(
                f,
                "Version splice: paragraph {first_paragraph} uses \"{first_name}\" but paragraph \
                 {second_paragraph} switches to \"{second_name}\" - alternate drafts pasted together"
            ),
        }
    }
}

/// Canonical surface form per role: the most frequent member, earliest on ties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalNameMap {
    entries: Vec<(RoleBucket, String)>,
    substitutions: Vec<(String, String)>,
}

impl CanonicalNameMap {
    pub fn get(&self, role: RoleBucket) -> Option<&str> {
        self.entries
            .iter()
            .find(|(r, _)| *r == role)
            .map(|(_, s)| s.as_str())
    }

    /// `(variant, canonical)` pairs to apply. A form that is canonical for any
    /// role is never rewritten, and a variant claimed by two roles keeps the
    /// mapping of the first role in [`RoleBucket::ALL`] order.
    pub fn substitutions(&self) -> &[(String, String)] {
        &self.substitutions
    }

    /// The canonical surface of every role that has one.
    pub fn canonical_forms(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, s)| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.substitutions.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    /// Candidates seen more than once, in first-seen order.
    pub entities: Vec<NamedEntity>,
    pub buckets: RoleBuckets,
    pub findings: Vec<NameFinding>,
}

impl ConsistencyReport {
    pub fn has_findings(&self) -> bool {
        !self.findings.is_empty()
    }

    pub fn frequency(&self, surface: &str) -> usize {
        self.entities
            .iter()
            .find(|e| e.surface == surface)
            .map_or(0, |e| e.frequency)
    }

    /// Canonical names, or `None` when the script has no name findings.
    pub fn canonical_names(&self) -> Option<CanonicalNameMap> {
        if !self.has_findings() {
            return None;
        }
        let mut map = CanonicalNameMap::default();
        for (role, members) in self.buckets.iter() {
            let mut best: Option<(&str, usize)> = None;
            for m in members {
                let freq = self.frequency(m);
                if best.map_or(true, |(_, f)| freq > f) {
                    best = Some((m, freq));
                }
            }
            if let Some((canonical, _)) = best {
                map.entries.push((role, canonical.to_string()));
            }
        }

        let canonical: HashSet<&str> = map.entries.iter().map(|(_, s)| s.as_str()).collect();
        let mut substitutions: Vec<(String, String)> = Vec::new();
        for (role, members) in self.buckets.iter() {
            let Some(target) = map.get(role) else { continue };
            for m in members {
                if canonical.contains(m.as_str()) || substitutions.iter().any(|(v, _)| v == m) {
                    continue;
                }
                substitutions.push((m.clone(), target.to_string()));
            }
        }
        map.substitutions = substitutions;
        Some(map)
    }
}

// ---------------------------------------------------------------------------
// Detector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ConsistencyDetector {
    context_window_chars: usize,
}

impl ConsistencyDetector {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            context_window_chars: config.context_window_chars,
        }
    }

    pub fn detect(&self, script: &ScriptText) -> ConsistencyReport {
        let entities: Vec<NamedEntity> = extract_entities(script)
            .into_iter()
            .filter(|e| e.frequency > 1)
            .collect();

        let raw = script.as_str();
        let mut buckets = RoleBuckets::default();
        for entity in &entities {
            for role in RoleBucket::ALL {
                if self.matches_role(raw, entity, role) {
                    buckets.insert(role, &entity.surface);
                }
            }
        }

        let mut findings = Vec::new();
        for (role, members) in buckets.iter() {
            if members.len() > 1 {
                findings.push(NameFinding::RoleConflict {
                    role,
                    names: members.to_vec(),
                });
            }
        }
        findings.extend(version_splices(script, &entities, &buckets));

        ConsistencyReport {
            entities,
            buckets,
            findings,
        }
    }

    fn matches_role(&self, raw: &str, entity: &NamedEntity, role: RoleBucket) -> bool {
        match role {
            RoleBucket::Protagonist => {
                has_given_name(&entity.surface) && self.cue_near(raw, entity, role)
            }
            RoleBucket::Organization => {
                has_organization_suffix(&entity.surface) || self.cue_near(raw, entity, role)
            }
            RoleBucket::Authority | RoleBucket::ElderOrBystander => {
                self.cue_near(raw, entity, role)
            }
        }
    }

    /// True when any occurrence has a cue for `role` in its window and in the
    /// same sentence.
    fn cue_near(&self, raw: &str, entity: &NamedEntity, role: RoleBucket) -> bool {
        let cues = role.cues();
        entity.occurrences.iter().any(|occ| {
            let (lo, hi) = window_around(raw, occ.start, occ.end, self.context_window_chars);
            let scan_end = snap_to_char_boundary(raw, hi + BOUNDARY_SLACK, true);
            let haystack = &raw[..scan_end];
            let mut at = lo;
            while let Some(m) = cues.find_at(haystack, at) {
                if m.end() > hi {
                    break;
                }
                let cue = Span {
                    start: m.start(),
                    end: m.end(),
                };
                if same_sentence(raw, cue, *occ) {
                    return true;
                }
                at = m.end();
            }
            false
        })
    }
}

fn same_sentence(raw: &str, a: Span, b: Span) -> bool {
    let (left, right) = if a.start <= b.start { (a, b) } else { (b, a) };
    if left.end >= right.start {
        return true;
    }
    !raw[left.end..right.start].contains(['.', '!', '?', '\n'])
}

fn has_given_name(surface: &str) -> bool {
    WORD_RE
        .find_iter(surface)
        .any(|w| GIVEN_NAMES.contains(&w.as_str().to_lowercase().as_str()))
}

fn has_organization_suffix(surface: &str) -> bool {
    WORD_RE
        .find_iter(surface)
        .last()
        .is_some_and(|w| ORGANIZATION_SUFFIXES.contains(&w.as_str().to_lowercase().as_str()))
}

pub(crate) fn is_stopword(word: &str) -> bool {
    NAME_STOPLIST.contains(&word.to_lowercase().as_str())
}

/// Every name candidate in the script, with frequencies, in first-seen order.
pub fn extract_entities(script: &ScriptText) -> Vec<NamedEntity> {
    let mut entities: Vec<NamedEntity> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for (p_idx, para) in script.paragraphs().iter().enumerate() {
        for m in CANDIDATE_RE.find_iter(&para.text) {
            let words: Vec<_> = WORD_RE.find_iter(m.as_str()).collect();
            let first = words.iter().position(|w| !is_stopword(w.as_str()));
            let last = words.iter().rposition(|w| !is_stopword(w.as_str()));
            let (Some(first), Some(last)) = (first, last) else {
                continue;
            };
            let local_start = m.start() + words[first].start();
            let local_end = m.start() + words[last].end();
            let surface = &para.text[local_start..local_end];
            let span = Span {
                start: para.offset + local_start,
                end: para.offset + local_end,
            };

            match index.get(surface) {
                Some(&i) => {
                    entities[i].frequency += 1;
                    entities[i].occurrences.push(span);
                }
                None => {
                    index.insert(surface.to_string(), entities.len());
                    entities.push(NamedEntity {
                        surface: surface.to_string(),
                        paragraph: p_idx,
                        sentence: para.sentence_index_at(local_start),
                        frequency: 1,
                        occurrences: vec![span],
                    });
                }
            }
        }
    }
    entities
}

fn version_splices(
    script: &ScriptText,
    entities: &[NamedEntity],
    buckets: &RoleBuckets,
) -> Vec<NameFinding> {
    // First protagonist occurrence per paragraph: (byte offset, surface).
    let mut first_by_paragraph: Vec<Option<(usize, &str)>> = vec![None; script.paragraphs().len()];
    for entity in entities
        .iter()
        .filter(|e| buckets.contains(RoleBucket::Protagonist, &e.surface))
    {
        for occ in &entity.occurrences {
            let Some(p) = script.paragraph_index_at(occ.start) else {
                continue;
            };
            let slot = &mut first_by_paragraph[p];
            if slot.map_or(true, |(start, _)| occ.start < start) {
                *slot = Some((occ.start, entity.surface.as_str()));
            }
        }
    }

    first_by_paragraph
        .windows(2)
        .enumerate()
        .filter_map(|(i, pair)| match (pair[0], pair[1]) {
            (Some((_, a)), Some((_, b))) if a != b => Some(NameFinding::VersionSplice {
                first_paragraph: i + 1,
                second_paragraph: i + 2,
                first_name: a.to_string(),
                second_name: b.to_string(),
            }),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(text: &str) -> ConsistencyReport {
        ConsistencyDetector::new(&EngineConfig::default()).detect(&ScriptText::parse(text))
    }

    #[test]
    fn candidates_drop_sentence_openers_and_honorifics() {
        let script = ScriptText::parse("Quando Maria entrou, o Sr. Wilson sorriu. Então Maria saiu.");
        let surfaces: Vec<_> = extract_entities(&script)
            .into_iter()
            .map(|e| (e.surface, e.frequency))
            .collect();
        assert_eq!(
            surfaces,
            vec![("Maria".to_string(), 2), ("Wilson".to_string(), 1)]
        );
    }

    #[test]
    fn two_word_names_stay_together() {
        let script = ScriptText::parse("O gerente Carlos Mendes chegou. Carlos Mendes gritou.");
        let entities = extract_entities(&script);
        assert_eq!(entities[0].surface, "Carlos Mendes");
        assert_eq!(entities[0].frequency, 2);
        assert_eq!(entities[0].sentence, 0);
    }

    #[test]
    fn protagonist_needs_name_and_action_cue() {
        let report = detect("Maria entrou na loja. Maria chegou cedo. Sarah dormia. Sarah sonhava.");
        assert_eq!(report.buckets.get(RoleBucket::Protagonist), ["Maria"]);
        assert!(report.findings.is_empty());
    }

    #[test]
    fn cues_in_other_sentences_are_ignored() {
        let report = detect(
            "Maria entrou no café. O gerente chamou. Maria chegou depois. Ricardo, o gerente, riu. Ricardo saiu.",
        );
        assert_eq!(report.buckets.get(RoleBucket::Authority), ["Ricardo"]);
        assert!(!report.buckets.contains(RoleBucket::Authority, "Maria"));
    }

    #[test]
    fn cue_window_is_measured_in_characters() {
        let filler = "ação ".repeat(8);
        let sentence = format!("Ricardo {}gerente.", filler);
        let between = &sentence["Ricardo".len()..sentence.find("gerente").unwrap()];
        assert!(between.chars().count() < 50 && between.len() > 50);
        let report = detect(&format!("{sentence} {sentence}"));
        assert_eq!(report.buckets.get(RoleBucket::Authority), ["Ricardo"]);
    }

    #[test]
    fn organization_suffix_is_enough() {
        let report = detect("A Acme Inc fechou. Todos falavam da Acme Inc.");
        assert_eq!(report.buckets.get(RoleBucket::Organization), ["Acme Inc"]);
    }

    #[test]
    fn elder_cue_with_abbreviation_dot_counts() {
        let report = detect("O Sr. Wilson pediu café. O Sr. Wilson pagou.");
        assert_eq!(report.buckets.get(RoleBucket::ElderOrBystander), ["Wilson"]);
    }

    #[test]
    fn splice_between_adjacent_paragraphs() {
        let report = detect(
            "Maria entrou no prédio. Maria chegou tarde.\n\nSarah entrou no prédio. Sarah chegou tarde.",
        );
        assert_eq!(
            report.findings,
            vec![
                NameFinding::RoleConflict {
                    role: RoleBucket::Protagonist,
                    names: vec!["Maria".into(), "Sarah".into()],
                },
                NameFinding::VersionSplice {
                    first_paragraph: 1,
                    second_paragraph: 2,
                    first_name: "Maria".into(),
                    second_name: "Sarah".into(),
                },
            ]
        );
    }

    #[test]
    fn canonical_map_prefers_frequent_then_earliest() {
        let report = detect(
            "Sarah entrou. Sarah chegou.\n\nMaria entrou. Maria chegou. Maria trabalha.",
        );
        let map = report.canonical_names().unwrap();
        assert_eq!(map.get(RoleBucket::Protagonist), Some("Maria"));
        assert_eq!(map.substitutions(), [("Sarah".to_string(), "Maria".to_string())]);
    }

    #[test]
    fn no_findings_means_no_canonical_map() {
        let report = detect("Maria entrou. Maria chegou.");
        assert!(report.canonical_names().is_none());
    }
}
