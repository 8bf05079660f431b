//! Static pattern tables.
//!
//! The [`Catalog`] is built once per process and shared read-only. Every table
//! here is data: adding a phrase never requires touching the detectors.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

// ---------------------------------------------------------------------------
// Matchers
// ---------------------------------------------------------------------------

/// Byte range of a match inside the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn as_str<'t>(&self, text: &'t str) -> &'t str {
        &text[self.start..self.end]
    }
}

/// Anything that can locate catalog entries in a text.
///
/// Implementations must be case-insensitive and must not backtrack
/// unboundedly; both built-in matchers compile to `regex` automata.
pub trait Matcher: Send + Sync + fmt::Debug {
    /// Human-readable name of the entry, used in findings.
    fn label(&self) -> &str;

    /// Non-overlapping matches in text order.
    fn find_spans(&self, text: &str) -> Vec<Span>;

    fn is_match(&self, text: &str) -> bool {
        !self.find_spans(text).is_empty()
    }
}

/// A regular-expression entry, matched case-insensitively.
#[derive(Debug)]
pub struct PatternMatcher {
    source: &'static str,
    regex: Regex,
}

impl PatternMatcher {
    pub fn new(source: &'static str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("(?i){source}"))?;
        Ok(Self { source, regex })
    }
}

impl Matcher for PatternMatcher {
    fn label(&self) -> &str {
        self.source
    }

    fn find_spans(&self, text: &str) -> Vec<Span> {
        self.regex
            .find_iter(text)
            .map(|m| Span {
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }

    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// A literal phrase, matched case-insensitively on whole-word boundaries.
#[derive(Debug)]
pub struct PhraseMatcher {
    phrase: &'static str,
    regex: Regex,
}

impl PhraseMatcher {
    pub fn new(phrase: &'static str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(phrase)))?;
        Ok(Self { phrase, regex })
    }
}

impl Matcher for PhraseMatcher {
    fn label(&self) -> &str {
        self.phrase
    }

    fn find_spans(&self, text: &str) -> Vec<Span> {
        self.regex
            .find_iter(text)
            .map(|m| Span {
                start: m.start(),
                end: m.end(),
            })
            .collect()
    }

    fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

// ---------------------------------------------------------------------------
// Raw tables
// ---------------------------------------------------------------------------

const AI_INDICATOR_PATTERNS: &[&str] = &[
    r"\bsem saber\b.*\bprestes a descobrir\b",
    r"\bdignidade intacta\b",
    r"\blágrimas (escorriam|começaram a rolar)\b",
    r"\bo destino preparava\b",
    r"\buma reviravolta que mudaria\b",
    r"\ba bondade (sempre|verdadeira) (vence|encontra seu caminho)\b",
    r"\bmoral da história\b",
    r"\bse esta história te emocionou\b",
    r"\bdeixe seu like\b.*\bse inscreva\b",
    r"\bcom lágrimas nos olhos\b",
    r"\bnão fazia ideia (de que|do que)\b",
    r"\blittle did (she|he|they) know\b",
    r"\bfate had other plans\b",
    r"\bwith tears in (her|his|their) eyes\b",
];

const NARRATIVE_CLICHES: &[&str] = &[
    "sem saber",
    "prestes a",
    "não fazia ideia",
    "o destino",
    "a vida mudaria para sempre",
    "reviravolta inesperada",
    "dignidade intacta",
    "lágrimas nos olhos",
    "moral da história",
    "a bondade sempre vence",
    "justiça foi feita",
    "karma",
    "o universo",
    "destino tinha outros planos",
    "little did she know",
    "fate had other plans",
    "tears in her eyes",
];

const EMOTIONAL_MANIPULATION: &[&str] = &[
    "você vai chorar",
    "prepare os lenços",
    "vai te emocionar",
    "vai te fazer repensar",
    "história emocionante",
    "prepare-se para se emocionar",
    "não acreditou no que aconteceu",
    "you will cry",
    "grab your tissues",
];

const GENERIC_CTAS: &[&str] = &[
    "deixe seu like",
    "se inscreva no canal",
    "ative o sininho",
    "compartilhe esta história",
    "comente abaixo",
    "qual é a moral",
    "deixe seu comentário",
    "like and subscribe",
    "hit the bell",
    "comment below",
];

/// Fixed literal replacement per cliché. No replacement may contain a key.
pub const CLICHE_REPLACEMENTS: &[(&str, &str)] = &[
    ("sem saber", "não imaginava"),
    ("prestes a descobrir", "logo saberia"),
    ("dignidade intacta", "cabeça erguida"),
    ("lágrimas escorriam", "olhos marejados"),
    ("o destino preparava", "algo inesperado estava por vir"),
    ("a bondade sempre vence", "o bem prevaleceu"),
    ("moral da história", "o que aprendemos"),
    ("little did she know", "she had no idea"),
];

/// Stiff connectives and intensifiers mapped to plainer equivalents.
pub const COLLOQUIAL_REPLACEMENTS: &[(&str, &str)] = &[
    ("porém", "mas"),
    ("contudo", "mas"),
    ("todavia", "mas"),
    ("entretanto", "mas"),
    ("muitíssimo", "muito"),
    ("extremamente", "muito"),
    ("nevertheless", "still"),
    ("furthermore", "also"),
    ("extremely", "really"),
];

/// Direct-address and curiosity cues expected near the opening.
pub const HOOK_CUES: &[&str] = &[
    "você", "imagine", "já", "por que", "como", "you", "already", "why", "how",
];

/// Contrastive connectives that signal a narrative reversal.
pub const REVERSAL_MARKERS: &[&str] = &["mas", "porém", "contudo", "but", "however"];

pub const EMOTIONAL_ADJECTIVES: &[&str] = &[
    "emocionante",
    "inacreditável",
    "surpreendente",
    "devastador",
    "chocante",
    "heartbreaking",
    "shocking",
    "unbelievable",
];

/// Given names the protagonist heuristic recognises. Deliberately closed.
pub const GIVEN_NAMES: &[&str] = &[
    "maria", "sarah", "ana", "melissa", "joão", "carlos", "pedro", "julia", "beatriz", "lucas",
    "rafael", "emily", "emma", "jessica", "daniel",
];

/// Capitalized words that never start or end a name candidate.
pub const NAME_STOPLIST: &[&str] = &[
    // Portuguese function words and sentence openers
    "o", "a", "os", "as", "um", "uma", "uns", "umas", "e", "mas", "porém", "então", "enquanto",
    "quando", "como", "onde", "porque", "ele", "ela", "eles", "elas", "eu", "nós", "você",
    "vocês", "seu", "sua", "seus", "suas", "meu", "minha", "isso", "isto", "aquilo", "aquele",
    "aquela", "naquele", "naquela", "nesse", "nessa", "neste", "nesta", "esse", "essa", "este",
    "esta", "depois", "antes", "agora", "hoje", "ontem", "amanhã", "ali", "lá", "aqui", "mesmo",
    "foi", "era", "não", "sim", "se", "no", "na", "nos", "nas", "do", "da", "dos", "das", "de",
    "em", "com", "sem", "para", "pra", "ao", "aos", "até", "após", "cada", "todo", "toda",
    "todos", "todas", "tudo", "nada", "ninguém", "alguém", "algo", "muito", "já", "ainda",
    "também", "só", "apenas", "imagine", "deixe", "por", "que", "qual",
    // Honorifics and role nouns
    "sr", "sra", "srta", "dr", "dra", "dona", "dom", "senhor", "senhora", "gerente", "chefe",
    "supervisor", "supervisora", "idoso", "idosa", "cliente", "empresa", "café", "cafeteria",
    "restaurante", "loja", "padaria",
    // English
    "the", "an", "and", "but", "however", "then", "when", "while", "where", "why", "how",
    "what", "who", "she", "he", "they", "it", "her", "his", "him", "them", "their", "you",
    "your", "i", "we", "our", "in", "on", "at", "after", "before", "now", "today", "tonight",
    "yesterday", "that", "this", "these", "those", "there", "here", "if", "so", "yes", "not",
    "one", "every", "everyone", "nobody", "someone", "maybe", "later", "still", "just", "even",
    "also", "mr", "mrs", "ms", "sir", "madam", "manager", "boss", "customer", "restaurant",
    "store", "shop", "cafe",
];

/// Trailing tokens that mark a name as an organization.
pub const ORGANIZATION_SUFFIXES: &[&str] = &[
    "inc",
    "corp",
    "corporation",
    "ltd",
    "ltda",
    "cia",
    "company",
    "investments",
    "llc",
    "group",
];

struct NicheTable {
    label: &'static str,
    aliases: &'static [&'static str],
    keywords: &'static [&'static str],
}

const NICHE_TABLES: &[NicheTable] = &[
    NicheTable {
        label: "história",
        aliases: &["historia", "history"],
        keywords: &["quando", "onde", "por que", "contexto", "época"],
    },
    NicheTable {
        label: "documentário",
        aliases: &["documentario", "documentary"],
        keywords: &["pesquisa", "fonte", "evidência", "segundo", "documentado"],
    },
    NicheTable {
        label: "educação",
        aliases: &["educacao", "education"],
        keywords: &["aprender", "entender", "conceito", "funciona", "processo"],
    },
    NicheTable {
        label: "entretenimento",
        aliases: &["entertainment"],
        keywords: &["você", "imagine", "já pensou", "vamos"],
    },
    NicheTable {
        label: "mistério",
        aliases: &["misterio", "mystery"],
        keywords: &["teoria", "hipótese", "evidência", "possível", "talvez"],
    },
];

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Keyword coverage expected from scripts of one niche.
#[derive(Debug)]
pub struct NicheProfile {
    pub label: &'static str,
    aliases: &'static [&'static str],
    keywords: Vec<PhraseMatcher>,
}

impl NicheProfile {
    pub fn keywords(&self) -> &[PhraseMatcher] {
        &self.keywords
    }

    fn answers_to(&self, niche: &str) -> bool {
        self.label == niche || self.aliases.contains(&niche)
    }
}

#[derive(Debug)]
pub struct Catalog {
    ai_indicators: Vec<Box<dyn Matcher>>,
    cliches: Vec<Box<dyn Matcher>>,
    manipulation: Vec<Box<dyn Matcher>>,
    generic_ctas: Vec<Box<dyn Matcher>>,
    niches: Vec<NicheProfile>,
}

static BUILTIN: Lazy<Catalog> =
    Lazy::new(|| Catalog::from_tables().expect("built-in catalog patterns are valid"));

impl Catalog {
    /// The process-wide catalog compiled from the tables above.
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    fn from_tables() -> Result<Self, regex::Error> {
        Ok(Self {
            ai_indicators: patterns(AI_INDICATOR_PATTERNS)?,
            cliches: phrases(NARRATIVE_CLICHES)?,
            manipulation: phrases(EMOTIONAL_MANIPULATION)?,
            generic_ctas: phrases(GENERIC_CTAS)?,
            niches: NICHE_TABLES
                .iter()
                .map(|t| {
                    Ok(NicheProfile {
                        label: t.label,
                        aliases: t.aliases,
                        keywords: t
                            .keywords
                            .iter()
                            .map(|k| PhraseMatcher::new(*k))
                            .collect::<Result<_, _>>()?,
                    })
                })
                .collect::<Result<_, regex::Error>>()?,
        })
    }

    pub fn ai_indicators(&self) -> &[Box<dyn Matcher>] {
        &self.ai_indicators
    }

    pub fn cliches(&self) -> &[Box<dyn Matcher>] {
        &self.cliches
    }

    pub fn manipulation(&self) -> &[Box<dyn Matcher>] {
        &self.manipulation
    }

    pub fn generic_ctas(&self) -> &[Box<dyn Matcher>] {
        &self.generic_ctas
    }

    /// Look up a niche by label or alias, ignoring case and surrounding space.
    pub fn niche(&self, label: &str) -> Option<&NicheProfile> {
        let wanted = label.trim().to_lowercase();
        self.niches.iter().find(|n| n.answers_to(&wanted))
    }
}

fn patterns(sources: &[&'static str]) -> Result<Vec<Box<dyn Matcher>>, regex::Error> {
    sources
        .iter()
        .map(|s| PatternMatcher::new(*s).map(|m| Box::new(m) as Box<dyn Matcher>))
        .collect()
}

fn phrases(sources: &[&'static str]) -> Result<Vec<Box<dyn Matcher>>, regex::Error> {
    sources
        .iter()
        .map(|s| PhraseMatcher::new(*s).map(|m| Box::new(m) as Box<dyn Matcher>))
        .collect()
}

/// Build a single whole-word alternation over `words`, longest first so that
/// multi-word entries win over their prefixes. Entries ending in punctuation
/// (`sr.`) get no trailing word boundary.
pub(crate) fn word_alternation(words: &[&str]) -> Regex {
    let mut sorted: Vec<&str> = words.to_vec();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alt = sorted
        .iter()
        .map(|w| {
            let tail = if w.ends_with(char::is_alphanumeric) { r"\b" } else { "" };
            format!("{}{tail}", regex::escape(w))
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alt})")).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phrase_matcher_is_case_insensitive_with_accents() {
        let m = PhraseMatcher::new("lágrimas nos olhos").unwrap();
        let text = "Ela saiu com LÁGRIMAS NOS OLHOS.";
        let spans = m.find_spans(text);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].as_str(text), "LÁGRIMAS NOS OLHOS");
    }

    #[test]
    fn phrase_matcher_respects_word_boundaries() {
        let m = PhraseMatcher::new("karma").unwrap();
        assert!(!m.is_match("karmas e dramas"));
        assert!(m.is_match("Foi o karma."));
    }

    #[test]
    fn replacement_outputs_never_contain_keys() {
        for table in [CLICHE_REPLACEMENTS, COLLOQUIAL_REPLACEMENTS] {
            for (_, replacement) in table {
                for (key, _) in table {
                    assert!(
                        !replacement.to_lowercase().contains(key),
                        "'{replacement}' contains '{key}'"
                    );
                }
            }
        }
    }

    #[test]
    fn niche_lookup_accepts_aliases() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.niche(" Mystery ").map(|n| n.label), Some("mistério"));
        assert_eq!(catalog.niche("mistério").map(|n| n.label), Some("mistério"));
        assert!(catalog.niche("geral").is_none());
    }
}
