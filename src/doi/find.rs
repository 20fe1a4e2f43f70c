//! DOI pattern search.
//!
//! Patterns run from most to least specific: an explicit `doi:` label, a
//! resolver URL, then a bare `10.NNNN/...` token. Every candidate is trimmed
//! of trailing sentence punctuation and must pass [`validate_doi`].

use once_cell::sync::Lazy;
use regex::Regex;

static DOI_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)(?:doi:|DOI:)\s*(\S+)",
        r"(?i)(?:https?://)?(?:dx\.)?doi\.org/(\S+)",
        r"(?i)(?:https?://)?doi\.org/(\S+)",
        r"(?i)\b(10\.\d{4,}/\S+)",
        r"(?i)doi\s*:\s*(\S+)",
        r"(?i)DOI\s*:\s*(\S+)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static RE_VALID_DOI: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^10\.\d{4,}/[-._;()/<>a-zA-Z0-9]+$").unwrap());

/// First valid DOI in `text`, if any.
pub fn find_doi(text: &str) -> Option<String> {
    DOI_PATTERNS.iter().find_map(|re| {
        re.captures_iter(text)
            .filter_map(|caps| caps.get(1))
            .map(|m| clean_candidate(m.as_str()))
            .find(|doi| validate_doi(doi))
            .map(str::to_string)
    })
}

fn clean_candidate(raw: &str) -> &str {
    raw.trim().trim_end_matches(['.', ',', ';'])
}

/// `10.` + registrant of at least four digits + `/` + a conservative suffix.
pub fn validate_doi(doi: &str) -> bool {
    !doi.is_empty() && RE_VALID_DOI.is_match(doi)
}
