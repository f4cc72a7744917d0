//! Keyword normalization for raw submissions.
//!
//! A submission is a comma-separated list of free-text keywords. The
//! normalizer lower-cases, trims, drops empties, and deduplicates while
//! preserving first-occurrence order. It is a pure function with no side
//! effects; persistence is the caller's job.

use std::collections::HashSet;

use keywordforge_shared::{KeywordForgeError, Result};
use tracing::debug;

/// Split a raw submission into cleaned keywords.
///
/// Returns [`KeywordForgeError::EmptyInput`] when no usable keyword
/// survives cleaning; the caller must skip persistence and surface a
/// notice.
pub fn normalize(raw_text: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut cleaned = Vec::new();

    for token in raw_text.split(',') {
        let keyword = token.trim().to_lowercase();
        if keyword.is_empty() {
            continue;
        }
        if seen.insert(keyword.clone()) {
            cleaned.push(keyword);
        }
    }

    if cleaned.is_empty() {
        return Err(KeywordForgeError::empty_input(
            "submission contained no keywords after cleaning",
        ));
    }

    debug!(
        raw_tokens = raw_text.split(',').count(),
        cleaned = cleaned.len(),
        "normalized keyword submission"
    );

    Ok(cleaned)
}

/// Split a raw submission into its trimmed raw tokens, empties dropped.
///
/// Used to record what the user actually typed alongside the cleaned set.
pub fn raw_tokens(raw_text: &str) -> Vec<String> {
    raw_text
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_trims_and_dedupes() {
        let result = normalize("SEO, seo , Marketing").expect("normalize");
        assert_eq!(result, vec!["seo", "marketing"]);
    }

    #[test]
    fn preserves_first_occurrence_order() {
        let result = normalize("ppc, email, PPC, crm, Email").expect("normalize");
        assert_eq!(result, vec!["ppc", "email", "crm"]);
    }

    #[test]
    fn keeps_internal_whitespace() {
        let result = normalize("content marketing,  link building ").expect("normalize");
        assert_eq!(result, vec!["content marketing", "link building"]);
    }

    #[test]
    fn empty_input_is_rejected() {
        for raw in ["", ",, ,", "   ", ",,,"] {
            let err = normalize(raw).expect_err("should reject");
            assert!(matches!(err, KeywordForgeError::EmptyInput { .. }), "input: {raw:?}");
        }
    }

    #[test]
    fn raw_tokens_keep_case_and_order() {
        assert_eq!(
            raw_tokens("SEO, seo , ,Marketing"),
            vec!["SEO", "seo", "Marketing"]
        );
    }
}
