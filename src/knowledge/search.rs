use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::model::NodeRecord;

/// Lowercases and strips diacritics so "Pamięć" and "pamiec" compare equal.
///
/// Letters whose stroke is not a combining mark in Unicode (ł, ø, đ) are
/// mapped by hand.
pub fn fold(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for ch in text.nfd() {
        if is_combining_mark(ch) {
            continue;
        }

        match ch {
            'ł' | 'Ł' => folded.push('l'),
            'ø' | 'Ø' => folded.push('o'),
            'đ' | 'Đ' => folded.push('d'),
            _ => folded.extend(ch.to_lowercase()),
        }
    }
    folded
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchQuery {
    folded: String,
}

impl SearchQuery {
    pub fn new(term: &str) -> Self {
        Self {
            folded: fold(term.trim()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.folded
    }

    pub fn matches_text(&self, text: &str) -> bool {
        self.is_empty() || fold(text).contains(&self.folded)
    }

    /// Matches against both names, the description and every tag.
    pub fn matches_node(&self, node: &NodeRecord) -> bool {
        if self.is_empty() {
            return true;
        }

        self.matches_text(&node.name)
            || self.matches_text(&node.localized_name)
            || self.matches_text(&node.description)
            || node.tags.iter().any(|tag| self.matches_text(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_polish_diacritics() {
        assert_eq!(fold("Pamięć"), "pamiec");
        assert_eq!(fold("ŁOŚ"), "los");
        assert_eq!(fold("Żółć"), "zolc");
    }

    #[test]
    fn empty_query_matches_everything() {
        let query = SearchQuery::new("   ");
        assert!(query.is_empty());
        assert!(query.matches_text("anything"));
    }

    #[test]
    fn query_is_folded_before_comparison() {
        let query = SearchQuery::new("PAMIĘĆ");
        assert!(query.matches_text("Poprawa pamięci roboczej"));
        assert!(!query.matches_text("Koncentracja"));
    }
}
