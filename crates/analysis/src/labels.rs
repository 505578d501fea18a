// Best-effort line-item lookup.
//
// Spreadsheets do not carry standardized headers, so required rows are found
// by case-insensitive substring match against a list of aliases. When several
// rows match, the first one in spreadsheet order wins.

use serde::Serialize;

/// Aliases for the line items the engine needs to locate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LabelSet {
    pub total_assets: Vec<String>,
    pub current_assets: Vec<String>,
    pub current_liabilities: Vec<String>,
}

impl Default for LabelSet {
    fn default() -> Self {
        Self {
            total_assets: vec!["TOTAL ASSETS".into(), "TỔNG CỘNG TÀI SẢN".into()],
            current_assets: vec!["CURRENT ASSETS".into(), "TÀI SẢN NGẮN HẠN".into()],
            current_liabilities: vec!["CURRENT LIABILITIES".into(), "NỢ NGẮN HẠN".into()],
        }
    }
}

impl LabelSet {
    /// Aliases as shown to the user (first alias is the canonical name).
    pub fn canonical(aliases: &[String]) -> &str {
        aliases.first().map(String::as_str).unwrap_or("")
    }
}

/// True when `label` contains any alias, ignoring case.
pub fn label_matches(label: &str, aliases: &[String]) -> bool {
    let haystack = label.to_lowercase();
    aliases
        .iter()
        .filter(|a| !a.trim().is_empty())
        .any(|a| haystack.contains(&a.to_lowercase()))
}

/// Index of the first label matching any alias.
pub fn find_first<'a, I>(labels: I, aliases: &[String]) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    labels.into_iter().position(|label| label_matches(label, aliases))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aliases(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_case_insensitive_substring() {
        let a = aliases(&["TOTAL ASSETS"]);
        assert!(label_matches("Total assets", &a));
        assert!(label_matches("  TOTAL ASSETS (A+B)", &a));
        assert!(!label_matches("Total liabilities", &a));
    }

    #[test]
    fn test_unicode_case_folding() {
        let a = aliases(&["TỔNG CỘNG TÀI SẢN"]);
        assert!(label_matches("Tổng cộng tài sản", &a));
    }

    #[test]
    fn test_first_match_wins() {
        let a = aliases(&["CURRENT ASSETS"]);
        let labels = ["Cash", "Current assets", "Other current assets"];
        assert_eq!(find_first(labels.iter().copied(), &a), Some(1));
    }

    #[test]
    fn test_blank_alias_never_matches() {
        let a = aliases(&["", "  "]);
        assert!(!label_matches("anything", &a));
    }

    #[test]
    fn test_default_label_set_has_both_languages() {
        let labels = LabelSet::default();
        assert_eq!(LabelSet::canonical(&labels.total_assets), "TOTAL ASSETS");
        assert!(label_matches("NỢ NGẮN HẠN", &labels.current_liabilities));
    }
}
