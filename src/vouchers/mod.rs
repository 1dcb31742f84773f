//! Entry (bon d'entrée) and exit (bon de sortie) vouchers.

pub mod entry;
pub mod exit;

pub use entry::{filter_entries, EntryVoucherForm};
pub use exit::{ExitFilter, ExitVoucherForm};

use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_STATUSES: [&str; 3] = ["En attente", "Approuvé", "Complété"];

const DEFAULT_ALIASES: [(&str, &str); 3] = [
    ("Pending", "En attente"),
    ("Approved", "Approuvé"),
    ("Completed", "Complété"),
];

/// English spellings found on older vouchers.
pub fn default_aliases() -> HashMap<String, String> {
    DEFAULT_ALIASES
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Known voucher statuses. `statut` stays an open string in storage; the catalog only
/// decides what the UI offers, what a new voucher starts with, and how legacy English
/// spellings compare against the French labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCatalog {
    labels: Vec<String>,
    #[serde(skip)]
    aliases: HashMap<String, String>,
    entry_default: String,
    exit_default: String,
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::new(
            DEFAULT_STATUSES.iter().map(|s| s.to_string()).collect(),
            default_aliases(),
            "Complété",
            "En attente",
        )
    }
}

impl StatusCatalog {
    pub fn new(
        labels: Vec<String>,
        aliases: HashMap<String, String>,
        entry_default: impl Into<String>,
        exit_default: impl Into<String>,
    ) -> Self {
        Self {
            labels,
            aliases: aliases
                .into_iter()
                .map(|(from, to)| (from.trim().to_lowercase(), to))
                .collect(),
            entry_default: entry_default.into(),
            exit_default: exit_default.into(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn entry_default(&self) -> &str {
        &self.entry_default
    }

    pub fn exit_default(&self) -> &str {
        &self.exit_default
    }

    /// The label `raw` stands for. Aliases match case-insensitively; anything unknown
    /// is returned trimmed but otherwise untouched.
    pub fn canonical<'a>(&'a self, raw: &'a str) -> &'a str {
        let raw = raw.trim();
        self.aliases
            .get(&raw.to_lowercase())
            .map(String::as_str)
            .unwrap_or(raw)
    }

    pub fn is_known(&self, raw: &str) -> bool {
        let canonical = self.canonical(raw);
        self.labels
            .iter()
            .any(|label| label.eq_ignore_ascii_case(canonical))
    }

    /// Whether a stored status satisfies a filter value. Both sides go through the
    /// alias table, so `Pending` matches a filter on `En attente` and vice versa.
    pub fn matches(&self, stored: &str, wanted: &str) -> bool {
        self.canonical(stored).to_lowercase() == self.canonical(wanted).to_lowercase()
    }
}

/// Parses `Pending=En attente,Approved=Approuvé`.
pub fn parse_aliases(raw: &str) -> Result<HashMap<String, String>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                Ok((from.trim().to_string(), to.trim().to_string()))
            }
            _ => Err(format!("alias invalide: {pair}")),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let catalog = StatusCatalog::default();
        assert_eq!(catalog.labels().len(), 3);
        assert_eq!(catalog.entry_default(), "Complété");
        assert_eq!(catalog.exit_default(), "En attente");
    }

    #[test]
    fn test_aliases_are_case_insensitive() {
        let catalog = StatusCatalog::default();
        assert_eq!(catalog.canonical("Pending"), "En attente");
        assert_eq!(catalog.canonical("approved"), "Approuvé");
        assert_eq!(catalog.canonical(" Refusé "), "Refusé");
        assert!(catalog.is_known("completed"));
        assert!(!catalog.is_known("Refusé"));
    }

    #[test]
    fn test_matches_through_aliases() {
        let catalog = StatusCatalog::default();
        assert!(catalog.matches("Pending", "En attente"));
        assert!(catalog.matches("En attente", "pending"));
        assert!(!catalog.matches("Approuvé", "pending"));
    }

    #[test]
    fn test_parse_aliases() {
        let aliases = parse_aliases("Pending=En attente, Done = Complété,").unwrap();
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases["Done"], "Complété");
        assert!(parse_aliases("Pending").is_err());
        assert!(parse_aliases("").unwrap().is_empty());
    }
}
