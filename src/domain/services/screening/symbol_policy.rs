use crate::domain::errors::SkipReason;

/// Marker the screener leaves in place of a symbol for consolidated listings.
const CONSOLIDATED_MARKER: &str = "CONSOLIDATED";

/// Maps screener symbols to provider identifiers and excludes the ones that
/// are not tradable as-is.
#[derive(Debug, Clone)]
pub struct SymbolPolicy {
    /// Appended to the raw symbol, e.g. ".NS" for NSE listings on Yahoo
    pub suffix: String,
    /// Provider identifiers that are always skipped
    pub denylist: Vec<String>,
}

impl Default for SymbolPolicy {
    fn default() -> Self {
        SymbolPolicy {
            suffix: ".NS".to_string(),
            denylist: vec!["GVT&D.NS".to_string()],
        }
    }
}

impl SymbolPolicy {
    pub fn new(suffix: impl Into<String>, denylist: Vec<String>) -> Self {
        SymbolPolicy {
            suffix: suffix.into(),
            denylist,
        }
    }

    /// Provider identifier for a raw screener symbol.
    pub fn normalize(&self, raw: &str) -> String {
        format!("{}{}", raw.trim(), self.suffix)
    }

    /// Symbol as shown to users: the provider suffix removed.
    pub fn display_symbol<'a>(&self, identifier: &'a str) -> &'a str {
        if self.suffix.is_empty() {
            return identifier;
        }
        identifier.strip_suffix(self.suffix.as_str()).unwrap_or(identifier)
    }

    /// Checks a normalized identifier against the static exclusion rules.
    pub fn check(&self, identifier: &str) -> Result<(), SkipReason> {
        let rule = if identifier.contains(CONSOLIDATED_MARKER) {
            Some("consolidated marker".to_string())
        } else if identifier.contains('&') {
            Some("ampersand".to_string())
        } else if self.denylist.iter().any(|d| d == identifier) {
            Some(format!("denylisted {}", identifier))
        } else {
            None
        };

        match rule {
            Some(rule) => Err(SkipReason::Excluded { rule }),
            None => Ok(()),
        }
    }
}
