//! Line-of-business lookup
//!
//! The platform classifies contracts by product type and line of business
//! ("Sparte", GDV numbering). The brokerage keeps its own category idents, so
//! building a contract payload needs a lookup from one to the other. The table
//! itself is business data and is injected.

use std::collections::HashMap;

use serde::Deserialize;

/// Product classification on the platform
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LineOfBusiness {
    /// Product type ("Typ")
    #[serde(rename = "type")]
    pub product_type: String,
    /// Line of business ("Sparte")
    pub line: String,
}

impl LineOfBusiness {
    pub fn new(product_type: impl Into<String>, line: impl Into<String>) -> Self {
        Self {
            product_type: product_type.into(),
            line: line.into(),
        }
    }
}

/// Source of the category to line-of-business mapping
pub trait LineOfBusinessLookup: Send + Sync + 'static {
    fn lookup(&self, category_ident: &str) -> Option<LineOfBusiness>;
}

/// In-memory lookup table
#[derive(Debug, Clone, Default)]
pub struct StaticLineOfBusinessTable {
    entries: HashMap<String, LineOfBusiness>,
}

impl StaticLineOfBusinessTable {
    pub fn new(entries: HashMap<String, LineOfBusiness>) -> Self {
        Self { entries }
    }

    /// A table covering the common private lines
    pub fn standard() -> Self {
        let entries = [
            ("life", "LV", "010"),
            ("health", "KV", "020"),
            ("accident", "UNF", "030"),
            ("liability", "PHV", "040"),
            ("motor", "KFZ", "050"),
            ("legal_protection", "RS", "070"),
            ("household", "HR", "130"),
            ("residential_building", "WG", "140"),
        ]
        .into_iter()
        .map(|(ident, product_type, line)| (ident.to_string(), LineOfBusiness::new(product_type, line)))
        .collect();

        Self { entries }
    }

    /// Adds or replaces an entry
    pub fn with_entry(mut self, category_ident: impl Into<String>, line: LineOfBusiness) -> Self {
        self.entries.insert(category_ident.into(), line);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LineOfBusinessLookup for StaticLineOfBusinessTable {
    fn lookup(&self, category_ident: &str) -> Option<LineOfBusiness> {
        self.entries.get(category_ident).cloned()
    }
}
