use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Domain key used when a post carries none.
pub const DEFAULT_SYSTEM: &str = "common";

const FALLBACK_NAME: &str = "General";

/// Insurance product lines known to the site, keyed by domain key.
/// Every slug equals its key.
const PRODUCT_LINES: &[(&str, &str)] = &[
    ("rca", "RCA"),
    ("casco", "Casco"),
    ("travel", "Calatorie"),
    ("home", "Locuinta"),
    ("common", "General"),
    ("health", "Sanatate"),
    ("life", "Viata"),
    ("accidents", "Accidente Persoane"),
    ("breakdown", "Asistenta Rutiera"),
    ("cmr", "CMR"),
    ("malpraxis", "Malpraxis"),
    ("rcp", "Malpraxis"),
];

/// Category sub-object embedded in every mirror document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub slug: String,
}

impl Category {
    pub fn new(name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
        }
    }

    /// The category every unknown or missing domain key resolves to.
    pub fn fallback() -> Self {
        Self::new(FALLBACK_NAME, DEFAULT_SYSTEM)
    }
}

/// Lookup from domain key to display name.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    names: HashMap<String, String>,
}

impl CategoryTable {
    /// An empty table; everything resolves to [`Category::fallback`].
    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, name: impl Into<String>) {
        self.names.insert(key.into(), name.into());
    }

    pub fn resolve(&self, key: &str) -> Category {
        self.names
            .get(key)
            .map(|name| Category::new(name.clone(), key))
            .unwrap_or_else(Category::fallback)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let mut table = Self::empty();
        for (key, name) in PRODUCT_LINES {
            table.insert(*key, *name);
        }
        table
    }
}
