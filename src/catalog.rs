use std::path::Path;
use tracing::debug;

use crate::error::Error;
use crate::model::{CatalogEntry, Diet, IucnStatus, Region};

const BUNDLED: &str = include_str!("../data/catalog.json");

/// Attribute filters for [`Catalog::filter`]; `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    /// Case-insensitive substring of the animal's name.
    pub name: Option<String>,
    pub diet: Option<Diet>,
    pub status: Option<IucnStatus>,
    pub region: Option<Region>,
}

impl CatalogFilter {
    fn matches(&self, entry: &CatalogEntry) -> bool {
        let name = self
            .name
            .as_deref()
            .is_none_or(|needle| contains_ignore_case(&entry.name, needle));
        name && self.diet.is_none_or(|d| d == entry.diet)
            && self.status.is_none_or(|s| s == entry.iucn_status)
            && self.region.is_none_or(|r| r == entry.region)
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.trim().to_lowercase())
}

/// Ordered collection of encyclopedia entries keyed by slug.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// The catalog shipped with the crate.
    pub fn bundled() -> Result<Self, Error> {
        Self::from_json(BUNDLED)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let entries: Vec<CatalogEntry> =
            serde_json::from_str(json).map_err(|e| Error::Catalog(e.to_string()))?;
        Ok(Self::new(entries))
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| Error::Catalog(format!("{}: {e}", path.display())))?;
        let catalog = Self::from_json(&json)?;
        debug!(path = %path.display(), entries = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, slug: &str) -> Option<&CatalogEntry> {
        self.entries
            .iter()
            .find(|e| e.id.eq_ignore_ascii_case(slug))
    }

    /// Entries whose name contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<&CatalogEntry> {
        self.entries
            .iter()
            .filter(|e| contains_ignore_case(&e.name, term))
            .collect()
    }

    pub fn filter(&self, filter: &CatalogFilter) -> Vec<&CatalogEntry> {
        self.entries.iter().filter(|e| filter.matches(e)).collect()
    }

    /// Related species of `entry` that are present in the catalog.
    pub fn related(&self, entry: &CatalogEntry) -> Vec<&CatalogEntry> {
        entry
            .related
            .iter()
            .flatten()
            .filter_map(|slug| self.get(slug))
            .collect()
    }

    /// Append `entry` unless its slug is already present.
    ///
    /// Returns whether the entry was added.
    pub fn insert(&mut self, entry: CatalogEntry) -> bool {
        if self.get(&entry.id).is_some() {
            return false;
        }
        self.entries.push(entry);
        true
    }
}
