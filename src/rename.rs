//! Per-source mapping from column names to canonical output field names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RenameMap {
    names: BTreeMap<String, String>,
}

impl RenameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            names: pairs
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// The canonical name for `name`; unmapped names pass through.
    pub fn apply<'a>(&'a self, name: &'a str) -> &'a str {
        self.names.get(name).map_or(name, String::as_str)
    }

    /// Canonical names that more than one entry of this map renames to, with the
    /// columns involved. When both columns are present the one sorting last wins.
    ///
    /// Only entries of the map are compared; see [RenameMap::pass_through_collisions]
    /// for unmapped names landing on a mapped target.
    pub fn collisions(&self) -> BTreeMap<String, Vec<String>> {
        let mut sources: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (from, to) in &self.names {
            sources.entry(to.clone()).or_default().push(from.clone());
        }
        sources.retain(|_, from| from.len() > 1);
        sources
    }

    /// Output names shared by an unmapped field in `names` and some other field once
    /// the map is applied, e.g. a `Country` column next to `"Reference area" = "Country"`.
    pub fn pass_through_collisions<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
    ) -> BTreeMap<String, Vec<String>> {
        let mut sources: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for name in names {
            sources.entry(self.apply(name)).or_default().push(name);
        }
        sources
            .into_iter()
            .filter(|(_, from)| from.len() > 1 && from.iter().any(|n| !self.names.contains_key(*n)))
            .map(|(to, from)| (to.to_string(), from.iter().map(|n| n.to_string()).collect()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
