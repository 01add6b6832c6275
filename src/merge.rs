//! Joining two loaded tables on their composite keys and regrouping the result.
//!
//! [merge_tables] is an outer join: every key present in either table is renamed, merged,
//! cut down to a [FieldSelection] and kept only if one of the selection's value fields
//! survived. [combine_by_presence] is the narrower inner join, pairing the primary
//! observations of both sides when both exist.
//!
//! Output goes into an [OutputDocument], nested by year then country or by country then
//! year depending on [GroupBy]. Both levels are sorted maps, so the document is the same
//! whatever order the keys were visited in.

use crate::rename::RenameMap;
use crate::table::{record_value, CompositeKey, LoadedTable, Record, TableEntry};

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Year,
    Country,
}

impl GroupBy {
    /// Split a key into (outer, inner) document keys.
    pub fn split<'a>(&self, key: &'a CompositeKey) -> (&'a str, &'a str) {
        match self {
            GroupBy::Year => (key.period.as_str(), key.location.as_str()),
            GroupBy::Country => (key.location.as_str(), key.period.as_str()),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::Year => "year",
            GroupBy::Country => "country",
        }
    }
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output fields in the order they were selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergedRecord {
    fields: Vec<(String, String)>,
}

impl MergedRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its position if it is already present.
    pub fn push(&mut self, name: &str, value: &str) {
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => self.fields.push((name.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Serialized as a JSON object whose keys keep the selection order.
impl Serialize for MergedRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MergedRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct RecordVisitor;

        impl<'de> Visitor<'de> for RecordVisitor {
            type Value = MergedRecord;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field names to string values")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut record = MergedRecord::new();
                while let Some((name, value)) = access.next_entry::<String, String>()? {
                    record.push(&name, &value);
                }
                Ok(record)
            }
        }

        deserializer.deserialize_map(RecordVisitor)
    }
}

/// Outer group key to inner key to record.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputDocument {
    groups: BTreeMap<String, BTreeMap<String, MergedRecord>>,
}

impl OutputDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &CompositeKey, group_by: GroupBy, record: MergedRecord) {
        let (outer, inner) = group_by.split(key);
        self.groups
            .entry(outer.to_string())
            .or_default()
            .insert(inner.to_string(), record);
    }

    pub fn get(&self, outer: &str, inner: &str) -> Option<&MergedRecord> {
        self.groups.get(outer)?.get(inner)
    }

    pub fn groups(&self) -> &BTreeMap<String, BTreeMap<String, MergedRecord>> {
        &self.groups
    }

    /// Number of outer groups.
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.groups.values().map(BTreeMap::len).sum()
    }

    /// The same records nested the other way round.
    pub fn transposed(&self) -> Self {
        let mut groups: BTreeMap<String, BTreeMap<String, MergedRecord>> = BTreeMap::new();
        for (outer, inner_records) in &self.groups {
            for (inner, record) in inner_records {
                groups
                    .entry(inner.clone())
                    .or_default()
                    .insert(outer.clone(), record.clone());
            }
        }
        Self { groups }
    }

    /// The first inner key of every group, for logging a sample of the output.
    pub fn snippet(&self) -> BTreeMap<&str, Vec<&str>> {
        self.groups
            .iter()
            .map(|(outer, inner)| {
                let first = inner.keys().take(1).map(String::as_str).collect::<Vec<&str>>();
                (outer.as_str(), first)
            })
            .collect()
    }
}

/// Which merged fields make it into the output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSelection {
    /// Fields copied as-is from simple records, e.g. Country, Year, GDP.
    pub scalar_fields: Vec<String>,
    /// Category names whose sub-record contributes its `category_value_column`.
    #[serde(default)]
    pub category_fields: Vec<String>,
    /// A record is kept only if one of these is present. Empty keeps any
    /// non-empty record.
    #[serde(default)]
    pub value_fields: Vec<String>,
    /// Removed from the merged record before selection.
    #[serde(default)]
    pub drop_fields: Vec<String>,
    #[serde(default = "default_value_column")]
    pub category_value_column: String,
}

pub(crate) fn default_value_column() -> String {
    "OBS_VALUE".to_string()
}

impl FieldSelection {
    fn select(&self, mut merged: HashMap<&str, MergedValue<'_>>) -> Option<MergedRecord> {
        for name in &self.drop_fields {
            merged.remove(name.as_str());
        }

        let mut record = MergedRecord::new();
        for name in &self.scalar_fields {
            if let Some(MergedValue::Scalar(Some(value))) = merged.get(name.as_str()) {
                record.push(name, value);
            }
        }
        for name in &self.category_fields {
            if let Some(MergedValue::Category(sub_record)) = merged.get(name.as_str()) {
                if let Some(value) = record_value(sub_record, &self.category_value_column) {
                    record.push(name, value);
                }
            }
        }

        let keep = if self.value_fields.is_empty() {
            !record.is_empty()
        } else {
            self.value_fields.iter().any(|f| record.contains(f))
        };
        keep.then_some(record)
    }
}

/// A field of the merged record before selection.
#[derive(Debug, PartialEq)]
enum MergedValue<'a> {
    Scalar(Option<&'a str>),
    Category(&'a Record),
}

/// Rename one side's entry into `merged`, overwriting fields already there.
fn merge_renamed<'a>(
    merged: &mut HashMap<&'a str, MergedValue<'a>>,
    entry: Option<&'a TableEntry>,
    rename: &'a RenameMap,
) {
    let fields: Vec<(&'a str, MergedValue<'a>)> = match entry {
        None => return,
        Some(TableEntry::Simple(record)) => record
            .iter()
            .map(|(column, value)| (rename.apply(column), MergedValue::Scalar(value.as_deref())))
            .collect(),
        Some(TableEntry::Categorized(categories)) => categories
            .iter()
            .map(|(category, sub_record)| (rename.apply(category), MergedValue::Category(sub_record)))
            .collect(),
    };

    for (name, value) in fields {
        if let Some(previous) = merged.insert(name, value) {
            if let (MergedValue::Scalar(Some(old)), Some(MergedValue::Scalar(Some(new)))) =
                (&previous, merged.get(name))
            {
                if old != new {
                    debug!(field = name, old, new, "Field overwritten by second source");
                }
            }
        }
    }
}

/// Outer-join two tables on their composite keys.
///
/// Each side's fields are renamed with its own map, the right side winning where both
/// produce the same name, and the result is cut down to `fields`.
pub fn merge_tables(
    left: &LoadedTable,
    right: &LoadedTable,
    left_rename: &RenameMap,
    right_rename: &RenameMap,
    fields: &FieldSelection,
    group_by: GroupBy,
) -> OutputDocument {
    let keys: HashSet<&CompositeKey> = left.keys().chain(right.keys()).collect();

    let mut document = OutputDocument::new();
    for key in &keys {
        let mut merged = HashMap::new();
        merge_renamed(&mut merged, left.get(key), left_rename);
        merge_renamed(&mut merged, right.get(key), right_rename);

        if let Some(record) = fields.select(merged) {
            document.insert(key, group_by, record);
        }
    }

    info!(
        keys = keys.len(),
        records = document.record_count(),
        %group_by,
        "Merged tables"
    );
    document
}

/// Field names and lookups for [combine_by_presence].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PresenceFields {
    pub left_label: String,
    pub right_label: String,
    #[serde(default = "default_value_column")]
    pub value_column: String,
    /// Category holding the primary observation when the left table is categorized.
    #[serde(default)]
    pub left_category: Option<String>,
    #[serde(default)]
    pub right_category: Option<String>,
}

/// Inner-join two tables, emitting `{left_label, right_label}` for every key where both
/// sides have a primary observation.
pub fn combine_by_presence(
    left: &LoadedTable,
    right: &LoadedTable,
    fields: &PresenceFields,
    group_by: GroupBy,
) -> OutputDocument {
    let mut document = OutputDocument::new();
    let mut shared_keys = 0;
    for (key, left_entry) in left.iter() {
        let Some(right_entry) = right.get(key) else {
            continue;
        };
        shared_keys += 1;

        let left_value = left_entry.observation(&fields.value_column, fields.left_category.as_deref());
        let right_value =
            right_entry.observation(&fields.value_column, fields.right_category.as_deref());
        if let (Some(left_value), Some(right_value)) = (left_value, right_value) {
            let mut record = MergedRecord::new();
            record.push(&fields.left_label, left_value);
            record.push(&fields.right_label, right_value);
            document.insert(key, group_by, record);
        }
    }

    info!(
        shared_keys,
        records = document.record_count(),
        %group_by,
        "Combined tables"
    );
    document
}
