//! Loads delimited statistical tables into maps keyed by (location, period).
//!
//! Every row becomes a [Record] of raw strings, with empty cells stored as `None`. Rows
//! sharing a key are either merged into one record or, when a category column is
//! configured and present in the file, kept apart under their category name. Which of the
//! two shapes a table takes is decided once, from the header row, and carried by
//! [TableEntry].

use crate::error::MergeError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, error, info, warn};

/// One row: column name to raw value, `None` where the cell was empty.
pub type Record = BTreeMap<String, Option<String>>;

/// Look up a non-null value in a record.
pub fn record_value<'a>(record: &'a Record, column: &str) -> Option<&'a str> {
    record.get(column)?.as_deref()
}

/// Names of the two columns forming a row's key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFields {
    pub location: String,
    pub period: String,
}

impl KeyFields {
    pub fn new(location: &str, period: &str) -> Self {
        Self {
            location: location.to_string(),
            period: period.to_string(),
        }
    }
}

/// The (location, period) pair identifying one observation, values taken verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    pub location: String,
    pub period: String,
}

impl CompositeKey {
    pub fn new(location: &str, period: &str) -> Self {
        Self {
            location: location.to_string(),
            period: period.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TableEntry {
    /// All rows for the key merged into one record, later rows overwriting.
    Simple(Record),
    /// One record per category value, last row per category wins.
    Categorized(BTreeMap<String, Record>),
}

impl TableEntry {
    /// The primary observation of this entry.
    ///
    /// For a categorized entry the record is picked by `primary_category`, or, with no
    /// category given, only when the entry holds exactly one category.
    pub fn observation(&self, column: &str, primary_category: Option<&str>) -> Option<&str> {
        match self {
            TableEntry::Simple(record) => record_value(record, column),
            TableEntry::Categorized(categories) => {
                let record = match primary_category {
                    Some(category) => categories.get(category)?,
                    None if categories.len() == 1 => categories.values().next()?,
                    None => return None,
                };
                record_value(record, column)
            }
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct LoadedTable {
    entries: HashMap<CompositeKey, TableEntry>,
    rows_read: usize,
}

impl LoadedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row. With a category the row is stored under it, otherwise it is
    /// shallow-merged into whatever record the key already has.
    pub fn insert_row(&mut self, key: CompositeKey, category: Option<String>, record: Record) {
        self.rows_read += 1;
        match category {
            Some(category) => {
                let slot = self
                    .entries
                    .entry(key)
                    .or_insert_with(|| TableEntry::Categorized(BTreeMap::new()));
                match slot {
                    TableEntry::Categorized(categories) => {
                        categories.insert(category, record);
                    }
                    TableEntry::Simple(_) => {
                        *slot = TableEntry::Categorized(BTreeMap::from([(category, record)]));
                    }
                }
            }
            None => {
                let slot = self
                    .entries
                    .entry(key)
                    .or_insert_with(|| TableEntry::Simple(Record::new()));
                match slot {
                    TableEntry::Simple(existing) => existing.extend(record),
                    TableEntry::Categorized(_) => *slot = TableEntry::Simple(record),
                }
            }
        }
    }

    pub fn get(&self, key: &CompositeKey) -> Option<&TableEntry> {
        self.entries.get(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &CompositeKey> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CompositeKey, &TableEntry)> {
        self.entries.iter()
    }

    /// Names the merge sees for this table: columns of simple records and category
    /// names of categorized ones.
    pub fn field_names(&self) -> BTreeSet<&str> {
        let mut names = BTreeSet::new();
        for entry in self.entries.values() {
            match entry {
                TableEntry::Simple(record) => names.extend(record.keys().map(String::as_str)),
                TableEntry::Categorized(categories) => {
                    names.extend(categories.keys().map(String::as_str))
                }
            }
        }
        names
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of data rows consumed, including rows merged into an existing key.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }
}

/// Load a table, logging instead of failing.
///
/// A missing file gives an empty table. A read or parse error part way through the file
/// gives the rows read up to that point.
pub fn load_table(path: &Path, key_fields: &KeyFields, category_field: Option<&str>) -> LoadedTable {
    let mut table = LoadedTable::new();
    if !path.exists() {
        error!(path = %path.display(), "File not found");
        return table;
    }

    if let Err(e) = read_into(path, key_fields, category_field, &mut table) {
        error!(
            path = %path.display(),
            rows_kept = table.rows_read(),
            "Error reading CSV file: {e}"
        );
    }
    info!(
        path = %path.display(),
        rows = table.rows_read(),
        keys = table.len(),
        "Loaded table"
    );
    table
}

/// Load a table, returning the first error encountered.
pub fn read_table(
    path: &Path,
    key_fields: &KeyFields,
    category_field: Option<&str>,
) -> Result<LoadedTable, MergeError> {
    if !path.exists() {
        return Err(MergeError::FileNotFound(path.to_path_buf()));
    }
    let mut table = LoadedTable::new();
    read_into(path, key_fields, category_field, &mut table)?;
    Ok(table)
}

fn read_into(
    path: &Path,
    key_fields: &KeyFields,
    category_field: Option<&str>,
    table: &mut LoadedTable,
) -> Result<(), MergeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, name)| match index {
            0 => name.strip_prefix('\u{feff}').unwrap_or(name).to_string(),
            _ => name.to_string(),
        })
        .collect::<Vec<String>>();

    let column_index = |column: &str| {
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| MergeError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            })
    };
    let location_index = column_index(&key_fields.location)?;
    let period_index = column_index(&key_fields.period)?;
    let category_index = category_field.and_then(|c| headers.iter().position(|h| h == c));

    if let (Some(c), None) = (category_field, category_index) {
        debug!(path = %path.display(), category = c, "No category column, loading rows unpartitioned");
    }

    for result in reader.records() {
        let row = result?;
        // Short rows read as null in their missing trailing cells, extra cells are ignored.
        let (Some(location), Some(period)) = (row.get(location_index), row.get(period_index))
        else {
            warn!(
                path = %path.display(),
                line = row.position().map_or(0, |p| p.line()),
                "Row has no key cells, skipped"
            );
            continue;
        };

        let key = CompositeKey::new(location, period);
        let category = category_index.map(|index| row.get(index).unwrap_or_default().to_string());
        let record = headers
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let value = row
                    .get(index)
                    .filter(|value| !value.is_empty())
                    .map(str::to_string);
                (name.clone(), value)
            })
            .collect::<Record>();

        table.insert_row(key, category, record);
    }
    Ok(())
}
