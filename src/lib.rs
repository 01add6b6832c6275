//! # statmerge: joining country-year statistical tables into JSON
//!
//! statmerge takes pairs of tabular datasets keyed by country and year, like the OECD
//! health expenditure and perceived health status tables, and produces JSON documents
//! grouped either by year or by country.
//!
//! ## Merging two tables
//!
//! Tables are read with [load_table](table::load_table) into a
//! [LoadedTable](table::LoadedTable). Rows sharing a (country, year) key are either merged
//! into one record or, when a category column such as "Health status" is given, kept
//! apart per category. [merge_tables](merge::merge_tables) joins two tables, renames their
//! columns with a [RenameMap](rename::RenameMap) per side, keeps the fields named by a
//! [FieldSelection](merge::FieldSelection) and nests the result by a
//! [GroupBy](merge::GroupBy).
//!
//! ```
//! use statmerge::merge::{merge_tables, GroupBy};
//! use statmerge::table::{CompositeKey, LoadedTable, Record};
//! use statmerge::defaults::health_job;
//!
//! let job = health_job();
//! let row = |pairs: &[(&str, &str)]| -> Record {
//!     pairs.iter().map(|(k, v)| (k.to_string(), Some(v.to_string()))).collect()
//! };
//!
//! let mut expenditure = LoadedTable::new();
//! expenditure.insert_row(
//!     CompositeKey::new("FRA", "2020"),
//!     None,
//!     row(&[("Reference area", "FRA"), ("TIME_PERIOD", "2020"), ("OBS_VALUE", "11.2")]),
//! );
//! let mut status = LoadedTable::new();
//! status.insert_row(
//!     CompositeKey::new("FRA", "2020"),
//!     Some("Good/very good health".to_string()),
//!     row(&[("Health status", "Good/very good health"), ("OBS_VALUE", "65")]),
//! );
//!
//! let document = merge_tables(
//!     &expenditure,
//!     &status,
//!     &job.left.rename,
//!     &job.right.rename,
//!     &job.fields,
//!     GroupBy::Year,
//! );
//! let record = document.get("2020", "FRA").unwrap();
//! assert_eq!(record.get("GDP"), Some("11.2"));
//! assert_eq!(record.get("Good/very good health"), Some("65"));
//! ```
//!
//! ## Running jobs
//!
//! The [pipeline] module runs whole jobs from a [JobRegistry](config::JobRegistry): the
//! built-in health and employment jobs from [defaults], optionally replaced or extended
//! from a TOML or JSON file. The `statmerge` binary is a thin wrapper around it.

pub mod config;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod rename;
pub mod table;
pub mod writer;
