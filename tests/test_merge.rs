//! Merge and combine integration tests over the OECD-shaped fixtures in tests/data/oecd.
use statmerge::defaults::{employment_job, health_job};
use statmerge::merge::{combine_by_presence, merge_tables, GroupBy, OutputDocument};
use statmerge::table::{load_table, CompositeKey, LoadedTable, TableEntry};
use statmerge::writer::to_json_string;

use std::path::Path;

const DATA_DIR: &str = "tests/data/oecd";

fn load_health_tables() -> (LoadedTable, LoadedTable) {
    let job = health_job();
    let data_dir = Path::new(DATA_DIR);
    (job.left.load(data_dir), job.right.load(data_dir))
}

fn merge_health(group_by: GroupBy) -> OutputDocument {
    let job = health_job();
    let (expenditure, status) = load_health_tables();
    merge_tables(
        &expenditure,
        &status,
        &job.left.rename,
        &job.right.rename,
        &job.fields,
        group_by,
    )
}

/// Every key in the status table comes from its "Reference area" and "TIME_PERIOD"
/// columns, and rows are split by health status.
#[test]
fn test_load_status_table() {
    let (expenditure, status) = load_health_tables();

    assert_eq!(expenditure.len(), 6);
    assert_eq!(status.rows_read(), 7);
    assert_eq!(status.len(), 4);

    let Some(TableEntry::Categorized(categories)) =
        status.get(&CompositeKey::new("France", "2020"))
    else {
        panic!("France 2020 should be split by health status");
    };
    assert_eq!(categories.len(), 3);
    assert!(categories.contains_key("Fair (not good, not bad) health"));
}

#[test]
fn test_merge_health_by_year() {
    let document = merge_health(GroupBy::Year);

    let years = document.groups().keys().cloned().collect::<Vec<_>>();
    assert_eq!(years, vec!["2019", "2020"]);
    assert_eq!(document.record_count(), 4);

    let expected = serde_json::json!({
        "Country": "France",
        "Year": "2020",
        "GDP": "12.1",
        "Fair (not good, not bad) health": "23.5",
        "Good/very good health": "67.3",
        "Bad/very bad health": "9.2"
    });
    let france = document.get("2020", "France").unwrap();
    assert_eq!(serde_json::to_value(france).unwrap(), expected);
    assert_eq!(
        france.names().collect::<Vec<_>>(),
        vec![
            "Country",
            "Year",
            "GDP",
            "Fair (not good, not bad) health",
            "Good/very good health",
            "Bad/very bad health"
        ]
    );

    // Germany's bad health value is empty, so it is left out.
    let germany = document.get("2020", "Germany").unwrap();
    assert_eq!(germany.get("Bad/very bad health"), None);
    assert_eq!(germany.get("Good/very good health"), Some("64.9"));

    // Only in the status table: no Country, Year or GDP.
    let turkiye_2019 = document.get("2019", "Türkiye").unwrap();
    assert_eq!(turkiye_2019.len(), 1);

    // Expenditure without any health status is dropped.
    assert!(document.get("2021", "Italy").is_none());
    assert!(document.get("2021", "France").is_none());
}

#[test]
fn test_grouping_by_country_transposes_grouping_by_year() {
    let by_year = merge_health(GroupBy::Year);
    let by_country = merge_health(GroupBy::Country);

    assert_eq!(by_country.transposed(), by_year);
    assert_eq!(by_country.len(), 3);
    assert_eq!(
        by_country.get("Türkiye", "2020"),
        by_year.get("2020", "Türkiye")
    );
}

#[test]
fn test_written_json_round_trips() {
    let document = merge_health(GroupBy::Country);
    let json = to_json_string(&document).expect("document should serialize");

    assert!(json.contains("\"Türkiye\""), "non-ASCII names are written as-is");
    assert!(json.starts_with("{\n    \""));

    let parsed: OutputDocument = serde_json::from_str(&json).expect("output should be valid JSON");
    assert_eq!(parsed, document);
}

#[test]
fn test_combine_population_and_employment() {
    let job = employment_job();
    let data_dir = Path::new(DATA_DIR);
    let population = job.left.load(data_dir);
    let employment = job.right.load(data_dir);

    let document = combine_by_presence(&population, &employment, &job.fields, job.group_by);
    let expected = serde_json::json!({
        "2020": {
            "France": {"population": "41523.1", "employment": "28402.0"},
            "Germany": {"population": "53411.0", "employment": "44914.0"}
        },
        "2021": {
            "France": {"population": "41480.2", "employment": "28811.5"}
        }
    });
    assert_eq!(serde_json::to_value(&document).unwrap(), expected);
}

#[test]
fn test_missing_source_file_gives_empty_side() {
    let job = health_job();
    let data_dir = Path::new(DATA_DIR);
    let missing = load_table(
        &data_dir.join("Nonexistent table.csv"),
        &job.left.key_fields,
        None,
    );
    assert!(missing.is_empty());

    let status = job.right.load(data_dir);
    let document = merge_tables(
        &missing,
        &status,
        &job.left.rename,
        &job.right.rename,
        &job.fields,
        GroupBy::Year,
    );
    // Still emitted from the status side alone, without GDP.
    assert_eq!(document.record_count(), 4);
    assert!(document.get("2020", "France").unwrap().get("GDP").is_none());
}
