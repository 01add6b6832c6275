//! The two jobs statmerge runs out of the box: merging OECD health expenditure with
//! perceived health status, and combining working-age population with employment by
//! economic activity. Everything here can be replaced or extended from a configuration
//! file, see [JobRegistry](crate::config::JobRegistry).
//!
//! Get one like
//! ```
//! use statmerge::defaults::health_job;
//! let health = health_job();
//! assert_eq!(health.outputs.len(), 2);
//! ```

use crate::config::{CombineJob, Job, MergeJob, OutputSpec, SourceSpec};
use crate::merge::{default_value_column, FieldSelection, GroupBy, PresenceFields};
use crate::rename::RenameMap;
use crate::table::KeyFields;
use std::path::PathBuf;

pub const HEALTH_JOB: &str = "health";
pub const EMPLOYMENT_JOB: &str = "employment";

const HEALTH_CATEGORIES: [&str; 3] = [
    "Fair (not good, not bad) health",
    "Good/very good health",
    "Bad/very bad health",
];

/// Total employment row in the economic activity table.
pub const TOTAL_ACTIVITY: &str = "Total - all activities";

fn oecd_key_fields() -> KeyFields {
    KeyFields::new("Reference area", "TIME_PERIOD")
}

fn health_expenditure() -> SourceSpec {
    SourceSpec {
        path: PathBuf::from("Health expenditure and financing.csv"),
        key_fields: oecd_key_fields(),
        category_field: None,
        rename: RenameMap::from_pairs(&[
            ("Reference area", "Country"),
            ("TIME_PERIOD", "Year"),
            ("OBS_VALUE", "GDP"),
        ]),
    }
}

fn perceived_health_status() -> SourceSpec {
    SourceSpec {
        path: PathBuf::from("Perceived health status.csv"),
        key_fields: oecd_key_fields(),
        category_field: Some("Health status".to_string()),
        rename: RenameMap::from_pairs(&[
            ("Reference area", "Country"),
            ("TIME_PERIOD", "Year"),
            ("OBS_VALUE", "Health status value"),
            ("Health status", "Health status"),
            (HEALTH_CATEGORIES[0], HEALTH_CATEGORIES[0]),
            (HEALTH_CATEGORIES[1], HEALTH_CATEGORIES[1]),
            (HEALTH_CATEGORIES[2], HEALTH_CATEGORIES[2]),
        ]),
    }
}

fn health_fields() -> FieldSelection {
    let categories = HEALTH_CATEGORIES
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<String>>();
    FieldSelection {
        scalar_fields: vec!["Country".to_string(), "Year".to_string(), "GDP".to_string()],
        category_fields: categories.clone(),
        value_fields: categories,
        drop_fields: vec!["Health status value".to_string(), "Health status".to_string()],
        category_value_column: default_value_column(),
    }
}

pub fn health_job() -> MergeJob {
    MergeJob {
        name: HEALTH_JOB.to_string(),
        left: health_expenditure(),
        right: perceived_health_status(),
        fields: health_fields(),
        outputs: vec![
            OutputSpec {
                group_by: GroupBy::Year,
                path: PathBuf::from("Merged_health_data_by_year.json"),
            },
            OutputSpec {
                group_by: GroupBy::Country,
                path: PathBuf::from("Merged_health_data_by_country.json"),
            },
        ],
    }
}

pub fn employment_job() -> CombineJob {
    CombineJob {
        name: EMPLOYMENT_JOB.to_string(),
        left: SourceSpec {
            path: PathBuf::from("Working-age population.csv"),
            key_fields: oecd_key_fields(),
            category_field: None,
            rename: RenameMap::new(),
        },
        right: SourceSpec {
            path: PathBuf::from(
                "Annual employment by detailed economic activity, domestic concept.csv",
            ),
            key_fields: oecd_key_fields(),
            category_field: Some("Activity".to_string()),
            rename: RenameMap::new(),
        },
        fields: PresenceFields {
            left_label: "population".to_string(),
            right_label: "employment".to_string(),
            value_column: default_value_column(),
            left_category: None,
            right_category: Some(TOTAL_ACTIVITY.to_string()),
        },
        group_by: GroupBy::Year,
        output: PathBuf::from("Combined_data_by_year.json"),
    }
}

/// The built-in jobs, in the order they run.
pub fn default_jobs() -> Vec<Job> {
    vec![Job::Merge(health_job()), Job::Combine(employment_job())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_jobs() {
        let jobs = default_jobs();
        let names = jobs.iter().map(Job::name).collect::<Vec<_>>();
        assert_eq!(names, vec![HEALTH_JOB, EMPLOYMENT_JOB]);

        let Job::Merge(health) = &jobs[0] else {
            panic!("the health job should be a merge job");
        };
        assert_eq!(health.outputs.len(), 2);
        assert_eq!(health.left.rename.apply("OBS_VALUE"), "GDP");
    }

    #[test]
    fn test_employment_uses_total_activity() {
        let job = employment_job();
        assert_eq!(job.fields.right_category.as_deref(), Some(TOTAL_ACTIVITY));
        assert_eq!(job.right.category_field.as_deref(), Some("Activity"));
    }

    #[test]
    fn test_default_rename_maps_have_no_collisions() {
        for job in default_jobs() {
            for source in job.sources() {
                assert!(source.rename.collisions().is_empty());
            }
        }
    }
}
