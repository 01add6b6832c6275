//! Runs configured jobs end to end: load both sources, join, write every output.
//!
//! Failures below the job level are logged and recorded in the [JobSummary] rather than
//! returned, so one missing input or unwritable output does not stop the other jobs.

use crate::config::{CombineJob, Job, JobRegistry, MergeJob, SourceSpec};
use crate::table::LoadedTable;
use crate::error::MergeError;
use crate::merge::{combine_by_presence, merge_tables, GroupBy, OutputDocument};
use crate::writer;

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, info_span, warn};

#[derive(Clone, Debug, Serialize)]
pub struct OutputSummary {
    pub path: PathBuf,
    pub group_by: GroupBy,
    pub groups: usize,
    pub records: usize,
    pub written: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct JobSummary {
    pub job: String,
    pub left_rows: usize,
    pub left_keys: usize,
    pub right_rows: usize,
    pub right_keys: usize,
    pub outputs: Vec<OutputSummary>,
}

impl JobSummary {
    fn new(name: &str) -> Self {
        Self {
            job: name.to_string(),
            left_rows: 0,
            left_keys: 0,
            right_rows: 0,
            right_keys: 0,
            outputs: Vec::new(),
        }
    }

    pub fn all_written(&self) -> bool {
        self.outputs.iter().all(|o| o.written)
    }

    pub fn failed_outputs(&self) -> impl Iterator<Item = &OutputSummary> {
        self.outputs.iter().filter(|o| !o.written)
    }
}

fn warn_rename_collisions(source: &SourceSpec) {
    for (canonical, columns) in source.rename.collisions() {
        warn!(
            source = %source.path.display(),
            field = %canonical,
            columns = ?columns,
            "Several columns renamed to the same field, the last one wins"
        );
    }
}

/// Unmapped fields of the loaded table that land on a renamed field.
fn warn_pass_through_collisions(source: &SourceSpec, table: &LoadedTable) {
    for (canonical, columns) in source.rename.pass_through_collisions(table.field_names()) {
        warn!(
            source = %source.path.display(),
            field = %canonical,
            columns = ?columns,
            "Unrenamed field shares its name with a renamed one, the last one wins"
        );
    }
}

fn write_output(
    document: &OutputDocument,
    label: &str,
    group_by: GroupBy,
    path: PathBuf,
    summary: &mut JobSummary,
) {
    let written = writer::save_document(document, &path);
    info!(
        "{} data snippet by {}: {:?}",
        label,
        group_by,
        document.snippet()
    );
    summary.outputs.push(OutputSummary {
        path,
        group_by,
        groups: document.len(),
        records: document.record_count(),
        written,
    });
}

pub fn run_merge_job(job: &MergeJob, data_dir: &Path) -> JobSummary {
    let span = info_span!("job", name = %job.name, kind = "merge");
    let _enter = span.enter();

    warn_rename_collisions(&job.left);
    warn_rename_collisions(&job.right);

    let left = job.left.load(data_dir);
    let right = job.right.load(data_dir);
    warn_pass_through_collisions(&job.left, &left);
    warn_pass_through_collisions(&job.right, &right);

    let mut summary = JobSummary::new(&job.name);
    summary.left_rows = left.rows_read();
    summary.left_keys = left.len();
    summary.right_rows = right.rows_read();
    summary.right_keys = right.len();

    for output in &job.outputs {
        let document = merge_tables(
            &left,
            &right,
            &job.left.rename,
            &job.right.rename,
            &job.fields,
            output.group_by,
        );
        write_output(
            &document,
            "Merged",
            output.group_by,
            data_dir.join(&output.path),
            &mut summary,
        );
    }
    summary
}

pub fn run_combine_job(job: &CombineJob, data_dir: &Path) -> JobSummary {
    let span = info_span!("job", name = %job.name, kind = "combine");
    let _enter = span.enter();

    let left = job.left.load(data_dir);
    let right = job.right.load(data_dir);

    let mut summary = JobSummary::new(&job.name);
    summary.left_rows = left.rows_read();
    summary.left_keys = left.len();
    summary.right_rows = right.rows_read();
    summary.right_keys = right.len();

    let document = combine_by_presence(&left, &right, &job.fields, job.group_by);
    write_output(
        &document,
        "Combined",
        job.group_by,
        data_dir.join(&job.output),
        &mut summary,
    );
    summary
}

pub fn run_job(job: &Job, data_dir: &Path) -> JobSummary {
    match job {
        Job::Merge(job) => run_merge_job(job, data_dir),
        Job::Combine(job) => run_combine_job(job, data_dir),
    }
}

/// Run the named jobs, or all of them when `names` is empty. Fails only when a name
/// is unknown, before anything runs.
pub fn run_all(registry: &JobRegistry, names: &[String]) -> Result<Vec<JobSummary>, MergeError> {
    let jobs = registry.select(names)?;
    info!(jobs = jobs.len(), data_dir = %registry.data_dir.display(), "Starting run");
    Ok(jobs
        .into_iter()
        .map(|job| run_job(job, &registry.data_dir))
        .collect())
}
