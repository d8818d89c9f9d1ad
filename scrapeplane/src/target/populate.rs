//! Turning discovered target groups into scrape targets.

use super::group::TargetGroup;
use super::labels::{
    LabelSet, ADDRESS_LABEL, INSTANCE_LABEL, JOB_LABEL, METRICS_PATH_LABEL, SCHEME_LABEL,
};
use super::relabel::relabel;
use super::types::{Target, TargetError};
use crate::config::JobSpec;

/// Outcome of [`populate_labels`] for one discovered target.
#[derive(Debug)]
pub enum Populated {
    /// The target should be scraped.
    Active(Target),
    /// Relabeling dropped the target.
    Dropped(Target),
}

/// Builds a target from group and target labels under `spec`.
///
/// Target labels override group labels; `job`, `__scheme__` and
/// `__metrics_path__` are filled from the job when absent. The merged set
/// is what gets reported as the discovered labels.
pub fn populate_labels(
    spec: &JobSpec,
    group_labels: &LabelSet,
    target_labels: &LabelSet,
) -> Result<Populated, TargetError> {
    let mut discovered = group_labels.merged(target_labels);
    discovered.insert_default(JOB_LABEL, &spec.job_name);
    discovered.insert_default(SCHEME_LABEL, &spec.scheme);
    discovered.insert_default(METRICS_PATH_LABEL, &spec.metrics_path);

    let Some(mut labels) = relabel(discovered.clone(), &spec.relabel_configs) else {
        return Ok(Populated::Dropped(Target::dropped(discovered)));
    };

    let address = labels.get(ADDRESS_LABEL).unwrap_or("").to_string();
    if address.is_empty() {
        return Err(TargetError::MissingAddress { labels });
    }
    if address.contains('/') || address.contains(char::is_whitespace) {
        return Err(TargetError::InvalidAddress { address });
    }

    labels.insert_default(INSTANCE_LABEL, &address);

    let scheme = labels.get(SCHEME_LABEL).unwrap_or(spec.scheme.as_str());
    let path = labels
        .get(METRICS_PATH_LABEL)
        .unwrap_or(spec.metrics_path.as_str());
    let url = format!("{}://{}{}", scheme, address, path);

    Ok(Populated::Active(Target::new(
        labels.without_reserved(),
        discovered,
        url,
    )))
}

/// Targets derived from a full set of groups.
#[derive(Debug, Default)]
pub struct GroupTargets {
    /// Targets to scrape.
    pub active: Vec<Target>,
    /// Targets removed by relabeling.
    pub dropped: Vec<Target>,
    /// Entries that could not be turned into targets.
    pub errors: Vec<TargetError>,
}

/// Applies [`populate_labels`] to every target of every group.
///
/// An invalid entry is reported in `errors` without affecting its
/// neighbours.
pub fn targets_from_groups(spec: &JobSpec, groups: &[TargetGroup]) -> GroupTargets {
    let mut out = GroupTargets::default();
    for group in groups {
        for target_labels in &group.targets {
            match populate_labels(spec, &group.labels, target_labels) {
                Ok(Populated::Active(t)) => out.active.push(t),
                Ok(Populated::Dropped(t)) => out.dropped.push(t),
                Err(e) => out.errors.push(e),
            }
        }
    }
    out
}
