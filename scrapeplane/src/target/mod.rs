//! Target model: label sets, discovered groups, relabeling and the
//! targets a worker group scrapes.

mod group;
mod labels;
mod populate;
mod relabel;
mod types;

pub use group::TargetGroup;
pub use labels::{
    LabelSet, ADDRESS_LABEL, INSTANCE_LABEL, JOB_LABEL, METRICS_PATH_LABEL, RESERVED_PREFIX,
    SCHEME_LABEL,
};
pub use populate::{populate_labels, targets_from_groups, GroupTargets, Populated};
pub use relabel::{
    relabel, RelabelAction, RelabelConfig, DEFAULT_REGEX, DEFAULT_REPLACEMENT, DEFAULT_SEPARATOR,
};
pub use types::{PoolTargets, Target, TargetError, TargetHealth, TargetStatus};
