//! Target groups as produced by discovery.

use super::labels::{LabelSet, ADDRESS_LABEL};

/// A batch of targets sharing common labels, identified by its source.
///
/// Providers re-send a group with the same `source` to replace it; an empty
/// `targets` list removes every target previously sent under that source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetGroup {
    /// Identifier unique within the provider that produced the group.
    pub source: String,
    /// Per-target labels; each usually carries `__address__`.
    pub targets: Vec<LabelSet>,
    /// Labels applied to every target in the group.
    pub labels: LabelSet,
}

impl TargetGroup {
    /// Creates an empty group for `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            targets: Vec::new(),
            labels: LabelSet::new(),
        }
    }

    /// Adds a target with only an address label.
    pub fn with_address(mut self, address: &str) -> Self {
        self.targets
            .push(LabelSet::new().with(ADDRESS_LABEL, address));
        self
    }

    /// Adds a target with arbitrary labels.
    pub fn with_target(mut self, labels: LabelSet) -> Self {
        self.targets.push(labels);
        self
    }

    /// Adds a group-level label.
    pub fn with_label(mut self, name: &str, value: &str) -> Self {
        self.labels.insert(name, value);
        self
    }

    /// Returns true if the group carries no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let group = TargetGroup::new("static/0")
            .with_address("a:9100")
            .with_address("b:9100")
            .with_label("env", "prod");

        assert_eq!(group.source, "static/0");
        assert_eq!(group.targets.len(), 2);
        assert_eq!(group.targets[1].get(ADDRESS_LABEL), Some("b:9100"));
        assert_eq!(group.labels.get("env"), Some("prod"));
        assert!(!group.is_empty());
        assert!(TargetGroup::new("x").is_empty());
    }
}
