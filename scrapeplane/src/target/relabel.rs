//! Label rewriting applied to discovered targets before scraping.
//!
//! Each rule concatenates the values of `source_labels` with `separator`
//! and matches the result against a fully anchored regex. Rules run in
//! order; a `Keep` or `Drop` rule can end processing by dropping the
//! target.

use super::labels::LabelSet;
use crate::config::ConfigError;
use regex::Regex;

/// Default separator between concatenated source label values.
pub const DEFAULT_SEPARATOR: &str = ";";

/// Default regex, matching anything.
pub const DEFAULT_REGEX: &str = "(.*)";

/// Default replacement, the first capture group.
pub const DEFAULT_REPLACEMENT: &str = "$1";

/// What a rule does when evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelabelAction {
    /// Drop the target unless the regex matches.
    Keep,
    /// Drop the target if the regex matches.
    Drop,
    /// On match, set `target_label` to the expanded replacement; an empty
    /// expansion removes the label.
    Replace {
        target_label: String,
        replacement: String,
    },
}

/// One relabeling rule.
#[derive(Debug, Clone)]
pub struct RelabelConfig {
    /// Labels whose values are joined to form the match input.
    pub source_labels: Vec<String>,
    /// Joiner for source label values.
    pub separator: String,
    /// The rule's action.
    pub action: RelabelAction,
    pattern: String,
    regex: Regex,
}

impl RelabelConfig {
    fn new(
        source_labels: &[&str],
        pattern: &str,
        action: RelabelAction,
    ) -> Result<Self, ConfigError> {
        let anchored = format!("^(?:{})$", pattern);
        let regex = Regex::new(&anchored).map_err(|e| ConfigError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            source_labels: source_labels.iter().map(|s| s.to_string()).collect(),
            separator: DEFAULT_SEPARATOR.to_string(),
            action,
            pattern: pattern.to_string(),
            regex,
        })
    }

    /// Keeps only targets whose source labels match `pattern`.
    pub fn keep(source_labels: &[&str], pattern: &str) -> Result<Self, ConfigError> {
        Self::new(source_labels, pattern, RelabelAction::Keep)
    }

    /// Drops targets whose source labels match `pattern`.
    pub fn drop(source_labels: &[&str], pattern: &str) -> Result<Self, ConfigError> {
        Self::new(source_labels, pattern, RelabelAction::Drop)
    }

    /// Writes `replacement` (with `$n` / `${name}` expansion) to `target_label`.
    pub fn replace(
        source_labels: &[&str],
        pattern: &str,
        target_label: &str,
        replacement: &str,
    ) -> Result<Self, ConfigError> {
        Self::new(
            source_labels,
            pattern,
            RelabelAction::Replace {
                target_label: target_label.to_string(),
                replacement: replacement.to_string(),
            },
        )
    }

    /// Overrides the separator.
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.separator = separator.to_string();
        self
    }

    /// The unanchored pattern this rule was built from.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    fn source_value(&self, labels: &LabelSet) -> String {
        self.source_labels
            .iter()
            .map(|name| labels.get(name).unwrap_or(""))
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    /// Applies the rule. Returns `None` when the target is dropped.
    pub fn apply(&self, mut labels: LabelSet) -> Option<LabelSet> {
        let value = self.source_value(&labels);
        match &self.action {
            RelabelAction::Keep => self.regex.is_match(&value).then_some(labels),
            RelabelAction::Drop => (!self.regex.is_match(&value)).then_some(labels),
            RelabelAction::Replace {
                target_label,
                replacement,
            } => {
                let Some(captures) = self.regex.captures(&value) else {
                    return Some(labels);
                };
                let mut expanded = String::new();
                captures.expand(replacement, &mut expanded);
                if expanded.is_empty() {
                    labels.remove(target_label);
                } else {
                    labels.insert(target_label.as_str(), expanded);
                }
                Some(labels)
            }
        }
    }
}

/// Runs `configs` in order over `labels`. Returns `None` if any rule drops
/// the target.
pub fn relabel(labels: LabelSet, configs: &[RelabelConfig]) -> Option<LabelSet> {
    configs
        .iter()
        .try_fold(labels, |labels, config| config.apply(labels))
}
