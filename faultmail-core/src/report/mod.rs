//! The failure report: an ordered list of labelled rows.

mod builder;
mod render;

pub use builder::{build_report, provider_for, value_to_text};
pub use render::{escape_html, render_report};

pub const HOST_NAME: &str = "Host Name";
pub const PIPELINE_NAME: &str = "Pipeline Name";
pub const RUNTIME_PARAMETERS: &str = "Runtime Parameters";
pub const ENVIRONMENT: &str = "Environment";
pub const NAMESPACE: &str = "Namespace";
pub const HOOK_NAME: &str = "Hook Name";
pub const LOCATION: &str = "Location";
pub const FILE: &str = "File";
pub const ERROR: &str = "Error";
pub const TRACEBACK: &str = "Traceback";

/// Rows every dispatched report carries.
pub const REQUIRED_LABELS: [&str; 5] = [HOST_NAME, PIPELINE_NAME, HOOK_NAME, ERROR, TRACEBACK];

/// Ordered label to value mapping.
///
/// Inserting an existing label replaces its value in place, so a row keeps
/// the position it was first given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorReport {
    rows: Vec<(String, String)>,
}

impl ErrorReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: impl Into<String>, value: impl Into<String>) {
        let label = label.into();
        let value = value.into();
        match self.rows.iter_mut().find(|(existing, _)| *existing == label) {
            Some((_, slot)) => *slot = value,
            None => self.rows.push((label, value)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(label, value);
        self
    }

    /// Writes every row of `other` over this report.
    pub fn overlay(&mut self, other: &ErrorReport) {
        for (label, value) in other.iter() {
            self.insert(label, value);
        }
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.rows
            .iter()
            .find(|(existing, _)| existing == label)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.get(label).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.rows
            .iter()
            .map(|(label, value)| (label.as_str(), value.as_str()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|(label, _)| label.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Required rows this report lacks.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_LABELS
            .into_iter()
            .filter(|label| !self.contains(label))
            .collect()
    }
}
