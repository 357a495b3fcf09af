//! Dispatch configuration.

/// Campus assumed when a section does not name one.
pub const DEFAULT_CAMPUS: &str = "seattle";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Group names owned by the import sub-handler.
    pub import_groups: Vec<String>,
    pub default_campus: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            import_groups: Vec::new(),
            default_campus: DEFAULT_CAMPUS.to_string(),
        }
    }
}

impl DispatchConfig {
    pub fn with_import_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.import_groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_campus(mut self, campus: impl Into<String>) -> Self {
        self.default_campus = campus.into();
        self
    }

    pub fn is_import_group(&self, group: &str) -> bool {
        self.import_groups.iter().any(|g| g == group)
    }
}
