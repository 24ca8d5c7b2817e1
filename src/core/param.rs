//! Parameter task data.
//!
//! A [`ParamTask`] represents one externally-supplied configuration value:
//! its environment key, hash-file path, sensitivity flag, default, and the
//! memoized result of the last resolution. The resolution and staleness
//! protocol itself lives in [`registry`](crate::core::registry); this module
//! carries the per-task state and the derive-or-override accessors.

use std::path::{Path, PathBuf};

/// A parameter default: either a static value or a resolver invoked with the
/// task as context.
pub enum DefaultValue {
    Static(String),
    Computed(Box<dyn Fn(&ParamTask) -> String>),
}

impl std::fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Static(value) => f.debug_tuple("Static").field(value).finish(),
            DefaultValue::Computed(_) => f.debug_tuple("Computed").field(&"<fn>").finish(),
        }
    }
}

impl From<&str> for DefaultValue {
    fn from(value: &str) -> Self {
        DefaultValue::Static(value.to_string())
    }
}

impl From<String> for DefaultValue {
    fn from(value: String) -> Self {
        DefaultValue::Static(value)
    }
}

/// One declared parameter.
#[derive(Debug)]
pub struct ParamTask {
    name: String,
    env_key: Option<String>,
    hash_file: Option<PathBuf>,
    pub(crate) sensitive: bool,
    pub(crate) default: Option<DefaultValue>,
    pub(crate) value: Option<String>,
}

impl ParamTask {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            env_key: None,
            hash_file: None,
            sensitive: false,
            default: None,
            value: None,
        }
    }

    /// The parameter name, unique within its graph.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The key used to read the parameter from the environment.
    ///
    /// The uppercased task name unless overridden.
    pub fn env_key(&self) -> String {
        match &self.env_key {
            Some(key) => key.clone(),
            None => self.name.to_uppercase(),
        }
    }

    /// The file used to store the hashed value.
    ///
    /// `hash_dir/name` unless overridden.
    pub fn hash_file(&self, hash_dir: &Path) -> PathBuf {
        match &self.hash_file {
            Some(file) => file.clone(),
            None => hash_dir.join(&self.name),
        }
    }

    /// Whether this parameter may arrive encrypted.
    pub fn sensitive(&self) -> bool {
        self.sensitive
    }

    /// The memoized value of the last resolution, if any.
    pub fn cached(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Invalidate the memoized value, forcing the next resolution to start
    /// from scratch.
    pub fn reset(&mut self) {
        self.value = None;
    }

    pub(crate) fn set_env_key(&mut self, key: String) {
        self.env_key = Some(key);
    }

    pub(crate) fn set_hash_file(&mut self, file: PathBuf) {
        self.hash_file = Some(file);
    }
}

/// Per-parameter declaration options.
#[derive(Debug, Default)]
pub struct ParamOptions {
    pub(crate) env_key: Option<String>,
    pub(crate) hash_file: Option<PathBuf>,
    pub(crate) sensitive: Option<bool>,
    pub(crate) default: Option<DefaultValue>,
}

impl ParamOptions {
    /// Start from all-default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the environment variable key.
    pub fn env_key(mut self, key: impl Into<String>) -> Self {
        self.env_key = Some(key.into());
        self
    }

    /// Override the hash file path.
    pub fn hash_file(mut self, file: impl Into<PathBuf>) -> Self {
        self.hash_file = Some(file.into());
        self
    }

    /// Mark the parameter as sensitive (possibly encrypted).
    pub fn sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = Some(sensitive);
        self
    }

    /// Fall back to a static default value.
    pub fn default_value(mut self, value: impl Into<DefaultValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Fall back to a default computed from the task.
    pub fn default_with(mut self, resolver: impl Fn(&ParamTask) -> String + 'static) -> Self {
        self.default = Some(DefaultValue::Computed(Box::new(resolver)));
        self
    }
}
