//! Parameter registry.
//!
//! [`Registry`] is the primary interface: it owns the host-graph node table,
//! the global configuration, the cipher and environment backends, the parsed
//! config-document cache, and the parameter-task table, and implements the
//! declaration, resolution, staleness, and execution protocol on top of them.
//!
//! One registry corresponds to one host-graph instance. Tests construct a
//! fresh registry per run instead of resetting process-wide state.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sha1::{Digest, Sha1};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::core::cipher::{AgeCipher, Cipher};
use crate::core::config::GlobalConfig;
use crate::core::document::{self, DocumentCache};
use crate::core::env::{EnvSource, ProcessEnv};
use crate::core::graph::{Graph, NodeKind, Stamp};
use crate::core::param::{DefaultValue, ParamOptions, ParamTask};
use crate::error::{ConfigError, GraphError, ParamError, Result};

/// SHA-1 hex digest of a resolved value, as stored in hash files.
fn sha1_hex(value: &str) -> String {
    hex::encode(Sha1::digest(value.as_bytes()))
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        // A tag left intact by a plain parse yields its raw scalar.
        serde_yaml::Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

/// Owner of all parameter-subsystem state for one graph instance.
pub struct Registry {
    env: Box<dyn EnvSource>,
    cipher: Box<dyn Cipher>,
    graph: Graph,
    config: Option<GlobalConfig>,
    cache: DocumentCache,
    tasks: BTreeMap<String, ParamTask>,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("cipher", &self.cipher.name())
            .field("config", &self.config)
            .field("tasks", &self.tasks)
            .finish()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A registry over the process environment and the default age cipher.
    pub fn new() -> Self {
        Self::with_parts(Box::new(ProcessEnv), Box::new(AgeCipher))
    }

    /// A registry over caller-supplied environment and cipher backends.
    pub fn with_parts(env: Box<dyn EnvSource>, cipher: Box<dyn Cipher>) -> Self {
        Self {
            env,
            cipher,
            graph: Graph::new(),
            config: None,
            cache: DocumentCache::default(),
            tasks: BTreeMap::new(),
        }
    }

    /// The host-graph node table.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Mutable access to the host-graph node table (e.g. `force_rebuild`).
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// The bound global configuration, if `configure` has run.
    pub fn global_config(&self) -> Option<&GlobalConfig> {
        self.config.as_ref()
    }

    /// A declared parameter task.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::Unknown` if no such parameter is declared.
    pub fn task(&self, name: &str) -> Result<&ParamTask> {
        self.tasks
            .get(name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()).into())
    }

    fn task_mut(&mut self, name: &str) -> Result<&mut ParamTask> {
        self.tasks
            .get_mut(name)
            .ok_or_else(|| ParamError::Unknown(name.to_string()).into())
    }

    fn config(&self) -> Result<&GlobalConfig> {
        self.config
            .as_ref()
            .ok_or_else(|| ConfigError::NotConfigured.into())
    }

    // --- Configuration and declaration ---

    /// Bind the global configuration and set up its graph nodes: the
    /// hash-directory node, the secret parameter task (default empty), and
    /// the config-file node when one is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::AlreadyConfigured` if this registry is already
    /// configured. A fresh registry (a new graph instance) may configure
    /// again.
    pub fn configure(&mut self, config: GlobalConfig) -> Result<()> {
        if self.config.is_some() {
            return Err(ConfigError::AlreadyConfigured.into());
        }

        debug!(
            hash_dir = %config.hash_dir.display(),
            secret_param = %config.secret_param,
            config_file = ?config.config_file,
            "configuring parameter subsystem"
        );

        self.graph
            .define_directory(&config.hash_dir_node(), config.hash_dir.clone());

        let secret_param = config.secret_param.clone();
        let config_file = config.config_file.clone();
        self.config = Some(config);

        self.define(&secret_param, ParamOptions::new().default_value(""))?;

        if let Some(file) = config_file {
            let node = file.to_string_lossy().into_owned();
            self.graph.define_file(&node, file);
        }

        Ok(())
    }

    /// Declare a parameter task.
    ///
    /// Re-declaring an existing name leaves the existing task untouched.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` if `configure` has not run.
    pub fn define(&mut self, name: &str, options: ParamOptions) -> Result<()> {
        self.define_with(name, options, |_, _| Ok(()))
    }

    /// Declare a parameter task with a customization step.
    ///
    /// The closure runs after the options are applied and before the
    /// hash-directory and config-file prerequisites are added, mirroring the
    /// declaration order of the prerequisites themselves.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` if `configure` has not run, or
    /// whatever the customization step fails with.
    pub fn define_with<F>(&mut self, name: &str, options: ParamOptions, customize: F) -> Result<()>
    where
        F: FnOnce(&mut Self, &str) -> Result<()>,
    {
        let (hash_dir_node, config_file_node) = {
            let config = self.config()?;
            (config.hash_dir_node(), config.config_file_node())
        };

        if self.tasks.contains_key(name) {
            trace!(name, "parameter already declared");
            return Ok(());
        }

        debug!(name, "declaring parameter task");
        self.graph.define_param(name);

        let mut task = ParamTask::new(name);
        if let Some(key) = options.env_key {
            task.set_env_key(key);
        }
        if let Some(file) = options.hash_file {
            task.set_hash_file(file);
        }
        if let Some(default) = options.default {
            task.default = Some(default);
        }
        self.tasks.insert(name.to_string(), task);

        if let Some(sensitive) = options.sensitive {
            self.set_sensitive(name, sensitive)?;
        }

        customize(self, name)?;

        self.graph.add_prereq(name, &hash_dir_node)?;
        if let Some(node) = config_file_node {
            self.graph.add_prereq(name, &node)?;
        }

        Ok(())
    }

    /// Toggle a parameter's sensitivity.
    ///
    /// Turning sensitivity on adds the secret parameter to the task's
    /// prerequisites; turning it off removes it. Setting the current value
    /// again is a no-op, so the prerequisite appears exactly once.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::Unknown` for an undeclared name.
    pub fn set_sensitive(&mut self, name: &str, sensitive: bool) -> Result<()> {
        let secret_param = self.config()?.secret_param.clone();

        let task = self.task_mut(name)?;
        if task.sensitive == sensitive {
            return Ok(());
        }
        task.sensitive = sensitive;

        if sensitive {
            debug!(name, "sensitivity enabled; adding secret param dependency");
            self.graph.add_prereq(name, &secret_param)
        } else {
            debug!(name, "sensitivity disabled; removing secret param dependency");
            self.graph.remove_prereq(name, &secret_param)
        }
    }

    /// Replace a parameter's default.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::Unknown` for an undeclared name.
    pub fn set_default(&mut self, name: &str, default: impl Into<DefaultValue>) -> Result<()> {
        self.task_mut(name)?.default = Some(default.into());
        Ok(())
    }

    /// Invalidate a parameter's memoized value.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::Unknown` for an undeclared name.
    pub fn reset(&mut self, name: &str) -> Result<()> {
        self.task_mut(name)?.reset();
        Ok(())
    }

    // --- Staleness ---

    /// A node's effective timestamp: the artifact mtime when present, else
    /// the late sentinel. For parameter nodes the artifact is the hash file.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::UnknownNode` for an undefined node.
    pub fn stamp(&self, name: &str) -> Result<Stamp> {
        match self.graph.kind(name)? {
            NodeKind::File(path) | NodeKind::Directory(path) => Ok(Stamp::from_path(path)),
            NodeKind::Param => {
                let hash_file = self.hash_file_of(name)?;
                Ok(Stamp::from_path(&hash_file))
            }
        }
    }

    /// Whether a parameter must re-execute.
    ///
    /// True when the env key is absent, the hash file is missing, the
    /// freshly resolved value hashes differently than the stored digest, any
    /// prerequisite's stamp is newer than this task's, or the graph-wide
    /// force-rebuild override is set. Forces value resolution but has no
    /// execution side effects.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::Unknown` for an undeclared name; resolution
    /// errors propagate.
    pub fn needed(&mut self, name: &str) -> Result<bool> {
        let env_key = self.task(name)?.env_key();
        if !self.env.contains(&env_key) {
            trace!(name, env_key = %env_key, "needed: env key absent");
            return Ok(true);
        }

        let hash_file = self.hash_file_of(name)?;
        if !hash_file.exists() {
            trace!(name, "needed: hash file missing");
            return Ok(true);
        }

        let expected = self.hash_expected(name)?;
        let existing = self.hash_existing(&hash_file)?;
        if expected != existing {
            trace!(name, "needed: value hash changed");
            return Ok(true);
        }

        let own = self.stamp(name)?;
        let prereqs = self.graph.prereqs(name)?.to_vec();
        for prereq in prereqs {
            if self.stamp(&prereq)? > own {
                trace!(name, prereq = %prereq, "needed: prerequisite is newer");
                return Ok(true);
            }
        }

        if self.graph.force_rebuild {
            return Ok(true);
        }

        Ok(false)
    }

    // --- Execution and resolution ---

    /// Execute a parameter: resolve it afresh and persist the value's SHA-1
    /// digest to the hash file.
    ///
    /// Only the digest is written, never the value, so the hash file reveals
    /// change without revealing content.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::Missing` when the value resolves to nothing; any
    /// stale hash file is deleted first so the failure stays detectable on
    /// the next run.
    pub fn execute(&mut self, name: &str) -> Result<()> {
        let hash_file = self.hash_file_of(name)?;

        let Some(value) = self.resolve_with(name, false)? else {
            if hash_file.exists() {
                std::fs::remove_file(&hash_file)?;
            }
            return Err(ParamError::Missing(name.to_string()).into());
        };

        debug!(name, hash_file = %hash_file.display(), "recording parameter value hash");
        std::fs::write(&hash_file, sha1_hex(&value))?;
        Ok(())
    }

    /// Resolve a parameter, reusing the memoized value when available.
    ///
    /// # Errors
    ///
    /// Returns `ParamError::Unknown` for an undeclared name; decryption and
    /// document errors propagate. A value being found nowhere is `Ok(None)`,
    /// not an error.
    pub fn resolve(&mut self, name: &str) -> Result<Option<String>> {
        self.resolve_with(name, true)
    }

    /// Resolve a parameter from its sources, most to least likely: plain
    /// environment, encrypted environment (sensitive only), config document
    /// (decrypted iff sensitive), declared default. Memoizes the outcome.
    pub fn resolve_with(&mut self, name: &str, use_cache: bool) -> Result<Option<String>> {
        if use_cache {
            if let Some(value) = self.task(name)?.cached() {
                return Ok(Some(value.to_string()));
            }
        }

        let (env_key, sensitive) = {
            let task = self.task(name)?;
            (task.env_key(), task.sensitive)
        };

        let mut value = self.env.get(&env_key);
        if value.is_none() {
            value = self.resolve_encrypted(&env_key, sensitive)?;
        }
        if value.is_none() {
            value = self.resolve_config(name, sensitive)?;
        }
        if value.is_none() {
            value = self.resolve_default(name)?;
        }

        trace!(name, resolved = value.is_some(), "parameter resolution finished");
        self.task_mut(name)?.value = value.clone();
        Ok(value)
    }

    /// Resolve an encrypted environment variable.
    ///
    /// Immediately absent for non-sensitive parameters, so the secret param
    /// never gets consulted without being a declared prerequisite.
    fn resolve_encrypted(&mut self, env_key: &str, sensitive: bool) -> Result<Option<String>> {
        if !sensitive {
            return Ok(None);
        }

        let suffixes = self.config()?.env_suffixes.clone();
        let found = suffixes
            .iter()
            .find_map(|suffix| self.env.get(&format!("{}{}", env_key, suffix)));
        let Some(ciphertext) = found else {
            return Ok(None);
        };

        let secret = Zeroizing::new(self.secret_value()?);
        Ok(Some(self.cipher.decrypt(&ciphertext, &secret)?))
    }

    /// Resolve from the config document, re-parsing when the cache is not
    /// valid for this file and decryption requirement.
    fn resolve_config(&mut self, name: &str, sensitive: bool) -> Result<Option<String>> {
        let (file, tags) = {
            let config = self.config()?;
            match &config.config_file {
                Some(file) => (file.clone(), config.vault_tags.clone()),
                None => return Ok(None),
            }
        };
        if !file.exists() {
            return Ok(None);
        }

        if !self.cache.is_valid(&file, sensitive) {
            let document = if sensitive {
                let secret = Zeroizing::new(self.secret_value()?);
                document::parse_file(&file, &tags, self.cipher.as_ref(), &mut || {
                    Ok((*secret).clone())
                })?
            } else {
                document::parse_plain_file(&file)?
            };
            self.cache.store(file.clone(), sensitive, document);
        }

        let Some(document) = self.cache.document() else {
            return Ok(None);
        };

        // Flat key first; fall back to descending underscore-split segments.
        let found = document.get(name).or_else(|| {
            name.split('_')
                .try_fold(document, |value, key| value.get(key))
        });
        Ok(found.and_then(scalar_to_string))
    }

    fn resolve_default(&self, name: &str) -> Result<Option<String>> {
        let task = self.task(name)?;
        Ok(match &task.default {
            Some(DefaultValue::Static(value)) => Some(value.clone()),
            Some(DefaultValue::Computed(resolver)) => Some(resolver(task)),
            None => None,
        })
    }

    /// The secret parameter's resolved value, or empty when it resolves to
    /// nothing (it is declared with an empty default).
    fn secret_value(&mut self) -> Result<String> {
        let secret_param = self.config()?.secret_param.clone();
        Ok(self.resolve_with(&secret_param, true)?.unwrap_or_default())
    }

    // --- Invocation ---

    /// Invoke a node: prerequisites depth-first, then the node itself.
    /// Directory nodes are created with parents, file nodes must already
    /// exist, parameter nodes execute iff [`needed`](Self::needed).
    ///
    /// Returns whether this node's parameter actually executed.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::Unbuildable` for a missing file node and
    /// `GraphError::Circular` for a cyclic prerequisite chain; staleness
    /// and execution errors propagate.
    pub fn invoke(&mut self, name: &str) -> Result<bool> {
        let mut visiting = Vec::new();
        self.invoke_guarded(name, &mut visiting)
    }

    fn invoke_guarded(&mut self, name: &str, visiting: &mut Vec<String>) -> Result<bool> {
        if visiting.iter().any(|n| n == name) {
            let chain = format!("{} => {}", visiting.join(" => "), name);
            return Err(GraphError::Circular(chain).into());
        }
        visiting.push(name.to_string());
        let prereqs = self.graph.prereqs(name)?.to_vec();
        for prereq in prereqs {
            self.invoke_guarded(&prereq, visiting)?;
        }
        visiting.pop();

        match self.graph.kind(name)?.clone() {
            NodeKind::Directory(path) => {
                if !path.exists() {
                    debug!(path = %path.display(), "creating hash directory");
                    std::fs::create_dir_all(&path)?;
                }
                Ok(false)
            }
            NodeKind::File(path) => {
                if path.exists() {
                    Ok(false)
                } else {
                    Err(GraphError::Unbuildable(path).into())
                }
            }
            NodeKind::Param => {
                if self.needed(name)? {
                    self.execute(name)?;
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
        }
    }

    // --- Hash helpers ---

    fn hash_file_of(&self, name: &str) -> Result<PathBuf> {
        let hash_dir = self.config()?.hash_dir.clone();
        Ok(self.task(name)?.hash_file(&hash_dir))
    }

    /// Digest of the freshly resolved value, bypassing the memo.
    fn hash_expected(&mut self, name: &str) -> Result<Option<String>> {
        Ok(self.resolve_with(name, false)?.map(|v| sha1_hex(&v)))
    }

    /// Digest stored in the hash file, or `None` when absent.
    fn hash_existing(&self, hash_file: &Path) -> Result<Option<String>> {
        match std::fs::read_to_string(hash_file) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
