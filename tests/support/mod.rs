//! Test support utilities for taskparams integration tests.
//!
//! Provides a reusable isolated registry fixture.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use tempfile::TempDir;
use tracing_subscriber::EnvFilter;

use taskparams::{AgeCipher, GlobalConfig, MapEnv, Registry};

static TRACING: Once = Once::new();

/// Route library tracing through the test harness, honoring `RUST_LOG`.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Test environment with an isolated temp directory.
///
/// Each test gets its own registry over an in-memory environment, with the
/// hash directory (and optional config file) rooted inside a temp dir. No
/// process-global state is mutated, so tests can safely run in parallel.
pub struct Test {
    /// Temporary directory holding the hash dir and config file.
    pub dir: TempDir,
    /// Handle onto the registry's environment; mutable between passes.
    pub env: MapEnv,
    /// The configured registry under test.
    pub registry: Registry,
}

impl Test {
    /// A configured registry with defaults rooted in a temp dir.
    pub fn new() -> Self {
        Self::with(|_| {})
    }

    /// A configured registry whose config is adjusted by `tweak` before
    /// `configure` runs. Paths set by the fixture are absolute.
    pub fn with(tweak: impl FnOnce(&mut GlobalConfig)) -> Self {
        let mut t = Self::unconfigured();
        let mut config = GlobalConfig {
            hash_dir: t.dir.path().join(".params"),
            ..GlobalConfig::default()
        };
        tweak(&mut config);
        t.registry
            .configure(config)
            .expect("failed to configure registry");
        t
    }

    /// A configured registry with a config file path set (file not written).
    pub fn with_config_file() -> Self {
        let mut t = Self::unconfigured();
        let config = GlobalConfig {
            hash_dir: t.dir.path().join(".params"),
            config_file: Some(t.dir.path().join("config.yml")),
            ..GlobalConfig::default()
        };
        t.registry
            .configure(config)
            .expect("failed to configure registry");
        t
    }

    /// A registry that has not been configured yet.
    pub fn unconfigured() -> Self {
        init_tracing();
        let dir = TempDir::new().expect("failed to create temp dir");
        let env = MapEnv::new();
        let registry = Registry::with_parts(Box::new(env.clone()), Box::new(AgeCipher));
        Self { dir, env, registry }
    }

    /// The hash file path of a parameter with no hash-file override.
    pub fn hash_file(&self, name: &str) -> PathBuf {
        self.dir.path().join(".params").join(name)
    }

    /// The configured config-file path.
    pub fn config_file(&self) -> PathBuf {
        self.dir.path().join("config.yml")
    }

    /// Write the config document.
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.config_file(), content).expect("failed to write config file");
    }
}

/// Quote a string as a YAML double-quoted scalar, escaping newlines so
/// armored ciphertexts survive embedding.
pub fn yaml_quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\n', "\\n"))
}

/// SHA-1 hex digest expected in hash files, for assertions.
pub fn sha1_hex(value: &str) -> String {
    use sha1::{Digest, Sha1};
    hex::encode(Sha1::digest(value.as_bytes()))
}
