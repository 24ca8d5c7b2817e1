//! Environment variable access.
//!
//! Read-only key/value lookup behind the [`EnvSource`] seam so library code
//! never reaches into `std::env` directly, and tests can run against an
//! isolated in-memory environment instead of mutating process state.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Read-only environment lookup by exact key string.
pub trait EnvSource {
    /// The value at `key`, or `None` if unset.
    fn get(&self, key: &str) -> Option<String>;

    /// Whether `key` is set at all.
    fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// An in-memory environment backed by a shared map.
///
/// Cloning yields a handle onto the same map, so a test can hand one clone
/// to a registry and keep another to mutate values between build passes.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MapEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a variable.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.borrow_mut().insert(key.into(), value.into());
    }

    /// Remove a variable.
    pub fn remove(&self, key: &str) {
        self.vars.borrow_mut().remove(key);
    }
}

impl EnvSource for MapEnv {
    fn get(&self, key: &str) -> Option<String> {
        self.vars.borrow().get(key).cloned()
    }
}
