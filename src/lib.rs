//! Taskparams - change-tracking configuration parameters for build task
//! graphs.
//!
//! A parameter task resolves one configuration value from an ordered chain of
//! sources (plain environment, encrypted environment, config document,
//! encrypted config entries, default) and persists only the SHA-1 digest of
//! the result. A parameter is stale exactly when its resolved value changes
//! or an upstream dependency is, so everything depending on it re-executes on
//! change without the value itself ever touching disk.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── error          # Error taxonomy (config / param / graph / cipher / document)
//! └── core/
//!     ├── cipher     # Opaque encrypt/decrypt service (default: age scrypt)
//!     ├── config     # Global subsystem configuration
//!     ├── constants  # Default directories, names, suffixes, tags
//!     ├── document   # Tagged-decryption YAML parsing + document cache
//!     ├── env        # Environment lookup seam (process / in-memory)
//!     ├── graph      # Host-graph boundary: nodes, prereqs, timestamps
//!     ├── param      # Per-parameter state and declaration options
//!     └── registry   # The primary interface: declare, resolve, execute
//! ```
//!
//! # Example
//!
//! ```no_run
//! use taskparams::{GlobalConfig, ParamOptions, Registry};
//!
//! # fn main() -> taskparams::Result<()> {
//! let mut registry = Registry::new();
//! registry.configure(GlobalConfig::default())?;
//!
//! registry.define("db_password", ParamOptions::new().sensitive(true))?;
//! registry.define("region", ParamOptions::new().default_value("eu-west-1"))?;
//!
//! registry.invoke("db_password")?;
//! let password = registry.resolve("db_password")?;
//! # let _ = password;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod error;

pub use crate::core::cipher::{AgeCipher, Cipher};
pub use crate::core::config::GlobalConfig;
pub use crate::core::env::{EnvSource, MapEnv, ProcessEnv};
pub use crate::core::graph::Stamp;
pub use crate::core::param::{DefaultValue, ParamOptions, ParamTask};
pub use crate::core::registry::Registry;
pub use crate::error::{Error, Result};
