//! Constants used throughout taskparams.
//!
//! Centralizes the default configuration values.

/// Directory that parameter value hashes are stored in (.params).
pub const HASH_DIR: &str = ".params";

/// Name of the parameter task that supplies the decryption secret.
pub const SECRET_PARAM: &str = "vault_secret";

/// Suffixes that encrypted environment variables can use, in lookup order.
pub const ENV_SUFFIXES: &[&str] = &["_ENC", "_SYM", "_VAULT"];

/// YAML tags that mark a scalar as encrypted.
///
/// Entries carry the leading `!`; it is not prepended during matching.
pub const VAULT_TAGS: &[&str] = &["!vault", "!sym"];
