//! Tagged-decryption config documents.
//!
//! Parses YAML config documents while transparently decrypting scalar values
//! that carry a recognized vault tag. The decryption hook runs as a rewrite
//! pass over the parsed value tree: every tagged scalar in the recognized set
//! is replaced by its decrypted plaintext with the tag stripped, wherever it
//! occurs (top level, sequences, nested mappings). Untagged scalars and
//! unrecognized tags pass through unchanged.
//!
//! Also holds [`DocumentCache`], the validity-scoped cache of the last parsed
//! (possibly decrypted) document used by parameter resolution.

use std::path::{Path, PathBuf};

use serde_yaml::value::Tag;
use serde_yaml::Value;
use tracing::{debug, trace};

use crate::core::cipher::Cipher;
use crate::error::{DocumentError, Result};

/// Callback supplying the decryption secret.
///
/// Invoked once per matching tagged scalar; callers wanting memoization must
/// memoize in the provider itself.
pub type SecretProvider<'a> = dyn FnMut() -> Result<String> + 'a;

/// Parse a YAML document, decrypting every scalar tagged with one of `tags`.
///
/// # Errors
///
/// Returns `DocumentError::Parse` on malformed YAML, or the cipher's error
/// unchanged if a tagged scalar fails to decrypt.
pub fn parse_str(
    content: &str,
    tags: &[String],
    cipher: &dyn Cipher,
    secret_provider: &mut SecretProvider<'_>,
) -> Result<Value> {
    let mut document: Value = serde_yaml::from_str(content).map_err(DocumentError::Parse)?;
    decrypt_in_place(&mut document, tags, cipher, secret_provider)?;
    Ok(document)
}

/// Parse a YAML document from a file, decrypting tagged scalars.
///
/// # Errors
///
/// Returns `DocumentError::Read` if the file cannot be read; otherwise as
/// [`parse_str`].
pub fn parse_file(
    path: impl AsRef<Path>,
    tags: &[String],
    cipher: &dyn Cipher,
    secret_provider: &mut SecretProvider<'_>,
) -> Result<Value> {
    let path = path.as_ref();
    debug!(path = %path.display(), "parsing config document with decryption");

    let content = std::fs::read_to_string(path).map_err(DocumentError::Read)?;
    parse_str(&content, tags, cipher, secret_provider)
}

/// Parse a YAML document without any decryption.
///
/// # Errors
///
/// Returns `DocumentError::Parse` on malformed YAML.
pub fn parse_plain(content: &str) -> Result<Value> {
    Ok(serde_yaml::from_str(content).map_err(DocumentError::Parse)?)
}

/// Parse a YAML document from a file without any decryption.
///
/// # Errors
///
/// Returns `DocumentError::Read` if the file cannot be read; otherwise as
/// [`parse_plain`].
pub fn parse_plain_file(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    debug!(path = %path.display(), "parsing config document");

    let content = std::fs::read_to_string(path).map_err(DocumentError::Read)?;
    parse_plain(&content)
}

fn tag_matches(tag: &Tag, tags: &[String]) -> bool {
    tags.iter().any(|t| tag == t.as_str())
}

fn decrypt_in_place(
    value: &mut Value,
    tags: &[String],
    cipher: &dyn Cipher,
    secret_provider: &mut SecretProvider<'_>,
) -> Result<()> {
    match value {
        Value::Tagged(tagged) if tag_matches(&tagged.tag, tags) => {
            if let Value::String(ciphertext) = &tagged.value {
                trace!(tag = %tagged.tag, "decrypting tagged scalar");
                let secret = secret_provider()?;
                let plaintext = cipher.decrypt(ciphertext, &secret)?;
                *value = Value::String(plaintext);
            } else {
                // A recognized tag on a collection decrypts its children.
                decrypt_in_place(&mut tagged.value, tags, cipher, secret_provider)?;
            }
        }
        Value::Tagged(tagged) => {
            decrypt_in_place(&mut tagged.value, tags, cipher, secret_provider)?;
        }
        Value::Sequence(items) => {
            for item in items {
                decrypt_in_place(item, tags, cipher, secret_provider)?;
            }
        }
        Value::Mapping(mapping) => {
            for (_, entry) in mapping.iter_mut() {
                decrypt_in_place(entry, tags, cipher, secret_provider)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Cache of the last parsed config document.
///
/// Valid only while the cached file path matches the currently configured
/// config file and the cached parse was decrypted if the current lookup
/// requires decryption. Any mismatch forces a full re-parse.
#[derive(Debug, Default)]
pub struct DocumentCache {
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    file: PathBuf,
    decrypted: bool,
    document: Value,
}

impl DocumentCache {
    /// Whether the cached document can serve a lookup against `file`.
    pub fn is_valid(&self, file: &Path, needs_decryption: bool) -> bool {
        match &self.entry {
            Some(entry) => entry.file == file && (entry.decrypted || !needs_decryption),
            None => false,
        }
    }

    /// Replace the cached document.
    pub fn store(&mut self, file: PathBuf, decrypted: bool, document: Value) {
        debug!(file = %file.display(), decrypted, "caching parsed config document");
        self.entry = Some(CacheEntry {
            file,
            decrypted,
            document,
        });
    }

    /// The cached document, if any.
    pub fn document(&self) -> Option<&Value> {
        self.entry.as_ref().map(|entry| &entry.document)
    }
}
