//! Symmetric encryption service.
//!
//! Abstracts the `Encrypt(plaintext, secret)` / `Decrypt(ciphertext, secret)`
//! operations behind the [`Cipher`] trait so the rest of the crate treats the
//! encryption format as opaque. The default backend uses age passphrase
//! (scrypt) encryption with ASCII armor encoding.

use std::io::{Read, Write};

use age::secrecy::SecretString;
use age::scrypt;

use crate::error::{CipherError, Result};

/// Encryption backend trait.
///
/// Secrets are plain passphrase strings; the ciphertext format is whatever
/// the backend produces. Decryption failures (wrong secret, malformed
/// ciphertext) are propagated unchanged as [`CipherError`].
pub trait Cipher {
    /// Encrypt plaintext with a symmetric secret.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::EncryptionFailed` if encryption fails at any
    /// stage.
    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String>;

    /// Decrypt a ciphertext with a symmetric secret.
    ///
    /// # Errors
    ///
    /// Returns `CipherError::DecryptionFailed` if the secret doesn't match
    /// or the ciphertext is malformed.
    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String>;

    /// Backend name for display/config.
    fn name(&self) -> &'static str;
}

/// Default backend: age scrypt passphrase encryption, ASCII-armored.
#[derive(Debug, Default, Clone, Copy)]
pub struct AgeCipher;

impl Cipher for AgeCipher {
    fn encrypt(&self, plaintext: &str, secret: &str) -> Result<String> {
        let recipient = scrypt::Recipient::new(SecretString::from(secret.to_owned()));
        let encryptor =
            age::Encryptor::with_recipients(std::iter::once(&recipient as &dyn age::Recipient))
                .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        let mut encrypted = Vec::new();
        let mut writer = encryptor
            .wrap_output(age::armor::ArmoredWriter::wrap_output(
                &mut encrypted,
                age::armor::Format::AsciiArmor,
            )?)
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        writer.write_all(plaintext.as_bytes())?;
        let armored = writer
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;
        armored
            .finish()
            .map_err(|e| CipherError::EncryptionFailed(format!("{}", e)))?;

        String::from_utf8(encrypted)
            .map_err(|e| CipherError::EncryptionFailed(format!("UTF-8 error: {}", e)).into())
    }

    fn decrypt(&self, ciphertext: &str, secret: &str) -> Result<String> {
        let identity = scrypt::Identity::new(SecretString::from(secret.to_owned()));
        let reader = age::armor::ArmoredReader::new(ciphertext.as_bytes());
        let decryptor = age::Decryptor::new(reader)
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        let mut decrypted = Vec::new();
        let mut reader = decryptor
            .decrypt(std::iter::once(&identity as &dyn age::Identity))
            .map_err(|e| CipherError::DecryptionFailed(format!("{}", e)))?;

        reader.read_to_end(&mut decrypted)?;

        String::from_utf8(decrypted)
            .map_err(|e| CipherError::DecryptionFailed(format!("UTF-8 error: {}", e)).into())
    }

    fn name(&self) -> &'static str {
        "age-scrypt"
    }
}

/// Encrypt plaintext using the default age backend.
///
/// This is a convenience wrapper around [`AgeCipher::encrypt`].
///
/// # Errors
///
/// Returns `CipherError` if encryption fails.
pub fn encrypt(plaintext: &str, secret: &str) -> Result<String> {
    AgeCipher.encrypt(plaintext, secret)
}

/// Decrypt a ciphertext using the default age backend.
///
/// This is a convenience wrapper around [`AgeCipher::decrypt`].
///
/// # Errors
///
/// Returns `CipherError` if decryption fails or the secret doesn't match.
pub fn decrypt(ciphertext: &str, secret: &str) -> Result<String> {
    AgeCipher.decrypt(ciphertext, secret)
}

/// Generate a fresh random secret as a 32-character hex string.
pub fn generate_secret() -> String {
    use rand::Rng;

    let bytes: [u8; 16] = rand::thread_rng().gen();
    hex::encode(bytes)
}
