use crate::errors::{Error, Result};
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use std::{
    env, fs,
    path::{Path, PathBuf},
};

const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";
const SECRETS_FILE: &str = ".env.secrets";
const KEY_FILE: &str = ".sysaid.key";
const KDF_SALT: &[u8] = b"sysaid-key-salt";
const KDF_ROUNDS: u32 = 100_000;
const NONCE_LEN: usize = 12;

pub fn default_key_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(KEY_FILE)
}

/// Resolve the API key: environment variable, then `.env.secrets` in the
/// working directory, then the encrypted key file, then an interactive
/// hidden prompt. Non-fatal failures along the chain warn and fall
/// through to the next source.
pub fn resolve_api_key() -> Result<String> {
    if let Ok(key) = env::var(API_KEY_ENV) {
        let key = key.trim();
        if !key.is_empty() {
            tracing::debug!("api key resolved from environment");
            return Ok(key.to_string());
        }
    }

    match read_secrets_file(Path::new(SECRETS_FILE)) {
        Ok(Some(key)) => {
            tracing::debug!("api key resolved from {}", SECRETS_FILE);
            return Ok(key);
        }
        Ok(None) => {}
        Err(e) => eprintln!("warning: failed to read {}: {}", SECRETS_FILE, e),
    }

    let key_file = default_key_file();
    if key_file.exists() {
        match unlock_key_file(&key_file) {
            Ok(key) => {
                tracing::debug!("api key resolved from {}", key_file.display());
                return Ok(key);
            }
            Err(e) => eprintln!("failed to unlock {}: {}", key_file.display(), e),
        }
    }

    let typed = rpassword::prompt_password("Enter Anthropic API key: ")
        .map_err(|e| Error::Key(e.to_string()))?;
    let typed = typed.trim().to_string();
    if typed.is_empty() {
        return Err(Error::Key("no API key provided".into()));
    }
    Ok(typed)
}

fn read_secrets_file(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    for line in content.lines() {
        if let Some(rest) = line.strip_prefix("ANTHROPIC_API_KEY=") {
            let key = rest.trim().trim_matches(|c| c == '"' || c == '\'');
            if !key.is_empty() {
                return Ok(Some(key.to_string()));
            }
        }
    }
    Ok(None)
}

fn unlock_key_file(path: &Path) -> Result<String> {
    let blob = fs::read_to_string(path)?;
    let passphrase = rpassword::prompt_password("Enter passphrase for stored API key: ")
        .map_err(|e| Error::Key(e.to_string()))?;
    decrypt_api_key(&blob, &passphrase)
}

fn derive_key(passphrase: &str) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), KDF_SALT, KDF_ROUNDS, &mut key);
    key
}

/// Encrypt an API key under a passphrase. The stored blob is
/// base64(nonce || ciphertext) with an AES-256-GCM cipher keyed by
/// PBKDF2-HMAC-SHA256.
pub fn encrypt_api_key(api_key: &str, passphrase: &str) -> Result<String> {
    let key_bytes = derive_key(passphrase);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, api_key.as_bytes())
        .map_err(|_| Error::Key("encryption failed".into()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(nonce.as_slice());
    blob.extend_from_slice(&ciphertext);
    Ok(B64.encode(blob))
}

pub fn decrypt_api_key(blob: &str, passphrase: &str) -> Result<String> {
    let raw = B64
        .decode(blob.trim())
        .map_err(|e| Error::Key(format!("bad key file encoding: {}", e)))?;
    if raw.len() <= NONCE_LEN {
        return Err(Error::Key("key file too short".into()));
    }
    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    let key_bytes = derive_key(passphrase);
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| Error::Key("wrong passphrase or corrupted key file".into()))?;
    String::from_utf8(plaintext).map_err(|_| Error::Key("decrypted key is not valid UTF-8".into()))
}

pub fn write_key_file(path: &Path, api_key: &str, passphrase: &str) -> Result<()> {
    let blob = encrypt_api_key(api_key, passphrase)?;
    fs::write(path, blob)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let blob = encrypt_api_key("sk-ant-test-key", "hunter2").unwrap();
        let key = decrypt_api_key(&blob, "hunter2").unwrap();
        assert_eq!(key, "sk-ant-test-key");
    }

    #[test]
    fn wrong_passphrase_is_rejected() {
        let blob = encrypt_api_key("sk-ant-test-key", "hunter2").unwrap();
        assert!(decrypt_api_key(&blob, "hunter3").is_err());
    }

    #[test]
    fn garbage_blob_is_rejected_not_a_panic() {
        assert!(decrypt_api_key("not base64 at all!", "x").is_err());
        assert!(decrypt_api_key("AAAA", "x").is_err());
    }

    #[test]
    fn secrets_file_parsing_strips_quotes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# secrets").unwrap();
        writeln!(file, "ANTHROPIC_API_KEY=\"sk-ant-quoted\"").unwrap();
        let key = read_secrets_file(file.path()).unwrap();
        assert_eq!(key.as_deref(), Some("sk-ant-quoted"));
    }

    #[test]
    fn secrets_file_without_the_key_yields_none() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "OTHER_VAR=1").unwrap();
        assert!(read_secrets_file(file.path()).unwrap().is_none());
    }

    #[test]
    fn key_file_round_trip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stored.key");
        write_key_file(&path, "sk-ant-on-disk", "pass").unwrap();
        let blob = std::fs::read_to_string(&path).unwrap();
        assert_eq!(decrypt_api_key(&blob, "pass").unwrap(), "sk-ant-on-disk");
    }
}
