use std::convert::TryInto;
use std::path::{Path, PathBuf};
use std::{env, fs};

use rand::Rng;

use crate::error::ConfigurationError;

const PASSWORD_SALT: &str = "password.salt";
const SESSION_KEY: &str = "session.key";

pub type Salt = [u8; 16];
pub type SessionKey = [u8; 32];

/// Installation secrets: the salt mixed into every password credential and the
/// key that signs session cookies.
#[derive(Clone)]
pub struct Security {
    pub salt: Salt,
    pub session_key: SessionKey,
}

impl std::fmt::Debug for Security {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Security { .. }")
    }
}

#[inline]
fn security_dir() -> PathBuf {
    PathBuf::from(env::var("SECURITY_DIR").unwrap_or("./security".to_string()))
}

fn load_secret<const N: usize>(dir: &Path, name: &str) -> Result<[u8; N], ConfigurationError> {
    let path = dir.join(name);

    let existing: Option<[u8; N]> = fs::read(&path).ok().and_then(|s| s.try_into().ok());
    if let Some(secret) = existing {
        tracing::info!("Loaded '{}'.", path.display());
        return Ok(secret);
    }

    tracing::info!("'{}' not found or malformed.", path.display());
    if !cfg!(feature = "generate-security") {
        return Err(ConfigurationError::MissingSecret(path));
    }

    tracing::info!("Generating '{}'.", path.display());
    let mut secret = [0u8; N];
    rand::thread_rng().fill(&mut secret[..]);
    fs::write(&path, secret)?;
    Ok(secret)
}

impl Security {
    pub fn load() -> Result<Security, ConfigurationError> {
        let dir = security_dir();

        if cfg!(feature = "generate-security") {
            fs::create_dir_all(&dir)?;
        }

        tracing::info!("Loading password salt...");
        let salt = load_secret::<16>(&dir, PASSWORD_SALT)?;

        tracing::info!("Loading session signing key...");
        let session_key = load_secret::<32>(&dir, SESSION_KEY)?;

        Ok(Security { salt, session_key })
    }

    /// Fresh secrets that are never written to disk.
    pub fn ephemeral() -> Security {
        Security {
            salt: rand::random(),
            session_key: rand::random(),
        }
    }
}
