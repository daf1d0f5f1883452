//! Controller credentials loader
//!
//! Credentials come from the `IDRAC_USERNAME`/`IDRAC_PASSWORD` environment
//! variables (the CI/CD path, masked pipeline variables), with a
//! `secrets.toml` fallback for local runs. The file should be excluded from
//! version control.
//!
//! Example secrets.toml:
//! ```toml
//! [idrac]
//! username = "root"
//! password = "calvin"
//! ```

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

use crate::constants::env as env_keys;

/// Structure matching the secrets.toml file format
#[derive(Debug, Deserialize, Default)]
struct SecretsFile {
    #[serde(default)]
    idrac: SecretsSection,
}

#[derive(Debug, Deserialize, Default)]
struct SecretsSection {
    username: Option<String>,
    password: Option<String>,
}

/// Username/password pair for one fleet. The password is never logged,
/// serialized or persisted.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Resolve credentials: environment first, secrets file second.
    /// Fails before any network call when neither supplies both values.
    pub fn load(secrets_path: &Path) -> Result<Self> {
        let file = read_secrets_file(secrets_path)?;
        Self::resolve(
            std::env::var(env_keys::USERNAME).ok(),
            std::env::var(env_keys::PASSWORD).ok(),
            file,
        )
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    fn resolve(
        env_username: Option<String>,
        env_password: Option<String>,
        file: SecretsFile,
    ) -> Result<Self> {
        let username = env_username
            .filter(|v| !v.is_empty())
            .or(file.idrac.username)
            .ok_or_else(|| missing(env_keys::USERNAME))?;
        let password = env_password
            .filter(|v| !v.is_empty())
            .or(file.idrac.password)
            .ok_or_else(|| missing(env_keys::PASSWORD))?;

        Ok(Self { username, password })
    }
}

fn missing(var: &str) -> anyhow::Error {
    anyhow!(
        "{} is not set and secrets.toml does not supply it. \
         Set it locally or via CI/CD masked variables.",
        var
    )
}

fn read_secrets_file(secrets_path: &Path) -> Result<SecretsFile> {
    if !secrets_path.exists() {
        return Ok(SecretsFile::default());
    }

    let content = std::fs::read_to_string(secrets_path)
        .with_context(|| format!("Failed to read secrets file: {:?}", secrets_path))?;

    let file: SecretsFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse secrets file: {:?}", secrets_path))?;

    if file.idrac.username.is_some() {
        info!("Loaded credentials from {:?}", secrets_path);
    } else {
        warn!("Secrets file {:?} has no [idrac] username", secrets_path);
    }

    Ok(file)
}

// The password must never leak through Debug-formatted logs or errors.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"********")
            .finish()
    }
}
