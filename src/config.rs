use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::api::admin::AdminGate;
use crate::error::Result;
use crate::model::db::{AdminSecret, FileStores};

/// Config file read from the working directory unless another is given.
pub const DEFAULT_CONFIG_FILE: &str = "Ballot.toml";

/// Prefix of environment variables that override config keys, e.g. `BALLOT_LEDGER_PATH`.
pub const ENV_PREFIX: &str = "BALLOT_";

/// Application configuration, derived from defaults, `Ballot.toml` and
/// `BALLOT_*` environment variables, in increasing order of precedence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    roster_path: PathBuf,
    candidates_path: PathBuf,
    ledger_path: PathBuf,
    admin_secret_path: PathBuf,
    log_config: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster_path: "voters.csv".into(),
            candidates_path: "candidates.csv".into(),
            ledger_path: "votes.csv".into(),
            admin_secret_path: "admin_secret.txt".into(),
            log_config: "log4rs.yaml".into(),
        }
    }
}

impl Config {
    /// The layered configuration sources, with the TOML file at `path`.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load from `path` (or `Ballot.toml` if `None`) and the environment.
    /// A missing file is not an error; defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        Self::from_figment(Self::figment(path))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        Ok(figment.extract()?)
    }

    /// Config with every file placed in `dir`, under the default names.
    pub fn in_dir(dir: &Path) -> Self {
        let defaults = Self::default();
        Self {
            roster_path: dir.join(defaults.roster_path),
            candidates_path: dir.join(defaults.candidates_path),
            ledger_path: dir.join(defaults.ledger_path),
            admin_secret_path: dir.join(defaults.admin_secret_path),
            log_config: dir.join(defaults.log_config),
        }
    }

    /// CSV voter roster (`id, nom, prenom, cnib`).
    /// Configured via `roster_path`.
    pub fn roster_path(&self) -> &Path {
        &self.roster_path
    }

    /// CSV candidate list (`id, nom, prenom, classe, mot, image`).
    /// Configured via `candidates_path`.
    pub fn candidates_path(&self) -> &Path {
        &self.candidates_path
    }

    /// CSV ballot ledger, created on first vote.
    /// Configured via `ledger_path`.
    pub fn ledger_path(&self) -> &Path {
        &self.ledger_path
    }

    /// Single-line file holding the admin secret.
    /// Configured via `admin_secret_path`.
    pub fn admin_secret_path(&self) -> &Path {
        &self.admin_secret_path
    }

    /// log4rs YAML config.
    /// Configured via `log_config`.
    pub fn log_config(&self) -> &Path {
        &self.log_config
    }

    /// The file-backed stores described by this config.
    pub fn stores(&self) -> FileStores {
        FileStores::open(&self.roster_path, &self.candidates_path, &self.ledger_path)
    }

    /// Load the admin secret and build the gate around it.
    pub fn admin_gate(&self) -> Result<AdminGate> {
        Ok(AdminGate::new(AdminSecret::load(&self.admin_secret_path)?))
    }
}
