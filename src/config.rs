use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, ensure};
use tracing::info;

use crate::store::seed::{default_seed, load_seed};
use crate::store::{EntityStore, StoreConfig};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_FILE_LOG_FILTER: &str = "info";
pub const LOG_FILE_NAME: &str = "hierarchy_explorer.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerSettings {
    pub seed_path: Option<PathBuf>,
    pub allow_user_delete: bool,
    pub bind_addr: String,
    pub log_dir: Option<PathBuf>,
    pub file_log_filter: String,
}

impl Default for ExplorerSettings {
    fn default() -> Self {
        Self {
            seed_path: None,
            allow_user_delete: false,
            bind_addr: DEFAULT_BIND_ADDR.to_owned(),
            log_dir: None,
            file_log_filter: DEFAULT_FILE_LOG_FILTER.to_owned(),
        }
    }
}

impl ExplorerSettings {
    pub fn from_env() -> Result<Self> {
        // Load .env if present, but do not fail if file does not exist.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let read = |name: &str| read_optional(lookup(name));

        let seed_path = read("HIERARCHY_SEED_PATH").map(PathBuf::from);
        let allow_user_delete = match read("HIERARCHY_ALLOW_USER_DELETE") {
            Some(raw) => parse_bool("HIERARCHY_ALLOW_USER_DELETE", &raw)?,
            None => false,
        };

        let bind_addr = read("HIERARCHY_BIND").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
        ensure!(
            bind_addr.contains(':'),
            "HIERARCHY_BIND `{bind_addr}` must be a host:port address"
        );

        let log_dir = read("HIERARCHY_LOG_DIR").map(PathBuf::from);
        let file_log_filter =
            read("HIERARCHY_FILE_LOG").unwrap_or_else(|| DEFAULT_FILE_LOG_FILTER.to_owned());

        Ok(Self {
            seed_path,
            allow_user_delete,
            bind_addr,
            log_dir,
            file_log_filter,
        })
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            allow_user_delete: self.allow_user_delete,
        }
    }

    pub fn load_store(&self) -> Result<EntityStore> {
        let seed = match &self.seed_path {
            Some(path) => {
                info!(path = %path.display(), "loading seed file");
                load_seed(path)?
            }
            None => default_seed(),
        };
        EntityStore::from_seed(&seed, self.store_config()).context("failed to build entity store")
    }
}

fn read_optional(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(anyhow!(
            "invalid {name} `{other}`; expected true/false, 1/0 or yes/no"
        )),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;

    use crate::model::EntityKind;
    use crate::test_support::{discard_scratch_dir, scratch_dir};

    use super::{DEFAULT_BIND_ADDR, ExplorerSettings};

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let settings = settings_from(&[]).expect("empty env should load");
        assert_eq!(settings, ExplorerSettings::default());
        assert_eq!(settings.bind_addr, DEFAULT_BIND_ADDR);
        assert!(!settings.store_config().allow_user_delete);
    }

    #[test]
    fn reads_every_variable_and_treats_blank_as_unset() {
        let settings = settings_from(&[
            ("HIERARCHY_SEED_PATH", "/tmp/seed.yaml"),
            ("HIERARCHY_ALLOW_USER_DELETE", " Yes "),
            ("HIERARCHY_BIND", "0.0.0.0:9000"),
            ("HIERARCHY_LOG_DIR", "   "),
            ("HIERARCHY_FILE_LOG", "debug"),
        ])
        .expect("env should load");

        assert_eq!(settings.seed_path, Some(PathBuf::from("/tmp/seed.yaml")));
        assert!(settings.allow_user_delete);
        assert_eq!(settings.bind_addr, "0.0.0.0:9000");
        assert_eq!(settings.log_dir, None);
        assert_eq!(settings.file_log_filter, "debug");
    }

    #[test]
    fn rejects_invalid_values() {
        let error = settings_from(&[("HIERARCHY_ALLOW_USER_DELETE", "maybe")])
            .expect_err("unknown boolean should fail");
        assert!(error.to_string().contains("HIERARCHY_ALLOW_USER_DELETE"));

        let error = settings_from(&[("HIERARCHY_BIND", "localhost")])
            .expect_err("missing port should fail");
        assert!(error.to_string().contains("HIERARCHY_BIND"));
    }

    #[test]
    fn load_store_uses_seed_file_and_delete_policy() {
        let dir = scratch_dir("config-seed").expect("seed dir should be created");
        let path = dir.join("seed.yaml");
        fs::write(
            &path,
            "users:\n  - id: u1\n    name: Ada\n    userGroups: [g1]\nuserGroups:\n  - id: g1\n    name: Ops\n",
        )
        .expect("seed should be written");

        let settings = ExplorerSettings {
            seed_path: Some(path),
            allow_user_delete: true,
            ..ExplorerSettings::default()
        };
        let mut store = settings.load_store().expect("store should load");
        assert_eq!(store.count(EntityKind::User), 1);
        store
            .delete(EntityKind::User, "u1")
            .expect("user delete should be allowed");

        discard_scratch_dir(&dir);
    }

    #[test]
    fn load_store_without_seed_path_uses_built_in_seed() {
        let store = ExplorerSettings::default()
            .load_store()
            .expect("built-in seed should load");
        assert_eq!(store.count(EntityKind::Role), 3);
    }

    fn settings_from(vars: &[(&str, &str)]) -> anyhow::Result<ExplorerSettings> {
        let vars = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect::<HashMap<_, _>>();
        ExplorerSettings::from_lookup(|name| vars.get(name).cloned())
    }
}
