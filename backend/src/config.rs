//! Runtime configuration read from the environment.
//!
//! A `.env` file in the working directory is loaded first if present. Every
//! variable has a default, so a bare `cargo run` serves on `127.0.0.1:8080`
//! with both stores in the current directory.

use crate::store::capability::ClusterTopology;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

const ENV_HOST: &str = "CODECLASS_HOST";
const ENV_PORT: &str = "CODECLASS_PORT";
const ENV_DOCUMENT_DB: &str = "CODECLASS_DOCUMENT_DB";
const ENV_RELATIONAL_DB: &str = "CODECLASS_RELATIONAL_DB";
const ENV_TOPOLOGY: &str = "CODECLASS_DOCUMENT_TOPOLOGY";
const ENV_JSON_LIMIT_MB: &str = "CODECLASS_JSON_LIMIT_MB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value '{value}': {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// SQLite file backing the document store.
    pub document_db: PathBuf,
    /// SQLite file backing the relational store.
    pub relational_db: PathBuf,
    /// Topology the document store reports to the capability detector.
    pub topology: ClusterTopology,
    /// Maximum accepted JSON body, in bytes.
    pub json_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            document_db: PathBuf::from("documents.sqlite"),
            relational_db: PathBuf::from("relational.sqlite"),
            topology: ClusterTopology::ReplicaSet,
            json_limit: 10 * 1024 * 1024,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(host) = lookup(ENV_HOST) {
            config.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            config.port = port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: ENV_PORT,
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(path) = lookup(ENV_DOCUMENT_DB) {
            config.document_db = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_RELATIONAL_DB) {
            config.relational_db = PathBuf::from(path);
        }
        if let Some(topology) = lookup(ENV_TOPOLOGY) {
            config.topology =
                ClusterTopology::parse(&topology).ok_or_else(|| ConfigError::Invalid {
                    name: ENV_TOPOLOGY,
                    value: topology.clone(),
                    reason: "expected single, replica_set or sharded".to_string(),
                })?;
        }
        if let Some(limit) = lookup(ENV_JSON_LIMIT_MB) {
            let mb: usize = limit.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    name: ENV_JSON_LIMIT_MB,
                    value: limit.clone(),
                    reason: e.to_string(),
                }
            })?;
            config.json_limit = mb
                .checked_mul(1024 * 1024)
                .ok_or_else(|| ConfigError::Invalid {
                    name: ENV_JSON_LIMIT_MB,
                    value: limit.clone(),
                    reason: "limit is too large".to_string(),
                })?;
        }

        Ok(config)
    }

    pub fn bind_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.topology, ClusterTopology::ReplicaSet);
        assert_eq!(config.json_limit, 10 * 1024 * 1024);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            (ENV_PORT, "9000"),
            (ENV_TOPOLOGY, "single"),
            (ENV_DOCUMENT_DB, "/tmp/docs.sqlite"),
            (ENV_JSON_LIMIT_MB, "2"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.topology, ClusterTopology::Single);
        assert_eq!(config.document_db, PathBuf::from("/tmp/docs.sqlite"));
        assert_eq!(config.json_limit, 2 * 1024 * 1024);
        assert_eq!(config.bind_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn rejects_bad_topology() {
        let err = Config::from_lookup(lookup_from(&[(ENV_TOPOLOGY, "cluster")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TOPOLOGY));
    }

    #[test]
    fn rejects_bad_port() {
        assert!(Config::from_lookup(lookup_from(&[(ENV_PORT, "http")])).is_err());
    }

    #[test]
    fn rejects_json_limit_that_overflows() {
        let huge = (usize::MAX / 1024).to_string();
        let err = Config::from_lookup(lookup_from(&[(ENV_JSON_LIMIT_MB, huge.as_str())])).unwrap_err();
        assert!(err.to_string().contains(ENV_JSON_LIMIT_MB));
    }
}
