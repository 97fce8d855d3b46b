//! Detects whether the document store deployment can run multi-document
//! transactions.
//!
//! The store reports its cluster topology; replicated and sharded
//! deployments support transactions, a single unreplicated node does not.
//! The answer is looked up on every call and never cached.

use crate::error::StoreError;
use crate::store::documents::DocumentStore;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterTopology {
    Single,
    ReplicaSet,
    Sharded,
}

impl ClusterTopology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::ReplicaSet => "replica_set",
            Self::Sharded => "sharded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "standalone" => Some(Self::Single),
            "replica_set" | "replicaset" => Some(Self::ReplicaSet),
            "sharded" => Some(Self::Sharded),
            _ => None,
        }
    }

    pub fn supports_transactions(&self) -> bool {
        matches!(self, Self::ReplicaSet | Self::Sharded)
    }
}

pub async fn supports_transactions(store: &DocumentStore) -> Result<bool, StoreError> {
    let topology = store.topology().await?;
    debug!(
        "document store reports topology {} (transactions: {})",
        topology.as_str(),
        topology.supports_transactions()
    );
    Ok(topology.supports_transactions())
}
