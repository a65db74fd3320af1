//! Derives DAO governance state (proposals, vote tallies, lifecycle
//! facts) from governor contract event logs.

pub mod bindings;
pub mod cli;
pub mod config;
pub mod entity;
mod error;
pub mod event;
mod indexer;
pub mod receipt;
pub mod reducer;
pub mod resolver;
pub mod store;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::setup_tracing;
pub use entity::{
    Dao, DaoId, Entity, EntityKey, EntityKind, Proposal, ProposalCanceledRecord,
    ProposalExecutedRecord, ProposalId, ProposalQueuedRecord, Support, VoteCastRecord,
};
pub use error::{IndexError, LogError};
pub use event::{GovernanceEvent, GovernanceLog};
pub use indexer::{Indexer, IndexerPolicy, Outcome, SkipReason};
pub use receipt::{FactId, Receipt};
pub use reducer::{CounterFloor, ReduceError};
pub use store::{EntityStore, MemoryStore, SqliteStore, StoreError};
