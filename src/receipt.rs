//! Receipt metadata attached to every governor log, and the composite
//! key fact records are stored under.

use alloy::primitives::B256;
use alloy::rpc::types::Log;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::LogError;

/// Where and when a log was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub block_number: u64,
    pub block_timestamp: Option<DateTime<Utc>>,
    pub tx_hash: B256,
    pub log_index: u64,
}

impl Receipt {
    pub const fn fact_id(&self) -> FactId {
        FactId {
            tx_hash: self.tx_hash,
            log_index: self.log_index,
        }
    }
}

impl TryFrom<&Log> for Receipt {
    type Error = LogError;

    fn try_from(log: &Log) -> Result<Self, Self::Error> {
        let tx_hash = log
            .transaction_hash
            .ok_or(LogError::MissingLogField("transaction_hash"))?;

        let log_index = log
            .log_index
            .ok_or(LogError::MissingLogField("log_index"))?;

        let block_number = log
            .block_number
            .ok_or(LogError::MissingLogField("block_number"))?;

        let block_timestamp = log.block_timestamp.and_then(|ts| {
            let Ok(ts_i64) = i64::try_from(ts) else {
                warn!(
                    "Block timestamp {ts} exceeds i64::MAX, dropping it for tx {tx_hash:#x} log_index {log_index}"
                );
                return None;
            };

            DateTime::from_timestamp(ts_i64, 0).or_else(|| {
                warn!(
                    "Invalid block timestamp {ts_i64}, dropping it for tx {tx_hash:#x} log_index {log_index}"
                );
                None
            })
        });

        Ok(Self {
            block_number,
            block_timestamp,
            tx_hash,
            log_index,
        })
    }
}

/// Identifies one log within the ledger. Two events of the same kind in
/// one transaction still get distinct ids through the log index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FactId {
    pub tx_hash: B256,
    pub log_index: u64,
}

impl fmt::Display for FactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}-{:#x}", self.tx_hash, self.log_index)
    }
}
