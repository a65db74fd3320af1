//! Shared test fixtures: database setup, stub logs and receipts, and a
//! builder for proposals.

use alloy::primitives::{Address, LogData, U256, address, bytes, fixed_bytes, uint};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use sqlx::SqlitePool;

use crate::entity::{DaoId, Proposal, ProposalId};
use crate::event::ProposalCreation;
use crate::receipt::Receipt;

/// Governor contract all fixture logs are emitted from.
pub(crate) const DAO_ADDRESS: Address = address!("0x00000000000000000000000000000000000000d0");

/// Creates a generic `Log` stub with the supplied log index. The payload
/// is empty, so it decodes as no governor event.
pub(crate) fn create_log(log_index: u64) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: address!("0xfefefefefefefefefefefefefefefefefefefefe"),
            data: LogData::empty(),
        },
        block_hash: None,
        block_number: Some(12345),
        block_timestamp: None,
        transaction_hash: Some(fixed_bytes!(
            "0xbeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
        )),
        transaction_index: None,
        log_index: Some(log_index),
        removed: false,
    }
}

/// Wraps an encoded governor event in a log emitted by [`DAO_ADDRESS`].
pub(crate) fn log_for<E: SolEvent>(event: &E, log_index: u64) -> Log {
    let mut log = create_log(log_index);
    log.inner = alloy::primitives::Log {
        address: DAO_ADDRESS,
        data: event.encode_log_data(),
    };
    log.block_timestamp = Some(1_700_000_000);
    log
}

pub(crate) fn test_receipt(log_index: u64) -> Receipt {
    Receipt {
        block_number: 12345,
        block_timestamp: None,
        tx_hash: fixed_bytes!(
            "0xbeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
        ),
        log_index,
    }
}

/// The creation event used throughout the scenarios: one call to
/// `0x..b1` worth 100 with selector `f()`.
pub(crate) fn test_creation(id: u64) -> ProposalCreation {
    ProposalCreation {
        proposal_id: ProposalId::from(id),
        proposer: address!("0x00000000000000000000000000000000000000a1"),
        targets: vec![address!("0x00000000000000000000000000000000000000b1")],
        values: vec![uint!(100_U256)],
        signatures: vec!["f()".to_string()],
        calldatas: vec![bytes!("0x1234")],
        start_block: uint!(10_U256),
        end_block: uint!(20_U256),
        description: "test".to_string(),
    }
}

/// Builder for stored proposals with empty tallies.
pub(crate) struct ProposalBuilder {
    proposal: Proposal,
}

impl ProposalBuilder {
    pub(crate) fn new(id: u64) -> Self {
        let creation = test_creation(id);

        Self {
            proposal: Proposal {
                id: creation.proposal_id,
                dao: DaoId(DAO_ADDRESS),
                proposer: creation.proposer,
                targets: creation.targets,
                values: creation.values,
                signatures: creation.signatures,
                calldatas: creation.calldatas,
                start_block: creation.start_block,
                end_block: creation.end_block,
                description: creation.description,
                created: test_receipt(0),
                votes_for: U256::ZERO,
                votes_against: U256::ZERO,
                votes_abstain: U256::ZERO,
                total_votes: U256::ZERO,
                voters: Vec::new(),
            },
        }
    }

    #[must_use]
    pub(crate) fn with_dao(mut self, dao: DaoId) -> Self {
        self.proposal.dao = dao;
        self
    }

    pub(crate) fn build(self) -> Proposal {
        self.proposal
    }
}

/// In-memory SQLite database with all migrations applied.
pub(crate) async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}
