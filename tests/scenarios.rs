//! End-to-end scenarios: ABI-encoded governor logs applied through the
//! indexer onto an in-memory SQLite store.

use alloy::primitives::{Address, B256, LogData, U256, address, bytes};
use alloy::rpc::types::Log;
use alloy::sol_types::SolEvent;
use sqlx::SqlitePool;

use governance_indexer::bindings::IGovernorBravo::{
    ProposalCanceled, ProposalCreated, ProposalExecuted, ProposalQueued, VoteCast,
};
use governance_indexer::resolver::{exists, load};
use governance_indexer::{
    Dao, DaoId, EntityKey, EntityKind, FactId, Indexer, IndexerPolicy, Outcome, Proposal,
    ProposalCanceledRecord, ProposalId, Receipt, SkipReason, SqliteStore, VoteCastRecord,
};

const GOVERNOR: Address = address!("0x00000000000000000000000000000000000000d0");
const PROPOSER: Address = address!("0x00000000000000000000000000000000000000a1");
const TARGET: Address = address!("0x00000000000000000000000000000000000000b1");
const VOTER: Address = address!("0x00000000000000000000000000000000000000c1");

async fn indexer() -> Indexer<SqliteStore> {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    Indexer::new(SqliteStore::new(pool), IndexerPolicy::default())
}

/// Each block carries a single governor log in its own transaction.
fn log_at<E: SolEvent>(event: &E, block: u64) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: GOVERNOR,
            data: event.encode_log_data(),
        },
        block_hash: None,
        block_number: Some(block),
        block_timestamp: Some(1_700_000_000 + block * 12),
        transaction_hash: Some(B256::with_last_byte(u8::try_from(block).unwrap())),
        transaction_index: Some(0),
        log_index: Some(0),
        removed: false,
    }
}

fn fact_id(log: &Log) -> FactId {
    Receipt::try_from(log).unwrap().fact_id()
}

fn creation(id: u64) -> ProposalCreated {
    ProposalCreated {
        id: U256::from(id),
        proposer: PROPOSER,
        targets: vec![TARGET],
        values: vec![U256::from(100)],
        signatures: vec!["f()".to_string()],
        calldatas: vec![bytes!("0x1234")],
        startBlock: U256::from(10),
        endBlock: U256::from(20),
        description: "test".to_string(),
    }
}

fn vote(proposal: u64, support: u8, votes: u64) -> VoteCast {
    VoteCast {
        voter: VOTER,
        proposalId: U256::from(proposal),
        support,
        votes: U256::from(votes),
        reason: String::new(),
    }
}

async fn proposal(indexer: &Indexer<SqliteStore>, id: u64) -> Proposal {
    load::<Proposal, _>(indexer.store(), &ProposalId::from(id))
        .await
        .unwrap()
        .unwrap()
}

async fn dao(indexer: &Indexer<SqliteStore>) -> Dao {
    load::<Dao, _>(indexer.store(), &DaoId(GOVERNOR))
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn creation_persists_proposal_and_counts_it() {
    let indexer = indexer().await;

    let outcome = indexer.apply_log(&log_at(&creation(1), 1)).await.unwrap();
    assert!(matches!(outcome, Outcome::Applied(ref key) if key.kind == EntityKind::Proposal));

    let proposal = proposal(&indexer, 1).await;
    assert_eq!(proposal.dao, DaoId(GOVERNOR));
    assert_eq!(proposal.proposer, PROPOSER);
    assert_eq!(proposal.targets, vec![TARGET]);
    assert_eq!(proposal.values, vec![U256::from(100)]);
    assert_eq!(proposal.signatures, vec!["f()".to_string()]);
    assert_eq!(proposal.calldatas, vec![bytes!("0x1234")]);
    assert_eq!(proposal.start_block, U256::from(10));
    assert_eq!(proposal.end_block, U256::from(20));
    assert_eq!(proposal.description, "test");
    assert_eq!(proposal.votes_for, U256::ZERO);
    assert_eq!(proposal.votes_against, U256::ZERO);
    assert_eq!(proposal.votes_abstain, U256::ZERO);
    assert!(proposal.voters.is_empty());

    let dao = dao(&indexer).await;
    assert_eq!(dao.id.to_string(), "0x00000000000000000000000000000000000000d0");
    assert_eq!(dao.total_proposals, U256::from(1));
    assert_eq!(dao.total_votes_cast, U256::ZERO);
}

#[tokio::test]
async fn repeat_voter_accumulates_weight_but_counts_once() {
    let indexer = indexer().await;
    indexer.apply_log(&log_at(&creation(1), 1)).await.unwrap();

    indexer.apply_log(&log_at(&vote(1, 1, 50), 2)).await.unwrap();

    let after_first = proposal(&indexer, 1).await;
    assert_eq!(after_first.votes_for, U256::from(50));
    assert_eq!(after_first.voters, vec![VOTER]);
    assert_eq!(dao(&indexer).await.total_votes_cast, U256::from(1));

    indexer.apply_log(&log_at(&vote(1, 1, 25), 3)).await.unwrap();

    let after_second = proposal(&indexer, 1).await;
    assert_eq!(after_second.votes_for, U256::from(75));
    assert_eq!(after_second.votes_against, U256::ZERO);
    assert_eq!(after_second.voters, vec![VOTER]);
    assert_eq!(after_second.average_votes_per_voter(), U256::from(75));
    assert_eq!(dao(&indexer).await.total_votes_cast, U256::from(2));

    let counts = indexer.store().count_by_kind().await.unwrap();
    assert_eq!(
        counts,
        vec![
            ("dao".to_string(), 1),
            ("proposal".to_string(), 1),
            ("vote_cast".to_string(), 2),
        ]
    );
}

#[tokio::test]
async fn cancellation_decrements_and_unknown_proposal_is_ignored() {
    let indexer = indexer().await;
    indexer.apply_log(&log_at(&creation(1), 1)).await.unwrap();

    let cancel = log_at(&ProposalCanceled { id: U256::from(1) }, 2);
    indexer.apply_log(&cancel).await.unwrap();
    assert_eq!(dao(&indexer).await.total_proposals, U256::ZERO);

    let record_key = EntityKey::new(EntityKind::ProposalCanceled, fact_id(&cancel));
    assert!(exists(indexer.store(), &record_key).await.unwrap());

    let unknown = log_at(&ProposalCanceled { id: U256::from(99) }, 3);
    let outcome = indexer.apply_log(&unknown).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::UnknownProposal(ProposalId::from(99)))
    );
    assert_eq!(dao(&indexer).await.total_proposals, U256::ZERO);
    assert!(
        load::<ProposalCanceledRecord, _>(indexer.store(), &fact_id(&unknown))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn full_lifecycle_records_every_fact() {
    let indexer = indexer().await;

    indexer.apply_log(&log_at(&creation(7), 1)).await.unwrap();
    indexer.apply_log(&log_at(&vote(7, 0, 10), 2)).await.unwrap();
    indexer
        .apply_log(&log_at(
            &ProposalQueued {
                id: U256::from(7),
                eta: U256::from(1_800_000_000),
            },
            3,
        ))
        .await
        .unwrap();
    indexer
        .apply_log(&log_at(&ProposalExecuted { id: U256::from(7) }, 4))
        .await
        .unwrap();

    let proposal = proposal(&indexer, 7).await;
    assert_eq!(proposal.votes_against, U256::from(10));

    let dao = dao(&indexer).await;
    assert_eq!(dao.total_proposals, U256::from(1));
    assert_eq!(dao.total_votes_cast, U256::from(1));

    let counts = indexer.store().count_by_kind().await.unwrap();
    assert_eq!(
        counts,
        vec![
            ("dao".to_string(), 1),
            ("proposal".to_string(), 1),
            ("proposal_executed".to_string(), 1),
            ("proposal_queued".to_string(), 1),
            ("vote_cast".to_string(), 1),
        ]
    );
}

#[tokio::test]
async fn redelivered_vote_is_not_counted_twice() {
    let indexer = indexer().await;
    indexer.apply_log(&log_at(&creation(1), 1)).await.unwrap();

    let ballot = log_at(&vote(1, 1, 50), 2);
    indexer.apply_log(&ballot).await.unwrap();
    let outcome = indexer.apply_log(&ballot).await.unwrap();

    assert!(matches!(
        outcome,
        Outcome::Skipped(SkipReason::Redelivered(_))
    ));
    assert_eq!(proposal(&indexer, 1).await.votes_for, U256::from(50));
    assert_eq!(dao(&indexer).await.total_votes_cast, U256::from(1));
}

#[tokio::test]
async fn vote_on_unknown_proposal_writes_nothing() {
    let indexer = indexer().await;

    let ballot = log_at(&vote(99, 1, 50), 1);
    let outcome = indexer.apply_log(&ballot).await.unwrap();

    assert_eq!(
        outcome,
        Outcome::Skipped(SkipReason::UnknownProposal(ProposalId::from(99)))
    );
    assert!(indexer.store().count_by_kind().await.unwrap().is_empty());
    assert!(
        load::<VoteCastRecord, _>(indexer.store(), &fact_id(&ballot))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn non_governor_log_is_skipped() {
    let indexer = indexer().await;
    let mut log = log_at(&creation(1), 1);
    log.inner.data = LogData::empty();

    let outcome = indexer.apply_log(&log).await.unwrap();

    assert_eq!(outcome, Outcome::Skipped(SkipReason::NotGovernanceEvent));
    assert!(indexer.store().count_by_kind().await.unwrap().is_empty());
}
