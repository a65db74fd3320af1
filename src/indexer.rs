//! Applies governor events to the entity store, one at a time and in
//! ledger order.
//!
//! Each event is handled to completion before the caller offers the next
//! one. Events that reference state the indexer has never seen (a vote
//! on an unknown proposal, an execution for an unknown DAO) are skipped
//! without side effects so that indexing can start mid-history.

use alloy::primitives::{Address, U256};
use alloy::rpc::types::Log;
use tracing::{error, info, warn};

use crate::entity::{
    Dao, DaoId, EntityKey, Proposal, ProposalCanceledRecord, ProposalExecutedRecord, ProposalId,
    ProposalQueuedRecord, Stored, VoteCastRecord,
};
use crate::error::IndexError;
use crate::event::{GovernanceEvent, GovernanceLog, ProposalCreation, Vote};
use crate::receipt::{FactId, Receipt};
use crate::reducer::{self, CounterFloor, ReduceError};
use crate::resolver::{exists, load, load_or_zero, resolve, save};
use crate::store::EntityStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexerPolicy {
    /// When set, logs from any other contract are skipped.
    pub governor: Option<Address>,
    /// Skip events whose fact record is already stored instead of
    /// counting them a second time.
    pub redelivery_guard: bool,
    pub counter_floor: CounterFloor,
}

impl Default for IndexerPolicy {
    fn default() -> Self {
        Self {
            governor: None,
            redelivery_guard: true,
            counter_floor: CounterFloor::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NotGovernanceEvent,
    ForeignEmitter(DaoId),
    UnknownProposal(ProposalId),
    UnknownDao(DaoId),
    Redelivered(FactId),
    Rejected(ReduceError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The event was applied; carries the key of the entity it produced
    /// (the proposal for creations, the fact record otherwise).
    Applied(EntityKey),
    Skipped(SkipReason),
}

impl From<SkipReason> for Outcome {
    fn from(reason: SkipReason) -> Self {
        Self::Skipped(reason)
    }
}

pub struct Indexer<S> {
    store: S,
    policy: IndexerPolicy,
}

impl<S: EntityStore> Indexer<S> {
    pub const fn new(store: S, policy: IndexerPolicy) -> Self {
        Self { store, policy }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn policy(&self) -> &IndexerPolicy {
        &self.policy
    }

    /// Decodes and applies one RPC log. Logs that are not governor events
    /// are skipped.
    pub async fn apply_log(&self, log: &Log) -> Result<Outcome, IndexError> {
        let Some(governance_log) = GovernanceLog::try_from_log(log)? else {
            return Ok(SkipReason::NotGovernanceEvent.into());
        };

        self.apply(&governance_log).await
    }

    #[tracing::instrument(
        skip_all,
        fields(
            event = log.event.name(),
            dao = %log.dao,
            proposal = %log.event.proposal_id(),
            tx_hash = %log.receipt.tx_hash,
            log_index = log.receipt.log_index,
        ),
        level = tracing::Level::DEBUG,
    )]
    pub async fn apply(&self, log: &GovernanceLog) -> Result<Outcome, IndexError> {
        if let Some(governor) = self.policy.governor
            && governor != log.dao.0
        {
            return Ok(skipped(SkipReason::ForeignEmitter(log.dao)));
        }

        let GovernanceLog {
            dao,
            receipt,
            event,
        } = log;

        let outcome = match event {
            GovernanceEvent::ProposalCreated(creation) => {
                self.create_proposal(*dao, *receipt, creation).await?
            }
            GovernanceEvent::VoteCast(vote) => self.cast_vote(*dao, *receipt, vote).await?,
            GovernanceEvent::ProposalCanceled { proposal_id } => {
                self.cancel_proposal(*dao, *receipt, *proposal_id).await?
            }
            GovernanceEvent::ProposalQueued { proposal_id, eta } => {
                self.queue_proposal(*dao, *receipt, *proposal_id, *eta)
                    .await?
            }
            GovernanceEvent::ProposalExecuted { proposal_id } => {
                self.execute_proposal(*dao, *receipt, *proposal_id).await?
            }
        };

        match outcome {
            Outcome::Applied(key) => {
                info!(%key, "Applied {}", event.name());
                Ok(Outcome::Applied(key))
            }
            Outcome::Skipped(reason) => Ok(skipped(reason)),
        }
    }

    /// True when the guard is on and a fact of kind `A` already exists for
    /// this log.
    async fn already_recorded<A: Stored<Id = FactId>>(
        &self,
        receipt: &Receipt,
    ) -> Result<bool, IndexError> {
        if !self.policy.redelivery_guard {
            return Ok(false);
        }

        Ok(exists(&self.store, &A::key_for(&receipt.fact_id())).await?)
    }

    async fn create_proposal(
        &self,
        dao_id: DaoId,
        receipt: Receipt,
        creation: &ProposalCreation,
    ) -> Result<Outcome, IndexError> {
        let previous = load::<Proposal, _>(&self.store, &creation.proposal_id).await?;

        if self.policy.redelivery_guard
            && let Some(previous) = &previous
            && previous.created.fact_id() == receipt.fact_id()
        {
            return Ok(SkipReason::Redelivered(receipt.fact_id()).into());
        }

        let mut dao = load_or_zero::<Dao, _>(&self.store, &dao_id).await?;

        let proposal =
            match reducer::proposal_created(&mut dao, previous.as_ref(), creation, receipt) {
                Ok(proposal) => proposal,
                Err(err) => return Ok(SkipReason::Rejected(err).into()),
            };

        let mut previous_owner = None;
        if let Some(previous) = &previous {
            warn!(
                proposal = %creation.proposal_id,
                "Proposal created again, overwriting stored fields and tallies"
            );

            if previous.dao != dao_id
                && let Some(mut owner) = load::<Dao, _>(&self.store, &previous.dao).await?
            {
                if reducer::proposal_released(&mut owner) {
                    warn!(
                        dao = %owner.id,
                        proposal = %creation.proposal_id,
                        "Previous owner had no proposals to subtract, kept total_proposals at zero"
                    );
                }
                previous_owner = Some(owner);
            }
        }

        let key = proposal.key();
        save(&self.store, proposal).await?;
        save(&self.store, dao).await?;
        if let Some(owner) = previous_owner {
            save(&self.store, owner).await?;
        }

        Ok(Outcome::Applied(key))
    }

    async fn cast_vote(
        &self,
        dao_id: DaoId,
        receipt: Receipt,
        vote: &Vote,
    ) -> Result<Outcome, IndexError> {
        let Some(mut proposal) = load::<Proposal, _>(&self.store, &vote.proposal_id).await? else {
            return Ok(SkipReason::UnknownProposal(vote.proposal_id).into());
        };

        if self.already_recorded::<VoteCastRecord>(&receipt).await? {
            return Ok(SkipReason::Redelivered(receipt.fact_id()).into());
        }

        let mut dao = load_or_zero::<Dao, _>(&self.store, &dao_id).await?;

        let record = match reducer::vote_cast(&mut proposal, &mut dao, vote, receipt) {
            Ok(record) => record,
            Err(err) => return Ok(SkipReason::Rejected(err).into()),
        };

        let key = record.key();
        save(&self.store, proposal).await?;
        save(&self.store, dao).await?;
        save(&self.store, record).await?;

        Ok(Outcome::Applied(key))
    }

    async fn cancel_proposal(
        &self,
        dao_id: DaoId,
        receipt: Receipt,
        proposal_id: ProposalId,
    ) -> Result<Outcome, IndexError> {
        let Some(proposal) = load::<Proposal, _>(&self.store, &proposal_id).await? else {
            return Ok(SkipReason::UnknownProposal(proposal_id).into());
        };

        if self
            .already_recorded::<ProposalCanceledRecord>(&receipt)
            .await?
        {
            return Ok(SkipReason::Redelivered(receipt.fact_id()).into());
        }

        let mut dao = load_or_zero::<Dao, _>(&self.store, &dao_id).await?;

        let record = match reducer::proposal_canceled(
            &mut dao,
            &proposal,
            receipt,
            self.policy.counter_floor,
        ) {
            Ok(record) => record,
            Err(err) => return Ok(SkipReason::Rejected(err).into()),
        };

        if record.counter_clamped {
            warn!(
                dao = %dao.id,
                proposal = %proposal_id,
                "Cancellation found no proposals to subtract, clamped total_proposals at zero"
            );
        }

        let key = record.key();
        save(&self.store, dao).await?;
        save(&self.store, record).await?;

        Ok(Outcome::Applied(key))
    }

    async fn queue_proposal(
        &self,
        dao_id: DaoId,
        receipt: Receipt,
        proposal_id: ProposalId,
        eta: U256,
    ) -> Result<Outcome, IndexError> {
        let Some(proposal) = load::<Proposal, _>(&self.store, &proposal_id).await? else {
            return Ok(SkipReason::UnknownProposal(proposal_id).into());
        };

        if self
            .already_recorded::<ProposalQueuedRecord>(&receipt)
            .await?
        {
            return Ok(SkipReason::Redelivered(receipt.fact_id()).into());
        }

        let dao = resolve::<Dao, _>(&self.store, &dao_id).await?;
        let record = reducer::proposal_queued(&dao, &proposal, eta, receipt);

        let key = record.key();
        save(&self.store, record).await?;

        Ok(Outcome::Applied(key))
    }

    async fn execute_proposal(
        &self,
        dao_id: DaoId,
        receipt: Receipt,
        proposal_id: ProposalId,
    ) -> Result<Outcome, IndexError> {
        let Some(proposal) = load::<Proposal, _>(&self.store, &proposal_id).await? else {
            return Ok(SkipReason::UnknownProposal(proposal_id).into());
        };

        if self
            .already_recorded::<ProposalExecutedRecord>(&receipt)
            .await?
        {
            return Ok(SkipReason::Redelivered(receipt.fact_id()).into());
        }

        let Some(dao) = load::<Dao, _>(&self.store, &dao_id).await? else {
            return Ok(SkipReason::UnknownDao(dao_id).into());
        };

        let record = reducer::proposal_executed(&dao, &proposal, receipt);

        let key = record.key();
        save(&self.store, record).await?;

        Ok(Outcome::Applied(key))
    }
}

/// Logs why an event was skipped, louder for anomalies.
fn skipped(reason: SkipReason) -> Outcome {
    match &reason {
        SkipReason::NotGovernanceEvent => {}
        SkipReason::ForeignEmitter(dao) => {
            info!(%dao, "Skipping event from non-governor contract");
        }
        SkipReason::UnknownProposal(proposal) => {
            info!(%proposal, "Skipping event for unknown proposal");
        }
        SkipReason::UnknownDao(dao) => info!(%dao, "Skipping event for unknown DAO"),
        SkipReason::Redelivered(fact) => {
            warn!(%fact, "Skipping redelivered event, fact record already stored");
        }
        SkipReason::Rejected(err @ ReduceError::Overflow { .. }) => {
            error!("Rejecting event: {err}");
        }
        SkipReason::Rejected(err) => warn!("Rejecting event: {err}"),
    }

    Outcome::Skipped(reason)
}
