//! Pure state transitions, one per governor event kind.
//!
//! Reducers take the current aggregates plus one event and return the
//! next state and any fact record. They never touch the store and leave
//! their inputs unchanged when they return an error.

use alloy::primitives::U256;
use serde::Deserialize;

use crate::entity::{
    Dao, Proposal, ProposalCanceledRecord, ProposalExecutedRecord, ProposalQueuedRecord, Support,
    VoteCastRecord,
};
use crate::event::{ProposalCreation, Vote};
use crate::receipt::Receipt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReduceError {
    #[error("{field} overflowed U256")]
    Overflow { field: &'static str },
    #[error(
        "Call arrays differ in length: targets={targets}, values={values}, \
         signatures={signatures}, calldatas={calldatas}"
    )]
    MismatchedCallArrays {
        targets: usize,
        values: usize,
        signatures: usize,
        calldatas: usize,
    },
    #[error("Cancellation would take the DAO proposal count below zero")]
    CounterUnderflow,
}

/// What to do when a cancellation finds the DAO proposal counter already
/// at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CounterFloor {
    /// Keep the counter at zero and flag the cancellation record.
    #[default]
    Clamp,
    /// Drop the cancellation entirely.
    Reject,
}

fn increment(value: U256, field: &'static str) -> Result<U256, ReduceError> {
    value
        .checked_add(U256::from(1))
        .ok_or(ReduceError::Overflow { field })
}

fn add(value: U256, amount: U256, field: &'static str) -> Result<U256, ReduceError> {
    value
        .checked_add(amount)
        .ok_or(ReduceError::Overflow { field })
}

/// Builds the proposal from its creation event with empty tallies.
/// `previous` is the record already stored under the same id, if any; it
/// is replaced wholesale. The DAO counter is bumped unless `previous`
/// already belonged to this DAO. A previous owner that is a different DAO
/// gives the proposal up through [`proposal_released`].
pub fn proposal_created(
    dao: &mut Dao,
    previous: Option<&Proposal>,
    creation: &ProposalCreation,
    receipt: Receipt,
) -> Result<Proposal, ReduceError> {
    let lengths = (
        creation.targets.len(),
        creation.values.len(),
        creation.signatures.len(),
        creation.calldatas.len(),
    );

    if !(lengths.0 == lengths.1 && lengths.1 == lengths.2 && lengths.2 == lengths.3) {
        return Err(ReduceError::MismatchedCallArrays {
            targets: lengths.0,
            values: lengths.1,
            signatures: lengths.2,
            calldatas: lengths.3,
        });
    }

    if previous.is_none_or(|previous| previous.dao != dao.id) {
        dao.total_proposals = increment(dao.total_proposals, "total_proposals")?;
    }

    Ok(Proposal {
        id: creation.proposal_id,
        dao: dao.id,
        proposer: creation.proposer,
        targets: creation.targets.clone(),
        values: creation.values.clone(),
        signatures: creation.signatures.clone(),
        calldatas: creation.calldatas.clone(),
        start_block: creation.start_block,
        end_block: creation.end_block,
        description: creation.description.clone(),
        created: receipt,
        votes_for: U256::ZERO,
        votes_against: U256::ZERO,
        votes_abstain: U256::ZERO,
        total_votes: U256::ZERO,
        voters: Vec::new(),
    })
}

/// Takes a proposal off the counter of the DAO that no longer owns it.
/// Returns true when the counter was already zero and stays there.
pub fn proposal_released(previous_owner: &mut Dao) -> bool {
    match previous_owner.total_proposals.checked_sub(U256::from(1)) {
        Some(decremented) => {
            previous_owner.total_proposals = decremented;
            false
        }
        None => true,
    }
}

/// Counts one vote. Unknown support codes still register the voter and
/// produce a record but leave every tally untouched.
pub fn vote_cast(
    proposal: &mut Proposal,
    dao: &mut Dao,
    vote: &Vote,
    receipt: Receipt,
) -> Result<VoteCastRecord, ReduceError> {
    let mut votes_for = proposal.votes_for;
    let mut votes_against = proposal.votes_against;
    let mut votes_abstain = proposal.votes_abstain;
    let mut total_votes = proposal.total_votes;

    if let Some(support) = Support::from_code(vote.support) {
        match support {
            Support::Against => votes_against = add(votes_against, vote.votes, "votes_against")?,
            Support::For => votes_for = add(votes_for, vote.votes, "votes_for")?,
            Support::Abstain => votes_abstain = add(votes_abstain, vote.votes, "votes_abstain")?,
        }
        total_votes = add(total_votes, vote.votes, "total_votes")?;
    }

    let total_votes_cast = increment(dao.total_votes_cast, "total_votes_cast")?;

    if !proposal.has_voted(&vote.voter) {
        proposal.voters.push(vote.voter);
    }
    proposal.votes_for = votes_for;
    proposal.votes_against = votes_against;
    proposal.votes_abstain = votes_abstain;
    proposal.total_votes = total_votes;
    dao.total_votes_cast = total_votes_cast;

    Ok(VoteCastRecord {
        id: receipt.fact_id(),
        voter: vote.voter,
        proposal: proposal.id,
        dao: dao.id,
        support: vote.support,
        votes: vote.votes,
        reason: vote.reason.clone(),
        receipt,
    })
}

pub fn proposal_canceled(
    dao: &mut Dao,
    proposal: &Proposal,
    receipt: Receipt,
    floor: CounterFloor,
) -> Result<ProposalCanceledRecord, ReduceError> {
    let counter_clamped = match dao.total_proposals.checked_sub(U256::from(1)) {
        Some(decremented) => {
            dao.total_proposals = decremented;
            false
        }
        None => match floor {
            CounterFloor::Clamp => true,
            CounterFloor::Reject => return Err(ReduceError::CounterUnderflow),
        },
    };

    Ok(ProposalCanceledRecord {
        id: receipt.fact_id(),
        proposal: proposal.id,
        dao: dao.id,
        counter_clamped,
        receipt,
    })
}

pub fn proposal_queued(
    dao: &Dao,
    proposal: &Proposal,
    eta: U256,
    receipt: Receipt,
) -> ProposalQueuedRecord {
    ProposalQueuedRecord {
        id: receipt.fact_id(),
        proposal: proposal.id,
        dao: dao.id,
        eta,
        receipt,
    }
}

pub fn proposal_executed(dao: &Dao, proposal: &Proposal, receipt: Receipt) -> ProposalExecutedRecord {
    ProposalExecutedRecord {
        id: receipt.fact_id(),
        proposal: proposal.id,
        dao: dao.id,
        receipt,
    }
}
