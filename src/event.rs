//! Inbound governor events and their decoding from RPC logs.

use alloy::primitives::{Address, Bytes, U256};
use alloy::rpc::types::Log;
use serde::{Deserialize, Serialize};

use crate::bindings::IGovernorBravo::{
    ProposalCanceled, ProposalCreated, ProposalExecuted, ProposalQueued, VoteCast,
};
use crate::entity::{DaoId, ProposalId};
use crate::error::LogError;
use crate::receipt::Receipt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCreation {
    pub proposal_id: ProposalId,
    pub proposer: Address,
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<Bytes>,
    pub start_block: U256,
    pub end_block: U256,
    pub description: String,
}

impl From<ProposalCreated> for ProposalCreation {
    fn from(event: ProposalCreated) -> Self {
        Self {
            proposal_id: ProposalId(event.id),
            proposer: event.proposer,
            targets: event.targets,
            values: event.values,
            signatures: event.signatures,
            calldatas: event.calldatas,
            start_block: event.startBlock,
            end_block: event.endBlock,
            description: event.description,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub proposal_id: ProposalId,
    pub voter: Address,
    pub support: u8,
    pub votes: U256,
    pub reason: String,
}

impl From<VoteCast> for Vote {
    fn from(event: VoteCast) -> Self {
        Self {
            proposal_id: ProposalId(event.proposalId),
            voter: event.voter,
            support: event.support,
            votes: event.votes,
            reason: event.reason,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GovernanceEvent {
    ProposalCreated(Box<ProposalCreation>),
    VoteCast(Vote),
    ProposalCanceled { proposal_id: ProposalId },
    ProposalQueued { proposal_id: ProposalId, eta: U256 },
    ProposalExecuted { proposal_id: ProposalId },
}

impl GovernanceEvent {
    pub fn proposal_id(&self) -> ProposalId {
        match self {
            Self::ProposalCreated(creation) => creation.proposal_id,
            Self::VoteCast(vote) => vote.proposal_id,
            Self::ProposalCanceled { proposal_id }
            | Self::ProposalQueued { proposal_id, .. }
            | Self::ProposalExecuted { proposal_id } => *proposal_id,
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::ProposalCreated(_) => "ProposalCreated",
            Self::VoteCast(_) => "VoteCast",
            Self::ProposalCanceled { .. } => "ProposalCanceled",
            Self::ProposalQueued { .. } => "ProposalQueued",
            Self::ProposalExecuted { .. } => "ProposalExecuted",
        }
    }

    /// Decodes the payload of a governor log. Returns `Ok(None)` when the
    /// log's topic is not one of the governor events.
    fn decode(log: &Log) -> Result<Option<Self>, LogError> {
        use alloy::sol_types::SolEvent;

        let Some(topic) = log.topic0() else {
            return Ok(None);
        };

        let event = if *topic == ProposalCreated::SIGNATURE_HASH {
            Self::ProposalCreated(Box::new(
                log.log_decode::<ProposalCreated>()?.inner.data.into(),
            ))
        } else if *topic == VoteCast::SIGNATURE_HASH {
            Self::VoteCast(log.log_decode::<VoteCast>()?.inner.data.into())
        } else if *topic == ProposalCanceled::SIGNATURE_HASH {
            let event = log.log_decode::<ProposalCanceled>()?.inner.data;
            Self::ProposalCanceled {
                proposal_id: ProposalId(event.id),
            }
        } else if *topic == ProposalQueued::SIGNATURE_HASH {
            let event = log.log_decode::<ProposalQueued>()?.inner.data;
            Self::ProposalQueued {
                proposal_id: ProposalId(event.id),
                eta: event.eta,
            }
        } else if *topic == ProposalExecuted::SIGNATURE_HASH {
            let event = log.log_decode::<ProposalExecuted>()?.inner.data;
            Self::ProposalExecuted {
                proposal_id: ProposalId(event.id),
            }
        } else {
            return Ok(None);
        };

        Ok(Some(event))
    }
}

/// A decoded governor event together with the contract that emitted it
/// and its receipt metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceLog {
    pub dao: DaoId,
    pub receipt: Receipt,
    pub event: GovernanceEvent,
}

impl GovernanceLog {
    /// Returns `Ok(None)` for logs that are not governor events, so callers
    /// can feed unfiltered log streams through.
    pub fn try_from_log(log: &Log) -> Result<Option<Self>, LogError> {
        let Some(event) = GovernanceEvent::decode(log)? else {
            return Ok(None);
        };

        let receipt = Receipt::try_from(log)?;

        Ok(Some(Self {
            dao: DaoId(log.address()),
            receipt,
            event,
        }))
    }
}
