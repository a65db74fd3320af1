//! Derived entities: the DAO and proposal aggregates, plus the
//! write-once fact records produced for each applied event.

use alloy::primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::receipt::{FactId, Receipt};

/// DAOs are keyed by the address of the governor contract emitting the
/// events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DaoId(pub Address);

impl fmt::Display for DaoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Onchain proposal identifier, rendered in decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub U256);

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProposalId {
    fn from(id: u64) -> Self {
        Self(U256::from(id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dao {
    pub id: DaoId,
    pub total_proposals: U256,
    pub total_votes_cast: U256,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub dao: DaoId,
    pub proposer: Address,
    pub targets: Vec<Address>,
    pub values: Vec<U256>,
    pub signatures: Vec<String>,
    pub calldatas: Vec<Bytes>,
    pub start_block: U256,
    pub end_block: U256,
    pub description: String,
    /// Receipt of the creation log this record was last written from.
    pub created: Receipt,
    pub votes_for: U256,
    pub votes_against: U256,
    pub votes_abstain: U256,
    /// Sum of the weights counted into the three tallies.
    pub total_votes: U256,
    /// Distinct voters in first-vote order.
    pub voters: Vec<Address>,
}

impl Proposal {
    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voters.contains(voter)
    }

    /// Integer mean of counted weight per distinct voter, zero before the
    /// first vote.
    pub fn average_votes_per_voter(&self) -> U256 {
        if self.voters.is_empty() {
            return U256::ZERO;
        }

        self.total_votes / U256::from(self.voters.len())
    }
}

/// Vote stance as encoded on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support {
    Against,
    For,
    Abstain,
}

impl Support {
    /// Codes outside `0..=2` have no stance and count toward no tally.
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Against),
            1 => Some(Self::For),
            2 => Some(Self::Abstain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteCastRecord {
    pub id: FactId,
    pub voter: Address,
    pub proposal: ProposalId,
    pub dao: DaoId,
    /// Raw support code, kept even when it maps to no [`Support`].
    pub support: u8,
    pub votes: U256,
    pub reason: String,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalCanceledRecord {
    pub id: FactId,
    pub proposal: ProposalId,
    pub dao: DaoId,
    /// Set when the DAO proposal counter was already zero and the
    /// decrement was clamped.
    pub counter_clamped: bool,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalQueuedRecord {
    pub id: FactId,
    pub proposal: ProposalId,
    pub dao: DaoId,
    pub eta: U256,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalExecutedRecord {
    pub id: FactId,
    pub proposal: ProposalId,
    pub dao: DaoId,
    pub receipt: Receipt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Dao,
    Proposal,
    VoteCast,
    ProposalCanceled,
    ProposalQueued,
    ProposalExecuted,
}

impl EntityKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dao => "dao",
            Self::Proposal => "proposal",
            Self::VoteCast => "vote_cast",
            Self::ProposalCanceled => "proposal_canceled",
            Self::ProposalQueued => "proposal_queued",
            Self::ProposalExecuted => "proposal_executed",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage key: entity kind plus the string form of its identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub kind: EntityKind,
    pub id: String,
}

impl EntityKey {
    pub fn new(kind: EntityKind, id: impl fmt::Display) -> Self {
        Self {
            kind,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Dao(Dao),
    Proposal(Box<Proposal>),
    VoteCast(VoteCastRecord),
    ProposalCanceled(ProposalCanceledRecord),
    ProposalQueued(ProposalQueuedRecord),
    ProposalExecuted(ProposalExecutedRecord),
}

impl Entity {
    pub const fn kind(&self) -> EntityKind {
        match self {
            Self::Dao(_) => EntityKind::Dao,
            Self::Proposal(_) => EntityKind::Proposal,
            Self::VoteCast(_) => EntityKind::VoteCast,
            Self::ProposalCanceled(_) => EntityKind::ProposalCanceled,
            Self::ProposalQueued(_) => EntityKind::ProposalQueued,
            Self::ProposalExecuted(_) => EntityKind::ProposalExecuted,
        }
    }

    pub fn key(&self) -> EntityKey {
        match self {
            Self::Dao(dao) => dao.key(),
            Self::Proposal(proposal) => proposal.key(),
            Self::VoteCast(record) => record.key(),
            Self::ProposalCanceled(record) => record.key(),
            Self::ProposalQueued(record) => record.key(),
            Self::ProposalExecuted(record) => record.key(),
        }
    }
}

/// Typed view over one [`Entity`] variant.
pub trait Stored: Sized {
    const KIND: EntityKind;
    type Id: fmt::Display;

    fn id(&self) -> Self::Id;
    fn into_entity(self) -> Entity;
    fn from_entity(entity: Entity) -> Option<Self>;

    fn key_for(id: &Self::Id) -> EntityKey {
        EntityKey::new(Self::KIND, id)
    }

    fn key(&self) -> EntityKey {
        Self::key_for(&self.id())
    }
}

/// Entities that may be brought into existence at their zero value on
/// first reference.
pub trait ZeroValued: Stored {
    fn zero(id: &Self::Id) -> Self;
}

impl ZeroValued for Dao {
    fn zero(id: &DaoId) -> Self {
        Self {
            id: *id,
            total_proposals: U256::ZERO,
            total_votes_cast: U256::ZERO,
        }
    }
}

macro_rules! stored {
    ($ty:ty, $kind:ident, $id:ty, $wrap:expr, $unwrap:pat => $inner:expr) => {
        impl Stored for $ty {
            const KIND: EntityKind = EntityKind::$kind;
            type Id = $id;

            fn id(&self) -> $id {
                self.id
            }

            fn into_entity(self) -> Entity {
                $wrap(self)
            }

            fn from_entity(entity: Entity) -> Option<Self> {
                match entity {
                    $unwrap => Some($inner),
                    _ => None,
                }
            }
        }
    };
}

stored!(Dao, Dao, DaoId, Entity::Dao, Entity::Dao(dao) => dao);
stored!(
    Proposal,
    Proposal,
    ProposalId,
    |proposal| Entity::Proposal(Box::new(proposal)),
    Entity::Proposal(proposal) => *proposal
);
stored!(VoteCastRecord, VoteCast, FactId, Entity::VoteCast, Entity::VoteCast(record) => record);
stored!(
    ProposalCanceledRecord,
    ProposalCanceled,
    FactId,
    Entity::ProposalCanceled,
    Entity::ProposalCanceled(record) => record
);
stored!(
    ProposalQueuedRecord,
    ProposalQueued,
    FactId,
    Entity::ProposalQueued,
    Entity::ProposalQueued(record) => record
);
stored!(
    ProposalExecutedRecord,
    ProposalExecuted,
    FactId,
    Entity::ProposalExecuted,
    Entity::ProposalExecuted(record) => record
);
