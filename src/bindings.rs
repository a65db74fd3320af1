//! Solidity ABI bindings for the governor contract events the indexer
//! consumes.

use alloy::sol;

sol!(
    #![sol(all_derives = true)]
    interface IGovernorBravo {
        event ProposalCreated(
            uint256 id,
            address proposer,
            address[] targets,
            uint256[] values,
            string[] signatures,
            bytes[] calldatas,
            uint256 startBlock,
            uint256 endBlock,
            string description
        );

        event VoteCast(
            address indexed voter,
            uint256 proposalId,
            uint8 support,
            uint256 votes,
            string reason
        );

        event ProposalCanceled(uint256 id);

        event ProposalQueued(uint256 id, uint256 eta);

        event ProposalExecuted(uint256 id);
    }
);
