// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Contract interfaces and calldata helpers.

use alloy::{
    primitives::{Address, Bytes, U256},
    rpc::types::Log,
    sol,
    sol_types::SolCall,
};

use super::types::NATIVE_TOKEN_ADDRESS;

sol! {
    #[sol(rpc)]
    interface IIdRegistry {
        function custodyOf(uint256 fid) external view returns (address owner);
    }

    #[sol(rpc)]
    interface IERC1271 {
        function isValidSignature(bytes32 hash, bytes signature) external view returns (bytes4 magicValue);
    }

    #[sol(rpc)]
    interface IAccountFactory {
        function getAddress(address adminSigner, bytes data) external view returns (address);
        function createAccount(address admin, bytes data) external returns (address);
    }

    #[sol(rpc)]
    interface IAccount {
        function execute(address target, uint256 value, bytes data) external;
    }

    #[sol(rpc)]
    interface IDropERC721 {
        struct AllowlistProof {
            bytes32[] proof;
            uint256 quantityLimitPerWallet;
            uint256 pricePerToken;
            address currency;
        }

        struct ClaimCondition {
            uint256 startTimestamp;
            uint256 maxClaimableSupply;
            uint256 supplyClaimed;
            uint256 quantityLimitPerWallet;
            bytes32 merkleRoot;
            uint256 pricePerToken;
            address currency;
            string metadata;
        }

        event TokensClaimed(
            uint256 indexed claimConditionIndex,
            address indexed claimer,
            address indexed receiver,
            uint256 startTokenId,
            uint256 quantityClaimed
        );

        function getActiveClaimConditionId() external view returns (uint256);
        function getClaimConditionById(uint256 conditionId) external view returns (ClaimCondition memory condition);
        function claim(
            address receiver,
            uint256 quantity,
            address currency,
            uint256 pricePerToken,
            AllowlistProof allowlistProof,
            bytes data
        ) external payable;
        function transferFrom(address from, address to, uint256 tokenId) external;
    }
}

/// Encode a single-token claim under the public phase of `condition`.
///
/// Returns the calldata and the native value to attach.
pub fn claim_calldata(recipient: Address, condition: &IDropERC721::ClaimCondition) -> (Bytes, U256) {
    let quantity = U256::from(1u64);
    let call = IDropERC721::claimCall {
        receiver: recipient,
        quantity,
        currency: condition.currency,
        pricePerToken: condition.pricePerToken,
        allowlistProof: IDropERC721::AllowlistProof {
            proof: Vec::new(),
            quantityLimitPerWallet: U256::ZERO,
            pricePerToken: U256::MAX,
            currency: Address::ZERO,
        },
        data: Bytes::new(),
    };

    let value = if condition.currency == NATIVE_TOKEN_ADDRESS {
        condition.pricePerToken.saturating_mul(quantity)
    } else {
        U256::ZERO
    };

    (call.abi_encode().into(), value)
}

pub fn transfer_calldata(from: Address, to: Address, token_id: U256) -> Bytes {
    IDropERC721::transferFromCall {
        from,
        to,
        tokenId: token_id,
    }
    .abi_encode()
    .into()
}

/// Wrap `data` in a smart account `execute` call.
pub fn execute_calldata(target: Address, value: U256, data: Bytes) -> Bytes {
    IAccount::executeCall {
        target,
        value,
        data,
    }
    .abi_encode()
    .into()
}

pub fn create_account_calldata(admin: Address) -> Bytes {
    IAccountFactory::createAccountCall {
        admin,
        data: Bytes::new(),
    }
    .abi_encode()
    .into()
}

/// Start token id of the `TokensClaimed` event emitted by `nft` for `claimer`.
///
/// Only the logs of the claim transaction itself are inspected, so a
/// concurrent claim by another account can never be picked up.
pub fn claimed_token_id(logs: &[Log], nft: Address, claimer: Address) -> Option<U256> {
    logs.iter()
        .filter(|log| log.address() == nft)
        .filter_map(|log| log.log_decode::<IDropERC721::TokensClaimed>().ok())
        .map(|decoded| decoded.inner.data)
        .find(|event| event.claimer == claimer)
        .map(|event| event.startTokenId)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, FixedBytes};
    use alloy::sol_types::SolEvent;

    const NFT: Address = address!("1111111111111111111111111111111111111111");
    const ACCOUNT: Address = address!("3333333333333333333333333333333333333333");

    fn condition(currency: Address, price: u64) -> IDropERC721::ClaimCondition {
        IDropERC721::ClaimCondition {
            startTimestamp: U256::ZERO,
            maxClaimableSupply: U256::from(1000u64),
            supplyClaimed: U256::ZERO,
            quantityLimitPerWallet: U256::from(1u64),
            merkleRoot: FixedBytes::ZERO,
            pricePerToken: U256::from(price),
            currency,
            metadata: String::new(),
        }
    }

    fn claimed_log(emitter: Address, claimer: Address, start: u64) -> Log {
        let event = IDropERC721::TokensClaimed {
            claimConditionIndex: U256::ZERO,
            claimer,
            receiver: claimer,
            startTokenId: U256::from(start),
            quantityClaimed: U256::from(1u64),
        };
        Log {
            inner: alloy::primitives::Log {
                address: emitter,
                data: event.encode_log_data(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn free_claim_attaches_no_value() {
        let (data, value) = claim_calldata(ACCOUNT, &condition(NATIVE_TOKEN_ADDRESS, 0));
        assert_eq!(value, U256::ZERO);
        assert_eq!(&data[..4], IDropERC721::claimCall::SELECTOR.as_slice());

        let decoded = IDropERC721::claimCall::abi_decode(&data).unwrap();
        assert_eq!(decoded.receiver, ACCOUNT);
        assert_eq!(decoded.quantity, U256::from(1u64));
        assert!(decoded.allowlistProof.proof.is_empty());
    }

    #[test]
    fn priced_native_claim_attaches_price() {
        let (_, value) = claim_calldata(ACCOUNT, &condition(NATIVE_TOKEN_ADDRESS, 5_000));
        assert_eq!(value, U256::from(5_000u64));

        let erc20 = address!("4444444444444444444444444444444444444444");
        let (_, value) = claim_calldata(ACCOUNT, &condition(erc20, 5_000));
        assert_eq!(value, U256::ZERO);
    }

    #[test]
    fn token_id_comes_from_matching_event() {
        let other = address!("5555555555555555555555555555555555555555");
        let logs = vec![
            claimed_log(NFT, other, 7),
            claimed_log(other, ACCOUNT, 99),
            claimed_log(NFT, ACCOUNT, 12),
        ];

        assert_eq!(claimed_token_id(&logs, NFT, ACCOUNT), Some(U256::from(12u64)));
        assert_eq!(claimed_token_id(&logs[..2], NFT, ACCOUNT), None);
    }

    #[test]
    fn execute_wraps_inner_call() {
        let inner = transfer_calldata(ACCOUNT, NFT, U256::from(3u64));
        let outer = execute_calldata(NFT, U256::ZERO, inner.clone());

        let decoded = IAccount::executeCall::abi_decode(&outer).unwrap();
        assert_eq!(decoded.target, NFT);
        assert_eq!(decoded.data, inner);
    }
}
