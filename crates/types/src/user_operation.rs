// This file is part of Autosend.
//
// Autosend is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Autosend is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Autosend.
// If not, see https://www.gnu.org/licenses/.

use alloy_primitives::{aliases::U128, bytes, keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall, SolValue};
use serde::{Deserialize, Serialize};

sol! {
    /// Generic smart wallet execution entry point.
    function execute(address target, uint256 value, bytes data);
}

/// Encode the call data for a plain native-token transfer through the smart
/// wallet's `execute` entry point.
pub fn encode_execute(target: Address, value: U256) -> Bytes {
    executeCall {
        target,
        value,
        data: Bytes::new(),
    }
    .abi_encode()
    .into()
}

/// A well-formed placeholder signature used for gas estimation before the
/// operation is signed.
pub fn dummy_signature() -> Bytes {
    bytes!("fffffffffffffffffffffffffffffff0000000000000000000000000000000007aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa1c")
}

/// User operation
///
/// Offchain version, must be packed before hashing
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub call_data: Bytes,
    pub call_gas_limit: u128,
    pub verification_gas_limit: u128,
    pub pre_verification_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub signature: Bytes,
    hash: B256,
    packed: PackedUserOperation,
}

impl UserOperation {
    /// Canonical hash of this operation under the entry point it was built
    /// for. The signature is not part of the hash.
    pub fn hash(&self) -> B256 {
        self.hash
    }

    pub fn packed(&self) -> &PackedUserOperation {
        &self.packed
    }

    /// Attach the real signature after signing the hash.
    pub fn with_signature(mut self, signature: Bytes) -> Self {
        self.packed.signature = signature.clone();
        self.signature = signature;
        self
    }

    /// Wire representation for the bundler RPC.
    pub fn as_rpc(&self) -> RpcUserOperation {
        RpcUserOperation {
            sender: self.sender,
            nonce: self.nonce,
            call_data: self.call_data.clone(),
            call_gas_limit: Some(U128::from(self.call_gas_limit)),
            verification_gas_limit: Some(U128::from(self.verification_gas_limit)),
            pre_verification_gas: Some(U128::from(self.pre_verification_gas)),
            max_fee_per_gas: Some(U128::from(self.max_fee_per_gas)),
            max_priority_fee_per_gas: Some(U128::from(self.max_priority_fee_per_gas)),
            signature: self.signature.clone(),
        }
    }
}

/// Onchain representation: gas limits and fees packed into single 32-byte
/// words, as the entry point hashes them.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PackedUserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub init_code: Bytes,
    pub call_data: Bytes,
    pub account_gas_limits: B256,
    pub pre_verification_gas: U256,
    pub gas_fees: B256,
    pub paymaster_and_data: Bytes,
    pub signature: Bytes,
}

/// Wire form of a user operation for bundler JSON-RPC calls. Gas and fee
/// fields are omitted for the estimation request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcUserOperation {
    pub sender: Address,
    pub nonce: U256,
    pub call_data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_gas_limit: Option<U128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_gas_limit: Option<U128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_verification_gas: Option<U128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U128>,
    pub signature: Bytes,
}

impl RpcUserOperation {
    /// Provisional operation submitted for gas estimation: call data plus a
    /// well-formed placeholder signature, nothing else.
    pub fn for_estimation(sender: Address, nonce: U256, call_data: Bytes) -> Self {
        Self {
            sender,
            nonce,
            call_data,
            call_gas_limit: None,
            verification_gas_limit: None,
            pre_verification_gas: None,
            max_fee_per_gas: None,
            max_priority_fee_per_gas: None,
            signature: dummy_signature(),
        }
    }
}

pub struct UserOperationBuilder {
    // required fields for hash
    entry_point: Address,
    chain_id: u64,

    required: UserOperationRequiredFields,
}

pub struct UserOperationRequiredFields {
    pub sender: Address,
    pub nonce: U256,
    pub call_data: Bytes,
    pub call_gas_limit: u128,
    pub verification_gas_limit: u128,
    pub pre_verification_gas: u128,
    pub max_priority_fee_per_gas: u128,
    pub max_fee_per_gas: u128,
    pub signature: Bytes,
}

impl UserOperationBuilder {
    pub fn new(entry_point: Address, chain_id: u64, required: UserOperationRequiredFields) -> Self {
        Self {
            entry_point,
            chain_id,
            required,
        }
    }

    pub fn build(self) -> UserOperation {
        let uo = UserOperation {
            sender: self.required.sender,
            nonce: self.required.nonce,
            call_data: self.required.call_data,
            call_gas_limit: self.required.call_gas_limit,
            verification_gas_limit: self.required.verification_gas_limit,
            pre_verification_gas: self.required.pre_verification_gas,
            max_priority_fee_per_gas: self.required.max_priority_fee_per_gas,
            max_fee_per_gas: self.required.max_fee_per_gas,
            signature: self.required.signature,
            hash: B256::ZERO,
            packed: PackedUserOperation::default(),
        };

        let packed = pack_user_operation(&uo);
        let hash = hash_packed_user_operation(&packed, self.entry_point, self.chain_id);

        UserOperation { hash, packed, ..uo }
    }
}

fn pack_user_operation(uo: &UserOperation) -> PackedUserOperation {
    let account_gas_limits = concat_u128_be(uo.verification_gas_limit, uo.call_gas_limit);
    let gas_fees = concat_u128_be(uo.max_priority_fee_per_gas, uo.max_fee_per_gas);

    PackedUserOperation {
        sender: uo.sender,
        nonce: uo.nonce,
        init_code: Bytes::new(),
        call_data: uo.call_data.clone(),
        account_gas_limits,
        pre_verification_gas: U256::from(uo.pre_verification_gas),
        gas_fees,
        paymaster_and_data: Bytes::new(),
        signature: uo.signature.clone(),
    }
}

fn hash_packed_user_operation(
    puo: &PackedUserOperation,
    entry_point: Address,
    chain_id: u64,
) -> B256 {
    let hashed = keccak256(
        (
            puo.sender,
            puo.nonce,
            keccak256(&puo.init_code),
            keccak256(&puo.call_data),
            puo.account_gas_limits,
            puo.pre_verification_gas,
            puo.gas_fees,
            keccak256(&puo.paymaster_and_data),
        )
            .abi_encode(),
    );

    keccak256((hashed, entry_point, U256::from(chain_id)).abi_encode())
}

fn concat_u128_be(a: u128, b: u128) -> B256 {
    let mut out = [0u8; 32];
    out[..16].copy_from_slice(&a.to_be_bytes());
    out[16..].copy_from_slice(&b.to_be_bytes());
    B256::from(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_op() -> UserOperation {
        UserOperationBuilder::new(
            Address::repeat_byte(0xee),
            28802,
            UserOperationRequiredFields {
                sender: Address::repeat_byte(0x11),
                nonce: U256::from(7),
                call_data: encode_execute(Address::repeat_byte(0x22), U256::from(1000)),
                call_gas_limit: 0x0102,
                verification_gas_limit: 0x0304,
                pre_verification_gas: 0x0506,
                max_priority_fee_per_gas: 0x0708,
                max_fee_per_gas: 0x090a,
                signature: Bytes::new(),
            },
        )
        .build()
    }

    #[test]
    fn test_gas_words_pack_big_endian() {
        let op = build_op();
        let limits = op.packed().account_gas_limits;
        // verification gas limit in the high 16 bytes, call gas limit in the low 16
        assert_eq!(&limits[14..16], &[0x03, 0x04]);
        assert_eq!(&limits[30..32], &[0x01, 0x02]);
        let fees = op.packed().gas_fees;
        assert_eq!(&fees[14..16], &[0x07, 0x08]);
        assert_eq!(&fees[30..32], &[0x09, 0x0a]);
    }

    #[test]
    fn test_signature_does_not_change_hash() {
        let op = build_op();
        let hash = op.hash();
        let signed = op.with_signature(dummy_signature());
        assert_eq!(signed.hash(), hash);
        assert_eq!(signed.packed().signature, dummy_signature());
    }

    #[test]
    fn test_hash_binds_entry_point_and_chain() {
        let base = build_op();
        let other_entry = UserOperationBuilder::new(
            Address::repeat_byte(0xef),
            28802,
            UserOperationRequiredFields {
                sender: base.sender,
                nonce: base.nonce,
                call_data: base.call_data.clone(),
                call_gas_limit: base.call_gas_limit,
                verification_gas_limit: base.verification_gas_limit,
                pre_verification_gas: base.pre_verification_gas,
                max_priority_fee_per_gas: base.max_priority_fee_per_gas,
                max_fee_per_gas: base.max_fee_per_gas,
                signature: Bytes::new(),
            },
        )
        .build();
        assert_ne!(base.hash(), other_entry.hash());
    }

    #[test]
    fn test_encode_execute_selector_and_value() {
        let call_data = encode_execute(Address::repeat_byte(0x22), U256::from(5));
        let selector = &keccak256("execute(address,uint256,bytes)".as_bytes())[..4];
        assert_eq!(&call_data[..4], selector);
        let decoded = executeCall::abi_decode(&call_data, true).unwrap();
        assert_eq!(decoded.target, Address::repeat_byte(0x22));
        assert_eq!(decoded.value, U256::from(5));
        assert!(decoded.data.is_empty());
    }

    #[test]
    fn test_dummy_signature_is_well_formed() {
        assert_eq!(dummy_signature().len(), 65);
    }

    #[test]
    fn test_estimation_op_omits_gas_fields() {
        let op = RpcUserOperation::for_estimation(
            Address::repeat_byte(0x11),
            U256::from(7),
            Bytes::from(vec![1, 2, 3]),
        );
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["nonce"], "0x7");
        assert!(json.get("callGasLimit").is_none());
        assert!(json.get("maxFeePerGas").is_none());
        assert!(json["signature"].as_str().unwrap().starts_with("0xff"));
    }

    #[test]
    fn test_rpc_op_uses_camel_case_quantities() {
        let op = build_op().with_signature(dummy_signature());
        let json = serde_json::to_value(op.as_rpc()).unwrap();
        assert_eq!(json["callGasLimit"], "0x102");
        assert_eq!(json["verificationGasLimit"], "0x304");
        assert_eq!(json["preVerificationGas"], "0x506");
        assert_eq!(json["maxPriorityFeePerGas"], "0x708");
        assert_eq!(json["maxFeePerGas"], "0x90a");
    }
}
