use std::sync::Arc;

use alloy_primitives::{aliases::U48, Address, PrimitiveSignature as Signature, U160, U256};
use alloy_sol_types::{eip712_domain, Eip712Domain, SolCall};
use num_bigint::BigUint;

use crate::execution::{
    errors::ExecutionError,
    evm::{
        client::ChainClient,
        constants::MAX_PERMIT_EXPIRATION,
        contracts::{IPermit2, PermitBatch, PermitDetails},
        utils::biguint_to_u256,
        wallet::Wallet,
    },
};

/// Type alias for representing allowance data as a tuple of (amount, expiration, nonce). Used for
/// decoding
pub type Allowance = (U160, U48, U48);

/// Read access to the Permit2 contract.
pub struct Permit2 {
    address: Address,
    client: Arc<ChainClient>,
}

impl Permit2 {
    pub fn new(address: Address, client: Arc<ChainClient>) -> Self {
        Self { address, client }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Fetches allowance data for a specific owner, token, and spender.
    pub fn get_existing_allowance(
        &self,
        owner: Address,
        token: Address,
        spender: Address,
    ) -> Result<Allowance, ExecutionError> {
        let data = IPermit2::allowanceCall { owner, token, spender }.abi_encode();
        let response = self.client.call(self.address, data)?;
        let allowance = IPermit2::allowanceCall::abi_decode_returns(&response, true).map_err(|_| {
            ExecutionError::FatalError(
                "Failed to decode response for permit2 allowance".to_string(),
            )
        })?;
        Ok((allowance.amount, allowance.expiration, allowance.nonce))
    }
}

/// Calldata for `Permit2.approve`, granting `spender` an allowance on `token` until `expiration`.
pub fn approve_calldata(
    token: Address,
    spender: Address,
    amount: U160,
    expiration: U48,
) -> Vec<u8> {
    IPermit2::approveCall { token, spender, amount, expiration }.abi_encode()
}

/// One token entry of a permit batch.
#[derive(Clone, Debug, PartialEq)]
pub struct PermitRequest {
    pub token: Address,
    pub amount: BigUint,
    /// Current Permit2 nonce for (owner, token, spender).
    pub nonce: U48,
}

pub fn to_u160(amount: &BigUint) -> Result<U160, ExecutionError> {
    if amount.bits() > 160 {
        return Err(ExecutionError::InvalidInput(format!(
            "Amount {} does not fit in uint160",
            amount
        )));
    }
    Ok(U160::from(biguint_to_u256(amount)))
}

/// Builds the batch permit for `spender`, one entry per request in the given order.
///
/// Allowances never expire and the signature has no deadline.
pub fn build_permit_batch(
    requests: &[PermitRequest],
    spender: Address,
) -> Result<PermitBatch, ExecutionError> {
    let details = requests
        .iter()
        .map(|request| {
            Ok(PermitDetails {
                token: request.token,
                amount: to_u160(&request.amount)?,
                expiration: U48::from(MAX_PERMIT_EXPIRATION),
                nonce: request.nonce,
            })
        })
        .collect::<Result<Vec<_>, ExecutionError>>()?;
    Ok(PermitBatch { details, spender, sigDeadline: U256::MAX })
}

pub fn permit2_domain(chain_id: u64, permit2: Address) -> Eip712Domain {
    eip712_domain! {
        name: "Permit2",
        chain_id: chain_id,
        verifying_contract: permit2,
    }
}

pub fn sign_permit_batch(
    wallet: &Wallet,
    batch: &PermitBatch,
    domain: &Eip712Domain,
) -> Result<Signature, ExecutionError> {
    wallet.sign_typed_data(batch, domain)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use alloy_sol_types::SolStruct;
    use num_traits::{pow, One};
    use rstest::rstest;

    use super::*;

    const ANVIL_PRIVATE_KEY: &str =
        "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn router() -> Address {
        Address::from_str("0x76578ecf9a141296Ec657847fb45B0585bCDa3a6").unwrap()
    }

    fn usdc() -> Address {
        Address::from_str("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913").unwrap()
    }

    fn weth() -> Address {
        Address::from_str("0x4200000000000000000000000000000000000006").unwrap()
    }

    fn permit2() -> Address {
        Address::from_str("0x000000000022D473030F116dDEE9F6B43aC78BA3").unwrap()
    }

    #[test]
    fn test_build_permit_batch() {
        let requests = vec![
            PermitRequest { token: usdc(), amount: BigUint::from(240000u32), nonce: U48::from(2) },
            PermitRequest {
                token: weth(),
                amount: BigUint::from(100000000000000u64),
                nonce: U48::ZERO,
            },
        ];
        let batch = build_permit_batch(&requests, router()).unwrap();

        assert_eq!(batch.spender, router());
        assert_eq!(batch.sigDeadline, U256::MAX);
        assert_eq!(
            batch.details,
            vec![
                PermitDetails {
                    token: usdc(),
                    amount: U160::from(240000u32),
                    expiration: U48::from(MAX_PERMIT_EXPIRATION),
                    nonce: U48::from(2),
                },
                PermitDetails {
                    token: weth(),
                    amount: U160::from(100000000000000u64),
                    expiration: U48::from(MAX_PERMIT_EXPIRATION),
                    nonce: U48::ZERO,
                },
            ]
        );
    }

    #[test]
    fn test_build_permit_batch_any_input_order() {
        let usdc_request =
            PermitRequest { token: usdc(), amount: BigUint::from(240000u32), nonce: U48::ZERO };
        let weth_request =
            PermitRequest { token: weth(), amount: BigUint::from(5u32), nonce: U48::from(1) };

        let forward =
            build_permit_batch(&[usdc_request.clone(), weth_request.clone()], router()).unwrap();
        let reversed = build_permit_batch(&[weth_request, usdc_request], router()).unwrap();

        assert_eq!(forward.details.len(), 2);
        for details in forward.details.iter() {
            let matching = reversed
                .details
                .iter()
                .find(|other| other.token == details.token)
                .unwrap();
            assert_eq!(matching, details);
        }
        assert_eq!(forward.details[0].token, reversed.details[1].token);
    }

    #[rstest]
    #[case::max_uint160(160, true)]
    #[case::overflow(161, false)]
    fn test_to_u160_bounds(#[case] bits: usize, #[case] fits: bool) {
        let amount: BigUint = pow(BigUint::from(2u8), bits) - BigUint::one();
        assert_eq!(to_u160(&amount).is_ok(), fits);
    }

    #[test]
    fn test_approve_calldata() {
        let data =
            approve_calldata(usdc(), router(), U160::from(240000u32), U48::from(1_700_000_000));
        assert_eq!(data.len(), 4 + 4 * 32);
        assert_eq!(data[..4], IPermit2::approveCall::SELECTOR);
        assert_eq!(&data[16..36], usdc().as_slice());
        assert_eq!(&data[48..68], router().as_slice());
    }

    #[test]
    fn test_allowance_calldata_keeps_low_owner() {
        let owner = Address::left_padding_from(&[0x20]);
        let data = IPermit2::allowanceCall { owner, token: usdc(), spender: router() }.abi_encode();
        assert_eq!(data.len(), 4 + 3 * 32);
        assert_eq!(&data[16..36], owner.as_slice());
        assert_eq!(&data[48..68], usdc().as_slice());
        assert_eq!(&data[80..100], router().as_slice());
    }

    #[test]
    fn test_sign_permit_batch_recovers_signer() {
        let wallet = Wallet::from_private_key(ANVIL_PRIVATE_KEY).unwrap();
        let requests = vec![PermitRequest {
            token: usdc(),
            amount: BigUint::from(240000u32),
            nonce: U48::ZERO,
        }];
        let batch = build_permit_batch(&requests, router()).unwrap();
        let domain = permit2_domain(8453, permit2());

        let signature = sign_permit_batch(&wallet, &batch, &domain).unwrap();
        let recovered = signature
            .recover_address_from_prehash(&batch.eip712_signing_hash(&domain))
            .unwrap();
        assert_eq!(recovered, wallet.address());
        assert_eq!(signature.as_bytes().len(), 65);
    }

    #[test]
    fn test_domain_binds_chain() {
        let batch = build_permit_batch(&[], router()).unwrap();
        assert_ne!(
            batch.eip712_signing_hash(&permit2_domain(8453, permit2())),
            batch.eip712_signing_hash(&permit2_domain(999, permit2()))
        );
    }

    /// Requires an Ethereum mainnet fork, e.g. anvil --fork-url <RPC-URL>, with
    /// RPC_URL=http://127.0.0.1:8545
    #[test]
    #[cfg_attr(not(feature = "fork-tests"), ignore)]
    fn test_get_existing_allowance() {
        let rpc_url = std::env::var("RPC_URL").unwrap_or("http://127.0.0.1:8545".to_string());
        let client = Arc::new(ChainClient::new(&rpc_url).unwrap());
        let permit2 = Permit2::new(permit2(), client);
        let owner = Address::from_str("0x2c6a3cd97c6283b95ac8c5a4459ebb0d5fd404f4").unwrap();
        let token = Address::from_str("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();

        let allowance = permit2
            .get_existing_allowance(owner, token, router())
            .unwrap();
        assert_eq!(allowance, (U160::ZERO, U48::ZERO, U48::ZERO));
    }
}
