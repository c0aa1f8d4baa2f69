use std::sync::Arc;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use num_bigint::BigUint;

use crate::execution::{
    errors::ExecutionError,
    evm::{client::ChainClient, contracts::IERC20, utils::u256_to_biguint},
};

/// Read access to ERC-20 token state for the operating wallet.
pub struct Erc20 {
    client: Arc<ChainClient>,
}

impl Erc20 {
    pub fn new(client: Arc<ChainClient>) -> Self {
        Self { client }
    }

    fn read<C: SolCall>(&self, token: Address, call: C) -> Result<C::Return, ExecutionError> {
        let response = self
            .client
            .call(token, call.abi_encode())?;
        C::abi_decode_returns(&response, true).map_err(|_| {
            ExecutionError::FatalError(format!(
                "Failed to decode response for {} on {}",
                C::SIGNATURE,
                token
            ))
        })
    }

    /// Returns how much `spender` may currently move out of `owner`'s balance of `token`.
    pub fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<BigUint, ExecutionError> {
        let allowance = self.read(token, IERC20::allowanceCall { owner, spender })?;
        Ok(u256_to_biguint(allowance._0))
    }

    pub fn balance_of(&self, token: Address, owner: Address) -> Result<BigUint, ExecutionError> {
        let balance = self.read(token, IERC20::balanceOfCall { account: owner })?;
        Ok(u256_to_biguint(balance._0))
    }

    pub fn decimals(&self, token: Address) -> Result<u8, ExecutionError> {
        Ok(self.read(token, IERC20::decimalsCall {})?._0)
    }
}

pub fn approve_calldata(spender: Address, amount: U256) -> Vec<u8> {
    IERC20::approveCall { spender, amount }.abi_encode()
}

/// An approval is only sent when the current allowance does not cover the required amount.
pub fn approval_needed(current: &BigUint, required: &BigUint) -> bool {
    current < required
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;
    use crate::execution::evm::constants::MAX_APPROVAL;

    #[rstest]
    #[case::no_allowance(0u64, 100000u64, true)]
    #[case::short_allowance(99999u64, 100000u64, true)]
    #[case::exact_allowance(100000u64, 100000u64, false)]
    #[case::larger_allowance(u64::MAX, 100000u64, false)]
    #[case::nothing_required(0u64, 0u64, false)]
    fn test_approval_needed(#[case] current: u64, #[case] required: u64, #[case] expected: bool) {
        assert_eq!(approval_needed(&BigUint::from(current), &BigUint::from(required)), expected);
    }

    #[test]
    fn test_max_allowance_skips_approval() {
        let current = u256_to_biguint(MAX_APPROVAL);
        let required = BigUint::from_str("1000000000000000000000000").unwrap();
        assert!(!approval_needed(&current, &required));
    }

    #[test]
    fn test_calldata_for_low_addresses() {
        // An owner whose first word reads as an ABI offset must still be encoded in full.
        let owner = Address::left_padding_from(&[0x20]);
        let data = IERC20::balanceOfCall { account: owner }.abi_encode();
        assert_eq!(data.len(), 4 + 32);
        assert_eq!(data[..4], [0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(&data[16..36], owner.as_slice());

        let data = IERC20::allowanceCall { owner, spender: owner }.abi_encode();
        assert_eq!(data.len(), 4 + 64);
        assert_eq!(data[35], 0x20);
        assert_eq!(data[67], 0x20);
    }

    #[test]
    fn test_approve_calldata() {
        let permit2 = Address::from_str("0x000000000022D473030F116dDEE9F6B43aC78BA3").unwrap();
        let data = approve_calldata(permit2, MAX_APPROVAL);

        assert_eq!(data.len(), 4 + 64);
        assert_eq!(data[..4], [0x09, 0x5e, 0xa7, 0xb3]);
        assert_eq!(&data[16..36], permit2.as_slice());
        assert!(data[36..]
            .iter()
            .all(|byte| *byte == 0xff));
    }

    /// Requires an Ethereum mainnet fork, e.g. anvil --fork-url <RPC-URL>, with
    /// RPC_URL=http://127.0.0.1:8545
    #[test]
    #[cfg_attr(not(feature = "fork-tests"), ignore)]
    fn test_read_usdc_state() {
        let rpc_url = std::env::var("RPC_URL").unwrap_or("http://127.0.0.1:8545".to_string());
        let erc20 = Erc20::new(Arc::new(ChainClient::new(&rpc_url).unwrap()));
        let usdc = Address::from_str("0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48").unwrap();
        let owner = Address::from_str("0x2c6a3cd97c6283b95ac8c5a4459ebb0d5fd404f4").unwrap();
        let spender = Address::from_str("0xba12222222228d8ba445958a75a0704d566bf2c8").unwrap();

        assert_eq!(erc20.decimals(usdc).unwrap(), 6);
        assert_eq!(
            erc20
                .allowance(usdc, spender, owner)
                .unwrap(),
            BigUint::ZERO
        );
    }
}
