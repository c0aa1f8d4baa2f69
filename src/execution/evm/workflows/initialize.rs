use alloy_primitives::{Address, Bytes as AlloyBytes};
use alloy_sol_types::SolCall;
use num_bigint::BigUint;
use tracing::info;
use tycho_common::Bytes;

use crate::execution::{
    amounts::{format_units, parse_units, TokenAmount},
    confirmation::Preview,
    errors::ExecutionError,
    evm::{
        assembler::{PermitCall, TransactionAssembler},
        constants::WAD_DECIMALS,
        contracts::IRouter,
        models::TransactionOutcome,
        utils::{biguint_to_u256, bytes_to_address, sort_by_address},
        workflows::Workflow,
    },
    models::{GasSettings, InitializePool, Submission},
};

impl InitializePool {
    /// Token entries in the order the vault registered them.
    pub fn sorted_tokens(&self) -> Result<Vec<(Address, String)>, ExecutionError> {
        if self.tokens.is_empty() {
            return Err(ExecutionError::InvalidInput(
                "At least one token is required to initialize a pool".to_string(),
            ));
        }
        let entries = self
            .tokens
            .iter()
            .map(|(token, amount)| Ok((bytes_to_address(token)?, amount.clone())))
            .collect::<Result<Vec<_>, ExecutionError>>()?;
        sort_by_address(entries)
    }
}

pub fn initialize_calldata(
    pool: Address,
    amounts: &[(Address, BigUint)],
    min_bpt_out: &BigUint,
) -> Vec<u8> {
    IRouter::initializeCall {
        pool,
        tokens: amounts
            .iter()
            .map(|(token, _)| *token)
            .collect(),
        exactAmountsIn: amounts
            .iter()
            .map(|(_, amount)| biguint_to_u256(amount))
            .collect(),
        minBptAmountOut: biguint_to_u256(min_bpt_out),
        wethIsEth: false,
        userData: AlloyBytes::new(),
    }
    .abi_encode()
}

impl Workflow for InitializePool {
    type Output = TransactionOutcome;

    fn execute(
        &self,
        assembler: &mut TransactionAssembler,
    ) -> Result<Submission<TransactionOutcome>, ExecutionError> {
        let pool = bytes_to_address(&self.pool)?;
        let min_bpt_out = parse_units(&self.min_bpt_out, WAD_DECIMALS)?;

        let mut amounts = Vec::with_capacity(self.tokens.len());
        let mut preview = Preview::new(
            "POOL INITIALIZATION DETAILS",
            if assembler.network().big_blocks {
                "Proceed with BIG BLOCK pool initialization?"
            } else {
                "Proceed with pool initialization?"
            },
        )
        .detail("Pool", pool);
        for (token, value) in self.sorted_tokens()? {
            let decimals = assembler.erc20().decimals(token)?;
            let amount = TokenAmount::from_decimal(Bytes::from(token.to_vec()), &value, decimals)?;
            info!(%token, amount = %amount, "Token amount to deposit");
            preview = preview.detail(format!("Token {}", token), &amount);
            amounts.push((token, amount.amount));
        }
        preview = preview.detail("Min BPT Out", format_units(&min_bpt_out, WAD_DECIMALS));

        let network = assembler.network();
        let gas = GasSettings::new(network.initialize_gas_limit, network.gas_price_strategy());
        let calls = vec![initialize_calldata(pool, &amounts, &min_bpt_out)];
        assembler.permit_batch_and_call(PermitCall { tokens: amounts, calls, gas, preview })
    }
}
