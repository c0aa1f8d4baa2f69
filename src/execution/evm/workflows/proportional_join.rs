use alloy_primitives::{Address, Bytes as AlloyBytes, U256};
use alloy_sol_types::SolCall;
use num_bigint::BigUint;
use tracing::{error, info};
use tycho_common::Bytes;

use crate::execution::{
    amounts::{format_units, parse_units, TokenAmount},
    confirmation::Preview,
    errors::ExecutionError,
    evm::{
        assembler::{PermitCall, TransactionAssembler},
        constants::{PROPORTIONAL_JOIN_GAS_LIMIT, WAD_DECIMALS},
        contracts::{IPoolInfo, IRouter},
        models::TransactionOutcome,
        utils::{biguint_to_u256, bytes_to_address, sort_by_address, u256_to_biguint},
        workflows::Workflow,
    },
    models::{GasPriceStrategy, GasSettings, ProportionalJoin, Submission},
};

impl ProportionalJoin {
    pub fn sorted_tokens(&self) -> Result<Vec<Address>, ExecutionError> {
        let entries = self
            .tokens
            .iter()
            .map(|token| Ok((bytes_to_address(token)?, ())))
            .collect::<Result<Vec<_>, ExecutionError>>()?;
        Ok(sort_by_address(entries)?
            .into_iter()
            .map(|(token, _)| token)
            .collect())
    }
}

/// Quote for the token amounts a proportional join of `exact_bpt_out` pulls. Simulated from the
/// zero address, so it does not depend on the wallet's balances.
pub fn query_calldata(pool: Address, exact_bpt_out: &BigUint) -> Vec<u8> {
    IRouter::queryAddLiquidityProportionalCall {
        pool,
        exactBptAmountOut: biguint_to_u256(exact_bpt_out),
        sender: Address::ZERO,
        userData: AlloyBytes::new(),
    }
    .abi_encode()
}

/// Fails unless the join's tokens, sorted, are exactly the tokens the pool has registered.
pub fn check_pool_tokens(
    expected: &[Address],
    pool_tokens: &[Address],
) -> Result<(), ExecutionError> {
    if expected != pool_tokens {
        let list = |tokens: &[Address]| {
            tokens
                .iter()
                .map(|token| token.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        return Err(ExecutionError::InvalidInput(format!(
            "Tokens [{}] do not match pool tokens [{}]",
            list(expected),
            list(pool_tokens)
        )));
    }
    Ok(())
}

/// Pairs the quoted amounts with the pool tokens, which the router returns in registration order.
pub fn max_amounts_in(
    tokens: &[Address],
    response: &[u8],
) -> Result<Vec<(Address, BigUint)>, ExecutionError> {
    let quoted = IRouter::queryAddLiquidityProportionalCall::abi_decode_returns(response, true)
        .map_err(|_| {
            ExecutionError::FatalError(
                "Failed to decode response for queryAddLiquidityProportional".to_string(),
            )
        })?
        .amountsIn;
    if quoted.len() != tokens.len() {
        return Err(ExecutionError::InvalidInput(format!(
            "Pool quoted {} amounts for {} tokens",
            quoted.len(),
            tokens.len()
        )));
    }
    Ok(tokens
        .iter()
        .copied()
        .zip(quoted.into_iter().map(u256_to_biguint))
        .collect())
}

pub fn add_liquidity_calldata(
    pool: Address,
    max_amounts_in: &[(Address, BigUint)],
    exact_bpt_out: &BigUint,
) -> Vec<u8> {
    IRouter::addLiquidityProportionalCall {
        pool,
        maxAmountsIn: max_amounts_in
            .iter()
            .map(|(_, amount)| biguint_to_u256(amount))
            .collect::<Vec<U256>>(),
        exactBptAmountOut: biguint_to_u256(exact_bpt_out),
        wethIsEth: false,
        userData: AlloyBytes::new(),
    }
    .abi_encode()
}

impl Workflow for ProportionalJoin {
    type Output = TransactionOutcome;

    fn execute(
        &self,
        assembler: &mut TransactionAssembler,
    ) -> Result<Submission<TransactionOutcome>, ExecutionError> {
        let pool = bytes_to_address(&self.pool)?;
        let tokens = self.sorted_tokens()?;
        let exact_bpt_out = parse_units(&self.exact_bpt_out, WAD_DECIMALS)?;

        let response = assembler
            .client()
            .call(pool, IPoolInfo::getTokensCall {}.abi_encode())?;
        let pool_tokens = IPoolInfo::getTokensCall::abi_decode_returns(&response, true)
            .map_err(|_| {
                ExecutionError::FatalError(format!("Failed to decode tokens of pool {}", pool))
            })?
            .tokens;
        check_pool_tokens(&tokens, &pool_tokens)?;

        info!(%pool, bpt = %format_units(&exact_bpt_out, WAD_DECIMALS), "Querying join amounts");
        let response = assembler
            .client()
            .call(assembler.router(), query_calldata(pool, &exact_bpt_out))
            .inspect_err(|err| error!(error = %err, "Error querying add liquidity proportional"))?;
        let amounts = max_amounts_in(&tokens, &response)?;

        let mut preview =
            Preview::new("PROPORTIONAL JOIN DETAILS", "Proceed with proportional join?")
                .detail("Pool", pool)
                .detail("BPT Out", format_units(&exact_bpt_out, WAD_DECIMALS));
        for (token, amount) in amounts.iter() {
            let decimals = assembler.erc20().decimals(*token)?;
            let amount = TokenAmount::new(Bytes::from(token.to_vec()), decimals, amount.clone());
            info!(%token, amount = %amount, "Token amount needed");
            preview = preview.detail(format!("Token {}", token), &amount);
        }

        let calls = vec![add_liquidity_calldata(pool, &amounts, &exact_bpt_out)];
        assembler.permit_batch_and_call(PermitCall {
            tokens: amounts,
            calls,
            gas: GasSettings::new(PROPORTIONAL_JOIN_GAS_LIMIT, GasPriceStrategy::Standard),
            preview,
        })
    }
}
