use alloy_primitives::{aliases::U48, Address, Bytes as AlloyBytes, U256};
use alloy_sol_types::SolCall;
use chrono::Utc;
use num_bigint::BigUint;
use tracing::{info, warn};

use crate::execution::{
    amounts::{format_units, parse_units},
    confirmation::Preview,
    errors::ExecutionError,
    evm::{
        approvals::permit2::{self, to_u160},
        assembler::TransactionAssembler,
        constants::{
            APPROVAL_GAS_LIMIT, MAX_APPROVAL, MAX_PERMIT_EXPIRATION, PERMIT2_APPROVAL_GAS_LIMIT,
            SWAP_GAS_LIMIT,
        },
        contracts::IRouter,
        models::TransactionOutcome,
        utils::{biguint_to_u256, bytes_to_address},
        workflows::Workflow,
    },
    models::{ApprovalMode, GasPriceStrategy, Submission, SwapExactIn},
};

pub fn check_balance(
    balance: &BigUint,
    required: &BigUint,
    decimals: u8,
) -> Result<(), ExecutionError> {
    if balance < required {
        return Err(ExecutionError::InvalidInput(format!(
            "Insufficient balance. Have: {}, Need: {}",
            format_units(balance, decimals),
            format_units(required, decimals)
        )));
    }
    Ok(())
}

/// The time a swap deadline counts from: the latest block's timestamp, or the local clock when the
/// node cannot report it.
pub fn deadline_reference(block_timestamp: Result<u64, ExecutionError>, local_now: i64) -> u64 {
    match block_timestamp {
        Ok(timestamp) => timestamp,
        Err(err) => {
            warn!(error = %err, "Latest block unavailable, using local clock for the deadline");
            local_now.max(0) as u64
        }
    }
}

/// Unix timestamp `deadline_secs` after `now`.
pub fn swap_deadline(now: u64, deadline_secs: u64) -> u64 {
    now.saturating_add(deadline_secs)
}

/// The Permit2 router approval expires together with the swap, so the deadline has to fit in a
/// uint48.
fn permit_expiration(deadline: u64) -> Result<U48, ExecutionError> {
    if deadline > MAX_PERMIT_EXPIRATION {
        return Err(ExecutionError::InvalidInput(format!(
            "Deadline {} does not fit in uint48",
            deadline
        )));
    }
    Ok(U48::from(deadline))
}

pub fn swap_calldata(
    pool: Address,
    token_in: Address,
    token_out: Address,
    amount_in: &BigUint,
    min_amount_out: &BigUint,
    deadline: u64,
) -> Vec<u8> {
    IRouter::swapSingleTokenExactInCall {
        pool,
        tokenIn: token_in,
        tokenOut: token_out,
        exactAmountIn: biguint_to_u256(amount_in),
        minAmountOut: biguint_to_u256(min_amount_out),
        deadline: U256::from(deadline),
        wethIsEth: false,
        userData: AlloyBytes::new(),
    }
    .abi_encode()
}

impl Workflow for SwapExactIn {
    type Output = TransactionOutcome;

    fn execute(
        &self,
        assembler: &mut TransactionAssembler,
    ) -> Result<Submission<TransactionOutcome>, ExecutionError> {
        let pool = bytes_to_address(&self.pool)?;
        let token_in = bytes_to_address(&self.token_in)?;
        let token_out = bytes_to_address(&self.token_out)?;
        if token_in == token_out {
            return Err(ExecutionError::InvalidInput(
                "Token in and token out must be different".to_string(),
            ));
        }

        let decimals_in = assembler.erc20().decimals(token_in)?;
        let decimals_out = assembler.erc20().decimals(token_out)?;
        let amount_in = parse_units(&self.amount, decimals_in)?;
        let min_amount_out = parse_units(&self.min_amount_out, decimals_out)?;

        let owner = assembler.wallet().address();
        let balance = assembler
            .erc20()
            .balance_of(token_in, owner)?;
        check_balance(&balance, &amount_in, decimals_in)?;

        let now = deadline_reference(
            assembler.client().latest_block_timestamp(),
            Utc::now().timestamp(),
        );
        let deadline = swap_deadline(now, self.deadline_secs);
        let gas_price = assembler.gas_price(GasPriceStrategy::Standard)?;
        let router = assembler.router();

        match self.approval {
            ApprovalMode::Erc20 => {
                assembler.ensure_allowance(
                    token_in,
                    router,
                    &amount_in,
                    biguint_to_u256(&amount_in),
                    APPROVAL_GAS_LIMIT,
                    gas_price,
                )?;
            }
            ApprovalMode::Permit2 => {
                let permit2_address = assembler.permit2().address();
                assembler.ensure_allowance(
                    token_in,
                    permit2_address,
                    &amount_in,
                    MAX_APPROVAL,
                    APPROVAL_GAS_LIMIT,
                    gas_price,
                )?;
                info!(%token_in, %router, "Approving router via Permit2");
                let data = permit2::approve_calldata(
                    token_in,
                    router,
                    to_u160(&amount_in)?,
                    permit_expiration(deadline)?,
                );
                assembler.send_checked(
                    permit2_address,
                    data,
                    PERMIT2_APPROVAL_GAS_LIMIT,
                    gas_price,
                    "Permit2 router approval",
                )?;
            }
        }

        let preview = Preview::new("SWAP DETAILS", "Proceed with swap?")
            .detail("Pool", pool)
            .detail("Token In", token_in)
            .detail("Token Out", token_out)
            .detail("Amount In", format_units(&amount_in, decimals_in))
            .detail("Min Amount Out", format_units(&min_amount_out, decimals_out))
            .detail("Deadline", deadline);
        let data = swap_calldata(pool, token_in, token_out, &amount_in, &min_amount_out, deadline);
        assembler.submit(router, data, SWAP_GAS_LIMIT, gas_price, Some(preview))
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::short(239999u64, 240000u64, false)]
    #[case::exact(240000u64, 240000u64, true)]
    #[case::plenty(1_000_000u64, 240000u64, true)]
    fn test_check_balance(#[case] balance: u64, #[case] required: u64, #[case] ok: bool) {
        let result = check_balance(&BigUint::from(balance), &BigUint::from(required), 6);
        assert_eq!(result.is_ok(), ok);
    }

    #[test]
    fn test_check_balance_message() {
        let err =
            check_balance(&BigUint::from(100000u32), &BigUint::from(240000u32), 6).unwrap_err();
        assert_eq!(
            err,
            ExecutionError::InvalidInput("Insufficient balance. Have: 0.1, Need: 0.24".to_string())
        );
    }

    #[rstest]
    #[case::default_hour(1_700_000_000, 3600, 1_700_003_600)]
    #[case::zero_window(1_700_000_000, 0, 1_700_000_000)]
    #[case::saturates(u64::MAX, 3600, u64::MAX)]
    fn test_swap_deadline(#[case] now: u64, #[case] secs: u64, #[case] expected: u64) {
        assert_eq!(swap_deadline(now, secs), expected);
    }

    #[rstest]
    #[case::chain_time_wins(Ok(1_700_000_000), 1_800_000_000, 1_700_000_000)]
    #[case::local_fallback(
        Err(ExecutionError::RecoverableError("connection refused".to_string())),
        1_800_000_000,
        1_800_000_000
    )]
    #[case::clock_before_epoch(
        Err(ExecutionError::RecoverableError("connection refused".to_string())),
        -5,
        0
    )]
    fn test_deadline_reference(
        #[case] block_timestamp: Result<u64, ExecutionError>,
        #[case] local_now: i64,
        #[case] expected: u64,
    ) {
        assert_eq!(deadline_reference(block_timestamp, local_now), expected);
    }

    #[test]
    fn test_permit_expiration_bounds() {
        assert_eq!(permit_expiration(1_700_003_600).unwrap(), U48::from(1_700_003_600u64));
        assert!(permit_expiration(MAX_PERMIT_EXPIRATION + 1).is_err());
    }

    #[test]
    fn test_swap_calldata() {
        let pool = Address::from_str("0xb537c62307D25F1eb70b720F5850B8C638240F1B").unwrap();
        let usdt = Address::from_str("0xB8CE59FC3717ada4C02eaDF9682A9e934F625ebb").unwrap();
        let ueth = Address::from_str("0xBe6727B535545C67d5cAa73dEa54865B92CF7907").unwrap();
        let data = swap_calldata(
            pool,
            usdt,
            ueth,
            &BigUint::from(240000u32),
            &BigUint::from(1u32),
            1_700_003_600,
        );

        let decoded = IRouter::swapSingleTokenExactInCall::abi_decode(&data, true).unwrap();
        assert_eq!(decoded.pool, pool);
        assert_eq!(decoded.tokenIn, usdt);
        assert_eq!(decoded.tokenOut, ueth);
        assert_eq!(decoded.exactAmountIn, U256::from(240000u32));
        assert_eq!(decoded.minAmountOut, U256::from(1u32));
        assert_eq!(decoded.deadline, U256::from(1_700_003_600u64));
        assert!(!decoded.wethIsEth);
    }
}
