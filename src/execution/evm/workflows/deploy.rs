use alloy::rpc::types::Log;
use alloy_primitives::{Address, B256, U256};
use alloy_sol_types::{SolCall, SolEvent};
use num_bigint::BigUint;
use tracing::{info, warn};

use crate::execution::{
    amounts::{format_units, one_unit, parse_units},
    confirmation::Preview,
    errors::ExecutionError,
    evm::{
        assembler::TransactionAssembler,
        constants::{
            BIG_BLOCK_NOTICE, DEPLOY_FALLBACK_GAS_LIMIT, TOKEN_TYPE_STANDARD, WAD_DECIMALS,
        },
        contracts::{
            IBasePoolFactory, IStablePoolFactory, IWeightedPoolFactory, PoolRoleAccounts,
            TokenConfig,
        },
        gas::buffered_gas_limit,
        models::{DeployedPool, TransactionOutcome},
        utils::{biguint_to_u256, bytes_to_address, bytes_to_b256, sort_by_address},
        workflows::Workflow,
    },
    models::{Network, PoolDeployment, PoolType, Submission},
};

/// A validated factory `create` call.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparedDeployment {
    pub factory: Address,
    pub calldata: Vec<u8>,
    /// Pool tokens in registration order.
    pub tokens: Vec<Address>,
    /// Normalized weights aligned with `tokens`, for weighted pools.
    pub weights: Option<Vec<BigUint>>,
    pub swap_fee: BigUint,
}

fn token_config(token: Address) -> TokenConfig {
    TokenConfig {
        token,
        tokenType: TOKEN_TYPE_STANDARD,
        rateProvider: Address::ZERO,
        paysYieldFees: false,
    }
}

/// Validates a pool description against the network and encodes the factory call. No network
/// access.
pub fn prepare_deployment(
    deployment: &PoolDeployment,
    network: &Network,
) -> Result<PreparedDeployment, ExecutionError> {
    if deployment.tokens.len() < 2 {
        return Err(ExecutionError::InvalidInput(format!(
            "A pool needs at least two tokens, got {}",
            deployment.tokens.len()
        )));
    }
    let tokens = deployment
        .tokens
        .iter()
        .map(bytes_to_address)
        .collect::<Result<Vec<_>, ExecutionError>>()?;

    let roles = PoolRoleAccounts {
        pauseManager: bytes_to_address(&deployment.roles.pause_manager)?,
        swapFeeManager: bytes_to_address(&deployment.roles.swap_fee_manager)?,
        poolCreator: bytes_to_address(&deployment.roles.pool_creator)?,
    };
    let swap_fee = parse_units(&deployment.swap_fee_percentage, WAD_DECIMALS)?;
    let hooks = match &deployment.pool_hooks_contract {
        Some(hooks) => bytes_to_address(hooks)?,
        None => Address::ZERO,
    };
    let salt = match &deployment.salt {
        Some(salt) => bytes_to_b256(salt)?,
        None => B256::ZERO,
    };

    match &deployment.pool_type {
        PoolType::Weighted { normalized_weights } => {
            if normalized_weights.len() != tokens.len() {
                return Err(ExecutionError::InvalidInput(format!(
                    "Expected {} weights, one per token, got {}",
                    tokens.len(),
                    normalized_weights.len()
                )));
            }
            let weights = normalized_weights
                .iter()
                .map(|weight| parse_units(weight, WAD_DECIMALS))
                .collect::<Result<Vec<_>, ExecutionError>>()?;
            let total: BigUint = weights.iter().sum();
            if total != one_unit(WAD_DECIMALS) {
                return Err(ExecutionError::InvalidInput(format!(
                    "Weights must sum to 1e18, got {}",
                    total
                )));
            }
            let (tokens, weights): (Vec<Address>, Vec<BigUint>) =
                sort_by_address(tokens.into_iter().zip(weights).collect())?
                    .into_iter()
                    .unzip();

            let factory =
                factory_address(network.weighted_pool_factory.as_ref(), network, "weighted")?;
            let calldata = IWeightedPoolFactory::createCall {
                name: deployment.name.clone(),
                symbol: deployment.symbol.clone(),
                tokens: tokens.iter().copied().map(token_config).collect(),
                normalizedWeights: weights.iter().map(biguint_to_u256).collect(),
                roleAccounts: roles,
                swapFeePercentage: biguint_to_u256(&swap_fee),
                poolHooksContract: hooks,
                enableDonation: deployment.enable_donation,
                disableUnbalancedLiquidity: deployment.disable_unbalanced_liquidity,
                salt,
            }
            .abi_encode();
            Ok(PreparedDeployment { factory, calldata, tokens, weights: Some(weights), swap_fee })
        }
        PoolType::Stable { amplification_parameter } => {
            let tokens: Vec<Address> =
                sort_by_address(tokens.into_iter().map(|token| (token, ())).collect())?
                    .into_iter()
                    .map(|(token, _)| token)
                    .collect();

            let factory =
                factory_address(network.stable_pool_factory.as_ref(), network, "stable")?;
            let calldata = IStablePoolFactory::createCall {
                name: deployment.name.clone(),
                symbol: deployment.symbol.clone(),
                tokens: tokens.iter().copied().map(token_config).collect(),
                amplificationParameter: U256::from(*amplification_parameter),
                roleAccounts: roles,
                swapFeePercentage: biguint_to_u256(&swap_fee),
                poolHooksContract: hooks,
                enableDonation: deployment.enable_donation,
                disableUnbalancedLiquidity: deployment.disable_unbalanced_liquidity,
                salt,
            }
            .abi_encode();
            Ok(PreparedDeployment { factory, calldata, tokens, weights: None, swap_fee })
        }
    }
}

fn factory_address(
    factory: Option<&tycho_common::Bytes>,
    network: &Network,
    kind: &str,
) -> Result<Address, ExecutionError> {
    match factory {
        Some(factory) => bytes_to_address(factory),
        None => Err(ExecutionError::InvalidInput(format!(
            "Network '{}' has no {} pool factory configured",
            network.name, kind
        ))),
    }
}

/// Finds the new pool's address in the factory's logs.
///
/// Prefers a decodable `PoolCreated` event and falls back to the first indexed topic of any log
/// the factory emitted.
pub fn find_created_pool(logs: &[Log], factory: Address) -> Result<Address, ExecutionError> {
    let factory_logs = || {
        logs.iter()
            .filter(move |log| log.address() == factory)
    };
    if let Some(event) = factory_logs()
        .find_map(|log| IBasePoolFactory::PoolCreated::decode_log_data(log.data(), true).ok())
    {
        return Ok(event.pool);
    }
    factory_logs()
        .find_map(|log| {
            log.topics()
                .get(1)
                .map(|topic| Address::from_word(*topic))
        })
        .ok_or_else(|| {
            ExecutionError::TransactionFailed(
                "Pool address not found in transaction logs".to_string(),
            )
        })
}

/// Gas limit for a factory `create` call: the buffered estimate, or a fixed fallback when the node
/// cannot estimate.
pub fn deployment_gas_limit(estimate: Result<u64, ExecutionError>) -> u64 {
    match estimate {
        Ok(estimate) => {
            let gas_limit = buffered_gas_limit(estimate);
            info!(estimate, gas_limit, "Estimated deployment gas");
            gas_limit
        }
        Err(err) => {
            warn!(
                error = %err,
                gas_limit = DEPLOY_FALLBACK_GAS_LIMIT,
                "Gas estimation failed, using fallback gas limit"
            );
            DEPLOY_FALLBACK_GAS_LIMIT
        }
    }
}

impl Workflow for PoolDeployment {
    type Output = DeployedPool;

    fn execute(
        &self,
        assembler: &mut TransactionAssembler,
    ) -> Result<Submission<DeployedPool>, ExecutionError> {
        let network = assembler.network().clone();
        let prepared = prepare_deployment(self, &network)?;

        if network.big_blocks {
            assembler
                .confirmation()
                .acknowledge(BIG_BLOCK_NOTICE)?;
        }

        let gas_price = assembler.gas_price(network.gas_price_strategy())?;
        let from = assembler.wallet().address();
        let gas_limit = deployment_gas_limit(assembler.client().estimate_gas(
            from,
            prepared.factory,
            prepared.calldata.clone(),
        ));

        let mut preview = Preview::new(
            "POOL DEPLOYMENT DETAILS",
            if network.big_blocks {
                "Proceed with BIG BLOCK pool deployment?"
            } else {
                "Proceed with pool deployment?"
            },
        )
        .detail("Pool Name", &self.name)
        .detail("Pool Symbol", &self.symbol)
        .detail("Factory", prepared.factory)
        .detail(
            "Tokens",
            prepared
                .tokens
                .iter()
                .map(|token| token.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        );
        preview = match (&self.pool_type, &prepared.weights) {
            (PoolType::Stable { amplification_parameter }, _) => {
                preview.detail("Amplification Parameter", amplification_parameter)
            }
            (PoolType::Weighted { .. }, Some(weights)) => preview.detail(
                "Normalized Weights",
                weights
                    .iter()
                    .map(|weight| format_units(weight, WAD_DECIMALS))
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            (PoolType::Weighted { .. }, None) => preview,
        };
        preview = preview.detail("Swap Fee", format_units(&prepared.swap_fee, WAD_DECIMALS));

        let receipt = match assembler.submit_receipt(
            prepared.factory,
            prepared.calldata,
            gas_limit,
            gas_price,
            Some(preview),
        )? {
            Submission::Cancelled => return Ok(Submission::Cancelled),
            Submission::Mined(receipt) => receipt,
        };
        let outcome = TransactionOutcome::from_receipt(&receipt);
        if !outcome.success {
            return Err(ExecutionError::TransactionFailed(format!(
                "Pool deployment transaction {} failed",
                outcome.hash
            )));
        }
        let pool = find_created_pool(receipt.inner.logs(), prepared.factory)?;
        info!(%pool, "Pool deployed");
        Ok(Submission::Mined(DeployedPool { pool, outcome }))
    }
}
