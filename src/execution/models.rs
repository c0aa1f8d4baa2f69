use std::{collections::HashMap, env, fs, path::Path};

use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use tycho_common::Bytes;

use crate::execution::errors::ExecutionError;

pub const DEFAULT_NETWORKS_JSON: &str = include_str!("../../config/networks.json");
/// Environment variable that overrides the configured RPC endpoint.
pub const RPC_URL_ENV: &str = "RPC_URL";

/// Chain-level deployment data: endpoints, the router and Permit2 contracts, and the factories
/// available for pool deployment.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Network {
    /// Key of the network in the configuration file.
    #[serde(default)]
    pub name: String,
    pub chain_id: u64,
    pub rpc_url: String,
    pub router: Bytes,
    pub permit2: Bytes,
    /// Whether the chain supports (and the workflows should price for) big blocks.
    #[serde(default)]
    pub big_blocks: bool,
    #[serde(default)]
    pub weighted_pool_factory: Option<Bytes>,
    #[serde(default)]
    pub stable_pool_factory: Option<Bytes>,
    pub initialize_gas_limit: u64,
}

impl Network {
    /// Looks up a network in the embedded `config/networks.json`.
    pub fn from_name(name: &str) -> Result<Self, ExecutionError> {
        Self::from_config_str(DEFAULT_NETWORKS_JSON, name)
    }

    /// Looks up a network in a user-supplied configuration file with the same layout as
    /// `config/networks.json`.
    pub fn from_file<P: AsRef<Path>>(path: P, name: &str) -> Result<Self, ExecutionError> {
        let config = fs::read_to_string(path)?;
        Self::from_config_str(&config, name)
    }

    fn from_config_str(config: &str, name: &str) -> Result<Self, ExecutionError> {
        let mut networks: HashMap<String, Network> = serde_json::from_str(config)?;
        let mut network = match networks.remove(name) {
            Some(network) => network,
            None => {
                let mut available: Vec<String> = networks.into_keys().collect();
                available.sort();
                return Err(ExecutionError::InvalidInput(format!(
                    "Unknown network '{}'. Available networks: {}",
                    name,
                    available.join(", ")
                )));
            }
        };
        network.name = name.to_string();
        Ok(network)
    }

    /// Gas pricing used by the workflows that follow the network's block mode.
    pub fn gas_price_strategy(&self) -> GasPriceStrategy {
        if self.big_blocks {
            GasPriceStrategy::BigBlock
        } else {
            GasPriceStrategy::Standard
        }
    }

    /// Picks the RPC endpoint: an explicit override first, then `RPC_URL`, then the configured
    /// default.
    pub fn resolve_rpc_url(&self, override_url: Option<String>) -> String {
        override_url
            .or_else(|| {
                dotenv().ok();
                env::var(RPC_URL_ENV).ok()
            })
            .unwrap_or_else(|| self.rpc_url.clone())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GasPriceStrategy {
    /// `eth_gasPrice`.
    Standard,
    /// Hyperliquid's `eth_bigBlockGasPrice`, falling back to a multiple of `eth_gasPrice`.
    BigBlock,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GasSettings {
    pub gas_limit: u64,
    pub price: GasPriceStrategy,
}

impl GasSettings {
    pub fn new(gas_limit: u64, price: GasPriceStrategy) -> Self {
        Self { gas_limit, price }
    }
}

/// Result of a workflow that ends in a confirmation prompt.
#[derive(Clone, Debug, PartialEq)]
pub enum Submission<T> {
    /// The operator declined; nothing was sent after the prompt.
    Cancelled,
    Mined(T),
}

impl<T> Submission<T> {
    pub fn mined(self) -> Option<T> {
        match self {
            Submission::Cancelled => None,
            Submission::Mined(value) => Some(value),
        }
    }
}

/// Seeds a pool with its first liquidity.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InitializePool {
    pub pool: Bytes,
    /// Token addresses paired with human decimal amounts.
    pub tokens: Vec<(Bytes, String)>,
    /// Minimum BPT to receive, as a human decimal (18 decimals).
    #[serde(default = "zero_amount")]
    pub min_bpt_out: String,
}

/// Adds liquidity in the pool's current proportions for an exact BPT amount.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ProportionalJoin {
    pub pool: Bytes,
    pub tokens: Vec<Bytes>,
    /// BPT to mint, as a human decimal (18 decimals).
    pub exact_bpt_out: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Approve the router directly on the token.
    Erc20,
    /// Approve Permit2 on the token, then approve the router on Permit2.
    Permit2,
}

/// A single-pool exact-in swap.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SwapExactIn {
    pub pool: Bytes,
    pub token_in: Bytes,
    pub token_out: Bytes,
    /// Amount of `token_in` to sell, as a human decimal.
    pub amount: String,
    /// Minimum amount of `token_out` to receive, as a human decimal.
    pub min_amount_out: String,
    /// Seconds from now after which the swap reverts.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    pub approval: ApprovalMode,
}

fn zero_amount() -> String {
    "0".to_string()
}

fn default_deadline_secs() -> u64 {
    3600
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PoolType {
    /// Normalized weights as human decimals, one per token, summing to 1.
    Weighted { normalized_weights: Vec<String> },
    Stable { amplification_parameter: u64 },
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PoolRoles {
    pub pause_manager: Bytes,
    pub swap_fee_manager: Bytes,
    pub pool_creator: Bytes,
}

/// Everything the pool factory's `create` needs, as read from a JSON description file.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PoolDeployment {
    pub name: String,
    pub symbol: String,
    pub tokens: Vec<Bytes>,
    pub pool_type: PoolType,
    /// Swap fee as a human decimal fraction, e.g. `"0.0025"` for 0.25%.
    pub swap_fee_percentage: String,
    pub roles: PoolRoles,
    /// If not set, the pool is deployed without hooks.
    #[serde(default)]
    pub pool_hooks_contract: Option<Bytes>,
    #[serde(default)]
    pub enable_donation: bool,
    #[serde(default)]
    pub disable_unbalanced_liquidity: bool,
    /// 32-byte deployment salt. If not set, the zero salt is used.
    #[serde(default)]
    pub salt: Option<Bytes>,
}

impl PoolDeployment {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ExecutionError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ExecutionError::InvalidInput(format!("Invalid pool deployment description: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_embedded_networks() {
        let base = Network::from_name("base").unwrap();
        assert_eq!(base.name, "base");
        assert_eq!(base.chain_id, 8453);
        assert!(!base.big_blocks);
        assert_eq!(base.gas_price_strategy(), GasPriceStrategy::Standard);
        assert_eq!(base.initialize_gas_limit, 1_000_000);

        let hyper = Network::from_name("hyperevm").unwrap();
        assert_eq!(hyper.chain_id, 999);
        assert_eq!(hyper.gas_price_strategy(), GasPriceStrategy::BigBlock);
        assert_eq!(hyper.initialize_gas_limit, 5_000_000);
        assert_eq!(
            hyper.weighted_pool_factory,
            Some(Bytes::from_str("0xE3881627B8DeeBCCF9c23B291430a549Fc0bE5F7").unwrap())
        );
        assert_eq!(hyper.permit2, base.permit2);
    }

    #[test]
    fn test_unknown_network() {
        let err = Network::from_name("mainnet").unwrap_err();
        assert_eq!(
            err,
            ExecutionError::InvalidInput(
                "Unknown network 'mainnet'. Available networks: base, hyperevm".to_string()
            )
        );
    }

    #[test]
    fn test_resolve_rpc_url_override() {
        let base = Network::from_name("base").unwrap();
        assert_eq!(
            base.resolve_rpc_url(Some("http://127.0.0.1:8545".to_string())),
            "http://127.0.0.1:8545"
        );
    }

    #[test]
    fn test_pool_deployment_from_json() {
        let deployment: PoolDeployment = serde_json::from_str(
            r#"{
                "name": "Stable USDT-feUSD",
                "symbol": "S-USDT-feUSD",
                "tokens": [
                    "0x02c6a2fA58cC01A18B8D9E00eA48d65E4dF26c70",
                    "0xB8CE59FC3717ada4C02eaDF9682A9e934F625ebb"
                ],
                "pool_type": { "type": "stable", "amplification_parameter": 500 },
                "swap_fee_percentage": "0.0005",
                "roles": {
                    "pause_manager": "0x082F554A92DA8311A8b6C62ba432b24F33790458",
                    "swap_fee_manager": "0x082F554A92DA8311A8b6C62ba432b24F33790458",
                    "pool_creator": "0x0000000000000000000000000000000000000000"
                }
            }"#,
        )
        .unwrap();

        assert_eq!(deployment.pool_type, PoolType::Stable { amplification_parameter: 500 });
        assert_eq!(deployment.tokens.len(), 2);
        assert!(!deployment.enable_donation);
        assert_eq!(deployment.salt, None);
        assert_eq!(deployment.pool_hooks_contract, None);
    }

    #[test]
    fn test_bundled_pool_descriptions() {
        let weighted = PoolDeployment::from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/config/pools/weighted_usdt_ueth.json"
        ))
        .unwrap();
        assert!(matches!(weighted.pool_type, PoolType::Weighted { .. }));

        let stable = PoolDeployment::from_file(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/config/pools/stable_usdt_feusd.json"
        ))
        .unwrap();
        assert!(matches!(stable.pool_type, PoolType::Stable { amplification_parameter: 500 }));
    }
}
