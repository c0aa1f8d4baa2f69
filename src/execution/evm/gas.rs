use tracing::{info, warn};

use crate::execution::{
    errors::ExecutionError,
    evm::{client::ChainClient, constants::BIG_BLOCK_FALLBACK_MULTIPLIER},
    models::GasPriceStrategy,
};

/// A source of gas price quotes.
pub trait GasPriceSource {
    fn gas_price(&self) -> Result<u128, ExecutionError>;
    fn big_block_gas_price(&self) -> Result<u128, ExecutionError>;
}

impl GasPriceSource for ChainClient {
    fn gas_price(&self) -> Result<u128, ExecutionError> {
        ChainClient::gas_price(self)
    }

    fn big_block_gas_price(&self) -> Result<u128, ExecutionError> {
        ChainClient::big_block_gas_price(self)
    }
}

impl GasPriceStrategy {
    /// Fetches the gas price for this strategy.
    ///
    /// A failing big block oracle is not fatal: the regular gas price scaled by
    /// `BIG_BLOCK_FALLBACK_MULTIPLIER` is used instead.
    pub fn resolve<S: GasPriceSource + ?Sized>(
        &self,
        source: &S,
    ) -> Result<u128, ExecutionError> {
        match self {
            GasPriceStrategy::Standard => source.gas_price(),
            GasPriceStrategy::BigBlock => match source.big_block_gas_price() {
                Ok(price) => {
                    info!(gas_price = price, "Big block gas price");
                    Ok(price)
                }
                Err(err) => {
                    warn!(error = %err, "Failed to get big block gas price");
                    let fallback = big_block_fallback(source.gas_price()?);
                    info!(gas_price = fallback, "Using fallback big block gas price");
                    Ok(fallback)
                }
            },
        }
    }
}

pub fn big_block_fallback(regular_price: u128) -> u128 {
    regular_price.saturating_mul(BIG_BLOCK_FALLBACK_MULTIPLIER)
}

/// Adds a 50% buffer on top of a gas estimate.
pub fn buffered_gas_limit(estimate: u64) -> u64 {
    estimate.saturating_mul(3) / 2
}
