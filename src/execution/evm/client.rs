use std::{future::Future, sync::Arc};

use alloy::{
    eips::eip2718::Encodable2718,
    network::TransactionBuilder,
    providers::{Provider, RootProvider},
    rpc::types::{TransactionInput, TransactionReceipt, TransactionRequest},
    transports::BoxTransport,
};
use alloy_primitives::{Address, Bytes as AlloyBytes, TxKind, U128, U64};
use serde::Deserialize;
use tokio::{
    runtime::{Handle, Runtime},
    task::block_in_place,
};
use tracing::{debug, info};

use crate::execution::{
    errors::ExecutionError,
    evm::{
        constants::BIG_BLOCK_GAS_PRICE_METHOD,
        utils::{get_client, get_runtime},
        wallet::Wallet,
    },
};

#[derive(Debug, Deserialize)]
struct BlockTimestamp {
    timestamp: U64,
}

/// Blocking access to a JSON-RPC endpoint.
///
/// Every method waits for the node's response before returning.
pub struct ChainClient {
    client: Arc<RootProvider<BoxTransport>>,
    runtime_handle: Handle,
    // Store the runtime to prevent it from being dropped before use.
    // This is required since balancer-ops does not have a pre-existing runtime.
    // However, if the library is used in a context where a runtime already exists, it is not
    // necessary to store it.
    #[allow(dead_code)]
    runtime: Option<Arc<Runtime>>,
}

impl ChainClient {
    pub fn new(rpc_url: &str) -> Result<Self, ExecutionError> {
        let (handle, runtime) = get_runtime()?;
        let client = block_in_place(|| handle.block_on(get_client(rpc_url)))?;
        debug!(rpc_url, "Connected to RPC endpoint");
        Ok(Self { client, runtime_handle: handle, runtime })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        block_in_place(|| self.runtime_handle.block_on(future))
    }

    pub fn chain_id(&self) -> Result<u64, ExecutionError> {
        self.block_on(async { self.client.get_chain_id().await })
            .map_err(|err| {
                ExecutionError::RecoverableError(format!(
                    "Failed to fetch chain id with error: {:?}",
                    err
                ))
            })
    }

    pub fn gas_price(&self) -> Result<u128, ExecutionError> {
        self.block_on(async { self.client.get_gas_price().await })
            .map_err(|err| {
                ExecutionError::RecoverableError(format!(
                    "Failed to fetch gas price with error: {:?}",
                    err
                ))
            })
    }

    /// Hyperliquid-specific gas price for transactions that go into big blocks.
    pub fn big_block_gas_price(&self) -> Result<u128, ExecutionError> {
        let price: U128 = self
            .block_on(async {
                self.client
                    .raw_request::<_, U128>(
                        BIG_BLOCK_GAS_PRICE_METHOD.into(),
                        Vec::<String>::new(),
                    )
                    .await
            })
            .map_err(|err| {
                ExecutionError::RecoverableError(format!(
                    "Failed to fetch big block gas price with error: {:?}",
                    err
                ))
            })?;
        Ok(price.to::<u128>())
    }

    pub fn latest_block_timestamp(&self) -> Result<u64, ExecutionError> {
        let block = self
            .block_on(async {
                self.client
                    .raw_request::<_, Option<BlockTimestamp>>(
                        "eth_getBlockByNumber".into(),
                        ("latest", false),
                    )
                    .await
            })
            .map_err(|err| {
                ExecutionError::RecoverableError(format!(
                    "Failed to fetch latest block with error: {:?}",
                    err
                ))
            })?
            .ok_or_else(|| {
                ExecutionError::RecoverableError("Node returned no latest block".to_string())
            })?;
        Ok(block.timestamp.to::<u64>())
    }

    pub fn transaction_count(&self, address: Address) -> Result<u64, ExecutionError> {
        self.block_on(async {
            self.client
                .get_transaction_count(address)
                .await
        })
        .map_err(|err| {
            ExecutionError::RecoverableError(format!(
                "Failed to fetch transaction count with error: {:?}",
                err
            ))
        })
    }

    /// Executes a read-only call against the latest block.
    pub fn call(&self, to: Address, data: Vec<u8>) -> Result<AlloyBytes, ExecutionError> {
        let tx = TransactionRequest {
            to: Some(TxKind::from(to)),
            input: TransactionInput { input: Some(AlloyBytes::from(data)), data: None },
            ..Default::default()
        };
        self.block_on(async { self.client.call(&tx).await })
            .map_err(|err| {
                ExecutionError::RecoverableError(format!(
                    "Call to {} failed with error: {:?}",
                    to, err
                ))
            })
    }

    pub fn estimate_gas(
        &self,
        from: Address,
        to: Address,
        data: Vec<u8>,
    ) -> Result<u64, ExecutionError> {
        let tx = TransactionRequest {
            from: Some(from),
            to: Some(TxKind::from(to)),
            input: TransactionInput { input: Some(AlloyBytes::from(data)), data: None },
            ..Default::default()
        };
        self.block_on(async { self.client.estimate_gas(&tx).await })
            .map_err(|err| {
                ExecutionError::RecoverableError(format!(
                    "Gas estimation failed with error: {:?}",
                    err
                ))
            })
    }

    /// Signs the request locally, broadcasts it and blocks until its receipt is available.
    ///
    /// There is no timeout on the receipt wait.
    pub fn send(
        &self,
        wallet: &Wallet,
        request: TransactionRequest,
    ) -> Result<TransactionReceipt, ExecutionError> {
        self.block_on(async {
            let envelope = request
                .build(wallet.network_wallet())
                .await
                .map_err(|err| {
                    ExecutionError::FatalError(format!(
                        "Failed to sign transaction with error: {}",
                        err
                    ))
                })?;
            let pending_tx = self
                .client
                .send_raw_transaction(&envelope.encoded_2718())
                .await
                .map_err(|err| {
                    ExecutionError::TransactionFailed(format!(
                        "Failed to send transaction with error: {:?}",
                        err
                    ))
                })?;
            info!(tx_hash = %pending_tx.tx_hash(), "Transaction sent");
            pending_tx
                .get_receipt()
                .await
                .map_err(|err| {
                    ExecutionError::RecoverableError(format!(
                        "Failed to fetch transaction receipt with error: {:?}",
                        err
                    ))
                })
        })
    }
}

/// Builds a legacy (gas price) transaction request.
pub fn legacy_request(
    from: Address,
    to: Address,
    data: Vec<u8>,
    gas_limit: u64,
    gas_price: u128,
    nonce: u64,
    chain_id: u64,
) -> TransactionRequest {
    TransactionRequest::default()
        .with_from(from)
        .with_to(to)
        .with_input(data)
        .with_gas_limit(gas_limit)
        .with_gas_price(gas_price)
        .with_nonce(nonce)
        .with_chain_id(chain_id)
}
