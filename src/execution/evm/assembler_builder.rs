use std::sync::Arc;

use tracing::{info, warn};

use crate::execution::{
    confirmation::{Confirmation, ConsolePrompt},
    errors::ExecutionError,
    evm::{assembler::TransactionAssembler, client::ChainClient, wallet::Wallet},
    models::Network,
};

/// Builder pattern for constructing a `TransactionAssembler` with customizable options.
///
/// Only the network is required. The RPC endpoint defaults to `RPC_URL` or the network's
/// configured endpoint, the private key to `PRIVATE_KEY`, and confirmation to a console prompt.
pub struct TransactionAssemblerBuilder {
    network: Option<Network>,
    rpc_url: Option<String>,
    private_key: Option<String>,
    confirmation: Option<Box<dyn Confirmation>>,
}

impl Default for TransactionAssemblerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionAssemblerBuilder {
    pub fn new() -> Self {
        TransactionAssemblerBuilder {
            network: None,
            rpc_url: None,
            private_key: None,
            confirmation: None,
        }
    }

    pub fn network(mut self, network: Network) -> Self {
        self.network = Some(network);
        self
    }

    /// Sets the RPC endpoint manually, taking precedence over `RPC_URL`.
    pub fn rpc_url(mut self, rpc_url: String) -> Self {
        self.rpc_url = Some(rpc_url);
        self
    }

    /// Sets the private key manually.
    /// If it's not set, the key is read from the `PRIVATE_KEY` environment variable.
    pub fn private_key(mut self, private_key: String) -> Self {
        self.private_key = Some(private_key);
        self
    }

    pub fn confirmation(mut self, confirmation: Box<dyn Confirmation>) -> Self {
        self.confirmation = Some(confirmation);
        self
    }

    /// Loads the wallet, connects to the endpoint and checks that it serves the configured chain.
    pub fn build(self) -> Result<TransactionAssembler, ExecutionError> {
        let Some(network) = self.network else {
            return Err(ExecutionError::FatalError(
                "Please set the network before building the assembler".to_string(),
            ));
        };
        let wallet = match self.private_key {
            Some(private_key) => Wallet::from_private_key(&private_key)?,
            None => Wallet::from_env()?,
        };

        let rpc_url = network.resolve_rpc_url(self.rpc_url);
        let client = Arc::new(ChainClient::new(&rpc_url)?);
        let chain_id = client.chain_id()?;
        if chain_id != network.chain_id {
            warn!(expected = network.chain_id, actual = chain_id, "Chain id mismatch");
            return Err(ExecutionError::InvalidInput(format!(
                "RPC endpoint {} serves chain {}, but network '{}' is chain {}",
                rpc_url, chain_id, network.name, network.chain_id
            )));
        }
        info!(network = %network.name, chain_id, wallet = %wallet.address(), "Connected");

        let confirmation = self
            .confirmation
            .unwrap_or_else(|| Box::new(ConsolePrompt::stdio()));
        TransactionAssembler::new(network, client, wallet, confirmation)
    }
}
