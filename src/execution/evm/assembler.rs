use std::sync::Arc;

use alloy::rpc::types::TransactionReceipt;
use alloy_primitives::{Address, Bytes as AlloyBytes, PrimitiveSignature as Signature, U256};
use alloy_sol_types::SolCall;
use num_bigint::BigUint;
use tracing::{debug, error, info};

use crate::execution::{
    amounts::format_units,
    confirmation::{Confirmation, Preview},
    errors::ExecutionError,
    evm::{
        approvals::{
            erc20::{self, Erc20},
            permit2::{
                build_permit_batch, permit2_domain, sign_permit_batch, Permit2, PermitRequest,
            },
        },
        client::{legacy_request, ChainClient},
        constants::{APPROVAL_GAS_LIMIT, MAX_APPROVAL},
        contracts::{IRouter, PermitBatch},
        models::{ApprovalStatus, TransactionOutcome},
        utils::bytes_to_address,
        wallet::Wallet,
        workflows::Workflow,
    },
    models::{GasPriceStrategy, GasSettings, Network, Submission},
};

/// A router call that pulls its tokens through a signed Permit2 batch.
pub struct PermitCall {
    /// Tokens the router needs to pull, with base-unit amounts.
    pub tokens: Vec<(Address, BigUint)>,
    /// Encoded router calls executed after the permit.
    pub calls: Vec<Vec<u8>>,
    pub gas: GasSettings,
    pub preview: Preview,
}

/// Runs the approve, sign and send sequence shared by every workflow.
///
/// Each step blocks until the node has answered. Nothing is retried: the first failing step
/// aborts the whole sequence.
pub struct TransactionAssembler {
    network: Network,
    router: Address,
    client: Arc<ChainClient>,
    wallet: Wallet,
    erc20: Erc20,
    permit2: Permit2,
    confirmation: Box<dyn Confirmation>,
}

impl TransactionAssembler {
    pub fn new(
        network: Network,
        client: Arc<ChainClient>,
        wallet: Wallet,
        confirmation: Box<dyn Confirmation>,
    ) -> Result<Self, ExecutionError> {
        let router = bytes_to_address(&network.router)?;
        let permit2 = Permit2::new(bytes_to_address(&network.permit2)?, client.clone());
        Ok(Self {
            erc20: Erc20::new(client.clone()),
            network,
            router,
            client,
            wallet,
            permit2,
            confirmation,
        })
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn chain_id(&self) -> u64 {
        self.network.chain_id
    }

    pub fn router(&self) -> Address {
        self.router
    }

    pub fn wallet(&self) -> &Wallet {
        &self.wallet
    }

    pub fn client(&self) -> &ChainClient {
        &self.client
    }

    pub fn erc20(&self) -> &Erc20 {
        &self.erc20
    }

    pub fn permit2(&self) -> &Permit2 {
        &self.permit2
    }

    pub fn confirmation(&mut self) -> &mut dyn Confirmation {
        self.confirmation.as_mut()
    }

    pub fn gas_price(&self, strategy: GasPriceStrategy) -> Result<u128, ExecutionError> {
        strategy.resolve(self.client.as_ref())
    }

    /// Makes sure `spender` may pull at least `required` of `token` from the wallet, approving
    /// `approve_amount` if it may not.
    pub fn ensure_allowance(
        &self,
        token: Address,
        spender: Address,
        required: &BigUint,
        approve_amount: U256,
        gas_limit: u64,
        gas_price: u128,
    ) -> Result<ApprovalStatus, ExecutionError> {
        let current = self
            .erc20
            .allowance(token, self.wallet.address(), spender)?;
        if !erc20::approval_needed(&current, required) {
            info!(%token, %spender, allowance = %current, "Allowance already sufficient");
            return Ok(ApprovalStatus::AlreadySufficient(current));
        }

        info!(%token, %spender, "Approving token");
        let data = erc20::approve_calldata(spender, approve_amount);
        let outcome = self.send_checked(token, data, gas_limit, gas_price, "Approval")?;
        Ok(ApprovalStatus::Approved(outcome))
    }

    /// Signs and sends a transaction with a freshly read sender nonce, then waits for its
    /// receipt.
    pub fn send_receipt(
        &self,
        to: Address,
        data: Vec<u8>,
        gas_limit: u64,
        gas_price: u128,
    ) -> Result<TransactionReceipt, ExecutionError> {
        let from = self.wallet.address();
        let nonce = self.client.transaction_count(from)?;
        debug!(%to, nonce, gas_limit, gas_price, calldata = %hex::encode(&data), "Sending");
        let request =
            legacy_request(from, to, data, gas_limit, gas_price, nonce, self.network.chain_id);
        let receipt = self
            .client
            .send(&self.wallet, request)?;
        info!(
            tx_hash = %receipt.transaction_hash,
            block = ?receipt.block_number,
            success = receipt.status(),
            "Transaction mined"
        );
        Ok(receipt)
    }

    pub fn send(
        &self,
        to: Address,
        data: Vec<u8>,
        gas_limit: u64,
        gas_price: u128,
    ) -> Result<TransactionOutcome, ExecutionError> {
        let receipt = self.send_receipt(to, data, gas_limit, gas_price)?;
        Ok(TransactionOutcome::from_receipt(&receipt))
    }

    /// Like [`send`](Self::send), but a mined transaction with a failed status is an error.
    pub fn send_checked(
        &self,
        to: Address,
        data: Vec<u8>,
        gas_limit: u64,
        gas_price: u128,
        label: &str,
    ) -> Result<TransactionOutcome, ExecutionError> {
        let outcome = self.send(to, data, gas_limit, gas_price)?;
        if !outcome.success {
            return Err(ExecutionError::TransactionFailed(format!(
                "{} transaction {} failed",
                label, outcome.hash
            )));
        }
        Ok(outcome)
    }

    /// Sends one transaction, asking for confirmation first when a preview is given.
    ///
    /// A mined transaction is returned even if its status is failed.
    pub fn submit_receipt(
        &mut self,
        to: Address,
        data: Vec<u8>,
        gas_limit: u64,
        gas_price: u128,
        preview: Option<Preview>,
    ) -> Result<Submission<TransactionReceipt>, ExecutionError> {
        if let Some(preview) = preview {
            let gwei = format_units(&BigUint::from(gas_price), 9);
            let preview = preview
                .detail("Gas Limit", gas_limit)
                .detail("Gas Price", format!("{} gwei", gwei));
            if !self.confirmation.confirm(&preview)? {
                info!("Submission cancelled by the operator");
                return Ok(Submission::Cancelled);
            }
        }
        Ok(Submission::Mined(self.send_receipt(to, data, gas_limit, gas_price)?))
    }

    pub fn submit(
        &mut self,
        to: Address,
        data: Vec<u8>,
        gas_limit: u64,
        gas_price: u128,
        preview: Option<Preview>,
    ) -> Result<Submission<TransactionOutcome>, ExecutionError> {
        Ok(match self.submit_receipt(to, data, gas_limit, gas_price, preview)? {
            Submission::Cancelled => Submission::Cancelled,
            Submission::Mined(receipt) => {
                Submission::Mined(TransactionOutcome::from_receipt(&receipt))
            }
        })
    }

    /// Approves Permit2 where needed, signs a permit batch for the router and submits
    /// `permitBatchAndCall` with the given router calls.
    pub fn permit_batch_and_call(
        &mut self,
        call: PermitCall,
    ) -> Result<Submission<TransactionOutcome>, ExecutionError> {
        let gas_price = self.gas_price(call.gas.price)?;
        let owner = self.wallet.address();

        for (token, amount) in call.tokens.iter() {
            self.ensure_allowance(
                *token,
                self.permit2.address(),
                amount,
                MAX_APPROVAL,
                APPROVAL_GAS_LIMIT,
                gas_price,
            )?;
        }

        let mut requests = Vec::with_capacity(call.tokens.len());
        for (token, amount) in call.tokens {
            let (_, _, nonce) = self
                .permit2
                .get_existing_allowance(owner, token, self.router)
                .inspect_err(|err| error!(%token, error = %err, "Failed to get Permit2 nonce"))?;
            debug!(%token, %nonce, "Permit2 nonce");
            requests.push(PermitRequest { token, amount, nonce });
        }

        let batch = build_permit_batch(&requests, self.router)?;
        let domain = permit2_domain(self.network.chain_id, self.permit2.address());
        let signature = sign_permit_batch(&self.wallet, &batch, &domain)?;
        debug!(signature = %hex::encode(signature.as_bytes()), "Signed permit batch");

        let data = encode_permit_batch_and_call(batch, &signature, call.calls);
        self.submit(self.router, data, call.gas.gas_limit, gas_price, Some(call.preview))
    }

    pub fn execute<W: Workflow + ?Sized>(
        &mut self,
        workflow: &W,
    ) -> Result<Submission<W::Output>, ExecutionError> {
        workflow.execute(self)
    }
}

/// Encodes `permitBatchAndCall` with no EIP-2612 permits.
pub fn encode_permit_batch_and_call(
    batch: PermitBatch,
    signature: &Signature,
    calls: Vec<Vec<u8>>,
) -> Vec<u8> {
    IRouter::permitBatchAndCallCall {
        permitBatch: vec![],
        permitSignatures: vec![],
        permit2Batch: batch,
        permit2Signature: AlloyBytes::from(signature.as_bytes().to_vec()),
        multicallData: calls
            .into_iter()
            .map(AlloyBytes::from)
            .collect(),
    }
    .abi_encode()
}
