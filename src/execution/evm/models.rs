use alloy::rpc::types::TransactionReceipt;
use alloy_primitives::{Address, B256};
use num_bigint::BigUint;

/// What remains of a submitted transaction once it is mined.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionOutcome {
    pub hash: B256,
    pub block_number: Option<u64>,
    /// The receipt's status flag.
    pub success: bool,
}

impl TransactionOutcome {
    pub fn from_receipt(receipt: &TransactionReceipt) -> Self {
        Self {
            hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.success {
            "Successful"
        } else {
            "Failed"
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DeployedPool {
    pub pool: Address,
    pub outcome: TransactionOutcome,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ApprovalStatus {
    /// No transaction was needed; holds the allowance that was found.
    AlreadySufficient(BigUint),
    Approved(TransactionOutcome),
}
