//! The operator-facing workflows. Each one is a single linear run that ends in at most one
//! confirmed submission.
use crate::execution::{
    errors::ExecutionError, evm::assembler::TransactionAssembler, models::Submission,
};

pub mod deploy;
pub mod initialize;
pub mod proportional_join;
pub mod swap;

pub trait Workflow {
    type Output;

    fn execute(
        &self,
        assembler: &mut TransactionAssembler,
    ) -> Result<Submission<Self::Output>, ExecutionError>;
}
