pub mod amounts;
pub mod confirmation;
pub mod errors;
#[cfg(feature = "evm")]
pub mod evm;
pub mod models;
