pub mod approvals;
pub mod assembler;
pub mod assembler_builder;
pub mod client;
pub mod constants;
pub mod contracts;
pub mod gas;
pub mod models;
pub mod utils;
pub mod wallet;
pub mod workflows;
