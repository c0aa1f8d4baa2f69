pub mod erc20;
pub mod permit2;
