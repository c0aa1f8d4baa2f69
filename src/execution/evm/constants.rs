use alloy_primitives::U256;

/// Environment variable holding the hex-encoded private key of the operating wallet.
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Allowance granted to Permit2 on the token contract.
pub const MAX_APPROVAL: U256 = U256::MAX;
/// Largest uint48, used as the Permit2 allowance expiration.
pub const MAX_PERMIT_EXPIRATION: u64 = (1 << 48) - 1;
/// Fixed-point precision of BPT amounts, weights and swap fees.
pub const WAD_DECIMALS: u8 = 18;
/// `TokenType.STANDARD` in the vault's token configuration.
pub const TOKEN_TYPE_STANDARD: u8 = 0;

pub const APPROVAL_GAS_LIMIT: u64 = 100_000;
pub const PERMIT2_APPROVAL_GAS_LIMIT: u64 = 200_000;
pub const PROPORTIONAL_JOIN_GAS_LIMIT: u64 = 500_000;
pub const SWAP_GAS_LIMIT: u64 = 500_000;
/// Used for pool deployments when gas estimation fails. Only fits in a big block.
pub const DEPLOY_FALLBACK_GAS_LIMIT: u64 = 15_000_000;

pub const BIG_BLOCK_GAS_PRICE_METHOD: &str = "eth_bigBlockGasPrice";
pub const BIG_BLOCK_FALLBACK_MULTIPLIER: u128 = 3;

pub const BIG_BLOCK_NOTICE: &str = "IMPORTANT: Please ensure your HyperCore account has the big \
                                    block flag set.\nYou can do this via the HyperCore interface \
                                    or by sending the evmUserModify action with usingBigBlocks \
                                    set to true.";
