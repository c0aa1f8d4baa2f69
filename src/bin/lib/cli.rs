use std::{path::PathBuf, str::FromStr};

pub use clap::Parser;
use clap::Subcommand;
use tycho_common::Bytes;

#[derive(Parser)]
/// Operate Balancer V3 pools through Permit2
///
/// The wallet key is read from the PRIVATE_KEY environment variable (a .env file is loaded
/// first). Every value-bearing transaction is previewed and needs a y/n confirmation unless
/// --yes is given.
pub struct Cli {
    /// Network to operate on, as named in the networks file
    #[arg(long, global = true, default_value = "base")]
    pub network: String,

    /// Networks file to use instead of the bundled configuration
    #[arg(long, global = true)]
    pub networks_file: Option<PathBuf>,

    /// RPC endpoint, overriding RPC_URL and the network's default endpoint
    #[arg(long, global = true)]
    pub rpc_url: Option<String>,

    /// Submit without asking for confirmation
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Seed a registered pool with its first liquidity
    Initialize {
        #[arg(long)]
        pool: Bytes,

        /// Token and human decimal amount, as ADDRESS:AMOUNT. Repeat once per pool token
        #[arg(long = "token", value_parser = parse_token_amount, required = true)]
        tokens: Vec<(Bytes, String)>,

        /// Minimum BPT to receive
        #[arg(long, default_value = "0")]
        min_bpt_out: String,
    },
    /// Add liquidity in the pool's current proportions
    Join {
        #[arg(long)]
        pool: Bytes,

        /// Pool token address. Repeat once per pool token
        #[arg(long = "token", required = true)]
        tokens: Vec<Bytes>,

        /// Exact BPT to mint
        #[arg(long)]
        bpt_out: String,
    },
    /// Swap an exact amount of one token for another through a single pool
    Swap {
        #[arg(long)]
        pool: Bytes,

        #[arg(long)]
        token_in: Bytes,

        #[arg(long)]
        token_out: Bytes,

        /// Amount of token_in to sell
        #[arg(long)]
        amount: String,

        /// Minimum amount of token_out to receive
        #[arg(long)]
        min_amount_out: String,

        /// Deadline in seconds from now
        #[arg(long, default_value_t = 3600)]
        deadline: u64,

        /// Approve the router through Permit2 instead of directly on the token
        #[arg(long)]
        use_permit2: bool,
    },
    /// Deploy a weighted or stable pool from a JSON description
    Deploy {
        /// Path to the pool description, see config/pools/ for examples
        #[arg(long)]
        description: PathBuf,
    },
}

pub fn parse_token_amount(value: &str) -> Result<(Bytes, String), String> {
    let (token, amount) = value
        .split_once(':')
        .ok_or_else(|| format!("Expected ADDRESS:AMOUNT, got '{}'", value))?;
    let token = Bytes::from_str(token).map_err(|e| format!("Invalid token address: {}", e))?;
    if amount.trim().is_empty() {
        return Err(format!("Missing amount for token {}", token));
    }
    Ok((token, amount.trim().to_string()))
}
