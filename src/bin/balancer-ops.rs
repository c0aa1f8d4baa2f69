use balancer_ops::execution::{
    confirmation::{AutoConfirm, Confirmation, ConsolePrompt},
    errors::ExecutionError,
    evm::{
        assembler::TransactionAssembler, assembler_builder::TransactionAssemblerBuilder,
        models::TransactionOutcome, workflows::Workflow,
    },
    models::{
        ApprovalMode, InitializePool, Network, PoolDeployment, ProportionalJoin, Submission,
        SwapExactIn,
    },
};
use lib::cli::{Cli, Command, Parser};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

mod lib {
    pub mod cli;
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    let network = match &cli.networks_file {
        Some(path) => Network::from_file(path, &cli.network)?,
        None => Network::from_name(&cli.network)?,
    };
    let confirmation: Box<dyn Confirmation> =
        if cli.yes { Box::new(AutoConfirm) } else { Box::new(ConsolePrompt::stdio()) };

    let mut builder = TransactionAssemblerBuilder::new()
        .network(network)
        .confirmation(confirmation);
    if let Some(rpc_url) = cli.rpc_url {
        builder = builder.rpc_url(rpc_url);
    }
    let mut assembler = builder.build()?;
    println!("Using wallet: {}", assembler.wallet().address());
    println!("Connected to network with chain ID: {}", assembler.chain_id());

    match cli.command {
        Command::Initialize { pool, tokens, min_bpt_out } => {
            let workflow = InitializePool { pool, tokens, min_bpt_out };
            report(run(&mut assembler, &workflow)?, "Successfully initialized the pool!");
        }
        Command::Join { pool, tokens, bpt_out } => {
            let workflow = ProportionalJoin { pool, tokens, exact_bpt_out: bpt_out };
            report(run(&mut assembler, &workflow)?, "Successfully joined the pool!");
        }
        Command::Swap {
            pool,
            token_in,
            token_out,
            amount,
            min_amount_out,
            deadline,
            use_permit2,
        } => {
            let workflow = SwapExactIn {
                pool,
                token_in,
                token_out,
                amount,
                min_amount_out,
                deadline_secs: deadline,
                approval: if use_permit2 { ApprovalMode::Permit2 } else { ApprovalMode::Erc20 },
            };
            report(run(&mut assembler, &workflow)?, "Swap executed successfully!");
        }
        Command::Deploy { description } => {
            let workflow = PoolDeployment::from_file(&description)?;
            match assembler.execute(&workflow) {
                Ok(Submission::Cancelled) => {}
                Ok(Submission::Mined(deployed)) => {
                    print_outcome(&deployed.outcome);
                    println!("Pool deployed at: {}", deployed.pool);
                }
                Err(err) => {
                    if err
                        .to_string()
                        .contains("exceeds block gas limit")
                    {
                        print_gas_limit_hints();
                    }
                    return Err(err.into());
                }
            }
        }
    }
    Ok(())
}

fn run<W: Workflow<Output = TransactionOutcome>>(
    assembler: &mut TransactionAssembler,
    workflow: &W,
) -> Result<Submission<TransactionOutcome>, ExecutionError> {
    assembler.execute(workflow)
}

fn report(submission: Submission<TransactionOutcome>, success_message: &str) {
    if let Some(outcome) = submission.mined() {
        print_outcome(&outcome);
        if outcome.success {
            println!("{}", success_message);
        } else {
            println!("Transaction failed. Check the transaction hash for details.");
        }
    }
}

fn print_outcome(outcome: &TransactionOutcome) {
    println!("Transaction hash: {}", outcome.hash);
    println!("Transaction status: {}", outcome.status_label());
    if let Some(block) = outcome.block_number {
        println!("Transaction confirmed in block: {}", block);
    }
}

fn print_gas_limit_hints() {
    println!("\nThe deployment is too large for the block, even with big blocks.");
    println!("Possible solutions:");
    println!("1. Verify the big block flag is set for your HyperCore account");
    println!("2. Check that your account has been converted to a Core user");
    println!("3. Try simplifying the transaction");
    println!("4. Contact Hyperliquid support");
}

/// Logs to stderr. `RUST_LOG` takes precedence over `--verbose`.
fn setup_logger(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
