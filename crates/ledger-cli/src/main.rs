use anyhow::Result;
use clap::{Parser, Subcommand};
use ledger_core::{KeyPair, Ledger, LedgerConfig, LogSink, Transaction};
use ledger_storage::{FileLogSink, DEFAULT_LOG_FILE};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "ledger-cli")]
#[command(about = "Key generation and a one-transaction demo of the ledger")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a secp256k1 key pair
    Keygen,
    /// Sign one transfer, mine it, and report the resulting balance
    Demo(DemoArgs),
}

#[derive(clap::Args, Debug, Clone)]
struct DemoArgs {
    /// Sender's private key (hex). A fresh key pair is generated if omitted.
    #[arg(long)]
    private_key: Option<String>,
    /// Recipient address. A fresh key pair is generated if omitted.
    #[arg(long)]
    to: Option<String>,
    /// Amount to transfer
    #[arg(long, default_value_t = 10)]
    amount: u64,
    #[arg(long, default_value_t = LedgerConfig::default().difficulty)]
    difficulty: usize,
    #[arg(long, default_value_t = LedgerConfig::default().mining_reward)]
    reward: u64,
    /// Flat file that block headers and the final balance are appended to
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: String,
}

#[derive(Serialize)]
struct BalanceRecord {
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Amount")]
    amount: i128,
}

#[derive(Debug, PartialEq, Eq)]
struct DemoReport {
    address: String,
    balance: i128,
    valid: bool,
    pending: usize,
}

fn run_demo(args: &DemoArgs) -> Result<DemoReport> {
    let key = match &args.private_key {
        Some(secret) => KeyPair::from_secret_hex(secret)?,
        None => KeyPair::generate(),
    };
    let address = key.address();
    let to = args
        .to
        .clone()
        .unwrap_or_else(|| KeyPair::generate().address());

    let sink = Arc::new(FileLogSink::new(&args.log_file));
    let config = LedgerConfig {
        difficulty: args.difficulty,
        mining_reward: args.reward,
    };
    let mut ledger = Ledger::with_sink(config, sink.clone());

    let mut tx = Transaction::new(address.clone(), to, args.amount);
    tx.sign(&key)?;
    ledger.add_transaction(tx)?;

    info!("Starting the miner...");
    ledger.mine_pending_transactions(&address);

    let balance = ledger.balance_of(&address);
    let valid = ledger.is_chain_valid()?;
    let record = BalanceRecord {
        address: address.clone(),
        amount: balance,
    };
    sink.append(&format!("Transactions: {}", serde_json::to_string(&record)?))?;

    Ok(DemoReport {
        address,
        balance,
        valid,
        pending: ledger.pending.len(),
    })
}

fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .pretty()
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Keygen => {
            let key = KeyPair::generate();
            println!("Private key: {}", key.secret_hex());
            println!("Public key: {}", key.address());
        }
        Command::Demo(args) => {
            let report = run_demo(&args)?;
            println!("My balance is: {}", report.balance);
            println!("Is chain valid? {}", report.valid);
            println!("Unredeemed rewards pending: {}", report.pending);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const SECRET: &str = "8890a9c240852619fef12c081cbe2bc1a0a3b2f9cae6d3544204b25e8e847200";

    fn demo_args(log_file: String) -> DemoArgs {
        DemoArgs {
            private_key: Some(SECRET.to_string()),
            to: Some("to address public key goes here".to_string()),
            amount: 10,
            difficulty: 2,
            reward: 100,
            log_file,
        }
    }

    #[test]
    fn demo_reports_balance_after_one_round() -> Result<()> {
        let dir = tempdir()?;
        let log_file = dir.path().join("data.txt");
        let report = run_demo(&demo_args(log_file.display().to_string()))?;

        assert_eq!(report.address, KeyPair::from_secret_hex(SECRET)?.address());
        assert_eq!(report.balance, 90);
        assert!(report.valid);
        assert_eq!(report.pending, 1);

        let contents = fs::read_to_string(&log_file)?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Block Header: "));
        assert_eq!(
            lines[1],
            format!(
                r#"Transactions: {{"Address":"{}","Amount":90}}"#,
                report.address
            )
        );
        Ok(())
    }

    #[test]
    fn demo_rejects_malformed_private_key() {
        let mut args = demo_args("unused.txt".to_string());
        args.private_key = Some("xyz".to_string());
        assert!(run_demo(&args).is_err());
    }

    #[test]
    fn cli_parses_demo_flags() {
        let cli = Cli::try_parse_from([
            "ledger-cli",
            "demo",
            "--amount",
            "25",
            "--difficulty",
            "1",
            "--log-file",
            "out.txt",
        ])
        .unwrap();
        match cli.cmd {
            Command::Demo(args) => {
                assert_eq!(args.amount, 25);
                assert_eq!(args.difficulty, 1);
                assert_eq!(args.reward, 100);
                assert_eq!(args.log_file, "out.txt");
                assert!(args.private_key.is_none());
            }
            Command::Keygen => panic!("expected demo"),
        }
    }
}
