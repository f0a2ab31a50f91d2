use clap::Parser;
use ledger_core::{KeyPair, Ledger, LedgerConfig, LogSink};
use ledger_node::SharedLedger;
use ledger_storage::{FileLogSink, SledLogSink, DEFAULT_LOG_FILE};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "ledger-node", about = "Mine blocks on a local ledger until interrupted")]
struct Args {
    /// Address credited with mining rewards. A fresh key pair is generated if omitted.
    #[arg(long)]
    reward_address: Option<String>,

    /// Required leading zero hex digits per block hash
    #[arg(long, default_value_t = LedgerConfig::default().difficulty)]
    difficulty: usize,

    /// Reward minted per mined block
    #[arg(long, default_value_t = LedgerConfig::default().mining_reward)]
    reward: u64,

    /// Flat file that block headers are appended to
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: String,

    /// Append block headers to a sled database at this path instead of the flat file
    #[arg(long)]
    sled_dir: Option<String>,

    /// Stop after this many blocks (runs until Ctrl-C if omitted)
    #[arg(long)]
    rounds: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let reward_address = match args.reward_address {
        Some(address) => address,
        None => {
            let key = KeyPair::generate();
            info!(private_key = %key.secret_hex(), "generated reward key pair");
            key.address()
        }
    };

    let sink: Arc<dyn LogSink> = match &args.sled_dir {
        Some(dir) => Arc::new(SledLogSink::open(dir)?),
        None => Arc::new(FileLogSink::new(&args.log_file)),
    };
    let config = LedgerConfig {
        difficulty: args.difficulty,
        mining_reward: args.reward,
    };
    let shared = SharedLedger::new(Ledger::with_sink(config, sink));

    let cancel = Arc::new(AtomicBool::new(false));
    {
        let cancel = Arc::clone(&cancel);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("interrupt received, stopping miner");
                cancel.store(true, Ordering::Relaxed);
            }
        });
    }

    info!(address = %reward_address, difficulty = args.difficulty, "ledger-node mining");
    let mut mined = 0u64;
    while args.rounds.map_or(true, |limit| mined < limit) {
        let Some(block) = shared
            .mine_pending_transactions(&reward_address, Arc::clone(&cancel))
            .await?
        else {
            break;
        };
        mined += 1;
        info!(
            height = shared.height(),
            nonce = block.nonce,
            hash = %hex::encode(block.hash),
            balance = %shared.balance_of(&reward_address),
            "round complete"
        );
    }

    info!(
        height = shared.height(),
        valid = shared.is_chain_valid()?,
        balance = %shared.balance_of(&reward_address),
        unredeemed = shared.pending_len(),
        "miner stopped"
    );
    Ok(())
}
