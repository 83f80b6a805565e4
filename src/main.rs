use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use utxo_emulator::*;

#[derive(Parser)]
#[command(name = "utxo-emulator-cli")]
#[command(about = "UTXO ledger emulator CLI - seed ledgers, inspect snapshots, run coin selection")]
#[command(version = "0.1.0")]
struct Cli {
    /// Emulator config JSON (optional, defaults apply to missing fields)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create funded wallets, commit them, and write a snapshot JSON
    Init {
        /// Lovelace for each wallet (repeatable)
        #[arg(short, long = "wallet", required = true)]
        wallets: Vec<u64>,

        /// Slots to advance after funding (default: 1)
        #[arg(short, long, default_value = "1")]
        ticks: i64,

        /// Snapshot name
        #[arg(short, long, default_value = "init")]
        name: String,

        /// Output file for the snapshot JSON
        #[arg(short, long)]
        out: PathBuf,
    },

    /// List unspent utxos from a snapshot
    Utxos {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Only list utxos at this address
        #[arg(short, long)]
        address: Option<String>,
    },

    /// Run the coin selector against a snapshot
    Select {
        /// Snapshot JSON file
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Address to select from
        #[arg(short, long)]
        address: String,

        /// Free lovelace the utxo must exceed
        #[arg(long, default_value = "0")]
        min: u64,

        /// Free lovelace the utxo must stay below (optional)
        #[arg(long)]
        max: Option<u64>,

        /// List spare fee utxos instead of a single selection
        #[arg(long)]
        spare: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = load_config(cli.config.as_deref()).and_then(|config| match cli.command {
        Commands::Init {
            wallets,
            ticks,
            name,
            out,
        } => handle_init(&config, wallets, ticks, &name, &out),
        Commands::Utxos { snapshot, address } => handle_utxos(&config, &snapshot, address),
        Commands::Select {
            snapshot,
            address,
            min,
            max,
            spare,
        } => handle_select(&config, &snapshot, address, min, max, spare),
    });

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EmulatorConfig> {
    match path {
        Some(p) => Ok(EmulatorConfig::from_file(p)?),
        None => Ok(EmulatorConfig::default()),
    }
}

fn load_ledger(config: &EmulatorConfig, path: &Path) -> anyhow::Result<LedgerEmulator> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
    let snapshot = Snapshot::from_json(&json)?;
    let mut ledger = LedgerEmulator::new(config);
    ledger.load_snapshot(&snapshot);
    Ok(ledger)
}

fn handle_init(
    config: &EmulatorConfig,
    wallets: Vec<u64>,
    ticks: i64,
    name: &str,
    out: &Path,
) -> anyhow::Result<()> {
    let mut ledger = LedgerEmulator::new(config);
    for lovelace in wallets {
        let wallet = ledger.create_wallet(lovelace, Assets::new())?;
        println!("Wallet: {} ({})", wallet.address(), lovelace_to_ada_string(lovelace));
    }
    if let Some(block) = ledger.tick(ticks)? {
        println!("Block {}: {} tx(s), hash {}", block.height, block.len(), block.block_hash);
    }

    let snapshot = ledger.snapshot(name)?;
    std::fs::write(out, snapshot.to_json()?)
        .with_context(|| format!("Failed to write snapshot {}", out.display()))?;
    println!("Slot: {}", ledger.current_slot());
    println!("Snapshot '{}' written to {}", name, out.display());
    Ok(())
}

fn handle_utxos(
    config: &EmulatorConfig,
    snapshot: &Path,
    address: Option<String>,
) -> anyhow::Result<()> {
    let ledger = load_ledger(config, snapshot)?;
    let buckets = ledger.address_utxos();
    let mut total = 0u64;
    for (addr, utxos) in buckets.iter() {
        if address.as_ref().map_or(false, |a| a != addr) {
            continue;
        }
        println!("{}", addr);
        for utxo in utxos {
            total = total.saturating_add(utxo.lovelace());
            println!("  {}#{}  {}", utxo.id.tx_id, utxo.id.index, utxo.value());
        }
    }
    println!("Total: {}", lovelace_to_ada_string(total));
    Ok(())
}

fn handle_select(
    config: &EmulatorConfig,
    snapshot: &Path,
    address: String,
    min: u64,
    max: Option<u64>,
    spare: bool,
) -> anyhow::Result<()> {
    let ledger = load_ledger(config, snapshot)?;
    let selector = CoinSelector::for_ledger(&ledger, config.selector.clone());

    if spare {
        for utxo in selector.find_spare_utxos(&address, None)? {
            println!("Spare: {}", utxo);
        }
        return Ok(());
    }

    let mut request = SelectionRequest::lovelace(min);
    if let Some(max) = max {
        request = request.with_max(max);
    }
    let utxo = selector.find_sufficient_utxo(&address, &request, None, "cli selection")?;
    let info = sort_info(&utxo, ledger.params(), min, max);
    println!("Selected: {}", utxo);
    println!("  Free: {} lovelace", info.free);
    println!("  Min ADA requirement: {} lovelace", info.min_ada_requirement);
    Ok(())
}
