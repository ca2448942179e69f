//! Voting Node Binary
//!
//! Opens the ledger, loads committed state (or genesis) and runs one command.
//!
//! ```text
//! vote-node init            load or apply genesis, commit, print root hash
//! vote-node replay <file>   AppendTx every JSON line, then Commit
//! vote-node tally           print the committed tally
//! vote-node accounts        print every committed account
//! vote-node account <hex>   print one committed account
//! vote-node version         print version
//! ```

use std::io::BufRead;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use voting_consensus::{Application, Config, Error, Result, VoteApp};
use voting_ledger::PublicKey;

const USAGE: &str = "Usage: vote-node <init | replay <file> | tally | accounts | account <hex> | version>";

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match args.first() {
        Some(command) => command.as_str(),
        None => {
            println!("{}", USAGE);
            return Ok(());
        }
    };

    if command == "version" {
        println!("vote-node {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Load configuration
    let config = if let Ok(config_path) = std::env::var("VOTE_CONFIG") {
        info!("Loading config from: {}", config_path);
        Config::from_file(&config_path)?
    } else {
        info!("Loading config from environment variables");
        Config::from_env()?
    };

    info!(
        "Node ID: {}, Chain ID: {}, candidates: {}",
        config.node_id, config.chain_id, config.n_candidates
    );

    info!("Opening ledger at: {:?}", config.ledger.data_dir);
    let app = VoteApp::open(&config)?;
    let root = app.load_genesis_file(&config.genesis_file)?;

    match command {
        "init" => println!("{}", hex::encode_upper(root)),
        "replay" => {
            let path = args
                .get(1)
                .ok_or_else(|| Error::from("replay needs a transaction file"))?;
            replay(&app, path)?;
        }
        "tally" => println!("{}", serde_json::to_string_pretty(&app.get_tally())?),
        "accounts" => println!("{}", serde_json::to_string_pretty(&app.get_accounts()?)?),
        "account" => {
            let key = args
                .get(1)
                .ok_or_else(|| Error::from("account needs a hex public key"))?;
            let pubkey: PublicKey = key.parse()?;
            println!("{}", serde_json::to_string_pretty(&app.get_account(&pubkey)?)?);
        }
        other => {
            return Err(Error::Other(format!("Unknown command {}\n{}", other, USAGE)));
        }
    }

    app.shutdown();
    info!("Voting node stopped");
    Ok(())
}

fn replay(app: &VoteApp, path: &str) -> Result<()> {
    let file = std::fs::File::open(path)?;
    let mut accepted = 0usize;
    let mut rejected = 0usize;

    for (line_no, line) in std::io::BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let res = app.append_tx(line.trim().as_bytes());
        if res.is_ok() {
            accepted += 1;
        } else {
            rejected += 1;
            warn!(line = line_no + 1, code = res.code.as_u32(), log = %res.log, "Replay tx rejected");
        }
    }

    let res = app.commit();
    if !res.is_ok() {
        return Err(Error::Other(format!("Commit failed: {}", res.log)));
    }

    info!(accepted, rejected, "Replay committed");
    println!("{}", hex::encode_upper(&res.data));
    Ok(())
}
