//! Parlay server binary.
//!
//! Boots a demo deployment: an in-memory token ledger, one treasury
//! with all four games registered and funded, and a freshly committed
//! hash chain, then serves the HTTP API.

use clap::Parser;
use parlay::api::{serve, AppState};
use parlay::config::CasinoConfig;
use parlay::games::{BackgammonTable, BlackJack, GameModule, Roulette, Slots};
use parlay::hash_chain::chain_from_secret;
use parlay::token::{MemoryToken, TokenHandle};
use parlay::Casino;
use rand::RngCore;
use std::path::PathBuf;
use tracing::info;

const CEO: &str = "ceo";
const WORKER: &str = "worker";
const TREASURY: &str = "treasury";
const CHAIN_LENGTH: usize = 1_000;

#[derive(Parser, Debug)]
#[command(name = "parlay", about = "Casino treasury and settlement engine")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API bind address.
    #[arg(long)]
    bind: Option<String>,

    /// Override the API port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parlay=info,tower_http=info".into()),
        )
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => CasinoConfig::from_toml_file(path)?,
        None => CasinoConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.api.bind_address = bind;
    }
    if let Some(port) = args.port {
        config.api.port = port;
    }
    config.validate()?;

    let casino = bootstrap(&config)?;
    let state = AppState::new(casino);
    serve(&config.api, state).await
}

/// Wires up the demo deployment described by the config.
fn bootstrap(config: &CasinoConfig) -> Result<Casino, Box<dyn std::error::Error>> {
    let ceo = CEO.to_string();
    let symbol = config.token.default_symbol.clone();

    let mut token = MemoryToken::new(symbol.clone());
    token.mint(&ceo, config.token.initial_supply);
    let handle = TokenHandle::new(token);
    handle.approve(&ceo, &TREASURY.to_string(), config.token.initial_supply);

    let mut casino = Casino::new(ceo.clone(), TREASURY, config.pointer.ratio);
    casino.register_token(&ceo, symbol.clone(), handle.clone())?;
    casino.add_worker(&ceo, WORKER.to_string())?;
    casino
        .pointer_mut()
        .set_affiliate_percent(&ceo, config.pointer.affiliate_percent)?;
    casino
        .pointer_mut()
        .set_collecting(&ceo, config.pointer.collecting)?;

    let modules = [
        (
            "roulette",
            GameModule::Roulette(Roulette::new(config.limits.roulette_square_limit)),
        ),
        ("slots", GameModule::Slots(Slots::new(config.limits.slots_factors))),
        ("blackjack", GameModule::BlackJack(BlackJack::new())),
        ("backgammon", GameModule::Backgammon(BackgammonTable::new())),
    ];
    let house_funds = config.token.initial_supply / 100;
    for (name, module) in modules {
        let game_id = casino.add_game(
            &ceo,
            name,
            module,
            config.limits.default_maximum_bet,
            true,
        )?;
        casino.add_funds(&ceo, game_id, &symbol, house_funds)?;
        info!(game_id, name, allocated = house_funds, "game registered");
    }

    let mut secret = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut secret);
    let links = chain_from_secret(&secret, CHAIN_LENGTH);
    casino.set_tail(&ceo, links[CHAIN_LENGTH - 1])?;
    info!(
        tail = hex::encode(links[CHAIN_LENGTH - 1]),
        next = hex::encode(links[CHAIN_LENGTH - 2]),
        links = CHAIN_LENGTH,
        "hash chain committed"
    );

    Ok(casino)
}
