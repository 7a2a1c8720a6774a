// src/bin/pool_analyzer.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;
use std::{process::ExitCode, str::FromStr, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use pool_sentinel::{
    config::Config,
    decoders::raydium_amm_v4::{discover_pool, list_pools},
    filtering::{AnalysisVerdict, Pipeline},
    monitoring::logging::setup_logging,
    rpc::{ChainAccessor, HttpMetadataFetcher, MetadataFetcher},
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Filtres de sécurité pour les pools Raydium AMM v4", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyse un pool et affiche le verdict de chaque filtre.
    Analyze {
        #[arg(value_parser = parse_pubkey)]
        pool_id: Pubkey,
        /// Affiche le verdict complet en JSON.
        #[arg(long)]
        json: bool,
    },
    /// Liste des pools AMM v4 quotés dans le token configuré.
    List {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

fn parse_pubkey(value: &str) -> Result<Pubkey, String> {
    Pubkey::from_str(value).map_err(|e| format!("adresse de pool invalide '{}': {}", value, e))
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Les arguments sont validés avant tout accès réseau.
    let cli = Cli::parse();
    let config = Config::load().context("Configuration invalide")?;
    setup_logging(config.log_json);

    match cli.command {
        Commands::Analyze { pool_id, json } => analyze(&config, pool_id, json).await,
        Commands::List { limit } => list(&config, limit).await,
    }
}

async fn analyze(config: &Config, pool_id: Pubkey, json: bool) -> Result<ExitCode> {
    let settings = config.filter_settings()?;
    let chain: Arc<dyn ChainAccessor> = Arc::new(config.rpc_client()?);
    let fetcher: Arc<dyn MetadataFetcher> = Arc::new(HttpMetadataFetcher::new(config.metadata_fetch_timeout()?)?);
    let pipeline = Pipeline::from_settings(&settings, chain.clone(), fetcher, config.pipeline_options()?)?;
    info!(filters = ?pipeline.filter_names(), "Pipeline prêt.");

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Ctrl-C reçu, annulation de l'analyse...");
            ctrl_c_token.cancel();
        }
    });

    let pool = tokio::select! {
        biased;
        _ = cancel.cancelled() => bail!("Analyse annulée pendant la découverte du pool."),
        pool = discover_pool(chain.as_ref(), &pool_id) => pool?,
    };
    let verdict = pipeline.analyze_until_cancelled(&pool, &cancel).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_summary(&pool_id, &verdict);
    }

    Ok(if verdict.all_passed() { ExitCode::SUCCESS } else { ExitCode::from(2) })
}

fn print_summary(pool_id: &Pubkey, verdict: &AnalysisVerdict) {
    println!("Pool {}", pool_id);
    if verdict.all_passed() {
        println!("✅ PASS ({} filtres)", verdict.reports().len());
        return;
    }
    println!("❌ FAIL ({}/{} filtres en échec)", verdict.failed().count(), verdict.reports().len());
    for report in verdict.failed() {
        println!("  - {}: {}", report.name, report.details.message);
    }
}

async fn list(config: &Config, limit: usize) -> Result<ExitCode> {
    let quote_mint = config.quote_mint()?;
    let chain = config.rpc_client()?;
    let listing = list_pools(&chain, &quote_mint, limit).await?;

    println!(
        "{} pools AMM v4 quotés en {} ({} affichés)",
        listing.total,
        quote_mint,
        listing.pools.len()
    );
    for pool in &listing.pools {
        println!("{}  base={}  lp={}", pool.address, pool.base_mint, pool.lp_mint);
    }
    Ok(ExitCode::SUCCESS)
}
