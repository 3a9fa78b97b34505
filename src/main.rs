//! Valuation engine simulation.
//!
//! Loads a snapshot (`--snapshot <path>`, or the built-in demo) and walks through
//! valuations: primitives, wrapped tokens, an index, an LP share, a vault on top of the
//! LP, a portfolio total, a feed outage and a broken decomposition.
//! Pass `-v` for debug logs; `RUST_LOG` overrides.

use clap::Parser;
use rust_decimal_macros::dec;
use std::path::PathBuf;
use std::process::ExitCode;
use valuation_core::config::SnapshotConfig;
use valuation_core::log::init_logging;
use valuation_core::*;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to a JSON snapshot; the demo snapshot is used when absent
    #[arg(short, long)]
    snapshot: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.snapshot {
        Some(path) => match SnapshotConfig::from_path(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "failed to load snapshot");
                return ExitCode::FAILURE;
            }
        },
        None => SnapshotConfig::demo(),
    };

    let engine = match config.build_engine() {
        Ok(engine) => engine,
        Err(e) => {
            tracing::error!(error = %e, "failed to build engine");
            return ExitCode::FAILURE;
        }
    };

    println!("Asset Valuation Simulation");
    println!(
        "{} assets, max depth {}, max steps {}\n",
        engine.registry().len(),
        engine.config().max_depth,
        engine.config().max_steps
    );

    let Some(quote) = config.primitives.first().cloned() else {
        println!("  snapshot has no primitives, nothing to value");
        return ExitCode::SUCCESS;
    };

    scenario_1_unit_values(&engine, &config, &quote.id, quote.decimals);
    scenario_2_portfolio(&engine, &quote.id, quote.decimals);
    scenario_3_feed_outage(&config, &quote.id);
    scenario_4_broken_decomposition(&config, &quote.id);

    println!("\nAll simulations completed.");
    ExitCode::SUCCESS
}

fn show(valuation: &Result<Valuation, ValuationError>, decimals: u8) -> String {
    match valuation {
        Ok(v) if v.is_valid => v.value.format(decimals),
        Ok(_) => "INVALID".to_string(),
        Err(e) => format!("FAILED ({e})"),
    }
}

/// One whole unit of every declared asset, both regimes.
fn scenario_1_unit_values(
    engine: &ValuationEngine<InMemoryRegistry, RateTable>,
    config: &SnapshotConfig,
    quote: &AssetId,
    quote_decimals: u8,
) {
    println!("Scenario 1: One Unit Of Each Asset In {quote}\n");

    let assets = config
        .primitives
        .iter()
        .map(|p| Asset { id: p.id.clone(), decimals: p.decimals })
        .chain(config.derivatives.iter().map(|d| d.asset()));

    for asset in assets {
        let Some(unit) = asset.unit() else { continue };
        let amount = Amount::new(unit);
        let canonical = engine.calc_canonical_asset_value(&asset.id, amount, quote);
        let live = engine.calc_live_asset_value(&asset.id, amount, quote);
        println!(
            "  {:<14} canonical {:>24}   live {:>24}",
            asset.id,
            show(&canonical, quote_decimals),
            show(&live, quote_decimals)
        );
    }
    println!();
}

/// Total value of a mixed book.
fn scenario_2_portfolio(
    engine: &ValuationEngine<InMemoryRegistry, RateTable>,
    quote: &AssetId,
    quote_decimals: u8,
) {
    println!("Scenario 2: Portfolio Total\n");

    let holdings = [
        Holding::new("WETH", Amount::from_decimal(dec!(3.5), 18).unwrap_or_default()),
        Holding::new("USDC", Amount::from_decimal(dec!(12500), 6).unwrap_or_default()),
        Holding::new("cWETH", Amount::from_decimal(dec!(40), 8).unwrap_or_default()),
        Holding::new("DEFI-IDX", Amount::from_decimal(dec!(2), 18).unwrap_or_default()),
        Holding::new("LP-VAULT", Amount::from_decimal(dec!(10), 18).unwrap_or_default()),
    ];

    for holding in &holdings {
        println!("  holding {} raw {}", holding.asset, holding.amount);
    }

    let canonical = engine.calc_canonical_assets_total_value(&holdings, quote);
    let live = engine.calc_live_assets_total_value(&holdings, quote);
    println!("\n  Canonical total: {}", show(&canonical, quote_decimals));
    println!("  Live total:      {}\n", show(&live, quote_decimals));
}

/// A live feed going down taints everything built on it, canonical stays usable.
fn scenario_3_feed_outage(config: &SnapshotConfig, quote: &AssetId) {
    println!("Scenario 3: Live WETH Feed Outage\n");

    let (Ok(registry), Ok(mut rates)) = (config.build_registry(), config.build_rate_table()) else {
        println!("  snapshot does not build, skipping\n");
        return;
    };
    let weth = AssetId::from("WETH");
    rates.remove_rate(Regime::Live, &weth, quote);

    let engine = ValuationEngine::new(registry, rates, config.engine);
    let vault = AssetId::from("LP-VAULT");
    let amount = Amount::from_u128(10u128.pow(18));

    let canonical = engine.calc_canonical_asset_value(&vault, amount, quote);
    let live = engine.calc_live_asset_value(&vault, amount, quote);
    println!("  LP-VAULT canonical: {:?}", canonical.as_ref().map(|v| v.is_valid));
    println!("  LP-VAULT live:      {:?}", live.as_ref().map(|v| v.is_valid));
    println!("  Live value must not be used; the vault's WETH leg has no price.\n");
}

/// A pool share larger than the pool supply is a broken input, not a missing price.
fn scenario_4_broken_decomposition(config: &SnapshotConfig, quote: &AssetId) {
    println!("Scenario 4: Hard Failure\n");

    let Ok(engine) = config.clone().with_budget(2, 64).build_engine() else {
        println!("  snapshot does not build, skipping\n");
        return;
    };

    let lp = AssetId::from("WETH-USDC-LP");
    let too_much = Amount::from_u128(10u128.pow(30));
    match engine.calc_canonical_asset_value(&lp, too_much, quote) {
        Ok(v) => println!("  unexpected valuation {v:?}"),
        Err(e) => println!("  aborted: {e}"),
    }

    // the vault sits two levels above USDC; a depth budget of 1 refuses it
    let Ok(shallow) = config.clone().with_budget(1, 64).build_engine() else {
        return;
    };
    let vault = AssetId::from("LP-VAULT");
    match shallow.calc_canonical_asset_value(&vault, Amount::from(1_000), quote) {
        Ok(v) => println!("  unexpected valuation {v:?}"),
        Err(e) => println!("  aborted: {e}"),
    }
}
