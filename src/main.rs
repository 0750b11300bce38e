mod config;

use anyhow::Context;
use clap::Parser;
use config::PruneConfig;
use rangeprune_ir::ParsedFunction;
use rangeprune_pruner::{PruneStats, RangeTable};
use std::fmt::Write;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Prunes branches that value ranges prove one-sided, then removes and merges the blocks left
/// behind.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// The IR file to optimize
    input: PathBuf,
    /// Where to write the optimized IR (stdout by default)
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Config file, missing keys take their default value
    #[arg(long, default_value = "rangeprune.toml")]
    config: PathBuf,
    /// Write the missing keys with their default value back into the config file
    #[arg(long)]
    init_config: bool,
    /// Write the total statistics as JSON to this file
    #[arg(long)]
    stats_json: Option<PathBuf>,
    /// Don't merge blocks after pruning
    #[arg(long)]
    no_merge: bool,
    /// Don't remove unreachable loops after pruning
    #[arg(long)]
    no_sweep: bool,
    /// Verify every function after each pass
    #[arg(long)]
    verify: bool,
    /// Log every function after each pass
    #[arg(long)]
    print_after_all: bool,
    /// Pass flags applied last, like "--no-merge -v"
    #[arg(long, allow_hyphen_values = true)]
    options: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = PruneConfig::load(&args.config, args.init_config)?;

    // Setup logging
    let env_filter = match std::env::var("RANGEPRUNE_LOG") {
        Ok(filter) => EnvFilter::builder().parse_lossy(filter),
        Err(_) => EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .parse_lossy(&config.log_filter),
    };
    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(env_filter)
        .init();

    let mut options = config.prune_options();
    options.merge_blocks &= !args.no_merge;
    options.sweep_unreachable &= !args.no_sweep;
    options.verify_each |= args.verify;
    options.print_after_all |= args.print_after_all;
    if let Some(flags) = &args.options {
        options.apply(flags);
    }
    debug!("Using {:?}", options);

    let src = fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read input file '{}'", args.input.display()))?;
    let functions = rangeprune_ir::parse_module(&src)
        .with_context(|| format!("failed to parse '{}'", args.input.display()))?;

    let mut total = PruneStats::default();
    let mut out = String::new();
    for ParsedFunction { mut func, ranges } in functions {
        func.verify()
            .with_context(|| format!("`@{}` is malformed", func.name))?;

        let oracle: RangeTable = ranges.into_iter().collect();
        let stats = rangeprune_pruner::run_on_function(&mut func, &oracle, &options);
        info!("@{}: {}", func.name, stats);
        total += stats;

        writeln!(out, "{}\n", func)?;
    }
    info!("Total: {}", total);

    match &args.output {
        Some(path) => fs::write(path, out)
            .with_context(|| format!("failed to write output file '{}'", path.display()))?,
        None => print!("{}", out),
    }

    if let Some(path) = &args.stats_json {
        let json = serde_json::to_string_pretty(&total)?;
        fs::write(path, json)
            .with_context(|| format!("failed to write statistics to '{}'", path.display()))?;
    }

    Ok(())
}
