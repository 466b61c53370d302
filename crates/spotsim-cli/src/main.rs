mod cli;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match run(&cli) {
        Ok(()) => info!("sweep completed"),
        Err(err) => {
            error!("sweep failed: {err:?}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = spotsim_sweep::SweepConfig::load(&cli.config)
        .with_context(|| format!("loading sweep config '{}'", cli.config.display()))?;

    info!(
        "running sweep over {} zone(s), {} bid ratio(s), {} dataset size(s) with {} core(s)",
        config.av_zone.len(),
        config.bid_ratio.len(),
        config.num_jobs.len(),
        if cli.cores == 0 { num_cpus::get() } else { cli.cores },
    );

    let summary = spotsim_sweep::run_sweep(&config, &cli.archive, &cli.out, cli.cores)
        .context("running sweep")?;

    info!(
        "sweep finished: {} triples ({} ok, {} skipped, {} failed)",
        summary.num_triples, summary.ok, summary.skipped, summary.failed
    );

    if cli.aggregate {
        let report = spotsim_sweep::aggregate(&summary.records).context("aggregating sweep results")?;
        let report_path = cli.out.join("aggregate_report.json");
        spotsim_sweep::write_aggregate_report(&report_path, &report)
            .context("writing aggregate report")?;
        info!("wrote aggregate report to {}", report_path.display());
    }

    Ok(())
}
