use anyhow::{Context, Result};
use clap::Parser;
use dbgrush::cli::{Cli, Command};
use dbgrush::grid_search::{optimize_parameters, ParamGrid};
use dbgrush::pipeline::run_assembly_to_dir;
use log::{info, warn};

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        std::env::set_var("RUST_LOG", "error");
    } else if std::env::var_os("RUST_LOG").is_none() || verbose > 0 {
        let level = match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        std::env::set_var("RUST_LOG", level);
    }

    env_logger::Builder::from_default_env()
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let base = cli.base_config().context("Failed to load configuration")?;

    match &cli.command {
        Command::Assemble { input, outdir, params } => {
            let config = params.apply(base);
            config.validate().context("Invalid assembly parameters")?;
            let run = run_assembly_to_dir(input, outdir, &config)
                .with_context(|| format!("Assembly of {} failed", input.display()))?;

            let stats = &run.assembly.stats;
            info!("Contigs: {}", stats.num_contigs);
            if stats.num_contigs > 0 {
                info!("Longest: {} bp", stats.longest);
                info!("Total length: {} bp", stats.total_length);
                info!("N50: {} bp", stats.n50);
            }
        }
        Command::Optimize { input, outdir } => {
            if let Some(threads) = cli.threads {
                rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build_global()
                    .context("Failed to configure thread pool")?;
            }
            let result = optimize_parameters(input, outdir, &ParamGrid::default(), &base)
                .with_context(|| format!("Parameter search on {} failed", input.display()))?;
            if result.best.is_none() {
                warn!("No successful runs");
            }
        }
    }

    Ok(())
}
