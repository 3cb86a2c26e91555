use anyhow::{Context, Result};
use momics::assemble::assemble;
use momics::cli::{parse_args, setup_logging, AssembleArgs, Commands};
use tracing::{error, info};

fn main() {
    let cli = parse_args();

    setup_logging(cli.verbose);

    info!("{}", momics::info());

    let result = match cli.command {
        Commands::Assemble(args) => run_assemble(args),
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run_assemble(args: AssembleArgs) -> Result<()> {
    let paths = args.dataset_paths();
    info!("Data directory: {:?}", args.data_dir);
    info!("Metadata file: {:?}", paths.metadata);

    let container = assemble(&paths)?;

    let summary = container.summary();
    summary.log();

    if let Some(output) = &args.summary {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                momics::utils::ensure_dir(parent)?;
            }
        }
        let report = serde_json::to_string_pretty(&summary)?;
        std::fs::write(output, report)
            .with_context(|| format!("Failed to write summary to {:?}", output))?;
        info!("Summary saved to: {:?}", output);
    }

    Ok(())
}
