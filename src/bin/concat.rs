use anyhow::{bail, Context};
use clap::Parser;
use paper_harvest::adapters::sink::{concat_datasets, SUPPORTED_FORMATS};
use paper_harvest::utils::{logger, validation::validate_formats};
use paper_harvest::LocalStorage;

#[derive(Parser)]
#[command(name = "paper-harvest-concat")]
#[command(about = "Concatenate several harvested datasets into one")]
struct Args {
    /// Harvest output directories, in the order their records are appended
    #[arg(long, num_args = 1.., required = true)]
    datasets: Vec<String>,

    /// Directory the merged dataset is written to
    #[arg(long)]
    output: String,

    /// Output format (jsonl or csv); repeat for both
    #[arg(long = "format", default_value = "jsonl")]
    formats: Vec<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init_cli_logger(args.verbose);

    validate_formats("--format", &args.formats, &SUPPORTED_FORMATS)?;
    if args.datasets.iter().any(|dataset| dataset == &args.output) {
        bail!("--output must differ from every --datasets directory");
    }

    tracing::info!("📚 Concatenating {} datasets", args.datasets.len());
    let sources: Vec<LocalStorage> = args.datasets.iter().map(LocalStorage::new).collect();
    let target = LocalStorage::new(&args.output);

    let manifest = concat_datasets(&sources, &target, &args.formats)
        .await
        .with_context(|| format!("failed to concatenate {:?}", args.datasets))?;

    println!(
        "✅ {} records ({} with abstract) written to {}",
        manifest.resolved, manifest.with_abstract, args.output
    );
    Ok(())
}
