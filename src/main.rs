use std::path::PathBuf;

use clap::Parser;
use diagramkit::{init_logging, load_session, replay, EditorConfig, VERSION};
use tracing::info;

/// Replays a recorded editing session and prints the resulting diagram.
#[derive(Parser, Debug)]
#[command(name = "diagramkit", version, about)]
struct Args {
    /// Session file (JSON)
    session: PathBuf,

    /// Editor configuration (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    init_logging()?;
    let args = Args::parse();
    info!("diagramkit {}", VERSION);

    let config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::default(),
    };
    config.validate()?;

    let session = load_session(&args.session)?;
    let report = replay(session, &config).await?;

    let output = if args.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{}", output);
    Ok(())
}
