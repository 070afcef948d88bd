mod cmd;
mod output;
mod settings;

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "awtrix-sync",
    about = "Keep the custom apps on an AWTRIX display in step with a set of widget producers",
    version
)]
pub struct Cli {
    /// Config file (missing file = defaults)
    #[arg(long, env = "AWTRIX_SYNC_CONFIG", default_value = awtrix_sync_core::paths::CONFIG_FILE)]
    config: PathBuf,

    /// Display address, host or host:port
    #[arg(long, env = "AWTRIX_IP")]
    device: Option<String>,

    /// Directory holding known_apps.json and the pending buffer
    #[arg(long, env = "AWTRIX_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Directory of widget definition files
    #[arg(long, env = "AWTRIX_APPS_DIR")]
    apps_dir: Option<PathBuf>,

    /// Seconds between scheduled cycles
    #[arg(long)]
    interval_secs: Option<u64>,

    /// Units invoked and published at once
    #[arg(long)]
    concurrency: Option<usize>,

    /// Productive API token; enables the report widget together with the org id
    #[arg(long, env = "PRODUCTIVE_API_KEY", hide_env_values = true)]
    productive_api_key: Option<String>,

    /// Productive organisation id
    #[arg(long, env = "PRODUCTIVE_ORG_ID")]
    productive_org_id: Option<String>,

    /// Run a single cycle, print the report and exit
    #[arg(long)]
    once: bool,

    /// Output the one-shot report as JSON
    #[arg(long, short = 'j', requires = "once")]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = settings::resolve(&cli).and_then(|config| {
        if cli.once {
            cmd::once::run(&config, cli.json)
        } else {
            cmd::serve::run(&config)
        }
    });

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
