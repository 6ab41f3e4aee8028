use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tanda_deploy::deployer::{self, DeployTarget, OnChainParams};
use tanda_deploy::network::DEFAULT_NETWORK;
use tanda_deploy::record::{self, DeploymentRecord, DEFAULT_DEPLOYMENTS_DIR};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tanda-deploy")]
#[command(about = "Deploy the Tanda contract", long_about = None)]
struct Cli {
    /// Network to deploy to
    #[arg(short, long, env = "DEPLOY_NETWORK", default_value = DEFAULT_NETWORK)]
    network: String,

    /// Directory holding compiled artifacts (defaults to ARTIFACTS_DIR or ./artifacts)
    #[arg(short, long)]
    artifacts: Option<PathBuf>,

    /// Append the deployment to <DIR>/<network>.json
    #[arg(long, value_name = "DIR", num_args = 0..=1, default_missing_value = DEFAULT_DEPLOYMENTS_DIR)]
    save_deployment: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let target = DeployTarget::OnChain(OnChainParams {
        network: cli.network.clone(),
        artifacts: cli.artifacts,
    });
    let fixture = deployer::deploy(target)
        .await
        .with_context(|| format!("deployment to `{}` failed", cli.network))?;

    if let Some(dir) = cli.save_deployment {
        let entry = DeploymentRecord::new(&cli.network, &fixture.result);
        match record::save(&dir, entry) {
            Ok(path) => info!(path = %path.display(), "saved deployment"),
            Err(err) => warn!(error = %err, "failed to save deployment record"),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    // before clap and the log filter read their env vars
    let env_file = dotenvy::dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Ok(path) = env_file {
        info!(path = %path.display(), "loaded env file");
    }
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}
