// hostdir_e2e.rs: build the probe image and run the host-dir r/w scenario against local Docker.
// Usage: cargo run --bin hostdir-e2e -- <manifest|build|run> [OPTIONS]

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::error;

use hostdir_mount_tester::building::probe_image::{build_probe_image, sibling_probe_binary};
use hostdir_mount_tester::logging::init_tracing;
use hostdir_mount_tester::scenario::docker::DockerRunner;
use hostdir_mount_tester::scenario::{
    verify_scenario, HostDirScenario, DEFAULT_PROBE_IMAGE, DEFAULT_VOLUME_PATH,
};

#[derive(Parser)]
#[command(name = "hostdir-e2e")]
#[command(about = "Host-dir mount end-to-end scenario driver", long_about = None)]
struct Cli {
    /// Docker-compatible CLI used to build images and run containers
    #[arg(long, global = true, default_value = "docker")]
    cli: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the scenario's pod manifest as JSON
    Manifest(ScenarioArgs),
    /// Build the probe image
    Build(ImageArgs),
    /// Build the probe image and run the scenario with Docker
    Run {
        #[command(flatten)]
        scenario: ScenarioArgs,
        /// Reuse an existing image instead of building it
        #[arg(long)]
        skip_build: bool,
        /// Probe binary to package (defaults to the one next to this executable)
        #[arg(long)]
        binary: Option<PathBuf>,
    },
}

#[derive(Args)]
struct ImageArgs {
    /// Image tag
    #[arg(long, default_value = DEFAULT_PROBE_IMAGE)]
    image: String,
    /// Probe binary to package (defaults to the one next to this executable)
    #[arg(long)]
    binary: Option<PathBuf>,
}

#[derive(Args)]
struct ScenarioArgs {
    /// Image tag both containers run
    #[arg(long, default_value = DEFAULT_PROBE_IMAGE)]
    image: String,
    /// Mount path of the shared volume inside the containers
    #[arg(long, default_value = DEFAULT_VOLUME_PATH)]
    volume_path: String,
    /// Host directory to share (a fresh temp dir when omitted)
    #[arg(long)]
    host_path: Option<PathBuf>,
}

fn resolve_binary(binary: Option<PathBuf>) -> Result<PathBuf> {
    match binary {
        Some(b) => Ok(b),
        None => sibling_probe_binary(),
    }
}

/// A host directory for the shared volume, and whether we created it.
fn host_dir(requested: Option<PathBuf>) -> Result<(PathBuf, bool)> {
    if let Some(p) = requested {
        return Ok((p, false));
    }
    let mut dir = std::env::temp_dir();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)?
        .as_secs();
    dir.push(format!("hostdir_e2e_{}_{}", std::process::id(), stamp));
    fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create host dir {}", dir.display()))?;
    Ok((dir, true))
}

fn run_scenario(runner: &mut DockerRunner, args: ScenarioArgs) -> Result<()> {
    let (host, created) = host_dir(args.host_path)?;
    let scenario =
        HostDirScenario::read_write(&args.volume_path, &host.to_string_lossy(), &args.image);

    let result = verify_scenario(runner, &scenario);

    if created {
        let _ = fs::remove_dir_all(&host);
    }
    result.with_context(|| format!("scenario `{}` failed", scenario.name))?;
    println!("scenario `{}` passed", scenario.name);
    Ok(())
}

impl Cli {
    fn run(self) -> Result<()> {
        let mut runner = DockerRunner::new().with_cli(self.cli);
        match self.command {
            Command::Manifest(args) => {
                let host = args
                    .host_path
                    .unwrap_or_else(|| PathBuf::from("/tmp/hostdir"));
                let scenario = HostDirScenario::read_write(
                    &args.volume_path,
                    &host.to_string_lossy(),
                    &args.image,
                );
                println!("{}", scenario.pod.to_json()?);
                Ok(())
            }
            Command::Build(args) => {
                let binary = resolve_binary(args.binary)?;
                build_probe_image(runner.cli(), &binary, &args.image)?;
                println!("Built {} from {}", args.image, binary.display());
                Ok(())
            }
            Command::Run {
                scenario,
                skip_build,
                binary,
            } => {
                if !skip_build {
                    let binary = resolve_binary(binary)?;
                    build_probe_image(runner.cli(), &binary, &scenario.image)?;
                }
                run_scenario(&mut runner, scenario)
            }
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    cli.run().inspect_err(|err| error!("Failed to run: {err:#}"))
}
