use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::Local;
use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{info, warn};

use netbuilder::config_loader;
use netbuilder::deploy::{build_plan, FileStatusSource};
use netbuilder::orchestrator::{self, BuildReport};
use netbuilder::topology::store::{export_device_configs, load_model, model_to_json, save_model, snapshot_path};
use netbuilder::topology::{create_template_topology, vxlan_multisite, DeviceType, Protocol, Shape};
use netbuilder::validation::{self, health_check, validate_topology, DeployMode, Finding, HealthOutcome};

/// Build addressed, configured network topologies from intent text or templates
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the configuration YAML file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a topology from free text
    Resolve {
        /// Network intent, e.g. "5 sites connected via OSPF"
        #[arg(short, long)]
        text: String,

        /// Routing protocol, overriding any found in the text
        #[arg(short, long)]
        protocol: Option<String>,

        /// Write the saved model JSON here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also queue a timestamped snapshot of the model in this directory
        #[arg(long)]
        snapshot_dir: Option<PathBuf>,
    },

    /// Build a topology from a standard shape
    Template {
        /// ring, star, mesh, bus or line
        #[arg(short, long)]
        shape: String,

        #[arg(short = 'n', long)]
        count: usize,

        #[arg(short, long, default_value = "router")]
        device_type: String,

        #[arg(short, long)]
        protocol: Option<String>,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the VXLAN multi-site design
    Multisite {
        /// Number of sites, data centre included
        #[arg(short, long, default_value = "3")]
        sites: usize,

        /// Use plain ethernet WAN links instead of internet links
        #[arg(long)]
        no_internet: bool,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a saved model
    Validate {
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Check lab health from a status JSON file
    Health {
        #[arg(short, long)]
        status: PathBuf,

        /// Design mode: no lab attached, skip the check
        #[arg(long)]
        design: bool,
    },

    /// Emit the deployment plan for a saved model
    Plan {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export device interfaces as YAML
    ExportConfigs {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<ExitCode> {
    color_eyre::install()?;
    let cli = Cli::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    let config = config_loader::load_or_default(cli.config.as_deref())?;

    let findings = match cli.command {
        Commands::Resolve {
            text,
            protocol,
            output,
            snapshot_dir,
        } => {
            let report = orchestrator::build_from_text(&text, protocol.as_deref().map(Protocol::from), &config)?;
            if let Some(dir) = snapshot_dir {
                let path = snapshot_path(&dir, Local::now());
                save_model(&path, &report.topology).wrap_err("Failed to write model snapshot")?;
            }
            finish_build(&report, output.as_deref())?
        }
        Commands::Template {
            shape,
            count,
            device_type,
            protocol,
            output,
        } => {
            let shape: Shape = shape.parse()?;
            let draft = create_template_topology(
                shape,
                count,
                DeviceType::from(device_type.as_str()),
                protocol.as_deref().map(Protocol::from),
            )?;
            let report = orchestrator::build_topology(draft, None, &config)?;
            finish_build(&report, output.as_deref())?
        }
        Commands::Multisite {
            sites,
            no_internet,
            output,
        } => {
            let draft = vxlan_multisite(sites, !no_internet);
            let report = orchestrator::build_topology(draft, None, &config)?;
            finish_build(&report, output.as_deref())?
        }
        Commands::Validate { input } => {
            let topology = load_model(&input).wrap_err("Failed to load model")?;
            topology.check_endpoints()?;
            validate_topology(&topology)
        }
        Commands::Health { status, design } => {
            let mode = if design { DeployMode::Design } else { DeployMode::Live };
            let source = FileStatusSource::new(&status);
            match health_check(mode, &source).wrap_err("Health check failed")? {
                HealthOutcome::Skipped => {
                    println!("Design mode: health checks skipped");
                    Vec::new()
                }
                HealthOutcome::Completed(findings) => findings,
            }
        }
        Commands::Plan { input, output } => {
            let topology = load_model(&input).wrap_err("Failed to load model")?;
            topology.check_endpoints()?;
            let plan = build_plan(&topology);
            emit(&serde_json::to_string_pretty(&plan)?, output.as_deref())?;
            return Ok(ExitCode::SUCCESS);
        }
        Commands::ExportConfigs { input, output } => {
            let topology = load_model(&input).wrap_err("Failed to load model")?;
            emit(&export_device_configs(&topology)?, output.as_deref())?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    print_findings(&findings);
    if validation::has_errors(&findings) {
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

/// Write the model and return its findings
fn finish_build(report: &BuildReport, output: Option<&Path>) -> Result<Vec<Finding>> {
    if report.allocation.capacity_exceeded {
        warn!(
            "{} links could not be addressed; widen addressing.base_network",
            report.allocation.unaddressed_links.len()
        );
    }
    emit(&model_to_json(&report.topology)?, output)?;
    Ok(report.findings.clone())
}

fn emit(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

fn print_findings(findings: &[Finding]) {
    if findings.is_empty() {
        println!("No findings");
        return;
    }
    let (errors, warnings, infos) = validation::tally(findings);
    println!("\n=== FINDINGS ({} errors, {} warnings, {} notes) ===\n", errors, warnings, infos);
    for finding in findings {
        println!("{}", finding);
    }
}
