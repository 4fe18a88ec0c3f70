use std::path::PathBuf;
use std::process;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use punch::cli::{self, exit_codes, PunchWorkflowArgs};
use punch::config::{self, DEFAULT_CONFIG_FILE_NAME, DEFAULT_VERSION_FILE_NAME};
use punch::{ui, PunchError};

#[derive(clap::Parser)]
#[command(
    name = "punch",
    version,
    about = "Update the version number in a project's files"
)]
struct Args {
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE_NAME, help = "Configuration file")]
    config_file: PathBuf,

    #[arg(short = 'v', long, default_value = DEFAULT_VERSION_FILE_NAME, help = "Version file")]
    version_file: PathBuf,

    #[arg(short, long, help = "Part of the version to increase")]
    part: Option<String>,

    #[arg(long, help = "Set parts explicitly, e.g. major=2,minor=0")]
    set_part: Option<String>,

    #[arg(short, long, help = "Run an action declared in the configuration")]
    action: Option<String>,

    #[arg(long, requires = "action", help = "Options for the action, e.g. part=minor")]
    action_options: Option<String>,

    #[arg(long, help = "Reset the parts after the one being set")]
    reset_on_set: bool,

    #[arg(long, help = "Show the planned changes and debug logs")]
    verbose: bool,

    #[arg(long, help = "Write default configuration and version files and exit")]
    init: bool,

    #[arg(short, long, help = "Show what would change without writing anything")]
    simulate: bool,
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose || args.simulate);

    if let Err(err) = run(&args) {
        ui::display_error(&format!("{:#}", err));
        let code = err
            .downcast_ref::<PunchError>()
            .map(exit_codes::for_error)
            .unwrap_or(exit_codes::ERROR);
        process::exit(code);
    }
}

/// Console logging to stderr, controlled by RUST_LOG (default: warn, debug
/// with `--verbose`).
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .with_filter(filter),
        )
        .init();
}

fn run(args: &Args) -> Result<()> {
    if args.init {
        let created = config::init_files(".")?;
        if created.is_empty() {
            ui::display_status("Configuration and version files already exist");
        }
        for path in created {
            ui::display_success(&format!("Created {}", path.display()));
        }
        return Ok(());
    }

    let config = config::load_config(&args.config_file)?;
    let workflow_args = PunchWorkflowArgs {
        config_path: args.config_file.clone(),
        version_file: args.version_file.clone(),
        part: args.part.clone(),
        set_part: args.set_part.clone(),
        action: args.action.clone(),
        action_options: args.action_options.clone(),
        reset_on_set: args.reset_on_set,
        simulate: args.simulate,
    };

    let result = cli::run_punch_workflow(&workflow_args, &config)?;

    if args.verbose || args.simulate {
        ui::display_plan(&result);
    }

    match &result.execution {
        Some(report) => ui::display_execution(&result.plan, report),
        None => ui::display_status("Simulated run, no file was changed"),
    }

    Ok(())
}
