mod args;

use anyhow::Context;
use clap::{CommandFactory, Parser, error::ErrorKind};
use tracing::error;

use gridrun_core::CoreError;
use gridrun_exec::run_job;
use gridrun_model::{ConfigOverrides, EXIT_CONFIG_ERROR, EXIT_SUCCESS, RunConfig, RunStatus};
use gridrun_observe::{LoggerConfig, logger_init};

use crate::args::Args;

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => EXIT_SUCCESS,
                _ => EXIT_CONFIG_ERROR,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if args.command.is_empty() {
        let _ = Args::command().print_help();
        std::process::exit(EXIT_CONFIG_ERROR);
    }

    let code = match run(args).await {
        Ok(status) => status.exit_code(),
        Err(e) => {
            error!(target: "gridrun.cli", error = %format!("{e:#}"), "job-runner failed");
            eprintln!("job-runner: {e:#}");
            e.downcast_ref::<CoreError>()
                .map_or(EXIT_CONFIG_ERROR, CoreError::exit_code)
        }
    };
    std::process::exit(code);
}

async fn run(args: Args) -> anyhow::Result<RunStatus> {
    let mut log_cfg = LoggerConfig::from_verbosity(args.verbosity);
    log_cfg.format = args.log_format;
    logger_init(&log_cfg).context("logger init")?;

    let cfg = ConfigOverrides::from(args.overrides()).resolve(RunConfig::default())?;
    let status = run_job(args.command, cfg, args.backend).await?;
    Ok(status)
}
