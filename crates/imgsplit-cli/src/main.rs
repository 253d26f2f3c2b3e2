use std::process::ExitCode;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use env_logger::{Builder, Env};
use imgsplit_cli::{cmd_init, cmd_split, exit_status, print_summary, Cli, Command};
use signal_hook::consts::TERM_SIGNALS;
use signal_hook::flag;

/// Exit status for configuration, argument and resolution errors.
const FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::Init { force }) => match cmd_init(cli.config_dir.as_deref(), force) {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::from(FATAL)
            }
        },
        None => {
            let cancel = Arc::new(AtomicBool::new(false));
            if let Err(e) = register_interrupts(&cancel) {
                log::warn!("Could not install interrupt handlers: {}", e);
            }

            match cmd_split(&cli.split, cli.config_dir.as_deref(), &cancel) {
                Ok(summary) => {
                    print_summary(&summary, cli.verbose);
                    ExitCode::from(exit_status(&summary))
                }
                Err(e) => {
                    eprintln!("Error: {:#}", e);
                    ExitCode::from(FATAL)
                }
            }
        }
    }
}

/// Warnings by default; `-v` turns on debug output for imgsplit itself.
/// `RUST_LOG` still wins when set.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        "warn,imgsplit=debug,imgsplit_cli=debug,imgsplit_core=debug"
    } else {
        "warn"
    };
    Builder::from_env(Env::default().default_filter_or(filter))
        .format_timestamp(None)
        .init();
}

/// The first interrupt stops new files from starting; a second one exits.
fn register_interrupts(cancel: &Arc<AtomicBool>) -> std::io::Result<()> {
    for signal in TERM_SIGNALS {
        flag::register_conditional_shutdown(*signal, 130, Arc::clone(cancel))?;
        flag::register(*signal, Arc::clone(cancel))?;
    }
    Ok(())
}
