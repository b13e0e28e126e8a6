//! main.rs
//! Entry point for iaseek

use iaseek::app::{ActionRouter, AppState, Notice, Session};
use iaseek::config::Config;
use iaseek::core::catalog::ArchiveClient;
use iaseek::core::download::DownloadOrchestrator;
use iaseek::core::launch::ProviderChain;
use iaseek::core::lookup::AdguardLookup;
use iaseek::core::terminal;
use iaseek::utils::cli::{Cli, CliAction, handle_args};

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    std::panic::set_hook(Box::new(|info| {
        let _ = crossterm::terminal::disable_raw_mode();
        let mut stdout = std::io::stdout();
        let _ = crossterm::execute!(
            stdout,
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show
        );

        eprintln!("\n[ias] Error occurred: {}", info);

        #[cfg(debug_assertions)]
        {
            let bt = std::backtrace::Backtrace::force_capture();
            eprintln!("\nStack Backtrace:\n{}", bt);
        }
    }));

    let cli = Cli::parse();

    if let CliAction::Exit = handle_args(&cli) {
        return ExitCode::SUCCESS;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ias] Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(&cli)?;

    let mut config = Config::load(cli.config.as_deref())?;
    let boot = cli.bootstrap(&mut config)?;

    if cli.print_url {
        eprintln!("Request URL: {}", boot.query.to_url()?);
    }

    let router = ActionRouter::new(
        Box::new(AdguardLookup::new()?),
        ProviderChain::clipboard(),
        ProviderChain::opener(),
        DownloadOrchestrator::new(boot.download),
        boot.router,
    );
    let catalog = Box::new(ArchiveClient::new()?);

    let mut session = Session::start(boot.query, catalog, router, boot.session)
        .context("the first search failed")?;
    for warning in boot.warnings {
        warn!("{}", warning);
        session.push_notice(Notice::warn(warning));
    }

    let mut app = AppState::new(&config, session);
    terminal::run_terminal(&mut app)?;
    info!("bye");
    Ok(())
}

/// Installs a file logger when `--log-file` or `IASEEK_LOG` names one.
///
/// The TUI owns the terminal, so without a file nothing is installed.
fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let Some(path) = cli
        .log_file
        .clone()
        .or_else(|| std::env::var_os("IASEEK_LOG").map(Into::into))
    else {
        return Ok(());
    };

    let file = File::create(&path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;

    let default = match cli.verbose {
        0 => "iaseek=warn",
        1 => "iaseek=info",
        _ => "iaseek=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .init();
    Ok(())
}
