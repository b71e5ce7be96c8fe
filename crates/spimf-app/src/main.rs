#![warn(missing_docs)]
//! # spimf-app binary
//!
//! Terminal entry point for the SPIMF membership portal.

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use spimf_app::{
    AppConfig, AppController, Command, SHELL_HELP, ShellInput, SystemClock, app_version,
    init_tracing, parse_shell_line,
};
use spimf_auth::FieldUpdates;
use spimf_transport::HttpTransport;
use spimf_ui::render_countdown;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// CLI entry point.
#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(error) => {
            error!(%error, "invalid configuration");
            eprintln!("spimf-app: {error}");
            return ExitCode::FAILURE;
        }
    };

    let transport = match config.validate().map(HttpTransport::new) {
        Ok(Ok(transport)) => transport,
        Ok(Err(error)) => {
            error!(%error, "transport setup failed");
            return ExitCode::FAILURE;
        }
        Err(error) => {
            error!(%error, "invalid endpoint");
            return ExitCode::FAILURE;
        }
    };

    info!(version = app_version(), endpoint = %transport.endpoint(), "starting");
    let mut app = AppController::new(config, Arc::new(transport), Arc::new(SystemClock));
    let countdown_printer = spawn_countdown_printer(&app);

    if let Err(error) = app.dispatch(Command::Start).await {
        warn!(%error, "startup command failed");
    }
    let mut last_view = app.view();
    println!("{}", last_view.to_text());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(TICK_PERIOD);
    let mut pending = FieldUpdates::new();

    loop {
        let command = tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => match parse_shell_line(&line, app.ui().tab(), &mut pending) {
                    ShellInput::Command(command) => Some(command),
                    ShellInput::Staged { field } => {
                        println!("staged {field}; type `save` to send");
                        None
                    }
                    ShellInput::Help => {
                        println!("{SHELL_HELP}");
                        None
                    }
                    ShellInput::Quit => break,
                    ShellInput::Empty => None,
                    ShellInput::Invalid(message) => {
                        println!("{message}");
                        None
                    }
                },
                Ok(None) => break,
                Err(error) => {
                    error!(%error, "stdin read failed");
                    break;
                }
            },
            _ = ticker.tick() => Some(Command::Tick),
        };

        let Some(command) = command else {
            continue;
        };
        let is_tick = command == Command::Tick;
        if let Err(error) = app.dispatch(command).await {
            println!("{error}");
        }

        let view = app.view();
        if !is_tick || view != last_view {
            println!("{}", view.to_text());
            last_view = view;
        }
    }

    countdown_printer.abort();
    info!("shell closed");
    ExitCode::SUCCESS
}

fn spawn_countdown_printer(app: &AppController) -> tokio::task::JoinHandle<()> {
    let mut countdown = app.countdown();
    tokio::spawn(async move {
        while countdown.changed().await.is_ok() {
            let view = countdown.borrow_and_update().clone();
            if let Some(view) = view {
                println!("{}", render_countdown(&view));
            }
        }
    })
}
