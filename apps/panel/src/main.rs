use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{ControlSession, FailurePolicy, RefreshOutcome, ResponseOrdering};
use shared::domain::{ButtonId, Direction, Switch};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod alerts;
mod config;
mod intents;
mod render;
mod shell;

use alerts::PrintAlertSink;
use config::{load_settings, Settings, SETTINGS_FILE};
use intents::{dispatch, Dispatched, Intent};
use render::{devices_view, motor_view};

#[derive(Parser, Debug)]
#[command(about = "Control panel for the home controller")]
struct Cli {
    /// Settings file; missing files are skipped.
    #[arg(long, global = true, default_value = SETTINGS_FILE)]
    config: PathBuf,
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[arg(long, global = true)]
    device_failure_policy: Option<FailurePolicy>,
    #[arg(long, global = true)]
    motor_failure_policy: Option<FailurePolicy>,
    #[arg(long, global = true)]
    ordering: Option<ResponseOrdering>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show both panels.
    Status {
        #[arg(long)]
        json: bool,
    },
    Refresh,
    Toggle {
        device: Switch,
    },
    Thermostat {
        #[command(subcommand)]
        action: ThermostatAction,
    },
    Motor {
        #[command(subcommand)]
        action: MotorAction,
    },
    /// Interactive session reading intents from stdin.
    Shell,
}

#[derive(Subcommand, Debug)]
enum ThermostatAction {
    Adjust {
        #[arg(allow_negative_numbers = true)]
        delta: i64,
    },
    Set {
        value: i64,
    },
}

#[derive(Subcommand, Debug)]
enum MotorAction {
    Status,
    Press { button: u32 },
    Rotate { direction: Direction, degrees: u32 },
}

impl Cli {
    fn settings(&self) -> Settings {
        let mut settings = load_settings(&self.config);
        if let Some(url) = &self.server_url {
            settings.server_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout_secs = Some(secs);
        }
        if let Some(policy) = self.device_failure_policy {
            settings.device_failure_policy = policy;
        }
        if let Some(policy) = self.motor_failure_policy {
            settings.motor_failure_policy = policy;
        }
        if let Some(ordering) = self.ordering {
            settings.ordering = ordering;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = cli.settings();
    let session = Arc::new(
        ControlSession::connect(&settings.session_options(), Arc::new(PrintAlertSink))
            .with_context(|| format!("cannot use server url '{}'", settings.server_url))?,
    );
    info!(server_url = %settings.server_url, "panel session starting");
    let (devices, motor) = session.start().await;

    let intent = match cli.command {
        Command::Shell => return shell::run(session).await,
        Command::Status { json } => {
            if devices == RefreshOutcome::Failed && motor == RefreshOutcome::Failed {
                bail!("controller unreachable at {}", settings.server_url);
            }
            if json {
                let snapshot = serde_json::json!({
                    "devices": session.devices.state(),
                    "stepper": session.motor.state(),
                });
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                println!("{}\n{}", devices_view(&session), motor_view(&session));
            }
            return Ok(());
        }
        Command::Refresh => {
            report(Dispatched::Refreshed { devices, motor }, "refresh")?;
            println!("{}\n{}", devices_view(&session), motor_view(&session));
            return Ok(());
        }
        Command::Toggle { device } => Intent::Toggle(device),
        Command::Thermostat { action } => match action {
            ThermostatAction::Adjust { delta } => Intent::AdjustThermostat(delta),
            ThermostatAction::Set { value } => Intent::SetThermostat(value),
        },
        Command::Motor { action } => match action {
            MotorAction::Status => {
                if motor == RefreshOutcome::Failed {
                    bail!("controller unreachable at {}", settings.server_url);
                }
                println!("{}", motor_view(&session));
                return Ok(());
            }
            MotorAction::Press { button } => Intent::Press(ButtonId(button)),
            MotorAction::Rotate { direction, degrees } => Intent::Rotate(direction, degrees),
        },
    };

    let dispatched = dispatch(&session, intent).await;
    match intent {
        Intent::Press(_) | Intent::Rotate(..) => println!("{}", motor_view(&session)),
        _ => println!("{}", devices_view(&session)),
    }
    report(dispatched, &intent.to_string())
}

fn report(dispatched: Dispatched, what: &str) -> Result<()> {
    if !dispatched.succeeded() {
        bail!("{what} did not complete: {dispatched:?}");
    }
    Ok(())
}
