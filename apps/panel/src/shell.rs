use std::sync::Arc;

use anyhow::Result;
use client_core::ControlSession;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::{
    intents::{dispatch, Intent, SHELL_HELP},
    render::{devices_view, motor_view, render_devices, render_motor},
};

/// Reads one intent per line from stdin. Intents are dispatched without
/// waiting for earlier ones, and the panels are redrawn on every store write.
pub async fn run(session: Arc<ControlSession>) -> Result<()> {
    let redraw = tokio::spawn(redraw_on_change(session.clone()));
    println!("{SHELL_HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let intent = match line.parse::<Intent>() {
            Ok(intent) => intent,
            Err(message) => {
                eprintln!("{message}");
                continue;
            }
        };
        match intent {
            Intent::Quit => break,
            Intent::Help => println!("{SHELL_HELP}"),
            Intent::Status => print_panels(&session),
            _ => {
                let session = session.clone();
                tokio::spawn(async move {
                    let dispatched = dispatch(&session, intent).await;
                    debug!(%intent, ?dispatched, "intent resolved");
                    if !dispatched.succeeded() {
                        eprintln!("{intent}: {dispatched:?}");
                    }
                });
            }
        }
    }

    redraw.abort();
    Ok(())
}

fn print_panels(session: &ControlSession) {
    println!("{}\n{}", devices_view(session), motor_view(session));
}

async fn redraw_on_change(session: Arc<ControlSession>) {
    let mut devices = session.devices.subscribe();
    let mut motor = session.motor.subscribe();
    loop {
        tokio::select! {
            changed = devices.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *devices.borrow_and_update();
                println!("{}", render_devices(&state, &session.devices.status()));
            }
            changed = motor.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = *motor.borrow_and_update();
                println!("{}", render_motor(&state, &session.motor.status()));
            }
        }
    }
}
