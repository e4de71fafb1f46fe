//! Command-line front end.

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use wl_app::usecases::connection::{DisconnectInstance, GetInstanceStatus};
use wl_app::{ConnectionDomainEvent, ConnectionEventPort, ConnectionOrchestrator};
use wl_core::config::AppConfig;
use wl_core::InstanceId;

use crate::bootstrap::{build_connection_deps, build_gateway};

/// Exit code after Ctrl-C, as shells report SIGINT
const INTERRUPTED: u8 = 130;

#[derive(Debug, Parser)]
#[command(name = "walink", version, about = "Link a WhatsApp account to its backend instance")]
pub struct Cli {
    /// Config file (falls back to WALINK_CONFIG, then ./walink.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Pair with the instance, printing QR codes until connected
    Connect,
    /// Log the instance out
    Disconnect {
        #[arg(long, value_name = "ID")]
        instance: String,
    },
    /// Print the remote status of an instance once
    Status {
        #[arg(long, value_name = "ID")]
        instance: String,
    },
}

/// How a `connect` run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairingOutcome {
    Connected,
    Failed(String),
    Interrupted,
}

impl PairingOutcome {
    pub fn exit_status(&self) -> u8 {
        match self {
            Self::Connected => 0,
            Self::Failed(_) => 1,
            Self::Interrupted => INTERRUPTED,
        }
    }
}

pub async fn run(command: Command, config: &AppConfig) -> anyhow::Result<ExitCode> {
    match command {
        Command::Connect => {
            let orchestrator = ConnectionOrchestrator::spawn(build_connection_deps(config)?);
            let outcome = watch_pairing(&orchestrator, async {
                if let Err(err) = tokio::signal::ctrl_c().await {
                    tracing::error!(error = %err, "Failed to listen for Ctrl-C");
                    std::future::pending::<()>().await;
                }
            })
            .await?;

            if let PairingOutcome::Failed(message) = &outcome {
                eprintln!("Connection failed: {}", message);
            }
            Ok(ExitCode::from(outcome.exit_status()))
        }
        Command::Disconnect { instance } => {
            let instance_id = InstanceId::from(instance);
            DisconnectInstance::new(build_gateway(config)?)
                .execute(&instance_id)
                .await
                .with_context(|| format!("Failed to disconnect instance {}", instance_id))?;
            println!("Instance {} disconnected", instance_id);
            Ok(ExitCode::SUCCESS)
        }
        Command::Status { instance } => {
            let instance_id = InstanceId::from(instance);
            let response = GetInstanceStatus::new(build_gateway(config)?)
                .execute(&instance_id)
                .await
                .with_context(|| format!("Failed to read status of instance {}", instance_id))?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.is_open() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

/// Start a pairing attempt and follow its events until it settles or
/// `interrupt` resolves. The driver is torn down before returning.
pub async fn watch_pairing(
    orchestrator: &ConnectionOrchestrator,
    interrupt: impl Future<Output = ()>,
) -> anyhow::Result<PairingOutcome> {
    let mut events = orchestrator.subscribe().await?;
    orchestrator.connect()?;
    tokio::pin!(interrupt);

    let outcome = loop {
        tokio::select! {
            _ = &mut interrupt => {
                tracing::info!("Interrupted, tearing down");
                break PairingOutcome::Interrupted;
            }
            event = events.recv() => {
                let Some(event) = event else {
                    break PairingOutcome::Failed("connection driver stopped".to_string());
                };
                println!("{}", render_event(&event));
                match event {
                    ConnectionDomainEvent::Connected { .. } => break PairingOutcome::Connected,
                    ConnectionDomainEvent::ConnectionFailed { message } => {
                        break PairingOutcome::Failed(message)
                    }
                    _ => {}
                }
            }
        }
    };

    orchestrator.shutdown().await;
    Ok(outcome)
}

pub fn render_event(event: &ConnectionDomainEvent) -> String {
    match event {
        ConnectionDomainEvent::QrCodeReady {
            instance_id,
            qr_payload,
        } => format!(
            "Scan this QR code or enter this pairing code in WhatsApp (instance {}):\n{}",
            instance_id,
            qr_payload.as_str()
        ),
        ConnectionDomainEvent::Connected {
            instance_id: Some(instance_id),
        } => format!("Connected (instance {})", instance_id),
        ConnectionDomainEvent::Connected { instance_id: None } => "Connected".to_string(),
        ConnectionDomainEvent::PairingTimedOut { instance_id, .. } => format!(
            "Still waiting for the scan, restarting instance {} for a fresh code",
            instance_id
        ),
        ConnectionDomainEvent::Disconnected => "Disconnected".to_string(),
        ConnectionDomainEvent::ConnectionFailed { message } => format!("Failed: {}", message),
        ConnectionDomainEvent::LogoutFailed { message } => format!("Logout failed: {}", message),
    }
}
