//! Pad-Over-IP slave application entry point.
//!
//! Announces itself on the LAN until a master answers, then streams
//! gamepad events to it.
//!
//! ```text
//! main()
//!  └─ Transceiver::spawn(Slave) -- announce / streaming task
//!  └─ notification dispatch loop
//!       ├─ Connected    -> start the event source
//!       ├─ DataArrived  -> master traffic (feeds the liveness timer)
//!       └─ Disconnected -> back to announcing
//! ```
//!
//! The event source here is a keep-alive ticker sending `Dummy` frames;
//! a real controller surface replaces it by calling
//! [`Transceiver::send_event`] with button and stick events.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use pad_core::{decode_event, GamepadEvent, Notification, Role};
use pad_net::Transceiver;

/// How often the slave pings the master while no real events flow.
const KEEPALIVE_PERIOD: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Pad-Over-IP slave starting");

    let (transceiver, mut notifications) = Transceiver::spawn(Role::Slave);

    let bind_addr: IpAddr = std::env::var("PAD_BIND_ADDR")
        .unwrap_or_else(|_| "0.0.0.0".to_string())
        .parse()
        .context("PAD_BIND_ADDR is not a valid IP address")?;
    transceiver.set_selected_interface(bind_addr).await?;
    transceiver.start().await?;

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let shutdown_handle = transceiver.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            // One stop per remaining state: stream -> announce -> init -> closed.
            for _ in 0..3 {
                let _ = shutdown_handle.stop().await;
            }
        }
    });

    // ── Notification dispatch loop ────────────────────────────────────────────
    info!("announcing on the local network");

    let mut keepalive: Option<tokio::task::JoinHandle<()>> = None;

    while let Some(notification) = notifications.recv().await {
        match notification {
            Notification::StateChanged(state) => {
                debug!(?state, "transceiver state changed");
            }

            Notification::Connected => {
                info!("master answered, streaming");
                let tick_handle = transceiver.clone();
                keepalive = Some(tokio::spawn(async move {
                    let mut interval = tokio::time::interval(KEEPALIVE_PERIOD);
                    loop {
                        interval.tick().await;
                        if tick_handle.send_event(&GamepadEvent::dummy()).await.is_err() {
                            break;
                        }
                    }
                }));
            }

            Notification::DataArrived(payload) => match decode_event(&payload) {
                Ok(event) => debug!(?event, "event from master"),
                Err(e) => debug!("dropping undecodable datagram: {e}"),
            },

            Notification::Disconnected(reason) => {
                info!("stream ended: {reason}");
                if let Some(task) = keepalive.take() {
                    task.abort();
                }
            }

            Notification::Error(e) => {
                error!("transceiver error: {e}");
            }

            // A slave never discovers hosts; masters find it.
            Notification::HostFound(addr) => {
                debug!(%addr, "unexpected host-found notification");
            }

            Notification::Closed => {
                info!("transceiver closed");
                break;
            }
        }
    }

    if let Some(task) = keepalive.take() {
        task.abort();
    }
    info!("Pad-Over-IP slave stopped");
    Ok(())
}
