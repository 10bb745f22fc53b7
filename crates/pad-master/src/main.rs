//! Pad-Over-IP master application entry point.
//!
//! Wires the UDP transceiver to the virtual gamepad driver and runs the
//! Tokio event loop.
//!
//! ```text
//! main()
//!  └─ UinputGamepad::open()      -- register the virtual device
//!  └─ InjectionService::run()    -- device writer task
//!  └─ Transceiver::spawn(Master) -- pairing / streaming task
//!  └─ notification dispatch loop
//!       ├─ HostFound     -> pair with the first announcing slave
//!       ├─ Connected     -> wake driver, start keep-alive ticks
//!       ├─ DataArrived   -> decode, forward to driver
//!       └─ Disconnected  -> quiesce driver, wait for rediscovery
//! ```
//!
//! The master answers the slave's announce implicitly: pairing connects
//! the socket and the keep-alive ticks (and any later traffic) are what
//! move the slave out of its announce loop and feed its liveness timer.

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use pad_core::{decode_event, GamepadEvent, Notification, Role};
use pad_master::driver::{DriverCommand, InjectionService, VirtualGamepad};
use pad_net::Transceiver;

/// How often the master pings the slave while streaming. Must undercut
/// the slave's one-second liveness window comfortably.
const KEEPALIVE_PERIOD: Duration = Duration::from_millis(500);

fn open_device() -> anyhow::Result<Box<dyn VirtualGamepad>> {
    #[cfg(target_os = "linux")]
    {
        let device = pad_master::driver::uinput::UinputGamepad::open()
            .context("opening /dev/uinput (is the uinput module loaded and writable?)")?;
        Ok(Box::new(device))
    }
    #[cfg(not(target_os = "linux"))]
    {
        tracing::warn!("no virtual gamepad backend for this platform, recording events in memory");
        let (device, _recording) = pad_master::driver::mock::MockGamepad::new();
        Ok(Box::new(device))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Pad-Over-IP master starting");

    // ── Virtual gamepad device ────────────────────────────────────────────────
    let device = open_device()?;
    let (driver_tx, driver_rx) = mpsc::channel(256);
    tokio::spawn(InjectionService::new(device).run(driver_rx));

    // ── Transceiver ───────────────────────────────────────────────────────────
    let (transceiver, mut notifications) = Transceiver::spawn(Role::Master);

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
            // One stop per remaining state: stream/listen -> init -> closed.
            let _ = shutdown_handle.stop().await;
            let _ = shutdown_handle.stop().await;
        }
    });

    // ── Notification dispatch loop ────────────────────────────────────────────
    info!("waiting for a slave to announce itself");

    let mut paired = false;
    let mut keepalive: Option<tokio::task::JoinHandle<()>> = None;

    while let Some(notification) = notifications.recv().await {
        match notification {
            Notification::StateChanged(state) => {
                debug!(?state, "transceiver state changed");
            }

            Notification::HostFound(addr) => {
                if paired {
                    debug!(%addr, "slave announced while already pairing, ignored");
                    continue;
                }
                info!(%addr, "slave found, pairing");
                paired = true;
                transceiver.set_peer(addr).await?;
                transceiver.start().await?;
            }

            Notification::Connected => {
                info!("stream established");
                let _ = driver_tx.send(DriverCommand::Connected).await;
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
                Ok(event) => {
                    let _ = driver_tx.send(DriverCommand::Event(event)).await;
                }
                Err(e) => debug!("dropping undecodable datagram: {e}"),
            },

            Notification::Disconnected(reason) => {
                info!("stream ended: {reason}");
                paired = false;
                if let Some(task) = keepalive.take() {
                    task.abort();
                }
                let _ = driver_tx.send(DriverCommand::Disconnected).await;
            }

            Notification::Error(e) => {
                error!("transceiver error: {e}");
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
    info!("Pad-Over-IP master stopped");
    Ok(())
}
