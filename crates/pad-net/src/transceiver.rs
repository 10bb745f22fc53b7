//! The UDP transceiver runtime.
//!
//! One spawned task per transceiver owns the socket, the two one-shot
//! timers (announce period and liveness deadline), and the state machine.
//! The task body is a single `select!` loop over three sources:
//!
//! 1. commands from [`Transceiver`] handles,
//! 2. inbound datagrams (only while a socket is bound),
//! 3. whichever scheduled wakeup expires first.
//!
//! Every source is converted into a [`Stimulus`], handed to the machine,
//! and the returned effects are executed in order. A `Bind` effect is the
//! one asynchronous effect whose outcome matters to the machine, so its
//! result is fed straight back in as `SocketBound` or `BindFailed` and the
//! follow-up effects join the back of the queue.

use std::collections::VecDeque;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use pad_core::transceiver::{Effect, Stimulus, TimerKind};
use pad_core::{
    encode_event, GamepadEvent, Notification, Role, TransceiverConfig, TransceiverMachine,
};

/// Largest datagram the runtime will accept. Event frames are at most ten
/// bytes; anything bigger than this is not ours.
const MAX_DATAGRAM: usize = 1024;

const COMMAND_QUEUE_DEPTH: usize = 32;
const NOTIFICATION_QUEUE_DEPTH: usize = 64;

/// The runtime task has exited, so the handle can no longer reach it.
#[derive(Debug, Error)]
#[error("transceiver task has shut down")]
pub struct TransceiverGone;

/// Commands a handle can issue to the runtime task.
#[derive(Debug)]
enum Command {
    Start,
    Stop,
    Send(Vec<u8>),
    SetSelectedInterface(IpAddr),
    SetPeer(SocketAddr),
}

/// Handle to a running transceiver task.
///
/// Clones share the same task. Dropping every clone closes the command
/// channel, which shuts the task down.
#[derive(Clone)]
pub struct Transceiver {
    cmd_tx: mpsc::Sender<Command>,
}

impl Transceiver {
    /// Spawns a transceiver task for `role` with the default configuration
    /// and returns the handle plus the notification stream.
    pub fn spawn(role: Role) -> (Self, mpsc::Receiver<Notification>) {
        Self::spawn_with_config(role, TransceiverConfig::default())
    }

    pub fn spawn_with_config(
        role: Role,
        config: TransceiverConfig,
    ) -> (Self, mpsc::Receiver<Notification>) {
        let (cmd_tx, cmd_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let (notif_tx, notif_rx) = mpsc::channel(NOTIFICATION_QUEUE_DEPTH);
        let (machine, initial_effects) = TransceiverMachine::with_config(role, config);

        tokio::spawn(async move {
            let runtime = Runtime {
                machine,
                cmd_rx,
                notif_tx,
                socket: None,
                peer_filter: None,
                broadcast_at: None,
                liveness_at: None,
            };
            runtime.run(initial_effects).await;
        });

        (Self { cmd_tx }, notif_rx)
    }

    /// Advances the state machine (bind and listen, or pair and stream,
    /// depending on the current state).
    pub async fn start(&self) -> Result<(), TransceiverGone> {
        self.command(Command::Start).await
    }

    /// Walks the state machine back toward its initial state. In the
    /// initial state this shuts the task down.
    pub async fn stop(&self) -> Result<(), TransceiverGone> {
        self.command(Command::Stop).await
    }

    /// Encodes `event` and sends it to the paired remote.
    pub async fn send_event(&self, event: &GamepadEvent) -> Result<(), TransceiverGone> {
        self.command(Command::Send(encode_event(event))).await
    }

    /// Sends a raw payload to the paired remote.
    pub async fn send_raw(&self, payload: Vec<u8>) -> Result<(), TransceiverGone> {
        self.command(Command::Send(payload)).await
    }

    /// Selects the local interface to bind on the next `start`.
    pub async fn set_selected_interface(&self, addr: IpAddr) -> Result<(), TransceiverGone> {
        self.command(Command::SetSelectedInterface(addr)).await
    }

    /// Chooses which discovered slave to pair with (master role).
    pub async fn set_peer(&self, addr: SocketAddr) -> Result<(), TransceiverGone> {
        self.command(Command::SetPeer(addr)).await
    }

    async fn command(&self, cmd: Command) -> Result<(), TransceiverGone> {
        self.cmd_tx.send(cmd).await.map_err(|_| TransceiverGone)
    }
}

/// What the select loop woke up for.
enum LoopEvent {
    Command(Option<Command>),
    Datagram(std::io::Result<(Vec<u8>, SocketAddr)>),
    Timer(TimerKind),
}

struct Runtime {
    machine: TransceiverMachine,
    cmd_rx: mpsc::Receiver<Command>,
    notif_tx: mpsc::Sender<Notification>,
    socket: Option<UdpSocket>,
    /// When paired as master, only datagrams from this address are
    /// delivered to the machine.
    peer_filter: Option<SocketAddr>,
    broadcast_at: Option<Instant>,
    liveness_at: Option<Instant>,
}

impl Runtime {
    async fn run(mut self, initial_effects: Vec<Effect>) {
        if self.dispatch(initial_effects).await.is_break() {
            return;
        }

        loop {
            let event = tokio::select! {
                cmd = self.cmd_rx.recv() => LoopEvent::Command(cmd),
                res = recv_on(self.socket.as_ref()) => LoopEvent::Datagram(res),
                kind = next_deadline(self.broadcast_at, self.liveness_at) => {
                    LoopEvent::Timer(kind)
                }
            };

            let effects = match event {
                LoopEvent::Command(None) => {
                    debug!("all transceiver handles dropped, shutting down");
                    return;
                }
                LoopEvent::Command(Some(cmd)) => self.apply_command(cmd),
                LoopEvent::Datagram(Ok((payload, from))) => {
                    if self.peer_filter.is_some_and(|peer| peer != from) {
                        trace!(%from, "dropping datagram from non-paired sender");
                        continue;
                    }
                    self.machine.handle(Stimulus::Datagram { from, payload })
                }
                LoopEvent::Datagram(Err(e)) => {
                    // Transient receive errors (e.g. ICMP port unreachable
                    // surfaced on the socket) do not end the session.
                    warn!("udp recv error: {e}");
                    continue;
                }
                LoopEvent::Timer(kind) => {
                    self.clear_deadline(kind);
                    self.machine.handle(Stimulus::TimerFired(kind))
                }
            };

            if self.dispatch(effects).await.is_break() {
                return;
            }
        }
    }

    fn apply_command(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::Start => self.machine.handle(Stimulus::Start),
            Command::Stop => self.machine.handle(Stimulus::Stop),
            Command::Send(payload) => self.machine.handle(Stimulus::Send(payload)),
            Command::SetSelectedInterface(addr) => {
                self.machine.set_selected_interface(addr);
                Vec::new()
            }
            Command::SetPeer(addr) => {
                self.machine.set_peer(addr);
                Vec::new()
            }
        }
    }

    /// Executes effects in order. Effects produced by feedback stimuli
    /// (bind outcomes) are appended behind the ones already queued, so the
    /// machine's ordering guarantees hold end to end.
    async fn dispatch(&mut self, effects: Vec<Effect>) -> std::ops::ControlFlow<()> {
        let mut queue: VecDeque<Effect> = effects.into();

        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::Bind(addr) => {
                    let outcome = self.bind(addr).await;
                    queue.extend(self.machine.handle(outcome));
                }
                Effect::CloseSocket => {
                    self.socket = None;
                }
                Effect::ConnectPeer(addr) => {
                    self.peer_filter = Some(addr);
                }
                Effect::DisconnectPeer => {
                    self.peer_filter = None;
                }
                Effect::SendTo { dest, payload } => self.send_to(dest, &payload).await,
                Effect::SendToPeer { payload } => match self.peer_filter {
                    Some(dest) => self.send_to(dest, &payload).await,
                    None => warn!("send requested with no paired peer"),
                },
                Effect::StartTimer { kind, period } => {
                    self.set_deadline(kind, Instant::now() + period);
                }
                Effect::StopTimer(kind) => self.clear_deadline(kind),
                Effect::Notify(notification) => {
                    let closed = matches!(notification, Notification::Closed);
                    if self.notif_tx.send(notification).await.is_err() {
                        debug!("notification receiver dropped, shutting down");
                        return std::ops::ControlFlow::Break(());
                    }
                    if closed {
                        return std::ops::ControlFlow::Break(());
                    }
                }
            }
        }

        std::ops::ControlFlow::Continue(())
    }

    async fn bind(&mut self, addr: SocketAddr) -> Stimulus {
        match UdpSocket::bind(addr).await {
            Ok(socket) => {
                if let Err(e) = socket.set_broadcast(true) {
                    // Announcing needs broadcast; receiving does not.
                    warn!("could not enable SO_BROADCAST on {addr}: {e}");
                }
                debug!(%addr, "udp socket bound");
                self.socket = Some(socket);
                Stimulus::SocketBound
            }
            Err(e) => {
                warn!(%addr, "udp bind failed: {e}");
                Stimulus::BindFailed(e.to_string())
            }
        }
    }

    async fn send_to(&self, dest: SocketAddr, payload: &[u8]) {
        match &self.socket {
            Some(socket) => {
                if let Err(e) = socket.send_to(payload, dest).await {
                    warn!(%dest, "udp send failed: {e}");
                }
            }
            None => warn!(%dest, "send requested with no bound socket"),
        }
    }

    fn set_deadline(&mut self, kind: TimerKind, at: Instant) {
        match kind {
            TimerKind::Broadcast => self.broadcast_at = Some(at),
            TimerKind::Liveness => self.liveness_at = Some(at),
        }
    }

    fn clear_deadline(&mut self, kind: TimerKind) {
        match kind {
            TimerKind::Broadcast => self.broadcast_at = None,
            TimerKind::Liveness => self.liveness_at = None,
        }
    }
}

/// Receives one datagram, or pends forever while no socket is bound so the
/// select arm stays inert.
async fn recv_on(socket: Option<&UdpSocket>) -> std::io::Result<(Vec<u8>, SocketAddr)> {
    match socket {
        Some(socket) => {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (len, from) = socket.recv_from(&mut buf).await?;
            Ok((buf[..len].to_vec(), from))
        }
        None => std::future::pending().await,
    }
}

/// Sleeps until the earliest armed deadline and reports which timer it was,
/// or pends forever when neither is armed.
async fn next_deadline(broadcast_at: Option<Instant>, liveness_at: Option<Instant>) -> TimerKind {
    let (at, kind) = match (broadcast_at, liveness_at) {
        (Some(b), Some(l)) if b <= l => (b, TimerKind::Broadcast),
        (Some(_), Some(l)) => (l, TimerKind::Liveness),
        (Some(b), None) => (b, TimerKind::Broadcast),
        (None, Some(l)) => (l, TimerKind::Liveness),
        (None, None) => std::future::pending().await,
    };
    tokio::time::sleep_until(at).await;
    kind
}

// ── Tests ─────────────────────────────────────────────────────────────────────
