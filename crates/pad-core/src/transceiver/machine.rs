//! The transceiver state machine proper.
//!
//! One tagged union replaces the six per-role state objects of a classic
//! state pattern: exactly one variant is live, a transition drops the old
//! variant's resources (its effects stop its timers first) before the new
//! variant's entry effects run, and every handler is a total function from
//! stimulus to effects.

use std::collections::BTreeSet;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tracing::{debug, trace};

use crate::protocol::codec::{is_quit_frame, quit_frame};

use super::{
    Effect, Notification, Role, State, Stimulus, TimerKind, TransceiverConfig, TransceiverError,
    BROADCAST_PERIOD, LIVENESS_TIMEOUT,
};

/// Internal state with per-phase payloads.
///
/// The discovered-host registry lives inside `Listen` and the paired
/// addresses inside the streaming variants, so leaving a phase releases
/// its data by construction.
#[derive(Debug)]
enum MachineState {
    InitMaster,
    Listen { hosts: BTreeSet<SocketAddr> },
    MasterStream { peer: SocketAddr },
    InitSlave,
    Broadcast,
    SlaveStream { master: SocketAddr },
}

impl MachineState {
    fn public(&self) -> State {
        match self {
            MachineState::InitMaster => State::InitMaster,
            MachineState::Listen { .. } => State::Listen,
            MachineState::MasterStream { .. } => State::MasterStream,
            MachineState::InitSlave => State::InitSlave,
            MachineState::Broadcast => State::Broadcast,
            MachineState::SlaveStream { .. } => State::SlaveStream,
        }
    }
}

/// The pure pairing/streaming state machine for one role.
///
/// Owns the runtime configuration (selected interface, chosen peer) that
/// survives across states; everything phase-local lives in the state
/// variant itself.
pub struct TransceiverMachine {
    role: Role,
    config: TransceiverConfig,
    selected_interface: Option<IpAddr>,
    /// The slave the master's user chose to pair with. Cleared whenever
    /// the machine leaves its streaming state.
    peer: Option<SocketAddr>,
    state: MachineState,
}

impl TransceiverMachine {
    /// Creates a machine in its role's initial state, returning the entry
    /// effects (the initial `StateChanged`).
    pub fn new(role: Role) -> (Self, Vec<Effect>) {
        Self::with_config(role, TransceiverConfig::default())
    }

    pub fn with_config(role: Role, config: TransceiverConfig) -> (Self, Vec<Effect>) {
        let state = match role {
            Role::Master => MachineState::InitMaster,
            Role::Slave => MachineState::InitSlave,
        };
        let effects = vec![Effect::Notify(Notification::StateChanged(state.public()))];
        let machine = Self {
            role,
            config,
            selected_interface: None,
            peer: None,
            state,
        };
        (machine, effects)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn state(&self) -> State {
        self.state.public()
    }

    pub fn config(&self) -> &TransceiverConfig {
        &self.config
    }

    /// Selects the local interface to bind; takes effect on the next `Start`.
    pub fn set_selected_interface(&mut self, addr: IpAddr) {
        self.selected_interface = Some(addr);
    }

    /// Chooses the discovered slave to pair with (master role).
    pub fn set_peer(&mut self, addr: SocketAddr) {
        self.peer = Some(addr);
    }

    /// Applies one stimulus and returns the effects, in execution order.
    pub fn handle(&mut self, stimulus: Stimulus) -> Vec<Effect> {
        trace!(state = ?self.state.public(), ?stimulus, "transceiver stimulus");
        match self.state.public() {
            State::InitMaster => self.handle_init_master(stimulus),
            State::Listen => self.handle_listen(stimulus),
            State::MasterStream => self.handle_master_stream(stimulus),
            State::InitSlave => self.handle_init_slave(stimulus),
            State::Broadcast => self.handle_broadcast(stimulus),
            State::SlaveStream => self.handle_slave_stream(stimulus),
        }
    }

    // ── Shared transition plumbing ────────────────────────────────────────────

    /// Installs `next` and appends its entry effects. The caller has already
    /// appended the outgoing state's exit effects, so teardown strictly
    /// precedes construction.
    fn enter(&mut self, next: MachineState, fx: &mut Vec<Effect>) {
        let from = self.state.public();
        let to = next.public();
        debug!(?from, ?to, "transceiver state transition");
        fx.push(Effect::Notify(Notification::StateChanged(to)));
        match &next {
            MachineState::MasterStream { peer } => {
                fx.push(Effect::ConnectPeer(*peer));
                fx.push(Effect::Notify(Notification::Connected));
            }
            MachineState::Broadcast => {
                fx.push(Effect::StartTimer {
                    kind: TimerKind::Broadcast,
                    period: BROADCAST_PERIOD,
                });
            }
            MachineState::SlaveStream { .. } => {
                fx.push(Effect::Notify(Notification::Connected));
                fx.push(Effect::StartTimer {
                    kind: TimerKind::Liveness,
                    period: LIVENESS_TIMEOUT,
                });
            }
            MachineState::InitMaster
            | MachineState::Listen { .. }
            | MachineState::InitSlave => {}
        }
        self.state = next;
    }

    /// The bind request both Init states issue from `Start`, or the
    /// configuration error when no interface has been selected yet.
    fn bind_or_error(&self, bind_addr: SocketAddr) -> Vec<Effect> {
        if self.selected_interface.is_none() {
            return vec![Effect::Notify(Notification::Error(
                TransceiverError::NoInterfaceSelected,
            ))];
        }
        // Release any socket left over from a previous session first.
        vec![Effect::CloseSocket, Effect::Bind(bind_addr)]
    }

    // ── Master states ─────────────────────────────────────────────────────────

    fn handle_init_master(&mut self, stimulus: Stimulus) -> Vec<Effect> {
        match stimulus {
            Stimulus::Start => {
                // The master accepts discovery datagrams on every interface.
                let addr =
                    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.config.port);
                self.bind_or_error(addr)
            }
            Stimulus::SocketBound => {
                let mut fx = Vec::new();
                self.enter(MachineState::Listen { hosts: BTreeSet::new() }, &mut fx);
                fx
            }
            Stimulus::BindFailed(message) => {
                let addr =
                    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), self.config.port);
                vec![Effect::Notify(Notification::Error(TransceiverError::BindFailed {
                    addr,
                    message,
                }))]
            }
            Stimulus::Stop => vec![Effect::Notify(Notification::Closed)],
            other => self.ignore(other),
        }
    }

    fn handle_listen(&mut self, stimulus: Stimulus) -> Vec<Effect> {
        match stimulus {
            Stimulus::Datagram { from, .. } => {
                let MachineState::Listen { hosts } = &mut self.state else {
                    unreachable!("handle_listen called outside Listen");
                };
                if hosts.insert(from) {
                    debug!(%from, "discovered new slave");
                    vec![Effect::Notify(Notification::HostFound(from))]
                } else {
                    Vec::new()
                }
            }
            Stimulus::Start => match self.peer {
                None => vec![Effect::Notify(Notification::Error(
                    TransceiverError::NoTargetSelected,
                ))],
                Some(peer) => {
                    let mut fx = Vec::new();
                    self.enter(MachineState::MasterStream { peer }, &mut fx);
                    fx
                }
            },
            Stimulus::Stop => {
                let mut fx = vec![Effect::CloseSocket];
                self.enter(MachineState::InitMaster, &mut fx);
                fx
            }
            other => self.ignore(other),
        }
    }

    fn handle_master_stream(&mut self, stimulus: Stimulus) -> Vec<Effect> {
        match stimulus {
            Stimulus::Datagram { payload, .. } => {
                if is_quit_frame(&payload) {
                    debug!("paired slave sent quit, returning to Listen");
                    let mut fx = vec![
                        Effect::DisconnectPeer,
                        Effect::Notify(Notification::Disconnected("peer quit".to_string())),
                    ];
                    self.peer = None;
                    self.enter(MachineState::Listen { hosts: BTreeSet::new() }, &mut fx);
                    fx
                } else {
                    vec![Effect::Notify(Notification::DataArrived(payload))]
                }
            }
            Stimulus::Send(payload) => vec![Effect::SendToPeer { payload }],
            Stimulus::Stop => {
                let mut fx = vec![
                    Effect::DisconnectPeer,
                    Effect::Notify(Notification::Disconnected("stopped by user".to_string())),
                    Effect::CloseSocket,
                ];
                self.peer = None;
                self.enter(MachineState::InitMaster, &mut fx);
                fx
            }
            other => self.ignore(other),
        }
    }

    // ── Slave states ──────────────────────────────────────────────────────────

    fn handle_init_slave(&mut self, stimulus: Stimulus) -> Vec<Effect> {
        match stimulus {
            Stimulus::Start => {
                let interface = self
                    .selected_interface
                    .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                self.bind_or_error(SocketAddr::new(interface, self.config.port))
            }
            Stimulus::SocketBound => {
                let mut fx = Vec::new();
                self.enter(MachineState::Broadcast, &mut fx);
                fx
            }
            Stimulus::BindFailed(message) => {
                let interface = self
                    .selected_interface
                    .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
                vec![Effect::Notify(Notification::Error(TransceiverError::BindFailed {
                    addr: SocketAddr::new(interface, self.config.port),
                    message,
                }))]
            }
            Stimulus::Stop => vec![Effect::Notify(Notification::Closed)],
            other => self.ignore(other),
        }
    }

    fn handle_broadcast(&mut self, stimulus: Stimulus) -> Vec<Effect> {
        match stimulus {
            Stimulus::TimerFired(TimerKind::Broadcast) => vec![
                // An empty datagram is the whole announcement; the sender
                // address is the information.
                Effect::SendTo {
                    dest: self.config.broadcast_addr,
                    payload: Vec::new(),
                },
                Effect::StartTimer {
                    kind: TimerKind::Broadcast,
                    period: BROADCAST_PERIOD,
                },
            ],
            Stimulus::Datagram { from, .. } => {
                debug!(%from, "master answered, entering stream");
                let mut fx = vec![Effect::StopTimer(TimerKind::Broadcast)];
                self.enter(MachineState::SlaveStream { master: from }, &mut fx);
                fx
            }
            Stimulus::Stop => {
                let mut fx = vec![Effect::StopTimer(TimerKind::Broadcast), Effect::CloseSocket];
                self.enter(MachineState::InitSlave, &mut fx);
                fx
            }
            other => self.ignore(other),
        }
    }

    fn handle_slave_stream(&mut self, stimulus: Stimulus) -> Vec<Effect> {
        let MachineState::SlaveStream { master } = &self.state else {
            unreachable!("handle_slave_stream called outside SlaveStream");
        };
        let master = *master;
        match stimulus {
            Stimulus::Datagram { payload, .. } => vec![
                Effect::StartTimer {
                    kind: TimerKind::Liveness,
                    period: LIVENESS_TIMEOUT,
                },
                Effect::Notify(Notification::DataArrived(payload)),
            ],
            Stimulus::Send(payload) => vec![Effect::SendTo { dest: master, payload }],
            Stimulus::Stop => self.leave_slave_stream(master, "stopped by user"),
            Stimulus::TimerFired(TimerKind::Liveness) => {
                debug!("liveness timeout, returning to Broadcast");
                self.leave_slave_stream(master, "liveness timeout")
            }
            other => self.ignore(other),
        }
    }

    /// Common exit path for SlaveStream: tell the master we are gone (best
    /// effort), tear the state down, resume announcing.
    fn leave_slave_stream(&mut self, master: SocketAddr, reason: &str) -> Vec<Effect> {
        let mut fx = vec![
            Effect::SendTo { dest: master, payload: quit_frame() },
            Effect::StopTimer(TimerKind::Liveness),
            Effect::Notify(Notification::Disconnected(reason.to_string())),
        ];
        self.enter(MachineState::Broadcast, &mut fx);
        fx
    }

    fn ignore(&self, stimulus: Stimulus) -> Vec<Effect> {
        debug!(state = ?self.state.public(), ?stimulus, "stimulus ignored in this state");
        Vec::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> SocketAddr {
        s.parse().unwrap()
    }

    fn notifications(effects: &[Effect]) -> Vec<Notification> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Notify(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    /// A master brought to Listen (interface set, bind acknowledged).
    fn listening_master() -> TransceiverMachine {
        let (mut m, _) = TransceiverMachine::new(Role::Master);
        m.set_selected_interface("192.168.1.10".parse().unwrap());
        m.handle(Stimulus::Start);
        m.handle(Stimulus::SocketBound);
        assert_eq!(m.state(), State::Listen);
        m
    }

    /// A slave brought to Broadcast.
    fn broadcasting_slave() -> TransceiverMachine {
        let (mut m, _) = TransceiverMachine::new(Role::Slave);
        m.set_selected_interface("192.168.1.20".parse().unwrap());
        m.handle(Stimulus::Start);
        m.handle(Stimulus::SocketBound);
        assert_eq!(m.state(), State::Broadcast);
        m
    }

    /// A slave paired with the given master address.
    fn streaming_slave(master: SocketAddr) -> TransceiverMachine {
        let mut m = broadcasting_slave();
        m.handle(Stimulus::Datagram { from: master, payload: Vec::new() });
        assert_eq!(m.state(), State::SlaveStream);
        m
    }

    // ── Master: init ─────────────────────────────────────────────────────────

    #[test]
    fn test_master_start_without_interface_reports_error_and_stays() {
        let (mut m, _) = TransceiverMachine::new(Role::Master);

        let fx = m.handle(Stimulus::Start);

        assert_eq!(
            notifications(&fx),
            vec![Notification::Error(TransceiverError::NoInterfaceSelected)]
        );
        assert_eq!(m.state(), State::InitMaster);
    }

    #[test]
    fn test_master_start_requests_wildcard_bind() {
        let (mut m, _) = TransceiverMachine::new(Role::Master);
        m.set_selected_interface("192.168.1.10".parse().unwrap());

        let fx = m.handle(Stimulus::Start);

        assert_eq!(
            fx,
            vec![Effect::CloseSocket, Effect::Bind(addr("0.0.0.0:45800"))]
        );
        // No transition until the runtime answers.
        assert_eq!(m.state(), State::InitMaster);
    }

    #[test]
    fn test_master_enters_listen_once_bound() {
        let (mut m, _) = TransceiverMachine::new(Role::Master);
        m.set_selected_interface("192.168.1.10".parse().unwrap());
        m.handle(Stimulus::Start);

        let fx = m.handle(Stimulus::SocketBound);

        assert_eq!(m.state(), State::Listen);
        assert_eq!(notifications(&fx), vec![Notification::StateChanged(State::Listen)]);
    }

    #[test]
    fn test_master_bind_failure_reports_error_and_stays() {
        let (mut m, _) = TransceiverMachine::new(Role::Master);
        m.set_selected_interface("192.168.1.10".parse().unwrap());
        m.handle(Stimulus::Start);

        let fx = m.handle(Stimulus::BindFailed("permission denied".to_string()));

        assert_eq!(m.state(), State::InitMaster);
        assert!(matches!(
            &notifications(&fx)[..],
            [Notification::Error(TransceiverError::BindFailed { .. })]
        ));
    }

    #[test]
    fn test_master_stop_in_init_asks_application_to_close() {
        let (mut m, _) = TransceiverMachine::new(Role::Master);

        let fx = m.handle(Stimulus::Stop);

        assert_eq!(notifications(&fx), vec![Notification::Closed]);
        assert_eq!(m.state(), State::InitMaster);
    }

    // ── Master: listen ───────────────────────────────────────────────────────

    #[test]
    fn test_listen_announces_each_sender_exactly_once() {
        let mut m = listening_master();
        let slave = addr("10.0.0.5:45800");

        let first = m.handle(Stimulus::Datagram { from: slave, payload: Vec::new() });
        let second = m.handle(Stimulus::Datagram { from: slave, payload: Vec::new() });

        assert_eq!(notifications(&first), vec![Notification::HostFound(slave)]);
        assert!(second.is_empty(), "duplicate sender must not re-announce");
        assert_eq!(m.state(), State::Listen);
    }

    #[test]
    fn test_listen_distinguishes_senders() {
        let mut m = listening_master();

        let a = m.handle(Stimulus::Datagram { from: addr("10.0.0.5:45800"), payload: vec![] });
        let b = m.handle(Stimulus::Datagram { from: addr("10.0.0.6:45800"), payload: vec![] });

        assert_eq!(notifications(&a).len(), 1);
        assert_eq!(notifications(&b).len(), 1);
    }

    #[test]
    fn test_listen_start_without_peer_reports_error() {
        let mut m = listening_master();

        let fx = m.handle(Stimulus::Start);

        assert_eq!(
            notifications(&fx),
            vec![Notification::Error(TransceiverError::NoTargetSelected)]
        );
        assert_eq!(m.state(), State::Listen);
    }

    #[test]
    fn test_listen_start_with_peer_enters_stream() {
        let mut m = listening_master();
        let slave = addr("10.0.0.5:45800");
        m.set_peer(slave);

        let fx = m.handle(Stimulus::Start);

        assert_eq!(m.state(), State::MasterStream);
        assert_eq!(
            fx,
            vec![
                Effect::Notify(Notification::StateChanged(State::MasterStream)),
                Effect::ConnectPeer(slave),
                Effect::Notify(Notification::Connected),
            ]
        );
    }

    #[test]
    fn test_listen_stop_returns_to_init_and_releases_socket() {
        let mut m = listening_master();

        let fx = m.handle(Stimulus::Stop);

        assert_eq!(m.state(), State::InitMaster);
        assert_eq!(fx[0], Effect::CloseSocket);
    }

    // ── Master: stream ───────────────────────────────────────────────────────

    fn paired_master() -> TransceiverMachine {
        let mut m = listening_master();
        m.set_peer(addr("10.0.0.5:45800"));
        m.handle(Stimulus::Start);
        m
    }

    #[test]
    fn test_master_stream_surfaces_event_payloads() {
        let mut m = paired_master();
        let payload = vec![1, 3];

        let fx = m.handle(Stimulus::Datagram {
            from: addr("10.0.0.5:45800"),
            payload: payload.clone(),
        });

        assert_eq!(notifications(&fx), vec![Notification::DataArrived(payload)]);
        assert_eq!(m.state(), State::MasterStream);
    }

    #[test]
    fn test_master_stream_sends_through_connected_socket() {
        let mut m = paired_master();

        let fx = m.handle(Stimulus::Send(vec![0xAB]));

        assert_eq!(fx, vec![Effect::SendToPeer { payload: vec![0xAB] }]);
    }

    #[test]
    fn test_quit_frame_returns_master_to_listen() {
        let mut m = paired_master();

        let fx = m.handle(Stimulus::Datagram {
            from: addr("10.0.0.5:45800"),
            payload: quit_frame(),
        });

        assert_eq!(m.state(), State::Listen);
        assert_eq!(
            notifications(&fx),
            vec![
                Notification::Disconnected("peer quit".to_string()),
                Notification::StateChanged(State::Listen),
            ]
        );
        assert!(fx.contains(&Effect::DisconnectPeer));
    }

    #[test]
    fn test_pairing_is_cleared_when_stream_ends() {
        let mut m = paired_master();
        m.handle(Stimulus::Datagram {
            from: addr("10.0.0.5:45800"),
            payload: quit_frame(),
        });

        // Back in Listen the old peer must not be silently reused.
        let fx = m.handle(Stimulus::Start);

        assert_eq!(
            notifications(&fx),
            vec![Notification::Error(TransceiverError::NoTargetSelected)]
        );
    }

    #[test]
    fn test_master_stream_stop_disconnects_and_returns_to_init() {
        let mut m = paired_master();

        let fx = m.handle(Stimulus::Stop);

        assert_eq!(m.state(), State::InitMaster);
        assert_eq!(
            notifications(&fx),
            vec![
                Notification::Disconnected("stopped by user".to_string()),
                Notification::StateChanged(State::InitMaster),
            ]
        );
        assert!(fx.contains(&Effect::DisconnectPeer));
        assert!(fx.contains(&Effect::CloseSocket));
    }

    // ── Slave: init and broadcast ────────────────────────────────────────────

    #[test]
    fn test_slave_start_binds_selected_interface() {
        let (mut m, _) = TransceiverMachine::new(Role::Slave);
        m.set_selected_interface("192.168.1.20".parse().unwrap());

        let fx = m.handle(Stimulus::Start);

        assert_eq!(
            fx,
            vec![Effect::CloseSocket, Effect::Bind(addr("192.168.1.20:45800"))]
        );
    }

    #[test]
    fn test_slave_enters_broadcast_with_timer_once_bound() {
        let (mut m, _) = TransceiverMachine::new(Role::Slave);
        m.set_selected_interface("192.168.1.20".parse().unwrap());
        m.handle(Stimulus::Start);

        let fx = m.handle(Stimulus::SocketBound);

        assert_eq!(m.state(), State::Broadcast);
        assert!(fx.contains(&Effect::StartTimer {
            kind: TimerKind::Broadcast,
            period: BROADCAST_PERIOD,
        }));
    }

    #[test]
    fn test_broadcast_tick_sends_one_empty_announce_and_rearms() {
        let mut m = broadcasting_slave();

        let fx = m.handle(Stimulus::TimerFired(TimerKind::Broadcast));

        let sends: Vec<_> = fx
            .iter()
            .filter(|e| matches!(e, Effect::SendTo { .. }))
            .collect();
        assert_eq!(sends.len(), 1, "exactly one announce per tick");
        assert_eq!(
            sends[0],
            &Effect::SendTo { dest: addr("255.255.255.255:45800"), payload: vec![] }
        );
        assert!(fx.contains(&Effect::StartTimer {
            kind: TimerKind::Broadcast,
            period: BROADCAST_PERIOD,
        }));
    }

    #[test]
    fn test_first_datagram_records_master_and_enters_stream() {
        let mut m = broadcasting_slave();
        let master = addr("192.168.1.2:45800");

        let fx = m.handle(Stimulus::Datagram { from: master, payload: Vec::new() });

        assert_eq!(m.state(), State::SlaveStream);
        // Announce timer is stopped before the stream state is built.
        assert_eq!(fx[0], Effect::StopTimer(TimerKind::Broadcast));
        assert!(notifications(&fx).contains(&Notification::Connected));
        // The recorded master is where sends now go.
        let sends = m.handle(Stimulus::Send(vec![9]));
        assert_eq!(sends, vec![Effect::SendTo { dest: master, payload: vec![9] }]);
    }

    #[test]
    fn test_broadcast_stop_returns_to_init_slave() {
        let mut m = broadcasting_slave();

        let fx = m.handle(Stimulus::Stop);

        assert_eq!(m.state(), State::InitSlave);
        assert_eq!(fx[0], Effect::StopTimer(TimerKind::Broadcast));
        assert!(fx.contains(&Effect::CloseSocket));
    }

    // ── Slave: stream ────────────────────────────────────────────────────────

    #[test]
    fn test_slave_stream_resets_liveness_and_surfaces_payload() {
        let mut m = streaming_slave(addr("192.168.1.2:45800"));
        let payload = vec![0, 18, 0, 0, 0, 0, 0, 0, 0, 0];

        let fx = m.handle(Stimulus::Datagram {
            from: addr("192.168.1.2:45800"),
            payload: payload.clone(),
        });

        assert_eq!(
            fx,
            vec![
                Effect::StartTimer { kind: TimerKind::Liveness, period: LIVENESS_TIMEOUT },
                Effect::Notify(Notification::DataArrived(payload)),
            ]
        );
    }

    #[test]
    fn test_slave_stop_sends_quit_to_master_then_rebroadcasts() {
        let master = addr("192.168.1.2:45800");
        let mut m = streaming_slave(master);

        let fx = m.handle(Stimulus::Stop);

        assert_eq!(m.state(), State::Broadcast);
        assert_eq!(fx[0], Effect::SendTo { dest: master, payload: quit_frame() });
        assert!(fx.contains(&Effect::StopTimer(TimerKind::Liveness)));
        assert!(notifications(&fx)
            .contains(&Notification::Disconnected("stopped by user".to_string())));
    }

    #[test]
    fn test_liveness_expiry_disconnects_exactly_once_without_stop() {
        let master = addr("192.168.1.2:45800");
        let mut m = streaming_slave(master);

        let fx = m.handle(Stimulus::TimerFired(TimerKind::Liveness));

        assert_eq!(m.state(), State::Broadcast);
        assert_eq!(fx[0], Effect::SendTo { dest: master, payload: quit_frame() });
        assert!(notifications(&fx)
            .contains(&Notification::Disconnected("liveness timeout".to_string())));

        // A stale expiry arriving after the transition must do nothing.
        let again = m.handle(Stimulus::TimerFired(TimerKind::Liveness));
        assert!(again.is_empty());
        assert_eq!(m.state(), State::Broadcast);
    }

    #[test]
    fn test_streaming_resumes_announcing_after_timeout() {
        let mut m = streaming_slave(addr("192.168.1.2:45800"));
        m.handle(Stimulus::TimerFired(TimerKind::Liveness));

        let fx = m.handle(Stimulus::TimerFired(TimerKind::Broadcast));

        assert!(fx
            .iter()
            .any(|e| matches!(e, Effect::SendTo { payload, .. } if payload.is_empty())));
    }
}
