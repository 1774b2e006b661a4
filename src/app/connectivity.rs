//! Connectivity state machine for the network link and broker session.
//!
//! Advanced once per tick with the current time; never sleeps. Every wait
//! is a deadline compared against `now_ms`.
//!
//! ```text
//!            ┌──────────── link lost ───────────────────────────┐
//!            ▼                                                  │
//!   LinkStart ─▶ LinkAttempt ─(A polls)─▶ LinkWait ─(W polls)─┐ │
//!       ▲              │ link up              │ link up       │ │
//!       │              ▼                      ▼               │ │
//!       │         SessionIdle ◀─────── (next attempt) ─┐      │ │
//!       │              │ connect()                     │      │ │
//!       │              ▼                               │      │ │
//!       │        SessionPending ─(deadline)─ fail ─────┘      │ │
//!       │              │ connected                            │ │
//!       │              ▼                                      │ │
//!       │            Online ──────────────────────────────────┼─┘
//!       │                                                     │
//!       └──── cycles left ◀── cycle failed ───────────────────┘
//!                                   │ no cycles left
//!                                   ▼
//!                          Restart (once) ─▶ Halted
//! ```
//!
//! Broker attempts that run out also end in `Restart` → `Halted`.

use log::debug;

use super::events::{AppEvent, RestartReason};
use super::ports::{BrokerPort, EventSink, NetworkPort, SystemPort};
use crate::config::RetryPolicy;
use crate::identity::{self, ClientId, Topic};

/// Link or session status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Observable connectivity state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityState {
    pub network: LinkStatus,
    pub session: LinkStatus,
    /// Polls left in the current network window, or broker attempts left.
    pub retry_budget: u32,
    /// Network cycles left before a restart.
    pub cycle_budget: u32,
}

/// Result of one [`ConnectivityMachine::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Session healthy; inbound traffic may be serviced.
    Online,
    /// The session came up during this tick.
    SessionEstablished,
    /// Still recovering.
    Recovering,
    /// Budget exhausted: the caller must restart the device. Returned once.
    Restart(RestartReason),
    /// A restart was already requested; nothing more happens.
    Halted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    LinkStart,
    LinkAttempt { next_poll_ms: u64 },
    LinkWait { next_poll_ms: u64 },
    SessionIdle { next_attempt_ms: u64 },
    SessionPending { deadline_ms: u64 },
    Online,
    Halted,
}

pub struct ConnectivityMachine {
    policy: RetryPolicy,
    client_id_prefix: heapless::String<24>,
    inbound_topic: Topic,
    state: ConnectivityState,
    phase: Phase,
    client_id: ClientId,
}

impl ConnectivityMachine {
    pub fn new(policy: RetryPolicy, client_id_prefix: &str, inbound_topic: Topic) -> Self {
        Self {
            policy,
            client_id_prefix: identity::bounded(client_id_prefix),
            inbound_topic,
            state: ConnectivityState {
                network: LinkStatus::Disconnected,
                session: LinkStatus::Disconnected,
                retry_budget: policy.wifi_attempt_count,
                cycle_budget: policy.wifi_cycle_budget,
            },
            phase: Phase::LinkStart,
            client_id: ClientId::new(),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Whether the broker session is currently up.
    pub fn is_online(&self) -> bool {
        self.phase == Phase::Online
    }

    pub fn is_halted(&self) -> bool {
        self.phase == Phase::Halted
    }

    /// Client id of the current (or last) broker session.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Stop all further work, e.g. because a manual reset restarts the device.
    pub fn halt(&mut self) {
        self.phase = Phase::Halted;
    }

    /// Advance the machine by one step.
    pub fn tick(
        &mut self,
        now_ms: u64,
        net: &mut impl NetworkPort,
        broker: &mut impl BrokerPort,
        rng: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        match self.phase {
            Phase::Halted => TickOutcome::Halted,
            Phase::LinkStart | Phase::LinkAttempt { .. } | Phase::LinkWait { .. } => {
                if net.is_connected() {
                    self.on_link_up(now_ms, sink);
                    return self.tick_session(now_ms, broker, rng, sink);
                }
                self.tick_link(now_ms, net, sink)
            }
            Phase::SessionIdle { .. } | Phase::SessionPending { .. } | Phase::Online => {
                if !net.is_connected() {
                    self.on_link_lost(broker, sink);
                    return self.tick_link(now_ms, net, sink);
                }
                self.tick_session(now_ms, broker, rng, sink)
            }
        }
    }

    // ── Network link ──────────────────────────────────────────

    fn tick_link(
        &mut self,
        now_ms: u64,
        net: &mut impl NetworkPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        let interval = u64::from(self.policy.wifi_attempt_interval_ms);
        match self.phase {
            Phase::LinkStart => {
                self.state.network = LinkStatus::Connecting;
                self.state.retry_budget = self.policy.wifi_attempt_count;
                sink.emit(&AppEvent::NetworkConnecting {
                    cycles_left: self.state.cycle_budget,
                });
                if let Err(e) = net.begin() {
                    sink.emit(&AppEvent::NetworkBeginFailed(e));
                }
                self.phase = Phase::LinkAttempt {
                    next_poll_ms: now_ms + interval,
                };
                TickOutcome::Recovering
            }
            Phase::LinkAttempt { next_poll_ms } if now_ms >= next_poll_ms => {
                self.state.retry_budget = self.state.retry_budget.saturating_sub(1);
                debug!("NET | attempt polls left: {}", self.state.retry_budget);
                if self.state.retry_budget == 0 {
                    self.state.retry_budget = self.policy.wifi_wait_count;
                    sink.emit(&AppEvent::NetworkWaiting);
                    self.phase = Phase::LinkWait {
                        next_poll_ms: now_ms + u64::from(self.policy.wifi_wait_interval_ms),
                    };
                } else {
                    self.phase = Phase::LinkAttempt {
                        next_poll_ms: next_poll_ms + interval,
                    };
                }
                TickOutcome::Recovering
            }
            Phase::LinkWait { next_poll_ms } if now_ms >= next_poll_ms => {
                self.state.retry_budget = self.state.retry_budget.saturating_sub(1);
                if self.state.retry_budget > 0 {
                    self.phase = Phase::LinkWait {
                        next_poll_ms: next_poll_ms + u64::from(self.policy.wifi_wait_interval_ms),
                    };
                    return TickOutcome::Recovering;
                }
                self.state.cycle_budget = self.state.cycle_budget.saturating_sub(1);
                self.state.network = LinkStatus::Disconnected;
                sink.emit(&AppEvent::NetworkCycleFailed {
                    cycles_left: self.state.cycle_budget,
                });
                if self.state.cycle_budget == 0 {
                    return self.request_restart(RestartReason::NetworkExhausted, sink);
                }
                self.phase = Phase::LinkStart;
                TickOutcome::Recovering
            }
            _ => TickOutcome::Recovering,
        }
    }

    fn on_link_up(&mut self, now_ms: u64, sink: &mut impl EventSink) {
        self.state.network = LinkStatus::Connected;
        if self.policy.restore_cycle_budget_on_success {
            self.state.cycle_budget = self.policy.wifi_cycle_budget;
        }
        sink.emit(&AppEvent::NetworkUp);
        self.begin_session_recovery(now_ms);
    }

    fn on_link_lost(&mut self, broker: &mut impl BrokerPort, sink: &mut impl EventSink) {
        if self.state.session != LinkStatus::Disconnected {
            broker.disconnect();
        }
        self.state.network = LinkStatus::Disconnected;
        self.state.session = LinkStatus::Disconnected;
        sink.emit(&AppEvent::NetworkLost);
        self.phase = Phase::LinkStart;
    }

    // ── Broker session ────────────────────────────────────────

    fn begin_session_recovery(&mut self, now_ms: u64) {
        self.state.session = LinkStatus::Disconnected;
        self.state.retry_budget = self.policy.broker_attempt_count;
        self.phase = Phase::SessionIdle {
            next_attempt_ms: now_ms,
        };
    }

    fn tick_session(
        &mut self,
        now_ms: u64,
        broker: &mut impl BrokerPort,
        rng: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> TickOutcome {
        let interval = u64::from(self.policy.broker_attempt_interval_ms);
        match self.phase {
            Phase::Online => {
                if broker.is_connected() {
                    return TickOutcome::Online;
                }
                sink.emit(&AppEvent::SessionLost);
                self.begin_session_recovery(now_ms);
                TickOutcome::Recovering
            }
            Phase::SessionIdle { next_attempt_ms } if now_ms >= next_attempt_ms => {
                self.client_id = identity::session_client_id(&self.client_id_prefix, rng);
                self.state.session = LinkStatus::Connecting;
                sink.emit(&AppEvent::SessionConnecting {
                    client_id: self.client_id.clone(),
                    attempts_left: self.state.retry_budget,
                });
                match broker.connect(&self.client_id) {
                    Ok(()) if broker.is_connected() => self.on_session_up(broker, sink),
                    Ok(()) => {
                        self.phase = Phase::SessionPending {
                            deadline_ms: now_ms + interval,
                        };
                        TickOutcome::Recovering
                    }
                    Err(_) => self.on_attempt_failed(now_ms + interval, sink),
                }
            }
            Phase::SessionPending { deadline_ms } => {
                if broker.is_connected() {
                    self.on_session_up(broker, sink)
                } else if now_ms >= deadline_ms {
                    broker.disconnect();
                    self.on_attempt_failed(now_ms, sink)
                } else {
                    TickOutcome::Recovering
                }
            }
            _ => TickOutcome::Recovering,
        }
    }

    fn on_session_up(&mut self, broker: &mut impl BrokerPort, sink: &mut impl EventSink) -> TickOutcome {
        if let Err(e) = broker.subscribe(&self.inbound_topic) {
            sink.emit(&AppEvent::SubscribeFailed(e));
        }
        self.state.session = LinkStatus::Connected;
        self.state.retry_budget = self.policy.broker_attempt_count;
        self.phase = Phase::Online;
        sink.emit(&AppEvent::SessionUp {
            client_id: self.client_id.clone(),
        });
        TickOutcome::SessionEstablished
    }

    fn on_attempt_failed(&mut self, next_attempt_ms: u64, sink: &mut impl EventSink) -> TickOutcome {
        self.state.retry_budget = self.state.retry_budget.saturating_sub(1);
        self.state.session = LinkStatus::Disconnected;
        sink.emit(&AppEvent::SessionAttemptFailed {
            attempts_left: self.state.retry_budget,
        });
        if self.state.retry_budget == 0 {
            return self.request_restart(RestartReason::BrokerExhausted, sink);
        }
        self.phase = Phase::SessionIdle { next_attempt_ms };
        TickOutcome::Recovering
    }

    fn request_restart(&mut self, reason: RestartReason, sink: &mut impl EventSink) -> TickOutcome {
        self.phase = Phase::Halted;
        sink.emit(&AppEvent::Restarting(reason));
        TickOutcome::Restart(reason)
    }
}
