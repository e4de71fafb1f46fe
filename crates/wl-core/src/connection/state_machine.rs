//! Connection state machine
//!
//! 连接编排的显式状态机:纯函数式转换 `(phase, event) -> (new_phase, actions[])`,
//! 所有副作用(网络调用、定时器、通知)由 orchestrator 执行。
//!
//! # Architecture / 架构
//!
//! ```text
//! ConnectionStateMachine (wl-core)
//!   ├── Phase: 当前配对阶段
//!   ├── Event: 用户命令、网络结果、轮询信号
//!   └── Action: 需要 orchestrator 执行的副作用
//!
//! ConnectionOrchestrator (wl-app)
//!   ├── 接收命令和异步结果
//!   ├── 调用状态机获取 actions
//!   └── 执行 actions (网络请求/轮询会话/事件广播)
//! ```
//!
//! Network results are tagged with the `attempt` that issued them and poller
//! signals with the session `generation`. Anything carrying an outdated tag is
//! answered with [`ConnectionAction::Discard`] and leaves the machine untouched.

use serde::{Deserialize, Serialize};

use super::error::{DisconnectError, InitError, QrError, RestartError};
use super::outcome::{InitOutcome, PairingMethod, Provisioned, QrPayload};
use super::state::{ConnectionState, ConnectionStatus};
use crate::ids::InstanceId;

/// Polling session generation. The first session is generation 1.
pub type Generation = u64;

/// Network call attempt. Bumped on every connect and disconnect.
pub type Attempt = u64;

const PHONE_NUMBER_REQUIRED: &str = "a phone number is required before connecting WhatsApp";

/// Internal phase of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ConnectionPhase {
    /// 未连接
    #[default]
    Disconnected,

    /// 初始化请求进行中
    Initializing,

    /// 二维码请求进行中
    AwaitingScan,

    /// 轮询会话运行中
    Polling,

    /// 已连接 (终态,直到 disconnect)
    Connected,

    /// 实例重启中 (含宽限期与二维码重新获取)
    Restarting,
}

impl ConnectionPhase {
    /// A network call is in flight in this phase.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            ConnectionPhase::Initializing
                | ConnectionPhase::AwaitingScan
                | ConnectionPhase::Restarting
        )
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// User asked to connect
    ConnectRequested,

    /// User asked to disconnect
    DisconnectRequested,

    /// Orchestrator is shutting down
    Teardown,

    InitResolved {
        attempt: Attempt,
        outcome: Result<InitOutcome, InitError>,
    },

    QrResolved {
        attempt: Attempt,
        result: Result<Provisioned, QrError>,
    },

    /// Poller observed an open connection
    RemoteConnected { generation: Generation },

    /// Poller watchdog expired
    PollTimedOut { generation: Generation },

    RestartResolved {
        attempt: Attempt,
        result: Result<Provisioned, RestartError>,
    },

    LogoutResolved {
        attempt: Attempt,
        result: Result<(), DisconnectError>,
    },
}

/// User-visible notices produced by transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionNotice {
    QrCodeReady {
        instance_id: InstanceId,
        payload: QrPayload,
    },
    Connected {
        instance_id: Option<InstanceId>,
    },
    /// Pairing timed out; the instance is being restarted for a fresh QR code
    RestartingInstance {
        instance_id: InstanceId,
        generation: Generation,
    },
    Disconnected,
    Failed {
        message: String,
    },
    LogoutFailed {
        message: String,
    },
}

/// Side effects requested by the state machine
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionAction {
    /// Run the initialization resolver
    Initialize { attempt: Attempt },

    /// Fetch a pairing payload for the instance
    FetchQr {
        attempt: Attempt,
        instance_id: InstanceId,
        method: PairingMethod,
    },

    /// Start a polling session, replacing any active one
    StartPolling {
        instance_id: InstanceId,
        generation: Generation,
    },

    /// Stop the polling session with this generation
    StopPolling { generation: Generation },

    /// Restart the instance, wait the grace period, fetch a new payload
    Restart {
        attempt: Attempt,
        instance_id: InstanceId,
        method: PairingMethod,
    },

    /// Abort an in-flight restart (including its grace timer)
    CancelRestart,

    /// Unlink the device from the instance
    Logout {
        attempt: Attempt,
        instance_id: InstanceId,
    },

    Notify(ConnectionNotice),

    /// 记录状态转换日志
    LogTransition {
        old_phase: ConnectionPhase,
        event: String,
        new_phase: ConnectionPhase,
    },

    /// Event ignored because it is stale or not valid in the current phase
    Discard { event: String, reason: String },
}

/// Connection state machine
///
/// # Example / 示例
///
/// ```ignore
/// let mut sm = ConnectionStateMachine::new();
/// let (phase, actions) = sm.handle_event(ConnectionEvent::ConnectRequested);
/// assert_eq!(phase, ConnectionPhase::Initializing);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConnectionStateMachine {
    phase: ConnectionPhase,
    instance_id: Option<InstanceId>,
    qr: Option<QrPayload>,
    /// Payload kind of the current attempt, reused when restarting
    method: PairingMethod,
    /// Current attempt; results tagged with anything else are stale
    attempt: Attempt,
    /// Last generation handed out
    generation: Generation,
    active_generation: Option<Generation>,
    last_error: Option<String>,
}

impl ConnectionStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }

    pub fn active_generation(&self) -> Option<Generation> {
        self.active_generation
    }

    pub fn instance_id(&self) -> Option<&InstanceId> {
        self.instance_id.as_ref()
    }

    pub fn pairing_method(&self) -> PairingMethod {
        self.method
    }

    /// Project the internal state onto the public [`ConnectionState`].
    pub fn snapshot(&self) -> ConnectionState {
        let status = match self.phase {
            ConnectionPhase::Disconnected => ConnectionStatus::Disconnected,
            ConnectionPhase::Initializing
            | ConnectionPhase::AwaitingScan
            | ConnectionPhase::Restarting => ConnectionStatus::Connecting,
            ConnectionPhase::Polling if self.qr.is_some() => ConnectionStatus::AwaitingScan,
            ConnectionPhase::Polling => ConnectionStatus::Connecting,
            ConnectionPhase::Connected => ConnectionStatus::Connected,
        };

        ConnectionState::project(
            status,
            self.qr.clone(),
            self.phase.is_busy(),
            self.active_generation.is_some(),
            self.instance_id.clone(),
            self.active_generation,
            self.last_error.clone(),
        )
    }

    /// 处理事件并返回新阶段和动作列表
    ///
    /// The first action is always a `LogTransition`.
    pub fn handle_event(
        &mut self,
        event: ConnectionEvent,
    ) -> (ConnectionPhase, Vec<ConnectionAction>) {
        let old_phase = self.phase;
        let event_debug = format!("{:?}", event);

        let actions = self.transition(event, &event_debug);

        let mut all_actions = vec![ConnectionAction::LogTransition {
            old_phase,
            event: event_debug,
            new_phase: self.phase,
        }];
        all_actions.extend(actions);

        (self.phase, all_actions)
    }

    fn transition(&mut self, event: ConnectionEvent, event_debug: &str) -> Vec<ConnectionAction> {
        match event {
            ConnectionEvent::ConnectRequested => self.on_connect(event_debug),
            ConnectionEvent::DisconnectRequested => self.on_disconnect(true),
            ConnectionEvent::Teardown => self.on_disconnect(false),
            ConnectionEvent::InitResolved { attempt, outcome } => {
                if let Some(discard) =
                    self.check_current(attempt, ConnectionPhase::Initializing, event_debug)
                {
                    return discard;
                }
                self.on_init_resolved(outcome)
            }
            ConnectionEvent::QrResolved { attempt, result } => {
                if let Some(discard) =
                    self.check_current(attempt, ConnectionPhase::AwaitingScan, event_debug)
                {
                    return discard;
                }
                match result {
                    Ok(provisioned) => self.on_provisioned(provisioned),
                    Err(err) => self.fail(err.to_string()),
                }
            }
            ConnectionEvent::RemoteConnected { generation } => {
                if let Some(discard) = self.check_session(generation, event_debug) {
                    return discard;
                }
                let mut actions = self.stop_polling();
                self.qr = None;
                self.phase = ConnectionPhase::Connected;
                actions.push(ConnectionAction::Notify(ConnectionNotice::Connected {
                    instance_id: self.instance_id.clone(),
                }));
                actions
            }
            ConnectionEvent::PollTimedOut { generation } => {
                if let Some(discard) = self.check_session(generation, event_debug) {
                    return discard;
                }
                self.on_poll_timeout(generation)
            }
            ConnectionEvent::RestartResolved { attempt, result } => {
                if let Some(discard) =
                    self.check_current(attempt, ConnectionPhase::Restarting, event_debug)
                {
                    return discard;
                }
                match result {
                    Ok(provisioned) => self.on_provisioned(provisioned),
                    Err(err) => self.fail(err.to_string()),
                }
            }
            ConnectionEvent::LogoutResolved { attempt, result } => {
                if attempt != self.attempt {
                    return vec![discard(event_debug, "logout result from a superseded attempt")];
                }
                match result {
                    Ok(()) => Vec::new(),
                    Err(err) => {
                        let message = err.to_string();
                        self.last_error = Some(message.clone());
                        vec![ConnectionAction::Notify(ConnectionNotice::LogoutFailed {
                            message,
                        })]
                    }
                }
            }
        }
    }

    fn on_connect(&mut self, event_debug: &str) -> Vec<ConnectionAction> {
        if self.phase != ConnectionPhase::Disconnected {
            return vec![discard(
                event_debug,
                &format!("connect ignored while {:?}", self.phase),
            )];
        }

        self.attempt += 1;
        self.last_error = None;
        self.qr = None;
        self.method = PairingMethod::default();
        self.phase = ConnectionPhase::Initializing;
        vec![ConnectionAction::Initialize {
            attempt: self.attempt,
        }]
    }

    /// Shared by disconnect and teardown. Only a user disconnect logs out.
    fn on_disconnect(&mut self, logout: bool) -> Vec<ConnectionAction> {
        let previous = self.phase;
        let instance_id = self.instance_id.take();
        self.qr = None;

        if previous == ConnectionPhase::Disconnected {
            return Vec::new();
        }

        self.attempt += 1;
        let mut actions = self.stop_polling();
        if previous == ConnectionPhase::Restarting {
            actions.push(ConnectionAction::CancelRestart);
        }
        if logout {
            if let Some(instance_id) = instance_id {
                actions.push(ConnectionAction::Logout {
                    attempt: self.attempt,
                    instance_id,
                });
            }
        }
        self.phase = ConnectionPhase::Disconnected;
        actions.push(ConnectionAction::Notify(ConnectionNotice::Disconnected));
        actions
    }

    fn on_init_resolved(
        &mut self,
        outcome: Result<InitOutcome, InitError>,
    ) -> Vec<ConnectionAction> {
        match outcome {
            Ok(InitOutcome::NeedsPhoneNumber) => self.fail(PHONE_NUMBER_REQUIRED.to_string()),
            Ok(InitOutcome::AlreadyConnected(instance_id)) => {
                self.instance_id = instance_id;
                self.phase = ConnectionPhase::Connected;
                vec![ConnectionAction::Notify(ConnectionNotice::Connected {
                    instance_id: self.instance_id.clone(),
                })]
            }
            Ok(InitOutcome::NeedsQrCode(instance_id)) => {
                self.request_payload(instance_id, PairingMethod::QrCode)
            }
            Ok(InitOutcome::NeedsPairingCode(instance_id)) => {
                self.request_payload(instance_id, PairingMethod::PairingCode)
            }
            Ok(InitOutcome::PayloadReady {
                instance_id,
                method,
                payload,
            }) => {
                self.instance_id = Some(instance_id);
                self.method = method;
                self.on_provisioned(Provisioned::Qr(payload))
            }
            Ok(InitOutcome::IsConnecting(instance_id)) => {
                self.instance_id = Some(instance_id.clone());
                self.start_polling(instance_id)
            }
            Ok(InitOutcome::Error(message)) => self.fail(message),
            Err(err) => self.fail(err.to_string()),
        }
    }

    fn request_payload(
        &mut self,
        instance_id: InstanceId,
        method: PairingMethod,
    ) -> Vec<ConnectionAction> {
        self.instance_id = Some(instance_id.clone());
        self.method = method;
        self.phase = ConnectionPhase::AwaitingScan;
        vec![ConnectionAction::FetchQr {
            attempt: self.attempt,
            instance_id,
            method,
        }]
    }

    fn on_provisioned(&mut self, provisioned: Provisioned) -> Vec<ConnectionAction> {
        match provisioned {
            Provisioned::AlreadyConnected => {
                self.qr = None;
                self.phase = ConnectionPhase::Connected;
                vec![ConnectionAction::Notify(ConnectionNotice::Connected {
                    instance_id: self.instance_id.clone(),
                })]
            }
            Provisioned::Qr(payload) => {
                let Some(instance_id) = self.instance_id.clone() else {
                    return self.fail("qr code received without a known instance".to_string());
                };
                self.qr = Some(payload.clone());
                let mut actions = self.start_polling(instance_id.clone());
                actions.push(ConnectionAction::Notify(ConnectionNotice::QrCodeReady {
                    instance_id,
                    payload,
                }));
                actions
            }
        }
    }

    fn on_poll_timeout(&mut self, generation: Generation) -> Vec<ConnectionAction> {
        let mut actions = self.stop_polling();
        self.qr = None;

        let Some(instance_id) = self.instance_id.clone() else {
            actions.extend(self.fail("polling timed out without a known instance".to_string()));
            return actions;
        };

        self.phase = ConnectionPhase::Restarting;
        actions.push(ConnectionAction::Restart {
            attempt: self.attempt,
            instance_id: instance_id.clone(),
            method: self.method,
        });
        actions.push(ConnectionAction::Notify(
            ConnectionNotice::RestartingInstance {
                instance_id,
                generation,
            },
        ));
        actions
    }

    /// Issue a new generation. Any active session is stopped first.
    fn start_polling(&mut self, instance_id: InstanceId) -> Vec<ConnectionAction> {
        let mut actions = self.stop_polling();
        self.generation += 1;
        self.active_generation = Some(self.generation);
        self.phase = ConnectionPhase::Polling;
        actions.push(ConnectionAction::StartPolling {
            instance_id,
            generation: self.generation,
        });
        actions
    }

    fn stop_polling(&mut self) -> Vec<ConnectionAction> {
        match self.active_generation.take() {
            Some(generation) => vec![ConnectionAction::StopPolling { generation }],
            None => Vec::new(),
        }
    }

    fn fail(&mut self, message: String) -> Vec<ConnectionAction> {
        let mut actions = self.stop_polling();
        self.qr = None;
        self.phase = ConnectionPhase::Disconnected;
        self.last_error = Some(message.clone());
        actions.push(ConnectionAction::Notify(ConnectionNotice::Failed { message }));
        actions
    }

    fn check_current(
        &self,
        attempt: Attempt,
        expected: ConnectionPhase,
        event_debug: &str,
    ) -> Option<Vec<ConnectionAction>> {
        if attempt != self.attempt {
            return Some(vec![discard(event_debug, "result from a superseded attempt")]);
        }
        if self.phase != expected {
            return Some(vec![discard(
                event_debug,
                &format!("expected {:?}, machine is {:?}", expected, self.phase),
            )]);
        }
        None
    }

    fn check_session(
        &self,
        generation: Generation,
        event_debug: &str,
    ) -> Option<Vec<ConnectionAction>> {
        if self.phase != ConnectionPhase::Polling || self.active_generation != Some(generation) {
            return Some(vec![discard(
                event_debug,
                &format!(
                    "signal from generation {} while active generation is {:?}",
                    generation, self.active_generation
                ),
            )]);
        }
        None
    }
}

fn discard(event_debug: &str, reason: &str) -> ConnectionAction {
    ConnectionAction::Discard {
        event: event_debug.to_string(),
        reason: reason.to_string(),
    }
}
