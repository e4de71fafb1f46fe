//! Connection orchestrator
//!
//! 连接编排器:把用户命令和异步结果转换为状态机事件,并执行状态机返回的动作。
//!
//! # Architecture / 架构
//!
//! ```text
//! connect() / disconnect() / shutdown()      network results, poller signals
//!              ↓ command channel                     ↓ event channel
//!              └──────────→ ConnectionDriver ←───────┘
//!                                 ↓
//!                    ConnectionStateMachine (pure)
//!                                 ↓
//!                 ConnectionActions (executed by the driver)
//!                                 ↓
//!        gateway calls · polling sessions · state watch · domain events
//! ```
//!
//! All orchestrator state lives in the single driver task, so no two
//! transitions ever run concurrently. Dropping every handle tears the
//! driver down the same way `shutdown()` does.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio::task::AbortHandle;
use tracing::{info_span, Instrument};

use wl_core::{
    ConnectionAction, ConnectionEvent, ConnectionState, ConnectionStateMachine,
    OrchestratorError,
};

use super::{
    ConnectionDomainEvent, ConnectionEventPort, ConnectionFacade, DisconnectInstance,
    InitializationResolver, QrProvisioner, RestartCoordinator, StatusPoller,
};
use crate::deps::ConnectionDeps;

const EVENT_BUFFER: usize = 100;

type EventSenders = Arc<Mutex<Vec<mpsc::Sender<ConnectionDomainEvent>>>>;

enum Command {
    Connect,
    Disconnect,
    Shutdown(oneshot::Sender<()>),
}

/// Handle to the connection driver. Cheap to clone.
#[derive(Clone)]
pub struct ConnectionOrchestrator {
    commands: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectionState>,
    event_senders: EventSenders,
}

impl ConnectionOrchestrator {
    /// Spawn the driver task on the current tokio runtime.
    pub fn spawn(deps: ConnectionDeps) -> Self {
        let ConnectionDeps { gateway, settings } = deps;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectionState::default());
        let event_senders: EventSenders = Arc::new(Mutex::new(Vec::new()));

        let provisioner = Arc::new(QrProvisioner::new(gateway.clone()));
        let driver = ConnectionDriver {
            machine: ConnectionStateMachine::new(),
            resolver: Arc::new(InitializationResolver::new(gateway.clone())),
            provisioner: provisioner.clone(),
            restarter: Arc::new(RestartCoordinator::new(
                gateway.clone(),
                provisioner,
                settings.restart_grace(),
            )),
            disconnector: Arc::new(DisconnectInstance::new(gateway.clone())),
            poller: StatusPoller::new(gateway, &settings),
            restart_task: None,
            event_tx,
            state_tx,
            event_senders: event_senders.clone(),
        };

        tokio::spawn(
            driver
                .run(command_rx, event_rx)
                .instrument(info_span!("connection.driver")),
        );

        Self {
            commands: command_tx,
            state_rx,
            event_senders,
        }
    }

    /// Begin a pairing attempt. Ignored unless currently disconnected.
    pub fn connect(&self) -> Result<(), OrchestratorError> {
        let _span = info_span!("connection.connect").entered();
        tracing::info!("Connect requested");
        self.send(Command::Connect)
    }

    /// Cancel everything and unlink the instance. Local state is reset even
    /// when the remote logout fails.
    pub fn disconnect(&self) -> Result<(), OrchestratorError> {
        let _span = info_span!("connection.disconnect").entered();
        tracing::info!("Disconnect requested");
        self.send(Command::Disconnect)
    }

    pub fn state(&self) -> ConnectionState {
        self.state_rx.borrow().clone()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Tear the driver down and wait until every timer is cancelled.
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown(ack_tx)).is_err() {
            return;
        }
        if ack_rx.await.is_err() {
            tracing::debug!("Connection driver exited before acknowledging shutdown");
        }
    }

    fn send(&self, command: Command) -> Result<(), OrchestratorError> {
        self.commands
            .send(command)
            .map_err(|_| OrchestratorError::Closed)
    }
}

impl ConnectionFacade for ConnectionOrchestrator {
    fn connect(&self) -> Result<(), OrchestratorError> {
        Self::connect(self)
    }

    fn disconnect(&self) -> Result<(), OrchestratorError> {
        Self::disconnect(self)
    }

    fn state(&self) -> ConnectionState {
        Self::state(self)
    }

    fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        Self::watch_state(self)
    }
}

#[async_trait::async_trait]
impl ConnectionEventPort for ConnectionOrchestrator {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<ConnectionDomainEvent>> {
        let (event_tx, event_rx) = mpsc::channel(EVENT_BUFFER);
        let mut senders = self.event_senders.lock().await;
        senders.push(event_tx);
        Ok(event_rx)
    }
}

/// Owner of all orchestrator state.
struct ConnectionDriver {
    machine: ConnectionStateMachine,
    resolver: Arc<InitializationResolver>,
    provisioner: Arc<QrProvisioner>,
    restarter: Arc<RestartCoordinator>,
    disconnector: Arc<DisconnectInstance>,
    poller: StatusPoller,
    /// Restart sequence in flight, including its grace timer
    restart_task: Option<AbortHandle>,
    event_tx: mpsc::UnboundedSender<ConnectionEvent>,
    state_tx: watch::Sender<ConnectionState>,
    event_senders: EventSenders,
}

impl ConnectionDriver {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut events: mpsc::UnboundedReceiver<ConnectionEvent>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Connect) => {
                        self.dispatch(ConnectionEvent::ConnectRequested).await;
                    }
                    Some(Command::Disconnect) => {
                        self.dispatch(ConnectionEvent::DisconnectRequested).await;
                    }
                    Some(Command::Shutdown(ack)) => {
                        self.dispatch(ConnectionEvent::Teardown).await;
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        tracing::debug!("All orchestrator handles dropped");
                        self.dispatch(ConnectionEvent::Teardown).await;
                        break;
                    }
                },
                Some(event) = events.recv() => {
                    self.dispatch(event).await;
                }
            }
        }
        tracing::info!("Connection driver stopped");
    }

    async fn dispatch(&mut self, event: ConnectionEvent) {
        let (_phase, actions) = self.machine.handle_event(event);
        for action in actions {
            self.execute(action).await;
        }
        self.publish_state();
    }

    async fn execute(&mut self, action: ConnectionAction) {
        match action {
            ConnectionAction::Initialize { attempt } => {
                let resolver = self.resolver.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(
                    async move {
                        let outcome = resolver.initialize().await;
                        let _ = event_tx.send(ConnectionEvent::InitResolved { attempt, outcome });
                    }
                    .instrument(info_span!("connection.attempt", attempt = attempt)),
                );
            }
            ConnectionAction::FetchQr {
                attempt,
                instance_id,
                method,
            } => {
                let provisioner = self.provisioner.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(
                    async move {
                        let result = provisioner.provision(&instance_id, method).await;
                        let _ = event_tx.send(ConnectionEvent::QrResolved { attempt, result });
                    }
                    .instrument(info_span!("connection.attempt", attempt = attempt)),
                );
            }
            ConnectionAction::StartPolling {
                instance_id,
                generation,
            } => {
                self.poller
                    .start(instance_id, generation, self.event_tx.clone());
            }
            ConnectionAction::StopPolling { generation } => {
                if !self.poller.stop_generation(generation) {
                    tracing::debug!(
                        generation = generation,
                        active = ?self.poller.active_generation(),
                        "No polling session to stop"
                    );
                }
            }
            ConnectionAction::Restart {
                attempt,
                instance_id,
                method,
            } => {
                self.cancel_restart();
                let restarter = self.restarter.clone();
                let event_tx = self.event_tx.clone();
                let handle = tokio::spawn(
                    async move {
                        let result = restarter.restart(&instance_id, method).await;
                        let _ = event_tx.send(ConnectionEvent::RestartResolved { attempt, result });
                    }
                    .instrument(info_span!("connection.attempt", attempt = attempt)),
                );
                self.restart_task = Some(handle.abort_handle());
            }
            ConnectionAction::CancelRestart => {
                self.cancel_restart();
            }
            ConnectionAction::Logout {
                attempt,
                instance_id,
            } => {
                let disconnector = self.disconnector.clone();
                let event_tx = self.event_tx.clone();
                tokio::spawn(
                    async move {
                        let result = disconnector.execute(&instance_id).await;
                        let _ = event_tx.send(ConnectionEvent::LogoutResolved { attempt, result });
                    }
                    .instrument(info_span!("connection.attempt", attempt = attempt)),
                );
            }
            ConnectionAction::Notify(notice) => {
                self.emit_event(ConnectionDomainEvent::from(notice)).await;
            }
            ConnectionAction::LogTransition {
                old_phase,
                event,
                new_phase,
            } => {
                if old_phase != new_phase {
                    tracing::info!(
                        old_phase = ?old_phase,
                        new_phase = ?new_phase,
                        event = %event,
                        "Connection phase changed"
                    );
                } else {
                    tracing::trace!(phase = ?old_phase, event = %event, "Connection event handled");
                }
            }
            ConnectionAction::Discard { event, reason } => {
                tracing::debug!(event = %event, reason = %reason, "Connection event discarded");
            }
        }
    }

    fn cancel_restart(&mut self) {
        if let Some(handle) = self.restart_task.take() {
            handle.abort();
            tracing::debug!("Restart task aborted");
        }
    }

    fn publish_state(&self) {
        let next = self.machine.snapshot();
        self.state_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    async fn emit_event(&self, event: ConnectionDomainEvent) {
        let mut senders = self.event_senders.lock().await;
        senders.retain(|sender| !sender.is_closed());
        for sender in senders.iter() {
            if let Err(err) = sender.try_send(event.clone()) {
                tracing::warn!(error = %err, "Connection event subscriber lagging, event dropped");
            }
        }
    }
}

impl Drop for ConnectionDriver {
    fn drop(&mut self) {
        self.cancel_restart();
        self.poller.stop();
    }
}
