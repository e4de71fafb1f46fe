//! Recurring status check for one pairing attempt.
//!
//! Each [`PollingSession`] owns two tasks: a ticker calling `get_status` every
//! `tick_interval`, and a watchdog sleeping until `started_at + timeout`. Both
//! report to the orchestrator's event queue. A per-session latch lets at most
//! one terminal signal (connected or timed out) through, and dropping the
//! session aborts both tasks.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info_span, Instrument};

use wl_core::ports::InstanceGatewayPort;
use wl_core::{ConnectionEvent, Generation, InstanceId, PairingSettings};

/// Generation value meaning "no active session".
const NO_SESSION: Generation = 0;

/// Live polling session. Dropping it cancels its timers.
pub struct PollingSession {
    instance_id: InstanceId,
    generation: Generation,
    started_at: Instant,
    timeout: Duration,
    ticker: AbortHandle,
    watchdog: AbortHandle,
}

impl PollingSession {
    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn deadline(&self) -> Instant {
        self.started_at + self.timeout
    }
}

impl Drop for PollingSession {
    fn drop(&mut self) {
        self.ticker.abort();
        self.watchdog.abort();
    }
}

/// State shared by a session's ticker and watchdog.
#[derive(Clone)]
struct SessionSignal {
    generation: Generation,
    active_generation: Arc<AtomicU64>,
    terminated: Arc<AtomicBool>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl SessionSignal {
    fn is_current(&self) -> bool {
        self.active_generation.load(Ordering::SeqCst) == self.generation
    }

    /// Deliver a terminal signal. Returns false if the session was superseded
    /// or already terminated.
    fn fire(&self, event: ConnectionEvent) -> bool {
        if !self.is_current() {
            return false;
        }
        if self.terminated.swap(true, Ordering::SeqCst) {
            return false;
        }
        if self.events.send(event).is_err() {
            tracing::debug!("Connection event queue closed");
            return false;
        }
        true
    }
}

pub struct StatusPoller {
    gateway: Arc<dyn InstanceGatewayPort>,
    tick_interval: Duration,
    timeout: Duration,
    active_generation: Arc<AtomicU64>,
    session: Option<PollingSession>,
}

impl StatusPoller {
    pub fn new(gateway: Arc<dyn InstanceGatewayPort>, settings: &PairingSettings) -> Self {
        Self {
            gateway,
            tick_interval: settings.tick_interval(),
            timeout: settings.timeout(),
            active_generation: Arc::new(AtomicU64::new(NO_SESSION)),
            session: None,
        }
    }

    /// Start a session for `instance_id`. Any previous session is stopped first.
    pub fn start(
        &mut self,
        instance_id: InstanceId,
        generation: Generation,
        events: mpsc::UnboundedSender<ConnectionEvent>,
    ) {
        self.stop();

        let started_at = Instant::now();
        let deadline = started_at + self.timeout;
        self.active_generation.store(generation, Ordering::SeqCst);

        let signal = SessionSignal {
            generation,
            active_generation: self.active_generation.clone(),
            terminated: Arc::new(AtomicBool::new(false)),
            events,
        };

        let span = info_span!(
            "connection.poll",
            instance_id = %instance_id,
            generation = generation
        );

        let ticker = tokio::spawn(
            run_ticks(
                self.gateway.clone(),
                instance_id.clone(),
                started_at,
                deadline,
                self.tick_interval,
                signal.clone(),
            )
            .instrument(span.clone()),
        )
        .abort_handle();

        let watchdog = tokio::spawn(
            async move {
                tokio::time::sleep_until(deadline).await;
                if signal.fire(ConnectionEvent::PollTimedOut { generation }) {
                    tracing::warn!("Pairing not completed before the deadline");
                }
            }
            .instrument(span),
        )
        .abort_handle();

        tracing::info!(
            instance_id = %instance_id,
            generation = generation,
            tick_ms = self.tick_interval.as_millis() as u64,
            timeout_ms = self.timeout.as_millis() as u64,
            "Polling session started"
        );

        self.session = Some(PollingSession {
            instance_id,
            generation,
            started_at,
            timeout: self.timeout,
            ticker,
            watchdog,
        });
    }

    /// Stop the active session. Returns its generation, or `None` if idle.
    pub fn stop(&mut self) -> Option<Generation> {
        let session = self.session.take()?;
        self.active_generation.store(NO_SESSION, Ordering::SeqCst);
        let generation = session.generation;
        drop(session);
        tracing::debug!(generation = generation, "Polling session stopped");
        Some(generation)
    }

    /// Stop the active session only if it carries `generation`.
    pub fn stop_generation(&mut self, generation: Generation) -> bool {
        if self.active_generation() != Some(generation) {
            return false;
        }
        self.stop().is_some()
    }

    pub fn active_generation(&self) -> Option<Generation> {
        self.session.as_ref().map(PollingSession::generation)
    }

    pub fn session(&self) -> Option<&PollingSession> {
        self.session.as_ref()
    }
}

async fn run_ticks(
    gateway: Arc<dyn InstanceGatewayPort>,
    instance_id: InstanceId,
    started_at: Instant,
    deadline: Instant,
    tick_interval: Duration,
    signal: SessionSignal,
) {
    let generation = signal.generation;
    let mut ticker = tokio::time::interval_at(started_at + tick_interval, tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !signal.is_current() {
            tracing::debug!("Polling session superseded, ticker exiting");
            return;
        }

        match gateway.get_status(&instance_id).await {
            Ok(response) if response.is_open() => {
                if signal.fire(ConnectionEvent::RemoteConnected { generation }) {
                    tracing::info!("Instance reported open connection");
                }
                return;
            }
            Ok(response) => {
                tracing::debug!(
                    success = response.success,
                    status = ?response.status,
                    error = ?response.error,
                    "Instance not connected yet"
                );
            }
            Err(err) if err.is_transient() => {
                tracing::warn!(error = %err, "Status check failed, retrying on next tick");
            }
            // non-transient failures still leave the session to the watchdog
            Err(err) => {
                tracing::error!(error = %err, "Status check rejected, retrying on next tick");
            }
        }

        // a slow status call must not push the deadline out
        if Instant::now() >= deadline {
            signal.fire(ConnectionEvent::PollTimedOut { generation });
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::connection::test_support::{status, MockGateway};
    use std::sync::atomic::AtomicUsize;
    use tokio::sync::mpsc::error::TryRecvError;
    use wl_core::GatewayError;

    fn poller(gateway: MockGateway) -> StatusPoller {
        StatusPoller::new(Arc::new(gateway), &PairingSettings::default())
    }

    /// Gateway answering "close" until call number `open_on` (1-based).
    fn counting_gateway(calls: Arc<AtomicUsize>, open_on: Option<usize>) -> MockGateway {
        let mut gateway = MockGateway::new();
        gateway.expect_get_status().returning(move |_| {
            let call = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if Some(call) == open_on {
                Ok(status("open"))
            } else {
                Ok(status("close"))
            }
        });
        gateway
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_status_signals_connected_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = poller(counting_gateway(calls.clone(), Some(4)));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();

        poller.start(InstanceId::from("inst-1"), 1, tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, ConnectionEvent::RemoteConnected { generation: 1 });
        assert_eq!(start.elapsed(), Duration::from_secs(16));
        assert_eq!(calls.load(Ordering::SeqCst), 4);

        // the watchdog still runs until stopped, but the latch keeps it quiet
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_exactly_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = poller(counting_gateway(calls.clone(), None));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let start = Instant::now();

        poller.start(InstanceId::from("inst-1"), 1, tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, ConnectionEvent::PollTimedOut { generation: 1 });
        assert_eq!(start.elapsed(), Duration::from_secs(30));
        // ticks at 4s, 8s, ... 28s
        assert_eq!(calls.load(Ordering::SeqCst), 7);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_ticks_and_watchdog() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = poller(counting_gateway(calls.clone(), None));
        let (tx, mut rx) = mpsc::unbounded_channel();

        poller.start(InstanceId::from("inst-1"), 1, tx);
        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        assert_eq!(poller.stop(), Some(1));
        assert_eq!(poller.stop(), None);
        assert!(poller.active_generation().is_none());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            rx.try_recv(),
            Err(TryRecvError::Empty | TryRecvError::Disconnected)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_supersedes_previous() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = poller(counting_gateway(calls.clone(), None));
        let (tx, mut rx) = mpsc::unbounded_channel();

        poller.start(InstanceId::from("inst-1"), 1, tx.clone());
        tokio::time::sleep(Duration::from_secs(20)).await;
        poller.start(InstanceId::from("inst-1"), 2, tx);
        assert_eq!(poller.active_generation(), Some(2));

        let event = rx.recv().await.unwrap();
        assert_eq!(event, ConnectionEvent::PollTimedOut { generation: 2 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_generation_ignores_other_sessions() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = poller(counting_gateway(calls, None));
        let (tx, _rx) = mpsc::unbounded_channel();

        poller.start(InstanceId::from("inst-1"), 3, tx);

        assert!(!poller.stop_generation(2));
        assert_eq!(poller.active_generation(), Some(3));
        assert!(poller.stop_generation(3));
        assert!(poller.session().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_errors_are_not_fatal() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gateway = MockGateway::new();
        let counter = calls.clone();
        gateway.expect_get_status().returning(move |_| {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            match call {
                1 | 2 => Err(GatewayError::Transport("connection reset".to_string())),
                _ => Ok(status("OPEN")),
            }
        });
        let mut poller = poller(gateway);
        let (tx, mut rx) = mpsc::unbounded_channel();

        poller.start(InstanceId::from("inst-1"), 1, tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, ConnectionEvent::RemoteConnected { generation: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_status_checks_run_until_timeout() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut gateway = MockGateway::new();
        let counter = calls.clone();
        gateway.expect_get_status().returning(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(GatewayError::Unauthorized("Invalid JWT".to_string()))
        });
        let mut poller = poller(gateway);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let started = Instant::now();

        poller.start(InstanceId::from("inst-1"), 1, tx);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, ConnectionEvent::PollTimedOut { generation: 1 });
        assert_eq!(started.elapsed(), Duration::from_secs(30));
        assert_eq!(calls.load(Ordering::SeqCst), 7);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_deadline_is_fixed_at_start() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut poller = poller(counting_gateway(calls, None));
        let (tx, _rx) = mpsc::unbounded_channel();

        poller.start(InstanceId::from("inst-1"), 1, tx);

        let session = poller.session().unwrap();
        assert_eq!(session.generation(), 1);
        assert_eq!(session.instance_id(), &InstanceId::from("inst-1"));
        assert_eq!(
            session.deadline() - session.started_at(),
            Duration::from_secs(30)
        );
    }
}
