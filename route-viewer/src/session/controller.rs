//! Solve session controller.
//!
//! Owns at most one open solve stream. Starting a new solve cancels the
//! previous one and waits for its task to finish before the new request is
//! opened, so two streams to the solve endpoint never overlap.

use std::sync::Arc;

use futures::StreamExt;
use serde_json::Value;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::stream::{StreamError, StreamEvent, decode_stream};

use super::options::{OptionsError, SolveOptions};
use super::state::{FailureKind, LogEntry, SessionFailure, SessionState, SessionStatus};
use super::transport::SolveTransport;

/// (session id, status) as last published.
type StatusWatch = (u64, SessionStatus);

/// Caller's view of one started solve.
#[derive(Debug, Clone)]
pub struct SolveHandle {
    session_id: u64,
    status: watch::Receiver<StatusWatch>,
}

impl SolveHandle {
    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    /// Current status of this session.
    pub fn status(&self) -> SessionStatus {
        let (id, status) = *self.status.borrow();
        if id == self.session_id {
            status
        } else {
            SessionStatus::Cancelled
        }
    }

    /// Wait until the session reaches a terminal status.
    ///
    /// A session superseded by a newer solve reports `Cancelled`.
    pub async fn finished(&mut self) -> SessionStatus {
        loop {
            let (id, status) = *self.status.borrow_and_update();
            if id != self.session_id {
                return SessionStatus::Cancelled;
            }
            if status.is_terminal() {
                return status;
            }
            if self.status.changed().await.is_err() {
                return status;
            }
        }
    }
}

/// Drives solve streams and holds their log/result/error state.
pub struct SolveSession<T> {
    transport: Arc<T>,
    state: Arc<RwLock<SessionState>>,
    status: Arc<watch::Sender<StatusWatch>>,
    active: Option<JoinHandle<()>>,
    next_id: u64,
}

impl<T: SolveTransport> SolveSession<T> {
    pub fn new(transport: T) -> Self {
        let (status, _) = watch::channel((0, SessionStatus::Idle));
        Self {
            transport: Arc::new(transport),
            state: Arc::new(RwLock::new(SessionState::default())),
            status: Arc::new(status),
            active: None,
            next_id: 0,
        }
    }

    /// Start a solve, replacing any session in progress.
    ///
    /// Logs, solution and error are cleared before the new stream opens.
    pub async fn start(
        &mut self,
        problem: Value,
        options: SolveOptions,
    ) -> Result<SolveHandle, OptionsError> {
        options.validate()?;
        self.cancel().await;

        self.next_id += 1;
        let session_id = self.next_id;

        {
            let mut state = self.state.write().await;
            *state = SessionState::running(session_id);
            self.status.send_replace((session_id, SessionStatus::Running));
        }

        info!(
            session_id,
            solver = options.solver.as_str(),
            time_limit_secs = options.time_limit_secs,
            "starting solve session"
        );

        let writer = SessionWriter {
            session_id,
            state: Arc::clone(&self.state),
            status: Arc::clone(&self.status),
        };
        let transport = Arc::clone(&self.transport);
        self.active = Some(tokio::spawn(run_session(
            transport, problem, options, writer,
        )));

        Ok(SolveHandle {
            session_id,
            status: self.status.subscribe(),
        })
    }

    /// Cancel the running session, if any.
    ///
    /// Aborting the task drops the response body, which aborts the HTTP
    /// request. Whatever state was applied before cancellation stays.
    /// Returns whether a running session was cancelled.
    pub async fn cancel(&mut self) -> bool {
        let Some(task) = self.active.take() else {
            return false;
        };
        task.abort();
        // The stream is closed once the task has stopped.
        if let Err(e) = task.await
            && e.is_panic()
        {
            warn!(error = %e, "solve session task panicked");
        }

        let mut state = self.state.write().await;
        if state.status.is_terminal() {
            return false;
        }
        state.status = SessionStatus::Cancelled;
        self.status
            .send_replace((state.session_id, SessionStatus::Cancelled));
        info!(session_id = state.session_id, "solve session cancelled");
        true
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Subscribe to status changes of whichever session is current.
    pub fn watch_status(&self) -> watch::Receiver<(u64, SessionStatus)> {
        self.status.subscribe()
    }
}

impl<T> Drop for SolveSession<T> {
    fn drop(&mut self) {
        if let Some(task) = self.active.take() {
            task.abort();
        }
    }
}

/// Applies state changes on behalf of one session.
///
/// Writes are dropped once the state belongs to a newer session or this
/// session has reached a terminal status.
struct SessionWriter {
    session_id: u64,
    state: Arc<RwLock<SessionState>>,
    status: Arc<watch::Sender<StatusWatch>>,
}

impl SessionWriter {
    async fn apply<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> Option<R> {
        let mut state = self.state.write().await;
        if state.session_id != self.session_id || state.status.is_terminal() {
            return None;
        }
        let result = f(&mut state);
        self.status.send_replace((self.session_id, state.status));
        Some(result)
    }

    async fn fail(&self, kind: FailureKind, message: String) {
        warn!(session_id = self.session_id, ?kind, %message, "solve session failed");
        self.apply(|state| {
            state.status = SessionStatus::Failed;
            state.error = Some(SessionFailure::new(kind, message));
        })
        .await;
    }
}

async fn run_session<T: SolveTransport>(
    transport: Arc<T>,
    problem: Value,
    options: SolveOptions,
    writer: SessionWriter,
) {
    let body = match transport.open(&problem, &options).await {
        Ok(body) => body,
        Err(e) => {
            writer.fail(FailureKind::Transport, e.to_string()).await;
            return;
        }
    };

    let mut events = std::pin::pin!(decode_stream(body));

    while let Some(item) = events.next().await {
        let event = match item {
            Ok(event) => event,
            Err(StreamError::Frame(e)) => {
                writer.fail(FailureKind::Protocol, e.to_string()).await;
                return;
            }
            Err(StreamError::Transport(e)) => {
                writer.fail(FailureKind::Transport, e.to_string()).await;
                return;
            }
        };

        debug!(session_id = writer.session_id, kind = event.kind(), "stream event");

        let applied = match event {
            StreamEvent::Log { message } => {
                writer
                    .apply(|state| state.logs.push(LogEntry::now(message)))
                    .await
            }
            StreamEvent::Result { data } => {
                let routes = data.routes.len();
                let first = writer
                    .apply(|state| {
                        if state.solution.is_some() {
                            return false;
                        }
                        state.solution = Some(Arc::from(data));
                        true
                    })
                    .await;
                match first {
                    Some(true) => info!(session_id = writer.session_id, routes, "solution received"),
                    Some(false) => warn!(
                        session_id = writer.session_id,
                        "ignoring additional result event"
                    ),
                    None => {}
                }
                first.map(|_| ())
            }
            StreamEvent::Error { message } => {
                writer.fail(FailureKind::Solver, message).await;
                return;
            }
            StreamEvent::Unknown => Some(()),
        };

        if applied.is_none() {
            debug!(session_id = writer.session_id, "session superseded, stopping");
            return;
        }
    }

    writer
        .apply(|state| state.status = SessionStatus::Completed)
        .await;
    info!(session_id = writer.session_id, "solve stream closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ServiceTimeModel;
    use crate::session::transport::ByteStream;
    use crate::stream::TransportError;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Tracks how many streams are open at once.
    #[derive(Default)]
    struct Connections {
        open: AtomicUsize,
        max_open: AtomicUsize,
        opened: AtomicUsize,
    }

    struct ConnectionGuard(Arc<Connections>);

    impl Drop for ConnectionGuard {
        fn drop(&mut self) {
            self.0.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// What the mock returns for each successive `open` call.
    enum Script {
        /// These chunks, then close.
        Chunks(Vec<&'static str>),
        /// These chunks, then never close.
        Hang(Vec<&'static str>),
        /// Fail to connect.
        Refuse,
        /// Panic inside `open`.
        Panic,
    }

    struct MockTransport {
        scripts: Mutex<Vec<Script>>,
        connections: Arc<Connections>,
    }

    impl MockTransport {
        fn new(scripts: Vec<Script>) -> (Self, Arc<Connections>) {
            let connections = Arc::new(Connections::default());
            let transport = Self {
                scripts: Mutex::new(scripts.into_iter().rev().collect()),
                connections: Arc::clone(&connections),
            };
            (transport, connections)
        }
    }

    impl SolveTransport for MockTransport {
        async fn open(
            &self,
            _problem: &Value,
            _options: &SolveOptions,
        ) -> Result<ByteStream, TransportError> {
            let script = self.scripts.lock().unwrap().pop().expect("unexpected open");

            let (chunks, hang) = match script {
                Script::Chunks(chunks) => (chunks, false),
                Script::Hang(chunks) => (chunks, true),
                Script::Refuse => return Err(TransportError::Other("connection refused".into())),
                Script::Panic => panic!("transport bug"),
            };

            let c = &self.connections;
            c.opened.fetch_add(1, Ordering::SeqCst);
            let now_open = c.open.fetch_add(1, Ordering::SeqCst) + 1;
            c.max_open.fetch_max(now_open, Ordering::SeqCst);
            let guard = ConnectionGuard(Arc::clone(c));

            let items: Vec<Result<Vec<u8>, TransportError>> =
                chunks.into_iter().map(|chunk| Ok(chunk.as_bytes().to_vec())).collect();
            let body = futures::stream::iter(items);
            let body: ByteStream = if hang {
                Box::pin(body.chain(futures::stream::pending()).map(move |chunk| {
                    let _keep = &guard;
                    chunk
                }))
            } else {
                Box::pin(body.map(move |chunk| {
                    let _keep = &guard;
                    chunk
                }))
            };
            Ok(body)
        }
    }

    async fn wait_until<T: SolveTransport>(
        session: &SolveSession<T>,
        check: impl Fn(&SessionState) -> bool,
    ) -> SessionState {
        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let state = session.snapshot().await;
                if check(&state) {
                    return state;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached")
    }

    fn problem() -> Value {
        serde_json::json!({"customers": [], "vehicles": []})
    }

    const LOG_STARTING: &str = "data: {\"type\":\"log\",\"message\":\"starting\"}\n";
    const RESULT_ONE_ROUTE: &str = concat!(
        "data: {\"type\":\"result\",\"data\":{\"routes\":[{\"vehicle_id\":0,\"route\":[",
        "{\"location_info\":{\"type\":\"depot\"},\"time\":0},",
        "{\"location_info\":{\"type\":\"customer\"},\"time\":45,\"demand\":3}]}]}}\n"
    );

    #[tokio::test]
    async fn log_then_result_end_to_end() {
        let (transport, _) = MockTransport::new(vec![Script::Chunks(vec![
            LOG_STARTING,
            RESULT_ONE_ROUTE,
        ])]);
        let mut session = SolveSession::new(transport);

        let mut handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        assert_eq!(handle.finished().await, SessionStatus::Completed);

        let state = session.snapshot().await;
        assert_eq!(state.log_messages(), ["starting"]);
        assert!(state.error.is_none());

        let solution = state.solution.expect("solution applied");
        assert_eq!(solution.routes.len(), 1);

        let stops = ServiceTimeModel::default().normalize_route(&solution.routes[0].stops);
        let customer = &stops[1];
        assert_eq!(customer.arrival_minute, 45.0);
        assert_eq!(customer.service_minutes, 16.0);
        assert_eq!(customer.departure_minute, 61.0);
    }

    #[tokio::test]
    async fn chunk_boundaries_inside_frames() {
        let (transport, _) = MockTransport::new(vec![Script::Chunks(vec![
            "data: {\"type\":\"log\",\"mess",
            "age\":\"one\"}\ndata: {\"type\":\"log\",",
            "\"message\":\"two\"}\n",
        ])]);
        let mut session = SolveSession::new(transport);

        let mut handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        handle.finished().await;

        assert_eq!(session.snapshot().await.log_messages(), ["one", "two"]);
    }

    #[tokio::test]
    async fn solver_error_halts_further_mutation() {
        let (transport, _) = MockTransport::new(vec![Script::Chunks(vec![
            LOG_STARTING,
            "data: {\"type\":\"error\",\"message\":\"infeasible: capacity exceeded\"}\n",
            "data: {\"type\":\"log\",\"message\":\"late\"}\n",
            RESULT_ONE_ROUTE,
        ])]);
        let mut session = SolveSession::new(transport);

        let mut handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        assert_eq!(handle.finished().await, SessionStatus::Failed);

        let state = session.snapshot().await;
        assert_eq!(state.log_messages(), ["starting"]);
        assert!(state.solution.is_none());
        assert_eq!(
            state.error,
            Some(SessionFailure::new(
                FailureKind::Solver,
                "infeasible: capacity exceeded"
            ))
        );
    }

    #[tokio::test]
    async fn malformed_frame_is_a_protocol_failure() {
        let (transport, _) = MockTransport::new(vec![Script::Chunks(vec![
            LOG_STARTING,
            "data: {\"type\":\"log\",\"message\":\n",
            RESULT_ONE_ROUTE,
        ])]);
        let mut session = SolveSession::new(transport);

        let mut handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        assert_eq!(handle.finished().await, SessionStatus::Failed);

        let state = session.snapshot().await;
        let error = state.error.clone().unwrap();
        assert_eq!(error.kind, FailureKind::Protocol);
        assert!(error.message.contains("malformed stream frame"));
        assert!(state.solution.is_none());
        assert_eq!(state.log_messages(), ["starting"]);
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_failure() {
        let (transport, _) = MockTransport::new(vec![Script::Refuse]);
        let mut session = SolveSession::new(transport);

        let mut handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        assert_eq!(handle.finished().await, SessionStatus::Failed);

        let error = session.snapshot().await.error.unwrap();
        assert_eq!(error.kind, FailureKind::Transport);
        assert!(error.message.contains("connection refused"));
    }

    #[tokio::test]
    async fn only_first_result_is_applied() {
        let (transport, _) = MockTransport::new(vec![Script::Chunks(vec![
            RESULT_ONE_ROUTE,
            "data: {\"type\":\"result\",\"data\":{\"routes\":[]}}\n",
        ])]);
        let mut session = SolveSession::new(transport);

        let mut handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        handle.finished().await;

        let solution = session.snapshot().await.solution.unwrap();
        assert_eq!(solution.routes.len(), 1);
    }

    #[tokio::test]
    async fn unknown_events_are_ignored() {
        let (transport, _) = MockTransport::new(vec![Script::Chunks(vec![
            "data: {\"type\":\"progress\",\"pct\":10}\n",
            LOG_STARTING,
        ])]);
        let mut session = SolveSession::new(transport);

        let mut handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        assert_eq!(handle.finished().await, SessionStatus::Completed);
        assert_eq!(session.snapshot().await.log_messages(), ["starting"]);
    }

    #[tokio::test]
    async fn cancel_keeps_applied_state_and_closes_stream() {
        let (transport, connections) = MockTransport::new(vec![Script::Hang(vec![LOG_STARTING])]);
        let mut session = SolveSession::new(transport);

        let mut handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        wait_until(&session, |s| s.logs.len() == 1).await;

        assert!(session.cancel().await);
        assert_eq!(handle.finished().await, SessionStatus::Cancelled);
        assert_eq!(connections.open.load(Ordering::SeqCst), 0);

        let state = session.snapshot().await;
        assert_eq!(state.status, SessionStatus::Cancelled);
        assert_eq!(state.log_messages(), ["starting"]);
        assert!(state.solution.is_none());
        assert!(state.error.is_none());

        assert!(!session.cancel().await);
    }

    #[tokio::test]
    async fn new_solve_releases_previous_stream_first() {
        let (transport, connections) = MockTransport::new(vec![
            Script::Hang(vec![LOG_STARTING]),
            Script::Chunks(vec![RESULT_ONE_ROUTE]),
        ]);
        let mut session = SolveSession::new(transport);

        let mut first = session.start(problem(), SolveOptions::default()).await.unwrap();
        wait_until(&session, |s| s.logs.len() == 1).await;

        let mut second = session.start(problem(), SolveOptions::default()).await.unwrap();
        assert_eq!(first.finished().await, SessionStatus::Cancelled);
        assert_eq!(second.finished().await, SessionStatus::Completed);

        assert_eq!(connections.opened.load(Ordering::SeqCst), 2);
        assert_eq!(connections.max_open.load(Ordering::SeqCst), 1);

        let state = session.snapshot().await;
        assert_eq!(state.session_id, second.session_id());
        assert!(state.logs.is_empty());
        assert!(state.solution.is_some());
    }

    #[tokio::test]
    async fn invalid_options_do_not_touch_running_session() {
        let (transport, connections) = MockTransport::new(vec![Script::Hang(vec![LOG_STARTING])]);
        let mut session = SolveSession::new(transport);

        let handle = session.start(problem(), SolveOptions::default()).await.unwrap();
        wait_until(&session, |s| s.logs.len() == 1).await;

        let result = session
            .start(problem(), SolveOptions::default().with_time_limit(0))
            .await;
        assert!(matches!(result, Err(OptionsError::TimeLimit(0))));
        assert_eq!(handle.status(), SessionStatus::Running);
        assert_eq!(connections.open.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_after_task_panicked() {
        let (transport, _) = MockTransport::new(vec![Script::Panic]);
        let mut session = SolveSession::new(transport);

        session.start(problem(), SolveOptions::default()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert!(session.cancel().await);
        assert_eq!(session.snapshot().await.status, SessionStatus::Cancelled);
        assert!(!session.cancel().await);
    }
}
