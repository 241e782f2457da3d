//! Stub WebSocket servers for driving runs end to end

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
    routing::get,
};
use collab_bench::config::{BenchConfig, Scheme, ScriptConfig};
use collab_bench::{Event, EventKind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Everything one connection sent before it ended
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    pub events: Vec<Event>,
    pub close_code: Option<u16>,
}

impl Recorded {
    pub fn username(&self) -> Option<&str> {
        self.events.first().map(|e| e.username.as_str())
    }
}

#[derive(Clone, Default)]
struct StubState {
    connections: Arc<Mutex<Vec<Recorded>>>,
    /// Username whose connection is closed right after its login
    drop_after_login: Option<String>,
}

/// Accepts every frame, records it, never errors
pub struct StubServer {
    addr: SocketAddr,
    state: StubState,
}

impl StubServer {
    pub async fn start() -> Self {
        Self::start_with(StubState::default()).await
    }

    /// Like [`StubServer::start`], but closes the connection of `username`
    /// as soon as its login arrives
    pub async fn dropping_after_login(username: &str) -> Self {
        Self::start_with(StubState {
            drop_after_login: Some(username.to_string()),
            ..StubState::default()
        })
        .await
    }

    async fn start_with(state: StubState) -> Self {
        let app = Router::new()
            .route("/", get(ws_handler))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn addr(&self) -> String {
        self.addr.to_string()
    }

    /// Wait until `n` connections have ended and return their recordings
    pub async fn wait_for_connections(&self, n: usize) -> Vec<Recorded> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            {
                let connections = self.state.connections.lock().await;
                if connections.len() >= n || Instant::now() >= deadline {
                    return connections.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<StubState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: StubState) {
    let mut recorded = Recorded::default();

    while let Some(Ok(msg)) = socket.recv().await {
        match msg {
            Message::Text(text) => {
                let Ok(event) = serde_json::from_str::<Event>(&text) else {
                    continue;
                };
                let drop_now = event.event == EventKind::Login
                    && state.drop_after_login.as_deref() == Some(event.username.as_str());
                recorded.events.push(event);
                if drop_now {
                    let _ = socket.send(Message::Close(None)).await;
                    break;
                }
            }
            Message::Close(frame) => {
                recorded.close_code = frame.map(|f| f.code);
                break;
            }
            _ => {}
        }
    }

    state.connections.lock().await.push(recorded);
}

/// Address nothing listens on
pub async fn refused_addr() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

/// Script with the reference shape but millisecond timings
pub fn quick_script(messages: usize) -> ScriptConfig {
    ScriptConfig {
        messages,
        settle: Duration::from_millis(200),
        fast_interval: Duration::from_millis(2),
        pause: Duration::from_millis(10),
        slow_interval: Duration::from_millis(5),
        linger: Duration::from_millis(20),
    }
}

pub fn plain_config(addr: String, clients: usize, messages: usize) -> BenchConfig {
    BenchConfig {
        addr,
        scheme: Scheme::Ws,
        clients,
        script: quick_script(messages),
        ..BenchConfig::default()
    }
}

/// Log sink that keeps formatted output in memory
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// Install as the thread's default subscriber until the guard drops.
    ///
    /// Only sees events from tasks polled on this thread, so pair it with the
    /// current-thread runtime of `#[tokio::test]`.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter("collab_bench=info")
            .with_ansi(false)
            .with_writer(self.clone())
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Initialize test logging for detailed output
#[allow(dead_code)]
pub fn init_test_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collab_bench=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
