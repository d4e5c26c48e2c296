use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use cavity_orchestrator::api::{AppState, create_router};
use cavity_orchestrator::dispatcher::Dispatcher;
use cavity_orchestrator::lifecycle::{ArtifactLayout, LifecycleController};
use cavity_orchestrator::repository::{InMemorySimulationStore, SimulationStore};
use cavity_orchestrator::supervisor::{ProcessSupervisor, SolverCommand};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// Stand-in solver. Arguments arrive as `--nx N ... --output PATH`.
/// Fails with exit code 3 when nx > 100, otherwise writes the result file.
pub const FAKE_SOLVER: &str = r#"
echo "Grid $2x$4, Re=$6"
if [ "$2" -gt 100 ]; then
    echo "grid too large" >&2
    exit 3
fi
echo "fake video" > "${14}"
echo "Done."
"#;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<dyn SimulationStore>,
    pub dispatcher: Arc<Dispatcher>,
    pub output_dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_script(FAKE_SOLVER)
    }

    pub fn with_script(script: &str) -> Self {
        Self::with_command(SolverCommand {
            program: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string(), "solver".to_string()],
            working_dir: None,
        })
    }

    pub fn with_command(command: SolverCommand) -> Self {
        let output_dir = tempfile::tempdir().expect("tempdir");
        let store: Arc<dyn SimulationStore> = Arc::new(InMemorySimulationStore::new());

        let controller = LifecycleController::new(
            Arc::clone(&store),
            Arc::new(ProcessSupervisor::new(command)),
            ArtifactLayout {
                output_dir: output_dir.path().to_path_buf(),
                url_prefix: "/videos".to_string(),
            },
        );
        let dispatcher = Arc::new(Dispatcher::start(Arc::new(controller)));
        let router = create_router(AppState::new(Arc::clone(&store), Arc::clone(&dispatcher)));

        Self {
            router,
            store,
            dispatcher,
            output_dir,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request");
        self.send(request).await
    }

    pub async fn post_raw(&self, uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request");
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        self.post_raw(uri, &body.to_string()).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    /// Polls a simulation until it is completed or failed
    pub async fn wait_for_terminal(&self, id: i64) -> Value {
        for _ in 0..200 {
            let (status, body) = self.get(&format!("/api/simulations/{}", id)).await;
            assert_eq!(status, StatusCode::OK);
            if body["status"] == "completed" || body["status"] == "failed" {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("simulation {} never reached a terminal status", id);
    }
}
