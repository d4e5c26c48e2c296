mod common;

use axum::http::StatusCode;
use cavity_orchestrator::repository::SimulationStore;
use cavity_orchestrator::supervisor::SolverCommand;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let (status, _) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_submit_with_defaults_completes() {
    let app = TestApp::new();

    let (status, created) = app.post_json("/api/simulations", &json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "pending");
    assert_eq!(
        created["config"],
        json!({
            "nx": 50,
            "ny": 50,
            "reynoldsNumber": 100.0,
            "steps": 500,
            "dt": 0.01,
            "lidVelocity": 1.0
        })
    );
    assert!(created["outputVideoUrl"].is_null());
    assert!(created["createdAt"].is_string());

    let id = created["id"].as_i64().unwrap();
    let done = app.wait_for_terminal(id).await;

    assert_eq!(done["status"], "completed");
    assert_eq!(done["outputVideoUrl"], format!("/videos/sim_{}.mp4", id));
    let diagnostics = done["diagnostics"].as_str().unwrap();
    assert!(diagnostics.contains("Grid 50x50, Re=100"));
    assert!(diagnostics.contains("Done."));
    assert!(
        app.output_dir
            .path()
            .join(format!("sim_{}.mp4", id))
            .exists()
    );
}

#[tokio::test]
async fn test_failed_run_records_exit_code() {
    let app = TestApp::new();

    let (status, created) = app
        .post_json("/api/simulations", &json!({ "nx": 150, "ny": 40 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let done = app.wait_for_terminal(created["id"].as_i64().unwrap()).await;

    assert_eq!(done["status"], "failed");
    assert!(done["outputVideoUrl"].is_null());
    let diagnostics = done["diagnostics"].as_str().unwrap();
    assert!(diagnostics.starts_with("Process exited with code 3\n\n"));
    assert!(diagnostics.contains("grid too large"));
}

#[tokio::test]
async fn test_missing_solver_fails_simulation() {
    let app = TestApp::with_command(SolverCommand {
        program: "/nonexistent/solver-binary".to_string(),
        args: Vec::new(),
        working_dir: None,
    });

    let (_, created) = app.post_json("/api/simulations", &json!({})).await;
    let done = app.wait_for_terminal(created["id"].as_i64().unwrap()).await;

    assert_eq!(done["status"], "failed");
    assert!(
        done["diagnostics"]
            .as_str()
            .unwrap()
            .contains("/nonexistent/solver-binary")
    );
}

#[tokio::test]
async fn test_alias_fields_are_accepted() {
    let app = TestApp::new();

    let (status, created) = app
        .post_json(
            "/api/simulations",
            &json!({ "gridWidth": 64, "gridHeight": 32, "flowNumber": 400, "boundaryVelocity": -2 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["config"]["nx"], 64);
    assert_eq!(created["config"]["ny"], 32);
    assert_eq!(created["config"]["reynoldsNumber"], 400.0);
    assert_eq!(created["config"]["lidVelocity"], -2.0);
}

#[tokio::test]
async fn test_out_of_range_is_rejected_without_record() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/simulations", &json!({ "steps": 6000 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "steps");
    assert_eq!(body["message"], "Number must be less than or equal to 5000");

    let (_, list) = app.get("/api/simulations").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_non_integer_grid_is_rejected() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/api/simulations", &json!({ "nx": 50.5 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "nx");
}

#[tokio::test]
async fn test_malformed_bodies_are_rejected() {
    let app = TestApp::new();

    let (status, body) = app.post_raw("/api/simulations", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
    assert!(body.get("field").is_none());

    let (status, body) = app.post_json("/api/simulations", &json!([1, 2])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("field").is_none());

    let (_, list) = app.get("/api/simulations").await;
    assert_eq!(list, json!([]));
}

#[tokio::test]
async fn test_list_is_most_recent_first() {
    let app = TestApp::new();

    let mut ids = Vec::new();
    for nx in [20, 30, 40] {
        let (_, created) = app.post_json("/api/simulations", &json!({ "nx": nx })).await;
        ids.push(created["id"].as_i64().unwrap());
    }

    let (status, list) = app.get("/api/simulations").await;
    assert_eq!(status, StatusCode::OK);

    let listed: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    ids.reverse();
    assert_eq!(listed, ids);

    app.dispatcher.shutdown().await;
    for sim in app.store.list_all().await.unwrap() {
        assert!(sim.is_terminal());
    }
}

#[tokio::test]
async fn test_unknown_simulation_is_not_found() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/simulations/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Simulation not found");

    let (status, _) = app.get("/api/simulations/abc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_submissions_each_reach_a_terminal_status() {
    let app = TestApp::new();

    let mut ids = Vec::new();
    for nx in [60, 120, 70, 180] {
        let (_, created) = app.post_json("/api/simulations", &json!({ "nx": nx })).await;
        ids.push((nx, created["id"].as_i64().unwrap()));
    }

    for (nx, id) in ids {
        let done = app.wait_for_terminal(id).await;
        let expected = if nx > 100 { "failed" } else { "completed" };
        assert_eq!(done["status"], expected, "simulation {} (nx={})", id, nx);
    }
}

#[tokio::test]
async fn test_terminal_record_is_stable() {
    let app = TestApp::new();

    let (_, created) = app.post_json("/api/simulations", &json!({ "steps": 20 })).await;
    let id = created["id"].as_i64().unwrap();
    let first = app.wait_for_terminal(id).await;

    let (_, again) = app.get(&format!("/api/simulations/{}", id)).await;
    assert_eq!(first, again);
    assert_eq!(first["createdAt"], created["createdAt"]);
}

#[tokio::test]
async fn test_list_order_ignores_completion_order() {
    // nx = 20 runs slowly, so the older simulation finishes last
    let app = TestApp::with_script(
        r#"
if [ "$2" -eq 20 ]; then sleep 1; fi
echo "video" > "${14}"
"#,
    );

    let (_, older) = app.post_json("/api/simulations", &json!({ "nx": 20 })).await;
    let (_, newer) = app.post_json("/api/simulations", &json!({ "nx": 30 })).await;
    let older = older["id"].as_i64().unwrap();
    let newer = newer["id"].as_i64().unwrap();

    let newer_done = app.wait_for_terminal(newer).await;
    assert_eq!(newer_done["status"], "completed");
    let (_, older_now) = app.get(&format!("/api/simulations/{}", older)).await;
    assert_ne!(older_now["status"], "completed");

    let older_done = app.wait_for_terminal(older).await;
    assert_eq!(older_done["status"], "completed");

    let (_, list) = app.get("/api/simulations").await;
    let listed: Vec<i64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed, vec![newer, older]);
}
