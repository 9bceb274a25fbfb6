use super::*;
use axum::body::Body;
use axum::http::Request;
use crossbars_protocol::{BarKind, EncodedSlots, Layout, Slot, ViewAction};
use time::OffsetDateTime;
use tower::ServiceExt;

fn temp_state(tag: &str) -> Arc<AppState> {
    let path = std::env::temp_dir().join(format!(
        "crossbars-server-{tag}-{}.db",
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    ));
    Arc::new(AppState {
        store: Store::new(path),
    })
}

fn record(title: &str, job: &str, encoded: &str) -> LayoutRecord {
    LayoutRecord {
        title: title.to_string(),
        description: "a test layout".to_string(),
        job_id: job.to_string(),
        encoded_slots: EncodedSlots::new(encoded),
        author: Some("ari".to_string()),
        ..LayoutRecord::default()
    }
}

async fn body_json(resp: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_and_routing_respond() {
    let state = temp_state("routing");
    let app = build_router(AppState {
        store: state.store.clone(),
    });

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("crossbars"));
}

#[tokio::test]
async fn planner_page_knows_its_jobs() {
    assert!(planner_page(Path("PLD".to_string())).await.is_ok());

    let err = planner_page(Path("XXX".to_string())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);

    // Disabled jobs have no planner either.
    let err = planner_page(Path("BLU".to_string())).await.unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);

    assert!(planner_page_with_id(Path(("PLD".to_string(), 1)))
        .await
        .is_ok());
}

#[tokio::test]
async fn jobs_endpoint_hides_disabled_jobs() {
    let jobs = api_jobs().await.0;
    assert!(jobs.iter().any(|j| j.abbr == "PLD"));
    assert!(!jobs.iter().any(|j| j.abbr == "BLU"));
}

#[tokio::test]
async fn actions_endpoint_switches_kits_on_pvp() {
    let pve = api_actions(Query(ActionsQuery {
        job: "WHM".to_string(),
        is_pvp: None,
    }))
    .await
    .unwrap()
    .0;
    let pvp = api_actions(Query(ActionsQuery {
        job: "WHM".to_string(),
        is_pvp: Some("1".to_string()),
    }))
    .await
    .unwrap()
    .0;

    assert_ne!(pve["actions"][0]["id"], pvp["actions"][0]["id"]);
    let roles: Vec<&str> = pvp["roleActions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert!(roles.contains(&"Guard"));

    let err = api_actions(Query(ActionsQuery {
        job: "XXX".to_string(),
        is_pvp: None,
    }))
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn view_endpoint_builds_a_fresh_state() {
    let state = temp_state("view-fresh");
    let planner = api_view(
        State(state),
        Path("PLD".to_string()),
        Query(HashMap::new()),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(planner.selected_job.as_ref().unwrap().abbr, "PLD");
    assert_eq!(planner.view_action, ViewAction::New);
    assert!(!planner.read_only);
    assert!(!planner.actions.is_empty());
    assert!(!planner.role_actions.is_empty());
    assert!(planner.jobs.iter().any(|j| j.abbr == "WHM"));
    assert!(!planner.jobs.iter().any(|j| j.abbr == "BLU"));

    // Default descriptor renders cross sets only.
    assert!(planner.hotbar.bars.is_empty());
    assert_eq!(planner.chotbar.sets.len(), 8);
}

#[tokio::test]
async fn view_endpoint_decodes_url_slots() {
    let state = temp_state("view-url");
    let mut params = HashMap::new();
    params.insert("s1".to_string(), "-5,9".to_string());
    params.insert("l".to_string(), "1".to_string());

    let planner = api_view(State(state), Path("PLD".to_string()), Query(params))
        .await
        .unwrap()
        .0;

    assert_eq!(planner.view_data.layout, Layout::Hotbars);
    let entry = &planner.hotbar.bars[0].slots[5];
    assert_eq!(entry.action_id, Some(9));
    assert_eq!(entry.action.as_ref().unwrap().name, "Fast Blade");
}

#[tokio::test]
async fn view_endpoint_serves_saved_layouts_read_only() {
    let state = temp_state("view-saved");
    let stored = state
        .store
        .save(&record("opener", "PLD", "9,15"))
        .unwrap()
        .unwrap();
    let id = stored.id.unwrap();

    let mut params = HashMap::new();
    params.insert("id".to_string(), id.to_string());
    let planner = api_view(
        State(state.clone()),
        Path("PLD".to_string()),
        Query(params.clone()),
    )
    .await
    .unwrap()
    .0;

    assert_eq!(planner.view_action, ViewAction::Show);
    assert!(planner.read_only);
    assert_eq!(planner.view_data.title.as_deref(), Some("opener"));
    assert_eq!(
        planner.view_data.encoded_slots.as_ref().unwrap().as_str(),
        "9,15"
    );

    // A record belongs to one job; other planners must not claim it.
    let err = api_view(State(state), Path("WHM".to_string()), Query(params))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn view_endpoint_rejects_unknown_ids_and_jobs() {
    let state = temp_state("view-missing");

    let mut params = HashMap::new();
    params.insert("id".to_string(), "424242".to_string());
    let err = api_view(
        State(state.clone()),
        Path("PLD".to_string()),
        Query(params),
    )
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);

    let err = api_view(State(state), Path("XXX".to_string()), Query(HashMap::new()))
        .await
        .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dispatch_endpoint_runs_one_transition() {
    let next = api_dispatch(Json(DispatchInput {
        state: None,
        action: serde_json::json!({ "type": "TOGGLE_TITLES" }),
    }))
    .await
    .unwrap()
    .0;
    assert!(next.show_titles);

    let err = api_dispatch(Json(DispatchInput {
        state: None,
        action: serde_json::json!({ "type": "NOT_A_THING", "payload": {} }),
    }))
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(err.1.contains("NOT_A_THING"));
}

#[tokio::test]
async fn layout_save_validates_and_round_trips() {
    let state = temp_state("save");

    let resp = api_layout_post(
        State(state.clone()),
        Json(LayoutInput {
            method: LayoutMethod::Save,
            record: record("opener", "PLD", "9,-2,15"),
        }),
    )
    .await
    .unwrap();
    let saved = body_json(resp).await;
    let id = saved["id"].as_i64().unwrap();
    assert_eq!(saved["jobId"], "PLD");
    assert_eq!(saved["encodedSlots"], "9,-2,15");
    assert_eq!(saved["hearts"], 0);

    let fetched = api_layout_get(State(state.clone()), Path(id))
        .await
        .unwrap()
        .0;
    assert_eq!(fetched.title, "opener");

    let err = api_layout_post(
        State(state),
        Json(LayoutInput {
            method: LayoutMethod::Save,
            record: record("bad", "XXX", ""),
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn layout_destroy_and_heart_need_a_real_id() {
    let state = temp_state("mutate");

    let err = api_layout_post(
        State(state.clone()),
        Json(LayoutInput {
            method: LayoutMethod::Destroy,
            record: LayoutRecord {
                job_id: "PLD".to_string(),
                ..LayoutRecord::default()
            },
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::BAD_REQUEST);

    let mut ghost = record("ghost", "PLD", "");
    ghost.id = Some(999);
    let err = api_layout_post(
        State(state.clone()),
        Json(LayoutInput {
            method: LayoutMethod::Heart,
            record: ghost,
        }),
    )
    .await
    .unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);

    // Save, heart, destroy, and confirm it is gone.
    let resp = api_layout_post(
        State(state.clone()),
        Json(LayoutInput {
            method: LayoutMethod::Save,
            record: record("target", "PLD", "9"),
        }),
    )
    .await
    .unwrap();
    let id = body_json(resp).await["id"].as_i64().unwrap();

    let mut by_id = record("target", "PLD", "9");
    by_id.id = Some(id);
    api_layout_post(
        State(state.clone()),
        Json(LayoutInput {
            method: LayoutMethod::Heart,
            record: by_id.clone(),
        }),
    )
    .await
    .unwrap();
    let fetched = api_layout_get(State(state.clone()), Path(id))
        .await
        .unwrap()
        .0;
    assert_eq!(fetched.hearts, 1);

    api_layout_post(
        State(state.clone()),
        Json(LayoutInput {
            method: LayoutMethod::Destroy,
            record: by_id,
        }),
    )
    .await
    .unwrap();
    let err = api_layout_get(State(state), Path(id)).await.unwrap_err();
    assert_eq!(err.0, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn layouts_endpoint_sorts_recent_and_popular() {
    let state = temp_state("lists");
    let a = state
        .store
        .save(&record("first", "PLD", "9"))
        .unwrap()
        .unwrap();
    let mut other = record("second", "WHM", "120");
    other.author = Some("bo".to_string());
    state.store.save(&other).unwrap();
    state.store.heart(a.id.unwrap()).unwrap();

    let recent = api_layouts(
        State(state.clone()),
        Query(LayoutsQuery {
            job: None,
            sort: None,
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(recent.len(), 2);

    let popular = api_layouts(
        State(state.clone()),
        Query(LayoutsQuery {
            job: None,
            sort: Some("popular".to_string()),
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(popular.len(), 1);
    assert_eq!(popular[0].title, "first");

    let whm_only = api_layouts(
        State(state),
        Query(LayoutsQuery {
            job: Some("WHM".to_string()),
            sort: None,
        }),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(whm_only.len(), 1);
    assert_eq!(whm_only[0].job_id, "WHM");
}

/// The full planner loop: open a share link, edit a slot, publish, reopen.
#[tokio::test]
async fn edit_publish_reopen_flow() {
    let state = temp_state("flow");

    let mut params = HashMap::new();
    params.insert("s1".to_string(), "-5,9".to_string());
    params.insert("l".to_string(), "1".to_string());
    let planner = api_view(
        State(state.clone()),
        Path("PLD".to_string()),
        Query(params),
    )
    .await
    .unwrap()
    .0;
    assert_eq!(planner.hotbar.bars[0].slots[5].action_id, Some(9));

    // Drop Rampart on the first slot.
    let planner = api_dispatch(Json(DispatchInput {
        state: Some(planner),
        action: serde_json::to_value(AppAction::SlotAction {
            slot: Slot {
                kind: BarKind::Hotbar,
                bar: 0,
                index: 0,
            },
            action_id: Some(7531),
        })
        .unwrap(),
    }))
    .await
    .unwrap()
    .0;
    let encoded = planner.view_data.encoded_slots.clone().unwrap();
    assert_eq!(encoded.as_str(), "7531,-4,9");

    let resp = api_layout_post(
        State(state.clone()),
        Json(LayoutInput {
            method: LayoutMethod::Save,
            record: LayoutRecord {
                title: "rampart opener".to_string(),
                job_id: "PLD".to_string(),
                layout: Layout::Hotbars,
                encoded_slots: encoded,
                ..LayoutRecord::default()
            },
        }),
    )
    .await
    .unwrap();
    let id = body_json(resp).await["id"].as_i64().unwrap();

    let mut params = HashMap::new();
    params.insert("id".to_string(), id.to_string());
    let reopened = api_view(State(state), Path("PLD".to_string()), Query(params))
        .await
        .unwrap()
        .0;

    assert!(reopened.read_only);
    assert_eq!(reopened.view_data.layout, Layout::Hotbars);
    let first = &reopened.hotbar.bars[0].slots[0];
    assert_eq!(first.action_id, Some(7531));
    assert_eq!(first.action.as_ref().unwrap().name, "Rampart");
    assert_eq!(reopened.hotbar.bars[0].slots[5].action_id, Some(9));
}
