//! HTTP surface for the crossbars planner.
//!
//! Serves two embedded pages plus the JSON API they talk to. All layout
//! logic lives in `crossbars-engine`; handlers unpack query and body
//! values, call the engine, and shape responses.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use crossbars_engine::{dispatch, initial_state, reduce, Store};
use crossbars_protocol::{
    AppAction, AppState as PlannerState, Job, LayoutRecord, ViewAction, ViewData,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod data;

#[cfg(test)]
mod tests;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/health", get(health))
        .route("/job/{abbr}", get(planner_page))
        .route("/job/{abbr}/{id}", get(planner_page_with_id))
        .route("/api/jobs", get(api_jobs))
        .route("/api/actions", get(api_actions))
        .route("/api/view/{abbr}", get(api_view))
        .route("/api/dispatch", post(api_dispatch))
        .route("/api/layouts", get(api_layouts))
        .route("/api/layout", post(api_layout_post))
        .route("/api/layout/{id}", get(api_layout_get))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        // Everything served here is public and unauthenticated.
        .layer(public_cors())
}

type ApiError = (StatusCode, String);

fn not_found() -> ApiError {
    (StatusCode::NOT_FOUND, "not found".to_string())
}

fn bad_request(msg: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.to_string())
}

fn internal(err: anyhow::Error) -> ApiError {
    tracing::error!("request failed: {err:#}");
    (StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
}

async fn health() -> &'static str {
    "ok"
}

async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

fn lookup_enabled_job(abbr: &str) -> Option<&'static Job> {
    data::find_job(abbr).filter(|j| !j.disabled)
}

async fn planner_page(Path(abbr): Path<String>) -> Result<Html<&'static str>, ApiError> {
    match lookup_enabled_job(&abbr) {
        Some(_) => Ok(Html(PLANNER_HTML)),
        None => Err(not_found()),
    }
}

async fn planner_page_with_id(
    Path((abbr, _id)): Path<(String, i64)>,
) -> Result<Html<&'static str>, ApiError> {
    match lookup_enabled_job(&abbr) {
        Some(_) => Ok(Html(PLANNER_HTML)),
        None => Err(not_found()),
    }
}

async fn api_jobs() -> Json<Vec<Job>> {
    Json(data::enabled_jobs())
}

fn flag(value: Option<&String>) -> bool {
    matches!(value.map(String::as_str), Some("1") | Some("true"))
}

#[derive(Debug, Deserialize)]
struct ActionsQuery {
    job: String,
    #[serde(default, rename = "isPvp")]
    is_pvp: Option<String>,
}

async fn api_actions(Query(q): Query<ActionsQuery>) -> Result<Json<serde_json::Value>, ApiError> {
    let job = lookup_enabled_job(&q.job).ok_or_else(not_found)?;
    let (actions, role_actions) = data::actions_for_job(job, flag(q.is_pvp.as_ref()));
    Ok(Json(serde_json::json!({
        "actions": actions,
        "roleActions": role_actions,
    })))
}

/// Builds the full planner state for one job: stored record (when `id` is
/// given) plus URL overrides, run through a LOAD_VIEW_DATA transition.
async fn api_view(
    State(state): State<Arc<AppState>>,
    Path(abbr): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<PlannerState>, ApiError> {
    let job = lookup_enabled_job(&abbr).ok_or_else(not_found)?;
    let query_pvp = flag(params.get("isPvp"));

    let (view_data, view_action) = match params.get("id").and_then(|id| id.parse::<i64>().ok()) {
        Some(id) => {
            let record = state.store.get(id).map_err(internal)?.ok_or_else(not_found)?;
            if record.job_id != job.abbr {
                return Err(not_found());
            }
            (record.view_data(), ViewAction::Show)
        }
        None => {
            let view_data = ViewData {
                job_id: Some(job.abbr.clone()),
                is_pvp: query_pvp,
                ..ViewData::default()
            };
            (view_data, ViewAction::New)
        }
    };

    let is_pvp = view_data.is_pvp || query_pvp;
    let (actions, role_actions) = data::actions_for_job(job, is_pvp);
    let action = AppAction::LoadViewData {
        view_data: Some(view_data),
        selected_job: Some(job.clone()),
        actions,
        role_actions,
        view_action,
        url_params: params,
    };

    let mut next = reduce(&initial_state(), action);
    next.jobs = data::enabled_jobs();
    Ok(Json(next))
}

#[derive(Debug, Deserialize)]
struct DispatchInput {
    #[serde(default)]
    state: Option<PlannerState>,
    action: serde_json::Value,
}

/// One state-machine step over the wire. Unknown action types are a hard
/// failure, mirroring the reducer's own contract.
async fn api_dispatch(
    Json(input): Json<DispatchInput>,
) -> Result<Json<PlannerState>, ApiError> {
    let state = input.state.unwrap_or_else(initial_state);
    let next = dispatch(&state, input.action).map_err(internal)?;
    Ok(Json(next))
}

#[derive(Debug, Deserialize)]
struct LayoutsQuery {
    #[serde(default)]
    job: Option<String>,
    #[serde(default)]
    sort: Option<String>,
}

const LIST_LIMIT: usize = 12;

async fn api_layouts(
    State(state): State<Arc<AppState>>,
    Query(q): Query<LayoutsQuery>,
) -> Result<Json<Vec<LayoutRecord>>, ApiError> {
    let job = q.job.as_deref();
    let rows = match q.sort.as_deref() {
        Some("popular") => state.store.list_popular(job, LIST_LIMIT),
        _ => state.store.list_recent(job, LIST_LIMIT),
    }
    .map_err(internal)?;
    Ok(Json(rows))
}

async fn api_layout_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<LayoutRecord>, ApiError> {
    let record = state.store.get(id).map_err(internal)?.ok_or_else(not_found)?;
    Ok(Json(record))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LayoutMethod {
    Save,
    Destroy,
    Heart,
}

impl Default for LayoutMethod {
    fn default() -> Self {
        Self::Save
    }
}

#[derive(Debug, Deserialize)]
struct LayoutInput {
    #[serde(default)]
    method: LayoutMethod,
    #[serde(flatten)]
    record: LayoutRecord,
}

/// Single mutation endpoint for stored layouts; `method` picks save,
/// destroy, or heart.
async fn api_layout_post(
    State(state): State<Arc<AppState>>,
    Json(input): Json<LayoutInput>,
) -> Result<Response, ApiError> {
    match input.method {
        LayoutMethod::Save => {
            if lookup_enabled_job(&input.record.job_id).is_none() {
                return Err(bad_request("unknown job"));
            }
            let stored = state
                .store
                .save(&input.record)
                .map_err(internal)?
                .ok_or_else(not_found)?;
            Ok(Json(stored).into_response())
        }
        LayoutMethod::Destroy => {
            let id = input.record.id.ok_or_else(|| bad_request("id required"))?;
            if !state.store.destroy(id).map_err(internal)? {
                return Err(not_found());
            }
            Ok(Json(serde_json::json!({ "destroyed": true })).into_response())
        }
        LayoutMethod::Heart => {
            let id = input.record.id.ok_or_else(|| bad_request("id required"))?;
            if !state.store.heart(id).map_err(internal)? {
                return Err(not_found());
            }
            Ok(Json(serde_json::json!({ "hearted": true })).into_response())
        }
    }
}

fn public_cors() -> CorsLayer {
    use axum::http::{header, Method};

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(Any)
}

pub async fn serve(addr: SocketAddr, db_path: PathBuf) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    serve_listener(listener, db_path, async {
        std::future::pending::<()>().await
    })
    .await?;
    Ok(())
}

pub async fn serve_listener(
    listener: tokio::net::TcpListener,
    db_path: PathBuf,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<SocketAddr> {
    let state = AppState {
        store: Store::new(db_path),
    };
    let app = build_router(state);
    let addr = listener.local_addr()?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(addr)
}

const INDEX_HTML: &str = r###"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <meta name="theme-color" content="#10141c" />
  <title>crossbars</title>
  <style>
    :root{
      --bg:#10141c;
      --panel:#181e29;
      --edge:#2a3344;
      --ink:#e8edf6;
      --muted:#8b96a8;
      --gold:#d4b36a;
      --blue:#6aa5d4;
    }
    *{box-sizing:border-box;margin:0;padding:0}
    body{
      font-family:system-ui,-apple-system,sans-serif;
      background:var(--bg);color:var(--ink);
      min-height:100vh;padding:32px 16px;
    }
    .wrap{max-width:860px;margin:0 auto}
    h1{font-size:26px;letter-spacing:1px}
    h1 span{color:var(--gold)}
    .tag{color:var(--muted);font-size:13px;margin:6px 0 26px}
    h2{font-size:15px;margin:26px 0 10px;color:var(--blue)}
    .jobs{display:grid;grid-template-columns:repeat(auto-fill,minmax(140px,1fr));gap:10px}
    .job{
      display:block;padding:12px;border:1px solid var(--edge);border-radius:10px;
      background:var(--panel);color:var(--ink);text-decoration:none;
    }
    .job:hover{border-color:var(--gold)}
    .job strong{display:block;font-size:14px}
    .job span{font-size:11px;color:var(--muted)}
    .sorttabs{display:flex;gap:8px;margin-bottom:10px}
    .sorttabs button{
      border:1px solid var(--edge);background:var(--panel);color:var(--muted);
      border-radius:8px;padding:6px 10px;font-size:12px;cursor:pointer;
    }
    .sorttabs button.on{color:var(--ink);border-color:var(--blue)}
    .layouts{display:flex;flex-direction:column;gap:8px}
    .layout-card{
      display:flex;justify-content:space-between;gap:10px;align-items:center;
      padding:10px 12px;border:1px solid var(--edge);border-radius:10px;
      background:var(--panel);color:var(--ink);text-decoration:none;
    }
    .layout-card:hover{border-color:var(--gold)}
    .layout-card .t{font-size:14px}
    .layout-card .m{font-size:11px;color:var(--muted)}
    .layout-card .h{font-size:12px;color:var(--gold);white-space:nowrap}
    .empty{color:var(--muted);font-size:13px;padding:8px 0}
  </style>
</head>
<body>
  <div class="wrap">
    <h1>cross<span>bars</span></h1>
    <div class="tag">Plan cross hotbar and hotbar layouts, share them as links.</div>

    <h2>Jobs</h2>
    <div id="jobs" class="jobs"></div>

    <h2>Layouts</h2>
    <div class="sorttabs">
      <button id="tabRecent" class="on" type="button">recent</button>
      <button id="tabPopular" type="button">popular</button>
    </div>
    <div id="layouts" class="layouts"></div>
  </div>

  <script>
  (function(){
    const $ = (id) => document.getElementById(id);
    let sort = "recent";

    function esc(s){
      return String(s).replace(/[&<>"]/g, (c) => ({ "&":"&amp;", "<":"&lt;", ">":"&gt;", "\"":"&quot;" }[c]));
    }

    async function loadJobs(){
      const r = await fetch("/api/jobs");
      const jobs = await r.json();
      $("jobs").innerHTML = jobs.map((j) =>
        `<a class="job" href="/job/${esc(j.abbr)}"><strong>${esc(j.name)}</strong><span>${esc(j.abbr)} · ${esc(j.role || "")}</span></a>`
      ).join("");
    }

    async function loadLayouts(){
      const r = await fetch(`/api/layouts?sort=${sort}`);
      const rows = await r.json();
      if (!rows.length){
        $("layouts").innerHTML = `<div class="empty">Nothing here yet. Open a job and publish a layout.</div>`;
        return;
      }
      $("layouts").innerHTML = rows.map((l) => {
        const when = l.updatedAt ? l.updatedAt.slice(0, 10) : "";
        const by = l.author ? ` by ${esc(l.author)}` : "";
        return `<a class="layout-card" href="/job/${esc(l.jobId)}/${l.id}">
          <div><div class="t">${esc(l.title || "untitled")}</div>
          <div class="m">${esc(l.jobId)}${l.isPvp ? " · PvP" : ""}${by} · ${esc(when)}</div></div>
          <div class="h">♥ ${l.hearts}</div></a>`;
      }).join("");
    }

    $("tabRecent").addEventListener("click", () => {
      sort = "recent";
      $("tabRecent").classList.add("on");
      $("tabPopular").classList.remove("on");
      loadLayouts();
    });
    $("tabPopular").addEventListener("click", () => {
      sort = "popular";
      $("tabPopular").classList.add("on");
      $("tabRecent").classList.remove("on");
      loadLayouts();
    });

    loadJobs();
    loadLayouts();
  })();
  </script>
</body>
</html>
"###;

const PLANNER_HTML: &str = r###"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <meta name="theme-color" content="#10141c" />
  <title>crossbars planner</title>
  <style>
    :root{
      --bg:#10141c;
      --panel:#181e29;
      --edge:#2a3344;
      --ink:#e8edf6;
      --muted:#8b96a8;
      --gold:#d4b36a;
      --blue:#6aa5d4;
      --slot:#0c1018;
    }
    *{box-sizing:border-box;margin:0;padding:0}
    body{
      font-family:system-ui,-apple-system,sans-serif;
      background:var(--bg);color:var(--ink);
      min-height:100vh;padding:20px 16px 60px;
    }
    .wrap{max-width:1060px;margin:0 auto}
    header{display:flex;align-items:center;justify-content:space-between;gap:12px;flex-wrap:wrap;margin-bottom:14px}
    header a{color:var(--muted);text-decoration:none;font-size:13px}
    header a:hover{color:var(--ink)}
    h1{font-size:19px}
    h1 small{color:var(--muted);font-weight:400;font-size:12px;margin-left:8px}
    .controls{display:flex;gap:8px;align-items:center;flex-wrap:wrap;font-size:12px;color:var(--muted)}
    .controls select{
      background:var(--panel);color:var(--ink);border:1px solid var(--edge);
      border-radius:8px;padding:5px 8px;font-size:12px;
    }
    .controls label{display:flex;gap:4px;align-items:center;cursor:pointer}
    .btn{
      border:1px solid var(--edge);background:var(--panel);color:var(--ink);
      border-radius:8px;padding:6px 10px;font-size:12px;cursor:pointer;
    }
    .btn:hover{border-color:var(--gold)}
    .btn.primary{border-color:var(--gold);color:var(--gold)}
    .cols{display:grid;grid-template-columns:1fr 270px;gap:14px}
    @media (max-width:900px){.cols{grid-template-columns:1fr}}
    .bars{display:flex;flex-direction:column;gap:14px}
    .barblock{border:1px solid var(--edge);border-radius:12px;background:var(--panel);padding:10px}
    .barblock h3{font-size:12px;color:var(--muted);margin-bottom:8px;font-weight:500}
    .row{display:flex;gap:4px;flex-wrap:wrap;margin-bottom:6px}
    .xhb{display:flex;gap:16px;flex-wrap:wrap;margin-bottom:6px}
    .half{display:grid;grid-template-columns:repeat(4,1fr);gap:4px}
    .slot{
      width:40px;height:40px;border:1px solid var(--edge);border-radius:8px;
      background:var(--slot);color:var(--ink);cursor:pointer;position:relative;
      font-size:9px;display:flex;align-items:center;justify-content:center;
      text-align:center;overflow:hidden;padding:2px;
    }
    .slot:hover{border-color:var(--blue)}
    .slot.filled{border-color:#3d5a82;background:#17222f}
    .slot.unknown{border-color:#6a4a4a;color:var(--muted)}
    .slot .lv{position:absolute;right:2px;bottom:1px;font-size:8px;color:var(--gold)}
    .slottitle{font-size:9px;color:var(--muted);text-align:center;width:40px;overflow:hidden;white-space:nowrap;text-overflow:ellipsis}
    .withtitles .cell{display:flex;flex-direction:column;gap:2px;align-items:center}
    .palette{border:1px solid var(--edge);border-radius:12px;background:var(--panel);padding:10px;align-self:start;position:sticky;top:12px}
    .palette h3{font-size:12px;color:var(--muted);margin:6px 0;font-weight:500}
    .p-acts{display:flex;flex-direction:column;gap:3px;max-height:420px;overflow:auto}
    .pact{
      display:flex;justify-content:space-between;gap:8px;padding:5px 8px;
      border:1px solid transparent;border-radius:7px;background:none;color:var(--ink);
      font-size:12px;cursor:pointer;text-align:left;width:100%;
    }
    .pact:hover{border-color:var(--edge);background:var(--slot)}
    .pact.sel{border-color:var(--gold)}
    .pact i{color:var(--muted);font-style:normal;font-size:10px}
    .details{border:1px solid var(--edge);border-radius:12px;background:var(--panel);padding:10px;margin-top:14px;font-size:13px}
    .details .d{color:var(--muted);font-size:12px;margin-top:4px;white-space:pre-wrap}
    .saveform{display:none;flex-direction:column;gap:8px;margin-top:14px;border:1px solid var(--edge);border-radius:12px;background:var(--panel);padding:12px}
    .saveform.open{display:flex}
    .saveform input,.saveform textarea{
      background:var(--slot);border:1px solid var(--edge);border-radius:8px;
      color:var(--ink);padding:7px 9px;font-size:13px;font-family:inherit;
    }
    .hint{color:var(--muted);font-size:11px;margin-top:10px}
    .toast{
      position:fixed;left:50%;bottom:18px;transform:translateX(-50%);
      background:var(--panel);border:1px solid var(--gold);border-radius:10px;
      padding:8px 14px;font-size:12px;display:none;
    }
  </style>
</head>
<body>
  <div class="wrap">
    <header>
      <div>
        <a href="/">&larr; all jobs</a>
        <h1 id="title">planner<small id="subtitle"></small></h1>
      </div>
      <div class="controls">
        <label>layout
          <select id="layoutSel">
            <option value="0">Cross Hotbars</option>
            <option value="1">Hotbars</option>
            <option value="2">Hybrid</option>
            <option value="3">Dual Cross</option>
          </select>
        </label>
        <label><input type="checkbox" id="tglPvp"> PvP</label>
        <label><input type="checkbox" id="tglTitles"> titles</label>
        <label><input type="checkbox" id="tglLvls"> levels</label>
        <label><input type="checkbox" id="tglDetails"> details</label>
        <button id="btnCopy" class="btn" type="button">copy link</button>
        <button id="btnEdit" class="btn" type="button" hidden>edit</button>
        <button id="btnPublish" class="btn primary" type="button" hidden>publish</button>
        <button id="btnCancel" class="btn" type="button" hidden>cancel</button>
        <button id="btnSave" class="btn primary" type="button">save</button>
      </div>
    </header>

    <div class="cols">
      <div id="bars" class="bars"></div>
      <aside id="palette" class="palette">
        <h3>actions</h3>
        <div id="pActs" class="p-acts"></div>
        <h3>role actions</h3>
        <div id="pRoles" class="p-acts"></div>
        <div class="hint">Pick an action, then click a slot. Click a filled slot with nothing picked to clear it.</div>
      </aside>
    </div>

    <div id="details" class="details" style="display:none"></div>

    <form id="saveForm" class="saveform">
      <input id="fTitle" placeholder="title" maxlength="80" required>
      <textarea id="fDesc" placeholder="description" rows="3" maxlength="600"></textarea>
      <input id="fAuthor" placeholder="author (optional)" maxlength="40">
      <button class="btn primary" type="submit">publish layout</button>
    </form>
  </div>
  <div id="toast" class="toast"></div>

  <script>
  (function(){
    const $ = (id) => document.getElementById(id);
    const KINDS = { hotbar: "hotbar", crossLeft: "crossLeft", crossRight: "crossRight", extraCross: "extraCross" };

    // /job/{abbr} or /job/{abbr}/{id}
    const parts = location.pathname.split("/").filter(Boolean);
    const jobAbbr = parts[1];
    const layoutId = parts.length > 2 ? Number(parts[2]) : null;

    let app = null;
    let picked = null;

    function esc(s){
      return String(s).replace(/[&<>"]/g, (c) => ({ "&":"&amp;", "<":"&lt;", ">":"&gt;", "\"":"&quot;" }[c]));
    }

    function toast(msg){
      const t = $("toast");
      t.textContent = msg;
      t.style.display = "block";
      setTimeout(() => { t.style.display = "none"; }, 1800);
    }

    function viewQuery(){
      const q = new URLSearchParams(location.search);
      if (layoutId != null) q.set("id", String(layoutId));
      return q.toString();
    }

    async function loadView(){
      const qs = viewQuery();
      const r = await fetch(`/api/view/${encodeURIComponent(jobAbbr)}${qs ? "?" + qs : ""}`);
      if (!r.ok){
        document.body.innerHTML = "<p style='padding:40px'>not found</p>";
        return;
      }
      app = await r.json();
      render();
    }

    async function send(action){
      const r = await fetch("/api/dispatch", {
        method: "POST",
        headers: { "content-type": "application/json" },
        body: JSON.stringify({ state: app, action }),
      });
      if (!r.ok){
        toast("action failed");
        throw new Error("dispatch failed");
      }
      app = await r.json();
      return app;
    }

    function actionById(id){
      const all = (app.actions || []).concat(app.roleActions || []);
      return all.find((a) => a.id === id) || null;
    }

    function slotCell(entry){
      const a = entry.action;
      const unknown = entry.actionId != null && !a;
      const label = a ? a.name : (unknown ? "#" + entry.actionId : "");
      const cls = "slot" + (entry.actionId != null ? " filled" : "") + (unknown ? " unknown" : "");
      const lv = (app.showAllLvl && a && a.level) ? `<span class="lv">${a.level}</span>` : "";
      const key = `${entry.slot.kind}:${entry.slot.bar}:${entry.slot.index}`;
      const title = app.showTitles && a ? `<div class="slottitle">${esc(a.name)}</div>` : "";
      return `<div class="cell"><button type="button" class="${cls}" data-slot="${key}" title="${esc(label)}">${esc(shorten(label))}${lv}</button>${title}</div>`;
    }

    function shorten(name){
      if (!name) return "";
      if (name.length <= 12) return name;
      return name.slice(0, 11) + "…";
    }

    function render(){
      $("subtitle").textContent = `${jobAbbr}${app.viewData.isPvp ? " · PvP" : ""}`;
      $("title").childNodes[0].nodeValue = app.viewData.title || "planner";
      $("layoutSel").value = String(app.viewData.layout || 0);
      $("tglPvp").checked = !!app.viewData.isPvp;
      $("tglTitles").checked = !!app.showTitles;
      $("tglLvls").checked = !!app.showAllLvl;
      $("tglDetails").checked = !!app.showDetails;
      document.body.classList.toggle("withtitles", !!app.showTitles);

      const blocks = [];
      if (app.hotbar.bars.length){
        blocks.push(`<div class="barblock"><h3>hotbars</h3>` +
          app.hotbar.bars.map((b) =>
            `<div class="row">${b.slots.map(slotCell).join("")}</div>`
          ).join("") + `</div>`);
      }
      if (app.chotbar.sets.length){
        blocks.push(`<div class="barblock"><h3>cross hotbars</h3>` +
          app.chotbar.sets.map((s) =>
            `<div class="xhb"><div class="half">${s.left.map(slotCell).join("")}</div>` +
            `<div class="half">${s.right.map(slotCell).join("")}</div></div>`
          ).join("") + `</div>`);
      }
      if (app.chotbar.extra.length){
        blocks.push(`<div class="barblock"><h3>expanded cross bars</h3>` +
          app.chotbar.extra.map((b) =>
            `<div class="row">${b.slots.map(slotCell).join("")}</div>`
          ).join("") + `</div>`);
      }
      $("bars").innerHTML = blocks.join("");

      renderPalette();
      renderDetails();
      renderButtons();

      for (const el of document.querySelectorAll("[data-slot]")){
        el.addEventListener("click", onSlotClick);
      }
    }

    function renderPalette(){
      const pal = $("palette");
      pal.style.display = app.readOnly ? "none" : "";
      if (app.readOnly) return;
      $("pActs").innerHTML = (app.actions || []).map(pact).join("");
      $("pRoles").innerHTML = (app.roleActions || []).map(pact).join("");
      for (const el of document.querySelectorAll("[data-act]")){
        el.addEventListener("click", () => {
          const id = Number(el.dataset.act);
          picked = (picked === id) ? null : id;
          renderPalette();
        });
      }
    }

    function pact(a){
      const sel = picked === a.id ? " sel" : "";
      const lv = (app.showAllLvl && a.level) ? `<i>lv ${a.level}</i>` : "";
      return `<button type="button" class="pact${sel}" data-act="${a.id}">${esc(a.name)}${lv}</button>`;
    }

    function renderDetails(){
      const d = $("details");
      if (!app.showDetails){ d.style.display = "none"; return; }
      d.style.display = "";
      const v = app.viewData;
      d.innerHTML = `<div>${esc(v.title || "untitled")}</div>` +
        `<div class="d">${esc(v.description || "no description")}</div>` +
        `<div class="d">slots: ${esc(v.encodedSlots || "(empty)")}</div>`;
    }

    function renderButtons(){
      const saved = app.viewData.id != null;
      $("btnSave").hidden = app.readOnly || saved;
      $("btnEdit").hidden = !(saved && app.readOnly);
      $("btnPublish").hidden = !(saved && !app.readOnly);
      $("btnCancel").hidden = !(saved && !app.readOnly);
      if (app.readOnly) $("saveForm").classList.remove("open");
    }

    function parseSlotKey(key){
      const [kind, bar, index] = key.split(":");
      return { kind: KINDS[kind], bar: Number(bar), index: Number(index) };
    }

    async function onSlotClick(ev){
      if (app.readOnly) return;
      const slot = parseSlotKey(ev.currentTarget.dataset.slot);
      const entry = findEntry(slot);
      let actionId;
      if (picked != null){
        actionId = picked;
      } else if (entry && entry.actionId != null){
        actionId = null; // clear
      } else {
        toast("pick an action first");
        return;
      }

      await send({ type: "SLOT_ACTION", payload: { slot, actionId } });
      // Rebuild the rendered bars from the fresh encoding.
      await send({
        type: "SLOT_ACTIONS",
        payload: { viewData: { encodedSlots: app.viewData.encodedSlots, layout: app.viewData.layout } },
      });
      syncUrl();
      render();
    }

    function findEntry(slot){
      const scan = (list) => list.find((e) =>
        e.slot.kind === slot.kind && e.slot.bar === slot.bar && e.slot.index === slot.index);
      for (const b of app.hotbar.bars){
        const hit = scan(b.slots);
        if (hit) return hit;
      }
      for (const s of app.chotbar.sets){
        const hit = scan(s.left) || scan(s.right);
        if (hit) return hit;
      }
      for (const b of app.chotbar.extra){
        const hit = scan(b.slots);
        if (hit) return hit;
      }
      return null;
    }

    function syncUrl(){
      const q = new URLSearchParams(location.search);
      const enc = app.viewData.encodedSlots || "";
      if (enc) q.set("s1", enc); else q.delete("s1");
      q.delete("s");
      q.set("l", String(app.viewData.layout || 0));
      if (app.viewData.isPvp) q.set("isPvp", "1"); else q.delete("isPvp");
      history.replaceState(null, "", location.pathname + "?" + q.toString());
    }

    $("layoutSel").addEventListener("change", async () => {
      // Re-enter through the view endpoint so the same encoding is decoded
      // under the new descriptor.
      const q = new URLSearchParams(location.search);
      q.set("l", $("layoutSel").value);
      if (app.viewData.encodedSlots) q.set("s1", app.viewData.encodedSlots);
      history.replaceState(null, "", location.pathname + "?" + q.toString());
      await loadView();
    });

    $("tglPvp").addEventListener("change", () => {
      const q = new URLSearchParams(location.search);
      if ($("tglPvp").checked) q.set("isPvp", "1"); else q.delete("isPvp");
      // Slot encodings rarely make sense across modes, but they are kept.
      if (app.viewData.encodedSlots) q.set("s1", app.viewData.encodedSlots);
      location.search = q.toString();
    });

    $("tglTitles").addEventListener("change", async () => { await send({ type: "TOGGLE_TITLES" }); render(); });
    $("tglLvls").addEventListener("change", async () => { await send({ type: "TOGGLE_LVLS" }); render(); });
    $("tglDetails").addEventListener("change", async () => { await send({ type: "TOGGLE_DETAILS" }); render(); });

    $("btnCopy").addEventListener("click", async () => {
      syncUrl();
      try{
        await navigator.clipboard.writeText(location.href);
        toast("link copied");
      }catch(_e){
        toast(location.href);
      }
    });

    $("btnEdit").addEventListener("click", async () => { await send({ type: "EDIT_LAYOUT" }); render(); });
    $("btnCancel").addEventListener("click", async () => { await send({ type: "CANCEL_EDITS" }); render(); });

    $("btnSave").addEventListener("click", () => {
      $("saveForm").classList.toggle("open");
    });

    $("btnPublish").addEventListener("click", async () => {
      await publish(app.viewData.id);
      await send({ type: "PUBLISH_LAYOUT" });
      render();
    });

    $("saveForm").addEventListener("submit", async (ev) => {
      ev.preventDefault();
      const id = await publish(null);
      if (id != null) location.href = `/job/${jobAbbr}/${id}`;
    });

    async function publish(existingId){
      const body = {
        method: "save",
        id: existingId,
        title: existingId != null ? (app.viewData.title || "untitled") : $("fTitle").value,
        description: existingId != null ? (app.viewData.description || "") : $("fDesc").value,
        jobId: jobAbbr,
        isPvp: !!app.viewData.isPvp,
        layout: app.viewData.layout || 0,
        encodedSlots: app.viewData.encodedSlots || "",
        author: $("fAuthor").value || null,
      };
      const r = await fetch("/api/layout", {
        method: "POST",
        headers: { "content-type": "application/json" },
        body: JSON.stringify(body),
      });
      if (!r.ok){
        toast("save failed");
        return null;
      }
      const rec = await r.json();
      app.viewData = Object.assign({}, app.viewData, {
        id: rec.id, title: rec.title, description: rec.description,
      });
      toast("layout saved");
      return rec.id;
    }

    loadView();
  })();
  </script>
</body>
</html>
"###;
