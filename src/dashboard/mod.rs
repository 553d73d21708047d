use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::model::{seed, Competition, Factor, ModelError, PredictionModel, FILTER_ALL};

/// One dashboard session: a single model behind a lock.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<RwLock<PredictionModel>>,
}

impl AppState {
    pub fn new(model: PredictionModel) -> Self {
        Self {
            model: Arc::new(RwLock::new(model)),
        }
    }
}

/// Build the Axum router for the dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/state", get(state_handler))
        .route("/api/factors/:id", put(set_factor_handler))
        .route("/api/reset", post(reset_handler))
        .route("/api/chart", get(chart_handler))
        .route("/api/export", get(export_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiError = (StatusCode, String);

fn api_error(err: ModelError) -> ApiError {
    let status = if err.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, err.to_string())
}

/// Everything the page needs to redraw cards, sliders and the header.
#[derive(Debug, Serialize)]
pub struct StateView {
    pub season: String,
    pub competitions: Vec<Competition>,
    pub factors: Vec<Factor>,
    pub overall_probability: f64,
    pub most_likely: Option<String>,
    pub form_score: f64,
}

impl From<&PredictionModel> for StateView {
    fn from(model: &PredictionModel) -> Self {
        Self {
            season: model.season().to_string(),
            competitions: model.competitions().to_vec(),
            factors: model.factors().to_vec(),
            overall_probability: model.overall_probability(),
            most_likely: model
                .most_likely_competition()
                .map(|c| c.name().to_string()),
            form_score: model.current_form_score(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct FactorUpdate {
    pub value: f64,
}

#[derive(Debug, Deserialize)]
pub struct ChartQuery {
    pub filter: Option<String>,
}

/// Escape text for use inside a double-quoted HTML attribute.
fn escape_attr(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Serve the dashboard HTML page, injecting the season label.
async fn index_handler(State(state): State<AppState>) -> impl IntoResponse {
    let model = state.model.read().await;
    let html = DASHBOARD_HTML.replace(
        r#"<body>"#,
        &format!(r#"<body data-season="{}">"#, escape_attr(model.season())),
    );
    Html(html)
}

/// GET /api/state
async fn state_handler(State(state): State<AppState>) -> Json<StateView> {
    let model = state.model.read().await;
    Json(StateView::from(&*model))
}

/// PUT /api/factors/:id  {"value": 7.5}
async fn set_factor_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<FactorUpdate>,
) -> Result<Json<StateView>, ApiError> {
    let mut model = state.model.write().await;
    model.set_factor_value(&id, update.value).map_err(api_error)?;
    model.recompute();
    Ok(Json(StateView::from(&*model)))
}

/// POST /api/reset
async fn reset_handler(State(state): State<AppState>) -> Json<StateView> {
    let mut model = state.model.write().await;
    model.reset();
    Json(StateView::from(&*model))
}

/// GET /api/chart?filter=all
async fn chart_handler(
    State(state): State<AppState>,
    Query(query): Query<ChartQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = query.filter.as_deref().unwrap_or(FILTER_ALL);
    state
        .model
        .read()
        .await
        .chart_series(filter)
        .map(Json)
        .map_err(api_error)
}

/// GET /api/export
async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.model.read().await.export_snapshot();
    info!("Exported report ({} overall)", snapshot.overall_trophy_probability);
    (
        [(
            header::CONTENT_DISPOSITION,
            format!(r#"attachment; filename="{}""#, seed::DEFAULT_EXPORT_FILE),
        )],
        Json(snapshot),
    )
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Cup Predictions</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #dc143c;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  .highlight { margin-left: auto; font-size: 1.6rem; font-weight: 700; color: var(--accent); }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; }
  .cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(180px, 1fr)); gap: 1rem; }
  .card { background: var(--card); border: 2px solid var(--border); border-radius: 10px; padding: 1.2rem; cursor: pointer; }
  .card.active { border-color: var(--accent); }
  .card .label { color: var(--muted); font-size: .8rem; text-transform: uppercase; margin-bottom: .4rem; }
  .card .value { font-size: 1.7rem; font-weight: 700; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; padding: 1rem 1.2rem; }
  .panel h2 { font-size: 1rem; margin-bottom: .8rem; display: flex; justify-content: space-between; }
  .slider { display: grid; grid-template-columns: 10rem 1fr 3rem; gap: .8rem; align-items: center; margin: .4rem 0; }
  canvas { width: 100% !important; }
  button { background: none; border: 1px solid var(--border); color: var(--muted); padding: .3rem .8rem; border-radius: 6px; cursor: pointer; font-size: .8rem; }
  button:hover, button.active { border-color: var(--accent); color: var(--accent); }
</style>
</head>
<body>
<header>
  <h1>Cup Predictions <span id="season"></span></h1>
  <span class="highlight" id="overall">–</span>
</header>
<main>
  <div class="cards" id="cards"></div>
  <div class="panel">
    <h2>Win Probability <span id="filters"></span></h2>
    <canvas id="chart" height="200"></canvas>
  </div>
  <div class="panel">
    <h2>Form Factors <span><button onclick="reset()">Reset</button> <a href="/api/export" download><button>Export</button></a></span></h2>
    <div id="sliders"></div>
  </div>
  <div class="panel">
    <h2>Insights</h2>
    <p>Most likely: <strong id="most-likely">–</strong> · Form score: <strong id="form-score">–</strong></p>
  </div>
</main>
<script>
let filter = 'all';
const pct = p => Math.round(p * 100) + '%';

function el(tag, cls, text) {
  const node = document.createElement(tag);
  if (cls) node.className = cls;
  if (text !== undefined) node.textContent = text;
  return node;
}

function render(s) {
  document.getElementById('overall').textContent = pct(s.overall_probability);
  document.getElementById('most-likely').textContent = s.most_likely || '–';
  document.getElementById('form-score').textContent = s.form_score.toFixed(1) + '/10';
  document.getElementById('cards').replaceChildren(...s.competitions.map(c => {
    const card = el('div', 'card' + (filter === c.id ? ' active' : ''));
    card.append(el('div', 'label', c.name), el('div', 'value', pct(c.current_probability)));
    card.addEventListener('click', () => setFilter(c.id));
    return card;
  }));
  document.getElementById('filters').replaceChildren(...['all', ...s.competitions.map(c => c.id)].map(f => {
    const btn = el('button', f === filter ? 'active' : '', f);
    btn.addEventListener('click', () => setFilter(f));
    return btn;
  }));
  const sliders = document.getElementById('sliders');
  if (!sliders.children.length) {
    s.factors.forEach(f => {
      const row = el('div', 'slider');
      const input = el('input');
      Object.assign(input, { type: 'range', min: 0, max: 10, step: 0.1, value: f.current_value });
      input.dataset.id = f.id;
      input.addEventListener('input', onSlide);
      row.append(el('label', '', f.id), input, el('span', '', f.current_value.toFixed(1)));
      sliders.append(row);
    });
  } else {
    const inputs = [...sliders.querySelectorAll('input')];
    s.factors.forEach(f => {
      const input = inputs.find(i => i.dataset.id === f.id);
      if (!input) return;
      input.value = f.current_value;
      input.nextElementSibling.textContent = f.current_value.toFixed(1);
    });
  }
  loadChart();
}

async function onSlide(e) {
  const r = await fetch('/api/factors/' + encodeURIComponent(e.target.dataset.id), {
    method: 'PUT', headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify({ value: parseFloat(e.target.value) }),
  });
  if (r.ok) render(await r.json());
}

async function reset() {
  const r = await fetch('/api/reset', { method: 'POST' });
  if (r.ok) render(await r.json());
}

async function setFilter(f) {
  filter = f;
  const r = await fetch('/api/state');
  if (r.ok) render(await r.json());
}

async function loadChart() {
  const r = await fetch('/api/chart?filter=' + encodeURIComponent(filter));
  if (!r.ok) return;
  const { labels, data } = await r.json();
  const canvas = document.getElementById('chart');
  const ctx = canvas.getContext('2d');
  const W = canvas.width = canvas.parentElement.clientWidth - 32;
  const H = canvas.height;
  ctx.clearRect(0, 0, W, H);
  const slot = W / Math.max(labels.length, 1);
  labels.forEach((label, i) => {
    const h = (data[i] / 50) * (H - 30);
    ctx.fillStyle = '#dc143c';
    ctx.fillRect(i * slot + slot * 0.2, H - 20 - h, slot * 0.6, h);
    ctx.fillStyle = '#e0e0e0';
    ctx.fillText(`${label} ${data[i]}%`, i * slot + slot * 0.2, H - 5);
  });
}

document.getElementById('season').textContent = document.body.dataset.season || '';
setFilter('all');
</script>
</body>
</html>"#;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn app() -> Router {
        router(AppState::new(PredictionModel::seeded(seed::SEASON)))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, value)
    }

    fn get_req(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn put_factor(id: &str, value: f64) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(format!("/api/factors/{}", id))
            .header("content-type", "application/json")
            .body(Body::from(format!(r#"{{"value": {}}}"#, value)))
            .unwrap()
    }

    #[tokio::test]
    async fn state_starts_at_seed() {
        let (status, body) = send(&app(), get_req("/api/state")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["season"], "2025-26");
        assert_eq!(body["competitions"].as_array().unwrap().len(), 4);
        assert_eq!(body["most_likely"], "Premier League");
    }

    #[tokio::test]
    async fn factor_update_recomputes_and_persists() {
        let app = app();
        let (status, body) = send(&app, put_factor("squad-quality", 0.0)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["factors"][0]["current_value"], 0.0);

        let (_, state) = send(&app, get_req("/api/state")).await;
        let pl = state["competitions"][0]["current_probability"].as_f64().unwrap();
        assert!(pl < 0.25, "expected lower probability, got {:.4}", pl);
    }

    #[tokio::test]
    async fn unknown_factor_is_404() {
        let (status, _) = send(&app(), put_factor("luck", 5.0)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reset_restores_base() {
        let app = app();
        send(&app, put_factor("recent-form", 10.0)).await;
        let req = Request::builder()
            .method("POST")
            .uri("/api/reset")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["competitions"][0]["current_probability"], 0.25);
        assert_eq!(body["factors"][3]["current_value"], 8.2);
    }

    #[tokio::test]
    async fn chart_filters() {
        let app = app();
        let (_, all) = send(&app, get_req("/api/chart")).await;
        assert_eq!(all["data"], serde_json::json!([25, 18, 12, 8]));

        let (_, single) = send(&app, get_req("/api/chart?filter=fa-cup")).await;
        assert_eq!(single["labels"], serde_json::json!(["FA Cup"]));

        let (status, _) = send(&app, get_req("/api/chart?filter=nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn export_is_attachment_with_report_shape() {
        let resp = app().oneshot(get_req("/api/export")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp.headers()[header::CONTENT_DISPOSITION].to_str().unwrap();
        assert!(disposition.contains("arsenal-cup-predictions.json"));

        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["season"], "2025-26");
        assert_eq!(body["competitions"]["champions-league"]["difficulty"], "5/5");
        assert_eq!(body["insights"]["mostLikelyWin"], "Premier League");
    }

    #[tokio::test]
    async fn index_injects_season() {
        let resp = app().oneshot(get_req("/")).await.unwrap();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(r#"data-season="2025-26""#));
    }

    #[tokio::test]
    async fn index_escapes_season() {
        let app = router(AppState::new(PredictionModel::seeded(
            r#"2025"><script>alert(1)</script>"#,
        )));
        let resp = app.oneshot(get_req("/")).await.unwrap();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(html.contains(
            r#"data-season="2025&quot;&gt;&lt;script&gt;alert(1)&lt;/script&gt;""#
        ));
        assert!(!html.contains("<script>alert(1)"));
    }

    #[test]
    fn escape_attr_covers_markup_characters() {
        assert_eq!(escape_attr(r#"a&b"c'd<e>f"#), "a&amp;b&quot;c&#39;d&lt;e&gt;f");
        assert_eq!(escape_attr("2025-26"), "2025-26");
    }
}
