#![cfg(feature = "web")]
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use log::{info, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::config::DashboardConfig;
use crate::downloader;
use crate::filter::apply_filter;
use crate::graph;
use crate::pipeline::{DemoReport, SalesData, SalesReport};
use crate::session::{Event, Page, Render, RenderContext, SessionState, SessionStore, render, step};

const SESSION_COOKIE: &str = "session";
const PURGE_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Shared server state: the sales data loaded at startup and every session
pub struct AppState {
    pub config: DashboardConfig,
    pub sales: SalesData,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: DashboardConfig, sales: SalesData) -> Self {
        let sessions = SessionStore::new(Duration::from_secs(config.session_ttl_secs));
        AppState {
            config,
            sales,
            sessions,
        }
    }

    fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            sales: &self.sales,
            histogram_samples: self.config.histogram_samples,
            histogram_bins: self.config.histogram_bins,
        }
    }

    // Session id from the cookie, or a fresh session when absent or expired
    fn session(&self, jar: CookieJar) -> (CookieJar, String, SessionState) {
        let cookie_id = jar.get(SESSION_COOKIE).map(|c| c.value().to_string());
        let (id, state) = self.sessions.get_or_create(cookie_id.as_deref(), || {
            SessionState::initial(&self.sales.options())
        });

        let jar = if cookie_id.as_deref() == Some(id.as_str()) {
            jar
        } else {
            let mut cookie = Cookie::new(SESSION_COOKIE, id.clone());
            cookie.set_path("/");
            cookie.set_http_only(true);
            jar.add(cookie)
        };
        (jar, id, state)
    }
}

#[derive(Serialize)]
struct PageResponse {
    #[serde(flatten)]
    render: Render,
    /// SVG documents keyed by chart name
    charts: BTreeMap<&'static str, String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: String,
    message: String,
}

/// Load the sales file and serve the dashboard
///
/// A load failure does not stop the server: the sales page reports it and
/// the demo page keeps working.
pub async fn run(config: DashboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let sales = SalesData::load(&config.data_path);
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config, sales));

    let purge_state = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            let removed = purge_state.sessions.purge_expired();
            if removed > 0 {
                info!("Purged {} expired sessions", removed);
            }
        }
    });

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    axum::serve(listener, router(state)).await?;

    Ok(())
}

/// Builds the HTTP routes over a shared state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(serve_dashboard))
        .route("/api/sales", get(get_sales))
        .route("/api/sales/event", post(post_sales_event))
        .route("/api/sales/export.csv", get(export_csv))
        .route("/api/sales/export.xlsx", get(export_xlsx))
        .route("/api/demo", get(get_demo))
        .route("/api/demo/event", post(post_demo_event))
        .with_state(state)
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

async fn get_sales(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, _, session) = state.session(jar);
    let options = state.sales.options();
    let render = render(
        &session,
        Page::Sales,
        &state.render_context(),
        &mut rand::thread_rng(),
        options,
        None,
    );
    (jar, page_response(render)).into_response()
}

async fn get_demo(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, _, session) = state.session(jar);
    let options = state.sales.options();
    let render = render(
        &session,
        Page::Demo,
        &state.render_context(),
        &mut rand::thread_rng(),
        options,
        None,
    );
    (jar, page_response(render)).into_response()
}

async fn post_sales_event(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(event): Json<Event>,
) -> Response {
    apply_event(&state, jar, &event, Page::Sales)
}

async fn post_demo_event(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(event): Json<Event>,
) -> Response {
    apply_event(&state, jar, &event, Page::Demo)
}

// Each route only accepts events for its own page.
fn apply_event(state: &AppState, jar: CookieJar, event: &Event, page: Page) -> Response {
    if event.page() != page {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                status: "error".to_string(),
                message: format!("event does not belong to the {:?} page", page),
            }),
        )
            .into_response();
    }

    let (jar, id, _) = state.session(jar);
    let ctx = state.render_context();
    let render = state.sessions.update(
        &id,
        || SessionState::initial(&state.sales.options()),
        |session| step(session, event, &ctx, &mut rand::thread_rng()),
    );
    (jar, page_response(render)).into_response()
}

async fn export_csv(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, _, session) = state.session(jar);
    let table = match &state.sales {
        SalesData::Loaded { table, .. } => table,
        SalesData::Failed { message } => return (jar, unavailable(message)).into_response(),
    };

    match downloader::to_csv(&apply_filter(table, &session.selection)) {
        Ok(csv) => (
            jar,
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"sellers_filtered.csv\""),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (jar, internal_error(e.to_string())).into_response(),
    }
}

async fn export_xlsx(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, _, session) = state.session(jar);
    let table = match &state.sales {
        SalesData::Loaded { table, .. } => table,
        SalesData::Failed { message } => return (jar, unavailable(message)).into_response(),
    };

    match downloader::to_xlsx(&apply_filter(table, &session.selection)) {
        Ok(bytes) => (
            jar,
            [
                (
                    header::CONTENT_TYPE,
                    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
                ),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"sellers_filtered.xlsx\""),
            ],
            bytes,
        )
            .into_response(),
        Err(e) => (jar, internal_error(e.to_string())).into_response(),
    }
}

fn page_response(render: Render) -> Response {
    if let Some(message) = &render.load_error {
        return unavailable(message);
    }

    let mut charts = BTreeMap::new();
    if let Some(report) = &render.sales {
        add_sales_charts(report, &mut charts);
    }
    if let Some(report) = &render.demo {
        add_demo_charts(report, &mut charts);
    }

    Json(PageResponse { render, charts }).into_response()
}

// A chart that fails to draw is left out; the rest of the page still renders.
fn add_sales_charts(report: &SalesReport, charts: &mut BTreeMap<&'static str, String>) {
    if report.groups.is_empty() {
        return;
    }
    match graph::render_vendor_charts(&report.groups) {
        Ok(vendor) => {
            charts.insert("units", vendor.units);
            charts.insert("total_sales", vendor.total_sales);
            charts.insert("average_sales", vendor.average_sales);
        }
        Err(e) => warn!("Vendor charts failed to render: {}", e),
    }
}

fn add_demo_charts(report: &DemoReport, charts: &mut BTreeMap<&'static str, String>) {
    match graph::render_column_bars(&report.numbers) {
        Ok(svg) => {
            charts.insert("columns", svg);
        }
        Err(e) => warn!("Column chart failed to render: {}", e),
    }
    match graph::render_histogram(&report.histogram) {
        Ok(svg) => {
            charts.insert("histogram", svg);
        }
        Err(e) => warn!("Histogram failed to render: {}", e),
    }
}

fn unavailable(message: &str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse {
            status: "error".to_string(),
            message: message.to_string(),
        }),
    )
        .into_response()
}

fn internal_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            status: "error".to_string(),
            message,
        }),
    )
        .into_response()
}
