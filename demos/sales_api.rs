//! A small sales API wired with the sistemav middleware stack.
//!
//! ```sh
//! cargo run --example sales_api
//! curl 'http://127.0.0.1:3000/api/sales?page=1&limit=5'
//! curl 'http://127.0.0.1:3000/api/ranking?start=2024-06-01T00:00:00Z&end=2024-06-30T23:59:59Z'
//! ```

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sistemav::{
    cache::MemoryCache,
    config::SistemaConfig,
    middleware::{self, cache::Invalidation, validate_json, RateLimiter, ResponseCache},
    model::SaleInput,
    observability::LogMetrics,
    repository::InMemorySource,
    Attendant, CommissionRule, CommissionService, CommissionSource, Error, Money, PageParams,
    RuleType, Sale,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Mutable store shared by the handlers.
#[derive(Default)]
struct DemoStore {
    inner: RwLock<InMemorySource>,
}

impl CommissionSource for DemoStore {
    async fn fetch_sales(&self) -> sistemav::Result<Vec<Sale>> {
        self.inner.read().await.fetch_sales().await
    }

    async fn fetch_attendants(&self) -> sistemav::Result<Vec<Attendant>> {
        self.inner.read().await.fetch_attendants().await
    }

    async fn fetch_rules(&self) -> sistemav::Result<Vec<CommissionRule>> {
        self.inner.read().await.fetch_rules().await
    }
}

#[derive(Clone)]
struct AppState {
    service: CommissionService<DemoStore>,
    store: Arc<DemoStore>,
    next_id: Arc<AtomicU64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SalesQuery {
    attendant_id: Option<String>,
}

#[derive(Deserialize)]
struct PeriodQuery {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl PeriodQuery {
    /// Defaults to the last 30 days.
    fn range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.end.unwrap_or_else(Utc::now);
        let start = self.start.unwrap_or(end - Duration::days(30));
        (start, end)
    }
}

fn error_response(e: Error) -> Response {
    let status = if e.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(json!({ "error": e.to_string() }))).into_response()
}

async fn list_sales(
    State(state): State<AppState>,
    params: PageParams,
    Query(query): Query<SalesQuery>,
) -> Response {
    match state
        .service
        .list_sales(params, query.attendant_id.as_deref())
        .await
    {
        Ok(page) => page.into_response(),
        Err(e) => error_response(e),
    }
}

async fn create_sale(State(state): State<AppState>, Json(input): Json<SaleInput>) -> Response {
    let id = state.next_id.fetch_add(1, Ordering::Relaxed).to_string();
    let mut sale = Sale::new(id, input.attendant_id, input.value, Utc::now());
    sale.client_name = input.client_name;
    sale.client_email = input.client_email;
    sale.client_phone = input.client_phone;

    let mut store = state.store.inner.write().await;
    store.insert_sale(sale.clone());
    (StatusCode::CREATED, Json(sale)).into_response()
}

async fn sale_commission(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.service.commission_for_sale(&id).await {
        Ok(Some(calc)) => Json(calc).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "No commission for this sale" })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

async fn period_commissions(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Response {
    let (start, end) = query.range();
    match state.service.period_commissions(start, end).await {
        Ok(totals) => Json(totals).into_response(),
        Err(e) => error_response(e),
    }
}

async fn ranking(State(state): State<AppState>, Query(query): Query<PeriodQuery>) -> Response {
    let (start, end) = query.range();
    match state.service.ranking(start, end).await {
        Ok(board) => Json(board).into_response(),
        Err(e) => error_response(e),
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": "sistemav-sales-api",
        "version": sistemav::VERSION
    }))
}

fn seed() -> InMemorySource {
    let now = Utc::now();
    let rules = vec![
        CommissionRule::new("r1", "Meta mensal", RuleType::Tiered, Decimal::new(5, 0))
            .with_targets(Some(Decimal::new(1500, 0)), None)
            .with_bonus(Decimal::new(2, 0)),
        CommissionRule::new("r2", "Padrão", RuleType::Percentage, Decimal::new(5, 0)),
    ];
    let sales = (1..=12)
        .map(|n| {
            let attendant = if n % 3 == 0 { "a2" } else { "a1" };
            let value = Money::new(Decimal::new(250 * n, 0));
            Sale::new(n.to_string(), attendant, value.to_string(), now - Duration::days(n))
        })
        .collect();

    InMemorySource::new()
        .with_attendants(vec![
            Attendant::new("a1", "Maria Souza", "12500.00"),
            Attendant::new("a2", "João Lima", "3400.00"),
        ])
        .with_rules(rules)
        .with_sales(sales)
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init()
        .ok();

    let config = match SistemaConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(DemoStore {
        inner: RwLock::new(seed()),
    });
    let state = AppState {
        service: CommissionService::from_arc(Arc::clone(&store)),
        store,
        next_id: Arc::new(AtomicU64::new(100)),
    };

    let cache = MemoryCache::with_metrics(config.cache, Box::new(LogMetrics));
    let limiter = RateLimiter::new(config.rate_limit);

    let api = Router::new()
        .route(
            "/api/sales",
            get(list_sales)
                .post(create_sale)
                .route_layer(from_fn(validate_json::<SaleInput>)),
        )
        .route("/api/sales/{id}/commission", get(sale_commission))
        .route("/api/commissions", get(period_commissions))
        .route("/api/ranking", get(ranking))
        .route("/health", get(health))
        .with_state(state);

    // Ranking and period totals are derived from sales, so a new sale has to
    // drop them as well as the /api/sales pages.
    let responses = ResponseCache::new(cache).with_invalidation(Invalidation::All);
    let app = middleware::apply(api, responses, limiter);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:3000")
        .await
        .expect("Failed to bind port 3000");

    println!("Server running on http://127.0.0.1:3000");
    println!("Sales: http://127.0.0.1:3000/api/sales?page=1&limit=5");
    println!("Ranking: http://127.0.0.1:3000/api/ranking");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}
