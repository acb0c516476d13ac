/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use dreampip_api::{app::{build_router, AppState}, config::Config};
/// use dreampip_shared::budget::PgBudgetStore;
/// use sqlx::PgPool;
/// use std::sync::Arc;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(Arc::new(PgBudgetStore::new(pool)), config);
/// let app = build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, error::ApiError, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Router,
};
use dreampip_shared::auth::context::authenticate;
use dreampip_shared::budget::{BudgetLedger, BudgetStore, SettingsService, TaskListService};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned into each handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BudgetStore>,

    pub ledger: BudgetLedger,

    pub task_lists: TaskListService,

    pub settings: SettingsService,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn BudgetStore>, config: Config) -> Self {
        let task_lists = TaskListService::new(store.clone());
        Self {
            ledger: task_lists.ledger().clone(),
            settings: SettingsService::new(store.clone()),
            task_lists,
            store,
            config: Arc::new(config),
        }
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET /health                      # public
/// └── /v1/                             # bearer token required
///     ├── GET    /budget
///     ├── GET    /budget/remaining
///     ├── POST   /budget/validate
///     ├── POST   /budget/recalculate
///     ├── GET    /task-lists
///     ├── POST   /task-lists
///     ├── GET    /task-lists/invites
///     ├── GET    /task-lists/:id
///     ├── PATCH  /task-lists/:id
///     ├── DELETE /task-lists/:id
///     ├── POST   /task-lists/:id/invites
///     ├── POST   /task-lists/:id/accept
///     ├── POST   /task-lists/:id/decline
///     ├── GET    /settings
///     └── PUT    /settings
/// ```
pub fn build_router(state: AppState) -> Router {
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    let v1_routes = Router::new()
        .route("/budget", get(routes::budget::get_summary))
        .route("/budget/remaining", get(routes::budget::get_remaining))
        .route("/budget/validate", post(routes::budget::validate))
        .route("/budget/recalculate", post(routes::budget::recalculate))
        .route(
            "/task-lists",
            get(routes::task_lists::list_task_lists).post(routes::task_lists::create_task_list),
        )
        .route("/task-lists/invites", get(routes::task_lists::list_invites))
        .route(
            "/task-lists/:id",
            get(routes::task_lists::get_task_list)
                .patch(routes::task_lists::update_task_list)
                .delete(routes::task_lists::delete_task_list),
        )
        .route(
            "/task-lists/:id/invites",
            post(routes::task_lists::invite_co_owner),
        )
        .route("/task-lists/:id/accept", post(routes::task_lists::accept_invite))
        .route("/task-lists/:id/decline", post(routes::task_lists::decline_invite))
        .route(
            "/settings",
            get(routes::settings::get_settings).put(routes::settings::replace_settings),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    if config.allows_any_origin() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Validates the bearer token and injects `AuthContext` into the request
async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let auth_context = authenticate(auth_header, state.jwt_secret())?;
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
