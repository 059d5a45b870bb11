use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::error::GraphError;
use crate::expansion::{ExpansionState, NodeKey};
use crate::explorer::Explorer;
use crate::hierarchy::TreeDescription;
use crate::model::{Entity, EntityKind, EntityRef};
use crate::stats::StoreStats;

#[derive(Clone)]
struct AppState {
    explorer: Arc<Mutex<Explorer>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CreateRequest {
    name: String,
    #[serde(default)]
    link: Option<EntityRef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RenameRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LinkRequest {
    from: EntityRef,
    to: EntityRef,
}

struct JsonBody<T>(T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> ApiResult<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Default, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Default, Deserialize)]
struct HierarchyQuery {
    #[serde(default)]
    expand: Option<String>,
}

#[derive(Debug, Serialize)]
struct LinkBody {
    changed: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(error: anyhow::Error) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: error_details(&error),
        }
    }
}

impl From<GraphError> for ApiError {
    fn from(error: GraphError) -> Self {
        Self {
            status: status_code_for_error(&error),
            message: error.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(
            status = self.status.as_u16(),
            error = %self.message,
            "HTTP request failed"
        );
        let body = ErrorBody {
            error: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

pub fn router(explorer: Explorer) -> Router {
    let state = AppState {
        explorer: Arc::new(Mutex::new(explorer)),
    };
    Router::new()
        .route("/health", get(handle_health))
        .route("/stats", get(handle_stats))
        .route(
            "/entities/:kind",
            get(handle_list_entities).post(handle_create_entity),
        )
        .route(
            "/entities/:kind/:id",
            get(handle_get_entity)
                .patch(handle_rename_entity)
                .delete(handle_delete_entity),
        )
        .route("/links", post(handle_link).delete(handle_unlink))
        .route("/hierarchy/:kind/:id", get(handle_hierarchy))
        .with_state(state)
}

pub async fn run_http_server(explorer: Explorer, bind: &str) -> Result<()> {
    let stats = StoreStats::collect(explorer.store());
    let app = router(explorer);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind HTTP server to `{bind}`"))?;
    let local_addr = listener.local_addr().ok();

    info!(
        users = stats.users,
        user_groups = stats.user_groups,
        roles = stats.roles,
        requested_bind = %bind,
        bound_addr = local_addr.map(|addr| addr.to_string()),
        "starting HTTP server"
    );

    axum::serve(listener, app)
        .await
        .context("HTTP server exited with an error")
}

async fn handle_health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn handle_stats(State(state): State<AppState>) -> Json<StoreStats> {
    Json(state.explorer.lock().await.stats())
}

async fn handle_list_entities(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Vec<Entity>>> {
    let kind = parse_kind(&kind)?;
    let explorer = state.explorer.lock().await;
    let entities = explorer
        .filter_by_name(kind, &query.q)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(entities))
}

async fn handle_get_entity(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Json<Entity>> {
    let kind = parse_kind(&kind)?;
    let explorer = state.explorer.lock().await;
    Ok(Json(explorer.resolve(kind, &id)?.clone()))
}

async fn handle_create_entity(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    JsonBody(req): JsonBody<CreateRequest>,
) -> ApiResult<(StatusCode, Json<Entity>)> {
    let kind = parse_kind(&kind)?;
    let mut explorer = state.explorer.lock().await;
    let id = explorer.create(kind, &req.name, req.link.as_ref())?;
    let entity = explorer.resolve(kind, &id)?.clone();
    Ok((StatusCode::CREATED, Json(entity)))
}

async fn handle_rename_entity(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    JsonBody(req): JsonBody<RenameRequest>,
) -> ApiResult<Json<Entity>> {
    let kind = parse_kind(&kind)?;
    let mut explorer = state.explorer.lock().await;
    explorer.rename(kind, &id, &req.name)?;
    Ok(Json(explorer.resolve(kind, &id)?.clone()))
}

async fn handle_delete_entity(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = parse_kind(&kind)?;
    state.explorer.lock().await.delete(kind, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn handle_link(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LinkRequest>,
) -> ApiResult<Json<LinkBody>> {
    let changed = state.explorer.lock().await.link(&req.from, &req.to)?;
    Ok(Json(LinkBody { changed }))
}

async fn handle_unlink(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LinkRequest>,
) -> ApiResult<Json<LinkBody>> {
    let changed = state.explorer.lock().await.unlink(&req.from, &req.to)?;
    Ok(Json(LinkBody { changed }))
}

async fn handle_hierarchy(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<HierarchyQuery>,
) -> ApiResult<Json<TreeDescription>> {
    let kind = parse_kind(&kind)?;
    let expansion = parse_expand(query.expand.as_deref())?;
    let explorer = state.explorer.lock().await;
    Ok(Json(explorer.build_hierarchy(kind, &id, &expansion)?))
}

fn parse_kind(raw: &str) -> ApiResult<EntityKind> {
    raw.parse::<EntityKind>().map_err(ApiError::bad_request)
}

fn parse_expand(raw: Option<&str>) -> ApiResult<ExpansionState> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| key.parse::<NodeKey>())
        .collect::<Result<ExpansionState>>()
        .map_err(ApiError::bad_request)
}

fn error_details(error: &anyhow::Error) -> String {
    error
        .chain()
        .map(std::string::ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ")
}

fn status_code_for_error(error: &GraphError) -> StatusCode {
    match error {
        GraphError::NotFound { .. } => StatusCode::NOT_FOUND,
        GraphError::Protected { .. } => StatusCode::CONFLICT,
        error if error.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
