// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! HTTP API for shared lists
//!
//! JSON surface over the list service plus a WebSocket stream of
//! snapshot updates. Household clients and the maintenance endpoint
//! both come through here.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, Query, State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

use crate::config::AppConfig;
use crate::model::{Category, ItemStatus, ListSnapshot, Section, SnapshotPatch};
use crate::service::{AddedItem, ListService};
use crate::store::StoreStats;
use crate::sweep::SweepSummary;
use crate::DespensaError;

/// Shared application state
pub struct AppState {
    pub service: ListService,
    pub config: AppConfig,
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Maintenance
        .route("/reclassify-others", post(api_reclassify_others))
        // List API
        .route("/api/lists/:id", get(api_get_list).patch(api_patch_list))
        .route("/api/lists/:id/items", post(api_add_item))
        .route("/api/lists/:id/items/:item_id", delete(api_delete_item))
        .route("/api/lists/:id/items/:item_id/status", post(api_set_status))
        .route("/api/lists/:id/items/:item_id/push", post(api_push_item))
        .route("/api/lists/:id/items/:item_id/check-off", post(api_check_off))
        .route("/api/lists/:id/items/:item_id/return", post(api_return_item))
        .route("/api/lists/:id/items/:item_id/buy-later", post(api_set_buy_later))
        .route("/api/lists/:id/items/:item_id/frozen", post(api_set_frozen))
        .route("/api/lists/:id/stats", get(api_list_stats))
        .route("/api/lists/:id/watch", get(api_watch_list))
        .route("/api/stats", get(api_get_stats))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

// === Error Mapping ===

/// Maps service errors onto HTTP statuses.
struct ApiError(DespensaError);

impl From<DespensaError> for ApiError {
    fn from(e: DespensaError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DespensaError::ListNotFound(_) | DespensaError::ItemNotFound(_) => {
                StatusCode::NOT_FOUND
            }
            DespensaError::InvalidName(_) | DespensaError::InvalidTransition(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        }
        let body = serde_json::json!({ "message": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

// === Maintenance Handlers ===

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ReclassifyRequest {
    list_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReclassifyResponse {
    message: String,
    summary: SweepSummary,
}

/// Re-resolve every catch-all item of a stored list.
///
/// The body is optional; without one the configured shared list is
/// swept. A list that was never written is a 404, not an empty sweep.
async fn api_reclassify_others(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ReclassifyRequest>>,
) -> Result<Json<ReclassifyResponse>, ApiError> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let list_id = request
        .list_id
        .unwrap_or_else(|| state.config.lists.default_list_id.clone());

    let summary = state.service.reclassify(&list_id, true).await?;
    let message = format!(
        "Reclassified {} of {} catch-all items in '{}'",
        summary.updated, summary.candidates, list_id
    );
    Ok(Json(ReclassifyResponse { message, summary }))
}

// === List API Handlers ===

async fn api_get_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListSnapshot>, ApiError> {
    Ok(Json(state.service.snapshot(&id).await?))
}

async fn api_patch_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(patch): Json<SnapshotPatch>,
) -> Result<Json<ListSnapshot>, ApiError> {
    state.service.apply_patch(&id, patch).await?;
    Ok(Json(state.service.snapshot(&id).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddItemRequest {
    name: String,
    category: Option<Category>,
    status: Option<ItemStatus>,
    #[serde(default)]
    section: Section,
}

async fn api_add_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<AddedItem>), ApiError> {
    let added = state
        .service
        .add_item(
            &id,
            &request.name,
            request.category,
            request.status,
            request.section,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(added)))
}

#[derive(Deserialize)]
struct SectionQuery {
    #[serde(default)]
    section: Section,
}

async fn api_delete_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
    Query(query): Query<SectionQuery>,
) -> Result<Json<ListSnapshot>, ApiError> {
    state.service.remove_item(&id, query.section, &item_id).await?;
    Ok(Json(state.service.snapshot(&id).await?))
}

#[derive(Deserialize)]
struct StatusRequest {
    status: ItemStatus,
}

async fn api_set_status(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<ListSnapshot>, ApiError> {
    state.service.set_status(&id, &item_id, request.status).await?;
    Ok(Json(state.service.snapshot(&id).await?))
}

async fn api_push_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<ListSnapshot>, ApiError> {
    state.service.push_to_shopping(&id, &item_id).await?;
    Ok(Json(state.service.snapshot(&id).await?))
}

async fn api_check_off(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<ListSnapshot>, ApiError> {
    state.service.check_off(&id, &item_id).await?;
    Ok(Json(state.service.snapshot(&id).await?))
}

async fn api_return_item(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
) -> Result<Json<ListSnapshot>, ApiError> {
    state.service.return_to_pantry(&id, &item_id).await?;
    Ok(Json(state.service.snapshot(&id).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BuyLaterRequest {
    buy_later: bool,
}

async fn api_set_buy_later(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(request): Json<BuyLaterRequest>,
) -> Result<Json<ListSnapshot>, ApiError> {
    state
        .service
        .set_buy_later(&id, &item_id, request.buy_later)
        .await?;
    Ok(Json(state.service.snapshot(&id).await?))
}

#[derive(Deserialize)]
struct FrozenRequest {
    frozen: bool,
}

async fn api_set_frozen(
    State(state): State<Arc<AppState>>,
    Path((id, item_id)): Path<(String, String)>,
    Json(request): Json<FrozenRequest>,
) -> Result<Json<ListSnapshot>, ApiError> {
    state.service.set_frozen(&id, &item_id, request.frozen).await?;
    Ok(Json(state.service.snapshot(&id).await?))
}

// === Stats Handlers ===

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListStatsResponse {
    pantry_count: usize,
    shopping_count: usize,
    by_category: Vec<(String, usize)>,
}

async fn api_list_stats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ListStatsResponse>, ApiError> {
    let snapshot = state.service.snapshot(&id).await?;
    let by_category = Category::ALL
        .iter()
        .map(|category| {
            let count = snapshot
                .pantry
                .iter()
                .chain(snapshot.shopping_list.iter())
                .filter(|i| i.category == *category)
                .count();
            (category.label().to_string(), count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();

    Ok(Json(ListStatsResponse {
        pantry_count: snapshot.pantry.len(),
        shopping_count: snapshot.shopping_list.len(),
        by_category,
    }))
}

async fn api_get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StoreStats>, ApiError> {
    Ok(Json(state.service.store().stats().await?))
}

// === Watch Handler ===

/// Upgrade to a WebSocket carrying the list as JSON text frames.
async fn api_watch_list(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ws: WebSocketUpgrade,
) -> Result<Response, ApiError> {
    let (sync, rx) = state.service.watch(&id).await?;
    let initial = sync.snapshot()?;
    Ok(ws.on_upgrade(move |socket| watch_loop(socket, initial, rx)))
}

/// Send the current snapshot, then every subsequent update.
///
/// Client frames are ignored except close. Every frame carries the
/// whole snapshot, so a lagged client resyncs on the next update.
async fn watch_loop(
    socket: WebSocket,
    initial: ListSnapshot,
    mut rx: broadcast::Receiver<ListSnapshot>,
) {
    let (mut tx, mut client) = socket.split();

    match serde_json::to_string(&initial) {
        Ok(frame) => {
            if tx.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }
        Err(e) => {
            warn!("Failed to encode initial snapshot: {}", e);
            return;
        }
    }

    loop {
        tokio::select! {
            update = rx.recv() => match update {
                Ok(snapshot) => {
                    let frame = match serde_json::to_string(&snapshot) {
                        Ok(f) => f,
                        Err(e) => {
                            warn!("Failed to encode snapshot update: {}", e);
                            continue;
                        }
                    };
                    if tx.send(Message::Text(frame)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    debug!("Watch client lagged by {} updates", missed);
                    continue;
                }
                Err(RecvError::Closed) => break,
            },
            incoming = client.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
}

/// Start the web server with config and a ready list service
pub async fn start_server(config: AppConfig, service: ListService) -> crate::Result<()> {
    let state = Arc::new(AppState {
        service,
        config: config.clone(),
    });

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("List API available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| crate::DespensaError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
