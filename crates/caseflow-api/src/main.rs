//! caseflow-api - HTTP and WebSocket API server for caseflow

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, Query, State,
    },
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use caseflow_analytics::AnalyticsEngine;
use caseflow_core::{
    CaseFilter, CaseStatus, CaseStore, CommentStore, CreateCaseRequest, CreateCommentRequest,
    NotificationStore, Role, UpdateCaseRequest,
};
use caseflow_db::Database;
use caseflow_realtime::{
    Broadcaster, CommentCreated, ConnectionRegistry, Notifier, EVENT_CHANNEL_CAPACITY,
};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically in logs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    db: Database,
    /// Live push channels for connected clients.
    registry: Arc<ConnectionRegistry>,
    /// Turns domain actions into stored notifications and live events.
    notifier: Notifier,
    /// Similarity and recurrence queries over the case collection.
    analytics: Arc<AnalyticsEngine>,
}

// =============================================================================
// CORS
// =============================================================================

/// Parse allowed CORS origins from the `ALLOWED_ORIGINS` environment
/// variable (comma-separated). Defaults to localhost development origins.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    let origins_str = std::env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://localhost:5173".to_string());

    if origins_str.trim().is_empty() {
        return vec![
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://localhost:5173"),
        ];
    }

    origins_str
        .split(',')
        .filter_map(|s| {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return None;
            }
            match trimmed.parse::<HeaderValue>() {
                Ok(v) => Some(v),
                Err(e) => {
                    tracing::warn!("Invalid CORS origin '{}': {}", trimmed, e);
                    None
                }
            }
        })
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   LOG_ANSI    - "true"/"false" override ANSI colors (auto-detected by default)
    //   RUST_LOG    - standard env filter (default: "caseflow_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "caseflow_api=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Optionally create a file appender with daily rotation
    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("caseflow-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(non_blocking);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            } else {
                layer = layer.with_ansi(false); // no ANSI in files
            }
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // Console-only output
        if log_format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer();
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost/caseflow".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    // Wire the realtime core: registry, fan-out, notifier, analytics
    let connection_registry = Arc::new(ConnectionRegistry::new());
    let broadcaster = Broadcaster::new(connection_registry.clone());
    let notifier = Notifier::new(
        db.cases.clone(),
        db.users.clone(),
        db.notifications.clone(),
        broadcaster,
    );
    let analytics = Arc::new(AnalyticsEngine::new(db.cases.clone()));

    let state = AppState {
        db,
        registry: connection_registry,
        notifier,
        analytics,
    };

    let app = Router::new()
        // Health
        .route("/api/v1/health", get(health_check))
        // Cases
        .route("/api/v1/cases", post(create_case).get(list_cases))
        .route(
            "/api/v1/cases/:id",
            get(get_case).put(update_case).delete(delete_case),
        )
        // Comments
        .route(
            "/api/v1/cases/:id/comments",
            post(create_comment).get(list_comments),
        )
        // Analytics (the literal "analytics" segment takes precedence over
        // :id matching)
        .route(
            "/api/v1/cases/analytics/recurrent",
            get(recurrent_categories),
        )
        .route("/api/v1/cases/:id/similar", get(similar_cases))
        // Notifications
        .route("/api/v1/notifications", get(list_notifications))
        .route(
            "/api/v1/notifications/:id/read",
            put(mark_notification_read),
        )
        .route("/api/v1/notifications/read-all", put(mark_all_read))
        // WebSocket live events
        .route("/api/v1/ws", get(ws_handler))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
                .allow_credentials(true)
                .max_age(std::time::Duration::from_secs(3600))
        })
        .with_state(state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

#[derive(Debug)]
enum ApiError {
    Internal(caseflow_core::Error),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
}

impl From<caseflow_core::Error> for ApiError {
    fn from(err: caseflow_core::Error) -> Self {
        use caseflow_core::Error;
        match &err {
            Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            Error::CaseNotFound(id) => ApiError::NotFound(format!("Case {} not found", id)),
            Error::UserNotFound(id) => ApiError::NotFound(format!("User {} not found", id)),
            Error::NotificationNotFound(id) => {
                ApiError::NotFound(format!("Notification {} not found", id))
            }
            Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            Error::Forbidden(msg) => ApiError::Forbidden(msg.clone()),
            _ => ApiError::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

// =============================================================================
// SYSTEM HANDLERS
// =============================================================================

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.registry.connection_count(),
    }))
}

// =============================================================================
// WEBSOCKET HANDLER
// =============================================================================

#[derive(Debug, Deserialize)]
struct WsQuery {
    /// Identity of the connecting session, pre-validated upstream.
    user_id: Uuid,
}

/// WebSocket handler for real-time event streaming.
///
/// Clients connect to `/api/v1/ws?user_id=...` and receive JSON-encoded
/// LiveEvents for broadcasts plus notifications addressed to them.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, query.user_id))
}

async fn handle_ws_connection(socket: WebSocket, state: AppState, user_id: Uuid) {
    use futures::{SinkExt, StreamExt};

    let (event_tx, mut event_rx) = tokio::sync::mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let channel_id = state.registry.register(user_id, event_tx);
    tracing::info!(
        channel_id = %channel_id,
        user_id = %user_id,
        "WebSocket connection opened"
    );

    let (mut sender, mut receiver) = socket.split();

    // Forward registry events to the client; ping to detect dead peers
    let send_task = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(std::time::Duration::from_secs(30));
        loop {
            tokio::select! {
                event = event_rx.recv() => {
                    match event {
                        Some(evt) => {
                            if let Ok(json) = serde_json::to_string(&evt) {
                                if sender.send(Message::Text(json)).await.is_err() {
                                    break;
                                }
                            }
                        }
                        // Sender side dropped: the registry pruned this channel
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if sender.send(Message::Ping(vec![])).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Drain incoming frames until the client closes
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    // Wait for either task to finish, then tear down the channel
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }
    state.registry.unregister(channel_id);
    tracing::info!(
        channel_id = %channel_id,
        user_id = %user_id,
        "WebSocket connection closed"
    );
}

// =============================================================================
// CASE HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateCaseBody {
    external_ref: Option<String>,
    title: String,
    #[serde(default)]
    description: String,
    status: Option<CaseStatus>,
    category: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    creator_id: Option<Uuid>,
    assignee_id: Option<Uuid>,
}

async fn create_case(
    State(state): State<AppState>,
    Json(body): Json<CreateCaseBody>,
) -> Result<impl IntoResponse, ApiError> {
    if body.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title must not be empty".to_string()));
    }

    let case = state
        .db
        .cases
        .insert(CreateCaseRequest {
            external_ref: body.external_ref,
            title: body.title,
            description: body.description,
            status: body.status.unwrap_or(CaseStatus::Pending),
            category: body.category,
            keywords: body.keywords,
            creator_id: body.creator_id,
            assignee_id: body.assignee_id,
            opened_at: None,
        })
        .await?;

    // The write is committed; the push is best-effort
    state.notifier.case_created(&case);

    Ok((StatusCode::CREATED, Json(case)))
}

#[derive(Debug, Deserialize)]
struct ListCasesQuery {
    status: Option<CaseStatus>,
    assignee_id: Option<Uuid>,
    opened_within_days: Option<i64>,
}

async fn list_cases(
    State(state): State<AppState>,
    Query(query): Query<ListCasesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let cases = state
        .db
        .cases
        .list(CaseFilter {
            status: query.status,
            assignee_id: query.assignee_id,
            opened_within_days: query.opened_within_days,
        })
        .await?;
    Ok(Json(cases))
}

async fn get_case(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let case = state.db.cases.fetch(id).await?;
    Ok(Json(case))
}

#[derive(Debug, Deserialize)]
struct UpdateCaseBody {
    external_ref: Option<String>,
    title: Option<String>,
    description: Option<String>,
    status: Option<CaseStatus>,
    category: Option<String>,
    keywords: Option<Vec<String>>,
    assignee_id: Option<Uuid>,
}

async fn update_case(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCaseBody>,
) -> Result<impl IntoResponse, ApiError> {
    // Fetch first so the notifier can diff status and assignee
    let previous = state.db.cases.fetch(id).await?;

    let case = state
        .db
        .cases
        .update(
            id,
            UpdateCaseRequest {
                external_ref: body.external_ref,
                title: body.title,
                description: body.description,
                status: body.status,
                category: body.category,
                keywords: body.keywords,
                assignee_id: body.assignee_id,
            },
        )
        .await?;

    state
        .notifier
        .case_updated(&case, previous.status, previous.assignee_id)
        .await;

    Ok(Json(case))
}

async fn delete_case(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.cases.delete(id).await?;
    state.notifier.case_deleted(id);
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// COMMENT HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateCommentBody {
    author_id: Uuid,
    author_role: Role,
    content: String,
    #[serde(default)]
    is_internal: bool,
}

async fn create_comment(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Json(body): Json<CreateCommentBody>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = CommentCreated {
        case_id,
        author_id: body.author_id,
        author_role: body.author_role,
        content: body.content,
        is_internal: body.is_internal,
    };
    payload.validate()?;

    if !state.db.cases.exists(case_id).await? {
        return Err(ApiError::NotFound(format!("Case {} not found", case_id)));
    }

    let comment = state
        .db
        .comments
        .insert(CreateCommentRequest {
            case_id,
            author_id: payload.author_id,
            author_role: payload.author_role,
            content: payload.content,
            is_internal: payload.is_internal,
        })
        .await?;

    state.notifier.comment_created(&comment).await;

    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize)]
struct ListCommentsQuery {
    /// Role of the reader; requester viewers never see internal comments.
    role: Option<Role>,
}

async fn list_comments(
    State(state): State<AppState>,
    Path(case_id): Path<Uuid>,
    Query(query): Query<ListCommentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.db.cases.exists(case_id).await? {
        return Err(ApiError::NotFound(format!("Case {} not found", case_id)));
    }

    let viewer_role = query.role.unwrap_or(Role::Requester);
    let comments = state.db.comments.list_for_case(case_id, viewer_role).await?;
    Ok(Json(comments))
}

// =============================================================================
// ANALYTICS HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct SimilarQuery {
    limit: Option<usize>,
}

async fn similar_cases(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SimilarQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(limit) = query.limit {
        if limit == 0 {
            return Err(ApiError::BadRequest("limit must be >= 1".to_string()));
        }
    }
    let similar = state.analytics.similar_cases(id, query.limit).await?;
    Ok(Json(similar))
}

async fn recurrent_categories(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let recurrent = state.analytics.recurrent_categories().await?;
    Ok(Json(recurrent))
}

// =============================================================================
// NOTIFICATION HANDLERS
// =============================================================================

#[derive(Debug, Deserialize)]
struct NotificationsQuery {
    user_id: Uuid,
    #[serde(default)]
    unread_only: bool,
}

async fn list_notifications(
    State(state): State<AppState>,
    Query(query): Query<NotificationsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let notifications = state
        .db
        .notifications
        .list_for_user(query.user_id, query.unread_only)
        .await?;
    let unread = state.db.notifications.unread_count(query.user_id).await?;
    Ok(Json(serde_json::json!({
        "notifications": notifications,
        "unread_count": unread,
    })))
}

async fn mark_notification_read(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.db.notifications.mark_read(id).await?;
    Ok(Json(serde_json::json!({ "read": true })))
}

#[derive(Debug, Deserialize)]
struct ReadAllQuery {
    user_id: Uuid,
}

async fn mark_all_read(
    State(state): State<AppState>,
    Query(query): Query<ReadAllQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let updated = state.db.notifications.mark_all_read(query.user_id).await?;
    Ok(Json(serde_json::json!({ "updated": updated })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_not_found_maps_to_404() {
        let id = Uuid::new_v4();
        let err: ApiError = caseflow_core::Error::CaseNotFound(id).into();
        assert!(matches!(err, ApiError::NotFound(_)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_input_maps_to_400() {
        let err: ApiError = caseflow_core::Error::InvalidInput("empty".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_error_maps_to_500() {
        let err: ApiError = caseflow_core::Error::Internal("boom".to_string()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_create_case_body_defaults() {
        let body: CreateCaseBody = serde_json::from_str(r#"{"title": "Login broken"}"#)
            .expect("minimal body should deserialize");
        assert_eq!(body.title, "Login broken");
        assert!(body.description.is_empty());
        assert!(body.keywords.is_empty());
        assert!(body.status.is_none());
    }
}
