use axum::{
    Router,
    extract::{Path, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::{Next, from_fn},
    response::{Json, Response},
    routing::{get, post},
};
use dashmap::DashMap;
use policy_flow::{
    FlowRunner, Graph, GraphBuilder, InMemorySessionStorage, Session, SessionStorage, Task,
    Transcript,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{Instrument, error, info};
use uuid::Uuid;

use crate::{
    APP_DESCRIPTION, APP_TITLE, INPUT_PLACEHOLDER,
    store::{PolicyRecord, PolicyStore},
    tasks::{ComposeResponseTask, RetrievePoliciesTask, session_keys},
};

const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct AppState {
    runner: Arc<FlowRunner>,
    session_storage: Arc<dyn SessionStorage>,
    store: Arc<PolicyStore>,
    /// One lock per session id. A chat turn holds it from seeding the input until the
    /// reply and matches have been read back, so turns on one session never interleave.
    session_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl AppState {
    /// State backed by in-memory sessions
    pub fn new(store: Arc<PolicyStore>) -> Self {
        Self::with_storage(store, Arc::new(InMemorySessionStorage::new()))
    }

    pub fn with_storage(store: Arc<PolicyStore>, session_storage: Arc<dyn SessionStorage>) -> Self {
        let graph = Arc::new(build_turn_graph(store.clone()));
        Self {
            runner: Arc::new(FlowRunner::new(graph, session_storage.clone())),
            session_storage,
            store,
            session_locks: Arc::new(DashMap::new()),
        }
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.session_locks
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Lock for a session that has already taken a turn; lookups never create entries
    fn existing_session_lock(&self, session_id: &str) -> Option<Arc<Mutex<()>>> {
        self.session_locks
            .get(session_id)
            .map(|entry| entry.value().clone())
    }
}

/// Retrieval chains straight into the reply; the reply loops back to retrieval
/// so the session is ready for the next message.
pub fn build_turn_graph(store: Arc<PolicyStore>) -> Graph {
    let retrieve = Arc::new(RetrievePoliciesTask::new(store));
    let compose = Arc::new(ComposeResponseTask);

    let retrieve_id = retrieve.id().to_string();
    let compose_id = compose.id().to_string();

    GraphBuilder::new("policy_assistant")
        .add_task(retrieve)
        .add_task(compose)
        .add_edge(retrieve_id.clone(), compose_id.clone())
        .add_edge(compose_id, retrieve_id)
        .build()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health_check))
        .route("/chat", post(chat))
        .route("/session/{id}", get(get_session).delete(delete_session))
        .route("/policies", get(list_policies))
        .route("/policies/{id}", get(get_policy))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(correlation_id_middleware))
                .layer(TraceLayer::new_for_http()),
        )
        .with_state(state)
}

/// Tag every request with a correlation id and run it inside a span carrying it
async fn correlation_id_middleware(mut request: Request, next: Next) -> Response {
    let correlation_id = Uuid::new_v4().to_string();
    let header = HeaderValue::from_str(&correlation_id).ok();

    if let Some(value) = &header {
        request.headers_mut().insert(CORRELATION_HEADER, value.clone());
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    let mut response = next.run(request).instrument(span).await;

    if let Some(value) = header {
        response.headers_mut().insert(CORRELATION_HEADER, value);
    }
    response
}

fn correlation_id(headers: &HeaderMap) -> &str {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub session_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
    /// Every matched policy id; the reply only covers the first
    pub matches: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: String,
    pub status_message: Option<String>,
    pub transcript: Transcript,
}

#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub title: &'static str,
    pub description: &'static str,
    pub placeholder: &'static str,
}

async fn health_check() -> &'static str {
    "OK"
}

async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        title: APP_TITLE,
        description: APP_DESCRIPTION,
        placeholder: INPUT_PLACEHOLDER,
    })
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, StatusCode> {
    let correlation_id = correlation_id(&headers);

    info!(
        correlation_id = %correlation_id,
        session_id = ?request.session_id,
        content_length = %request.content.len(),
        "Processing chat request"
    );

    let session_id_provided = request.session_id.is_some();
    let session_id = request
        .session_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    if session_id_provided && Uuid::parse_str(&session_id).is_err() {
        error!(correlation_id = %correlation_id, session_id = %session_id, "Invalid session ID format");
        return Err(StatusCode::BAD_REQUEST);
    }

    let lock = state.session_lock(&session_id);
    let _turn = lock.lock().await;

    let session = match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => session,
        // a supplied id must refer to a live session
        Ok(None) if session_id_provided => {
            state.session_locks.remove(&session_id);
            error!(correlation_id = %correlation_id, session_id = %session_id, "Session not found");
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(None) => {
            let start_task = state.runner.graph().start_task_id().ok_or_else(|| {
                error!(correlation_id = %correlation_id, "Turn graph has no start task");
                StatusCode::INTERNAL_SERVER_ERROR
            })?;
            info!(correlation_id = %correlation_id, session_id = %session_id, "Creating new session");
            Session::new_from_task(session_id.clone(), start_task)
        }
        Err(e) => {
            error!(correlation_id = %correlation_id, session_id = %session_id, error = %e, "Failed to get session");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let context = session.context.clone();
    let seeded = async {
        context.set(session_keys::USER_INPUT, &request.content).await?;
        context.set(session_keys::SESSION_ID, &session_id).await?;
        state.session_storage.save(session).await
    };
    if let Err(e) = seeded.await {
        error!(correlation_id = %correlation_id, session_id = %session_id, error = %e, "Failed to prepare session");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    let result = match state.runner.run(&session_id).await {
        Ok(result) => result,
        Err(e) => {
            error!(correlation_id = %correlation_id, session_id = %session_id, error = %e, "Failed to run turn");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let matches: Vec<PolicyRecord> = context
        .get(session_keys::MATCHED_POLICIES)
        .await
        .unwrap_or_default();

    info!(
        correlation_id = %correlation_id,
        session_id = %session_id,
        matches = matches.len(),
        "Chat turn completed"
    );

    Ok(Json(ChatResponse {
        session_id,
        response: result.response.unwrap_or_default(),
        matches: matches.into_iter().map(|record| record.id).collect(),
    }))
}

async fn get_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, StatusCode> {
    let correlation_id = correlation_id(&headers);

    // wait out a turn in progress so the transcript never ends on a lone user turn
    let lock = state.existing_session_lock(&session_id);
    let _turn = match &lock {
        Some(lock) => Some(lock.lock().await),
        None => None,
    };

    match state.session_storage.get(&session_id).await {
        Ok(Some(session)) => {
            let transcript = session.context.transcript().await;
            info!(
                correlation_id = %correlation_id,
                session_id = %session_id,
                turns = transcript.len(),
                "Session found"
            );
            Ok(Json(SessionResponse {
                session_id,
                status_message: session.status_message,
                transcript,
            }))
        }
        Ok(None) => {
            info!(correlation_id = %correlation_id, session_id = %session_id, "Session not found");
            Err(StatusCode::NOT_FOUND)
        }
        Err(e) => {
            error!(correlation_id = %correlation_id, session_id = %session_id, error = %e, "Failed to get session");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

async fn delete_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(session_id): Path<String>,
) -> StatusCode {
    let correlation_id = correlation_id(&headers);

    let lock = state.existing_session_lock(&session_id);
    let _turn = match &lock {
        Some(lock) => Some(lock.lock().await),
        None => None,
    };

    match state.session_storage.get(&session_id).await {
        Ok(Some(_)) => match state.session_storage.delete(&session_id).await {
            Ok(()) => {
                state.session_locks.remove(&session_id);
                info!(correlation_id = %correlation_id, session_id = %session_id, "Session ended");
                StatusCode::NO_CONTENT
            }
            Err(e) => {
                error!(correlation_id = %correlation_id, session_id = %session_id, error = %e, "Failed to delete session");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        },
        Ok(None) => StatusCode::NOT_FOUND,
        Err(e) => {
            error!(correlation_id = %correlation_id, session_id = %session_id, error = %e, "Failed to get session");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn list_policies(State(state): State<AppState>) -> Json<Vec<PolicyRecord>> {
    Json(state.store.iter().cloned().collect())
}

async fn get_policy(
    State(state): State<AppState>,
    Path(policy_id): Path<String>,
) -> Result<Json<PolicyRecord>, StatusCode> {
    state
        .store
        .get(&policy_id)
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}
