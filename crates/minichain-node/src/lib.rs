//! HTTP surface of the node: a thin axum layer over `SharedLedger`.
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use minichain_core::{Block, CancelFlag, LedgerError, SharedLedger, Transaction};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use thiserror::Error;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

pub mod config;
mod constants;

use constants::{TX_ACCEPTED, TX_REJECTED};

#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    /// Cancelled on shutdown; every mine request searches under a child of it.
    pub shutdown: CancelFlag,
    pub mine_timeout: Option<Duration>,
    active_searches: Arc<AtomicUsize>,
}

impl AppState {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            shutdown: CancelFlag::new(),
            mine_timeout: None,
            active_searches: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_mine_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.mine_timeout = timeout;
        self
    }

    /// Proof searches still running on the blocking pool.
    pub fn active_searches(&self) -> usize {
        self.active_searches.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", TX_REJECTED)]
    InvalidTransaction,
    #[error("mining cancelled: {0}")]
    MiningCancelled(LedgerError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Cancelled { .. } => ApiError::MiningCancelled(err),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidTransaction => StatusCode::BAD_REQUEST,
            ApiError::MiningCancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(%status, "{self}");
        }
        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    blocks: usize,
    active_searches: usize,
}

#[derive(Deserialize)]
struct TxIn {
    sender: String,
    receiver: String,
    amount: i64,
}

/// Cancels the search when the request future is dropped, e.g. because the
/// client went away.
struct CancelOnDrop(CancelFlag);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

pub fn build_router(state: AppState, allowed_origin: &str) -> anyhow::Result<Router> {
    let cors = CorsLayer::new()
        .allow_origin(allowed_origin.parse::<HeaderValue>()?)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/blockchain", get(get_chain))
        .route("/api/pending", get(get_pending))
        .route("/api/transaction", post(submit_transaction))
        .route("/api/mine", get(mine_block).post(mine_block))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    Ok(router)
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        blocks: state.ledger.len(),
        active_searches: state.active_searches(),
    })
}

async fn get_chain(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.ledger.get_chain())
}

async fn get_pending(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    Json(state.ledger.pending())
}

async fn submit_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TxIn>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(tx) = payload.map_err(|rejection| {
        debug!(%rejection, "rejected transaction body");
        ApiError::InvalidTransaction
    })?;
    state
        .ledger
        .submit_transaction(tx.sender, tx.receiver, tx.amount);
    Ok(TX_ACCEPTED)
}

async fn mine_block(State(state): State<AppState>) -> Result<Json<Block>, ApiError> {
    let guard = CancelOnDrop(state.shutdown.child());
    let cancel = guard.0.clone();
    let ledger = state.ledger.clone();
    let active = state.active_searches.clone();
    active.fetch_add(1, Ordering::SeqCst);
    let mut task = tokio::task::spawn_blocking(move || {
        let mined = ledger.mine(&cancel);
        active.fetch_sub(1, Ordering::SeqCst);
        mined
    });

    let joined = match state.mine_timeout {
        Some(limit) => match tokio::time::timeout(limit, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                warn!(?limit, "proof search timed out, cancelling");
                guard.0.cancel();
                task.await
            }
        },
        None => task.await,
    };

    let block = joined.map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(block))
}
