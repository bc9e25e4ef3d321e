//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::Value;
use tracing::{info, warn};

use crate::geometry::{MapViewState, RouteMapView, RoutingEngine};
use crate::problem::{ProblemCounts, SelectionError};
use crate::schedule::{Timeline, TimelineError, build_timeline};
use crate::session::{OptionsError, SolveTransport};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<T: SolveTransport, E: RoutingEngine>(state: AppState<T, E>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/solve", post(start_solve::<T, E>).delete(cancel_solve::<T, E>))
        .route("/session", get(session_state::<T, E>))
        .route("/solution", get(solution_summary::<T, E>))
        .route("/timeline", get(timeline::<T, E>))
        .route(
            "/routes/:index/map",
            post(open_map::<T, E>)
                .get(map_state::<T, E>)
                .delete(close_map::<T, E>),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Start a solve with the posted problem, replacing any running one.
async fn start_solve<T: SolveTransport, E: RoutingEngine>(
    State(state): State<AppState<T, E>>,
    Query(query): Query<SolveQuery>,
    Json(problem): Json<Value>,
) -> Result<(StatusCode, Json<SolveStartedResponse>), AppError> {
    let selection = query.selection()?;
    let problem = if selection.is_everything() {
        problem
    } else {
        selection.apply(&problem)?
    };
    let counts = ProblemCounts::of(&problem);

    // Session before maps, here and in `open_map`, so a view cannot be
    // opened against a solution that is being replaced.
    let mut session = state.session.lock().await;
    let handle = session.start(problem, query.options()).await?;
    let penalty = query.options().effective_vehicle_penalty();

    // Route indices refer to the previous solution.
    state.maps.lock().await.clear();
    drop(session);

    info!(
        session_id = handle.session_id(),
        vehicles = counts.vehicles,
        customers = counts.customers,
        vehicle_penalty_weight = penalty,
        "solve requested"
    );

    Ok((
        StatusCode::ACCEPTED,
        Json(SolveStartedResponse {
            session_id: handle.session_id(),
            problem: counts,
            vehicle_penalty_weight: penalty,
        }),
    ))
}

async fn cancel_solve<T: SolveTransport, E: RoutingEngine>(
    State(state): State<AppState<T, E>>,
) -> Json<CancelResponse> {
    let cancelled = state.session.lock().await.cancel().await;
    Json(CancelResponse { cancelled })
}

async fn session_state<T: SolveTransport, E: RoutingEngine>(
    State(state): State<AppState<T, E>>,
) -> Json<SessionResponse> {
    let snapshot = state.session.lock().await.snapshot().await;
    Json(SessionResponse::from_state(snapshot))
}

async fn solution_summary<T: SolveTransport, E: RoutingEngine>(
    State(state): State<AppState<T, E>>,
) -> Result<Json<SolutionResponse>, AppError> {
    let snapshot = state.session.lock().await.snapshot().await;
    let solution = snapshot.solution.ok_or_else(|| AppError::NotFound {
        message: "no solution".to_string(),
    })?;

    Ok(Json(SolutionResponse::from_solution(
        &solution,
        &state.service_model,
    )))
}

async fn timeline<T: SolveTransport, E: RoutingEngine>(
    State(state): State<AppState<T, E>>,
) -> Result<Json<Timeline>, AppError> {
    let snapshot = state.session.lock().await.snapshot().await;
    let solution = snapshot.solution.ok_or(TimelineError::NoData)?;

    Ok(Json(build_timeline(&solution, &state.service_model)?))
}

/// Open the map for one route and start fetching its geometry.
async fn open_map<T: SolveTransport, E: RoutingEngine>(
    State(state): State<AppState<T, E>>,
    Path(index): Path<usize>,
) -> Result<(StatusCode, Json<MapResponse>), AppError> {
    let session = state.session.lock().await;
    let snapshot = session.snapshot().await;
    let route = snapshot
        .solution
        .as_ref()
        .and_then(|s| s.routes.get(index))
        .ok_or_else(|| AppError::NotFound {
            message: format!("no route {index}"),
        })?;

    let mut maps = state.maps.lock().await;
    drop(session);

    let view = maps
        .entry(index)
        .or_insert_with(|| RouteMapView::new(state.resolver.clone()));
    let token = view.open(route).await;
    let view_state = view.state().await;

    if view_state == MapViewState::NoData {
        maps.remove(&index);
        return Err(AppError::NotFound {
            message: "no geometry data".to_string(),
        });
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(MapResponse {
            index,
            token,
            view: view_state,
        }),
    ))
}

async fn map_state<T: SolveTransport, E: RoutingEngine>(
    State(state): State<AppState<T, E>>,
    Path(index): Path<usize>,
) -> Result<Json<MapResponse>, AppError> {
    let maps = state.maps.lock().await;
    let view = maps.get(&index).ok_or_else(|| AppError::NotFound {
        message: format!("map for route {index} is not open"),
    })?;

    Ok(Json(MapResponse {
        index,
        token: view.token().await,
        view: view.state().await,
    }))
}

async fn close_map<T: SolveTransport, E: RoutingEngine>(
    State(state): State<AppState<T, E>>,
    Path(index): Path<usize>,
) -> StatusCode {
    if let Some(view) = state.maps.lock().await.remove(&index) {
        view.close().await;
    }
    StatusCode::NO_CONTENT
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
}

impl From<OptionsError> for AppError {
    fn from(e: OptionsError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<SelectionError> for AppError {
    fn from(e: SelectionError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<TimelineError> for AppError {
    fn from(e: TimelineError) -> Self {
        match e {
            TimelineError::NoData => AppError::NotFound {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
        };

        warn!(%status, %message, "request rejected");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
