use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::assessment::{Assessor, RiskAssessment};
use crate::config::AppConfig;
use crate::error::ScoreError;
use crate::metrics::{self, Metrics};
use crate::profile::{AssessmentProfile, Condition};
use crate::scoring::AssessmentInput;

#[derive(Clone)]
pub struct AppState {
    assessors: Arc<BTreeMap<Condition, Assessor>>,
}

impl AppState {
    pub fn new(assessors: BTreeMap<Condition, Assessor>) -> Self {
        Self {
            assessors: Arc::new(assessors),
        }
    }

    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::new(cfg.assessors())
    }

    fn assessor(&self, raw: &str) -> Result<&Assessor, ApiError> {
        let condition: Condition = raw.parse().map_err(ApiError::UnknownCondition)?;
        self.assessors
            .get(&condition)
            .ok_or_else(|| ApiError::UnknownCondition(format!("condition '{condition}' is not configured")))
    }
}

/// Full app: assessment routes, `/metrics`, permissive CORS.
pub fn create_router(cfg: &AppConfig) -> Router {
    let mut app = router(AppState::from_config(cfg));
    if let Some(m) = Metrics::init() {
        app = app.merge(m.router());
    }
    app.layer(CorsLayer::very_permissive())
}

/// Assessment routes only.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/assessments", get(list_assessments))
        .route("/assessments/{condition}", get(describe_assessment))
        .route("/assess/{condition}", post(assess))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AssessReq {
    answers: AssessmentInput,
}

#[derive(Debug, Serialize)]
struct QuestionOut {
    key: String,
    question: String,
    weight: f64,
    options: Vec<String>,
}

#[derive(Debug, Serialize)]
struct AssessmentOut {
    condition: Condition,
    title: String,
    max_score: f64,
    model: Option<String>,
    questions: Vec<QuestionOut>,
}

impl AssessmentOut {
    fn from_assessor(a: &Assessor) -> Self {
        let p: &AssessmentProfile = a.profile();
        Self {
            condition: p.condition(),
            title: p.title().to_string(),
            max_score: p.max_score(),
            model: a.model_name().map(str::to_string),
            questions: p
                .symptoms()
                .iter()
                .map(|s| QuestionOut {
                    key: s.key.clone(),
                    question: s.question.clone(),
                    weight: s.weight,
                    options: s.scale.labels().to_vec(),
                })
                .collect(),
        }
    }
}

async fn list_assessments(State(state): State<AppState>) -> Json<Vec<AssessmentOut>> {
    Json(
        state
            .assessors
            .values()
            .map(AssessmentOut::from_assessor)
            .collect(),
    )
}

async fn describe_assessment(
    State(state): State<AppState>,
    Path(condition): Path<String>,
) -> Result<Json<AssessmentOut>, ApiError> {
    let a = state.assessor(&condition)?;
    Ok(Json(AssessmentOut::from_assessor(a)))
}

async fn assess(
    State(state): State<AppState>,
    Path(condition): Path<String>,
    body: Result<Json<AssessReq>, JsonRejection>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let a = state.assessor(&condition)?;
    let Json(body) = body.map_err(|rejection| {
        let condition = a.profile().condition();
        metrics::record_rejected(condition, "invalid_body");
        warn!(%condition, error = %rejection.body_text(), "assessment body rejected");
        ApiError::Body(rejection)
    })?;
    let out = a.assess(&body.answers)?;
    Ok(Json(out))
}

#[derive(Debug)]
enum ApiError {
    UnknownCondition(String),
    /// Body is not JSON or answers are not a map of strings.
    Body(JsonRejection),
    Score(ScoreError),
}

impl From<ScoreError> for ApiError {
    fn from(e: ScoreError) -> Self {
        ApiError::Score(e)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::UnknownCondition(message) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "unknown_condition",
                    message,
                },
            ),
            ApiError::Body(rejection) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "invalid_body",
                    message: rejection.body_text(),
                },
            ),
            ApiError::Score(e) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: e.kind(),
                    message: e.to_string(),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}
