/// Preference quiz handlers
///
/// Every per-preference route requires the `AI-ID` header returned at
/// creation time.
use actix_web::{get, post, web, HttpRequest, HttpResponse};
use tracing::debug;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{CreatePreferenceRequest, HealthResponse, IterationRequest};
use crate::services::QuizService;

pub const AI_ID_HEADER: &str = "AI-ID";

fn ai_id(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(AI_ID_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// GET /api
#[get("/api")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// POST /api/preference
#[post("/api/preference")]
pub async fn create_preference(
    quiz: web::Data<QuizService>,
    body: web::Json<CreatePreferenceRequest>,
) -> Result<HttpResponse> {
    let created = quiz.create_preference(&body.access_id, &body.segment)?;
    Ok(HttpResponse::Ok().json(created))
}

/// GET /api/preference/{preference_id}/next-image
#[get("/api/preference/{preference_id}/next-image")]
pub async fn next_image(
    req: HttpRequest,
    quiz: web::Data<QuizService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let preference_id = path.into_inner();
    let next = quiz.next_image(preference_id, ai_id(&req)).await?;

    debug!(
        preference_id = %preference_id,
        iteration = next.iteration,
        style = %next.style,
        "Serving image"
    );

    Ok(HttpResponse::Ok().json(next))
}

/// POST /api/preference/{preference_id}/iteration/{iteration}
#[post("/api/preference/{preference_id}/iteration/{iteration}")]
pub async fn submit_iteration(
    req: HttpRequest,
    quiz: web::Data<QuizService>,
    path: web::Path<(Uuid, usize)>,
    body: web::Json<IterationRequest>,
) -> Result<HttpResponse> {
    let (preference_id, iteration) = path.into_inner();
    let resp = quiz
        .submit_iteration(preference_id, iteration, ai_id(&req), &body)
        .await?;
    Ok(HttpResponse::Ok().json(resp))
}

/// POST /api/preference/{preference_id}/profile
#[post("/api/preference/{preference_id}/profile")]
pub async fn save_profile(
    req: HttpRequest,
    quiz: web::Data<QuizService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let resp = quiz.save_profile(path.into_inner(), ai_id(&req)).await?;
    Ok(HttpResponse::Ok().json(resp))
}

/// GET /api/preference/{preference_id}/profile
#[get("/api/preference/{preference_id}/profile")]
pub async fn get_profile(
    req: HttpRequest,
    quiz: web::Data<QuizService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let resp = quiz.get_profile(path.into_inner(), ai_id(&req)).await?;
    Ok(HttpResponse::Ok().json(resp))
}
