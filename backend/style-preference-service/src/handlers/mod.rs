/// HTTP handlers for the style preference quiz
pub mod preference;

pub use preference::{
    create_preference, get_profile, health, next_image, save_profile, submit_iteration,
    AI_ID_HEADER,
};

use actix_web::{web, HttpRequest};
use tracing::debug;
use uuid::Uuid;

use crate::error::AppError;

/// Path segments that fail to parse. A bad preference id reads as an
/// unknown preference; anything else is a bad iteration number.
fn path_error(err: actix_web::error::PathError, req: &HttpRequest) -> actix_web::Error {
    debug!(path = %req.path(), error = %err, "Rejected path parameters");

    let id_parses = req
        .match_info()
        .get("preference_id")
        .map_or(false, |raw| Uuid::parse_str(raw).is_ok());

    if id_parses {
        AppError::BadRequest("Invalid iteration ID".to_string()).into()
    } else {
        AppError::NotFound("Preference not found".to_string()).into()
    }
}

/// Register all routes. Extractor failures get the same error envelope as
/// every other failure.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::BadRequest(format!("Invalid request body: {}", err)).into()
    }))
    .app_data(web::PathConfig::default().error_handler(path_error))
    .service(health)
    .service(create_preference)
    .service(next_image)
    .service(submit_iteration)
    .service(save_profile)
    .service(get_profile);
}
