use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::config::AppConfig;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
    pub environment: String,
}

#[get("/health")]
pub async fn health_check(config: web::Data<AppConfig>) -> Result<HttpResponse> {
    let response = HealthCheckResponse {
        status: "healthy".to_string(),
        environment: config.env.clone(),
    };

    Ok(HttpResponse::Ok().json(response))
}
