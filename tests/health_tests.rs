use std::time::Duration;

use actix_web::{test, web, App};

use bookstore_server::config::AppConfig;
use bookstore_server::handlers;

fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        env: "test".to_string(),
        mongodb_uri: "mongodb://localhost:27017".to_string(),
        database_name: "bookstore_test".to_string(),
        token_secret: "0123456789abcdef0123456789abcdef".to_string(),
        token_ttl: Duration::from_secs(4 * 3600),
    }
}

#[actix_web::test]
async fn test_health_check() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config()))
            .service(handlers::health_check),
    )
    .await;

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["environment"], "test");
}

#[actix_web::test]
async fn test_unmatched_route_is_json_404() {
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(test_config()))
            .service(handlers::health_check)
            .default_service(web::route().to(handlers::not_found)),
    )
    .await;

    let req = test::TestRequest::get().uri("/nope").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status().as_u16(), 404);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Not found");
}
