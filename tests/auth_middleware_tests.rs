use std::time::Duration;

use actix_web::body::{to_bytes, MessageBody};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::from_fn;
use actix_web::{test, web, HttpResponse};

use bookstore_server::auth_token::{now_ms, TokenService};
use bookstore_server::middleware::{
    require_admin, require_auth, require_self_or_admin, TOKEN_HEADER,
};

const SECRET: &[u8] = b"01234567890123456789012345678901";
const USER_ID: &str = "64f000000000000000000001";
const OTHER_ID: &str = "64f000000000000000000002";

fn token_service() -> TokenService {
    TokenService::new(SECRET.to_vec(), Duration::from_secs(3600)).expect("valid service")
}

async fn ok_handler() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}

/// Resolves a call to (status, json body) whether the gate rejected the
/// request (service error) or let it through.
async fn call_json<S, R, B>(app: &S, req: R) -> (StatusCode, serde_json::Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    match app.call(req).await {
        Ok(resp) => {
            let status = resp.status();
            let bytes = to_bytes(resp.into_body()).await.unwrap_or_default();
            let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            (status, body)
        }
        Err(err) => {
            let resp = HttpResponse::from_error(err);
            let status = resp.status();
            let bytes = to_bytes(resp.into_body()).await.unwrap_or_default();
            let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
            (status, body)
        }
    }
}

macro_rules! gate_app {
    ($tokens:expr) => {
        test::init_service(
            actix_web::App::new()
                .app_data(web::Data::new($tokens))
                .service(
                    web::resource("/protected")
                        .wrap(from_fn(require_auth))
                        .route(web::get().to(ok_handler)),
                )
                .service(
                    web::resource("/admin")
                        .wrap(from_fn(require_admin))
                        .route(web::get().to(ok_handler)),
                )
                .service(
                    web::resource("/users/{id}")
                        .wrap(from_fn(require_self_or_admin))
                        .route(web::get().to(ok_handler)),
                ),
        )
        .await
    };
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let app = gate_app!(token_service());

    let req = test::TestRequest::get().uri("/protected").to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");
}

#[actix_web::test]
async fn garbage_token_is_unauthorized() {
    let app = gate_app!(token_service());

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header((TOKEN_HEADER, "not-a-token"))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");
}

#[actix_web::test]
async fn expired_token_is_unauthorized() {
    let tokens = token_service();
    // Issued two TTLs ago, well past expiry.
    let issued_at = now_ms().saturating_sub(2 * 3600 * 1000);
    let token = tokens.issue(USER_ID, false, issued_at).expect("issue token");
    let app = gate_app!(tokens);

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header((TOKEN_HEADER, token))
        .to_request();
    let (status, _) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn valid_token_passes_auth_gate() {
    let tokens = token_service();
    let token = tokens.issue(USER_ID, false, now_ms()).expect("issue token");
    let app = gate_app!(tokens);

    let req = test::TestRequest::get()
        .uri("/protected")
        .insert_header((TOKEN_HEADER, token))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
}

#[actix_web::test]
async fn non_admin_is_forbidden_on_admin_gate() {
    let tokens = token_service();
    let token = tokens.issue(USER_ID, false, now_ms()).expect("issue token");
    let app = gate_app!(tokens);

    let req = test::TestRequest::get()
        .uri("/admin")
        .insert_header((TOKEN_HEADER, token))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not allowed, only admin");
}

#[actix_web::test]
async fn admin_passes_admin_gate() {
    let tokens = token_service();
    let token = tokens.issue(USER_ID, true, now_ms()).expect("issue token");
    let app = gate_app!(tokens);

    let req = test::TestRequest::get()
        .uri("/admin")
        .insert_header((TOKEN_HEADER, token))
        .to_request();
    let (status, _) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn owner_passes_self_or_admin_gate() {
    let tokens = token_service();
    let token = tokens.issue(USER_ID, false, now_ms()).expect("issue token");
    let app = gate_app!(tokens);

    let req = test::TestRequest::get()
        .uri(&format!("/users/{USER_ID}"))
        .insert_header((TOKEN_HEADER, token))
        .to_request();
    let (status, _) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn non_owner_is_forbidden_on_self_or_admin_gate() {
    let tokens = token_service();
    let token = tokens.issue(USER_ID, false, now_ms()).expect("issue token");
    let app = gate_app!(tokens);

    let req = test::TestRequest::get()
        .uri(&format!("/users/{OTHER_ID}"))
        .insert_header((TOKEN_HEADER, token))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You are not allowed");
}

#[actix_web::test]
async fn admin_passes_self_or_admin_gate_for_any_id() {
    let tokens = token_service();
    let token = tokens.issue(USER_ID, true, now_ms()).expect("issue token");
    let app = gate_app!(tokens);

    let req = test::TestRequest::get()
        .uri(&format!("/users/{OTHER_ID}"))
        .insert_header((TOKEN_HEADER, token))
        .to_request();
    let (status, _) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn self_or_admin_gate_still_requires_a_token() {
    let app = gate_app!(token_service());

    let req = test::TestRequest::get()
        .uri(&format!("/users/{USER_ID}"))
        .to_request();
    let (status, body) = call_json(&app, req).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "No token provided");
}
