mod auth_token;
mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod validation;

use actix_web::{middleware as actix_middleware, web, App, HttpServer};
use mongodb::Client;
use std::time::Duration;
use tokio::time;

use auth_token::TokenService;
use config::AppConfig;
use db::MongoDbContext;
use error::ApiError;
use middleware::{rate_limit_middleware, RateLimiter};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if it exists (for development)
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    log::info!("Starting bookstore server...");

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    // Connect to MongoDB
    log::info!("Connecting to MongoDB at {}...", config.mongodb_uri);
    let client = Client::with_uri_str(&config.mongodb_uri)
        .await
        .unwrap_or_else(|e| {
            eprintln!("Failed to connect to MongoDB: {}", e);
            std::process::exit(1);
        });

    let db_context = MongoDbContext::new(client, &config.database_name);

    // Initialize database indexes
    log::info!("Initializing database indexes...");
    db_context.init_indexes().await.unwrap_or_else(|e| {
        eprintln!("Failed to initialize database indexes: {}", e);
        std::process::exit(1);
    });

    let token_service = TokenService::new(
        config.token_secret.clone().into_bytes(),
        config.token_ttl,
    )
    .unwrap_or_else(|e| {
        eprintln!("Failed to construct token service: {}", e);
        std::process::exit(1);
    });

    log::info!(
        "Token TTL set to {} hours",
        config.token_ttl.as_secs() / 3600
    );

    let rate_limiter = RateLimiter::default();

    // Prune idle rate-limiter entries in the background.
    let rate_limiter_clone = rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter_clone.prune();
            log::debug!("Background cleanup: pruned rate limiter entries");
        }
    });

    let host = config.host.clone();
    let port = config.port;

    log::info!(
        "Server running in {} mode at {}:{}...",
        config.env,
        host,
        port
    );

    HttpServer::new(move || {
        App::new()
            // Shared state
            .app_data(web::Data::new(db_context.clone()))
            .app_data(web::Data::new(token_service.clone()))
            .app_data(web::Data::new(rate_limiter.clone()))
            .app_data(web::Data::new(config.clone()))
            // Malformed JSON bodies keep the API's error shape
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                ApiError::Validation(err.to_string()).into()
            }))
            // Middleware
            .wrap(actix_middleware::Logger::default())
            .wrap(actix_middleware::Compress::default())
            .service(handlers::health_check)
            .service(
                web::scope("/api")
                    // Public reads; mutations are gated per-route
                    .service(handlers::list_authors)
                    .service(handlers::get_author)
                    .service(handlers::create_author)
                    .service(handlers::update_author)
                    .service(handlers::delete_author)
                    .service(handlers::list_books)
                    .service(handlers::get_book)
                    .service(handlers::create_book)
                    .service(handlers::update_book)
                    .service(handlers::delete_book)
                    .service(handlers::list_users)
                    .service(handlers::get_user)
                    .service(handlers::update_user)
                    .service(handlers::delete_user)
                    // Credential endpoints, brute-force throttled
                    .service(
                        web::scope("/auth")
                            .wrap(actix_middleware::from_fn(rate_limit_middleware))
                            .service(handlers::register)
                            .service(handlers::login),
                    ),
            )
            .default_service(web::route().to(handlers::not_found))
    })
    .bind((host, port))?
    .run()
    .await
}
