use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::{App, HttpServer, cookie::Key, middleware, web};

use huddle::calendar::HttpCalendarProvider;
use huddle::config::AppConfig;
use huddle::handlers::{self, auth_handlers, meeting_handlers, user_handlers};
use huddle::{auth, db};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env();

    // Ensure the data directory exists
    if let Some(parent) = std::path::Path::new(&config.database_path).parent() {
        std::fs::create_dir_all(parent).expect("Failed to create data directory");
    }

    // Initialize database
    let pool = db::init_pool(&config.database_path);
    db::run_migrations(&pool);
    db::seed_admin(&pool, &config.admin_email, &config.admin_password);

    // Session encryption key — load from SESSION_KEY env var for persistent sessions across restarts
    let secret_key = match std::env::var("SESSION_KEY") {
        Ok(val) if val.len() >= 64 => {
            log::info!("Using SESSION_KEY from environment");
            Key::from(val.as_bytes())
        }
        Ok(val) => {
            log::warn!(
                "SESSION_KEY too short ({} bytes, need 64+) — generating random key",
                val.len()
            );
            Key::generate()
        }
        Err(_) => {
            log::warn!("No SESSION_KEY set — generating random key (sessions lost on restart)");
            Key::generate()
        }
    };

    log::info!("Starting server at http://{}", config.bind_addr);

    let bind_addr = config.bind_addr.clone();
    HttpServer::new(move || {
        let session_mw =
            SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                .cookie_secure(false)
                .cookie_http_only(true)
                .build();

        App::new()
            .wrap(session_mw)
            .wrap(middleware::Logger::default())
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(HttpCalendarProvider::new(
                &config.calendar_base_url,
            )))
            // Public route
            .route("/api/v1/auth/login", web::post().to(auth_handlers::login))
            // Protected routes
            .service(
                web::scope("/api/v1")
                    .wrap(actix_web::middleware::from_fn(auth::middleware::require_auth))
                    .wrap(actix_web::middleware::from_fn(
                        handlers::require_json_content_type,
                    ))
                    .route("/auth/logout", web::post().to(auth_handlers::logout))
                    .route("/users/status", web::get().to(user_handlers::status))
                    .route("/users/password", web::post().to(user_handlers::change_password))
                    .route("/users", web::post().to(user_handlers::create))
                    .route("/users/{id}/role", web::put().to(user_handlers::update_role))
                    // /meetings/upcoming BEFORE /meetings/{id} to avoid routing conflict
                    .route("/meetings/upcoming", web::get().to(meeting_handlers::upcoming))
                    .route("/meetings", web::post().to(meeting_handlers::create))
                    .route("/meetings", web::get().to(meeting_handlers::list))
                    .route(
                        "/meetings/{id}/participants",
                        web::post().to(meeting_handlers::add_participants),
                    )
                    .route(
                        "/meetings/{id}/status",
                        web::post().to(meeting_handlers::transition),
                    ),
            )
            // Default 404 handler (must be registered last)
            .default_service(web::to(|| async {
                actix_web::HttpResponse::NotFound()
                    .json(serde_json::json!({ "error": "Not found" }))
            }))
    })
    .bind(bind_addr)?
    .run()
    .await
}
