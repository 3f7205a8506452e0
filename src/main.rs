use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use taskhub::activity::ActivityLog;
use taskhub::auth::{AuthMiddleware, LoginRateLimiter};
use taskhub::config::Config;
use taskhub::notifier::ChangeNotifier;
use taskhub::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Shared service instances, constructed once at process start and handed
    // to every worker. The notifier's subscription table is the only shared
    // mutable in-process state.
    let notifier = web::Data::new(ChangeNotifier::new());
    let activity = web::Data::new(ActivityLog::new(pool.clone()));
    let limiter = web::Data::new(LoginRateLimiter::new(
        config.login_rate_limit,
        config.login_rate_window_secs,
    ));

    log::info!("Starting TaskHub server at {}", config.server_url());

    let bind_addr = (config.server_host.clone(), config.server_port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(notifier.clone())
            .app_data(activity.clone())
            .app_data(limiter.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .service(
                web::scope("/api")
                    .wrap(AuthMiddleware)
                    .configure(routes::config),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
