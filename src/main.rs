use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;

use tasknest::auth::SessionResolver;
use tasknest::config::Config;
use tasknest::error;
use tasknest::repo::{PgRepository, Repository};
use tasknest::routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let repo: Arc<dyn Repository> = Arc::new(PgRepository::new(pool));
    let repo_data = web::Data::from(repo);
    let bind_addr = (config.server_host.clone(), config.server_port);
    let config_data = web::Data::new(config.clone());

    log::info!("Starting tasknest server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(repo_data.clone())
            .app_data(config_data.clone())
            .app_data(error::json_config())
            .wrap(SessionResolver)
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(routes::health::health)
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
