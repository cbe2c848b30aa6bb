use actix_cors::Cors;
use actix_web::{
    self,
    middleware::{from_fn, Logger},
    web, App, HttpServer,
};
use std::sync::Arc;

use friendship::{
    configs::{connect_database, run_migrations},
    middlewares::authentication,
    modules::friendship::{repository_pg::FriendshipRepositoryPg, service::FriendshipService},
    ENV,
};

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // `log` output goes through env_logger, so only the tracing dispatcher is installed here
    tracing::subscriber::set_global_default(tracing_subscriber::fmt().finish())
        .map_err(|_| std::io::Error::other("Tracing subscriber error"))?;

    let db_pool =
        connect_database().await.map_err(|_| std::io::Error::other("Database connection error"))?;
    run_migrations(&db_pool).await.map_err(|_| std::io::Error::other("Database migration error"))?;

    let friendship_repo = FriendshipRepositoryPg::new(db_pool.clone());
    let friendship_service = FriendshipService::with_dependencies(Arc::new(friendship_repo));

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(web::Data::new(friendship_service.clone()))
            .service(health_check)
            .service(
                web::scope("/api")
                    .wrap(from_fn(authentication))
                    .configure(friendship::modules::friendship::route::configure),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
