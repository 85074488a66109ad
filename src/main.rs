use actix_files::Files;
use actix_web::{web, App, HttpServer};
use log::info;
use std::path::Path;

use storefront::app_state::AppState;
use storefront::config::AppConfig;
use storefront::service::{
    create_product, delete_product, get_product, home, list_products, update_product,
};

fn init_logging(config: &AppConfig) {
    if Path::new(&config.logging.config_file).exists() {
        log4rs::init_file(&config.logging.config_file, Default::default())
            .expect("Failed to initialize log4rs");
    } else {
        env_logger::init();
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = AppConfig::load().expect("Failed to load configuration");
    init_logging(&config);

    let app_state = AppState::from_config(config)?;
    let server = app_state.config.server.clone();
    let upload_dir = app_state.upload_dir.clone();
    let max_payload_size = server.max_payload_size;
    info!("Starting server on {}:{}", server.host, server.port);

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(web::PayloadConfig::default().limit(max_payload_size))
            .app_data(web::Data::new(app_state.clone()))
            .route("/", web::get().to(home))
            .route("/api/products", web::get().to(list_products))
            .route("/api/products", web::post().to(create_product))
            .route("/api/products/{id}", web::get().to(get_product))
            .route("/api/products/{id}", web::put().to(update_product))
            .route("/api/products/{id}", web::delete().to(delete_product))
            // uploaded images are served straight from the local cache
            .service(Files::new("/uploads", upload_dir.clone()))
    })
    .workers(server.workers)
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}
