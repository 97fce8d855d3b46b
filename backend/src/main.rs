mod config;
mod error;
mod lifecycle;
mod promotion;
mod services;
mod store;

use crate::config::Config;
use crate::store::Stores;
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| {
        error!("invalid configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e)
    })?;

    let stores = Stores::open(&config).await.map_err(|e| {
        error!("cannot open stores: {}", e);
        std::io::Error::other(e)
    })?;
    info!(
        "Document store {} ({}), relational store {}",
        config.document_db.display(),
        config.topology.as_str(),
        config.relational_db.display()
    );

    let url = config.bind_url();
    info!("Server running at {}", url);

    let json_limit = config.json_limit;
    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(json_limit))
            .app_data(web::Data::new(stores.clone()))
            .service(services::projects::configure_routes())
            .service(services::templates::configure_routes())
            .service(services::courses::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
