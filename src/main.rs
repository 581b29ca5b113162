use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::middleware::{ErrorHandlers, Logger};
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use env_logger::Env;
use log::{info, warn};

use social_feed::config::{AppConfig, DataStore};
use social_feed::database::{
    MemoryStore, MongoStore, RedisService, Store, connect_to_mongo, connect_to_redis,
};
use social_feed::middleware::error_handler::handle_error;
use social_feed::middleware::not_found::not_found;
use social_feed::router::index::{register_services, routes};
use social_feed::utils::uploads::{CloudinaryConfig, UploadService};

async fn open_store(config: &AppConfig) -> std::io::Result<Arc<dyn Store>> {
    match config.data_store {
        DataStore::Mongo => {
            let client = connect_to_mongo(&config.mongodb_uri)
                .await
                .map_err(std::io::Error::other)?;
            let store = MongoStore::new(&client, &config.database_name);
            store.ensure_indexes().await.map_err(std::io::Error::other)?;
            Ok(Arc::new(store))
        }
        DataStore::Memory => {
            warn!("Using the in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn open_sessions(config: &AppConfig) -> Option<RedisService> {
    let url = config.redis_url.as_deref()?;
    match connect_to_redis(url).await {
        Ok(client) => Some(RedisService::new(&client)),
        Err(e) => {
            warn!("{}; tokens will be checked without session lookup", e);
            None
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    let store = open_store(&config).await?;
    let sessions = open_sessions(&config).await;

    let uploads = match CloudinaryConfig::from_env() {
        Ok(cloudinary) => Some(web::Data::new(UploadService::with_config(cloudinary))),
        Err(e) => {
            warn!("Image uploads disabled: {}", e);
            None
        }
    };

    let auth = web::Data::new(config.auth.clone());
    let sessions = sessions.map(web::Data::new);
    let feed = config.feed;

    info!("Starting server on http://{}:{}", config.host, config.port);

    HttpServer::new(move || {
        let mut app = App::new()
            .wrap(
                ErrorHandlers::new()
                    .handler(StatusCode::NOT_FOUND, not_found)
                    .default_handler(handle_error),
            )
            .wrap(Logger::default())
            .app_data(auth.clone());

        if let Some(sessions) = &sessions {
            app = app.app_data(sessions.clone());
        }
        if let Some(uploads) = &uploads {
            app = app.app_data(uploads.clone());
        }

        let store = store.clone();
        app.configure(move |cfg| {
            register_services(cfg, store, feed);
            routes(cfg);
        })
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;

    info!("Server has stopped");

    Ok(())
}
