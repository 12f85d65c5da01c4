use actix_web::{web, App, HttpServer};
use backend::app::{configure, AppState};
use backend::config::AppConfig;
use env_logger::Env;
use log::{error, info};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };
    let host = config.host.clone();
    let port = config.port;

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            error!("startup failed: {}", e);
            return Err(std::io::Error::other(e.to_string()));
        }
    };

    info!("Server running at http://{}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
