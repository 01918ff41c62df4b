use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Responder};

use collab_server::config;
use collab_server::connection::ws_index;
use collab_server::server::spawn_server;

async fn health() -> impl Responder {
    HttpResponse::Ok().body("Backend is running!")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let config = match config::load() {
        Ok(config) => config,
        Err(err) => {
            log::error!("invalid environment configuration: {}", err);
            std::process::exit(1);
        }
    };
    if config.jwt_secret.is_none() {
        log::warn!("JWT_SECRET not set - admitting connections without a token");
    }

    let srv_tx = spawn_server();
    let bind_addr = config.bind_addr.clone();
    log::info!("listening on {}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .data(srv_tx.clone())
            .data(config.clone())
            .route("/ws/", web::get().to(ws_index))
            .route("/", web::get().to(health))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
