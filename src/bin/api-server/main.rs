use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use halal_finder::config::Config;

mod api;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::INFO)
        .with_ansi(true)
        .with_file(false)
        .pretty()
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("fail to setup logging")?;

    let config = Config::load()?;
    let state = web::Data::new(api::ApiState::new(&config)?);
    let origin = config.allowed_origin.clone();

    tracing::info!("listening on {}:{}", config.bind_addr, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allowed_origin(&origin)
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(state.clone())
            .configure(api::configure)
    })
    .bind((config.bind_addr.as_str(), config.port))
    .with_context(|| format!("fail to bind {}:{}", config.bind_addr, config.port))?
    .run()
    .await?;
    Ok(())
}
