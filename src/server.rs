use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::middleware::Logger;
use actix_web::{App, HttpRequest, HttpResponse, HttpServer, ResponseError, web};
use anyhow::{Context, Result};
use log::{error, info, warn};
use thiserror::Error;

use crate::config::ServerConfig;
use crate::quotation::TrimmedQuotation;
use crate::store::{QuotationStore, StoreError};
use crate::upstream::{FetchError, UpstreamClient};

pub const QUOTATION_ROUTE: &str = "/cotacao";

pub struct AppState {
    pub upstream: UpstreamClient,
    pub store: QuotationStore,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upstream(#[from] FetchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

// Callers only ever see a generic 500; details stay in the log.
impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body("internal server error")
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource(QUOTATION_ROUTE)
            .route(web::get().to(get_quotation))
            .default_service(web::route().to(method_not_allowed)),
    );
}

async fn get_quotation(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let reading = state.upstream.fetch().await.map_err(|e| {
        error!("Error fetching quotation: {e}");
        ApiError::from(e)
    })?;

    state.store.save(&reading).await.map_err(|e| {
        error!("Error saving quotation {}: {e}", reading.bid);
        ApiError::from(e)
    })?;

    Ok(HttpResponse::Ok().json(TrimmedQuotation::from(&reading)))
}

async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    warn!("Rejected {} {}", req.method(), req.path());
    HttpResponse::MethodNotAllowed()
        .content_type(ContentType::plaintext())
        .body("method not allowed")
}

pub async fn run(config: ServerConfig) -> Result<()> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("cotacao/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Can't build upstream HTTP client")?;
    let upstream = UpstreamClient::new(http, &config.upstream_url, config.upstream_timeout);
    let store = QuotationStore::open(&config.database_path, config.store_timeout);

    if let Err(e) = store.ensure_schema().await {
        warn!(
            "Database {} not ready, requests will fail until it is: {e}",
            config.database_path.display()
        );
    }

    let state = web::Data::new(AppState {
        upstream,
        store: store.clone(),
    });

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(configure)
    })
    .bind(&config.bind_addr)
    .with_context(|| format!("Can't bind {}", config.bind_addr))?;

    info!("Server listening on {}", config.bind_addr);
    server.run().await?;

    store.close().await;
    Ok(())
}
