use forecast::ForecastPipeline;
use history_model::{Interval, Period, STOCKS};
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::process::exit;
use yahoo_api::YahooAPI;

use actix_web::{
    App, HttpResponse, HttpServer, Responder, get, http::header::ContentType, middleware::Logger,
    web,
};

mod chart;
mod config;
mod error;
mod pages;
mod predictions;
mod utils;

use config::Config;
use error::DashboardError;
use pages::{Model, Nav, Page};

#[derive(Serialize)]
struct HealthcheckResponse {
    status: String,
}

/// Widget state of the dashboard, carried in the query string.
#[derive(Debug, Deserialize)]
struct DashboardQuery {
    #[serde(default)]
    page: Page,
    #[serde(default)]
    model: Model,
    ticker: Option<String>,
    period: Option<Period>,
    interval: Option<Interval>,
}

#[get("/")]
async fn dashboard(
    query: web::Query<DashboardQuery>,
    config: web::Data<Config>,
    api: web::Data<YahooAPI>,
    pipeline: web::Data<ForecastPipeline>,
) -> Result<HttpResponse, DashboardError> {
    let query = query.into_inner();
    let nav = Nav::new(query.page, query.model);

    let body = match query.page {
        Page::Home => {
            let predictions = predictions::get_predictions(&mut rand::thread_rng());
            pages::home(nav, config.refresh_secs, &predictions)?
        }
        Page::About => pages::about(nav)?,
        Page::Statistics => pages::statistics(nav)?,
        Page::Stocks => {
            let ticker = match query.ticker.as_deref().map(utils::sanitize_ticker) {
                Some(ticker) if !ticker.is_empty() => ticker,
                _ => STOCKS[0].symbol.to_string(),
            };
            let period = query.period.unwrap_or(config.default_period);
            let interval = query.interval.unwrap_or(config.default_interval);

            let data = api.get_stock(&ticker, period, interval).await?;
            let output = if (period, interval) == (Period::Max, Interval::OneDay) {
                pipeline.run(&data.history)?
            } else {
                let full_history = api
                    .get_history(&ticker, Period::Max, Interval::OneDay)
                    .await?;
                pipeline.run(&full_history)?
            };

            info!(
                "dashboard | ticker: {} | bars: {} | forecast: {} {}%",
                ticker,
                data.history.len(),
                output.prediction.action,
                output.prediction.accuracy
            );

            pages::stocks(nav, &ticker, period, interval, &data, &output)?
        }
    };

    Ok(HttpResponse::Ok()
        .content_type(ContentType::html())
        .body(body))
}

#[get("/healthcheck")]
async fn healthcheck() -> impl Responder {
    web::Json(HealthcheckResponse {
        status: "ok".to_string(),
    })
}

async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(HealthcheckResponse {
        status: "not found".to_string(),
    })
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthcheck)
        .service(dashboard)
        .default_service(web::to(not_found));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let config = match Config::new() {
        Ok(config) => config,
        Err(e) => {
            error!("Could not create config: {}", e);
            exit(1);
        }
    };
    let pipeline = match ForecastPipeline::new(config.forecast) {
        Ok(pipeline) => pipeline,
        Err(e) => {
            error!("Could not create forecast pipeline: {}", e);
            exit(1);
        }
    };

    let yahoo_api = web::Data::new(YahooAPI::new(&config.yahoo_base_url));
    let pipeline = web::Data::new(pipeline);
    let bind = (config.host.clone(), config.port);
    let workers = config.workers;
    info!(
        "Serving dashboard on http://{}:{} with {} worker(s)",
        bind.0, bind.1, workers
    );
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .app_data(yahoo_api.clone())
            .app_data(pipeline.clone())
            .configure(routes)
            .wrap(Logger::default())
    })
    .bind(bind)?
    .workers(workers)
    .run()
    .await
}
