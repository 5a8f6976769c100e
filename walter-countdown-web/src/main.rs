use std::{env, path::PathBuf, sync::Arc};

use actix_web::{
    error::BlockingError,
    get,
    http::{header, Method, StatusCode},
    middleware, route, web, App, HttpRequest, HttpResponse, HttpServer, Responder, ResponseError,
};
use serde::Deserialize;
use walter_countdown::{
    brand::Brand, raster::load_fonts, remaining::TargetMoment, Countdown, Format, RenderOptions,
};

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error("Failed to render countdown")]
    Render(#[from] walter_countdown::Error),

    #[error("Render task was cancelled")]
    Blocking(#[from] BlockingError),
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Error::Render(err) => log::error!("{self}: {err}"),
            Error::Blocking(_) => log::error!("{self}"),
        }
        HttpResponse::InternalServerError()
            .content_type("text/plain; charset=utf-8")
            .body("Error generating countdown")
    }
}

type Result<T, E = Error> = std::result::Result<T, E>;

struct Config {
    listen_address: String,
    brand_image: PathBuf,
    font_dir: Option<PathBuf>,
}

impl Config {
    fn from_env() -> Self {
        Self {
            listen_address: env::var("LISTEN_ADDRESS").unwrap_or("127.0.0.1:8080".to_string()),
            brand_image: env::var("BRAND_IMAGE")
                .unwrap_or("assets/walter-text.png".to_string())
                .into(),
            font_dir: env::var_os("FONT_DIR").map(PathBuf::from),
        }
    }
}

#[get("/ok")]
async fn ok() -> impl Responder {
    HttpResponse::Ok()
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Found()
        .insert_header((header::LOCATION, "/api/countdown.png"))
        .finish()
}

#[derive(Deserialize)]
struct CountdownQuery {
    width: Option<String>,
    scale: Option<String>,
}

/// `/api/countdown` with no extension serves the SVG.
#[route("/api/countdown", method = "GET", method = "POST")]
async fn countdown_svg(
    countdown: web::Data<Countdown>,
    query: web::Query<CountdownQuery>,
) -> Result<HttpResponse> {
    respond(countdown, Format::Svg, &query).await
}

#[route("/api/countdown.{format}", method = "GET", method = "POST")]
async fn countdown_as(
    countdown: web::Data<Countdown>,
    format: web::Path<String>,
    query: web::Query<CountdownQuery>,
) -> Result<HttpResponse> {
    let Some(format) = Format::from_extension(&format) else {
        return Ok(not_found());
    };
    respond(countdown, format, &query).await
}

async fn respond(
    countdown: web::Data<Countdown>,
    format: Format,
    query: &CountdownQuery,
) -> Result<HttpResponse> {
    let options = RenderOptions::from_query(query.width.as_deref(), query.scale.as_deref());

    let payload = web::block(move || countdown.render_now(format, &options)).await??;

    let mut response = HttpResponse::Ok();
    for pair in payload.headers() {
        response.insert_header(pair);
    }
    Ok(response.body(payload.body))
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "Not found" }))
}

/// Preflight requests succeed on any path; everything else unmatched is a 404.
async fn fallback(req: HttpRequest) -> HttpResponse {
    if req.method() == Method::OPTIONS {
        HttpResponse::Ok().finish()
    } else {
        not_found()
    }
}

fn cors() -> middleware::DefaultHeaders {
    middleware::DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Methods", "GET, POST, OPTIONS"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(ok)
        .service(index)
        .service(countdown_svg)
        .service(countdown_as)
        .default_service(web::to(fallback));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    let target = TargetMoment::launch().map_err(std::io::Error::other)?;
    log::info!("Counting down to {}", target.instant());

    let countdown = web::Data::new(Countdown::new(
        target,
        Brand::load(&config.brand_image),
        Arc::new(load_fonts(config.font_dir.as_deref())),
    ));

    log::info!("Listening on {}", config.listen_address);
    HttpServer::new(move || {
        App::new()
            .app_data(countdown.clone())
            .wrap(middleware::Compress::default())
            .wrap(cors())
            .wrap(middleware::Logger::default())
            .configure(routes)
    })
    .bind(config.listen_address)?
    .run()
    .await
}
