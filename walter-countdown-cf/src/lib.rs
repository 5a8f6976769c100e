use std::sync::Arc;

use walter_countdown::{
    brand::Brand, raster::embedded_fonts, remaining::TargetMoment, Countdown, Format,
    RenderOptions,
};
use worker::*;

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

#[derive(Debug, PartialEq)]
enum Route {
    Index,
    Health,
    Countdown(Format),
    NotFound,
}

impl Route {
    fn from_path(path: &str) -> Self {
        match path {
            "/" => Route::Index,
            "/ok" => Route::Health,
            "/api/countdown" => Route::Countdown(Format::Svg),
            _ => path
                .strip_prefix("/api/countdown.")
                .and_then(Format::from_extension)
                .map_or(Route::NotFound, Route::Countdown),
        }
    }
}

#[event(start)]
fn start() {
    console_log::init_with_level(log::Level::Debug).ok();
    console_error_panic_hook::set_once();
}

#[event(fetch)]
async fn main(req: Request, _env: Env, _ctx: Context) -> Result<Response> {
    let mut resp = if req.method() == Method::Options {
        Response::empty()?
    } else {
        match Route::from_path(&req.path()) {
            Route::Index => {
                let mut resp = Response::empty()?.with_status(302);
                resp.headers_mut().set("Location", "/api/countdown.png")?;
                resp
            }
            Route::Health => Response::empty()?,
            Route::Countdown(format) => render(&req, format)?,
            Route::NotFound => {
                Response::from_json(&serde_json::json!({ "error": "Not found" }))?.with_status(404)
            }
        }
    };

    for (name, value) in CORS_HEADERS {
        resp.headers_mut().set(name, value)?;
    }
    Ok(resp)
}

fn render(req: &Request, format: Format) -> Result<Response> {
    let url = req.url()?;
    let query = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    };
    let options = RenderOptions::from_query(query("width").as_deref(), query("scale").as_deref());

    let payload = TargetMoment::launch().and_then(|target| {
        Countdown::new(target, Brand::Text, Arc::new(embedded_fonts()))
            .render_now(format, &options)
    });

    match payload {
        Ok(payload) => {
            let mut headers = Headers::new();
            for (name, value) in payload.headers() {
                headers.set(name, value)?;
            }
            Ok(Response::from_bytes(payload.body)?.with_headers(headers))
        }
        Err(err) => {
            log::error!("Failed to render countdown: {err}");
            Response::error("Error generating countdown", 500)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_pick_the_format() {
        assert_eq!(Route::from_path("/"), Route::Index);
        assert_eq!(Route::from_path("/ok"), Route::Health);
        assert_eq!(
            Route::from_path("/api/countdown.png"),
            Route::Countdown(Format::Png)
        );
        assert_eq!(
            Route::from_path("/api/countdown.gif"),
            Route::Countdown(Format::Gif)
        );
        assert_eq!(
            Route::from_path("/api/countdown"),
            Route::Countdown(Format::Svg)
        );
    }

    #[test]
    fn unknown_paths_are_not_found() {
        assert_eq!(Route::from_path("/api/countdown.bmp"), Route::NotFound);
        assert_eq!(Route::from_path("/favicon.ico"), Route::NotFound);
    }
}
