#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Invalid timezone")]
    InvalidTimezone,

    #[error("Invalid target moment: {0}")]
    InvalidTarget(String),

    #[error(transparent)]
    InvalidDateFormat(#[from] chrono::ParseError),

    #[error("Failed to render template: {0}")]
    Template(#[from] askama::Error),

    #[error("Failed to parse SVG: {0}")]
    Svg(#[from] usvg::Error),

    #[error("Failed to allocate a {width}x{height} surface")]
    SurfaceAllocation { width: u32, height: u32 },

    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
