pub mod animation;
pub mod brand;
pub mod countdown;
pub mod error;
pub mod flip;
pub mod html;
pub mod layout;
pub mod raster;
pub mod remaining;
pub mod render;
pub mod surface;
pub mod svg;

pub use countdown::{Countdown, Format, Payload, RenderOptions};
pub use error::{Error, Result};
