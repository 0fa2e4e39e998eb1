use std::path::Path;

use crate::error::{ConfigError, EvolveError};
use crate::render::PixelBuffer;

/// decode an image file as straight RGBA8. the canvas size comes from the image.
pub fn load_target(path: &Path) -> Result<PixelBuffer, EvolveError> {
    profiling::scope!("load_target");
    let img = image::open(path).map_err(|source| EvolveError::ImageLoad {
        path: path.to_path_buf(),
        source,
    })?;
    let rgba8 = img.to_rgba8();
    let (w, h) = rgba8.dimensions();
    if w == 0 || h == 0 {
        return Err(ConfigError::EmptyCanvas { width: w, height: h }.into());
    }
    log::info!("loaded target {} ({}x{})", path.display(), w, h);
    Ok(PixelBuffer::from_rgba(w, h, rgba8.into_raw())?)
}

/// write a phenotype as PNG (used by the headless runner, never by the engine)
pub fn save_png(buffer: &PixelBuffer, path: &Path) -> Result<(), image::ImageError> {
    image::save_buffer(
        path,
        buffer.data(),
        buffer.width(),
        buffer.height(),
        image::ExtendedColorType::Rgba8,
    )
}
