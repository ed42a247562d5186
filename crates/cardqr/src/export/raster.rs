//! Raster export.

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};

use image::{GrayImage, ImageFormat, Luma};

use crate::config::MAX_RASTER_SCALE;
use crate::error::{Error, Result};

use super::render::RenderedQr;

const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

/// Turns a rendered QR into PNG bytes.
///
/// Implementations run on a blocking worker and must not touch async state.
/// A blocking worker can't be aborted, so implementations should poll
/// `cancel` and give up once it is set; the export has already failed by then.
pub trait Rasterizer: Send + Sync + std::fmt::Debug {
    /// Rasterize `qr` at `scale` times its nominal size and encode as PNG.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding fails or `cancel` was set.
    fn rasterize(&self, qr: &RenderedQr, scale: u32, cancel: &AtomicBool) -> Result<Vec<u8>>;
}

/// Draws the vector geometry module by module, so scaled output stays crisp.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModuleRasterizer;

impl ModuleRasterizer {
    /// Draw `qr` as a grayscale bitmap at `scale` times its nominal size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if `scale` exceeds
    /// [`MAX_RASTER_SCALE`] or the bitmap edge overflows.
    pub fn draw(qr: &RenderedQr, scale: u32) -> Result<GrayImage> {
        Self::draw_until(qr, scale, &AtomicBool::new(false))
    }

    fn draw_until(qr: &RenderedQr, scale: u32, cancel: &AtomicBool) -> Result<GrayImage> {
        let scale = scale.max(1);
        if scale > MAX_RASTER_SCALE {
            return Err(Error::ConfigValidation {
                message: format!("raster_scale must be at most {MAX_RASTER_SCALE}, got {scale}"),
            });
        }
        let (Some(edge), Some(module_edge)) = (
            qr.nominal_size().checked_mul(scale),
            qr.module_px().checked_mul(scale),
        ) else {
            return Err(Error::ConfigValidation {
                message: format!(
                    "{} px at scale {scale} is too large to rasterize",
                    qr.nominal_size()
                ),
            });
        };

        let mut bitmap = GrayImage::new(edge, edge);
        for y in 0..edge {
            if cancel.load(Ordering::Relaxed) {
                return Err(Error::timeout("PNG rasterization"));
            }
            let my = (y / module_edge) as usize;
            for x in 0..edge {
                let mx = (x / module_edge) as usize;
                let pixel = if qr.is_dark(mx, my) { DARK } else { LIGHT };
                bitmap.put_pixel(x, y, pixel);
            }
        }
        Ok(bitmap)
    }
}

impl Rasterizer for ModuleRasterizer {
    fn rasterize(&self, qr: &RenderedQr, scale: u32, cancel: &AtomicBool) -> Result<Vec<u8>> {
        let bitmap = Self::draw_until(qr, scale, cancel)?;
        let mut bytes = Vec::new();
        bitmap.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::render::RenderOptions;

    fn sample() -> RenderedQr {
        RenderedQr::render("a", "hello", RenderOptions::default()).unwrap()
    }

    #[test]
    fn test_draw_doubles_dimensions() {
        let qr = sample();
        let bitmap = ModuleRasterizer::draw(&qr, 2).unwrap();

        assert_eq!(bitmap.width(), qr.nominal_size() * 2);
        assert_eq!(bitmap.height(), qr.nominal_size() * 2);
    }

    #[test]
    fn test_draw_matches_modules() {
        let qr = sample();
        let bitmap = ModuleRasterizer::draw(&qr, 2).unwrap();
        let edge = qr.module_px() * 2;

        // Quiet zone corner
        assert_eq!(*bitmap.get_pixel(0, 0), LIGHT);
        // First finder module, sampled at its center
        let center = 4 * edge + edge / 2;
        assert_eq!(*bitmap.get_pixel(center, center), DARK);
    }

    #[test]
    fn test_oversized_scale_rejected() {
        let qr = sample();

        let err = ModuleRasterizer
            .rasterize(&qr, 20_000_000, &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
        assert!(ModuleRasterizer::draw(&qr, MAX_RASTER_SCALE + 1).is_err());
    }

    #[test]
    fn test_cancelled_rasterize_stops() {
        let qr = sample();

        let err = ModuleRasterizer
            .rasterize(&qr, 2, &AtomicBool::new(true))
            .unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_rasterize_produces_png() {
        let qr = sample();
        let bytes = ModuleRasterizer
            .rasterize(&qr, 2, &AtomicBool::new(false))
            .unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), qr.nominal_size() * 2);
    }
}
