//! QR rendering.
//!
//! A [`RenderedQr`] is the vector markup for one payload together with the
//! geometry needed to rasterize it again at any scale.

use qrcode::render::{svg, unicode};
use qrcode::{Color, EcLevel, QrCode};
use tracing::debug;

use crate::config::{ExportConfig, MAX_QR_SIZE};
use crate::error::{Error, Result};

/// Quiet zone width in modules for standard QR codes.
pub const QUIET_ZONE: usize = 4;

/// How a payload is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    /// Target edge length in pixels; the actual size rounds up to a whole
    /// number of pixels per module.
    pub size: u32,
    /// Draw the quiet zone around the code.
    pub include_margin: bool,
    /// Error correction level.
    pub ec_level: EcLevel,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            size: 256,
            include_margin: true,
            ec_level: EcLevel::M,
        }
    }
}

impl From<&ExportConfig> for RenderOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            size: config.qr_size,
            include_margin: config.include_margin,
            ec_level: parse_ec_level(&config.error_correction),
        }
    }
}

/// Map an L/M/Q/H letter to a level. Unknown letters get `M`; config
/// validation rejects them before this point.
#[must_use]
pub fn parse_ec_level(level: &str) -> EcLevel {
    match level {
        "L" => EcLevel::L,
        "Q" => EcLevel::Q,
        "H" => EcLevel::H,
        _ => EcLevel::M,
    }
}

/// A QR code rendered as SVG markup, registered under a stable id.
#[derive(Clone)]
pub struct RenderedQr {
    id: String,
    payload: String,
    code: QrCode,
    markup: String,
    quiet_zone: usize,
    module_px: u32,
}

impl RenderedQr {
    /// Encode `payload` and draw it as SVG.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QrEncode`] if the payload doesn't fit in any QR version,
    /// or [`Error::ConfigValidation`] if `options.size` exceeds [`MAX_QR_SIZE`].
    pub fn render(id: impl Into<String>, payload: &str, options: RenderOptions) -> Result<Self> {
        if options.size > MAX_QR_SIZE {
            return Err(Error::ConfigValidation {
                message: format!("qr_size must be at most {MAX_QR_SIZE}, got {}", options.size),
            });
        }
        let code = QrCode::with_error_correction_level(payload.as_bytes(), options.ec_level)
            .map_err(|e| Error::qr_encode(format!("{e} ({} bytes)", payload.len())))?;

        let quiet_zone = if options.include_margin { QUIET_ZONE } else { 0 };
        let modules = module_count(code.width(), quiet_zone);
        let module_px = options.size.div_ceil(modules).max(1);

        let markup = code
            .render::<svg::Color>()
            .quiet_zone(options.include_margin)
            .module_dimensions(module_px, module_px)
            .dark_color(svg::Color("#000000"))
            .light_color(svg::Color("#ffffff"))
            .build();

        let id = id.into();
        debug!(
            "Rendered {} as {}x{} modules at {} px each",
            id,
            code.width(),
            code.width(),
            module_px
        );
        Ok(Self {
            id,
            payload: payload.to_string(),
            code,
            markup,
            quiet_zone,
            module_px,
        })
    }

    /// The identifier this rendering is registered under.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The encoded text.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The serialized SVG document.
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Modules per side including the quiet zone.
    #[must_use]
    pub fn modules(&self) -> u32 {
        module_count(self.code.width(), self.quiet_zone)
    }

    /// Pixels per module at nominal size.
    #[must_use]
    pub fn module_px(&self) -> u32 {
        self.module_px
    }

    /// Edge length of the SVG in pixels.
    #[must_use]
    pub fn nominal_size(&self) -> u32 {
        self.modules() * self.module_px
    }

    /// Whether the module at (`x`, `y`) is dark. Coordinates include the
    /// quiet zone; anything outside the symbol is light.
    #[must_use]
    pub fn is_dark(&self, x: usize, y: usize) -> bool {
        let width = self.code.width();
        let (Some(x), Some(y)) = (x.checked_sub(self.quiet_zone), y.checked_sub(self.quiet_zone))
        else {
            return false;
        };
        x < width && y < width && self.code[(x, y)] == Color::Dark
    }

    /// Half-block Unicode rendering for terminals.
    #[must_use]
    pub fn terminal_preview(&self) -> String {
        self.code
            .render::<unicode::Dense1x2>()
            .quiet_zone(self.quiet_zone > 0)
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .build()
    }
}

impl std::fmt::Debug for RenderedQr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderedQr")
            .field("id", &self.id)
            .field("payload", &self.payload)
            .field("width", &self.code.width())
            .field("quiet_zone", &self.quiet_zone)
            .field("module_px", &self.module_px)
            .finish_non_exhaustive()
    }
}

fn module_count(width: usize, quiet_zone: usize) -> u32 {
    u32::try_from(width + 2 * quiet_zone).unwrap_or(u32::MAX)
}
