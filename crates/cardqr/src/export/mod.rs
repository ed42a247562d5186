//! QR export pipeline.
//!
//! Profiles are rendered to QR vector markup and registered under a stable
//! per-profile id (see [`Profile::qr_id`]). Exports look the markup up by that
//! id and hand the finished file to a [`SaveSink`]:
//!
//! - **SVG**: the serialized markup as is.
//! - **PNG**: the markup rasterized at a multiple of its nominal size on a
//!   blocking worker, bounded by a timeout.
//!
//! Exporting an id that was never rendered logs an error and produces
//! nothing; that is a caller-state problem, not a data error.

mod raster;
mod render;
mod sink;

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::profile::Profile;
use crate::vcard;

pub use raster::{ModuleRasterizer, Rasterizer};
pub use render::{parse_ec_level, RenderOptions, RenderedQr, QUIET_ZONE};
pub use sink::{DirectorySink, MemorySink, SaveSink, SavedFile};

/// Base name used when a file name sanitizes to nothing useful.
pub const DEFAULT_FILE_NAME: &str = "business-card-qr";

/// Exported file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Vector image.
    Svg,
    /// Raster image.
    Png,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
        }
    }

    /// MIME type of the exported file.
    #[must_use]
    pub fn mime(self) -> &'static str {
        match self {
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Reduce `name` to a safe lower-case base file name.
///
/// Every character outside `[A-Za-z0-9]` becomes `_`. If nothing
/// alphanumeric survives, [`DEFAULT_FILE_NAME`] is used instead.
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let base: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();

    if base.chars().any(|c| c.is_ascii_alphanumeric()) {
        base
    } else {
        DEFAULT_FILE_NAME.to_string()
    }
}

/// Export tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSettings {
    /// How QR codes are drawn.
    pub render: RenderOptions,
    /// Raster supersampling factor.
    pub raster_scale: u32,
    /// Upper bound on rasterization.
    pub raster_timeout: Duration,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            render: RenderOptions::default(),
            raster_scale: 2,
            raster_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&Config> for ExportSettings {
    fn from(config: &Config) -> Self {
        Self {
            render: RenderOptions::from(&config.export),
            raster_scale: config.export.raster_scale,
            raster_timeout: config.raster_timeout(),
        }
    }
}

/// Renders profiles to QR codes and exports them as files.
#[derive(Debug)]
pub struct QrExporter {
    renders: HashMap<String, RenderedQr>,
    sink: Arc<dyn SaveSink>,
    rasterizer: Arc<dyn Rasterizer>,
    settings: ExportSettings,
}

impl QrExporter {
    /// Create an exporter writing to `sink`.
    #[must_use]
    pub fn new(sink: Arc<dyn SaveSink>, settings: ExportSettings) -> Self {
        Self {
            renders: HashMap::new(),
            sink,
            rasterizer: Arc::new(ModuleRasterizer),
            settings,
        }
    }

    /// Replace the rasterizer used for PNG export.
    #[must_use]
    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn Rasterizer>) -> Self {
        self.rasterizer = rasterizer;
        self
    }

    /// Render `profile`'s vCard and register it under the profile's QR id,
    /// replacing any earlier rendering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QrEncode`] if the vCard is too large for a QR code.
    pub fn render(&mut self, profile: &Profile) -> Result<&RenderedQr> {
        let qr_id = profile.qr_id();
        let payload = vcard::encode(profile);
        let rendered = RenderedQr::render(qr_id.clone(), &payload, self.settings.render)?;
        debug!("Registered {} ({} byte payload)", qr_id, payload.len());

        let slot = match self.renders.entry(qr_id) {
            Entry::Occupied(mut entry) => {
                entry.insert(rendered);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(rendered),
        };
        Ok(slot)
    }

    /// Look up a registered rendering.
    #[must_use]
    pub fn rendered(&self, qr_id: &str) -> Option<&RenderedQr> {
        self.renders.get(qr_id)
    }

    /// Drop a registered rendering. Returns `true` if one existed.
    pub fn discard(&mut self, qr_id: &str) -> bool {
        self.renders.remove(qr_id).is_some()
    }

    /// Export the rendering registered as `qr_id` under a name derived from
    /// `file_name`.
    ///
    /// Returns `Ok(None)` without saving anything if `qr_id` isn't registered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Timeout`] if rasterization overruns, or an error from
    /// encoding or the sink.
    pub async fn export(
        &self,
        qr_id: &str,
        format: ExportFormat,
        file_name: &str,
    ) -> Result<Option<SavedFile>> {
        let Some(rendered) = self.renders.get(qr_id) else {
            error!("QR code element not found: {}", qr_id);
            return Ok(None);
        };

        let name = format!("{}.{}", sanitize_file_name(file_name), format.extension());
        let bytes = match format {
            ExportFormat::Svg => rendered.markup().as_bytes().to_vec(),
            ExportFormat::Png => self.rasterize(rendered).await?,
        };

        let saved = self.sink.save(&name, format.mime(), &bytes)?;
        info!("Exported {} as {}", qr_id, saved.file_name);
        Ok(Some(saved))
    }

    async fn rasterize(&self, rendered: &RenderedQr) -> Result<Vec<u8>> {
        let rendered = rendered.clone();
        let rasterizer = Arc::clone(&self.rasterizer);
        let scale = self.settings.raster_scale;
        let cancel = Arc::new(AtomicBool::new(false));
        let worker_cancel = Arc::clone(&cancel);

        // The runtime waits for blocking workers on shutdown, so an abandoned
        // worker must notice `cancel` for the process to exit promptly.
        let task = tokio::task::spawn_blocking(move || {
            rasterizer.rasterize(&rendered, scale, &worker_cancel)
        });
        match tokio::time::timeout(self.settings.raster_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(Error::internal(format!(
                "rasterizer task failed: {join_err}"
            ))),
            Err(_) => {
                cancel.store(true, Ordering::Relaxed);
                error!(
                    "Rasterization exceeded {:?}; abandoning PNG export",
                    self.settings.raster_timeout
                );
                Err(Error::timeout("PNG rasterization"))
            }
        }
    }
}
