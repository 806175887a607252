use std::path::Path;

use base64::Engine as _;
use chrono::{DateTime, TimeZone};

/// Failure to produce or write the thumbnail
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no snapshot has been captured yet")]
    NoSnapshot,
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("failed to write thumbnail: {0}")]
    Io(#[from] std::io::Error),
}

/// Baked thumbnail: the snapshot at its current offset/scale on a
/// guide-free, background-free surface, encoded as PNG.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRaster {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl ExportRaster {
    pub fn new(png: Vec<u8>, width: u32, height: u32) -> Self {
        Self { png, width, height }
    }

    /// `data:image/png;base64,...`
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.png);
        format!("data:image/png;base64,{encoded}")
    }

    /// Write the PNG bytes to `path`
    pub fn save(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, &self.png)?;
        tracing::info!("Saved thumbnail to {}", path.display());
        Ok(())
    }

    /// Decode back to pixels, e.g. for display or inspection
    pub fn decode(&self) -> Result<image::RgbaImage, ExportError> {
        let img = image::load_from_memory_with_format(&self.png, image::ImageFormat::Png)?;
        Ok(img.to_rgba8())
    }
}

/// `thumbnail-YYYY-MM-DDTHH-MM-SS.png`; colons are replaced so the name is
/// valid on every filesystem.
pub fn suggested_filename<Tz: TimeZone>(timestamp: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("thumbnail-{}.png", timestamp.format("%Y-%m-%dT%H-%M-%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn filename_uses_timestamp_without_colons() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(suggested_filename(&ts), "thumbnail-2024-03-09T14-05-07.png");
    }

    #[test]
    fn data_uri_prefix() {
        let raster = ExportRaster::new(vec![0x89, b'P', b'N', b'G'], 1, 1);
        assert_eq!(raster.to_data_uri(), "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn save_writes_bytes() {
        let dir = std::env::temp_dir().join(format!("modelshot-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("t.png");
        let raster = ExportRaster::new(vec![1, 2, 3], 1, 1);
        raster.save(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);
        let _ = std::fs::remove_dir_all(&dir);
    }
}
