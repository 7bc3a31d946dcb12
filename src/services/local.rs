//! Image provider and crop service backed by local files.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use image::ImageBuffer;
use sbat_render::Raster;

use super::{CropRequest, CropService, ImageProvider, LoadedImage, ServiceError};
use crate::model::ImageSize;

/// The most recent crop result, addressable by its derived name.
#[derive(Debug, Clone)]
struct DerivedImage {
    name: String,
    raster: Raster,
}

/// Decodes TIFF files from disk with the `image` crate.
///
/// Only the latest crop is kept in memory, under a derived name, so that a
/// crop of a crop addresses the pixels currently on screen. Loading a file
/// drops it.
#[derive(Debug, Clone, Default)]
pub struct LocalTiffProvider {
    root: Option<PathBuf>,
    derived: Arc<Mutex<Option<DerivedImage>>>,
}

impl LocalTiffProvider {
    /// Relative sources are resolved against `root` when given.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            derived: Arc::default(),
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(source),
            None => PathBuf::from(source),
        }
    }

    fn derived(&self) -> MutexGuard<'_, Option<DerivedImage>> {
        self.derived
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn cached(&self, source: &str) -> Option<Raster> {
        self.derived()
            .as_ref()
            .filter(|d| d.name == source)
            .map(|d| d.raster.clone())
    }

    fn decode_file(&self, source: &str) -> Result<Raster, ServiceError> {
        let path = self.resolve(source);
        let bytes = std::fs::read(&path).map_err(|e| ServiceError::io(&path, e))?;
        let decoded = image::load_from_memory(&bytes).map_err(|e| ServiceError::Decode {
            name: source.to_string(),
            message: e.to_string(),
        })?;
        log::debug!(
            "Decoded {:?}: {}x{} ({:?})",
            path,
            decoded.width(),
            decoded.height(),
            decoded.color()
        );
        let pixels = decoded.to_rgba8();
        let (width, height) = pixels.dimensions();
        to_raster(pixels.into_raw(), width, height, source)
    }

    /// The derived image if `source` names it, otherwise the file on disk.
    fn pixels(&self, source: &str) -> Result<Raster, ServiceError> {
        match self.cached(source) {
            Some(raster) => Ok(raster),
            None => self.decode_file(source),
        }
    }
}

fn to_raster(data: Vec<u8>, width: u32, height: u32, source: &str) -> Result<Raster, ServiceError> {
    Raster::from_rgba8(data, width, height).map_err(|e| ServiceError::Decode {
        name: source.to_string(),
        message: e.to_string(),
    })
}

fn into_loaded(raster: Raster, source: String) -> Result<LoadedImage, ServiceError> {
    let size = ImageSize::new(raster.width(), raster.height()).ok_or_else(|| ServiceError::Decode {
        name: source.clone(),
        message: "image has no pixels".to_string(),
    })?;
    Ok(LoadedImage {
        raster,
        size,
        source,
    })
}

impl ImageProvider for LocalTiffProvider {
    fn load(&self, source: &str) -> Result<LoadedImage, ServiceError> {
        let raster = match self.cached(source) {
            Some(raster) => raster,
            None => {
                let raster = self.decode_file(source)?;
                if self.derived().take().is_some() {
                    log::debug!("Dropped derived crop, {} replaces it", source);
                }
                raster
            }
        };
        log::info!("📷 Loaded {} ({}x{})", source, raster.width(), raster.height());
        into_loaded(raster, source.to_string())
    }
}

impl CropService for LocalTiffProvider {
    fn crop(&self, request: &CropRequest) -> Result<LoadedImage, ServiceError> {
        let source = self.pixels(&request.filename)?;
        let (width, height) = (source.width(), source.height());
        if request.x >= width || request.y >= height {
            return Err(ServiceError::InvalidRequest(format!(
                "crop origin ({}, {}) outside {}x{} image",
                request.x, request.y, width, height
            )));
        }
        let w = request.width.min(width - request.x);
        let h = request.height.min(height - request.y);
        if w == 0 || h == 0 {
            return Err(ServiceError::InvalidRequest("crop region is empty".to_string()));
        }

        let view = ImageBuffer::<image::Rgba<u8>, Vec<u8>>::from_raw(width, height, source.data().to_vec())
            .ok_or_else(|| ServiceError::Decode {
                name: request.filename.clone(),
                message: "pixel buffer does not match its dimensions".to_string(),
            })?;
        let cropped = image::imageops::crop_imm(&view, request.x, request.y, w, h).to_image();
        let name = format!(
            "{}@{},{},{}x{}",
            request.filename, request.x, request.y, w, h
        );
        let raster = to_raster(cropped.into_raw(), w, h, &name)?;
        log::info!("✂️  Cropped {} -> {}", request.filename, name);
        *self.derived() = Some(DerivedImage {
            name: name.clone(),
            raster: raster.clone(),
        });
        into_loaded(raster, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    fn write_test_tiff(name: &str, width: u32, height: u32) -> (PathBuf, String) {
        let dir = std::env::temp_dir().join(format!("sbat-local-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        let file = format!("{}.tif", name);
        let img = RgbaImage::from_fn(width, height, |x, y| {
            image::Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255])
        });
        img.save(dir.join(&file)).unwrap();
        (dir, file)
    }

    #[test]
    fn test_load_tiff_from_root() {
        let (dir, file) = write_test_tiff("load", 12, 8);
        let provider = LocalTiffProvider::new(Some(dir.clone()));
        let loaded = provider.load(&file).unwrap();
        std::fs::remove_dir_all(&dir).ok();

        assert_eq!(loaded.size, ImageSize::new(12, 8).unwrap());
        assert_eq!(loaded.source, file);
        assert_eq!(&loaded.raster.data()[..4], &[0, 0, 7, 255]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let provider = LocalTiffProvider::new(Some(std::env::temp_dir()));
        assert!(matches!(
            provider.load("sbat-does-not-exist.tif"),
            Err(ServiceError::Io { .. })
        ));
    }

    #[test]
    fn test_crop_of_crop_uses_derived_pixels() {
        let (dir, file) = write_test_tiff("crop", 20, 20);
        let provider = LocalTiffProvider::new(Some(dir.clone()));

        let first = provider
            .crop(&CropRequest {
                filename: file.clone(),
                x: 5,
                y: 6,
                width: 10,
                height: 10,
            })
            .unwrap();
        assert_eq!(first.size, ImageSize::new(10, 10).unwrap());

        let second = provider
            .crop(&CropRequest {
                filename: first.source.clone(),
                x: 1,
                y: 1,
                width: 50,
                height: 2,
            })
            .unwrap();
        std::fs::remove_dir_all(&dir).ok();

        // Clipped to the 10x10 derived image.
        assert_eq!(second.size, ImageSize::new(9, 2).unwrap());
        assert_eq!(&second.raster.data()[..4], &[6, 7, 7, 255]);
    }

    #[test]
    fn test_crop_outside_image_is_rejected() {
        let (dir, file) = write_test_tiff("outside", 4, 4);
        let provider = LocalTiffProvider::new(Some(dir.clone()));
        let result = provider.crop(&CropRequest {
            filename: file,
            x: 4,
            y: 0,
            width: 1,
            height: 1,
        });
        std::fs::remove_dir_all(&dir).ok();
        assert!(matches!(result, Err(ServiceError::InvalidRequest(_))));
    }

    #[test]
    fn test_only_latest_crop_is_kept() {
        let (dir, file) = write_test_tiff("latest", 16, 16);
        let provider = LocalTiffProvider::new(Some(dir.clone()));
        let region = |filename: &str, x: u32| CropRequest {
            filename: filename.to_string(),
            x,
            y: 0,
            width: 4,
            height: 4,
        };

        let first = provider.crop(&region(&file, 0)).unwrap();
        let second = provider.crop(&region(&file, 8)).unwrap();
        let on_screen = provider.load(&second.source).unwrap();
        assert!(on_screen.raster.ptr_eq(&second.raster));

        // The earlier crop was replaced, so its name now resolves to a missing file.
        assert!(matches!(provider.load(&first.source), Err(ServiceError::Io { .. })));

        // Loading a file drops the derived image.
        provider.load(&file).unwrap();
        std::fs::remove_dir_all(&dir).ok();
        assert!(provider.cached(&second.source).is_none());
    }
}
