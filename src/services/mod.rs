//! External collaborators: image loading, cropping, detection and export.
//!
//! Each collaborator is a trait so the session never depends on transport.
//! Requests are executed off the UI thread by a [`ServiceWorker`]; their
//! results come back tagged with the [`Ticket`](crate::session::Ticket) they
//! were issued with.

mod error;
mod local;
mod types;
mod worker;

use std::path::Path;

pub use error::ServiceError;
pub use local::LocalTiffProvider;
pub use types::{
    CropRequest, DetectionRequest, DetectionResponse, ExportRequest, LoadedImage, UploadResponse,
};
pub use worker::{Completed, ServiceWorker};

use crate::constants::ACCEPTED_EXTENSIONS;

/// Supplies a decoded raster for a source identifier.
pub trait ImageProvider: Send {
    fn load(&self, source: &str) -> Result<LoadedImage, ServiceError>;
}

/// Cuts a pixel region out of a source image.
pub trait CropService: Send {
    fn crop(&self, request: &CropRequest) -> Result<LoadedImage, ServiceError>;
}

/// Runs object detection on the current image.
pub trait DetectionService: Send {
    fn detect(&self, request: &DetectionRequest) -> Result<DetectionResponse, ServiceError>;
}

/// Packages labels into a downloadable archive.
pub trait ExportService: Send {
    fn export(&self, request: &ExportRequest) -> Result<Vec<u8>, ServiceError>;
}

/// Reject sources without a `.tif`/`.tiff` extension (any case).
pub fn validate_source_extension(source: &str) -> Result<(), ServiceError> {
    let accepted = Path::new(source)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        });
    if accepted {
        Ok(())
    } else {
        Err(ServiceError::UnsupportedExtension {
            name: source.to_string(),
        })
    }
}

/// Work the session hands to the service layer.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceRequest {
    LoadImage { source: String },
    Crop(CropRequest),
    Detect(DetectionRequest),
    Export(ExportRequest),
}

impl ServiceRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceRequest::LoadImage { .. } => "image",
            ServiceRequest::Crop(_) => "crop",
            ServiceRequest::Detect(_) => "detection",
            ServiceRequest::Export(_) => "export",
        }
    }
}

/// Successful result of a [`ServiceRequest`].
#[derive(Debug, Clone)]
pub enum ServiceReply {
    Image(LoadedImage),
    Cropped(LoadedImage),
    Detected(DetectionResponse),
    Exported(Vec<u8>),
}

/// Stand-in for a collaborator that is not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl DetectionService for Unavailable {
    fn detect(&self, _request: &DetectionRequest) -> Result<DetectionResponse, ServiceError> {
        Err(ServiceError::Unavailable("detection"))
    }
}

impl ExportService for Unavailable {
    fn export(&self, _request: &ExportRequest) -> Result<Vec<u8>, ServiceError> {
        Err(ServiceError::Unavailable("export"))
    }
}

impl CropService for Unavailable {
    fn crop(&self, _request: &CropRequest) -> Result<LoadedImage, ServiceError> {
        Err(ServiceError::Unavailable("crop"))
    }
}

/// One implementation per collaborator.
pub struct Services {
    pub images: Box<dyn ImageProvider>,
    pub crop: Box<dyn CropService>,
    pub detection: Box<dyn DetectionService>,
    pub export: Box<dyn ExportService>,
}

impl Services {
    /// Local files for images and crops; detection and export unavailable.
    pub fn local(root: Option<&Path>) -> Self {
        let provider = LocalTiffProvider::new(root.map(Path::to_path_buf));
        Self {
            images: Box::new(provider.clone()),
            crop: Box::new(provider),
            detection: Box::new(Unavailable),
            export: Box::new(Unavailable),
        }
    }

    /// Run one request to completion on the calling thread.
    pub fn execute(&self, request: &ServiceRequest) -> Result<ServiceReply, ServiceError> {
        match request {
            ServiceRequest::LoadImage { source } => {
                validate_source_extension(source)?;
                self.images.load(source).map(ServiceReply::Image)
            }
            ServiceRequest::Crop(req) => self.crop.crop(req).map(ServiceReply::Cropped),
            ServiceRequest::Detect(req) => self.detection.detect(req).map(ServiceReply::Detected),
            ServiceRequest::Export(req) => self.export.export(req).map(ServiceReply::Exported),
        }
    }
}
