//! Per-image annotation session.
//!
//! A [`Session`] owns everything the canvas shows: the loaded image, the
//! viewport, the annotation store, the in-progress gesture and the display
//! settings. Service work is requested through [`Ticket`]s; each ticket
//! remembers the image generation it was issued against, and replies for an
//! image that is no longer shown are dropped.

use std::time::Duration;

use sbat_render::{Canvas, ImageAdjustments, RenderError, Renderer};
use thiserror::Error;

use crate::config::{AdjustmentRanges, AppConfig};
use crate::format::{FormatError, ImportReport, yolo};
use crate::gesture::{CursorIcon, GestureContext, GestureInterpreter, GestureOutcome, InputEvent};
use crate::model::{BoundingBox, ImageSize, Rgb};
use crate::render::{self, Scene};
use crate::services::{
    CropRequest, DetectionRequest, DetectionResponse, ExportRequest, LoadedImage, ServiceError,
    ServiceReply, ServiceRequest, ServiceWorker, validate_source_extension,
};
use crate::store::{AnnotationStore, StoreError};
use crate::viewport::Viewport;

/// Errors from session operations.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The operation needs image dimensions
    #[error("No image is loaded")]
    NoImage,

    #[error("Class {index} does not exist (palette has {len} classes)")]
    UnknownClass { index: usize, len: usize },

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Render failed: {0}")]
    Render(#[from] RenderError),
}

/// Which collaborator a ticket is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Image,
    Crop,
    Detection,
    Export,
}

/// Handle for an outstanding service request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub id: u64,
    /// Image generation at the time of the request
    pub generation: u64,
    pub kind: RequestKind,
}

/// What applying a service reply did.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyEffect {
    /// A new image (upload or crop) is now shown.
    ImageInstalled(ImageSize),
    /// Detection replaced the store with this many boxes.
    AnnotationsReplaced(usize),
    /// Archive bytes ready to be saved.
    ExportReady(Vec<u8>),
    /// The request failed; the message is also the session status.
    Failed(String),
    /// The reply belonged to an image that is no longer shown.
    Discarded,
}

/// State of one annotation canvas.
pub struct Session {
    viewport: Viewport,
    store: AnnotationStore,
    gestures: GestureInterpreter,
    image: Option<LoadedImage>,
    current_class: usize,
    crop_mode: bool,
    adjustments: ImageAdjustments,
    ranges: AdjustmentRanges,
    stroke_width: f64,
    detection_threshold: f32,
    model: String,

    /// Bumped whenever a new image is installed.
    generation: u64,
    /// Display changes not tracked by the store.
    revision: u64,
    drawn_revision: u64,

    next_ticket: u64,
    /// Most recent image or crop request; older ones lose the race.
    latest_image_ticket: Option<u64>,
    outbox: Vec<(Ticket, ServiceRequest)>,
    status: Option<String>,
}

impl Session {
    pub fn new(config: &AppConfig) -> Self {
        let prefs = &config.preferences;
        Self {
            viewport: Viewport::identity(),
            store: AnnotationStore::with_classes(config.classes.clone()),
            gestures: GestureInterpreter::with_zoom_factors(prefs.zoom_in_factor, prefs.zoom_out_factor)
                .with_zoom_limits(prefs.zoom_limits()),
            image: None,
            current_class: 0,
            crop_mode: false,
            adjustments: ImageAdjustments::default(),
            ranges: config.adjustments,
            stroke_width: prefs.stroke_width,
            detection_threshold: prefs.detection_threshold,
            model: prefs.model.clone(),
            generation: 0,
            revision: 0,
            drawn_revision: 0,
            next_ticket: 1,
            latest_image_ticket: None,
            outbox: Vec::new(),
            status: None,
        }
    }

    // --- accessors ---

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn image(&self) -> Option<&LoadedImage> {
        self.image.as_ref()
    }

    pub fn image_size(&self) -> Option<ImageSize> {
        self.image.as_ref().map(|img| img.size)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_class(&self) -> usize {
        self.current_class
    }

    pub fn crop_mode(&self) -> bool {
        self.crop_mode
    }

    pub fn adjustments(&self) -> ImageAdjustments {
        self.adjustments
    }

    pub fn gestures(&self) -> &GestureInterpreter {
        &self.gestures
    }

    pub fn cursor(&self) -> CursorIcon {
        self.gestures.cursor()
    }

    /// Last user-facing message, e.g. a service failure.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("Status: {}", message);
        self.status = Some(message);
    }

    fn require_size(&self) -> Result<ImageSize, SessionError> {
        self.image_size().ok_or(SessionError::NoImage)
    }

    fn source_name(&self) -> Result<String, SessionError> {
        self.image
            .as_ref()
            .map(|img| img.source.clone())
            .ok_or(SessionError::NoImage)
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // --- redraw tracking ---

    /// Monotonic change counter covering the store and all display state.
    pub fn revision(&self) -> u64 {
        // Both counters only grow, so their sum does too.
        self.revision + self.store.revision()
    }

    /// True once per change: call before painting a frame.
    pub fn take_redraw(&mut self) -> bool {
        let now = self.revision();
        let due = now != self.drawn_revision;
        self.drawn_revision = now;
        due
    }

    // --- input ---

    /// Route one input event through the gesture interpreter.
    ///
    /// A finished crop drag is turned into a crop request.
    pub fn handle_event(&mut self, event: &InputEvent) -> GestureOutcome {
        let mut ctx = GestureContext {
            viewport: &mut self.viewport,
            store: &mut self.store,
            image: self.image.as_ref().map(|img| img.size),
            current_class: self.current_class,
            crop_mode: self.crop_mode,
        };
        let outcome = self.gestures.handle(event, &mut ctx);

        if let GestureOutcome::CropRequested(region) = outcome {
            if let Err(e) = self.request_crop(&region) {
                self.set_status(format!("Crop failed: {}", e));
            }
        }
        if outcome.needs_redraw() {
            self.touch();
        }
        outcome
    }

    /// Abort the current gesture.
    pub fn cancel_gesture(&mut self) {
        if self.gestures.cancel().needs_redraw() {
            self.touch();
        }
    }

    /// Center and scale the image inside a `width x height` surface.
    pub fn fit_to_surface(&mut self, width: u32, height: u32) {
        if let Some(size) = self.image_size() {
            self.viewport = Viewport::fit(
                size.width_f64(),
                size.height_f64(),
                f64::from(width),
                f64::from(height),
            );
            self.touch();
        }
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.touch();
    }

    // --- settings ---

    pub fn set_current_class(&mut self, index: usize) -> Result<(), SessionError> {
        let len = self.store.classes().len();
        if index >= len {
            return Err(SessionError::UnknownClass { index, len });
        }
        self.current_class = index;
        // The draft outline follows the current class.
        self.touch();
        Ok(())
    }

    pub fn set_crop_mode(&mut self, enabled: bool) {
        if self.crop_mode != enabled {
            log::debug!("Crop mode {}", if enabled { "on" } else { "off" });
        }
        self.crop_mode = enabled;
    }

    /// Set brightness, clamped to the configured slider range.
    pub fn set_brightness(&mut self, value: f32) {
        self.adjustments.brightness = self.ranges.brightness.clamp(value);
        self.touch();
    }

    /// Set contrast, clamped to the configured slider range.
    pub fn set_contrast(&mut self, value: f32) {
        self.adjustments.contrast = self.ranges.contrast.clamp(value);
        self.touch();
    }

    pub fn set_class_color(&mut self, index: usize, color: Rgb) -> Result<(), SessionError> {
        self.store.set_class_color(index, color)?;
        Ok(())
    }

    pub fn set_detection_threshold(&mut self, threshold: f32) {
        self.detection_threshold = threshold;
    }

    // --- image and labels ---

    /// Show a new image. Boxes, view and gesture are reset.
    pub fn load_image(&mut self, image: LoadedImage) -> ImageSize {
        let size = image.size;
        log::info!(
            "🖼️  Showing {} ({}x{})",
            image.source,
            size.width(),
            size.height()
        );
        self.image = Some(image);
        self.generation += 1;
        self.viewport.reset();
        self.store.clear();
        self.gestures.cancel();
        self.touch();
        size
    }

    /// Replace all boxes with the contents of a label file.
    pub fn import_labels(&mut self, text: &str) -> Result<ImportReport, SessionError> {
        let size = self.require_size()?;
        let decoded = yolo::import(text, size);
        self.store.replace_all(decoded.boxes);
        log::info!(
            "Imported {} boxes ({} lines skipped)",
            decoded.report.imported,
            decoded.report.skipped
        );
        Ok(decoded.report)
    }

    /// Current boxes as normalized lines.
    pub fn export_labels(&self) -> Result<String, SessionError> {
        let size = self.require_size()?;
        Ok(yolo::export_boxes(self.store.boxes(), size))
    }

    /// Replace all boxes with a detector response, using its dimensions.
    pub fn apply_detection(&mut self, response: &DetectionResponse) -> Result<ImportReport, SessionError> {
        self.require_size()?;
        let decoded = yolo::decode_detection(
            &response.annotations,
            response.image_width,
            response.image_height,
        )?;
        self.store.replace_all(decoded.boxes);
        log::info!("🔎 Detection returned {} boxes", decoded.report.imported);
        Ok(decoded.report)
    }

    pub fn clear_annotations(&mut self) {
        self.store.clear();
    }

    // --- service requests ---

    fn issue(&mut self, kind: RequestKind, request: ServiceRequest) -> Ticket {
        let ticket = Ticket {
            id: self.next_ticket,
            generation: self.generation,
            kind,
        };
        self.next_ticket += 1;
        if matches!(kind, RequestKind::Image | RequestKind::Crop) {
            self.latest_image_ticket = Some(ticket.id);
        }
        log::debug!("Queued {:?} as {:?}", request, ticket);
        self.outbox.push((ticket, request));
        ticket
    }

    /// Ask the image provider for `source`. The extension is checked first.
    pub fn request_image(&mut self, source: &str) -> Result<Ticket, SessionError> {
        validate_source_extension(source)?;
        Ok(self.issue(
            RequestKind::Image,
            ServiceRequest::LoadImage {
                source: source.to_string(),
            },
        ))
    }

    /// Ask for a crop of the current image; fields are rounded to pixels.
    pub fn request_crop(&mut self, region: &BoundingBox) -> Result<Ticket, SessionError> {
        let source = self.source_name()?;
        let request = CropRequest::from_region(source, &region.normalized());
        Ok(self.issue(RequestKind::Crop, ServiceRequest::Crop(request)))
    }

    pub fn request_detection(&mut self) -> Result<Ticket, SessionError> {
        self.require_size()?;
        let request = DetectionRequest::new(self.detection_threshold, self.model.clone());
        Ok(self.issue(RequestKind::Detection, ServiceRequest::Detect(request)))
    }

    pub fn request_export(&mut self) -> Result<Ticket, SessionError> {
        let request = ExportRequest {
            yolo_data: self.export_labels()?,
            original_filename: self.source_name()?,
        };
        Ok(self.issue(RequestKind::Export, ServiceRequest::Export(request)))
    }

    /// Drain requests issued since the last call.
    pub fn take_requests(&mut self) -> Vec<(Ticket, ServiceRequest)> {
        std::mem::take(&mut self.outbox)
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        match ticket.kind {
            RequestKind::Export => true,
            RequestKind::Detection => ticket.generation == self.generation,
            RequestKind::Image | RequestKind::Crop => {
                ticket.generation == self.generation && self.latest_image_ticket == Some(ticket.id)
            }
        }
    }

    /// Apply a completed request.
    ///
    /// Failures only set the status; the image and boxes stay as they were.
    pub fn apply_reply(
        &mut self,
        ticket: Ticket,
        result: Result<ServiceReply, ServiceError>,
    ) -> ReplyEffect {
        if !self.is_current(&ticket) {
            log::warn!(
                "Discarding stale {:?} reply (generation {}, now {})",
                ticket.kind,
                ticket.generation,
                self.generation
            );
            return ReplyEffect::Discarded;
        }
        if matches!(ticket.kind, RequestKind::Image | RequestKind::Crop) {
            self.latest_image_ticket = None;
        }

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                let message = format!("{:?} request failed: {}", ticket.kind, e);
                log::warn!("{}", message);
                self.set_status(message.clone());
                return ReplyEffect::Failed(message);
            }
        };

        match reply {
            ServiceReply::Image(image) | ServiceReply::Cropped(image) => {
                ReplyEffect::ImageInstalled(self.load_image(image))
            }
            ServiceReply::Detected(response) => match self.apply_detection(&response) {
                Ok(report) => ReplyEffect::AnnotationsReplaced(report.imported),
                Err(e) => {
                    let message = format!("Detection failed: {}", e);
                    self.set_status(message.clone());
                    ReplyEffect::Failed(message)
                }
            },
            ServiceReply::Exported(bytes) => {
                log::info!("📦 Export archive ready ({} bytes)", bytes.len());
                ReplyEffect::ExportReady(bytes)
            }
        }
    }

    /// Submit queued requests to `worker` and apply whatever has finished.
    pub fn pump(&mut self, worker: &mut ServiceWorker) -> Vec<ReplyEffect> {
        for (ticket, request) in self.take_requests() {
            if let Err(e) = worker.submit(ticket, request) {
                log::error!("Could not submit {:?}: {}", ticket, e);
                self.set_status(format!("{:?} request failed: {}", ticket.kind, e));
            }
        }
        let mut effects = Vec::new();
        while let Some(done) = worker.take_one_result() {
            effects.push(self.apply_reply(done.ticket, done.result));
        }
        effects
    }

    /// Like [`Session::pump`], but blocks until every submitted request is
    /// answered or `timeout` passes without a reply.
    pub fn pump_until_idle(&mut self, worker: &mut ServiceWorker, timeout: Duration) -> Vec<ReplyEffect> {
        let mut effects = self.pump(worker);
        while worker.pending_count() > 0 {
            match worker.wait_result(timeout) {
                Some(done) => effects.push(self.apply_reply(done.ticket, done.result)),
                None => {
                    log::warn!("Gave up waiting for {} request(s)", worker.pending_count());
                    break;
                }
            }
        }
        effects
    }

    // --- rendering ---

    fn scene(&self) -> Scene<'_> {
        let mut scene = Scene::new(&self.viewport, &self.store);
        scene.raster = self.image.as_ref().map(|img| &img.raster);
        scene.draft = self.gestures.draft();
        scene.current_class = self.current_class;
        scene.adjustments = self.adjustments;
        scene.stroke_width = self.stroke_width;
        scene
    }

    /// Record the current frame.
    pub fn paint(&self, renderer: &mut Renderer) {
        render::paint(&self.scene(), renderer);
    }

    /// Rasterize the current frame onto a `width x height` canvas.
    pub fn render(&self, width: u32, height: u32) -> Result<Canvas, SessionError> {
        Ok(render::rasterize(&self.scene(), width, height)?)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{Modifiers, PointerButton, ScreenPoint};
    use crate::services::testing::{FailingExport, fake_services, solid_image};

    fn session_with_image(w: u32, h: u32) -> Session {
        let mut session = Session::default();
        session.load_image(solid_image("scan.tif", w, h));
        session
    }

    fn down(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerDown {
            button: PointerButton::Primary,
            position: ScreenPoint::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    fn move_to(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerMove {
            position: ScreenPoint::new(x, y),
        }
    }

    fn up(x: f64, y: f64) -> InputEvent {
        InputEvent::PointerUp {
            button: PointerButton::Primary,
            position: ScreenPoint::new(x, y),
        }
    }

    fn detection(text: &str, w: u32, h: u32) -> DetectionResponse {
        DetectionResponse {
            annotations: text.to_string(),
            image_width: w,
            image_height: h,
        }
    }

    #[test]
    fn test_label_operations_need_an_image() {
        let mut session = Session::default();
        assert!(matches!(session.export_labels(), Err(SessionError::NoImage)));
        assert!(matches!(session.import_labels("0 0.5 0.5 0.1 0.1"), Err(SessionError::NoImage)));
        assert!(matches!(session.request_detection(), Err(SessionError::NoImage)));
        assert!(matches!(session.request_export(), Err(SessionError::NoImage)));
        assert!(matches!(
            session.apply_detection(&detection("0 0.5 0.5 0.2 0.2", 10, 10)),
            Err(SessionError::NoImage)
        ));
    }

    #[test]
    fn test_draw_then_export() {
        let mut session = session_with_image(1000, 500);
        session.set_current_class(2).unwrap();
        session.handle_event(&down(0.0, 0.0));
        session.handle_event(&move_to(500.0, 250.0));
        session.handle_event(&up(500.0, 250.0));
        assert_eq!(
            session.export_labels().unwrap(),
            "2 0.250000 0.250000 0.500000 0.500000"
        );
    }

    #[test]
    fn test_import_replaces_store() {
        let mut session = session_with_image(100, 100);
        session.handle_event(&down(1.0, 1.0));
        session.handle_event(&up(5.0, 5.0));
        let report = session
            .import_labels("1 0.5 0.5 0.2 0.2\nbad line\n")
            .unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().boxes().next().unwrap().class, 1);
    }

    #[test]
    fn test_imported_negative_extent_box_can_be_deleted() {
        let mut session = session_with_image(100, 100);
        session.import_labels("0 0.5 0.5 -0.2 0.2").unwrap();
        let b = *session.store().boxes().next().unwrap();
        assert_eq!(b, BoundingBox::new(40.0, 40.0, 20.0, 20.0, 0));

        let outcome = session.handle_event(&InputEvent::PointerDown {
            button: PointerButton::Primary,
            position: ScreenPoint::new(50.0, 50.0),
            modifiers: Modifiers::SHIFT,
        });
        assert!(matches!(outcome, GestureOutcome::Removed(_)));
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_load_image_resets_state() {
        let mut session = session_with_image(100, 100);
        session.handle_event(&InputEvent::Wheel {
            delta_y: -1.0,
            position: ScreenPoint::new(10.0, 10.0),
        });
        session.handle_event(&down(10.0, 10.0));
        session.handle_event(&up(40.0, 40.0));
        session.handle_event(&down(50.0, 50.0));
        let generation = session.generation();

        session.load_image(solid_image("other.tif", 20, 20));
        assert_eq!(session.generation(), generation + 1);
        assert!(session.store().is_empty());
        assert_eq!(*session.viewport(), Viewport::identity());
        assert!(session.gestures().is_idle());
    }

    #[test]
    fn test_set_current_class_out_of_range() {
        let mut session = Session::default();
        assert!(matches!(
            session.set_current_class(5),
            Err(SessionError::UnknownClass { index: 5, len: 5 })
        ));
        assert_eq!(session.current_class(), 0);
    }

    #[test]
    fn test_adjustments_are_clamped() {
        let mut session = Session::default();
        session.set_brightness(150.0);
        session.set_contrast(-300.0);
        assert_eq!(session.adjustments(), ImageAdjustments::new(100.0, -100.0));
    }

    #[test]
    fn test_every_visible_change_requests_redraw() {
        let mut session = session_with_image(100, 100);
        assert!(session.take_redraw());
        assert!(!session.take_redraw());

        session.handle_event(&down(10.0, 10.0));
        assert!(session.take_redraw());
        session.handle_event(&move_to(20.0, 20.0));
        assert!(session.take_redraw());
        session.handle_event(&up(20.0, 20.0));
        assert!(session.take_redraw());

        session.set_class_color(0, Rgb::new(1, 1, 1)).unwrap();
        assert!(session.take_redraw());
        session.set_contrast(10.0);
        assert!(session.take_redraw());
        session.clear_annotations();
        assert!(session.take_redraw());

        // Hovering without a gesture changes nothing on screen.
        session.handle_event(&move_to(30.0, 30.0));
        session.handle_event(&move_to(31.0, 30.0));
        assert!(!session.take_redraw());
    }

    #[test]
    fn test_crop_drag_queues_rounded_request() {
        let mut session = session_with_image(400, 400);
        session.set_crop_mode(true);
        session.handle_event(&down(10.4, 20.6));
        session.handle_event(&move_to(110.2, 70.5));
        let outcome = session.handle_event(&up(110.2, 70.5));
        assert!(matches!(outcome, GestureOutcome::CropRequested(_)));
        assert!(session.store().is_empty());

        let requests = session.take_requests();
        assert_eq!(requests.len(), 1);
        let (ticket, request) = &requests[0];
        assert_eq!(ticket.kind, RequestKind::Crop);
        assert_eq!(
            *request,
            ServiceRequest::Crop(CropRequest {
                filename: "scan.tif".to_string(),
                x: 10,
                y: 21,
                width: 100,
                height: 50,
            })
        );
    }

    #[test]
    fn test_crop_reply_installs_new_image() {
        let mut session = session_with_image(400, 400);
        session.handle_event(&down(1.0, 1.0));
        session.handle_event(&up(9.0, 9.0));
        let ticket = session
            .request_crop(&BoundingBox::new(0.0, 0.0, 50.0, 40.0, 0))
            .unwrap();
        let effect = session.apply_reply(
            ticket,
            Ok(ServiceReply::Cropped(solid_image("scan.tif@0,0,50x40", 50, 40))),
        );
        assert_eq!(effect, ReplyEffect::ImageInstalled(ImageSize::new(50, 40).unwrap()));
        assert!(session.store().is_empty());
        assert_eq!(session.image().unwrap().source, "scan.tif@0,0,50x40");
    }

    #[test]
    fn test_stale_detection_is_discarded() {
        let mut session = session_with_image(100, 100);
        let ticket = session.request_detection().unwrap();

        // The user switches images before the detector answers.
        session.load_image(solid_image("next.tif", 100, 100));
        session.handle_event(&down(10.0, 10.0));
        session.handle_event(&move_to(30.0, 30.0));
        session.handle_event(&up(30.0, 30.0));

        let effect = session.apply_reply(
            ticket,
            Ok(ServiceReply::Detected(detection("0 0.5 0.5 0.2 0.2", 100, 100))),
        );
        assert_eq!(effect, ReplyEffect::Discarded);
        assert_eq!(session.store().len(), 1);
        assert_eq!(
            *session.store().boxes().next().unwrap(),
            BoundingBox::new(10.0, 10.0, 20.0, 20.0, 0)
        );
    }

    #[test]
    fn test_current_detection_replaces_store() {
        let mut session = session_with_image(100, 100);
        session.handle_event(&down(10.0, 10.0));
        session.handle_event(&up(30.0, 30.0));
        let ticket = session.request_detection().unwrap();
        let effect = session.apply_reply(
            ticket,
            Ok(ServiceReply::Detected(detection(
                "0 0.5 0.5 0.2 0.2\n1 0.1 0.1 0.1 0.1 0.9",
                100,
                100,
            ))),
        );
        // The 6-field line is not valid detector output.
        assert_eq!(effect, ReplyEffect::AnnotationsReplaced(1));
        assert_eq!(
            *session.store().boxes().next().unwrap(),
            BoundingBox::new(40.0, 40.0, 20.0, 20.0, 0)
        );
    }

    #[test]
    fn test_older_image_request_loses_to_newer() {
        let mut session = Session::default();
        let first = session.request_image("a.tif").unwrap();
        let second = session.request_image("b.tif").unwrap();

        let effect = session.apply_reply(second, Ok(ServiceReply::Image(solid_image("b.tif", 8, 8))));
        assert!(matches!(effect, ReplyEffect::ImageInstalled(_)));
        let effect = session.apply_reply(first, Ok(ServiceReply::Image(solid_image("a.tif", 9, 9))));
        assert_eq!(effect, ReplyEffect::Discarded);
        assert_eq!(session.image().unwrap().source, "b.tif");
    }

    #[test]
    fn test_failed_upload_keeps_previous_image() {
        let mut session = session_with_image(10, 10);
        let ticket = session.request_image("broken.tif").unwrap();
        let effect = session.apply_reply(
            ticket,
            Err(ServiceError::Server {
                message: "conversion failed".to_string(),
            }),
        );
        assert!(matches!(effect, ReplyEffect::Failed(ref m) if m.contains("conversion failed")));
        assert_eq!(session.image().unwrap().source, "scan.tif");
        assert!(session.status().unwrap().contains("conversion failed"));
    }

    #[test]
    fn test_wrong_extension_is_rejected_up_front() {
        let mut session = Session::default();
        assert!(matches!(
            session.request_image("scan.png"),
            Err(SessionError::Service(ServiceError::UnsupportedExtension { .. }))
        ));
        assert!(session.take_requests().is_empty());
    }

    #[test]
    fn test_export_reply_survives_image_change() {
        let mut session = session_with_image(10, 10);
        let ticket = session.request_export().unwrap();
        session.load_image(solid_image("next.tif", 10, 10));
        let effect = session.apply_reply(ticket, Ok(ServiceReply::Exported(vec![1, 2, 3])));
        assert_eq!(effect, ReplyEffect::ExportReady(vec![1, 2, 3]));
    }

    #[test]
    fn test_pump_through_worker() {
        let mut services = fake_services(64, 32, detection("0 0.5 0.5 0.5 0.5", 64, 32));
        services.export = Box::new(FailingExport);
        let mut worker = ServiceWorker::spawn(services).unwrap();
        let mut session = Session::default();
        let wait = Duration::from_secs(5);

        session.request_image("scan.tif").unwrap();
        let effects = session.pump_until_idle(&mut worker, wait);
        assert_eq!(effects, vec![ReplyEffect::ImageInstalled(ImageSize::new(64, 32).unwrap())]);

        session.request_detection().unwrap();
        let effects = session.pump_until_idle(&mut worker, wait);
        assert_eq!(effects, vec![ReplyEffect::AnnotationsReplaced(1)]);
        assert_eq!(
            *session.store().boxes().next().unwrap(),
            BoundingBox::new(16.0, 8.0, 32.0, 16.0, 0)
        );

        session.request_export().unwrap();
        let effects = session.pump_until_idle(&mut worker, wait);
        assert!(matches!(&effects[..], [ReplyEffect::Failed(m)] if m.contains("disk full")));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_render_frame() {
        let mut session = session_with_image(20, 20);
        session.handle_event(&down(2.0, 2.0));
        session.handle_event(&move_to(10.0, 10.0));
        session.handle_event(&up(10.0, 10.0));
        let mut renderer = Renderer::new();
        session.paint(&mut renderer);
        assert_eq!(renderer.commands().len(), 5);

        let canvas = session.render(32, 32).unwrap();
        assert_eq!(canvas.width(), 32);
    }
}
