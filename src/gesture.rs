//! Pointer gesture interpretation for the annotation canvas.
//!
//! Raw pointer and wheel events are turned into viewport changes, store
//! mutations or crop selections. The interpreter is an explicit state
//! machine: every event moves it between [`GestureState`]s and reports what
//! happened as a [`GestureOutcome`]. No event leaves it stuck; a pointer-up
//! always returns it to [`GestureState::Idle`].

use serde::{Deserialize, Serialize};

use crate::constants::{ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR};
use crate::model::{BoundingBox, BoxId, ImageSize};
use crate::store::AnnotationStore;
use crate::viewport::{Viewport, ZoomLimits};

/// Mouse button that triggered an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Keyboard modifiers held during a pointer-down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    #[serde(default)]
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Self = Self { shift: false };
    pub const SHIFT: Self = Self { shift: true };
}

/// A point in screen space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Input events delivered by the host surface.
///
/// Serialized with a `type` tag so event scripts can be replayed:
/// `{"type": "pointer_down", "button": "primary", "position": {"x": 1, "y": 2}}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    PointerDown {
        button: PointerButton,
        position: ScreenPoint,
        #[serde(default)]
        modifiers: Modifiers,
    },
    PointerMove {
        position: ScreenPoint,
    },
    PointerUp {
        button: PointerButton,
        position: ScreenPoint,
    },
    Wheel {
        /// Negative values scroll up (towards the user's zoom-in).
        delta_y: f64,
        position: ScreenPoint,
    },
}

/// An in-progress box in image space. Extents are signed while dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DraftBox {
    pub origin_x: f64,
    pub origin_y: f64,
    pub w: f64,
    pub h: f64,
}

impl DraftBox {
    fn at(x: f64, y: f64) -> Self {
        Self {
            origin_x: x,
            origin_y: y,
            w: 0.0,
            h: 0.0,
        }
    }

    /// Stretch the draft to an (already clamped) pointer position.
    fn extend_to(&mut self, x: f64, y: f64) {
        self.w = x - self.origin_x;
        self.h = y - self.origin_y;
    }

    /// The draft as a box of `class`, without normalization.
    pub fn to_box(&self, class: usize) -> BoundingBox {
        BoundingBox::new(self.origin_x, self.origin_y, self.w, self.h, class)
    }
}

/// Interaction state of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    /// Dragging the view; holds the last screen position.
    Panning { last: ScreenPoint },
    /// Dragging out a new annotation.
    Drawing(DraftBox),
    /// Dragging out a crop region.
    Cropping(DraftBox),
}

/// What a single event did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Nothing observable changed.
    None,
    PanStarted,
    Panned,
    Zoomed,
    /// The in-progress box was created or resized.
    DraftChanged,
    /// The in-progress box was dropped without being stored.
    DraftDiscarded,
    Added(BoxId),
    Removed(BoxId),
    /// A crop drag finished; the normalized region in image space.
    CropRequested(BoundingBox),
    /// Only the pointer-over-image flag changed.
    HoverChanged(bool),
}

impl GestureOutcome {
    /// Whether the canvas must be repainted.
    pub fn needs_redraw(&self) -> bool {
        !matches!(self, GestureOutcome::None | GestureOutcome::HoverChanged(_))
    }
}

/// Cursor shape to show over the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorIcon {
    Default,
    Crosshair,
    Grabbing,
}

/// Everything an event may read or mutate.
pub struct GestureContext<'a> {
    pub viewport: &'a mut Viewport,
    pub store: &'a mut AnnotationStore,
    /// Dimensions of the loaded image, if any.
    pub image: Option<ImageSize>,
    /// Class assigned to newly drawn boxes.
    pub current_class: usize,
    /// When set, finished drags become crop requests.
    pub crop_mode: bool,
}

/// State machine turning pointer input into canvas actions.
#[derive(Debug, Clone)]
pub struct GestureInterpreter {
    state: GestureState,
    zoom_in_factor: f64,
    zoom_out_factor: f64,
    zoom_limits: ZoomLimits,
    pointer_over_image: bool,
}

impl GestureInterpreter {
    pub fn new() -> Self {
        Self::with_zoom_factors(ZOOM_IN_FACTOR, ZOOM_OUT_FACTOR)
    }

    /// Use custom wheel step factors. Both must be finite and positive for
    /// the wheel to have an effect.
    pub fn with_zoom_factors(zoom_in_factor: f64, zoom_out_factor: f64) -> Self {
        Self {
            state: GestureState::Idle,
            zoom_in_factor,
            zoom_out_factor,
            zoom_limits: ZoomLimits::default(),
            pointer_over_image: false,
        }
    }

    /// Bound the scale wheel steps may reach.
    pub fn with_zoom_limits(mut self, limits: ZoomLimits) -> Self {
        self.zoom_limits = limits;
        self
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == GestureState::Idle
    }

    /// The in-progress box, if a draw or crop drag is active.
    pub fn draft(&self) -> Option<&DraftBox> {
        match &self.state {
            GestureState::Drawing(d) | GestureState::Cropping(d) => Some(d),
            _ => None,
        }
    }

    /// Whether the active draft is a crop selection.
    pub fn is_cropping(&self) -> bool {
        matches!(self.state, GestureState::Cropping(_))
    }

    pub fn cursor(&self) -> CursorIcon {
        match self.state {
            GestureState::Panning { .. } => CursorIcon::Grabbing,
            GestureState::Drawing(_) | GestureState::Cropping(_) => CursorIcon::Crosshair,
            GestureState::Idle if self.pointer_over_image => CursorIcon::Crosshair,
            GestureState::Idle => CursorIcon::Default,
        }
    }

    /// Abort any gesture and drop the in-progress box.
    pub fn cancel(&mut self) -> GestureOutcome {
        let had_draft = self.draft().is_some();
        if self.state != GestureState::Idle {
            log::debug!("Gesture cancelled from {:?}", self.state);
        }
        self.state = GestureState::Idle;
        if had_draft {
            GestureOutcome::DraftDiscarded
        } else {
            GestureOutcome::None
        }
    }

    /// Feed one event through the state machine.
    pub fn handle(&mut self, event: &InputEvent, ctx: &mut GestureContext<'_>) -> GestureOutcome {
        match *event {
            InputEvent::PointerDown {
                button,
                position,
                modifiers,
            } => self.pointer_down(button, position, modifiers, ctx),
            InputEvent::PointerMove { position } => self.pointer_move(position, ctx),
            InputEvent::PointerUp { button, .. } => self.pointer_up(button, ctx),
            InputEvent::Wheel { delta_y, position } => self.wheel(delta_y, position, ctx),
        }
    }

    fn update_hover(&mut self, position: ScreenPoint, ctx: &GestureContext<'_>) -> bool {
        let (ix, iy) = ctx.viewport.screen_to_image(position.x, position.y);
        let over = ctx.image.is_some_and(|size| size.contains(ix, iy));
        let changed = over != self.pointer_over_image;
        self.pointer_over_image = over;
        changed
    }

    fn pointer_down(
        &mut self,
        button: PointerButton,
        position: ScreenPoint,
        modifiers: Modifiers,
        ctx: &mut GestureContext<'_>,
    ) -> GestureOutcome {
        self.update_hover(position, ctx);

        if matches!(button, PointerButton::Middle | PointerButton::Secondary) {
            if self.draft().is_some() {
                log::debug!("Pan started over an unfinished box, discarding it");
            }
            log::debug!("✋ Pan started at ({:.1}, {:.1})", position.x, position.y);
            self.state = GestureState::Panning { last: position };
            return GestureOutcome::PanStarted;
        }

        if !self.is_idle() {
            return GestureOutcome::None;
        }

        let Some(size) = ctx.image else {
            return GestureOutcome::None;
        };
        let (ix, iy) = ctx.viewport.screen_to_image(position.x, position.y);
        if !size.contains(ix, iy) {
            return GestureOutcome::None;
        }

        if modifiers.shift {
            let Some(id) = ctx.store.hit_test(ix, iy) else {
                return GestureOutcome::None;
            };
            ctx.store.remove(id);
            log::info!("🗑️  Removed box {} at ({:.1}, {:.1})", id, ix, iy);
            return GestureOutcome::Removed(id);
        }

        let draft = DraftBox::at(ix, iy);
        self.state = if ctx.crop_mode {
            log::debug!("Crop selection started at ({:.1}, {:.1})", ix, iy);
            GestureState::Cropping(draft)
        } else {
            log::debug!("Box started at ({:.1}, {:.1})", ix, iy);
            GestureState::Drawing(draft)
        };
        GestureOutcome::DraftChanged
    }

    fn pointer_move(&mut self, position: ScreenPoint, ctx: &mut GestureContext<'_>) -> GestureOutcome {
        match &mut self.state {
            GestureState::Panning { last } => {
                let (dx, dy) = (position.x - last.x, position.y - last.y);
                *last = position;
                ctx.viewport.pan(dx, dy);
                self.update_hover(position, ctx);
                GestureOutcome::Panned
            }
            GestureState::Drawing(draft) | GestureState::Cropping(draft) => {
                let (ix, iy) = ctx.viewport.screen_to_image(position.x, position.y);
                let (cx, cy) = match ctx.image {
                    Some(size) => size.clamp(ix, iy),
                    None => (ix, iy),
                };
                draft.extend_to(cx, cy);
                self.update_hover(position, ctx);
                GestureOutcome::DraftChanged
            }
            GestureState::Idle => {
                if self.update_hover(position, ctx) {
                    GestureOutcome::HoverChanged(self.pointer_over_image)
                } else {
                    GestureOutcome::None
                }
            }
        }
    }

    fn pointer_up(&mut self, button: PointerButton, ctx: &mut GestureContext<'_>) -> GestureOutcome {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => GestureOutcome::None,
            GestureState::Panning { .. } => {
                log::debug!("Pan ended ({:?} released)", button);
                GestureOutcome::Panned
            }
            GestureState::Cropping(draft) => {
                let region = draft.to_box(ctx.current_class).normalized();
                log::info!(
                    "✂️  Crop requested: ({:.1}, {:.1}) {:.1}x{:.1}",
                    region.x,
                    region.y,
                    region.w,
                    region.h
                );
                GestureOutcome::CropRequested(region)
            }
            GestureState::Drawing(draft) => {
                if ctx.image.is_none() {
                    return GestureOutcome::DraftDiscarded;
                }
                let bbox = draft.to_box(ctx.current_class).normalized();
                let id = ctx.store.add(bbox);
                log::info!(
                    "📦 Added box {} class {}: ({:.1}, {:.1}) {:.1}x{:.1}",
                    id,
                    bbox.class,
                    bbox.x,
                    bbox.y,
                    bbox.w,
                    bbox.h
                );
                GestureOutcome::Added(id)
            }
        }
    }

    fn wheel(&mut self, delta_y: f64, position: ScreenPoint, ctx: &mut GestureContext<'_>) -> GestureOutcome {
        let factor = if delta_y < 0.0 {
            self.zoom_in_factor
        } else {
            self.zoom_out_factor
        };
        ctx.viewport.zoom_within(position.x, position.y, factor, self.zoom_limits);
        self.update_hover(position, ctx);
        log::debug!("🔍 Zoom x{} -> scale {:.4}", factor, ctx.viewport.scale());
        GestureOutcome::Zoomed
    }
}

impl Default for GestureInterpreter {
    fn default() -> Self {
        Self::new()
    }
}
