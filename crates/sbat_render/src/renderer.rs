use crate::{Color, ImageAdjustments, Raster};

/// Axis-aligned rectangle. Coordinates are in whatever space the current
/// transform maps from (image space inside the viewport transform).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rectangle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rectangle {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// Uniform scale followed by translation: `screen = offset + scale * p`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub scale: f32,
    pub translate_x: f32,
    pub translate_y: f32,
}

impl Affine {
    pub fn identity() -> Self {
        Self::translate_then_scale(0.0, 0.0, 1.0)
    }

    /// Translate by `(tx, ty)`, then scale by `scale`, as a 2D canvas
    /// `translate(..); scale(..)` sequence composes.
    pub fn translate_then_scale(tx: f32, ty: f32, scale: f32) -> Self {
        Self {
            scale,
            translate_x: tx,
            translate_y: ty,
        }
    }

    /// `self ∘ inner`: apply `inner` first, then `self`.
    pub fn then(&self, inner: &Affine) -> Affine {
        Affine {
            scale: self.scale * inner.scale,
            translate_x: self.translate_x + self.scale * inner.translate_x,
            translate_y: self.translate_y + self.scale * inner.translate_y,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.translate_x + self.scale * x,
            self.translate_y + self.scale * y,
        )
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(
            self.scale,
            0.0,
            0.0,
            self.scale,
            self.translate_x,
            self.translate_y,
        )
    }
}

impl Default for Affine {
    fn default() -> Self {
        Self::identity()
    }
}

/// A draw command to be executed by a [`crate::Canvas`].
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Fill the whole surface.
    Clear { color: Color },
    /// Compose a transform onto the current one.
    PushTransform { transform: Affine },
    /// Restore the transform in effect before the matching push.
    PopTransform,
    /// Draw a raster with its top-left corner at `(x, y)`.
    DrawImage {
        raster: Raster,
        x: f32,
        y: f32,
        adjustments: ImageAdjustments,
    },
    /// Rectangle outline. `width` is in the current transform's source units.
    StrokeRect {
        rect: Rectangle,
        color: Color,
        width: f32,
    },
}

/// Records draw commands in submission order.
#[derive(Debug, Default)]
pub struct Renderer {
    draw_commands: Vec<DrawCommand>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self, color: Color) {
        self.draw_commands.push(DrawCommand::Clear { color });
    }

    pub fn push_transform(&mut self, transform: Affine) {
        self.draw_commands
            .push(DrawCommand::PushTransform { transform });
    }

    pub fn pop_transform(&mut self) {
        self.draw_commands.push(DrawCommand::PopTransform);
    }

    /// Draw a raster with brightness/contrast adjustments.
    pub fn draw_image_with_adjustments(
        &mut self,
        raster: &Raster,
        x: f32,
        y: f32,
        adjustments: ImageAdjustments,
    ) {
        self.draw_commands.push(DrawCommand::DrawImage {
            raster: raster.clone(),
            x,
            y,
            adjustments,
        });
    }

    /// Draw a rectangle outline.
    pub fn stroke_rect(&mut self, rect: Rectangle, color: Color, width: f32) {
        self.draw_commands
            .push(DrawCommand::StrokeRect { rect, color, width });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.draw_commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.draw_commands)
    }

    pub fn is_empty(&self) -> bool {
        self.draw_commands.is_empty()
    }
}
