//! CPU canvas executing recorded draw commands with tiny-skia.

use std::path::Path;

use tiny_skia::{FilterQuality, IntSize, Paint, PathBuilder, Pixmap, PixmapPaint, Stroke};

use crate::{Affine, Color, DrawCommand, ImageAdjustments, Raster, Rectangle, RenderError};

/// Adjusted, premultiplied copy of the last raster drawn.
struct CachedImage {
    source: Raster,
    adjustments: ImageAdjustments,
    pixmap: Pixmap,
}

/// A software render target.
pub struct Canvas {
    pixmap: Pixmap,
    transforms: Vec<Affine>,
    image_cache: Option<CachedImage>,
}

impl Canvas {
    /// Create a transparent canvas of the given size.
    pub fn new(width: u32, height: u32) -> Result<Self, RenderError> {
        let pixmap = Pixmap::new(width, height).ok_or(RenderError::InvalidSize { width, height })?;
        Ok(Self {
            pixmap,
            transforms: Vec::new(),
            image_cache: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Execute a command list in order.
    ///
    /// The transform stack is reset before execution, so an unbalanced list
    /// from a previous frame can not leak into this one.
    pub fn execute(&mut self, commands: &[DrawCommand]) -> Result<(), RenderError> {
        self.transforms.clear();
        for command in commands {
            match command {
                DrawCommand::Clear { color } => self.pixmap.fill(color.to_skia()),
                DrawCommand::PushTransform { transform } => {
                    let combined = self.current_transform().then(transform);
                    self.transforms.push(combined);
                }
                DrawCommand::PopTransform => {
                    self.transforms
                        .pop()
                        .ok_or(RenderError::TransformUnderflow)?;
                }
                DrawCommand::DrawImage {
                    raster,
                    x,
                    y,
                    adjustments,
                } => self.draw_image(raster, *x, *y, *adjustments)?,
                DrawCommand::StrokeRect { rect, color, width } => {
                    self.stroke_rect(*rect, *color, *width)
                }
            }
        }
        if !self.transforms.is_empty() {
            log::warn!(
                "Frame ended with {} unpopped transform(s)",
                self.transforms.len()
            );
        }
        Ok(())
    }

    fn current_transform(&self) -> Affine {
        self.transforms.last().copied().unwrap_or_default()
    }

    fn draw_image(
        &mut self,
        raster: &Raster,
        x: f32,
        y: f32,
        adjustments: ImageAdjustments,
    ) -> Result<(), RenderError> {
        let cached = matches!(
            &self.image_cache,
            Some(c) if c.source.ptr_eq(raster) && c.adjustments == adjustments
        );
        if !cached {
            let pixmap = adjusted_pixmap(raster, adjustments)?;
            self.image_cache = Some(CachedImage {
                source: raster.clone(),
                adjustments,
                pixmap,
            });
        }

        let transform = self
            .current_transform()
            .then(&Affine::translate_then_scale(x, y, 1.0))
            .to_skia();
        let paint = PixmapPaint {
            quality: FilterQuality::Nearest,
            ..PixmapPaint::default()
        };
        if let Some(cache) = &self.image_cache {
            self.pixmap
                .draw_pixmap(0, 0, cache.pixmap.as_ref(), &paint, transform, None);
        }
        Ok(())
    }

    fn stroke_rect(&mut self, rect: Rectangle, color: Color, width: f32) {
        if rect.width <= 0.0 && rect.height <= 0.0 {
            return;
        }
        let Some(r) = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
            log::trace!("Skipping non-finite rectangle {:?}", rect);
            return;
        };
        let path = PathBuilder::from_rect(r);

        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = true;

        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap.stroke_path(
            &path,
            &paint,
            &stroke,
            self.current_transform().to_skia(),
            None,
        );
    }

    /// Read back one pixel as straight RGBA8.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, RenderError> {
        self.pixmap
            .encode_png()
            .map_err(|e| RenderError::Encode(e.to_string()))
    }

    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), RenderError> {
        self.pixmap
            .save_png(path)
            .map_err(|e| RenderError::Encode(e.to_string()))
    }
}

/// Apply adjustments and premultiply alpha into a pixmap tiny-skia can draw.
fn adjusted_pixmap(raster: &Raster, adjustments: ImageAdjustments) -> Result<Pixmap, RenderError> {
    let (width, height) = (raster.width(), raster.height());
    let mut data = raster.data().to_vec();
    adjustments.apply_rgba8(&mut data);
    for px in data.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a < 255 {
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * a + 127) / 255) as u8;
            }
        }
    }
    let size = IntSize::from_wh(width, height).ok_or(RenderError::InvalidSize { width, height })?;
    Pixmap::from_vec(data, size).ok_or(RenderError::InvalidSize { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Renderer;

    #[test]
    fn test_clear_fills_surface() {
        let mut canvas = Canvas::new(4, 4).unwrap();
        canvas
            .execute(&[DrawCommand::Clear {
                color: Color::rgb(1.0, 0.0, 0.0),
            }])
            .unwrap();
        assert_eq!(canvas.pixel(3, 3), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_image_drawn_through_transform() {
        let raster = Raster::solid(2, 2, [0, 255, 0, 255]).unwrap();
        let mut r = Renderer::new();
        r.clear(Color::BLACK);
        r.push_transform(Affine::translate_then_scale(4.0, 4.0, 2.0));
        r.draw_image_with_adjustments(&raster, 0.0, 0.0, ImageAdjustments::default());
        r.pop_transform();

        let mut canvas = Canvas::new(10, 10).unwrap();
        canvas.execute(r.commands()).unwrap();

        // 2x2 image scaled by 2 and moved to (4, 4) covers 4..8.
        assert_eq!(canvas.pixel(5, 5), Some([0, 255, 0, 255]));
        assert_eq!(canvas.pixel(7, 7), Some([0, 255, 0, 255]));
        assert_eq!(canvas.pixel(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(canvas.pixel(9, 9), Some([0, 0, 0, 255]));
    }

    #[test]
    fn test_adjustments_applied_to_image() {
        let raster = Raster::solid(2, 2, [100, 100, 100, 255]).unwrap();
        let mut r = Renderer::new();
        r.draw_image_with_adjustments(&raster, 0.0, 0.0, ImageAdjustments::new(100.0, 0.0));
        let mut canvas = Canvas::new(2, 2).unwrap();
        canvas.execute(r.commands()).unwrap();
        assert_eq!(canvas.pixel(0, 0), Some([200, 200, 200, 255]));
    }

    #[test]
    fn test_stroke_rect_leaves_interior_untouched() {
        let mut r = Renderer::new();
        r.clear(Color::BLACK);
        r.stroke_rect(Rectangle::new(2.0, 2.0, 16.0, 16.0), Color::WHITE, 2.0);
        let mut canvas = Canvas::new(20, 20).unwrap();
        canvas.execute(r.commands()).unwrap();

        assert_eq!(canvas.pixel(10, 10), Some([0, 0, 0, 255]));
        let edge = canvas.pixel(10, 2).unwrap();
        assert!(edge[0] > 200, "top edge should be stroked, got {:?}", edge);
    }

    #[test]
    fn test_pop_without_push_is_error() {
        let mut canvas = Canvas::new(2, 2).unwrap();
        assert!(matches!(
            canvas.execute(&[DrawCommand::PopTransform]),
            Err(RenderError::TransformUnderflow)
        ));
    }

    #[test]
    fn test_png_encoding() {
        let canvas = Canvas::new(3, 3).unwrap();
        let png = canvas.encode_png().unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }
}
