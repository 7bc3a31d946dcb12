//! Scene painting: viewport, raster and boxes to draw commands.
//!
//! Paint order is fixed: clear, raster, stored boxes in store order, then the
//! in-progress box. Boxes are stroked inside the viewport transform with a
//! width divided by the scale, so outlines keep a constant screen width at
//! every zoom level.

use sbat_render::{Affine, Canvas, Color, ImageAdjustments, Raster, Rectangle, RenderError, Renderer};

use crate::constants::{BACKGROUND_RGB, FALLBACK_CLASS_RGB, STROKE_WIDTH};
use crate::gesture::DraftBox;
use crate::model::{BoundingBox, ClassDef};
use crate::store::AnnotationStore;
use crate::viewport::Viewport;

/// Everything one frame depends on.
pub struct Scene<'a> {
    pub viewport: &'a Viewport,
    pub raster: Option<&'a Raster>,
    pub store: &'a AnnotationStore,
    pub draft: Option<&'a DraftBox>,
    pub current_class: usize,
    pub adjustments: ImageAdjustments,
    /// Outline width in screen pixels.
    pub stroke_width: f64,
}

impl<'a> Scene<'a> {
    pub fn new(viewport: &'a Viewport, store: &'a AnnotationStore) -> Self {
        Self {
            viewport,
            raster: None,
            store,
            draft: None,
            current_class: 0,
            adjustments: ImageAdjustments::default(),
            stroke_width: STROKE_WIDTH,
        }
    }
}

fn class_color(classes: &[ClassDef], index: usize) -> Color {
    match classes.get(index) {
        Some(class) => class.color.to_render_color(),
        None => {
            let [r, g, b] = FALLBACK_CLASS_RGB;
            Color::from_rgb8(r, g, b)
        }
    }
}

fn rect_of(bbox: &BoundingBox) -> Rectangle {
    Rectangle::new(bbox.x as f32, bbox.y as f32, bbox.w as f32, bbox.h as f32)
}

/// Record one frame into `renderer`.
pub fn paint(scene: &Scene<'_>, renderer: &mut Renderer) {
    let [r, g, b] = BACKGROUND_RGB;
    renderer.clear(Color::from_rgb8(r, g, b));

    let (ox, oy) = scene.viewport.offset();
    let scale = scene.viewport.scale();
    renderer.push_transform(Affine::translate_then_scale(ox as f32, oy as f32, scale as f32));

    if let Some(raster) = scene.raster {
        renderer.draw_image_with_adjustments(raster, 0.0, 0.0, scene.adjustments);
    }

    let width = (scene.stroke_width / scale) as f32;
    let classes = scene.store.classes();
    for bbox in scene.store.boxes() {
        renderer.stroke_rect(rect_of(bbox), class_color(classes, bbox.class), width);
    }

    if let Some(draft) = scene.draft {
        let bbox = draft.to_box(scene.current_class).normalized();
        renderer.stroke_rect(rect_of(&bbox), class_color(classes, scene.current_class), width);
    }

    renderer.pop_transform();
}

/// Paint a frame onto a fresh `width x height` canvas.
pub fn rasterize(scene: &Scene<'_>, width: u32, height: u32) -> Result<Canvas, RenderError> {
    let mut renderer = Renderer::new();
    paint(scene, &mut renderer);
    let mut canvas = Canvas::new(width, height)?;
    canvas.execute(renderer.commands())?;
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rgb;
    use sbat_render::DrawCommand;

    fn stroke_colors(commands: &[DrawCommand]) -> Vec<Color> {
        commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::StrokeRect { color, .. } => Some(*color),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_command_order() {
        let viewport = Viewport::new(2.0, 10.0, 20.0).unwrap();
        let mut store = AnnotationStore::new();
        store.add(BoundingBox::new(0.0, 0.0, 5.0, 5.0, 1));
        store.add(BoundingBox::new(1.0, 1.0, 5.0, 5.0, 0));
        let raster = Raster::solid(8, 8, [10, 20, 30, 255]).unwrap();
        let draft = DraftBox {
            origin_x: 4.0,
            origin_y: 4.0,
            w: -2.0,
            h: 1.0,
        };

        let mut scene = Scene::new(&viewport, &store);
        scene.raster = Some(&raster);
        scene.draft = Some(&draft);
        scene.current_class = 2;

        let mut renderer = Renderer::new();
        paint(&scene, &mut renderer);
        let commands = renderer.commands();

        assert_eq!(commands.len(), 7);
        assert!(matches!(commands[0], DrawCommand::Clear { .. }));
        match &commands[1] {
            DrawCommand::PushTransform { transform } => {
                assert_eq!(*transform, Affine::translate_then_scale(10.0, 20.0, 2.0));
            }
            other => panic!("expected transform, got {:?}", other),
        }
        assert!(matches!(commands[2], DrawCommand::DrawImage { .. }));
        assert!(matches!(commands[6], DrawCommand::PopTransform));

        let classes = store.classes();
        assert_eq!(
            stroke_colors(commands),
            vec![
                classes[1].color.to_render_color(),
                classes[0].color.to_render_color(),
                classes[2].color.to_render_color(),
            ]
        );
        match &commands[5] {
            DrawCommand::StrokeRect { rect, .. } => {
                assert_eq!(*rect, Rectangle::new(2.0, 4.0, 2.0, 1.0));
            }
            other => panic!("expected draft stroke, got {:?}", other),
        }
    }

    #[test]
    fn test_stroke_width_compensates_zoom() {
        let viewport = Viewport::new(4.0, 0.0, 0.0).unwrap();
        let mut store = AnnotationStore::new();
        store.add(BoundingBox::new(0.0, 0.0, 1.0, 1.0, 0));
        let scene = Scene::new(&viewport, &store);

        let mut renderer = Renderer::new();
        paint(&scene, &mut renderer);
        let width = renderer.commands().iter().find_map(|c| match c {
            DrawCommand::StrokeRect { width, .. } => Some(*width),
            _ => None,
        });
        assert_eq!(width, Some(0.5));
    }

    #[test]
    fn test_unknown_class_uses_fallback() {
        let viewport = Viewport::identity();
        let mut store = AnnotationStore::new();
        store.add(BoundingBox::new(0.0, 0.0, 1.0, 1.0, 99));
        let scene = Scene::new(&viewport, &store);

        let mut renderer = Renderer::new();
        paint(&scene, &mut renderer);
        let [r, g, b] = FALLBACK_CLASS_RGB;
        assert_eq!(stroke_colors(renderer.commands()), vec![Color::from_rgb8(r, g, b)]);
    }

    #[test]
    fn test_without_raster_skips_image() {
        let viewport = Viewport::identity();
        let store = AnnotationStore::new();
        let mut renderer = Renderer::new();
        paint(&Scene::new(&viewport, &store), &mut renderer);
        assert!(!renderer
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::DrawImage { .. })));
    }

    #[test]
    fn test_rasterize_paints_box_outline() {
        let viewport = Viewport::identity();
        let mut store = AnnotationStore::new();
        store.set_class_color(0, Rgb::new(255, 0, 0)).unwrap();
        store.add(BoundingBox::new(10.0, 10.0, 20.0, 20.0, 0));
        let raster = Raster::solid(40, 40, [0, 0, 255, 255]).unwrap();

        let mut scene = Scene::new(&viewport, &store);
        scene.raster = Some(&raster);
        let canvas = rasterize(&scene, 50, 50).unwrap();

        // Outline on the left edge, raster inside, background outside.
        let edge = canvas.pixel(10, 20).unwrap();
        assert!(edge[0] > 200 && edge[2] < 100, "edge {:?}", edge);
        assert_eq!(canvas.pixel(20, 20), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(45, 45), Some([0x11, 0x11, 0x11, 255]));
    }
}
