//! Ordered annotation storage for the current image.
//!
//! Insertion order is draw order: later boxes paint over earlier ones. Every
//! mutation bumps [`AnnotationStore::revision`] so the render loop can tell
//! that a repaint is due.

use thiserror::Error;

use crate::model::{Annotation, BoundingBox, BoxId, ClassDef, Rgb, default_classes};

/// Errors from palette edits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Class index outside the palette
    #[error("Class {index} does not exist (palette has {len} classes)")]
    UnknownClass { index: usize, len: usize },
}

/// Boxes for a single image plus the class palette.
#[derive(Debug, Clone)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    classes: Vec<ClassDef>,
    /// Counter for generating unique annotation IDs.
    next_id: BoxId,
    revision: u64,
}

impl AnnotationStore {
    /// Empty store with the default palette.
    pub fn new() -> Self {
        Self::with_classes(default_classes())
    }

    pub fn with_classes(classes: Vec<ClassDef>) -> Self {
        Self {
            annotations: Vec::new(),
            classes,
            next_id: 1,
            revision: 0,
        }
    }

    /// Monotonic counter, bumped by every mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn allocate_id(&mut self) -> BoxId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Append a box and return its ID.
    ///
    /// The store does not know whether an image is loaded; callers must not
    /// add boxes without one.
    pub fn add(&mut self, bbox: BoundingBox) -> BoxId {
        let id = self.allocate_id();
        self.annotations.push(Annotation { id, bbox });
        self.touch();
        id
    }

    /// Remove an annotation by ID.
    pub fn remove(&mut self, id: BoxId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        let removed = self.annotations.remove(index);
        self.touch();
        Some(removed)
    }

    /// Remove the first annotation whose box is structurally equal to `bbox`.
    pub fn remove_matching(&mut self, bbox: &BoundingBox) -> Option<Annotation> {
        let id = self.annotations.iter().find(|a| a.bbox == *bbox)?.id;
        self.remove(id)
    }

    /// Replace every annotation at once. New IDs are assigned in order.
    pub fn replace_all(&mut self, boxes: impl IntoIterator<Item = BoundingBox>) {
        let mut replacement = Vec::new();
        for bbox in boxes {
            let id = self.allocate_id();
            replacement.push(Annotation { id, bbox });
        }
        self.annotations = replacement;
        self.touch();
    }

    /// Clear all annotations.
    pub fn clear(&mut self) {
        self.replace_all(std::iter::empty());
    }

    /// Find the first annotation in store order that contains the point.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<BoxId> {
        self.annotations
            .iter()
            .find(|a| a.bbox.contains(x, y))
            .map(|a| a.id)
    }

    pub fn get(&self, id: BoxId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Annotations in draw order.
    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Boxes in draw order, without IDs.
    pub fn boxes(&self) -> impl Iterator<Item = &BoundingBox> {
        self.annotations.iter().map(|a| &a.bbox)
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn classes(&self) -> &[ClassDef] {
        &self.classes
    }

    pub fn class(&self, index: usize) -> Option<&ClassDef> {
        self.classes.get(index)
    }

    /// Change one class color. Names and boxes are untouched; boxes pick the
    /// new color up at the next repaint since they only store the index.
    pub fn set_class_color(&mut self, index: usize, color: Rgb) -> Result<(), StoreError> {
        let len = self.classes.len();
        let class = self
            .classes
            .get_mut(index)
            .ok_or(StoreError::UnknownClass { index, len })?;
        class.color = color;
        self.touch();
        Ok(())
    }
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}
