//! YOLO line codec.
//!
//! Converts between pixel-space [`BoundingBox`]es and normalized lines.
//! Conversions need an [`ImageSize`], which can not hold a zero dimension.

use std::path::Path;

use crate::constants::YOLO_PRECISION;
use crate::format::error::{FormatError, FormatWarning};
use crate::model::{BoundingBox, ImageSize};

/// Which field counts a line may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineGrammar {
    /// Label files: `class cx cy w h` with an optional trailing confidence.
    Import,
    /// Detection responses: exactly `class cx cy w h`.
    Detection,
}

impl LineGrammar {
    fn accepts(self, fields: usize) -> bool {
        match self {
            LineGrammar::Import => fields == 5 || fields == 6,
            LineGrammar::Detection => fields == 5,
        }
    }

    fn expected(self) -> &'static str {
        match self {
            LineGrammar::Import => "5 or 6",
            LineGrammar::Detection => "5",
        }
    }
}

/// Counts from a decode pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Lines turned into boxes.
    pub imported: usize,
    /// Non-blank lines that were skipped.
    pub skipped: usize,
    /// One entry per skipped line.
    pub warnings: Vec<FormatWarning>,
}

/// Boxes decoded from text, in input order.
#[derive(Debug, Clone, Default)]
pub struct Decoded {
    pub boxes: Vec<BoundingBox>,
    pub report: ImportReport,
}

/// Format one box as a normalized line.
pub fn format_line(bbox: &BoundingBox, size: ImageSize) -> String {
    let (width, height) = (size.width_f64(), size.height_f64());
    let (cx, cy) = bbox.center();
    format!(
        "{} {:.p$} {:.p$} {:.p$} {:.p$}",
        bbox.class,
        cx / width,
        cy / height,
        bbox.w / width,
        bbox.h / height,
        p = YOLO_PRECISION
    )
}

/// Export boxes as newline-joined lines, in the given order.
pub fn export_boxes<'a>(
    boxes: impl IntoIterator<Item = &'a BoundingBox>,
    size: ImageSize,
) -> String {
    boxes
        .into_iter()
        .map(|b| format_line(b, size))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse a single non-blank line into a normalized pixel-space box.
pub fn parse_line(line: &str, size: ImageSize, grammar: LineGrammar) -> Result<BoundingBox, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if !grammar.accepts(parts.len()) {
        return Err(format!(
            "expected {} fields, found {}",
            grammar.expected(),
            parts.len()
        ));
    }

    let class: usize = parts[0]
        .parse()
        .map_err(|_| format!("invalid class index '{}'", parts[0]))?;
    let number = |i: usize| -> Result<f64, String> {
        parts[i]
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| format!("invalid number '{}'", parts[i]))
    };
    let cx = number(1)?;
    let cy = number(2)?;
    let nw = number(3)?;
    let nh = number(4)?;

    let (width, height) = (size.width_f64(), size.height_f64());
    let w = nw * width;
    let h = nh * height;
    Ok(BoundingBox::new(cx * width - w / 2.0, cy * height - h / 2.0, w, h, class).normalized())
}

/// Decode every line of `text`, skipping blank and malformed lines.
pub fn decode(text: &str, size: ImageSize, grammar: LineGrammar) -> Decoded {
    let mut decoded = Decoded::default();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line, size, grammar) {
            Ok(bbox) => {
                decoded.boxes.push(bbox);
                decoded.report.imported += 1;
            }
            Err(reason) => {
                log::debug!("Skipping label line {}: {}", index + 1, reason);
                decoded.report.skipped += 1;
                decoded
                    .report
                    .warnings
                    .push(FormatWarning::new(index + 1, reason));
            }
        }
    }
    decoded
}

/// Decode a label file's contents (5 or 6 fields per line).
pub fn import(text: &str, size: ImageSize) -> Decoded {
    decode(text, size, LineGrammar::Import)
}

/// Decode a detection response using the dimensions it was returned with.
pub fn decode_detection(text: &str, width: u32, height: u32) -> Result<Decoded, FormatError> {
    let size = ImageSize::new(width, height).ok_or(FormatError::InvalidDimensions { width, height })?;
    Ok(decode(text, size, LineGrammar::Detection))
}

/// Read and decode a label file from disk.
pub fn read_label_file(path: &Path, size: ImageSize) -> Result<Decoded, FormatError> {
    let text = std::fs::read_to_string(path).map_err(|e| FormatError::io(path, e))?;
    let decoded = import(&text, size);
    log::info!(
        "Imported {} boxes from {:?} ({} lines skipped)",
        decoded.report.imported,
        path,
        decoded.report.skipped
    );
    Ok(decoded)
}

/// Write boxes to a label file.
pub fn write_label_file<'a>(
    path: &Path,
    boxes: impl IntoIterator<Item = &'a BoundingBox>,
    size: ImageSize,
) -> Result<(), FormatError> {
    let text = export_boxes(boxes, size);
    std::fs::write(path, text).map_err(|e| FormatError::io(path, e))?;
    log::info!("Wrote labels to {:?}", path);
    Ok(())
}
