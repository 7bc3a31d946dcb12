use std::path::PathBuf;

use clap::Args;
use sbat::format::{FormatError, yolo};
use sbat::model::ImageSize;

use super::Result;

#[derive(Args)]
pub struct ConvertArgs {
    /// Label file to read
    #[arg(long)]
    pub labels: PathBuf,

    /// Image width in pixels
    #[arg(long)]
    pub width: u32,

    /// Image height in pixels
    #[arg(long)]
    pub height: u32,

    /// Print `class x y w h` in pixels instead of normalized lines
    #[arg(long)]
    pub to_pixels: bool,
}

pub fn run(args: &ConvertArgs) -> Result<()> {
    let size = ImageSize::new(args.width, args.height).ok_or(FormatError::InvalidDimensions {
        width: args.width,
        height: args.height,
    })?;
    let decoded = yolo::read_label_file(&args.labels, size)?;
    for warning in &decoded.report.warnings {
        log::warn!("line {}: {}", warning.line, warning.message);
    }

    if args.to_pixels {
        for b in &decoded.boxes {
            println!("{} {:.2} {:.2} {:.2} {:.2}", b.class, b.x, b.y, b.w, b.h);
        }
    } else {
        let text = yolo::export_boxes(&decoded.boxes, size);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
