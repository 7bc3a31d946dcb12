use std::path::PathBuf;

use clap::Args;
use sbat::config::AppConfig;
use sbat::session::Session;

use super::Result;

#[derive(Args)]
pub struct RenderArgs {
    /// Source TIFF image
    #[arg(long)]
    pub image: PathBuf,

    /// Label file to draw on top of the image
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Brightness offset in percent
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub brightness: f32,

    /// Contrast offset in percent
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub contrast: f32,

    /// Output width in pixels
    #[arg(long, default_value_t = 1024)]
    pub width: u32,

    /// Output height in pixels
    #[arg(long, default_value_t = 1024)]
    pub height: u32,

    /// Output PNG path
    #[arg(long, short)]
    pub out: PathBuf,
}

pub fn run(args: &RenderArgs, config: &AppConfig) -> Result<()> {
    let mut session = Session::new(config);
    let _worker = super::open_image(&mut session, &args.image)?;

    if let Some(labels) = &args.labels {
        super::import_labels(&mut session, labels)?;
    }
    session.set_brightness(args.brightness);
    session.set_contrast(args.contrast);
    session.fit_to_surface(args.width, args.height);

    let canvas = session.render(args.width, args.height)?;
    canvas.save_png(&args.out)?;
    println!(
        "Rendered {} boxes to {}",
        session.store().len(),
        args.out.display()
    );
    Ok(())
}
