use std::path::PathBuf;

use clap::Args;
use sbat::config::AppConfig;
use sbat::gesture::InputEvent;
use sbat::session::Session;

use super::{CliError, Result};

#[derive(Args)]
pub struct ReplayArgs {
    /// Source TIFF image
    #[arg(long)]
    pub image: PathBuf,

    /// JSON array of input events
    #[arg(long)]
    pub events: PathBuf,

    /// Label file loaded before replaying
    #[arg(long)]
    pub labels: Option<PathBuf>,

    /// Class assigned to drawn boxes
    #[arg(long, default_value_t = 0)]
    pub class: usize,

    /// Treat finished drags as crop selections
    #[arg(long)]
    pub crop_mode: bool,

    /// Fit the image into a surface of this width (needs --height)
    #[arg(long, requires = "height")]
    pub width: Option<u32>,

    /// Fit the image into a surface of this height (needs --width)
    #[arg(long, requires = "width")]
    pub height: Option<u32>,

    /// Where to write the resulting labels (stdout when omitted)
    #[arg(long, short)]
    pub out: Option<PathBuf>,
}

pub fn run(args: &ReplayArgs, config: &AppConfig) -> Result<()> {
    let script = super::read_text(&args.events)?;
    let events: Vec<InputEvent> =
        serde_json::from_str(&script).map_err(|source| CliError::Events {
            path: args.events.clone(),
            source,
        })?;

    let mut session = Session::new(config);
    let mut worker = super::open_image(&mut session, &args.image)?;
    if let Some(labels) = &args.labels {
        super::import_labels(&mut session, labels)?;
    }
    if let (Some(width), Some(height)) = (args.width, args.height) {
        session.fit_to_surface(width, height);
    }
    session.set_current_class(args.class)?;
    session.set_crop_mode(args.crop_mode);

    for event in &events {
        let outcome = session.handle_event(event);
        log::debug!("{:?} -> {:?}", event, outcome);
        // Crops replace the image; finish them before the next event.
        super::settle(&mut session, &mut worker)?;
    }
    log::info!("Replayed {} events", events.len());

    let labels = session.export_labels()?;
    match &args.out {
        Some(path) => super::write_text(path, &labels)?,
        None => println!("{}", labels),
    }
    Ok(())
}
