//! Subcommands of the `sbat` binary.

pub mod convert;
pub mod render;
pub mod replay;

use std::path::{Path, PathBuf};
use std::time::Duration;

use sbat::config::ConfigError;
use sbat::format::FormatError;
use sbat::services::{ServiceError, ServiceWorker, Services};
use sbat::session::{ReplyEffect, Session, SessionError};
use sbat_render::RenderError;

/// How long to wait for a single service reply.
const SERVICE_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors surfaced to the command line.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Invalid event script {path:?}: {source}")]
    Events {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Failed(String),
}

pub type Result<T> = std::result::Result<T, CliError>;

pub(crate) fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_text(path: &Path, text: &str) -> Result<()> {
    std::fs::write(path, text).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Load `image` through a local service worker.
pub(crate) fn open_image(session: &mut Session, image: &Path) -> Result<ServiceWorker> {
    let mut worker = ServiceWorker::spawn(Services::local(None))?;
    session.request_image(&image.to_string_lossy())?;
    settle(session, &mut worker)?;
    if session.image().is_none() {
        return Err(CliError::Failed(format!("Could not load {:?}", image)));
    }
    Ok(worker)
}

/// Run every queued request to completion; the first failure is an error.
pub(crate) fn settle(session: &mut Session, worker: &mut ServiceWorker) -> Result<()> {
    for effect in session.pump_until_idle(worker, SERVICE_TIMEOUT) {
        match effect {
            ReplyEffect::Failed(message) => return Err(CliError::Failed(message)),
            ReplyEffect::ImageInstalled(size) => {
                log::debug!("Image ready: {}x{}", size.width(), size.height());
            }
            other => log::debug!("Service effect: {:?}", other),
        }
    }
    Ok(())
}

/// Import a label file into the session, logging skipped lines.
pub(crate) fn import_labels(session: &mut Session, labels: &Path) -> Result<()> {
    let report = session.import_labels(&read_text(labels)?)?;
    for warning in &report.warnings {
        log::warn!("{:?} line {}: {}", labels, warning.line, warning.message);
    }
    Ok(())
}
