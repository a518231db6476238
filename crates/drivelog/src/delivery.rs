//! File delivery and mail composition adapters.
//!
//! Exports are offered to a "share" target first and saved as a plain
//! download when sharing fails or is refused. On a terminal the share target
//! is an external command and the download is a file in the export
//! directory.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::ports::{DeliveryRoute, FileDelivery, MailComposer};

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|source| Error::DirectoryCreate {
            path: path.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Saves files into a directory, replacing any file of the same name.
#[derive(Debug, Clone)]
pub struct DirectoryDelivery {
    directory: PathBuf,
}

impl DirectoryDelivery {
    /// Deliver into `directory`, created on first use.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Where `filename` ends up.
    #[must_use]
    pub fn target(&self, filename: &str) -> PathBuf {
        self.directory.join(filename)
    }
}

impl FileDelivery for DirectoryDelivery {
    fn deliver(&self, content: &str, filename: &str, mime_type: &str) -> Result<DeliveryRoute> {
        ensure_dir(&self.directory)?;
        let path = self.target(filename);
        fs::write(&path, content)?;
        info!(path = %path.display(), mime_type, "Export saved");
        Ok(DeliveryRoute::Downloaded)
    }
}

/// Hands files to an external program.
///
/// The file is first written to a staging directory; the program is then run
/// with the configured arguments followed by the file path. A non-zero exit
/// counts as a refusal.
#[derive(Debug, Clone)]
pub struct CommandDelivery {
    program: String,
    args: Vec<String>,
    staging: PathBuf,
}

impl CommandDelivery {
    /// Build from an argv list such as `["xdg-open"]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigValidation`] if `argv` is empty.
    pub fn from_argv(argv: &[String], staging: impl Into<PathBuf>) -> Result<Self> {
        let (program, args) = argv.split_first().ok_or_else(|| Error::ConfigValidation {
            message: "share_command must name a program".to_string(),
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            staging: staging.into(),
        })
    }
}

impl FileDelivery for CommandDelivery {
    fn deliver(&self, content: &str, filename: &str, mime_type: &str) -> Result<DeliveryRoute> {
        ensure_dir(&self.staging)?;
        let path = self.staging.join(filename);
        fs::write(&path, content)?;

        debug!(program = %self.program, path = %path.display(), mime_type, "Sharing export");
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&path)
            .status()
            .map_err(|e| Error::delivery(format!("could not run {}: {e}", self.program)))?;

        if status.success() {
            Ok(DeliveryRoute::Shared)
        } else {
            Err(Error::delivery(format!("{} exited with {status}", self.program)))
        }
    }
}

/// Tries `primary`, then `fallback` if the primary fails.
pub struct FallbackDelivery {
    primary: Option<Box<dyn FileDelivery>>,
    fallback: Box<dyn FileDelivery>,
}

impl std::fmt::Debug for FallbackDelivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackDelivery")
            .field("has_primary", &self.primary.is_some())
            .finish_non_exhaustive()
    }
}

impl FallbackDelivery {
    /// Share through `primary`, download through `fallback`.
    #[must_use]
    pub fn new(primary: Box<dyn FileDelivery>, fallback: Box<dyn FileDelivery>) -> Self {
        Self {
            primary: Some(primary),
            fallback,
        }
    }

    /// Only the download route is available.
    #[must_use]
    pub fn download_only(fallback: Box<dyn FileDelivery>) -> Self {
        Self {
            primary: None,
            fallback,
        }
    }
}

impl FileDelivery for FallbackDelivery {
    fn deliver(&self, content: &str, filename: &str, mime_type: &str) -> Result<DeliveryRoute> {
        if let Some(primary) = &self.primary {
            match primary.deliver(content, filename, mime_type) {
                Ok(route) => return Ok(route),
                Err(e) => warn!(error = %e, "Share failed; falling back to download"),
            }
        }
        self.fallback.deliver(content, filename, mime_type)
    }
}

/// Writes each message as an `.eml` draft for a mail client to pick up.
#[derive(Debug)]
pub struct DraftMailComposer {
    directory: PathBuf,
    last_draft: RefCell<Option<PathBuf>>,
}

impl DraftMailComposer {
    /// Write drafts into `directory`, created on first use.
    #[must_use]
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            last_draft: RefCell::new(None),
        }
    }

    /// Path of the most recent draft.
    #[must_use]
    pub fn last_draft(&self) -> Option<PathBuf> {
        self.last_draft.borrow().clone()
    }
}

/// Header values are single-line.
fn header_value(text: &str) -> String {
    text.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a minimal plain-text RFC 5322 message.
#[must_use]
pub fn render_draft(recipient: &str, subject: &str, body: &str) -> String {
    let body = body.replace("\r\n", "\n").replace('\n', "\r\n");
    format!(
        "To: {}\r\nSubject: {}\r\nMIME-Version: 1.0\r\n\
         Content-Type: text/plain; charset=utf-8\r\nX-Unsent: 1\r\n\r\n{body}",
        header_value(recipient),
        header_value(subject),
    )
}

impl MailComposer for DraftMailComposer {
    fn compose(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        ensure_dir(&self.directory)?;
        let path = self
            .directory
            .join(format!("drivelog-{}.eml", Uuid::new_v4().simple()));
        fs::write(&path, render_draft(recipient, subject, body))?;
        info!(path = %path.display(), "Mail draft written");
        *self.last_draft.borrow_mut() = Some(path);
        Ok(())
    }
}
