//! Exporting the active document.
//!
//! The coordinator reads what the content surface currently shows (after the
//! diagram and highlight passes) together with the document's display name,
//! and hands both to the exporter registered for the requested format.

mod html;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;

use crate::session::SessionManager;
use crate::view::ContentSurface;

pub use html::HtmlExporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExportFormat {
    Pdf,
    Html,
    Png,
}

impl ExportFormat {
    pub const ALL: [Self; 3] = [Self::Pdf, Self::Html, Self::Png];

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Html => "html",
            Self::Png => "png",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(Self::Pdf),
            "html" | "htm" => Ok(Self::Html),
            "png" => Ok(Self::Png),
            other => Err(format!("unknown export format '{other}' (expected pdf, html or png)")),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("no document is open")]
    NoActiveDocument,

    #[error("{0} export is not available")]
    Unsupported(ExportFormat),

    #[error("{format} export failed: {message}")]
    Failed {
        format: ExportFormat,
        message: String,
    },
}

/// What gets exported: the installed HTML and the tab title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportContent {
    pub title: String,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutcome {
    pub path: PathBuf,
    pub format: ExportFormat,
    /// Bytes written.
    pub size: usize,
}

/// Writes one format. PDF and PNG renderers live outside this crate and
/// plug in through this trait.
pub trait Exporter {
    fn format(&self) -> ExportFormat;

    /// # Errors
    /// Returns [`ExportError::Failed`] if the output cannot be produced or
    /// written.
    fn export(&self, content: &ExportContent, dest: &Path) -> Result<ExportOutcome, ExportError>;
}

/// Dispatches exports to the registered [`Exporter`]s.
pub struct ExportCoordinator {
    exporters: Vec<Box<dyn Exporter>>,
}

impl fmt::Debug for ExportCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formats: Vec<ExportFormat> = self.exporters.iter().map(|e| e.format()).collect();
        f.debug_struct("ExportCoordinator")
            .field("formats", &formats)
            .finish()
    }
}

impl Default for ExportCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ExportCoordinator {
    /// A coordinator with the built-in HTML exporter.
    pub fn new() -> Self {
        let mut coordinator = Self::empty();
        coordinator.register(HtmlExporter);
        coordinator
    }

    pub fn empty() -> Self {
        Self {
            exporters: Vec::new(),
        }
    }

    /// Add an exporter, replacing any previous one for the same format.
    pub fn register(&mut self, exporter: impl Exporter + 'static) {
        let format = exporter.format();
        self.exporters.retain(|existing| existing.format() != format);
        self.exporters.push(Box::new(exporter));
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        self.exporters.iter().any(|e| e.format() == format)
    }

    /// Formats with a registered exporter, in [`ExportFormat::ALL`] order.
    pub fn formats(&self) -> Vec<ExportFormat> {
        ExportFormat::ALL
            .into_iter()
            .filter(|format| self.supports(*format))
            .collect()
    }

    /// Parse `value` and accept it only if an exporter handles it.
    ///
    /// # Errors
    /// Returns a message naming the available formats otherwise.
    pub fn parse_format(&self, value: &str) -> Result<ExportFormat, String> {
        let format = value.parse::<ExportFormat>()?;
        if self.supports(format) {
            return Ok(format);
        }
        let available: Vec<String> = self.formats().iter().map(ToString::to_string).collect();
        Err(format!(
            "{format} export is not available (available: {})",
            available.join(", ")
        ))
    }

    /// Export the session's active document.
    ///
    /// `dest` defaults to [`default_file_name`] in the current directory.
    ///
    /// # Errors
    /// [`ExportError::NoActiveDocument`] when nothing is active,
    /// [`ExportError::Unsupported`] when no exporter handles `format`, and
    /// whatever the exporter reports.
    pub fn export<S: ContentSurface>(
        &self,
        session: &SessionManager<S>,
        format: ExportFormat,
        dest: Option<&Path>,
    ) -> Result<ExportOutcome, ExportError> {
        let content = current_content(session)?;
        let dest = dest.map_or_else(
            || PathBuf::from(default_file_name(Some(&content.title), format, today())),
            Path::to_path_buf,
        );
        self.export_content(&content, format, &dest)
    }

    /// # Errors
    /// [`ExportError::Unsupported`] when no exporter handles `format`, and
    /// whatever the exporter reports.
    pub fn export_content(
        &self,
        content: &ExportContent,
        format: ExportFormat,
        dest: &Path,
    ) -> Result<ExportOutcome, ExportError> {
        let _scope = crate::perf::scope("export.write");
        let exporter = self
            .exporters
            .iter()
            .find(|e| e.format() == format)
            .ok_or(ExportError::Unsupported(format))?;
        let outcome = exporter.export(content, dest)?;
        tracing::info!(
            %format,
            path = %outcome.path.display(),
            size = outcome.size,
            "exported document"
        );
        Ok(outcome)
    }
}

/// The active document's installed HTML and title.
///
/// # Errors
/// [`ExportError::NoActiveDocument`] when no document is active.
pub fn current_content<S: ContentSurface>(
    session: &SessionManager<S>,
) -> Result<ExportContent, ExportError> {
    let document = session
        .active_document()
        .ok_or(ExportError::NoActiveDocument)?;
    if session.surface().is_welcome() {
        return Err(ExportError::NoActiveDocument);
    }
    Ok(ExportContent {
        title: document.display_name().to_string(),
        html: session.surface().html().to_string(),
    })
}

/// `<title>-YYYY-MM-DD.<ext>`, keeping only word characters, whitespace and
/// hyphens from the title. Without a title the base name is `document`.
pub fn default_file_name(title: Option<&str>, format: ExportFormat, date: NaiveDate) -> String {
    let base: String = title.map_or_else(
        || "document".to_string(),
        |title| {
            title
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
                .collect()
        },
    );
    format!("{base}-{}.{}", date.format("%Y-%m-%d"), format.extension())
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
