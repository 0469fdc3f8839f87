//! Document export — turns the generated plan into HTML and PDF.

pub mod html;
pub mod pdf;

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, info};

use crate::assets::BackgroundImage;
use crate::error::ExportError;

pub use pdf::PdfLayout;

/// File name the plan PDF is offered under.
pub fn plan_file_name(name: &str) -> String {
    format!("{name}_wellness_plan.pdf")
}

/// File name of the HTML copy saved next to the PDF.
pub fn plan_html_file_name(name: &str) -> String {
    format!("{name}_wellness_plan.html")
}

/// Where `DocumentExporter::save` put the files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedPlan {
    pub pdf: PathBuf,
    pub html: PathBuf,
}

/// Output of one export.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    /// Standalone HTML document.
    pub html: String,
    /// PDF bytes, starting with `%PDF`.
    pub pdf: Vec<u8>,
}

/// Converts plan text into downloadable documents.
#[derive(Debug, Clone)]
pub struct DocumentExporter {
    title: String,
    layout: PdfLayout,
    background: Option<BackgroundImage>,
}

impl DocumentExporter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            layout: PdfLayout::default(),
            background: None,
        }
    }

    /// Embed a background image in the HTML output.
    pub fn with_background(mut self, background: Option<BackgroundImage>) -> Self {
        self.background = background;
        self
    }

    /// Convert markdown-like text to an HTML document and PDF bytes.
    pub fn export(&self, markdown: &str) -> Result<ExportedDocument, ExportError> {
        if markdown.trim().is_empty() {
            return Err(ExportError::EmptyDocument);
        }
        let body = html::markdown_to_html(markdown);
        let html = html::wrap_html(&body, &self.title, self.background.as_ref());
        let pdf = pdf::render_pdf(markdown, &self.title, &self.layout)?;
        debug!(html_len = html.len(), pdf_len = pdf.len(), "Exported document");
        Ok(ExportedDocument { html, pdf })
    }

    /// Write the PDF to `dir/{name}_wellness_plan.pdf`, creating `dir` if needed.
    pub async fn save_pdf(
        &self,
        dir: &Path,
        name: &str,
        document: &ExportedDocument,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(plan_file_name(name));
        fs::write(&path, &document.pdf).await?;
        info!(path = %path.display(), bytes = document.pdf.len(), "Saved wellness plan PDF");
        Ok(path)
    }

    /// Write the HTML document to `dir/{name}_wellness_plan.html`.
    pub async fn save_html(
        &self,
        dir: &Path,
        name: &str,
        document: &ExportedDocument,
    ) -> Result<PathBuf, ExportError> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(plan_html_file_name(name));
        fs::write(&path, &document.html).await?;
        info!(path = %path.display(), bytes = document.html.len(), "Saved wellness plan HTML");
        Ok(path)
    }

    /// Write both the PDF and the HTML copy.
    pub async fn save(
        &self,
        dir: &Path,
        name: &str,
        document: &ExportedDocument,
    ) -> Result<SavedPlan, ExportError> {
        let pdf = self.save_pdf(dir, name, document).await?;
        let html = self.save_html(dir, name, document).await?;
        Ok(SavedPlan { pdf, html })
    }
}
