//! Chart export handlers.

use std::sync::{Arc, OnceLock};

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Form;
use serde::Deserialize;

use svg2pdf::usvg;

use crate::error::ApiError;

/// Chart export form.
#[derive(Debug, Deserialize)]
pub struct ExportForm {
    /// The chart as an SVG document.
    #[serde(default)]
    pub svgdata: String,
}

/// Render a submitted SVG chart as a PDF download.
pub async fn export_chart(Form(form): Form<ExportForm>) -> Result<impl IntoResponse, ApiError> {
    if form.svgdata.trim().is_empty() {
        return Err(ApiError::BadRequest("svgdata is empty".into()));
    }

    let svg_len = form.svgdata.len();
    let pdf = tokio::task::spawn_blocking(move || render_pdf(&form.svgdata))
        .await
        .map_err(|e| ApiError::Internal(format!("PDF render task failed: {e}")))??;

    tracing::debug!(svg_len, pdf_len = pdf.len(), "Chart exported");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, "attachment; filename=chart.pdf"),
        ],
        pdf,
    ))
}

/// System fonts, loaded once on first export.
fn system_fonts() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let mut fonts = usvg::fontdb::Database::new();
            fonts.load_system_fonts();
            tracing::debug!(faces = fonts.len(), "Loaded system fonts");
            Arc::new(fonts)
        })
        .clone()
}

/// Parse an SVG document, resolving text against the system fonts.
fn parse_svg(svg: &str) -> Result<usvg::Tree, ApiError> {
    let options = usvg::Options {
        fontdb: system_fonts(),
        ..usvg::Options::default()
    };
    usvg::Tree::from_str(svg, &options)
        .map_err(|e| ApiError::BadRequest(format!("invalid SVG: {e}")))
}

/// Parse an SVG document and convert it to PDF bytes.
fn render_pdf(svg: &str) -> Result<Vec<u8>, ApiError> {
    let tree = parse_svg(svg)?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|e| ApiError::Internal(format!("PDF conversion failed: {e:?}")))
}
