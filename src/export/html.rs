use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

use super::{ExportContent, ExportError, ExportFormat, ExportOutcome, Exporter};
use crate::document::escape_html;

const BASE_STYLES: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', sans-serif;
    line-height: 1.6;
    color: #24292e;
    background-color: #ffffff;
}
.markdown-body { max-width: 860px; margin: 0 auto; padding: 32px; }
.markdown-body pre { background: #f6f8fa; padding: 16px; overflow: auto; border-radius: 6px; }
.markdown-body code { font-family: ui-monospace, 'SFMono-Regular', Menlo, Consolas, monospace; }
.markdown-body table { border-collapse: collapse; }
.markdown-body th, .markdown-body td { border: 1px solid #d0d7de; padding: 6px 13px; }
.markdown-body blockquote { color: #57606a; border-left: 4px solid #d0d7de; margin: 0; padding: 0 1em; }
.mermaid-container { text-align: center; margin: 16px 0; }
.mermaid-error { color: #cf222e; }
@media print {
    body { margin: 0; }
    .markdown-body { max-width: none; padding: 20px; }
}
"#;

/// Standalone HTML page with embedded styles and an export metadata block.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlExporter;

impl HtmlExporter {
    pub fn build_document(content: &ExportContent, exported_at: DateTime<Utc>) -> String {
        let metadata = json!({
            "exportedAt": exported_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            "exportedBy": "MKReader",
            "originalTitle": content.title,
            "format": "html",
        });
        // `</` would end the script element early.
        let metadata = serde_json::to_string_pretty(&metadata)
            .unwrap_or_default()
            .replace("</", "<\\/");
        let title = escape_html(&content.title);

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<style>{BASE_STYLES}</style>
</head>
<body>
<div class="markdown-body">
{html}
</div>
<script type="application/json" id="export-metadata">
{metadata}
</script>
</body>
</html>
"#,
            html = content.html,
        )
    }
}

impl Exporter for HtmlExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Html
    }

    fn export(&self, content: &ExportContent, dest: &Path) -> Result<ExportOutcome, ExportError> {
        let document = Self::build_document(content, Utc::now());
        std::fs::write(dest, &document).map_err(|err| ExportError::Failed {
            format: ExportFormat::Html,
            message: format!("{}: {err}", dest.display()),
        })?;
        Ok(ExportOutcome {
            path: dest.to_path_buf(),
            format: ExportFormat::Html,
            size: document.len(),
        })
    }
}
