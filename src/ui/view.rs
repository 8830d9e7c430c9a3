//! HTML views for the web form.
//!
//! Plain server-rendered pages: no template engine, no client framework. The
//! only script is the busy indicator shown while an extraction request is in
//! flight.

use crate::config::ExtractionMode;
use crate::extract::DOWNLOAD_FILE_NAME;
use crate::preview::{table_previews, Grid, TablePreview};
use crate::session::{Session, SessionState};
use std::fmt::Write as _;
use uuid::Uuid;

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; min-height: 100vh; }
aside { width: 20rem; padding: 1.5rem; background: #f0f2f6; }
main { flex: 1; padding: 1.5rem 2.5rem; max-width: 70rem; }
.main-header { font-size: 2.5rem; font-weight: bold; margin-bottom: 1rem; }
.sub-header { font-size: 1.5rem; font-weight: bold; margin-top: 1rem; margin-bottom: 0.5rem; }
.result-container { padding: 1.5rem; background-color: #f8f9fa; border-radius: 0.5rem; margin-top: 1rem; }
.json-view { font-family: monospace; white-space: pre-wrap; overflow-x: auto; background-color: #f0f0f0; padding: 1rem; border-radius: 0.3rem; }
.error { padding: 1rem; background: #ffebee; color: #b71c1c; border-radius: 0.3rem; white-space: pre-wrap; }
.busy { display: none; margin-top: 1rem; font-style: italic; }
table { border-collapse: collapse; margin-bottom: 1rem; }
th, td { border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; }
th { background: #eee; }
label { display: block; margin: 0.4rem 0; }
"#;

const BUSY_SCRIPT: &str = r#"
document.querySelectorAll('form[data-busy]').forEach(function (form) {
  form.addEventListener('submit', function () {
    form.querySelectorAll('button').forEach(function (b) { b.disabled = true; });
    var busy = document.getElementById(form.dataset.busy);
    if (busy) { busy.style.display = 'block'; }
  });
});
"#;

const ABOUT: &str = r#"<details>
<summary>About This App</summary>
<h3>How It Works</h3>
<p>This application uses a vision language model to analyze purchase order documents and extract structured information.</p>
<ol>
<li><b>Upload</b>: The app accepts PDF purchase orders</li>
<li><b>Process</b>: Each page is rendered to an image and sent to the Anthropic Messages API</li>
<li><b>Extract</b>: Structured data is extracted including PO details, customer information, vendor details, and table data</li>
<li><b>Result</b>: The extracted information is presented in a structured JSON format</li>
</ol>
<h3>Tips for Best Results</h3>
<ul>
<li>Ensure PDFs are clear and not scanned at low resolution</li>
<li>For complex tables, use the Advanced extraction mode</li>
<li>If information is missing, check if it exists in the original document</li>
</ul>
<h3>Privacy Note</h3>
<p>All processing is done via the Anthropic API. Your API key and documents are sent directly to Anthropic.
This app does not store any of your documents or extracted data permanently.</p>
</details>"#;

/// Escape text for use inside HTML element content or a quoted attribute.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(sidebar: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Purchase Order Extractor</title>
<style>{STYLE}</style>
</head>
<body>
<aside>{sidebar}</aside>
<main>
<div class="main-header">Purchase Order Extractor</div>
<p>This app extracts structured information from purchase order PDFs using a vision model approach.
Upload a purchase order PDF and get back structured data in JSON format.</p>
{body}
{ABOUT}
</main>
<script>{BUSY_SCRIPT}</script>
</body>
</html>"#
    )
}

fn error_box(message: &str) -> String {
    format!(r#"<div class="error" role="alert">{}</div>"#, escape_html(message))
}

/// Upload form. On a session page the new file replaces that session's
/// document instead of opening a second session.
fn upload_form(session: Option<Uuid>) -> String {
    let replace = session
        .map(|id| format!(r#"<input type="hidden" name="session" value="{id}">"#))
        .unwrap_or_default();
    format!(
        r#"<form action="/sessions" method="post" enctype="multipart/form-data">
{replace}
<label>Upload Purchase Order PDF <input type="file" name="file" accept="application/pdf,.pdf" required></label>
<button type="submit">Upload</button>
</form>"#
    )
}

/// Landing page: nothing uploaded yet.
pub fn index_page(error: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(msg) = error {
        body.push_str(&error_box(msg));
    }
    body.push_str(&upload_form(None));

    let sidebar = r#"<div class="sub-header">Configuration</div>
<p>Upload a PDF to configure the extraction.</p>"#;
    layout(sidebar, &body)
}

fn mode_radio(mode: ExtractionMode, selected: ExtractionMode) -> String {
    format!(
        r#"<label><input type="radio" name="mode" value="{}"{}> {}</label>"#,
        mode.as_str(),
        if mode == selected { " checked" } else { "" },
        mode.label()
    )
}

fn extract_form(session: &Session) -> String {
    format!(
        r#"<div class="sub-header">Configuration</div>
<form action="/sessions/{id}/extract" method="post" data-busy="busy">
<label>Anthropic API Key
<input type="password" name="api_key" autocomplete="off" title="Enter your Anthropic API key to use Claude for document extraction">
</label>
<fieldset>
<legend title="Basic mode extracts common fields, Advanced extracts all detected fields">Extraction Mode</legend>
{basic}
{advanced}
</fieldset>
<button type="submit">Extract Purchase Order Data</button>
<div id="busy" class="busy">Extracting data from the purchase order...</div>
</form>
<form action="/sessions/{id}/reset" method="post">
<button type="submit">Start over</button>
</form>"#,
        id = session.id(),
        basic = mode_radio(ExtractionMode::Basic, session.mode()),
        advanced = mode_radio(ExtractionMode::Advanced, session.mode()),
    )
}

fn pdf_preview(session: &Session) -> String {
    let Some(doc) = session.document() else {
        return String::new();
    };
    format!(
        r#"<details open>
<summary>Preview PDF: {name}</summary>
<iframe src="data:application/pdf;base64,{data}" width="100%" height="500" type="application/pdf"></iframe>
</details>"#,
        name = escape_html(doc.file_name()),
        data = doc.to_base64(),
    )
}

fn grid_table(grid: &Grid) -> String {
    let mut html = String::from("<table><thead><tr>");
    for col in &grid.columns {
        let _ = write!(html, "<th>{}</th>", escape_html(col));
    }
    html.push_str("</tr></thead><tbody>");
    for row in &grid.rows {
        html.push_str("<tr>");
        for cell in row {
            let _ = write!(html, "<td>{}</td>", escape_html(cell));
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn result_section(session: &Session) -> String {
    let Some(data) = session.result() else {
        return String::new();
    };

    let pretty = serde_json::to_string_pretty(data).unwrap_or_default();
    let mut html = format!(
        r#"<div class="sub-header">Extracted Purchase Order Data</div>
<div class="result-container"><pre class="json-view">{}</pre></div>
<div class="sub-header">Download Options</div>
<a href="/sessions/{}/download" download="{DOWNLOAD_FILE_NAME}">Download JSON</a>"#,
        escape_html(&pretty),
        session.id(),
    );

    let previews = table_previews(data);
    if !previews.is_empty() {
        html.push_str(r#"<div class="sub-header">Table Preview</div>"#);
        for named in previews {
            let _ = write!(html, "<p><b>{}</b></p>", escape_html(&named.title));
            match named.preview {
                TablePreview::Grid(grid) => html.push_str(&grid_table(&grid)),
                TablePreview::Raw(value) => {
                    let raw = serde_json::to_string_pretty(&value).unwrap_or_default();
                    let _ = write!(html, r#"<pre class="json-view">{}</pre>"#, escape_html(&raw));
                }
            }
        }
    }
    html
}

/// Page for an existing session, whatever its state.
pub fn session_page(session: &Session) -> String {
    session_page_with_error(session, None)
}

/// Session page with a rejected-request message above the session's own
/// state. The session itself is left as it is.
pub fn session_page_with_error(session: &Session, error: Option<&str>) -> String {
    let mut body = String::new();
    body.push_str(&upload_form(Some(session.id())));
    body.push_str(&pdf_preview(session));
    if let Some(message) = error {
        body.push_str(&error_box(message));
    }

    match session.state() {
        SessionState::Failed(msg) => body.push_str(&error_box(msg)),
        SessionState::Extracting => {
            body.push_str(r#"<p class="busy" style="display:block">Extracting data from the purchase order...</p>"#)
        }
        SessionState::Extracted(_) => body.push_str(&result_section(session)),
        SessionState::Idle | SessionState::Loaded => {}
    }

    layout(&extract_form(session), &body)
}

/// Page for an unknown or expired session id.
pub fn not_found_page() -> String {
    index_page(Some("This session does not exist or has expired. Upload the PDF again."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::ExtractionOutcome;
    use crate::pipeline::input::Document;
    use serde_json::json;

    fn loaded() -> Session {
        let mut s = Session::new();
        s.load(Document::from_upload("<po>.pdf", b"%PDF-1.4".to_vec(), 1024).unwrap());
        s
    }

    #[test]
    fn index_has_upload_and_about() {
        let html = index_page(None);
        assert!(html.contains(r#"name="file""#));
        assert!(html.contains("About This App"));
        assert!(!html.contains(r#"name="session""#));
    }

    #[test]
    fn escape_covers_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">&'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn loaded_page_has_form_and_preview() {
        let s = loaded();
        let html = session_page(&s);
        assert!(html.contains(r#"name="api_key""#));
        assert!(html.contains(r#"value="basic" checked"#));
        assert!(html.contains("data:application/pdf;base64,JVBERi0xLjQ="));
        assert!(html.contains("&lt;po&gt;.pdf"));
        assert!(html.contains(&format!(r#"name="session" value="{}""#, s.id())));
        assert!(!html.contains("Extracted Purchase Order Data"));
    }

    #[test]
    fn failed_page_shows_error_escaped() {
        let mut s = loaded();
        s.begin_extraction("key", ExtractionMode::Basic).unwrap();
        s.finish_extraction(ExtractionOutcome {
            data: None,
            error: Some("API request failed with status 401: <html>".into()),
        });
        let html = session_page(&s);
        assert!(html.contains("status 401: &lt;html&gt;"));
        assert!(html.contains(r#"name="api_key""#), "form is offered again");
    }

    #[test]
    fn rejected_request_keeps_session_context() {
        let s = loaded();
        let html = session_page_with_error(&s, Some("Unknown extraction mode <x>"));
        assert!(html.contains("Unknown extraction mode &lt;x&gt;"));
        assert!(html.contains(&format!(r#"action="/sessions/{}/extract""#, s.id())));
        assert!(html.contains(r#"name="api_key""#));
    }

    #[test]
    fn extracted_page_has_json_download_and_tables() {
        let mut s = loaded();
        s.begin_extraction("key", ExtractionMode::Advanced).unwrap();
        s.finish_extraction(ExtractionOutcome {
            data: json!({
                "po_number": "PO-42",
                "table_data": {"items": [{"sku": "A1", "qty": 3}]}
            })
            .as_object()
            .cloned(),
            error: None,
        });
        let html = session_page(&s);
        assert!(html.contains("&quot;po_number&quot;: &quot;PO-42&quot;"));
        assert!(html.contains(&format!("/sessions/{}/download", s.id())));
        assert!(html.contains("<th>sku</th>"));
        assert!(html.contains("<td>3</td>"));
        assert!(html.contains(r#"value="advanced" checked"#));
    }
}
