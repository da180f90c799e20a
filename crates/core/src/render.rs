//! Rendering: entity tables and the full page.
//!
//! Global concerns (theme, pending toasts) arrive through an explicit
//! [`RenderContext`]; nothing here reads process state.

use crate::model::{AnalysisResult, Entity};
use crate::notify::{Toast, ToastVariant};
use crate::theme::Theme;
use crate::upload::UploadWidget;
use crate::view::{ResultsView, ViewState};

pub const OPENAI_TITLE: &str = "OpenAI Results";
pub const HUGGINGFACE_TITLE: &str = "Hugging Face Results";

/// Escape text for HTML element content and quoted attribute values.
pub fn escape_html(content: &str) -> String {
    content
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// One titled table of entities, rows in the order received.
pub struct ResultsTable<'a> {
    pub title: &'a str,
    pub entities: &'a [Entity],
}

impl<'a> ResultsTable<'a> {
    pub fn new(title: &'a str, entities: &'a [Entity]) -> Self {
        ResultsTable { title, entities }
    }

    /// The two tables for a result: OpenAI first, then Hugging Face.
    pub fn pair(result: &'a AnalysisResult) -> [ResultsTable<'a>; 2] {
        [
            ResultsTable::new(OPENAI_TITLE, &result.openai_results),
            ResultsTable::new(HUGGINGFACE_TITLE, &result.huggingface_results),
        ]
    }

    pub fn render_html(&self) -> String {
        let rows: String = self
            .entities
            .iter()
            .map(|e| {
                format!(
                    "        <tr><td class=\"entity\">{}</td><td>{}</td></tr>\n",
                    escape_html(&e.entity),
                    escape_html(&e.kind)
                )
            })
            .collect();

        format!(
            r#"<div class="results-table">
  <h3>{title}</h3>
  <table>
    <thead>
      <tr><th class="entity">Entity</th><th>Type</th></tr>
    </thead>
    <tbody>
{rows}    </tbody>
  </table>
</div>
"#,
            title = escape_html(self.title),
            rows = rows,
        )
    }

    /// Column-aligned plain text for terminals.
    pub fn render_text(&self) -> String {
        let entity_width = self
            .entities
            .iter()
            .map(|e| e.entity.chars().count())
            .chain(std::iter::once("Entity".len()))
            .max()
            .unwrap_or(0);
        let type_width = self
            .entities
            .iter()
            .map(|e| e.kind.chars().count())
            .chain(std::iter::once("Type".len()))
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        out.push_str(self.title);
        out.push('\n');
        out.push_str(&format!("{:<w$}  Type\n", "Entity", w = entity_width));
        out.push_str(&format!(
            "{}  {}\n",
            "-".repeat(entity_width),
            "-".repeat(type_width)
        ));
        for e in self.entities {
            out.push_str(&format!("{:<w$}  {}\n", e.entity, e.kind, w = entity_width));
        }
        out
    }
}

/// The results card, or nothing when no result is present.
pub fn render_results_section(result: Option<&AnalysisResult>) -> String {
    let Some(result) = result else {
        return String::new();
    };
    let tables: String = ResultsTable::pair(result)
        .iter()
        .map(ResultsTable::render_html)
        .collect();
    format!(
        r#"<section class="card" id="results">
<h2>Named Entity Recognition Results</h2>
<div class="results-grid">
{tables}</div>
</section>
"#
    )
}

/// Both tables as terminal text, separated by a blank line.
pub fn render_results_text(result: &AnalysisResult) -> String {
    ResultsTable::pair(result)
        .iter()
        .map(ResultsTable::render_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Process-wide presentation state, passed in explicitly.
pub struct RenderContext<'a> {
    pub title: &'a str,
    pub theme: &'a Theme,
    pub toasts: &'a [Toast],
}

fn render_toasts(toasts: &[Toast]) -> String {
    toasts
        .iter()
        .map(|t| {
            let class = match t.variant {
                ToastVariant::Default => "toast",
                ToastVariant::Destructive => "toast toast-destructive",
            };
            let role = if t.is_error() { "alert" } else { "status" };
            format!(
                "<div class=\"{}\" role=\"{}\"><strong>{}</strong><p>{}</p></div>\n",
                class,
                role,
                escape_html(&t.title),
                escape_html(&t.description)
            )
        })
        .collect()
}

/// The complete page: upload card, toasts, and results section.
///
/// The current result travels back with the next form post in the hidden
/// `previous` field, so a failed analysis re-renders the same tables. It
/// precedes the file input so it is read before the upload.
pub fn render_page(ctx: &RenderContext<'_>, widget: &UploadWidget, view: &ResultsView) -> String {
    let previous = view
        .result()
        .and_then(|r| serde_json::to_string(r).ok())
        .map(|json| {
            format!(
                "<input type=\"hidden\" name=\"previous\" value=\"{}\">",
                escape_html(&json)
            )
        })
        .unwrap_or_default();

    let analyzing = view.state() == ViewState::Analyzing;
    let label = if analyzing { "Analyzing..." } else { "Analyze Text" };
    let disabled = if view.can_submit() { "" } else { " disabled" };

    format!(
        r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
{css_vars}{style}</style>
</head>
<body>
<main>
<h1>{title}</h1>
<div class="toasts" id="toasts">
{toasts}</div>
<section class="card">
<h2>Upload Text File</h2>
<form method="post" action="/" enctype="multipart/form-data" id="upload-form">
{previous}
{widget}
<button type="submit" id="submit"{disabled}>{label}</button>
</form>
</section>
{results}</main>
<script>
{script}</script>
</body>
</html>
"#,
        title = escape_html(ctx.title),
        css_vars = ctx.theme.css_variables(),
        style = PAGE_STYLE,
        toasts = render_toasts(ctx.toasts),
        widget = widget.render_html(),
        previous = previous,
        disabled = disabled,
        label = label,
        results = render_results_section(view.result()),
        script = PAGE_SCRIPT,
    )
}

const PAGE_STYLE: &str = r#"* { box-sizing: border-box; }
body { margin: 0; font-family: system-ui, sans-serif; background: var(--background); color: var(--text); }
main { max-width: 960px; margin: 0 auto; padding: 2rem 1rem; display: grid; gap: 2rem; }
.card { background: var(--card); border-radius: 0.75rem; padding: 1.5rem; box-shadow: 0 1px 3px rgba(0,0,0,0.12); }
.dropzone { display: block; border: 2px dashed #cbd5e1; border-radius: 0.5rem; padding: 2rem; text-align: center; cursor: pointer; }
.dropzone.drag-active { border-color: var(--primary); background: color-mix(in srgb, var(--primary) 10%, transparent); }
.dropzone input { display: none; }
.dropzone-icon { font-size: 2.5rem; opacity: 0.5; }
.file-name { font-weight: 600; color: var(--primary); }
button { margin-top: 1rem; width: 100%; padding: 0.75rem; border: 0; border-radius: 0.5rem; background: var(--primary); color: #fff; font-size: 1rem; cursor: pointer; }
button[disabled] { opacity: 0.5; cursor: not-allowed; }
.results-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 1.5rem; }
table { width: 100%; border-collapse: collapse; }
th, td { text-align: left; padding: 0.5rem; border-bottom: 1px solid #e2e8f0; }
th.entity { width: 200px; }
td.entity { font-weight: 500; }
.toast { border-left: 4px solid var(--secondary); background: var(--card); padding: 0.75rem 1rem; border-radius: 0.5rem; }
.toast-destructive { border-left-color: #dc2626; }
.toast p { margin: 0.25rem 0 0; }
"#;

const PAGE_SCRIPT: &str = r#"(function () {
  var zone = document.getElementById('dropzone');
  var input = document.getElementById('file-input');
  var nameLine = document.getElementById('file-name');
  var hint = zone.querySelector('.dropzone-hint');
  var button = document.getElementById('submit');
  var form = document.getElementById('upload-form');
  var busy = false;

  function showSelection() {
    var file = input.files && input.files[0];
    if (file) {
      nameLine.textContent = file.name;
      nameLine.hidden = false;
    }
    button.disabled = busy || !file;
  }

  input.addEventListener('change', showSelection);
  zone.addEventListener('dragover', function (e) {
    e.preventDefault();
    zone.classList.add('drag-active');
    hint.textContent = hint.dataset.active;
  });
  zone.addEventListener('dragleave', function () {
    zone.classList.remove('drag-active');
    hint.textContent = hint.dataset.idle;
  });
  zone.addEventListener('drop', function (e) {
    e.preventDefault();
    zone.classList.remove('drag-active');
    hint.textContent = hint.dataset.idle;
    if (e.dataTransfer.files.length > 0) {
      var picked = new DataTransfer();
      picked.items.add(e.dataTransfer.files[0]);
      input.files = picked.files;
      showSelection();
    }
  });
  form.addEventListener('submit', function (e) {
    if (busy || !(input.files && input.files[0])) {
      e.preventDefault();
      return;
    }
    busy = true;
    button.disabled = true;
    button.textContent = 'Analyzing...';
  });
})();
"#;
