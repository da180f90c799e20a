//! Single-file, plain-text upload widget.

use crate::model::UploadedFile;
use crate::render::escape_html;

/// Which files the widget accepts: a file matching either a MIME type or
/// an extension gets in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptFilter {
    mime_types: Vec<String>,
    extensions: Vec<String>,
}

impl AcceptFilter {
    pub fn new<M, E>(mime_types: M, extensions: E) -> Self
    where
        M: IntoIterator,
        M::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        AcceptFilter {
            mime_types: mime_types
                .into_iter()
                .map(|m| m.into().to_ascii_lowercase())
                .collect(),
            extensions: extensions
                .into_iter()
                .map(|e| e.into().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// `text/plain` or `.txt`.
    pub fn plain_text() -> Self {
        Self::new(["text/plain"], ["txt"])
    }

    pub fn accepts(&self, file: &UploadedFile) -> bool {
        let mime = file.mime_essence();
        if self.mime_types.iter().any(|m| *m == mime) {
            return true;
        }
        match file.extension() {
            Some(ext) => self.extensions.iter().any(|e| *e == ext),
            None => false,
        }
    }

    /// Value for an `<input type="file" accept="...">` attribute.
    pub fn html_accept(&self) -> String {
        self.extensions
            .iter()
            .map(|e| format!(".{}", e))
            .chain(self.mime_types.iter().cloned())
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl Default for AcceptFilter {
    fn default() -> Self {
        Self::plain_text()
    }
}

/// Captures exactly one file and hands it to the parent through a callback.
#[derive(Debug, Clone, Default)]
pub struct UploadWidget {
    filter: AcceptFilter,
    file_name: Option<String>,
}

impl UploadWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(filter: AcceptFilter) -> Self {
        UploadWidget {
            filter,
            file_name: None,
        }
    }

    /// Name of the last accepted file, shown under the dropzone.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Handle a drop or picker batch. Only the first accepted file is
    /// delivered; everything else is ignored. Returns whether `on_select`
    /// was called.
    pub fn on_drop<F>(&mut self, files: Vec<UploadedFile>, on_select: F) -> bool
    where
        F: FnOnce(UploadedFile),
    {
        match files.into_iter().find(|f| self.filter.accepts(f)) {
            Some(file) => {
                self.file_name = Some(file.name.clone());
                on_select(file);
                true
            }
            None => false,
        }
    }

    /// Dropzone markup. The surrounding form owns submission; the page
    /// script toggles the `drag-active` class and the file-name line.
    pub fn render_html(&self) -> String {
        let name_line = match &self.file_name {
            Some(name) => format!(
                r#"<p class="file-name" id="file-name">{}</p>"#,
                escape_html(name)
            ),
            None => r#"<p class="file-name" id="file-name" hidden></p>"#.to_string(),
        };
        format!(
            r#"<label class="dropzone" id="dropzone">
  <input type="file" name="file" id="file-input" accept="{accept}">
  <span class="dropzone-icon" aria-hidden="true">&#8679;</span>
  <p class="dropzone-hint" data-idle="Drag and drop a text file here, or click to select" data-active="Drop the file here">Drag and drop a text file here, or click to select</p>
  {name_line}
</label>"#,
            accept = escape_html(&self.filter.html_accept()),
            name_line = name_line,
        )
    }
}
