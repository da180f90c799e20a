//! `nerlens analyze` -- drive the results view from a terminal.

use std::path::Path;
use std::process;

use nerlens_core::render::render_results_text;
use nerlens_core::{Notifier, ResultsView, Toast, UploadWidget, UploadedFile};

use crate::client::RelayHttpClient;
use crate::{report_error, OutputFormat};

/// Options for the `nerlens analyze` command.
pub(crate) struct AnalyzeOptions<'a> {
    pub file: &'a Path,
    pub relay_url: &'a str,
    pub content_type: Option<&'a str>,
    pub output: OutputFormat,
    pub quiet: bool,
}

/// Prints toasts to stderr and remembers whether any was an error.
struct TerminalNotifier {
    output: OutputFormat,
    quiet: bool,
    failed: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&mut self, toast: Toast) {
        if toast.is_error() {
            self.failed = true;
            report_error(&toast.description, self.output, self.quiet);
            return;
        }
        if self.quiet {
            return;
        }
        match self.output {
            OutputFormat::Text => eprintln!("{}: {}", toast.title, toast.description),
            OutputFormat::Json => match serde_json::to_string(&toast) {
                Ok(json) => eprintln!("{}", json),
                Err(_) => eprintln!("{}: {}", toast.title, toast.description),
            },
        }
    }
}

/// MIME type for a path: `.txt` is `text/plain`, anything else is opaque.
fn guess_content_type(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Run the `nerlens analyze` command.
pub(crate) fn cmd_analyze(opts: AnalyzeOptions<'_>) {
    // Step 1: Read the file
    let bytes = match std::fs::read(opts.file) {
        Ok(b) => b,
        Err(e) => {
            report_error(
                &format!("error reading '{}': {}", opts.file.display(), e),
                opts.output,
                opts.quiet,
            );
            process::exit(1);
        }
    };
    let name = opts
        .file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let content_type = opts
        .content_type
        .unwrap_or_else(|| guess_content_type(opts.file));
    let upload = UploadedFile::new(name, Some(content_type), bytes);

    // Step 2: Offer it to the widget; only plain text gets through
    let mut view = ResultsView::new();
    let mut widget = UploadWidget::new();
    if !widget.on_drop(vec![upload], |f| view.select_file(f)) {
        report_error(
            &format!(
                "error: '{}' is not a plain-text (.txt) file",
                opts.file.display()
            ),
            opts.output,
            opts.quiet,
        );
        process::exit(1);
    }

    // Step 3: Submit through the relay
    let client = RelayHttpClient::new(opts.relay_url);
    let mut notifier = TerminalNotifier {
        output: opts.output,
        quiet: opts.quiet,
        failed: false,
    };
    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            report_error(
                &format!("failed to create tokio runtime: {}", e),
                opts.output,
                opts.quiet,
            );
            process::exit(1);
        }
    };
    if let Err(rejected) = rt.block_on(view.submit(&client, &mut notifier)) {
        report_error(&format!("error: {}", rejected), opts.output, opts.quiet);
        process::exit(1);
    }
    if notifier.failed {
        process::exit(1);
    }

    // Step 4: Print the tables
    let Some(result) = view.result() else {
        return;
    };
    match opts.output {
        OutputFormat::Text => print!("{}", render_results_text(result)),
        OutputFormat::Json => match serde_json::to_string_pretty(result) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                report_error(
                    &format!("error serializing result: {}", e),
                    opts.output,
                    opts.quiet,
                );
                process::exit(1);
            }
        },
    }
}
