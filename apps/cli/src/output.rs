//! Terminal rendering of upload events.

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use blobdrop_protocol::Response;

const BAR_TEMPLATE: &str = "{spinner:.cyan} {percent:>3}% [{bar:30.cyan/blue}] \
    {binary_bytes}/{binary_total_bytes} {binary_bytes_per_sec} eta {eta}";

/// Renders session events to stderr, with a progress bar while uploading.
pub struct ProgressPrinter {
    bar: Option<ProgressBar>,
    target: fn() -> ProgressDrawTarget,
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressPrinter {
    pub fn new() -> Self {
        Self {
            bar: None,
            target: ProgressDrawTarget::stderr,
        }
    }

    pub fn print(&mut self, event: &Response) {
        match event {
            Response::FolderCompressed { archive_path } => {
                eprintln!("{} compressed folder to {archive_path}", style("✓").green().bold());
            }
            Response::UploadProgress {
                transferred_bytes,
                total_bytes,
            } => {
                let target = self.target;
                let bar = self
                    .bar
                    .get_or_insert_with(|| upload_bar(*total_bytes, target()));
                bar.set_length(*total_bytes);
                bar.set_position(*transferred_bytes);
            }
            Response::UploadFinished { blob_url, .. } => {
                self.finish(format!("{} uploaded {blob_url}", style("✓").green().bold()));
            }
            Response::UploadFailed { error } => {
                self.finish(format!("{} upload failed: {error}", style("✗").red().bold()));
            }
            Response::UploadAborted => {
                self.finish(format!("{} upload aborted", style("✗").yellow().bold()));
            }
            _ => {}
        }
    }

    fn finish(&mut self, msg: String) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
        eprintln!("{msg}");
    }
}

fn upload_bar(total: u64, target: ProgressDrawTarget) -> ProgressBar {
    let bar = ProgressBar::with_draw_target(Some(total), target);
    bar.set_style(
        ProgressStyle::with_template(BAR_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}
