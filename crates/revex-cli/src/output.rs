use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use revex_runtime::ExportSummary;
use revex_types::ExportProgress;

/// Renders progress snapshots as one line per completed item. The zeroed
/// initial snapshot and count-phase updates render as a running total.
pub struct ProgressRenderer {
    colored: bool,
    quiet: bool,
}

impl ProgressRenderer {
    pub fn new(quiet: bool) -> Self {
        Self {
            colored: std::io::stdout().is_terminal(),
            quiet,
        }
    }

    pub fn render(&self, progress: &ExportProgress) {
        if self.quiet {
            return;
        }

        if progress.items_processed == 0 {
            if progress.total_items > 0 {
                println!("Counting items: {}", progress.total_items);
            }
            return;
        }

        let position = format!("[{}/{}]", progress.items_processed, progress.total_items);
        let line = format!(
            "item {} rev {} | revisions {} fields {} attachments {}+{}",
            progress.current_item_id,
            progress.current_revision_index,
            progress.revisions_processed,
            progress.fields_processed,
            progress.attachments_processed,
            progress.attachments_failed,
        );
        if self.colored {
            println!("{} {}", position.cyan(), line);
        } else {
            println!("{} {}", position, line);
        }
    }
}

pub fn print_summary(summary: &ExportSummary) {
    let progress = &summary.progress;
    println!(
        "Exported {} items ({} revisions, {} fields) in {:.1}s - attachments {} ok / {} failed",
        progress.items_processed,
        progress.revisions_processed,
        progress.fields_processed,
        summary.duration.as_secs_f64(),
        progress.attachments_processed,
        progress.attachments_failed,
    );
}
