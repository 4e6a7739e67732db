use super::Surface;
use crate::work::{Failure, ProgressEvent};
use core::fmt::{Debug, Formatter};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;

const BAR_TEMPLATE: &str = "{prefix:>24.bold.cyan} [{bar:25}] {pos:>3}% {msg}";
const BAR_TEMPLATE_NO_COLOR: &str = "{prefix:>24} [{bar:25}] {pos:>3}% {msg}";

/// A progress window drawn as a bar inside a shared terminal panel.
///
/// Several windows can live in the same [`MultiProgress`], one per concurrent run.
/// A failed run abandons its bar so it stays on screen with the error message, and
/// the error trace is printed above the panel.
pub struct TerminalWindow {
    multi: MultiProgress,
    bar: Option<ProgressBar>,
    use_colors: bool,
}

impl TerminalWindow {
    #[must_use]
    pub const fn new(multi: MultiProgress, use_colors: bool) -> Self {
        Self {
            multi,
            bar: None,
            use_colors,
        }
    }

    fn bar_style(&self) -> ProgressStyle {
        let template = if self.use_colors { BAR_TEMPLATE } else { BAR_TEMPLATE_NO_COLOR };
        ProgressStyle::default_bar()
            .template(template)
            .expect("could not create progress bar style")
            .progress_chars("=> ")
    }

    /// The message shown next to the bar while the run is in progress.
    #[must_use]
    pub fn remaining_message(event: &ProgressEvent) -> String {
        format!("~{:.1}s remaining", event.estimated_seconds_remaining())
    }

    /// The message left on an abandoned bar after a failure.
    #[must_use]
    pub fn failure_message(failure: &Failure, use_colors: bool) -> String {
        if use_colors {
            format!("{}: {}", failure.error_kind.red().bold(), failure.message)
        } else {
            format!("{}: {}", failure.error_kind, failure.message)
        }
    }
}

impl Surface for TerminalWindow {
    fn open(&mut self, title: &str) {
        let bar = self.multi.add(ProgressBar::new(100));
        bar.set_style(self.bar_style());
        bar.set_prefix(title.to_string());
        self.bar = Some(bar);
    }

    fn update(&mut self, event: &ProgressEvent) {
        if let Some(bar) = &self.bar {
            bar.set_position(event.percent());
            bar.set_message(Self::remaining_message(event));
        }
    }

    fn close(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
            self.multi.remove(&bar);
        }
    }

    fn show_failure(&mut self, failure: &Failure) {
        if let Some(bar) = &self.bar {
            bar.abandon_with_message(Self::failure_message(failure, self.use_colors));
        }

        if !failure.trace.is_empty() {
            let _ = self.multi.println(&failure.trace);
        }
    }
}

impl Debug for TerminalWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TerminalWindow")
            .field("multi", &"<MultiProgress>")
            .field("bar", &self.bar)
            .field("use_colors", &self.use_colors)
            .finish()
    }
}
