use crate::work::{Failure, ProgressEvent};

/// Something a [`ProgressDisplay`](super::ProgressDisplay) can draw a run onto.
pub trait Surface: Send {
    /// Make the window visible with the given title and an empty bar.
    fn open(&mut self, title: &str);

    /// Move the bar and the remaining-time label.
    fn update(&mut self, event: &ProgressEvent);

    /// Close the window after a successful run.
    fn close(&mut self);

    /// Keep the window visible and show the error details.
    fn show_failure(&mut self, failure: &Failure);

    /// Release the window once the user has acknowledged it.
    fn dismiss(&mut self) {
        self.close();
    }
}
