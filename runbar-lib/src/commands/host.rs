use core::future::Future;
use std::io::Write;

/// Abstract the host environment to enable testing
pub trait Host: Send + Sync {
    // where to send normal output (e.g., stdout)
    fn output(&mut self) -> impl Write;

    // where to send error output (e.g., stderr)
    fn error(&mut self) -> impl Write;

    /// The next line typed into the main window, or `None` once input is exhausted.
    ///
    /// Must be cancel-safe: the main window drops this future whenever a run finishes first.
    fn next_command(&mut self) -> impl Future<Output = Option<String>> + Send;

    /// Wait until the user acknowledges failed runs (in a test environment this might just return).
    fn wait_for_dismissal(&mut self) -> impl Future<Output = ()> + Send;
}
