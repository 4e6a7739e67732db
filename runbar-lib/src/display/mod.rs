//! Rendering of a run's progress and outcome.
//!
//! A [`ProgressDisplay`] subscribes to the events of one run and draws them on a
//! [`Surface`]. [`TerminalWindow`] is the surface used by the command-line tool; any
//! other front end only needs to implement the trait.

mod display_state;
mod progress_display;
mod surface;
mod terminal_window;

pub use display_state::DisplayState;
pub use progress_display::ProgressDisplay;
pub use surface::Surface;
pub use terminal_window::TerminalWindow;
