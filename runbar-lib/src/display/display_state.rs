/// Where a display is in its single run.
///
/// `Idle → Running → Closed | ShowingError`. Both end states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayState {
    #[default]
    Idle,
    Running,
    Closed,
    ShowingError,
}

impl DisplayState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::ShowingError)
    }
}
