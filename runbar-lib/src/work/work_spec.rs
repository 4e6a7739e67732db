use super::Failure;
use crate::Result;
use core::fmt::{Debug, Display, Formatter};
use core::time::Duration;
use ohno::bail;

pub(super) type WorkFn<T> = Box<dyn FnOnce() -> Result<T, Failure> + Send + 'static>;

/// A function to run in the background, along with what is needed to predict its duration.
pub struct WorkSpec<T> {
    name: String,
    key: String,
    title: Option<String>,
    estimated_duration: Duration,
    function: WorkFn<T>,
}

impl<T: Send + 'static> WorkSpec<T> {
    /// Describe a fallible function.
    ///
    /// An `Err` returned by `function` becomes an [`OutcomeEvent::Failure`](super::OutcomeEvent::Failure)
    /// carrying the error's type name, message, and debug representation.
    ///
    /// # Errors
    ///
    /// Returns an error if `estimated_duration` is zero.
    pub fn new<F, E>(name: impl Into<String>, estimated_duration: Duration, function: F) -> Result<Self>
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: Display + Debug + 'static,
    {
        let name = name.into();
        if estimated_duration.is_zero() {
            bail!("the estimated duration of '{name}' must be greater than zero");
        }

        Ok(Self {
            key: name.clone(),
            name,
            title: None,
            estimated_duration,
            function: Box::new(move || function().map_err(|e| Failure::from_error(&e))),
        })
    }

    /// Describe a function that can only fail by panicking.
    ///
    /// # Errors
    ///
    /// Returns an error if `estimated_duration` is zero.
    pub fn infallible<F>(name: impl Into<String>, estimated_duration: Duration, function: F) -> Result<Self>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Self::new(name, estimated_duration, move || Ok::<_, core::convert::Infallible>(function()))
    }
}

impl<T> WorkSpec<T> {
    /// Use a distinct prediction-history key, e.g. to tell apart calls with different arguments.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The window title, `"{name} Progress Bar"` unless overridden.
    #[must_use]
    pub fn title(&self) -> String {
        self.title.clone().unwrap_or_else(|| format!("{} Progress Bar", self.name))
    }

    #[must_use]
    pub const fn estimated_duration(&self) -> Duration {
        self.estimated_duration
    }

    pub(super) fn into_function(self) -> WorkFn<T> {
        self.function
    }
}

impl<T> Debug for WorkSpec<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WorkSpec")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("title", &self.title)
            .field("estimated_duration", &self.estimated_duration)
            .field("function", &"<function>")
            .finish()
    }
}
