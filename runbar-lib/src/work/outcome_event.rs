use super::ProgressEvent;
use core::fmt::{Debug, Display, Formatter};

/// Error details captured at the worker boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// The kind of error, e.g. the error type's name or `panic`.
    pub error_kind: String,

    /// The error's own message, preserved verbatim.
    pub message: String,

    /// Diagnostic trace for the error.
    pub trace: String,
}

impl Failure {
    pub const PANIC_KIND: &'static str = "panic";

    #[must_use]
    pub fn new(error_kind: impl Into<String>, message: impl Into<String>, trace: impl Into<String>) -> Self {
        Self {
            error_kind: error_kind.into(),
            message: message.into(),
            trace: trace.into(),
        }
    }

    /// Capture an error returned by a user function.
    ///
    /// The kind is the unqualified name of `E`, looking through `Box`, `Arc`, `Rc` and
    /// references. The message is the error's `Display` form and the trace its `Debug` form.
    #[must_use]
    pub fn from_error<E: Display + Debug + ?Sized>(error: &E) -> Self {
        let trace = format!("{error:?}");
        Self::new(error_kind::<E>(&trace), error.to_string(), trace)
    }

    #[must_use]
    pub fn is_panic(&self) -> bool {
        self.error_kind == Self::PANIC_KIND
    }
}

impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.error_kind, self.message)
    }
}

/// The terminal report of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeEvent<T> {
    Success(T),
    Failure(Failure),
}

impl<T> OutcomeEvent<T> {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[must_use]
    pub const fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure),
        }
    }

    #[must_use]
    pub fn success(self) -> Option<T> {
        match self {
            Self::Success(value) => Some(value),
            Self::Failure(_) => None,
        }
    }
}

/// A single item on the channel between a worker and its display.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent<T> {
    Progress(ProgressEvent),
    Outcome(OutcomeEvent<T>),
}

const POINTER_TYPES: [&str; 3] = ["alloc::boxed::Box<", "alloc::sync::Arc<", "alloc::rc::Rc<"];

/// Name the type of an error.
///
/// Trait objects have no concrete type name, so for `dyn Error` and friends the kind
/// is the leading identifier of the `Debug` form, which is the type name for derived
/// `Debug` impls.
fn error_kind<E: ?Sized>(debug: &str) -> String {
    let mut name = core::any::type_name::<E>();
    while let Some(inner) = strip_pointer(name) {
        name = inner;
    }

    let Some(object) = name.strip_prefix("dyn ") else {
        return short_type_name(name).to_string();
    };

    let leading: String = debug.chars().take_while(|c| c.is_alphanumeric() || *c == '_').collect();
    if leading.is_empty() {
        short_type_name(object).to_string()
    } else {
        leading
    }
}

fn strip_pointer(name: &str) -> Option<&str> {
    if let Some(inner) = name.strip_prefix("&mut ").or_else(|| name.strip_prefix('&')) {
        return Some(inner);
    }

    POINTER_TYPES
        .iter()
        .find_map(|pointer| name.strip_prefix(pointer))
        .and_then(|inner| inner.strip_suffix('>'))
}

/// Strip module paths, generic arguments and extra trait bounds from a type name.
fn short_type_name(full: &str) -> &str {
    let base = full.split(['<', ' ']).next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use core::any::type_name;
    use core::error::Error;
    use core::num::ParseIntError;
    use std::rc::Rc;
    use std::sync::Arc;

    #[derive(Debug)]
    struct ValueError(&'static str);

    impl Display for ValueError {
        fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Error for ValueError {}

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name(type_name::<ParseIntError>()), "ParseIntError");
        assert_eq!(short_type_name(type_name::<Vec<String>>()), "Vec");
        assert_eq!(short_type_name(type_name::<u32>()), "u32");
        assert_eq!(short_type_name("core::error::Error + core::marker::Send"), "Error");
    }

    #[test]
    fn test_boxed_error_keeps_the_inner_kind() {
        let boxed: Box<dyn Error + Send + Sync> = Box::new(ValueError("bad"));
        let failure = Failure::from_error(&boxed);
        assert_eq!(failure.error_kind, "ValueError");
        assert_eq!(failure.message, "bad");
        assert_eq!(failure.trace, "ValueError(\"bad\")");
    }

    #[test]
    fn test_shared_errors_keep_their_kind() {
        let err = "x".parse::<u8>().unwrap_err();
        assert_eq!(Failure::from_error(&Arc::new(err.clone())).error_kind, "ParseIntError");
        assert_eq!(Failure::from_error(&Rc::new(err.clone())).error_kind, "ParseIntError");
        assert_eq!(Failure::from_error(&&err).error_kind, "ParseIntError");
        assert_eq!(Failure::from_error(&Box::new(Box::new(err))).error_kind, "ParseIntError");
    }

    #[test]
    fn test_opaque_boxed_error_falls_back_to_the_trait_name() {
        let boxed: Box<dyn Error> = "plain text".into();
        let failure = Failure::from_error(&boxed);
        assert_eq!(failure.error_kind, "Error");
        assert_eq!(failure.message, "plain text");
    }

    #[test]
    fn test_failure_from_error_preserves_kind_and_message() {
        let failure = Failure::from_error(&ValueError("bad"));
        assert_eq!(failure.error_kind, "ValueError");
        assert_eq!(failure.message, "bad");
        assert_eq!(failure.trace, "ValueError(\"bad\")");
        assert!(!failure.is_panic());
    }

    #[test]
    fn test_failure_from_std_error() {
        let err = "x".parse::<u8>().unwrap_err();
        let failure = Failure::from_error(&err);
        assert_eq!(failure.error_kind, "ParseIntError");
        assert_eq!(failure.message, err.to_string());
    }

    #[test]
    fn test_failure_display() {
        let failure = Failure::new("ValueError", "Five!!", "");
        assert_eq!(failure.to_string(), "ValueError: Five!!");
    }

    #[test]
    fn test_outcome_accessors() {
        let ok: OutcomeEvent<u32> = OutcomeEvent::Success(42);
        assert!(ok.is_success());
        assert!(ok.failure().is_none());
        assert_eq!(ok.success(), Some(42));

        let failed: OutcomeEvent<u32> = OutcomeEvent::Failure(Failure::new("panic", "boom", ""));
        assert!(!failed.is_success());
        assert!(failed.failure().is_some_and(Failure::is_panic));
        assert_eq!(failed.success(), None);
    }
}
