use crate::continuation::Escape;

/// A macro for defining the `ErrorKind` enum, the `Display` implementation for
/// it, and the constructors for the `Error` struct.
macro_rules! ErrorKind {
    ($(
        ($kind:ident $(, $vis:vis $ctor:ident)?)
    ),* $(,)?) => {
        /// The kind of error that occurred.
        #[derive(Debug, Clone, PartialEq)]
        pub enum ErrorKind {
            $(
                $kind,
            )*
        }

        impl std::fmt::Display for ErrorKind {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(
                        Self::$kind => f.write_str(stringify!($kind)),
                    )*
                }
            }
        }

        /// Constructors for [`Error`].
        impl Error {
            $(
                $(
                #[doc = concat!(
                    "Creates a new [`Error`] with the `",
                    stringify!($kind),
                    "` kind and the given description."
                )]
                $vis fn $ctor(desc: impl Into<String>) -> crate::error::Error {
                    Self {
                        kind: ErrorKind::$kind,
                        desc: desc.into(),
                        trace: vec![],
                        escape: None,
                    }
                }
                )?
            )*
        }
    };
}

ErrorKind!(
    (SyntaxError,         pub syntax_error),
    (Undefined,           pub undefined),
    (Uninitialized,       pub uninitialized),
    (ArityMismatch,       pub arity_mismatch),
    (TypeMismatch,        pub type_mismatch),
    (InvalidContinuation, pub invalid_continuation),
    (LispError,           pub lisp_error),
    (OutOfRange,          pub out_of_range),
    (OSError,             pub os_error),
    (ParsingError,        pub(crate) parsing_error),
);

/// Represents an error that occurred during Schemy evaluation.
///
/// Use [format](crate::Error::format) to produce a formatted representation
/// of the error including the backtrace of procedure names.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {desc}")]
pub struct Error {
    kind: ErrorKind,
    desc: String,
    trace: Vec<String>,
    // Set when a continuation escape crossed a host function boundary.
    escape: Option<Escape>,
}

impl Error {
    /// Formats the error into a human-readable string, including backtrace
    /// information.
    pub fn format(&self) -> String {
        let mut out = format!(
            "ERR {}:{}",
            self.kind,
            if self.desc.is_empty() {
                String::new()
            } else {
                format!(" {}", self.desc)
            }
        );
        if self.trace.is_empty() {
            out.push_str("\nat top-level");
        } else {
            out.push_str("\nBacktrace: ");
            out.push_str(&self.trace.join(" < "));
            out.push_str(" < top-level");
        }
        out + "\n"
    }

    /// Adds the name of a procedure frame to the error's backtrace.
    pub fn with_trace(mut self, name: impl Into<String>) -> Self {
        self.trace.push(name.into());
        self
    }

    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        self.kind.clone()
    }

    /// Returns the description of the error.
    pub fn desc(&self) -> String {
        self.desc.to_owned()
    }

    /// Returns the names of the procedure frames the error passed through,
    /// innermost first.
    pub fn backtrace(&self) -> &[String] {
        &self.trace
    }

    fn tunnelled(escape: Escape) -> Self {
        Self {
            kind: ErrorKind::InvalidContinuation,
            desc: "continuation escaped past its receiver".to_string(),
            trace: vec![],
            escape: Some(escape),
        }
    }
}

/// Non-local exit from an evaluation step: either an error, or a
/// continuation escape travelling back to its capturing frame.
#[derive(Debug, Clone)]
pub enum Unwind {
    Error(Error),
    Escape(Escape),
}

impl Unwind {
    /// Records a frame name on errors. Escapes pass through untouched.
    pub(crate) fn with_trace(self, name: &str) -> Self {
        match self {
            Unwind::Error(e) => Unwind::Error(e.with_trace(name)),
            escape => escape,
        }
    }
}

impl From<Error> for Unwind {
    fn from(mut err: Error) -> Self {
        match err.escape.take() {
            Some(escape) => Unwind::Escape(escape),
            None => Unwind::Error(err),
        }
    }
}

impl From<Unwind> for Error {
    fn from(unwind: Unwind) -> Self {
        match unwind {
            Unwind::Error(err) => err,
            Unwind::Escape(escape) => Error::tunnelled(escape),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_with_backtrace() {
        let err = Error::arity_mismatch("too few arguments to f")
            .with_trace("f")
            .with_trace("g");
        assert_eq!(err.to_string(), "ArityMismatch: too few arguments to f");
        assert_eq!(
            err.format(),
            "ERR ArityMismatch: too few arguments to f\nBacktrace: f < g < top-level\n"
        );
    }

    #[test]
    fn test_format_without_backtrace() {
        let err = Error::undefined("undefined variable x");
        assert_eq!(
            err.format(),
            "ERR Undefined: undefined variable x\nat top-level\n"
        );
        assert_eq!(err.kind(), ErrorKind::Undefined);
    }

    #[test]
    fn test_unwind_lifts_errors() {
        let unwind: Unwind = Error::type_mismatch("bad").into();
        let unwind = unwind.with_trace("car");
        match unwind {
            Unwind::Error(e) => assert_eq!(e.backtrace(), ["car".to_string()]),
            Unwind::Escape(_) => panic!("expected an error"),
        }
    }
}
