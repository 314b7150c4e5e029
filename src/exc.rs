use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error;
use std::fmt::Write as _;

const TRACEBACK_HEADER: &str = "Traceback (most recent call last):";

/// Exception context captured at the moment of a log call.
///
/// Rendered into the stored document as a single string that always starts
/// with `Traceback`, followed by the captured frames, the error itself and
/// its `source()` chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExcInfo {
    pub type_name: String,
    pub message: String,
    pub causes: Vec<String>,
    pub backtrace: Option<String>,
}

impl ExcInfo {
    /// Capture a concrete error together with a backtrace of the logging
    /// call site. Frames are only recorded when backtraces are enabled via
    /// `RUST_BACKTRACE` / `RUST_LIB_BACKTRACE`.
    pub fn capture<E: Error + 'static>(err: &E) -> Self {
        Self::build(std::any::type_name::<E>(), err, Backtrace::capture())
    }

    /// Capture an error known only as a trait object, e.g. a `tracing`
    /// field recorded as `&dyn Error`.
    pub fn from_dyn(err: &(dyn Error + 'static)) -> Self {
        Self::build("Error", err, Backtrace::capture())
    }

    fn build(type_name: &str, err: &(dyn Error + 'static), backtrace: Backtrace) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        let backtrace = match backtrace.status() {
            BacktraceStatus::Captured => Some(backtrace.to_string()),
            _ => None,
        };

        ExcInfo {
            type_name: type_name.to_string(),
            message: err.to_string(),
            causes,
            backtrace,
        }
    }

    pub fn format_traceback(&self) -> String {
        let mut out = String::from(TRACEBACK_HEADER);
        out.push('\n');

        match &self.backtrace {
            Some(frames) => {
                for line in frames.lines() {
                    let _ = writeln!(out, "  {}", line.trim_end());
                }
            }
            None => out.push_str("  <no frames captured; set RUST_BACKTRACE=1>\n"),
        }

        let _ = write!(out, "{}: {}", self.type_name, self.message);
        for cause in &self.causes {
            let _ = write!(out, "\n  caused by: {}", cause);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(std::num::ParseIntError);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("could not read quantity")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    fn parse_failure() -> std::num::ParseIntError {
        "abc".parse::<i32>().unwrap_err()
    }

    #[test]
    fn test_traceback_starts_with_header() {
        let exc = ExcInfo::capture(&parse_failure());
        let text = exc.format_traceback();
        assert!(text.starts_with("Traceback"));
        assert!(text.contains("ParseIntError: invalid digit found in string"));
    }

    #[test]
    fn test_source_chain_is_rendered() {
        let exc = ExcInfo::capture(&Outer(parse_failure()));
        assert_eq!(exc.causes, vec!["invalid digit found in string".to_string()]);
        assert!(exc
            .format_traceback()
            .ends_with("could not read quantity\n  caused by: invalid digit found in string"));
    }

    #[test]
    fn test_without_backtrace_notes_missing_frames() {
        let exc = ExcInfo {
            type_name: "ZeroDivision".into(),
            message: "division by zero".into(),
            causes: vec![],
            backtrace: None,
        };
        assert_eq!(
            exc.format_traceback(),
            "Traceback (most recent call last):\n  <no frames captured; set RUST_BACKTRACE=1>\nZeroDivision: division by zero"
        );
    }

    #[test]
    fn test_from_dyn_uses_generic_type_name() {
        let err = parse_failure();
        let exc = ExcInfo::from_dyn(&err);
        assert_eq!(exc.type_name, "Error");
        assert_eq!(exc.message, "invalid digit found in string");
    }
}
