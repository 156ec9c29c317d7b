//! Healthcheck durations in the provider's `300s` / `1m30s` notation.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Errors raised when parsing a duration string.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum DurationError {
    /// Raised for empty input.
    #[error("duration must not be empty")]
    Empty,
    /// Raised for bare numbers such as `300`.
    #[error("duration `{input}` is missing a unit")]
    MissingUnit {
        /// Rejected input.
        input: String,
    },
    /// Raised for unknown units, stray characters or totals that overflow.
    #[error("duration `{input}` is invalid: {reason}")]
    Invalid {
        /// Rejected input.
        input: String,
        /// Parser diagnostic.
        reason: String,
    },
}

/// Non-negative duration accepted by ALB healthchecks.
///
/// Parsing goes through `humantime`, so compound values such as `1m500s`
/// (560 seconds) and the usual `h`, `m`, `s` and `ms` units are accepted.
/// Display is canonical: whole seconds as `560s`, otherwise milliseconds.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HealthcheckDuration(Duration);

impl HealthcheckDuration {
    /// Wraps a standard duration.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self(duration)
    }

    /// Builds a duration of whole seconds.
    #[must_use]
    pub const fn from_secs(seconds: u64) -> Self {
        Self(Duration::from_secs(seconds))
    }

    /// The wrapped duration.
    #[must_use]
    pub const fn as_duration(self) -> Duration {
        self.0
    }
}

impl fmt::Display for HealthcheckDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.subsec_nanos() == 0 {
            write!(f, "{}s", self.0.as_secs())
        } else {
            write!(f, "{}ms", self.0.as_millis())
        }
    }
}

impl FromStr for HealthcheckDuration {
    type Err = DurationError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim();
        if text.is_empty() {
            return Err(DurationError::Empty);
        }
        if text.chars().all(|ch| ch.is_ascii_digit()) {
            return Err(DurationError::MissingUnit {
                input: text.to_owned(),
            });
        }
        humantime::parse_duration(text)
            .map(Self)
            .map_err(|err| DurationError::Invalid {
                input: text.to_owned(),
                reason: err.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("300s", 300_000)]
    #[case("1m500s", 560_000)]
    #[case("1h", 3_600_000)]
    #[case("1m30s", 90_000)]
    #[case("1500ms", 1_500)]
    #[case(" 2m ", 120_000)]
    fn parses_compound_durations(#[case] input: &str, #[case] millis: u128) {
        let parsed: HealthcheckDuration = input.parse().expect("valid duration");
        assert_eq!(parsed.as_duration().as_millis(), millis);
    }

    #[rstest]
    #[case("1m500s", "560s")]
    #[case("300s", "300s")]
    #[case("1500ms", "1500ms")]
    #[case("2h", "7200s")]
    fn displays_canonically(#[case] input: &str, #[case] expected: &str) {
        let parsed: HealthcheckDuration = input.parse().expect("valid duration");
        assert_eq!(parsed.to_string(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn rejects_empty_input(#[case] input: &str) {
        assert_eq!(input.parse::<HealthcheckDuration>(), Err(DurationError::Empty));
    }

    #[test]
    fn bare_numbers_need_a_unit() {
        assert_eq!(
            "300".parse::<HealthcheckDuration>(),
            Err(DurationError::MissingUnit {
                input: String::from("300")
            })
        );
    }

    #[rstest]
    #[case("s")]
    #[case("5x")]
    #[case("1m-5s")]
    #[case("99999999999999999999s")]
    fn rejects_invalid_durations(#[case] input: &str) {
        let err = input.parse::<HealthcheckDuration>().expect_err("invalid");
        assert!(
            matches!(err, DurationError::Invalid { input: ref rejected, .. } if rejected == input),
            "{err:?}"
        );
    }
}
