//! Duration tokens as produced by the platform's `AMAZON.DURATION`-style slots.
//!
//! Tokens look like `P[nD]T[nH][nM][nS]`. The recipe search API takes a maximum total
//! time in seconds, so the only output needed is the total as a decimal string.

use thiserror::Error;

const SECONDS_PER_DAY: u64 = 86_400;
const SECONDS_PER_HOUR: u64 = 3_600;
const SECONDS_PER_MINUTE: u64 = 60;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DurationError {
    #[error("duration token is empty")]
    Empty,
    #[error("duration token `{0}` must start with `P`")]
    MissingPeriodMarker(String),
    #[error("unit `{unit}` in duration token `{token}` has no value")]
    MissingValue { token: String, unit: char },
    #[error("unexpected character `{found}` in duration token `{token}`")]
    UnexpectedCharacter { token: String, found: char },
    #[error("duration token `{0}` ends with a value that has no unit")]
    TrailingValue(String),
    #[error("duration token `{0}` has no units")]
    NoUnits(String),
    #[error("duration token `{0}` is too large")]
    Overflow(String),
}

/// Converts a duration token to its total length in seconds, rendered as a string.
pub fn parse_duration_seconds(token: &str) -> Result<String, DurationError> {
    total_seconds(token).map(|seconds| seconds.to_string())
}

pub fn total_seconds(token: &str) -> Result<u64, DurationError> {
    if token.is_empty() {
        return Err(DurationError::Empty);
    }

    let mut chars = token.chars();
    if chars.next() != Some('P') {
        return Err(DurationError::MissingPeriodMarker(token.to_string()));
    }

    let mut total = 0u64;
    let mut buffer = String::new();
    let mut units_seen = 0usize;

    for character in chars {
        if character.is_ascii_digit() {
            buffer.push(character);
            continue;
        }

        if character == 'T' {
            if !buffer.is_empty() {
                return Err(DurationError::TrailingValue(token.to_string()));
            }
            continue;
        }

        let Some(weight) = unit_weight(character) else {
            return Err(DurationError::UnexpectedCharacter {
                token: token.to_string(),
                found: character,
            });
        };
        if buffer.is_empty() {
            return Err(DurationError::MissingValue { token: token.to_string(), unit: character });
        }

        let overflow = || DurationError::Overflow(token.to_string());
        let amount = buffer.parse::<u64>().map_err(|_| overflow())?;
        total = amount
            .checked_mul(weight)
            .and_then(|seconds| total.checked_add(seconds))
            .ok_or_else(overflow)?;
        units_seen += 1;
        buffer.clear();
    }

    if !buffer.is_empty() {
        return Err(DurationError::TrailingValue(token.to_string()));
    }
    if units_seen == 0 {
        return Err(DurationError::NoUnits(token.to_string()));
    }

    Ok(total)
}

fn unit_weight(unit: char) -> Option<u64> {
    match unit {
        'D' => Some(SECONDS_PER_DAY),
        'H' => Some(SECONDS_PER_HOUR),
        'M' => Some(SECONDS_PER_MINUTE),
        'S' => Some(1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_duration_seconds, total_seconds, DurationError};

    #[test]
    fn converts_single_unit_tokens() {
        assert_eq!(parse_duration_seconds("PT10M"), Ok("600".to_string()));
        assert_eq!(parse_duration_seconds("PT5H"), Ok("18000".to_string()));
        assert_eq!(parse_duration_seconds("P3D"), Ok("259200".to_string()));
        assert_eq!(parse_duration_seconds("PT45S"), Ok("45".to_string()));
    }

    #[test]
    fn sums_mixed_units() {
        assert_eq!(parse_duration_seconds("PT5H10M"), Ok("18600".to_string()));
        assert_eq!(total_seconds("P1DT1H1M1S"), Ok(90_061));
        assert_eq!(total_seconds("PT90M"), Ok(5_400));
    }

    #[test]
    fn output_parses_back_to_the_same_seconds() {
        for (token, expected) in [("PT20M", 1_200u64), ("P2DT3H", 183_600), ("PT0S", 0)] {
            let rendered = parse_duration_seconds(token).expect("well formed token");
            assert_eq!(rendered.parse::<u64>().expect("integer output"), expected);
        }
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert_eq!(total_seconds(""), Err(DurationError::Empty));
        assert_eq!(total_seconds("T10M"), Err(DurationError::MissingPeriodMarker("T10M".into())));
        assert_eq!(
            total_seconds("PTM"),
            Err(DurationError::MissingValue { token: "PTM".into(), unit: 'M' })
        );
        assert_eq!(
            total_seconds("PT1.5H"),
            Err(DurationError::UnexpectedCharacter { token: "PT1.5H".into(), found: '.' })
        );
        assert_eq!(total_seconds("PT10"), Err(DurationError::TrailingValue("PT10".into())));
        assert_eq!(total_seconds("PT"), Err(DurationError::NoUnits("PT".into())));
        assert_eq!(total_seconds("P"), Err(DurationError::NoUnits("P".into())));
    }

    #[test]
    fn reports_overflow_instead_of_wrapping() {
        let token = "P99999999999999999999D";
        assert_eq!(total_seconds(token), Err(DurationError::Overflow(token.into())));
    }
}
