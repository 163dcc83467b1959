//! Comparison request validation.
//!
//! Turns the user's raw selections (ordered methods + the literal horizon text)
//! into a `ComparisonRequest`. Validation order:
//!
//! 1. at least one method must be selected (`EmptySelection`)
//! 2. the horizon text must parse according to the configured `HorizonPolicy`
//! 3. negative horizons are always rejected; an optional upper bound applies last

use crate::domain::{ComparisonRequest, ForecastHorizon, HorizonPolicy, MethodSelection, SessionConfig};
use crate::error::ValidationError;

/// Validates selections and emits well-formed comparison requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComparisonRequestBuilder {
    pub policy: HorizonPolicy,
    pub max_horizon: Option<u32>,
}

impl ComparisonRequestBuilder {
    pub fn new(policy: HorizonPolicy) -> Self {
        Self {
            policy,
            max_horizon: None,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            policy: config.horizon_policy,
            max_horizon: config.max_horizon,
        }
    }

    pub fn with_max_horizon(mut self, max: u32) -> Self {
        self.max_horizon = Some(max);
        self
    }

    pub fn build(&self, methods: &MethodSelection, raw_horizon: &str) -> Result<ComparisonRequest, ValidationError> {
        if methods.is_empty() {
            return Err(ValidationError::EmptySelection);
        }
        let horizon = self.parse_horizon(raw_horizon)?;
        Ok(ComparisonRequest {
            methods: methods.clone(),
            horizon,
        })
    }

    /// Parse the horizon text alone (exposed for live form validation).
    pub fn parse_horizon(&self, raw: &str) -> Result<ForecastHorizon, ValidationError> {
        let parsed = match self.policy {
            HorizonPolicy::Lenient => parse_integer_prefix(raw).unwrap_or(Ok(0)),
            HorizonPolicy::Strict => parse_whole_integer(raw),
        };

        let value = match parsed {
            Ok(v) => v,
            Err(_) => return Err(ValidationError::InvalidHorizon(raw.to_string())),
        };
        if value < 0 {
            return Err(ValidationError::NegativeHorizon(value));
        }
        let value = value as u64;

        if let Some(max) = self.max_horizon {
            if value > u64::from(max) {
                return Err(ValidationError::HorizonTooLarge { value, max });
            }
        }
        let value = u32::try_from(value).map_err(|_| ValidationError::InvalidHorizon(raw.to_string()))?;
        Ok(ForecastHorizon(value))
    }
}

/// Parse a leading `[+-]?digits` run, ignoring whatever follows.
///
/// Returns `None` when there are no leading digits at all (`""`, `"abc"`, `"-"`),
/// `Some(Err(()))` when positive digits overflow.
fn parse_integer_prefix(raw: &str) -> Option<Result<i64, ()>> {
    let (negative, rest) = split_sign(raw.trim_start());
    let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let digits = &rest[..end];
    if digits.is_empty() {
        return None;
    }
    Some(signed_digits(negative, digits))
}

fn parse_whole_integer(raw: &str) -> Result<i64, ()> {
    let (negative, digits) = split_sign(raw.trim());
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(());
    }
    signed_digits(negative, digits)
}

fn split_sign(s: &str) -> (bool, &str) {
    match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    }
}

/// `digits` is a non-empty ASCII digit run. Negative overflow saturates so it
/// is still reported as a negative horizon.
fn signed_digits(negative: bool, digits: &str) -> Result<i64, ()> {
    match digits.parse::<i64>() {
        Ok(v) if negative => Ok(-v),
        Ok(v) => Ok(v),
        Err(_) if negative => Ok(i64::MIN),
        Err(_) => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Method;

    fn methods(ids: &[&str]) -> MethodSelection {
        MethodSelection::parse(ids).unwrap()
    }

    #[test]
    fn builds_request_in_selection_order() {
        let req = ComparisonRequestBuilder::default()
            .build(&methods(&["lagrange", "cubic_spline"]), "5")
            .unwrap();
        assert_eq!(req.methods.as_slice(), &[Method::Lagrange, Method::CubicSpline]);
        assert_eq!(req.horizon, ForecastHorizon(5));

        let body = serde_json::to_value(&req).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"methods": ["lagrange", "cubic_spline"], "num_predictions": 5})
        );
    }

    #[test]
    fn empty_selection_is_checked_before_horizon() {
        let err = ComparisonRequestBuilder::new(HorizonPolicy::Strict)
            .build(&MethodSelection::new(), "not a number")
            .unwrap_err();
        assert_eq!(err, ValidationError::EmptySelection);
    }

    #[test]
    fn lenient_coerces_empty_and_text_to_zero() {
        let b = ComparisonRequestBuilder::new(HorizonPolicy::Lenient);
        assert_eq!(b.parse_horizon("").unwrap(), ForecastHorizon(0));
        assert_eq!(b.parse_horizon("abc").unwrap(), ForecastHorizon(0));
        assert_eq!(b.parse_horizon("-").unwrap(), ForecastHorizon(0));
    }

    #[test]
    fn lenient_reads_integer_prefix() {
        let b = ComparisonRequestBuilder::new(HorizonPolicy::Lenient);
        assert_eq!(b.parse_horizon(" 7 ").unwrap(), ForecastHorizon(7));
        assert_eq!(b.parse_horizon("12abc").unwrap(), ForecastHorizon(12));
        assert_eq!(b.parse_horizon("3.9").unwrap(), ForecastHorizon(3));
        assert_eq!(b.parse_horizon("+4").unwrap(), ForecastHorizon(4));
    }

    #[test]
    fn strict_rejects_empty_and_partial_numbers() {
        let b = ComparisonRequestBuilder::new(HorizonPolicy::Strict);
        assert_eq!(b.parse_horizon(""), Err(ValidationError::InvalidHorizon(String::new())));
        assert_eq!(b.parse_horizon("3.9"), Err(ValidationError::InvalidHorizon("3.9".into())));
        assert_eq!(b.parse_horizon(" 8 ").unwrap(), ForecastHorizon(8));
    }

    #[test]
    fn negative_is_rejected_in_both_modes() {
        for policy in [HorizonPolicy::Lenient, HorizonPolicy::Strict] {
            let err = ComparisonRequestBuilder::new(policy).parse_horizon("-3").unwrap_err();
            assert_eq!(err, ValidationError::NegativeHorizon(-3));
        }
    }

    #[test]
    fn optional_upper_bound() {
        let b = ComparisonRequestBuilder::default().with_max_horizon(10);
        assert_eq!(b.parse_horizon("10").unwrap(), ForecastHorizon(10));
        assert_eq!(
            b.parse_horizon("11"),
            Err(ValidationError::HorizonTooLarge { value: 11, max: 10 })
        );
    }

    #[test]
    fn huge_values_do_not_wrap() {
        let b = ComparisonRequestBuilder::default();
        assert!(matches!(
            b.parse_horizon("99999999999999999999999"),
            Err(ValidationError::InvalidHorizon(_))
        ));
        assert!(matches!(b.parse_horizon("5000000000"), Err(ValidationError::InvalidHorizon(_))));
    }

    #[test]
    fn overflowing_negative_is_still_negative() {
        for policy in [HorizonPolicy::Lenient, HorizonPolicy::Strict] {
            let err = ComparisonRequestBuilder::new(policy)
                .parse_horizon("-99999999999999999999")
                .unwrap_err();
            assert_eq!(err, ValidationError::NegativeHorizon(i64::MIN));
        }
        assert_eq!(
            ComparisonRequestBuilder::default().parse_horizon("-0").unwrap(),
            ForecastHorizon(0)
        );
    }
}
