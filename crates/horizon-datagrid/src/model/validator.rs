//! Column-level validation of edited cell values.
//!
//! Validators are attached to a [`Column`](super::Column) and run against the
//! edit buffer when an edit session commits. A value that is not
//! [`ValidationState::Acceptable`] gets one chance to be repaired through
//! [`Validator::fixup`]; if that fails the commit is refused and the session
//! keeps the buffer so the user can correct it.
//!
//! # Validation States
//!
//! - [`ValidationState::Invalid`]: The value is clearly wrong
//! - [`ValidationState::Intermediate`]: The value is close but needs fixing up
//! - [`ValidationState::Acceptable`]: The value can be written to the item
//!
//! # Built-in Validators
//!
//! - [`RangeValidator`]: Numeric values within an inclusive range
//! - [`RegexValidator`]: Text form of the value against a regular expression
//! - [`RequiredValidator`]: Rejects empty values
//! - [`CustomValidator`]: Wraps a closure
//!
//! # Example
//!
//! ```
//! use horizon_datagrid::model::{CellValue, RangeValidator, ValidationState, Validator};
//!
//! let validator = RangeValidator::new(0.0, 100.0);
//! assert_eq!(validator.validate(&CellValue::Integer(42)), ValidationState::Acceptable);
//! assert_eq!(validator.validate(&CellValue::Integer(150)), ValidationState::Invalid);
//! assert_eq!(validator.validate(&CellValue::from("42")), ValidationState::Intermediate);
//! ```

use std::fmt;
use std::sync::Arc;

use super::CellValue;

/// The result of validating a cell value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationState {
    /// The value is invalid and cannot be repaired.
    Invalid,
    /// The value is not acceptable as-is but [`Validator::fixup`] may repair it.
    Intermediate,
    /// The value is valid.
    #[default]
    Acceptable,
}

impl fmt::Display for ValidationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationState::Invalid => write!(f, "Invalid"),
            ValidationState::Intermediate => write!(f, "Intermediate"),
            ValidationState::Acceptable => write!(f, "Acceptable"),
        }
    }
}

/// A validation failure reported by a refused commit.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Index of the column whose validator refused the value.
    pub column: usize,
    /// The refused value.
    pub value: CellValue,
    /// Final state after fixup was attempted.
    pub state: ValidationState,
    /// Human-readable description from the validator.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "column {}: {}", self.column, self.message)
    }
}

/// Trait for cell value validators.
///
/// Validators must be `Send + Sync` so columns can be shared with signal
/// slots.
pub trait Validator: Send + Sync {
    /// Validate a value.
    fn validate(&self, value: &CellValue) -> ValidationState;

    /// Attempt to repair a value that is not acceptable.
    ///
    /// The default implementation returns `None`, meaning no fixup is attempted.
    fn fixup(&self, _value: &CellValue) -> Option<CellValue> {
        None
    }

    /// Description reported when a value is refused.
    fn message(&self) -> String {
        "value is not valid".to_string()
    }
}

impl<V: Validator + ?Sized> Validator for Arc<V> {
    fn validate(&self, value: &CellValue) -> ValidationState {
        (**self).validate(value)
    }

    fn fixup(&self, value: &CellValue) -> Option<CellValue> {
        (**self).fixup(value)
    }

    fn message(&self) -> String {
        (**self).message()
    }
}

impl<V: Validator + ?Sized> Validator for Box<V> {
    fn validate(&self, value: &CellValue) -> ValidationState {
        (**self).validate(value)
    }

    fn fixup(&self, value: &CellValue) -> Option<CellValue> {
        (**self).fixup(value)
    }

    fn message(&self) -> String {
        (**self).message()
    }
}

/// Runs `validator` over `value`, applying fixup when needed.
///
/// Returns the value to write (possibly repaired) or the final failing state.
pub(crate) fn run_validator(
    validator: &dyn Validator,
    value: &CellValue,
) -> Result<Option<CellValue>, ValidationState> {
    match validator.validate(value) {
        ValidationState::Acceptable => Ok(None),
        state => match validator.fixup(value) {
            Some(fixed) if validator.validate(&fixed) == ValidationState::Acceptable => {
                Ok(Some(fixed))
            }
            _ => Err(state),
        },
    }
}

/// Validator for numeric values within an inclusive range.
///
/// Empty values are acceptable; combine with [`RequiredValidator`] to
/// reject them. Text that parses as a number is intermediate and fixes up
/// to the parsed number.
#[derive(Debug, Clone)]
pub struct RangeValidator {
    minimum: f64,
    maximum: f64,
}

impl RangeValidator {
    /// Create a new range validator.
    pub fn new(minimum: f64, maximum: f64) -> Self {
        Self {
            minimum: minimum.min(maximum),
            maximum: minimum.max(maximum),
        }
    }

    /// Create a validator for non-negative values.
    pub fn non_negative() -> Self {
        Self::new(0.0, f64::MAX)
    }

    /// Get the minimum value.
    pub fn minimum(&self) -> f64 {
        self.minimum
    }

    /// Get the maximum value.
    pub fn maximum(&self) -> f64 {
        self.maximum
    }

    fn in_range(&self, value: f64) -> bool {
        value >= self.minimum && value <= self.maximum
    }

    fn parse(text: &str) -> Option<CellValue> {
        let trimmed = text.trim();
        if let Ok(v) = trimmed.parse::<i64>() {
            return Some(CellValue::Integer(v));
        }
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(CellValue::Number)
    }
}

impl Validator for RangeValidator {
    fn validate(&self, value: &CellValue) -> ValidationState {
        match value {
            CellValue::Empty => ValidationState::Acceptable,
            CellValue::Integer(_) | CellValue::Number(_) => match value.as_f64() {
                Some(v) if self.in_range(v) => ValidationState::Acceptable,
                _ => ValidationState::Invalid,
            },
            CellValue::Text(text) => match Self::parse(text).and_then(|v| v.as_f64()) {
                Some(v) if self.in_range(v) => ValidationState::Intermediate,
                _ => ValidationState::Invalid,
            },
            CellValue::Bool(_) => ValidationState::Invalid,
        }
    }

    fn fixup(&self, value: &CellValue) -> Option<CellValue> {
        match value {
            CellValue::Text(text) => Self::parse(text),
            _ => None,
        }
    }

    fn message(&self) -> String {
        format!(
            "value must be a number between {} and {}",
            self.minimum, self.maximum
        )
    }
}

/// Validator matching the text form of a value against a regular expression.
///
/// The pattern must match the whole text. An optional intermediate pattern
/// marks values that are close, which is only useful together with a
/// validator that repairs them.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    pattern: regex::Regex,
    /// Optional pattern for intermediate state.
    intermediate_pattern: Option<regex::Regex>,
}

impl RegexValidator {
    /// Create a new regex validator.
    ///
    /// The pattern is anchored so it must match the entire text.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: regex::Regex::new(&format!("^(?:{pattern})$"))?,
            intermediate_pattern: None,
        })
    }

    /// Create a regex validator with a pattern for intermediate values.
    pub fn with_intermediate(pattern: &str, intermediate: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: regex::Regex::new(&format!("^(?:{pattern})$"))?,
            intermediate_pattern: Some(regex::Regex::new(&format!("^(?:{intermediate})$"))?),
        })
    }

    /// Get the anchored pattern string.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Validator for RegexValidator {
    fn validate(&self, value: &CellValue) -> ValidationState {
        let text = value.to_string();
        if self.pattern.is_match(&text) {
            return ValidationState::Acceptable;
        }
        match &self.intermediate_pattern {
            Some(intermediate) if intermediate.is_match(&text) => ValidationState::Intermediate,
            _ => ValidationState::Invalid,
        }
    }

    fn message(&self) -> String {
        format!("value must match {}", self.pattern.as_str())
    }
}

/// Validator that rejects empty values and blank text.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn validate(&self, value: &CellValue) -> ValidationState {
        match value {
            CellValue::Empty => ValidationState::Invalid,
            CellValue::Text(text) if text.trim().is_empty() => ValidationState::Invalid,
            CellValue::Text(text) if text.trim() != text => ValidationState::Intermediate,
            _ => ValidationState::Acceptable,
        }
    }

    fn fixup(&self, value: &CellValue) -> Option<CellValue> {
        value.as_str().map(|text| CellValue::Text(text.trim().to_string()))
    }

    fn message(&self) -> String {
        "value is required".to_string()
    }
}

/// A validator backed by a closure.
///
/// # Example
///
/// ```
/// use horizon_datagrid::model::{CellValue, CustomValidator, ValidationState, Validator};
///
/// let even = CustomValidator::new(|value| match value.as_i64() {
///     Some(v) if v % 2 == 0 => ValidationState::Acceptable,
///     _ => ValidationState::Invalid,
/// })
/// .with_message("value must be even");
///
/// assert_eq!(even.validate(&CellValue::Integer(4)), ValidationState::Acceptable);
/// assert_eq!(even.message(), "value must be even");
/// ```
pub struct CustomValidator<F>
where
    F: Fn(&CellValue) -> ValidationState + Send + Sync,
{
    validate_fn: F,
    fixup_fn: Option<Box<dyn Fn(&CellValue) -> Option<CellValue> + Send + Sync>>,
    message: Option<String>,
}

impl<F> CustomValidator<F>
where
    F: Fn(&CellValue) -> ValidationState + Send + Sync,
{
    /// Create a new custom validator with the given validation function.
    pub fn new(validate_fn: F) -> Self {
        Self {
            validate_fn,
            fixup_fn: None,
            message: None,
        }
    }

    /// Add a fixup function to this validator.
    pub fn with_fixup<G>(mut self, fixup_fn: G) -> Self
    where
        G: Fn(&CellValue) -> Option<CellValue> + Send + Sync + 'static,
    {
        self.fixup_fn = Some(Box::new(fixup_fn));
        self
    }

    /// Set the message reported on failure.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<F> Validator for CustomValidator<F>
where
    F: Fn(&CellValue) -> ValidationState + Send + Sync,
{
    fn validate(&self, value: &CellValue) -> ValidationState {
        (self.validate_fn)(value)
    }

    fn fixup(&self, value: &CellValue) -> Option<CellValue> {
        self.fixup_fn.as_ref().and_then(|f| f(value))
    }

    fn message(&self) -> String {
        self.message
            .clone()
            .unwrap_or_else(|| "value is not valid".to_string())
    }
}

impl<F> fmt::Debug for CustomValidator<F>
where
    F: Fn(&CellValue) -> ValidationState + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomValidator")
            .field("has_fixup", &self.fixup_fn.is_some())
            .field("message", &self.message)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_validator_acceptable() {
        let validator = RangeValidator::new(0.0, 100.0);
        assert_eq!(validator.validate(&CellValue::Integer(0)), ValidationState::Acceptable);
        assert_eq!(validator.validate(&CellValue::Number(99.5)), ValidationState::Acceptable);
        assert_eq!(validator.validate(&CellValue::Empty), ValidationState::Acceptable);
    }

    #[test]
    fn test_range_validator_out_of_range() {
        let validator = RangeValidator::new(100.0, 0.0);
        assert_eq!(validator.minimum(), 0.0);
        assert_eq!(validator.validate(&CellValue::Integer(-1)), ValidationState::Invalid);
        assert_eq!(validator.validate(&CellValue::Bool(true)), ValidationState::Invalid);
        assert_eq!(validator.validate(&CellValue::from("abc")), ValidationState::Invalid);
    }

    #[test]
    fn test_range_validator_fixup_parses_text() {
        let validator = RangeValidator::new(0.0, 10.0);
        let fixed = run_validator(&validator, &CellValue::from(" 7 "));
        assert_eq!(fixed, Ok(Some(CellValue::Integer(7))));
        assert_eq!(
            run_validator(&validator, &CellValue::from("70")),
            Err(ValidationState::Invalid)
        );
    }

    #[test]
    fn test_regex_validator() {
        let validator = RegexValidator::new(r"[A-Z]{3}").unwrap();
        assert_eq!(validator.validate(&CellValue::from("ABC")), ValidationState::Acceptable);
        assert_eq!(validator.validate(&CellValue::from("ABCD")), ValidationState::Invalid);

        let validator = RegexValidator::with_intermediate(r"\d{4}", r"\d{0,3}").unwrap();
        assert_eq!(validator.validate(&CellValue::Integer(2024)), ValidationState::Acceptable);
        assert_eq!(validator.validate(&CellValue::Integer(20)), ValidationState::Intermediate);
    }

    #[test]
    fn test_required_validator() {
        assert_eq!(RequiredValidator.validate(&CellValue::Empty), ValidationState::Invalid);
        assert_eq!(RequiredValidator.validate(&CellValue::from("  ")), ValidationState::Invalid);
        assert_eq!(
            run_validator(&RequiredValidator, &CellValue::from(" Ann ")),
            Ok(Some(CellValue::from("Ann")))
        );
    }

    #[test]
    fn test_custom_validator_with_fixup() {
        let validator = CustomValidator::new(|value| {
            if value.as_str().is_some_and(|s| s.chars().all(|c| c.is_uppercase())) {
                ValidationState::Acceptable
            } else {
                ValidationState::Intermediate
            }
        })
        .with_fixup(|value| value.as_str().map(|s| CellValue::from(s.to_uppercase())));

        assert_eq!(
            run_validator(&validator, &CellValue::from("abc")),
            Ok(Some(CellValue::from("ABC")))
        );
        assert_eq!(validator.message(), "value is not valid");
    }
}
