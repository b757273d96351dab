//! Column accessors.
//!
//! A [`Column`] reads and writes one typed field of a domain item as a
//! [`CellValue`]. Columns without a setter, or explicitly marked read-only,
//! refuse edits and are skipped by fill writes.

use std::fmt;
use std::sync::Arc;

use super::validator::{ValidationError, Validator, run_validator};
use super::CellValue;

type Getter<T> = Arc<dyn Fn(&T) -> CellValue + Send + Sync>;
type Setter<T> = Arc<dyn Fn(&mut T, CellValue) -> bool + Send + Sync>;

/// Accessor for one column of a grid.
///
/// # Example
///
/// ```
/// use horizon_datagrid::model::{CellValue, Column, RangeValidator};
///
/// struct Product { name: String, stock: i64 }
///
/// let stock = Column::new("Stock", |p: &Product| CellValue::Integer(p.stock))
///     .with_setter(|p: &mut Product, value| match value.as_i64() {
///         Some(v) => { p.stock = v; true }
///         None => false,
///     })
///     .with_validator(RangeValidator::non_negative());
///
/// let mut item = Product { name: "Pen".into(), stock: 3 };
/// assert!(!stock.is_read_only());
/// assert!(stock.set_value(&mut item, CellValue::Integer(5)));
/// assert_eq!(stock.value(&item), CellValue::Integer(5));
/// ```
pub struct Column<T> {
    name: String,
    getter: Getter<T>,
    setter: Option<Setter<T>>,
    read_only: bool,
    validators: Vec<Arc<dyn Validator>>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            getter: self.getter.clone(),
            setter: self.setter.clone(),
            read_only: self.read_only,
            validators: self.validators.clone(),
        }
    }
}

impl<T> Column<T> {
    /// Create a read-only column from a getter.
    pub fn new<G>(name: impl Into<String>, getter: G) -> Self
    where
        G: Fn(&T) -> CellValue + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            getter: Arc::new(getter),
            setter: None,
            read_only: false,
            validators: Vec::new(),
        }
    }

    /// Make the column writable through `setter`.
    ///
    /// The setter returns false if it cannot store the value (wrong type).
    pub fn with_setter<S>(mut self, setter: S) -> Self
    where
        S: Fn(&mut T, CellValue) -> bool + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(setter));
        self
    }

    /// Mark the column read-only even if it has a setter.
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Attach a validator run on commit.
    pub fn with_validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// The column header text.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if the column refuses edits.
    pub fn is_read_only(&self) -> bool {
        self.read_only || self.setter.is_none()
    }

    /// Read the column's value from `item`.
    pub fn value(&self, item: &T) -> CellValue {
        (self.getter)(item)
    }

    /// Write `value` into `item`. Returns false for read-only columns.
    pub fn set_value(&self, item: &mut T, value: CellValue) -> bool {
        match &self.setter {
            Some(setter) if !self.read_only => setter(item, value),
            _ => false,
        }
    }

    /// Write `value` ignoring the read-only flag.
    ///
    /// Used to restore snapshots, which must round-trip even on columns
    /// that were made read-only after the edit began.
    pub(crate) fn restore_value(&self, item: &mut T, value: CellValue) -> bool {
        match &self.setter {
            Some(setter) => setter(item, value),
            None => false,
        }
    }

    /// Returns true if a snapshot of this column can be written back.
    pub(crate) fn can_restore(&self) -> bool {
        self.setter.is_some()
    }

    /// Run every validator over `value`.
    ///
    /// Fixups are chained: each validator sees the output of the previous
    /// one. Returns the value to write, or one error per refusing validator.
    pub fn validate(&self, column: usize, value: CellValue) -> Result<CellValue, Vec<ValidationError>> {
        let mut current = value;
        let mut errors = Vec::new();
        for validator in &self.validators {
            match run_validator(validator.as_ref(), &current) {
                Ok(Some(fixed)) => current = fixed,
                Ok(None) => {}
                Err(state) => errors.push(ValidationError {
                    column,
                    value: current.clone(),
                    state,
                    message: validator.message(),
                }),
            }
        }
        if errors.is_empty() {
            Ok(current)
        } else {
            Err(errors)
        }
    }
}

impl<T> fmt::Debug for Column<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("read_only", &self.is_read_only())
            .field("validators", &self.validators.len())
            .finish()
    }
}
