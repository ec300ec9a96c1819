use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Field-level validation messages collected before any write happens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<Cow<'static, str>, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<Cow<'static, str>>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(|field| field.as_ref())
    }

    /// Rejects blank text.
    pub fn required(&mut self, field: &'static str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, format!("the {field} field is required"));
        }
    }

    /// Character-count bounds, inclusive on both ends.
    pub fn length(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let count = value.trim().chars().count();
        if count == 0 {
            self.add(field, format!("the {field} field is required"));
        } else if count < min {
            self.add(field, format!("the {field} must be at least {min} characters"));
        } else if count > max {
            self.add(
                field,
                format!("the {field} may not be greater than {max} characters"),
            );
        }
    }

    pub fn max_length(&mut self, field: &'static str, value: Option<&str>, max: usize) {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.add(
                    field,
                    format!("the {field} may not be greater than {max} characters"),
                );
            }
        }
    }

    pub fn range<T>(&mut self, field: &'static str, value: T, min: T, max: T)
    where
        T: PartialOrd + fmt::Display,
    {
        if value < min || value > max {
            self.add(field, format!("the {field} must be between {min} and {max}"));
        }
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "the given data was invalid")?;
        for (field, messages) in &self.fields {
            write!(f, "; {field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
