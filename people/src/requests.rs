//! Request payloads accepted by [`crate::PeopleService`], with validation.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::PeopleError;

pub const MAX_AGE: i32 = 120;
pub const GENDERS: [&str; 3] = ["Male", "Female", "Other"];
pub const MAX_TEXT_LEN: usize = 255;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;
pub const MAX_BULK_ITEMS: usize = 100;

/// One observation from the recognition pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SightingRequest {
    pub vector: Option<Vec<f32>>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub emotion: Option<String>,
    pub body_type: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
}

impl SightingRequest {
    /// Checks vector length and content against `dim`, plus the metadata
    /// bounds. An empty vector is treated as absent.
    pub fn validate(&mut self, dim: usize) -> Result<(), PeopleError> {
        if self.vector.as_ref().is_some_and(Vec::is_empty) {
            self.vector = None;
        }
        if let Some(v) = &self.vector {
            validate_vector(v, dim)?;
        }
        validate_age(self.age)?;
        validate_text("gender", self.gender.as_deref())?;
        validate_text("emotion", self.emotion.as_deref())?;
        validate_text("body_type", self.body_type.as_deref())?;
        Ok(())
    }
}

/// Partial update of a person. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PersonPatch {
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub emotion: Option<String>,
    pub body_type: Option<String>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
}

impl PersonPatch {
    pub fn validate(&self) -> Result<(), PeopleError> {
        validate_age(self.age)?;
        if let Some(g) = self.gender.as_deref() {
            if !GENDERS.contains(&g) {
                return Err(PeopleError::Validation(format!(
                    "gender must be one of: {}",
                    GENDERS.join(", ")
                )));
            }
        }
        validate_text("full_name", self.full_name.as_deref())?;
        validate_text("phone_number", self.phone_number.as_deref())?;
        validate_text("emotion", self.emotion.as_deref())?;
        validate_text("body_type", self.body_type.as_deref())?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganization {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCart {
    pub person_id: String,
    #[serde(default)]
    pub table_number: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
pub struct NewCartProduct {
    pub cart_id: String,
    pub product_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BulkCartProducts {
    pub cart_products: Vec<NewCartProduct>,
}

/// Raw pagination parameters. Missing values take the defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageQuery {
    /// Returns `(page, page_size)`. Sizes above the maximum are clamped;
    /// sizes below one fall back to the default.
    pub fn normalize(self) -> (i64, usize) {
        let page = self.page.unwrap_or(1);
        let size = match self.page_size.unwrap_or(DEFAULT_PAGE_SIZE) {
            s if s > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            s if s < 1 => DEFAULT_PAGE_SIZE,
            s => s,
        };
        (page, size as usize)
    }
}

pub(crate) fn validate_vector(v: &[f32], dim: usize) -> Result<(), PeopleError> {
    if v.len() != dim {
        return Err(PeopleError::Validation(format!(
            "vector must contain {dim} values, got {}",
            v.len()
        )));
    }
    if let Some(i) = v.iter().position(|x| !x.is_finite()) {
        return Err(PeopleError::Validation(format!(
            "vector value at index {i} is not a finite number"
        )));
    }
    Ok(())
}

fn validate_age(age: Option<i32>) -> Result<(), PeopleError> {
    match age {
        Some(a) if a < 0 => Err(PeopleError::Validation("age must not be negative".into())),
        Some(a) if a > MAX_AGE => Err(PeopleError::Validation(format!(
            "age must not exceed {MAX_AGE}"
        ))),
        _ => Ok(()),
    }
}

pub(crate) fn validate_text(field: &str, value: Option<&str>) -> Result<(), PeopleError> {
    match value {
        Some(s) if s.chars().count() > MAX_TEXT_LEN => Err(PeopleError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        ))),
        _ => Ok(()),
    }
}
