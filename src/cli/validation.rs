use thiserror::Error;

use crate::model::{Credentials, ProductDraft, ProductPatch};

/// A form field failed local checks. No request is sent when this is raised.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

pub struct SignupForm {
    pub username: String,
    pub password: String,
}

pub fn validate_login(form: &LoginForm) -> Result<Credentials, ValidationError> {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        return Err(ValidationError::new(
            "credentials",
            "Please enter both username and password",
        ));
    }
    Ok(Credentials {
        username: username.to_string(),
        password: form.password.clone(),
    })
}

pub fn validate_signup(form: &SignupForm) -> Result<Credentials, ValidationError> {
    let username = form.username.trim();
    if username.is_empty() {
        return Err(ValidationError::new("username", "Username is required"));
    }
    if form.password.is_empty() {
        return Err(ValidationError::new("password", "Password is required"));
    }
    Ok(Credentials {
        username: username.to_string(),
        password: form.password.clone(),
    })
}

fn check_amount(field: &'static str, label: &str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(
            field,
            format!("{label} must be a non-negative number"),
        ));
    }
    Ok(())
}

pub fn validate_draft(draft: &ProductDraft) -> Result<(), ValidationError> {
    if draft.name.trim().is_empty() {
        return Err(ValidationError::new("name", "Product name is required"));
    }
    check_amount("price", "Price", draft.unit_price)?;
    check_amount("delivery_fee", "Delivery fee", draft.delivery_fee)?;
    check_amount("margin", "Target margin", draft.target_margin)?;
    Ok(())
}

pub fn validate_patch(patch: &ProductPatch) -> Result<(), ValidationError> {
    if patch.is_empty() {
        return Err(ValidationError::new("product", "Nothing to update"));
    }
    if let Some(name) = patch.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ValidationError::new("name", "Product name is required"));
        }
    }
    if let Some(v) = patch.unit_price {
        check_amount("price", "Price", v)?;
    }
    if let Some(v) = patch.delivery_fee {
        check_amount("delivery_fee", "Delivery fee", v)?;
    }
    if let Some(v) = patch.target_margin {
        check_amount("margin", "Target margin", v)?;
    }
    Ok(())
}
