// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Request field validation.
//!
//! Validation runs before any identity-provider call. Each field reports at
//! most one error (the first rule it fails); all failing fields are reported
//! together in a single 422.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{ApiError, FieldError};
use crate::models::{
    ConfirmPasswordRequest, ForgotPasswordRequest, SignInRequest, SignUpRequest, VerifyRequest,
};

pub const USERNAME_MIN_LEN: usize = 5;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const CODE_LEN: usize = 6;

pub trait Validate {
    fn validate(&self) -> Result<(), ApiError>;
}

#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.errors.push(FieldError::new(field, message));
        }
        self
    }

    fn finish(&mut self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation(std::mem::take(&mut self.errors)))
        }
    }
}

fn not_empty(value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(())
    }
}

/// Length rules count every character; whitespace is not trimmed.
fn min_len(value: &str, min: usize) -> Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    if value.chars().count() < min {
        return Err(format!("must be at least {min} characters"));
    }
    Ok(())
}

fn exact_len(value: &str, len: usize) -> Result<(), String> {
    not_empty(value)?;
    if value.chars().count() != len {
        return Err(format!("must be exactly {len} characters"));
    }
    Ok(())
}

fn email(value: &str) -> Result<(), String> {
    not_empty(value)?;
    if is_valid_email(value.trim()) {
        Ok(())
    } else {
        Err("must be a valid email address".to_string())
    }
}

fn iso_date(value: &str) -> Result<(), String> {
    not_empty(value)?;
    if is_iso8601_date(value.trim()) {
        Ok(())
    } else {
        Err("must be an ISO-8601 date".to_string())
    }
}

/// Calendar date (`YYYY-MM-DD` or basic `YYYYMMDD`), a local date-time with
/// optional fractional seconds, or an RFC 3339 timestamp.
pub fn is_iso8601_date(value: &str) -> bool {
    match value.len() {
        8 => is_basic_date(value),
        10 => NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok(),
        _ => {
            DateTime::parse_from_rfc3339(value).is_ok()
                || NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        }
    }
}

fn is_basic_date(value: &str) -> bool {
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    let (Ok(year), Ok(month), Ok(day)) = (
        value[..4].parse::<i32>(),
        value[4..6].parse::<u32>(),
        value[6..].parse::<u32>(),
    ) else {
        return false;
    };
    NaiveDate::from_ymd_opt(year, month, day).is_some()
}

/// Syntactic address check: `local@domain` with a dotted, hostname-shaped
/// domain.
pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.rsplit_once('@') else {
        return false;
    };

    const LOCAL_SPECIALS: &str = "!#$%&'*+/=?^_`{|}~.-";
    let local_ok = !local.is_empty()
        && local.len() <= 64
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || LOCAL_SPECIALS.contains(c));
    if !local_ok || domain.len() > 253 {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }
    let labels_ok = labels.iter().all(|label| {
        !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    let tld = labels[labels.len() - 1];
    labels_ok && tld.len() >= 2 && !tld.chars().all(|c| c.is_ascii_digit())
}

impl Validate for SignUpRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Checker::default()
            .check("username", min_len(&self.username, USERNAME_MIN_LEN))
            .check("email", email(&self.email))
            .check("password", min_len(&self.password, PASSWORD_MIN_LEN))
            .check("birthdate", iso_date(&self.birthdate))
            .check("name", not_empty(&self.name))
            .check("family_name", not_empty(&self.family_name))
            .finish()
    }
}

impl Validate for SignInRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Checker::default()
            .check("username", min_len(&self.username, USERNAME_MIN_LEN))
            .check("password", min_len(&self.password, PASSWORD_MIN_LEN))
            .finish()
    }
}

impl Validate for VerifyRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Checker::default()
            .check("username", min_len(&self.username, USERNAME_MIN_LEN))
            .check("code", exact_len(&self.code, CODE_LEN))
            .finish()
    }
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Checker::default()
            .check("username", min_len(&self.username, USERNAME_MIN_LEN))
            .finish()
    }
}

impl Validate for ConfirmPasswordRequest {
    fn validate(&self) -> Result<(), ApiError> {
        Checker::default()
            .check("password", min_len(&self.password, PASSWORD_MIN_LEN))
            .check("username", min_len(&self.username, USERNAME_MIN_LEN))
            .check("code", exact_len(&self.code, CODE_LEN))
            .finish()
    }
}
