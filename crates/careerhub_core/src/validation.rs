//! crates/careerhub_core/src/validation.rs
//!
//! Client-side checks run before anything is sent. They only cover presence,
//! length and format; the backend remains the judge of everything else.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::domain::RegisterStep1Data;
use crate::envelope::FieldErrors;
use crate::profile::PersonalInfo;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const VERIFICATION_CODE_LEN: usize = 6;
pub const MIN_PHONE_LEN: usize = 10;
pub const MIN_BIO_LEN: usize = 50;

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is a valid regex")
    })
}

fn push(errors: &mut FieldErrors, field: &str, message: &str) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.to_string());
}

fn finish(errors: FieldErrors) -> Result<(), FieldErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email_pattern().is_match(email.trim())
}

//=========================================================================================
// Step 1: Account
//=========================================================================================

/// Checks the account form. Errors are keyed by the same field names the
/// backend uses, so they can be merged with server-side errors.
pub fn validate_step1(data: &RegisterStep1Data) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let required = [
        ("first_name", data.first_name.as_str(), "First name is required"),
        ("last_name", data.last_name.as_str(), "Last name is required"),
        ("email", data.email.as_str(), "Email is required"),
        ("password", data.password.as_str(), "Password is required"),
        (
            "password_confirmation",
            data.password_confirmation.as_str(),
            "Password confirmation is required",
        ),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            push(&mut errors, field, message);
        }
    }

    if !data.email.trim().is_empty() && !is_valid_email(&data.email) {
        push(&mut errors, "email", "Email must be a valid email address");
    }
    if !data.password.is_empty() && data.password.chars().count() < MIN_PASSWORD_LEN {
        push(
            &mut errors,
            "password",
            "Password must be at least 8 characters long",
        );
    }
    if !data.password_confirmation.is_empty() && data.password != data.password_confirmation {
        push(&mut errors, "password_confirmation", "Passwords do not match");
    }

    finish(errors)
}

//=========================================================================================
// Step 2: Verification Code
//=========================================================================================

/// Keeps only digits and at most six of them, the way the code input does.
pub fn normalize_code(input: &str) -> String {
    input
        .chars()
        .filter(char::is_ascii_digit)
        .take(VERIFICATION_CODE_LEN)
        .collect()
}

/// Exactly six ASCII digits.
pub fn is_verification_code(code: &str) -> bool {
    code.len() == VERIFICATION_CODE_LEN && code.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_code(code: &str) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    if !is_verification_code(code) {
        push(&mut errors, "code", "Please enter a 6-digit verification code");
    }
    finish(errors)
}

//=========================================================================================
// Step 3: Personal Information
//=========================================================================================

/// Checks the personal section of the profile form. `today` is passed in so
/// the birth-date rule stays deterministic.
pub fn validate_personal_info(info: &PersonalInfo, today: NaiveDate) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    let birth_date = info.birth_date.trim();
    if birth_date.is_empty() {
        push(&mut errors, "birth_date", "Date of birth is required");
    } else {
        match NaiveDate::parse_from_str(birth_date, "%Y-%m-%d") {
            Ok(date) if date >= today => {
                push(&mut errors, "birth_date", "Date of birth must be in the past")
            }
            Ok(_) => {}
            Err(_) => push(&mut errors, "birth_date", "Date of birth must be a valid date"),
        }
    }

    let phone = info.phone.trim();
    if phone.is_empty() {
        push(&mut errors, "phone", "Phone number is required");
    } else if phone.chars().count() < MIN_PHONE_LEN {
        push(&mut errors, "phone", "Phone number must be at least 10 digits");
    }

    if info.location.trim().is_empty() {
        push(&mut errors, "location", "Location is required");
    }

    if info.bio.trim().is_empty() {
        push(&mut errors, "bio", "Bio is required");
    } else if info.bio.chars().count() < MIN_BIO_LEN {
        push(&mut errors, "bio", "Bio must be at least 50 characters");
    }

    finish(errors)
}
