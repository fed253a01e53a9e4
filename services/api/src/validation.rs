//! Input validation utilities
//!
//! Checks run before create/update requests are sent. Failures are reported
//! as [`ClientError::Rejected`], which carries field messages like a 422 but
//! no status, since no request was made.

use regex::Regex;
use std::sync::OnceLock;

use common::error::{ClientError, ClientResult, FieldErrors};

use crate::models::{CourseUpdate, NewCourse, NewUser, UserUpdate};

/// Validate a required text field
pub fn validate_required(label: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", label));
    }
    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate password length
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.chars().count() < 8 {
        return Err("Password must be at least 8 characters long".to_string());
    }

    if password.len() > 128 {
        return Err("Password must be at most 128 characters long".to_string());
    }

    Ok(())
}

/// Validate that the confirmation repeats the password
pub fn validate_password_confirmation(password: &str, confirmation: &str) -> Result<(), String> {
    if password != confirmation {
        return Err("Password confirmation does not match".to_string());
    }
    Ok(())
}

/// Field messages gathered across several checks
#[derive(Debug, Default)]
struct Report {
    errors: FieldErrors,
}

impl Report {
    fn check(&mut self, field: &str, result: Result<(), String>) {
        let Err(message) = result else {
            return;
        };
        match self.errors.iter_mut().find(|(name, _)| name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.errors.push((field.to_string(), vec![message])),
        }
    }

    fn finish(self) -> ClientResult<()> {
        let Some(message) = self
            .errors
            .first()
            .and_then(|(_, messages)| messages.first())
            .cloned()
        else {
            return Ok(());
        };
        Err(ClientError::Rejected {
            message,
            errors: self.errors,
        })
    }
}

/// Validate a user creation payload
pub fn validate_new_user(user: &NewUser) -> ClientResult<()> {
    let mut report = Report::default();
    report.check("first_name", validate_required("First name", &user.first_name));
    report.check("last_name", validate_required("Last name", &user.last_name));
    report.check("email", validate_email(&user.email));
    report.check("password", validate_password(&user.password));
    report.check(
        "password_confirmation",
        validate_password_confirmation(&user.password, &user.password_confirmation),
    );
    report.finish()
}

/// Validate the fields a user update sets
pub fn validate_user_update(update: &UserUpdate) -> ClientResult<()> {
    let mut report = Report::default();
    if let Some(first_name) = &update.first_name {
        report.check("first_name", validate_required("First name", first_name));
    }
    if let Some(last_name) = &update.last_name {
        report.check("last_name", validate_required("Last name", last_name));
    }
    if let Some(email) = &update.email {
        report.check("email", validate_email(email));
    }
    if let Some(password) = &update.password {
        report.check("password", validate_password(password));
        report.check(
            "password_confirmation",
            validate_password_confirmation(
                password,
                update.password_confirmation.as_deref().unwrap_or_default(),
            ),
        );
    }
    report.finish()
}

/// Validate a course creation payload
pub fn validate_new_course(course: &NewCourse) -> ClientResult<()> {
    let mut report = Report::default();
    report.check("name", validate_required("Name", &course.name));
    report.finish()
}

/// Validate the fields a course update sets
pub fn validate_course_update(update: &CourseUpdate) -> ClientResult<()> {
    let mut report = Report::default();
    if let Some(name) = &update.name {
        report.check("name", validate_required("Name", name));
    }
    report.finish()
}

/// Validate a course type name
pub fn validate_course_type_name(name: &str) -> ClientResult<()> {
    let mut report = Report::default();
    report.check("name", validate_required("Name", name));
    report.finish()
}
