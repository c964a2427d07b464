//! Contact form validation and sanitisation.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use super::mailer::OutgoingEmail;
use crate::config::ContactConfig;

const MAX_NAME_CHARS: usize = 100;
const MAX_EMAIL_CHARS: usize = 254;
const MIN_MESSAGE_CHARS: usize = 10;
const MAX_MESSAGE_CHARS: usize = 5000;

/// Address shape accepted by the form. Leading dots and `..` are checked separately.
static EMAIL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)^[a-z0-9_'+\-.]*[a-z0-9_+\-]@([a-z0-9][a-z0-9\-]*\.)+[a-z]{2,}$").ok()
});

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContactError {
    #[error("Name is required")]
    NameRequired,

    #[error("Name is too long")]
    NameTooLong,

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Email is too long")]
    EmailTooLong,

    #[error("Message must be at least 10 characters")]
    MessageTooShort,

    #[error("Message is too long")]
    MessageTooLong,
}

/// Raw submission. Fields stay loose so a wrong type is a validation error,
/// not a malformed body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub email: Option<Value>,
    #[serde(default)]
    pub message: Option<Value>,
}

/// A validated submission with every field trimmed and HTML-escaped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Escape characters that would let user input become markup.
pub fn sanitize_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '/' => out.push_str("&#x2F;"),
            _ => out.push(c),
        }
    }
    out
}

fn is_valid_email(email: &str) -> bool {
    if email.starts_with('.') || email.contains("..") {
        return false;
    }
    EMAIL_PATTERN.as_ref().is_some_and(|re| re.is_match(email))
}

fn as_text(value: Option<&Value>) -> Option<&str> {
    value.and_then(Value::as_str)
}

impl ContactForm {
    /// Check fields in order and report the first problem.
    /// Lengths are measured before trimming.
    pub fn validate(&self) -> Result<ContactMessage, ContactError> {
        let name = as_text(self.name.as_ref()).ok_or(ContactError::NameRequired)?;
        let name_len = name.chars().count();
        if name_len < 1 {
            return Err(ContactError::NameRequired);
        }
        if name_len > MAX_NAME_CHARS {
            return Err(ContactError::NameTooLong);
        }

        let email = as_text(self.email.as_ref()).ok_or(ContactError::InvalidEmail)?;
        if !is_valid_email(email) {
            return Err(ContactError::InvalidEmail);
        }
        if email.chars().count() > MAX_EMAIL_CHARS {
            return Err(ContactError::EmailTooLong);
        }

        let message = as_text(self.message.as_ref()).ok_or(ContactError::MessageTooShort)?;
        let message_len = message.chars().count();
        if message_len < MIN_MESSAGE_CHARS {
            return Err(ContactError::MessageTooShort);
        }
        if message_len > MAX_MESSAGE_CHARS {
            return Err(ContactError::MessageTooLong);
        }

        Ok(ContactMessage {
            name: sanitize_html(name.trim()),
            email: sanitize_html(email.trim()),
            message: sanitize_html(message.trim()),
        })
    }
}

impl ContactMessage {
    /// Notification email for the site owner
    pub fn to_email(&self, config: &ContactConfig, sent_at: DateTime<Utc>) -> OutgoingEmail {
        let html = format!(
            r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto;">
  <h2 style="color: #333;">New Contact Form Message</h2>
  <div style="background: #f9f9f9; padding: 20px; border-radius: 8px; margin: 20px 0;">
    <p><strong>Name:</strong> {name}</p>
    <p><strong>Email:</strong> {email}</p>
  </div>
  <div style="background: #fff; padding: 20px; border: 1px solid #eee; border-radius: 8px;">
    <h3 style="color: #333;">Message:</h3>
    <p style="line-height: 1.6; color: #666; white-space: pre-wrap;">{message}</p>
  </div>
  <div style="margin-top: 20px; padding-top: 20px; border-top: 1px solid #eee; font-size: 12px; color: #999;">
    <p>Sent from the contact form on {sent}</p>
  </div>
</div>"#,
            name = self.name,
            email = self.email,
            message = self.message,
            sent = sent_at.format("%Y-%m-%d %H:%M UTC"),
        );

        OutgoingEmail {
            from: config.from.clone(),
            to: vec![config.to.clone()],
            subject: format!("New Contact Form Message from {}", self.name),
            html,
        }
    }
}
