//! Contact form handling.
//!
//! This module provides:
//! - `ContactForm`: the raw submission and its validation into a `ContactMessage`
//! - `Mailer`: delivery seam, with `ResendMailer` for the hosted mail API

pub mod form;
pub mod mailer;

pub use form::{sanitize_html, ContactError, ContactForm, ContactMessage};
pub use mailer::{MailError, Mailer, OutgoingEmail, ResendMailer};
