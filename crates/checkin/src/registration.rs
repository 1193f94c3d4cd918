//! Registration records.
//!
//! [`PartialRegistration`] accumulates what an attendee has typed so far in the
//! current session; [`CompletedRegistration`] is the immutable record appended to
//! the registration collection once the signature is saved.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::validate::ContactForm;

/// Format of the completion timestamp, matching the es-ES `toLocaleString` shape.
pub const REGISTRATION_DATE_FORMAT: &str = "%-d/%-m/%Y, %-H:%M:%S";

/// A signature exported as a `data:image/png;base64,…` URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignatureImage(String);

impl SignatureImage {
    /// Data URL prefix for PNG images.
    pub const PNG_PREFIX: &'static str = "data:image/png;base64,";

    /// Wrap an already-encoded data URL.
    #[must_use]
    pub fn from_data_url(data_url: String) -> Self {
        Self(data_url)
    }

    /// The full data URL.
    #[must_use]
    pub fn as_data_url(&self) -> &str {
        &self.0
    }

    /// True when no image data is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.strip_prefix(Self::PNG_PREFIX).unwrap_or(&self.0).is_empty()
    }
}

/// Fields collected so far for the attendee in the current session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialRegistration {
    /// Full name from the pre-registration step.
    pub full_name: Option<String>,
    /// Company from the contact form.
    pub company: Option<String>,
    /// Document number from the contact form.
    pub document_number: Option<String>,
    /// Phone from the contact form; empty when not given.
    pub phone: String,
    /// Email from the contact form; empty when not given.
    pub email: String,
}

impl PartialRegistration {
    /// Start a session with the attendee's full name.
    #[must_use]
    pub fn with_full_name(full_name: impl Into<String>) -> Self {
        Self {
            full_name: Some(full_name.into()),
            ..Self::default()
        }
    }

    /// Merge an already-validated contact form into this registration.
    pub fn merge_contact(&mut self, form: ContactForm) {
        self.company = Some(form.company.trim().to_string());
        self.document_number = Some(form.document_number);
        self.phone = form.phone;
        self.email = form.email;
    }

    /// True when every required field is present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.full_name, &self.company, &self.document_number]
            .iter()
            .all(|field| field.as_deref().is_some_and(|v| !v.trim().is_empty()))
    }

    /// Build the immutable record, or `None` if a required field is missing.
    #[must_use]
    pub fn complete<Tz>(
        &self,
        signature: SignatureImage,
        completed_at: &DateTime<Tz>,
    ) -> Option<CompletedRegistration>
    where
        Tz: TimeZone,
        Tz::Offset: std::fmt::Display,
    {
        if !self.is_complete() {
            return None;
        }
        Some(CompletedRegistration {
            full_name: self.full_name.clone()?,
            company: self.company.clone()?,
            document_number: self.document_number.clone()?,
            phone: self.phone.clone(),
            email: self.email.clone(),
            signature,
            registration_date: completed_at.format(REGISTRATION_DATE_FORMAT).to_string(),
        })
    }
}

/// A finished registration.
///
/// Serialized with the field names the browser store has always used so that
/// persisted collections remain readable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletedRegistration {
    /// Attendee full name.
    pub full_name: String,
    /// Company.
    pub company: String,
    /// Document number.
    #[serde(rename = "dni")]
    pub document_number: String,
    /// Phone; may be empty.
    pub phone: String,
    /// Email; may be empty.
    pub email: String,
    /// Signature raster.
    #[serde(rename = "signatureDataUrl")]
    pub signature: SignatureImage,
    /// Localized completion timestamp.
    pub registration_date: String,
}

impl CompletedRegistration {
    /// Report row in column order.
    #[must_use]
    pub fn report_row(&self) -> [&str; 6] {
        [
            self.full_name.as_str(),
            self.company.as_str(),
            self.document_number.as_str(),
            self.phone.as_str(),
            self.email.as_str(),
            self.registration_date.as_str(),
        ]
    }
}
