//! Attendee field validation.
//!
//! Pure functions over the values typed into the pre-registration and contact
//! forms. Every check reports into a [`ValidationErrors`] map keyed by
//! [`Field`]; a field with no entry is valid, and a step may only advance when
//! the map is empty.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ASCII classes on purpose: `\d` in the regex crate is Unicode-aware.
static DOCUMENT_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{7,8}$").expect("document number pattern is valid"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{8,15}$").expect("phone pattern is valid"));

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// A form field that can fail validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Attendee full name.
    FullName,
    /// Company the attendee represents.
    Company,
    /// National identity document number.
    #[serde(rename = "dni")]
    DocumentNumber,
    /// Mobile phone number.
    Phone,
    /// Email address.
    Email,
}

impl Field {
    /// Label shown next to the form input.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FullName => "Nombre y Apellido",
            Self::Company => "Empresa",
            Self::DocumentNumber => "DNI",
            Self::Phone => "Celular",
            Self::Email => "Email",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FullName => write!(f, "fullName"),
            Self::Company => write!(f, "company"),
            Self::DocumentNumber => write!(f, "dni"),
            Self::Phone => write!(f, "phone"),
            Self::Email => write!(f, "email"),
        }
    }
}

/// Why a single field was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A required field was left blank.
    #[error("{message}")]
    Required {
        /// Message shown under the input.
        message: &'static str,
    },

    /// A field does not have the expected shape.
    #[error("{message}")]
    Format {
        /// Message shown under the input.
        message: &'static str,
    },
}

impl FieldError {
    /// The user-facing message.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Required { message } | Self::Format { message } => *message,
        }
    }
}

/// Field-to-error mapping produced by a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, FieldError>);

impl ValidationErrors {
    /// Create an empty (passing) result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for a field, replacing any earlier one.
    pub fn insert(&mut self, field: Field, error: FieldError) {
        self.0.insert(field, error);
    }

    /// True when every field passed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The error recorded for `field`, if any.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&FieldError> {
        self.0.get(&field)
    }

    /// Iterate over failing fields in form order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldError)> {
        self.0.iter().map(|(field, error)| (*field, error))
    }

    /// Turn the mapping into a `Result`, `Ok` when nothing failed.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> std::result::Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (field, error)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// The values submitted on the contact form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    /// Company name (required).
    pub company: String,
    /// Document number, 7 or 8 ASCII digits (required).
    pub document_number: String,
    /// Mobile phone, 8 to 15 ASCII digits (optional).
    pub phone: String,
    /// Email address (optional).
    pub email: String,
}

/// Check the full name typed on the pre-registration form.
///
/// # Errors
///
/// Returns [`FieldError::Required`] when the name is blank after trimming.
pub fn validate_full_name(full_name: &str) -> std::result::Result<(), FieldError> {
    if full_name.trim().is_empty() {
        return Err(FieldError::Required {
            message: "Por favor, ingrese su nombre y apellido.",
        });
    }
    Ok(())
}

/// Check the company field.
///
/// # Errors
///
/// Returns [`FieldError::Required`] when the company is blank after trimming.
pub fn validate_company(company: &str) -> std::result::Result<(), FieldError> {
    if company.trim().is_empty() {
        return Err(FieldError::Required {
            message: "La empresa es requerida.",
        });
    }
    Ok(())
}

/// Check the document number: exactly 7 or 8 ASCII digits.
///
/// # Errors
///
/// Returns [`FieldError::Format`] for anything else, including blank input.
pub fn validate_document_number(document_number: &str) -> std::result::Result<(), FieldError> {
    if !DOCUMENT_NUMBER.is_match(document_number) {
        return Err(FieldError::Format {
            message: "DNI inválido (debe contener 7 u 8 dígitos).",
        });
    }
    Ok(())
}

/// Check the optional phone: blank, or 8 to 15 ASCII digits.
///
/// # Errors
///
/// Returns [`FieldError::Format`] for a non-blank value of the wrong shape.
pub fn validate_phone(phone: &str) -> std::result::Result<(), FieldError> {
    if !phone.is_empty() && !PHONE.is_match(phone) {
        return Err(FieldError::Format {
            message: "Número de celular inválido.",
        });
    }
    Ok(())
}

/// Check the optional email: blank, or `local@domain.tld`-shaped.
///
/// # Errors
///
/// Returns [`FieldError::Format`] for a non-blank value of the wrong shape.
pub fn validate_email(email: &str) -> std::result::Result<(), FieldError> {
    if !email.is_empty() && !EMAIL.is_match(email) {
        return Err(FieldError::Format {
            message: "Email inválido.",
        });
    }
    Ok(())
}

/// Validate every contact form field.
#[must_use]
pub fn validate_contact(form: &ContactForm) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    let checks = [
        (Field::Company, validate_company(&form.company)),
        (
            Field::DocumentNumber,
            validate_document_number(&form.document_number),
        ),
        (Field::Phone, validate_phone(&form.phone)),
        (Field::Email, validate_email(&form.email)),
    ];
    for (field, result) in checks {
        if let Err(error) = result {
            errors.insert(field, error);
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(company: &str, dni: &str, phone: &str, email: &str) -> ContactForm {
        ContactForm {
            company: company.to_string(),
            document_number: dni.to_string(),
            phone: phone.to_string(),
            email: email.to_string(),
        }
    }

    #[test]
    fn test_document_number_lengths() {
        assert!(validate_document_number("1234567").is_ok());
        assert!(validate_document_number("12345678").is_ok());
        assert!(validate_document_number("123456").is_err());
        assert!(validate_document_number("123456789").is_err());
        assert!(validate_document_number("12a4567").is_err());
    }

    #[test]
    fn test_document_number_rejects_non_ascii_digits() {
        // Arabic-Indic digits are Unicode decimal digits but not ASCII
        assert!(validate_document_number("١٢٣٤٥٦٧").is_err());
        assert!(validate_document_number(" 1234567").is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("").is_ok());
        assert!(validate_email("a@b").is_err());
        assert!(validate_email("ab.co").is_err());
        assert!(validate_email("a b@c.de").is_err());
        assert!(validate_email("a@@b.co").is_err());
    }

    #[test]
    fn test_phone_optional_and_length() {
        assert!(validate_phone("").is_ok());
        assert!(validate_phone("11223344").is_ok());
        assert!(validate_phone("123456789012345").is_ok());
        assert!(validate_phone("1234567").is_err());
        assert!(validate_phone("1234567890123456").is_err());
        assert!(validate_phone("+5491122334455").is_err());
    }

    #[test]
    fn test_company_required_after_trim() {
        assert!(validate_company("Acme").is_ok());
        assert!(matches!(
            validate_company("   "),
            Err(FieldError::Required { .. })
        ));
    }

    #[test]
    fn test_full_name_required() {
        assert!(validate_full_name("Ana Gómez").is_ok());
        let err = validate_full_name("\t ").unwrap_err();
        assert_eq!(err.message(), "Por favor, ingrese su nombre y apellido.");
    }

    #[test]
    fn test_validate_contact_passes() {
        let errors = validate_contact(&form("Acme", "12345678", "", ""));
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_validate_contact_collects_every_field() {
        let errors = validate_contact(&form("", "12", "12", "nope"));
        assert_eq!(errors.len(), 4);
        assert!(matches!(
            errors.get(Field::Company),
            Some(FieldError::Required { .. })
        ));
        assert!(matches!(
            errors.get(Field::DocumentNumber),
            Some(FieldError::Format { .. })
        ));
        assert!(errors.get(Field::Phone).is_some());
        assert!(errors.get(Field::Email).is_some());
    }

    #[test]
    fn test_validation_errors_display_in_form_order() {
        let errors = validate_contact(&form("", "1", "", ""));
        assert_eq!(
            errors.to_string(),
            "company: La empresa es requerida.; dni: DNI inválido (debe contener 7 u 8 dígitos)."
        );
    }

    #[test]
    fn test_field_serializes_with_record_names() {
        assert_eq!(
            serde_json::to_string(&Field::DocumentNumber).unwrap(),
            "\"dni\""
        );
        assert_eq!(serde_json::to_string(&Field::FullName).unwrap(), "\"fullName\"");
    }
}
