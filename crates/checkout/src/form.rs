//! Checkout contact form.

use crate::error::ValidationError;

/// Minimum number of digits in a phone number, country code included.
pub const MIN_PHONE_DIGITS: usize = 8;

/// Buyer contact details entered on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub comments: String,
    /// Terms-and-conditions consent checkbox.
    pub agree: bool,
}

impl ContactForm {
    /// Checks the fields in display order and returns the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        if self.email.trim().is_empty() {
            return Err(ValidationError::MissingEmail);
        }
        if self.phone_digits().len() < MIN_PHONE_DIGITS {
            return Err(ValidationError::InvalidPhone);
        }
        if !self.agree {
            return Err(ValidationError::ConsentRequired);
        }
        Ok(())
    }

    /// Returns the phone number with every non-digit stripped.
    pub fn phone_digits(&self) -> String {
        self.phone.chars().filter(char::is_ascii_digit).collect()
    }

    /// Returns the phone number in E.164 form (`+` followed by digits).
    pub fn e164_phone(&self) -> String {
        format!("+{}", self.phone_digits())
    }

    /// Returns the trimmed, lower-cased email.
    pub fn normalized_email(&self) -> String {
        self.email.trim().to_lowercase()
    }
}
