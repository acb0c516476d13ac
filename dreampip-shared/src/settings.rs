/// Typed per-user settings
///
/// Settings are persisted as a JSON document on the user row. They are decoded
/// and validated here, once, when crossing the storage boundary; the rest of
/// the code works with `UserSettings` and its accessors and never pokes at raw
/// JSON.
///
/// Reading is lenient: a stored document that fails to decode or validate is
/// logged and replaced with defaults so a bad row never breaks a request.
/// Writing is strict: `to_stored` refuses settings that do not validate.
///
/// # Example
///
/// ```
/// use dreampip_shared::settings::{Theme, UserSettings};
/// use serde_json::json;
///
/// let settings = UserSettings::from_stored(json!({ "locale": "fr", "monthly_budget": 1200.0 }));
/// assert_eq!(settings.locale(), "fr");
/// assert_eq!(settings.theme(), Theme::System);
/// assert_eq!(settings.allocated_amount(25.0), Some(300.0));
/// ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::warn;
use validator::{Validate, ValidationError};

pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_CURRENCY: &str = "USD";

/// UI colour scheme
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

/// Settings document stored on each user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UserSettings {
    /// BCP 47 language tag, e.g. "en" or "pt-BR"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, max = 35, message = "Locale must be 2-35 characters"))]
    pub locale: Option<String>,

    /// IANA timezone name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 64, message = "Timezone must be 1-64 characters"))]
    pub timezone: Option<String>,

    /// ISO 4217 currency code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_currency"))]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,

    /// Notional budget amount the percentages are shares of
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Monthly budget cannot be negative"))]
    pub monthly_budget: Option<f64>,
}

fn validate_currency(code: &str) -> Result<(), ValidationError> {
    if code.len() == 3 && code.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("currency");
        err.message = Some("Currency must be a 3-letter uppercase ISO code".into());
        Err(err)
    }
}

impl UserSettings {
    /// Decodes a stored settings document, falling back to defaults
    pub fn from_stored(value: JsonValue) -> Self {
        if value.is_null() {
            return Self::default();
        }

        let settings: Self = match serde_json::from_value(value) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Stored user settings could not be decoded, using defaults");
                return Self::default();
            }
        };

        if let Err(e) = settings.validate() {
            warn!(error = %e, "Stored user settings failed validation, using defaults");
            return Self::default();
        }

        settings
    }

    /// Validates and encodes settings for storage
    pub fn to_stored(&self) -> Result<JsonValue, SettingsError> {
        self.validate()
            .map_err(|e| SettingsError::Invalid(e.to_string()))?;
        serde_json::to_value(self).map_err(|e| SettingsError::Encode(e.to_string()))
    }

    pub fn locale(&self) -> &str {
        self.locale.as_deref().unwrap_or(DEFAULT_LOCALE)
    }

    pub fn timezone(&self) -> &str {
        self.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE)
    }

    pub fn currency(&self) -> &str {
        self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
    }

    pub fn theme(&self) -> Theme {
        self.theme.unwrap_or_default()
    }

    /// Amount a percentage share represents, if a budget amount is set
    pub fn allocated_amount(&self, budget_percentage: f64) -> Option<f64> {
        self.monthly_budget
            .map(|budget| budget * budget_percentage / 100.0)
    }
}

/// Settings could not be written
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("Invalid settings: {0}")]
    Invalid(String),

    #[error("Settings could not be encoded: {0}")]
    Encode(String),
}
