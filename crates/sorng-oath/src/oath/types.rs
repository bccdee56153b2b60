//! Core types for OATH credential templates.

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Algorithm
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Hash algorithm used for the credential's HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Algorithm {
    Sha1,
    Sha256,
    Sha512,
}

impl Default for Algorithm {
    fn default() -> Self {
        Self::Sha1
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri_name())
    }
}

impl Algorithm {
    /// Parse from a case-insensitive string.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SHA1" | "SHA-1" | "HMACSHA1" | "HMAC-SHA1" => Some(Self::Sha1),
            "SHA256" | "SHA-256" | "HMACSHA256" | "HMAC-SHA256" => Some(Self::Sha256),
            "SHA512" | "SHA-512" | "HMACSHA512" | "HMAC-SHA512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// URI-safe name for `otpauth://` parameters.
    pub fn uri_name(&self) -> &'static str {
        match self {
            Self::Sha1 => "SHA1",
            Self::Sha256 => "SHA256",
            Self::Sha512 => "SHA512",
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OTP type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Whether a credential is time-based or counter-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpType {
    Hotp,
    Totp,
}

impl fmt::Display for OtpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Totp => write!(f, "totp"),
            Self::Hotp => write!(f, "hotp"),
        }
    }
}

impl OtpType {
    /// Parse the type segment of a locator (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("totp") {
            Some(Self::Totp)
        } else if s.eq_ignore_ascii_case("hotp") {
            Some(Self::Hotp)
        } else {
            None
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Validation switches
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A validation step a caller may opt out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    /// Splitting the label into issuer and account name.
    Label,
    /// The `:` and name-length checks on the issuer.
    Issuer,
}

/// Set of validations to skip when building a template.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SkipValidation {
    label: bool,
    issuer: bool,
}

impl SkipValidation {
    pub const NONE: Self = Self {
        label: false,
        issuer: false,
    };
    pub const LABEL: Self = Self {
        label: true,
        issuer: false,
    };
    pub const ISSUER: Self = Self {
        label: false,
        issuer: true,
    };
    pub const ALL: Self = Self {
        label: true,
        issuer: true,
    };

    /// Returns `true` if `validation` is skipped.
    pub fn contains(self, validation: Validation) -> bool {
        match validation {
            Validation::Label => self.label,
            Validation::Issuer => self.issuer,
        }
    }

    /// Builder: also skip `validation`.
    pub fn with(mut self, validation: Validation) -> Self {
        match validation {
            Validation::Label => self.label = true,
            Validation::Issuer => self.issuer = true,
        }
        self
    }
}

impl From<Validation> for SkipValidation {
    fn from(validation: Validation) -> Self {
        Self::NONE.with(validation)
    }
}

impl FromIterator<Validation> for SkipValidation {
    fn from_iter<I: IntoIterator<Item = Validation>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, Self::with)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Error type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Error kind for this crate. One kind per validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OathErrorKind {
    InvalidScheme,
    InvalidType,
    InvalidLabel,
    InvalidAlgorithm,
    InvalidCounter,
    InvalidPeriod,
    InvalidDigits,
    MissingSecret,
    InvalidSecret,
    NameIssuerTooLong,
    IssuerContainsColon,
}

/// Crate-level error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OathError {
    pub kind: OathErrorKind,
    pub message: String,
    pub detail: Option<String>,
}

impl fmt::Display for OathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.kind, self.message)?;
        if let Some(d) = &self.detail {
            write!(f, " ({})", d)?;
        }
        Ok(())
    }
}

impl std::error::Error for OathError {}

impl OathError {
    pub fn new(kind: OathErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn kind(&self) -> OathErrorKind {
        self.kind
    }
}

impl From<OathError> for String {
    fn from(e: OathError) -> String {
        e.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Algorithm ────────────────────────────────────────────────

    #[test]
    fn algorithm_default_is_sha1() {
        assert_eq!(Algorithm::default(), Algorithm::Sha1);
    }

    #[test]
    fn algorithm_from_str_loose() {
        assert_eq!(Algorithm::from_str_loose("sha1"), Some(Algorithm::Sha1));
        assert_eq!(Algorithm::from_str_loose("SHA-256"), Some(Algorithm::Sha256));
        assert_eq!(Algorithm::from_str_loose("hmac-sha512"), Some(Algorithm::Sha512));
        assert_eq!(Algorithm::from_str_loose("MD5"), None);
        assert_eq!(Algorithm::from_str_loose(""), None);
    }

    #[test]
    fn algorithm_serde_uses_uri_names() {
        let json = serde_json::to_string(&Algorithm::Sha512).unwrap();
        assert_eq!(json, "\"SHA512\"");
        assert_eq!(Algorithm::Sha256.to_string(), "SHA256");
    }

    // ── OtpType ──────────────────────────────────────────────────

    #[test]
    fn otp_type_case_insensitive() {
        assert_eq!(OtpType::from_str_loose("TOTP"), Some(OtpType::Totp));
        assert_eq!(OtpType::from_str_loose("hOtP"), Some(OtpType::Hotp));
        assert_eq!(OtpType::from_str_loose("motp"), None);
    }

    #[test]
    fn otp_type_display() {
        assert_eq!(OtpType::Totp.to_string(), "totp");
        assert_eq!(OtpType::Hotp.to_string(), "hotp");
    }

    // ── SkipValidation ───────────────────────────────────────────

    #[test]
    fn skip_validation_sets() {
        assert!(!SkipValidation::NONE.contains(Validation::Label));
        assert!(!SkipValidation::NONE.contains(Validation::Issuer));
        assert!(SkipValidation::LABEL.contains(Validation::Label));
        assert!(!SkipValidation::LABEL.contains(Validation::Issuer));
        assert!(SkipValidation::ALL.contains(Validation::Issuer));

        let collected: SkipValidation = [Validation::Issuer, Validation::Label].into_iter().collect();
        assert_eq!(collected, SkipValidation::ALL);
        assert_eq!(SkipValidation::from(Validation::Issuer), SkipValidation::ISSUER);
    }

    // ── Error ────────────────────────────────────────────────────

    #[test]
    fn error_display() {
        let err = OathError::new(OathErrorKind::InvalidDigits, "bad digits").with_detail("9");
        let s = err.to_string();
        assert!(s.contains("InvalidDigits"));
        assert!(s.contains("bad digits"));
        assert!(s.contains("(9)"));
    }

    #[test]
    fn error_into_string() {
        let err = OathError::new(OathErrorKind::MissingSecret, "no secret");
        let s: String = err.into();
        assert!(s.starts_with("[MissingSecret]"));
    }
}
