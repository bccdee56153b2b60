//! Immutable OATH credential templates and their canonical identifiers.
//!
//! [`CredentialTemplate::build`] is the single place where field rules live;
//! the locator parser in [`crate::oath::uri`] and the convenience
//! constructors below all end up there.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::oath::config::{TemplateConfig, DEFAULT_COUNTER, DEFAULT_DIGITS, DEFAULT_PERIOD};
use crate::oath::secret;
use crate::oath::types::*;
use crate::oath::uri;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Explicit fields
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Already-decoded credential fields, prior to validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateFields {
    pub otp_type: OtpType,
    pub algorithm: Algorithm,
    /// Raw key bytes (not base-32).
    pub secret: Vec<u8>,
    pub issuer: Option<String>,
    pub account_name: String,
    pub digits: u8,
    /// Ignored for HOTP.
    pub period: u32,
    /// Ignored for TOTP.
    pub counter: u32,
}

impl TemplateFields {
    /// Fields with the documented defaults: SHA1, 6 digits, 30 s, counter 0.
    pub fn new(otp_type: OtpType, secret: impl Into<Vec<u8>>, account_name: impl Into<String>) -> Self {
        Self {
            otp_type,
            algorithm: Algorithm::default(),
            secret: secret.into(),
            issuer: None,
            account_name: account_name.into(),
            digits: DEFAULT_DIGITS,
            period: DEFAULT_PERIOD,
            counter: DEFAULT_COUNTER,
        }
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_digits(mut self, digits: u8) -> Self {
        self.digits = digits;
        self
    }

    pub fn with_period(mut self, period: u32) -> Self {
        self.period = period;
        self
    }

    pub fn with_counter(mut self, counter: u32) -> Self {
        self.counter = counter;
        self
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Template
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A validated OATH credential, ready for code generation or provisioning.
///
/// Fields are private and there are no setters; every value that exists has
/// passed [`CredentialTemplate::build`]. Deserialising goes through the same
/// path, with the issuer rules skipped since they are caller-optional.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "TemplateRecord", try_from = "TemplateRecord")]
pub struct CredentialTemplate {
    otp_type: OtpType,
    algorithm: Algorithm,
    secret: Vec<u8>,
    issuer: Option<String>,
    account_name: String,
    digits: u8,
    period: u32,
    counter: u32,
}

impl CredentialTemplate {
    /// Validate `fields` and build a template.
    ///
    /// Checks run in a fixed order and the first failure is returned:
    /// account name, period (TOTP), secret, digits, then the issuer rules
    /// unless [`Validation::Issuer`] is skipped. Issuer and account name are
    /// trimmed, and an empty issuer is stored as no issuer.
    pub fn build(
        fields: TemplateFields,
        skip: SkipValidation,
        config: &TemplateConfig,
    ) -> Result<Self, OathError> {
        let TemplateFields {
            otp_type,
            algorithm,
            secret,
            issuer,
            account_name,
            digits,
            period,
            counter,
        } = fields;
        let issuer = issuer
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty());
        let account_name = account_name.trim().to_string();

        check_account_name(&account_name)?;
        if otp_type == OtpType::Totp {
            check_period(period)?;
        }
        if secret.is_empty() {
            return Err(reject(OathErrorKind::InvalidSecret, "Secret is empty"));
        }
        check_digits(digits)?;
        if !skip.contains(Validation::Issuer) {
            check_issuer(issuer.as_deref(), &account_name, config)?;
        }

        let template = Self {
            otp_type,
            algorithm,
            secret,
            issuer,
            account_name,
            digits,
            period: if otp_type == OtpType::Totp { period } else { 0 },
            counter: if otp_type == OtpType::Hotp { counter } else { 0 },
        };
        log::trace!("built {} credential template {}", template.otp_type, template.key());
        Ok(template)
    }

    /// TOTP template with explicit digits and period.
    pub fn totp(
        algorithm: Algorithm,
        secret: impl Into<Vec<u8>>,
        issuer: Option<&str>,
        account_name: &str,
        digits: u8,
        period: u32,
    ) -> Result<Self, OathError> {
        let mut fields = TemplateFields::new(OtpType::Totp, secret, account_name)
            .with_algorithm(algorithm)
            .with_digits(digits)
            .with_period(period);
        fields.issuer = issuer.map(str::to_string);
        Self::build(fields, SkipValidation::NONE, &TemplateConfig::default())
    }

    /// HOTP template with explicit digits and initial counter.
    pub fn hotp(
        algorithm: Algorithm,
        secret: impl Into<Vec<u8>>,
        issuer: Option<&str>,
        account_name: &str,
        digits: u8,
        counter: u32,
    ) -> Result<Self, OathError> {
        let mut fields = TemplateFields::new(OtpType::Hotp, secret, account_name)
            .with_algorithm(algorithm)
            .with_digits(digits)
            .with_counter(counter);
        fields.issuer = issuer.map(str::to_string);
        Self::build(fields, SkipValidation::NONE, &TemplateConfig::default())
    }

    /// TOTP template with 6 digits and a 30 second period.
    pub fn totp_default(
        algorithm: Algorithm,
        secret: impl Into<Vec<u8>>,
        issuer: Option<&str>,
        account_name: &str,
    ) -> Result<Self, OathError> {
        Self::totp(algorithm, secret, issuer, account_name, DEFAULT_DIGITS, DEFAULT_PERIOD)
    }

    /// HOTP template with 6 digits starting at counter 0.
    pub fn hotp_default(
        algorithm: Algorithm,
        secret: impl Into<Vec<u8>>,
        issuer: Option<&str>,
        account_name: &str,
    ) -> Result<Self, OathError> {
        Self::hotp(algorithm, secret, issuer, account_name, DEFAULT_DIGITS, DEFAULT_COUNTER)
    }

    /// Parse an `otpauth://` locator with every validation enabled.
    pub fn from_uri(locator: &str) -> Result<Self, OathError> {
        uri::parse(locator)
    }

    pub fn from_uri_with(
        locator: &str,
        skip: SkipValidation,
        config: &TemplateConfig,
    ) -> Result<Self, OathError> {
        uri::parse_with(locator, skip, config)
    }

    /// Like [`Self::from_uri`], but drops the error.
    pub fn from_uri_lossy(locator: &str) -> Option<Self> {
        uri::parse_lossy(locator)
    }

    /// Canonical `otpauth://` locator for this template.
    pub fn to_uri(&self) -> String {
        uri::to_uri(self)
    }

    pub fn otp_type(&self) -> OtpType {
        self.otp_type
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Raw key bytes.
    pub fn secret(&self) -> &[u8] {
        &self.secret
    }

    pub fn issuer(&self) -> Option<&str> {
        self.issuer.as_deref()
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn digits(&self) -> u8 {
        self.digits
    }

    /// Period in seconds; 0 for HOTP.
    pub fn period(&self) -> u32 {
        self.period
    }

    /// Initial counter; 0 for TOTP.
    pub fn counter(&self) -> u32 {
        self.counter
    }

    /// `issuer:account`, or just the account name without an issuer.
    pub fn name(&self) -> String {
        stored_name(self.issuer.as_deref(), &self.account_name)
    }
}

impl fmt::Debug for CredentialTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialTemplate")
            .field("otp_type", &self.otp_type)
            .field("algorithm", &self.algorithm)
            .field("secret", &format_args!("<{} bytes>", self.secret.len()))
            .field("issuer", &self.issuer)
            .field("account_name", &self.account_name)
            .field("digits", &self.digits)
            .field("period", &self.period)
            .field("counter", &self.counter)
            .finish()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Serialised form
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Flat record with a base-32 secret, as persisted by callers.
#[derive(Serialize, Deserialize)]
struct TemplateRecord {
    otp_type: OtpType,
    algorithm: Algorithm,
    secret: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    issuer: Option<String>,
    account_name: String,
    digits: u8,
    #[serde(default)]
    period: u32,
    #[serde(default)]
    counter: u32,
}

impl From<CredentialTemplate> for TemplateRecord {
    fn from(t: CredentialTemplate) -> Self {
        Self {
            otp_type: t.otp_type,
            algorithm: t.algorithm,
            secret: secret::encode(&t.secret),
            issuer: t.issuer,
            account_name: t.account_name,
            digits: t.digits,
            period: t.period,
            counter: t.counter,
        }
    }
}

impl TryFrom<TemplateRecord> for CredentialTemplate {
    type Error = OathError;

    fn try_from(r: TemplateRecord) -> Result<Self, Self::Error> {
        let key = secret::decode(&r.secret)
            .ok_or_else(|| reject(OathErrorKind::InvalidSecret, "Secret is not valid base-32"))?;
        let fields = TemplateFields {
            otp_type: r.otp_type,
            algorithm: r.algorithm,
            secret: key,
            issuer: r.issuer,
            account_name: r.account_name,
            digits: r.digits,
            period: r.period,
            counter: r.counter,
        };
        Self::build(fields, SkipValidation::ISSUER, &TemplateConfig::default())
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Identifier
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Canonical lookup key for a credential.
///
/// Equal for any two credentials that share type, issuer, account name and
/// (for TOTP) period, however they were constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CredentialId {
    pub otp_type: OtpType,
    /// `Some` for TOTP, `None` for HOTP.
    pub period: Option<u32>,
    pub issuer: Option<String>,
    pub account_name: String,
}

impl CredentialId {
    /// Device-storage name: `[period/][issuer:]account`. The period prefix
    /// only appears for TOTP credentials with a non-default period.
    ///
    /// HOTP and TOTP credentials with the same issuer and account share a
    /// key, as they would share a slot on the key.
    pub fn key(&self) -> String {
        let name = stored_name(self.issuer.as_deref(), &self.account_name);
        match self.period {
            Some(p) if p != DEFAULT_PERIOD => format!("{}/{}", p, name),
            _ => name,
        }
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// Anything that can be reduced to a [`CredentialId`].
pub trait CredentialIdentifier {
    fn identifier(&self) -> CredentialId;

    fn key(&self) -> String {
        self.identifier().key()
    }
}

impl CredentialIdentifier for CredentialTemplate {
    fn identifier(&self) -> CredentialId {
        CredentialId {
            otp_type: self.otp_type,
            period: (self.otp_type == OtpType::Totp).then_some(self.period),
            issuer: self.issuer.clone(),
            account_name: self.account_name.clone(),
        }
    }
}

impl CredentialIdentifier for CredentialId {
    fn identifier(&self) -> CredentialId {
        self.clone()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Field rules (shared with the locator parser)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Build an error and log the rejection. Never logs secret material.
pub(crate) fn reject(kind: OathErrorKind, msg: impl Into<String>) -> OathError {
    let err = OathError::new(kind, msg);
    log::debug!("rejecting credential template: {}", err);
    err
}

pub(crate) fn check_account_name(account_name: &str) -> Result<(), OathError> {
    if account_name.is_empty() {
        return Err(reject(OathErrorKind::InvalidLabel, "Account name is empty"));
    }
    Ok(())
}

pub(crate) fn check_period(period: u32) -> Result<(), OathError> {
    if period == 0 {
        return Err(reject(OathErrorKind::InvalidPeriod, "Period must be positive"));
    }
    Ok(())
}

pub(crate) fn check_digits(digits: u8) -> Result<(), OathError> {
    if !matches!(digits, 6..=8) {
        return Err(reject(OathErrorKind::InvalidDigits, "Digits must be 6, 7 or 8")
            .with_detail(digits.to_string()));
    }
    Ok(())
}

fn check_issuer(
    issuer: Option<&str>,
    account_name: &str,
    config: &TemplateConfig,
) -> Result<(), OathError> {
    if issuer.is_some_and(|i| i.contains(':')) {
        return Err(reject(
            OathErrorKind::IssuerContainsColon,
            "Issuer must not contain ':'",
        ));
    }
    let len = stored_name(issuer, account_name).len();
    if len > config.max_name_length {
        return Err(reject(
            OathErrorKind::NameIssuerTooLong,
            format!("Issuer and account name exceed {} bytes", config.max_name_length),
        )
        .with_detail(format!("{} bytes", len)));
    }
    Ok(())
}

fn stored_name(issuer: Option<&str>, account_name: &str) -> String {
    match issuer {
        Some(iss) if !iss.is_empty() => format!("{}:{}", iss, account_name),
        _ => account_name.to_string(),
    }
}
