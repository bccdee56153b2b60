//! `otpauth://` locator parsing and generation per the Google Authenticator
//! key-URI format:
//! <https://github.com/google/google-authenticator/wiki/Key-Uri-Format>
//!
//! Format: `otpauth://TYPE/[ISSUER:]ACCOUNT?secret=BASE32&issuer=ISSUER&algorithm=SHA1&digits=6&period=30`
//!
//! Checks run in a fixed order and the first failure is returned: scheme,
//! type, label, algorithm, counter/period, secret, digits, issuer.

use std::borrow::Cow;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::oath::config::{TemplateConfig, DEFAULT_COUNTER, DEFAULT_DIGITS, DEFAULT_PERIOD};
use crate::oath::secret;
use crate::oath::template::{
    check_account_name, check_digits, check_period, reject, CredentialTemplate, TemplateFields,
};
use crate::oath::types::*;

pub const SCHEME: &str = "otpauth";

/// Everything except RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Parse
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parse an `otpauth://` locator with every validation enabled and the
/// default limits.
pub fn parse(locator: &str) -> Result<CredentialTemplate, OathError> {
    parse_with(locator, SkipValidation::NONE, &TemplateConfig::default())
}

/// Parse an `otpauth://` locator.
///
/// With [`Validation::Label`] skipped the label is not split: all of it
/// becomes the account name and the issuer comes only from the `issuer`
/// parameter. Otherwise a `ISSUER:` label prefix supplies the issuer when no
/// `issuer` parameter is present; the parameter always wins.
pub fn parse_with(
    locator: &str,
    skip: SkipValidation,
    config: &TemplateConfig,
) -> Result<CredentialTemplate, OathError> {
    let url = url::Url::parse(locator.trim()).map_err(|e| {
        reject(OathErrorKind::InvalidScheme, "Locator is not a valid URI").with_detail(e.to_string())
    })?;

    if url.scheme() != SCHEME {
        return Err(reject(
            OathErrorKind::InvalidScheme,
            format!("Expected scheme '{}', got '{}'", SCHEME, url.scheme()),
        ));
    }

    let otp_type = url
        .host_str()
        .and_then(OtpType::from_str_loose)
        .ok_or_else(|| {
            reject(OathErrorKind::InvalidType, "Unknown OTP type")
                .with_detail(url.host_str().unwrap_or_default().to_string())
        })?;

    // Path is "/LABEL" or "/ISSUER:LABEL"
    let path = url.path();
    let path = path.strip_prefix('/').unwrap_or(path);
    let label = percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| reject(OathErrorKind::InvalidLabel, "Label is not valid UTF-8"))?;
    if label.is_empty() {
        return Err(reject(OathErrorKind::InvalidLabel, "Label is empty"));
    }
    let (label_issuer, account_name) = if skip.contains(Validation::Label) {
        (None, label.trim())
    } else {
        split_label(&label)
    };
    check_account_name(account_name)?;

    let params: Vec<(Cow<'_, str>, Cow<'_, str>)> = url.query_pairs().collect();
    let param = |name: &str| {
        params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| &**v)
    };

    let algorithm = match param("algorithm") {
        Some(raw) => Algorithm::from_str_loose(raw).ok_or_else(|| {
            reject(OathErrorKind::InvalidAlgorithm, "Unsupported algorithm").with_detail(raw)
        })?,
        None => Algorithm::default(),
    };

    let (period, counter) = match otp_type {
        OtpType::Hotp => {
            let counter = match param("counter") {
                Some(raw) => parse_decimal::<u32>(raw).ok_or_else(|| {
                    reject(OathErrorKind::InvalidCounter, "Counter must be a 32-bit unsigned integer")
                        .with_detail(raw)
                })?,
                None => DEFAULT_COUNTER,
            };
            (DEFAULT_PERIOD, counter)
        }
        OtpType::Totp => {
            let period = match param("period") {
                Some(raw) => {
                    let period = parse_decimal::<u32>(raw).ok_or_else(|| {
                        reject(OathErrorKind::InvalidPeriod, "Period must be a positive integer")
                            .with_detail(raw)
                    })?;
                    check_period(period)?;
                    period
                }
                None => DEFAULT_PERIOD,
            };
            (period, DEFAULT_COUNTER)
        }
    };

    let raw_secret = param("secret")
        .ok_or_else(|| reject(OathErrorKind::MissingSecret, "Missing 'secret' parameter"))?;
    let key = secret::decode(raw_secret)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| reject(OathErrorKind::InvalidSecret, "Secret is not valid base-32"))?;

    let digits = match param("digits") {
        Some(raw) => {
            let digits = parse_decimal::<u8>(raw).ok_or_else(|| {
                reject(OathErrorKind::InvalidDigits, "Digits must be 6, 7 or 8").with_detail(raw)
            })?;
            check_digits(digits)?;
            digits
        }
        None => DEFAULT_DIGITS,
    };

    let issuer = param("issuer")
        .filter(|i| !i.is_empty())
        .or(label_issuer)
        .map(str::to_string);

    let fields = TemplateFields {
        otp_type,
        algorithm,
        secret: key,
        issuer,
        account_name: account_name.to_string(),
        digits,
        period,
        counter,
    };
    CredentialTemplate::build(fields, skip, config)
}

/// Parse a locator, collapsing any failure to `None`.
pub fn parse_lossy(locator: &str) -> Option<CredentialTemplate> {
    parse(locator).ok()
}

/// Parse multiple locators (one per line), skipping blanks and comments.
pub fn parse_many(text: &str) -> Vec<Result<CredentialTemplate, OathError>> {
    text.lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(parse)
        .collect()
}

/// Split `ISSUER:ACCOUNT` at the first colon. Both parts are trimmed and an
/// empty issuer prefix counts as no issuer.
fn split_label(label: &str) -> (Option<&str>, &str) {
    match label.split_once(':') {
        Some((issuer, account)) => {
            let issuer = issuer.trim();
            ((!issuer.is_empty()).then_some(issuer), account.trim())
        }
        None => (None, label.trim()),
    }
}

/// Plain decimal only: no sign, no whitespace.
fn parse_decimal<T: std::str::FromStr>(raw: &str) -> Option<T> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse().ok()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Generate
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Canonical `otpauth://` locator for a template. Defaults (SHA1, 6 digits,
/// 30 s) are omitted; HOTP always carries its counter.
pub fn to_uri(template: &CredentialTemplate) -> String {
    let account = encode(template.account_name());
    let path = match template.issuer() {
        Some(iss) => format!("{}:{}", encode(iss), account),
        // Keep a colon in the account from being read back as an issuer.
        None if template.account_name().contains(':') => format!(":{}", account),
        None => account,
    };

    let mut params = vec![format!("secret={}", secret::encode(template.secret()))];

    if let Some(iss) = template.issuer() {
        params.push(format!("issuer={}", encode(iss)));
    }

    if template.algorithm() != Algorithm::Sha1 {
        params.push(format!("algorithm={}", template.algorithm().uri_name()));
    }

    if template.digits() != DEFAULT_DIGITS {
        params.push(format!("digits={}", template.digits()));
    }

    match template.otp_type() {
        OtpType::Totp if template.period() != DEFAULT_PERIOD => {
            params.push(format!("period={}", template.period()));
        }
        OtpType::Hotp => params.push(format!("counter={}", template.counter())),
        OtpType::Totp => {}
    }

    format!(
        "{}://{}/{}?{}",
        SCHEME,
        template.otp_type(),
        path,
        params.join("&")
    )
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}
