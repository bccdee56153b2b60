//! # SortOfRemote NG – OATH Credential Templates
//!
//! Construction and validation of OATH HOTP/TOTP credential descriptors
//! before they are handed to a hardware key:
//!
//! - **otpauth:// URIs** – Parsing per the Google Authenticator Key URI format,
//!   with strict, ordered validation and typed errors
//! - **Explicit fields** – Building templates from already-decoded values
//! - **Device limits** – Issuer/account name length and `:` restrictions
//! - **Identifiers** – Canonical `[period/]issuer:account` keys for lookup and
//!   deduplication
//! - **Canonical URIs** – Re-serialising a template as a locator

pub mod oath;
