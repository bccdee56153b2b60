//! Hand-off to the device side.
//!
//! Templates never talk to a key. Provisioning code receives a
//! [`ProvisionRequest`] and pushes it through whatever implements
//! [`OathConnection`]; opening and closing that connection is the caller's
//! business and may fail independently of template construction.

use serde::{Deserialize, Serialize};

use crate::oath::template::{CredentialId, CredentialIdentifier, CredentialTemplate};
use crate::oath::types::*;

/// Lifecycle of a smart-card session. Transitions are driven by the
/// transport (attach/detach), not by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No commands can be sent to the key.
    Closed,
    /// Ready for commands, one at a time.
    Open,
}

impl Default for ConnectionState {
    fn default() -> Self {
        Self::Closed
    }
}

/// The value that advances between codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovingFactor {
    /// TOTP time step, in seconds.
    Period(u32),
    /// HOTP initial counter.
    Counter(u32),
}

/// Everything a key needs to store one credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionRequest<'a> {
    pub id: CredentialId,
    pub algorithm: Algorithm,
    pub digits: u8,
    pub moving_factor: MovingFactor,
    pub secret: &'a [u8],
}

impl<'a> From<&'a CredentialTemplate> for ProvisionRequest<'a> {
    fn from(t: &'a CredentialTemplate) -> Self {
        Self {
            id: t.identifier(),
            algorithm: t.algorithm(),
            digits: t.digits(),
            moving_factor: moving_factor(t),
            secret: t.secret(),
        }
    }
}

impl ProvisionRequest<'_> {
    /// Name under which the key stores the credential.
    pub fn name(&self) -> String {
        self.id.key()
    }
}

/// Period for TOTP templates, counter for HOTP templates.
pub fn moving_factor(t: &CredentialTemplate) -> MovingFactor {
    match t.otp_type() {
        OtpType::Totp => MovingFactor::Period(t.period()),
        OtpType::Hotp => MovingFactor::Counter(t.counter()),
    }
}

/// A half-duplex session to a key's OATH application.
pub trait OathConnection {
    type Error;

    fn state(&self) -> ConnectionState;

    /// Store a credential, replacing any with the same name.
    fn put_credential(&mut self, request: ProvisionRequest<'_>) -> Result<(), Self::Error>;

    fn put_template(&mut self, template: &CredentialTemplate) -> Result<(), Self::Error> {
        self.put_credential(ProvisionRequest::from(template))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oath::uri::parse;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq)]
    enum MockError {
        Closed,
    }

    #[derive(Default)]
    struct MockKey {
        state: ConnectionState,
        slots: HashMap<String, (Algorithm, u8, MovingFactor, Vec<u8>)>,
    }

    impl OathConnection for MockKey {
        type Error = MockError;

        fn state(&self) -> ConnectionState {
            self.state
        }

        fn put_credential(&mut self, request: ProvisionRequest<'_>) -> Result<(), MockError> {
            if self.state == ConnectionState::Closed {
                return Err(MockError::Closed);
            }
            self.slots.insert(
                request.name(),
                (
                    request.algorithm,
                    request.digits,
                    request.moving_factor,
                    request.secret.to_vec(),
                ),
            );
            Ok(())
        }
    }

    #[test]
    fn request_from_totp() {
        let t = parse("otpauth://totp/Acme:bob?secret=JBSWY3DPEHPK3PXP&period=60&digits=8").unwrap();
        let req = ProvisionRequest::from(&t);
        assert_eq!(req.name(), "60/Acme:bob");
        assert_eq!(req.moving_factor, MovingFactor::Period(60));
        assert_eq!(req.digits, 8);
        assert_eq!(req.secret, t.secret());
    }

    #[test]
    fn request_from_hotp() {
        let t = parse("otpauth://hotp/bob?secret=JBSWY3DPEHPK3PXP&counter=9").unwrap();
        assert_eq!(moving_factor(&t), MovingFactor::Counter(9));
    }

    #[test]
    fn closed_connection_refuses() {
        let t = parse("otpauth://totp/bob?secret=JBSWY3DPEHPK3PXP").unwrap();
        let mut key = MockKey::default();
        assert_eq!(key.state(), ConnectionState::Closed);
        assert_eq!(key.put_template(&t), Err(MockError::Closed));
    }

    #[test]
    fn same_identifier_replaces_slot() {
        let mut key = MockKey {
            state: ConnectionState::Open,
            ..Default::default()
        };
        let a = parse("otpauth://totp/Acme:bob?secret=JBSWY3DPEHPK3PXP").unwrap();
        let b = parse("otpauth://totp/bob?secret=GEZDGNBV&issuer=Acme&digits=7").unwrap();
        key.put_template(&a).unwrap();
        key.put_template(&b).unwrap();
        assert_eq!(key.slots.len(), 1);
        assert_eq!(key.slots["Acme:bob"].1, 7);
    }
}
