//! Grid send key and the credential derived from it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::fmt;

/// Pre-shared secret trusted by every region host in the grid.
#[derive(Clone)]
pub struct GridSendKey(String);

impl GridSendKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `authorization` header value sent on every outbound peer call.
    pub fn authorization(&self) -> String {
        generate_authorization(&self.0)
    }

    /// Check a presented `authorization` header value.
    pub fn verify(&self, presented: &str) -> bool {
        credentials_match(presented, &self.authorization())
    }
}

// Keep the secret out of logs.
impl fmt::Debug for GridSendKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GridSendKey(***)")
    }
}

/// `Basic base64(key:key)`.
pub fn generate_authorization(key: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{key}:{key}")))
}

/// Compare a presented credential with the expected one.
///
/// The scan runs over the longer of the two with no early exit, so a short
/// guess costs the same as a near miss. A length mismatch alone fails.
pub fn credentials_match(presented: &str, expected: &str) -> bool {
    use subtle::{Choice, ConstantTimeEq};

    let (presented, expected) = (presented.as_bytes(), expected.as_bytes());
    let span = presented.len().max(expected.len());

    let mut same: Choice = presented.len().ct_eq(&expected.len());
    for i in 0..span {
        let a = presented.get(i).copied().unwrap_or(0);
        let b = expected.get(i).copied().unwrap_or(0);
        same &= a.ct_eq(&b);
    }
    same.into()
}
