//! Request identifiers.
//!
//! Every request gets an opaque ID as early as possible; it only serves to
//! correlate log lines.

use std::fmt;

use uuid::Uuid;

/// Hex digits kept from a v4 UUID: 60 random bits plus the version nibble.
const REQUEST_ID_LEN: usize = 16;

/// Opaque per-request identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(REQUEST_ID_LEN);
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
