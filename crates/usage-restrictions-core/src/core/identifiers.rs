// crates/usage-restrictions-core/src/core/identifiers.rs
// ============================================================================
// Module: Usage Restrictions Identifiers
// Description: Opaque identifiers for accounts, applications, and environments.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Identifiers are opaque strings issued by the surrounding platform. They
//! serialize transparently so persisted documents keep their plain string
//! form. Ordering is lexical, which keeps restriction sets deterministic.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sentinel application identifier for account-global entities.
///
/// Requests naming this application are evaluated as account-level requests.
pub const GLOBAL_APP_ID: &str = "__GLOBAL_APP_ID__";

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

/// Declares an opaque string identifier newtype.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        ///
        /// # Invariants
        /// - Opaque UTF-8 string; no normalization or validation is applied by this type.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_identifier!(
    /// Account identifier owning applications, environments, and entities.
    AccountId
);

string_identifier!(
    /// Application identifier within an account.
    AppId
);

string_identifier!(
    /// Environment identifier. Unique across applications of an account.
    EnvId
);

string_identifier!(
    /// Service identifier within an application.
    ServiceId
);

impl AppId {
    /// Returns the account-global application sentinel.
    #[must_use]
    pub fn global() -> Self {
        Self::new(GLOBAL_APP_ID)
    }

    /// Returns true when this identifier is the account-global sentinel.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_APP_ID
    }
}
