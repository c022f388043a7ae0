//! Identity newtypes for provider instances, providers and consumers

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new identifier
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the identifier as a string slice
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
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id! {
    /// Identity of one installed provider configuration.
    ///
    /// All tracking state is keyed by this value; two instances never share
    /// high-water-marks or tracked items.
    ProviderInstanceId
}

string_id! {
    /// The provider id carried in delivery pushes (the configured `id`)
    ProviderId
}

string_id! {
    /// A registered recipient of delivery batches
    ConsumerId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_as_str() {
        let id = ConsumerId::new("MMFD1");
        assert_eq!(id.as_str(), "MMFD1");
        assert_eq!(id.to_string(), "MMFD1");
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = ProviderInstanceId::from("module_3");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"module_3\"");

        let parsed: ProviderInstanceId = serde_json::from_str("\"module_3\"").unwrap();
        assert_eq!(parsed, id);
    }
}
