//! Newtype wrappers over `Uuid` for each aggregate's business identifier.
//!
//! Kept distinct (rather than passing raw `Uuid` everywhere) so the compiler
//! rejects passing a `RouteId` where an `OrderId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

id_type!(OrderId);
id_type!(WaveId);
id_type!(PathId);
id_type!(TemplateId);
id_type!(RouteId);
id_type!(StationId);
id_type!(TaskId);
id_type!(WorkerId);
id_type!(ConsolidationId);
id_type!(ShipmentId);
id_type!(ManifestId);
id_type!(AllocationId);
