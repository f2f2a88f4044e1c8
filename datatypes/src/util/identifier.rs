use uuid::Uuid;

/// A `u128` based identifier backed by a UUID
pub trait Identifier: Sized {
    /// Create a new, random id
    fn new() -> Self;

    /// Create an id from an existing UUID
    fn from_uuid(uuid: Uuid) -> Self;

    /// The underlying UUID
    fn uuid(&self) -> Uuid;
}

/// Creates a UUID newtype with serde support and the `Identifier` trait
#[macro_export]
macro_rules! identifier {
    ($id_name: ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        pub struct $id_name(pub uuid::Uuid);

        impl $crate::util::Identifier for $id_name {
            fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }

            fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            fn uuid(&self) -> uuid::Uuid {
                self.0
            }
        }

        impl std::fmt::Display for $id_name {
            fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $id_name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(uuid::Uuid::from_str(s)?))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    identifier!(TestId);

    #[test]
    fn display_and_parse() {
        let id = TestId::new();
        let parsed: TestId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn serde_round_trip() {
        let id = TestId::from_uuid(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
        let back: TestId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
