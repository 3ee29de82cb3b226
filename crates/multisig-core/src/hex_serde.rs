//! Serde helpers for fixed-size byte types
//!
//! Human-readable formats (JSON, TOML) see lowercase hex; binary formats see
//! the raw 32-byte array so tokens stay compact.

/// Implement `Serialize`/`Deserialize` for a `[u8; 32]` newtype
macro_rules! impl_bytes32_serde {
    ($ty:ident) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&hex::encode(self.0))
                } else {
                    serde::Serialize::serialize(&self.0, serializer)
                }
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                if deserializer.is_human_readable() {
                    let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                    let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
                    let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
                        serde::de::Error::invalid_length(b.len(), &"32 bytes")
                    })?;
                    Ok(Self(bytes))
                } else {
                    Ok(Self(<[u8; 32] as serde::Deserialize>::deserialize(
                        deserializer,
                    )?))
                }
            }
        }
    };
}

pub(crate) use impl_bytes32_serde;

/// Serialize a list of entries as hex strings
pub fn entries_as_hex<S: serde::Serializer>(
    entries: &[Vec<u8>],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(entries.iter().map(hex::encode))
}
