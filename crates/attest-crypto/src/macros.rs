// Serde helpers for fixed-size byte newtypes
//
// Values serialize as lowercase hex strings; bincode sees a plain
// length-prefixed string.

/// Implement hex `Serialize`/`Deserialize` for a newtype exposing
/// `as_bytes()` and `from_slice()`.
macro_rules! impl_hex_serde {
    ($ty:ty) => {
        impl serde::Serialize for $ty {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.as_bytes()))
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let text = <String as serde::Deserialize>::deserialize(deserializer)?;
                let bytes = hex::decode(&text).map_err(serde::de::Error::custom)?;
                <$ty>::from_slice(&bytes).map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_hex_serde;
