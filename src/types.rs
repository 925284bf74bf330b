//! Scalar leaf kinds and values.
//!
//! These are the only things the underlying engine knows how to mutate and
//! replay. Every structured argument eventually decomposes into a tuple of
//! `ScalarValue`s whose kinds line up with a signature of `ScalarType`s.

/// The kind of a primitive leaf.
///
/// The tag values are stable and may be used to pick a kind from raw bytes
/// (see `TryFrom<u8>`).
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum ScalarType {
    Bool = 0,
    I8 = 1,
    I16 = 2,
    I32 = 3,
    I64 = 4,
    U8 = 5,
    U16 = 6,
    U32 = 7,
    U64 = 8,
    F32 = 9,
    F64 = 10,
    /// UTF-8 text.
    Text = 11,
    /// An opaque byte sequence. Treated as a single leaf, never as a sequence of `U8`.
    Bytes = 12,
}

impl ScalarType {
    /// All kinds, in tag order.
    pub const ALL: [ScalarType; 13] = [
        ScalarType::Bool,
        ScalarType::I8,
        ScalarType::I16,
        ScalarType::I32,
        ScalarType::I64,
        ScalarType::U8,
        ScalarType::U16,
        ScalarType::U32,
        ScalarType::U64,
        ScalarType::F32,
        ScalarType::F64,
        ScalarType::Text,
        ScalarType::Bytes,
    ];
}

impl TryFrom<u8> for ScalarType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        ScalarType::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| format!("Invalid ScalarType tag: {}", value))
    }
}

/// A primitive leaf value.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum ScalarValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
}

impl ScalarValue {
    /// Reports the kind of this value.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ScalarValue::Bool(_) => ScalarType::Bool,
            ScalarValue::I8(_) => ScalarType::I8,
            ScalarValue::I16(_) => ScalarType::I16,
            ScalarValue::I32(_) => ScalarType::I32,
            ScalarValue::I64(_) => ScalarType::I64,
            ScalarValue::U8(_) => ScalarType::U8,
            ScalarValue::U16(_) => ScalarType::U16,
            ScalarValue::U32(_) => ScalarType::U32,
            ScalarValue::U64(_) => ScalarType::U64,
            ScalarValue::F32(_) => ScalarType::F32,
            ScalarValue::F64(_) => ScalarType::F64,
            ScalarValue::Text(_) => ScalarType::Text,
            ScalarValue::Bytes(_) => ScalarType::Bytes,
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for ScalarValue {
                fn from(v: $ty) -> Self {
                    ScalarValue::$variant(v)
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    String => Text,
    Vec<u8> => Bytes,
}

impl From<&str> for ScalarValue {
    fn from(v: &str) -> Self {
        ScalarValue::Text(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for ty in ScalarType::ALL {
            assert_eq!(ScalarType::try_from(ty as u8), Ok(ty));
        }
        assert!(ScalarType::try_from(13).is_err());
    }

    #[test]
    fn test_value_reports_its_kind() {
        assert_eq!(ScalarValue::from(7i64).scalar_type(), ScalarType::I64);
        assert_eq!(ScalarValue::from("x").scalar_type(), ScalarType::Text);
        assert_eq!(ScalarValue::from(vec![1u8, 2]).scalar_type(), ScalarType::Bytes);
        assert_eq!(ScalarValue::from(0.5f32).scalar_type(), ScalarType::F32);
    }
}
