//! Compile-time binding between Rust types and shapes.
//!
//! Each supported type is mapped once to a [`ShapeNode`] and knows how to turn
//! itself into a [`StructuredValue`] and back. This replaces runtime
//! introspection: the transcoder never looks inside a Rust value it was not
//! handed through this trait.

use crate::error::TranscodeError;
use crate::primitives::{Field, FieldShape, ShapeNode, StructuredValue};
use crate::types::{ScalarType, ScalarValue};
use serde_bytes::ByteBuf;

/// A type the transcoder can flatten and rebuild.
pub trait Shaped: Sized {
    /// Type-level shape. Must agree with the shape of every `to_value()` result.
    fn shape() -> ShapeNode;

    fn to_value(&self) -> StructuredValue;

    fn from_value(value: StructuredValue) -> Result<Self, TranscodeError>;
}

/// A whole parameter list (everything after the context handle).
pub trait ArgList: Sized {
    fn param_shapes() -> Vec<ShapeNode>;

    fn to_values(&self) -> Vec<StructuredValue>;

    fn from_values(values: Vec<StructuredValue>) -> Result<Self, TranscodeError>;
}

fn unexpected(expected: &str, found: &StructuredValue) -> TranscodeError {
    let found = match found {
        StructuredValue::Scalar(v) => format!("{:?} scalar", v.scalar_type()),
        other => other.kind().to_string(),
    };
    TranscodeError::ShapeDesync(format!("expected {}, found {}", expected, found))
}

macro_rules! impl_copy_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Shaped for $ty {
                fn shape() -> ShapeNode {
                    ShapeNode::Scalar(ScalarType::$variant)
                }

                fn to_value(&self) -> StructuredValue {
                    StructuredValue::Scalar(ScalarValue::$variant(*self))
                }

                fn from_value(value: StructuredValue) -> Result<Self, TranscodeError> {
                    match value {
                        StructuredValue::Scalar(ScalarValue::$variant(v)) => Ok(v),
                        other => Err(unexpected(stringify!($variant), &other)),
                    }
                }
            }
        )*
    };
}

impl_copy_scalar! {
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
}

impl Shaped for String {
    fn shape() -> ShapeNode {
        ShapeNode::Scalar(ScalarType::Text)
    }

    fn to_value(&self) -> StructuredValue {
        StructuredValue::Scalar(ScalarValue::Text(self.clone()))
    }

    fn from_value(value: StructuredValue) -> Result<Self, TranscodeError> {
        match value {
            StructuredValue::Scalar(ScalarValue::Text(v)) => Ok(v),
            other => Err(unexpected("Text", &other)),
        }
    }
}

/// Byte strings are a single leaf. Use `Vec<u8>` for a sequence of `U8` leaves.
impl Shaped for ByteBuf {
    fn shape() -> ShapeNode {
        ShapeNode::Scalar(ScalarType::Bytes)
    }

    fn to_value(&self) -> StructuredValue {
        StructuredValue::Scalar(ScalarValue::Bytes(self.to_vec()))
    }

    fn from_value(value: StructuredValue) -> Result<Self, TranscodeError> {
        match value {
            StructuredValue::Scalar(ScalarValue::Bytes(v)) => Ok(ByteBuf::from(v)),
            other => Err(unexpected("Bytes", &other)),
        }
    }
}

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> ShapeNode {
        ShapeNode::sequence(T::shape())
    }

    fn to_value(&self) -> StructuredValue {
        StructuredValue::Sequence {
            element: T::shape(),
            items: self.iter().map(Shaped::to_value).collect(),
        }
    }

    fn from_value(value: StructuredValue) -> Result<Self, TranscodeError> {
        match value {
            StructuredValue::Sequence { items, .. } => items.into_iter().map(T::from_value).collect(),
            other => Err(unexpected("sequence", &other)),
        }
    }
}

/// Fixed-size arrays flatten like sequences; the length is checked on the way back.
impl<T: Shaped, const N: usize> Shaped for [T; N] {
    fn shape() -> ShapeNode {
        ShapeNode::sequence(T::shape())
    }

    fn to_value(&self) -> StructuredValue {
        StructuredValue::Sequence {
            element: T::shape(),
            items: self.iter().map(Shaped::to_value).collect(),
        }
    }

    fn from_value(value: StructuredValue) -> Result<Self, TranscodeError> {
        let items = Vec::<T>::from_value(value)?;
        let found = items.len();
        items.try_into().map_err(|_| {
            TranscodeError::ShapeDesync(format!("expected {} elements, found {}", N, found))
        })
    }
}

#[doc(hidden)]
pub fn record_fields(
    value: StructuredValue,
    record: &str,
    arity: usize,
) -> Result<Vec<Field>, TranscodeError> {
    match value {
        StructuredValue::Record { name, fields } if name == record && fields.len() == arity => {
            Ok(fields)
        }
        StructuredValue::Record { name, fields } => Err(TranscodeError::ShapeDesync(format!(
            "expected record `{}` with {} fields, found `{}` with {}",
            record,
            arity,
            name,
            fields.len()
        ))),
        other => Err(unexpected(&format!("record `{}`", record), &other)),
    }
}

#[doc(hidden)]
pub fn take_field<T: Shaped>(
    fields: &mut impl Iterator<Item = Field>,
    record: &str,
    field: &str,
) -> Result<T, TranscodeError> {
    let next = fields.next().ok_or_else(|| {
        TranscodeError::ShapeDesync(format!("record `{}` is missing field `{}`", record, field))
    })?;
    if next.name != field {
        return Err(TranscodeError::ShapeDesync(format!(
            "record `{}` has field `{}` where `{}` was expected",
            record, next.name, field
        )));
    }
    T::from_value(next.value)
}

// Tuples are positional records; field names are their indices.
macro_rules! impl_tuple_record {
    ($arity:literal; $($T:ident . $idx:tt),+) => {
        impl<$($T: Shaped),+> Shaped for ($($T,)+) {
            fn shape() -> ShapeNode {
                ShapeNode::record("tuple", vec![$(FieldShape::new(stringify!($idx), $T::shape())),+])
            }

            fn to_value(&self) -> StructuredValue {
                StructuredValue::record("tuple", vec![$(Field::new(stringify!($idx), self.$idx.to_value())),+])
            }

            fn from_value(value: StructuredValue) -> Result<Self, TranscodeError> {
                let mut fields = record_fields(value, "tuple", $arity)?.into_iter();
                Ok(($(take_field::<$T>(&mut fields, "tuple", stringify!($idx))?,)+))
            }
        }
    };
}

impl_tuple_record!(2; A.0, B.1);
impl_tuple_record!(3; A.0, B.1, C.2);
impl_tuple_record!(4; A.0, B.1, C.2, D.3);

macro_rules! impl_arg_list {
    ($arity:literal; $($T:ident . $idx:tt),+) => {
        impl<$($T: Shaped),+> ArgList for ($($T,)+) {
            fn param_shapes() -> Vec<ShapeNode> {
                vec![$($T::shape()),+]
            }

            fn to_values(&self) -> Vec<StructuredValue> {
                vec![$(self.$idx.to_value()),+]
            }

            fn from_values(values: Vec<StructuredValue>) -> Result<Self, TranscodeError> {
                if values.len() != $arity {
                    return Err(TranscodeError::ShapeDesync(format!(
                        "expected {} arguments, found {}",
                        $arity,
                        values.len()
                    )));
                }
                let mut values = values.into_iter();
                Ok(($(
                    $T::from_value(values.next().ok_or_else(|| {
                        TranscodeError::ShapeDesync(format!("missing argument {}", $idx))
                    })?)?,
                )+))
            }
        }
    };
}

impl_arg_list!(1; A.0);
impl_arg_list!(2; A.0, B.1);
impl_arg_list!(3; A.0, B.1, C.2);
impl_arg_list!(4; A.0, B.1, C.2, D.3);
impl_arg_list!(5; A.0, B.1, C.2, D.3, E.4);
impl_arg_list!(6; A.0, B.1, C.2, D.3, E.4, F.5);

/// Declares a struct and implements [`Shaped`] for it.
///
/// Fields are flattened in declaration order. A field without a visibility
/// qualifier is recorded as not exported, and flattening or planning it fails
/// with [`TranscodeError::UnsupportedField`].
///
/// ```
/// use fuzz_shape::shaped_record;
///
/// shaped_record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Pair {
///         pub first: i64,
///         pub second: String,
///     }
/// }
/// ```
#[macro_export]
macro_rules! shaped_record {
    (
        $(#[$meta:meta])*
        $svis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $svis struct $name {
            $( $(#[$fmeta])* $fvis $field : $ty ),*
        }

        impl $crate::shaped::Shaped for $name {
            fn shape() -> $crate::primitives::ShapeNode {
                $crate::primitives::ShapeNode::Record {
                    name: ::std::string::String::from(stringify!($name)),
                    fields: ::std::vec![
                        $( $crate::primitives::FieldShape {
                            name: ::std::string::String::from(stringify!($field)),
                            exported: !stringify!($fvis).is_empty(),
                            shape: <$ty as $crate::shaped::Shaped>::shape(),
                        } ),*
                    ],
                }
            }

            fn to_value(&self) -> $crate::primitives::StructuredValue {
                $crate::primitives::StructuredValue::Record {
                    name: ::std::string::String::from(stringify!($name)),
                    fields: ::std::vec![
                        $( $crate::primitives::Field {
                            name: ::std::string::String::from(stringify!($field)),
                            exported: !stringify!($fvis).is_empty(),
                            value: <$ty as $crate::shaped::Shaped>::to_value(&self.$field),
                        } ),*
                    ],
                }
            }

            fn from_value(
                value: $crate::primitives::StructuredValue,
            ) -> ::std::result::Result<Self, $crate::error::TranscodeError> {
                let arity = 0usize $( + { let _ = stringify!($field); 1 } )*;
                #[allow(unused_mut, unused_variables)]
                let mut fields = $crate::shaped::record_fields(value, stringify!($name), arity)?.into_iter();
                ::std::result::Result::Ok($name {
                    $( $field: $crate::shaped::take_field::<$ty>(
                        &mut fields,
                        stringify!($name),
                        stringify!($field),
                    )? ),*
                })
            }
        }
    };
}
