//! Underlying value types and the raw keys used for value-based lookup.
//!
//! A constant's payload is any [`Underlying`] type. For reverse lookups the
//! payload is projected onto a [`RawValue`], which erases the exact integer
//! width so that `7u8` and `7i64` address the same constant.

use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};

use serde::{Serialize, Serializer};

/// A primitive, immutable payload type usable as a constant's value.
pub trait Underlying:
    Clone + fmt::Debug + fmt::Display + PartialEq + PartialOrd + Send + Sync + 'static
{
    /// Short type label, used to name the derived wrapper kind.
    const KIND: &'static str;

    /// Project the value onto its lookup key.
    fn to_raw(&self) -> RawValue;

    /// Total order within one wrapper kind.
    fn total_cmp(&self, other: &Self) -> Ordering;
}

/// Type-erased payload used as the key of a namespace's reverse index.
///
/// Floats compare by canonical bits: `-0.0` equals `0.0` and every NaN is
/// the same key. `f32` payloads widen through their shortest decimal form,
/// so `0.1f32` and `0.1f64` are one key. Integers and floats never compare
/// equal to each other.
#[derive(Clone, Debug)]
pub enum RawValue {
    Str(String),
    Int(i128),
    Float(f64),
    Bool(bool),
    Char(char),
}

impl RawValue {
    /// The string payload, if this is a `Str`.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Widen an `f32` to the `f64` nearest its shortest decimal rendering.
fn widen_f32(f: f32) -> f64 {
    f.to_string().parse().unwrap_or_else(|_| f64::from(f))
}

fn canonical_bits(f: f64) -> u64 {
    if f.is_nan() {
        f64::NAN.to_bits()
    } else if f == 0.0 {
        0
    } else {
        f.to_bits()
    }
}

impl PartialEq for RawValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for RawValue {}

impl Hash for RawValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::Str(s) => s.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => canonical_bits(*f).hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Char(c) => c.hash(state),
        }
    }
}

/// Renders the way a literal of the value would be written.
impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Char(c) => write!(f, "{c:?}"),
        }
    }
}

impl Serialize for RawValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Int(i) => match i64::try_from(*i) {
                Ok(small) => serializer.serialize_i64(small),
                Err(_) => serializer.serialize_i128(*i),
            },
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Char(c) => serializer.serialize_char(*c),
        }
    }
}

// =============================================================================
// Underlying impls
// =============================================================================

macro_rules! impl_integer {
    ($($ty:ty => $kind:literal),* $(,)?) => {
        $(
            impl Underlying for $ty {
                const KIND: &'static str = $kind;

                #[inline]
                fn to_raw(&self) -> RawValue {
                    RawValue::Int(*self as i128)
                }

                #[inline]
                fn total_cmp(&self, other: &Self) -> Ordering {
                    Ord::cmp(self, other)
                }
            }

            impl From<$ty> for RawValue {
                #[inline]
                fn from(value: $ty) -> Self {
                    RawValue::Int(value as i128)
                }
            }
        )*
    };
}

impl_integer! {
    i8 => "i8",
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
    i128 => "i128",
    isize => "isize",
    u8 => "u8",
    u16 => "u16",
    u32 => "u32",
    u64 => "u64",
    usize => "usize",
}

impl Underlying for f64 {
    const KIND: &'static str = "f64";

    #[inline]
    fn to_raw(&self) -> RawValue {
        RawValue::Float(*self)
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f64::total_cmp(self, other)
    }
}

impl Underlying for f32 {
    const KIND: &'static str = "f32";

    #[inline]
    fn to_raw(&self) -> RawValue {
        RawValue::Float(widen_f32(*self))
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        f32::total_cmp(self, other)
    }
}

impl Underlying for bool {
    const KIND: &'static str = "bool";

    #[inline]
    fn to_raw(&self) -> RawValue {
        RawValue::Bool(*self)
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

impl Underlying for char {
    const KIND: &'static str = "char";

    #[inline]
    fn to_raw(&self) -> RawValue {
        RawValue::Char(*self)
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

impl Underlying for &'static str {
    const KIND: &'static str = "str";

    #[inline]
    fn to_raw(&self) -> RawValue {
        RawValue::Str((*self).to_owned())
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

impl Underlying for String {
    const KIND: &'static str = "string";

    #[inline]
    fn to_raw(&self) -> RawValue {
        RawValue::Str(self.clone())
    }

    #[inline]
    fn total_cmp(&self, other: &Self) -> Ordering {
        Ord::cmp(self, other)
    }
}

impl From<f64> for RawValue {
    #[inline]
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

impl From<f32> for RawValue {
    #[inline]
    fn from(value: f32) -> Self {
        RawValue::Float(widen_f32(value))
    }
}

impl From<bool> for RawValue {
    #[inline]
    fn from(value: bool) -> Self {
        RawValue::Bool(value)
    }
}

impl From<char> for RawValue {
    #[inline]
    fn from(value: char) -> Self {
        RawValue::Char(value)
    }
}

impl From<&str> for RawValue {
    #[inline]
    fn from(value: &str) -> Self {
        RawValue::Str(value.to_owned())
    }
}

impl From<String> for RawValue {
    #[inline]
    fn from(value: String) -> Self {
        RawValue::Str(value)
    }
}

impl From<&String> for RawValue {
    #[inline]
    fn from(value: &String) -> Self {
        RawValue::Str(value.clone())
    }
}
