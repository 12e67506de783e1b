//! Named values: payloads that print as their declared name.
//!
//! A [`NamedValue<T>`] behaves as its `T` for equality, ordering, hashing and
//! arithmetic, and only changes how it renders:
//!
//! ```text
//! Debug   → "palette::Colors.RED"   (qualified by the owning namespace)
//! Display → "r"  with Render::Value (default)
//!           "RED" with Render::Name
//! ```
//!
//! The owner link is a `Weak` set exactly once, after the namespace that
//! declared the value has been finalized.

use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::ops;
use std::any::Any;
use std::sync::{Arc, OnceLock, Weak};

use serde::{Serialize, Serializer};

use crate::kind::{wrapper_for, WrapperKind};
use crate::namespace::{Namespace, NamespaceInner};
use crate::value::{RawValue, Underlying};

/// How a named value renders through `Display`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Render {
    /// Print the payload as usual; the name is available via `name()`.
    #[default]
    Value,
    /// Print the declared name.
    Name,
}

// =============================================================================
// Owner back-link
// =============================================================================

/// Write-once, non-owning link from a value to the namespace that declared it.
#[doc(hidden)]
#[derive(Clone, Default)]
pub struct OwnerSlot(OnceLock<Weak<NamespaceInner>>);

impl OwnerSlot {
    /// Returns `false` if the slot was already bound.
    pub(crate) fn bind(&self, owner: &Arc<NamespaceInner>) -> bool {
        self.0.set(Arc::downgrade(owner)).is_ok()
    }

    pub(crate) fn get(&self) -> Option<Namespace> {
        self.0.get()?.upgrade().map(Namespace::from_inner)
    }

    fn qualify(&self, name: &str) -> String {
        match self.0.get().and_then(Weak::upgrade) {
            Some(owner) => format!("{}.{}", owner.qualifier(), name),
            None => name.to_string(),
        }
    }
}

impl fmt::Debug for OwnerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get().and_then(Weak::upgrade) {
            Some(owner) => write!(f, "OwnerSlot({})", owner.qualifier()),
            None => f.write_str("OwnerSlot(unbound)"),
        }
    }
}

// =============================================================================
// NamedValue
// =============================================================================

/// A payload of type `T` carrying its declared name and owning namespace.
#[derive(Clone)]
pub struct NamedValue<T> {
    value: T,
    name: Arc<str>,
    kind: &'static WrapperKind,
    render: Render,
    owner: OwnerSlot,
}

impl<T: Underlying> NamedValue<T> {
    /// Wrap `value` under `name`. The result has no owning namespace.
    pub fn new(name: impl Into<Arc<str>>, value: T) -> Self {
        Self::with_render(name, value, Render::default())
    }

    pub fn with_render(name: impl Into<Arc<str>>, value: T, render: Render) -> Self {
        Self {
            value,
            name: name.into(),
            kind: wrapper_for::<T>(),
            render,
            owner: OwnerSlot::default(),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn value(&self) -> &T {
        &self.value
    }

    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }

    #[inline]
    pub fn kind(&self) -> &'static WrapperKind {
        self.kind
    }

    #[inline]
    pub fn render(&self) -> Render {
        self.render
    }

    /// The namespace that declared this value, once it is finalized.
    pub fn namespace(&self) -> Option<Namespace> {
        self.owner.get()
    }

    /// `qualifier.NAME` when owned, otherwise the bare name.
    pub fn qualified_name(&self) -> String {
        self.owner.qualify(&self.name)
    }
}

impl<T: Underlying> fmt::Debug for NamedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name())
    }
}

impl<T: Underlying> fmt::Display for NamedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render {
            Render::Value => fmt::Display::fmt(&self.value, f),
            Render::Name => f.write_str(&self.name),
        }
    }
}

impl<T> ops::Deref for NamedValue<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T> AsRef<T> for NamedValue<T> {
    #[inline]
    fn as_ref(&self) -> &T {
        &self.value
    }
}

// Hash and Eq both delegate to `T`, so `Borrow<T>` is sound for map lookups.
impl<T> Borrow<T> for NamedValue<T> {
    #[inline]
    fn borrow(&self) -> &T {
        &self.value
    }
}

impl<T: Hash> Hash for NamedValue<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T: PartialEq> PartialEq for NamedValue<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: PartialEq> PartialEq<T> for NamedValue<T> {
    #[inline]
    fn eq(&self, other: &T) -> bool {
        self.value == *other
    }
}

impl<T: Eq> Eq for NamedValue<T> {}

impl<T: PartialOrd> PartialOrd for NamedValue<T> {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<T: PartialOrd> PartialOrd<T> for NamedValue<T> {
    #[inline]
    fn partial_cmp(&self, other: &T) -> Option<Ordering> {
        self.value.partial_cmp(other)
    }
}

impl<T: Ord> Ord for NamedValue<T> {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

macro_rules! impl_reverse_eq {
    ($($ty:ty),* $(,)?) => {
        $(
            impl PartialEq<NamedValue<$ty>> for $ty {
                #[inline]
                fn eq(&self, other: &NamedValue<$ty>) -> bool {
                    *self == other.value
                }
            }

            impl PartialOrd<NamedValue<$ty>> for $ty {
                #[inline]
                fn partial_cmp(&self, other: &NamedValue<$ty>) -> Option<Ordering> {
                    PartialOrd::partial_cmp(self, &other.value)
                }
            }
        )*
    };
}

impl_reverse_eq!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, usize, f32, f64, bool, char, String,
    &'static str,
);

impl PartialEq<str> for NamedValue<&'static str> {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<str> for NamedValue<String> {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.value == other
    }
}

impl PartialEq<&str> for NamedValue<String> {
    #[inline]
    fn eq(&self, other: &&str) -> bool {
        self.value == *other
    }
}

macro_rules! forward_binop {
    ($($Trait:ident :: $method:ident),* $(,)?) => {
        $(
            impl<T, Rhs> ops::$Trait<Rhs> for NamedValue<T>
            where
                T: ops::$Trait<Rhs>,
            {
                type Output = T::Output;

                #[inline]
                fn $method(self, rhs: Rhs) -> Self::Output {
                    ops::$Trait::$method(self.value, rhs)
                }
            }

            impl<T, Rhs> ops::$Trait<Rhs> for &NamedValue<T>
            where
                T: Clone + ops::$Trait<Rhs>,
            {
                type Output = T::Output;

                #[inline]
                fn $method(self, rhs: Rhs) -> Self::Output {
                    ops::$Trait::$method(self.value.clone(), rhs)
                }
            }
        )*
    };
}

forward_binop!(
    Add::add,
    Sub::sub,
    Mul::mul,
    Div::div,
    Rem::rem,
    BitAnd::bitand,
    BitOr::bitor,
    BitXor::bitxor,
    Shl::shl,
    Shr::shr,
);

impl<T: ops::Neg> ops::Neg for NamedValue<T> {
    type Output = T::Output;

    #[inline]
    fn neg(self) -> Self::Output {
        -self.value
    }
}

impl<T: Clone + ops::Neg> ops::Neg for &NamedValue<T> {
    type Output = T::Output;

    #[inline]
    fn neg(self) -> Self::Output {
        -self.value.clone()
    }
}

impl<T: ops::Not> ops::Not for NamedValue<T> {
    type Output = T::Output;

    #[inline]
    fn not(self) -> Self::Output {
        !self.value
    }
}

impl<T: Clone + ops::Not> ops::Not for &NamedValue<T> {
    type Output = T::Output;

    #[inline]
    fn not(self) -> Self::Output {
        !self.value.clone()
    }
}

/// Serializes as the bare payload.
impl<T: Serialize> Serialize for NamedValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<T: Underlying> From<&NamedValue<T>> for RawValue {
    #[inline]
    fn from(value: &NamedValue<T>) -> Self {
        value.value.to_raw()
    }
}

// =============================================================================
// Constant: type-erased view
// =============================================================================

mod private {
    pub trait Sealed {}
}

impl<T: Underlying> private::Sealed for NamedValue<T> {}

/// Object-safe view over any `NamedValue<T>`, used by heterogeneous
/// namespaces.
pub trait Constant: private::Sealed + fmt::Debug + fmt::Display + Send + Sync + 'static {
    fn name(&self) -> &str;

    fn kind(&self) -> &'static WrapperKind;

    /// The payload as a lookup key.
    fn raw(&self) -> RawValue;

    fn namespace(&self) -> Option<Namespace>;

    fn qualified_name(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    #[doc(hidden)]
    fn owner_slot(&self) -> &OwnerSlot;

    /// Orders by kind first, then by the payload's own total order.
    #[doc(hidden)]
    fn cmp_clustered(&self, other: &dyn Constant) -> Ordering;
}

impl<T: Underlying> Constant for NamedValue<T> {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    fn kind(&self) -> &'static WrapperKind {
        self.kind
    }

    #[inline]
    fn raw(&self) -> RawValue {
        self.value.to_raw()
    }

    fn namespace(&self) -> Option<Namespace> {
        self.owner.get()
    }

    fn qualified_name(&self) -> String {
        self.owner.qualify(&self.name)
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn owner_slot(&self) -> &OwnerSlot {
        &self.owner
    }

    fn cmp_clustered(&self, other: &dyn Constant) -> Ordering {
        match other.downcast_ref::<T>() {
            Some(other) => self.value.total_cmp(&other.value),
            None => self.kind.ordinal().cmp(&other.kind().ordinal()),
        }
    }
}

impl dyn Constant {
    /// The typed value, if this constant wraps a `T`.
    #[inline]
    pub fn downcast_ref<T: Underlying>(&self) -> Option<&NamedValue<T>> {
        self.as_any().downcast_ref::<NamedValue<T>>()
    }

    #[inline]
    pub fn value_as<T: Underlying>(&self) -> Option<&T> {
        self.downcast_ref::<T>().map(NamedValue::value)
    }
}

impl PartialEq<RawValue> for dyn Constant {
    fn eq(&self, other: &RawValue) -> bool {
        self.raw() == *other
    }
}
