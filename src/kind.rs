//! Wrapper-kind registry: one derived "named" kind per underlying type.
//!
//! A [`WrapperKind`] describes `NamedValue<T>` for one concrete `T`. Kinds are
//! created lazily on first request and cached for the rest of the process, so
//! identity comparisons (`ptr::eq`) between kinds are meaningful across every
//! namespace that shares a payload type.
//!
//! ```ignore
//! let a = wrapper_for::<i64>();
//! let b = wrapper_for::<i64>();
//! assert!(core::ptr::eq(a, b));
//! assert_eq!(a.name(), "NamedI64");
//! ```

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use tracing::trace;

use crate::value::Underlying;

/// Runtime descriptor of `NamedValue<T>` for one underlying type `T`.
#[derive(Debug, PartialEq, Eq)]
pub struct WrapperKind {
    type_id: TypeId,
    name: String,
    underlying: &'static str,
    /// Registration order; clusters constants of one kind in ordered views.
    ordinal: usize,
}

impl WrapperKind {
    /// Derived kind name, e.g. `NamedStr`, `NamedI64`.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full type name of the underlying payload.
    #[inline]
    pub fn underlying(&self) -> &'static str {
        self.underlying
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Opaque per-kind identity, stable for the process lifetime.
    #[inline]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Whether this kind wraps `T`.
    #[inline]
    pub fn wraps<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl core::fmt::Display for WrapperKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Process-wide cache: TypeId → leaked kind.
static KINDS: LazyLock<RwLock<HashMap<TypeId, &'static WrapperKind>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Return the wrapper kind for `T`, creating and caching it on first use.
///
/// Repeated calls with the same `T` return the identical `&'static` kind.
pub fn wrapper_for<T: Underlying>() -> &'static WrapperKind {
    let type_id = TypeId::of::<T>();

    if let Some(&kind) = KINDS.read().get(&type_id) {
        return kind;
    }

    let mut kinds = KINDS.write();
    // Another thread may have won the race between the two locks.
    if let Some(&kind) = kinds.get(&type_id) {
        return kind;
    }

    let kind: &'static WrapperKind = Box::leak(Box::new(WrapperKind {
        type_id,
        name: kind_name(T::KIND),
        underlying: std::any::type_name::<T>(),
        ordinal: kinds.len(),
    }));
    kinds.insert(type_id, kind);
    trace!(kind = %kind.name, ordinal = kind.ordinal, "registered wrapper kind");
    kind
}

/// All kinds registered so far, in registration order.
pub fn wrapper_kinds() -> Vec<&'static WrapperKind> {
    let mut kinds: Vec<_> = KINDS.read().values().copied().collect();
    kinds.sort_by_key(|k| k.ordinal);
    kinds
}

/// "i64" → "NamedI64", "str" → "NamedStr".
fn kind_name(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => format!("Named{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "Named".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_type_yields_identical_kind() {
        let a = wrapper_for::<i64>();
        let b = wrapper_for::<i64>();
        assert!(core::ptr::eq(a, b));
        assert_eq!(a.ordinal(), b.ordinal());
    }

    #[test]
    fn distinct_types_yield_distinct_kinds() {
        let int = wrapper_for::<i32>();
        let text = wrapper_for::<&'static str>();
        assert!(!core::ptr::eq(int, text));
        assert_ne!(int.ordinal(), text.ordinal());
        assert!(int.wraps::<i32>());
        assert!(!int.wraps::<i64>());
    }

    #[test]
    fn kind_names_follow_payload_label() {
        assert_eq!(wrapper_for::<i64>().name(), "NamedI64");
        assert_eq!(wrapper_for::<&'static str>().name(), "NamedStr");
        assert_eq!(wrapper_for::<String>().name(), "NamedString");
        assert_eq!(wrapper_for::<bool>().to_string(), "NamedBool");
        assert_eq!(wrapper_for::<f64>().underlying(), "f64");
    }

    #[test]
    fn registry_lists_every_kind_once() {
        let u16_kind = wrapper_for::<u16>();
        wrapper_for::<u16>();
        let listed: Vec<_> = wrapper_kinds()
            .into_iter()
            .filter(|k| core::ptr::eq(*k, u16_kind))
            .collect();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn concurrent_first_use_creates_one_kind() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| wrapper_for::<char>() as *const WrapperKind as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
    }
}
