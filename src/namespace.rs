//! Namespaces: closed, immutable collections of named constants.
//!
//! Construction is a two-phase builder:
//!
//! 1. [`NamespaceBuilder`] collects `(name, value)` declarations in order.
//! 2. [`NamespaceBuilder::finish`] wraps every eligible value in a
//!    [`NamedValue`], builds the name, reverse and ordered indices, freezes the
//!    result and only then back-links each value to its new owner.
//!
//! ```text
//! NamespaceBuilder::new("Colors")
//!     .constant("RED", "r")
//!     .constant("GREEN", "g")
//!     .finish()
//!
//! colors.lookup("r")   → Colors.RED   (by value)
//! colors.lookup("RED") → Colors.RED   (by name)
//! colors.lookup("b")   → Err(NotFound)
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{debug, warn};

use crate::error::{ConstantsError, MutationKind};
use crate::named::{Constant, NamedValue, Render};
use crate::value::{RawValue, Underlying};

/// Deferred wrapping step for one declared value.
type Pending = Box<dyn FnOnce(Arc<str>, Render) -> Box<dyn Constant> + Send>;

// =============================================================================
// Builder
// =============================================================================

/// Collects declarations for a namespace (phase 1 of construction).
pub struct NamespaceBuilder {
    name: String,
    module: Option<String>,
    render: Render,
    pending: IndexMap<Arc<str>, Pending>,
    ignored: Vec<String>,
}

impl NamespaceBuilder {
    /// Start a namespace declared at top level; its qualifier is `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            module: None,
            render: Render::default(),
            pending: IndexMap::new(),
            ignored: Vec::new(),
        }
    }

    /// Start a namespace from the full Rust path of its declaring module,
    /// as produced by `module_path!()` inside that module.
    ///
    /// ```text
    /// "app::palette::Colors" → name "Colors", qualifier "app::palette::Colors"
    /// "app::Colors"          → name "Colors", qualifier "app::Colors"
    /// ```
    pub fn from_module_path(path: &str) -> Self {
        match path.rsplit_once("::") {
            Some((enclosing, name)) => Self::new(name).module(enclosing),
            None => Self::new(path),
        }
    }

    /// Drop the leading crate segment from the module path.
    ///
    /// For namespaces declared inside a program's entry crate (a binary,
    /// example or test harness), where the crate name adds nothing:
    ///
    /// ```text
    /// "app::Colors"          → qualifier "Colors"
    /// "app::palette::Colors" → qualifier "palette::Colors"
    /// ```
    pub fn entry_scope(mut self) -> Self {
        self.module = self
            .module
            .take()
            .and_then(|module| module.split_once("::").map(|(_, rest)| rest.to_string()));
        self
    }

    /// Qualify the namespace with an enclosing module path.
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    /// Choose how member values render through `Display`.
    pub fn render(mut self, render: Render) -> Self {
        self.render = render;
        self
    }

    /// Declare a constant.
    ///
    /// Names that are empty or start with `_` are internal and are not
    /// wrapped. Declaring the same name twice keeps its first position and
    /// the last value.
    pub fn constant<T: Underlying>(mut self, name: impl Into<Arc<str>>, value: T) -> Self {
        let name: Arc<str> = name.into();
        if name.is_empty() || name.starts_with('_') {
            self.ignored.push(name.to_string());
            return self;
        }

        let wrap: Pending = Box::new(move |name, render| {
            Box::new(NamedValue::with_render(name, value, render)) as Box<dyn Constant>
        });
        if self.pending.insert(name.clone(), wrap).is_some() {
            warn!(namespace = %self.name, constant = %name, "constant redeclared; keeping last value");
        }
        self
    }

    /// Number of eligible declarations collected so far.
    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Finalize the namespace (phase 2 of construction).
    pub fn finish(self) -> Namespace {
        let Self {
            name,
            module,
            render,
            pending,
            ignored,
        } = self;

        let qualifier = match &module {
            Some(module) => format!("{module}::{name}"),
            None => name.clone(),
        };

        // 1. Wrap, in declaration order
        let members: IndexMap<Arc<str>, Box<dyn Constant>> = pending
            .into_iter()
            .map(|(key, wrap)| {
                let constant = wrap(key.clone(), render);
                (key, constant)
            })
            .collect();

        // 2. Reverse index (last declaration wins)
        let mut reverse: HashMap<RawValue, usize> = HashMap::with_capacity(members.len());
        for (idx, constant) in members.values().enumerate() {
            if let Some(prev) = reverse.insert(constant.raw(), idx) {
                warn!(
                    namespace = %qualifier,
                    shadowed = %members[prev].name(),
                    by = %constant.name(),
                    value = %constant.raw(),
                    "duplicate value; value lookup resolves to the later constant"
                );
            }
        }

        // 3. Ordered view: cluster by kind, then by value
        let mut ordered: Vec<usize> = (0..members.len()).collect();
        ordered.sort_by(|&a, &b| members[a].cmp_clustered(members[b].as_ref()));

        // 4. Freeze
        let inner = Arc::new(NamespaceInner {
            name,
            module,
            qualifier,
            members,
            reverse,
            ordered,
            ignored,
        });

        // 5. Back-link, now that the owner exists
        for constant in inner.members.values() {
            let bound = constant.owner_slot().bind(&inner);
            debug_assert!(bound, "constant bound to two namespaces");
        }

        debug!(
            namespace = %inner.qualifier,
            constants = inner.members.len(),
            ignored = inner.ignored.len(),
            "namespace finalized"
        );

        Namespace { inner }
    }
}

impl fmt::Debug for NamespaceBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceBuilder")
            .field("name", &self.name)
            .field("module", &self.module)
            .field("render", &self.render)
            .field("pending", &self.pending.keys().collect::<Vec<_>>())
            .field("ignored", &self.ignored)
            .finish()
    }
}

// =============================================================================
// Namespace
// =============================================================================

pub(crate) struct NamespaceInner {
    name: String,
    module: Option<String>,
    qualifier: String,
    /// Declaration order.
    members: IndexMap<Arc<str>, Box<dyn Constant>>,
    /// Raw value → index into `members`.
    reverse: HashMap<RawValue, usize>,
    /// Indices into `members`, clustered by kind then sorted by value.
    ordered: Vec<usize>,
    ignored: Vec<String>,
}

impl NamespaceInner {
    #[inline]
    pub(crate) fn qualifier(&self) -> &str {
        &self.qualifier
    }
}

/// A finalized, immutable namespace of named constants.
///
/// Cloning is cheap and yields a handle to the same namespace.
#[derive(Clone)]
pub struct Namespace {
    inner: Arc<NamespaceInner>,
}

impl Namespace {
    pub(crate) fn from_inner(inner: Arc<NamespaceInner>) -> Self {
        Self { inner }
    }

    /// Start building a namespace.
    #[inline]
    pub fn builder(name: impl Into<String>) -> NamespaceBuilder {
        NamespaceBuilder::new(name)
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[inline]
    pub fn module(&self) -> Option<&str> {
        self.inner.module.as_deref()
    }

    /// `module::Name`, or `Name` for top-level namespaces.
    #[inline]
    pub fn qualifier(&self) -> &str {
        &self.inner.qualifier
    }

    /// Number of declared constants.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.members.is_empty()
    }

    /// Whether both handles refer to the same namespace.
    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Constants in stable order: clustered by kind, then by value.
    #[inline]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: &self.inner,
            order: self.inner.ordered.iter(),
        }
    }

    /// Names in the same order as [`iter`](Self::iter).
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.iter().map(|c| c.name())
    }

    /// Alias of [`iter`](Self::iter).
    #[inline]
    pub fn values(&self) -> Iter<'_> {
        self.iter()
    }

    /// `(name, constant)` pairs in the same order as [`iter`](Self::iter).
    pub fn items(&self) -> impl Iterator<Item = (&str, &dyn Constant)> + '_ {
        self.iter().map(|c| (c.name(), c))
    }

    /// Names in declaration order.
    pub fn declared(&self) -> impl Iterator<Item = &str> + '_ {
        self.inner.members.keys().map(|k| &**k)
    }

    /// Declared names that were skipped as internal.
    #[inline]
    pub fn ignored(&self) -> &[String] {
        &self.inner.ignored
    }

    #[inline]
    pub fn has_key(&self, name: &str) -> bool {
        self.inner.members.contains_key(name)
    }

    pub fn has_value(&self, value: impl Into<RawValue>) -> bool {
        self.inner.reverse.contains_key(&value.into())
    }

    /// True if `x` matches a raw value or, for strings, a declared name.
    pub fn contains(&self, x: impl Into<RawValue>) -> bool {
        let raw = x.into();
        self.inner.reverse.contains_key(&raw) || raw.as_str().is_some_and(|s| self.has_key(s))
    }

    /// Typed access by declared name.
    pub fn get<T: Underlying>(&self, name: &str) -> Option<&NamedValue<T>> {
        self.lookup_by_name(name)?.downcast_ref::<T>()
    }

    pub fn lookup_by_name(&self, name: &str) -> Option<&dyn Constant> {
        self.inner.members.get(name).map(|c| c.as_ref())
    }

    pub fn lookup_by_value(&self, value: impl Into<RawValue>) -> Option<&dyn Constant> {
        self.by_raw(&value.into())
    }

    /// Resolve `x` as a raw value first, then as a declared name.
    ///
    /// # Errors
    ///
    /// [`ConstantsError::NotFound`] if neither matches.
    pub fn lookup(&self, x: impl Into<RawValue>) -> Result<&dyn Constant, ConstantsError> {
        let raw = x.into();
        if let Some(constant) = self.by_raw(&raw) {
            return Ok(constant);
        }
        if let Some(constant) = raw.as_str().and_then(|s| self.lookup_by_name(s)) {
            return Ok(constant);
        }
        Err(ConstantsError::NotFound {
            namespace: self.inner.name.clone(),
            query: raw.to_string(),
        })
    }

    /// Always fails: members cannot be added or reassigned after finalization.
    pub fn assign<T: Underlying>(&self, name: &str, _value: T) -> Result<(), ConstantsError> {
        Err(self.immutable(name, MutationKind::Assign))
    }

    /// Always fails: members cannot be removed after finalization.
    pub fn remove(&self, name: &str) -> Result<(), ConstantsError> {
        Err(self.immutable(name, MutationKind::Remove))
    }

    fn immutable(&self, name: &str, action: MutationKind) -> ConstantsError {
        ConstantsError::Immutable {
            namespace: self.inner.name.clone(),
            name: name.to_string(),
            action,
        }
    }

    fn by_raw(&self, raw: &RawValue) -> Option<&dyn Constant> {
        let &idx = self.inner.reverse.get(raw)?;
        Some(self.inner.members[idx].as_ref())
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Namespace {}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.qualifier)
    }
}

/// `Colors { RED: "r", GREEN: "g" }`, in declaration order.
impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.inner.qualifier)?;
        let mut map = f.debug_map();
        for (name, constant) in &self.inner.members {
            map.key(&format_args!("{name}"))
                .value(&format_args!("{}", constant.raw()));
        }
        map.finish()
    }
}

/// Serializes as a map of declared name → raw value, in declaration order.
impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, constant) in &self.inner.members {
            map.serialize_entry(&**name, &constant.raw())?;
        }
        map.end()
    }
}

impl<'a> IntoIterator for &'a Namespace {
    type Item = &'a dyn Constant;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

/// Iterator over a namespace's constants in stable order.
pub struct Iter<'a> {
    inner: &'a NamespaceInner,
    order: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a dyn Constant;

    fn next(&mut self) -> Option<Self::Item> {
        let &idx = self.order.next()?;
        Some(self.inner.members[idx].as_ref())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }
}

impl ExactSizeIterator for Iter<'_> {}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn colors() -> Namespace {
        NamespaceBuilder::new("Colors")
            .constant("RED", "r")
            .constant("GREEN", "g")
            .constant("BLUE", "b")
            .finish()
    }

    #[test]
    fn build_and_lookup() {
        let ns = colors();
        assert_eq!(ns.len(), 3);
        assert!(!ns.is_empty());
        assert_eq!(ns.name(), "Colors");

        let red = ns.get::<&'static str>("RED").unwrap();
        assert_eq!(*red.value(), "r");
        assert_eq!(red.name(), "RED");
        assert!(ns.get::<i64>("RED").is_none());
        assert!(ns.get::<&'static str>("PURPLE").is_none());
    }

    #[test]
    fn dual_lookup_returns_same_constant() {
        let ns = colors();
        let by_value = ns.lookup("r").unwrap();
        let by_name = ns.lookup("RED").unwrap();
        assert!(std::ptr::addr_eq(by_value, by_name));

        assert!(ns.contains("r"));
        assert!(ns.contains("RED"));
        assert!(!ns.contains("blue"));
        assert!(ns.has_key("GREEN"));
        assert!(!ns.has_key("g"));
        assert!(ns.has_value("g"));
        assert!(!ns.has_value("GREEN"));
    }

    #[test]
    fn lookup_prefers_value_over_name() {
        let ns = NamespaceBuilder::new("Tricky")
            .constant("A", "B")
            .constant("B", "x")
            .finish();
        assert_eq!(ns.lookup("B").unwrap().name(), "A");
        assert_eq!(ns.lookup_by_name("B").unwrap().name(), "B");
    }

    #[test]
    fn lookup_miss_is_not_found() {
        let err = colors().lookup("blue").unwrap_err();
        assert_eq!(
            err,
            ConstantsError::NotFound {
                namespace: "Colors".into(),
                query: "\"blue\"".into(),
            }
        );
        assert!(colors().lookup(3).is_err());
    }

    #[test]
    fn mutation_is_rejected() {
        let ns = colors();
        for name in ["RED", "PURPLE", "_private"] {
            assert!(matches!(
                ns.assign(name, 1i64),
                Err(ConstantsError::Immutable { action: MutationKind::Assign, .. })
            ));
            assert!(matches!(
                ns.remove(name),
                Err(ConstantsError::Immutable { action: MutationKind::Remove, .. })
            ));
        }
        assert_eq!(ns.len(), 3);
    }

    #[test]
    fn iteration_is_clustered_and_stable() {
        let ns = NamespaceBuilder::new("Mixed")
            .constant("TEN", 10i64)
            .constant("B", "b")
            .constant("ONE", 1i64)
            .constant("A", "a")
            .finish();

        let first: Vec<&str> = ns.keys().collect();
        let second: Vec<&str> = ns.iter().map(|c| c.name()).collect();
        assert_eq!(first, second);
        assert_eq!(ns.iter().len(), 4);

        // Values of one kind are adjacent and sorted.
        let ints: Vec<&str> = ns
            .iter()
            .filter(|c| c.kind().wraps::<i64>())
            .map(|c| c.name())
            .collect();
        assert_eq!(ints, ["ONE", "TEN"]);
        let pos_one = first.iter().position(|n| *n == "ONE").unwrap();
        assert_eq!(first[pos_one + 1], "TEN");

        let strs: Vec<&str> = ns
            .values()
            .filter(|c| c.kind().wraps::<&'static str>())
            .map(|c| c.name())
            .collect();
        assert_eq!(strs, ["A", "B"]);

        let items: Vec<(&str, String)> = ns.items().map(|(n, c)| (n, c.raw().to_string())).collect();
        assert_eq!(items.len(), 4);
        assert!(items.contains(&("A", "\"a\"".to_string())));
    }

    #[test]
    fn declared_keeps_declaration_order() {
        let ns = NamespaceBuilder::new("Mixed")
            .constant("TEN", 10i64)
            .constant("ONE", 1i64)
            .finish();
        assert_eq!(ns.declared().collect::<Vec<_>>(), ["TEN", "ONE"]);
        assert_eq!(ns.keys().collect::<Vec<_>>(), ["ONE", "TEN"]);
    }

    #[test]
    fn internal_names_are_ignored() {
        let ns = NamespaceBuilder::new("Flags")
            .constant("_hidden", 1i64)
            .constant("", 2i64)
            .constant("SHOWN", 3i64)
            .finish();
        assert_eq!(ns.len(), 1);
        assert!(!ns.has_key("_hidden"));
        assert!(!ns.has_value(1));
        assert_eq!(ns.ignored(), ["_hidden".to_string(), String::new()]);
    }

    #[test]
    fn redeclaration_keeps_position_and_last_value() {
        let ns = NamespaceBuilder::new("Again")
            .constant("A", 1i64)
            .constant("B", 2i64)
            .constant("A", 3i64)
            .finish();
        assert_eq!(ns.len(), 2);
        assert_eq!(ns.declared().collect::<Vec<_>>(), ["A", "B"]);
        assert_eq!(*ns.get::<i64>("A").unwrap().value(), 3);
        assert!(!ns.has_value(1));
    }

    #[test]
    fn duplicate_values_resolve_to_last_declaration() {
        let ns = NamespaceBuilder::new("Aliases")
            .constant("FIRST", 1i64)
            .constant("SECOND", 1i64)
            .finish();
        assert_eq!(ns.len(), 2);
        assert_eq!(ns.lookup(1).unwrap().name(), "SECOND");
        assert!(ns.has_key("FIRST"));
        assert_eq!(ns.lookup("FIRST").unwrap().name(), "FIRST");
        // Equal values keep declaration order in the ordered view.
        assert_eq!(ns.keys().collect::<Vec<_>>(), ["FIRST", "SECOND"]);
    }

    #[test]
    fn float_widths_share_lookup_keys() {
        let ns = NamespaceBuilder::new("Ratios")
            .constant("HALF", 0.5f32)
            .constant("TENTH", 0.1f32)
            .finish();
        assert_eq!(ns.lookup(0.1).unwrap().name(), "TENTH");
        assert!(ns.has_value(0.1f64));
        assert!(ns.has_value(0.5));
        assert!(!ns.has_value(1));
        assert_eq!(ns.lookup(0.1f32).unwrap().value_as::<f32>(), Some(&0.1f32));
    }

    #[test]
    fn values_are_back_linked_after_finish() {
        let ns = colors();
        for constant in &ns {
            let owner = constant.namespace().unwrap();
            assert!(owner.ptr_eq(&ns));
            assert_eq!(owner, ns);
        }
        assert_eq!(format!("{:?}", ns.lookup("RED").unwrap()), "Colors.RED");
        assert_eq!(ns.lookup("RED").unwrap().qualified_name(), "Colors.RED");
    }

    #[test]
    fn owner_link_does_not_keep_namespace_alive() {
        let ns = colors();
        let red = ns.get::<&'static str>("RED").unwrap().clone();
        drop(ns);
        assert!(red.namespace().is_none());
        assert_eq!(format!("{red:?}"), "RED");
    }

    #[test]
    fn module_qualifies_debug_rendering() {
        let ns = NamespaceBuilder::new("Colors")
            .module("app::palette")
            .constant("RED", "r")
            .finish();
        assert_eq!(ns.qualifier(), "app::palette::Colors");
        assert_eq!(ns.module(), Some("app::palette"));
        assert_eq!(
            format!("{:?}", ns.get::<&'static str>("RED").unwrap()),
            "app::palette::Colors.RED"
        );
        assert_eq!(ns.to_string(), "app::palette::Colors");
    }

    #[test]
    fn from_module_path_keeps_crate_prefix() {
        let nested = NamespaceBuilder::from_module_path("app::palette::Colors").finish();
        assert_eq!(nested.name(), "Colors");
        assert_eq!(nested.qualifier(), "app::palette::Colors");

        let mylib = NamespaceBuilder::from_module_path("mylib::Colors")
            .constant("RED", "r")
            .finish();
        let otherlib = NamespaceBuilder::from_module_path("otherlib::Colors")
            .constant("RED", "r")
            .finish();
        assert_eq!(mylib.qualifier(), "mylib::Colors");
        assert_eq!(mylib.module(), Some("mylib"));
        assert_eq!(
            format!("{:?}", mylib.lookup("RED").unwrap()),
            "mylib::Colors.RED"
        );
        assert_ne!(
            format!("{:?}", mylib.lookup("RED").unwrap()),
            format!("{:?}", otherlib.lookup("RED").unwrap())
        );

        let bare = NamespaceBuilder::from_module_path("Colors").finish();
        assert_eq!(bare.qualifier(), "Colors");
    }

    #[test]
    fn entry_scope_drops_crate_segment() {
        let root = NamespaceBuilder::from_module_path("app::Colors")
            .entry_scope()
            .constant("RED", "r")
            .finish();
        assert_eq!(root.qualifier(), "Colors");
        assert_eq!(root.module(), None);
        assert_eq!(format!("{:?}", root.lookup("RED").unwrap()), "Colors.RED");

        let nested = NamespaceBuilder::from_module_path("app::palette::Colors")
            .entry_scope()
            .finish();
        assert_eq!(nested.qualifier(), "palette::Colors");
        assert_eq!(nested.module(), Some("palette"));
    }

    #[test]
    fn render_policy_applies_to_members() {
        let by_name = NamespaceBuilder::new("Levels")
            .render(Render::Name)
            .constant("DEBUG", 10i64)
            .finish();
        assert_eq!(by_name.lookup(10).unwrap().to_string(), "DEBUG");

        let by_value = NamespaceBuilder::new("Levels")
            .constant("DEBUG", 10i64)
            .finish();
        assert_eq!(by_value.lookup(10).unwrap().to_string(), "10");
    }

    #[test]
    fn debug_and_serialize_use_declaration_order() {
        let ns = NamespaceBuilder::new("Mixed")
            .constant("B", "b")
            .constant("N", 2i64)
            .constant("A", "a")
            .finish();
        assert_eq!(format!("{ns:?}"), r#"Mixed {B: "b", N: 2, A: "a"}"#);
        assert_eq!(
            serde_json::to_string(&ns).unwrap(),
            r#"{"B":"b","N":2,"A":"a"}"#
        );
    }

    #[test]
    fn builder_reports_pending_count() {
        let builder = Namespace::builder("Empty");
        assert!(builder.is_empty());
        let builder = builder.constant("X", true);
        assert_eq!(builder.len(), 1);
        let ns = builder.finish();
        assert!(ns.contains(true));
        assert!(!ns.contains(false));
    }

    #[test]
    fn empty_namespace() {
        let ns = NamespaceBuilder::new("Nothing").finish();
        assert!(ns.is_empty());
        assert_eq!(ns.iter().count(), 0);
        assert!(ns.lookup("x").is_err());
    }
}
