use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote, ToTokens};
use syn::parse::{Parse, ParseStream};
use syn::visit_mut::{self, VisitMut};
use syn::{braced, Attribute, Expr, Ident, Item, Lit, Result, Token, Type, UnOp, Visibility};

use proc_macro_crate::{crate_name, FoundCrate};

/// Names the generated module defines itself.
const RESERVED: &[&str] = &["NAMESPACE", "NAMES", "LEN"];

/// `NAME [: Type] = expr;`
struct Entry {
    attrs: Vec<Attribute>,
    name: Ident,
    ty: Option<Type>,
    value: Expr,
}

enum Member {
    /// Wrapped into a named value.
    Constant(Entry),
    /// `_`-prefixed entry, emitted as a plain `const`.
    Internal(Entry),
    /// Any other item (functions, types, consts...), emitted unchanged.
    Item(Box<Item>),
}

/// Per-namespace `#[render(name)]` / `#[render(value)]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum RenderAttr {
    #[default]
    Value,
    Name,
}

struct ConstantsInput {
    attrs: Vec<Attribute>,
    render: RenderAttr,
    vis: Visibility,
    root: Ident,
    members: Vec<Member>,
}

impl Parse for ConstantsInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let (attrs, render) = split_render_attr(input.call(Attribute::parse_outer)?)?;
        let vis: Visibility = input.parse()?;
        input.parse::<Token![mod]>()?;
        let root: Ident = input.parse()?;
        let content;
        braced!(content in input);
        let members = parse_members(&content)?;
        Ok(Self {
            attrs,
            render,
            vis,
            root,
            members,
        })
    }
}

/// Pull `#[render(...)]` out of the module attributes.
fn split_render_attr(attrs: Vec<Attribute>) -> Result<(Vec<Attribute>, RenderAttr)> {
    let mut render = RenderAttr::default();
    let mut kept = Vec::with_capacity(attrs.len());
    for attr in attrs {
        if !attr.path().is_ident("render") {
            kept.push(attr);
            continue;
        }
        let mode: Ident = attr.parse_args()?;
        render = if mode == "name" {
            RenderAttr::Name
        } else if mode == "value" {
            RenderAttr::Value
        } else {
            return Err(syn::Error::new(
                mode.span(),
                "expected `#[render(name)]` or `#[render(value)]`",
            ));
        };
    }
    Ok((kept, render))
}

fn is_entry_start(input: ParseStream) -> bool {
    input.peek(Ident)
        && (input.peek2(Token![=]) || (input.peek2(Token![:]) && !input.peek2(Token![::])))
}

fn parse_members(input: ParseStream) -> Result<Vec<Member>> {
    let mut members = Vec::new();
    while !input.is_empty() {
        // Look past attributes to decide between an entry and an item.
        let fork = input.fork();
        fork.call(Attribute::parse_outer)?;

        if !is_entry_start(&fork) {
            members.push(Member::Item(Box::new(input.parse()?)));
            continue;
        }

        let attrs = input.call(Attribute::parse_outer)?;
        let name: Ident = input.parse()?;
        let ty = if input.peek(Token![:]) {
            input.parse::<Token![:]>()?;
            Some(input.parse::<Type>()?)
        } else {
            None
        };
        input.parse::<Token![=]>()?;
        let value: Expr = input.parse()?;
        input.parse::<Token![;]>()?;

        let entry = Entry {
            attrs,
            name,
            ty,
            value,
        };
        if entry.name.to_string().starts_with('_') {
            members.push(Member::Internal(entry));
        } else {
            members.push(Member::Constant(entry));
        }
    }
    Ok(members)
}

// =============================================================================
// Validation
// =============================================================================

fn validate(members: &[Member]) -> Result<()> {
    let mut seen: Vec<String> = Vec::new();
    for member in members {
        let Member::Constant(entry) = member else {
            continue;
        };
        let name = entry.name.to_string();
        if RESERVED.contains(&name.as_str()) {
            return Err(syn::Error::new(
                entry.name.span(),
                format!("`{}` is reserved by the generated namespace module", name),
            ));
        }
        if seen.contains(&name) {
            return Err(syn::Error::new(
                entry.name.span(),
                format!("duplicate constant `{}`", name),
            ));
        }
        seen.push(name);
    }
    Ok(())
}

/// Explicit type, or one inferred from a literal.
fn entry_type(entry: &Entry) -> Result<TokenStream2> {
    if let Some(ty) = &entry.ty {
        return Ok(ty.to_token_stream());
    }
    infer_type_from_expr(&entry.value).ok_or_else(|| {
        let message = if entry.name.to_string().starts_with('_') {
            format!(
                "internal entry `{0}` is emitted as a plain `const` and needs a type; write `{0}: Type = ...;`",
                entry.name
            )
        } else {
            format!(
                "cannot infer the type of `{0}`; write `{0}: Type = ...;`",
                entry.name
            )
        };
        syn::Error::new_spanned(&entry.value, message)
    })
}

/// Infer Rust type from a literal expression.
fn infer_type_from_expr(expr: &Expr) -> Option<TokenStream2> {
    match expr {
        Expr::Lit(lit) => match &lit.lit {
            Lit::Int(int) => Some(suffix_or(int.suffix(), quote!(i64))),
            Lit::Float(float) => Some(suffix_or(float.suffix(), quote!(f64))),
            Lit::Bool(_) => Some(quote!(bool)),
            Lit::Str(_) => Some(quote!(&'static str)),
            Lit::Char(_) => Some(quote!(char)),
            _ => None,
        },
        Expr::Unary(unary) if matches!(unary.op, UnOp::Neg(_)) => match &*unary.expr {
            inner @ Expr::Lit(_) => infer_type_from_expr(inner),
            _ => None,
        },
        Expr::Paren(paren) => infer_type_from_expr(&paren.expr),
        Expr::Group(group) => infer_type_from_expr(&group.expr),
        _ => None,
    }
}

fn suffix_or(suffix: &str, default: TokenStream2) -> TokenStream2 {
    if suffix.is_empty() {
        default
    } else {
        Ident::new(suffix, Span::call_site()).to_token_stream()
    }
}

// =============================================================================
// Crate path resolution
// =============================================================================

fn constants_crate_path() -> TokenStream2 {
    match crate_name("named-constants") {
        Ok(FoundCrate::Itself) => quote!(::named_constants),
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Err(_) => quote!(::named_constants),
    }
}

// =============================================================================
// Sibling references
// =============================================================================

/// Hidden `const` holding the raw value of constant `name`.
fn raw_ident(name: &Ident) -> Ident {
    format_ident!("__raw_{}", name, span = name.span())
}

/// Points bare references to sibling constants at their raw `const`s, so a
/// value like `DOUBLE: i64 = BASE * 2` never touches the namespace statics.
struct SiblingRefs<'a> {
    names: &'a [Ident],
}

impl VisitMut for SiblingRefs<'_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let Expr::Path(path) = expr {
            let sibling = match path.qself {
                None => path.path.get_ident().filter(|ident| self.names.contains(ident)),
                Some(_) => None,
            };
            if let Some(raw) = sibling.map(raw_ident) {
                path.path.segments[0].ident = raw;
                return;
            }
        }
        visit_mut::visit_expr_mut(self, expr);
    }
}

// =============================================================================
// Code generation
// =============================================================================

/// Expand a parsed declaration into its namespace module.
///
/// Values are constant expressions. Each one lands in a hidden `const`, so
/// entries may refer to earlier (or later) siblings by name without
/// initializing the namespace.
///
/// ```ignore
/// constants! {
///     pub mod Colors {
///         RED = "r";
///         _SHADE = 3;
///         fn warm() -> bool { true }
///     }
/// }
///
/// // Generates:
/// #[allow(non_snake_case, non_upper_case_globals)]
/// pub mod Colors {
///     use super::*;
///
///     const __raw_RED: &'static str = "r";
///
///     pub static NAMESPACE: LazyLock<Namespace> = LazyLock::new(|| {
///         let builder = NamespaceBuilder::from_module_path(module_path!());
///         // entry_scope() when compiled into a binary, example or test
///         builder
///             .constant::<&'static str>("RED", __raw_RED)
///             .finish()
///     });
///     pub const NAMES: &[&str] = &["RED"];
///     pub const LEN: usize = 1;
///
///     pub static RED: LazyLock<&'static NamedValue<&'static str>> = ...;
///
///     pub const _SHADE: i64 = 3;
///     fn warm() -> bool { true }
/// }
/// ```
fn expand(input: ConstantsInput, krate: &TokenStream2) -> Result<TokenStream2> {
    validate(&input.members)?;

    let names: Vec<Ident> = input
        .members
        .iter()
        .filter_map(|member| match member {
            Member::Constant(entry) => Some(entry.name.clone()),
            _ => None,
        })
        .collect();
    let mut siblings = SiblingRefs { names: &names };

    let mut raw_consts = Vec::new();
    let mut builder_calls = Vec::new();
    let mut statics = Vec::new();
    let mut name_lits = Vec::new();
    let mut passthrough = Vec::new();

    for member in &input.members {
        match member {
            Member::Constant(entry) => {
                let ty = entry_type(entry)?;
                let ident = &entry.name;
                let attrs = &entry.attrs;
                let raw = raw_ident(ident);
                let mut value = entry.value.clone();
                siblings.visit_expr_mut(&mut value);
                let name_lit = syn::LitStr::new(&ident.to_string(), ident.span());

                raw_consts.push(quote! {
                    #[doc(hidden)]
                    const #raw: #ty = #value;
                });

                builder_calls.push(quote! {
                    .constant::<#ty>(#name_lit, #raw)
                });

                statics.push(quote! {
                    #(#attrs)*
                    pub static #ident: ::std::sync::LazyLock<&'static #krate::NamedValue<#ty>> =
                        ::std::sync::LazyLock::new(|| match NAMESPACE.get::<#ty>(#name_lit) {
                            Some(constant) => constant,
                            None => unreachable!("constant `{}` missing from its namespace", #name_lit),
                        });
                });

                name_lits.push(name_lit);
            }
            Member::Internal(entry) => {
                let ty = entry_type(entry)?;
                let ident = &entry.name;
                let attrs = &entry.attrs;
                let mut value = entry.value.clone();
                siblings.visit_expr_mut(&mut value);
                passthrough.push(quote! {
                    #(#attrs)*
                    pub const #ident: #ty = #value;
                });
            }
            Member::Item(item) => passthrough.push(item.to_token_stream()),
        }
    }

    let render = match input.render {
        RenderAttr::Value => quote!(#krate::Render::Value),
        RenderAttr::Name => quote!(#krate::Render::Name),
    };
    let len = name_lits.len();
    let attrs = &input.attrs;
    let vis = &input.vis;
    let root = &input.root;

    Ok(quote! {
        #(#attrs)*
        #[allow(non_snake_case, non_upper_case_globals)]
        #vis mod #root {
            #[allow(unused_imports)]
            use super::*;

            #(#raw_consts)*

            /// The finalized namespace.
            pub static NAMESPACE: ::std::sync::LazyLock<#krate::Namespace> =
                ::std::sync::LazyLock::new(|| {
                    let builder =
                        #krate::NamespaceBuilder::from_module_path(::core::module_path!());
                    // Binaries, examples and integration tests are entry crates.
                    let builder = if ::core::option_env!("CARGO_BIN_NAME").is_some()
                        || ::core::option_env!("CARGO_TARGET_TMPDIR").is_some()
                    {
                        builder.entry_scope()
                    } else {
                        builder
                    };
                    builder
                        .render(#render)
                        #(#builder_calls)*
                        .finish()
                });

            /// Declared names, in declaration order.
            pub const NAMES: &[&str] = &[#(#name_lits),*];

            /// Number of declared constants.
            pub const LEN: usize = #len;

            #(#statics)*

            #(#passthrough)*
        }
    })
}

// =============================================================================
// Entry point
// =============================================================================

/// Declare a namespace of named constants.
///
/// Entries are `NAME = literal;` or `NAME: Type = expr;`. Integer literals
/// default to `i64` and float literals to `f64` unless suffixed. Entries
/// whose name starts with `_` stay plain `const` items, and every other item
/// (functions, types, consts) is copied into the module unchanged.
#[proc_macro]
pub fn constants(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as ConstantsInput);
    let krate = constants_crate_path();
    match expand(input, &krate) {
        Ok(expanded) => expanded.into(),
        Err(err) => err.to_compile_error().into(),
    }
}
