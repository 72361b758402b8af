use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Expr, Fields, Item, Lit, Meta, parse_macro_input};

/// Generate standard derive attributes
fn standard_derives(include_copy: bool) -> TokenStream2 {
    let extra = include_copy.then(|| quote! { Copy, Eq, Hash, PartialOrd, Ord, });
    quote! {
        #[derive(Debug, Clone, #extra PartialEq, ::serde::Serialize, ::serde::Deserialize)]
    }
}

/// Add attributes at the beginning of the attribute list
trait PrependAttrs {
    fn prepend_attrs(&mut self, attrs: impl IntoIterator<Item = syn::Attribute>);
}

impl PrependAttrs for Vec<syn::Attribute> {
    fn prepend_attrs(&mut self, attrs: impl IntoIterator<Item = syn::Attribute>) {
        let new_attrs: Vec<_> = attrs.into_iter().collect();
        self.splice(0..0, new_attrs);
    }
}

/// Standard schema attribute macro
///
/// Apply this to entity and payload structs. Adds the standard derives and
/// camelCase field naming so serialized entities match the wire payloads.
#[proc_macro_attribute]
pub fn standard(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(item as Item);

    let derives = standard_derives(false);
    let attrs = [
        syn::parse_quote! { #derives },
        syn::parse_quote! { #[serde(rename_all = "camelCase")] },
    ];

    match &mut input {
        Item::Struct(s) => s.attrs.prepend_attrs(attrs),
        Item::Enum(e) => e.attrs.prepend_attrs(attrs),
        _ => {}
    }

    quote! { #input }.into()
}

/// Standard schema for status enums
///
/// Status values serialize in kebab-case (`InProgress` -> `"in-progress"`).
#[proc_macro_attribute]
pub fn standard_enum(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let Item::Enum(mut e) = parse_macro_input!(item as Item) else {
        panic!("standard_enum can only be applied to enums")
    };

    let derives = standard_derives(true);

    e.attrs.prepend_attrs([
        syn::parse_quote! { #derives },
        syn::parse_quote! { #[serde(rename_all = "kebab-case")] },
    ]);

    quote! { #e }.into()
}

/// Convert a CamelCase identifier into a SCREAMING_SNAKE message tag
fn screaming_snake(ident: &str) -> String {
    let mut tag = String::with_capacity(ident.len() + 4);
    for (i, ch) in ident.chars().enumerate() {
        if ch.is_uppercase() && i > 0 {
            tag.push('_');
        }
        tag.extend(ch.to_uppercase());
    }
    tag
}

/// Read an explicit `#[tag = "..."]` override from a variant
fn explicit_tag(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("tag")) else {
        return Ok(None);
    };

    if let Meta::NameValue(nv) = &attr.meta
        && let Expr::Lit(expr) = &nv.value
        && let Lit::Str(s) = &expr.lit
    {
        return Ok(Some(s.value()));
    }

    Err(syn::Error::new_spanned(
        attr,
        "expected #[tag = \"MESSAGE_TYPE\"]",
    ))
}

fn expand_message_kind(input: DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "MessageKind can only be derived for enums",
        ));
    };

    let mut variants = Vec::with_capacity(data.variants.len());
    let mut tags = Vec::with_capacity(data.variants.len());
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "MessageKind variants must be unit variants",
            ));
        }
        let tag = explicit_tag(&variant.attrs)?
            .unwrap_or_else(|| screaming_snake(&variant.ident.to_string()));
        variants.push(&variant.ident);
        tags.push(tag);
    }

    Ok(quote! {
        impl ::neuromesh_types::MessageKind for #name {
            const ALL: &'static [Self] = &[#(Self::#variants),*];

            fn tag(&self) -> &'static str {
                match self {
                    #(Self::#variants => #tags,)*
                }
            }

            fn from_tag(tag: &str) -> ::core::option::Option<Self> {
                match tag {
                    #(#tags => ::core::option::Option::Some(Self::#variants),)*
                    _ => ::core::option::Option::None,
                }
            }
        }
    })
}

/// Derive the closed set of message-type tags a service recognizes
///
/// Each unit variant maps to its SCREAMING_SNAKE name unless overridden with
/// `#[tag = "..."]`.
#[proc_macro_derive(MessageKind, attributes(tag))]
pub fn derive_message_kind(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    expand_message_kind(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
