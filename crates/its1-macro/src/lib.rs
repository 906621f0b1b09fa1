//! Derive macro for `helios_its1::Graphable`.
//!
//! Generates the static `TypeMetadata` table of a struct, its slot-indexed
//! property reader and, when a field is marked `#[null_flavor]`, the
//! null-flavor capability.
//!
//! ## Attributes
//!
//! | Attribute | Placement | Meaning |
//! |-----------|-----------|---------|
//! | `#[structure(name = "...", kind = "...")]` | struct | element name (default: struct name) and structure kind (`entity`, `interaction`, `data_type`, `other`; default `other`) |
//! | `#[property(name = "...", role = "...", sort_key = N)]` | field | wire name (default: lowerCamelCase field name), role and sort key; repeat the attribute for a grouped declaration |
//! | `#[property(skip)]` | field | the field is not part of the wire schema |
//! | `#[null_flavor]` | field of type `Option<NullFlavor>` | the instance's null flavor |
//!
//! Fields without a `#[property]` attribute are still graphed and carry no
//! declaration (Structural, sort key 0). A key may appear only once per
//! `#[property]` attribute.

use heck::ToLowerCamelCase;
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::{
    Data, DeriveInput, Field, Fields, Ident, LitInt, LitStr, Token, parse_macro_input,
    spanned::Spanned,
};

#[proc_macro_derive(Graphable, attributes(structure, property, null_flavor))]
pub fn derive_graphable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// One `#[property(role = ..., sort_key = ...)]` declaration.
struct Declaration {
    role: Ident,
    sort_key: i32,
}

/// A field that is part of the wire schema.
struct GraphedField {
    ident: Ident,
    name: String,
    declarations: Vec<Declaration>,
}

struct Structure {
    element_name: String,
    kind: Ident,
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let ident = &input.ident;
    let structure = parse_structure(input)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new(
                    input.span(),
                    "Graphable can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new(
                input.span(),
                "Graphable can only be derived for structs",
            ));
        }
    };

    let mut graphed = Vec::new();
    let mut null_flavor: Option<&Ident> = None;
    for field in fields {
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new(field.span(), "expected a named field"))?;

        if has_attribute(field, "null_flavor") {
            if null_flavor.is_some() {
                return Err(syn::Error::new(
                    field.span(),
                    "only one field can be marked #[null_flavor]",
                ));
            }
            null_flavor = Some(field_ident);
        }

        if let Some(field) = parse_field(field, field_ident)? {
            graphed.push(field);
        }
    }

    let element_name = &structure.element_name;
    let kind = &structure.kind;

    let property_tables = graphed.iter().map(|field| {
        let name = &field.name;
        let declarations = field.declarations.iter().map(|decl| {
            let role = &decl.role;
            let sort_key = decl.sort_key;
            quote! {
                ::helios_its1::PropertyDeclaration {
                    role: ::helios_its1::PropertyRole::#role,
                    sort_key: #sort_key,
                }
            }
        });
        quote! {
            ::helios_its1::PropertyMetadata {
                name: #name,
                declarations: &[#(#declarations),*],
            }
        }
    });

    let readers = graphed.iter().enumerate().map(|(slot, field)| {
        let field_ident = &field.ident;
        quote! {
            #slot => ::core::option::Option::Some(
                ::helios_its1::IntoPropertyValue::to_property_value(&self.#field_ident)
            ),
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let null_flavor_impl = null_flavor.map(|field_ident| {
        quote! {
            impl #impl_generics ::helios_its1::NullFlavored for #ident #ty_generics #where_clause {
                fn null_flavor(&self) -> ::core::option::Option<::helios_its1::NullFlavor> {
                    ::core::clone::Clone::clone(&self.#field_ident)
                }
            }
        }
    });
    let null_flavor_capability = null_flavor.map(|_| {
        quote! {
            fn as_null_flavored(&self) -> ::core::option::Option<&dyn ::helios_its1::NullFlavored> {
                ::core::option::Option::Some(self)
            }
        }
    });

    Ok(quote! {
        impl #impl_generics ::helios_its1::Graphable for #ident #ty_generics #where_clause {
            fn type_metadata() -> &'static ::helios_its1::TypeMetadata {
                static METADATA: ::helios_its1::TypeMetadata = ::helios_its1::TypeMetadata {
                    type_name: ::core::concat!(::core::module_path!(), "::", ::core::stringify!(#ident)),
                    element_name: #element_name,
                    structure_kind: ::helios_its1::StructureKind::#kind,
                    properties: &[#(#property_tables),*],
                };
                &METADATA
            }

            fn metadata(&self) -> &'static ::helios_its1::TypeMetadata {
                <Self as ::helios_its1::Graphable>::type_metadata()
            }

            fn read_property(&self, slot: usize) -> ::core::option::Option<::helios_its1::PropertyValue<'_>> {
                match slot {
                    #(#readers)*
                    _ => ::core::option::Option::None,
                }
            }

            #null_flavor_capability
        }

        impl #impl_generics ::helios_its1::IntoPropertyValue for #ident #ty_generics #where_clause {
            fn to_property_value(&self) -> ::helios_its1::PropertyValue<'_> {
                ::helios_its1::PropertyValue::Node(self)
            }
        }

        #null_flavor_impl
    })
}

fn has_attribute(field: &Field, name: &str) -> bool {
    field.attrs.iter().any(|attr| attr.path().is_ident(name))
}

fn parse_structure(input: &DeriveInput) -> syn::Result<Structure> {
    let mut structure = Structure {
        element_name: input.ident.to_string(),
        kind: Ident::new("Other", Span::call_site()),
    };

    for attr in input.attrs.iter().filter(|a| a.path().is_ident("structure")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let name: LitStr = meta.value()?.parse()?;
                structure.element_name = name.value();
                Ok(())
            } else if meta.path.is_ident("kind") {
                let kind: LitStr = meta.value()?.parse()?;
                let variant = structure_kind_variant(&kind.value())
                    .ok_or_else(|| meta.error(format!("unknown structure kind '{}'", kind.value())))?;
                structure.kind = Ident::new(variant, kind.span());
                Ok(())
            } else {
                Err(meta.error("expected `name` or `kind`"))
            }
        })?;
    }

    Ok(structure)
}

/// Parses the `#[property]` attributes of a field. Returns `None` for skipped fields.
fn parse_field(field: &Field, field_ident: &Ident) -> syn::Result<Option<GraphedField>> {
    let mut name: Option<String> = None;
    let mut declarations = Vec::new();
    let mut skip = false;

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("property")) {
        let mut role: Option<Ident> = None;
        let mut sort_key: Option<i32> = None;
        let mut named = false;

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else if meta.path.is_ident("name") {
                if named {
                    return Err(meta.error("duplicate `name` in one #[property] attribute"));
                }
                named = true;
                let value: LitStr = meta.value()?.parse()?;
                // Grouped declarations: the first name wins
                if name.is_none() {
                    name = Some(value.value());
                }
                Ok(())
            } else if meta.path.is_ident("role") {
                if role.is_some() {
                    return Err(meta.error(
                        "duplicate `role` in one #[property] attribute; \
                         repeat the attribute to group declarations",
                    ));
                }
                let value: LitStr = meta.value()?.parse()?;
                let variant = role_variant(&value.value())
                    .ok_or_else(|| meta.error(format!("unknown property role '{}'", value.value())))?;
                role = Some(Ident::new(variant, value.span()));
                Ok(())
            } else if meta.path.is_ident("sort_key") {
                if sort_key.is_some() {
                    return Err(meta.error(
                        "duplicate `sort_key` in one #[property] attribute; \
                         repeat the attribute to group declarations",
                    ));
                }
                let value = meta.value()?;
                let negative = value.peek(Token![-]);
                if negative {
                    value.parse::<Token![-]>()?;
                }
                let literal: LitInt = value.parse()?;
                let parsed: i32 = literal.base10_parse()?;
                sort_key = Some(if negative { -parsed } else { parsed });
                Ok(())
            } else {
                Err(meta.error("expected `name`, `role`, `sort_key` or `skip`"))
            }
        })?;

        if role.is_some() || sort_key.is_some() {
            declarations.push(Declaration {
                role: role.unwrap_or_else(|| Ident::new("Structural", Span::call_site())),
                sort_key: sort_key.unwrap_or_default(),
            });
        }
    }

    if skip {
        return Ok(None);
    }

    Ok(Some(GraphedField {
        ident: field_ident.clone(),
        name: name.unwrap_or_else(|| wire_name(field_ident)),
        declarations,
    }))
}

/// Default wire name of a field: its identifier in lowerCamelCase.
fn wire_name(ident: &Ident) -> String {
    let raw = ident.to_string();
    raw.trim_start_matches("r#").to_lower_camel_case()
}

fn role_variant(role: &str) -> Option<&'static str> {
    match role.to_lowercase().as_str() {
        "structural" => Some("Structural"),
        "non_structural" | "nonstructural" => Some("NonStructural"),
        "traversable_association" | "traversableassociation" | "traversable" => {
            Some("TraversableAssociation")
        }
        _ => None,
    }
}

fn structure_kind_variant(kind: &str) -> Option<&'static str> {
    match kind.to_lowercase().as_str() {
        "entity" => Some("Entity"),
        "interaction" => Some("Interaction"),
        "datatype" | "data_type" => Some("DataType"),
        "other" => Some("Other"),
        _ => None,
    }
}
