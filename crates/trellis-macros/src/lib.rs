//! Procedural macros for Trellis item projection.
//!
//! This crate provides `#[derive(PickerItem)]`, which lets a plain struct be
//! bound to a `BindablePicker` and have its entries projected by field name.
//!
//! # Attributes
//!
//! ## `#[picker(...)]` on the struct
//!
//! - `display`: use the type's `Display` impl as its default text instead of
//!   the type name
//!
//! ## `#[picker(...)]` on a field
//!
//! - `skip`: hide the field from display-field lookup
//! - `rename = "name"`: expose the field under a different name
//!
//! ```ignore
//! #[derive(Debug, Clone, PartialEq, PickerItem)]
//! #[picker(display)]
//! struct Airport {
//!     #[picker(rename = "code")]
//!     iata: String,
//!     city: String,
//!     #[picker(skip)]
//!     internal_id: u64,
//! }
//! ```
//!
//! Every exposed field type must implement `trellis::projection::FieldText`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Field, Fields, Ident, LitStr, parse_macro_input};

/// Derive `FieldLookup` and `PickerItem`.
///
/// Fields are exposed in declaration order under their own names. The
/// default display text is the type name, or the `Display` output with
/// `#[picker(display)]`.
///
/// # Example
///
/// ```ignore
/// use trellis::PickerItem;
///
/// #[derive(Debug, Clone, PartialEq, PickerItem)]
/// struct Person {
///     name: String,
///     nickname: Option<String>,
/// }
/// ```
#[proc_macro_derive(PickerItem, attributes(picker))]
pub fn derive_picker_item(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match impl_derive_picker_item(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// A field exposed to display-field lookup.
struct ExposedField {
    ident: Ident,
    name: String,
}

/// Parsed struct-level picker attributes.
struct ItemAttrs {
    display: bool,
}

fn impl_derive_picker_item(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let struct_name = &input.ident;
    let item_attrs = parse_item_attrs(&input.attrs)?;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => return Ok(generate(input, &item_attrs, &[])),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    input,
                    "PickerItem derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                struct_name,
                "PickerItem derive only supports structs",
            ));
        }
    };

    let mut exposed = Vec::new();
    for field in fields {
        if let Some(field) = parse_field(field)? {
            if exposed.iter().any(|e: &ExposedField| e.name == field.name) {
                return Err(syn::Error::new_spanned(
                    &field.ident,
                    format!("duplicate picker field name `{}`", field.name),
                ));
            }
            exposed.push(field);
        }
    }

    Ok(generate(input, &item_attrs, &exposed))
}

fn generate(input: &DeriveInput, item_attrs: &ItemAttrs, exposed: &[ExposedField]) -> TokenStream2 {
    let struct_name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let names: Vec<&str> = exposed.iter().map(|f| f.name.as_str()).collect();
    let idents: Vec<&Ident> = exposed.iter().map(|f| &f.ident).collect();

    let display = if item_attrs.display {
        quote! { ::std::string::ToString::to_string(self) }
    } else {
        let type_name = struct_name.to_string();
        quote! { ::std::string::String::from(#type_name) }
    };

    quote! {
        impl #impl_generics ::trellis::projection::FieldLookup for #struct_name #ty_generics #where_clause {
            fn field_names(&self) -> &'static [&'static str] {
                &[#(#names),*]
            }

            fn read_field(
                &self,
                name: &str,
            ) -> ::std::result::Result<::std::string::String, ::trellis::ProjectionError> {
                match name {
                    #(#names => ::trellis::projection::FieldText::field_text(&self.#idents, name),)*
                    _ => ::std::result::Result::Err(::trellis::ProjectionError::UnknownField {
                        field: ::std::string::ToString::to_string(name),
                    }),
                }
            }
        }

        impl #impl_generics ::trellis::projection::PickerItem for #struct_name #ty_generics #where_clause {
            fn display_text(&self) -> ::std::string::String {
                #display
            }
        }
    }
}

/// Parse struct-level #[picker(...)] attributes.
fn parse_item_attrs(attrs: &[Attribute]) -> syn::Result<ItemAttrs> {
    let mut result = ItemAttrs { display: false };

    for attr in attrs {
        if !attr.path().is_ident("picker") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("display") {
                result.display = true;
                Ok(())
            } else {
                Err(meta.error("unsupported picker attribute, expected `display`"))
            }
        })?;
    }

    Ok(result)
}

/// Parse a field's #[picker(...)] attributes. Returns `None` for skipped fields.
fn parse_field(field: &Field) -> syn::Result<Option<ExposedField>> {
    let Some(ident) = &field.ident else {
        return Ok(None);
    };

    let mut skip = false;
    let mut rename = None;

    for attr in &field.attrs {
        if !attr.path().is_ident("picker") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported picker field attribute, expected `skip` or `rename`"))
            }
        })?;
    }

    if skip {
        return Ok(None);
    }

    // Raw identifiers keep their `r#` prefix in `to_string`.
    let ident_name = ident.to_string();
    let name = rename.unwrap_or_else(|| ident_name.trim_start_matches("r#").to_string());

    Ok(Some(ExposedField {
        ident: ident.clone(),
        name,
    }))
}
