//! Derive macros for dialog-memory reflectable objects.
//!
//! This crate provides the `#[derive(Reflect)]` macro, which exposes the
//! named fields of a struct as path-addressable properties.
//!
//! # Example
//!
//! ```ignore
//! use dialog_memory::Reflect;
//!
//! #[derive(Debug, Clone, Reflect)]
//! struct UserProfile {
//!     #[reflect(rename = "displayName")]
//!     display_name: String,
//!
//!     #[reflect(read_only)]
//!     id: u64,
//!
//!     tags: Vec<String>,
//!
//!     #[reflect(skip)]
//!     cache: Option<String>,
//! }
//! ```

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, spanned::Spanned, Data, DeriveInput, Error, Fields, Ident, LitStr};

/// Derive macro for implementing the `Reflect` trait.
///
/// # Attributes
///
/// ## Field-level
///
/// - `#[reflect(rename = "...")]` - Expose the field under another name.
/// - `#[reflect(read_only)]` - Paths may read but not assign the field.
/// - `#[reflect(skip)]` - Do not expose the field.
///
/// # Generated Code
///
/// The macro generates:
/// - `Reflect` trait implementation
/// - `IntoValue` and `FromValue` implementations, so the struct can be a
///   field of another reflected struct
///
/// The struct must implement `Clone` and `Debug`, and every exposed field
/// type must implement `IntoValue` and `FromValue`.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_reflect_impl(input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_reflect_impl(input: DeriveInput) -> Result<TokenStream2, Error> {
    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(Error::new(
                    input.ident.span(),
                    "Reflect can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new(
                input.ident.span(),
                "Reflect can only be derived for structs",
            ))
        }
    };

    let mut exposed = Vec::new();
    for field in fields {
        let ident = field
            .ident
            .clone()
            .ok_or_else(|| Error::new(field.span(), "expected a named field"))?;
        let attrs = parse_field_attrs(field)?;
        if attrs.skip {
            continue;
        }
        let property = attrs.rename.unwrap_or_else(|| ident.to_string());
        if exposed.iter().any(|f: &ExposedField| f.property == property) {
            return Err(Error::new(
                ident.span(),
                format!("Duplicate reflected property name '{}'", property),
            ));
        }
        exposed.push(ExposedField {
            ident,
            property,
            writable: !attrs.read_only,
        });
    }

    let property_specs = exposed.iter().map(|f| {
        let property = &f.property;
        let writable = f.writable;
        quote! { ::dialog_memory::reflect::Property::new(#property, #writable) }
    });

    let get_arms = exposed.iter().map(|f| {
        let ident = &f.ident;
        let property = &f.property;
        quote! {
            #property => ::std::option::Option::Some(
                ::dialog_memory::IntoValue::into_value(::std::clone::Clone::clone(&self.#ident))
            ),
        }
    });

    let set_arms = exposed.iter().map(|f| {
        let ident = &f.ident;
        let property = &f.property;
        quote! {
            #property => {
                self.#ident = ::dialog_memory::FromValue::from_value(value).map_err(|e| {
                    ::dialog_memory::Error::property_type(#property, e.to_string())
                })?;
                ::std::result::Result::Ok(())
            }
        }
    });

    let expanded = quote! {
        impl #impl_generics ::dialog_memory::reflect::Reflect for #name #ty_generics #where_clause {
            fn type_name(&self) -> &'static str {
                #name_str
            }

            fn properties(&self) -> &'static [::dialog_memory::reflect::Property] {
                const PROPERTIES: &[::dialog_memory::reflect::Property] = &[
                    #(#property_specs),*
                ];
                PROPERTIES
            }

            fn get(&self, name: &str) -> ::std::option::Option<::dialog_memory::Value> {
                match name {
                    #(#get_arms)*
                    _ => ::std::option::Option::None,
                }
            }

            fn set(
                &mut self,
                name: &str,
                value: ::dialog_memory::Value,
            ) -> ::dialog_memory::Result<()> {
                let _ = &value;
                match name {
                    #(#set_arms)*
                    other => ::std::result::Result::Err(
                        ::dialog_memory::Error::property_type(other, "no such property")
                    ),
                }
            }

            fn clone_box(&self) -> ::std::boxed::Box<dyn ::dialog_memory::reflect::Reflect> {
                ::std::boxed::Box::new(::std::clone::Clone::clone(self))
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl #impl_generics ::dialog_memory::IntoValue for #name #ty_generics #where_clause {
            fn into_value(self) -> ::dialog_memory::Value {
                ::dialog_memory::Value::Object(::std::boxed::Box::new(self))
            }
        }

        impl #impl_generics ::dialog_memory::FromValue for #name #ty_generics #where_clause {
            fn from_value(value: ::dialog_memory::Value) -> ::dialog_memory::Result<Self> {
                match &value {
                    ::dialog_memory::Value::Object(object) => {
                        let object: &dyn ::dialog_memory::reflect::Reflect = &**object;
                        ::dialog_memory::reflect::Reflect::as_any(object)
                            .downcast_ref::<Self>()
                            .cloned()
                            .ok_or_else(|| ::dialog_memory::Error::UnsupportedConversion(
                                ::std::format!(
                                    "expected {}, found {}",
                                    #name_str,
                                    ::dialog_memory::reflect::Reflect::type_name(object)
                                )
                            ))
                    }
                    other => ::std::result::Result::Err(
                        ::dialog_memory::Error::UnsupportedConversion(
                            ::std::format!("expected {}, found {}", #name_str, other.kind())
                        )
                    ),
                }
            }
        }
    };

    Ok(expanded)
}

/// A field exposed as a property.
struct ExposedField {
    ident: Ident,
    property: String,
    writable: bool,
}

/// Parsed field attributes.
#[derive(Default)]
struct FieldAttrs {
    rename: Option<String>,
    read_only: bool,
    skip: bool,
}

/// Parse #[reflect(...)] field attributes.
fn parse_field_attrs(field: &syn::Field) -> Result<FieldAttrs, Error> {
    let mut result = FieldAttrs::default();

    for attr in &field.attrs {
        if !attr.path().is_ident("reflect") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                let value: LitStr = meta.value()?.parse()?;
                if value.value().is_empty() {
                    return Err(meta.error("rename cannot be empty"));
                }
                result.rename = Some(value.value());
                Ok(())
            } else if meta.path.is_ident("read_only") {
                result.read_only = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                result.skip = true;
                Ok(())
            } else {
                Err(meta.error(
                    "unknown reflect attribute, expected 'rename', 'read_only', or 'skip'",
                ))
            }
        })?;
    }

    Ok(result)
}
