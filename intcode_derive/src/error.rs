//! `#[derive(Error)]` for VM error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations from
//! a per-variant `#[error("...")]` message.
//!
//! # Usage
//!
//! ```ignore
//! use intcode_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum VMError {
//!     #[error("invalid opcode {opcode} at {ip}")]
//!     InvalidOpcode { opcode: i64, ip: usize },
//!
//!     #[error("io error: {0}")]
//!     IoError(String),
//!
//!     #[error("machine halted")]
//!     Halted,
//! }
//! ```
//!
//! Messages may interpolate named fields (`{ip}`) and positional tuple fields
//! (`{0}`, `{1}`).

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, format_ident, quote};
use syn::{Data, DeriveInput, Fields, Lit, Meta, parse_macro_input};

pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => TokenStream::from(tokens),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = match &input.data {
        Data::Enum(data) => {
            let arms = data
                .variants
                .iter()
                .map(variant_arm)
                .collect::<syn::Result<Vec<_>>>()?;
            quote! {
                match self {
                    #(#arms)*
                }
            }
        }
        Data::Struct(data) => {
            let message = message_from_attrs(
                &input.attrs,
                &input.ident,
                &format!("type `{}`", input.ident),
            )?;
            struct_body(&message, &data.fields)
        }
        Data::Union(_) => {
            return Err(syn::Error::new_spanned(
                input,
                "Error derive does not support unions",
            ));
        }
    };

    Ok(quote! {
        impl #impl_generics ::std::fmt::Display for #name #ty_generics #where_clause {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                #body
            }
        }

        impl #impl_generics ::std::error::Error for #name #ty_generics #where_clause {}
    })
}

/// Builds the `Display` match arm for one enum variant.
fn variant_arm(variant: &syn::Variant) -> syn::Result<TokenStream2> {
    let ident = &variant.ident;
    let message = message_from_attrs(
        &variant.attrs,
        &variant.ident,
        &format!("variant `{}`", variant.ident),
    )?;

    Ok(match &variant.fields {
        Fields::Unit => quote! {
            Self::#ident => write!(f, #message),
        },
        Fields::Unnamed(fields) => {
            let bindings: Vec<_> = (0..fields.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let message = positional_to_named(&message, fields.unnamed.len());
            quote! {
                Self::#ident(#(#bindings),*) => write!(f, #message, #(#bindings = #bindings),*),
            }
        }
        Fields::Named(fields) => {
            let names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
            quote! {
                Self::#ident { #(#names),* } => write!(f, #message, #(#names = #names),*),
            }
        }
    })
}

fn struct_body(message: &str, fields: &Fields) -> TokenStream2 {
    match fields {
        Fields::Unit => quote! {
            write!(f, #message)
        },
        Fields::Named(fields) => {
            let names: Vec<_> = fields.named.iter().map(|f| &f.ident).collect();
            quote! {
                write!(f, #message, #(#names = self.#names),*)
            }
        }
        Fields::Unnamed(fields) => {
            let bindings: Vec<_> = (0..fields.unnamed.len())
                .map(|i| format_ident!("f{}", i))
                .collect();
            let indices: Vec<_> = (0..fields.unnamed.len()).map(syn::Index::from).collect();
            let message = positional_to_named(message, fields.unnamed.len());
            quote! {
                write!(f, #message, #(#bindings = self.#indices),*)
            }
        }
    }
}

/// Reads the string literal out of an `#[error("...")]` attribute.
fn message_from_attrs<T: ToTokens>(
    attrs: &[syn::Attribute],
    target: &T,
    target_desc: &str,
) -> syn::Result<String> {
    let Some(attr) = attrs.iter().find(|a| a.path().is_ident("error")) else {
        return Err(syn::Error::new_spanned(
            target,
            format!("missing #[error(\"...\")] attribute on {target_desc}"),
        ));
    };

    let Meta::List(list) = &attr.meta else {
        return Err(syn::Error::new_spanned(
            &attr.meta,
            "expected #[error(\"message\")]",
        ));
    };

    match syn::parse2::<Lit>(list.tokens.clone()) {
        Ok(Lit::Str(lit)) => Ok(lit.value()),
        Ok(_) => Err(syn::Error::new_spanned(
            &attr.meta,
            "#[error] message must be a string literal, e.g. #[error(\"invalid opcode {opcode}\")]",
        )),
        Err(_) => Err(syn::Error::new_spanned(
            &attr.meta,
            "failed to parse #[error] attribute; expected a string literal",
        )),
    }
}

/// Rewrites `{0}`, `{1}` into `{f0}`, `{f1}` so tuple fields can be passed as named args.
fn positional_to_named(message: &str, field_count: usize) -> String {
    let mut result = message.to_string();
    for i in (0..field_count).rev() {
        result = result.replace(&format!("{{{i}}}"), &format!("{{f{i}}}"));
        result = result.replace(&format!("{{{i}:"), &format!("{{f{i}:"));
    }
    result
}
