//! Derive macro for packetwire.
//!
//! Provides `#[derive(Packet)]`, which generates the field table that drives
//! encoding and decoding of a packet struct.

use std::collections::BTreeMap;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{DeriveInput, Result};

use crate::support::{parse_field_metadata, FieldKind, FieldMetadata};

mod support;


/// Derive macro for implementing the `Message` trait.
///
/// Note: You must also derive or implement `Default` for your struct.
///
/// # Example
///
/// ```ignore
/// #[derive(Default, Packet)]
/// pub struct LoginRequest {
///     #[packet(tag = 1)]
///     account: Option<String>,
///     #[packet(tag = 2)]
///     client_version: u32,
///     #[packet(tag = 3, repeated)]
///     capabilities: Repeated<u32>,
///     #[packet(skip)]
///     received_at: Option<std::time::Instant>,
/// }
/// ```
///
/// The wire type of each field is inferred from its Rust type, so there's no
/// need to specify it. Fields are encoded in declaration order.
#[proc_macro_derive(Packet, attributes(packet))]
pub fn derive_packet(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);

    match impl_packet(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn impl_packet(input: &DeriveInput) -> Result<TokenStream2> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic packets are not supported",
        ));
    }

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "only named fields supported",
                ))
            }
        },
        _ => return Err(syn::Error::new_spanned(input, "only structs supported")),
    };

    let fields = fields
        .iter()
        .map(parse_field_metadata)
        .collect::<Result<Vec<_>>>()?;

    // Field numbers must be unique within a packet.
    let mut seen = BTreeMap::new();
    for field in &fields {
        let Some(tag) = field.kind.tag() else {
            continue;
        };
        if let Some(previous) = seen.insert(tag, field.name) {
            return Err(syn::Error::new_spanned(
                field.name,
                format!("duplicate tag {tag}, already used by `{previous}`"),
            ));
        }
    }

    let name_str = name.to_string();
    let entries = fields.iter().filter_map(|field| generate_entry(name, field));

    Ok(quote! {
        impl ::packetwire::Message for #name {
            const DESCRIPTOR: ::packetwire::descriptor::MessageDescriptor<Self> =
                ::packetwire::descriptor::MessageDescriptor {
                    name: #name_str,
                    fields: &[#(#entries),*],
                };
        }
    })
}

fn generate_entry(packet: &syn::Ident, field: &FieldMetadata) -> Option<TokenStream2> {
    let fname = field.name;
    let fname_str = fname.to_string();

    let (tag, access) = match &field.kind {
        FieldKind::Singular { tag } => {
            let fty = field.ty;
            let access = quote! {
                ::packetwire::descriptor::Singular::<#packet, #fty> {
                    get: |msg| &msg.#fname,
                    get_mut: |msg| &mut msg.#fname,
                }
            };
            (*tag, access)
        }
        FieldKind::Repeated { tag, elem } => {
            let access = quote! {
                ::packetwire::descriptor::RepeatedField::<#packet, #elem> {
                    get: |msg| &msg.#fname,
                    get_mut: |msg| &mut msg.#fname,
                }
            };
            (*tag, access)
        }
        FieldKind::Skip => return None,
    };

    Some(quote! {
        ::packetwire::descriptor::FieldEntry {
            number: #tag,
            name: #fname_str,
            access: &#access,
        }
    })
}
