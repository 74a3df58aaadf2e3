//! Types and functions related to parsing the input from our proc-macro.

use darling::FromMeta;
use syn::spanned::Spanned;
use syn::{Field, GenericArgument, Ident, PathArguments, Result, Type};

/// Minimum value of a field number.
const MINIMUM_TAG_VAL: u32 = 1;
/// Maximum value of a field number, the key leaves 29 bits for it.
const MAXIMUM_TAG_VAL: u32 = (1 << 29) - 1;

/// Metadata for a single field annotated with `#[packet(...)]`.
pub struct FieldMetadata<'a> {
    /// Name of the field.
    pub name: &'a Ident,
    /// Type of the field.
    pub ty: &'a Type,
    /// The kind of field parsed from `#[packet(...)]` attributes.
    pub kind: FieldKind<'a>,
}

/// The kind of field within a packet struct.
pub enum FieldKind<'a> {
    /// Field holding at most one value, omitted from the wire when default.
    Singular { tag: u32 },
    /// `Repeated<T>` field, `elem` is the `T`.
    Repeated { tag: u32, elem: &'a Type },
    /// Not part of the wire format, left at its `Default` value when decoding.
    Skip,
}

impl FieldKind<'_> {
    /// Returns the field number, if this field is on the wire.
    pub fn tag(&self) -> Option<u32> {
        match self {
            FieldKind::Singular { tag } | FieldKind::Repeated { tag, .. } => Some(*tag),
            FieldKind::Skip => None,
        }
    }
}

/// Raw attributes parsed from `#[packet(...)]` on a field.
///
/// We parse these and then transform them into a [`FieldKind`] with [`parse_field_metadata`].
#[derive(Debug, Default, FromMeta)]
#[darling(default)]
struct RawPacketFieldAttrs {
    tag: Option<u32>,
    repeated: bool,
    skip: bool,
}

/// Parse `#[packet(...)]` attributes from a [`Field`], validates them, and returns
/// a complete [`FieldMetadata`].
pub fn parse_field_metadata(field: &Field) -> Result<FieldMetadata<'_>> {
    let name = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "only named fields supported"))?;

    let raw = field
        .attrs
        .iter()
        .find(|attr| attr.path().is_ident("packet"))
        .map(|attr| RawPacketFieldAttrs::from_meta(&attr.meta))
        .transpose()
        .map_err(|e| syn::Error::new_spanned(field, e.to_string()))?
        .unwrap_or_default();

    let kind = match (raw.skip, raw.repeated, raw.tag) {
        (true, false, None) => FieldKind::Skip,
        (true, _, _) => {
            return Err(syn::Error::new_spanned(
                field,
                "conflicting field attributes",
            ));
        }
        (false, _, None) => {
            return Err(syn::Error::new_spanned(
                field,
                "missing #[packet(tag = N)] attribute",
            ));
        }
        (false, repeated, Some(tag)) => {
            validate_tag(tag, field.span())?;
            if repeated {
                let elem = repeated_element_type(&field.ty).ok_or_else(|| {
                    syn::Error::new_spanned(&field.ty, "repeated field must have type Repeated<T>")
                })?;
                FieldKind::Repeated { tag, elem }
            } else {
                FieldKind::Singular { tag }
            }
        }
    };

    Ok(FieldMetadata {
        name,
        ty: &field.ty,
        kind,
    })
}

/// Validates that a field number fits in a field key.
pub fn validate_tag(tag: u32, span: proc_macro2::Span) -> Result<()> {
    if !(MINIMUM_TAG_VAL..=MAXIMUM_TAG_VAL).contains(&tag) {
        let msg = format!(
            "Tag number '{}' is invalid. Valid tag numbers are in the range [{}, {}]",
            tag, MINIMUM_TAG_VAL, MAXIMUM_TAG_VAL,
        );
        return Err(syn::Error::new(span, msg));
    }

    Ok(())
}

/// Returns `T` for a type spelled `Repeated<T>`, with or without a path prefix.
fn repeated_element_type(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Repeated" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(elem) if args.args.len() == 1 => Some(elem),
        _ => None,
    }
}
