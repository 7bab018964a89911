//! Attribute parsing for `#[oolong(...)]` annotations.

use syn::{Attribute, Lit};

/// How the generated code constructs the instance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Collect per-field slots, then build with a single struct literal.
    #[default]
    Positional,
    /// Collect slots, then apply them over `Self::default()`.
    Keyword,
    /// Build `Self::default()` first and assign fields as members arrive.
    Mutable,
}

/// Container-level attributes (on the struct/enum itself)
#[derive(Debug, Default)]
pub struct ContainerAttrs {
    /// Construction strategy: `#[oolong(strategy = "mutable")]`
    pub strategy: Strategy,
    /// Untagged scalar union: `#[oolong(untagged)]`
    pub untagged: bool,
}

/// Field- and variant-level attributes
#[derive(Debug, Default)]
pub struct FieldAttrs {
    /// Override the JSON key: `#[oolong(rename = "json_key")]`
    pub rename: Option<String>,
    /// Never read this field from the input: `#[oolong(skip)]`
    pub skip: bool,
    /// Use `Default::default()` when the key is missing: `#[oolong(default)]`
    pub default: bool,
    /// Custom default expression: `#[oolong(default = "expr")]`
    pub default_expr: Option<String>,
}

fn parse_str_value(meta: &syn::meta::ParseNestedMeta) -> syn::Result<String> {
    let value = meta.value()?;
    let lit: Lit = value.parse()?;
    match lit {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

impl ContainerAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();
        for attr in attrs {
            if !attr.path().is_ident("oolong") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("strategy") {
                    let value = parse_str_value(&meta)?;
                    result.strategy = match value.as_str() {
                        "positional" => Strategy::Positional,
                        "keyword" => Strategy::Keyword,
                        "mutable" => Strategy::Mutable,
                        other => {
                            return Err(meta.error(format!(
                                "unknown strategy `{}` (expected positional, keyword, or mutable)",
                                other
                            )))
                        }
                    };
                    return Ok(());
                }
                if meta.path.is_ident("untagged") {
                    result.untagged = true;
                    return Ok(());
                }
                Err(meta.error("unknown oolong container attribute"))
            })?;
        }
        Ok(result)
    }
}

impl FieldAttrs {
    pub fn from_attrs(attrs: &[Attribute]) -> syn::Result<Self> {
        let mut result = Self::default();
        for attr in attrs {
            if !attr.path().is_ident("oolong") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    result.rename = Some(parse_str_value(&meta)?);
                    return Ok(());
                }
                if meta.path.is_ident("skip") {
                    result.skip = true;
                    return Ok(());
                }
                if meta.path.is_ident("default") {
                    result.default = true;
                    if meta.input.peek(syn::Token![=]) {
                        result.default_expr = Some(parse_str_value(&meta)?);
                    }
                    return Ok(());
                }
                Err(meta.error("unknown oolong field attribute"))
            })?;
        }
        Ok(result)
    }
}
