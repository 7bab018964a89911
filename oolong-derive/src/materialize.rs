//! Codegen for `#[derive(Materialize)]` and `#[derive(MaterializeInto)]`.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DataEnum, DataStruct, DeriveInput, Fields};

use crate::attrs::{ContainerAttrs, FieldAttrs, Strategy};

struct NamedField {
    ident: syn::Ident,
    ty: syn::Type,
    json_key: String,
    skip: bool,
    default: TokenStream,
}

fn collect_named(fields: &syn::FieldsNamed) -> syn::Result<Vec<NamedField>> {
    let mut out = Vec::new();
    for field in &fields.named {
        let attrs = FieldAttrs::from_attrs(&field.attrs)?;
        let ident = field.ident.clone().expect("named field");
        let json_key = attrs.rename.unwrap_or_else(|| ident.to_string());
        let default = match &attrs.default_expr {
            Some(expr_str) => {
                let expr: syn::Expr = syn::parse_str(expr_str)?;
                quote! { #expr }
            }
            None => quote! { ::std::default::Default::default() },
        };
        out.push(NamedField {
            ident,
            ty: field.ty.clone(),
            json_key,
            skip: attrs.skip,
            default,
        });
    }
    Ok(out)
}

pub fn derive(input: &DeriveInput) -> syn::Result<TokenStream> {
    let container = ContainerAttrs::from_attrs(&input.attrs)?;
    match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(fields),
            ..
        }) => derive_named_struct(input, fields, container.strategy),
        Data::Struct(DataStruct {
            fields: Fields::Unnamed(fields),
            ..
        }) => derive_tuple_struct(input, fields),
        Data::Enum(data) if container.untagged => derive_untagged_enum(input, data),
        Data::Enum(data) => derive_string_enum(input, data),
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "Materialize can only be derived for structs with fields or enums",
        )),
    }
}

fn wrap_impl(input: &DeriveInput, body: TokenStream) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();
    quote! {
        impl #impl_generics ::oolong::Materialize for #name #type_generics #where_clause {
            fn materialize(
                view: &::oolong::View<'_>,
            ) -> ::oolong::Result<::oolong::Consumed<Self>> {
                #body
            }
        }
    }
}

/// One `if key.matches(...)` arm per field, storing into its slot.
fn slot_arms(name_str: &str, fields: &[&NamedField], slots: &[syn::Ident]) -> Vec<TokenStream> {
    fields
        .iter()
        .zip(slots)
        .map(|(f, slot)| {
            let ty = &f.ty;
            let key = &f.json_key;
            let path = format!("{}.{}", name_str, key);
            quote! {
                if __key.matches(#key) {
                    let __c = <#ty as ::oolong::Materialize>::materialize(__child)
                        .map_err(|e| ::oolong::field_error(e, #path))?;
                    #slot = ::std::option::Option::Some(__c.value);
                    return ::std::result::Result::Ok(::oolong::Flow::Advance(__c.end));
                }
            }
        })
        .collect()
}

fn derive_named_struct(
    input: &DeriveInput,
    fields: &syn::FieldsNamed,
    strategy: Strategy,
) -> syn::Result<TokenStream> {
    let name_str = input.ident.to_string();
    let fs = collect_named(fields)?;
    let active: Vec<&NamedField> = fs.iter().filter(|f| !f.skip).collect();
    let slots: Vec<syn::Ident> = active
        .iter()
        .map(|f| format_ident!("__slot_{}", f.ident))
        .collect();
    let slot_tys: Vec<&syn::Type> = active.iter().map(|f| &f.ty).collect();
    let arms = slot_arms(&name_str, &active, &slots);

    let kind_check = quote! {
        if view.kind() != ::oolong::Kind::Object {
            return ::std::result::Result::Err(
                ::oolong::Error::mismatch(view.pos(), #name_str),
            );
        }
    };

    let body = match strategy {
        Strategy::Positional => {
            let finals: Vec<TokenStream> = fs
                .iter()
                .map(|f| {
                    let id = &f.ident;
                    let dflt = &f.default;
                    if f.skip {
                        quote! { #id: #dflt }
                    } else {
                        let slot = format_ident!("__slot_{}", id);
                        quote! { #id: #slot.unwrap_or_else(|| #dflt) }
                    }
                })
                .collect();
            quote! {
                #kind_check
                #(let mut #slots: ::std::option::Option<#slot_tys> =
                    ::std::option::Option::None;)*
                let __applied = view.apply_object(|__key, __child| {
                    #(#arms)*
                    ::std::result::Result::Ok(::oolong::Flow::<()>::Pass)
                })?;
                ::std::result::Result::Ok(::oolong::Consumed {
                    value: Self { #(#finals),* },
                    end: __applied.end,
                })
            }
        }
        Strategy::Keyword => {
            let assigns: Vec<TokenStream> = active
                .iter()
                .zip(&slots)
                .map(|(f, slot)| {
                    let id = &f.ident;
                    quote! {
                        if let ::std::option::Option::Some(__v) = #slot {
                            __value.#id = __v;
                        }
                    }
                })
                .collect();
            quote! {
                #kind_check
                #(let mut #slots: ::std::option::Option<#slot_tys> =
                    ::std::option::Option::None;)*
                let __applied = view.apply_object(|__key, __child| {
                    #(#arms)*
                    ::std::result::Result::Ok(::oolong::Flow::<()>::Pass)
                })?;
                let mut __value = <Self as ::std::default::Default>::default();
                #(#assigns)*
                ::std::result::Result::Ok(::oolong::Consumed {
                    value: __value,
                    end: __applied.end,
                })
            }
        }
        Strategy::Mutable => {
            let mut_arms: Vec<TokenStream> = active
                .iter()
                .map(|f| {
                    let id = &f.ident;
                    let ty = &f.ty;
                    let key = &f.json_key;
                    let path = format!("{}.{}", name_str, key);
                    quote! {
                        if __key.matches(#key) {
                            let __c = <#ty as ::oolong::Materialize>::materialize(__child)
                                .map_err(|e| ::oolong::field_error(e, #path))?;
                            __value.#id = __c.value;
                            return ::std::result::Result::Ok(
                                ::oolong::Flow::Advance(__c.end),
                            );
                        }
                    }
                })
                .collect();
            quote! {
                #kind_check
                let mut __value = <Self as ::std::default::Default>::default();
                let __applied = view.apply_object(|__key, __child| {
                    #(#mut_arms)*
                    ::std::result::Result::Ok(::oolong::Flow::<()>::Pass)
                })?;
                ::std::result::Result::Ok(::oolong::Consumed {
                    value: __value,
                    end: __applied.end,
                })
            }
        }
    };

    Ok(wrap_impl(input, body))
}

fn derive_tuple_struct(
    input: &DeriveInput,
    fields: &syn::FieldsUnnamed,
) -> syn::Result<TokenStream> {
    let name_str = input.ident.to_string();
    let count = fields.unnamed.len();
    if count == 0 {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Materialize cannot be derived for empty tuple structs",
        ));
    }
    let tys: Vec<&syn::Type> = fields.unnamed.iter().map(|f| &f.ty).collect();
    let slots: Vec<syn::Ident> = (0..count).map(|i| format_ident!("__slot_{}", i)).collect();
    let indices: Vec<proc_macro2::Literal> = (0..count)
        .map(proc_macro2::Literal::usize_unsuffixed)
        .collect();
    let shape = format!("{} ({} elements)", name_str, count);

    let arms: Vec<TokenStream> = indices
        .iter()
        .zip(&tys)
        .zip(&slots)
        .map(|((idx, ty), slot)| {
            quote! {
                #idx => {
                    let __c = <#ty as ::oolong::Materialize>::materialize(__child)
                        .map_err(|e| ::oolong::field_error(e, #shape))?;
                    #slot = ::std::option::Option::Some(__c.value);
                    ::std::result::Result::Ok(::oolong::Flow::<()>::Advance(__c.end))
                }
            }
        })
        .collect();

    let body = quote! {
        if view.kind() != ::oolong::Kind::Array {
            return ::std::result::Result::Err(
                ::oolong::Error::mismatch(view.pos(), #shape),
            );
        }
        #(let mut #slots: ::std::option::Option<#tys> = ::std::option::Option::None;)*
        let __applied = view.apply_array(|__i, __child| match __i {
            #(#arms)*
            _ => ::std::result::Result::Err(
                ::oolong::Error::mismatch(__child.pos(), #shape),
            ),
        })?;
        ::std::result::Result::Ok(::oolong::Consumed {
            value: Self(
                #(#slots.ok_or_else(|| ::oolong::Error::mismatch(view.pos(), #shape))?,)*
            ),
            end: __applied.end,
        })
    };

    Ok(wrap_impl(input, body))
}

/// Fieldless enums materialize from strings by case-insensitive name match.
fn derive_string_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream> {
    let name_str = input.ident.to_string();
    let mut arms = Vec::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Materialize on enums with data requires #[oolong(untagged)] \
                 and single-field variants",
            ));
        }
        let attrs = FieldAttrs::from_attrs(&variant.attrs)?;
        let v_ident = &variant.ident;
        let v_name = attrs.rename.unwrap_or_else(|| v_ident.to_string());
        arms.push(quote! {
            if __txt.eq_ignore_ascii_case(#v_name) {
                return ::std::result::Result::Ok(::oolong::Consumed {
                    value: Self::#v_ident,
                    end: __end,
                });
            }
        });
    }

    let body = quote! {
        if view.kind() != ::oolong::Kind::String {
            return ::std::result::Result::Err(
                ::oolong::Error::mismatch(view.pos(), #name_str),
            );
        }
        let (__s, __end) = view.apply_string()?;
        let __txt = __s.decode()?;
        #(#arms)*
        ::std::result::Result::Err(::oolong::Error::mismatch(view.pos(), #name_str))
    };

    Ok(wrap_impl(input, body))
}

/// Untagged scalar unions: variants are tried in declaration order; the
/// first whose materialization accepts the value's kind wins. Unit variants
/// admit `null`.
fn derive_untagged_enum(input: &DeriveInput, data: &DataEnum) -> syn::Result<TokenStream> {
    let name_str = input.ident.to_string();
    let mut attempts = Vec::new();
    for variant in &data.variants {
        let v_ident = &variant.ident;
        match &variant.fields {
            Fields::Unit => {
                attempts.push(quote! {
                    if view.kind() == ::oolong::Kind::Null {
                        return ::std::result::Result::Ok(::oolong::Consumed {
                            value: Self::#v_ident,
                            end: view.skip()?,
                        });
                    }
                });
            }
            Fields::Unnamed(f) if f.unnamed.len() == 1 => {
                let ty = &f.unnamed[0].ty;
                attempts.push(quote! {
                    if let ::std::result::Result::Ok(__c) =
                        <#ty as ::oolong::Materialize>::materialize(view)
                    {
                        return ::std::result::Result::Ok(::oolong::Consumed {
                            value: Self::#v_ident(__c.value),
                            end: __c.end,
                        });
                    }
                });
            }
            _ => {
                return Err(syn::Error::new_spanned(
                    variant,
                    "untagged variants must be unit or carry exactly one field",
                ))
            }
        }
    }

    let body = quote! {
        #(#attempts)*
        ::std::result::Result::Err(::oolong::Error::mismatch(view.pos(), #name_str))
    };

    Ok(wrap_impl(input, body))
}

pub fn derive_into(input: &DeriveInput) -> syn::Result<TokenStream> {
    let Data::Struct(DataStruct {
        fields: Fields::Named(fields),
        ..
    }) = &input.data
    else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "MaterializeInto can only be derived for structs with named fields",
        ));
    };

    let name = &input.ident;
    let name_str = name.to_string();
    let (impl_generics, type_generics, where_clause) = input.generics.split_for_impl();
    let fs = collect_named(fields)?;

    let arms: Vec<TokenStream> = fs
        .iter()
        .filter(|f| !f.skip)
        .map(|f| {
            let id = &f.ident;
            let ty = &f.ty;
            let key = &f.json_key;
            let path = format!("{}.{}", name_str, key);
            quote! {
                if __key.matches(#key) {
                    let __c = <#ty as ::oolong::Materialize>::materialize(__child)
                        .map_err(|e| ::oolong::field_error(e, #path))?;
                    self.#id = __c.value;
                    return ::std::result::Result::Ok(::oolong::Flow::Advance(__c.end));
                }
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics ::oolong::MaterializeInto for #name #type_generics #where_clause {
            fn materialize_into(
                &mut self,
                view: &::oolong::View<'_>,
            ) -> ::oolong::Result<usize> {
                if view.kind() != ::oolong::Kind::Object {
                    return ::std::result::Result::Err(
                        ::oolong::Error::mismatch(view.pos(), #name_str),
                    );
                }
                let __applied = view.apply_object(|__key, __child| {
                    #(#arms)*
                    ::std::result::Result::Ok(::oolong::Flow::<()>::Pass)
                })?;
                ::std::result::Result::Ok(__applied.end)
            }
        }
    })
}
