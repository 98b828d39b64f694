use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, DeriveInput};

/// Derive macro for the `Diff` trait on records with named fields.
///
/// Generates a companion `{Name}Delta` struct holding one
/// `Option<field delta>` per field, and a `Diff` impl whose `apply` is
/// atomic: the delta is applied to a clone which replaces `self` only when
/// every field succeeded.
///
/// # Example
///
/// ```ignore
/// use hallplan_core::Diff;
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Diff)]
/// struct Settings {
///     #[diff(scalar)]
///     mode: Mode,
///     tags: BTreeMap<String, String>,
/// }
/// ```
///
/// # Attributes
///
/// - `#[diff(scalar)]` - Compare the field as a whole and record a `Change`
///   (field type must be `Clone + PartialEq + Serialize + Deserialize`)
/// - `#[diff(scalar, eq = path::to::fn)]` - Same, with a custom equality
///   function `fn(&T, &T) -> bool`
#[proc_macro_derive(Diff, attributes(diff))]
pub fn derive_diff(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match derive_diff_impl(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn derive_diff_impl(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let vis = &input.vis;
    let delta_name = format_ident!("{}Delta", name);

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Diff cannot be derived for generic types",
        ));
    }

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            syn::Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "Diff can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "Diff can only be derived for structs",
            ));
        }
    };

    let mut delta_fields = Vec::new();
    let mut diff_fields = Vec::new();
    let mut apply_fields = Vec::new();
    let mut empty_checks = Vec::new();

    for field in fields {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let ty = &field.ty;
        let field_vis = &field.vis;
        let label = ident.to_string();
        let attrs = parse_field_attrs(&field.attrs)?;

        if attrs.scalar {
            let eq = match &attrs.eq {
                Some(path) => quote! { #path },
                None => quote! { <#ty as ::core::cmp::PartialEq>::eq },
            };
            delta_fields.push(quote! {
                #[serde(default, skip_serializing_if = "Option::is_none")]
                #field_vis #ident: ::core::option::Option<::hallplan_core::Change<#ty>>
            });
            diff_fields.push(quote! {
                #ident: ::hallplan_core::Change::between(&self.#ident, &target.#ident, #eq)
            });
            apply_fields.push(quote! {
                if let ::core::option::Option::Some(change) = &delta.#ident {
                    change
                        .apply_to(&mut next.#ident, #eq)
                        .map_err(|e| e.in_field(#label))?;
                }
            });
        } else {
            delta_fields.push(quote! {
                #[serde(default, skip_serializing_if = "Option::is_none")]
                #field_vis #ident: ::core::option::Option<<#ty as ::hallplan_core::Diff>::Delta>
            });
            diff_fields.push(quote! {
                #ident: ::hallplan_core::Diff::diff(&self.#ident, &target.#ident)
            });
            apply_fields.push(quote! {
                if let ::core::option::Option::Some(field_delta) = &delta.#ident {
                    ::hallplan_core::Diff::apply(&mut next.#ident, field_delta)
                        .map_err(|e| e.in_field(#label))?;
                }
            });
        }
        empty_checks.push(quote! { self.#ident.is_none() });
    }

    let doc = format!("Per-field delta of [`{name}`]; `None` means unchanged.");

    Ok(quote! {
        #[doc = #doc]
        #[derive(
            ::std::fmt::Debug,
            ::std::clone::Clone,
            ::std::cmp::PartialEq,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #vis struct #delta_name {
            #(#delta_fields,)*
        }

        impl #delta_name {
            /// True when no field changed.
            pub fn is_empty(&self) -> bool {
                true #(&& #empty_checks)*
            }
        }

        impl ::hallplan_core::Diff for #name {
            type Delta = #delta_name;

            fn diff(&self, target: &Self) -> ::core::option::Option<Self::Delta> {
                let delta = #delta_name {
                    #(#diff_fields,)*
                };
                if delta.is_empty() {
                    ::core::option::Option::None
                } else {
                    ::core::option::Option::Some(delta)
                }
            }

            fn apply(
                &mut self,
                delta: &Self::Delta,
            ) -> ::core::result::Result<(), ::hallplan_core::DeltaError> {
                let mut next = ::core::clone::Clone::clone(self);
                #(#apply_fields)*
                *self = next;
                ::core::result::Result::Ok(())
            }
        }
    })
}

#[derive(Default)]
struct FieldAttrs {
    scalar: bool,
    eq: Option<syn::Path>,
}

fn parse_field_attrs(attrs: &[syn::Attribute]) -> syn::Result<FieldAttrs> {
    let mut result = FieldAttrs::default();

    for attr in attrs {
        if !attr.path().is_ident("diff") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("scalar") {
                result.scalar = true;
                Ok(())
            } else if meta.path.is_ident("eq") {
                result.eq = Some(meta.value()?.parse()?);
                Ok(())
            } else {
                Err(meta.error("unsupported diff attribute"))
            }
        })?;
    }

    if result.eq.is_some() && !result.scalar {
        return Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            "`eq` requires `scalar`",
        ));
    }

    Ok(result)
}
