use proc_macro2::TokenStream;
use quote::quote;
use syn::{
    punctuated::Punctuated, spanned::Spanned, AngleBracketedGenericArguments, Attribute, Field,
    Fields, FieldsNamed, FieldsUnnamed, FnArg, GenericArgument, Ident, PatType, Path,
    PathArguments, PathSegment, Token, Type, TypePath,
};

use crate::field_or_argument_attribute::{FieldOrArgumentAttribute, Inject};

fn extract_path_type<'a>(ty: &'a Type, ty_name: &str) -> syn::Result<&'a Type> {
    let Type::Path(TypePath {
        qself: None,
        path: Path { segments, .. },
    }) = ty
    else {
        return Err(syn::Error::new(
            ty.span(),
            format!("only support `{}<T>` type", ty_name),
        ));
    };

    let Some(segment) = segments.last() else {
        return Err(syn::Error::new(
            ty.span(),
            "not support path type with empty segments",
        ));
    };

    let PathSegment {
        ident,
        arguments: PathArguments::AngleBracketed(AngleBracketedGenericArguments { args, .. }),
    } = segment
    else {
        return Err(syn::Error::new(
            segment.span(),
            format!("only support `{}<T>` type", ty_name),
        ));
    };

    if ident != ty_name {
        return Err(syn::Error::new(
            ident.span(),
            format!("only support `{}<T>` type", ty_name),
        ));
    }

    if args.len() != 1 {
        return Err(syn::Error::new(
            args.span(),
            format!("only support `{}<T>` type with one generic argument", ty_name),
        ));
    }

    match args.first() {
        Some(GenericArgument::Type(ty)) => Ok(ty),
        _ => Err(syn::Error::new(
            args.span(),
            "only support generic argument type",
        )),
    }
}

// Rc<T> -> T
fn extract_rc_type(ty: &Type) -> syn::Result<&Type> {
    extract_path_type(ty, "Rc")
}

// Option<Rc<T>> -> T
fn extract_option_rc_type(ty: &Type) -> syn::Result<&Type> {
    extract_rc_type(extract_path_type(ty, "Option")?)
}

/// The pieces generated for one constructor parameter.
pub(crate) struct Param {
    /// Builder calls appended to the metadata: `.param(..)`, `.inject(..)`, `.optional(..)`.
    pub(crate) metadata: TokenStream,
    /// The expression reading the argument from `args`.
    pub(crate) value: TokenStream,
}

fn generate_param(
    attrs: &mut Vec<Attribute>,
    index: usize,
    ty: &Type,
    cavia_path: &Path,
) -> syn::Result<Param> {
    let FieldOrArgumentAttribute { inject, optional } = FieldOrArgumentAttribute::from_attrs(attrs)?;

    let (inner, value) = if optional {
        let inner = extract_option_rc_type(ty)?;
        (inner, quote!(args.optional::<#inner>(#index)?))
    } else {
        let inner = extract_rc_type(ty)?;
        (inner, quote!(args.required::<#inner>(#index)?))
    };

    let inject = match inject {
        Some(Inject::Token(expr)) => quote! {
            .inject(#index, #expr)
        },
        Some(Inject::ForwardRef(expr)) => quote! {
            .inject(#index, #cavia_path::forward_ref(#expr))
        },
        None => quote! {},
    };

    let optional = if optional {
        quote! {
            .optional(#index)
        }
    } else {
        quote! {}
    };

    Ok(Param {
        metadata: quote! {
            .param(#cavia_path::Token::of::<#inner>())
            #inject
            #optional
        },
        value,
    })
}

pub(crate) fn generate_argument_params(
    inputs: &mut Punctuated<FnArg, Token![,]>,
    cavia_path: &Path,
) -> syn::Result<Vec<Param>> {
    let mut params = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter_mut().enumerate() {
        match input {
            FnArg::Receiver(r) => {
                return Err(syn::Error::new(r.span(), "not support `self` receiver"))
            }
            FnArg::Typed(PatType { attrs, ty, .. }) => {
                params.push(generate_param(attrs, index, ty, cavia_path)?);
            }
        }
    }

    Ok(params)
}

pub(crate) enum FieldParams {
    Unit,
    Named(Vec<Ident>, Vec<Param>),
    Unnamed(Vec<Param>),
}

pub(crate) fn generate_field_params(
    fields: &mut Fields,
    cavia_path: &Path,
) -> syn::Result<FieldParams> {
    match fields {
        Fields::Unit => Ok(FieldParams::Unit),
        Fields::Named(FieldsNamed { named, .. }) => {
            let mut idents = Vec::with_capacity(named.len());
            let mut params = Vec::with_capacity(named.len());

            for (index, Field { attrs, ident, ty, .. }) in named.iter_mut().enumerate() {
                params.push(generate_param(attrs, index, ty, cavia_path)?);

                if let Some(ident) = ident {
                    idents.push(ident.clone());
                }
            }

            Ok(FieldParams::Named(idents, params))
        }
        Fields::Unnamed(FieldsUnnamed { unnamed, .. }) => {
            let mut params = Vec::with_capacity(unnamed.len());

            for (index, Field { attrs, ty, .. }) in unnamed.iter_mut().enumerate() {
                params.push(generate_param(attrs, index, ty, cavia_path)?);
            }

            Ok(FieldParams::Unnamed(params))
        }
    }
}

#[cfg(feature = "auto-register")]
pub(crate) fn check_auto_register_with_generics(
    auto_register: bool,
    generics: &syn::Generics,
    item_kind: &'static str,
) -> syn::Result<()> {
    if auto_register && !generics.params.is_empty() {
        return Err(syn::Error::new(
            generics.span(),
            format!(
                "not support auto register generic {}, \
                please remove generics, or use `#[Injectable(auto_register = false)]` to disable auto register",
                item_kind
            ),
        ));
    }

    Ok(())
}

pub(crate) fn generate_auto_register(
    auto_register: bool,
    ty: &Type,
    cavia_path: &Path,
) -> TokenStream {
    #[cfg(feature = "auto-register")]
    if auto_register {
        return quote! {
            #cavia_path::register_injectable!(<#ty as #cavia_path::Injectable>::metadata());
        };
    }

    #[cfg(not(feature = "auto-register"))]
    let _ = (auto_register, ty, cavia_path);

    quote! {}
}
