use cavia_core::Color;
use proc_macro2::{Span, TokenStream};
use quote::{quote, ToTokens};
use syn::{spanned::Spanned, Attribute, ImplItem, ImplItemFn, ItemImpl, Path, ReturnType, Type};

use crate::{
    cavia_path_attribute,
    commons::{self, Param},
    injectable_attribute::InjectableAttribute,
};

// struct A {
//     b: Rc<B>,
// }

// #[Injectable]
// impl A {
//     #[di]
//     async fn new(#[di(inject = "B")] b: Rc<B>) -> Self {
//         Self { b }
//     }
// }

pub(crate) fn generate(
    attr: InjectableAttribute,
    mut item_impl: ItemImpl,
) -> syn::Result<TokenStream> {
    let cavia_path = cavia_path_attribute::cavia_path(&mut item_impl.attrs)?;

    let impl_span = item_impl.span();

    let ItemImpl {
        generics,
        self_ty,
        items,
        trait_,
        ..
    } = &mut item_impl;

    if let Some((_, path, _)) = trait_ {
        return Err(syn::Error::new(
            path.span(),
            "not support impl trait for struct or enum",
        ));
    }

    let auto_register = attr.auto_register();

    #[cfg(feature = "auto-register")]
    commons::check_auto_register_with_generics(auto_register, generics, "impl block")?;

    let mut errors = Vec::new();
    let mut constructor: Option<&mut ImplItemFn> = None;

    for impl_item in items.iter_mut() {
        let ImplItem::Fn(f) = impl_item else {
            continue;
        };

        let di_spans = take_di_attributes(&mut f.attrs, &mut errors);

        if di_spans.is_empty() {
            continue;
        }

        if constructor.is_some() {
            di_spans.into_iter().for_each(|span| {
                errors.push(syn::Error::new(span, "duplicate `#[di]` attribute"));
            });
        } else {
            constructor = Some(f);
        }
    }

    if let Some(e) = errors.into_iter().reduce(|mut a, b| {
        a.combine(b);
        a
    }) {
        return Err(e);
    }

    let Some(f) = constructor else {
        return Err(syn::Error::new(
            impl_span,
            "there must be an associated function annotated by `#[di]`",
        ));
    };

    let injectable_impl = generate_injectable_impl(f, self_ty, generics, &cavia_path)?;

    let auto_register = commons::generate_auto_register(auto_register, self_ty, &cavia_path);

    let expand = quote! {
        #item_impl

        #injectable_impl

        #auto_register
    };

    Ok(expand)
}

// Removes the `#[di]` markers of an associated function, returning their spans.
fn take_di_attributes(attrs: &mut Vec<Attribute>, errors: &mut Vec<syn::Error>) -> Vec<Span> {
    let mut taken = Vec::new();

    attrs.retain(|attr| {
        if !attr.path().is_ident("di") {
            return true;
        }

        if let Err(e) = attr.meta.require_path_only() {
            errors.push(e);
        }

        taken.push(attr.span());
        false
    });

    taken
}

fn is_self_type(ty: &Type) -> bool {
    matches!(ty, Type::Path(type_path) if type_path.qself.is_none() && type_path.path.is_ident("Self"))
}

fn generate_injectable_impl(
    impl_item_fn: &mut ImplItemFn,
    struct_type_with_generics: &Type,
    struct_generics: &syn::Generics,
    cavia_path: &Path,
) -> syn::Result<TokenStream> {
    let returns_self = match &impl_item_fn.sig.output {
        ReturnType::Type(_, fn_return_type) => {
            &**fn_return_type == struct_type_with_generics || is_self_type(fn_return_type)
        }
        ReturnType::Default => false,
    };

    if !returns_self {
        return Err(syn::Error::new(
            impl_item_fn.sig.span(),
            format!(
                "return type must be `{}` or `Self`",
                struct_type_with_generics.into_token_stream()
            ),
        ));
    }

    let params = commons::generate_argument_params(&mut impl_item_fn.sig.inputs, cavia_path)?;

    let metadata = params.iter().map(|Param { metadata, .. }| metadata);
    let values = params.iter().map(|Param { value, .. }| value);

    let (impl_generics, _, where_clause) = struct_generics.split_for_impl();

    let fn_ident = &impl_item_fn.sig.ident;

    let color = match impl_item_fn.sig.asyncness {
        Some(_) => Color::Async,
        None => Color::Sync,
    };

    let create_metadata = match color {
        Color::Async => quote! {
            #cavia_path::InjectableMetadata::new_async(
                #[allow(unused_variables)]
                |args: #cavia_path::Args| async move {
                    ::core::result::Result::<Self, #cavia_path::Error>::Ok(
                        Self::#fn_ident(#(#values,)*).await
                    )
                }
            )
        },
        Color::Sync => quote! {
            #cavia_path::InjectableMetadata::new(
                #[allow(unused_variables)]
                |args: #cavia_path::Args| {
                    ::core::result::Result::<Self, #cavia_path::Error>::Ok(
                        Self::#fn_ident(#(#values,)*)
                    )
                }
            )
        },
    };

    let expand = quote! {
        impl #impl_generics #cavia_path::Injectable for #struct_type_with_generics #where_clause {
            fn metadata() -> #cavia_path::InjectableMetadata {
                #create_metadata
                #(#metadata)*
            }
        }
    };

    Ok(expand)
}
