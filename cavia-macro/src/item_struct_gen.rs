use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_quote, ItemStruct, Type};

use crate::{
    cavia_path_attribute,
    commons::{self, FieldParams, Param},
    injectable_attribute::InjectableAttribute,
};

// #[Injectable]
// struct A {
//     b: Rc<B>,
//     #[di(inject = "C")]
//     c: Rc<C>,
// }

pub(crate) fn generate(
    attr: InjectableAttribute,
    mut item_struct: ItemStruct,
) -> syn::Result<TokenStream> {
    let cavia_path = cavia_path_attribute::cavia_path(&mut item_struct.attrs)?;

    let auto_register = attr.auto_register();

    #[cfg(feature = "auto-register")]
    commons::check_auto_register_with_generics(auto_register, &item_struct.generics, "struct")?;

    let fields = commons::generate_field_params(&mut item_struct.fields, &cavia_path)?;

    let struct_ident = &item_struct.ident;

    let (impl_generics, ty_generics, where_clause) = item_struct.generics.split_for_impl();

    let (instance, params) = match fields {
        FieldParams::Unit => (quote!(#struct_ident), Vec::new()),
        FieldParams::Named(idents, params) => {
            let values = params.iter().map(|Param { value, .. }| value);

            (
                quote! {
                    #struct_ident {
                        #(
                            #idents: #values,
                        )*
                    }
                },
                params,
            )
        }
        FieldParams::Unnamed(params) => {
            let values = params.iter().map(|Param { value, .. }| value);

            (
                quote! {
                    #struct_ident(
                        #(
                            #values,
                        )*
                    )
                },
                params,
            )
        }
    };

    let metadata = params.iter().map(|Param { metadata, .. }| metadata);

    let self_ty: Type = parse_quote!(#struct_ident #ty_generics);
    let auto_register = commons::generate_auto_register(auto_register, &self_ty, &cavia_path);

    let expand = quote! {
        #item_struct

        impl #impl_generics #cavia_path::Injectable for #struct_ident #ty_generics #where_clause {
            fn metadata() -> #cavia_path::InjectableMetadata {
                #cavia_path::InjectableMetadata::new(
                    #[allow(unused_variables)]
                    |args: #cavia_path::Args| {
                        ::core::result::Result::<Self, #cavia_path::Error>::Ok(#instance)
                    }
                )
                #(#metadata)*
            }
        }

        #auto_register
    };

    Ok(expand)
}
