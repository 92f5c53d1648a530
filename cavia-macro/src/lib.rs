//! Macros for Cavia.

mod cavia_path_attribute;
mod commons;
mod field_or_argument_attribute;
mod injectable_attribute;
mod item_impl_gen;
mod item_struct_gen;

use proc_macro::TokenStream;
use syn::{parse_macro_input, spanned::Spanned, Item};

use crate::injectable_attribute::InjectableAttribute;

/// Generate `InjectableMetadata` for a struct or for the `#[di]` constructor
/// of an impl block, and implement the `Injectable` trait.
///
/// See the documentation of the `cavia` crate for the supported attributes.
#[proc_macro_attribute]
#[allow(non_snake_case)]
pub fn Injectable(attr: TokenStream, input: TokenStream) -> TokenStream {
    let mut attribute = InjectableAttribute::default();
    let parser = syn::meta::parser(|meta| attribute.parse(meta));
    parse_macro_input!(attr with parser);

    let item = parse_macro_input!(input as Item);

    let result = match item {
        Item::Struct(item_struct) => item_struct_gen::generate(attribute, item_struct),
        Item::Impl(item_impl) => item_impl_gen::generate(attribute, item_impl),
        _ => Err(syn::Error::new(item.span(), "expected struct or impl")),
    };

    result.unwrap_or_else(|e| e.to_compile_error()).into()
}
