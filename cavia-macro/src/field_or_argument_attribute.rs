use proc_macro2::Span;
use syn::{spanned::Spanned, Attribute, Expr, Token};

// #[di(
//     inject = "..",
//     forward_ref = || ..,
//     optional,
// )]

pub(crate) enum Inject {
    Token(Expr),
    ForwardRef(Expr),
}

#[derive(Default)]
pub(crate) struct FieldOrArgumentAttribute {
    pub(crate) inject: Option<Inject>,
    pub(crate) optional: bool,
}

impl TryFrom<&Attribute> for FieldOrArgumentAttribute {
    type Error = syn::Error;

    fn try_from(attr: &Attribute) -> Result<Self, Self::Error> {
        let mut inject: Option<(Span, Expr)> = None;
        let mut forward_ref: Option<(Span, Expr)> = None;
        let mut optional: Option<Span> = None;

        attr.parse_nested_meta(|meta| {
            macro_rules! check_duplicate {
                ($attribute:tt) => {
                    if $attribute.is_some() {
                        return Err(meta.error(concat!(
                            "the `",
                            stringify!($attribute),
                            "` attribute can only be set once"
                        )));
                    }
                };
            }

            let meta_path = &meta.path;
            let meta_path_span = meta_path.span();

            if meta_path.is_ident("inject") {
                check_duplicate!(inject);
                inject = Some((meta_path_span, meta.value()?.parse::<Expr>()?));
                return Ok(());
            }

            if meta_path.is_ident("forward_ref") {
                check_duplicate!(forward_ref);

                let expr = meta.value()?.parse::<Expr>()?;

                match &expr {
                    Expr::Closure(_) | Expr::Path(_) => {}
                    _ => {
                        return Err(syn::Error::new(
                            expr.span(),
                            "the argument of `forward_ref` must be a closure or an expression path",
                        ));
                    }
                }

                forward_ref = Some((meta_path_span, expr));
                return Ok(());
            }

            if meta_path.is_ident("optional") {
                check_duplicate!(optional);

                if !(meta.input.is_empty() || meta.input.peek(Token![,])) {
                    return Err(meta.error("the `optional` attribute takes no value"));
                }

                optional = Some(meta_path_span);
                return Ok(());
            }

            Err(meta.error("the attribute must be one of: `inject`, `forward_ref`, `optional`"))
        })?;

        let inject = match (inject, forward_ref) {
            (Some((inject, _)), Some((forward_ref, _))) => {
                macro_rules! err {
                    ($span:expr) => {
                        syn::Error::new(
                            $span,
                            "the `inject` and `forward_ref` attributes cannot be used together",
                        )
                    };
                }

                let mut e = err!(inject);
                e.combine(err!(forward_ref));

                return Err(e);
            }
            (Some((_, expr)), None) => Some(Inject::Token(expr)),
            (None, Some((_, expr))) => Some(Inject::ForwardRef(expr)),
            (None, None) => None,
        };

        Ok(FieldOrArgumentAttribute {
            inject,
            optional: optional.is_some(),
        })
    }
}

impl FieldOrArgumentAttribute {
    /// Parses and removes the `#[di(..)]` attribute of a field or an argument.
    pub(crate) fn from_attrs(attrs: &mut Vec<Attribute>) -> syn::Result<FieldOrArgumentAttribute> {
        let mut field_or_argument_attr = FieldOrArgumentAttribute::default();
        let mut errors = Vec::with_capacity(2);
        let mut already_appeared_di = false;

        attrs.retain(|attr| {
            if !attr.path().is_ident("di") {
                return true;
            }

            if already_appeared_di {
                let err = syn::Error::new(attr.span(), "only one `#[di(..)]` attribute is allowed");
                errors.push(err);
            } else {
                match FieldOrArgumentAttribute::try_from(attr) {
                    Ok(o) => field_or_argument_attr = o,
                    Err(e) => errors.push(e),
                }
            }

            already_appeared_di = true;
            false
        });

        if let Some(e) = errors.into_iter().reduce(|mut a, b| {
            a.combine(b);
            a
        }) {
            return Err(e);
        }

        Ok(field_or_argument_attr)
    }
}
