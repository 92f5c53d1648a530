use syn::{parse_quote, Attribute, Path};

// #[di(cavia_path = path::to::cavia)]
pub(crate) fn cavia_path(attrs: &mut Vec<Attribute>) -> syn::Result<Path> {
    let mut cavia_path = None;
    let mut errors = Vec::new();

    attrs.retain(|attr| {
        if !attr.path().is_ident("di") {
            return true;
        }

        if let Err(err) = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("cavia_path") {
                if cavia_path.is_some() {
                    return Err(meta.error("duplicate `cavia_path` argument"));
                }
                let path = meta.value()?.call(Path::parse_mod_style)?;
                cavia_path = Some(path);
                Ok(())
            } else {
                Err(meta.error("the argument must be `cavia_path`"))
            }
        }) {
            errors.push(err);
        }

        false
    });

    if let Some(e) = errors.into_iter().reduce(|mut a, b| {
        a.combine(b);
        a
    }) {
        return Err(e);
    }

    Ok(cavia_path.unwrap_or_else(|| parse_quote!(::cavia)))
}
