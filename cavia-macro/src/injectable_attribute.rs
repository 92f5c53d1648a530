use syn::{meta::ParseNestedMeta, LitBool, Token};

// #[Injectable(auto_register = false)]

#[derive(Default)]
pub(crate) struct InjectableAttribute {
    auto_register: Option<bool>,
}

impl InjectableAttribute {
    pub(crate) fn parse(&mut self, meta: ParseNestedMeta) -> syn::Result<()> {
        if meta.path.is_ident("auto_register") {
            if self.auto_register.is_some() {
                return Err(meta.error("duplicate `auto_register` argument"));
            }

            self.auto_register = Some(if meta.input.is_empty() || meta.input.peek(Token![,]) {
                true
            } else {
                meta.value()?.parse::<LitBool>()?.value
            });

            return Ok(());
        }

        Err(meta.error("the argument must be `auto_register`"))
    }

    pub(crate) fn auto_register(&self) -> bool {
        self.auto_register.unwrap_or(cfg!(feature = "auto-register"))
    }
}
