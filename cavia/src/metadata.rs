use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fmt,
    future::Future,
    pin::Pin,
    rc::Rc,
};

use cavia_core::Color;

use crate::{Args, BoxError, InjectToken, Instance, Token, Type};

/// An owned dynamically typed [`Future`] for use in cases where you can't
/// statically type your result or need to add some indirection.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Clone)]
pub(crate) enum Constructor {
    #[allow(clippy::type_complexity)]
    Async(Rc<dyn Fn(Args) -> BoxFuture<'static, Result<Instance, BoxError>>>),
    #[allow(clippy::type_complexity)]
    Sync(Rc<dyn Fn(Args) -> Result<Instance, BoxError>>),
}

impl Constructor {
    pub(crate) fn new<T, E, F>(constructor: F) -> Self
    where
        T: 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> Result<T, E> + 'static,
    {
        Constructor::Sync(Rc::new(move |args| {
            constructor(args).map(Instance::new).map_err(Into::into)
        }))
    }

    pub(crate) fn new_async<T, E, F, Fut>(constructor: F) -> Self
    where
        T: 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        Constructor::Async(Rc::new(move |args| {
            let future = constructor(args);

            Box::pin(async move { future.await.map(Instance::new).map_err(Into::into) })
        }))
    }

    pub(crate) fn color(&self) -> Color {
        match self {
            Constructor::Async(_) => Color::Async,
            Constructor::Sync(_) => Color::Sync,
        }
    }

    pub(crate) async fn call(&self, args: Args) -> Result<Instance, BoxError> {
        match self {
            Constructor::Async(constructor) => constructor(args).await,
            Constructor::Sync(constructor) => constructor(args),
        }
    }
}

/// The declared type of a constructor parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamType {
    /// The parameter is satisfied by the provider of this token.
    Token(Token),
    /// The parameter type could not be captured, an override token must cover it.
    Unresolved,
}

/// Describes how to construct a type: its ordered constructor parameters,
/// per-parameter override tokens, optional parameters, and the constructor itself.
///
/// Having metadata is what makes a type eligible as the implementation of a
/// class or type provider. The `#[Injectable]` attribute macro generates it,
/// it can also be written by hand.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use cavia::{Error, InjectableMetadata, Token};
///
/// struct Config;
///
/// struct Service {
///     config: Rc<Config>,
/// }
///
/// let metadata = InjectableMetadata::new(|args| {
///     Ok::<_, Error>(Service {
///         config: args.required::<Config>(0)?,
///     })
/// })
/// .param(Token::of::<Config>())
/// .inject(0, "CONFIG");
///
/// assert_eq!(metadata.params().len(), 1);
/// ```
#[derive(Clone)]
pub struct InjectableMetadata {
    ty: Type,
    params: Vec<ParamType>,
    inject: BTreeMap<usize, InjectToken>,
    optional: BTreeSet<usize>,
    constructor: Constructor,
}

impl InjectableMetadata {
    /// Creates metadata for `T` with a sync constructor.
    pub fn new<T, E, F>(constructor: F) -> Self
    where
        T: 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> Result<T, E> + 'static,
    {
        Self::with_constructor(Type::of::<T>(), Constructor::new(constructor))
    }

    /// Creates metadata for `T` with an async constructor.
    pub fn new_async<T, E, F, Fut>(constructor: F) -> Self
    where
        T: 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        Self::with_constructor(Type::of::<T>(), Constructor::new_async(constructor))
    }

    fn with_constructor(ty: Type, constructor: Constructor) -> Self {
        Self {
            ty,
            params: Vec::new(),
            inject: BTreeMap::new(),
            optional: BTreeSet::new(),
            constructor,
        }
    }

    /// Appends a constructor parameter satisfied by `token`.
    pub fn param<K>(mut self, token: K) -> Self
    where
        K: Into<Token>,
    {
        self.params.push(ParamType::Token(token.into()));
        self
    }

    /// Appends a constructor parameter whose type could not be captured.
    pub fn unresolved_param(mut self) -> Self {
        self.params.push(ParamType::Unresolved);
        self
    }

    /// Overrides the token of the parameter at `index`.
    pub fn inject<K>(mut self, index: usize, token: K) -> Self
    where
        K: Into<InjectToken>,
    {
        self.inject.insert(index, token.into());
        self
    }

    /// Marks the parameter at `index` as optional.
    pub fn optional(mut self, index: usize) -> Self {
        self.optional.insert(index);
        self
    }

    /// Returns the type the metadata describes.
    pub fn ty(&self) -> Type {
        self.ty
    }

    /// Returns the declared parameter types, in positional order.
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Returns the override token of the parameter at `index`.
    pub fn inject_override(&self, index: usize) -> Option<&InjectToken> {
        self.inject.get(&index)
    }

    /// Returns whether the parameter at `index` is optional.
    pub fn is_optional(&self, index: usize) -> bool {
        self.optional.contains(&index)
    }

    /// Returns the color of the constructor.
    pub fn color(&self) -> Color {
        self.constructor.color()
    }

    pub(crate) fn constructor(&self) -> &Constructor {
        &self.constructor
    }
}

impl fmt::Debug for InjectableMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectableMetadata")
            .field("ty", &self.ty)
            .field("params", &self.params)
            .field("inject", &self.inject)
            .field("optional", &self.optional)
            .field("color", &self.color())
            .finish()
    }
}

/// A trait for giving a type its [`InjectableMetadata`].
///
/// Define this trait so that the purpose is not to be implemented manually,
/// but to use the `#[Injectable]` attribute macro to generate the implementation.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use cavia::{Injectable, ParamType, Token};
///
/// #[Injectable]
/// struct Config;
///
/// #[Injectable]
/// struct Service {
///     config: Rc<Config>,
/// }
///
/// # fn main() {
/// let metadata = <Service as Injectable>::metadata();
/// assert_eq!(metadata.params(), &[ParamType::Token(Token::of::<Config>())]);
/// # }
/// ```
pub trait Injectable: 'static {
    /// Returns the metadata describing how to construct the type.
    fn metadata() -> InjectableMetadata;
}

#[derive(Default)]
pub(crate) struct MetadataRegistry {
    registry: HashMap<Type, InjectableMetadata>,
}

impl MetadataRegistry {
    pub(crate) fn insert(&mut self, metadata: InjectableMetadata) {
        let ty = metadata.ty();

        if self.registry.contains_key(&ty) {
            #[cfg(feature = "tracing")]
            tracing::warn!("(!) override injectable metadata: {}", ty);
        } else {
            #[cfg(feature = "tracing")]
            tracing::debug!("(+) insert injectable metadata: {:?}", metadata);
        }

        self.registry.insert(ty, metadata);
    }

    pub(crate) fn get(&self, ty: &Type) -> Option<&InjectableMetadata> {
        self.registry.get(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{forward_ref, Error};

    struct Config;

    #[test]
    fn builder_records_params_overrides_and_optionals() {
        let metadata = InjectableMetadata::new(|_| Ok::<_, Error>(Config))
            .param(Token::of::<u8>())
            .unresolved_param()
            .inject(1, forward_ref(|| Token::from("late")))
            .optional(0);

        assert_eq!(metadata.ty(), Type::of::<Config>());
        assert_eq!(
            metadata.params(),
            &[ParamType::Token(Token::of::<u8>()), ParamType::Unresolved]
        );
        assert!(metadata.is_optional(0));
        assert!(!metadata.is_optional(1));
        assert_eq!(
            metadata.inject_override(1).map(InjectToken::resolve),
            Some(Token::from("late"))
        );
        assert_eq!(metadata.color(), Color::Sync);
    }

    #[test]
    fn registry_keeps_the_latest_metadata() {
        let mut registry = MetadataRegistry::default();

        registry.insert(InjectableMetadata::new(|_| Ok::<_, Error>(Config)));
        registry.insert(
            InjectableMetadata::new_async(|_| async { Ok::<_, Error>(Config) })
                .param("CONFIG"),
        );

        assert!(registry.get(&Type::of::<u8>()).is_none());
        let metadata = registry.get(&Type::of::<Config>()).unwrap();
        assert_eq!(metadata.color(), Color::Async);
        assert_eq!(metadata.params().len(), 1);
    }
}
