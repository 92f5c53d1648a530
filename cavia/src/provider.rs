use std::{fmt, future::Future, rc::Rc};

use cavia_core::Color;

use crate::{
    metadata::Constructor, Args, BoxError, Error, Instance, Result, Symbol, Token, Type,
};

/// A dependency of a provider: the token to resolve and whether it may be absent.
///
/// Anything convertible into a [`Token`] converts into a required dependency.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dependency {
    /// The token to resolve.
    pub token: Token,
    /// Whether the dependency resolves to an absent value when nobody provides it.
    pub optional: bool,
}

impl Dependency {
    /// Creates a required dependency.
    pub fn required<K>(token: K) -> Self
    where
        K: Into<Token>,
    {
        Self {
            token: token.into(),
            optional: false,
        }
    }

    /// Creates an optional dependency.
    pub fn optional<K>(token: K) -> Self
    where
        K: Into<Token>,
    {
        Self {
            token: token.into(),
            optional: true,
        }
    }
}

macro_rules! dependency_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Dependency {
                fn from(value: $ty) -> Self {
                    Dependency::required(value)
                }
            }
        )+
    };
}

dependency_from!(Token, Type, Symbol, &'static str, String);

/// A factory function of a factory provider.
#[derive(Clone)]
pub struct Factory {
    constructor: Constructor,
}

impl Factory {
    /// Returns the color of the factory function.
    pub fn color(&self) -> Color {
        self.constructor.color()
    }

    pub(crate) fn constructor(&self) -> &Constructor {
        &self.constructor
    }
}

impl fmt::Debug for Factory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("color", &self.color())
            .finish()
    }
}

/// A provider declaration written as a set of optional fields.
///
/// Which fields are present decides the shape of the provider,
/// see [`Provider::kind`] for the rules.
///
/// # Example
///
/// ```rust
/// use cavia::{Declaration, Provider, ProviderKind};
///
/// let provider: Provider = Declaration::new().provide("PORT").use_value(8080_u16).into();
///
/// assert!(matches!(provider.kind(), Ok(ProviderKind::Value(_))));
/// ```
#[derive(Clone, Default)]
pub struct Declaration {
    provide: Option<Token>,
    use_value: Option<Instance>,
    use_class: Option<Type>,
    use_existing: Option<Token>,
    use_factory: Option<Factory>,
    dependencies: Vec<Dependency>,
}

impl Declaration {
    /// Creates an empty declaration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the token the declaration provides.
    pub fn provide<K>(mut self, token: K) -> Self
    where
        K: Into<Token>,
    {
        self.provide = Some(token.into());
        self
    }

    /// Sets a precomputed value.
    pub fn use_value<T: 'static>(self, value: T) -> Self {
        self.use_instance(Instance::new(value))
    }

    /// Sets a precomputed, already type-erased value.
    pub fn use_instance(mut self, instance: Instance) -> Self {
        self.use_value = Some(instance);
        self
    }

    /// Sets the type to instantiate.
    pub fn use_class<T: 'static>(self) -> Self {
        self.use_class_type(Type::of::<T>())
    }

    /// Sets the type to instantiate from a [`Type`].
    pub fn use_class_type(mut self, ty: Type) -> Self {
        self.use_class = Some(ty);
        self
    }

    /// Sets the token whose resolved value is reused.
    pub fn use_existing<K>(mut self, token: K) -> Self
    where
        K: Into<Token>,
    {
        self.use_existing = Some(token.into());
        self
    }

    /// Sets a sync factory function.
    pub fn use_factory<T, E, F>(mut self, factory: F) -> Self
    where
        T: 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> Result<T, E> + 'static,
    {
        self.use_factory = Some(Factory {
            constructor: Constructor::new(factory),
        });
        self
    }

    /// Sets an async factory function.
    pub fn use_factory_async<T, E, F, Fut>(mut self, factory: F) -> Self
    where
        T: 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        self.use_factory = Some(Factory {
            constructor: Constructor::new_async(factory),
        });
        self
    }

    /// Sets the dependencies passed to the factory function, in positional order.
    pub fn dependencies<I>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = Dependency>,
    {
        self.dependencies = dependencies.into_iter().collect();
        self
    }
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Declaration");

        if let Some(provide) = &self.provide {
            s.field("provide", provide);
        }
        if let Some(value) = &self.use_value {
            s.field("use_value", value);
        }
        if let Some(class) = &self.use_class {
            s.field("use_class", class);
        }
        if let Some(existing) = &self.use_existing {
            s.field("use_existing", existing);
        }
        if let Some(factory) = &self.use_factory {
            s.field("use_factory", factory);
        }
        if !self.dependencies.is_empty() {
            s.field("dependencies", &self.dependencies);
        }

        s.finish()
    }
}

/// The shape of a [`Provider`], as classified by [`Provider::kind`].
#[derive(Debug)]
pub enum ProviderKind<'a> {
    /// A precomputed value, no dependencies.
    Value(&'a Instance),
    /// A type to instantiate, its dependencies are its constructor parameters.
    Class(Type),
    /// A type used as its own token, its dependencies are its constructor parameters.
    Type(Type),
    /// Another token whose resolved value is reused.
    Existing(&'a Token),
    /// A function to call with an explicit list of dependencies.
    Factory {
        /// The factory function.
        factory: &'a Factory,
        /// The declared dependencies, in positional order.
        dependencies: &'a [Dependency],
    },
}

#[derive(Clone)]
enum Repr {
    Type { token: Token, ty: Type },
    Declared(Rc<Declaration>),
}

/// Maps a token to a construction strategy.
///
/// There are five shapes of provider, use the following functions to create them:
/// - [`Provider::value`] and [`Provider::instance`]
/// - [`Provider::class`]
/// - [`Provider::ty`]
/// - [`Provider::existing`]
/// - [`Provider::factory`] and [`Provider::factory_async`]
///
/// or build a [`Declaration`] field by field.
///
/// # Example
///
/// ```rust
/// use cavia::{dependencies, Error, Provider};
///
/// struct Config {
///     env: &'static str,
/// }
///
/// let _: Vec<Provider> = vec![
///     Provider::value("CONFIG", Config { env: "test" }),
///     Provider::existing("SETTINGS", "CONFIG"),
///     Provider::factory("ENV", dependencies!["CONFIG"], |args| {
///         Ok::<_, Error>(args.required::<Config>(0)?.env)
///     }),
/// ];
/// ```
#[derive(Clone)]
pub struct Provider(Repr);

impl Provider {
    /// Provides `token` with a precomputed value.
    pub fn value<K, T>(token: K, value: T) -> Self
    where
        K: Into<Token>,
        T: 'static,
    {
        Declaration::new().provide(token).use_value(value).into()
    }

    /// Provides `token` with a precomputed, already type-erased value.
    pub fn instance<K>(token: K, instance: Instance) -> Self
    where
        K: Into<Token>,
    {
        Declaration::new().provide(token).use_instance(instance).into()
    }

    /// Provides `token` with an instance of `T`, `T` must be injectable.
    pub fn class<T, K>(token: K) -> Self
    where
        T: 'static,
        K: Into<Token>,
    {
        Declaration::new().provide(token).use_class::<T>().into()
    }

    /// Provides `T` with an instance of `T`, `T` must be injectable.
    pub fn ty<T: 'static>() -> Self {
        Type::of::<T>().into()
    }

    /// Provides `token` with the resolved value of `existing`.
    pub fn existing<K, E>(token: K, existing: E) -> Self
    where
        K: Into<Token>,
        E: Into<Token>,
    {
        Declaration::new()
            .provide(token)
            .use_existing(existing)
            .into()
    }

    /// Provides `token` with the result of a sync factory function.
    pub fn factory<K, I, T, E, F>(token: K, dependencies: I, factory: F) -> Self
    where
        K: Into<Token>,
        I: IntoIterator<Item = Dependency>,
        T: 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> Result<T, E> + 'static,
    {
        Declaration::new()
            .provide(token)
            .use_factory(factory)
            .dependencies(dependencies)
            .into()
    }

    /// Provides `token` with the result of an async factory function.
    pub fn factory_async<K, I, T, E, F, Fut>(token: K, dependencies: I, factory: F) -> Self
    where
        K: Into<Token>,
        I: IntoIterator<Item = Dependency>,
        T: 'static,
        E: Into<BoxError>,
        F: Fn(Args) -> Fut + 'static,
        Fut: Future<Output = Result<T, E>> + 'static,
    {
        Declaration::new()
            .provide(token)
            .use_factory_async(factory)
            .dependencies(dependencies)
            .into()
    }

    /// Returns the effective token of the provider.
    ///
    /// That is the declared `provide` token, or the type itself for the type shorthand.
    /// A declaration without `provide` has no token.
    pub fn token(&self) -> Option<&Token> {
        match &self.0 {
            Repr::Type { token, .. } => Some(token),
            Repr::Declared(declaration) => declaration.provide.as_ref(),
        }
    }

    /// Classifies the provider into exactly one [`ProviderKind`].
    ///
    /// The type shorthand is always [`ProviderKind::Type`]. A declaration needs
    /// a `provide` token, then the first present field among `use_class`,
    /// `use_existing`, `use_factory`, `use_value` decides the shape.
    /// Anything else is an [`Error::InvalidProvider`].
    pub fn kind(&self) -> Result<ProviderKind<'_>> {
        let declaration = match &self.0 {
            Repr::Type { ty, .. } => return Ok(ProviderKind::Type(*ty)),
            Repr::Declared(declaration) => declaration,
        };

        if declaration.provide.is_none() {
            return Err(self.invalid());
        }

        if let Some(class) = declaration.use_class {
            return Ok(ProviderKind::Class(class));
        }

        if let Some(existing) = &declaration.use_existing {
            return Ok(ProviderKind::Existing(existing));
        }

        if let Some(factory) = &declaration.use_factory {
            return Ok(ProviderKind::Factory {
                factory,
                dependencies: &declaration.dependencies,
            });
        }

        if let Some(value) = &declaration.use_value {
            return Ok(ProviderKind::Value(value));
        }

        Err(self.invalid())
    }

    pub(crate) fn invalid(&self) -> Error {
        Error::InvalidProvider(format!("{:?}", self))
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Type { ty, .. } => f.debug_tuple("Provider").field(ty).finish(),
            Repr::Declared(declaration) => f.debug_tuple("Provider").field(declaration).finish(),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token() {
            Some(token) => fmt::Display::fmt(token, f),
            None => f.write_str("<anonymous provider>"),
        }
    }
}

impl From<Declaration> for Provider {
    fn from(value: Declaration) -> Self {
        Provider(Repr::Declared(Rc::new(value)))
    }
}

impl From<Type> for Provider {
    fn from(value: Type) -> Self {
        Provider(Repr::Type {
            token: Token::Type(value),
            ty: value,
        })
    }
}
