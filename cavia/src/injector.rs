use std::{cell::OnceCell, iter, rc::Rc};

use crate::{
    metadata::MetadataRegistry, Args, BoxFuture, Dependency, DependencyChain, Error, Injectable,
    InjectableMetadata, Instance, ParamType, Provider, ProviderKind, Registry,
    ResolutionCache, Result, Token,
};

/// An injector owns the providers and the values resolved from them.
///
/// It is the main entry point for the dependency injection. Every token is
/// resolved at most once, all later lookups observe the same [`Instance`].
///
/// The injector registers itself under `Token::of::<Injector>()` before any
/// declared provider, so providers can depend on it.
///
/// When creating an `Injector`, you can use options to change the
/// default creation behavior, see [`InjectorOptions`] for details.
///
/// # Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use cavia::{Injectable, Injector, Provider};
///
/// struct Config {
///     env: &'static str,
/// }
///
/// #[Injectable]
/// struct Service {
///     #[di(inject = "CONFIG")]
///     config: Rc<Config>,
/// }
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let injector = Injector::create(vec![
///         Provider::value("CONFIG", Config { env: "test" }),
///         Provider::ty::<Service>(),
///     ])
///     .await
///     .unwrap();
///
///     let service = injector.resolve::<Service>().await.unwrap();
///     assert_eq!(service.config.env, "test");
/// }
/// ```
pub struct Injector {
    eager: bool,
    registry: OnceCell<Registry>,
    metadata: MetadataRegistry,
    cache: ResolutionCache,
}

impl Injector {
    /// Creates an injector with the given providers and resolves all of them.
    ///
    /// Fails with the first error raised while resolving a provider,
    /// in which case no injector is returned.
    pub async fn create(providers: Vec<Provider>) -> Result<Rc<Injector>> {
        InjectorOptions::default().providers(providers).create().await
    }

    /// Returns a new [`InjectorOptions`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use cavia::{Injector, Provider};
    ///
    /// #[tokio::main(flavor = "current_thread")]
    /// async fn main() {
    ///     let injector = Injector::options()
    ///         .eager(false)
    ///         .provider(Provider::value("PORT", 8080_u16))
    ///         .create()
    ///         .await
    ///         .unwrap();
    ///
    ///     assert!(!injector.is_resolved("PORT"));
    /// }
    /// ```
    pub fn options() -> InjectorOptions {
        InjectorOptions::default()
    }

    /// Returns whether all providers were resolved when the injector was created.
    pub fn eager(&self) -> bool {
        self.eager
    }

    /// Returns all providers in registry order, the injector's own entry first.
    pub fn providers(&self) -> &[Provider] {
        self.registry.get().map(Registry::as_slice).unwrap_or(&[])
    }

    /// Returns whether a provider is registered for the token.
    pub fn contains(&self, token: impl Into<Token>) -> bool {
        self.find_provider(&token.into()).is_some()
    }

    /// Returns whether the token has already been resolved.
    pub fn is_resolved(&self, token: impl Into<Token>) -> bool {
        self.cache.contains(&token.into())
    }

    /// Returns the number of resolved tokens.
    pub fn resolved_len(&self) -> usize {
        self.cache.len()
    }

    /// Returns the resolved value of the first provider registered for the token.
    ///
    /// Returns `Ok(None)` if no provider is registered for the token.
    pub async fn find(&self, token: impl Into<Token>) -> Result<Option<Instance>> {
        match self.find_provider(&token.into()) {
            Some(provider) => self.resolve_root(provider).await.map(Some),
            None => Ok(None),
        }
    }

    /// Returns the resolved value of the first provider satisfying the predicate.
    ///
    /// Returns `Ok(None)` if no provider satisfies the predicate.
    pub async fn find_by<P>(&self, predicate: P) -> Result<Option<Instance>>
    where
        P: Fn(&Provider) -> bool,
    {
        match self.providers().iter().find(|provider| predicate(provider)) {
            Some(provider) => self.resolve_root(provider).await.map(Some),
            None => Ok(None),
        }
    }

    /// Returns the resolved values of all providers registered for any of the tokens,
    /// in registry order.
    ///
    /// Providers sharing a token all resolve to the value of the first of them.
    pub async fn filter<I, K>(&self, tokens: I) -> Result<Vec<Instance>>
    where
        I: IntoIterator<Item = K>,
        K: Into<Token>,
    {
        let tokens: Vec<Token> = tokens.into_iter().map(Into::into).collect();

        self.filter_by(|provider| {
            provider
                .token()
                .is_some_and(|token| tokens.contains(token))
        })
        .await
    }

    /// Returns the resolved values of all providers satisfying the predicate,
    /// in registry order.
    pub async fn filter_by<P>(&self, predicate: P) -> Result<Vec<Instance>>
    where
        P: Fn(&Provider) -> bool,
    {
        let mut instances = Vec::new();

        for provider in self.providers().iter().filter(|provider| predicate(provider)) {
            instances.push(self.resolve_root(provider).await?);
        }

        Ok(instances)
    }

    /// Like [`Injector::find`], then downcasts the value to `T`.
    pub async fn find_as<T: 'static>(&self, token: impl Into<Token>) -> Result<Option<Rc<T>>> {
        self.find(token)
            .await?
            .map(|instance| instance.try_downcast::<T>())
            .transpose()
    }

    /// Returns the resolved value registered for `Token::of::<T>()`.
    ///
    /// Fails with [`Error::NoProvider`] if there is no such provider.
    pub async fn resolve<T: 'static>(&self) -> Result<Rc<T>> {
        let token = Token::of::<T>();

        match self.find_as::<T>(token.clone()).await? {
            Some(instance) => Ok(instance),
            None => Err(Error::NoProvider(token)),
        }
    }

    /// Returns the dependencies of a provider, in the positional order
    /// they are passed to its constructor or factory.
    ///
    /// - value providers have none.
    /// - existing providers depend on the token they alias.
    /// - factory providers depend on what they declare.
    /// - class and type providers depend on the constructor parameters of the
    ///   implementation, where an override token replaces the declared one.
    pub fn dependencies(&self, provider: &Provider) -> Result<Vec<Dependency>> {
        match provider.kind()? {
            ProviderKind::Value(_) => Ok(Vec::new()),
            ProviderKind::Existing(existing) => Ok(vec![Dependency::required(existing.clone())]),
            ProviderKind::Factory { dependencies, .. } => Ok(dependencies.to_vec()),
            ProviderKind::Class(ty) | ProviderKind::Type(ty) => {
                let metadata = self.metadata.get(&ty).ok_or(Error::NotInjectable(ty))?;
                constructor_dependencies(metadata)
            }
        }
    }
}

impl Injector {
    fn find_provider(&self, token: &Token) -> Option<&Provider> {
        self.registry.get()?.find_by_token(token)
    }

    async fn init(&self) -> Result<()> {
        for provider in self.providers() {
            self.resolve_root(provider).await?;
        }

        Ok(())
    }

    async fn resolve_root(&self, provider: &Provider) -> Result<Instance> {
        let chain = DependencyChain::default();
        self.resolve_provider(provider, &chain).await
    }

    fn resolve_provider<'a>(
        &'a self,
        provider: &'a Provider,
        chain: &'a DependencyChain,
    ) -> BoxFuture<'a, Result<Instance>> {
        Box::pin(async move {
            let token = provider.token().ok_or_else(|| provider.invalid())?;

            if let Some(instance) = self.cache.get(token) {
                return Ok(instance);
            }

            let kind = provider.kind()?;

            chain.push(token)?;
            let result = self.resolve_slot(token, kind, chain).await;
            chain.pop();

            result
        })
    }

    async fn resolve_slot(
        &self,
        token: &Token,
        kind: ProviderKind<'_>,
        chain: &DependencyChain,
    ) -> Result<Instance> {
        // A concurrent request for the same token waits on the slot
        // instead of instantiating a second time, unless its owner waits on this chain.
        self.cache.check_wait(token, chain)?;

        let slot = self.cache.slot(token);
        let result = slot
            .get_or_try_init(move || async move {
                let _in_flight = self.cache.enter(token, chain);
                self.instantiate(token, kind, chain).await
            })
            .await
            .cloned();

        result
    }

    async fn instantiate(
        &self,
        token: &Token,
        kind: ProviderKind<'_>,
        chain: &DependencyChain,
    ) -> Result<Instance> {
        let instance = match kind {
            ProviderKind::Value(instance) => instance.clone(),
            ProviderKind::Existing(existing) => {
                if existing == token {
                    return Err(Error::SelfAlias(token.clone()));
                }

                let Some(target) = self.find_provider(existing) else {
                    return Err(Error::NoProvider(existing.clone()));
                };

                self.resolve_provider(target, chain).await?
            }
            ProviderKind::Class(ty) | ProviderKind::Type(ty) => {
                let metadata = self.metadata.get(&ty).ok_or(Error::NotInjectable(ty))?;
                let dependencies = constructor_dependencies(metadata)?;
                let args = self.resolve_dependencies(token, &dependencies, chain).await?;

                metadata
                    .constructor()
                    .call(args)
                    .await
                    .map_err(|e| Error::construction(token, e))?
            }
            ProviderKind::Factory {
                factory,
                dependencies,
            } => {
                let args = self.resolve_dependencies(token, dependencies, chain).await?;

                factory
                    .constructor()
                    .call(args)
                    .await
                    .map_err(|e| Error::construction(token, e))?
            }
        };

        #[cfg(feature = "tracing")]
        tracing::debug!("(=) resolved `{}`: {:?}", token, instance);

        Ok(instance)
    }

    async fn resolve_dependencies(
        &self,
        owner: &Token,
        dependencies: &[Dependency],
        chain: &DependencyChain,
    ) -> Result<Args> {
        let mut values = Vec::with_capacity(dependencies.len());

        for (index, dependency) in dependencies.iter().enumerate() {
            match self.find_provider(&dependency.token) {
                Some(provider) => values.push(Some(self.resolve_provider(provider, chain).await?)),
                None if dependency.optional => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "(-) optional dependency `{}` at index [{}] in `{}` is absent",
                        dependency.token,
                        index,
                        owner
                    );

                    values.push(None)
                }
                None => {
                    return Err(Error::MissingDependency {
                        provider: owner.clone(),
                        index,
                        dependency: dependency.token.clone(),
                    })
                }
            }
        }

        Ok(Args::new(owner.clone(), values))
    }
}

fn constructor_dependencies(metadata: &InjectableMetadata) -> Result<Vec<Dependency>> {
    metadata
        .params()
        .iter()
        .enumerate()
        .map(|(index, param)| {
            let token = match (metadata.inject_override(index), param) {
                (Some(inject), _) => inject.resolve(),
                (None, ParamType::Token(token)) => token.clone(),
                (None, ParamType::Unresolved) => {
                    return Err(Error::CircularTypeReference {
                        provider: metadata.ty(),
                        index,
                    })
                }
            };

            Ok(Dependency {
                token,
                optional: metadata.is_optional(index),
            })
        })
        .collect()
}

/// Options and flags which can be used to configure how an injector is created.
///
/// The [`Injector::create`] method is an alias for the default options
/// with a list of providers.
///
/// Generally speaking, when using `InjectorOptions`, you'll first call [`Injector::options`],
/// then chain calls to methods to set each option, then call [`InjectorOptions::create`].
///
/// # Example
///
/// ```rust
/// use cavia::{Error, InjectableMetadata, Injector, Provider};
///
/// struct Clock;
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let injector = Injector::options()
///         .eager(true)
///         .metadata(InjectableMetadata::new(|_| Ok::<_, Error>(Clock)))
///         .provider(Provider::ty::<Clock>())
///         .providers(vec![Provider::value("PORT", 8080_u16)])
///         .create()
///         .await
///         .unwrap();
///
///     assert!(injector.is_resolved(cavia::Token::of::<Clock>()));
/// }
/// ```
pub struct InjectorOptions {
    eager: bool,
    #[cfg(feature = "auto-register")]
    auto_register: bool,
    providers: Vec<Provider>,
    metadata: Vec<InjectableMetadata>,
}

impl Default for InjectorOptions {
    fn default() -> Self {
        Self {
            eager: true,
            #[cfg(feature = "auto-register")]
            auto_register: true,
            providers: Default::default(),
            metadata: Default::default(),
        }
    }
}

impl InjectorOptions {
    /// Sets whether every provider is resolved while the injector is created, default is true.
    ///
    /// When false, providers are resolved on first lookup, and errors
    /// surface from [`Injector::find`] and friends instead of from `create`.
    pub fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    /// Sets whether the metadata of all `#[Injectable]` types is collected, default is true.
    #[cfg_attr(docsrs, doc(cfg(feature = "auto-register")))]
    #[cfg(feature = "auto-register")]
    pub fn auto_register(mut self, auto_register: bool) -> Self {
        self.auto_register = auto_register;
        self
    }

    /// Appends a provider.
    pub fn provider<P>(mut self, provider: P) -> Self
    where
        P: Into<Provider>,
    {
        self.providers.push(provider.into());
        self
    }

    /// Appends providers.
    pub fn providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = Provider>,
    {
        self.providers.extend(providers);
        self
    }

    /// Makes `T` eligible for class and type providers.
    pub fn injectable<T: Injectable>(self) -> Self {
        self.metadata(T::metadata())
    }

    /// Makes the type described by the metadata eligible for class and type providers.
    ///
    /// Explicit metadata takes precedence over auto-registered metadata of the same type.
    pub fn metadata(mut self, metadata: InjectableMetadata) -> Self {
        self.metadata.push(metadata);
        self
    }

    /// Creates an injector with the configured options.
    ///
    /// The injector's own entry is inserted in front of the providers, then,
    /// if eager, every provider is resolved in registry order.
    pub async fn create(self) -> Result<Rc<Injector>> {
        let InjectorOptions {
            eager,
            #[cfg(feature = "auto-register")]
            auto_register,
            providers,
            metadata,
        } = self;

        let mut metadata_registry = MetadataRegistry::default();

        #[cfg(feature = "auto-register")]
        if auto_register {
            crate::auto_registered_injectables()
                .for_each(|metadata| metadata_registry.insert(metadata));
        }

        metadata
            .into_iter()
            .for_each(|metadata| metadata_registry.insert(metadata));

        let injector = Rc::new(Injector {
            eager,
            registry: OnceCell::new(),
            metadata: metadata_registry,
            cache: ResolutionCache::default(),
        });

        let bootstrap = Provider::instance(
            Token::of::<Injector>(),
            Instance::from_rc(Rc::clone(&injector)),
        );

        injector
            .registry
            .get_or_init(|| Registry::new(iter::once(bootstrap).chain(providers).collect()));

        if eager {
            injector.init().await?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "(*) injector created: {} providers, {} resolved",
            injector.providers().len(),
            injector.resolved_len()
        );

        Ok(injector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forward_ref;

    struct Service;

    #[test]
    fn override_tokens_replace_declared_ones() {
        let metadata = InjectableMetadata::new(|_| Ok::<_, Error>(Service))
            .param(Token::of::<u8>())
            .param(Token::of::<u16>())
            .unresolved_param()
            .inject(1, "B")
            .inject(2, forward_ref(|| Token::from("C")))
            .optional(2);

        assert_eq!(
            constructor_dependencies(&metadata).unwrap(),
            vec![
                Dependency::required(Token::of::<u8>()),
                Dependency::required("B"),
                Dependency::optional("C"),
            ]
        );
    }

    #[test]
    fn unresolved_params_need_an_override() {
        let metadata = InjectableMetadata::new(|_| Ok::<_, Error>(Service))
            .param(Token::of::<u8>())
            .unresolved_param();

        assert!(matches!(
            constructor_dependencies(&metadata),
            Err(Error::CircularTypeReference { index: 1, .. })
        ));
    }
}
