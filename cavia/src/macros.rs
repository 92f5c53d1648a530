/// Convert a set of values that implement `Into<Provider>`
/// to a set of [`Provider`] instances.
///
/// # Example
///
/// ```rust
/// use cavia::{providers, Declaration, Provider, Type};
///
/// struct Logger;
///
/// # fn main() {
/// let _: Vec<Provider> = providers![
///     Provider::value("PORT", 8080_u16),
///     Declaration::new().provide("HOST").use_value("localhost"),
///     Type::of::<Logger>(),
/// ];
/// # }
/// ```
///
/// [`Provider`]: crate::Provider
#[macro_export]
macro_rules! providers {
    () => {
        vec![]
    };
    ($($provider:expr),+ $(,)?) => {
        vec![$(
            <$crate::Provider as ::core::convert::From<_>>::from($provider)
        ),+]
    };
}

/// Convert a set of values that implement `Into<Dependency>`
/// to a set of required [`Dependency`] instances.
///
/// Use [`Dependency::optional`] for a dependency that may be absent.
///
/// # Example
///
/// ```rust
/// use cavia::{dependencies, Dependency, Symbol, Token};
///
/// struct Database;
///
/// # fn main() {
/// let cache = Symbol::new("cache");
///
/// let deps: Vec<Dependency> = dependencies![
///     "CONFIG",
///     Token::of::<Database>(),
///     Dependency::optional(cache),
/// ];
///
/// assert!(deps[2].optional);
/// # }
/// ```
///
/// [`Dependency`]: crate::Dependency
/// [`Dependency::optional`]: crate::Dependency::optional
#[macro_export]
macro_rules! dependencies {
    () => {
        vec![]
    };
    ($($dependency:expr),+ $(,)?) => {
        vec![$(
            <$crate::Dependency as ::core::convert::From<_>>::from($dependency)
        ),+]
    };
}
