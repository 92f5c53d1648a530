use thiserror::Error;

use crate::{Token, Type};

/// A boxed error returned by user constructors and factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A specialized [`Result`](std::result::Result) type for resolution.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while classifying, wiring or constructing providers.
#[derive(Debug, Error)]
pub enum Error {
    /// A declaration matches none of the provider shapes.
    #[error("invalid provider `{0}`")]
    InvalidProvider(String),

    /// A class or type provider points at a type without injectable metadata.
    #[error("the `{0}` should be annotated as injectable")]
    NotInjectable(Type),

    /// A constructor parameter has no declared token and no override covers it.
    #[error("can't resolve circular type reference at index [{index}] in `{provider}`")]
    CircularTypeReference {
        /// The type whose constructor declares the parameter.
        provider: Type,
        /// The position of the parameter.
        index: usize,
    },

    /// An existing provider aliases its own token.
    #[error("cannot instantiate cyclic dependency for token `{0}`")]
    SelfAlias(Token),

    /// No provider is registered for a token.
    #[error("no provider for `{0}`")]
    NoProvider(Token),

    /// A required dependency of a provider has no matching provider.
    #[error("can't resolve dependency `{dependency}` at index [{index}] in `{provider}`")]
    MissingDependency {
        /// The token of the provider being constructed.
        provider: Token,
        /// The position of the dependency.
        index: usize,
        /// The token nobody provides.
        dependency: Token,
    },

    /// A provider depends on itself through other providers.
    #[error("circular dependency detected for `{token}`: {chain}")]
    CircularDependency {
        /// The token that was requested a second time.
        token: Token,
        /// The rendered dependency chain.
        chain: String,
    },

    /// A resolved value has a different type than the one requested.
    #[error("expected an instance of `{expected}`, found `{found}`")]
    TypeMismatch {
        /// The requested type.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },

    /// A constructor asked for an argument that is absent.
    #[error("no argument at index [{index}] of `{owner}`")]
    MissingArgument {
        /// The token being constructed.
        owner: Token,
        /// The position of the argument.
        index: usize,
    },

    /// A constructor or factory failed.
    #[error("failed to construct `{token}`")]
    Construction {
        /// The token being constructed.
        token: Token,
        /// The error returned by the constructor.
        #[source]
        source: BoxError,
    },
}

/// The kind of an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// See [`Error::InvalidProvider`].
    InvalidProviderDeclaration,
    /// See [`Error::NotInjectable`].
    NotInjectable,
    /// See [`Error::CircularTypeReference`].
    CircularTypeReference,
    /// See [`Error::SelfAlias`].
    SelfAlias,
    /// See [`Error::NoProvider`] and [`Error::MissingDependency`].
    NoProviderForToken,
    /// See [`Error::CircularDependency`].
    CircularDependency,
    /// See [`Error::TypeMismatch`] and [`Error::MissingArgument`].
    TypeMismatch,
    /// See [`Error::Construction`].
    Construction,
}

impl Error {
    /// Returns the kind of the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidProvider(_) => ErrorKind::InvalidProviderDeclaration,
            Error::NotInjectable(_) => ErrorKind::NotInjectable,
            Error::CircularTypeReference { .. } => ErrorKind::CircularTypeReference,
            Error::SelfAlias(_) => ErrorKind::SelfAlias,
            Error::NoProvider(_) | Error::MissingDependency { .. } => {
                ErrorKind::NoProviderForToken
            }
            Error::CircularDependency { .. } => ErrorKind::CircularDependency,
            Error::TypeMismatch { .. } | Error::MissingArgument { .. } => ErrorKind::TypeMismatch,
            Error::Construction { .. } => ErrorKind::Construction,
        }
    }

    // Errors raised by the injector itself inside a constructor pass through untouched.
    pub(crate) fn construction(token: &Token, source: BoxError) -> Error {
        match source.downcast::<Error>() {
            Ok(error) => *error,
            Err(source) => Error::Construction {
                token: token.clone(),
                source,
            },
        }
    }
}
