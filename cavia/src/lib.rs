//! Cavia is a token-based dependency injection container.
//!
//! Providers map a [`Token`] (a type, a [`Symbol`] or a name) to a way of
//! producing a value: a precomputed value, a type to instantiate, an alias of
//! another token, or a factory function. An [`Injector`] resolves each token at
//! most once, async constructors included, and hands out the same [`Instance`]
//! on every later lookup.
//!
//! Types become instantiable through [`InjectableMetadata`], usually generated
//! by the `#[Injectable]` attribute macro.
//!
//! # Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use cavia::{dependencies, Error, Injectable, Injector, Provider};
//!
//! struct Config {
//!     url: &'static str,
//! }
//!
//! struct Connection {
//!     url: &'static str,
//! }
//!
//! #[Injectable]
//! struct Repository {
//!     #[di(inject = "CONNECTION")]
//!     connection: Rc<Connection>,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let injector = Injector::create(vec![
//!         Provider::value("CONFIG", Config { url: "postgres://localhost" }),
//!         Provider::factory_async("CONNECTION", dependencies!["CONFIG"], |args| async move {
//!             let config = args.required::<Config>(0)?;
//!             Ok::<_, Error>(Connection { url: config.url })
//!         }),
//!         Provider::ty::<Repository>(),
//!     ])
//!     .await
//!     .unwrap();
//!
//!     let repository = injector.resolve::<Repository>().await.unwrap();
//!     assert_eq!(repository.connection.url, "postgres://localhost");
//! }
//! ```
//!
//! # Features
//!
//! - `cavia-macro` (default): the `#[Injectable]` attribute macro.
//! - `auto-register` (default): collect the metadata of every `#[Injectable]` type
//!   automatically, see [`auto_registered_injectables`].
//! - `tracing`: log registration and resolution with [`tracing`](https://docs.rs/tracing).

#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg_attr(docsrs, doc(cfg(feature = "auto-register")))]
#[cfg(feature = "auto-register")]
mod auto_register;
mod error;
mod injector;
mod instance;
mod macros;
mod metadata;
mod provider;
mod registry;
mod token;

#[cfg_attr(docsrs, doc(cfg(feature = "auto-register")))]
#[cfg(feature = "auto-register")]
pub use auto_register::*;
pub use cavia_core::*;
pub use error::*;
pub use injector::*;
pub use instance::*;
pub use metadata::{BoxFuture, Injectable, InjectableMetadata, ParamType};
pub use provider::*;
pub(crate) use registry::*;
pub use token::*;

/// Generate [`InjectableMetadata`] for a struct or for the `#[di]` constructor of an impl block,
/// and implement the [`Injectable`](trait@Injectable) trait.
///
/// ## Struct
///
/// Every field is a constructor parameter, in declaration order. A field of
/// type `Rc<T>` depends on `Token::of::<T>()`, a field of type `Option<Rc<T>>`
/// marked `#[di(optional)]` may be absent.
///
/// ```rust
/// use std::rc::Rc;
///
/// use cavia::Injectable;
///
/// struct Cache;
///
/// #[Injectable]
/// struct Database;
///
/// #[Injectable]
/// struct Service {
///     database: Rc<Database>,
///     #[di(inject = "CONFIG")]
///     config: Rc<String>,
///     #[di(optional)]
///     cache: Option<Rc<Cache>>,
/// }
/// ```
///
/// ## Impl block
///
/// The associated function marked `#[di]` is the constructor, its arguments are
/// the parameters. It can be `async`, and must return `Self`.
///
/// ```rust
/// use std::rc::Rc;
///
/// use cavia::{Injectable, Token};
///
/// struct Pool;
///
/// struct Repository {
///     pool: Rc<Pool>,
/// }
///
/// #[Injectable]
/// impl Repository {
///     #[di]
///     async fn connect(#[di(forward_ref = || Token::from("POOL"))] pool: Rc<Pool>) -> Self {
///         Self { pool }
///     }
/// }
/// ```
///
/// ## Attributes
///
/// On the macro:
/// - `auto_register = bool`: register the metadata for [`auto_registered_injectables`],
///   default is true when the `auto-register` feature is enabled.
///
/// On the item, `#[di(cavia_path = path)]`: the path of the `cavia` crate,
/// for when it is renamed or re-exported.
///
/// On a field or an argument:
/// - `#[di(inject = expr)]`: resolve the parameter by this token instead of its type.
/// - `#[di(forward_ref = closure)]`: like `inject`, the token is produced lazily by the closure.
/// - `#[di(optional)]`: the parameter may be absent, its type must be `Option<Rc<T>>`.
#[cfg_attr(docsrs, doc(cfg(feature = "cavia-macro")))]
#[cfg(feature = "cavia-macro")]
pub use cavia_macro::Injectable;
