#[doc(hidden)]
pub use inventory::submit;

use crate::InjectableMetadata;

#[doc(hidden)]
pub struct InjectableRegister {
    pub register: fn() -> InjectableMetadata,
}

inventory::collect!(InjectableRegister);

/// Returns an iterator over the metadata of all auto-registered injectable types.
///
/// [`InjectorOptions`](crate::InjectorOptions) uses this function to find out which
/// types may be used by class and type providers, unless
/// [`InjectorOptions::auto_register`](crate::InjectorOptions::auto_register) is turned off.
///
/// # Example
///
/// ```rust
/// use cavia::{auto_registered_injectables, Injectable, Type};
///
/// #[Injectable]
/// struct Repository;
///
/// # fn main() {
/// assert!(auto_registered_injectables().any(|metadata| metadata.ty() == Type::of::<Repository>()));
/// # }
/// ```
pub fn auto_registered_injectables() -> impl Iterator<Item = InjectableMetadata> {
    inventory::iter::<InjectableRegister>
        .into_iter()
        .map(|register| (register.register)())
}

/// Register hand-written [`InjectableMetadata`] so that it is collected by
/// [`auto_registered_injectables`].
///
/// Types annotated with `#[Injectable]` are registered automatically,
/// this macro is for metadata written by hand.
///
/// # Example
///
/// ```rust
/// use cavia::{register_injectable, Error, Injector, InjectableMetadata, Provider};
///
/// struct Clock;
///
/// register_injectable!(InjectableMetadata::new(|_| Ok::<_, Error>(Clock)));
///
/// #[tokio::main(flavor = "current_thread")]
/// async fn main() {
///     let injector = Injector::create(vec![Provider::ty::<Clock>()]).await.unwrap();
///     assert!(injector.resolve::<Clock>().await.is_ok());
/// }
/// ```
#[macro_export]
macro_rules! register_injectable {
    ($metadata:expr) => {
        const _: () = {
            fn register() -> $crate::InjectableMetadata {
                $metadata
            }

            $crate::submit! {
                $crate::InjectableRegister {
                    register
                }
            }
        };
    };
}

/// Generate a function to enable auto-registration.
///
/// [`inventory`] only collects items from crates that are actually linked. If the
/// injectable types live in another crate that the binary never otherwise uses,
/// call that crate's `enable` function so its registrations are linked in.
///
/// The enable functions of further crates can be called from the body,
/// so enabling one crate enables its dependencies as well.
///
/// # Example
///
/// ```rust ignore
/// // storage/src/lib.rs
/// cavia::enable! {}
///
/// // app/src/lib.rs
/// cavia::enable! {
///     storage::enable();
/// }
/// ```
#[macro_export]
macro_rules! enable {
    ($($body:tt)*) => {
        /// Enable auto-registration.
        pub fn enable() {
            $($body)*
        }
    };
}
