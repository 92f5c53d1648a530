use std::{any::Any, fmt, rc::Rc};

use crate::{Error, Result, Token};

/// Represents a resolved value whose type is erased.
///
/// Cloning an instance clones the reference, so every clone points at the same value.
#[derive(Clone)]
pub struct Instance {
    value: Rc<dyn Any>,
    type_name: &'static str,
}

impl Instance {
    /// Wraps `value` into a new instance.
    pub fn new<T: 'static>(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    /// Wraps an existing reference counted value without allocating again.
    pub fn from_rc<T: 'static>(value: Rc<T>) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the name of the type stored in the instance.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the instance stores a `T`.
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Returns a reference to the stored value if it is a `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns the stored value if it is a `T`.
    pub fn downcast<T: 'static>(&self) -> Option<Rc<T>> {
        Rc::clone(&self.value).downcast::<T>().ok()
    }

    /// Like [`Instance::downcast`], but returns an [`Error::TypeMismatch`] on failure.
    pub fn try_downcast<T: 'static>(&self) -> Result<Rc<T>> {
        self.downcast::<T>().ok_or_else(|| Error::TypeMismatch {
            expected: std::any::type_name::<T>(),
            found: self.type_name,
        })
    }

    /// Returns `true` if both instances point at the same value.
    pub fn ptr_eq(this: &Instance, other: &Instance) -> bool {
        Rc::ptr_eq(&this.value, &other.value)
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// The resolved dependencies handed to a constructor or a factory.
///
/// Arguments are positional, in the order the dependencies were declared.
/// An optional dependency without a provider is an absent argument.
pub struct Args {
    owner: Token,
    values: Vec<Option<Instance>>,
}

impl Args {
    pub(crate) fn new(owner: Token, values: Vec<Option<Instance>>) -> Self {
        Self { owner, values }
    }

    /// Returns the token of the provider being constructed.
    pub fn owner(&self) -> &Token {
        &self.owner
    }

    /// Returns the number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the raw argument at `index`, `None` if it is absent or out of range.
    pub fn get(&self, index: usize) -> Option<&Instance> {
        self.values.get(index)?.as_ref()
    }

    /// Returns the argument at `index` as a `T`.
    ///
    /// Fails with [`Error::MissingArgument`] if the argument is absent
    /// and with [`Error::TypeMismatch`] if it is not a `T`.
    pub fn required<T: 'static>(&self, index: usize) -> Result<Rc<T>> {
        match self.get(index) {
            Some(instance) => instance.try_downcast(),
            None => Err(Error::MissingArgument {
                owner: self.owner.clone(),
                index,
            }),
        }
    }

    /// Returns the argument at `index` as a `T`, `None` if it is absent.
    pub fn optional<T: 'static>(&self, index: usize) -> Result<Option<Rc<T>>> {
        self.get(index).map(Instance::try_downcast).transpose()
    }

    /// Returns an iterator over the raw arguments.
    pub fn iter(&self) -> impl Iterator<Item = Option<&Instance>> {
        self.values.iter().map(Option::as_ref)
    }
}

impl fmt::Debug for Args {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Args")
            .field("owner", &self.owner)
            .field("values", &self.values)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn clones_share_the_value() {
        let a = Instance::new(String::from("hello"));
        let b = a.clone();

        assert!(Instance::ptr_eq(&a, &b));
        assert!(!Instance::ptr_eq(&a, &Instance::new(String::from("hello"))));
        assert_eq!(a.downcast_ref::<String>().map(String::as_str), Some("hello"));
    }

    #[test]
    fn from_rc_keeps_the_allocation() {
        let value = Rc::new(42_u8);
        let instance = Instance::from_rc(value.clone());

        assert!(Rc::ptr_eq(&value, &instance.downcast::<u8>().unwrap()));
    }

    #[test]
    fn args_check_presence_and_type() {
        let args = Args::new(
            Token::from("owner"),
            vec![Some(Instance::new(1_i32)), None],
        );

        assert_eq!(*args.required::<i32>(0).unwrap(), 1);
        assert!(args.optional::<i32>(1).unwrap().is_none());
        assert_eq!(
            args.required::<i32>(1).unwrap_err().kind(),
            ErrorKind::TypeMismatch
        );
        assert!(matches!(
            args.required::<String>(0),
            Err(Error::TypeMismatch { found: "i32", .. })
        ));
        assert!(matches!(
            args.required::<i32>(5),
            Err(Error::MissingArgument { index: 5, .. })
        ));
    }
}
