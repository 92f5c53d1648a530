use std::{
    any::{self, TypeId},
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
    rc::Rc,
    sync::atomic::{AtomicU64, Ordering},
};

/// The identity a provider is registered and looked up by.
///
/// Tokens are compared by equality only:
/// - [`Token::Type`] by [`TypeId`](std::any::TypeId),
/// - [`Token::Symbol`] by the identity of the [`Symbol`],
/// - [`Token::Name`] by the string.
///
/// # Example
///
/// ```rust
/// use cavia::{Symbol, Token};
///
/// struct Database;
///
/// let by_type = Token::of::<Database>();
/// let by_name = Token::from("CONFIG");
/// let by_symbol = Token::from(Symbol::new("database"));
///
/// assert_eq!(by_type, Token::of::<Database>());
/// assert_ne!(by_name, Token::from("config"));
/// assert_ne!(by_symbol, Token::from(Symbol::new("database")));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// A type reference.
    Type(Type),
    /// An opaque symbolic marker.
    Symbol(Symbol),
    /// A plain string.
    Name(Cow<'static, str>),
}

impl Token {
    /// Returns the token of type `T`.
    pub fn of<T: 'static>() -> Token {
        Token::Type(Type::of::<T>())
    }

    /// Returns the type if the token is a [`Token::Type`].
    pub fn as_type(&self) -> Option<&Type> {
        match self {
            Token::Type(ty) => Some(ty),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(ty) => fmt::Display::fmt(ty, f),
            Token::Symbol(symbol) => fmt::Display::fmt(symbol, f),
            Token::Name(name) => f.write_str(name),
        }
    }
}

impl From<Type> for Token {
    fn from(value: Type) -> Self {
        Token::Type(value)
    }
}

impl From<Symbol> for Token {
    fn from(value: Symbol) -> Self {
        Token::Symbol(value)
    }
}

impl From<&'static str> for Token {
    fn from(value: &'static str) -> Self {
        Token::Name(Cow::Borrowed(value))
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Token::Name(Cow::Owned(value))
    }
}

impl From<Cow<'static, str>> for Token {
    fn from(value: Cow<'static, str>) -> Self {
        Token::Name(value)
    }
}

/// A type, used as a token or as the implementation behind a class provider.
///
/// Two types are equal when their [`TypeId`]s are, the name is only for display.
#[derive(Clone, Copy)]
pub struct Type {
    id: TypeId,
    name: &'static str,
}

impl Type {
    /// Returns the [`Type`] of `T`.
    pub fn of<T: ?Sized + 'static>() -> Type {
        Type {
            id: TypeId::of::<T>(),
            name: any::type_name::<T>(),
        }
    }

    /// Returns the unique identifier of the type.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Type").field(&self.name).finish()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// An opaque marker, every call to [`Symbol::new`] returns a distinct symbol.
#[derive(Clone, Copy, Debug)]
pub struct Symbol {
    id: u64,
    description: &'static str,
}

impl Symbol {
    /// Creates a new unique symbol, the description is only used for display.
    pub fn new(description: &'static str) -> Symbol {
        static NEXT_ID: AtomicU64 = AtomicU64::new(0);

        Symbol {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    /// Returns the description of the symbol.
    pub fn description(&self) -> &'static str {
        self.description
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A lazily dereferenced token.
///
/// The accessor is only called when the injector extracts the dependencies
/// of the type that declared it, never at registration time.
///
/// # Example
///
/// ```rust
/// use cavia::{forward_ref, Token};
///
/// struct Later;
///
/// let reference = forward_ref(|| Token::of::<Later>());
/// assert_eq!(reference.resolve(), Token::of::<Later>());
/// ```
#[derive(Clone)]
pub struct ForwardRef(Rc<dyn Fn() -> Token>);

impl ForwardRef {
    /// Dereferences the forward reference.
    pub fn resolve(&self) -> Token {
        (self.0)()
    }
}

impl fmt::Debug for ForwardRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ForwardRef(..)")
    }
}

/// Creates a [`ForwardRef`] from a zero-argument accessor.
pub fn forward_ref<F>(accessor: F) -> ForwardRef
where
    F: Fn() -> Token + 'static,
{
    ForwardRef(Rc::new(accessor))
}

/// An override token for a constructor parameter.
#[derive(Clone, Debug)]
pub enum InjectToken {
    /// A token used as is.
    Token(Token),
    /// A token behind one level of indirection.
    Forward(ForwardRef),
}

impl InjectToken {
    /// Returns the effective token, dereferencing a forward reference once.
    pub fn resolve(&self) -> Token {
        match self {
            InjectToken::Token(token) => token.clone(),
            InjectToken::Forward(forward) => forward.resolve(),
        }
    }
}

impl From<ForwardRef> for InjectToken {
    fn from(value: ForwardRef) -> Self {
        InjectToken::Forward(value)
    }
}

macro_rules! inject_token_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for InjectToken {
                fn from(value: $ty) -> Self {
                    InjectToken::Token(Token::from(value))
                }
            }
        )+
    };
}

inject_token_from!(Token, Type, Symbol, &'static str, String);
