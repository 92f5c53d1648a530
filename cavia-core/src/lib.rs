/// Represents the color of a constructor, i.e., async or sync.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Color {
    /// async constructor, the returned future is awaited by the injector
    Async,
    /// sync constructor, the instance is returned directly
    Sync,
}
