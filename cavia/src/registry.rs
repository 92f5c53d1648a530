use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    fmt::Write,
    iter,
    rc::Rc,
};

use tokio::sync::OnceCell;

use crate::{Error, Instance, Provider, Result, Token};

pub(crate) struct Registry {
    providers: Vec<Provider>,
}

impl Registry {
    pub(crate) fn new(providers: Vec<Provider>) -> Self {
        let mut seen = HashSet::with_capacity(providers.len());

        for provider in &providers {
            let Some(token) = provider.token() else {
                continue;
            };

            if seen.insert(token) {
                #[cfg(feature = "tracing")]
                tracing::debug!("(+) insert new: {:?}", provider);
            } else {
                // Lookups stop at the first match, later duplicates are never resolved.
                #[cfg(feature = "tracing")]
                tracing::warn!("(!) shadowed by an earlier `provide`: {:?}", provider);
            }
        }

        Self { providers }
    }

    pub(crate) fn find_by_token(&self, token: &Token) -> Option<&Provider> {
        self.providers
            .iter()
            .find(|provider| provider.token() == Some(token))
    }

    pub(crate) fn as_slice(&self) -> &[Provider] {
        &self.providers
    }
}

/// One slot per token. A slot that is being initialized is the "resolving" state,
/// an initialized slot is "resolved". A failed initialization leaves the slot empty.
///
/// While a slot is being initialized, the chain of the request filling it is
/// recorded as its owner.
#[derive(Default)]
pub(crate) struct ResolutionCache {
    slots: RefCell<HashMap<Token, Rc<OnceCell<Instance>>>>,
    owners: RefCell<HashMap<Token, DependencyChain>>,
}

impl ResolutionCache {
    pub(crate) fn get(&self, token: &Token) -> Option<Instance> {
        self.slots.borrow().get(token)?.get().cloned()
    }

    pub(crate) fn slot(&self, token: &Token) -> Rc<OnceCell<Instance>> {
        Rc::clone(
            self.slots
                .borrow_mut()
                .entry(token.clone())
                .or_insert_with(|| Rc::new(OnceCell::new())),
        )
    }

    /// Marks `chain` as the owner of the slot of `token` until the guard is dropped.
    pub(crate) fn enter(&self, token: &Token, chain: &DependencyChain) -> InFlight<'_> {
        self.owners
            .borrow_mut()
            .insert(token.clone(), chain.clone());

        InFlight {
            owners: &self.owners,
            token: token.clone(),
        }
    }

    /// Fails if waiting for the slot of `token` would make `chain` wait on itself,
    /// through the requests that own the slots in between.
    ///
    /// `token` must already be on `chain`.
    pub(crate) fn check_wait(&self, token: &Token, chain: &DependencyChain) -> Result<()> {
        let owners = self.owners.borrow();

        let mut entered = token.clone();
        let mut path = Vec::new();

        for _ in 0..=owners.len() {
            let Some(owner) = owners.get(&entered) else {
                return Ok(());
            };

            if owner.same(chain) {
                path.extend(chain.segment(&entered));
                return Err(circular_dependency(token, path.iter()));
            }

            let Some(top) = owner.top() else {
                return Ok(());
            };

            // The owner is instantiating, not waiting.
            if owners.get(&top).is_some_and(|next| next.same(owner)) {
                return Ok(());
            }

            let mut segment = owner.segment(&entered);
            segment.pop();
            path.extend(segment);

            entered = top;
        }

        Ok(())
    }

    pub(crate) fn contains(&self, token: &Token) -> bool {
        self.slots
            .borrow()
            .get(token)
            .is_some_and(|slot| slot.initialized())
    }

    pub(crate) fn len(&self) -> usize {
        self.slots
            .borrow()
            .values()
            .filter(|slot| slot.initialized())
            .count()
    }
}

pub(crate) struct InFlight<'a> {
    owners: &'a RefCell<HashMap<Token, DependencyChain>>,
    token: Token,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.owners.borrow_mut().remove(&self.token);
    }
}

/// The tokens a top-level request is resolving, innermost last.
///
/// Clones share the same stack.
#[derive(Clone, Default)]
pub(crate) struct DependencyChain {
    stack: Rc<RefCell<Vec<Token>>>,
}

impl DependencyChain {
    pub(crate) fn push(&self, token: &Token) -> Result<()> {
        let mut stack = self.stack.borrow_mut();

        if stack.contains(token) {
            return Err(circular_dependency(
                token,
                stack.iter().chain(iter::once(token)),
            ));
        }

        stack.push(token.clone());
        Ok(())
    }

    pub(crate) fn pop(&self) {
        self.stack.borrow_mut().pop();
    }

    fn top(&self) -> Option<Token> {
        self.stack.borrow().last().cloned()
    }

    fn same(&self, other: &DependencyChain) -> bool {
        Rc::ptr_eq(&self.stack, &other.stack)
    }

    // The tokens from `from` to the innermost one.
    fn segment(&self, from: &Token) -> Vec<Token> {
        let stack = self.stack.borrow();
        let start = stack.iter().position(|t| t == from).unwrap_or(0);
        stack[start..].to_vec()
    }
}

fn circular_dependency<'a>(token: &Token, path: impl Iterator<Item = &'a Token>) -> Error {
    let mut buf = String::with_capacity(256);
    buf.push('[');
    buf.push('\n');

    path.for_each(|t| {
        let marker = if t == token { " --> " } else { "     " };
        let _ = writeln!(buf, "{}{}", marker, t);
    });

    buf.push(']');

    Error::CircularDependency {
        token: token.clone(),
        chain: buf,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn first_provider_wins() {
        let registry = Registry::new(vec![
            Provider::value("A", 1),
            Provider::value("B", 2),
            Provider::value("A", 3),
        ]);

        let found = registry.find_by_token(&Token::from("A")).unwrap();
        assert!(std::ptr::eq(found, &registry.as_slice()[0]));
        assert!(registry.find_by_token(&Token::from("C")).is_none());
    }

    #[test]
    fn slots_are_shared_per_token() {
        let cache = ResolutionCache::default();
        let token = Token::from("A");

        assert!(!cache.contains(&token));
        assert!(Rc::ptr_eq(&cache.slot(&token), &cache.slot(&token)));
        assert_eq!(cache.len(), 0);

        let instance = Instance::new(1);
        cache.slot(&token).set(instance.clone()).unwrap();

        assert!(cache.contains(&token));
        assert!(Instance::ptr_eq(&cache.get(&token).unwrap(), &instance));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn chain_rejects_a_token_already_on_it() {
        let chain = DependencyChain::default();

        chain.push(&Token::from("A")).unwrap();
        chain.push(&Token::from("B")).unwrap();

        let error = chain.push(&Token::from("A")).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CircularDependency);
        assert!(error.to_string().contains(" --> A"));

        chain.pop();
        chain.push(&Token::from("C")).unwrap();
    }

    #[test]
    fn waiting_on_an_owner_that_waits_back_is_a_cycle() {
        let cache = ResolutionCache::default();
        let (a, b) = (Token::from("A"), Token::from("B"));

        let first = DependencyChain::default();
        first.push(&a).unwrap();
        let _a = cache.enter(&a, &first);

        let second = DependencyChain::default();
        second.push(&b).unwrap();
        let _b = cache.enter(&b, &second);

        // `first` waits on `B` while its owner is busy instantiating it.
        first.push(&b).unwrap();
        cache.check_wait(&b, &first).unwrap();

        // `second` closes the loop.
        second.push(&a).unwrap();
        let error = cache.check_wait(&a, &second).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::CircularDependency);

        let rendered = error.to_string();
        assert_eq!(rendered.matches(" --> A").count(), 2, "{rendered}");
        assert!(rendered.contains("     B"), "{rendered}");
    }

    #[test]
    fn owners_are_released_with_their_guard() {
        let cache = ResolutionCache::default();
        let (a, b) = (Token::from("A"), Token::from("B"));

        let first = DependencyChain::default();
        first.push(&a).unwrap();
        let guard = cache.enter(&a, &first);

        let second = DependencyChain::default();
        second.push(&b).unwrap();
        let _b = cache.enter(&b, &second);

        first.push(&b).unwrap();
        second.push(&a).unwrap();
        drop(guard);

        cache.check_wait(&a, &second).unwrap();
    }
}
