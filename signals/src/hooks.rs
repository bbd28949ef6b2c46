use std::sync::{Arc, Mutex, Weak};

trait Hook: Send + Sync {
    /// Returns whether the hook wants to run again on the next clear
    fn run(&self) -> bool;

    fn is_live(&self) -> bool;
}

struct Once<F>(F);

impl<F: Fn() + Send + Sync> Hook for Once<F> {
    fn run(&self) -> bool {
        (self.0)();
        false
    }

    fn is_live(&self) -> bool { true }
}

/// Runs on every clear for as long as its owner is alive
struct Owned<O, F> {
    owner: Weak<O>,
    hook: F,
}

impl<O, F> Hook for Owned<O, F>
where
    O: Send + Sync,
    F: Fn(&O) + Send + Sync,
{
    fn run(&self) -> bool {
        match self.owner.upgrade() {
            Some(owner) => {
                (self.hook)(&owner);
                true
            }
            None => false,
        }
    }

    fn is_live(&self) -> bool { self.owner.strong_count() > 0 }
}

type HookList = Arc<Mutex<Vec<Arc<dyn Hook>>>>;

/// Teardown work registered against writable signals and run when one of them is cleared.
///
/// Shared by every signal derived from the same writable signal, so a cache attached anywhere down a derivation
/// chain dies with the signal at its root. A merged signal depends on several roots: its hooks are registered with
/// each of them and run when any of them is cleared.
#[derive(Clone)]
pub(crate) struct ClearHooks(Vec<HookList>);

impl Default for ClearHooks {
    fn default() -> Self { Self(vec![HookList::default()]) }
}

impl ClearHooks {
    pub fn new() -> Self { Self::default() }

    /// Hooks registered with every root behind `parents`
    pub fn merged<'a>(parents: impl IntoIterator<Item = &'a ClearHooks>) -> Self {
        let mut lists: Vec<HookList> = Vec::new();
        for list in parents.into_iter().flat_map(|hooks| hooks.0.iter()) {
            if !lists.iter().any(|known| Arc::ptr_eq(known, list)) {
                lists.push(list.clone());
            }
        }
        Self(lists)
    }

    /// Registers a hook that runs on the next clear only
    pub fn push<F>(&self, hook: F)
    where F: Fn() + Send + Sync + 'static {
        self.push_hook(Arc::new(Once(hook)));
    }

    /// Registers a hook that runs on every clear until `owner` is dropped
    pub fn push_owned<O, F>(&self, owner: &Arc<O>, hook: F)
    where
        O: Send + Sync + 'static,
        F: Fn(&O) + Send + Sync + 'static,
    {
        self.push_hook(Arc::new(Owned { owner: Arc::downgrade(owner), hook }));
    }

    fn push_hook(&self, hook: Arc<dyn Hook>) {
        for list in &self.0 {
            let mut list = list.lock().expect("clear hooks lock poisoned");
            // owners of derived signals come and go between clears
            list.retain(|hook| hook.is_live());
            list.push(hook.clone());
        }
    }

    /// Runs every registered hook. Returns how many ran.
    pub fn run(&self) -> usize {
        let mut count = 0;
        for list in &self.0 {
            // hooks may register new hooks; those wait for the next clear
            let hooks = std::mem::take(&mut *list.lock().expect("clear hooks lock poisoned"));
            count += hooks.len();
            let mut kept = hooks.into_iter().filter(|hook| hook.run()).collect::<Vec<_>>();

            let mut list = list.lock().expect("clear hooks lock poisoned");
            kept.append(&mut list);
            *list = kept;
        }
        count
    }

    pub fn len(&self) -> usize { self.0.iter().map(|list| list.lock().expect("clear hooks lock poisoned").len()).sum() }
}

impl std::fmt::Debug for ClearHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClearHooks").field("roots", &self.0.len()).field("hooks", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_hooks_run_once_and_empty_the_list() {
        let hooks = ClearHooks::new();
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let ran = ran.clone();
            hooks.push(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(hooks.run(), 3);
        assert_eq!(hooks.run(), 0);
        assert_eq!(ran.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_owned_hooks_run_while_the_owner_lives() {
        let hooks = ClearHooks::new();
        let owner = Arc::new(AtomicUsize::new(0));
        hooks.push_owned(&owner, |runs: &AtomicUsize| {
            runs.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(hooks.run(), 1);
        assert_eq!(hooks.run(), 1);
        assert_eq!(owner.load(Ordering::SeqCst), 2);

        drop(owner);
        assert_eq!(hooks.run(), 1);
        assert_eq!(hooks.len(), 0);
    }

    #[test]
    fn test_dead_owners_are_pruned_on_push() {
        let hooks = ClearHooks::new();
        for _ in 0..10 {
            let owner = Arc::new(());
            hooks.push_owned(&owner, |_: &()| {});
        }
        assert_eq!(hooks.len(), 1);
    }

    #[test]
    fn test_clones_share_the_list() {
        let hooks = ClearHooks::new();
        let derived = hooks.clone();
        derived.push(|| {});
        assert_eq!(hooks.len(), 1);
    }

    #[test]
    fn test_merged_hooks_run_with_any_root() {
        let a = ClearHooks::new();
        let b = ClearHooks::new();
        let merged = ClearHooks::merged([&a, &b, &a]);
        let ran = Arc::new(AtomicUsize::new(0));
        {
            let ran = ran.clone();
            merged.push(move || {
                ran.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!((a.len(), b.len(), merged.len()), (1, 1, 2));

        b.run();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!((a.len(), b.len()), (1, 0));
    }
}
