use relay_signals::*;
mod common;
use common::watcher;

type Setup = fn() -> (Signal<i32>, Readable<i32>);

/// Registers the same listener on a signal and on something derived from it, under `tags` on both
fn setup_listeners(setup: Setup, tags: &[Tag]) -> (Signal<i32>, Readable<i32>, Listener<i32>, Box<dyn Fn() -> Vec<i32> + Send + Sync>) {
    let (parent, child) = setup();
    let (listener, check) = watcher();
    parent.add_tagged(listener.clone(), tags.iter().copied());
    child.add_tagged(listener.clone(), tags.iter().copied());
    (parent, child, listener, check)
}

/// Every derived signal has its own listeners: removing from one side never removes from the other
fn parent_child_suite(setup: Setup) {
    // removing a listener from the parent keeps the child's registration
    let (parent, _child, listener, check) = setup_listeners(setup, &[]);
    parent.remove(&listener);
    parent.dispatch(5);
    assert_eq!(check(), [5]);

    // removing a listener from the child keeps the parent's registration
    let (parent, child, listener, check) = setup_listeners(setup, &[]);
    child.remove(&listener);
    parent.dispatch(5);
    assert_eq!(check(), [5]);

    // both registrations are live
    let (parent, _child, _listener, check) = setup_listeners(setup, &[]);
    parent.dispatch(5);
    assert_eq!(check(), [5, 5]);

    // removing a tag from the parent keeps the child's registration
    let tag = Tag::new();
    let (parent, _child, _listener, check) = setup_listeners(setup, &[tag]);
    parent.remove(tag);
    parent.dispatch(5);
    assert_eq!(check(), [5]);

    // removing a tag from the child keeps the parent's registration
    let tag = Tag::new();
    let (parent, child, _listener, check) = setup_listeners(setup, &[tag]);
    child.remove(tag);
    parent.dispatch(5);
    assert_eq!(check(), [5]);

    let tag = Tag::new();
    let (parent, child, _listener, check) = setup_listeners(setup, &[tag]);
    parent.dispatch(1);
    parent.remove(tag);
    parent.dispatch(2);
    child.remove(tag);
    parent.dispatch(3);
    assert_eq!(check(), [1, 1, 2]);
}

#[test]
fn test_read_only() {
    parent_child_suite(|| {
        let parent = Signal::new();
        let child = parent.read_only();
        (parent, child)
    });
}

#[test]
fn test_readable_handle_shares_listeners() {
    let parent = Signal::<i32>::new();
    let (listener, check) = watcher();
    parent.add(listener.clone());
    parent.readable().add(listener.clone());
    parent.readable().remove(&listener);
    parent.dispatch(1);
    assert_eq!(check(), [] as [i32; 0]);
}

#[test]
fn test_filter() {
    parent_child_suite(|| {
        let parent = Signal::new();
        let child = parent.filter(|_| true);
        (parent, child)
    });
}

#[test]
fn test_map() {
    parent_child_suite(|| {
        let parent = Signal::new();
        let child = parent.map(|x: &i32| *x);
        (parent, child)
    });
}

#[test]
fn test_peek() {
    parent_child_suite(|| {
        let parent = Signal::new();
        let child = parent.peek(|_| {});
        (parent, child)
    });
}

#[test]
fn test_merge() {
    parent_child_suite(|| {
        let parent = Signal::new();
        let child = parent.merge([&Signal::new().readable()]);
        (parent, child)
    });
}

#[test]
fn test_cache() {
    parent_child_suite(|| {
        let parent = Signal::new();
        let child = Readable::clone(&parent.cache(CollectionCache::new()));
        (parent, child)
    });
}

#[test]
fn test_nested_derivations() {
    parent_child_suite(|| {
        let parent = Signal::new();
        let child = parent.read_only().filter(|x| *x > 0).map(|x: &i32| *x).read_only();
        (parent, child)
    });
}
