//! Test support: an element type that records which of its instances are
//! alive and can be told to panic during `clone` or `default`.
//!
//! State is thread-local, and each test runs on its own thread.

use std::cell::{Cell, RefCell};

use bitvec::vec::BitVec;

thread_local! {
    // one bit per instance ever created on this thread, set while it is alive
    static LIVE: RefCell<BitVec> = RefCell::new(BitVec::new());
    static CLONES_LEFT: Cell<Option<usize>> = const { Cell::new(None) };
    static DEFAULTS_LEFT: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Number of `Tracked` values currently alive on this thread.
pub(crate) fn live() -> usize {
    LIVE.with(|live| live.borrow().count_ones())
}

/// Lets the next `n` clones succeed; the one after panics.
pub(crate) fn fail_clone_after(n: usize) {
    CLONES_LEFT.with(|left| left.set(Some(n)));
}

/// Lets the next `n` default constructions succeed; the one after panics.
pub(crate) fn fail_default_after(n: usize) {
    DEFAULTS_LEFT.with(|left| left.set(Some(n)));
}

/// Stops injecting failures.
pub(crate) fn succeed_always() {
    CLONES_LEFT.with(|left| left.set(None));
    DEFAULTS_LEFT.with(|left| left.set(None));
}

fn spend(budget: &'static std::thread::LocalKey<Cell<Option<usize>>>, what: &str) {
    budget.with(|left| match left.get() {
        Some(0) => {
            left.set(None);
            panic!("injected {what} failure");
        }
        Some(n) => left.set(Some(n - 1)),
        None => {}
    });
}

#[derive(Debug)]
pub(crate) struct Tracked {
    id: usize,
    pub(crate) value: i32,
}

impl Tracked {
    pub(crate) fn new(value: i32) -> Self {
        let id = LIVE.with(|live| {
            let mut live = live.borrow_mut();
            live.push(true);
            live.len() - 1
        });
        Self { id, value }
    }
}

impl Clone for Tracked {
    fn clone(&self) -> Self {
        spend(&CLONES_LEFT, "clone");
        Self::new(self.value)
    }

    fn clone_from(&mut self, source: &Self) {
        spend(&CLONES_LEFT, "clone");
        self.value = source.value;
    }
}

impl Default for Tracked {
    fn default() -> Self {
        spend(&DEFAULTS_LEFT, "default");
        Self::new(0)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        LIVE.with(|live| {
            let mut live = live.borrow_mut();
            assert!(live[self.id], "instance {} dropped twice", self.id);
            live.set(self.id, false);
        });
    }
}

impl PartialEq for Tracked {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialEq<i32> for Tracked {
    fn eq(&self, other: &i32) -> bool {
        self.value == *other
    }
}

pub(crate) fn values(items: &[Tracked]) -> Vec<i32> {
    items.iter().map(|item| item.value).collect()
}
