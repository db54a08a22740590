//! Path-indexed observer trees
//!
//! Every context record gets one tree, created on first use. A tree node
//! stands for one path prefix (`user`, `user.avatar`, `user.avatar.url`) and
//! holds the refresh callbacks of the bindings ending there. Descending a
//! path installs interceptors on the live records it passes through, so a
//! write to any field along the path fans out to the whole subtree below it.
//!
//! # Invariants
//!
//! 1. One tree per live record; trees are shared by every template rendered
//!    against that record.
//! 2. A (record, field) pair is intercepted at most once. A record shared by
//!    two contexts keeps the hook of the first tree that walked it, so writes
//!    to its fields only reach that tree's fragments.
//! 3. Trees only grow: nodes and observers are never removed.
//! 4. Fan-out is depth-first, observers before children, children in
//!    insertion order.
//!
//! Trees live in a thread-local side table keyed by record identity. Entries
//! hold their record weakly and are pruned on the next lookup after the
//! record is dropped.

use indexmap::IndexMap;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, trace};

use crate::context::{Notify, Record, Value, WeakRecord};
use crate::error::Result;
use crate::path::segments;

/// Refresh callback registered at a tree node
pub type Observer = Rc<dyn Fn() -> Result<()>>;

/// One path segment in an observer tree
pub struct ObserverNode {
    name: String,
    children: RefCell<IndexMap<String, Rc<ObserverNode>>>,
    observers: RefCell<Vec<Observer>>,
    intercepted: Cell<bool>,
}

impl ObserverNode {
    fn new(name: &str) -> Rc<Self> {
        Rc::new(Self {
            name: name.to_string(),
            children: RefCell::new(IndexMap::new()),
            observers: RefCell::new(Vec::new()),
            intercepted: Cell::new(false),
        })
    }

    /// Unnamed root node
    pub fn root() -> Rc<Self> {
        Self::new("")
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_intercepted(&self) -> bool {
        self.intercepted.get()
    }

    pub fn observer_count(&self) -> usize {
        self.observers.borrow().len()
    }

    pub fn child(&self, name: &str) -> Option<Rc<ObserverNode>> {
        self.children.borrow().get(name).cloned()
    }

    pub fn child_names(&self) -> Vec<String> {
        self.children.borrow().keys().cloned().collect()
    }

    fn child_or_insert(&self, name: &str) -> Rc<ObserverNode> {
        Rc::clone(
            self.children
                .borrow_mut()
                .entry(name.to_string())
                .or_insert_with(|| ObserverNode::new(name)),
        )
    }

    pub fn observe(&self, observer: Observer) {
        self.observers.borrow_mut().push(observer);
    }

    /// Run this node's observers, then every descendant's
    pub fn notify(&self) -> Result<()> {
        // Snapshots: observers may render templates that grow this tree
        let observers = self.observers.borrow().clone();
        trace!(node = %self.name, observers = observers.len(), "notify");
        for observer in &observers {
            observer()?;
        }

        let children: Vec<_> = self.children.borrow().values().cloned().collect();
        for child in &children {
            child.notify()?;
        }
        Ok(())
    }
}

/// Walk `path` down from `root`, creating nodes and intercepting fields
///
/// `context` is the live record matching `root`. At each segment the field
/// of the current record is intercepted (once per record) with a hook that
/// notifies the segment's subtree, then the walk moves on to the value held
/// there. Once that value is not a record, the remaining nodes are created
/// without interception. Returns the node for the full path.
pub fn locate(root: &Rc<ObserverNode>, context: &Record, path: &str) -> Rc<ObserverNode> {
    let mut node = Rc::clone(root);
    let mut current = Some(context.clone());

    for segment in segments(path) {
        let child = node.child_or_insert(segment);

        if let Some(record) = &current {
            let target = Rc::clone(&child);
            let notify: Notify = Rc::new(move || target.notify());
            if record.intercept(segment, notify) {
                debug!(field = segment, path, "intercepted field");
            }
            child.intercepted.set(true);
        }

        current = current
            .and_then(|record| record.get(segment))
            .and_then(|value| match value {
                Value::Record(record) => Some(record),
                _ => None,
            });
        node = child;
    }

    node
}

struct TreeEntry {
    owner: WeakRecord,
    root: Rc<ObserverNode>,
}

/// Side table from record identity to observer tree
#[derive(Default)]
pub struct ObserverTrees {
    entries: RefCell<HashMap<usize, TreeEntry>>,
}

impl ObserverTrees {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find or build the tree for a record
    pub fn tree(&self, context: &Record) -> Rc<ObserverNode> {
        self.prune();

        let mut entries = self.entries.borrow_mut();
        if let Some(entry) = entries.get(&context.id()) {
            if entry
                .owner
                .upgrade()
                .is_some_and(|owner| owner.ptr_eq(context))
            {
                return Rc::clone(&entry.root);
            }
        }

        debug!(context = context.id(), "new observer tree");
        let root = ObserverNode::root();
        entries.insert(
            context.id(),
            TreeEntry {
                owner: context.downgrade(),
                root: Rc::clone(&root),
            },
        );
        root
    }

    /// Drop trees whose record is gone
    pub fn prune(&self) {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, entry| entry.owner.is_alive());
        if entries.len() < before {
            debug!(pruned = before - entries.len(), "pruned observer trees");
        }
    }

    /// Number of trees held, including ones not yet pruned
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

thread_local! {
    static TREES: ObserverTrees = ObserverTrees::new();
}

/// Find or build the current thread's tree for a record
pub fn tree(context: &Record) -> Rc<ObserverNode> {
    TREES.with(|trees| trees.tree(context))
}

/// Number of live trees on the current thread
pub fn tree_count() -> usize {
    TREES.with(|trees| {
        trees.prune();
        trees.len()
    })
}
