//! Scoped key/value contexts.
//!
//! Contexts form a tree. A lookup that misses locally continues in the parent,
//! so a context sees everything its ancestors provide unless it shadows a key.
//! Each context also remembers which of its direct children is active; following
//! those links from any context yields the *active branch*.
//!
//! Disposed contexts are removed from the arena. Every operation on a stale
//! [`ContextId`] fails with [`ContextError::Disposed`] instead of reading freed state.

use alloc::{
    rc::Rc,
    string::{String, ToString},
    vec::Vec,
};
use core::any::Any;
use std::collections::{HashMap, HashSet};

use slotmap::SlotMap;

use crate::{AnyValue, ContextError, ContextId, value::downcast};

#[derive(Debug)]
struct ContextNode {
    name: String,
    values: HashMap<String, AnyValue>,
    parent: Option<ContextId>,
    children: Vec<ContextId>,
    active_child: Option<ContextId>,
    modifiable: HashSet<String>,
}

impl ContextNode {
    fn new(name: String, parent: Option<ContextId>) -> Self {
        Self {
            name,
            values: HashMap::new(),
            parent,
            children: Vec::new(),
            active_child: None,
            modifiable: HashSet::new(),
        }
    }
}

/// Arena of contexts.
#[derive(Debug, Default)]
pub struct ContextHierarchy {
    nodes: SlotMap<ContextId, ContextNode>,
}

impl ContextHierarchy {
    /// Creates an empty hierarchy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn node(&self, id: ContextId) -> Result<&ContextNode, ContextError> {
        self.nodes.get(id).ok_or(ContextError::Disposed(id))
    }

    fn node_mut(&mut self, id: ContextId) -> Result<&mut ContextNode, ContextError> {
        self.nodes.get_mut(id).ok_or(ContextError::Disposed(id))
    }

    /// Creates a parentless context.
    pub fn create_root(&mut self, name: impl Into<String>) -> ContextId {
        let id = self.nodes.insert(ContextNode::new(name.into(), None));
        tracing::trace!(context = ?id, "created root context");
        id
    }

    /// Creates a context below `parent`.
    ///
    /// # Errors
    ///
    /// Fails when `parent` has been disposed.
    pub fn create_child(
        &mut self,
        parent: ContextId,
        name: impl Into<String>,
    ) -> Result<ContextId, ContextError> {
        self.node(parent)?;
        let id = self.nodes.insert(ContextNode::new(name.into(), Some(parent)));
        self.node_mut(parent)?.children.push(id);
        tracing::trace!(context = ?id, parent = ?parent, "created child context");
        Ok(id)
    }

    /// Number of live contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no context is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `id` is still live.
    #[must_use]
    pub fn contains(&self, id: ContextId) -> bool {
        self.nodes.contains_key(id)
    }

    /// The descriptive name given at creation.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn name(&self, id: ContextId) -> Result<&str, ContextError> {
        Ok(&self.node(id)?.name)
    }

    /// The parent context.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn parent(&self, id: ContextId) -> Result<Option<ContextId>, ContextError> {
        Ok(self.node(id)?.parent)
    }

    /// The direct children.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn children(&self, id: ContextId) -> Result<&[ContextId], ContextError> {
        Ok(&self.node(id)?.children)
    }

    /// Stores a value locally.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn set(
        &mut self,
        id: ContextId,
        key: impl Into<String>,
        value: AnyValue,
    ) -> Result<(), ContextError> {
        self.node_mut(id)?.values.insert(key.into(), value);
        Ok(())
    }

    /// Removes a local value, returning it.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn remove(&mut self, id: ContextId, key: &str) -> Result<Option<AnyValue>, ContextError> {
        Ok(self.node_mut(id)?.values.remove(key))
    }

    /// Reads a value stored on this very context.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn get_local(&self, id: ContextId, key: &str) -> Result<Option<&AnyValue>, ContextError> {
        Ok(self.node(id)?.values.get(key))
    }

    /// Looks `key` up here, then in each ancestor.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn lookup(&self, id: ContextId, key: &str) -> Result<Option<&AnyValue>, ContextError> {
        let mut current = Some(id);
        while let Some(context) = current {
            let node = self.node(context)?;
            if let Some(value) = node.values.get(key) {
                return Ok(Some(value));
            }
            current = node.parent;
        }
        Ok(None)
    }

    /// Typed [`lookup`](Self::lookup). A value of another type counts as absent.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn lookup_as<T: Any>(&self, id: ContextId, key: &str) -> Result<Option<Rc<T>>, ContextError> {
        Ok(self.lookup(id, key)?.and_then(downcast::<T>))
    }

    /// Declares `key` modifiable on this context.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn declare_modifiable(
        &mut self,
        id: ContextId,
        key: impl Into<String>,
    ) -> Result<(), ContextError> {
        self.node_mut(id)?.modifiable.insert(key.into());
        Ok(())
    }

    /// Writes `value` into the nearest context (starting at `id`) that declared
    /// `key` modifiable.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed or no context on the chain declared `key`.
    pub fn modify(&mut self, id: ContextId, key: &str, value: AnyValue) -> Result<(), ContextError> {
        let mut current = Some(id);
        while let Some(context) = current {
            let node = self.node_mut(context)?;
            if node.modifiable.contains(key) {
                node.values.insert(key.to_string(), value);
                return Ok(());
            }
            current = node.parent;
        }
        Err(ContextError::NotModifiable {
            key: key.to_string(),
        })
    }

    /// Makes `id` the active child of its parent, and so on up to the root.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn activate(&mut self, id: ContextId) -> Result<(), ContextError> {
        let mut child = id;
        while let Some(parent) = self.node(child)?.parent {
            self.node_mut(parent)?.active_child = Some(child);
            child = parent;
        }
        Ok(())
    }

    /// Clears the parent's active-child link if it points at `id`.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn deactivate(&mut self, id: ContextId) -> Result<(), ContextError> {
        if let Some(parent) = self.node(id)?.parent {
            let parent = self.node_mut(parent)?;
            if parent.active_child == Some(id) {
                parent.active_child = None;
            }
        }
        Ok(())
    }

    /// The active direct child.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn active_child(&self, id: ContextId) -> Result<Option<ContextId>, ContextError> {
        Ok(self.node(id)?.active_child)
    }

    /// Whether `id` is its parent's active child.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn is_active(&self, id: ContextId) -> Result<bool, ContextError> {
        Ok(match self.node(id)?.parent {
            Some(parent) => self.node(parent)?.active_child == Some(id),
            None => true,
        })
    }

    /// The chain of active contexts starting at `id` (inclusive).
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn active_branch(&self, id: ContextId) -> Result<Vec<ContextId>, ContextError> {
        let mut branch = Vec::new();
        let mut current = Some(id);
        while let Some(context) = current {
            branch.push(context);
            current = self.node(context)?.active_child;
        }
        Ok(branch)
    }

    /// The end of the active branch starting at `id`.
    ///
    /// # Errors
    ///
    /// Fails when `id` has been disposed.
    pub fn active_leaf(&self, id: ContextId) -> Result<ContextId, ContextError> {
        let mut current = id;
        while let Some(next) = self.node(current)?.active_child {
            current = next;
        }
        Ok(current)
    }

    /// Moves `id` under `new_parent`.
    ///
    /// The context stops being the old parent's active child.
    ///
    /// # Errors
    ///
    /// Fails when either context has been disposed or `new_parent` lies below `id`.
    pub fn set_parent(&mut self, id: ContextId, new_parent: ContextId) -> Result<(), ContextError> {
        let old_parent = self.node(id)?.parent;
        if old_parent == Some(new_parent) {
            return Ok(());
        }
        let mut ancestor = Some(new_parent);
        while let Some(context) = ancestor {
            if context == id {
                return Err(ContextError::Cycle(id));
            }
            ancestor = self.node(context)?.parent;
        }
        self.deactivate(id)?;
        if let Some(old_parent) = old_parent {
            self.node_mut(old_parent)?.children.retain(|&c| c != id);
        }
        self.node_mut(new_parent)?.children.push(id);
        self.node_mut(id)?.parent = Some(new_parent);
        tracing::trace!(context = ?id, parent = ?new_parent, "reparented context");
        Ok(())
    }

    /// Disposes `id` and every context below it.
    ///
    /// Each disposed context is first deactivated, so no parent is left with an
    /// active-child link to a dead context.
    ///
    /// # Errors
    ///
    /// Fails when `id` has already been disposed.
    pub fn dispose(&mut self, id: ContextId) -> Result<(), ContextError> {
        self.node(id)?;
        let mut order = Vec::new();
        let mut pending = alloc::vec![id];
        while let Some(next) = pending.pop() {
            order.push(next);
            pending.extend_from_slice(&self.node(next)?.children);
        }
        for context in order.into_iter().rev() {
            self.deactivate(context)?;
            if let Some(parent) = self.node(context)?.parent
                && let Some(parent) = self.nodes.get_mut(parent)
            {
                parent.children.retain(|&c| c != context);
            }
            self.nodes.remove(context);
            tracing::trace!(context = ?context, "disposed context");
        }
        Ok(())
    }
}
