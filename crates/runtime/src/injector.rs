//! Injector hierarchy: an append-only arena of nodes linked to their parents
//! by index. A node is immutable once appended apart from its singleton
//! slots, which are filled lazily on first resolution.

use crate::error::{InjectorError, Result};
use crate::key::{BindingKey, Key};
use crate::module::{Module, Provider, Scope};
use once_cell::sync::OnceCell;
use std::any::{Any, type_name};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// A resolved value. Singleton bindings hand out clones of the same `Arc`.
pub type Instance = Arc<dyn Any + Send + Sync>;

struct Slot {
    module: String,
    scope: Scope,
    provider: Provider,
    cell: OnceCell<Instance>,
}

struct Node {
    parent: Option<usize>,
    depth: usize,
    bindings: HashMap<BindingKey, Slot>,
}

/// Owns every injector node created through it.
///
/// Nodes are never removed: dropping every [`Injector`] handle to a node
/// does not free it or its singletons. Memory is released only when the tree
/// itself is dropped, so short-lived children (one per request, say) belong
/// in a tree of their own rather than under a long-lived root.
pub struct InjectorTree {
    nodes: RwLock<Vec<Arc<Node>>>,
}

impl InjectorTree {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            nodes: RwLock::new(Vec::new()),
        })
    }

    pub fn create_root(self: &Arc<Self>, modules: impl IntoIterator<Item = Module>) -> Result<Injector> {
        self.insert(None, modules)
    }

    /// Number of injectors created so far.
    pub fn len(&self) -> usize {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn node(&self, id: usize) -> Arc<Node> {
        self.nodes.read().unwrap_or_else(PoisonError::into_inner)[id].clone()
    }

    /// Validates and appends a node while holding the write lock, so a
    /// failed call leaves the tree untouched.
    fn insert(
        self: &Arc<Self>,
        parent: Option<usize>,
        modules: impl IntoIterator<Item = Module>,
    ) -> Result<Injector> {
        let mut nodes = self.nodes.write().unwrap_or_else(PoisonError::into_inner);
        let self_key = BindingKey::of::<Injector>();
        let mut bindings: HashMap<BindingKey, Slot> = HashMap::new();

        for module in modules {
            for binding in module.bindings() {
                let key = binding.key();
                let visible = *key == self_key
                    || bindings.contains_key(key)
                    || parent.is_some_and(|parent| is_visible(&nodes, parent, key));
                if visible {
                    tracing::error!(
                        "Module '{}' rebinds {}, which is already bound",
                        module.name(),
                        key
                    );
                    return Err(InjectorError::Configuration {
                        key: key.clone(),
                        module: module.name().to_string(),
                    });
                }
                bindings.insert(
                    key.clone(),
                    Slot {
                        module: module.name().to_string(),
                        scope: binding.scope(),
                        provider: binding.provider.clone(),
                        cell: OnceCell::new(),
                    },
                );
            }
        }

        let depth = parent.map_or(0, |parent| nodes[parent].depth + 1);
        let id = nodes.len();
        tracing::debug!(
            "Created injector #{} (parent: {:?}, {} bindings)",
            id,
            parent,
            bindings.len()
        );
        nodes.push(Arc::new(Node {
            parent,
            depth,
            bindings,
        }));

        Ok(Injector {
            tree: Arc::clone(self),
            id,
        })
    }
}

fn is_visible(nodes: &[Arc<Node>], mut id: usize, key: &BindingKey) -> bool {
    loop {
        let node = &nodes[id];
        if node.bindings.contains_key(key) {
            return true;
        }
        match node.parent {
            Some(parent) => id = parent,
            None => return false,
        }
    }
}

/// Handle to one node of an [`InjectorTree`]. Cheap to clone.
///
/// Handles compare equal when they address the same node of the same tree;
/// that is the identity of an injector, not the address of the handle.
#[derive(Clone)]
pub struct Injector {
    tree: Arc<InjectorTree>,
    id: usize,
}

impl PartialEq for Injector {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl Eq for Injector {}

impl Injector {
    /// Creates a root injector in a fresh tree.
    pub fn root(modules: impl IntoIterator<Item = Module>) -> Result<Injector> {
        InjectorTree::new().create_root(modules)
    }

    /// Fails if any key declared by `modules` is already visible here, or is
    /// declared twice among `modules`.
    pub fn create_child(&self, modules: impl IntoIterator<Item = Module>) -> Result<Injector> {
        self.tree.insert(Some(self.id), modules)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn tree(&self) -> &Arc<InjectorTree> {
        &self.tree
    }

    pub fn parent(&self) -> Option<Injector> {
        self.tree.node(self.id).parent.map(|id| self.at(id))
    }

    /// Zero for a root.
    pub fn depth(&self) -> usize {
        self.tree.node(self.id).depth
    }

    fn at(&self, id: usize) -> Injector {
        Injector {
            tree: Arc::clone(&self.tree),
            id,
        }
    }

    pub fn contains(&self, key: &BindingKey) -> bool {
        *key == BindingKey::of::<Injector>() || self.find(key).is_some()
    }

    /// Every key resolvable from this injector, nearest declarations first.
    pub fn visible_keys(&self) -> Vec<BindingKey> {
        let mut keys = vec![BindingKey::of::<Injector>()];
        let mut current = Some(self.id);
        while let Some(id) = current {
            let node = self.tree.node(id);
            keys.extend(node.bindings.keys().cloned());
            current = node.parent;
        }
        keys
    }

    /// `Key<Injector>` yields a fresh handle on every call; compare the
    /// results with `==`, which identifies the node.
    pub fn resolve(&self, key: &BindingKey) -> Result<Instance> {
        if *key == BindingKey::of::<Injector>() {
            return Ok(Arc::new(self.clone()));
        }
        let Some((owner, node)) = self.find(key) else {
            return Err(InjectorError::MissingBinding { key: key.clone() });
        };
        // `find` returned this node because it holds the key.
        let Some(slot) = node.bindings.get(key) else {
            return Err(InjectorError::MissingBinding { key: key.clone() });
        };
        owner.provide(key, slot)
    }

    pub fn get<T: Send + Sync + 'static>(&self, key: &Key<T>) -> Result<Arc<T>> {
        self.resolve(key.raw())?
            .downcast::<T>()
            .map_err(|_| InjectorError::TypeMismatch {
                key: key.raw().clone(),
                expected: type_name::<T>(),
            })
    }

    fn find(&self, key: &BindingKey) -> Option<(Injector, Arc<Node>)> {
        let mut current = Some(self.id);
        while let Some(id) = current {
            let node = self.tree.node(id);
            if node.bindings.contains_key(key) {
                return Some((self.at(id), node));
            }
            current = node.parent;
        }
        None
    }

    fn provide(&self, key: &BindingKey, slot: &Slot) -> Result<Instance> {
        let _guard = ResolutionGuard::enter(self, key)?;
        match slot.scope {
            Scope::Unscoped => slot.provider.invoke(self),
            Scope::Singleton => slot
                .cell
                .get_or_try_init(|| {
                    tracing::debug!(
                        "Creating singleton {} from module '{}' in injector #{}",
                        key,
                        slot.module,
                        self.id
                    );
                    slot.provider.invoke(self)
                })
                .cloned(),
        }
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector").field("id", &self.id).finish()
    }
}

thread_local! {
    static RESOLVING: RefCell<Vec<(usize, usize, BindingKey)>> = const { RefCell::new(Vec::new()) };
}

/// Marks `(tree, owner, key)` as under construction on this thread.
/// Re-entering the same binding would otherwise block forever on its slot.
struct ResolutionGuard;

impl ResolutionGuard {
    fn enter(owner: &Injector, key: &BindingKey) -> Result<Self> {
        let tree = Arc::as_ptr(&owner.tree) as usize;
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack
                .iter()
                .any(|(t, id, k)| *t == tree && *id == owner.id && k == key)
            {
                return Err(InjectorError::DependencyCycle { key: key.clone() });
            }
            stack.push((tree, owner.id, key.clone()));
            Ok(ResolutionGuard)
        })
    }
}

impl Drop for ResolutionGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}
