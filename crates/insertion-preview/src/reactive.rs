//! Reactive runtime: source signals, memoized derivations and effects.
//!
//! The runtime is an explicit DAG of nodes stored in a slot map:
//!
//! - **Signals** hold externally written values (scroll offsets, the attached model, ...).
//! - **Memos** cache the result of a pure computation over other nodes.
//! - **Effects** run a side effect over other nodes (pushing state to a render sink).
//!
//! Writes are *push-invalidate*: setting a signal bumps the global revision and marks every
//! transitive dependent stale, without computing anything. Reads are *pull-recompute*: a stale
//! memo first brings its recorded sources up to date and only re-runs its computation when one
//! of them actually changed since the memo was last verified. A recomputed value equal to the
//! previous one does not count as a change, so propagation stops there.
//!
//! Since nothing is evaluated while writing, all writes made between two reads are observed
//! together; a memo depending on two inputs that change "at once" computes exactly once against
//! both final values.
//!
//! Dependencies are recorded dynamically through [`Reader`]: every node read during an
//! evaluation becomes a source of the evaluating node, replacing the previous source set.
//!
//! # Example
//!
//! ```rust
//! use insertion_preview::reactive::Runtime;
//!
//! let runtime = Runtime::new();
//! let width = runtime.signal(10.0_f64);
//! let scroll = runtime.signal(0.0_f64);
//! let visible_width = runtime.memo(move |r| Ok(r.read(&width)? - r.read(&scroll)?));
//!
//! assert_eq!(runtime.get(&visible_width).unwrap(), 10.0);
//! runtime.set(&scroll, 4.0).unwrap();
//! assert_eq!(runtime.get(&visible_width).unwrap(), 6.0);
//! ```

use slotmap::{SlotMap, new_key_type};
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::rc::Rc;
use thiserror::Error;

new_key_type! {
    /// Identifier of a node in a [`Runtime`].
    pub struct NodeId;
}

/// Upper bound on flush rounds triggered by effects writing signals.
const MAX_FLUSH_ROUNDS: usize = 64;

/// Errors produced by reactive reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReactiveError {
    /// The node was released (usually by disposing the component that owned it).
    #[error("reactive node {0:?} has been disposed")]
    Disposed(NodeId),
    /// The whole runtime was disposed.
    #[error("reactive runtime has been disposed")]
    RuntimeDisposed,
    /// The stored value does not have the type of the handle used to read it.
    #[error("reactive node {0:?} holds a value of a different type")]
    TypeMismatch(NodeId),
    /// The runtime is mutably borrowed (e.g. a node was released from inside a drop hook).
    #[error("reactive runtime is busy")]
    Busy,
}

type AnyValue = Rc<dyn Any>;
type ComputeFn = Rc<dyn Fn(&mut Reader<'_>) -> Result<AnyValue, ReactiveError>>;
type EffectFn = Rc<RefCell<dyn FnMut(&mut Reader<'_>) -> Result<(), ReactiveError>>>;
type EqFn = fn(&dyn Any, &dyn Any) -> bool;

enum NodeKind {
    Signal,
    Memo { compute: ComputeFn, eq: EqFn },
    Effect { run: EffectFn },
}

struct Node {
    kind: NodeKind,
    /// Creation order; effects are flushed in this order.
    seq: u64,
    value: Option<AnyValue>,
    initialized: bool,
    stale: bool,
    /// Revision at which `value` last changed.
    changed_at: u64,
    /// Revision at which the node was last known to be up to date.
    verified_at: u64,
    sources: Vec<NodeId>,
    observers: Vec<NodeId>,
}

impl Node {
    fn new(kind: NodeKind, seq: u64, value: Option<AnyValue>, revision: u64) -> Self {
        let initialized = value.is_some();
        Self {
            kind,
            seq,
            value,
            initialized,
            stale: false,
            changed_at: revision,
            verified_at: revision,
            sources: Vec::new(),
            observers: Vec::new(),
        }
    }
}

#[derive(Default)]
struct Graph {
    nodes: SlotMap<NodeId, Node>,
    revision: u64,
    next_seq: u64,
    pending_effects: Vec<NodeId>,
    disposed: bool,
}

impl Graph {
    fn insert(&mut self, kind: NodeKind, value: Option<AnyValue>, revision: u64) -> NodeId {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.nodes.insert(Node::new(kind, seq, value, revision))
    }

    /// Take the scheduled effects, deduplicated and in creation order.
    fn take_pending_effects(&mut self) -> Vec<NodeId> {
        let mut pending = std::mem::take(&mut self.pending_effects);
        pending.sort_by_key(|id| self.nodes.get(*id).map(|node| node.seq));
        pending.dedup();
        pending
    }

    fn node(&self, id: NodeId) -> Result<&Node, ReactiveError> {
        if self.disposed {
            return Err(ReactiveError::RuntimeDisposed);
        }
        self.nodes.get(id).ok_or(ReactiveError::Disposed(id))
    }

    fn mark_dependents_stale(&mut self, id: NodeId) {
        let mut stack = match self.nodes.get(id) {
            Some(node) => node.observers.clone(),
            None => return,
        };

        let mut visited = HashSet::new();
        while let Some(observer) = stack.pop() {
            if !visited.insert(observer) {
                continue;
            }
            let Some(node) = self.nodes.get_mut(observer) else {
                continue;
            };
            // Already stale nodes are walked too: their observers may have settled since
            // (after a failed evaluation or a write made while they ran).
            node.stale = true;
            if matches!(node.kind, NodeKind::Effect { .. }) {
                self.pending_effects.push(observer);
            }
            stack.extend(node.observers.iter().copied());
        }
    }

    /// Detach `id` from the graph, returning the node so that it can be dropped outside the
    /// borrow (closures may own values with arbitrary drop glue).
    fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(id)?;
        for source in &node.sources {
            if let Some(source) = self.nodes.get_mut(*source) {
                source.observers.retain(|o| *o != id);
            }
        }
        for observer in &node.observers {
            if let Some(observer) = self.nodes.get_mut(*observer) {
                observer.sources.retain(|s| *s != id);
                observer.stale = true;
            }
        }
        self.pending_effects.retain(|e| *e != id);
        Some(node)
    }

    fn relink(&mut self, id: NodeId, sources: Vec<NodeId>) {
        let old = match self.nodes.get_mut(id) {
            Some(node) => std::mem::replace(&mut node.sources, sources.clone()),
            None => return,
        };
        for source in old {
            if let Some(node) = self.nodes.get_mut(source) {
                node.observers.retain(|o| *o != id);
            }
        }
        for source in sources {
            if let Some(node) = self.nodes.get_mut(source)
                && !node.observers.contains(&id)
            {
                node.observers.push(id);
            }
        }
    }
}

/// A handle that can be read through a [`Runtime`] or a [`Reader`].
pub trait Readable<T> {
    /// The node backing this handle.
    fn node_id(&self) -> NodeId;
}

/// A writable source value.
pub struct Signal<T> {
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

/// A memoized derived value.
pub struct Memo<T> {
    id: NodeId,
    _marker: PhantomData<fn() -> T>,
}

/// A registered effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effect {
    id: NodeId,
}

macro_rules! impl_handle {
    ($handle:ident) => {
        impl<T> Clone for $handle<T> {
            fn clone(&self) -> Self {
                *self
            }
        }

        impl<T> Copy for $handle<T> {}

        impl<T> PartialEq for $handle<T> {
            fn eq(&self, other: &Self) -> bool {
                self.id == other.id
            }
        }

        impl<T> Eq for $handle<T> {}

        impl<T> fmt::Debug for $handle<T> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($handle)).field(&self.id).finish()
            }
        }

        impl<T> Readable<T> for $handle<T> {
            fn node_id(&self) -> NodeId {
                self.id
            }
        }

        impl<T> $handle<T> {
            /// The node backing this handle.
            pub fn id(&self) -> NodeId {
                self.id
            }
        }
    };
}

impl_handle!(Signal);
impl_handle!(Memo);

impl Effect {
    /// The node backing this effect.
    pub fn id(&self) -> NodeId {
        self.id
    }
}

/// Dependency-tracking read access handed to memo and effect bodies.
pub struct Reader<'a> {
    runtime: &'a Runtime,
    dependencies: Vec<NodeId>,
}

impl Reader<'_> {
    /// Read a node and record it as a dependency of the node being evaluated.
    pub fn read<T, R>(&mut self, handle: &R) -> Result<T, ReactiveError>
    where
        T: Clone + 'static,
        R: Readable<T>,
    {
        let id = handle.node_id();
        if !self.dependencies.contains(&id) {
            self.dependencies.push(id);
        }
        self.runtime.get(handle)
    }

    /// Read a node without recording a dependency.
    pub fn read_untracked<T, R>(&self, handle: &R) -> Result<T, ReactiveError>
    where
        T: Clone + 'static,
        R: Readable<T>,
    {
        self.runtime.get(handle)
    }
}

/// Single-threaded reactive runtime.
///
/// Cloning a `Runtime` yields another handle to the same graph.
#[derive(Clone, Default)]
pub struct Runtime {
    graph: Rc<RefCell<Graph>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.graph.try_borrow() {
            Ok(graph) => f
                .debug_struct("Runtime")
                .field("nodes", &graph.nodes.len())
                .field("revision", &graph.revision)
                .field("pending_effects", &graph.pending_effects.len())
                .field("disposed", &graph.disposed)
                .finish(),
            Err(_) => f.write_str("Runtime { <busy> }"),
        }
    }
}

fn values_equal<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

enum Job {
    Memo(ComputeFn, EqFn),
    Effect(EffectFn),
}

impl Runtime {
    /// Create an empty runtime.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a source signal holding `value`.
    pub fn signal<T>(&self, value: T) -> Signal<T>
    where
        T: Clone + PartialEq + 'static,
    {
        let mut graph = self.graph.borrow_mut();
        let revision = graph.revision;
        let id = graph.insert(NodeKind::Signal, Some(Rc::new(value) as AnyValue), revision);
        Signal {
            id,
            _marker: PhantomData,
        }
    }

    /// Create a memo. The computation runs lazily on first read.
    pub fn memo<T, F>(&self, compute: F) -> Memo<T>
    where
        T: Clone + PartialEq + 'static,
        F: Fn(&mut Reader<'_>) -> Result<T, ReactiveError> + 'static,
    {
        let compute: ComputeFn = Rc::new(move |reader: &mut Reader<'_>| {
            compute(reader).map(|value| Rc::new(value) as AnyValue)
        });
        let mut graph = self.graph.borrow_mut();
        let id = graph.insert(
            NodeKind::Memo {
                compute,
                eq: values_equal::<T>,
            },
            None,
            0,
        );
        Memo {
            id,
            _marker: PhantomData,
        }
    }

    /// Register an effect. It is scheduled immediately and runs on the next
    /// [`flush_effects`](Self::flush_effects), then again after any of its dependencies change.
    pub fn effect<F>(&self, run: F) -> Effect
    where
        F: FnMut(&mut Reader<'_>) -> Result<(), ReactiveError> + 'static,
    {
        let run: EffectFn = Rc::new(RefCell::new(run));
        let mut graph = self.graph.borrow_mut();
        let id = graph.insert(NodeKind::Effect { run }, None, 0);
        graph.pending_effects.push(id);
        Effect { id }
    }

    /// Read a node without dependency tracking, recomputing it first if it is stale.
    pub fn get<T, R>(&self, handle: &R) -> Result<T, ReactiveError>
    where
        T: Clone + 'static,
        R: Readable<T>,
    {
        let id = handle.node_id();
        self.update(id)?;
        let graph = self.graph.borrow();
        let value = graph
            .node(id)?
            .value
            .as_ref()
            .ok_or(ReactiveError::Disposed(id))?;
        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or(ReactiveError::TypeMismatch(id))
    }

    /// Write a signal. Returns `Ok(false)` if the value is equal to the current one, in which
    /// case nothing is invalidated.
    pub fn set<T>(&self, signal: &Signal<T>, value: T) -> Result<bool, ReactiveError>
    where
        T: PartialEq + 'static,
    {
        let mut graph = self.graph.borrow_mut();
        graph.node(signal.id)?;
        let revision = graph.revision + 1;

        let Some(node) = graph.nodes.get_mut(signal.id) else {
            return Err(ReactiveError::Disposed(signal.id));
        };
        if let Some(current) = node.value.as_ref().and_then(|v| v.downcast_ref::<T>())
            && *current == value
        {
            return Ok(false);
        }
        node.value = Some(Rc::new(value));
        node.changed_at = revision;
        node.verified_at = revision;

        graph.revision = revision;
        graph.mark_dependents_stale(signal.id);
        tracing::trace!(node = ?signal.id, revision, "signal_set");
        Ok(true)
    }

    /// Run every scheduled effect whose dependencies changed. Returns how many effects ran.
    pub fn flush_effects(&self) -> Result<usize, ReactiveError> {
        let mut ran = 0usize;
        for _ in 0..MAX_FLUSH_ROUNDS {
            let pending = {
                let mut graph = self.graph.borrow_mut();
                if graph.disposed {
                    return Err(ReactiveError::RuntimeDisposed);
                }
                graph.take_pending_effects()
            };
            if pending.is_empty() {
                return Ok(ran);
            }
            for id in pending {
                if !self.contains(id) {
                    continue;
                }
                match self.update(id) {
                    Ok(true) => ran += 1,
                    Ok(false) => {}
                    Err(ReactiveError::RuntimeDisposed) => {
                        return Err(ReactiveError::RuntimeDisposed);
                    }
                    Err(err) => {
                        // Settle the effect so that the next change schedules it again.
                        tracing::debug!(node = ?id, %err, "effect_failed");
                        self.settle(id);
                    }
                }
            }
        }
        tracing::warn!(
            rounds = MAX_FLUSH_ROUNDS,
            "effects kept invalidating each other, flush stopped"
        );
        Ok(ran)
    }

    /// Whether `id` is still live.
    pub fn contains(&self, id: NodeId) -> bool {
        let graph = self.graph.borrow();
        !graph.disposed && graph.nodes.contains_key(id)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.graph.borrow().nodes.len()
    }

    /// Current global revision (incremented by each effective signal write).
    pub fn revision(&self) -> u64 {
        self.graph.borrow().revision
    }

    /// Release a set of nodes in one pass.
    ///
    /// Dependents of released nodes are marked stale; reading them afterwards yields
    /// [`ReactiveError::Disposed`] if they still need a released node.
    pub fn dispose_nodes(&self, ids: &[NodeId]) -> Result<(), ReactiveError> {
        let removed: Vec<Node> = {
            let mut graph = self
                .graph
                .try_borrow_mut()
                .map_err(|_| ReactiveError::Busy)?;
            ids.iter().filter_map(|id| graph.remove(*id)).collect()
        };
        tracing::debug!(count = removed.len(), "reactive_nodes_disposed");
        drop(removed);
        Ok(())
    }

    /// Release the whole graph. Every later read or write fails with
    /// [`ReactiveError::RuntimeDisposed`].
    pub fn dispose(&self) -> Result<(), ReactiveError> {
        let nodes = {
            let mut graph = self
                .graph
                .try_borrow_mut()
                .map_err(|_| ReactiveError::Busy)?;
            graph.disposed = true;
            graph.pending_effects.clear();
            std::mem::take(&mut graph.nodes)
        };
        drop(nodes);
        Ok(())
    }

    /// Whether [`dispose`](Self::dispose) was called.
    pub fn is_disposed(&self) -> bool {
        self.graph.borrow().disposed
    }

    fn settle(&self, id: NodeId) {
        let mut graph = self.graph.borrow_mut();
        let revision = graph.revision;
        if let Some(node) = graph.nodes.get_mut(id) {
            node.stale = false;
            node.verified_at = revision;
        }
    }

    /// Bring `id` up to date. Returns whether its body ran.
    fn update(&self, id: NodeId) -> Result<bool, ReactiveError> {
        let (is_signal, stale, initialized, sources, verified_at) = {
            let graph = self.graph.borrow();
            let node = graph.node(id)?;
            (
                matches!(node.kind, NodeKind::Signal),
                node.stale,
                node.initialized,
                node.sources.clone(),
                node.verified_at,
            )
        };

        if is_signal || (initialized && !stale) {
            return Ok(false);
        }

        let mut needs_run = !initialized;
        if !needs_run {
            for source in sources {
                self.update(source)?;
                let changed_at = self.graph.borrow().node(source)?.changed_at;
                if changed_at > verified_at {
                    needs_run = true;
                    break;
                }
            }
        }

        if needs_run {
            self.evaluate(id)?;
        } else {
            self.settle(id);
        }
        Ok(needs_run)
    }

    fn evaluate(&self, id: NodeId) -> Result<(), ReactiveError> {
        let (job, started_at) = {
            let mut graph = self.graph.borrow_mut();
            graph.node(id)?;
            let started_at = graph.revision;
            let Some(node) = graph.nodes.get_mut(id) else {
                return Err(ReactiveError::Disposed(id));
            };
            let job = match &node.kind {
                NodeKind::Signal => return Ok(()),
                NodeKind::Memo { compute, eq } => Job::Memo(Rc::clone(compute), *eq),
                NodeKind::Effect { run } => Job::Effect(Rc::clone(run)),
            };
            // Cleared before the body runs so that a write made by the body marks it again.
            node.stale = false;
            (job, started_at)
        };

        let mut reader = Reader {
            runtime: self,
            dependencies: Vec::new(),
        };
        let outcome = match &job {
            Job::Memo(compute, _) => (**compute)(&mut reader).map(Some),
            Job::Effect(run) => match run.try_borrow_mut() {
                Ok(mut run) => (*run)(&mut reader).map(|()| None),
                Err(_) => Err(ReactiveError::Busy),
            },
        };
        let dependencies = reader.dependencies;

        let mut graph = self.graph.borrow_mut();
        graph.node(id)?;
        graph.relink(id, dependencies);
        let revision = graph.revision;
        let is_effect = matches!(job, Job::Effect(_));
        let Some(node) = graph.nodes.get_mut(id) else {
            return Err(ReactiveError::Disposed(id));
        };

        let computed = match outcome {
            Ok(computed) => computed,
            Err(err) => {
                node.stale = true;
                return Err(err);
            }
        };
        node.initialized = true;

        // A signal written while the body ran may feed a source the body already read, so the
        // node is only verified up to the revision it started at.
        let invalidated = revision != started_at;
        if invalidated {
            node.stale = true;
            node.verified_at = started_at;
        } else {
            node.stale = false;
            node.verified_at = revision;
        }

        if let (Job::Memo(_, eq), Some(value)) = (job, computed) {
            let changed = match &node.value {
                Some(previous) => !eq(&**previous, &*value),
                None => true,
            };
            if changed {
                node.value = Some(value);
                node.changed_at = revision;
            }
            tracing::trace!(node = ?id, changed, revision, invalidated, "memo_evaluated");
        } else {
            tracing::trace!(node = ?id, revision, invalidated, "effect_ran");
        }

        if invalidated && is_effect {
            graph.pending_effects.push(id);
        }
        Ok(())
    }
}

/// A collection of nodes released together.
///
/// Components register every node they create here and release them all at teardown.
/// Dropping the store releases its nodes.
#[derive(Debug)]
pub struct DisposableStore {
    runtime: Runtime,
    nodes: Vec<NodeId>,
    disposed: bool,
}

impl DisposableStore {
    /// Create an empty store bound to `runtime`.
    pub fn new(runtime: &Runtime) -> Self {
        Self {
            runtime: runtime.clone(),
            nodes: Vec::new(),
            disposed: false,
        }
    }

    /// Register a node (returns it for chaining).
    pub fn add<H: Into<NodeId> + Copy>(&mut self, handle: H) -> H {
        self.nodes.push(handle.into());
        handle
    }

    /// Whether [`dispose`](Self::dispose) already ran.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of registered nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node is registered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Release every registered node. Calling it again is a no-op.
    pub fn dispose(&mut self) -> Result<(), ReactiveError> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        let nodes = std::mem::take(&mut self.nodes);
        if self.runtime.is_disposed() {
            return Ok(());
        }
        self.runtime.dispose_nodes(&nodes)
    }
}

impl Drop for DisposableStore {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            tracing::debug!(%err, "disposable_store_drop_failed");
        }
    }
}

impl<T> From<Signal<T>> for NodeId {
    fn from(handle: Signal<T>) -> Self {
        handle.id
    }
}

impl<T> From<Memo<T>> for NodeId {
    fn from(handle: Memo<T>) -> Self {
        handle.id
    }
}

impl From<Effect> for NodeId {
    fn from(handle: Effect) -> Self {
        handle.id
    }
}

/// Shared, pointer-compared handle to a collaborator.
///
/// Used to store trait objects (text models, coordinate providers) in signals: two values are
/// equal iff they point to the same allocation.
pub struct Shared<T: ?Sized>(Rc<T>);

impl<T: ?Sized> Shared<T> {
    /// Wrap an existing reference-counted value.
    pub fn new(inner: Rc<T>) -> Self {
        Self(inner)
    }

    /// The wrapped `Rc`.
    pub fn as_rc(&self) -> &Rc<T> {
        &self.0
    }
}

impl<T: ?Sized> Clone for Shared<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: ?Sized> PartialEq for Shared<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> Deref for Shared<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized> From<Rc<T>> for Shared<T> {
    fn from(inner: Rc<T>) -> Self {
        Self(inner)
    }
}

impl<T: ?Sized> fmt::Debug for Shared<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Shared({:p})", Rc::as_ptr(&self.0).cast::<()>())
    }
}
