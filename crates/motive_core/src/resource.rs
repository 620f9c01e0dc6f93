//! Execution-resource arbitration
//!
//! Position-like state of a component (scroll offset, current page, swipe
//! transforms) can be mutated by gestures and by programmatic commands alike.
//! Before mutating, a participant claims the matching [`ExecutionResource`]
//! through the [`ResourceArbitrator`]. A claim on a key that is already held
//! revokes the previous owner by calling its [`ResourceOwner::on_resource_loss`]
//! before the new claim is recorded, so at most one owner holds a key at a
//! time.
//!
//! Exclusivity is advisory: anything that mutates position-like state must
//! take part in this protocol.
//!
//! # Example
//!
//! ```ignore
//! let arbitrator = ResourceArbitrator::new();
//! let resource = ExecutionResource::position(component_id);
//! let holder = ExecutionResourceHolder::create(resource, &arbitrator, || reset_gesture());
//!
//! holder.take_resource();
//! // ... a command preempts us:
//! arbitrator.release_resource(resource); // calls reset_gesture()
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Identifier of a component within the host's component tree
pub type ComponentId = u64;

/// The kind of state an execution resource guards
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Scroll offset or current page
    Position,
    /// Transform of a component, used by swipe transitions
    Transform,
    Opacity,
}

/// A named piece of mutable component state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ExecutionResource {
    pub kind: ResourceKind,
    pub component: ComponentId,
}

impl ExecutionResource {
    pub fn new(kind: ResourceKind, component: ComponentId) -> Self {
        Self { kind, component }
    }

    pub fn position(component: ComponentId) -> Self {
        Self::new(ResourceKind::Position, component)
    }
}

impl fmt::Display for ExecutionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}#{}", self.kind, self.component)
    }
}

/// Anything that can hold an execution resource
pub trait ResourceOwner: Send + Sync {
    /// Called when another claim revoked this owner's resource
    fn on_resource_loss(&self);
}

fn same_owner(a: &Arc<dyn ResourceOwner>, b: *const ()) -> bool {
    Arc::as_ptr(a) as *const () == b
}

/// Central registry of resource claims
#[derive(Default)]
pub struct ResourceArbitrator {
    holders: Mutex<FxHashMap<ExecutionResource, Arc<dyn ResourceOwner>>>,
    terminated: AtomicBool,
}

impl ResourceArbitrator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Grant `resource` to `owner`, revoking any previous holder first
    ///
    /// Re-claiming a resource the owner already holds is a no-op and does not
    /// notify the owner.
    pub fn claim_resource(&self, resource: ExecutionResource, owner: Arc<dyn ResourceOwner>) {
        if self.is_terminated() {
            return;
        }

        let previous = {
            let mut holders = self.holders.lock().unwrap();
            if let Some(current) = holders.get(&resource) {
                if same_owner(current, Arc::as_ptr(&owner) as *const ()) {
                    return;
                }
            }
            holders.remove(&resource)
        };

        if let Some(previous) = previous {
            tracing::debug!(%resource, "resource preempted");
            previous.on_resource_loss();
        }

        // The loss callback may have claimed something itself; the newest claim wins.
        let displaced = self.holders.lock().unwrap().insert(resource, owner);
        if let Some(displaced) = displaced {
            displaced.on_resource_loss();
        }
        tracing::trace!(%resource, "resource claimed");
    }

    /// Revoke `resource` from whoever holds it, notifying the holder
    pub fn release_resource(&self, resource: ExecutionResource) -> bool {
        if self.is_terminated() {
            return false;
        }
        let previous = self.holders.lock().unwrap().remove(&resource);
        match previous {
            Some(previous) => {
                tracing::debug!(%resource, "resource released");
                previous.on_resource_loss();
                true
            }
            None => false,
        }
    }

    /// Give up `resource` if `owner` is the current holder. The owner is not
    /// notified.
    pub fn release_if_owned(&self, resource: ExecutionResource, owner: *const ()) -> bool {
        let mut holders = self.holders.lock().unwrap();
        match holders.get(&resource) {
            Some(current) if same_owner(current, owner) => {
                holders.remove(&resource);
                true
            }
            _ => false,
        }
    }

    /// Drop every claim held by `owner` without notifying it
    pub fn release_related_resources(&self, owner: *const ()) -> usize {
        let removed: SmallVec<[Arc<dyn ResourceOwner>; 4]> = {
            let mut holders = self.holders.lock().unwrap();
            let keys: SmallVec<[ExecutionResource; 4]> = holders
                .iter()
                .filter(|(_, holder)| same_owner(holder, owner))
                .map(|(key, _)| *key)
                .collect();
            keys.iter().filter_map(|key| holders.remove(key)).collect()
        };
        removed.len()
    }

    pub fn is_claimed(&self, resource: ExecutionResource) -> bool {
        self.holders.lock().unwrap().contains_key(&resource)
    }

    /// True when `owner` currently holds `resource`
    pub fn is_held_by(&self, resource: ExecutionResource, owner: *const ()) -> bool {
        self.holders
            .lock()
            .unwrap()
            .get(&resource)
            .is_some_and(|current| same_owner(current, owner))
    }

    /// Drop all claims without notification and refuse further claims
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        let holders = std::mem::take(&mut *self.holders.lock().unwrap());
        drop(holders);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}

/// A resource claim owned by a gesture or command
///
/// The holder references the arbitrator weakly; if the arbitrator is gone all
/// operations are no-ops.
pub struct ExecutionResourceHolder {
    resource: ExecutionResource,
    arbitrator: Weak<ResourceArbitrator>,
    on_loss: Box<dyn Fn() + Send + Sync>,
    released: AtomicBool,
    self_ref: Weak<ExecutionResourceHolder>,
}

impl ExecutionResourceHolder {
    pub fn create<F>(
        resource: ExecutionResource,
        arbitrator: &Arc<ResourceArbitrator>,
        on_loss: F,
    ) -> Arc<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        Arc::new_cyclic(|self_ref| Self {
            resource,
            arbitrator: Arc::downgrade(arbitrator),
            on_loss: Box::new(on_loss),
            released: AtomicBool::new(false),
            self_ref: self_ref.clone(),
        })
    }

    pub fn resource(&self) -> ExecutionResource {
        self.resource
    }

    fn identity(&self) -> *const () {
        self as *const Self as *const ()
    }

    /// Claim the resource, preempting the current holder
    pub fn take_resource(&self) {
        if self.released.load(Ordering::Acquire) {
            return;
        }
        let (Some(arbitrator), Some(me)) = (self.arbitrator.upgrade(), self.self_ref.upgrade())
        else {
            return;
        };
        arbitrator.claim_resource(self.resource, me);
    }

    /// Give the resource back if this holder has it
    pub fn release_resource(&self) {
        if let Some(arbitrator) = self.arbitrator.upgrade() {
            arbitrator.release_if_owned(self.resource, self.identity());
        }
    }

    pub fn holds_resource(&self) -> bool {
        self.arbitrator
            .upgrade()
            .is_some_and(|arbitrator| arbitrator.is_held_by(self.resource, self.identity()))
    }

    /// Give the resource back and stop reacting to losses
    pub fn release(&self) {
        self.released.store(true, Ordering::Release);
        self.release_resource();
    }
}

impl ResourceOwner for ExecutionResourceHolder {
    fn on_resource_loss(&self) {
        if !self.released.load(Ordering::Acquire) {
            (self.on_loss)();
        }
    }
}

impl fmt::Debug for ExecutionResourceHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionResourceHolder")
            .field("resource", &self.resource)
            .field("released", &self.released.load(Ordering::Relaxed))
            .finish()
    }
}
