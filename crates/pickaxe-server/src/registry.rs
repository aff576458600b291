//! The listener's client registry: a single `Mutex`-guarded map owned by the
//! accept task. Hook collaborators get a non-owning `ClientHandle` rather
//! than a connection back-pointer, so a handle outliving its connection just
//! stops resolving instead of dangling.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

pub type ClientId = u64;

struct ClientRecord {
    username: Option<String>,
}

pub struct Registry {
    next_id: AtomicU64,
    clients: Mutex<HashMap<ClientId, ClientRecord>>,
}

impl Registry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            next_id: AtomicU64::new(1),
            clients: Mutex::new(HashMap::new()),
        })
    }

    /// Register a newly-accepted connection and hand back its handle. The
    /// peer address is the hook-facing client identity and travels as its
    /// own argument through the call chain rather than living in the
    /// registry, which only tracks liveness and username.
    pub fn insert(self: &Arc<Self>) -> ClientHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.clients
            .lock()
            .unwrap()
            .insert(id, ClientRecord { username: None });
        ClientHandle {
            id,
            registry: Arc::downgrade(self),
        }
    }

    /// Remove a client's slot. Called once a connection's own task returns,
    /// which is inherently after that connection's last handler call.
    pub fn remove(&self, id: ClientId) {
        self.clients.lock().unwrap().remove(&id);
    }

    pub fn set_username(&self, id: ClientId, username: String) {
        if let Some(record) = self.clients.lock().unwrap().get_mut(&id) {
            record.username = Some(username);
        }
    }

    pub fn len(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

/// A non-owning reference to a registered client. Validates on use against
/// the registry rather than keeping the client alive or pointing at freed
/// connection state.
#[derive(Clone)]
pub struct ClientHandle {
    id: ClientId,
    registry: Weak<Registry>,
}

impl ClientHandle {
    pub fn id(&self) -> ClientId {
        self.id
    }

    /// Whether this client is still present in the listener's registry.
    pub fn is_live(&self) -> bool {
        self.registry
            .upgrade()
            .map(|r| r.clients.lock().unwrap().contains_key(&self.id))
            .unwrap_or(false)
    }

    pub fn set_username(&self, username: String) {
        if let Some(registry) = self.registry.upgrade() {
            registry.set_username(self.id, username);
        }
    }
}

/// Removes the client's registry slot when the owning connection task ends,
/// on every exit path including early return and panic unwind.
pub struct ClientGuard {
    registry: Arc<Registry>,
    id: ClientId,
}

impl ClientGuard {
    pub fn new(registry: Arc<Registry>, id: ClientId) -> Self {
        Self { registry, id }
    }
}

impl Drop for ClientGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
