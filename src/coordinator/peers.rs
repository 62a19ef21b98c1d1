//! Copy-on-write registry of identified peers.
//!
//! Membership lives in a persistent [`im::Vector`] behind a short-held
//! `RwLock`. A snapshot is an O(1) structural-sharing clone, so a cycle can
//! iterate a frozen view while the gateway keeps appending. The lock is never
//! held across I/O.

use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;

use crate::network::{PeerConnection, PeerId};

/// A registered peer: immutable metadata plus its exclusively-locked session.
#[derive(Clone)]
pub struct PeerEntry {
    pub id: PeerId,
    pub identity: String,
    pub addr: SocketAddr,
    pub conn: Arc<Mutex<PeerConnection>>,
}

impl PeerEntry {
    fn new(conn: PeerConnection) -> Self {
        Self {
            id: conn.id(),
            identity: conn.identity().to_string(),
            addr: conn.addr(),
            conn: Arc::new(Mutex::new(conn)),
        }
    }
}

impl fmt::Display for PeerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer[{}@{}]", self.identity, self.addr)
    }
}

impl fmt::Debug for PeerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeerEntry")
            .field("id", &self.id)
            .field("identity", &self.identity)
            .field("addr", &self.addr)
            .finish_non_exhaustive()
    }
}

/// Peers in registration order.
#[derive(Default)]
pub struct PeerSet {
    peers: RwLock<im::Vector<PeerEntry>>,
}

impl PeerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an identified peer.
    pub fn insert(&self, conn: PeerConnection) -> PeerEntry {
        let entry = PeerEntry::new(conn);
        self.peers.write().push_back(entry.clone());
        entry
    }

    /// Remove a peer by id. Returns `None` if it was already gone.
    pub fn remove(&self, id: PeerId) -> Option<PeerEntry> {
        let mut peers = self.peers.write();
        let index = peers.iter().position(|entry| entry.id == id)?;
        Some(peers.remove(index))
    }

    /// Frozen view of current membership, in registration order.
    pub fn snapshot(&self) -> im::Vector<PeerEntry> {
        self.peers.read().clone()
    }

    /// Empty the set, returning what it held.
    pub fn drain(&self) -> im::Vector<PeerEntry> {
        std::mem::take(&mut *self.peers.write())
    }

    pub fn contains(&self, id: PeerId) -> bool {
        self.peers.read().iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }

    pub fn identities(&self) -> Vec<String> {
        self.peers
            .read()
            .iter()
            .map(|entry| entry.identity.clone())
            .collect()
    }
}
