//! Process-wide map from user identity to that user's live connections.
//!
//! One mutex guards the map. It is held only to mutate or copy; sends,
//! closes and logging all happen after it is released.

use super::handle::{ConnectionHandle, ConnectionId};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::debug;
use yapple_proto::UserId;

#[derive(Default)]
pub struct Registry {
    clients: Mutex<HashMap<UserId, Vec<ConnectionHandle>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `conn` as one of `user`'s connections.
    ///
    /// Entries for `user` that are no longer open are dropped first. A
    /// connection already present for `user` is not added again. Returns the
    /// number of connections `user` now has.
    pub fn register(&self, user: UserId, conn: ConnectionHandle) -> usize {
        let (live, pruned) = {
            let mut clients = self.clients.lock();
            let conns = clients.entry(user.clone()).or_default();
            let before = conns.len();
            conns.retain(ConnectionHandle::is_open);
            let pruned = before - conns.len();
            if !conns.iter().any(|c| c.id() == conn.id()) {
                conns.push(conn);
            }
            (conns.len(), pruned)
        };

        if pruned > 0 {
            debug!(user = %user, pruned, "Dropped stale connections on register");
        }
        self.publish_size();
        live
    }

    /// Remove `conn` from every user it is registered under, then close it.
    ///
    /// Returns the users it was removed from; empty if it was never
    /// registered or already removed.
    pub fn unregister(&self, conn: &ConnectionHandle) -> Vec<UserId> {
        let removed_from = {
            let mut clients = self.clients.lock();
            let mut removed_from = Vec::new();
            for (user, conns) in clients.iter_mut() {
                let before = conns.len();
                conns.retain(|c| c.id() != conn.id());
                if conns.len() != before {
                    removed_from.push(user.clone());
                }
            }
            removed_from
        };

        conn.close();
        self.publish_size();
        removed_from
    }

    /// Snapshot of `user`'s connections, possibly empty.
    pub fn lookup(&self, user: &str) -> Vec<ConnectionHandle> {
        self.clients.lock().get(user).cloned().unwrap_or_default()
    }

    /// Users with at least one registered connection.
    pub fn user_count(&self) -> usize {
        self.clients
            .lock()
            .values()
            .filter(|conns| !conns.is_empty())
            .count()
    }

    /// Distinct connections across all users.
    pub fn connection_count(&self) -> usize {
        let clients = self.clients.lock();
        clients
            .values()
            .flatten()
            .map(ConnectionHandle::id)
            .collect::<HashSet<_>>()
            .len()
    }

    /// Users a connection is currently registered under.
    pub fn users_for(&self, id: ConnectionId) -> Vec<UserId> {
        let clients = self.clients.lock();
        let mut users: Vec<UserId> = clients
            .iter()
            .filter(|(_, conns)| conns.iter().any(|c| c.id() == id))
            .map(|(user, _)| user.clone())
            .collect();
        users.sort();
        users
    }

    fn publish_size(&self) {
        crate::metrics::set_registry_size(self.user_count(), self.connection_count());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Readiness;
    use std::net::SocketAddr;
    use tokio::sync::mpsc;

    use crate::state::Outbound;

    fn uid(s: &str) -> UserId {
        UserId::new(s).unwrap()
    }

    fn conn() -> (ConnectionHandle, mpsc::Receiver<Outbound>) {
        let addr: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        ConnectionHandle::new(addr, 8)
    }

    #[test]
    fn open_siblings_are_kept() {
        let registry = Registry::new();
        let (c1, _r1) = conn();
        let (c2, _r2) = conn();

        registry.register(uid("u"), c1.clone());
        registry.register(uid("u"), c2.clone());

        assert_eq!(registry.lookup("u"), vec![c1, c2]);
    }

    #[test]
    fn closed_siblings_are_dropped_on_register() {
        let registry = Registry::new();
        let (c1, _r1) = conn();
        let (c2, _r2) = conn();

        registry.register(uid("u"), c1.clone());
        c1.close();
        registry.register(uid("u"), c2.clone());

        assert_eq!(registry.lookup("u"), vec![c2]);
    }

    #[test]
    fn register_same_connection_twice_is_idempotent() {
        let registry = Registry::new();
        let (c1, _r1) = conn();

        assert_eq!(registry.register(uid("u"), c1.clone()), 1);
        assert_eq!(registry.register(uid("u"), c1.clone()), 1);
        assert_eq!(registry.lookup("u").len(), 1);
    }

    #[test]
    fn unregister_removes_and_closes() {
        let registry = Registry::new();
        let (c1, mut r1) = conn();

        registry.register(uid("u"), c1.clone());
        assert_eq!(registry.unregister(&c1), vec![uid("u")]);

        assert!(registry.lookup("u").is_empty());
        assert_eq!(c1.readiness(), Readiness::Closing);
        assert_eq!(r1.try_recv().unwrap(), Outbound::Close);
    }

    #[test]
    fn unregister_unknown_connection_is_noop() {
        let registry = Registry::new();
        let (c1, _r1) = conn();
        assert!(registry.unregister(&c1).is_empty());
        assert!(registry.unregister(&c1).is_empty());
    }

    #[test]
    fn unregister_covers_every_user() {
        let registry = Registry::new();
        let (shared, _rs) = conn();
        let (other, _ro) = conn();

        registry.register(uid("a"), shared.clone());
        registry.register(uid("b"), shared.clone());
        registry.register(uid("b"), other.clone());
        assert_eq!(registry.users_for(shared.id()), vec![uid("a"), uid("b")]);

        let mut removed = registry.unregister(&shared);
        removed.sort();
        assert_eq!(removed, vec![uid("a"), uid("b")]);
        assert!(registry.lookup("a").is_empty());
        assert_eq!(registry.lookup("b"), vec![other]);
    }

    #[test]
    fn lookup_is_a_snapshot() {
        let registry = Registry::new();
        let (c1, _r1) = conn();
        registry.register(uid("u"), c1.clone());

        let snapshot = registry.lookup("u");
        registry.unregister(&c1);
        assert_eq!(snapshot.len(), 1);
        assert!(registry.lookup("u").is_empty());
    }

    #[test]
    fn lookup_unknown_user_is_empty() {
        let registry = Registry::new();
        assert!(registry.lookup("nobody").is_empty());
    }

    #[test]
    fn counts_ignore_empty_entries_and_duplicates() {
        let registry = Registry::new();
        let (c1, _r1) = conn();
        let (c2, _r2) = conn();

        registry.register(uid("a"), c1.clone());
        registry.register(uid("b"), c1.clone());
        registry.register(uid("b"), c2.clone());
        assert_eq!(registry.user_count(), 2);
        assert_eq!(registry.connection_count(), 2);

        registry.unregister(&c1);
        assert_eq!(registry.user_count(), 1);
        assert_eq!(registry.connection_count(), 1);
    }
}
