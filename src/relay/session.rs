//! Per-connection lifecycle state.

use crate::state::ConnectionHandle;
use yapple_proto::UserId;

/// Where a connection is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    /// Accepted, not yet announced by a `connect` frame.
    AwaitingConnect,
    /// Announced under one or more users.
    Registered { users: Vec<UserId> },
    /// Closed or errored. Terminal.
    Closed,
}

/// One connection as seen by the relay. Owned by the connection task.
#[derive(Debug)]
pub struct Session {
    conn: ConnectionHandle,
    phase: Phase,
}

impl Session {
    pub fn new(conn: ConnectionHandle) -> Self {
        Self {
            conn,
            phase: Phase::AwaitingConnect,
        }
    }

    pub fn conn(&self) -> &ConnectionHandle {
        &self.conn
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_closed(&self) -> bool {
        self.phase == Phase::Closed
    }

    /// Users this connection has announced, in announcement order.
    pub fn users(&self) -> &[UserId] {
        match &self.phase {
            Phase::Registered { users } => users,
            _ => &[],
        }
    }

    pub(super) fn record_connect(&mut self, user: UserId) {
        match self.phase {
            Phase::AwaitingConnect => {
                self.phase = Phase::Registered { users: vec![user] };
            }
            Phase::Registered { ref mut users } => {
                if !users.contains(&user) {
                    users.push(user);
                }
            }
            Phase::Closed => {}
        }
    }

    pub(super) fn record_close(&mut self) {
        self.phase = Phase::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    fn session() -> Session {
        let addr: SocketAddr = "127.0.0.1:50002".parse().unwrap();
        let (conn, _rx) = ConnectionHandle::new(addr, 1);
        Session::new(conn)
    }

    #[test]
    fn starts_awaiting_connect() {
        let s = session();
        assert_eq!(s.phase(), &Phase::AwaitingConnect);
        assert!(s.users().is_empty());
    }

    #[test]
    fn connect_accumulates_distinct_users() {
        let mut s = session();
        s.record_connect(UserId::new("a").unwrap());
        s.record_connect(UserId::new("b").unwrap());
        s.record_connect(UserId::new("a").unwrap());
        assert_eq!(
            s.users(),
            &[UserId::new("a").unwrap(), UserId::new("b").unwrap()]
        );
    }

    #[test]
    fn closed_is_terminal() {
        let mut s = session();
        s.record_close();
        s.record_connect(UserId::new("a").unwrap());
        assert!(s.is_closed());
        assert!(s.users().is_empty());
    }
}
