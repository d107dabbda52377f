//! In-memory directory used by tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{
    Bind, BoxError, Dialer, DirectoryConn, DirectoryEntry, SearchRequest,
};

#[derive(Debug, Default)]
struct State {
    /// Search results keyed by exact filter.
    results: HashMap<String, Vec<DirectoryEntry>>,
    /// Passwords keyed by DN.
    passwords: HashMap<String, String>,
    /// Filters searched, in order.
    searches: Vec<SearchRequest>,
    unreachable: bool,
    failing_search: bool,
}

/// Answers searches by filter and checks binds against known passwords.
#[derive(Clone, Debug, Default)]
pub struct FakeDirectory {
    state: Arc<Mutex<State>>,
    dials: Arc<AtomicUsize>,
    closes: Arc<AtomicUsize>,
}

impl FakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `password` for `dn`.
    pub fn account(self, dn: &str, password: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .passwords
            .insert(dn.to_owned(), password.to_owned());
        self
    }

    /// Return `entries` for searches using `filter`.
    pub fn results(self, filter: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.state
            .lock()
            .unwrap()
            .results
            .insert(filter.to_owned(), entries);
        self
    }

    /// Refuse every dial.
    pub fn unreachable(self) -> Self {
        self.state.lock().unwrap().unreachable = true;
        self
    }

    /// Fail every search at the transport level.
    pub fn failing_search(self) -> Self {
        self.state.lock().unwrap().failing_search = true;
        self
    }

    pub fn dials(&self) -> usize {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn searches(&self) -> Vec<SearchRequest> {
        self.state.lock().unwrap().searches.clone()
    }
}

#[async_trait]
impl Dialer for FakeDirectory {
    type Conn = FakeDirectory;

    fn address(&self) -> &str {
        "fake:389"
    }

    async fn dial(&self) -> Result<FakeDirectory, BoxError> {
        if self.state.lock().unwrap().unreachable {
            return Err("connection refused".into());
        }

        self.dials.fetch_add(1, Ordering::SeqCst);
        Ok(self.clone())
    }
}

#[async_trait]
impl DirectoryConn for FakeDirectory {
    async fn bind(&mut self, dn: &str, password: &str) -> Result<Bind, BoxError> {
        // Anonymous bind.
        if dn.is_empty() && password.is_empty() {
            return Ok(Bind::Success);
        }

        let state = self.state.lock().unwrap();
        match state.passwords.get(dn) {
            Some(expected) if expected == password => Ok(Bind::Success),
            Some(_) => Ok(Bind::InvalidCredentials),
            None => Err(format!("no such object {dn:?}").into()),
        }
    }

    async fn search(
        &mut self,
        request: &SearchRequest,
    ) -> Result<Vec<DirectoryEntry>, BoxError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_search {
            return Err("broken pipe".into());
        }

        state.searches.push(request.clone());
        Ok(state
            .results
            .get(&request.filter)
            .cloned()
            .unwrap_or_default())
    }

    async fn close(&mut self) -> Result<(), BoxError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
