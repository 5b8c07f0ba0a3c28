//! Testing utilities for the hotbar workspace
//!
//! Scripted renderers, failing stores, and small fixtures.

#![allow(missing_docs)]

use async_trait::async_trait;
use hotbar_history::{KvStore, ResultEntry, ResultId, StorageKey, StoreError};
use hotbar_model::{aggregate_legend, Choice, ColorId, Palette, SlotAssignment};
use hotbar_render::{RenderError, RenderRequest, RenderResponse, Renderer};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{oneshot, Notify};

/// Artifact bytes produced by [`StubRenderer`]
pub const STUB_ARTIFACT: &[u8] = b"\x89PNG-stub";

/// Renderer that answers immediately with fixed bytes and a real legend
#[derive(Debug, Default)]
pub struct StubRenderer {
    palette: Palette,
    calls: AtomicUsize,
    requests: Mutex<Vec<RenderRequest>>,
}

impl StubRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<RenderRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(&self, request: RenderRequest) -> Result<RenderResponse, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let legend = aggregate_legend(&request.choices, &self.palette);
        self.requests.lock().push(request);
        Ok(RenderResponse {
            artifact: STUB_ARTIFACT.to_vec(),
            legend,
        })
    }
}

/// Renderer that always fails with the given error
#[derive(Debug)]
pub struct FailingRenderer {
    error: RenderError,
    calls: AtomicUsize,
}

impl FailingRenderer {
    pub fn new(error: RenderError) -> Self {
        Self {
            error,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn transport() -> Self {
        Self::new(RenderError::Transport("connection refused".into()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for FailingRenderer {
    async fn render(&self, _request: RenderRequest) -> Result<RenderResponse, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }
}

type Reply = oneshot::Sender<Result<RenderResponse, RenderError>>;

/// Renderer whose responses are released by the test, in any order
///
/// Each call parks until [`QueuedRenderer::release`] is called with its
/// arrival index.
#[derive(Debug, Default)]
pub struct QueuedRenderer {
    pending: Mutex<Vec<Option<(RenderRequest, Reply)>>>,
    arrived: Notify,
}

impl QueuedRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until `count` calls have arrived
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.arrived.notified();
            if self.pending.lock().len() >= count {
                return;
            }
            notified.await;
        }
    }

    /// Request of the call that arrived `index`-th
    pub fn request(&self, index: usize) -> Option<RenderRequest> {
        self.pending
            .lock()
            .get(index)
            .and_then(|slot| slot.as_ref().map(|(request, _)| request.clone()))
    }

    /// Complete the call that arrived `index`-th
    ///
    /// Returns false if there is no such call or it was already released.
    pub fn release(&self, index: usize, response: Result<RenderResponse, RenderError>) -> bool {
        let slot = self.pending.lock().get_mut(index).and_then(Option::take);
        match slot {
            Some((_, reply)) => reply.send(response).is_ok(),
            None => false,
        }
    }

    /// Complete a call with a stub artifact tagged by `tag`
    pub fn release_ok(&self, index: usize, tag: u8) -> bool {
        self.release(
            index,
            Ok(RenderResponse {
                artifact: vec![tag],
                legend: Vec::new(),
            }),
        )
    }
}

#[async_trait]
impl Renderer for QueuedRenderer {
    async fn render(&self, request: RenderRequest) -> Result<RenderResponse, RenderError> {
        let (reply, response) = oneshot::channel();
        self.pending.lock().push(Some((request, reply)));
        self.arrived.notify_waiters();
        response
            .await
            .unwrap_or_else(|_| Err(RenderError::Transport("queued call dropped".into())))
    }
}

/// Store whose writes fail for selected keys; reads always miss
#[derive(Debug, Default)]
pub struct FailingStore {
    failing: HashSet<StorageKey>,
    attempts: AtomicUsize,
}

impl FailingStore {
    /// Store where every write fails
    pub fn all() -> Self {
        Self::failing_on(StorageKey::ALL)
    }

    pub fn failing_on(keys: impl IntoIterator<Item = StorageKey>) -> Self {
        Self {
            failing: keys.into_iter().collect(),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl KvStore for FailingStore {
    fn get(&self, _key: StorageKey) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&key) {
            Err(StoreError::QuotaExceeded {
                key,
                needed: value.len(),
                quota: 0,
            })
        } else {
            Ok(())
        }
    }
}

/// Hotbar holding `colors` in order, each with weight 1
pub fn assignment(colors: &[&str]) -> SlotAssignment {
    let choices: Vec<Choice> = colors.iter().map(|c| Choice::new(*c, 1)).collect();
    SlotAssignment::from_choices(colors.len().max(9), &choices)
}

pub fn colors(names: &[&str]) -> Vec<ColorId> {
    names.iter().copied().map(ColorId::from).collect()
}

pub fn result_entry(id: u64, colors: &[&str]) -> ResultEntry {
    ResultEntry::new(
        ResultId::from_raw(id),
        STUB_ARTIFACT.to_vec(),
        Vec::new(),
        assignment(colors),
    )
}
