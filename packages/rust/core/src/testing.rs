//! In-memory fakes for the generator and the property store.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use listing_inference::TextGenerator;
use listing_shared::{
    ListingError, PropertyId, PropertyRecord, PropertySummary, Result, Rewrite,
};
use listing_storage::{PropertyStore, RecordTransaction};

// ---------------------------------------------------------------------------
// ScriptedGenerator
// ---------------------------------------------------------------------------

/// One scripted reply.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Text(String),
    Fail,
    Panic,
}

pub(crate) fn text(s: &str) -> Reply {
    Reply::Text(s.to_string())
}

/// Returns replies in order and records every prompt it receives.
/// Running out of replies behaves like a failed call.
#[derive(Default)]
pub(crate) struct ScriptedGenerator {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub(crate) fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Text(t)) => Ok(t),
            Some(Reply::Fail) | None => Err(ListingError::Generation("scripted failure".into())),
            Some(Reply::Panic) => panic!("scripted panic"),
        }
    }
}

// ---------------------------------------------------------------------------
// FakeStore
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct FakeState {
    pub records: Vec<PropertyRecord>,
    pub amenities: HashMap<PropertyId, String>,
    pub fail_fetch: bool,
    pub fail_summary_insert: bool,
    pub fetch_calls: usize,
    pub update_calls: usize,
    pub summary_calls: usize,
    pub rollbacks: usize,
    pub committed_updates: Vec<(PropertyId, Rewrite)>,
    pub committed_summaries: Vec<PropertySummary>,
}

/// Store whose writes only become visible on commit.
#[derive(Default, Clone)]
pub(crate) struct FakeStore {
    pub state: Arc<Mutex<FakeState>>,
}

impl FakeStore {
    pub(crate) fn with_records(records: Vec<PropertyRecord>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().records = records;
        store
    }

    pub(crate) fn set_amenities(&self, id: PropertyId, amenities: &str) {
        self.state
            .lock()
            .unwrap()
            .amenities
            .insert(id, amenities.to_string());
    }

    pub(crate) fn snapshot<T>(&self, f: impl FnOnce(&FakeState) -> T) -> T {
        f(&self.state.lock().unwrap())
    }
}

pub(crate) fn record(id: i64, title: &str, description: &str) -> PropertyRecord {
    PropertyRecord {
        id: PropertyId(id),
        title: title.into(),
        description: description.into(),
    }
}

impl PropertyStore for FakeStore {
    type Transaction = FakeTransaction;

    async fn fetch_properties(&self) -> Result<Vec<PropertyRecord>> {
        let mut state = self.state.lock().unwrap();
        state.fetch_calls += 1;
        if state.fail_fetch {
            return Err(ListingError::Storage("connection refused".into()));
        }
        Ok(state.records.clone())
    }

    async fn begin_record(&self) -> Result<FakeTransaction> {
        Ok(FakeTransaction {
            state: Arc::clone(&self.state),
            updates: Mutex::new(Vec::new()),
            summaries: Mutex::new(Vec::new()),
        })
    }
}

pub(crate) struct FakeTransaction {
    state: Arc<Mutex<FakeState>>,
    updates: Mutex<Vec<(PropertyId, Rewrite)>>,
    summaries: Mutex<Vec<PropertySummary>>,
}

impl RecordTransaction for FakeTransaction {
    async fn update_listing(&self, id: PropertyId, rewrite: &Rewrite) -> Result<()> {
        self.state.lock().unwrap().update_calls += 1;
        self.updates.lock().unwrap().push((id, rewrite.clone()));
        Ok(())
    }

    async fn amenities_for(&self, id: PropertyId) -> Result<String> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .amenities
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn insert_summary(&self, summary: &PropertySummary) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.summary_calls += 1;
        if state.fail_summary_insert {
            return Err(ListingError::Storage("disk I/O error".into()));
        }
        self.summaries.lock().unwrap().push(summary.clone());
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state
            .committed_updates
            .extend(self.updates.into_inner().unwrap());
        state
            .committed_summaries
            .extend(self.summaries.into_inner().unwrap());
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        self.state.lock().unwrap().rollbacks += 1;
        Ok(())
    }
}
