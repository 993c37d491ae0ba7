// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Shared fakes: scripted HTTP peer, settable clock, observable store.

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicI64, Ordering},
    },
};

use async_trait::async_trait;
use hytale_server_rs::auth::{
    credentials::{CredentialRecord, CredentialStore, StoreError},
    http::{Clock, HttpClient, HttpError, HttpRequest, HttpResponse, Method},
};

/// Clock the test advances by hand.
pub struct FakeClock {
    now: AtomicI64,
}

impl FakeClock {
    pub fn new(start: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(start),
        })
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// One request the fake peer saw.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// HTTP peer that replays a scripted queue of responses and records
/// every request it served.
#[derive(Default)]
pub struct FakeHttp {
    requests: Mutex<Vec<RecordedRequest>>,
    responses: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
}

impl FakeHttp {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .expect("responses poisoned")
            .push_back(Ok(HttpResponse {
                status,
                body: body.as_bytes().to_vec(),
            }));
    }

    pub fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .expect("responses poisoned")
            .push_back(Err(HttpError(message.to_string())));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("requests poisoned").clone()
    }

    pub fn last_request(&self) -> RecordedRequest {
        self.requests()
            .last()
            .cloned()
            .expect("no requests recorded")
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests poisoned").len()
    }
}

#[async_trait]
impl HttpClient for FakeHttp {
    async fn fetch(&self, request: HttpRequest<'_>) -> Result<HttpResponse, HttpError> {
        self.requests
            .lock()
            .expect("requests poisoned")
            .push(RecordedRequest {
                method: request.method,
                url: request.url.to_string(),
                headers: request
                    .headers
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect(),
                body: request
                    .body
                    .map(|b| String::from_utf8_lossy(b).into_owned())
                    .unwrap_or_default(),
            });
        self.responses
            .lock()
            .expect("responses poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(HttpError("unexpected request".to_string())))
    }
}

#[derive(Debug, Default)]
pub struct StoreState {
    pub record: Option<CredentialRecord>,
    pub saves: usize,
}

/// Store whose state the test observes from outside the manager.
#[derive(Clone, Default)]
pub struct SharedStore(pub Arc<Mutex<StoreState>>);

impl SharedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_record(record: CredentialRecord) -> Self {
        let store = Self::default();
        store.0.lock().expect("store poisoned").record = Some(record);
        store
    }

    pub fn saves(&self) -> usize {
        self.0.lock().expect("store poisoned").saves
    }

    pub fn record(&self) -> Option<CredentialRecord> {
        self.0.lock().expect("store poisoned").record.clone()
    }
}

impl CredentialStore for SharedStore {
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.0.lock().expect("store poisoned").record.clone())
    }

    fn save(&mut self, record: &CredentialRecord) -> Result<(), StoreError> {
        let mut state = self.0.lock().expect("store poisoned");
        state.record = Some(record.clone());
        state.saves += 1;
        Ok(())
    }

    fn clear(&mut self) {
        self.0.lock().expect("store poisoned").record = None;
    }

    fn is_encryption_available(&self) -> bool {
        true
    }
}
