//! Scripted in-memory backend shared by the background-task tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rstake::storage::KeyValueStore;
use rstake::types::{ApiResponse, Balance, InvoiceStatus, PendingInvoice, Profile};
use rstake::{EventBus, MemoryStore, RstakeError, StakingBackend, TokenStore};
use serde_json::json;

/// What the next invoice poll answers with.
#[derive(Debug, Clone)]
pub enum Poll {
    Status(&'static str),
    NoStatus,
    Fail,
    /// Never answers.
    Hang,
}

#[derive(Default)]
pub struct FakeBackend {
    polls: Mutex<VecDeque<Poll>>,
    balances: Mutex<VecDeque<Option<f64>>>,
    polled: Mutex<Vec<String>>,
    balance_calls: AtomicUsize,
    profile_calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue poll answers; once exhausted every poll answers "pending".
    pub fn with_polls(self, polls: impl IntoIterator<Item = Poll>) -> Self {
        self.polls.lock().unwrap().extend(polls);
        self
    }

    /// Queue balance answers (`None` is a failed request); once exhausted
    /// every fetch answers 150.
    pub fn with_balances(self, balances: impl IntoIterator<Item = Option<f64>>) -> Self {
        self.balances.lock().unwrap().extend(balances);
        self
    }

    pub fn polled(&self) -> Vec<String> {
        self.polled.lock().unwrap().clone()
    }

    pub fn balance_calls(&self) -> usize {
        self.balance_calls.load(Ordering::SeqCst)
    }

    pub fn profile_calls(&self) -> usize {
        self.profile_calls.load(Ordering::SeqCst)
    }
}

impl StakingBackend for FakeBackend {
    async fn current_balance(&self) -> rstake::Result<ApiResponse<Balance>> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.balances.lock().unwrap().pop_front().unwrap_or(Some(150.0));
        match next {
            Some(balance) => Ok(ApiResponse::from_value(
                200,
                json!({"success": true, "message": "", "data": {"balance": balance}}),
            )),
            None => Err(RstakeError::Http {
                status: 503,
                message: "unavailable".into(),
            }),
        }
    }

    async fn profile(&self) -> rstake::Result<ApiResponse<Profile>> {
        self.profile_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ApiResponse::from_value(
            200,
            json!({
                "success": true,
                "message": "",
                "data": {
                    "puid": "u-1",
                    "name": "Ada",
                    "surname": "Lovelace",
                    "email": "ada@example.com",
                    "lang": "en",
                    "isVerified": true
                }
            }),
        ))
    }

    async fn invoice_status(&self, puid: &str) -> rstake::Result<ApiResponse<InvoiceStatus>> {
        self.polled.lock().unwrap().push(puid.to_string());
        let next = self
            .polls
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Poll::Status("pending"));
        let data = match next {
            Poll::Status(status) => json!({"puid": puid, "status": status}),
            Poll::NoStatus => json!({"puid": puid}),
            Poll::Fail => {
                return Err(RstakeError::Http {
                    status: 503,
                    message: "unavailable".into(),
                })
            }
            Poll::Hang => std::future::pending().await,
        };
        Ok(ApiResponse::from_value(
            200,
            json!({"success": true, "message": "", "data": data}),
        ))
    }
}

/// A token store on a fresh in-memory store, optionally logged in.
pub fn tokens(events: &EventBus, logged_in: bool) -> TokenStore {
    let store = Arc::new(MemoryStore::new());
    if logged_in {
        store.set("auth_token", "tok-123").unwrap();
    }
    TokenStore::new(store, "auth_token", events.clone())
}

pub fn pending(puid: &str) -> PendingInvoice {
    PendingInvoice {
        puid: puid.into(),
        address: "rDepositAddress".into(),
        memo: "42".into(),
        amount: 100.0,
        status: "pending".into(),
    }
}
