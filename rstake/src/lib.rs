pub mod auth;
pub mod backend;
pub mod balance;
pub mod client;
pub mod config;
pub mod contract;
pub mod error;
pub mod events;
pub mod invoice;
pub mod rest;
pub mod session;
pub mod storage;
pub mod types;
pub mod validation;

// ---- Top-level re-exports for ergonomic usage ----

// Client + config
pub use client::{Dashboard, PurchaseOutcome, StakingClient};
pub use config::ClientConfig;
pub use error::{Result, RstakeError, ValidationError};

// REST client + backend seam
pub use backend::StakingBackend;
pub use rest::StakingHttpClient;

// Client-side state
pub use auth::{LoginOutcome, TokenStore};
pub use balance::{abbreviate_balance, BalanceState, BalanceTracker, BalanceView};
pub use events::{ClientEvent, EventBus, EventSubscription, Notification, NotificationLevel};
pub use invoice::{DepositModal, DepositWait, InvoiceWatcher, PendingInvoiceStore, WatcherState};
pub use session::{ProfileSession, ProfileState};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

// Validation
pub use validation::PurchaseDecision;

// Envelope + pagination
pub use types::{ApiResponse, Page, PageQuery, SortOrder};

// Account types
pub use types::{ActiveSession, Balance, Profile, TwoFactorSecret};

// Contracts
pub use types::{Contract, ContractStatistic, ContractType};

// Deposits + withdrawals
pub use types::{Invoice, PendingInvoice, WithdrawHistoryItem, WithdrawStatus};

// Ledger
pub use types::InnerTransaction;
