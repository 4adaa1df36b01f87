pub mod store;
pub mod watcher;

pub use store::{PendingInvoiceStore, PENDING_INVOICE_KEY};
pub use watcher::{
    DepositModal, DepositWait, InvoiceWatcher, NoDepositModal, WatcherState, DEPOSIT_CONFIRMED,
};
