mod account;
mod auth;
mod contract;
mod envelope;
mod invoice;
mod page;
mod system;
mod transaction;
mod withdrawal;

pub use account::*;
pub use auth::*;
pub use contract::*;
pub use envelope::*;
pub use invoice::*;
pub use page::*;
pub use system::*;
pub use transaction::*;
pub use withdrawal::*;

use serde::{Deserialize, Deserializer};

/// Read JSON `null` as the field's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
