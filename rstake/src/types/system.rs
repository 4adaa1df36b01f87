use serde::{Deserialize, Serialize};

/// Response payload with no meaningful fields (`data: {}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
