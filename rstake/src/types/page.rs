use serde::{Deserialize, Serialize};

/// Sort order for history listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Offset pagination parameters, rendered as `?offset=&limit=&order=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub offset: u32,
    pub limit: u32,
    pub order: SortOrder,
}

impl PageQuery {
    pub fn new(offset: u32, limit: u32) -> Self {
        Self {
            offset,
            limit,
            order: SortOrder::Desc,
        }
    }

    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        vec![
            ("offset", self.offset.to_string()),
            ("limit", self.limit.to_string()),
            ("order", self.order.as_str().to_string()),
        ]
    }
}

/// A page of rows plus the total row count on the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    #[serde(default)]
    pub count: u64,
    pub rows: Vec<T>,
}
