use serde::{Deserialize, Serialize};

/// Primary key of the one and only counter row.
pub const COUNTER_ID: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorCount {
    pub id: i32,
    pub count: i64,
}
