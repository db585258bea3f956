use serde::{Deserialize, Serialize};

/// A location mode such as `Day` or `Night`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    pub id: i64,
    pub name: String,
    pub active: bool,
}
