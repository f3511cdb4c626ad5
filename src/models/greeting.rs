//! Greeting row served by `GET /helloget/:id`

use serde::{Deserialize, Serialize};

/// Table the greeting rows live in.
pub const GREETING_TABLE: &str = "hello";

/// One row of the `hello` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Greeting {
    pub id: u64,
    pub message: String,
}

impl Greeting {
    pub fn new(id: u64, message: impl Into<String>) -> Self {
        Self {
            id,
            message: message.into(),
        }
    }
}
