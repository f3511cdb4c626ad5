//! Request DTOs for the demo API

use serde::Deserialize;

use crate::codec::RowQuery;
use crate::models::GREETING_TABLE;

/// Path parameters of `GET /helloget/:id`.
#[derive(Debug, Clone, Deserialize)]
pub struct GreetingPath {
    /// Raw id segment
    pub id: String,
}

impl GreetingPath {
    /// Validates the id and turns it into a row lookup.
    ///
    /// Returns an error message if the id is not a non-negative integer.
    pub fn to_query(&self) -> Result<RowQuery, String> {
        let id: u64 = self
            .id
            .trim()
            .parse()
            .map_err(|_| format!("Invalid id '{}': expected a non-negative integer", self.id))?;

        Ok(RowQuery::new(GREETING_TABLE, id))
    }
}
