//! Domain rows and the request/response bodies of the demo HTTP surface

pub mod greeting;
pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use greeting::{Greeting, GREETING_TABLE};
pub use requests::GreetingPath;
pub use responses::{ErrorResponse, GreetingResponse, HealthResponse, StatsResponse};
