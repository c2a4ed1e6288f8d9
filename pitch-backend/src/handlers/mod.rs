pub mod health;
pub mod metrics;
pub mod voice;

pub use health::{health_check, readiness_check};
pub use voice::issue_token;
