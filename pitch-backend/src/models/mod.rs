pub mod voice;

pub use voice::{TokenRequest, TokenResponse};
