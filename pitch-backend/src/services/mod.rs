pub mod livekit;
pub mod metrics;

pub use livekit::{AccessGrant, LiveKitSigner, SigningError, TokenSigner, VideoGrant};
pub use self::metrics::{get_metrics, init_metrics, record_token_outcome};
