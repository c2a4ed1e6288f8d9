use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_STORE_TIMEOUT_SECS: u64 = 30;
/// LiveKit's own SDK default.
const DEFAULT_TOKEN_TTL_SECS: u64 = 6 * 60 * 60;

/// Immutable process configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub common: core_config::Config,
    pub store: StoreConfig,
    pub livekit: LiveKitConfig,
    pub cors: CorsConfig,
}

/// Connection settings for the hosted data store (Supabase).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    /// Service-role secret. Bypasses row-level security; admin handles only.
    pub service_key: Secret<String>,
    /// Public key sent as `apikey` on caller-scoped requests.
    pub anon_key: Option<Secret<String>>,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct LiveKitConfig {
    pub api_key: Option<String>,
    pub api_secret: Option<Secret<String>>,
    pub url: Option<String>,
    pub token_ttl: Duration,
}

/// Key id and secret used to sign session access tokens.
#[derive(Debug, Clone)]
pub struct SigningCredentials {
    pub api_key: String,
    pub api_secret: Secret<String>,
}

#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl LiveKitConfig {
    /// Both halves of the signing pair, or `None` if either is missing.
    pub fn credentials(&self) -> Option<SigningCredentials> {
        match (&self.api_key, &self.api_secret) {
            (Some(api_key), Some(api_secret)) => Some(SigningCredentials {
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
            }),
            _ => None,
        }
    }

    /// Address handed to clients alongside a token; empty when unconfigured.
    pub fn public_url(&self) -> String {
        self.url.clone().unwrap_or_default()
    }
}

impl StoreConfig {
    /// Key sent as `apikey` by scoped handles. Falls back to the service key
    /// when no anon key is configured.
    pub fn scoped_api_key(&self) -> &Secret<String> {
        self.anon_key.as_ref().unwrap_or(&self.service_key)
    }
}

impl CorsConfig {
    pub fn allows_any(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        Self::from_lookup(common, |key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(common: core_config::Config, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| AppError::Configuration(format!("{} is required but not set", key)))
        };

        let store = StoreConfig {
            url: require("SUPABASE_URL")?.trim_end_matches('/').to_string(),
            service_key: Secret::new(require("SUPABASE_SERVICE_KEY")?),
            anon_key: get("SUPABASE_ANON_KEY").map(Secret::new),
            timeout: Duration::from_secs(parse_secs(
                "SUPABASE_TIMEOUT_SECS",
                get("SUPABASE_TIMEOUT_SECS"),
                DEFAULT_STORE_TIMEOUT_SECS,
            )?),
        };

        let livekit = LiveKitConfig {
            api_key: get("LIVEKIT_API_KEY"),
            api_secret: get("LIVEKIT_API_SECRET").map(Secret::new),
            url: get("LIVEKIT_URL"),
            token_ttl: Duration::from_secs(parse_secs(
                "LIVEKIT_TOKEN_TTL_SECS",
                get("LIVEKIT_TOKEN_TTL_SECS"),
                DEFAULT_TOKEN_TTL_SECS,
            )?),
        };

        let cors = CorsConfig {
            allowed_origins: get("CORS_ORIGIN")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string())
                .split(',')
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        };

        Ok(AppConfig {
            common,
            store,
            livekit,
            cors,
        })
    }
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<u64, AppError> {
    match value {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => Ok(secs),
            _ => Err(AppError::Configuration(format!(
                "{} must be a positive number of seconds",
                key
            ))),
        },
    }
}
