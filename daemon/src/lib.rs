pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod fingerprint;
pub mod intent;
pub mod rate_limit;
pub mod router;
pub mod server;
pub mod state;

pub use dispatch::ActionDispatcher;
pub use fingerprint::VoiceFingerprint;
pub use intent::IntentResolver;
pub use rate_limit::CommandRateLimiter;
pub use router::CommandRouter;
