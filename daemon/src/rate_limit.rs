use crate::config::RateLimitConfig;
use anyhow::Result;
use governor::{clock, state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;

/// Token bucket guarding the IPC socket against utterance floods, e.g. a
/// misbehaving ASR front end replaying the same line in a loop.
pub struct CommandRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, clock::DefaultClock>,
    enabled: bool,
}

impl CommandRateLimiter {
    /// Fails if either rate is zero.
    pub fn new(commands_per_second: u32, burst_capacity: u32, enabled: bool) -> Result<Self> {
        let per_second = NonZeroU32::new(commands_per_second)
            .ok_or_else(|| anyhow::anyhow!("commands_per_second must be non-zero"))?;
        let burst = NonZeroU32::new(burst_capacity)
            .ok_or_else(|| anyhow::anyhow!("burst_capacity must be non-zero"))?;

        Ok(Self {
            limiter: RateLimiter::direct(Quota::per_second(per_second).allow_burst(burst)),
            enabled,
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        Self::new(
            config.commands_per_second,
            config.burst_capacity,
            config.enabled,
        )
    }

    /// Non-blocking: true if the command may proceed now.
    pub fn check(&self) -> bool {
        !self.enabled || self.limiter.check().is_ok()
    }
}
