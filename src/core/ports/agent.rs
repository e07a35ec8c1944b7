//! Reasoning service contract
//!
//! Checks that need judgment (e.g. log triage) talk to an external
//! reasoning service through this trait. The core never inspects the
//! transport; it only sees an async request that may fail.

use async_trait::async_trait;

/// An abstract reasoning service
#[async_trait]
pub trait AgentService: Send + Sync {
    /// One request/response round trip
    ///
    /// Implementations impose their own timeout and retry policy;
    /// callers treat any error as a transient external failure.
    async fn query(&self, prompt: &str) -> anyhow::Result<String>;
}
