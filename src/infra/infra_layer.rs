// The infra module contains implementations of core traits.
// Each feature implementation goes in its own submodule.

#[path = "ai/mod.rs"]
pub mod ai;

#[path = "google/mod.rs"]
pub mod google;

#[path = "sessions/mod.rs"]
pub mod sessions;
