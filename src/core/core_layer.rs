// The core module contains all business logic.
// Each feature gets its own submodule; traits here are implemented in infra.

#[path = "auth/mod.rs"]
pub mod auth;

#[path = "classroom/attachment_service.rs"]
pub mod classroom;

#[path = "grading/mod.rs"]
pub mod grading;
