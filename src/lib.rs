// Library crate for mirage
// Re-exports modules for use in integration tests and external crates

pub mod events;
pub mod logging;
pub mod sync;
