pub mod config;
pub mod discovery;
pub mod extract;
pub mod pipeline;
pub mod sink;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
