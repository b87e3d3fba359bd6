pub mod authz;
pub mod error;
pub mod lifecycle;
pub mod poll;
pub mod results;
pub mod snapshot;
pub mod voting;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::CoreError;
pub use lifecycle::PollState;
