mod caller;
pub mod guard;

#[cfg(test)]
pub use caller::examples;
pub use caller::{Caller, BEARER_PREFIX};
pub use guard::{Access, Owned};
