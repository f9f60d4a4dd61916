//! In-memory counter source and fixture scenarios for tests and non-Windows hosts.

mod scenarios;
mod source;

pub use source::MockSource;
