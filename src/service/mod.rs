//! Use cases on top of the store traits. Every function takes the store as a
//! generic parameter so the same code runs against MySQL and the in-memory
//! test store.

pub mod attendance;
pub mod billing;
pub mod menu;
pub mod session;
pub mod user;

#[cfg(test)]
pub mod fixtures;
