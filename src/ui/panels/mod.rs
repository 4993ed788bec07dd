//! Fixed panels around the application table.

pub mod bottom;
pub mod details;
pub mod top;
