//! Utilities shared by the devlink hub server and client.

pub mod logger;
pub mod time;
