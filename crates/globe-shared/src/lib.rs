//! # Globe Shared
//!
//! Wire types shared by the API server and the command-line tools.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
