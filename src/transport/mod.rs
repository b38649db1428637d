//! # Transport Providers Module
//!
//! This module contains the [`Transport`] implementations provided by the
//! crate. Only the [`reqwest`]-backed transport exists today; bring your own
//! by implementing the trait from [`crate::core`].
//!
//! [`Transport`]: crate::core::Transport
//! [`reqwest`]: https://docs.rs/reqwest

pub use self::reqwest::TransportReqwest;
pub mod reqwest;
