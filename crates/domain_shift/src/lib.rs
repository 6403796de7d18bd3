//! Shift Domain - Work Session Lifecycle
//!
//! A shift is a bounded work session bracketed by odometer readings. Closed
//! shifts are the distance denominator of the cost-per-kilometer metric.
//!
//! # Rules
//!
//! - At most one open shift per user
//! - `open -> closed`, never reopened
//! - `totalKm = odometerEnd - odometerStart`, computed at close
//! - `deadKm = totalKm - tripKm`, signed, one decimal place
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_shift::ShiftManager;
//!
//! let manager = ShiftManager::new(store);
//! manager.start(user_id, dec!(1000)).await?;
//! let closed = manager.close(user_id, dec!(1120)).await?;
//! assert_eq!(closed.total_km, Some(dec!(120)));
//! ```

pub mod shift;
pub mod manager;
pub mod error;

pub use shift::{Shift, ShiftState};
pub use manager::ShiftManager;
pub use error::ShiftError;
