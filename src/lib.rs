//! # Event Bar Core
//!
//! Closing reconciliation and stock tracking for bars run at events.
//!
//! ## Features
//!
//! - **Waiter closings**: commission on sales and on cashless sales, and the
//!   settlement owed between waiter and house
//! - **Cashier closings**: expected against counted cash, per mobile cashier
//!   and for fixed cashier groups sharing one change float
//! - **Closing history**: per-event records, search and CSV export
//! - **Stock**: products, inventory counts, movements, returns and the audit log
//! - **Back office abstraction**: trait-based seam with in-memory and HTTP
//!   (feature `http`) implementations
//!
//! ## Quick Start
//!
//! ```rust
//! use eventbar_core::{Cents, ClosingInput, ReconciliationCalculator, SettlementDirection};
//!
//! let calculator = ReconciliationCalculator::new();
//! let mut input = ClosingInput::with_gross_sales(Cents::from_major(1000));
//! input.stored_value = Cents::from_major(200);
//!
//! let result = calculator.waiter(&input);
//! assert_eq!(result.commission_total, Cents::from_major(72));
//! assert_eq!(result.direction, SettlementDirection::CollectFromWaiter);
//! assert_eq!(result.settlement, Cents::from_major(728));
//! ```

pub mod closing;
pub mod config;
pub mod export;
pub mod history;
pub mod reconciliation;
pub mod session;
pub mod stock;
pub mod traits;
pub mod types;
pub mod utils;

#[cfg(feature = "http")]
pub mod client;

// Re-export commonly used types
pub use closing::*;
pub use crate::config::EventBarConfig;
pub use history::{ClosingDetail, ClosingHistory, ClosingRecord};
pub use reconciliation::*;
pub use session::{Session, User};
pub use stock::*;
pub use traits::*;
pub use types::*;
pub use utils::MemoryBackOffice;

#[cfg(feature = "http")]
pub use client::HttpBackOffice;
