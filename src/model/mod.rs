//! Pure data structures: the [`Order`] aggregate, its status graph, and directory entries.

pub mod order;
pub mod partner;
pub mod status;

pub use order::*;
pub use partner::*;
pub use status::*;

/// Currency amounts. Exact decimal arithmetic, two fractional digits by convention.
pub type Money = rust_decimal::Decimal;
