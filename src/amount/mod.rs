//! Integer amount arithmetic
//!
//! All token math in the engine is integer-only. The 18-decimal fixed-point
//! values used on-chain cannot be represented exactly in floating point, so
//! every scaling, slippage bound, and clamp here stays in `U256`.

pub mod bounds;
pub mod scale;

pub use bounds::{clamp_with_slack, deadline, min_out, paired_amount};
pub use scale::scale;
