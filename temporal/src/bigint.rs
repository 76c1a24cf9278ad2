//! Arbitrary-precision signed integer, re-exported from `num-bigint` under
//! the workspace's own name so downstream crates depend on `solid_temporal`
//! for every numeric primitive rather than reaching for `num-bigint`
//! directly.

pub use num_bigint::BigInt;
pub use num_bigint::Sign;
