//! In-tree adapter backends.
//!
//! Each backend pairs a [`CompliantNamespace`](crate::contract::CompliantNamespace)
//! with a [`CompliantFrame`](crate::contract::CompliantFrame) and registers
//! itself in the plugin manifest. Out-of-tree backends do the same from
//! their own crates.

pub mod arrow;
