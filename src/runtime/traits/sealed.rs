// ABOUTME: Sealed trait pattern for runtime traits.
// ABOUTME: Only engine types in this crate implement the capability traits.

pub trait Sealed {}
