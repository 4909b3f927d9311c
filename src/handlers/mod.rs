// ABOUTME: The handler plugins: local config, compose, Rancher, UpCloud and null.
// ABOUTME: Each submodule exposes a Builder registered under its BUILDER_ID.

pub mod compose;
pub mod local;
pub mod null;
pub mod rancher;
pub mod upcloud;
