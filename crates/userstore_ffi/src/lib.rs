//! Flutter-facing bindings for the user roster core.

pub mod api;
