//! Flutter-facing bindings for the Pentangle core.

pub mod api;
