//! Address and overlay allocation module.
//!
//! This module assigns per-link subnets and per-interface addresses, and for
//! VXLAN topologies the VTEP loopbacks and VNI sets the synthesizer consumes.

pub mod allocator;
pub mod overlay;

// Re-export commonly used types
pub use allocator::{assign_addresses, AllocationError, AllocationReport};
pub use overlay::{is_overlay_enabled, vtep_devices};
