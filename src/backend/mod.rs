//! Audio graph backends
//!
//! - `software`: in-process renderer, used for offline rendering and tests
//! - `device`: software graph driven by the default output device
//!   (requires the `device` feature)

#[cfg(feature = "device")]
mod device;
mod software;

#[cfg(feature = "device")]
pub use device::{list_output_devices, DeviceBackend, DeviceContext};
pub use software::{
    AutoplayPolicy, SoftwareBackend, SoftwareContext, SoftwareFilter, SoftwareGain,
    SoftwarePlayer, SoftwareRenderer, MAX_SAMPLE_RATE, MIN_SAMPLE_RATE, RENDER_QUANTUM,
};
