//! Audio graph boundary
//!
//! The engine never renders audio itself. It asks a backend for a context,
//! creates nodes on it, wires them to the context's output sink and writes
//! parameters. Rendering happens elsewhere (a render call, a device callback)
//! and picks up parameter writes at its next render quantum.

use std::fmt;
use std::sync::Arc;

use crate::dsp::FilterStage;
use crate::error::Result;
use crate::signal::NoiseBuffer;

/// Identifier of a node inside one context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Platform-reported state of an audio context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextState {
    /// Not rendering; the platform may suspend on its own (autoplay, background)
    #[default]
    Suspended,
    /// Rendering
    Running,
    /// Released for good
    Closed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextState::Suspended => write!(f, "suspended"),
            ContextState::Running => write!(f, "running"),
            ContextState::Closed => write!(f, "closed"),
        }
    }
}

/// Result of asking a context to resume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeOutcome {
    /// Context is running
    Resumed,
    /// Platform wants a user interaction first
    Deferred,
}

/// Anything that lives in a context's graph
pub trait AudioNode {
    fn node_id(&self) -> NodeId;
}

/// Plays a noise buffer, optionally looping
pub trait BufferPlayer: AudioNode {
    fn set_loop(&mut self, looping: bool);

    fn is_looping(&self) -> bool;

    /// Begin playback. Fails if the player was started before.
    fn start(&mut self) -> Result<()>;

    /// Halt playback.
    ///
    /// Fails with `PlayerAlreadyStopped` when the player already halted,
    /// either from an earlier stop or by running off the end of its buffer.
    fn stop(&mut self) -> Result<()>;
}

/// Scalar gain stage. Values are not clamped.
pub trait GainControl: AudioNode {
    /// Jump to `value` at the next render quantum
    fn set_value(&mut self, value: f32);

    /// Move linearly to `value` over `duration_secs`
    fn ramp_to(&mut self, value: f32, duration_secs: f32);

    /// Last written target value
    fn value(&self) -> f32;
}

/// A spectral-shaping stage
pub trait FilterNode: AudioNode {
    fn stage(&self) -> FilterStage;
}

/// A live audio context: node factory plus output sink
pub trait AudioContext {
    type Player: BufferPlayer;
    type Filter: FilterNode;
    type Gain: GainControl;

    fn state(&self) -> ContextState;

    fn sample_rate(&self) -> u32;

    /// Ask the platform to start rendering.
    ///
    /// `user_initiated` is true when called while handling a user gesture,
    /// which autoplay policies require before audio may start.
    fn resume(&mut self, user_initiated: bool) -> Result<ResumeOutcome>;

    fn create_buffer_player(&mut self, buffer: Arc<NoiseBuffer>) -> Result<Self::Player>;

    fn create_filter(&mut self, stage: &FilterStage) -> Result<Self::Filter>;

    fn create_gain(&mut self, value: f32) -> Result<Self::Gain>;

    /// Route the output of `from` into `to`
    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()>;

    /// The default output sink
    fn destination(&self) -> NodeId;
}

/// Creates audio contexts
pub trait AudioBackend {
    type Context: AudioContext;

    /// Fails with `ContextUnavailable` when the platform has no audio
    fn create_context(&mut self) -> Result<Self::Context>;
}
