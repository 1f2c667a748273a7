//! Playback Session
//!
//! The nodes of one noise-playing interval: a looping buffer player, the
//! filter stages for the noise type, and a gain stage, wired
//! player → stages → gain → sink. Built together, torn down together.

use std::fmt;
use std::sync::Arc;

use log::{debug, warn};
use uuid::Uuid;

use crate::dsp::{FilterChain, FilterStage, NoiseType};
use crate::error::{NoiseError, Result};
use crate::graph::{AudioContext, AudioNode, BufferPlayer, FilterNode, GainControl, NodeId};
use crate::signal::NoiseBuffer;

pub struct PlaybackSession<C: AudioContext> {
    id: Uuid,
    noise_type: NoiseType,
    buffer: Arc<NoiseBuffer>,
    player: C::Player,
    filters: Vec<C::Filter>,
    gain: C::Gain,
}

impl<C: AudioContext> PlaybackSession<C> {
    /// Create, wire and start all nodes for `chain`
    ///
    /// On error every node created so far is dropped with the partial
    /// session, so no half-built chain stays in the graph.
    pub fn build(
        context: &mut C,
        buffer: Arc<NoiseBuffer>,
        chain: &FilterChain,
        volume: f32,
    ) -> Result<Self> {
        let mut player = context.create_buffer_player(Arc::clone(&buffer))?;
        player.set_loop(true);

        let filters = chain
            .iter()
            .map(|stage| context.create_filter(stage))
            .collect::<Result<Vec<_>>>()?;
        let gain = context.create_gain(volume)?;

        let mut upstream = player.node_id();
        for filter in &filters {
            context.connect(upstream, filter.node_id())?;
            upstream = filter.node_id();
        }
        context.connect(upstream, gain.node_id())?;
        let destination = context.destination();
        context.connect(gain.node_id(), destination)?;

        player.start()?;

        let session = Self {
            id: Uuid::new_v4(),
            noise_type: chain.noise_type(),
            buffer,
            player,
            filters,
            gain,
        };
        debug!(
            "session {}: {} noise, {} filter stage(s), gain {:.2}",
            session.id,
            session.noise_type,
            session.filters.len(),
            volume
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn noise_type(&self) -> NoiseType {
        self.noise_type
    }

    pub fn buffer(&self) -> &NoiseBuffer {
        &self.buffer
    }

    pub fn filter_count(&self) -> usize {
        self.filters.len()
    }

    /// Stages of the live filter nodes, in chain order
    pub fn filter_stages(&self) -> Vec<FilterStage> {
        self.filters.iter().map(|f| f.stage()).collect()
    }

    /// Current value of the live gain node
    pub fn gain_value(&self) -> f32 {
        self.gain.value()
    }

    /// Ids of every node in the session, player first
    pub fn node_ids(&self) -> Vec<NodeId> {
        std::iter::once(self.player.node_id())
            .chain(self.filters.iter().map(|f| f.node_id()))
            .chain(std::iter::once(self.gain.node_id()))
            .collect()
    }

    /// Write the gain, stepping or ramping over `ramp_secs`
    pub fn set_volume(&mut self, volume: f32, ramp_secs: Option<f32>) {
        match ramp_secs {
            Some(secs) => self.gain.ramp_to(volume, secs),
            None => self.gain.set_value(volume),
        }
    }

    /// Stop the player and release every node
    pub fn teardown(mut self) {
        match self.player.stop() {
            Ok(()) => {}
            Err(NoiseError::PlayerAlreadyStopped { .. }) => {
                debug!("session {}: player already stopped", self.id);
            }
            Err(e) => warn!("session {}: stopping player failed: {e}", self.id),
        }
    }
}

impl<C: AudioContext> fmt::Debug for PlaybackSession<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("noise_type", &self.noise_type)
            .field("filters", &self.filter_stages())
            .field("gain", &self.gain.value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{AutoplayPolicy, SoftwareContext};
    use crate::signal::generate_white_noise;

    fn session(context: &mut SoftwareContext, noise: NoiseType) -> PlaybackSession<SoftwareContext> {
        let buffer = generate_white_noise(context.sample_rate(), 1.0).unwrap();
        let chain = FilterChain::for_noise_type(noise);
        PlaybackSession::build(context, Arc::new(buffer), &chain, 0.5).unwrap()
    }

    #[test]
    fn test_build_wires_every_stage() {
        let mut context = SoftwareContext::new(8000, AutoplayPolicy::Allowed, false).unwrap();
        let session = session(&mut context, NoiseType::Brown);

        assert_eq!(session.filter_count(), 2);
        assert_eq!(session.node_ids().len(), 4);
        assert_eq!(context.node_count(), 4);
        assert_eq!(session.gain_value(), 0.5);
    }

    #[test]
    fn test_teardown_after_player_already_stopped() {
        let mut context = SoftwareContext::new(8000, AutoplayPolicy::Allowed, false).unwrap();
        let mut session = session(&mut context, NoiseType::Pink);

        session.player.stop().unwrap();
        assert!(matches!(
            session.player.stop(),
            Err(NoiseError::PlayerAlreadyStopped { .. })
        ));

        session.teardown();
        assert_eq!(context.node_count(), 0);
        assert!(context.sink_inputs().is_empty());
    }
}
