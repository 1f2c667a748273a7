//! Noise Engine
//!
//! Owns the live audio graph and the playback state machine:
//!
//! ```text
//!            start(type, vol)
//!   Idle ───────────────────────► Playing ──┐ change_type(t): stop + start(t, vol)
//!    ▲                              │  ▲    │
//!    └──────── stop() ──────────────┘  └────┘ set_volume(v): gain write
//! ```
//!
//! The playing flag is the presence of a [`PlaybackSession`], so a session
//! exists exactly while the engine is playing.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use log::{debug, info, warn};

use super::{EngineConfig, PlaybackSession};
use crate::dsp::{FilterChain, NoiseType};
use crate::error::{NoiseError, Result};
use crate::graph::{AudioBackend, AudioContext, ContextState, ResumeOutcome};
use crate::lifecycle::{LifecycleEvent, LifecycleSource, Subscription, Visibility};
use crate::signal::generate_white_noise;

/// Background-noise player for a focus timer
///
/// One engine per host. The audio context is created on the first
/// [`start`](Self::start) and lives as long as the engine.
///
/// # Example
/// ```
/// use focus_noise::backend::SoftwareBackend;
/// use focus_noise::{NoiseEngine, NoiseType};
///
/// let mut engine = NoiseEngine::new(SoftwareBackend::new(48000));
/// engine.start(NoiseType::Pink, 0.5).unwrap();
/// assert!(engine.is_playing());
///
/// engine.set_volume(0.2);
/// engine.stop();
/// assert!(!engine.is_playing());
/// ```
pub struct NoiseEngine<B: AudioBackend> {
    backend: B,
    config: EngineConfig,
    context: Option<B::Context>,
    noise_type: NoiseType,
    volume: f32,
    session: Option<PlaybackSession<B::Context>>,
    resume_pending: bool,
    lifecycle: Option<Subscription>,
}

impl<B: AudioBackend> NoiseEngine<B> {
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, EngineConfig::default())
    }

    pub fn with_config(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            noise_type: config.default_noise_type,
            volume: config.default_volume,
            config,
            context: None,
            session: None,
            resume_pending: false,
            lifecycle: None,
        }
    }

    // ========================================================================
    // Playback Controls
    // ========================================================================

    /// Start playing `noise_type` at `volume`
    ///
    /// No-op while already playing, whatever the arguments.
    ///
    /// # Errors
    /// Context creation failures propagate: the host must check that audio
    /// is available before offering playback.
    pub fn start(&mut self, noise_type: NoiseType, volume: f32) -> Result<()> {
        if self.is_playing() {
            debug!("start({noise_type}) ignored: already playing {}", self.noise_type);
            return Ok(());
        }
        let volume = sanitize_volume(volume).unwrap_or(self.volume);

        if self.context.is_none() {
            self.context = Some(self.backend.create_context()?);
            debug!("audio context created");
        }
        self.resume_context(false)?;

        let Some(context) = self.context.as_mut() else {
            return Err(NoiseError::ContextUnavailable {
                reason: "audio context was not created".to_string(),
            });
        };
        let buffer = generate_white_noise(context.sample_rate(), self.config.buffer_seconds)?;
        let chain = FilterChain::for_noise_type(noise_type);
        let session = PlaybackSession::build(context, Arc::new(buffer), &chain, volume)?;

        info!("playing {noise_type} noise at volume {volume:.2} (session {})", session.id());
        self.noise_type = noise_type;
        self.volume = volume;
        self.session = Some(session);
        Ok(())
    }

    /// Stop playing and release the session. Safe to call repeatedly.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            debug!("stop() ignored: not playing");
            return;
        };
        let id = session.id();
        session.teardown();
        info!("stopped (session {id})");
    }

    /// Rebuild the session for `noise_type`, keeping the volume
    ///
    /// No-op while idle. Always a full rebuild, never an in-place swap.
    pub fn change_type(&mut self, noise_type: NoiseType) -> Result<()> {
        if !self.is_playing() {
            debug!("change_type({noise_type}) ignored: not playing");
            return Ok(());
        }
        self.stop();
        self.start(noise_type, self.volume)
    }

    /// Set the volume, clamped to [0, 1]
    ///
    /// Always stored for the next start. While playing the live gain steps
    /// to the new value, or ramps when `volume_ramp_ms` is configured.
    /// Non-finite values are ignored.
    pub fn set_volume(&mut self, volume: f32) {
        let Some(volume) = sanitize_volume(volume) else {
            warn!("set_volume({volume}) ignored: not a finite number");
            return;
        };
        self.volume = volume;
        if let Some(session) = self.session.as_mut() {
            session.set_volume(volume, self.config.volume_ramp_secs());
        }
    }

    pub fn is_playing(&self) -> bool {
        self.session.is_some()
    }

    // ========================================================================
    // Host Lifecycle
    // ========================================================================

    /// React to a host lifecycle event
    ///
    /// - hidden: nothing, noise keeps playing in the background
    /// - visible while playing: resume the context if the platform suspended it
    /// - user gesture: retry a resume the autoplay policy deferred
    /// - before unload: stop
    pub fn handle_lifecycle(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::VisibilityChanged(Visibility::Hidden) => {
                debug!("host hidden: playback continues");
            }
            LifecycleEvent::VisibilityChanged(Visibility::Visible) => {
                if self.is_playing() && self.context_state() == Some(ContextState::Suspended) {
                    debug!("host visible with suspended context: resuming");
                    if let Err(e) = self.resume_context(false) {
                        warn!("resume after becoming visible failed: {e}");
                    }
                }
            }
            LifecycleEvent::UserGesture => {
                if self.resume_pending {
                    if let Err(e) = self.resume_context(true) {
                        warn!("resume on user gesture failed: {e}");
                    }
                }
            }
            LifecycleEvent::BeforeUnload => self.stop(),
        }
    }

    /// Subscribe `engine` to `source`, once
    ///
    /// Returns false if the engine already has a lifecycle subscription, so
    /// repeated calls never make a listener fire twice.
    pub fn attach_lifecycle(engine: &Rc<RefCell<Self>>, source: Rc<dyn LifecycleSource>) -> bool
    where
        B: 'static,
    {
        if engine.borrow().lifecycle.is_some() {
            debug!("lifecycle listeners already registered");
            return false;
        }

        let weak = Rc::downgrade(engine);
        let id = source.subscribe(Box::new(move |event| {
            let Some(engine) = weak.upgrade() else {
                return;
            };
            match engine.try_borrow_mut() {
                Ok(mut engine) => engine.handle_lifecycle(event),
                Err(_) => warn!("lifecycle event {event} dropped: engine busy"),
            };
        }));
        engine.borrow_mut().lifecycle = Some(Subscription::new(id, &source));
        debug!("lifecycle listeners registered");
        true
    }

    /// Drop the lifecycle subscription. Returns false if there was none.
    pub fn detach_lifecycle(&mut self) -> bool {
        self.lifecycle.take().is_some()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Active noise type, or the one the next start defaults to
    pub fn noise_type(&self) -> NoiseType {
        self.noise_type
    }

    /// Stored volume
    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn session(&self) -> Option<&PlaybackSession<B::Context>> {
        self.session.as_ref()
    }

    /// The audio context, once the first start created it
    pub fn context(&self) -> Option<&B::Context> {
        self.context.as_ref()
    }

    pub fn context_state(&self) -> Option<ContextState> {
        self.context.as_ref().map(|c| c.state())
    }

    /// True while a resume waits for a user gesture
    pub fn resume_pending(&self) -> bool {
        self.resume_pending
    }

    pub fn is_lifecycle_attached(&self) -> bool {
        self.lifecycle.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn resume_context(&mut self, user_initiated: bool) -> Result<()> {
        let Some(context) = self.context.as_mut() else {
            return Ok(());
        };
        if context.state() != ContextState::Suspended {
            self.resume_pending = false;
            return Ok(());
        }
        match context.resume(user_initiated)? {
            ResumeOutcome::Resumed => {
                if self.resume_pending {
                    info!("audio context resumed");
                }
                self.resume_pending = false;
            }
            ResumeOutcome::Deferred => {
                debug!("audio context resume deferred until the next user gesture");
                self.resume_pending = true;
            }
        }
        Ok(())
    }
}

impl<B: AudioBackend> Drop for NoiseEngine<B> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn sanitize_volume(volume: f32) -> Option<f32> {
    volume.is_finite().then(|| volume.clamp(0.0, 1.0))
}
