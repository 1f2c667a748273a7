//! Engine Tests
//!
//! Playback state machine: start/stop/change_type/set_volume on the
//! software backend.

use focus_noise::backend::{AutoplayPolicy, SoftwareBackend, MIN_SAMPLE_RATE};
use focus_noise::dsp::FilterStage;
use focus_noise::graph::ContextState;
use focus_noise::{EngineConfig, NoiseEngine, NoiseType};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn engine() -> NoiseEngine<SoftwareBackend> {
    NoiseEngine::new(SoftwareBackend::new(48000))
}

// === Volume ===

#[test_case(0.0 ; "silent")]
#[test_case(0.35 ; "quiet")]
#[test_case(0.8 ; "loud")]
#[test_case(1.0 ; "full")]
fn test_set_volume_never_changes_playing_state(volume: f32) {
    let mut engine = engine();
    engine.set_volume(volume);
    assert!(!engine.is_playing());

    engine.start(NoiseType::Pink, 0.5).unwrap();
    engine.set_volume(volume);
    assert!(engine.is_playing());
    assert_eq!(engine.session().unwrap().gain_value(), volume);
}

#[test]
fn test_set_volume_while_idle_is_stored() {
    let mut engine = engine();
    engine.set_volume(0.3);
    assert_eq!(engine.volume(), 0.3);
    assert!(engine.context().is_none(), "idle volume changes must not open audio");
}

#[test]
fn test_set_volume_clamps_and_ignores_nan() {
    let mut engine = engine();
    engine.start(NoiseType::White, 0.5).unwrap();

    engine.set_volume(1.7);
    assert_eq!(engine.volume(), 1.0);
    engine.set_volume(-0.2);
    assert_eq!(engine.volume(), 0.0);
    engine.set_volume(f32::NAN);
    assert_eq!(engine.volume(), 0.0);
    assert_eq!(engine.session().unwrap().gain_value(), 0.0);
}

// === Start / Stop ===

#[test]
fn test_start_while_playing_keeps_original_session() {
    let mut engine = engine();
    engine.start(NoiseType::Pink, 0.5).unwrap();
    let first = engine.session().unwrap().id();

    engine.start(NoiseType::Brown, 0.9).unwrap();

    let session = engine.session().unwrap();
    assert_eq!(session.id(), first);
    assert_eq!(session.noise_type(), NoiseType::Pink);
    assert_eq!(session.filter_count(), 1);
    assert_eq!(engine.noise_type(), NoiseType::Pink);
    assert_eq!(engine.volume(), 0.5);
}

#[test]
fn test_stop_twice_is_harmless() {
    let mut engine = engine();
    engine.start(NoiseType::Brown, 0.5).unwrap();
    engine.stop();
    engine.stop();
    assert!(!engine.is_playing());

    // Never started
    let mut idle = self::engine();
    idle.stop();
    assert!(!idle.is_playing());
}

#[test]
fn test_stop_releases_every_node() {
    let mut engine = engine();
    engine.start(NoiseType::Brown, 0.5).unwrap();
    assert_eq!(engine.context().unwrap().node_count(), 4);

    engine.stop();
    let context = engine.context().unwrap();
    assert_eq!(context.node_count(), 0);
    assert!(context.sink_inputs().is_empty());
    assert!(context.render_frames(512).iter().all(|&s| s == 0.0));
}

#[test]
fn test_context_created_lazily_once() {
    let mut engine = engine();
    assert!(engine.context().is_none());
    assert_eq!(engine.backend().contexts_created(), 0);

    engine.start(NoiseType::White, 0.5).unwrap();
    engine.stop();
    engine.start(NoiseType::Pink, 0.5).unwrap();

    assert_eq!(engine.backend().contexts_created(), 1);
}

#[test]
fn test_context_creation_failure_propagates() {
    let mut engine = NoiseEngine::new(SoftwareBackend::new(0));
    let err = engine.start(NoiseType::Pink, 0.5).unwrap_err();
    assert_eq!(err.error_code(), "CONTEXT_UNAVAILABLE");
    assert!(!engine.is_playing());
    assert!(engine.session().is_none());
}

#[test_case(NoiseType::Pink ; "pink")]
#[test_case(NoiseType::Brown ; "brown")]
fn test_start_below_min_sample_rate_fails_cleanly(noise: NoiseType) {
    let mut engine = NoiseEngine::new(SoftwareBackend::new(3));
    let err = engine.start(noise, 0.5).unwrap_err();
    assert_eq!(err.error_code(), "CONTEXT_UNAVAILABLE");
    assert!(!engine.is_playing());
}

#[test]
fn test_filters_stay_finite_at_min_sample_rate() {
    let mut engine = NoiseEngine::new(SoftwareBackend::new(MIN_SAMPLE_RATE));
    engine.start(NoiseType::Pink, 0.5).unwrap();
    let samples = engine.context().unwrap().render_frames(4000);
    assert!(samples.iter().all(|s| s.is_finite()));
}

#[test]
fn test_oversized_buffer_config_fails_start() {
    let config = EngineConfig {
        buffer_seconds: 1e300,
        ..Default::default()
    };
    assert!(config.validate().is_err());

    let mut engine = NoiseEngine::with_config(SoftwareBackend::new(48000), config);
    let err = engine.start(NoiseType::White, 0.5).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_BUFFER");
    assert!(!engine.is_playing());
    assert_eq!(engine.context().unwrap().node_count(), 0);
}

#[test]
fn test_start_resumes_suspended_context() {
    let mut engine = NoiseEngine::new(SoftwareBackend::new(48000).start_suspended());
    engine.start(NoiseType::Pink, 0.5).unwrap();
    assert_eq!(engine.context_state(), Some(ContextState::Running));
    assert!(!engine.resume_pending());
}

#[test]
fn test_blocked_autoplay_defers_resume() {
    let backend = SoftwareBackend::new(48000).with_autoplay(AutoplayPolicy::RequiresGesture);
    let mut engine = NoiseEngine::new(backend);

    engine.start(NoiseType::Pink, 0.5).unwrap();
    assert!(engine.is_playing());
    assert!(engine.resume_pending());
    assert_eq!(engine.context_state(), Some(ContextState::Suspended));
}

#[test]
fn test_config_buffer_length_used() {
    let config = EngineConfig {
        buffer_seconds: 1.5,
        ..Default::default()
    };
    let mut engine = NoiseEngine::with_config(SoftwareBackend::new(16000), config);
    engine.start(NoiseType::White, 0.5).unwrap();
    assert_eq!(engine.session().unwrap().buffer().len(), 24000);
}

// === Change Type ===

#[test]
fn test_change_type_brown_to_white_rebuilds_chain() {
    let mut engine = engine();
    engine.start(NoiseType::Brown, 0.6).unwrap();
    let brown = engine.session().unwrap().id();
    assert_eq!(engine.session().unwrap().filter_count(), 2);

    engine.change_type(NoiseType::White).unwrap();

    assert!(engine.is_playing());
    let session = engine.session().unwrap();
    assert_ne!(session.id(), brown);
    assert_eq!(session.filter_count(), 0);
    assert_eq!(session.gain_value(), 0.6);
    assert_eq!(engine.noise_type(), NoiseType::White);
    // Player and gain only; the brown filters are gone
    assert_eq!(engine.context().unwrap().node_count(), 2);
}

#[test]
fn test_change_type_keeps_volume_set_while_playing() {
    let mut engine = engine();
    engine.start(NoiseType::White, 0.6).unwrap();
    engine.set_volume(0.25);
    engine.change_type(NoiseType::Brown).unwrap();
    assert_eq!(engine.session().unwrap().gain_value(), 0.25);
}

#[test]
fn test_change_type_while_idle_is_noop() {
    let mut engine = engine();
    engine.change_type(NoiseType::Brown).unwrap();
    assert!(!engine.is_playing());
    assert_eq!(engine.noise_type(), NoiseType::Pink);
    assert!(engine.context().is_none());
}

// === End-to-end ===

#[test]
fn test_pink_session_end_to_end() {
    let mut engine = engine();

    engine.start(NoiseType::Pink, 0.5).unwrap();
    assert!(engine.is_playing());
    let session = engine.session().unwrap();
    assert_eq!(session.filter_stages(), vec![FilterStage::high_pass(100.0, 0.707)]);
    assert_eq!(session.gain_value(), 0.5);
    let first = session.id();

    engine.set_volume(0.2);
    assert_eq!(engine.session().unwrap().gain_value(), 0.2);
    assert!(engine.is_playing());

    engine.stop();
    assert!(!engine.is_playing());
    assert!(engine.session().is_none());
    assert_eq!(engine.context().unwrap().node_count(), 0);

    engine.start(NoiseType::Pink, 0.5).unwrap();
    assert!(engine.is_playing());
    assert_ne!(engine.session().unwrap().id(), first);
}

#[test]
fn test_volume_ramp_when_configured() {
    let config = EngineConfig {
        volume_ramp_ms: 20,
        ..Default::default()
    };
    let mut engine = NoiseEngine::with_config(SoftwareBackend::new(48000), config);
    engine.start(NoiseType::White, 1.0).unwrap();

    engine.set_volume(0.0);
    let context = engine.context().unwrap();
    // 20 ms at 48 kHz is 960 frames: the first quantum is still audible
    let head = context.render_frames(128);
    assert!(head.iter().any(|s| s.abs() > 0.1));
    let tail = context.render_frames(2048);
    assert!(tail[960..].iter().all(|&s| s == 0.0));
}

#[test]
fn test_step_volume_by_default() {
    let mut engine = engine();
    engine.start(NoiseType::White, 1.0).unwrap();
    engine.set_volume(0.0);
    let out = engine.context().unwrap().render_frames(256);
    assert!(out.iter().all(|&s| s == 0.0));
}
