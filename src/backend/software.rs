//! In-process audio graph
//!
//! Implements the graph traits with a small pull renderer. Nodes live in a
//! graph shared between the context, the node handles, and whoever renders
//! (a test, the WAV exporter, a device callback). Dropping a node handle
//! removes the node from the graph.
//!
//! Rendering runs in quanta of [`RENDER_QUANTUM`] frames under the graph
//! lock, so a parameter write made between two render calls lands on a
//! quantum boundary.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::dsp::{Biquad, FilterStage};
use crate::error::{NoiseError, Result};
use crate::graph::{
    AudioBackend, AudioContext, AudioNode, BufferPlayer, ContextState, FilterNode, GainControl,
    NodeId, ResumeOutcome,
};
use crate::signal::NoiseBuffer;

/// Frames processed per render step
pub const RENDER_QUANTUM: usize = 128;

/// Lowest sample rate a software context accepts
pub const MIN_SAMPLE_RATE: u32 = 1000;

/// Highest sample rate a software context accepts
pub const MAX_SAMPLE_RATE: u32 = 384_000;

const DESTINATION: NodeId = NodeId(0);

/// Whether the platform lets audio start without a user gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoplayPolicy {
    #[default]
    Allowed,
    /// Contexts start suspended and only a user-initiated resume runs them
    RequiresGesture,
}

// ============================================================================
// Graph
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlayState {
    Idle,
    Playing,
    Stopped,
}

struct PlayerNode {
    buffer: Arc<NoiseBuffer>,
    looping: bool,
    position: usize,
    state: PlayState,
}

impl PlayerNode {
    fn render(&mut self, out: &mut [f32]) {
        let samples = self.buffer.samples();
        for sample in out.iter_mut() {
            if self.state != PlayState::Playing {
                *sample = 0.0;
                continue;
            }
            if self.position >= samples.len() {
                if self.looping && !samples.is_empty() {
                    self.position = 0;
                } else {
                    // Ran off the end: a later stop() reports already stopped
                    self.state = PlayState::Stopped;
                    *sample = 0.0;
                    continue;
                }
            }
            *sample = samples[self.position];
            self.position += 1;
        }
    }
}

struct GainNode {
    current: f32,
    target: f32,
    step: f32,
    remaining: usize,
}

impl GainNode {
    fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    fn set(&mut self, value: f32) {
        self.current = value;
        self.target = value;
        self.step = 0.0;
        self.remaining = 0;
    }

    fn ramp(&mut self, value: f32, frames: usize) {
        if frames == 0 {
            self.set(value);
            return;
        }
        self.target = value;
        self.remaining = frames;
        self.step = (value - self.current) / frames as f32;
    }

    fn render(&mut self, block: &mut [f32]) {
        for sample in block.iter_mut() {
            if self.remaining > 0 {
                self.current += self.step;
                self.remaining -= 1;
                if self.remaining == 0 {
                    self.current = self.target;
                }
            }
            *sample *= self.current;
        }
    }
}

enum NodeKind {
    Player(PlayerNode),
    Filter(Biquad),
    Gain(GainNode),
}

struct Node {
    kind: NodeKind,
    inputs: Vec<NodeId>,
    output: Vec<f32>,
}

struct Graph {
    sample_rate: u32,
    state: ContextState,
    autoplay: AutoplayPolicy,
    activated: bool,
    next_id: u64,
    nodes: BTreeMap<NodeId, Node>,
    sink_inputs: Vec<NodeId>,
    order: Option<Vec<NodeId>>,
    scratch: Vec<f32>,
    frames_rendered: u64,
}

impl Graph {
    fn add_node(&mut self, kind: NodeKind) -> NodeId {
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(
            id,
            Node {
                kind,
                inputs: Vec::new(),
                output: vec![0.0; RENDER_QUANTUM],
            },
        );
        trace!("graph: added node {id}");
        id
    }

    fn remove_node(&mut self, id: NodeId) {
        if self.nodes.remove(&id).is_none() {
            return;
        }
        for node in self.nodes.values_mut() {
            node.inputs.retain(|&input| input != id);
        }
        self.sink_inputs.retain(|&input| input != id);
        self.order = None;
        trace!("graph: removed node {id}");
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes
            .get_mut(&id)
            .ok_or(NoiseError::UnknownNode { node: id.0 })
    }

    fn player_mut(&mut self, id: NodeId) -> Result<&mut PlayerNode> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Player(player) => Ok(player),
            _ => Err(NoiseError::UnknownNode { node: id.0 }),
        }
    }

    fn gain_mut(&mut self, id: NodeId) -> Result<&mut GainNode> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Gain(gain) => Ok(gain),
            _ => Err(NoiseError::UnknownNode { node: id.0 }),
        }
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        if !self.nodes.contains_key(&from) {
            return Err(NoiseError::UnknownNode { node: from.0 });
        }
        let inputs = if to == DESTINATION {
            &mut self.sink_inputs
        } else {
            &mut self.node_mut(to)?.inputs
        };
        if !inputs.contains(&from) {
            inputs.push(from);
        }
        self.order = None;
        Ok(())
    }

    /// Nodes feeding the sink, inputs before consumers
    fn processing_order(&self) -> Vec<NodeId> {
        fn visit(graph: &Graph, id: NodeId, seen: &mut HashSet<NodeId>, order: &mut Vec<NodeId>) {
            if !seen.insert(id) {
                return;
            }
            if let Some(node) = graph.nodes.get(&id) {
                for &input in &node.inputs {
                    visit(graph, input, seen, order);
                }
                order.push(id);
            }
        }

        let mut seen = HashSet::new();
        let mut order = Vec::new();
        for &id in &self.sink_inputs {
            visit(self, id, &mut seen, &mut order);
        }
        order
    }

    fn render(&mut self, out: &mut [f32]) {
        if self.state != ContextState::Running {
            out.fill(0.0);
            return;
        }
        for chunk in out.chunks_mut(RENDER_QUANTUM) {
            self.render_quantum(chunk);
            self.frames_rendered += chunk.len() as u64;
        }
    }

    fn render_quantum(&mut self, out: &mut [f32]) {
        let len = out.len();
        let order = match self.order.take() {
            Some(order) => order,
            None => self.processing_order(),
        };
        let mut mix = std::mem::take(&mut self.scratch);
        mix.resize(len, 0.0);

        for &id in &order {
            mix.fill(0.0);
            if let Some(node) = self.nodes.get(&id) {
                for input in &node.inputs {
                    if let Some(source) = self.nodes.get(input) {
                        for (m, s) in mix.iter_mut().zip(&source.output[..len]) {
                            *m += s;
                        }
                    }
                }
            }

            let Some(node) = self.nodes.get_mut(&id) else {
                continue;
            };
            let output = &mut node.output[..len];
            match &mut node.kind {
                NodeKind::Player(player) => player.render(output),
                NodeKind::Filter(filter) => {
                    output.copy_from_slice(&mix);
                    filter.process_block(output);
                }
                NodeKind::Gain(gain) => {
                    output.copy_from_slice(&mix);
                    gain.render(output);
                }
            }
        }

        out.fill(0.0);
        for id in &self.sink_inputs {
            if let Some(source) = self.nodes.get(id) {
                for (o, s) in out.iter_mut().zip(&source.output[..len]) {
                    *o += s;
                }
            }
        }

        self.scratch = mix;
        self.order = Some(order);
    }
}

type SharedGraph = Arc<Mutex<Graph>>;

// ============================================================================
// Backend
// ============================================================================

/// Factory for [`SoftwareContext`]s
#[derive(Debug, Clone)]
pub struct SoftwareBackend {
    sample_rate: u32,
    autoplay: AutoplayPolicy,
    start_suspended: bool,
    contexts_created: usize,
}

impl SoftwareBackend {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            autoplay: AutoplayPolicy::Allowed,
            start_suspended: false,
            contexts_created: 0,
        }
    }

    pub fn with_autoplay(mut self, autoplay: AutoplayPolicy) -> Self {
        self.autoplay = autoplay;
        self
    }

    /// Create contexts in the suspended state even when autoplay is allowed
    pub fn start_suspended(mut self) -> Self {
        self.start_suspended = true;
        self
    }

    pub fn contexts_created(&self) -> usize {
        self.contexts_created
    }
}

impl Default for SoftwareBackend {
    fn default() -> Self {
        Self::new(48000)
    }
}

impl AudioBackend for SoftwareBackend {
    type Context = SoftwareContext;

    fn create_context(&mut self) -> Result<SoftwareContext> {
        let context = SoftwareContext::new(self.sample_rate, self.autoplay, self.start_suspended)?;
        self.contexts_created += 1;
        Ok(context)
    }
}

// ============================================================================
// Context
// ============================================================================

/// A software audio context
pub struct SoftwareContext {
    graph: SharedGraph,
    sample_rate: u32,
}

impl SoftwareContext {
    /// Contexts start suspended when the autoplay policy needs a gesture
    pub fn new(sample_rate: u32, autoplay: AutoplayPolicy, start_suspended: bool) -> Result<Self> {
        if !(MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&sample_rate) {
            return Err(NoiseError::ContextUnavailable {
                reason: format!("unsupported sample rate {sample_rate} Hz"),
            });
        }

        let state = if start_suspended || autoplay == AutoplayPolicy::RequiresGesture {
            ContextState::Suspended
        } else {
            ContextState::Running
        };
        debug!("software context: {sample_rate} Hz, {state}, autoplay {autoplay:?}");

        let graph = Graph {
            sample_rate,
            state,
            autoplay,
            activated: false,
            next_id: DESTINATION.0,
            nodes: BTreeMap::new(),
            sink_inputs: Vec::new(),
            order: None,
            scratch: Vec::with_capacity(RENDER_QUANTUM),
            frames_rendered: 0,
        };

        Ok(Self {
            graph: Arc::new(Mutex::new(graph)),
            sample_rate,
        })
    }

    /// Render `out.len()` mono frames. Suspended contexts render silence.
    pub fn render(&self, out: &mut [f32]) {
        self.graph.lock().render(out);
    }

    /// Render `frames` mono frames into a new vector
    pub fn render_frames(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames];
        self.render(&mut out);
        out
    }

    /// Handle for rendering from another thread
    pub fn renderer(&self) -> SoftwareRenderer {
        SoftwareRenderer {
            graph: Arc::clone(&self.graph),
        }
    }

    /// Platform-initiated suspension, e.g. a backgrounded page
    pub fn suspend(&self) {
        let mut graph = self.graph.lock();
        if graph.state == ContextState::Running {
            graph.state = ContextState::Suspended;
            debug!("software context suspended");
        }
    }

    pub fn close(&self) {
        self.graph.lock().state = ContextState::Closed;
    }

    /// Live nodes, excluding the sink
    pub fn node_count(&self) -> usize {
        self.graph.lock().nodes.len()
    }

    /// Nodes wired directly into the sink
    pub fn sink_inputs(&self) -> Vec<NodeId> {
        self.graph.lock().sink_inputs.clone()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.graph.lock().frames_rendered
    }
}

impl AudioContext for SoftwareContext {
    type Player = SoftwarePlayer;
    type Filter = SoftwareFilter;
    type Gain = SoftwareGain;

    fn state(&self) -> ContextState {
        self.graph.lock().state
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn resume(&mut self, user_initiated: bool) -> Result<ResumeOutcome> {
        let mut graph = self.graph.lock();
        match graph.state {
            ContextState::Closed => Err(NoiseError::ResumeFailed {
                reason: "context is closed".to_string(),
            }),
            ContextState::Running => Ok(ResumeOutcome::Resumed),
            ContextState::Suspended => {
                if user_initiated {
                    graph.activated = true;
                }
                if graph.autoplay == AutoplayPolicy::RequiresGesture && !graph.activated {
                    debug!("software context: resume deferred until user gesture");
                    return Ok(ResumeOutcome::Deferred);
                }
                graph.state = ContextState::Running;
                debug!("software context resumed");
                Ok(ResumeOutcome::Resumed)
            }
        }
    }

    fn create_buffer_player(&mut self, buffer: Arc<NoiseBuffer>) -> Result<SoftwarePlayer> {
        let id = self.graph.lock().add_node(NodeKind::Player(PlayerNode {
            buffer,
            looping: false,
            position: 0,
            state: PlayState::Idle,
        }));
        Ok(SoftwarePlayer {
            id,
            looping: false,
            graph: Arc::clone(&self.graph),
        })
    }

    fn create_filter(&mut self, stage: &FilterStage) -> Result<SoftwareFilter> {
        let id = self
            .graph
            .lock()
            .add_node(NodeKind::Filter(stage.to_biquad(self.sample_rate)));
        Ok(SoftwareFilter {
            id,
            stage: *stage,
            graph: Arc::clone(&self.graph),
        })
    }

    fn create_gain(&mut self, value: f32) -> Result<SoftwareGain> {
        let id = self.graph.lock().add_node(NodeKind::Gain(GainNode::new(value)));
        Ok(SoftwareGain {
            id,
            value,
            sample_rate: self.sample_rate,
            graph: Arc::clone(&self.graph),
        })
    }

    fn connect(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        self.graph.lock().connect(from, to)
    }

    fn destination(&self) -> NodeId {
        DESTINATION
    }
}

/// Render side of a [`SoftwareContext`], safe to move to an audio thread
#[derive(Clone)]
pub struct SoftwareRenderer {
    graph: SharedGraph,
}

impl SoftwareRenderer {
    pub fn render(&self, out: &mut [f32]) {
        self.graph.lock().render(out);
    }

    pub fn sample_rate(&self) -> u32 {
        self.graph.lock().sample_rate
    }
}

// ============================================================================
// Node handles
// ============================================================================

pub struct SoftwarePlayer {
    id: NodeId,
    looping: bool,
    graph: SharedGraph,
}

impl AudioNode for SoftwarePlayer {
    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl BufferPlayer for SoftwarePlayer {
    fn set_loop(&mut self, looping: bool) {
        self.looping = looping;
        if let Ok(player) = self.graph.lock().player_mut(self.id) {
            player.looping = looping;
        }
    }

    fn is_looping(&self) -> bool {
        self.looping
    }

    fn start(&mut self) -> Result<()> {
        let mut graph = self.graph.lock();
        let player = graph.player_mut(self.id)?;
        if player.state != PlayState::Idle {
            return Err(NoiseError::PlayerAlreadyStarted { node: self.id.0 });
        }
        player.state = PlayState::Playing;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        let mut graph = self.graph.lock();
        let player = graph.player_mut(self.id)?;
        if player.state == PlayState::Stopped {
            return Err(NoiseError::PlayerAlreadyStopped { node: self.id.0 });
        }
        player.state = PlayState::Stopped;
        Ok(())
    }
}

impl Drop for SoftwarePlayer {
    fn drop(&mut self) {
        self.graph.lock().remove_node(self.id);
    }
}

pub struct SoftwareFilter {
    id: NodeId,
    stage: FilterStage,
    graph: SharedGraph,
}

impl AudioNode for SoftwareFilter {
    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl FilterNode for SoftwareFilter {
    fn stage(&self) -> FilterStage {
        self.stage
    }
}

impl Drop for SoftwareFilter {
    fn drop(&mut self) {
        self.graph.lock().remove_node(self.id);
    }
}

pub struct SoftwareGain {
    id: NodeId,
    value: f32,
    sample_rate: u32,
    graph: SharedGraph,
}

impl AudioNode for SoftwareGain {
    fn node_id(&self) -> NodeId {
        self.id
    }
}

impl GainControl for SoftwareGain {
    fn set_value(&mut self, value: f32) {
        self.value = value;
        if let Ok(gain) = self.graph.lock().gain_mut(self.id) {
            gain.set(value);
        }
    }

    fn ramp_to(&mut self, value: f32, duration_secs: f32) {
        self.value = value;
        let frames = (duration_secs.max(0.0) * self.sample_rate as f32).round() as usize;
        if let Ok(gain) = self.graph.lock().gain_mut(self.id) {
            gain.ramp(value, frames);
        }
    }

    fn value(&self) -> f32 {
        self.value
    }
}

impl Drop for SoftwareGain {
    fn drop(&mut self) {
        self.graph.lock().remove_node(self.id);
    }
}
