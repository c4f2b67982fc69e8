// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Engine to transfer audio and MIDI frames per period.
//!
//! The engine exchanges one period of frames between staging in the format of the unit and
//! buffers for the client at each boundary of period signaled by the transport. Any operation
//! after start neither allocates nor blocks longer than one period.

mod null;
mod sample;
mod transport;

pub use {
    null::NullTransport,
    transport::{PeriodBoundary, StreamTransport},
};

#[cfg(test)]
pub(crate) use transport::{Fault, LoopbackTransport};

use {
    std::{
        borrow::Cow,
        fmt,
        sync::{
            atomic::{AtomicBool, Ordering},
            Arc,
        },
        time::Duration,
    },
    tracing::{debug, Span},
};

pub use sample::MIDI_BYTE_PRESENT;

/// The kind of error in streaming.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamErrorKind {
    /// The operation is called outside its valid state or with invalid arguments.
    Usage,
    /// The transport failed.
    Transport,
    /// The thread for dispatcher is not available.
    Thread,
}

impl fmt::Display for StreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            StreamErrorKind::Usage => "usage",
            StreamErrorKind::Transport => "transport",
            StreamErrorKind::Thread => "thread",
        };
        f.write_str(label)
    }
}

/// Error with its kind and message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {msg}")]
pub struct StreamError {
    kind: StreamErrorKind,
    msg: Cow<'static, str>,
}

impl StreamError {
    pub fn new(kind: StreamErrorKind, msg: &str) -> Self {
        Self {
            kind,
            msg: Cow::Owned(msg.to_string()),
        }
    }

    /// Without allocation, for the error detected while running.
    pub const fn from_static(kind: StreamErrorKind, msg: &'static str) -> Self {
        Self {
            kind,
            msg: Cow::Borrowed(msg),
        }
    }

    pub fn kind(&self) -> StreamErrorKind {
        self.kind
    }

    pub fn is(&self, kind: StreamErrorKind) -> bool {
        self.kind == kind
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

/// Direction of channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    /// From the unit to the client.
    Capture,
    /// From the client to the unit.
    Playback,
}

/// Format of sample in client buffer.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SampleFormat {
    /// Signed 24 bit value in 32 bit integer.
    Int24,
    /// Single precision floating point number in [-1.0, 1.0].
    Float,
}

/// Kind of channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChannelKind {
    Audio(SampleFormat),
    /// One byte per frame at most.
    Midi,
}

/// Specification of channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub name: String,
    pub direction: Direction,
    pub kind: ChannelKind,
}

impl ChannelSpec {
    pub fn new(name: &str, direction: Direction, kind: ChannelKind) -> Self {
        Self {
            name: name.to_string(),
            direction,
            kind,
        }
    }
}

/// Parameters of stream fixed for the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// The number of frames in period.
    pub period_size: usize,
    /// Sampling rate in Hz.
    pub sample_rate: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            period_size: 256,
            sample_rate: 48000,
        }
    }
}

impl StreamConfig {
    /// The duration of one period.
    pub fn period_duration(&self) -> Duration {
        Duration::from_nanos(self.period_size as u64 * 1_000_000_000 / self.sample_rate as u64)
    }
}

/// Buffer of the client for one period.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientBuffer {
    Int24(Vec<i32>),
    Float(Vec<f32>),
    /// `MIDI_BYTE_PRESENT` with the byte, or zero.
    Midi(Vec<u32>),
}

impl ClientBuffer {
    fn new(kind: ChannelKind, period_size: usize) -> Self {
        match kind {
            ChannelKind::Audio(SampleFormat::Int24) => Self::Int24(vec![0; period_size]),
            ChannelKind::Audio(SampleFormat::Float) => Self::Float(vec![0.0; period_size]),
            ChannelKind::Midi => Self::Midi(vec![0; period_size]),
        }
    }

    pub fn as_int24(&self) -> Option<&[i32]> {
        match self {
            Self::Int24(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_int24_mut(&mut self) -> Option<&mut [i32]> {
        match self {
            Self::Int24(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<&[f32]> {
        match self {
            Self::Float(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_float_mut(&mut self) -> Option<&mut [f32]> {
        match self {
            Self::Float(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_midi(&self) -> Option<&[u32]> {
        match self {
            Self::Midi(buf) => Some(buf),
            _ => None,
        }
    }

    pub fn as_midi_mut(&mut self) -> Option<&mut [u32]> {
        match self {
            Self::Midi(buf) => Some(buf),
            _ => None,
        }
    }
}

// The staging of playback channel is shared by the engine for whole the period.
#[derive(Debug)]
struct Channel {
    spec: ChannelSpec,
    client: ClientBuffer,
    staging: Vec<u32>,
}

impl Channel {
    fn new(spec: ChannelSpec, period_size: usize) -> Self {
        let client = ClientBuffer::new(spec.kind, period_size);
        let staging = match spec.direction {
            Direction::Capture => vec![0; period_size],
            Direction::Playback => Vec::new(),
        };
        Self {
            spec,
            client,
            staging,
        }
    }

    fn capture(&mut self) {
        match &mut self.client {
            ClientBuffer::Int24(buf) => sample::read_int24(&self.staging, buf),
            ClientBuffer::Float(buf) => sample::read_float(&self.staging, buf),
            ClientBuffer::Midi(buf) => sample::read_midi(&self.staging, buf),
        }
    }

    fn playback(&self, staging: &mut [u32]) {
        match &self.client {
            ClientBuffer::Int24(buf) => sample::write_int24(buf, staging),
            ClientBuffer::Float(buf) => sample::write_float(buf, staging),
            ClientBuffer::Midi(buf) => sample::write_midi(buf, staging),
        }
    }
}

/// State of engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    Uninitialized,
    Configured,
    Running,
    /// The boundary of period was missed.
    Xrun,
    Stopped,
}

/// The result of wait for period.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WaitStatus {
    /// The period is available for transfer.
    Ready,
    /// The boundary of period was missed. Recoverable by reset.
    Xrun,
    /// The transport failed.
    TransportError,
    /// The engine is stopped.
    Stopped,
}

/// Statistics of session.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct StreamStats {
    /// The number of periods available for transfer.
    pub periods: u64,
    /// The number of missed boundaries.
    pub xruns: u64,
    /// The number of failures in the transport.
    pub transport_errors: u64,
}

/// Handle to request stop of engine from any thread.
#[derive(Default, Debug, Clone)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    /// Request stop. The engine stops at the next wait for period.
    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

const fn usage_error(msg: &'static str) -> StreamError {
    StreamError::from_static(StreamErrorKind::Usage, msg)
}

const NOT_UNINITIALIZED: &str = "The engine is already configured";
const NOT_CONFIGURED: &str = "The engine is not configured";
const NOT_RUNNING: &str = "The engine is not running";
const NOT_READY: &str = "No period is ready for transfer, or it is already transferred";
const NOT_XRUN: &str = "The engine is not in xrun";
const NOT_STARTED: &str = "The engine is not started";
const STILL_RUNNING: &str = "The engine should be stopped in advance";
const MISSING_CHANNEL: &str = "The channel is not configured";

/// Engine of streaming for a session.
#[derive(Debug)]
pub struct StreamEngine<T> {
    transport: T,
    state: EngineState,
    config: StreamConfig,
    channels: Vec<Channel>,
    playback_indices: Vec<usize>,
    playback_staging: Vec<u32>,
    // None until the first boundary after start or reset.
    expected: Option<u64>,
    observed: Option<u64>,
    ready: bool,
    captured: bool,
    played: bool,
    stop: StopHandle,
    stats: StreamStats,
    span: Span,
}

impl<T: StreamTransport> StreamEngine<T> {
    pub fn new(transport: T, span: Span) -> Self {
        Self {
            transport,
            state: EngineState::Uninitialized,
            config: Default::default(),
            channels: Default::default(),
            playback_indices: Default::default(),
            playback_staging: Default::default(),
            expected: None,
            observed: None,
            ready: false,
            captured: false,
            played: false,
            stop: Default::default(),
            stats: Default::default(),
            span,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Handle to request stop from the other thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// The number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Specification of the channel.
    pub fn channel_spec(&self, index: usize) -> Option<&ChannelSpec> {
        self.channels.get(index).map(|ch| &ch.spec)
    }

    /// Client buffer of the channel.
    pub fn client_buffer(&self, index: usize) -> Result<&ClientBuffer, StreamError> {
        self.channels
            .get(index)
            .map(|ch| &ch.client)
            .ok_or(usage_error(MISSING_CHANNEL))
    }

    /// Client buffer of the channel for mutation.
    pub fn client_buffer_mut(&mut self, index: usize) -> Result<&mut ClientBuffer, StreamError> {
        self.channels
            .get_mut(index)
            .map(|ch| &mut ch.client)
            .ok_or(usage_error(MISSING_CHANNEL))
    }

    /// Allocate client buffers and staging for the channels.
    pub fn configure(
        &mut self,
        channels: Vec<ChannelSpec>,
        config: StreamConfig,
    ) -> Result<(), StreamError> {
        if self.state != EngineState::Uninitialized {
            Err(usage_error(NOT_UNINITIALIZED))?
        }
        if channels.is_empty() {
            Err(StreamError::new(StreamErrorKind::Usage, "No channel is given"))?
        }
        if config.period_size == 0 || config.sample_rate == 0 {
            let msg = format!("Invalid configuration: {:?}", config);
            Err(StreamError::new(StreamErrorKind::Usage, &msg))?
        }

        self.channels = channels
            .into_iter()
            .map(|spec| Channel::new(spec, config.period_size))
            .collect();
        self.playback_indices = self
            .channels
            .iter()
            .enumerate()
            .filter(|(_, ch)| ch.spec.direction == Direction::Playback)
            .map(|(i, _)| i)
            .collect();
        self.playback_staging = vec![0; self.playback_indices.len() * config.period_size];
        self.config = config;
        self.stats = Default::default();
        self.stop.clear();
        self.state = EngineState::Configured;

        debug!(
            parent: &self.span,
            channels = self.channels.len(),
            period_size = config.period_size,
            sample_rate = config.sample_rate,
            "configured",
        );

        Ok(())
    }

    /// Commit the layout of channels to the transport, then start.
    pub fn start(&mut self) -> Result<(), StreamError> {
        if self.state != EngineState::Configured {
            Err(usage_error(NOT_CONFIGURED))?
        }

        let specs: Vec<ChannelSpec> = self.channels.iter().map(|ch| ch.spec.clone()).collect();
        self.transport.commit(&specs, self.config.period_size)?;

        self.expected = None;
        self.observed = None;
        self.ready = false;
        self.state = EngineState::Running;

        debug!(parent: &self.span, "started");

        Ok(())
    }

    /// Wait for the next boundary of period at most one period. The capture staging is filled
    /// when ready.
    pub fn wait_for_period(&mut self) -> Result<WaitStatus, StreamError> {
        match self.state {
            EngineState::Running => (),
            EngineState::Stopped => return Ok(WaitStatus::Stopped),
            _ => Err(usage_error(NOT_RUNNING))?,
        }

        if self.stop.is_requested() {
            self.halt();
            return Ok(WaitStatus::Stopped);
        }

        self.ready = false;
        self.captured = false;
        self.played = false;

        let boundary = match self.transport.wait_boundary(self.config.period_duration()) {
            Ok(boundary) => boundary,
            Err(_) => {
                self.stats.transport_errors += 1;
                return Ok(WaitStatus::TransportError);
            }
        };

        let position = match boundary {
            Some(boundary) => boundary.position,
            None => return Ok(self.enter_xrun(None)),
        };

        if let Some(expected) = self.expected {
            if position != expected {
                return Ok(self.enter_xrun(Some(position)));
            }
        }

        let transport = &mut self.transport;
        let filled = self
            .channels
            .iter_mut()
            .enumerate()
            .filter(|(_, ch)| ch.spec.direction == Direction::Capture)
            .try_for_each(|(i, ch)| transport.read_capture(i, &mut ch.staging));
        if filled.is_err() {
            self.stats.transport_errors += 1;
            return Ok(WaitStatus::TransportError);
        }

        self.expected = Some(position + self.config.period_size as u64);
        self.ready = true;
        self.stats.periods += 1;

        Ok(WaitStatus::Ready)
    }

    fn enter_xrun(&mut self, observed: Option<u64>) -> WaitStatus {
        self.observed = observed;
        self.stats.xruns += 1;
        self.state = EngineState::Xrun;
        WaitStatus::Xrun
    }

    /// Convert the period in capture staging to client buffers.
    pub fn transfer_capture_buffers(&mut self) -> Result<(), StreamError> {
        if self.state != EngineState::Running {
            Err(usage_error(NOT_RUNNING))?
        }
        if !self.ready || self.captured {
            Err(usage_error(NOT_READY))?
        }

        self.channels
            .iter_mut()
            .filter(|ch| ch.spec.direction == Direction::Capture)
            .for_each(|ch| ch.capture());
        self.captured = true;

        Ok(())
    }

    /// Convert client buffers of all playback channels to staging, then queue them to the
    /// transport at once. Nothing is queued for the period when the transport fails.
    pub fn transfer_playback_buffers(&mut self) -> Result<(), StreamError> {
        if self.state != EngineState::Running {
            Err(usage_error(NOT_RUNNING))?
        }
        if !self.ready || self.played {
            Err(usage_error(NOT_READY))?
        }

        if !self.playback_indices.is_empty() {
            let period_size = self.config.period_size;
            self.channels
                .iter()
                .filter(|ch| ch.spec.direction == Direction::Playback)
                .zip(self.playback_staging.chunks_exact_mut(period_size))
                .for_each(|(ch, staging)| ch.playback(staging));
            self.transport
                .write_playback(&self.playback_indices, &self.playback_staging)?;
        }
        self.played = true;

        Ok(())
    }

    /// Discard the partial period and synchronize to the next boundary, then continue.
    pub fn reset(&mut self) -> Result<(), StreamError> {
        if self.state != EngineState::Xrun {
            Err(usage_error(NOT_XRUN))?
        }

        self.transport.discard()?;
        self.channels
            .iter_mut()
            .for_each(|ch| ch.staging.iter_mut().for_each(|quadlet| *quadlet = 0));
        self.playback_staging
            .iter_mut()
            .for_each(|quadlet| *quadlet = 0);

        self.expected = self
            .observed
            .take()
            .map(|position| position + self.config.period_size as u64);
        self.ready = false;
        self.state = EngineState::Running;

        Ok(())
    }

    fn halt(&mut self) {
        self.transport.halt();
        self.ready = false;
        self.state = EngineState::Stopped;
    }

    /// Stop the transfer. The period in flight is abandoned unless transferred.
    pub fn stop(&mut self) -> Result<(), StreamError> {
        match self.state {
            EngineState::Running | EngineState::Xrun => {
                self.halt();
                debug!(
                    parent: &self.span,
                    periods = self.stats.periods,
                    xruns = self.stats.xruns,
                    "stopped",
                );
                Ok(())
            }
            EngineState::Stopped => Ok(()),
            _ => Err(usage_error(NOT_STARTED)),
        }
    }

    /// Release resources of the session.
    pub fn finish(&mut self) -> Result<(), StreamError> {
        match self.state {
            EngineState::Stopped | EngineState::Configured => {
                self.transport.release();
                self.channels.clear();
                self.playback_indices.clear();
                self.playback_staging.clear();
                self.expected = None;
                self.observed = None;
                self.state = EngineState::Uninitialized;
                debug!(parent: &self.span, "finished");
                Ok(())
            }
            EngineState::Uninitialized => Ok(()),
            _ => Err(usage_error(STILL_RUNNING)),
        }
    }
}
