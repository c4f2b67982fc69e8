// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

//! Service to dispatch the streaming engine over the transport paced by the system clock.
//!
//! Each capture channel is copied to the playback channel in the same position per period, then
//! statistics of the session is reported when the duration elapses.

use {
    super::{cmdline::*, dispatcher::*, streaming::*, *},
    clap::Parser,
    std::{
        convert::TryFrom,
        thread,
        time::{Duration, Instant},
    },
    tracing::{debug_span, info, Span},
};

/// Arguments of the service.
#[derive(Parser, Debug)]
#[command(name = "snd-firewire-stream-null-service")]
pub struct Arguments {
    #[command(flatten)]
    pub stream: StreamArgs,

    /// The number of channels in each direction.
    #[arg(long, default_value_t = 2)]
    pub channels: usize,

    /// The duration of session in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub duration_ms: u64,
}

/// Parameters of the service.
#[derive(Debug, Clone)]
pub struct NullParams {
    pub stream: StreamArgs,
    pub channels: usize,
    pub duration: Duration,
}

pub struct NullServiceCmd;

impl ServiceCmd<Arguments, NullParams, NullRuntime> for NullServiceCmd {
    fn params(args: &Arguments) -> (NullParams, Option<LogLevel>) {
        let params = NullParams {
            stream: args.stream.clone(),
            channels: args.channels,
            duration: Duration::from_millis(args.duration_ms),
        };
        (params, args.stream.log_level)
    }
}

const NAME: &str = "stream";

// The interval to check the end of session.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct NullRuntime {
    engine: Option<StreamEngine<NullTransport>>,
    dispatcher: Option<StreamDispatcher<NullTransport>>,
    channels: usize,
    duration: Duration,
    span: Span,
}

fn passthrough(
    engine: &mut StreamEngine<NullTransport>,
    channels: usize,
    scratch: &mut [i32],
) {
    (0..channels).for_each(|i| {
        let captured = engine
            .client_buffer(i)
            .ok()
            .and_then(|buf| buf.as_int24())
            .map(|buf| scratch.copy_from_slice(buf));
        if captured.is_some() {
            if let Some(buf) = engine
                .client_buffer_mut(channels + i)
                .ok()
                .and_then(|buf| buf.as_int24_mut())
            {
                buf.copy_from_slice(scratch);
            }
        }
    });
}

impl RuntimeOperation<NullParams> for NullRuntime {
    fn new(params: NullParams, log_level: Option<LogLevel>) -> Result<Self, StreamError> {
        init_logging(log_level);

        let config = StreamConfig::try_from(&params.stream)?;
        if params.channels == 0 {
            Err(StreamError::new(
                StreamErrorKind::Usage,
                "At least one channel is required",
            ))?
        }

        let kind = ChannelKind::Audio(SampleFormat::Int24);
        let mut specs: Vec<ChannelSpec> = (0..params.channels)
            .map(|i| ChannelSpec::new(&format!("capture-{}", i + 1), Direction::Capture, kind))
            .collect();
        specs.extend((0..params.channels).map(|i| {
            ChannelSpec::new(&format!("playback-{}", i + 1), Direction::Playback, kind)
        }));

        let span = debug_span!("null-service");
        let mut engine = StreamEngine::new(NullTransport::new(), span.clone());
        engine.configure(specs, config)?;

        Ok(Self {
            engine: Some(engine),
            dispatcher: None,
            channels: params.channels,
            duration: params.duration,
            span,
        })
    }

    fn listen(&mut self) -> Result<(), StreamError> {
        let engine = self.engine.take().ok_or_else(|| {
            StreamError::new(StreamErrorKind::Usage, "The engine is already dispatched")
        })?;

        let channels = self.channels;
        let mut scratch = vec![0; engine.config().period_size];
        let dispatcher = StreamDispatcher::run(
            NAME.to_string(),
            engine,
            move |engine| passthrough(engine, channels, &mut scratch),
            self.span.clone(),
        )?;
        self.dispatcher = Some(dispatcher);

        Ok(())
    }

    fn run(&mut self) -> Result<(), StreamError> {
        let dispatcher = self.dispatcher.take().ok_or_else(|| {
            StreamError::new(StreamErrorKind::Usage, "The engine is not dispatched yet")
        })?;

        let start = Instant::now();
        while !dispatcher.is_finished() && start.elapsed() < self.duration {
            thread::sleep(POLL_INTERVAL.min(self.duration));
        }
        dispatcher.stop();

        let mut engine = dispatcher.join()?;
        let stats = *engine.stats();
        info!(
            parent: &self.span,
            periods = stats.periods,
            xruns = stats.xruns,
            transport_errors = stats.transport_errors,
            queued_frames = engine.transport().queued_frames(),
            "session finished",
        );

        engine.finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn params(duration_ms: u64) -> NullParams {
        let args = Arguments::try_parse_from([
            "cmd",
            "--period-size",
            "48",
            "--channels",
            "3",
            "--duration-ms",
            duration_ms.to_string().as_str(),
        ])
        .unwrap();
        NullServiceCmd::params(&args).0
    }

    #[test]
    fn session_until_duration() {
        let mut runtime = NullRuntime::new(params(30), None).unwrap();
        assert!(runtime.run().unwrap_err().is(StreamErrorKind::Usage));

        runtime.listen().unwrap();
        assert!(runtime.listen().unwrap_err().is(StreamErrorKind::Usage));
        runtime.run().unwrap();
        assert!(runtime.dispatcher.is_none());
    }

    #[test]
    fn passthrough_per_channel() {
        let mut engine = StreamEngine::new(NullTransport::new(), Span::none());
        let kind = ChannelKind::Audio(SampleFormat::Int24);
        let specs = vec![
            ChannelSpec::new("capture-1", Direction::Capture, kind),
            ChannelSpec::new("playback-1", Direction::Playback, kind),
        ];
        let config = StreamConfig {
            period_size: 4,
            sample_rate: 48000,
        };
        engine.configure(specs, config).unwrap();

        engine
            .client_buffer_mut(0)
            .unwrap()
            .as_int24_mut()
            .unwrap()
            .copy_from_slice(&[1, -2, 3, -4]);
        let mut scratch = vec![0; 4];
        passthrough(&mut engine, 1, &mut scratch);
        assert_eq!(
            engine.client_buffer(1).unwrap().as_int24().unwrap(),
            &[1, -2, 3, -4]
        );
    }

    #[test]
    fn exit_code_of_service() {
        assert_eq!(
            NullServiceCmd::execute(["cmd", "--duration-ms", "20", "--period-size", "32"]),
            libc::EXIT_SUCCESS
        );
        assert_eq!(
            NullServiceCmd::execute(["cmd", "--channels", "0"]),
            libc::EXIT_FAILURE
        );
        assert_eq!(
            NullServiceCmd::execute(["cmd", "--sample-rate", "0"]),
            libc::EXIT_FAILURE
        );
    }
}
