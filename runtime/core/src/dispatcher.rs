// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

use {
    super::streaming::*,
    std::thread,
    tracing::{debug, warn, Span},
};

/// The thread to drive the engine for each period.
pub struct StreamDispatcher<T> {
    name: String,
    th: Option<thread::JoinHandle<Result<StreamEngine<T>, StreamError>>>,
    stop: StopHandle,
    span: Span,
}

impl<T> Drop for StreamDispatcher<T> {
    fn drop(&mut self) {
        self.stop.request();

        if let Some(th) = self.th.take() {
            match th.join() {
                Ok(Ok(_)) => (),
                Ok(Err(err)) => warn!(parent: &self.span, name = %self.name, %err, "dispatcher aborted"),
                Err(_) => warn!(parent: &self.span, name = %self.name, "fail to join thread"),
            }
        }
    }
}

impl<T: StreamTransport + Send + 'static> StreamDispatcher<T> {
    /// Launch a thread to drive the engine. The engine in configured state is started in
    /// advance. The callback is invoked between transfer of capture buffers and transfer of
    /// playback buffers in each period.
    pub fn run<F>(
        name: String,
        mut engine: StreamEngine<T>,
        mut process: F,
        span: Span,
    ) -> Result<Self, StreamError>
    where
        F: FnMut(&mut StreamEngine<T>) + Send + 'static,
    {
        if engine.state() == EngineState::Configured {
            engine.start()?;
        }
        if engine.state() != EngineState::Running {
            let msg = format!("Engine in {:?} state is not available", engine.state());
            Err(StreamError::new(StreamErrorKind::Usage, &msg))?
        }

        let stop = engine.stop_handle();
        let th_span = span.clone();

        let th = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                let res = dispatch(&mut engine, &mut process);
                let stats = engine.stats();
                debug!(
                    parent: &th_span,
                    periods = stats.periods,
                    xruns = stats.xruns,
                    transport_errors = stats.transport_errors,
                    "dispatcher finished",
                );
                res.map(|_| engine)
            })
            .map_err(|err| {
                let msg = format!("Fail to spawn thread: {}", err);
                StreamError::new(StreamErrorKind::Thread, &msg)
            })?;

        debug!(parent: &span, name = %name, "dispatcher launched");

        Ok(Self {
            name,
            th: Some(th),
            stop,
            span,
        })
    }
}

impl<T> StreamDispatcher<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request stop. The thread exits at the next boundary of period at latest.
    pub fn stop(&self) {
        self.stop.request();
    }

    /// Whether the thread exited already, e.g. due to failure of transport.
    pub fn is_finished(&self) -> bool {
        self.th
            .as_ref()
            .map(|th| th.is_finished())
            .unwrap_or(true)
    }

    /// Wait for the thread to exit, then take the engine back.
    pub fn join(mut self) -> Result<StreamEngine<T>, StreamError> {
        let th = self.th.take().ok_or_else(|| {
            StreamError::new(StreamErrorKind::Thread, "Thread is already joined")
        })?;
        th.join().map_err(|_| {
            let msg = format!("Thread {} panicked", self.name);
            StreamError::new(StreamErrorKind::Thread, &msg)
        })?
    }
}

fn dispatch<T, F>(engine: &mut StreamEngine<T>, process: &mut F) -> Result<(), StreamError>
where
    T: StreamTransport,
    F: FnMut(&mut StreamEngine<T>),
{
    loop {
        match engine.wait_for_period()? {
            WaitStatus::Ready => {
                engine.transfer_capture_buffers()?;
                process(engine);
                engine.transfer_playback_buffers()?;
            }
            WaitStatus::Xrun => engine.reset()?,
            WaitStatus::TransportError => {
                engine.stop()?;
                break;
            }
            WaitStatus::Stopped => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use {super::*, std::time::Duration};

    const CONFIG: StreamConfig = StreamConfig {
        period_size: 4,
        sample_rate: 48000,
    };

    fn engine(mut transport: LoopbackTransport) -> StreamEngine<LoopbackTransport> {
        transport.pace = Some(Duration::from_millis(1));
        let channels = vec![
            ChannelSpec::new(
                "capture-1",
                Direction::Capture,
                ChannelKind::Audio(SampleFormat::Int24),
            ),
            ChannelSpec::new(
                "playback-1",
                Direction::Playback,
                ChannelKind::Audio(SampleFormat::Int24),
            ),
        ];
        let mut engine = StreamEngine::new(transport, Span::none());
        engine.configure(channels, CONFIG).unwrap();
        engine
    }

    fn passthrough(engine: &mut StreamEngine<LoopbackTransport>) {
        let mut frames = [0i32; 4];
        frames.copy_from_slice(engine.client_buffer(0).unwrap().as_int24().unwrap());
        engine
            .client_buffer_mut(1)
            .unwrap()
            .as_int24_mut()
            .unwrap()
            .copy_from_slice(&frames);
    }

    #[test]
    fn passthrough_until_stop() {
        let engine = engine(LoopbackTransport::new());
        let dispatcher =
            StreamDispatcher::run("stream".to_string(), engine, passthrough, Span::none()).unwrap();
        thread::sleep(Duration::from_millis(30));
        assert!(!dispatcher.is_finished());
        dispatcher.stop();

        let engine = dispatcher.join().unwrap();
        assert_eq!(engine.state(), EngineState::Stopped);
        let periods = engine.stats().periods as usize;
        assert!(periods > 0);

        let played = &engine.transport().played[1];
        assert_eq!(played.len(), periods * CONFIG.period_size);
        played.iter().enumerate().for_each(|(i, &quadlet)| {
            assert_eq!(u32::from_be(quadlet), 0x40000000 | i as u32);
        });
    }

    #[test]
    fn recover_from_xrun_then_exit_at_failure() {
        let transport =
            LoopbackTransport::with_faults(&[(2, Fault::Timeout), (5, Fault::Failure)]);
        let dispatcher = StreamDispatcher::run(
            "stream".to_string(),
            engine(transport),
            passthrough,
            Span::none(),
        )
        .unwrap();

        let engine = dispatcher.join().unwrap();
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.stats().periods, 4);
        assert_eq!(engine.stats().xruns, 1);
        assert_eq!(engine.stats().transport_errors, 1);
        assert_eq!(engine.transport().discarded, 1);
        assert!(engine.transport().halted);
    }

    #[test]
    fn engine_not_configured() {
        let engine = StreamEngine::new(LoopbackTransport::new(), Span::none());
        let err = StreamDispatcher::run("stream".to_string(), engine, |_| (), Span::none())
            .err()
            .unwrap();
        assert!(err.is(StreamErrorKind::Usage));
    }

    #[test]
    fn stop_at_drop() {
        let engine = engine(LoopbackTransport::new());
        let dispatcher =
            StreamDispatcher::run("stream".to_string(), engine, |_| (), Span::none()).unwrap();
        thread::sleep(Duration::from_millis(5));
        drop(dispatcher);
    }
}
