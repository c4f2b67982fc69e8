// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

use {super::*, std::time::Duration};

/// Boundary of period signaled by the transport.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PeriodBoundary {
    /// The position in frames since the transport started.
    pub position: u64,
}

/// Transport of isochronous packets for the engine, e.g. a wrapper of isochronous context in
/// Linux FireWire subsystem. None of the operations should allocate once committed.
pub trait StreamTransport {
    /// Prepare for the layout of channels and the size of period.
    fn commit(&mut self, channels: &[ChannelSpec], period_size: usize) -> Result<(), StreamError>;

    /// Wait for the next boundary of period. None at timeout.
    fn wait_boundary(&mut self, timeout: Duration) -> Result<Option<PeriodBoundary>, StreamError>;

    /// Fill the staging with quadlets of the capture channel for the period.
    fn read_capture(&mut self, index: usize, staging: &mut [u32]) -> Result<(), StreamError>;

    /// Queue quadlets of the playback channels for the period at once. The staging consists of
    /// blocks of period for the channels in the order of indices. Nothing should be queued at
    /// failure.
    fn write_playback(&mut self, indices: &[usize], staging: &[u32]) -> Result<(), StreamError>;

    /// Discard partially transferred period.
    fn discard(&mut self) -> Result<(), StreamError>;

    /// Stop transmission and reception.
    fn halt(&mut self);

    /// Release resources for the channels.
    fn release(&mut self);
}

impl<T: StreamTransport + ?Sized> StreamTransport for Box<T> {
    fn commit(&mut self, channels: &[ChannelSpec], period_size: usize) -> Result<(), StreamError> {
        (**self).commit(channels, period_size)
    }

    fn wait_boundary(&mut self, timeout: Duration) -> Result<Option<PeriodBoundary>, StreamError> {
        (**self).wait_boundary(timeout)
    }

    fn read_capture(&mut self, index: usize, staging: &mut [u32]) -> Result<(), StreamError> {
        (**self).read_capture(index, staging)
    }

    fn write_playback(&mut self, indices: &[usize], staging: &[u32]) -> Result<(), StreamError> {
        (**self).write_playback(indices, staging)
    }

    fn discard(&mut self) -> Result<(), StreamError> {
        (**self).discard()
    }

    fn halt(&mut self) {
        (**self).halt()
    }

    fn release(&mut self) {
        (**self).release()
    }
}

#[cfg(test)]
pub(crate) use self::loopback::*;

#[cfg(test)]
mod loopback {
    use super::*;

    /// Event to be injected at the given count of wait.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub(crate) enum Fault {
        /// No boundary before timeout.
        Timeout,
        /// The boundary comes later than expected by the number of periods.
        Skip(u64),
        /// The transport fails.
        Failure,
        /// The transport rejects the playback in the period.
        PlaybackFailure,
    }

    /// Transport in memory. Each capture channel delivers audio quadlets with the position of
    /// frame as sample, and each playback channel records the quadlets queued.
    #[derive(Default, Debug)]
    pub(crate) struct LoopbackTransport {
        pub(crate) period_size: usize,
        pub(crate) position: u64,
        pub(crate) waits: usize,
        pub(crate) faults: Vec<(usize, Fault)>,
        pub(crate) committed: Vec<ChannelSpec>,
        pub(crate) played: Vec<Vec<u32>>,
        pub(crate) discarded: usize,
        pub(crate) reject_playback: bool,
        pub(crate) halted: bool,
        pub(crate) released: bool,
        pub(crate) pace: Option<Duration>,
    }

    impl LoopbackTransport {
        pub(crate) fn new() -> Self {
            Default::default()
        }

        pub(crate) fn with_faults(faults: &[(usize, Fault)]) -> Self {
            Self {
                faults: faults.to_vec(),
                ..Default::default()
            }
        }
    }

    impl StreamTransport for LoopbackTransport {
        fn commit(
            &mut self,
            channels: &[ChannelSpec],
            period_size: usize,
        ) -> Result<(), StreamError> {
            self.committed = channels.to_vec();
            self.played = vec![Vec::new(); channels.len()];
            self.period_size = period_size;
            Ok(())
        }

        fn wait_boundary(
            &mut self,
            _: Duration,
        ) -> Result<Option<PeriodBoundary>, StreamError> {
            if let Some(pace) = self.pace {
                std::thread::sleep(pace);
            }

            let count = self.waits;
            self.waits += 1;

            let fault = self
                .faults
                .iter()
                .find(|(at, _)| *at == count)
                .map(|(_, fault)| *fault);
            match fault {
                Some(Fault::Timeout) => {
                    self.position += self.period_size as u64;
                    Ok(None)
                }
                Some(Fault::Skip(periods)) => {
                    self.position += (periods + 1) * self.period_size as u64;
                    Ok(Some(PeriodBoundary {
                        position: self.position,
                    }))
                }
                Some(Fault::Failure) => Err(StreamError::new(
                    StreamErrorKind::Transport,
                    "loopback failure",
                )),
                Some(Fault::PlaybackFailure) | None => {
                    self.reject_playback = fault.is_some();
                    self.position += self.period_size as u64;
                    Ok(Some(PeriodBoundary {
                        position: self.position,
                    }))
                }
            }
        }

        fn read_capture(&mut self, _: usize, staging: &mut [u32]) -> Result<(), StreamError> {
            // The frames in the period just finished.
            let start = self.position - staging.len() as u64;
            staging.iter_mut().enumerate().for_each(|(i, quadlet)| {
                *quadlet = (0x40000000 | ((start + i as u64) as u32 & 0x007fffff)).to_be();
            });
            Ok(())
        }

        fn write_playback(
            &mut self,
            indices: &[usize],
            staging: &[u32],
        ) -> Result<(), StreamError> {
            if self.reject_playback {
                self.reject_playback = false;
                Err(StreamError::new(
                    StreamErrorKind::Transport,
                    "loopback rejects playback",
                ))?
            }
            let played = &mut self.played;
            indices
                .iter()
                .zip(staging.chunks_exact(self.period_size))
                .for_each(|(&i, block)| played[i].extend_from_slice(block));
            Ok(())
        }

        fn discard(&mut self) -> Result<(), StreamError> {
            self.discarded += 1;
            Ok(())
        }

        fn halt(&mut self) {
            self.halted = true;
        }

        fn release(&mut self) {
            self.released = true;
        }
    }
}
