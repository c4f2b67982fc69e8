// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Transport without the unit.
//!
//! The boundary of period is generated by the system clock. Each capture channel delivers
//! silence, and the quadlets queued for playback are counted and dropped. It is useful to
//! examine scheduling of dispatcher on the host.

use {
    super::{sample::sample_to_quadlet, *},
    std::{
        thread,
        time::{Duration, Instant},
    },
};

/// Transport paced by the system clock.
#[derive(Default, Debug)]
pub struct NullTransport {
    period_size: usize,
    position: u64,
    origin: Option<Instant>,
    queued_frames: u64,
    halted: bool,
}

impl NullTransport {
    pub fn new() -> Self {
        Default::default()
    }

    /// The number of frames queued for playback.
    pub fn queued_frames(&self) -> u64 {
        self.queued_frames
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

impl StreamTransport for NullTransport {
    fn commit(&mut self, channels: &[ChannelSpec], period_size: usize) -> Result<(), StreamError> {
        if channels.is_empty() || period_size == 0 {
            Err(StreamError::new(
                StreamErrorKind::Usage,
                "No channel or period to commit",
            ))?
        }
        self.period_size = period_size;
        self.position = 0;
        self.origin = None;
        self.queued_frames = 0;
        self.halted = false;
        Ok(())
    }

    // The timeout is the duration of period.
    fn wait_boundary(&mut self, timeout: Duration) -> Result<Option<PeriodBoundary>, StreamError> {
        if self.halted {
            Err(StreamError::from_static(
                StreamErrorKind::Transport,
                "The transport is halted",
            ))?
        }

        let now = Instant::now();
        let origin = *self.origin.get_or_insert(now);
        let period_size = self.period_size as u64;
        let next = self.position + period_size;
        let deadline = origin + timeout * (next / period_size) as u32;

        if deadline > now {
            thread::sleep(deadline - now);
            self.position = next;
        } else {
            // The boundaries elapsed while the dispatcher was late.
            let periods = (now - origin).as_nanos() / timeout.as_nanos().max(1);
            self.position = periods as u64 * period_size;
        }

        Ok(Some(PeriodBoundary {
            position: self.position,
        }))
    }

    fn read_capture(&mut self, _: usize, staging: &mut [u32]) -> Result<(), StreamError> {
        staging
            .iter_mut()
            .for_each(|quadlet| *quadlet = sample_to_quadlet(0));
        Ok(())
    }

    fn write_playback(&mut self, indices: &[usize], staging: &[u32]) -> Result<(), StreamError> {
        if !indices.is_empty() {
            self.queued_frames += (staging.len() / indices.len()) as u64;
        }
        Ok(())
    }

    fn discard(&mut self) -> Result<(), StreamError> {
        Ok(())
    }

    fn halt(&mut self) {
        self.halted = true;
    }

    fn release(&mut self) {
        self.origin = None;
    }
}
