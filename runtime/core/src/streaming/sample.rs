// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Conversion between quadlets of AM824 in staging and samples in client buffers.
//!
//! The staging holds quadlets in big endian as transferred in isochronous packet.

const AUDIO_LABEL: u32 = 0x40000000;
const MIDI_LABEL: u32 = 0x81000000;
const MIDI_NO_DATA: u32 = 0x80000000;
const LABEL_MASK: u32 = 0xff000000;

const SAMPLE_MASK: u32 = 0x00ffffff;
const SAMPLE_MAX: i32 = 0x007fffff;
const SAMPLE_MIN: i32 = -0x00800000;

const MIDI_BYTE_SHIFT: usize = 16;

/// The flag of MIDI byte in client buffer.
pub const MIDI_BYTE_PRESENT: u32 = 0x01000000;

fn sample_from_quadlet(quadlet: u32) -> i32 {
    ((u32::from_be(quadlet) << 8) as i32) >> 8
}

pub(crate) fn sample_to_quadlet(sample: i32) -> u32 {
    let sample = sample.clamp(SAMPLE_MIN, SAMPLE_MAX);
    (AUDIO_LABEL | (sample as u32 & SAMPLE_MASK)).to_be()
}

pub(crate) fn read_int24(staging: &[u32], client: &mut [i32]) {
    client
        .iter_mut()
        .zip(staging)
        .for_each(|(sample, &quadlet)| *sample = sample_from_quadlet(quadlet));
}

pub(crate) fn write_int24(client: &[i32], staging: &mut [u32]) {
    staging
        .iter_mut()
        .zip(client)
        .for_each(|(quadlet, &sample)| *quadlet = sample_to_quadlet(sample));
}

const FLOAT_SCALE_IN: f32 = 8388608.0;
const FLOAT_SCALE_OUT: f32 = 8388607.0;

pub(crate) fn read_float(staging: &[u32], client: &mut [f32]) {
    client.iter_mut().zip(staging).for_each(|(sample, &quadlet)| {
        *sample = sample_from_quadlet(quadlet) as f32 / FLOAT_SCALE_IN
    });
}

pub(crate) fn write_float(client: &[f32], staging: &mut [u32]) {
    staging.iter_mut().zip(client).for_each(|(quadlet, &sample)| {
        let sample = if sample.is_nan() {
            0.0
        } else {
            sample.clamp(-1.0, 1.0)
        };
        *quadlet = sample_to_quadlet((sample * FLOAT_SCALE_OUT).round() as i32)
    });
}

pub(crate) fn read_midi(staging: &[u32], client: &mut [u32]) {
    client.iter_mut().zip(staging).for_each(|(event, &quadlet)| {
        let quadlet = u32::from_be(quadlet);
        *event = if quadlet & LABEL_MASK == MIDI_LABEL {
            MIDI_BYTE_PRESENT | ((quadlet >> MIDI_BYTE_SHIFT) & 0xff)
        } else {
            0
        };
    });
}

pub(crate) fn write_midi(client: &[u32], staging: &mut [u32]) {
    staging.iter_mut().zip(client).for_each(|(quadlet, &event)| {
        let val = if event & MIDI_BYTE_PRESENT > 0 {
            MIDI_LABEL | ((event & 0xff) << MIDI_BYTE_SHIFT)
        } else {
            MIDI_NO_DATA
        };
        *quadlet = val.to_be();
    });
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn int24_sign_extension() {
        let staging = [0x40000001u32.to_be(), 0x40ffffffu32.to_be(), 0x40800000u32.to_be()];
        let mut client = [0i32; 3];
        read_int24(&staging, &mut client);
        assert_eq!(client, [1, -1, -0x800000]);

        let mut staging = [0u32; 3];
        write_int24(&[0x7fffff, -2, 0x1000000], &mut staging);
        assert_eq!(
            staging.iter().map(|&q| u32::from_be(q)).collect::<Vec<_>>(),
            vec![0x407fffff, 0x40fffffe, 0x407fffff]
        );
    }

    #[test]
    fn float_scale() {
        let staging = [0x40400000u32.to_be(), 0x40c00000u32.to_be()];
        let mut client = [0f32; 2];
        read_float(&staging, &mut client);
        assert_eq!(client, [0.5, -0.5]);

        let mut staging = [0u32; 3];
        write_float(&[1.5, -1.0, 0.0], &mut staging);
        assert_eq!(
            staging.iter().map(|&q| u32::from_be(q)).collect::<Vec<_>>(),
            vec![0x407fffff, 0x40800001, 0x40000000]
        );
    }

    #[test]
    fn midi_bytes() {
        let staging = [0x81900000u32.to_be(), 0x80000000u32.to_be(), 0x40123456u32.to_be()];
        let mut client = [0xffu32; 3];
        read_midi(&staging, &mut client);
        assert_eq!(client, [0x01000090, 0, 0]);

        let mut staging = [0u32; 2];
        write_midi(&[0x0100003c, 0x0000003c], &mut staging);
        assert_eq!(
            staging.iter().map(|&q| u32::from_be(q)).collect::<Vec<_>>(),
            vec![0x813c0000, 0x80000000]
        );
    }
}
