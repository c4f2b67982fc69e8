// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Entries in router section.
//!
//! The section starts with a quadlet for the number of entries, followed by the entries. Each
//! entry is a quadlet: destination block in bits 0-7, source block in bits 8-15, and peak level
//! detected by the unit in bits 16-31. The block consists of category in the upper nibble and
//! channel in the lower nibble.

use super::*;

const ID_MASK: u8 = 0xf0;
const ID_SHIFT: usize = 4;
const CH_MASK: u8 = 0x0f;

impl SrcBlkId {
    const AES_VALUE: u8 = 0;
    const ADAT_VALUE: u8 = 1;
    const MIXER_VALUE: u8 = 2;
    const INS0_VALUE: u8 = 4;
    const INS1_VALUE: u8 = 5;
    const ARM_APR_AUDIO_VALUE: u8 = 10;
    const AVS0_VALUE: u8 = 11;
    const AVS1_VALUE: u8 = 12;
    const MUTE_VALUE: u8 = 15;
}

impl From<SrcBlkId> for u8 {
    fn from(id: SrcBlkId) -> Self {
        match id {
            SrcBlkId::Aes => SrcBlkId::AES_VALUE,
            SrcBlkId::Adat => SrcBlkId::ADAT_VALUE,
            SrcBlkId::Mixer => SrcBlkId::MIXER_VALUE,
            SrcBlkId::Ins0 => SrcBlkId::INS0_VALUE,
            SrcBlkId::Ins1 => SrcBlkId::INS1_VALUE,
            SrcBlkId::ArmAprAudio => SrcBlkId::ARM_APR_AUDIO_VALUE,
            SrcBlkId::Avs0 => SrcBlkId::AVS0_VALUE,
            SrcBlkId::Avs1 => SrcBlkId::AVS1_VALUE,
            SrcBlkId::Mute => SrcBlkId::MUTE_VALUE,
            SrcBlkId::Reserved(val) => val,
        }
    }
}

impl From<u8> for SrcBlkId {
    fn from(val: u8) -> Self {
        match val {
            Self::AES_VALUE => Self::Aes,
            Self::ADAT_VALUE => Self::Adat,
            Self::MIXER_VALUE => Self::Mixer,
            Self::INS0_VALUE => Self::Ins0,
            Self::INS1_VALUE => Self::Ins1,
            Self::ARM_APR_AUDIO_VALUE => Self::ArmAprAudio,
            Self::AVS0_VALUE => Self::Avs0,
            Self::AVS1_VALUE => Self::Avs1,
            Self::MUTE_VALUE => Self::Mute,
            _ => Self::Reserved(val),
        }
    }
}

impl DstBlkId {
    const AES_VALUE: u8 = 0;
    const ADAT_VALUE: u8 = 1;
    const MIXER_TX0_VALUE: u8 = 2;
    const MIXER_TX1_VALUE: u8 = 3;
    const INS0_VALUE: u8 = 4;
    const INS1_VALUE: u8 = 5;
    const ARM_APB_AUDIO_VALUE: u8 = 10;
    const AVS0_VALUE: u8 = 11;
    const AVS1_VALUE: u8 = 12;
}

impl From<DstBlkId> for u8 {
    fn from(id: DstBlkId) -> Self {
        match id {
            DstBlkId::Aes => DstBlkId::AES_VALUE,
            DstBlkId::Adat => DstBlkId::ADAT_VALUE,
            DstBlkId::MixerTx0 => DstBlkId::MIXER_TX0_VALUE,
            DstBlkId::MixerTx1 => DstBlkId::MIXER_TX1_VALUE,
            DstBlkId::Ins0 => DstBlkId::INS0_VALUE,
            DstBlkId::Ins1 => DstBlkId::INS1_VALUE,
            DstBlkId::ArmApbAudio => DstBlkId::ARM_APB_AUDIO_VALUE,
            DstBlkId::Avs0 => DstBlkId::AVS0_VALUE,
            DstBlkId::Avs1 => DstBlkId::AVS1_VALUE,
            DstBlkId::Reserved(val) => val,
        }
    }
}

impl From<u8> for DstBlkId {
    fn from(val: u8) -> Self {
        match val {
            Self::AES_VALUE => Self::Aes,
            Self::ADAT_VALUE => Self::Adat,
            Self::MIXER_TX0_VALUE => Self::MixerTx0,
            Self::MIXER_TX1_VALUE => Self::MixerTx1,
            Self::INS0_VALUE => Self::Ins0,
            Self::INS1_VALUE => Self::Ins1,
            Self::ARM_APB_AUDIO_VALUE => Self::ArmApbAudio,
            Self::AVS0_VALUE => Self::Avs0,
            Self::AVS1_VALUE => Self::Avs1,
            _ => Self::Reserved(val),
        }
    }
}

impl From<SrcBlk> for u8 {
    fn from(blk: SrcBlk) -> Self {
        ((u8::from(blk.id) << ID_SHIFT) & ID_MASK) | (blk.ch & CH_MASK)
    }
}

impl From<u8> for SrcBlk {
    fn from(val: u8) -> Self {
        SrcBlk {
            id: SrcBlkId::from((val & ID_MASK) >> ID_SHIFT),
            ch: val & CH_MASK,
        }
    }
}

impl From<DstBlk> for u8 {
    fn from(blk: DstBlk) -> Self {
        ((u8::from(blk.id) << ID_SHIFT) & ID_MASK) | (blk.ch & CH_MASK)
    }
}

impl From<u8> for DstBlk {
    fn from(val: u8) -> Self {
        DstBlk {
            id: DstBlkId::from((val & ID_MASK) >> ID_SHIFT),
            ch: val & CH_MASK,
        }
    }
}

/// Entry of route in router section.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct RouterEntry {
    pub dst: DstBlk,
    pub src: SrcBlk,
    /// Peak level detected by the unit. Ignored when writing.
    pub peak: u16,
}

const DST_SHIFT: usize = 0;
const SRC_SHIFT: usize = 8;
const PEAK_SHIFT: usize = 16;

impl From<&RouterEntry> for u32 {
    fn from(entry: &RouterEntry) -> Self {
        ((entry.peak as u32) << PEAK_SHIFT)
            | ((u8::from(entry.src) as u32) << SRC_SHIFT)
            | ((u8::from(entry.dst) as u32) << DST_SHIFT)
    }
}

impl From<u32> for RouterEntry {
    fn from(val: u32) -> Self {
        RouterEntry {
            dst: DstBlk::from((val >> DST_SHIFT) as u8),
            src: SrcBlk::from((val >> SRC_SHIFT) as u8),
            peak: (val >> PEAK_SHIFT) as u16,
        }
    }
}

fn serialize_router_entries(entries: &[RouterEntry]) -> Vec<u8> {
    let mut raw = vec![0u8; QUADLET_SIZE * (1 + entries.len())];
    (entries.len() as u32).build_quadlet(&mut raw[..QUADLET_SIZE]);
    raw[QUADLET_SIZE..]
        .chunks_exact_mut(QUADLET_SIZE)
        .zip(entries)
        .for_each(|(quadlet, entry)| u32::from(entry).build_quadlet(quadlet));
    raw
}

/// Serialize entries and write them to router section.
pub(crate) fn write_router_entries<A: RegisterAccess + ?Sized>(
    gateway: &mut A,
    entries: &[RouterEntry],
) -> Result<(), Error> {
    let raw = serialize_router_entries(entries);
    write_block(gateway, AddressSpace::Router, 0, &raw)
}

/// Read entries from router section. The number of entries is bounded by the capacity.
pub fn read_router_entries<A: RegisterAccess + ?Sized>(
    gateway: &mut A,
    capacity: usize,
) -> Result<Vec<RouterEntry>, Error> {
    let count = read_quadlet(gateway, AddressSpace::Router, 0)? as usize;
    if count > capacity {
        let msg = format!(
            "The number of router entries is {}, more than {}",
            count, capacity
        );
        Err(Error::new(ErrorKind::Invalid, &msg))?
    }

    let mut raw = vec![0u8; QUADLET_SIZE * count];
    read_block(gateway, AddressSpace::Router, QUADLET_SIZE, &mut raw)?;

    let entries = raw
        .chunks_exact(QUADLET_SIZE)
        .map(|quadlet| {
            let mut val = 0u32;
            val.parse_quadlet(quadlet);
            RouterEntry::from(val)
        })
        .collect();

    Ok(entries)
}
