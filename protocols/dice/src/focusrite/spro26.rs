// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Protocol specific to Focusrite Saffire Pro 26.
//!
//! The module includes structure and trait implementation for protocol defined by Focusrite for
//! Saffire Pro 26. The unit supports no mode at high rate, and has no parameter for inputs.
//!
//! The optical input interface is available exclusively for ADAT input and S/PDIF input. The
//! first six entries in router section are used to display hardware metering of analog inputs,
//! thus the default routes are fixed in the order.

use super::*;

/// Protocol implementation specific to Saffire Pro 26.
#[derive(Default, Debug)]
pub struct SPro26Protocol;

const ANALOG_INPUT_COUNT: u8 = 6;

impl SaffireproRouterSpecification for SPro26Protocol {
    const INPUTS: &'static [Input] = &[
        Input {
            id: SrcBlkId::Ins0,
            offset: 0,
            count: ANALOG_INPUT_COUNT,
            label: None,
        },
        Input {
            id: SrcBlkId::Aes,
            offset: 4,
            count: 2,
            label: Some("S/PDIF-coax"),
        },
        // NOTE: share the same optical interface.
        Input {
            id: SrcBlkId::Adat,
            offset: 0,
            count: 8,
            label: None,
        },
        Input {
            id: SrcBlkId::Aes,
            offset: 6,
            count: 2,
            label: Some("S/PDIF-opt"),
        },
    ];

    const OUTPUTS: &'static [Output] = &[
        Output {
            id: DstBlkId::Ins0,
            offset: 0,
            count: 6,
            label: None,
        },
        Output {
            id: DstBlkId::Aes,
            offset: 4,
            count: 2,
            label: Some("S/PDIF-coax"),
        },
        Output {
            id: DstBlkId::Adat,
            offset: 0,
            count: 8,
            label: None,
        },
    ];

    const RATE_MODES: &'static [RateMode] = &[RateMode::Low, RateMode::Middle];

    const TX_STREAM_CHANNELS: [[u8; 2]; 3] = [[10, 8], [10, 4], [0, 0]];

    const RX_STREAM_CHANNELS: [[u8; 2]; 3] = [[8, 0], [8, 0], [0, 0]];

    const FIXED: &'static [SrcBlk] = &[
        SrcBlk {
            id: SrcBlkId::Ins0,
            ch: 0,
        },
        SrcBlk {
            id: SrcBlkId::Ins0,
            ch: 1,
        },
        SrcBlk {
            id: SrcBlkId::Ins0,
            ch: 2,
        },
        SrcBlk {
            id: SrcBlkId::Ins0,
            ch: 3,
        },
        SrcBlk {
            id: SrcBlkId::Ins0,
            ch: 4,
        },
        SrcBlk {
            id: SrcBlkId::Ins0,
            ch: 5,
        },
    ];

    fn default_routes(rate_mode: RateMode) -> Vec<Route> {
        let mut routes = Vec::new();
        let mut add = |src_id, src_ch, dst_id, dst_ch| {
            routes.push(Route {
                src: SrcBlk {
                    id: src_id,
                    ch: src_ch,
                },
                dst: DstBlk {
                    id: dst_id,
                    ch: dst_ch,
                },
            })
        };
        let adat_count = adat_channel_count(rate_mode);

        // Analog and S/PDIF inputs to stream A. The last two channels are loops back.
        (0..ANALOG_INPUT_COUNT).for_each(|i| add(SrcBlkId::Ins0, i, DstBlkId::Avs0, i));
        (0..2).for_each(|i| add(SrcBlkId::Aes, i + 4, DstBlkId::Avs0, i + 6));
        (0..adat_count).for_each(|i| add(SrcBlkId::Adat, i, DstBlkId::Avs1, i));

        // The first pair of stream to analog outputs so that they are not muted.
        (0..6).for_each(|i| add(SrcBlkId::Avs0, i % 2, DstBlkId::Ins0, i));
        (0..2).for_each(|i| add(SrcBlkId::Mute, 0, DstBlkId::Aes, i + 4));
        (0..2).for_each(|i| add(SrcBlkId::Mute, 0, DstBlkId::Avs0, i + 8));

        // Mixer inputs.
        (0..ANALOG_INPUT_COUNT).for_each(|i| add(SrcBlkId::Ins0, i, DstBlkId::MixerTx0, i));
        (0..2).for_each(|i| add(SrcBlkId::Aes, i + 4, DstBlkId::MixerTx0, i + 6));
        (0..adat_count).for_each(|i| add(SrcBlkId::Adat, i, DstBlkId::MixerTx0, i + 8));
        (8 + adat_count..16).for_each(|i| add(SrcBlkId::Mute, 0, DstBlkId::MixerTx0, i));
        (0..2).for_each(|i| add(SrcBlkId::Avs0, i, DstBlkId::MixerTx1, i));

        routes
    }
}

impl SaffireproSwNoticeSpecification for SPro26Protocol {
    const SW_NOTICE_OFFSET: usize = 0x000c;
}

impl SaffireproOutGroupSpecification for SPro26Protocol {
    const OUT_GROUP_STATE_OFFSET: usize = 0x0010;

    const ENTRY_COUNT: usize = 6;
    const HAS_VOL_HWCTL: bool = false;
    const HAS_DIM_LEVEL: bool = true;

    const SRC_NOTICE: u32 = 0x00000001;
    const DIM_MUTE_NOTICE: u32 = 0x00000002;
}
