// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Protocol specific to Focusrite Saffire Pro 14.
//!
//! The module includes structure and trait implementation for protocol defined by Focusrite for
//! Saffire Pro 14. The unit supports no mode at high rate.

use super::*;

/// Protocol implementation specific to Saffire Pro 14.
#[derive(Default, Debug)]
pub struct SPro14Protocol;

impl SaffireproRouterSpecification for SPro14Protocol {
    const INPUTS: &'static [Input] = &[
        Input {
            id: SrcBlkId::Ins0,
            offset: 0,
            count: 4,
            label: None,
        },
        Input {
            id: SrcBlkId::Aes,
            offset: 6,
            count: 2,
            label: Some("S/PDIF"),
        },
    ];

    const OUTPUTS: &'static [Output] = &[
        Output {
            id: DstBlkId::Ins0,
            offset: 0,
            count: 4,
            label: None,
        },
        Output {
            id: DstBlkId::Aes,
            offset: 6,
            count: 2,
            label: Some("S/PDIF"),
        },
    ];

    const RATE_MODES: &'static [RateMode] = &[RateMode::Low, RateMode::Middle];

    const TX_STREAM_CHANNELS: [[u8; 2]; 3] = [[8, 0], [8, 0], [0, 0]];

    const RX_STREAM_CHANNELS: [[u8; 2]; 3] = [[12, 0], [12, 0], [0, 0]];
}

impl SaffireproSwNoticeSpecification for SPro14Protocol {
    const SW_NOTICE_OFFSET: usize = 0x000c;
}

impl SaffireproOutGroupSpecification for SPro14Protocol {
    const OUT_GROUP_STATE_OFFSET: usize = 0x0010;

    const ENTRY_COUNT: usize = 4;
    const HAS_VOL_HWCTL: bool = false;

    const SRC_NOTICE: u32 = 0x00000001;
    const DIM_MUTE_NOTICE: u32 = 0x00000002;
}

impl SaffireproInputSpecification for SPro14Protocol {
    const INPUT_PARAMS_OFFSET: usize = 0x005c;
}
