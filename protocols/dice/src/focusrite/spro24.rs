// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Protocol specific to Focusrite Saffire Pro 24.
//!
//! The module includes structure and trait implementation for protocol defined by Focusrite for
//! Saffire Pro 24.
//!
//! ## Ports and streams
//!
//! The optical interface is available exclusively for ADAT input and S/PDIF input. The unit
//! supports no mode at high rate.
//!
//! ```text
//! XLR/Phone input 1/2 --------> analog-input-1/2 ----> (router) ---> analog-output-1..6
//! Phone input 3..6 -----------> analog-input-3..6                 -> spdif-output-1/2
//! Coaxial input 1/2 ----------> spdif-input-1/2
//! Optical input ------or------> spdif-input-3/4
//!                     +-------> adat-input-1..8
//! stream-input-1..8 ----------> (router) ---> stream-output-1..16
//! ```

use super::*;

/// Protocol implementation specific to Saffire Pro 24.
#[derive(Default, Debug)]
pub struct SPro24Protocol;

impl SaffireproRouterSpecification for SPro24Protocol {
    const INPUTS: &'static [Input] = &[
        Input {
            id: SrcBlkId::Ins0,
            offset: 2,
            count: 2,
            label: Some("Mic"),
        },
        Input {
            id: SrcBlkId::Ins0,
            offset: 0,
            count: 2,
            label: Some("Line"),
        },
        Input {
            id: SrcBlkId::Aes,
            offset: 6,
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
            offset: 4,
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
            offset: 6,
            count: 2,
            label: Some("S/PDIF-coax"),
        },
    ];

    const RATE_MODES: &'static [RateMode] = &[RateMode::Low, RateMode::Middle];

    const TX_STREAM_CHANNELS: [[u8; 2]; 3] = [[16, 0], [12, 0], [0, 0]];

    const RX_STREAM_CHANNELS: [[u8; 2]; 3] = [[8, 0], [8, 0], [0, 0]];
}

impl SaffireproSwNoticeSpecification for SPro24Protocol {
    const SW_NOTICE_OFFSET: usize = 0x0068;
}

impl SaffireproOutGroupSpecification for SPro24Protocol {
    const OUT_GROUP_STATE_OFFSET: usize = 0x000c;

    const ENTRY_COUNT: usize = 6;
    const HAS_VOL_HWCTL: bool = false;

    const SRC_NOTICE: u32 = 0x00000001;
    const DIM_MUTE_NOTICE: u32 = 0x00000002;
}

impl SaffireproInputSpecification for SPro24Protocol {
    const INPUT_PARAMS_OFFSET: usize = 0x0058;
}
