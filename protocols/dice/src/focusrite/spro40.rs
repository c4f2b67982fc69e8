// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2021 Takashi Sakamoto

//! Protocol specific to Focusrite Saffire Pro 40.
//!
//! The module includes structure and trait implementation for protocol defined by Focusrite for
//! Saffire Pro 40.
//!
//! ## Ports and streams
//!
//! The optical interface is available exclusively for ADAT input and S/PDIF input. The unit
//! transmits 20 channels in two streams and receives 20 channels in two streams at low rate.
//!
//! ```text
//! XLR input 1..8 -------------> analog-input-1..8 ---> (router) ---> analog-output-1..10
//! Coaxial input 1/2 ----------> spdif-coax-input-1/2              -> spdif-coax-output-1/2
//! Optical input ------or------> spdif-opt-input-1/2               -> spdif-opt-output-1/2
//!                     +-------> adat-input-1..8                   -> adat-output-1..8
//! stream-input-A-1..12 -------> (router) ---> stream-output-A-1..10
//! stream-input-B-1..8 --------> (router) ---> stream-output-B-1..10
//! ```
//!
//! The output group controls the volume of analog-output-1..10, and supports the hardware knob.

use super::*;

/// Protocol implementation specific to Saffire Pro 40.
#[derive(Default, Debug)]
pub struct SPro40Protocol;

impl SaffireproRouterSpecification for SPro40Protocol {
    const INPUTS: &'static [Input] = &[
        Input {
            id: SrcBlkId::Ins1,
            offset: 0,
            count: 8,
            label: None,
        },
        Input {
            id: SrcBlkId::Aes,
            offset: 0,
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
            count: 2,
            label: None,
        },
        Output {
            id: DstBlkId::Ins1,
            offset: 0,
            count: 8,
            label: None,
        },
        Output {
            id: DstBlkId::Aes,
            offset: 0,
            count: 2,
            label: Some("S/PDIF-coax"),
        },
        // NOTE: share the same optical interface.
        Output {
            id: DstBlkId::Adat,
            offset: 0,
            count: 8,
            label: None,
        },
        Output {
            id: DstBlkId::Aes,
            offset: 4,
            count: 2,
            label: Some("S/PDIF-opt"),
        },
    ];

    const RATE_MODES: &'static [RateMode] = &[RateMode::Low, RateMode::Middle, RateMode::High];

    const TX_STREAM_CHANNELS: [[u8; 2]; 3] = [[10, 10], [10, 6], [8, 2]];

    const RX_STREAM_CHANNELS: [[u8; 2]; 3] = [[12, 8], [12, 4], [8, 2]];
}

impl SaffireproSwNoticeSpecification for SPro40Protocol {
    const SW_NOTICE_OFFSET: usize = 0x0068;
}

const SRC_SW_NOTICE: u32 = 0x00000001;
const DIM_MUTE_SW_NOTICE: u32 = 0x00000002;

impl SaffireproOutGroupSpecification for SPro40Protocol {
    const OUT_GROUP_STATE_OFFSET: usize = 0x000c;

    const ENTRY_COUNT: usize = 10;
    const HAS_VOL_HWCTL: bool = true;
    const HAS_DIM_LEVEL: bool = true;

    const SRC_NOTICE: u32 = SRC_SW_NOTICE;
    const DIM_MUTE_NOTICE: u32 = DIM_MUTE_SW_NOTICE;
}
