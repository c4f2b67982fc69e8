// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Command section in protocol extension defined by TCAT for ASICs of DICE.
//!
//! The unit executes the command written to opcode register with execute flag, then clears the
//! flag when finishing it.

use {
    super::{register::*, router::RateMode, *},
    std::{thread, time::Duration},
};

/// Operation code of command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Opcode {
    /// No operation.
    NoOp,
    /// Load router configuration to router section at given rate.
    LoadRouter(RateMode),
    /// Load stream format configuration to stream format section at given rate.
    LoadStreamConfig(RateMode),
    /// Load both router and stream format configurations at given rate.
    LoadRouterStreamConfig(RateMode),
    /// Load all configurations from on-board flash memory.
    LoadConfigFromFlash,
    /// Store all configurations to on-board flash memory.
    StoreConfigToFlash,
}

impl Opcode {
    const NOOP_VALUE: u32 = 0x0000;
    const LOAD_ROUTER_VALUE: u32 = 0x0001;
    const LOAD_STREAM_CONFIG_VALUE: u32 = 0x0002;
    const LOAD_ROUTER_STREAM_CONFIG_VALUE: u32 = 0x0003;
    const LOAD_FLASH_CONFIG_VALUE: u32 = 0x0004;
    const STORE_FLASH_CONFIG_VALUE: u32 = 0x0005;

    const LOW_FLAG: u32 = 0x00010000;
    const MIDDLE_FLAG: u32 = 0x00020000;
    const HIGH_FLAG: u32 = 0x00040000;
}

fn rate_flag(rate_mode: RateMode) -> u32 {
    match rate_mode {
        RateMode::Low => Opcode::LOW_FLAG,
        RateMode::Middle => Opcode::MIDDLE_FLAG,
        RateMode::High => Opcode::HIGH_FLAG,
    }
}

/// The flag to request execution of command. The unit clears it at completion.
pub const EXECUTE_FLAG: u32 = 0x80000000;

impl From<Opcode> for u32 {
    fn from(code: Opcode) -> Self {
        let val = match code {
            Opcode::NoOp => Opcode::NOOP_VALUE,
            Opcode::LoadRouter(rate_mode) => rate_flag(rate_mode) | Opcode::LOAD_ROUTER_VALUE,
            Opcode::LoadStreamConfig(rate_mode) => {
                rate_flag(rate_mode) | Opcode::LOAD_STREAM_CONFIG_VALUE
            }
            Opcode::LoadRouterStreamConfig(rate_mode) => {
                rate_flag(rate_mode) | Opcode::LOAD_ROUTER_STREAM_CONFIG_VALUE
            }
            Opcode::LoadConfigFromFlash => Opcode::LOAD_FLASH_CONFIG_VALUE,
            Opcode::StoreConfigToFlash => Opcode::STORE_FLASH_CONFIG_VALUE,
        };
        val | EXECUTE_FLAG
    }
}

const OPCODE_OFFSET: usize = 0x00;
const RETURN_OFFSET: usize = 0x04;

const POLL_COUNT: usize = 10;
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Initiate command and wait for its completion, then return the value in return register.
pub fn initiate<A: RegisterAccess + ?Sized>(gateway: &mut A, opcode: Opcode) -> Result<u32, Error> {
    write_quadlet(
        gateway,
        AddressSpace::Command,
        OPCODE_OFFSET,
        u32::from(opcode),
    )?;

    let mut count = 0;
    while count < POLL_COUNT {
        thread::sleep(POLL_INTERVAL);

        let val = read_quadlet(gateway, AddressSpace::Command, OPCODE_OFFSET)?;
        if val & EXECUTE_FLAG == 0 {
            return read_quadlet(gateway, AddressSpace::Command, RETURN_OFFSET);
        }
        count += 1;
    }

    let msg = format!("Operation timeout for {:?}", opcode);
    Err(Error::new(ErrorKind::DeviceCommand, &msg))
}

/// Store current configuration to on-board flash memory.
pub fn store_configuration<A: RegisterAccess + ?Sized>(gateway: &mut A) -> Result<(), Error> {
    initiate(gateway, Opcode::StoreConfigToFlash).map(|_| ())
}

/// Load configuration from on-board flash memory.
pub fn load_configuration<A: RegisterAccess + ?Sized>(gateway: &mut A) -> Result<(), Error> {
    initiate(gateway, Opcode::LoadConfigFromFlash).map(|_| ())
}
