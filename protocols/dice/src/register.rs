// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Access to registers of the unit.
//!
//! The module includes the trait to read and write register blocks in address spaces of the
//! unit, and location of register bound to any control. The implementation of trait is out of
//! the crate; e.g. asynchronous transaction over IEEE 1394 bus.

use super::*;

/// The address space of register. Each space corresponds to a section of control and status
/// register in the unit, and the offset in it is relative to the start of section.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressSpace {
    /// For global settings.
    Global,
    /// For tx stream format settings.
    TxStreamFormat,
    /// For rx stream format settings.
    RxStreamFormat,
    /// For extended status of synchronization.
    ExtSync,
    /// Capability in protocol extension.
    Caps,
    /// Command in protocol extension.
    Command,
    /// Mixer in protocol extension.
    Mixer,
    /// Peak in protocol extension.
    Peak,
    /// Router in protocol extension.
    Router,
    /// Stream format configuration in protocol extension.
    StreamFormat,
    /// Current configuration in protocol extension.
    CurrentConfig,
    /// Stand alone configuration in protocol extension.
    Standalone,
    /// Application specific configuration defined by vendors.
    Application,
}

/// Gateway to registers of the unit. Any failure should not corrupt state of caller.
pub trait RegisterAccess {
    /// Read the block of registers at the offset in the address space.
    fn read_reg_block(
        &mut self,
        space: AddressSpace,
        offset: usize,
        frames: &mut [u8],
    ) -> Result<(), Error>;

    /// Write the block of registers at the offset in the address space.
    fn write_reg_block(
        &mut self,
        space: AddressSpace,
        offset: usize,
        frames: &[u8],
    ) -> Result<(), Error>;
}

impl<T: RegisterAccess + ?Sized> RegisterAccess for &mut T {
    fn read_reg_block(
        &mut self,
        space: AddressSpace,
        offset: usize,
        frames: &mut [u8],
    ) -> Result<(), Error> {
        (**self).read_reg_block(space, offset, frames)
    }

    fn write_reg_block(
        &mut self,
        space: AddressSpace,
        offset: usize,
        frames: &[u8],
    ) -> Result<(), Error> {
        (**self).write_reg_block(space, offset, frames)
    }
}

/// Location of register; immutable once assigned to any control.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct RegisterLocation {
    pub(crate) space: AddressSpace,
    pub(crate) offset: usize,
    pub(crate) width: usize,
}

impl RegisterLocation {
    /// Location of register with the width in bytes. Both of the offset and the width should be
    /// aligned to quadlet.
    pub fn new(space: AddressSpace, offset: usize, width: usize) -> Result<Self, Error> {
        if offset % QUADLET_SIZE > 0 || width == 0 || width % QUADLET_SIZE > 0 {
            let msg = format!(
                "Register at 0x{:04x} with {} bytes is not aligned to quadlet",
                offset, width
            );
            Err(Error::new(ErrorKind::Usage, &msg))
        } else {
            Ok(Self {
                space,
                offset,
                width,
            })
        }
    }

    /// Location of quadlet register.
    pub fn quadlet(space: AddressSpace, offset: usize) -> Result<Self, Error> {
        Self::new(space, offset, QUADLET_SIZE)
    }

    pub fn space(&self) -> AddressSpace {
        self.space
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

/// The maximum size of frame in one transaction.
pub const MAX_FRAME_SIZE: usize = 512;

fn device_command_error(op: &str, space: AddressSpace, offset: usize, cause: &Error) -> Error {
    let msg = format!(
        "Fail to {} {:?} at 0x{:04x}: {}",
        op,
        space,
        offset,
        cause.message()
    );
    Error::new(ErrorKind::DeviceCommand, &msg)
}

/// Read block of registers, split into frames acceptable in one transaction.
pub fn read_block<A: RegisterAccess + ?Sized>(
    gateway: &mut A,
    space: AddressSpace,
    offset: usize,
    frames: &mut [u8],
) -> Result<(), Error> {
    frames
        .chunks_mut(MAX_FRAME_SIZE)
        .enumerate()
        .try_for_each(|(i, frame)| {
            let pos = offset + i * MAX_FRAME_SIZE;
            gateway
                .read_reg_block(space, pos, frame)
                .map_err(|cause| device_command_error("read", space, pos, &cause))
        })
}

/// Write block of registers, split into frames acceptable in one transaction.
pub fn write_block<A: RegisterAccess + ?Sized>(
    gateway: &mut A,
    space: AddressSpace,
    offset: usize,
    frames: &[u8],
) -> Result<(), Error> {
    frames
        .chunks(MAX_FRAME_SIZE)
        .enumerate()
        .try_for_each(|(i, frame)| {
            let pos = offset + i * MAX_FRAME_SIZE;
            gateway
                .write_reg_block(space, pos, frame)
                .map_err(|cause| device_command_error("write", space, pos, &cause))
        })
}

/// Read quadlet register and normalize it to host order.
pub fn read_quadlet<A: RegisterAccess + ?Sized>(
    gateway: &mut A,
    space: AddressSpace,
    offset: usize,
) -> Result<u32, Error> {
    let mut raw = [0; QUADLET_SIZE];
    read_block(gateway, space, offset, &mut raw)?;
    let mut val = 0u32;
    val.parse_quadlet(&raw);
    Ok(val)
}

/// Write quadlet register in the byte order of bus.
pub fn write_quadlet<A: RegisterAccess + ?Sized>(
    gateway: &mut A,
    space: AddressSpace,
    offset: usize,
    val: u32,
) -> Result<(), Error> {
    let mut raw = [0; QUADLET_SIZE];
    val.build_quadlet(&mut raw);
    write_block(gateway, space, offset, &raw)
}

#[cfg(test)]
pub(crate) use self::test_registers::*;

#[cfg(test)]
mod test_registers {
    use {super::*, std::collections::HashMap};

    /// Journal entry of access.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub(crate) enum Access {
        Read(AddressSpace, usize, usize),
        Write(AddressSpace, usize, u32),
    }

    /// Register map in memory, with journal of quadlet writes and fault injection.
    #[derive(Default, Debug)]
    pub(crate) struct TestRegisters {
        spaces: HashMap<AddressSpace, Vec<u8>>,
        pub(crate) journal: Vec<Access>,
        pub(crate) failed_writes: Vec<(AddressSpace, usize)>,
        pub(crate) failed_reads: Vec<(AddressSpace, usize)>,
        pub(crate) ignored_writes: Vec<(AddressSpace, usize)>,
        pub(crate) command_return: u32,
        pub(crate) command_completes: bool,
    }

    const EXECUTE_FLAG: u32 = 0x80000000;

    impl TestRegisters {
        pub(crate) fn new() -> Self {
            Self {
                command_completes: true,
                ..Default::default()
            }
        }

        fn space_mut(&mut self, space: AddressSpace, end: usize) -> &mut Vec<u8> {
            let data = self.spaces.entry(space).or_default();
            if data.len() < end {
                data.resize(end, 0);
            }
            data
        }

        pub(crate) fn set(&mut self, space: AddressSpace, offset: usize, val: u32) {
            self.space_mut(space, offset + 4)[offset..(offset + 4)]
                .copy_from_slice(&val.to_be_bytes());
        }

        pub(crate) fn get(&mut self, space: AddressSpace, offset: usize) -> u32 {
            let mut quadlet = [0; 4];
            quadlet.copy_from_slice(&self.space_mut(space, offset + 4)[offset..(offset + 4)]);
            u32::from_be_bytes(quadlet)
        }

        pub(crate) fn bytes(&mut self, space: AddressSpace, offset: usize, len: usize) -> Vec<u8> {
            self.space_mut(space, offset + len)[offset..(offset + len)].to_vec()
        }

        pub(crate) fn writes(&self) -> Vec<(AddressSpace, usize, u32)> {
            self.journal
                .iter()
                .filter_map(|access| match *access {
                    Access::Write(space, offset, val) => Some((space, offset, val)),
                    _ => None,
                })
                .collect()
        }
    }

    impl RegisterAccess for TestRegisters {
        fn read_reg_block(
            &mut self,
            space: AddressSpace,
            offset: usize,
            frames: &mut [u8],
        ) -> Result<(), Error> {
            if self.failed_reads.contains(&(space, offset)) {
                Err(Error::new(ErrorKind::DeviceCommand, "read transaction failed"))?
            }
            self.journal.push(Access::Read(space, offset, frames.len()));
            let end = offset + frames.len();
            frames.copy_from_slice(&self.space_mut(space, end)[offset..end]);
            Ok(())
        }

        fn write_reg_block(
            &mut self,
            space: AddressSpace,
            offset: usize,
            frames: &[u8],
        ) -> Result<(), Error> {
            if self.failed_writes.contains(&(space, offset)) {
                Err(Error::new(ErrorKind::DeviceCommand, "write transaction failed"))?
            }
            frames.chunks(4).enumerate().for_each(|(i, quadlet)| {
                let mut raw = [0; 4];
                raw[..quadlet.len()].copy_from_slice(quadlet);
                self.journal
                    .push(Access::Write(space, offset + i * 4, u32::from_be_bytes(raw)));
            });
            if self.ignored_writes.contains(&(space, offset)) {
                return Ok(());
            }
            let end = offset + frames.len();
            self.space_mut(space, end)[offset..end].copy_from_slice(frames);

            if space == AddressSpace::Command && offset == 0 && self.command_completes {
                let val = self.get(space, 0);
                if val & EXECUTE_FLAG > 0 {
                    self.set(space, 0, val & !EXECUTE_FLAG);
                    let ret = self.command_return;
                    self.set(space, 4, ret);
                }
            }
            Ok(())
        }
    }
}
