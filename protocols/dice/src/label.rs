// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

//! Fixed-length string field in registers.
//!
//! The unit stores bytes of string in its memory as little-endian quadlets, while transaction
//! in IEEE 1394 bus transfers quadlets in big endian. Each quadlet is therefore byte-swapped
//! when building or parsing the field.

use super::{register::*, *};

fn swap_quadlets(raw: &mut [u8]) {
    raw.chunks_exact_mut(QUADLET_SIZE)
        .for_each(|quadlet| quadlet.reverse());
}

/// Build the content of field from the string. The string longer than the field is truncated
/// at boundary of character, and the shorter one is padded with NUL.
pub fn build_label<T: AsRef<str>>(name: T, len: usize) -> Vec<u8> {
    let name = name.as_ref();
    let mut end = std::cmp::min(name.len(), len);
    while !name.is_char_boundary(end) {
        end -= 1;
    }

    let mut raw = name.as_bytes()[..end].to_vec();
    raw.resize(len, 0x00);
    swap_quadlets(&mut raw);
    raw
}

/// Parse the content of field. The result is bounded by the first NUL even if the field is
/// not terminated. Bytes out of UTF-8 are replaced with U+FFFD.
pub fn parse_label(raw: &[u8]) -> String {
    let mut raw = raw.to_vec();
    swap_quadlets(&mut raw);

    let end = raw.iter().position(|&b| b == 0x00).unwrap_or(raw.len());
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

/// The maximum size of nickname in bytes.
pub const NICKNAME_MAX_SIZE: usize = 64;

const NICKNAME_OFFSET: usize = 0x0c;

/// Field of string with fixed length in registers.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedStringField {
    location: RegisterLocation,
}

impl FixedStringField {
    pub fn new(location: RegisterLocation) -> Self {
        Self { location }
    }

    /// Nickname of the node in global section.
    pub fn nickname() -> Self {
        Self {
            location: RegisterLocation {
                space: AddressSpace::Global,
                offset: NICKNAME_OFFSET,
                width: NICKNAME_MAX_SIZE,
            },
        }
    }

    /// The length of field in bytes.
    pub fn len(&self) -> usize {
        self.location.width()
    }

    pub fn location(&self) -> &RegisterLocation {
        &self.location
    }

    /// Read the field and parse it.
    pub fn read<A: RegisterAccess + ?Sized>(&self, gateway: &mut A) -> Result<String, Error> {
        let mut raw = vec![0; self.location.width()];
        read_block(
            gateway,
            self.location.space(),
            self.location.offset(),
            &mut raw,
        )?;
        Ok(parse_label(&raw))
    }

    /// Build the field from the string and write it.
    pub fn write<A: RegisterAccess + ?Sized, T: AsRef<str>>(
        &self,
        gateway: &mut A,
        name: T,
    ) -> Result<(), Error> {
        let raw = build_label(name, self.location.width());
        write_block(gateway, self.location.space(), self.location.offset(), &raw)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn label_in_swapped_quadlets() {
        let raw = build_label("Saffire", 8);
        assert_eq!(raw, b"ffaS\0eri");
        assert_eq!(parse_label(&raw), "Saffire");
    }

    #[test]
    fn nickname_round_trip() {
        let mut regs = TestRegisters::new();
        let field = FixedStringField::nickname();

        field.write(&mut regs, "Studio A").unwrap();
        assert_eq!(field.read(&mut regs).unwrap(), "Studio A");

        let full: String = std::iter::repeat('n').take(NICKNAME_MAX_SIZE).collect();
        field.write(&mut regs, &full).unwrap();
        assert_eq!(field.read(&mut regs).unwrap(), full);

        // The shorter string overwrites whole the field.
        field.write(&mut regs, "B").unwrap();
        assert_eq!(field.read(&mut regs).unwrap(), "B");
    }

    #[test]
    fn nickname_truncated() {
        let mut regs = TestRegisters::new();
        let field = FixedStringField::nickname();

        let long: String = (0..100).map(|i| (b'a' + (i % 26) as u8) as char).collect();
        field.write(&mut regs, &long).unwrap();
        assert_eq!(field.read(&mut regs).unwrap(), &long[..NICKNAME_MAX_SIZE]);
    }

    #[test]
    fn truncation_at_character_boundary() {
        let raw = build_label("abcé", 4);
        assert_eq!(parse_label(&raw), "abc");
    }

    #[test]
    fn unterminated_field_from_unit() {
        let mut regs = TestRegisters::new();
        let field = FixedStringField::new(
            RegisterLocation::new(AddressSpace::Application, 0x40, 8).unwrap(),
        );
        // The unit supplies 8 bytes without NUL.
        regs.set(AddressSpace::Application, 0x40, u32::from_le_bytes(*b"abcd"));
        regs.set(AddressSpace::Application, 0x44, u32::from_le_bytes(*b"efgh"));
        assert_eq!(field.read(&mut regs).unwrap(), "abcdefgh");
    }

    #[test]
    fn malformed_field() {
        let mut regs = TestRegisters::new();
        let field = FixedStringField::new(
            RegisterLocation::new(AddressSpace::Application, 0x40, 4).unwrap(),
        );
        regs.set(AddressSpace::Application, 0x40, 0x000000ff);
        assert_eq!(field.read(&mut regs).unwrap(), "\u{fffd}");
    }

    #[test]
    fn nickname_in_latin1() {
        let mut regs = TestRegisters::new();
        let field = FixedStringField::nickname();
        // Written by another tool in ISO 8859-1.
        regs.set(
            AddressSpace::Global,
            0x0c,
            u32::from_le_bytes([b'C', b'a', b'f', 0xe9]),
        );
        assert_eq!(field.read(&mut regs).unwrap(), "Caf\u{fffd}");
    }
}
