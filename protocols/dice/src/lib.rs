// SPDX-License-Identifier: LGPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto

#![doc = include_str!("../README.md")]

pub mod command;
pub mod control;
pub mod focusrite;
pub mod label;
pub mod register;
pub mod router;
pub mod surface;

use std::fmt;

/// The kind of error in operations of the crate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The operation is called outside its valid state or with invalid arguments.
    Usage,
    /// Any transaction to the unit failed, or the unit did not accept the change.
    DeviceCommand,
    /// The configuration is not supported by the model.
    Unsupported,
    /// The content read from the unit is malformed.
    Invalid,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            ErrorKind::Usage => "usage",
            ErrorKind::DeviceCommand => "device-command",
            ErrorKind::Unsupported => "unsupported",
            ErrorKind::Invalid => "invalid",
        };
        f.write_str(label)
    }
}

/// Error with its kind and message.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {msg}")]
pub struct Error {
    kind: ErrorKind,
    msg: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: &str) -> Self {
        Self {
            kind,
            msg: msg.to_string(),
        }
    }

    /// The kind of error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether the error is the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    /// The message of error.
    pub fn message(&self) -> &str {
        &self.msg
    }
}

const QUADLET_SIZE: usize = 4;

/// For conversion between quadlet-aligned byte array in big endian and computed value.
trait QuadletConvert {
    fn build_quadlet(&self, raw: &mut [u8]);
    fn parse_quadlet(&mut self, raw: &[u8]);
}

impl QuadletConvert for u32 {
    fn build_quadlet(&self, raw: &mut [u8]) {
        assert_eq!(
            raw.len(),
            QUADLET_SIZE,
            "Programming error for length of quadlet data"
        );
        raw.copy_from_slice(&self.to_be_bytes());
    }

    fn parse_quadlet(&mut self, raw: &[u8]) {
        assert_eq!(
            raw.len(),
            QUADLET_SIZE,
            "Programming error for length of quadlet data"
        );
        let mut quadlet = [0; 4];
        quadlet.copy_from_slice(raw);
        *self = u32::from_be_bytes(quadlet);
    }
}

impl QuadletConvert for bool {
    fn build_quadlet(&self, raw: &mut [u8]) {
        (*self as u32).build_quadlet(raw)
    }

    fn parse_quadlet(&mut self, raw: &[u8]) {
        let mut val = 0u32;
        val.parse_quadlet(raw);
        *self = val > 0;
    }
}
