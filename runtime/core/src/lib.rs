// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2020 Takashi Sakamoto
pub mod cmdline;
pub mod dispatcher;
pub mod service;
pub mod streaming;

use {
    clap::ValueEnum,
    streaming::StreamError,
    tracing::{level_filters::LevelFilter, Level},
};

/// The level to debug runtime.
#[derive(ValueEnum, Debug, Copy, Clone, Eq, PartialEq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        Self::Debug
    }
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Install the subscriber to standard error. The call after the first one has no effect.
pub fn init_logging(log_level: Option<LogLevel>) {
    let filter = log_level
        .map(|level| LevelFilter::from_level(Level::from(level)))
        .unwrap_or(LevelFilter::OFF);
    let _ = tracing_subscriber::fmt()
        .with_max_level(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub trait RuntimeOperation<T>: Sized {
    fn new(arg: T, log_level: Option<LogLevel>) -> Result<Self, StreamError>;
    fn listen(&mut self) -> Result<(), StreamError>;
    fn run(&mut self) -> Result<(), StreamError>;
}
