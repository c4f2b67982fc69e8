// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (c) 2022 Takashi Sakamoto

use {
    super::{streaming::*, LogLevel, RuntimeOperation},
    clap::{Args, Parser},
    std::{convert::TryFrom, ffi::OsString},
};

/// Arguments for parameters of stream.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct StreamArgs {
    /// The number of frames in period.
    #[arg(long, default_value_t = 256)]
    pub period_size: usize,

    /// The sampling rate in Hz.
    #[arg(long, default_value_t = 48000)]
    pub sample_rate: u32,

    /// The level to debug runtime, disabled as a default.
    #[arg(short, long, value_enum)]
    pub log_level: Option<LogLevel>,
}

impl TryFrom<&StreamArgs> for StreamConfig {
    type Error = StreamError;

    fn try_from(args: &StreamArgs) -> Result<Self, Self::Error> {
        if args.period_size == 0 || args.sample_rate == 0 {
            let msg = format!(
                "Invalid parameters: period size {}, sampling rate {}",
                args.period_size, args.sample_rate
            );
            Err(StreamError::new(StreamErrorKind::Usage, &msg))
        } else {
            Ok(StreamConfig {
                period_size: args.period_size,
                sample_rate: args.sample_rate,
            })
        }
    }
}

pub trait ServiceCmd<A, T, R>: Sized
where
    A: Parser,
    R: RuntimeOperation<T>,
{
    fn params(args: &A) -> (T, Option<LogLevel>);

    /// Parse the arguments, then launch the runtime. The exit code is returned.
    fn execute<I, S>(args: I) -> i32
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString> + Clone,
    {
        let args = match A::try_parse_from(args) {
            Ok(args) => args,
            Err(err) => {
                // Help and version are not failure.
                let _ = err.print();
                return if err.use_stderr() {
                    libc::EXIT_FAILURE
                } else {
                    libc::EXIT_SUCCESS
                };
            }
        };

        let (params, log_level) = Self::params(&args);
        R::new(params, log_level)
            .and_then(|mut runtime| {
                runtime.listen()?;
                runtime.run()
            })
            .map(|_| libc::EXIT_SUCCESS)
            .unwrap_or_else(|err| {
                eprintln!("{}", err);
                libc::EXIT_FAILURE
            })
    }

    fn run() {
        let code = Self::execute(std::env::args_os());
        std::process::exit(code)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Parser, Debug)]
    struct Arguments {
        #[command(flatten)]
        stream: StreamArgs,

        #[arg(long)]
        fail: bool,
    }

    struct DummyRuntime {
        fail: bool,
    }

    impl RuntimeOperation<(StreamConfig, bool)> for DummyRuntime {
        fn new(
            (_, fail): (StreamConfig, bool),
            _: Option<LogLevel>,
        ) -> Result<Self, StreamError> {
            Ok(Self { fail })
        }

        fn listen(&mut self) -> Result<(), StreamError> {
            Ok(())
        }

        fn run(&mut self) -> Result<(), StreamError> {
            if self.fail {
                Err(StreamError::new(StreamErrorKind::Transport, "disconnected"))
            } else {
                Ok(())
            }
        }
    }

    struct DummyCmd;

    impl ServiceCmd<Arguments, (StreamConfig, bool), DummyRuntime> for DummyCmd {
        fn params(args: &Arguments) -> ((StreamConfig, bool), Option<LogLevel>) {
            let config = StreamConfig::try_from(&args.stream).unwrap_or_default();
            ((config, args.fail), args.stream.log_level)
        }
    }

    #[test]
    fn stream_arguments() {
        let args = Arguments::try_parse_from(["cmd"]).unwrap();
        assert_eq!(
            StreamConfig::try_from(&args.stream).unwrap(),
            StreamConfig::default()
        );
        assert_eq!(args.stream.log_level, None);

        let args = Arguments::try_parse_from([
            "cmd",
            "--period-size",
            "64",
            "--sample-rate",
            "96000",
            "-l",
            "warn",
        ])
        .unwrap();
        assert_eq!(
            StreamConfig::try_from(&args.stream).unwrap(),
            StreamConfig {
                period_size: 64,
                sample_rate: 96000,
            }
        );
        assert_eq!(args.stream.log_level, Some(LogLevel::Warn));

        let args = Arguments::try_parse_from(["cmd", "--period-size", "0"]).unwrap();
        let err = StreamConfig::try_from(&args.stream).unwrap_err();
        assert!(err.is(StreamErrorKind::Usage));

        assert!(Arguments::try_parse_from(["cmd", "-l", "verbose"]).is_err());
    }

    #[test]
    fn exit_code() {
        assert_eq!(DummyCmd::execute(["cmd"]), libc::EXIT_SUCCESS);
        assert_eq!(DummyCmd::execute(["cmd", "--fail"]), libc::EXIT_FAILURE);
        assert_eq!(DummyCmd::execute(["cmd", "--unknown"]), libc::EXIT_FAILURE);
    }
}
