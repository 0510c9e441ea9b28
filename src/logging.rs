/* This is part of nodegyp-offline - which is under the MIT License ***********/

use log::{Record, Level, Metadata, LevelFilter};
use snafu::{OptionExt};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};
use crate::error::Result;
use crate::error;
use std::io::Write;

struct Logger;

static LOGGER: Logger = Logger;

/// Prefix and color used to print a record of the given level, and whether
/// it goes to stderr.
fn level_style(level: Level) -> (&'static str, Color, bool) {
    match level {
        Level::Error => ("error", Color::Red, true),
        Level::Warn => ("warning", Color::Yellow, true),
        Level::Info => ("info", Color::Green, false),
        Level::Debug => ("debug", Color::Blue, false),
        Level::Trace => ("trace", Color::White, false),
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if ! self.enabled(record.metadata()) {
            return;
        }
        let (lvl, color, use_stderr) = level_style(record.level());
        let mut spec = ColorSpec::new();
        spec.set_fg(Some(color)).set_intense(true).set_bold(true);

        let (mut stream, use_color) = if use_stderr {
            (StandardStream::stderr(ColorChoice::Auto),
             atty::is(atty::Stream::Stderr))
        } else {
            (StandardStream::stdout(ColorChoice::Auto),
             atty::is(atty::Stream::Stdout))
        };

        // Failing to set colors is not worth reporting. Failing to write at
        // all falls back on eprintln!().
        if use_color {
            let _ = stream.set_color(&spec);
        }
        if let Err(_) = write!(&mut stream, "{}", lvl) {
            eprintln!("{}", lvl);
        }
        if use_color {
            spec.clear();
            let _ = stream.set_color(&spec);
        }
        if let Err(_) = writeln!(&mut stream, ": {}", record.args()) {
            eprintln!(": {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Map the number of --verbose flags to a log level
pub fn level_from_verbosity(occurrences: u64) -> LevelFilter {
    match occurrences {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

pub fn init(max_level: LevelFilter) -> Result<()> {
    log::set_logger(&LOGGER).map(|()| {
        log::set_max_level(max_level)
    }).ok().context(error::LogInitFailed{})
}
