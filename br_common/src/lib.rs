#![doc(
  html_playground_url = "https://play.rust-lang.org/",
  test(no_crate_inject, attr(deny(warnings)))
)]

#[macro_use]
extern crate log;

use log::LevelFilter;

pub mod chunk;
pub mod config;
pub mod math;
pub mod nbt;
pub mod util;

/// Initializes logger. Might do more things in the future.
pub fn init(name: &str) { init_with_level(name, LevelFilter::Info) }

/// Installs the stdout logger, with the given max level. If a logger has
/// already been installed (which happens a lot in tests), this only updates the
/// max level.
pub fn init_with_level(_name: &str, level: LevelFilter) {
  use log::{Level, Metadata, Record};

  struct Logger;

  impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool { metadata.level() <= log::max_level() }

    fn log(&self, record: &Record) {
      if self.enabled(record.metadata()) {
        #[cfg(feature = "utclogs")]
        let now = chrono::Utc::now();
        #[cfg(not(feature = "utclogs"))]
        let now = chrono::Local::now();
        print!("{} ", now.format("%Y-%m-%d %H:%M:%S%.3f"));
        #[cfg(debug_assertions)]
        {
          if let Some(path) = record.module_path() {
            print!("{path}");
          }
          if let Some(line) = record.line() {
            print!(":{line}");
          }
          print!(" ");
        }
        match record.level() {
          Level::Trace => print!("[\x1b[36mTRACE\x1b[0m]"),
          Level::Debug => print!("[\x1b[34mDEBUG\x1b[0m]"),
          Level::Info => print!("[\x1b[32mINFO\x1b[0m]"),
          Level::Warn => print!("[\x1b[33mWARN\x1b[0m]"),
          Level::Error => print!("[\x1b[31m\x1b[1mERROR\x1b[0m]"),
        }
        println!(" {}", record.args());
      }
    }

    fn flush(&self) {}
  }

  static LOGGER: Logger = Logger;
  if log::set_logger(&LOGGER).is_err() {
    debug!("logger was already installed, only updating the level");
  }
  log::set_max_level(level);
}
