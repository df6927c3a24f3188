use std::fmt::Display;

use chrono::Local;

#[derive(Clone, Copy)]
enum Level {
    Info,
    Debug,
    Error,
}

impl Level {
    fn as_str(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Error => "ERROR",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Level::Info => "",
            Level::Debug => "d",
            Level::Error => "e",
        }
    }
}

/// Plain stdout logger. `verbose` stamps every line with the wall clock for
/// long-running services; `compact` keeps short-lived tools down to a level
/// prefix and the service name.
pub struct Logger {
    service: &'static str,
    compact: bool,
}

impl Logger {
    pub const fn verbose(service: &'static str) -> Self {
        Self {
            service,
            compact: false,
        }
    }

    pub const fn compact(service: &'static str) -> Self {
        Self {
            service,
            compact: true,
        }
    }

    fn render(&self, level: Level, msg: impl Display) -> String {
        if self.compact {
            format!("{}[{}] {}", level.prefix(), self.service, msg)
        } else {
            format!(
                "[{}] {} {}: {}",
                self.service,
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                level.as_str(),
                msg
            )
        }
    }

    pub fn info(&self, msg: impl Display) {
        println!("{}", self.render(Level::Info, msg));
    }

    pub fn debug(&self, msg: impl Display) {
        println!("{}", self.render(Level::Debug, msg));
    }

    pub fn error(&self, error: impl Display) {
        println!("{}", self.render(Level::Error, error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_lines_carry_level_prefix() {
        let logger = Logger::compact("cli");
        assert_eq!(logger.render(Level::Error, "boom"), "e[cli] boom");
        assert_eq!(logger.render(Level::Info, "ok"), "[cli] ok");
    }

    #[test]
    fn verbose_lines_carry_service_and_level() {
        let logger = Logger::verbose("node");
        let line = logger.render(Level::Info, "started");
        assert!(line.starts_with("[node] "));
        assert!(line.ends_with("INFO: started"));
    }
}
