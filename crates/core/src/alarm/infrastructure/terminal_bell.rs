use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crate::alarm::domain::notifier::AudibleNotifier;

const BELL: &[u8] = b"\x07";
const DEFAULT_RINGS: u32 = 3;
const DEFAULT_INTERVAL: Duration = Duration::from_millis(400);

/// Rings the terminal bell (BEL) a few times on the given sink.
pub struct TerminalBell<W: Write + Send> {
    sink: Mutex<W>,
    rings: u32,
    interval: Duration,
}

impl TerminalBell<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr(), DEFAULT_RINGS, DEFAULT_INTERVAL)
    }
}

impl<W: Write + Send> TerminalBell<W> {
    pub fn new(sink: W, rings: u32, interval: Duration) -> Self {
        Self {
            sink: Mutex::new(sink),
            rings: rings.max(1),
            interval,
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> AudibleNotifier for TerminalBell<W> {
    fn dispatch(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        for i in 0..self.rings {
            if i > 0 {
                thread::sleep(self.interval);
            }
            sink.write_all(BELL)?;
            sink.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_rings_configured_number_of_times() {
        let bell = TerminalBell::new(Vec::new(), 3, Duration::ZERO);
        bell.dispatch().unwrap();
        assert_eq!(bell.into_inner(), b"\x07\x07\x07");
    }

    #[test]
    fn test_at_least_one_ring() {
        let bell = TerminalBell::new(Vec::new(), 0, Duration::ZERO);
        bell.dispatch().unwrap();
        assert_eq!(bell.into_inner(), b"\x07");
    }

    #[test]
    fn test_write_failure_is_reported() {
        let bell = TerminalBell::new(BrokenSink, 2, Duration::ZERO);
        assert!(bell.dispatch().is_err());
    }
}
