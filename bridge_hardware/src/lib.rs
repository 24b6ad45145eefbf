pub mod error;
#[cfg(feature = "serial")]
pub mod serial;

use bridge_traits::{BoxError, SerialChannel, SerialConnector};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::error::HwError;

#[cfg(feature = "serial")]
pub use serial::{SerialPortChannel, SerialPortConnector};

/// Packets written to a simulated port, shared between the port and whoever
/// wants to inspect traffic.
#[derive(Debug, Clone, Default)]
pub struct SimulatedLog {
    frames: Rc<RefCell<Vec<Vec<u8>>>>,
    write_failures: Rc<RefCell<VecDeque<HwError>>>,
}

impl SimulatedLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flushed frames, oldest first.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.borrow().clone()
    }

    pub fn frame_count(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Make the next write on any port sharing this log fail with `err`.
    pub fn fail_next_write(&self, err: HwError) {
        self.write_failures.borrow_mut().push_back(err);
    }
}

/// Simulated serial port; bytes are buffered until `flush` and then recorded
/// as one frame.
pub struct SimulatedSerial {
    log: SimulatedLog,
    pending: Vec<u8>,
    open: bool,
}

impl SimulatedSerial {
    pub fn new(log: SimulatedLog) -> Self {
        Self {
            log,
            pending: Vec::new(),
            open: true,
        }
    }
}

impl SerialChannel for SimulatedSerial {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        if !self.open {
            return Err(Box::new(HwError::Closed));
        }
        if let Some(err) = self.log.write_failures.borrow_mut().pop_front() {
            return Err(Box::new(err));
        }
        self.pending.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), BoxError> {
        if !self.open {
            return Err(Box::new(HwError::Closed));
        }
        let frame = std::mem::take(&mut self.pending);
        tracing::debug!(frame = ?frame, "serial frame (simulated)");
        self.log.frames.borrow_mut().push(frame);
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn close(&mut self) {
        self.open = false;
        self.pending.clear();
    }
}

/// Connector for `SimulatedSerial` with scripted open failures.
pub struct SimulatedConnector {
    log: SimulatedLog,
    open_failures: VecDeque<HwError>,
    opens: usize,
}

impl SimulatedConnector {
    pub fn new(log: SimulatedLog) -> Self {
        Self {
            log,
            open_failures: VecDeque::new(),
            opens: 0,
        }
    }

    /// Queue a failure for a future `open` call (FIFO).
    pub fn fail_open_with(mut self, err: HwError) -> Self {
        self.open_failures.push_back(err);
        self
    }

    /// Number of successful opens so far.
    pub fn opens(&self) -> usize {
        self.opens
    }
}

impl SerialConnector for SimulatedConnector {
    type Channel = SimulatedSerial;

    fn open(&mut self) -> Result<SimulatedSerial, BoxError> {
        if let Some(err) = self.open_failures.pop_front() {
            return Err(Box::new(err));
        }
        self.opens += 1;
        Ok(SimulatedSerial::new(self.log.clone()))
    }

    fn describe(&self) -> String {
        "simulated serial".to_string()
    }
}
