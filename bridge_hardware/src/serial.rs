use std::io::Write;
use std::time::Duration;

use bridge_traits::{BoxError, SerialChannel, SerialConnector};
use tracing::{debug, trace};

use crate::error::{HwError, Result};

/// A physical serial port opened through the `serialport` crate.
pub struct SerialPortChannel {
    port: Option<Box<dyn serialport::SerialPort>>,
    name: String,
}

impl SerialPortChannel {
    fn port_mut(&mut self) -> Result<&mut Box<dyn serialport::SerialPort>> {
        self.port.as_mut().ok_or(HwError::Closed)
    }
}

impl SerialChannel for SerialPortChannel {
    fn write(&mut self, bytes: &[u8]) -> std::result::Result<(), BoxError> {
        let port = self.port_mut()?;
        port.write_all(bytes).map_err(HwError::from_io)?;
        trace!(len = bytes.len(), "serial write");
        Ok(())
    }

    fn flush(&mut self) -> std::result::Result<(), BoxError> {
        let port = self.port_mut()?;
        port.flush().map_err(HwError::from_io)?;
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            debug!(port = %self.name, "serial port closed");
        }
    }
}

/// Opens `path` at `baud` with a fixed timeout.
#[derive(Debug, Clone)]
pub struct SerialPortConnector {
    path: String,
    baud: u32,
    timeout: Duration,
}

impl SerialPortConnector {
    pub fn new(path: impl Into<String>, baud: u32, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            baud,
            timeout,
        }
    }

    fn check(&self) -> Result<()> {
        if self.path.trim().is_empty() {
            return Err(HwError::InvalidConfig("serial device path is empty".into()));
        }
        if self.baud == 0 {
            return Err(HwError::InvalidConfig("baud rate must be > 0".into()));
        }
        Ok(())
    }
}

impl SerialConnector for SerialPortConnector {
    type Channel = SerialPortChannel;

    fn open(&mut self) -> std::result::Result<SerialPortChannel, BoxError> {
        self.check()?;
        let port = serialport::new(&self.path, self.baud)
            .timeout(self.timeout)
            .open()
            .map_err(map_open_error)?;
        Ok(SerialPortChannel {
            port: Some(port),
            name: self.path.clone(),
        })
    }

    fn describe(&self) -> String {
        format!("{} @ {} baud", self.path, self.baud)
    }
}

/// Bad parameters are fatal; anything else (busy, unplugged, permissions
/// still settling) is worth retrying.
fn map_open_error(e: serialport::Error) -> HwError {
    match e.kind() {
        serialport::ErrorKind::InvalidInput => HwError::InvalidConfig(e.to_string()),
        _ => HwError::Unavailable(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_err(connector: &mut SerialPortConnector) -> HwError {
        let err = match connector.open() {
            Ok(_) => panic!("open should fail"),
            Err(e) => e,
        };
        match err.downcast::<HwError>() {
            Ok(hw) => *hw,
            Err(other) => panic!("unexpected error type: {other}"),
        }
    }

    #[test]
    fn zero_baud_is_invalid_config() {
        let mut c = SerialPortConnector::new("/dev/ttyUSB0", 0, Duration::from_secs(3));
        assert!(matches!(open_err(&mut c), HwError::InvalidConfig(_)));
    }

    #[test]
    fn empty_path_is_invalid_config() {
        let mut c = SerialPortConnector::new("  ", 9600, Duration::from_secs(3));
        assert!(matches!(open_err(&mut c), HwError::InvalidConfig(_)));
    }

    #[test]
    fn describe_names_port_and_baud() {
        let c = SerialPortConnector::new("/dev/ttyACM0", 115_200, Duration::from_secs(3));
        assert_eq!(c.describe(), "/dev/ttyACM0 @ 115200 baud");
    }
}
