pub mod clock;

pub use clock::{Clock, MonotonicClock};

/// Boxed error crossing the hardware boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An open byte-oriented link to the microcontroller.
pub trait SerialChannel {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError>;
    fn flush(&mut self) -> Result<(), BoxError>;
    /// Liveness check; a closed channel is never written to.
    fn is_open(&self) -> bool;
    fn close(&mut self);
}

/// Opens serial channels with a fixed port/baud configuration.
pub trait SerialConnector {
    type Channel: SerialChannel;

    fn open(&mut self) -> Result<Self::Channel, BoxError>;

    /// Human-readable target, used in logs.
    fn describe(&self) -> String;
}

impl<T: SerialChannel + ?Sized> SerialChannel for Box<T> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), BoxError> {
        (**self).write(bytes)
    }
    fn flush(&mut self) -> Result<(), BoxError> {
        (**self).flush()
    }
    fn is_open(&self) -> bool {
        (**self).is_open()
    }
    fn close(&mut self) {
        (**self).close();
    }
}
