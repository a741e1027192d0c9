//! Serial link to the robot body's motor controller board.
//!
//! Commands are short strings written as `<command>\n`. The link is opened on
//! first use and dropped after any failure so the next command reopens it.

use crate::error::MotorError;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Read/write timeout for the serial port.
const SERIAL_TIMEOUT: Duration = Duration::from_secs(1);

/// The board resets when the port is opened; commands sent before it is back
/// up are lost.
const SERIAL_BOOT_DELAY: Duration = Duration::from_secs(2);

/// Default baud rate of the motor board.
pub const DEFAULT_BAUD: u32 = 9600;

/// An open command channel.
pub type Link = Box<dyn Write + Send>;

/// Opens a [`Link`] for a port path and baud rate.
pub type LinkOpener = dyn Fn(&str, u32) -> Result<Link, MotorError> + Send + Sync;

/// Adapts a `serialport` handle to [`Write`].
struct SerialLink(Box<dyn serialport::SerialPort>);

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.flush()
    }
}

fn open_serial_port(path: &str, baud: u32) -> Result<Link, MotorError> {
    let port = serialport::new(path, baud)
        .timeout(SERIAL_TIMEOUT)
        .open()
        .map_err(|e| MotorError::Open {
            port: path.to_string(),
            reason: e.to_string(),
        })?;
    Ok(Box::new(SerialLink(port)))
}

struct MotorInner {
    port: Option<String>,
    baud: u32,
    boot_delay: Duration,
    link: Mutex<Option<Link>>,
    opener: Box<LinkOpener>,
}

/// Fire-and-forget sender for motor commands.
#[derive(Clone)]
pub struct MotorController {
    inner: Arc<MotorInner>,
}

impl std::fmt::Debug for MotorController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotorController")
            .field("port", &self.inner.port)
            .field("baud", &self.inner.baud)
            .finish()
    }
}

impl MotorController {
    /// Creates a controller for `port`. With no port the robot body is
    /// disabled and every command is a logged no-op.
    pub fn new(port: Option<String>, baud: u32) -> Self {
        Self::with_opener(port, baud, SERIAL_BOOT_DELAY, Box::new(open_serial_port))
    }

    /// Creates a controller with a custom link opener.
    pub fn with_opener(
        port: Option<String>,
        baud: u32,
        boot_delay: Duration,
        opener: Box<LinkOpener>,
    ) -> Self {
        Self {
            inner: Arc::new(MotorInner {
                port,
                baud,
                boot_delay,
                link: Mutex::new(None),
                opener,
            }),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.port.is_some()
    }

    /// Sends `command`. Returns whether it was written; failures are logged.
    ///
    /// Serial I/O is blocking, so the write runs on the blocking pool.
    pub async fn send(&self, command: &str) -> bool {
        let this = self.clone();
        let command = command.to_string();
        let result = tokio::task::spawn_blocking(move || this.try_send(&command))
            .await
            .unwrap_or_else(|e| Err(MotorError::Task(e.to_string())));
        self.report(result)
    }

    /// Blocking variant of [`MotorController::send`].
    pub fn send_blocking(&self, command: &str) -> bool {
        let result = self.try_send(command);
        self.report(result)
    }

    fn report(&self, result: Result<(), MotorError>) -> bool {
        match result {
            Ok(()) => true,
            Err(MotorError::NotConfigured) => {
                tracing::warn!("no serial port configured, robot body disabled");
                false
            }
            Err(e) => {
                tracing::error!(port = ?self.inner.port, "motor command failed: {}", e);
                false
            }
        }
    }

    /// Writes `command` followed by a newline, opening the link if needed.
    /// Any failure drops the cached link.
    pub fn try_send(&self, command: &str) -> Result<(), MotorError> {
        let port = self.inner.port.as_deref().ok_or(MotorError::NotConfigured)?;
        let mut link = self
            .inner
            .link
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if link.is_none() {
            let opened = (self.inner.opener)(port, self.inner.baud)?;
            if !self.inner.boot_delay.is_zero() {
                std::thread::sleep(self.inner.boot_delay);
            }
            tracing::info!(port, baud = self.inner.baud, "serial link connected");
            *link = Some(opened);
        }

        let written = match link.as_mut() {
            Some(open) => open
                .write_all(format!("{}\n", command).as_bytes())
                .and_then(|()| open.flush()),
            None => return Err(MotorError::NotConfigured),
        };

        match written {
            Ok(()) => {
                tracing::info!(command, "sent motor command");
                Ok(())
            }
            Err(e) => {
                *link = None;
                Err(MotorError::Write(e))
            }
        }
    }
}
