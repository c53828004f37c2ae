//! # Bluetooth RFCOMM Channels
//!
//! ESC/POS Bluetooth printers speak the Serial Port Profile. On Linux an
//! RFCOMM binding exposes the printer as a tty (`/dev/rfcommN`) that this
//! module opens write-only in raw mode.
//!
//! ## Addresses
//!
//! [`RfcommDirectory::connect`] accepts either form:
//!
//! | Address | Example | Action |
//! |---------|---------|--------|
//! | Device path | `/dev/rfcomm0` | Opened directly |
//! | Bluetooth MAC | `00:11:62:AA:BB:CC` | Existing binding reused, otherwise bound with `rfcomm bind` |
//!
//! Binding needs root. Pairing must already have been done:
//!
//! ```bash
//! $ bluetoothctl
//! [bluetooth]# pair 00:11:62:AA:BB:CC
//! $ sudo rfcomm bind 0 00:11:62:AA:BB:CC
//! ```
//!
//! ## TTY Configuration
//!
//! Raw mode: no input or output processing, 8-bit characters, no echo, no
//! canonical mode. Software flow control is off as well, since `0x11` and
//! `0x13` occur in raster data and would otherwise be swallowed as XON/XOFF.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{Channel, DeviceDirectory};
use crate::error::{BluberryError, Result};

/// Default RFCOMM device path
pub const DEFAULT_DEVICE: &str = "/dev/rfcomm0";

/// SPP service channel on the printer side.
const SPP_CHANNEL: u8 = 1;

/// Time for a fresh connection or binding to settle.
const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// An open, raw-mode RFCOMM tty.
#[derive(Debug)]
pub struct RfcommChannel {
    file: File,
    path: PathBuf,
}

impl RfcommChannel {
    /// Open a device path and switch it to raw mode.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .open(path)
            .map_err(|e| BluberryError::Connect {
                address: path.display().to_string(),
                reason: e.to_string(),
            })?;

        configure_tty_raw(&file)?;
        debug!(device = %path.display(), "opened rfcomm channel");
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Channel for RfcommChannel {
    fn write(&mut self, frame: &[u8]) -> io::Result<()> {
        self.file.write_all(frame)?;
        self.file.flush()
    }
}

/// Resolves printer addresses to RFCOMM channels.
#[derive(Debug, Clone, Default)]
pub struct RfcommDirectory {
    /// `N` in `/dev/rfcommN` used when a MAC has no binding yet.
    pub bind_slot: u8,
}

impl RfcommDirectory {
    pub fn new(bind_slot: u8) -> Self {
        Self { bind_slot }
    }

    /// Device path for an address, binding a MAC if necessary.
    pub fn resolve(&self, address: &str) -> Result<PathBuf> {
        if !is_valid_mac(address) {
            return Ok(PathBuf::from(address));
        }
        if let Some(existing) = find_rfcomm_for_mac(address)? {
            debug!(mac = address, device = %existing.display(), "reusing rfcomm binding");
            return Ok(existing);
        }
        setup_rfcomm(address, self.bind_slot)
    }
}

impl DeviceDirectory for RfcommDirectory {
    type Channel = RfcommChannel;

    fn connect(&self, address: &str) -> Result<RfcommChannel> {
        let path = self.resolve(address)?;
        RfcommChannel::open(&path)
    }

    fn disconnect(&self, mut channel: RfcommChannel) -> Result<()> {
        channel.file.flush()?;
        info!(device = %channel.path.display(), "disconnected");
        Ok(())
    }
}

/// Validate a Bluetooth MAC address format (XX:XX:XX:XX:XX:XX).
pub fn is_valid_mac(mac: &str) -> bool {
    let parts: Vec<&str> = mac.split(':').collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|part| part.len() == 2 && part.chars().all(|c| c.is_ascii_hexdigit()))
}

/// Device name bound to `mac` in an RFCOMM listing.
///
/// Both `/proc/net/rfcomm` and `rfcomm -a` print one binding per line,
/// starting with the device name: `rfcomm0: 00:11:62:AA:BB:CC channel 1 ...`.
fn device_in_listing(listing: &str, mac: &str) -> Option<String> {
    let mac = mac.to_uppercase();
    listing
        .lines()
        .filter(|line| line.to_uppercase().contains(&mac))
        .filter_map(|line| line.split(':').next())
        .map(str::trim)
        .find(|name| name.starts_with("rfcomm"))
        .map(str::to_string)
}

/// Find an existing RFCOMM device bound to the given MAC address.
///
/// Checks `/proc/net/rfcomm`, then `rfcomm -a`.
pub fn find_rfcomm_for_mac(mac: &str) -> Result<Option<PathBuf>> {
    let existing = |name: String| {
        let path = PathBuf::from(format!("/dev/{}", name));
        path.exists().then_some(path)
    };

    if let Ok(listing) = fs::read_to_string("/proc/net/rfcomm") {
        if let Some(path) = device_in_listing(&listing, mac).and_then(existing) {
            return Ok(Some(path));
        }
    }

    let output = run("rfcomm", &["-a"])?;
    let listing = String::from_utf8_lossy(&output.stdout);
    Ok(device_in_listing(&listing, mac).and_then(existing))
}

/// Connect to `mac` and bind it to `/dev/rfcomm<slot>`.
///
/// Runs `bluetoothctl connect`, `l2ping -c 1` and `rfcomm bind`.
/// **Requires root** for the bind.
pub fn setup_rfcomm(mac: &str, slot: u8) -> Result<PathBuf> {
    let mac = mac.to_uppercase();
    let device = PathBuf::from(format!("/dev/rfcomm{}", slot));

    info!(mac = %mac, "connecting");
    let output = run("bluetoothctl", &["connect", &mac])?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.contains("Connection successful") || stdout.contains("already connected") {
        debug!("bluetoothctl connected");
    } else {
        // l2ping below decides whether the device is actually reachable.
        warn!(output = %stdout.trim(), "bluetoothctl did not confirm connection");
    }
    thread::sleep(SETTLE_DELAY);

    let output = run("l2ping", &["-c", "1", &mac])?;
    if !output.status.success() {
        return Err(BluberryError::Connect {
            address: mac,
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    info!(slot, "binding rfcomm device");
    let output = run(
        "rfcomm",
        &["bind", &slot.to_string(), &mac, &SPP_CHANNEL.to_string()],
    )?;
    if !output.status.success() {
        return Err(BluberryError::Transport(format!(
            "rfcomm bind failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    thread::sleep(SETTLE_DELAY);

    if !device.exists() {
        return Err(BluberryError::Transport(format!(
            "Device {} was not created",
            device.display()
        )));
    }
    info!(device = %device.display(), "rfcomm device ready");
    Ok(device)
}

fn run(program: &str, args: &[&str]) -> Result<std::process::Output> {
    Command::new(program)
        .args(args)
        .output()
        .map_err(|e| BluberryError::Transport(format!("Failed to run '{}': {}", program, e)))
}

/// Put the tty behind `file` into raw mode.
#[cfg(unix)]
fn configure_tty_raw(file: &File) -> Result<()> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    let mut termios = MaybeUninit::uninit();
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(BluberryError::Transport(format!(
            "tcgetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(BluberryError::Transport(format!(
            "tcsetattr failed: {}",
            io::Error::last_os_error()
        )));
    }
    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File) -> Result<()> {
    Ok(())
}
