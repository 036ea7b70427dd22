//! Received-packet console report
//!
//! Formats one received packet as three console lines: link quality, payload
//! hex dump and error-mask hex dump.

use core::fmt::Write;

use heapless::String;

use crate::config::CONSOLE_LINE_LEN;
use crate::message::ReceivedPacket;

/// One console line, `\r\n` terminated
pub type ConsoleLine = String<CONSOLE_LINE_LEN>;

/// Link quality header, e.g.
/// `Packet received: RSSI: -72.5dBm, LQI: 12, PQI: 40, SQI: 30\r\n`
#[must_use]
pub fn quality_line(packet: &ReceivedPacket) -> ConsoleLine {
    let negative = packet.rssi_dbm < 0.0;
    let magnitude = if negative {
        -packet.rssi_dbm
    } else {
        packet.rssi_dbm
    };
    // Truncation floors the non-negative magnitude to whole tenths
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let tenths = (magnitude * 10.0) as u32;
    let sign = if negative { '-' } else { '+' };

    let mut line = ConsoleLine::new();
    let _ = write!(
        line,
        "Packet received: RSSI: {}{}.{}dBm, LQI: {}, PQI: {}, SQI: {}\r\n",
        sign,
        tenths / 10,
        tenths % 10,
        packet.lqi,
        packet.pqi,
        packet.sqi
    );
    line
}

/// Upper-case hex dump of a byte slice
#[must_use]
pub fn hex_line(bytes: &[u8]) -> ConsoleLine {
    let mut line = ConsoleLine::new();
    for byte in bytes {
        let _ = write!(line, "{byte:02X}");
    }
    let _ = line.push_str("\r\n");
    line
}

/// All three report lines in output order
#[must_use]
pub fn packet_report(packet: &ReceivedPacket) -> [ConsoleLine; 3] {
    [
        quality_line(packet),
        hex_line(&packet.data),
        hex_line(&packet.err),
    ]
}
