//! Size reduction of the local offer.
//!
//! The bridged device caps the signaling payload at 8 KiB. Extension-map
//! attributes are not needed for basic negotiation, so they are the lines we
//! drop. This is line filtering over CRLF-separated text, not SDP parsing:
//! every other line is passed through byte for byte.

/// Payload ceiling enforced by the remote device
pub const MAX_OFFER_BYTES: usize = 8 * 1024;

const CRLF: &str = "\r\n";
const EXTMAP_ATTRIBUTE: &str = "a=extmap";

/// True for lines the size reduction removes
pub fn is_extmap_line(line: &str) -> bool {
    line.starts_with(EXTMAP_ATTRIBUTE)
}

/// Removes every `a=extmap` line that follows a CRLF terminator.
///
/// The first line has no CRLF in front of it and is always kept. Running the
/// transform on its own output is a no-op.
pub fn trim_extmap(sdp: &str) -> String {
    let mut lines = sdp.split(CRLF);
    let mut trimmed = String::with_capacity(sdp.len());
    if let Some(first) = lines.next() {
        trimmed.push_str(first);
    }
    for line in lines {
        if is_extmap_line(line) {
            continue;
        }
        trimmed.push_str(CRLF);
        trimmed.push_str(line);
    }
    trimmed
}

/// Number of lines [`trim_extmap`] would drop
pub fn count_extmap_lines(sdp: &str) -> usize {
    sdp.split(CRLF).skip(1).filter(|line| is_extmap_line(line)).count()
}

pub fn exceeds_budget(sdp: &str, max_bytes: usize) -> bool {
    sdp.len() > max_bytes
}
