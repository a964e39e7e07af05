// Helper output markers
// The helper script prints these on stdout; anything else is plain log output.

use unplug_core::port::BlockerEvent;

/// Printed once the block rule is installed
pub const ENGAGED_MARKER: &str = "BLOCK_ENGAGED";

/// Printed once the block rule is removed again
pub const RESTORED_MARKER: &str = "BLOCK_RESTORED";

/// Prefix of a failure line, followed by a human-readable reason
pub const ERROR_MARKER_PREFIX: &str = "error:";

/// Decode one output line into a blocker event
///
/// Matching is by prefix on the trimmed line, so trailing detail such as
/// `BLOCK_ENGAGED ports=1119,3724` is accepted. The error prefix is
/// case-insensitive (`Error: ...` from tools is also recognised).
pub fn parse_marker(line: &str) -> Option<BlockerEvent> {
    let line = line.trim();

    if line.starts_with(ENGAGED_MARKER) {
        return Some(BlockerEvent::Engaged);
    }
    if line.starts_with(RESTORED_MARKER) {
        return Some(BlockerEvent::Restored);
    }

    let prefix_len = ERROR_MARKER_PREFIX.len();
    match line.get(..prefix_len) {
        Some(head) if head.eq_ignore_ascii_case(ERROR_MARKER_PREFIX) => Some(BlockerEvent::Error(
            line[prefix_len..].trim().to_string(),
        )),
        _ => None,
    }
}
