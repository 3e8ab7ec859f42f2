//! Wire framing for the SymNet UDP control protocol.
//!
//! Every request and response is ASCII, CR-terminated (`\r`). A single
//! datagram may concatenate several CR-terminated lines.

/// Identifies one addressable control on the DSP; wire range is `1..=99999`.
pub type ControllerNumber = u32;

/// A DSP-native raw value. `GS2`/`CS` carry it unsigned in `0..=65535`, but
/// server pushes may carry a signed value (see [`parse_push_line`]), so the
/// cache-facing type stays signed.
pub type RawValue = i32;

/// One controller value, as carried by a `GS2` response or a server push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub number: ControllerNumber,
    pub value: RawValue,
}

/// Build a `GS2 <n>\r` request line.
pub fn encode_gs2(number: ControllerNumber) -> String {
    format!("GS2 {number}\r")
}

/// Build a `CS <n> <v>\r` request line.
pub fn encode_cs(number: ControllerNumber, value: RawValue) -> String {
    format!("CS {number} {value}\r")
}

/// Split a raw datagram body into its CR-terminated, non-empty lines.
pub fn split_lines(body: &str) -> Vec<&str> {
    body.split('\r').filter(|l| !l.is_empty()).collect()
}

/// Parse a single server-push line `#NNNNN=VVVVV`.
///
/// The grammar in spec.md §6 requires exactly five digits for the
/// controller number, but `GS2` responses use unpadded numbers; both
/// paddings are accepted here for push lines too (spec.md §9, "Open
/// questions" calls the asymmetry a defect to route around on the push
/// side).
pub fn parse_push_line(line: &str) -> Option<ControllerState> {
    let rest = line.strip_prefix('#')?;
    let (num_str, val_str) = rest.split_once('=')?;

    if num_str.is_empty() || num_str.len() > 5 || !num_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let number: ControllerNumber = num_str.parse().ok()?;

    let (sign, digits) = match val_str.strip_prefix('-') {
        Some(d) => (-1, d),
        None => (1, val_str),
    };
    if digits.len() < 4 || digits.len() > 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let magnitude: RawValue = digits.parse().ok()?;
    Some(ControllerState {
        number,
        value: sign * magnitude,
    })
}

/// Parse a `GS2` response line (`<n> <v>`, CR already split off) for a
/// specific controller number — the correlator's "regex" embeds the number
/// it expects back, just as the original protocol client does.
pub fn parse_gs2_response(line: &str, expected_number: ControllerNumber) -> Option<RawValue> {
    let mut parts = line.split_whitespace();
    let number: ControllerNumber = parts.next()?.parse().ok()?;
    if number != expected_number {
        return None;
    }
    let value: RawValue = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_gs2_and_cs() {
        assert_eq!(encode_gs2(42), "GS2 42\r");
        assert_eq!(encode_cs(42, 17000), "CS 42 17000\r");
    }

    #[test]
    fn splits_lines_and_drops_empties() {
        assert_eq!(split_lines("#00042=17000\r#00043=-0001\r"), vec![
            "#00042=17000",
            "#00043=-0001"
        ]);
        assert_eq!(split_lines("\r\r"), Vec::<&str>::new());
    }

    #[test]
    fn parses_zero_padded_and_unpadded_push_lines() {
        let padded = parse_push_line("#00042=17000").unwrap();
        assert_eq!(padded, ControllerState { number: 42, value: 17000 });

        let unpadded = parse_push_line("#42=17000").unwrap();
        assert_eq!(unpadded, ControllerState { number: 42, value: 17000 });

        let negative = parse_push_line("#00043=-0001").unwrap();
        assert_eq!(negative, ControllerState { number: 43, value: -1 });
    }

    #[test]
    fn rejects_malformed_push_lines() {
        assert!(parse_push_line("#00042=abcd").is_none());
        assert!(parse_push_line("00042=17000").is_none());
        assert!(parse_push_line("#00042:17000").is_none());
        assert!(parse_push_line("#00042=1").is_none());
    }

    #[test]
    fn parses_gs2_response_for_matching_controller_only() {
        assert_eq!(parse_gs2_response("42 17000", 42), Some(17000));
        assert_eq!(parse_gs2_response("42 17000", 43), None);
        assert_eq!(parse_gs2_response("42 17000 extra", 42), None);
    }
}
