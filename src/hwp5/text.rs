//! PARA_TEXT payload decoding.
//!
//! Paragraph text is stored as UTF-16LE code units interleaved with control
//! characters in the range 0x01-0x1F. Extended and inline controls occupy
//! eight code units (16 bytes): the control character plus seven units of
//! parameters that are not interpreted here.

/// Control characters in HWP text.
mod control_char {
    /// Tab
    pub const TAB: u16 = 0x0009;
    /// Line break (soft return)
    pub const LINE_BREAK: u16 = 0x000A;

    /// Controls that consume 8 WCHARs in total.
    pub const WIDE: [u16; 19] = [1, 2, 3, 4, 5, 6, 7, 8, 11, 12, 13, 14, 15, 16, 17, 18, 21, 22, 23];

    /// Bytes occupied by a wide control, including the control character.
    pub const WIDE_LEN: usize = 16;
}

/// Decodes a PARA_TEXT payload into display text.
///
/// Never fails: a NUL code unit ends the text, unknown control characters and
/// lone surrogate units are dropped. Supplementary-plane characters are not
/// reassembled from surrogate pairs and are therefore dropped as well.
/// The result is trimmed of surrounding whitespace.
pub fn decode_para_text(payload: &[u8]) -> String {
    let mut text = String::with_capacity(payload.len() / 2);
    let mut i = 0;

    while i + 1 < payload.len() {
        let cc = u16::from_le_bytes([payload[i], payload[i + 1]]);

        match cc {
            0x0000 => break,
            control_char::TAB => {
                text.push('\t');
                i += 2;
            }
            control_char::LINE_BREAK => {
                text.push('\n');
                i += 2;
            }
            c if control_char::WIDE.contains(&c) => {
                i += control_char::WIDE_LEN;
            }
            0x0001..=0x001F => {
                i += 2;
            }
            0xD800..=0xDFFF => {
                i += 2;
            }
            _ => {
                if let Some(ch) = char::from_u32(cc as u32) {
                    text.push(ch);
                }
                i += 2;
            }
        }
    }

    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16(units: &[u16]) -> Vec<u8> {
        units.iter().flat_map(|u| u.to_le_bytes()).collect()
    }

    #[test]
    fn test_plain_ascii() {
        assert_eq!(decode_para_text(&utf16(&[0x48, 0x69])), "Hi");
    }

    #[test]
    fn test_korean() {
        // "안녕"
        assert_eq!(decode_para_text(&utf16(&[0xC548, 0xB155])), "안녕");
    }

    #[test]
    fn test_wide_control_is_skipped() {
        // Control 1 followed by seven parameter units, then "A".
        let mut units = vec![0x0001, 0x6C74, 0x6274, 0x0000, 0x0000, 0x0000, 0x0000, 0x0001];
        units.push(0x0041);
        assert_eq!(decode_para_text(&utf16(&units)), "A");
    }

    #[test]
    fn test_every_wide_control_skips_sixteen_bytes() {
        for code in control_char::WIDE {
            let mut units = vec![code, 0x0058, 0x0058, 0x0058, 0x0058, 0x0058, 0x0058, 0x0058];
            units.push(0x0042);
            assert_eq!(decode_para_text(&utf16(&units)), "B", "control {}", code);
        }
    }

    #[test]
    fn test_newline_and_tab() {
        let units = [0x0041, 0x000A, 0x0042, 0x0009, 0x0043];
        assert_eq!(decode_para_text(&utf16(&units)), "A\nB\tC");
    }

    #[test]
    fn test_null_terminates() {
        let units = [0x0041, 0x0042, 0x0000, 0x0043, 0x0044];
        assert_eq!(decode_para_text(&utf16(&units)), "AB");
    }

    #[test]
    fn test_other_controls_are_dropped() {
        // 0x19 and 0x1E are two-byte controls.
        let units = [0x0041, 0x0019, 0x001E, 0x0042];
        assert_eq!(decode_para_text(&utf16(&units)), "AB");
    }

    #[test]
    fn test_surrogates_are_dropped() {
        // U+1F389 as a surrogate pair between two letters.
        let units = [0x0041, 0xD83C, 0xDF89, 0x0042];
        assert_eq!(decode_para_text(&utf16(&units)), "AB");
    }

    #[test]
    fn test_result_is_trimmed() {
        let units = [0x0020, 0x0009, 0x0041, 0x000A, 0x0020];
        assert_eq!(decode_para_text(&utf16(&units)), "A");
    }

    #[test]
    fn test_odd_and_short_payloads() {
        assert_eq!(decode_para_text(&[]), "");
        assert_eq!(decode_para_text(&[0x41]), "");
        assert_eq!(decode_para_text(&[0x41, 0x00, 0x42]), "A");
        // A wide control near the end skips past the buffer.
        assert_eq!(decode_para_text(&utf16(&[0x0041, 0x000B, 0x0042])), "A");
    }
}
