//! Log file decoding
//!
//! E-Prime writes its text logs as UTF-16LE with a byte-order mark. Files
//! re-saved by other tools may be UTF-8 or UTF-16BE, with or without a BOM,
//! so the encoding is detected before the bytes are handed to the segmenter.

use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::error::ExtractError;

/// Bytes inspected when sniffing a BOM-less file
const SNIFF_LEN: usize = 512;

/// Text encoding of a log file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
    Utf16Be,
}

/// Detect the encoding and the length of any byte-order mark
pub fn detect_encoding(bytes: &[u8]) -> (TextEncoding, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => (TextEncoding::Utf8, 3),
        [0xFF, 0xFE, ..] => (TextEncoding::Utf16Le, 2),
        [0xFE, 0xFF, ..] => (TextEncoding::Utf16Be, 2),
        _ => (sniff_utf16(bytes).unwrap_or(TextEncoding::Utf8), 0),
    }
}

/// ASCII text in UTF-16 has a NUL in every other byte.
fn sniff_utf16(bytes: &[u8]) -> Option<TextEncoding> {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    if sample.len() < 2 {
        return None;
    }
    let pairs = sample.len() / 2;
    let even_nuls = sample.iter().step_by(2).filter(|b| **b == 0).count();
    let odd_nuls = sample.iter().skip(1).step_by(2).filter(|b| **b == 0).count();

    // Non-ASCII text such as U+0100..U+01FF puts a few NULs on the other side
    if odd_nuls * 2 > pairs && even_nuls * 8 < odd_nuls {
        Some(TextEncoding::Utf16Le)
    } else if even_nuls * 2 > pairs && odd_nuls * 8 < even_nuls {
        Some(TextEncoding::Utf16Be)
    } else {
        None
    }
}

/// Decode raw log bytes into text
pub fn decode(bytes: &[u8]) -> Result<(String, TextEncoding), String> {
    let (encoding, bom) = detect_encoding(bytes);
    let body = &bytes[bom..];

    let text = match encoding {
        TextEncoding::Utf8 => String::from_utf8(body.to_vec())
            .map_err(|e| format!("invalid UTF-8 at byte {}", e.utf8_error().valid_up_to() + bom))?,
        TextEncoding::Utf16Le => decode_utf16(body, u16::from_le_bytes)?,
        TextEncoding::Utf16Be => decode_utf16(body, u16::from_be_bytes)?,
    };

    Ok((text, encoding))
}

fn decode_utf16(body: &[u8], unit: fn([u8; 2]) -> u16) -> Result<String, String> {
    if body.len() % 2 != 0 {
        return Err("UTF-16 data has an odd number of bytes".to_string());
    }
    let units = body.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| format!("unpaired UTF-16 surrogate {:#06x}", e.unpaired_surrogate()))
}

/// Read and decode a log file
pub fn read_log(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::io(path, e))?;
    let (text, encoding) = decode(&bytes).map_err(|reason| ExtractError::Decode {
        path: path.to_path_buf(),
        reason,
    })?;
    debug!(path = %path.display(), encoding = ?encoding, bytes = bytes.len(), "decoded log");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(text: &str, bom: bool) -> Vec<u8> {
        let mut out = if bom { vec![0xFF, 0xFE] } else { Vec::new() };
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_le_bytes());
        }
        out
    }

    fn utf16be(text: &str) -> Vec<u8> {
        let mut out = vec![0xFE, 0xFF];
        for unit in text.encode_utf16() {
            out.extend_from_slice(&unit.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_utf16le_with_bom() {
        let (text, enc) = decode(&utf16le("Subject: 1042\r\n", true)).unwrap();
        assert_eq!(enc, TextEncoding::Utf16Le);
        assert_eq!(text, "Subject: 1042\r\n");
        assert_eq!(text.lines().next(), Some("Subject: 1042"));
    }

    #[test]
    fn test_utf16be_with_bom() {
        let (text, enc) = decode(&utf16be("Stimulus.RT: 5")).unwrap();
        assert_eq!(enc, TextEncoding::Utf16Be);
        assert_eq!(text, "Stimulus.RT: 5");
    }

    #[test]
    fn test_utf16le_without_bom_is_sniffed() {
        let (text, enc) = decode(&utf16le("Procedure: TBTrialProc\n", false)).unwrap();
        assert_eq!(enc, TextEncoding::Utf16Le);
        assert_eq!(text, "Procedure: TBTrialProc\n");
    }

    #[test]
    fn test_sniffing_tolerates_nul_high_bytes() {
        // 'Ā' (U+0100) encodes as 00 01 in UTF-16LE
        let (text, enc) = decode(&utf16le("Subject: Ā1042\r\nSession: 1\r\n", false)).unwrap();
        assert_eq!(enc, TextEncoding::Utf16Le);
        assert_eq!(text, "Subject: Ā1042\r\nSession: 1\r\n");

        let mut be = utf16be("Procedure: ĀTBTrialProc\n");
        be.drain(..2);
        let (text, enc) = decode(&be).unwrap();
        assert_eq!(enc, TextEncoding::Utf16Be);
        assert_eq!(text, "Procedure: ĀTBTrialProc\n");
    }

    #[test]
    fn test_utf8_with_and_without_bom() {
        let (text, enc) = decode(b"\xEF\xBB\xBFSubject: 1").unwrap();
        assert_eq!(enc, TextEncoding::Utf8);
        assert_eq!(text, "Subject: 1");
        let (text, _) = decode("Stimuli: café".as_bytes()).unwrap();
        assert_eq!(text, "Stimuli: café");
    }

    #[test]
    fn test_invalid_input_is_an_error() {
        assert!(decode(&[0xFF, 0xFE, 0x41]).is_err());
        assert!(decode(&[0x41, 0xFF, 0xFE, 0x80]).is_err());
        // Lone high surrogate
        assert!(decode(&[0xFF, 0xFE, 0x00, 0xD8]).is_err());
    }

    #[test]
    fn test_read_log_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_log(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(ExtractError::Io { .. })));
    }

    #[test]
    fn test_read_log_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TBPM-1042-1.txt");
        std::fs::write(&path, utf16le("Subject: 1042\r\n", true)).unwrap();
        assert_eq!(read_log(&path).unwrap(), "Subject: 1042\r\n");
    }
}
