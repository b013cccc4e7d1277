use std::borrow::Cow;

/// Decode a plain-text upload.
///
/// Invalid UTF-8 sequences are dropped. When that leaves nothing readable
/// from a non-empty buffer the bytes are read as Latin-1 instead, so a
/// Latin-1 upload yields text rather than an empty document. Plain
/// drop-invalid decoding would return `""` for such a buffer.
pub fn decode(bytes: &[u8]) -> String {
    let (text, dropped) = decode_utf8_skipping_invalid(bytes);
    if dropped > 0 && text.trim().is_empty() {
        log::warn!(
            "Upload is not UTF-8 ({dropped} of {} bytes invalid), decoding as Latin-1",
            bytes.len()
        );
        return decode_latin1(bytes);
    }
    text.into_owned()
}

/// Returns the decoded text and the number of bytes that had to be skipped.
fn decode_utf8_skipping_invalid(bytes: &[u8]) -> (Cow<'_, str>, usize) {
    if let Ok(valid) = std::str::from_utf8(bytes) {
        return (Cow::Borrowed(valid), 0);
    }

    let mut out = String::with_capacity(bytes.len());
    let mut dropped = 0usize;
    let mut rest = bytes;
    while !rest.is_empty() {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                break;
            }
            Err(e) => {
                let (valid, invalid) = rest.split_at(e.valid_up_to());
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                let skip = e.error_len().unwrap_or(invalid.len());
                dropped += skip;
                rest = &invalid[skip..];
            }
        }
    }
    (Cow::Owned(out), dropped)
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

#[cfg(test)]
mod tests {
    use super::decode;

    #[test]
    fn valid_utf8_is_untouched() {
        assert_eq!(decode("Grüße, señor 😄".as_bytes()), "Grüße, señor 😄");
    }

    #[test]
    fn invalid_bytes_are_dropped() {
        assert_eq!(decode(b"caf\xff\xfee ok"), "cafe ok");
    }

    #[test]
    fn truncated_sequence_at_end_is_dropped() {
        assert_eq!(decode(b"abc\xe2\x82"), "abc");
    }

    #[test]
    fn unreadable_utf8_falls_back_to_latin1() {
        assert_eq!(decode(b"\xc9\xe9"), "Éé");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(decode(b""), "");
    }
}
