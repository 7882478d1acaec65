//! Decoders for the two escape layers Drive wraps around its embedded folder payload.

/// Decodes a JavaScript string literal body the way Python's `unicode_escape` codec does.
///
/// Bytes outside escape sequences map one-to-one onto code points U+0000..U+00FF, so non-ASCII
/// UTF-8 text comes out double-encoded; [`restore_utf8`] undoes that on the fields that need it.
/// Unknown escapes such as `\/` are kept verbatim.
pub(crate) fn decode_unicode_escape(input: &str) -> Result<String, String> {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        let byte = bytes[i];
        if byte != b'\\' {
            out.push(char::from(byte));
            i += 1;
            continue;
        }

        let Some(&next) = bytes.get(i + 1) else {
            return Err("trailing backslash".to_string());
        };
        i += 2;

        match next {
            b'\n' => {}
            b'\\' => out.push('\\'),
            b'\'' => out.push('\''),
            b'"' => out.push('"'),
            b'a' => out.push('\x07'),
            b'b' => out.push('\x08'),
            b'f' => out.push('\x0c'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'v' => out.push('\x0b'),
            b'0'..=b'7' => {
                let mut value = u32::from(next - b'0');
                let mut digits = 1;
                while digits < 3 {
                    match bytes.get(i) {
                        Some(&digit @ b'0'..=b'7') => {
                            value = value * 8 + u32::from(digit - b'0');
                            i += 1;
                            digits += 1;
                        }
                        _ => break,
                    }
                }
                out.push(code_point(value)?);
            }
            b'x' => {
                out.push(hex_escape(bytes, i, 2)?);
                i += 2;
            }
            b'u' => {
                out.push(hex_escape(bytes, i, 4)?);
                i += 4;
            }
            b'U' => {
                out.push(hex_escape(bytes, i, 8)?);
                i += 8;
            }
            other => {
                out.push('\\');
                out.push(char::from(other));
            }
        }
    }

    Ok(out)
}

/// Reverses a double encoding: re-encodes with Python's `raw_unicode_escape` and reads the
/// bytes back as UTF-8. Falls back to the input when the bytes are not valid UTF-8.
pub(crate) fn restore_utf8(text: &str) -> String {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        let code = u32::from(c);
        if code < 0x100 {
            bytes.push(code as u8);
        } else if code < 0x10000 {
            bytes.extend_from_slice(format!("\\u{code:04x}").as_bytes());
        } else {
            bytes.extend_from_slice(format!("\\U{code:08x}").as_bytes());
        }
    }

    String::from_utf8(bytes).unwrap_or_else(|_| text.to_string())
}

fn hex_escape(bytes: &[u8], start: usize, len: usize) -> Result<char, String> {
    let digits = bytes
        .get(start..start + len)
        .and_then(|digits| std::str::from_utf8(digits).ok())
        .ok_or_else(|| format!("truncated \\x/\\u escape at byte {start}"))?;
    let value = u32::from_str_radix(digits, 16)
        .map_err(|_| format!("invalid hex escape {digits:?}"))?;
    code_point(value)
}

fn code_point(value: u32) -> Result<char, String> {
    char::from_u32(value).ok_or_else(|| format!("invalid code point {value:#x}"))
}
