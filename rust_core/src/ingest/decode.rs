use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Undo the base64 transport encoding some bots apply to their messages.
///
/// Never fails: input that is not base64, or that decodes to something other
/// than printable UTF-8 text, is returned unchanged.
pub fn decode_payload(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.len() % 4 != 0 || !is_base64_alphabet(trimmed) {
        return input.to_string();
    }

    let decoded = match STANDARD.decode(trimmed) {
        Ok(bytes) => bytes,
        Err(_) => return input.to_string(),
    };

    match String::from_utf8(decoded) {
        Ok(text) if is_printable(&text) => text,
        _ => input.to_string(),
    }
}

fn is_base64_alphabet(s: &str) -> bool {
    s.bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

fn is_printable(text: &str) -> bool {
    !text.trim().is_empty()
        && text
            .chars()
            .all(|c| !c.is_control() || matches!(c, '\n' | '\r' | '\t'))
}
