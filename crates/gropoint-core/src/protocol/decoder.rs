//! Value decoding
//!
//! Data replies pack their values back to back with no separator:
//! `+12.3-4.5+0.0`. Each value ends where the next sign (or any character
//! that cannot continue a decimal number) begins.

/// Parse the next decimal number at the start of `input`.
///
/// Accepts optional leading whitespace, an optional sign, digits and an
/// optional fractional part. Returns the value and the bytes consumed, or
/// `None` if no digits follow.
fn scan_number(input: &[u8]) -> Option<(f32, usize)> {
    let count_digits = |from: usize| {
        input
            .get(from..)
            .map(|rest| rest.iter().take_while(|b| b.is_ascii_digit()).count())
            .unwrap_or(0)
    };

    let mut pos = input.iter().take_while(|b| b.is_ascii_whitespace()).count();
    let start = pos;

    if matches!(input.get(pos), Some(b'+') | Some(b'-')) {
        pos += 1;
    }

    let int_digits = count_digits(pos);
    pos += int_digits;

    let mut frac_digits = 0;
    if input.get(pos) == Some(&b'.') {
        let digits = count_digits(pos + 1);
        if int_digits > 0 || digits > 0 {
            pos += 1 + digits;
            frac_digits = digits;
        }
    }

    if int_digits + frac_digits == 0 {
        return None;
    }

    let text = std::str::from_utf8(&input[start..pos]).ok()?;
    let value = text.parse::<f32>().ok()?;
    Some((value, pos))
}

/// Decode up to `limit` values from a data reply body into `values`.
///
/// `body` starts right after the address character. Decoding stops at
/// `limit`, at the end of `values`, or at the first position where no number
/// can be read; whatever was decoded before that is kept. Returns the number
/// of slots written. Slots past that count are left untouched.
pub fn decode_values(body: &[u8], values: &mut [f32], limit: usize) -> usize {
    let max = values.len().min(limit);
    let mut pos = 0;
    let mut count = 0;

    while count < max {
        match scan_number(&body[pos..]) {
            Some((value, used)) => {
                values[count] = value;
                count += 1;
                pos += used;
            }
            None => break,
        }
    }

    count
}
