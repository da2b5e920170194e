//! Amounts as they arrive in request bodies.

use serde::Deserialize;

/// A monetary amount sent by a client, either as a JSON number or a string.
///
/// Strings are read the way a browser's `parseFloat` reads them: leading
/// whitespace is skipped and the longest numeric prefix is used, so `"12.5kg"`
/// is `12.5` and `"abc"` is not a number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// A JSON number.
    Number(f64),
    /// A JSON string holding a number.
    Text(String),
}

impl AmountInput {
    /// The numeric value, or `None` if it is not a finite number.
    pub fn value(&self) -> Option<f64> {
        let value = match self {
            AmountInput::Number(number) => Some(*number),
            AmountInput::Text(text) => parse_float_prefix(text),
        }?;

        value.is_finite().then_some(value)
    }

    /// The value if it is a finite number greater than zero.
    pub fn positive(&self) -> Option<f64> {
        self.value().filter(|value| *value > 0.0)
    }
}

fn parse_float_prefix(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let end = float_prefix_len(text.as_bytes())?;

    text[..end].parse().ok()
}

/// The length of the longest prefix of `bytes` that is a decimal float,
/// i.e. `[+-]digits[.digits][(e|E)[+-]digits]` with at least one mantissa digit.
///
/// Returns `None` if there is no such prefix.
fn float_prefix_len(bytes: &[u8]) -> Option<usize> {
    let skip_digits = |mut index: usize| {
        while bytes.get(index).is_some_and(u8::is_ascii_digit) {
            index += 1;
        }
        index
    };

    let mut index = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let integer_end = skip_digits(index);
    let mut mantissa_digits = integer_end - index;
    index = integer_end;

    if bytes.get(index) == Some(&b'.') {
        let fraction_end = skip_digits(index + 1);
        mantissa_digits += fraction_end - (index + 1);
        index = fraction_end;
    }

    if mantissa_digits == 0 {
        return None;
    }

    if matches!(bytes.get(index), Some(b'e' | b'E')) {
        let mut exponent_start = index + 1;
        if matches!(bytes.get(exponent_start), Some(b'+' | b'-')) {
            exponent_start += 1;
        }

        let exponent_end = skip_digits(exponent_start);
        if exponent_end > exponent_start {
            index = exponent_end;
        }
    }

    Some(index)
}
