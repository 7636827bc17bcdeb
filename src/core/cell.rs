//! Raw CSV cells and the numeric values parsed out of them

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A cell as read from an uploaded row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell<'a> {
    /// Column unset in the mapping, or absent from the row
    Missing,
    /// Raw text of the cell
    Text(&'a str),
}

impl<'a> Cell<'a> {
    /// Cell text, with a missing cell reading as the empty string
    pub fn as_str(&self) -> &'a str {
        match self {
            Cell::Missing => "",
            Cell::Text(s) => s,
        }
    }

    /// True when the cell carries any text at all (whitespace counts)
    pub fn has_text(&self) -> bool {
        !self.as_str().is_empty()
    }

    /// Parse the cell as a number
    pub fn number(&self) -> Number {
        Number::parse(self.as_str())
    }

    /// Case-insensitive comparison of the cell text against `word`
    pub fn eq_ignore_case(&self, word: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(word)
    }
}

/// A parsed numeric value, or the marker for text that did not parse
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Value(f64),
    Invalid,
}

impl Number {
    /// Parse the longest numeric prefix of `text`.
    ///
    /// Leading whitespace is skipped and trailing garbage is ignored, so
    /// `"60 km/h"` is 60 while `"km/h"` is invalid.
    pub fn parse(text: &str) -> Self {
        let s = text.trim_start();
        let bytes = s.as_bytes();
        let mut pos = 0;

        let negative = match bytes.first() {
            Some(b'-') => {
                pos += 1;
                true
            }
            Some(b'+') => {
                pos += 1;
                false
            }
            _ => false,
        };

        if s[pos..].starts_with("Infinity") {
            return Number::Value(if negative {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            });
        }

        let int_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let int_digits = &s[int_start..pos];

        let mut frac_digits = "";
        if pos < bytes.len() && bytes[pos] == b'.' {
            let frac_start = pos + 1;
            let mut end = frac_start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if !int_digits.is_empty() || end > frac_start {
                frac_digits = &s[frac_start..end];
                pos = end;
            }
        }

        if int_digits.is_empty() && frac_digits.is_empty() {
            return Number::Invalid;
        }

        let mut exponent = String::new();
        if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
            let mut end = pos + 1;
            let mut sign = "";
            if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
                sign = if bytes[end] == b'-' { "-" } else { "" };
                end += 1;
            }
            let exp_start = end;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end > exp_start {
                exponent = format!("e{}{}", sign, &s[exp_start..end]);
            }
        }

        let literal = format!(
            "{}{}.{}{}",
            if negative { "-" } else { "" },
            if int_digits.is_empty() { "0" } else { int_digits },
            if frac_digits.is_empty() { "0" } else { frac_digits },
            exponent
        );

        literal
            .parse::<f64>()
            .map(Number::Value)
            .unwrap_or(Number::Invalid)
    }

    /// The parsed value, if any
    pub fn value(&self) -> Option<f64> {
        match self {
            Number::Value(v) => Some(*v),
            Number::Invalid => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Number::Invalid)
    }

    /// True when the value parsed and lies in `[min, max]`
    pub fn is_within(&self, min: f64, max: f64) -> bool {
        matches!(self, Number::Value(v) if *v >= min && *v <= max)
    }

    /// The parsed value, or `fallback` when invalid. A parsed zero is kept.
    pub fn unwrap_or(&self, fallback: f64) -> f64 {
        self.value().unwrap_or(fallback)
    }
}

/// Invalid and non-finite values serialize as `null`, the way JSON has no
/// representation for them.
impl Serialize for Number {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Number::Value(v) if v.is_finite() => serializer.serialize_f64(*v),
            _ => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Number {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<f64>::deserialize(deserializer)?;
        Ok(value.map(Number::Value).unwrap_or(Number::Invalid))
    }
}
