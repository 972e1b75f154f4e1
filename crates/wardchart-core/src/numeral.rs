use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DEVANAGARI_ZERO: u32 = 0x0966;

/// Output locale for numbers printed inside charts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ne,
}

impl Locale {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ne => "ne",
        }
    }
}

impl FromStr for Locale {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Self::En),
            "ne" | "np" | "nepali" => Ok(Self::Ne),
            other => Err(Error::UnsupportedLocale {
                locale: other.to_string(),
            }),
        }
    }
}

/// Thousands separator style for the integer part of a number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Grouping {
    /// `1234567`
    #[default]
    None,
    /// `1,234,567`
    Western,
    /// `12,34,567` (last three digits, then pairs)
    SouthAsian,
}

/// Converts raw counts and percentages into locale-specific digit strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumeralFormatter {
    #[serde(default)]
    pub locale: Locale,
    #[serde(default)]
    pub grouping: Grouping,
}

impl NumeralFormatter {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            grouping: Grouping::None,
        }
    }

    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = grouping;
        self
    }

    /// Rewrites every ASCII digit in `text` into the formatter's script. Other characters
    /// pass through untouched.
    pub fn localize_digits(&self, text: &str) -> String {
        match self.locale {
            Locale::En => text.to_string(),
            Locale::Ne => text
                .chars()
                .map(|ch| match ch.to_digit(10) {
                    Some(d) if ch.is_ascii_digit() => {
                        char::from_u32(DEVANAGARI_ZERO + d).unwrap_or(ch)
                    }
                    _ => ch,
                })
                .collect(),
        }
    }

    pub fn format_integer(&self, value: i64) -> String {
        let digits = value.unsigned_abs().to_string();
        let grouped = group_digits(&digits, self.grouping);
        let signed = if value < 0 {
            format!("-{grouped}")
        } else {
            grouped
        };
        self.localize_digits(&signed)
    }

    /// Formats a measurement with at most `max_decimals` fractional digits, trimming
    /// trailing zeros (`12.50` -> `12.5`, `3.00` -> `3`).
    pub fn format_decimal(&self, value: f64, max_decimals: usize) -> String {
        if !value.is_finite() {
            return self.localize_digits("0");
        }
        let mut s = format!("{value:.max_decimals$}");
        if s.contains('.') {
            while s.ends_with('0') {
                s.pop();
            }
            if s.ends_with('.') {
                s.pop();
            }
        }
        if s == "-0" {
            s = "0".to_string();
        }

        let (sign, rest) = match s.strip_prefix('-') {
            Some(rest) => ("-", rest),
            None => ("", s.as_str()),
        };
        let (int_part, frac_part) = match rest.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (rest, None),
        };
        let mut out = String::with_capacity(s.len() + 4);
        out.push_str(sign);
        out.push_str(&group_digits(int_part, self.grouping));
        if let Some(f) = frac_part {
            out.push('.');
            out.push_str(f);
        }
        self.localize_digits(&out)
    }

    /// Counts are whole numbers in practice; fractional inputs keep up to two decimals.
    pub fn format_value(&self, value: f64) -> String {
        self.format_decimal(value, 2)
    }

    /// Formats a percentage (`12.345` with one decimal -> `12.3%`). The number of decimals
    /// is fixed so columns of percentages line up.
    pub fn format_percent(&self, percent: f64, decimals: usize) -> String {
        let percent = if percent.is_finite() { percent } else { 0.0 };
        let s = format!("{percent:.decimals$}%");
        let s = if s.starts_with("-0") && s.trim_start_matches(['-', '0', '.']) == "%" {
            s.trim_start_matches('-').to_string()
        } else {
            s
        };
        self.localize_digits(&s)
    }

    /// Formats `part / whole` as a percentage; a zero `whole` yields `0%`.
    pub fn format_share(&self, part: f64, whole: f64, decimals: usize) -> String {
        if whole <= 0.0 || !whole.is_finite() {
            return self.format_percent(0.0, decimals);
        }
        self.format_percent(part / whole * 100.0, decimals)
    }
}

/// Maps Devanagari digits back to ASCII, leaving everything else as-is.
pub fn delocalize_digits(text: &str) -> String {
    text.chars()
        .map(|ch| {
            let cp = ch as u32;
            if (DEVANAGARI_ZERO..DEVANAGARI_ZERO + 10).contains(&cp) {
                char::from_digit(cp - DEVANAGARI_ZERO, 10).unwrap_or(ch)
            } else {
                ch
            }
        })
        .collect()
}

fn group_digits(digits: &str, grouping: Grouping) -> String {
    let n = digits.len();
    match grouping {
        Grouping::None => digits.to_string(),
        Grouping::Western => {
            let mut out = String::with_capacity(n + n / 3);
            for (i, ch) in digits.chars().enumerate() {
                if i > 0 && (n - i) % 3 == 0 {
                    out.push(',');
                }
                out.push(ch);
            }
            out
        }
        Grouping::SouthAsian => {
            if n <= 3 {
                return digits.to_string();
            }
            let (head, tail) = digits.split_at(n - 3);
            let mut out = String::with_capacity(n + n / 2);
            let h = head.len();
            for (i, ch) in head.chars().enumerate() {
                if i > 0 && (h - i) % 2 == 0 {
                    out.push(',');
                }
                out.push(ch);
            }
            out.push(',');
            out.push_str(tail);
            out
        }
    }
}
