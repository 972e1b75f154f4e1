//! Ward and group keys are compared as numbers (`"10"` sorts after `"9"`). Keys that do not
//! parse as numbers follow all numeric keys, in lexical order.

use crate::numeral::delocalize_digits;
use std::cmp::Ordering;

fn numeric_key(key: &str) -> Option<f64> {
    let ascii = delocalize_digits(key.trim());
    let v = ascii.parse::<f64>().ok()?;
    v.is_finite().then_some(v)
}

pub fn compare_group_keys(a: &str, b: &str) -> Ordering {
    match (numeric_key(a), numeric_key(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

pub fn sort_group_keys<S: AsRef<str>>(keys: &mut [S]) {
    keys.sort_by(|a, b| compare_group_keys(a.as_ref(), b.as_ref()));
}
