//! Caller-supplied chart input.
//!
//! Every constructor and `insert` validates values at the boundary: negative, non-finite or
//! non-numeric values are rejected with [`Error::MalformedSeries`] so the layout math never sees
//! them. Zero and missing values are accepted and simply excluded from rendering.

use crate::numeral::delocalize_digits;
use crate::order::compare_group_keys;
use crate::{Error, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Five-year age brackets, oldest first (top row of a population pyramid).
pub const DEFAULT_AGE_BRACKETS: [&str; 16] = [
    "75+", "70-74", "65-69", "60-64", "55-59", "50-54", "45-49", "40-44", "35-39", "30-34",
    "25-29", "20-24", "15-19", "10-14", "5-9", "0-4",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Pie,
    Bar,
    Pyramid,
}

impl ChartType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pie => "pie",
            Self::Bar => "bar",
            Self::Pyramid => "pyramid",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pie" => Ok(Self::Pie),
            "bar" | "stacked" | "grouped" => Ok(Self::Bar),
            "pyramid" => Ok(Self::Pyramid),
            other => Err(Error::UnsupportedChartType {
                chart_type: other.to_string(),
            }),
        }
    }
}

fn check_value(key: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(Error::malformed(key, format!("value {value} is not finite")));
    }
    if value < 0.0 {
        return Err(Error::malformed(key, format!("negative value {value}")));
    }
    Ok(value)
}

/// Reads a count from JSON. Numbers and numeric strings (ASCII or Devanagari digits) are
/// accepted; `null` and blank strings mean "missing".
pub fn parse_count(key: &str, value: &Value) -> Result<Option<f64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            let v = n
                .as_f64()
                .ok_or_else(|| Error::malformed(key, format!("unrepresentable number {n}")))?;
            check_value(key, v).map(Some)
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            let ascii = delocalize_digits(s).replace(',', "");
            let v = ascii
                .parse::<f64>()
                .map_err(|_| Error::malformed(key, format!("non-numeric value {s:?}")))?;
            check_value(key, v).map(Some)
        }
        other => Err(Error::malformed(
            key,
            format!("non-numeric value {other}"),
        )),
    }
}

fn as_object<'a>(value: &'a Value, what: &str) -> Result<&'a serde_json::Map<String, Value>> {
    value.as_object().ok_or_else(|| Error::InvalidSeriesJson {
        message: format!("{what} must be a JSON object"),
    })
}

fn first_field<'a>(obj: &'a serde_json::Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names.iter().find_map(|n| obj.get(*n))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesEntry {
    pub label: String,
    pub value: f64,
}

/// Ordered category -> `{label, value}` mapping for pie and summary charts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PieSeries {
    entries: IndexMap<String, SeriesEntry>,
}

impl PieSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<K, L>(entries: impl IntoIterator<Item = (K, L, f64)>) -> Result<Self>
    where
        K: Into<String>,
        L: Into<String>,
    {
        let mut out = Self::new();
        for (k, l, v) in entries {
            out.insert(k, l, v)?;
        }
        Ok(out)
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        label: impl Into<String>,
        value: f64,
    ) -> Result<()> {
        let key = key.into();
        let value = check_value(&key, value)?;
        self.entries.insert(
            key,
            SeriesEntry {
                label: label.into(),
                value,
            },
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&SeriesEntry> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SeriesEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Entries that produce a visible slice, in input order.
    pub fn positive_entries(&self) -> impl Iterator<Item = (&str, &SeriesEntry)> {
        self.iter().filter(|(_, e)| e.value > 0.0)
    }

    pub fn total(&self) -> f64 {
        self.entries.values().map(|e| e.value).sum()
    }

    pub fn has_data(&self) -> bool {
        self.total() > 0.0
    }

    /// Accepts `{"key": {"label": "...", "value": n}}` or the short form `{"key": n}`.
    pub fn from_json(data: &Value) -> Result<Self> {
        let mut out = Self::new();
        for (key, item) in as_object(data, "pie data")? {
            let (label, raw) = match item {
                Value::Object(obj) => {
                    let label = first_field(obj, &["label", "display_label"])
                        .and_then(Value::as_str)
                        .unwrap_or(key)
                        .to_string();
                    let raw =
                        first_field(obj, &["value", "numeric_value"]).unwrap_or(&Value::Null);
                    (label, raw)
                }
                other => (key.clone(), other),
            };
            let value = parse_count(key, raw)?.unwrap_or(0.0);
            out.insert(key.clone(), label, value)?;
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BarMode {
    #[default]
    Stacked,
    Grouped,
}

/// Group (ward) -> category -> value mapping for stacked and grouped bar charts.
///
/// Categories keep the order they were declared in (explicitly, or by first appearance);
/// groups are always presented in numeric key order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BarSeries {
    mode: BarMode,
    categories: IndexMap<String, String>,
    groups: IndexMap<String, IndexMap<String, f64>>,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: BarMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> BarMode {
        self.mode
    }

    /// Declares a category (and its display label) ahead of the data to pin the stacking
    /// order. Re-declaring only updates the label.
    pub fn declare_category(&mut self, key: impl Into<String>, label: impl Into<String>) {
        self.categories.insert(key.into(), label.into());
    }

    pub fn insert(
        &mut self,
        group: impl Into<String>,
        category: impl Into<String>,
        value: f64,
    ) -> Result<()> {
        let group = group.into();
        let category = category.into();
        let value = check_value(&format!("{group}/{category}"), value)?;
        if !self.categories.contains_key(&category) {
            self.categories.insert(category.clone(), category.clone());
        }
        self.groups.entry(group).or_default().insert(category, value);
        Ok(())
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &str)> {
        self.categories.iter().map(|(k, l)| (k.as_str(), l.as_str()))
    }

    pub fn category_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.categories.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn value(&self, group: &str, category: &str) -> f64 {
        self.groups
            .get(group)
            .and_then(|g| g.get(category))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn group_total(&self, group: &str) -> f64 {
        self.groups
            .get(group)
            .map(|g| g.values().sum())
            .unwrap_or(0.0)
    }

    /// All group keys in numeric order.
    pub fn ordered_groups(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.groups.keys().map(String::as_str).collect();
        keys.sort_by(|a, b| compare_group_keys(a, b));
        keys
    }

    /// Groups with a positive total, in numeric order. Empty groups get no column.
    pub fn active_groups(&self) -> Vec<&str> {
        self.ordered_groups()
            .into_iter()
            .filter(|g| self.group_total(g) > 0.0)
            .collect()
    }

    /// Categories with at least one positive value, in declaration order.
    pub fn active_categories(&self) -> Vec<&str> {
        self.categories
            .keys()
            .filter(|c| self.groups.values().any(|g| g.get(*c).is_some_and(|v| *v > 0.0)))
            .map(String::as_str)
            .collect()
    }

    pub fn max_group_total(&self) -> f64 {
        self.groups
            .keys()
            .map(|g| self.group_total(g))
            .fold(0.0, f64::max)
    }

    pub fn max_value(&self) -> f64 {
        self.groups
            .values()
            .flat_map(|g| g.values().copied())
            .fold(0.0, f64::max)
    }

    pub fn has_data(&self) -> bool {
        self.max_group_total() > 0.0
    }

    /// Accepts `{"mode": "stacked", "categories": {...} | [...], "data": {"1": {"X": 10}}}`.
    /// `categories` is optional; an object maps category keys to display labels.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "bar chart")?;
        let mode = match obj.get("mode") {
            Some(m) => serde_json::from_value::<BarMode>(m.clone())?,
            None => BarMode::default(),
        };
        let mut out = Self::new().with_mode(mode);

        match obj.get("categories") {
            Some(Value::Object(cats)) => {
                for (k, label) in cats {
                    let label = label.as_str().unwrap_or(k);
                    out.declare_category(k.clone(), label);
                }
            }
            Some(Value::Array(cats)) => {
                for c in cats {
                    let Some(k) = c.as_str() else {
                        return Err(Error::InvalidSeriesJson {
                            message: format!("category key must be a string, got {c}"),
                        });
                    };
                    out.declare_category(k, k);
                }
            }
            Some(Value::Null) | None => {}
            Some(other) => {
                return Err(Error::InvalidSeriesJson {
                    message: format!("categories must be an object or array, got {other}"),
                });
            }
        }

        let data = obj.get("data").unwrap_or(&Value::Null);
        for (group, cats) in as_object(data, "bar data")? {
            let cats = as_object(cats, "bar group")?;
            if cats.is_empty() {
                out.groups.entry(group.clone()).or_default();
            }
            for (cat, raw) in cats {
                let value = parse_count(&format!("{group}/{cat}"), raw)?.unwrap_or(0.0);
                out.insert(group.clone(), cat.clone(), value)?;
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PyramidRow {
    pub left: f64,
    pub right: f64,
}

/// Age bracket -> `(left, right)` values over a fixed bracket domain (oldest first).
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidSeries {
    brackets: Vec<String>,
    left_label: String,
    right_label: String,
    rows: IndexMap<String, PyramidRow>,
}

impl PyramidSeries {
    /// Uses [`DEFAULT_AGE_BRACKETS`] as the row domain.
    pub fn new(left_label: impl Into<String>, right_label: impl Into<String>) -> Self {
        Self {
            brackets: DEFAULT_AGE_BRACKETS.iter().map(|b| b.to_string()).collect(),
            left_label: left_label.into(),
            right_label: right_label.into(),
            rows: IndexMap::new(),
        }
    }

    /// Replaces the bracket domain. Existing rows must still belong to it.
    pub fn with_brackets<S: Into<String>>(
        mut self,
        brackets: impl IntoIterator<Item = S>,
    ) -> Result<Self> {
        let brackets: Vec<String> = brackets.into_iter().map(Into::into).collect();
        if brackets.is_empty() {
            return Err(Error::malformed("brackets", "bracket domain is empty"));
        }
        for (i, b) in brackets.iter().enumerate() {
            if brackets[..i].contains(b) {
                return Err(Error::malformed(b.clone(), "duplicate bracket"));
            }
        }
        if let Some(stray) = self.rows.keys().find(|k| !brackets.contains(k)) {
            return Err(Error::malformed(stray.clone(), "bracket is not in the domain"));
        }
        self.brackets = brackets;
        Ok(self)
    }

    pub fn insert(&mut self, bracket: impl Into<String>, left: f64, right: f64) -> Result<()> {
        let bracket = bracket.into();
        if !self.brackets.contains(&bracket) {
            return Err(Error::malformed(bracket, "bracket is not in the domain"));
        }
        let left = check_value(&bracket, left)?;
        let right = check_value(&bracket, right)?;
        self.rows.insert(bracket, PyramidRow { left, right });
        Ok(())
    }

    pub fn brackets(&self) -> &[String] {
        &self.brackets
    }

    pub fn left_label(&self) -> &str {
        &self.left_label
    }

    pub fn right_label(&self) -> &str {
        &self.right_label
    }

    pub fn row(&self, bracket: &str) -> Option<PyramidRow> {
        self.rows.get(bracket).copied()
    }

    pub fn max_value(&self) -> f64 {
        self.rows
            .values()
            .map(|r| r.left.max(r.right))
            .fold(0.0, f64::max)
    }

    pub fn has_data(&self) -> bool {
        self.max_value() > 0.0
    }

    /// Accepts `{"left_label": "Male", "right_label": "Female", "brackets": [...],
    /// "data": {"0-4": {"male": n, "female": n}}}`. Row sides may also be spelled
    /// `left`/`right` or `male_value`/`female_value`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "pyramid chart")?;
        let label = |names: &[&str], fallback: &str| {
            first_field(obj, names)
                .and_then(Value::as_str)
                .unwrap_or(fallback)
                .to_string()
        };
        let mut out = Self::new(
            label(&["left_label"], "Male"),
            label(&["right_label"], "Female"),
        );
        if let Some(brackets) = obj.get("brackets").filter(|b| !b.is_null()) {
            let brackets: Vec<String> = serde_json::from_value(brackets.clone())?;
            out = out.with_brackets(brackets)?;
        }

        let data = obj.get("data").unwrap_or(&Value::Null);
        for (bracket, row) in as_object(data, "pyramid data")? {
            let row = as_object(row, "pyramid row")?;
            let left = first_field(row, &["left", "male", "male_value"]).unwrap_or(&Value::Null);
            let right =
                first_field(row, &["right", "female", "female_value"]).unwrap_or(&Value::Null);
            let left = parse_count(bracket, left)?.unwrap_or(0.0);
            let right = parse_count(bracket, right)?.unwrap_or(0.0);
            out.insert(bracket.clone(), left, right)?;
        }
        Ok(out)
    }
}

/// Typed chart input: one variant per chart family, each with its own payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartSpec {
    Pie(PieSeries),
    Bar(BarSeries),
    Pyramid(PyramidSeries),
}

impl ChartSpec {
    pub fn chart_type(&self) -> ChartType {
        match self {
            Self::Pie(_) => ChartType::Pie,
            Self::Bar(_) => ChartType::Bar,
            Self::Pyramid(_) => ChartType::Pyramid,
        }
    }

    /// False when every value is zero or missing; such a spec renders no chart.
    pub fn has_data(&self) -> bool {
        match self {
            Self::Pie(s) => s.has_data(),
            Self::Bar(s) => s.has_data(),
            Self::Pyramid(s) => s.has_data(),
        }
    }

    /// Parses `{"type": "pie" | "bar" | "pyramid", ...}`. Pie charts carry their entries in
    /// `data`; see [`BarSeries::from_json`] and [`PyramidSeries::from_json`] for the others.
    pub fn from_json(value: &Value) -> Result<Self> {
        let obj = as_object(value, "chart spec")?;
        let ty = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidSeriesJson {
                message: "missing string field `type`".to_string(),
            })?;
        let spec = match ty.parse::<ChartType>()? {
            ChartType::Pie => {
                Self::Pie(PieSeries::from_json(obj.get("data").unwrap_or(&Value::Null))?)
            }
            ChartType::Bar => {
                let mut series = BarSeries::from_json(value)?;
                if ty.eq_ignore_ascii_case("grouped") {
                    series = series.with_mode(BarMode::Grouped);
                }
                Self::Bar(series)
            }
            ChartType::Pyramid => Self::Pyramid(PyramidSeries::from_json(value)?),
        };
        tracing::debug!(
            chart_type = %spec.chart_type(),
            has_data = spec.has_data(),
            "parsed chart spec"
        );
        Ok(spec)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json(&value)
    }
}
