#![forbid(unsafe_code)]

//! Data model shared by the ward chart renderers.
//!
//! - [`series`]: caller-supplied chart input (pie, bar and pyramid series) with boundary
//!   validation
//! - [`numeral`]: locale-aware digit and percentage formatting
//! - [`color`]: stable key-to-color assignment
//! - [`order`]: numeric ordering of ward/group keys

pub mod color;
pub mod error;
pub mod numeral;
pub mod order;
pub mod series;

pub use color::{ColorAssigner, DEFAULT_PALETTE};
pub use error::{Error, Result};
pub use numeral::{Grouping, Locale, NumeralFormatter};
pub use order::{compare_group_keys, sort_group_keys};
pub use series::{
    BarMode, BarSeries, ChartSpec, ChartType, DEFAULT_AGE_BRACKETS, PieSeries, PyramidRow,
    PyramidSeries, SeriesEntry,
};
