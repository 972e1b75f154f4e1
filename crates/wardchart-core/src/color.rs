use rustc_hash::FxHashMap;

/// Default categorical palette, cycled when a key has no explicit color.
pub const DEFAULT_PALETTE: [&str; 12] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf", "#393b79", "#637939",
];

/// Maps data keys to display colors.
///
/// Keys with an explicit mapping always get that color. Every other key takes the next
/// palette slot the first time it is seen and keeps it for the lifetime of the assigner, so
/// the same category is painted identically in the chart body and the legend.
#[derive(Debug, Clone)]
pub struct ColorAssigner {
    palette: Vec<String>,
    explicit: FxHashMap<String, String>,
    assigned: FxHashMap<String, usize>,
    next: usize,
}

impl Default for ColorAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorAssigner {
    pub fn new() -> Self {
        Self::with_palette(DEFAULT_PALETTE.iter().map(|c| c.to_string()))
    }

    /// An empty palette falls back to [`DEFAULT_PALETTE`].
    pub fn with_palette(palette: impl IntoIterator<Item = String>) -> Self {
        let mut palette: Vec<String> = palette.into_iter().collect();
        if palette.is_empty() {
            palette = DEFAULT_PALETTE.iter().map(|c| c.to_string()).collect();
        }
        Self {
            palette,
            explicit: FxHashMap::default(),
            assigned: FxHashMap::default(),
            next: 0,
        }
    }

    pub fn with_mapping<K, V>(mut self, mapping: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (k, v) in mapping {
            self.explicit.insert(k.into(), v.into());
        }
        self
    }

    pub fn set(&mut self, key: impl Into<String>, color: impl Into<String>) {
        self.explicit.insert(key.into(), color.into());
    }

    pub fn palette(&self) -> &[String] {
        &self.palette
    }

    pub fn color_for(&mut self, key: &str) -> String {
        if let Some(c) = self.explicit.get(key) {
            return c.clone();
        }
        if let Some(idx) = self.assigned.get(key).copied() {
            return self.palette[idx % self.palette.len()].clone();
        }
        let idx = self.next;
        self.next += 1;
        self.assigned.insert(key.to_string(), idx);
        self.palette[idx % self.palette.len()].clone()
    }
}
