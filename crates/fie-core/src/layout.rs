//! Statement layout: column bands and marker words
//!
//! A statement template is described by where each table column sits
//! horizontally and by the literal words that delimit the table. Nothing here
//! is process-wide state; a [`StatementLayout`] is passed to the parser.
//!
//! ## Configuration Resolution
//!
//! Layouts are loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/fie/config/layout.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::fragment::Fragment;

/// Embedded default layout (compiled into binary)
const DEFAULT_LAYOUT: &str = include_str!("../../../config/layout.toml");

/// Semantic column of a statement table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Date,
    Particulars,
    Deposit,
    Withdrawal,
    Balance,
    Other,
}

impl Column {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Particulars => "particulars",
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Balance => "balance",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for Column {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Horizontal range `[left, right)` assigned to a column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnBand {
    pub column: Column,
    pub left: f64,
    pub right: f64,
}

impl ColumnBand {
    pub fn contains(&self, x: f64) -> bool {
        self.left <= x && x < self.right
    }
}

/// Literal words that structure the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Markers {
    /// Header row captions; all must be seen before the table starts
    pub header_captions: Vec<String>,
    /// Token that precedes each row's closing reference number
    pub cheque: String,
    /// Footer word for pagination ("Page 3 of 7")
    pub page: String,
    /// Word opening the opening-balance row
    pub opening: Option<String>,
    /// Word opening the closing-balance row; ends the table
    pub closing: Option<String>,
}

impl Default for Markers {
    fn default() -> Self {
        Self {
            header_captions: ["Date", "Particulars", "Deposits", "Withdrawals", "Balance"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            cheque: "Chq:".to_string(),
            page: "page".to_string(),
            opening: Some("Opening".to_string()),
            closing: Some("Closing".to_string()),
        }
    }
}

/// Layout of one statement template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementLayout {
    pub name: String,
    /// Ordered; the first band containing a fragment's center wins
    pub bands: Vec<ColumnBand>,
    #[serde(default)]
    pub markers: Markers,
}

impl StatementLayout {
    /// The embedded Canara layout
    pub fn canara() -> Self {
        Self::from_toml_str(DEFAULT_LAYOUT).expect("embedded layout is valid")
    }

    /// Parse and validate a layout from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let layout: Self = toml::from_str(content)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Load a layout (explicit path or data-dir override first, then default)
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(path) => Some(path.to_path_buf()),
            None => default_layout_path().filter(|p| p.exists()),
        };

        match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading statement layout");
                let content = fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&content)
            }
            None => Self::from_toml_str(DEFAULT_LAYOUT),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.bands.is_empty() {
            return Err(Error::Config("layout has no column bands".into()));
        }
        for band in &self.bands {
            if !band.left.is_finite() || !band.right.is_finite() || band.left >= band.right {
                return Err(Error::Config(format!(
                    "band for {} has invalid range [{}, {})",
                    band.column, band.left, band.right
                )));
            }
        }
        if self.markers.header_captions.is_empty() {
            return Err(Error::Config("layout has no header captions".into()));
        }
        if self.markers.cheque.trim().is_empty() {
            return Err(Error::Config("cheque marker must not be empty".into()));
        }
        Ok(())
    }

    /// Map a fragment to its column by horizontal center
    pub fn classify(&self, fragment: &Fragment) -> Column {
        let center = fragment.center_x();
        self.bands
            .iter()
            .find(|band| band.contains(center))
            .map(|band| band.column)
            .unwrap_or(Column::Other)
    }
}

impl Default for StatementLayout {
    fn default() -> Self {
        Self::canara()
    }
}

/// Default layout override path
pub fn default_layout_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("fie").join("config").join("layout.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x0: f64, x1: f64) -> Fragment {
        Fragment::new("w", x0, x1, 0.0)
    }

    #[test]
    fn test_embedded_layout_parses() {
        let layout = StatementLayout::canara();
        assert_eq!(layout.name, "canara");
        assert_eq!(layout.bands.len(), 5);
        assert_eq!(layout.markers.cheque, "Chq:");
        assert_eq!(layout.markers.header_captions.len(), 5);
    }

    #[test]
    fn test_classify_by_center() {
        let layout = StatementLayout::canara();
        assert_eq!(layout.classify(&at(30.0, 80.0)), Column::Date);
        assert_eq!(layout.classify(&at(110.0, 160.0)), Column::Particulars);
        assert_eq!(layout.classify(&at(330.0, 380.0)), Column::Deposit);
        assert_eq!(layout.classify(&at(440.0, 480.0)), Column::Withdrawal);
        assert_eq!(layout.classify(&at(530.0, 580.0)), Column::Balance);
    }

    #[test]
    fn test_classify_gap_is_other() {
        let layout = StatementLayout::canara();
        // Center 310 falls between PART and DEPOSIT
        assert_eq!(layout.classify(&at(300.0, 320.0)), Column::Other);
        assert_eq!(layout.classify(&at(0.0, 10.0)), Column::Other);
        assert_eq!(layout.classify(&at(700.0, 720.0)), Column::Other);
    }

    #[test]
    fn test_band_is_right_exclusive() {
        let band = ColumnBand {
            column: Column::Date,
            left: 20.0,
            right: 90.0,
        };
        assert!(band.contains(20.0));
        assert!(band.contains(89.99));
        assert!(!band.contains(90.0));
    }

    #[test]
    fn test_classify_is_total_and_deterministic() {
        let layout = StatementLayout::canara();
        let mut x = -50.0;
        while x < 700.0 {
            let f = at(x, x + 12.0);
            assert_eq!(layout.classify(&f), layout.classify(&f));
            x += 7.5;
        }
    }

    #[test]
    fn test_first_band_wins_on_overlap() {
        let layout = StatementLayout::from_toml_str(
            r#"
            name = "overlap"
            [[bands]]
            column = "deposit"
            left = 0.0
            right = 100.0
            [[bands]]
            column = "withdrawal"
            left = 50.0
            right = 150.0
            "#,
        )
        .unwrap();
        assert_eq!(layout.classify(&at(60.0, 80.0)), Column::Deposit);
        assert_eq!(layout.classify(&at(110.0, 130.0)), Column::Withdrawal);
        // Markers fall back to defaults when omitted
        assert_eq!(layout.markers, Markers::default());
    }

    #[test]
    fn test_invalid_band_rejected() {
        let err = StatementLayout::from_toml_str(
            r#"
            name = "bad"
            [[bands]]
            column = "date"
            left = 90.0
            right = 20.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_bands_rejected() {
        let err = StatementLayout::from_toml_str("name = \"none\"\nbands = []\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("layout.toml");
        fs::write(
            &path,
            r#"
            name = "custom"
            [[bands]]
            column = "particulars"
            left = 0.0
            right = 600.0
            [markers]
            cheque = "Ref:"
            opening = "Brought"
            "#,
        )
        .unwrap();

        let layout = StatementLayout::load(Some(&path)).unwrap();
        assert_eq!(layout.name, "custom");
        assert_eq!(layout.markers.cheque, "Ref:");
        assert_eq!(layout.markers.opening.as_deref(), Some("Brought"));
        assert_eq!(layout.markers.closing.as_deref(), Some("Closing"));
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let err = StatementLayout::load(Some(Path::new("/nonexistent/layout.toml"))).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
