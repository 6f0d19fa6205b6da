//! Positioned text fragments and the page-rendering seam
//!
//! PDF rendering happens outside this crate. Whatever renders the pages hands
//! over, per page, the words it found with their bounding coordinates. The
//! shipped [`FragmentDump`] reads the JSON word-coordinate dump format:
//!
//! ```json
//! { "source": "canara_2024_06.pdf",
//!   "pages": [[ { "text": "Date", "x0": 30.1, "x1": 52.4, "top": 180.0, "bottom": 188.2 } ]] }
//! ```

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::Column;

/// One word with its position on the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub x0: f64,
    pub x1: f64,
    pub top: f64,
    #[serde(default)]
    pub bottom: Option<f64>,
}

impl Fragment {
    pub fn new(text: impl Into<String>, x0: f64, x1: f64, top: f64) -> Self {
        Self {
            text: text.into(),
            x0,
            x1,
            top,
            bottom: None,
        }
    }

    /// Horizontal center, used for column membership
    pub fn center_x(&self) -> f64 {
        (self.x0 + self.x1) / 2.0
    }
}

/// A fragment tagged with the column it was classified into
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub fragment: Fragment,
    pub column: Column,
}

impl Token {
    pub fn text(&self) -> &str {
        &self.fragment.text
    }
}

/// Anything that can yield a document's pages of fragments, in document order
pub trait FragmentSource {
    /// Identifier folded into every transaction id (usually the PDF path)
    fn source_id(&self) -> &str;

    fn pages(&self) -> Result<Vec<Vec<Fragment>>>;
}

/// Word-coordinate dump of a statement, one fragment list per page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FragmentDump {
    #[serde(default)]
    pub source: String,
    pub pages: Vec<Vec<Fragment>>,
}

impl FragmentDump {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    /// Load a dump file; a dump without a `source` is identified by its path
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut dump = Self::from_reader(BufReader::new(file))?;
        if dump.source.trim().is_empty() {
            dump.source = path.display().to_string();
        }
        Ok(dump)
    }
}

impl FragmentSource for FragmentDump {
    fn source_id(&self) -> &str {
        &self.source
    }

    fn pages(&self) -> Result<Vec<Vec<Fragment>>> {
        Ok(self.pages.clone())
    }
}

/// Order one page's fragments top to bottom, then left to right.
///
/// The order is total so shuffled input always yields the same stream.
pub fn order_page(mut page: Vec<Fragment>) -> Vec<Fragment> {
    page.sort_by(|a, b| {
        a.top
            .total_cmp(&b.top)
            .then(a.x0.total_cmp(&b.x0))
            .then(a.x1.total_cmp(&b.x1))
            .then_with(|| a.text.cmp(&b.text))
    });
    page
}

/// Flatten pages (already in document order) into one ordered stream
pub fn token_stream(pages: Vec<Vec<Fragment>>) -> impl Iterator<Item = Fragment> {
    pages.into_iter().flat_map(order_page)
}
