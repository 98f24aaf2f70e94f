use std::path::Path;

use anyhow::anyhow;
use serde::Deserialize;

/// The slice of the ipynb JSON document this tool cares about: an ordered
/// sequence of cells, each holding an ordered sequence of source lines.
#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cell {
    pub cell_type: String,
    #[serde(default)]
    pub source: Source,
}

/// Cell source as found in the wild: either a list of lines or one string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Lines(Vec<String>),
    Text(String),
}

impl Default for Source {
    fn default() -> Self {
        Source::Lines(vec![])
    }
}

impl Cell {
    pub fn is_code(&self) -> bool {
        self.cell_type == "code"
    }
}

impl Source {
    pub fn lines(&self) -> Vec<&str> {
        match self {
            Source::Lines(lines) => lines.iter().map(String::as_str).collect(),
            Source::Text(text) => text.lines().collect(),
        }
    }
}

impl Notebook {
    pub fn from_path(path: &Path) -> anyhow::Result<Notebook> {
        let content = std::fs::read_to_string(path)
            .map_err(|_| anyhow!("Failed to read notebook file {}", path.display()))?;
        serde_json::from_str(&content).map_err(|err| {
            anyhow!(
                "Failed to parse notebook {} as ipynb JSON due to error: {}",
                path.display(),
                err
            )
        })
    }
}
