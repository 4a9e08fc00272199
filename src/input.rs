//! Input bundle loading.
//!
//! A bundle is a JSON file holding the analyzer results and, optionally,
//! per-protocol snapshots:
//!
//! ```json
//! {
//!   "concentration": { "compound": { "gini_coefficient": 0.91 } },
//!   "participation": { "compound": { "participation_rate": 6.2 } },
//!   "snapshots": {
//!     "compound": { "columns": ["turnout"], "rows": [[0.05], [0.07]] }
//!   }
//! }
//! ```

use crate::models::{ProtocolMetrics, ProtocolSnapshot, Snapshots};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};

/// Everything the aggregation operations consume.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputBundle {
    #[serde(default)]
    pub concentration: ProtocolMetrics,

    #[serde(default)]
    pub participation: ProtocolMetrics,

    #[serde(default)]
    pub snapshots: Snapshots,
}

impl InputBundle {
    /// Parse a bundle from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse input bundle")
    }

    /// Load a bundle from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?;

        let bundle = Self::from_json(&content)
            .with_context(|| format!("Invalid input file: {}", path.display()))?;

        info!(
            "Loaded input bundle: {} concentration, {} participation, {} snapshots",
            bundle.concentration.len(),
            bundle.participation.len(),
            bundle.snapshots.len()
        );

        Ok(bundle)
    }

    /// Snapshots for pattern and ranking analysis.
    ///
    /// Explicit snapshots win. Otherwise one single-row snapshot is derived
    /// per protocol from its analyzer results.
    pub fn effective_snapshots(&self) -> Snapshots {
        if !self.snapshots.is_empty() {
            return self.snapshots.clone();
        }

        let protocols: BTreeSet<&String> = self
            .concentration
            .keys()
            .chain(self.participation.keys())
            .collect();

        debug!("Deriving snapshots for {} protocols from results", protocols.len());

        protocols
            .into_iter()
            .map(|protocol| {
                let snapshot = ProtocolSnapshot::from_results(
                    self.concentration.get(protocol),
                    self.participation.get(protocol),
                );
                (protocol.clone(), snapshot)
            })
            .collect()
    }
}
