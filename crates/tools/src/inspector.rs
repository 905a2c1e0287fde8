use std::collections::BTreeMap;

use radarsync_common::{BlipShape, EntityId};
use radarsync_protocol::BlipEntry;
use serde::Serialize;

/// Read-only summaries of blip reports for debugging and the CLI.
pub struct ReportInspector;

impl ReportInspector {
    /// Summarize a report as received from the server.
    pub fn summary(sensor: Option<EntityId>, entries: &[BlipEntry]) -> ReportSummary {
        let mut grids = BTreeMap::new();
        let mut shapes = BTreeMap::new();
        for entry in entries {
            if let Some(grid) = entry.grid {
                *grids.entry(grid).or_insert(0) += 1;
            }
            *shapes.entry(entry.shape).or_insert(0) += 1;
        }
        let world_space = entries.iter().filter(|e| !e.is_grid_relative()).count();
        ReportSummary {
            sensor,
            entries: entries.len(),
            world_space,
            grids,
            shapes,
        }
    }
}

/// Counts describing one report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub sensor: Option<EntityId>,
    pub entries: usize,
    /// Entries carrying world-space positions.
    pub world_space: usize,
    /// Grid-relative entries per grid.
    pub grids: BTreeMap<EntityId, usize>,
    pub shapes: BTreeMap<BlipShape, usize>,
}

impl std::fmt::Display for ReportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.sensor {
            Some(sensor) => write!(f, "Report [{sensor}]")?,
            None => write!(f, "Report [unspecified]")?,
        }
        write!(
            f,
            " entries={} world={} grids={}",
            self.entries,
            self.world_space,
            self.grids.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use radarsync_common::Rgba8;

    fn entry(grid: Option<EntityId>, shape: BlipShape) -> BlipEntry {
        BlipEntry {
            grid,
            position: Default::default(),
            scale: 1.0,
            color: Rgba8::WHITE,
            shape,
        }
    }

    #[test]
    fn summary_empty_report() {
        let summary = ReportInspector::summary(None, &[]);
        assert_eq!(summary.entries, 0);
        assert_eq!(summary.world_space, 0);
        assert!(summary.grids.is_empty());
        assert_eq!(summary.to_string(), "Report [unspecified] entries=0 world=0 grids=0");
    }

    #[test]
    fn summary_groups_by_grid_and_shape() {
        let g1 = EntityId::new();
        let g2 = EntityId::new();
        let entries = [
            entry(Some(g1), BlipShape::Circle),
            entry(Some(g1), BlipShape::Arrow),
            entry(Some(g2), BlipShape::Circle),
            entry(None, BlipShape::Star),
        ];
        let summary = ReportInspector::summary(Some(EntityId::new()), &entries);
        assert_eq!(summary.entries, 4);
        assert_eq!(summary.world_space, 1);
        assert_eq!(summary.grids.get(&g1), Some(&2));
        assert_eq!(summary.grids.get(&g2), Some(&1));
        assert_eq!(summary.shapes.get(&BlipShape::Circle), Some(&2));
        assert!(summary.to_string().contains("grids=2"));
    }
}
