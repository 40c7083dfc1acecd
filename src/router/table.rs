//! CC routing table
//!
//! Disjoint CC ranges, each mapped to one parameter with a fixed transform.
//! Values are not clamped: a data byte above 127 passes straight through the
//! transform.

use anyhow::{bail, Result};

use super::ParameterUpdate;
use crate::config::RoutingConfig;

/// Parameter a CC range drives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterRef {
    /// `morph[cc - base]`, weight = value / 127
    Morph { base: u8 },
    /// Hue = round(value / 127 * 360)
    Hue,
    /// Percent = round(50 + value / 127 * 100)
    ScalePercent,
}

/// Inclusive CC range and its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingEntry {
    pub cc_low: u8,
    pub cc_high: u8,
    pub target: ParameterRef,
}

impl RoutingEntry {
    pub fn contains(&self, cc: u8) -> bool {
        (self.cc_low..=self.cc_high).contains(&cc)
    }

    fn overlaps(&self, other: &RoutingEntry) -> bool {
        self.cc_low <= other.cc_high && other.cc_low <= self.cc_high
    }

    /// Apply the transform for `cc` (must be inside the range)
    fn transform(&self, cc: u8, value: u8) -> ParameterUpdate {
        let v = f32::from(value);
        match self.target {
            ParameterRef::Morph { base } => ParameterUpdate::MorphWeight {
                index: usize::from(cc - base),
                weight: v / 127.0,
            },
            ParameterRef::Hue => ParameterUpdate::Hue((v / 127.0 * 360.0).round()),
            ParameterRef::ScalePercent => {
                ParameterUpdate::ScalePercent((50.0 + v / 127.0 * 100.0).round())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    entries: Vec<RoutingEntry>,
}

impl RoutingTable {
    /// Build and validate a table from explicit entries
    pub fn new(entries: Vec<RoutingEntry>) -> Result<Self> {
        for (i, entry) in entries.iter().enumerate() {
            if entry.cc_low > entry.cc_high {
                bail!(
                    "CC range {}-{} is empty",
                    entry.cc_low,
                    entry.cc_high
                );
            }
            if entry.cc_high > 127 {
                bail!("CC {} is invalid (must be 0-127)", entry.cc_high);
            }
            if let ParameterRef::Morph { base } = entry.target {
                if base != entry.cc_low {
                    bail!("Morph range must start at its base CC {}", base);
                }
            }
            for other in &entries[..i] {
                if entry.overlaps(other) {
                    bail!(
                        "CC range {}-{} ({:?}) overlaps {}-{} ({:?})",
                        entry.cc_low,
                        entry.cc_high,
                        entry.target,
                        other.cc_low,
                        other.cc_high,
                        other.target
                    );
                }
            }
        }

        Ok(Self { entries })
    }

    /// The table described by the `routing` config section
    pub fn from_config(config: &RoutingConfig) -> Result<Self> {
        let mut entries = Vec::with_capacity(3);

        if config.morph_slots > 0 {
            let high = u16::from(config.morph_base_cc) + u16::from(config.morph_slots) - 1;
            if high > 127 {
                bail!(
                    "Morph range {}+{} runs past CC 127",
                    config.morph_base_cc,
                    config.morph_slots
                );
            }
            entries.push(RoutingEntry {
                cc_low: config.morph_base_cc,
                cc_high: high as u8,
                target: ParameterRef::Morph {
                    base: config.morph_base_cc,
                },
            });
        }

        entries.push(RoutingEntry {
            cc_low: config.hue_cc,
            cc_high: config.hue_cc,
            target: ParameterRef::Hue,
        });
        entries.push(RoutingEntry {
            cc_low: config.scale_cc,
            cc_high: config.scale_cc,
            target: ParameterRef::ScalePercent,
        });

        Self::new(entries)
    }

    pub fn entries(&self) -> &[RoutingEntry] {
        &self.entries
    }

    /// Resolve a CC number and value to a parameter update
    pub fn resolve(&self, cc: u8, value: u8) -> Option<ParameterUpdate> {
        self.entries
            .iter()
            .find(|e| e.contains(cc))
            .map(|e| e.transform(cc, value))
    }
}
