//! Basic-zone configuration persistence: JSON export/import with
//! factory-default fallback on an ordering violation (SPEC_FULL §6).

use serde::{Deserialize, Serialize};

use oht50_common::consts::{FACTORY_EMERGENCY_ZONE_MM, FACTORY_SAFE_ZONE_MM, FACTORY_WARNING_ZONE_MM};

use crate::zones::ZoneThresholds;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDocumentZones {
    pub enabled: bool,
    pub emergency_zone_mm: u32,
    pub warning_zone_mm: u32,
    pub safe_zone_mm: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorTimingKnobs {
    pub zone_check_period_us: u64,
    pub interlock_check_period_us: u64,
    pub sensor_check_period_us: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneConfigDocument {
    pub version: u32,
    pub timestamp_us: u64,
    pub zones: ZoneDocumentZones,
    pub timing: MonitorTimingKnobs,
}

pub const ZONE_CONFIG_DOCUMENT_VERSION: u32 = 1;

impl ZoneConfigDocument {
    pub fn factory_default(timestamp_us: u64) -> Self {
        Self {
            version: ZONE_CONFIG_DOCUMENT_VERSION,
            timestamp_us,
            zones: ZoneDocumentZones {
                enabled: true,
                emergency_zone_mm: FACTORY_EMERGENCY_ZONE_MM,
                warning_zone_mm: FACTORY_WARNING_ZONE_MM,
                safe_zone_mm: FACTORY_SAFE_ZONE_MM,
            },
            timing: MonitorTimingKnobs {
                zone_check_period_us: oht50_common::consts::ZONE_CHECK_PERIOD_US,
                interlock_check_period_us: oht50_common::consts::INTERLOCK_CHECK_PERIOD_US,
                sensor_check_period_us: oht50_common::consts::SENSOR_CHECK_PERIOD_US,
            },
        }
    }

    pub fn thresholds(&self) -> ZoneThresholds {
        ZoneThresholds {
            emergency_mm: self.zones.emergency_zone_mm,
            warning_mm: self.zones.warning_zone_mm,
            safe_mm: self.zones.safe_zone_mm,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("ZoneConfigDocument is always serializable")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("invalid zone configuration: emergency={emergency} warning={warning} safe={safe} (ordering invariant violated)")]
    InvalidOrdering { emergency: u32, warning: u32, safe: u32 },

    #[error("malformed zone configuration JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse and validate a zone config document. S6: an ordering violation is
/// rejected outright (caller keeps its previous configuration); this
/// function never silently substitutes factory defaults — that fallback is
/// reserved for *load* (see [`load_or_factory_default`]), not *import*.
pub fn parse_and_validate(json: &str) -> Result<ZoneConfigDocument, PersistError> {
    let doc: ZoneConfigDocument = serde_json::from_str(json)?;
    if !doc.thresholds().ordering_holds() {
        return Err(PersistError::InvalidOrdering {
            emergency: doc.zones.emergency_zone_mm,
            warning: doc.zones.warning_zone_mm,
            safe: doc.zones.safe_zone_mm,
        });
    }
    Ok(doc)
}

/// Load from a JSON string on startup. Unlike `parse_and_validate`, an
/// invalid document here falls back to factory defaults rather than
/// propagating an error, per SPEC_FULL §6's load-time behaviour.
pub fn load_or_factory_default(json: &str, now_us: u64) -> ZoneConfigDocument {
    match parse_and_validate(json) {
        Ok(doc) => doc,
        Err(err) => {
            tracing::warn!(%err, "zone config invalid on load; falling back to factory defaults");
            ZoneConfigDocument::factory_default(now_us)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_import_round_trips_valid_config() {
        let doc = ZoneConfigDocument::factory_default(1_000);
        let json = doc.to_json();
        let reimported = parse_and_validate(&json).unwrap();
        assert_eq!(reimported.zones.emergency_zone_mm, doc.zones.emergency_zone_mm);
        assert_eq!(reimported.zones.warning_zone_mm, doc.zones.warning_zone_mm);
        assert_eq!(reimported.zones.safe_zone_mm, doc.zones.safe_zone_mm);
    }

    #[test]
    fn s6_invalid_ordering_is_rejected_by_import() {
        let mut doc = ZoneConfigDocument::factory_default(0);
        doc.zones.emergency_zone_mm = 1_500;
        doc.zones.warning_zone_mm = 1_000;
        let json = doc.to_json();
        assert!(matches!(
            parse_and_validate(&json),
            Err(PersistError::InvalidOrdering { .. })
        ));
    }

    #[test]
    fn load_falls_back_to_factory_default_on_invalid_json() {
        let doc = load_or_factory_default("not json", 42);
        assert_eq!(doc.zones.emergency_zone_mm, FACTORY_EMERGENCY_ZONE_MM);
    }

    #[test]
    fn load_falls_back_on_ordering_violation() {
        let mut bad = ZoneConfigDocument::factory_default(0);
        bad.zones.emergency_zone_mm = 9_999;
        let doc = load_or_factory_default(&bad.to_json(), 42);
        assert_eq!(doc.zones.emergency_zone_mm, FACTORY_EMERGENCY_ZONE_MM);
    }
}
