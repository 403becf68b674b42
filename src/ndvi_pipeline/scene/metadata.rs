//! Scene metadata parsing: calibration coefficients from the analytic XML and
//! the acquisition time from the item JSON.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Deserialize;
use tracing::debug;

use crate::ndvi_pipeline::common::error::{AnalysisError, Result};

/// TOA reflectance coefficients keyed by 1-based band number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReflectanceCoefficients(BTreeMap<u8, f64>);

impl ReflectanceCoefficients {
    pub fn new(coefficients: BTreeMap<u8, f64>) -> Self {
        Self(coefficients)
    }

    pub fn get(&self, band: u8) -> Option<f64> {
        self.0.get(&band).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Default)]
struct BandEntry {
    number: Option<u8>,
    coefficient: Option<f64>,
}

/// Parses every `bandSpecificMetadata` block of the analytic metadata XML.
///
/// Blocks without a `bandNumber` take their 1-based position in the document.
pub fn parse_reflectance_coefficients(xml: &str) -> Result<ReflectanceCoefficients> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut coefficients = BTreeMap::new();
    let mut entry: Option<BandEntry> = None;
    let mut position: u8 = 0;
    let mut current = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if name == b"bandSpecificMetadata" {
                    position = position.saturating_add(1);
                    entry = Some(BandEntry::default());
                }
                current = name;
            }
            Event::Text(t) => {
                let Some(entry) = entry.as_mut() else {
                    continue;
                };
                let text = t.unescape()?;
                match current.as_slice() {
                    b"bandNumber" => {
                        entry.number = Some(text.trim().parse().map_err(|_| {
                            AnalysisError::MetadataError(format!("bad band number `{text}`"))
                        })?);
                    }
                    b"reflectanceCoefficient" => {
                        entry.coefficient = Some(text.trim().parse().map_err(|_| {
                            AnalysisError::MetadataError(format!(
                                "bad reflectance coefficient `{text}`"
                            ))
                        })?);
                    }
                    _ => {}
                }
            }
            Event::End(e) => {
                if e.local_name().as_ref() == b"bandSpecificMetadata" {
                    if let Some(done) = entry.take() {
                        let number = done.number.unwrap_or(position);
                        if let Some(coefficient) = done.coefficient {
                            debug!(band = number, coefficient, "reflectance coefficient");
                            coefficients.insert(number, coefficient);
                        }
                    }
                }
                current.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if coefficients.is_empty() {
        return Err(AnalysisError::MetadataError(
            "no reflectance coefficients in metadata".to_string(),
        ));
    }

    Ok(ReflectanceCoefficients(coefficients))
}

#[derive(Deserialize)]
struct ItemMetadata {
    properties: ItemProperties,
}

#[derive(Deserialize)]
struct ItemProperties {
    acquired: String,
}

/// Reads `properties.acquired` from the item metadata JSON.
pub fn parse_acquired(json: &str) -> Result<DateTime<Utc>> {
    let item: ItemMetadata = serde_json::from_str(json)?;
    let acquired = DateTime::parse_from_rfc3339(item.properties.acquired.trim())?;
    Ok(acquired.with_timezone(&Utc))
}
