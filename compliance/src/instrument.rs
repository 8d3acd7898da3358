//! Instrument classification.
//!
//! A declared instrument type is taken as given. Otherwise the type is
//! inferred from the earliest cue phrase in the text ("Ley Orgánica",
//! "Decreto con Rango...", "Reglamento", ...). Inference never fails: with no
//! cue it returns an ordinary law flagged as low confidence.

use serde::{Deserialize, Serialize};

use constitution::InstrumentType;

use crate::normalize::{Cue, NormalizedText};

/// Confidence below which a classification is flagged.
const LOW_CONFIDENCE: f64 = 0.5;

/// Cues inspected when the instrument is not declared, most specific first.
const INSTRUMENT_CUES: &[(InstrumentType, &[&str])] = &[
    (
        InstrumentType::Reform,
        &["reforma constitucional", "reforma de la constitucion"],
    ),
    (
        InstrumentType::Amendment,
        &["enmienda constitucional", "enmienda de la constitucion", "enmienda n"],
    ),
    (InstrumentType::OrganicLaw, &["ley organica"]),
    (
        InstrumentType::EnablingLaw,
        &["ley habilitante", "ley que autoriza al presidente"],
    ),
    (
        InstrumentType::DecreeLaw,
        &["decreto con rango", "decreto con fuerza de ley", "decreto ley"],
    ),
    (InstrumentType::MunicipalOrdinance, &["ordenanza"]),
    (InstrumentType::Regulation, &["reglamento"]),
    (InstrumentType::Resolution, &["resolucion"]),
    (
        InstrumentType::OrdinaryLaw,
        &["ley de", "ley sobre", "ley para", "proyecto de ley"],
    ),
];

/// How the instrument type of an analysis was determined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentClassification {
    /// Instrument type used for the analysis
    pub instrument: InstrumentType,
    /// Whether the caller declared the type
    pub declared: bool,
    /// Confidence in the type (1.0 when declared)
    pub confidence: f64,
    /// Best-effort guess that should be confirmed by a reviewer
    pub low_confidence: bool,
    /// Cue phrase that decided the inference
    pub cue: Option<String>,
}

impl InstrumentClassification {
    /// Classification for a caller-declared type.
    pub fn declared(instrument: InstrumentType) -> Self {
        Self {
            instrument,
            declared: true,
            confidence: 1.0,
            low_confidence: false,
            cue: None,
        }
    }

    /// The instrument severity rules should treat as declared: the caller's
    /// type, or a confident inference.
    pub fn effective(&self) -> Option<InstrumentType> {
        (!self.low_confidence).then_some(self.instrument)
    }
}

/// Classify the instrument of a text.
pub fn classify(text: &NormalizedText, declared: Option<InstrumentType>) -> InstrumentClassification {
    if let Some(instrument) = declared {
        return InstrumentClassification::declared(instrument);
    }

    // Earliest cue wins; on the same token, the more specific instrument wins.
    let mut best: Option<(usize, usize, InstrumentType, String)> = None;
    let mut cued = Vec::new();
    for (rank, (instrument, phrases)) in INSTRUMENT_CUES.iter().enumerate() {
        for phrase in *phrases {
            let Some(cue) = Cue::new(phrase) else {
                continue;
            };
            let Some(&at) = text.cue_positions(&cue, text.full_range()).first() else {
                continue;
            };
            if !cued.contains(instrument) {
                cued.push(*instrument);
            }
            if best.as_ref().map_or(true, |(pos, r, _, _)| (at, rank) < (*pos, *r)) {
                best = Some((at, rank, *instrument, cue.label().to_string()));
            }
        }
    }

    let Some((position, _, instrument, cue)) = best else {
        tracing::warn!("No instrument cue found; assuming ordinary law");
        return InstrumentClassification {
            instrument: InstrumentType::OrdinaryLaw,
            declared: false,
            confidence: 0.3,
            low_confidence: true,
            cue: None,
        };
    };

    let mut confidence: f64 = if position < 20 { 0.9 } else { 0.7 };
    if cued.len() > 1 {
        confidence -= 0.1 * (cued.len() - 1) as f64;
    }
    let confidence = confidence.clamp(0.3, 1.0);
    let low_confidence = confidence < LOW_CONFIDENCE;

    if low_confidence {
        tracing::warn!(
            instrument = %instrument,
            confidence,
            "Instrument inference is ambiguous"
        );
    } else {
        tracing::debug!(instrument = %instrument, cue = %cue, confidence, "Instrument inferred");
    }

    InstrumentClassification {
        instrument,
        declared: false,
        confidence,
        low_confidence,
        cue: Some(cue),
    }
}
