//! Constitutional compliance and legislative feasibility engine
//!
//! Checks a proposed legal text against the CRBV knowledge base and, when a
//! voting body is supplied, computes what it takes to adopt it:
//!
//! - **Conflict detection**: keyword clusters scored per article, with
//!   proximity bonus and exception-clause discount
//! - **Severity**: ordered first-match rules over article flags, match
//!   context and instrument type
//! - **Test battery**: five independent compliance tests, fanned out on rayon
//! - **Risk**: aggregate level, nullity probability, compliance percentage
//!   and prioritized recommendations
//! - **Feasibility**: quorum and vote thresholds, stage timeline, blockers
//!   and fallback instruments
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ComplianceEngine                        │
//! │                                                              │
//! │  ┌───────────┐  ┌──────────┐  ┌──────────┐  ┌────────────┐  │
//! │  │ Normalize │──│  Detect  │──│ Severity │──│  Battery   │  │
//! │  └───────────┘  └──────────┘  └──────────┘  └─────┬──────┘  │
//! │                                                   │         │
//! │  ┌─────────────┐                          ┌───────▼──────┐  │
//! │  │ Feasibility │─────────────────────────▶│     Risk     │  │
//! │  └─────────────┘                          └──────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use compliance::{AnalysisRequest, BodyComposition, ComplianceEngine};
//! use constitution::InstrumentType;
//!
//! let engine = ComplianceEngine::with_defaults()?;
//! let report = engine.analyze(
//!     &AnalysisRequest::new(text)
//!         .with_instrument(InstrumentType::OrganicLaw)
//!         .with_composition(BodyComposition::full(277))
//!         .with_projected_votes(150),
//! )?;
//! ```

pub mod battery;
pub mod config;
pub mod detector;
pub mod engine;
pub mod feasibility;
pub mod instrument;
pub mod normalize;
pub mod report;
pub mod risk;
pub mod severity;
pub mod types;

// Re-export main types
pub use config::EngineConfig;
pub use engine::{AnalysisRequest, ComplianceEngine};
pub use feasibility::{
    FeasibilityCalculator, FeasibilityContext, FeasibilityLevel, FeasibilityQuery,
    FeasibilityScorecard, Stage,
};
pub use instrument::InstrumentClassification;
pub use report::ComplianceReport;
pub use risk::{AmendmentRoute, Recommendation, RecommendationSource, SeverityCounts};
pub use types::*;
