//! Alternative adoption routes when the projected votes fall short.

use constitution::{InstrumentType, KnowledgeBase};

use super::{FallbackRoute, FeasibilityContext};
use crate::types::{BodyComposition, Result};

/// Candidate route with the condition that makes it lawful.
struct Candidate {
    instrument: InstrumentType,
    lawful: bool,
    condition: &'static str,
}

fn candidates(instrument: InstrumentType, context: &FeasibilityContext) -> Vec<Candidate> {
    use InstrumentType::*;

    let decree = Candidate {
        instrument: DecreeLaw,
        lawful: context.enabling_law_in_force,
        condition: "requires an enabling law in force",
    };
    let regulation = Candidate {
        instrument: Regulation,
        lawful: context.base_law_exists,
        condition: "requires a base law to develop",
    };

    match instrument {
        OrganicLaw => vec![
            Candidate {
                instrument: OrdinaryLaw,
                lawful: !context.subject_requires_organic,
                condition: "only when the subject matter does not require organic status",
            },
            decree,
            regulation,
        ],
        OrdinaryLaw => vec![
            decree,
            regulation,
            Candidate {
                instrument: Resolution,
                lawful: context.base_law_exists,
                condition: "limited scope; requires a base law",
            },
        ],
        EnablingLaw => vec![Candidate {
            instrument: OrdinaryLaw,
            lawful: true,
            condition: "the Assembly legislates the matter directly",
        }],
        Reform => vec![Candidate {
            instrument: Amendment,
            lawful: true,
            condition: "only when the change does not alter the fundamental structure",
        }],
        _ => Vec::new(),
    }
}

/// Ranked fallbacks for a shortfall: reachable routes first, then the
/// order in which the routes are usually considered.
pub fn fallbacks(
    kb: &KnowledgeBase,
    instrument: InstrumentType,
    composition: &BodyComposition,
    context: &FeasibilityContext,
) -> Result<Vec<FallbackRoute>> {
    let mut routes = Vec::new();
    for candidate in candidates(instrument, context) {
        let (votes_required, votes_ok) = if candidate.instrument.is_deliberative() {
            let rule = kb.majority_rule(candidate.instrument)?;
            let required = rule.votes_required(composition.base_count(rule.base));
            let ok = required <= composition.present_count()
                && context.projected_votes.map_or(true, |v| v >= required);
            (Some(required), ok)
        } else {
            (None, true)
        };

        let reachable = candidate.lawful && votes_ok;
        let rationale = match (candidate.lawful, votes_ok) {
            (true, true) => format!("{}: {}", candidate.instrument.legal_name(), candidate.condition),
            (false, _) => format!(
                "{} not available: {}",
                candidate.instrument.legal_name(),
                candidate.condition
            ),
            (true, false) => format!(
                "{} also lacks the projected votes",
                candidate.instrument.legal_name()
            ),
        };
        routes.push(FallbackRoute {
            instrument: candidate.instrument,
            votes_required,
            reachable,
            rationale,
        });
    }

    routes.sort_by_key(|r| !r.reachable);
    Ok(routes)
}
