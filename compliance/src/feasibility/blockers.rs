//! Known failure modes of each adoption route.

use constitution::InstrumentType;

use super::{BlockerFinding, BlockerKind, RiskRating};

fn blocker(
    kind: BlockerKind,
    name: &str,
    description: &str,
    rating: RiskRating,
    probability: f64,
    mitigation: &str,
) -> BlockerFinding {
    BlockerFinding {
        kind,
        name: name.to_string(),
        description: description.to_string(),
        rating,
        probability,
        mitigation: mitigation.to_string(),
    }
}

/// Standard blockers for an instrument, independent of the vote projection.
pub fn standard_blockers(instrument: InstrumentType) -> Vec<BlockerFinding> {
    use InstrumentType::*;

    let mut blockers = Vec::new();

    if instrument.is_deliberative() {
        blockers.push(blocker(
            BlockerKind::Political,
            "Insufficient quorum",
            "The body fails to reach the quorum required to sit",
            RiskRating::High,
            0.2,
            "Coordinate attendance with the parliamentary blocs",
        ));
        blockers.push(blocker(
            BlockerKind::Political,
            "Parliamentary obstruction",
            "Delaying tactics by the opposition",
            RiskRating::Medium,
            0.3,
            "Negotiate governability agreements",
        ));
    }

    if matches!(instrument, OrdinaryLaw | OrganicLaw | EnablingLaw) {
        blockers.push(blocker(
            BlockerKind::Political,
            "Presidential veto",
            "The Executive returns the law without promulgating it",
            RiskRating::High,
            0.15,
            "Coordinate with the Executive in advance or secure the majority to insist",
        ));
    }

    if matches!(instrument, OrganicLaw | EnablingLaw) {
        blockers.push(blocker(
            BlockerKind::Political,
            "Qualified majority not reached",
            "The 2/3 or 3/5 majority is not obtained",
            RiskRating::High,
            0.4,
            "Negotiate with minority blocs",
        ));
    }

    if matches!(instrument, Amendment | Reform) {
        blockers.push(blocker(
            BlockerKind::Political,
            "Referendum rejection",
            "Voters do not approve the constitutional change",
            RiskRating::High,
            0.35,
            "Information campaign and prior public consultation",
        ));
        blockers.push(blocker(
            BlockerKind::Political,
            "Mass abstention",
            "Turnout falls below the required threshold",
            RiskRating::Medium,
            0.25,
            "Citizen mobilization",
        ));
    }

    match instrument {
        OrganicLaw => blockers.push(blocker(
            BlockerKind::Legal,
            "Constitutional Chamber review",
            "The Constitutional Chamber finds the organic character or the content unconstitutional",
            RiskRating::High,
            0.2,
            "Prior review by constitutional experts",
        )),
        DecreeLaw => blockers.push(blocker(
            BlockerKind::Legal,
            "Exceeds the enabling law",
            "The decree falls outside the term or matters of the delegation",
            RiskRating::High,
            0.2,
            "Cite the enabling law article that covers each matter",
        )),
        Regulation => blockers.push(blocker(
            BlockerKind::Legal,
            "Alters the spirit of the law",
            "The regulation goes beyond the law it develops",
            RiskRating::Medium,
            0.15,
            "Keep every provision anchored to the base law",
        )),
        Resolution => blockers.push(blocker(
            BlockerKind::Legal,
            "Annulment for lack of competence",
            "The administrative act is annulled for exceeding the minister's powers",
            RiskRating::Medium,
            0.15,
            "Cite the legal norm that grants the competence",
        )),
        _ => {}
    }

    blockers
}

/// Blocker for a session that cannot reach quorum.
pub fn quorum_shortfall(present: u32, required: u32) -> BlockerFinding {
    blocker(
        BlockerKind::Political,
        "Quorum not reached",
        &format!("{} members present, {} required to sit", present, required),
        RiskRating::High,
        1.0,
        "Secure attendance before scheduling the vote",
    )
}

/// Blocker for a vote the projection does not carry.
pub fn vote_shortfall(projected: u32, required: u32) -> BlockerFinding {
    blocker(
        BlockerKind::Political,
        "Votes short of the threshold",
        &format!(
            "{} favorable votes projected, {} required ({} short)",
            projected,
            required,
            required.saturating_sub(projected)
        ),
        RiskRating::High,
        1.0,
        "Negotiate the missing votes or pursue a fallback route",
    )
}

/// Blocker for a threshold larger than the members present.
pub fn threshold_unreachable(present: u32, required: u32) -> BlockerFinding {
    blocker(
        BlockerKind::Legal,
        "Threshold unreachable with current attendance",
        &format!(
            "{} votes required but only {} members present",
            required, present
        ),
        RiskRating::High,
        1.0,
        "Raise attendance before the vote",
    )
}
