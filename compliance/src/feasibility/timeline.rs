//! Stage plans per instrument.
//!
//! Durations are calendar days taken from observed legislative practice;
//! discussion stages follow the rule's discussion count.

use constitution::{InstrumentType, MajorityRule};

use super::Stage;

/// One planned stage before any vote is assessed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct StagePlan {
    pub stage: Stage,
    pub min_days: u32,
    pub max_days: u32,
    pub responsible: &'static str,
    pub description: &'static str,
}

type Days = (u32, u32);

struct Durations {
    initiative: (Days, &'static str),
    discussions: ([Days; 3], &'static str),
    enactment: (Days, &'static str),
    promulgation: (Days, &'static str),
    publication: (Days, &'static str),
}

const REFERENDUM: (Days, &str) = ((30, 90), "Consejo Nacional Electoral");

fn durations(instrument: InstrumentType) -> Durations {
    match instrument {
        InstrumentType::OrdinaryLaw | InstrumentType::EnablingLaw => Durations {
            initiative: ((1, 7), "Proponente (Diputados, Ejecutivo, TSJ, ciudadanos)"),
            discussions: ([(15, 30), (15, 45), (15, 45)], "Asamblea Nacional - Plenaria"),
            enactment: ((1, 5), "Presidente de la Asamblea Nacional"),
            promulgation: ((1, 10), "Presidente de la República"),
            publication: ((1, 5), "Imprenta Nacional"),
        },
        InstrumentType::OrganicLaw => Durations {
            initiative: ((1, 7), "Proponente"),
            discussions: ([(20, 45), (20, 60), (20, 60)], "Asamblea Nacional - Plenaria"),
            enactment: ((1, 5), "Presidente de la Asamblea Nacional"),
            promulgation: ((10, 30), "Sala Constitucional del TSJ y Presidente de la República"),
            publication: ((1, 5), "Imprenta Nacional"),
        },
        InstrumentType::DecreeLaw | InstrumentType::Regulation => Durations {
            initiative: ((1, 15), "Ministerio proponente"),
            discussions: ([(1, 15), (1, 15), (1, 15)], "Consejo de Ministros"),
            enactment: ((1, 5), "Presidente de la República"),
            promulgation: ((1, 5), "Presidente de la República"),
            publication: ((1, 5), "Imprenta Nacional"),
        },
        InstrumentType::Resolution => Durations {
            initiative: ((1, 7), "Dirección técnica del ministerio"),
            discussions: ([(1, 10), (1, 10), (1, 10)], "Despacho del Ministro"),
            enactment: ((1, 3), "Ministro"),
            promulgation: ((1, 3), "Ministro"),
            publication: ((1, 5), "Imprenta Nacional"),
        },
        InstrumentType::MunicipalOrdinance => Durations {
            initiative: ((1, 7), "Concejales o Alcalde"),
            discussions: ([(15, 30), (15, 30), (15, 30)], "Concejo Municipal"),
            enactment: ((1, 5), "Presidente del Concejo Municipal"),
            promulgation: ((1, 10), "Alcalde"),
            publication: ((1, 5), "Gaceta Municipal"),
        },
        InstrumentType::Amendment => Durations {
            initiative: ((30, 90), "Proponente según Art. 341 (15% electores, 30% AN o Presidente)"),
            discussions: ([(15, 30), (15, 30), (15, 30)], "Asamblea Nacional"),
            enactment: ((1, 5), "Presidente de la Asamblea Nacional"),
            promulgation: ((1, 10), "Presidente de la República"),
            publication: ((1, 5), "Imprenta Nacional"),
        },
        InstrumentType::Reform => Durations {
            initiative: ((30, 90), "Proponente según Art. 342 (15% electores, mayoría AN o Presidente)"),
            discussions: ([(30, 60), (30, 60), (30, 60)], "Asamblea Nacional"),
            enactment: ((1, 5), "Presidente de la Asamblea Nacional"),
            promulgation: ((1, 10), "Presidente de la República"),
            publication: ((1, 5), "Imprenta Nacional"),
        },
    }
}

/// Ordered stages for an instrument under its majority rule.
pub(crate) fn plan(instrument: InstrumentType, rule: &MajorityRule) -> Vec<StagePlan> {
    let d = durations(instrument);
    let mut stages = vec![StagePlan {
        stage: Stage::Initiative,
        min_days: d.initiative.0 .0,
        max_days: d.initiative.0 .1,
        responsible: d.initiative.1,
        description: "Submission of the draft",
    }];

    let discussions = [
        (Stage::FirstDiscussion, "First discussion"),
        (Stage::SecondDiscussion, "Second discussion, article by article"),
        (Stage::ThirdDiscussion, "Third discussion and approval"),
    ];
    let count = (rule.discussions as usize).clamp(1, discussions.len());
    for (i, (stage, description)) in discussions.iter().take(count).enumerate() {
        let (min_days, max_days) = d.discussions.0[i];
        stages.push(StagePlan {
            stage: *stage,
            min_days,
            max_days,
            responsible: d.discussions.1,
            description: *description,
        });
    }

    stages.push(StagePlan {
        stage: Stage::Enactment,
        min_days: d.enactment.0 .0,
        max_days: d.enactment.0 .1,
        responsible: d.enactment.1,
        description: "Enactment of the approved text",
    });

    if rule.requires_referendum {
        stages.push(StagePlan {
            stage: Stage::Referendum,
            min_days: REFERENDUM.0 .0,
            max_days: REFERENDUM.0 .1,
            responsible: REFERENDUM.1,
            description: "Approving referendum",
        });
    }

    stages.push(StagePlan {
        stage: Stage::Promulgation,
        min_days: d.promulgation.0 .0,
        max_days: d.promulgation.0 .1,
        responsible: d.promulgation.1,
        description: "Promulgation",
    });
    stages.push(StagePlan {
        stage: Stage::Publication,
        min_days: d.publication.0 .0,
        max_days: d.publication.0 .1,
        responsible: d.publication.1,
        description: "Publication in the official gazette",
    });
    stages
}

#[cfg(test)]
mod tests {
    use super::*;
    use constitution::KnowledgeBase;

    fn stages(instrument: InstrumentType) -> Vec<Stage> {
        let kb = KnowledgeBase::bundled().unwrap();
        let rule = kb.majority_rule(instrument).unwrap();
        plan(instrument, rule).into_iter().map(|p| p.stage).collect()
    }

    #[test]
    fn test_ordinary_law_plan() {
        assert_eq!(
            stages(InstrumentType::OrdinaryLaw),
            vec![
                Stage::Initiative,
                Stage::FirstDiscussion,
                Stage::SecondDiscussion,
                Stage::Enactment,
                Stage::Promulgation,
                Stage::Publication,
            ]
        );
    }

    #[test]
    fn test_reform_has_three_discussions_and_referendum() {
        let reform = stages(InstrumentType::Reform);
        assert!(reform.contains(&Stage::ThirdDiscussion));
        assert!(reform.contains(&Stage::Referendum));
        assert!(stages(InstrumentType::Amendment).contains(&Stage::Referendum));
        assert!(!stages(InstrumentType::OrganicLaw).contains(&Stage::Referendum));
    }

    #[test]
    fn test_single_discussion_for_decrees() {
        let decree = stages(InstrumentType::DecreeLaw);
        assert!(decree.contains(&Stage::FirstDiscussion));
        assert!(!decree.contains(&Stage::SecondDiscussion));
    }

    #[test]
    fn test_durations_are_ordered() {
        let kb = KnowledgeBase::bundled().unwrap();
        for instrument in InstrumentType::all() {
            let rule = kb.majority_rule(*instrument).unwrap();
            for stage in plan(*instrument, rule) {
                assert!(stage.min_days <= stage.max_days, "{:?}", stage);
            }
        }
    }
}
