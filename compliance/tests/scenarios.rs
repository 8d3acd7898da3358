//! End-to-end analysis scenarios.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use compliance::feasibility::StageOutcome;
use compliance::{
    AmendmentRoute, AnalysisRequest, BodyComposition, ComplianceEngine, EngineConfig,
    EngineError, RecommendationSource, RiskLevel, Severity, SeverityRuleId, Stage, TestId,
};
use constitution::{InstrumentType, KnowledgeBase, YamlFileCatalog, BUNDLED_CRBV};

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "compliance=warn".into()))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

fn engine() -> ComplianceEngine {
    init_tracing();
    ComplianceEngine::with_defaults().unwrap()
}

const HYDROCARBONS: &str = "LEY ORGÁNICA DE HIDROCARBUROS. Artículo 1. Se autoriza la \
    constitución de una empresa mixta en la que la participación estatal será del 49% \
    del capital social.";

#[test]
fn test_minority_state_participation_is_critical() {
    let report = engine().analyze(&AnalysisRequest::new(HYDROCARBONS)).unwrap();

    assert_eq!(report.instrument.instrument, InstrumentType::OrganicLaw);
    assert!(!report.instrument.declared);

    let finding = report
        .findings
        .iter()
        .find(|f| f.article.get() == 303)
        .unwrap();
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!(finding.rule, SeverityRuleId::StateReservationTransfer);
    assert!(finding.rationale.contains("49"));
    assert!(finding.span.text.starts_with("empresa mixta"));

    let supremacy = report.verdict(TestId::Supremacy).unwrap();
    assert!(!supremacy.passed);
    assert_eq!(report.risk_level, RiskLevel::Critical);
    assert!(report.nullity_probability >= 85);
    assert_eq!(report.amendment_route, Some(AmendmentRoute::Reform));
    assert_eq!(report.recommendations[0].priority, Severity::Critical);
}

#[test]
fn test_majority_state_participation_is_not_critical() {
    let text = HYDROCARBONS.replace("49%", "60%");
    let report = engine().analyze(&AnalysisRequest::new(text)).unwrap();
    let finding = report
        .findings
        .iter()
        .find(|f| f.article.get() == 303)
        .unwrap();
    assert_ne!(finding.severity, Severity::Critical);
}

#[test]
fn test_sanction_without_safeguards() {
    let report = engine()
        .analyze(
            &AnalysisRequest::new(
                "Artículo 5. El Ministerio impondrá multas y ordenará la clausura inmediata \
                 del establecimiento infractor.",
            )
            .with_instrument(InstrumentType::Resolution),
        )
        .unwrap();

    let due_process = report.verdict(TestId::DueProcess).unwrap();
    assert!(!due_process.passed);
    assert_eq!(report.failed_tests(), vec![TestId::DueProcess]);
    assert_eq!(report.risk_level, RiskLevel::Medium);

    let recommendation = report
        .recommendations
        .iter()
        .find(|r| r.source == RecommendationSource::Test(TestId::DueProcess))
        .unwrap();
    assert_eq!(recommendation.priority, Severity::High);
    assert!(recommendation.text.contains("procedural safeguards"));
}

#[test]
fn test_organic_law_shortfall_lists_ordinary_fallback() {
    let report = engine()
        .analyze(
            &AnalysisRequest::new("Ley Orgánica de Cultura. Artículo 1. Objeto de la ley.")
                .with_instrument(InstrumentType::OrganicLaw)
                .with_composition(BodyComposition::full(277))
                .with_projected_votes(150),
        )
        .unwrap();

    let card = report.feasibility.unwrap();
    assert_eq!(card.votes_required, 185);
    assert_eq!(card.quorum_required, 139);
    assert_eq!(card.terminal_stage, Stage::Rejected);
    assert_eq!(card.timeline.last().unwrap().outcome, StageOutcome::Blocked);

    let fallback = &card.fallbacks[0];
    assert_eq!(fallback.instrument, InstrumentType::OrdinaryLaw);
    assert_eq!(fallback.votes_required, Some(139));
    assert!(fallback.reachable);
}

#[test]
fn test_organic_matter_rules_out_ordinary_fallback() {
    let report = engine()
        .analyze(
            &AnalysisRequest::new(
                "Ley Orgánica del Trabajo. Se regulan las relaciones laborales y las \
                 prestaciones sociales de los trabajadores.",
            )
            .with_instrument(InstrumentType::OrganicLaw)
            .with_composition(BodyComposition::full(277))
            .with_projected_votes(150),
        )
        .unwrap();

    assert!(report
        .findings
        .iter()
        .any(|f| f.article.get() == 89 && f.flags.requires_organic_law));

    let card = report.feasibility.unwrap();
    assert_eq!(card.terminal_stage, Stage::Rejected);
    let ordinary = card
        .fallbacks
        .iter()
        .find(|f| f.instrument == InstrumentType::OrdinaryLaw)
        .unwrap();
    assert!(!ordinary.reachable);
    assert!(ordinary.rationale.contains("not available"));
}

#[test]
fn test_sale_of_state_oil_company_is_critical() {
    let report = engine()
        .analyze(&AnalysisRequest::new(
            "Se autoriza la venta de la totalidad de las acciones de PDVSA a inversionistas privados.",
        ))
        .unwrap();

    let finding = report
        .findings
        .iter()
        .find(|f| f.article.get() == 303)
        .unwrap();
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!(finding.rule, SeverityRuleId::StateReservationTransfer);
    assert!(!report.verdict(TestId::Supremacy).unwrap().passed);
    assert_eq!(report.risk_level, RiskLevel::Critical);
    assert_eq!(report.amendment_route, Some(AmendmentRoute::Reform));
}

#[test]
fn test_regulation_does_not_need_assembly_quorum() {
    let report = engine()
        .analyze(
            &AnalysisRequest::new("Reglamento de la Ley de Aguas. Artículo 1. Objeto.")
                .with_instrument(InstrumentType::Regulation)
                .with_composition(BodyComposition::with_present(277, 100)),
        )
        .unwrap();
    let card = report.feasibility.unwrap();
    assert!(card.quorum_met);
    assert_eq!(card.terminal_stage, Stage::Publication);
}

#[test]
fn test_eternity_clause_requires_constituent_assembly() {
    let report = engine()
        .analyze(&AnalysisRequest::new(
            "Se permite la reelección indefinida del Presidente de la República.",
        ))
        .unwrap();
    let finding = report.findings.iter().find(|f| f.article.get() == 6).unwrap();
    assert_eq!(finding.severity, Severity::Critical);
    assert_eq!(finding.rule, SeverityRuleId::EternityClause);
    assert_eq!(
        report.amendment_route,
        Some(AmendmentRoute::ConstituentAssembly)
    );
    assert!(report.requires_constitutional_change());
}

#[test]
fn test_rights_restriction_and_due_process_qualifier() {
    let engine = engine();
    let restricted = engine
        .analyze(
            &AnalysisRequest::new("Se prohíben las reuniones públicas en el centro de la ciudad.")
                .with_instrument(InstrumentType::OrdinaryLaw),
        )
        .unwrap();
    let finding = restricted
        .findings
        .iter()
        .find(|f| f.article.get() == 53)
        .unwrap();
    assert_eq!(finding.severity, Severity::High);
    assert!(!restricted.verdict(TestId::RightsImpact).unwrap().passed);
    assert_eq!(restricted.risk_level, RiskLevel::High);

    let qualified = engine
        .analyze(
            &AnalysisRequest::new(
                "Se prohíben las reuniones públicas en el centro de la ciudad, previa orden judicial.",
            )
            .with_instrument(InstrumentType::OrdinaryLaw),
        )
        .unwrap();
    let finding = qualified
        .findings
        .iter()
        .find(|f| f.article.get() == 53)
        .unwrap();
    assert_eq!(finding.severity, Severity::Low);
}

#[test]
fn test_progressivity_citation_is_protective() {
    let engine = engine();
    let protective = engine
        .analyze(&AnalysisRequest::new(
            "Se mantienen los derechos adquiridos conforme al principio de progresividad.",
        ))
        .unwrap();
    assert!(!protective.findings.iter().any(|f| f.article.get() == 19));
    assert!(protective.verdict(TestId::RightsImpact).unwrap().passed);
    assert_ne!(protective.risk_level, RiskLevel::Critical);

    let regressive = engine
        .analyze(&AnalysisRequest::new(
            "Se adoptan medidas regresivas en materia de seguridad social.",
        ))
        .unwrap();
    let finding = regressive
        .findings
        .iter()
        .find(|f| f.article.get() == 19)
        .unwrap();
    assert_eq!(finding.severity, Severity::Critical);
}

#[test]
fn test_exception_clause_suppresses_single_keyword() {
    let engine = engine();
    let plain = engine
        .analyze(&AnalysisRequest::new("Se ordena la expropiación de los terrenos."))
        .unwrap();
    assert!(plain.findings.iter().any(|f| f.article.get() == 115));

    let excepted = engine
        .analyze(&AnalysisRequest::new(
            "Se ordena el registro de los terrenos, salvo la expropiación de los mismos.",
        ))
        .unwrap();
    assert!(!excepted.findings.iter().any(|f| f.article.get() == 115));
}

#[test]
fn test_reports_are_identical_for_identical_input() {
    let engine = engine();
    let request = AnalysisRequest::new(HYDROCARBONS).with_composition(BodyComposition::full(277));
    let first = engine.analyze(&request).unwrap();
    let second = engine.analyze(&request).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn test_sequential_battery_gives_same_report() {
    init_tracing();
    let kb = Arc::new(KnowledgeBase::bundled().unwrap());
    let mut config = EngineConfig::default();
    config.battery.parallel = false;
    let sequential = ComplianceEngine::new(kb.clone(), config).unwrap();
    let parallel = ComplianceEngine::new(kb, EngineConfig::default()).unwrap();

    let request = AnalysisRequest::new(HYDROCARBONS);
    assert_eq!(
        sequential.analyze(&request).unwrap(),
        parallel.analyze(&request).unwrap()
    );
}

#[test]
fn test_input_errors() {
    let engine = engine();
    assert!(matches!(
        engine.analyze(&AnalysisRequest::new("")),
        Err(EngineError::InputError(_))
    ));
    assert!(matches!(
        engine.analyze(
            &AnalysisRequest::new("Ley de Aguas").with_composition(BodyComposition::full(0))
        ),
        Err(EngineError::InputError(_))
    ));
}

#[test]
fn test_unknown_article_is_not_found() {
    let engine = engine();
    let err = engine.knowledge_base().get_article(9999u16).unwrap_err();
    let err: EngineError = err.into();
    assert!(matches!(err, EngineError::NotFound { .. }));
}

#[tokio::test]
async fn test_engine_from_yaml_file() {
    init_tracing();
    let path = std::env::temp_dir().join(format!("crbv-scenario-{}.yaml", std::process::id()));
    tokio::fs::write(&path, BUNDLED_CRBV).await.unwrap();

    let engine = ComplianceEngine::from_source(&YamlFileCatalog::new(&path), EngineConfig::default())
        .await
        .unwrap();
    let bundled = KnowledgeBase::bundled().unwrap();
    assert_eq!(engine.knowledge_base().fingerprint(), bundled.fingerprint());

    let report = engine.analyze(&AnalysisRequest::new(HYDROCARBONS)).unwrap();
    assert_eq!(report.knowledge_base_hash, bundled.fingerprint());

    tokio::fs::remove_file(&path).await.unwrap();
}
