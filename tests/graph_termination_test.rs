// ==========================================
// 方案图遍历终止性测试
// ==========================================
// 测试目标: 环与悬空引用在遍历与匹配中都能终止
// ==========================================


use taper_planner::config::{EquivalenceTable, MedicationCatalog};
use taper_planner::domain::patient::MedicationDoses;
use taper_planner::domain::types::{StepId, TimeOfDay};
use taper_planner::engine::{EngineError, ProtocolGraph, ScheduleWalker, StepMatcher};
use test_helpers::{date, night_step};

fn cyclic_graph() -> ProtocolGraph {
    ProtocolGraph::build_unchecked(
        vec![
            night_step("a", 1, 10.0, Some("b")),
            night_step("b", 1, 5.0, Some("c")),
            night_step("c", 1, 2.0, Some("a")),
        ],
        Some(vec![StepId::from("a")]),
    )
    .unwrap()
}

#[test]
fn test_cycle_is_rejected_by_checked_build() {
    let err = ProtocolGraph::build(
        vec![
            night_step("a", 1, 10.0, Some("b")),
            night_step("b", 1, 5.0, Some("a")),
        ],
        None,
    )
    .unwrap_err();
    assert!(matches!(err, EngineError::MalformedGraph(_)));
}

#[test]
fn test_walker_terminates_on_cycle_from_every_entry() {
    let graph = cyclic_graph();
    let walker = ScheduleWalker::new();
    for start in ["a", "b", "c"] {
        let err = walker
            .walk(&graph, &StepId::from(start), date(2026, 1, 1))
            .unwrap_err();
        assert!(matches!(err, EngineError::MalformedGraph(_)), "start {}", start);
    }
}

#[test]
fn test_matcher_terminates_on_cycle() {
    let graph = cyclic_graph();
    let mut equivalence = EquivalenceTable::new();
    equivalence.insert("diazepam", 1.0).unwrap();

    // 评估顺序只访问每个步骤一次
    assert_eq!(graph.evaluation_order().len(), 3);

    let doses = MedicationDoses::new("diazepam").with(TimeOfDay::Night, 5.0);
    let matched = StepMatcher::default()
        .find_match(&graph, &equivalence, &doses, None)
        .unwrap();
    assert_eq!(matched.matched.as_str(), "b");
    assert_eq!(matched.start.as_str(), "c");
}

#[test]
fn test_walker_reports_dangling_successor() {
    let graph =
        ProtocolGraph::build_unchecked(vec![night_step("a", 1, 2.0, Some("missing"))], None)
            .unwrap();
    let err = ScheduleWalker::new()
        .walk(&graph, &StepId::from("a"), date(2026, 1, 1))
        .unwrap_err();
    assert!(matches!(err, EngineError::MalformedGraph(ref m) if m.contains("missing")));
}

#[test]
fn test_catalog_rejects_empty_strengths() {
    let mut catalog = MedicationCatalog::new();
    assert!(catalog.insert("diazepam", &[]).is_err());
    assert!(catalog.is_empty());
}
