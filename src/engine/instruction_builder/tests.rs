use super::*;
use crate::config::catalog::MedicationCatalog;
use crate::domain::schedule::ScheduleInterval;
use crate::domain::step::Step;
use crate::domain::types::{SlotDose, StepId, Successor, TimeOfDay};
use crate::engine::error::EngineError;
use crate::engine::protocol_graph::ProtocolGraph;
use chrono::NaiveDate;
use std::collections::BTreeMap;

// ==========================================
// 测试辅助函数
// ==========================================

fn catalog() -> MedicationCatalog {
    let mut catalog = MedicationCatalog::new();
    catalog.insert("alprazolam", &[0.25, 0.5, 1.0, 2.0]).unwrap();
    catalog.insert("diazepam", &[2.0, 5.0, 10.0]).unwrap();
    catalog
}

fn step_with(id: &str, weeks: u32, slots: Vec<(TimeOfDay, SlotDose)>) -> Step {
    Step::new(
        StepId::from(id),
        weeks,
        slots.into_iter().collect::<BTreeMap<_, _>>(),
        Successor::End,
    )
}

fn interval_for(step: &Step) -> ScheduleInterval {
    ScheduleInterval::starting(
        step.id.clone(),
        step.weeks,
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
    )
}

fn single(med: &str, mg: f64) -> SlotDose {
    SlotDose::Single(med.to_string(), mg)
}

// ==========================================
// 措辞
// ==========================================

#[test]
fn test_count_words() {
    assert_eq!(count_word(0), "zero");
    assert_eq!(count_word(3), "three");
    assert_eq!(count_word(10), "ten");
    assert_eq!(count_word(12), "12");
}

#[test]
fn test_strength_rendering() {
    assert_eq!(format_strength(0.5), "0.5mg");
    assert_eq!(format_strength(0.25), "0.25mg");
    assert_eq!(format_strength(2.0), "2mg");
}

#[test]
fn test_slot_phrase_grammar() {
    assert_eq!(
        slot_phrase(1.0, 1.0, "alprazolam", TimeOfDay::Morning),
        "one tablet of 1mg alprazolam in the Morning"
    );
    assert_eq!(
        slot_phrase(2.0, 1.0, "alprazolam", TimeOfDay::Midday),
        "two tablets of 1mg alprazolam at Midday"
    );
    assert_eq!(
        slot_phrase(0.5, 10.0, "diazepam", TimeOfDay::Night),
        "half a 10mg tablet of diazepam at Night"
    );
    assert_eq!(
        slot_phrase(1.5, 0.5, "alprazolam", TimeOfDay::Afternoon),
        "one and a half tablets of 0.5mg alprazolam in the Afternoon"
    );
    assert_eq!(
        slot_phrase(2.5, 2.0, "diazepam", TimeOfDay::Night),
        "two and a half tablets of 2mg diazepam at Night"
    );
}

#[test]
fn test_join_phrases() {
    let a = "a".to_string();
    let b = "b".to_string();
    let c = "c".to_string();
    assert_eq!(join_phrases(&[a.clone()]), "a");
    assert_eq!(join_phrases(&[a.clone(), b.clone()]), "a, and b");
    assert_eq!(join_phrases(&[a, b, c]), "a, b, and c");
}

// ==========================================
// 处方行
// ==========================================

#[test]
fn test_single_strength_two_slots() {
    let step = step_with(
        "t1",
        2,
        vec![
            (TimeOfDay::Morning, single("alprazolam", 1.0)),
            (TimeOfDay::Night, single("alprazolam", 1.0)),
        ],
    );
    let lines = InstructionBuilder::new()
        .build_step(&catalog(), &step, &interval_for(&step))
        .unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].medication, "alprazolam");
    assert_eq!(lines[0].strength_mg, 1.0);
    assert_eq!(
        lines[0].instructions,
        "Take one tablet of 1mg alprazolam in the Morning, and one tablet of 1mg alprazolam \
         at Night for 2 weeks (from 01/01/2026 to 01/14/2026)."
    );
    assert_eq!(lines[0].quantity, 28);
}

#[test]
fn test_half_tablet_quantity_rounds_up() {
    let step = step_with("t2", 1, vec![(TimeOfDay::Night, single("alprazolam", 0.75))]);
    let lines = InstructionBuilder::new()
        .build_step(&catalog(), &step, &interval_for(&step))
        .unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].strength_mg, 0.5);
    assert_eq!(
        lines[0].instructions,
        "Take one and a half tablets of 0.5mg alprazolam at Night for 1 week \
         (from 01/01/2026 to 01/07/2026)."
    );
    // 1.5 × 7 = 10.5 → 11
    assert_eq!(lines[0].quantity, 11);
}

#[test]
fn test_zero_count_slots_are_excluded() {
    // 5mg 与 10mg 各只在一个时段使用
    let step = step_with(
        "t3",
        1,
        vec![
            (TimeOfDay::Morning, single("diazepam", 10.0)),
            (TimeOfDay::Night, single("diazepam", 5.0)),
        ],
    );
    let lines = InstructionBuilder::new()
        .build_step(&catalog(), &step, &interval_for(&step))
        .unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].strength_mg, 5.0);
    assert!(lines[0].instructions.starts_with("Take one tablet of 5mg diazepam at Night for"));
    assert!(!lines[0].instructions.contains("Morning"));
    assert_eq!(lines[0].quantity, 7);

    assert_eq!(lines[1].strength_mg, 10.0);
    assert!(lines[1]
        .instructions
        .starts_with("Take one tablet of 10mg diazepam in the Morning for"));
    assert!(!lines[1].instructions.contains("Night"));
}

#[test]
fn test_medications_in_alphabetical_order() {
    let step = step_with(
        "t4",
        1,
        vec![
            (
                TimeOfDay::Morning,
                SlotDose::Combined("diazepam".into(), 5.0, "alprazolam".into(), 0.5),
            ),
            (TimeOfDay::Night, single("diazepam", 5.0)),
        ],
    );
    let lines = InstructionBuilder::new()
        .build_step(&catalog(), &step, &interval_for(&step))
        .unwrap();

    let meds: Vec<&str> = lines.iter().map(|l| l.medication.as_str()).collect();
    assert_eq!(meds, vec!["alprazolam", "diazepam"]);
    assert_eq!(
        lines[1].instructions,
        "Take one tablet of 5mg diazepam in the Morning, and one tablet of 5mg diazepam \
         at Night for 1 week (from 01/01/2026 to 01/07/2026)."
    );
    assert_eq!(lines[1].quantity, 14);
}

#[test]
fn test_mixed_strengths_for_one_dose() {
    // 18mg → 5mg × 3 + 2mg × 1.5
    let step = step_with("t5", 1, vec![(TimeOfDay::Morning, single("diazepam", 18.0))]);
    let lines = InstructionBuilder::new()
        .build_step(&catalog(), &step, &interval_for(&step))
        .unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].strength_mg, 2.0);
    assert!(lines[0]
        .instructions
        .starts_with("Take one and a half tablets of 2mg diazepam in the Morning"));
    assert_eq!(lines[0].quantity, 11);
    assert_eq!(lines[1].strength_mg, 5.0);
    assert!(lines[1]
        .instructions
        .starts_with("Take three tablets of 5mg diazepam in the Morning"));
    assert_eq!(lines[1].quantity, 21);
}

#[test]
fn test_uncatalogued_medication_is_invalid_input() {
    let step = step_with("t6", 1, vec![(TimeOfDay::Night, single("oxazepam", 15.0))]);
    let err = InstructionBuilder::new()
        .build_step(&catalog(), &step, &interval_for(&step))
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[test]
fn test_unrepresentable_dose_propagates() {
    let step = step_with("t7", 1, vec![(TimeOfDay::Night, single("diazepam", 0.3))]);
    let err = InstructionBuilder::new()
        .build_step(&catalog(), &step, &interval_for(&step))
        .unwrap_err();
    assert!(matches!(err, EngineError::Unrepresentable { .. }));
}

#[test]
fn test_build_all_follows_interval_order() {
    let first = Step::new(
        StepId::from("a"),
        1,
        [(TimeOfDay::Night, single("diazepam", 10.0))].into_iter().collect(),
        Successor::Next(StepId::from("b")),
    );
    let second = step_with("b", 2, vec![(TimeOfDay::Night, single("diazepam", 5.0))]);
    let graph = ProtocolGraph::build(vec![first, second], None).unwrap();

    let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let a = ScheduleInterval::starting(StepId::from("a"), 1, start);
    let b = ScheduleInterval::starting(StepId::from("b"), 2, a.next_start());

    let lines = InstructionBuilder::new()
        .build_all(&catalog(), &graph, &[a, b])
        .unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].step.as_str(), "a");
    assert_eq!(lines[1].step.as_str(), "b");
    assert!(lines[1].instructions.ends_with("(from 01/08/2026 to 01/21/2026)."));
}
