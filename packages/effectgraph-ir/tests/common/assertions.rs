//! Custom assertions for effect results

use effectgraph_ir::pipeline::UnitResult;
use effectgraph_ir::shared::models::{Category, RoutineId};
use pretty_assertions::assert_eq;

/// Assert the resolved set of a routine, in display form (`{IOError}`, `{*}`)
pub fn assert_resolved(result: &UnitResult, routine: &str, category: Category, expected: &str) {
    let set = result.table.resolved(&RoutineId::from(routine), category);
    assert_eq!(
        set.to_string(),
        expected,
        "resolved {} of '{}'",
        category,
        routine
    );
}

pub fn assert_raises(result: &UnitResult, routine: &str, expected: &str) {
    assert_resolved(result, routine, Category::Raises, expected);
}

pub fn assert_tags(result: &UnitResult, routine: &str, expected: &str) {
    assert_resolved(result, routine, Category::Tags, expected);
}

/// Assert what the body produces, which differs from the resolved set when
/// the routine declares its effects
pub fn assert_inferred(result: &UnitResult, routine: &str, category: Category, expected: &str) {
    let effects = result
        .table
        .get(&RoutineId::from(routine))
        .unwrap_or_else(|| panic!("no effects recorded for '{}'", routine));
    assert_eq!(
        effects.inferred(category).to_string(),
        expected,
        "inferred {} of '{}'",
        category,
        routine
    );
}

pub fn assert_inferred_raises(result: &UnitResult, routine: &str, expected: &str) {
    assert_inferred(result, routine, Category::Raises, expected);
}

pub fn assert_inferred_tags(result: &UnitResult, routine: &str, expected: &str) {
    assert_inferred(result, routine, Category::Tags, expected);
}

pub fn assert_no_violations(result: &UnitResult) {
    assert!(
        result.violations.is_empty(),
        "Expected no violations, got: {:?}",
        result
            .violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
    );
}

/// Assert violation codes, in report order
pub fn assert_violation_codes(result: &UnitResult, expected: &[&str]) {
    let codes: Vec<&str> = result.violations.iter().map(|v| v.code()).collect();
    assert_eq!(codes, expected.to_vec());
}
