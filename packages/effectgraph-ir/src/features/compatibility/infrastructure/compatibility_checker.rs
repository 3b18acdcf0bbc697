//! Compatibility checker
//!
//! Subsumption queries between a proc value's effects and a proc type's
//! declared effects, plus the declaration and binding checks run after
//! inference. Categories are checked independently; an absent declared list
//! on the target constrains nothing.

use crate::features::call_graph::domain::{BindingSite, BoundValue};
use crate::features::call_graph::CallGraph;
use crate::features::compatibility::domain::EffectViolation;
use crate::features::effect_inference::domain::EffectTable;
use crate::features::effect_lattice::{EffectSet, Hierarchies, KindHierarchy};
use crate::shared::models::{Category, ProcType, Program, Routine, RoutineId};

/// What is being assigned
#[derive(Debug, Clone, Copy)]
pub enum AssignSource<'s> {
    /// Routine symbol; its resolved set applies (declared only, for methods)
    Routine(&'s RoutineId),
    /// Value of a proc type; its declared bound applies (`Unknown` if none)
    ProcValue(&'s ProcType),
}

impl<'s> From<&'s BoundValue> for AssignSource<'s> {
    fn from(value: &'s BoundValue) -> Self {
        match value {
            BoundValue::Routine(id) => AssignSource::Routine(id),
            BoundValue::Proc { ty, .. } => AssignSource::ProcValue(ty),
        }
    }
}

pub struct CompatibilityChecker<'a> {
    hierarchies: &'a Hierarchies,
    table: &'a EffectTable,
}

impl<'a> CompatibilityChecker<'a> {
    pub fn new(hierarchies: &'a Hierarchies, table: &'a EffectTable) -> Self {
        Self { hierarchies, table }
    }

    fn hierarchy(&self, category: Category) -> &'a KindHierarchy {
        self.hierarchies.get(category)
    }

    /// Effects the source may produce
    pub fn source_set(&self, source: AssignSource<'_>, category: Category) -> EffectSet {
        match source {
            AssignSource::Routine(id) => self.table.reference_set(id, category),
            AssignSource::ProcValue(ty) => self.declared_bound(ty, category),
        }
    }

    /// Effects the target allows (`Unknown` when it declares nothing)
    pub fn target_set(&self, target: &ProcType, category: Category) -> EffectSet {
        self.declared_bound(target, category)
    }

    fn declared_bound(&self, ty: &ProcType, category: Category) -> EffectSet {
        match ty.effects.declared(category) {
            Some(kinds) => EffectSet::from_kinds(kinds.iter().cloned(), self.hierarchy(category)),
            None => EffectSet::Unknown,
        }
    }

    /// Target subsumes source in both categories and nothing forbidden leaks
    pub fn is_assignable(&self, source: AssignSource<'_>, target: &ProcType) -> bool {
        Category::ALL
            .iter()
            .all(|&category| self.missing_kinds(source, target, category).is_empty())
            && self.forbidden_kinds(source, target).is_empty()
    }

    /// Elements of the source set the target does not cover
    pub fn missing_kinds(
        &self,
        source: AssignSource<'_>,
        target: &ProcType,
        category: Category,
    ) -> EffectSet {
        let hierarchy = self.hierarchy(category);
        self.source_set(source, category)
            .uncovered_by(&self.target_set(target, category), hierarchy)
    }

    /// Concrete source tags covered by the target's forbidden list
    pub fn forbidden_kinds(&self, source: AssignSource<'_>, target: &ProcType) -> EffectSet {
        if target.effects.forbids.is_empty() {
            return EffectSet::empty();
        }
        let tags = self.hierarchy(Category::Tags);
        self.source_set(source, Category::Tags)
            .covered_by_any(&target.effects.forbids, tags)
    }

    /// Declared lists against inferred sets, and forbidden tags
    pub fn check_declaration(&self, routine: &Routine) -> Vec<EffectViolation> {
        let mut violations = Vec::new();
        let Some(effects) = self.table.get(&routine.id) else {
            return violations;
        };
        if !effects.analyzed {
            return violations;
        }

        for category in Category::ALL {
            let Some(declared_kinds) = routine.declared(category) else {
                continue;
            };
            let hierarchy = self.hierarchy(category);
            let missing = effects
                .inferred(category)
                .uncovered_by(effects.resolved(category), hierarchy);
            if missing.is_empty() {
                continue;
            }
            let kinds = missing.to_kind_list(hierarchy);
            violations.push(if declared_kinds.is_empty() {
                EffectViolation::ExplicitEmpty {
                    routine: routine.id.clone(),
                    category,
                    kinds,
                    span: routine.span,
                }
            } else {
                EffectViolation::UndeclaredEffect {
                    routine: routine.id.clone(),
                    category,
                    kinds,
                    span: routine.span,
                }
            });
        }

        if !routine.effects.forbids.is_empty() {
            let tags = self.hierarchy(Category::Tags);
            let produced = effects.inferred(Category::Tags);
            let forbidden = produced.covered_by_any(&routine.effects.forbids, tags);
            if !forbidden.is_empty() {
                violations.push(EffectViolation::ForbiddenTag {
                    routine: routine.id.clone(),
                    kinds: forbidden.to_kind_list(tags),
                    span: routine.span,
                });
            }
        }

        violations
    }

    /// One binding of a proc value to a constrained proc type
    pub fn check_binding(&self, routine: &RoutineId, site: &BindingSite) -> Vec<EffectViolation> {
        let source = AssignSource::from(&site.value);
        let mut violations = Vec::new();

        for category in Category::ALL {
            let missing = self.missing_kinds(source, &site.expected, category);
            if !missing.is_empty() {
                violations.push(self.binding_violation(routine, site, category, &missing));
            }
        }

        let forbidden = self.forbidden_kinds(source, &site.expected);
        if !forbidden.is_empty() {
            violations.push(self.binding_violation(routine, site, Category::Tags, &forbidden));
        }

        violations
    }

    fn binding_violation(
        &self,
        routine: &RoutineId,
        site: &BindingSite,
        category: Category,
        kinds: &EffectSet,
    ) -> EffectViolation {
        EffectViolation::IncompatibleBinding {
            routine: routine.clone(),
            target: site.target.clone(),
            value: site.value.clone(),
            category,
            kinds: kinds.to_kind_list(self.hierarchy(category)),
            span: site.span,
        }
    }

    /// Every declaration and binding of the unit, in declaration order
    pub fn check_program(&self, program: &Program, graph: &CallGraph) -> Vec<EffectViolation> {
        let mut violations = Vec::new();
        for routine in &program.routines {
            violations.extend(self.check_declaration(routine));
            if let Some(sites) = graph.sites(&routine.id) {
                for site in &sites.bindings {
                    violations.extend(self.check_binding(&routine.id, site));
                }
            }
        }
        tracing::debug!(
            unit = %program.unit,
            violations = violations.len(),
            "compatibility check finished"
        );
        violations
    }
}
