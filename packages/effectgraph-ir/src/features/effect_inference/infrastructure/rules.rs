//! Propagation rules
//!
//! Contribution of every call-graph site to a routine's set, dispatched on
//! the edge kind fixed at graph construction:
//!
//! | edge             | contribution                                        |
//! |------------------|-----------------------------------------------------|
//! | `indirect_param` | nothing                                             |
//! | `mention`        | the mentioned value's set                           |
//! | `direct`         | the callee's resolved set (`Unknown` if no body and |
//! |                  | no declaration, seeded that way in the table)       |
//! | `method`         | the declared set, else `Unknown`                    |
//! | `indirect_local` | the binding's declared bound, else the aliased      |
//! |                  | routine's set, else `Unknown`                       |
//!
//! Any reference to a method, whether called, mentioned or aliased, sees only
//! its declared set (`EffectTable::reference_set`).
//! | raise            | the kind minus enclosing handler coverage           |
//!
//! The same accumulation serves the whole-routine fixpoint (`SiteFilter::All`)
//! and the position-scoped marker report (`SiteFilter::UpTo`).

use crate::features::call_graph::domain::{
    CallSite, ConstructId, EdgeKind, EdgeTarget, MarkerSite, RaiseSite, Raised, RoutineSites,
    SiteContext,
};
use crate::features::effect_inference::domain::EffectTable;
use crate::features::effect_lattice::{EffectSet, Hierarchies, KindHierarchy};
use crate::shared::models::{Category, ProcType, RoutineId};

/// Which sites of a routine take part
#[derive(Debug, Clone, Copy)]
pub enum SiteFilter<'m> {
    All,
    /// Sites textually before the marker, outside its sibling arms
    UpTo(&'m MarkerSite),
}

impl<'m> SiteFilter<'m> {
    fn admits(&self, ordinal: usize, context: &SiteContext) -> bool {
        match self {
            SiteFilter::All => true,
            SiteFilter::UpTo(marker) => {
                ordinal < marker.ordinal && !context.is_exclusive_with(&marker.context)
            }
        }
    }

    /// Handlers of a `try` whose body still encloses the marker have not caught anything yet
    fn guard_applies(&self, construct: ConstructId) -> bool {
        match self {
            SiteFilter::All => true,
            SiteFilter::UpTo(marker) => !marker.context.in_try_body_of(construct),
        }
    }
}

/// Rule evaluation against the current table state
pub struct EffectRules<'a> {
    hierarchies: &'a Hierarchies,
    table: &'a EffectTable,
}

impl<'a> EffectRules<'a> {
    pub fn new(hierarchies: &'a Hierarchies, table: &'a EffectTable) -> Self {
        Self { hierarchies, table }
    }

    fn hierarchy(&self, category: Category) -> &'a KindHierarchy {
        self.hierarchies.get(category)
    }

    /// Union of the admitted sites' contributions
    pub fn accumulate(
        &self,
        sites: &RoutineSites,
        category: Category,
        filter: SiteFilter<'_>,
    ) -> EffectSet {
        let mut acc = EffectSet::empty();

        for site in &sites.edges {
            if !filter.admits(site.ordinal, &site.context) {
                continue;
            }
            let contribution = self.edge_contribution(site, category);
            acc.union_with(&self.escaping(contribution, &site.context, category, &filter));
            if acc.is_unknown() {
                return acc;
            }
        }

        if category == Category::Raises {
            for site in &sites.raises {
                if !filter.admits(site.ordinal, &site.context) {
                    continue;
                }
                let contribution = self.raise_contribution(site);
                acc.union_with(&self.escaping(contribution, &site.context, category, &filter));
                if acc.is_unknown() {
                    return acc;
                }
            }
        }

        acc
    }

    /// Set contributed by one call or mention, before handler subtraction
    pub fn edge_contribution(&self, site: &CallSite, category: Category) -> EffectSet {
        match (site.kind, &site.target) {
            (EdgeKind::IndirectParam, _) => EffectSet::empty(),
            (_, EdgeTarget::Param(_)) => EffectSet::empty(),
            (_, EdgeTarget::Routine(id)) => self.table.reference_set(id, category),
            (_, EdgeTarget::Binding { bound, alias, .. }) => {
                self.binding_set(bound, alias.as_ref(), category)
            }
            (_, EdgeTarget::Computed) => EffectSet::Unknown,
        }
    }

    /// Set contributed by one raise statement, before handler subtraction
    pub fn raise_contribution(&self, site: &RaiseSite) -> EffectSet {
        let hierarchy = self.hierarchy(Category::Raises);
        match &site.raised {
            Raised::Kind(kind) => EffectSet::singleton(kind.clone(), hierarchy),
            Raised::Reraise(coverage) => coverage.as_effect_set(hierarchy),
        }
    }

    fn binding_set(
        &self,
        bound: &ProcType,
        alias: Option<&RoutineId>,
        category: Category,
    ) -> EffectSet {
        if let Some(kinds) = bound.effects.declared(category) {
            return EffectSet::from_kinds(kinds.iter().cloned(), self.hierarchy(category));
        }
        match alias {
            Some(id) => self.table.reference_set(id, category),
            None => EffectSet::Unknown,
        }
    }

    /// Drop what enclosing handlers catch (exceptions only)
    fn escaping(
        &self,
        contribution: EffectSet,
        context: &SiteContext,
        category: Category,
        filter: &SiteFilter<'_>,
    ) -> EffectSet {
        if category == Category::Tags || context.guards.is_empty() {
            return contribution;
        }
        let hierarchy = self.hierarchy(Category::Raises);
        context
            .guards
            .iter()
            .filter(|guard| filter.guard_applies(guard.construct))
            .fold(contribution, |set, guard| {
                set.without_covered(&guard.coverage, hierarchy)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::call_graph::domain::{Arm, ArmRef, HandlerGuard};
    use crate::features::effect_lattice::Coverage;
    use crate::shared::models::{EffectAnnotation, Kind, Span};

    fn raise(ordinal: usize, kind: &str, context: SiteContext) -> RaiseSite {
        RaiseSite {
            ordinal,
            raised: Raised::Kind(Kind::from(kind)),
            context,
            span: Span::zero(),
        }
    }

    fn guarded(kinds: &[&str], hierarchies: &Hierarchies) -> SiteContext {
        let kinds: Vec<Kind> = kinds.iter().map(|k| Kind::from(*k)).collect();
        SiteContext {
            arms: vec![ArmRef {
                construct: ConstructId(0),
                arm: Arm::TryBody,
            }],
            guards: vec![HandlerGuard {
                construct: ConstructId(0),
                coverage: Coverage::of_handler(&kinds, hierarchies.get(Category::Raises)),
            }],
        }
    }

    #[test]
    fn test_handler_removes_descendants() {
        let hierarchies = Hierarchies::builtin();
        let table = EffectTable::new();
        let rules = EffectRules::new(&hierarchies, &table);
        let mut sites = RoutineSites::new("r".into());
        sites.raises.push(raise(0, "EOFError", guarded(&["IOError"], &hierarchies)));
        sites.raises.push(raise(1, "OSError", guarded(&["IOError"], &hierarchies)));

        let set = rules.accumulate(&sites, Category::Raises, SiteFilter::All);
        assert_eq!(
            set,
            EffectSet::singleton("OSError", hierarchies.get(Category::Raises))
        );
    }

    #[test]
    fn test_unknown_callee_survives_specific_handler() {
        let hierarchies = Hierarchies::builtin();
        let table = EffectTable::new();
        let rules = EffectRules::new(&hierarchies, &table);
        let mut sites = RoutineSites::new("r".into());
        sites.edges.push(CallSite {
            ordinal: 0,
            kind: EdgeKind::Direct,
            target: EdgeTarget::Routine("unknown".into()),
            context: guarded(&["IOError"], &hierarchies),
            span: Span::zero(),
        });
        assert!(rules
            .accumulate(&sites, Category::Raises, SiteFilter::All)
            .is_unknown());

        sites.edges[0].context = guarded(&[], &hierarchies);
        assert!(rules
            .accumulate(&sites, Category::Raises, SiteFilter::All)
            .is_empty());
    }

    #[test]
    fn test_param_call_and_param_mention_contribute_nothing() {
        let hierarchies = Hierarchies::builtin();
        let table = EffectTable::new();
        let rules = EffectRules::new(&hierarchies, &table);
        for kind in [EdgeKind::IndirectParam, EdgeKind::Mention] {
            let site = CallSite {
                ordinal: 0,
                kind,
                target: EdgeTarget::Param("x".to_string()),
                context: SiteContext::default(),
                span: Span::zero(),
            };
            assert!(rules.edge_contribution(&site, Category::Raises).is_empty());
        }
    }

    #[test]
    fn test_binding_bound_or_unknown() {
        let hierarchies = Hierarchies::builtin();
        let table = EffectTable::new();
        let rules = EffectRules::new(&hierarchies, &table);
        let bounded = CallSite {
            ordinal: 0,
            kind: EdgeKind::IndirectLocal,
            target: EdgeTarget::Binding {
                name: "cb".to_string(),
                bound: ProcType::new(EffectAnnotation::default().raises(&["ValueError"])),
                alias: None,
            },
            context: SiteContext::default(),
            span: Span::zero(),
        };
        assert_eq!(
            rules.edge_contribution(&bounded, Category::Raises),
            EffectSet::singleton("ValueError", hierarchies.get(Category::Raises))
        );
        assert!(rules.edge_contribution(&bounded, Category::Tags).is_unknown());
    }
}
