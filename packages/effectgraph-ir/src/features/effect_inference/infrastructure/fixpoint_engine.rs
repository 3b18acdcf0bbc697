/// Fixpoint inference engine
///
/// Algorithm:
/// 1. Seed: declared sets are final, bodiless undeclared routines are
///    `Unknown` (or their published set), everything else is `Empty`
/// 2. Visit routines with bodies in the configured order, re-evaluating the
///    propagation rules against the current table (Gauss-Seidel)
/// 3. Stop after a pass with no change
///
/// Sets only grow, and each can grow at most lattice-height times, so the
/// pass bound `routines x height + 1` is never reached for well-formed input.
/// If it is, routines still growing are widened to `Unknown`.
use super::rules::{EffectRules, SiteFilter};
use crate::config::{EffectConfig, VisitOrder};
use crate::features::call_graph::CallGraph;
use crate::features::effect_inference::domain::{
    CategoryEffects, EffectTable, InferenceMetrics, NoopObserver, PassObserver,
    PublishedEffectsSource, PublishedRegistry, RoutineEffects,
};
use crate::features::effect_lattice::{EffectSet, Hierarchies};
use crate::shared::models::{Category, Program, Routine, RoutineOrigin};
use once_cell::sync::Lazy;
use std::time::Instant;

static NO_PUBLISHED: Lazy<PublishedRegistry> = Lazy::new(PublishedRegistry::new);

/// Result of one inference run
#[derive(Debug, Clone)]
pub struct InferenceOutcome {
    pub table: EffectTable,
    pub metrics: InferenceMetrics,
}

pub struct FixpointEngine<'a> {
    program: &'a Program,
    graph: &'a CallGraph,
    hierarchies: &'a Hierarchies,
    config: &'a EffectConfig,
    published: &'a dyn PublishedEffectsSource,
}

impl<'a> FixpointEngine<'a> {
    pub fn new(
        program: &'a Program,
        graph: &'a CallGraph,
        hierarchies: &'a Hierarchies,
        config: &'a EffectConfig,
    ) -> Self {
        Self {
            program,
            graph,
            hierarchies,
            config,
            published: &*NO_PUBLISHED,
        }
    }

    pub fn with_published(mut self, published: &'a dyn PublishedEffectsSource) -> Self {
        self.published = published;
        self
    }

    pub fn run(&self) -> InferenceOutcome {
        self.run_observed(&mut NoopObserver)
    }

    pub fn run_observed(&self, observer: &mut dyn PassObserver) -> InferenceOutcome {
        let start = Instant::now();
        let mut metrics = InferenceMetrics::new();
        let mut table = self.seed(&mut metrics);

        let order: Vec<_> = match self.config.visit_order {
            VisitOrder::Declaration => self.graph.declaration_order(),
            VisitOrder::CalleesFirst => self.graph.callees_first_order(),
        }
        .into_iter()
        .filter(|id| table.get(id).map_or(false, |e| e.analyzed))
        .collect();

        let bound = self
            .config
            .pass_bound(order.len(), self.hierarchies.lattice_height());
        metrics.routines_analyzed = order.len();
        metrics.pass_bound = bound;

        loop {
            let mut grown = Vec::new();
            for id in &order {
                let Some(sites) = self.graph.sites(id) else {
                    continue;
                };
                let computed: Vec<(Category, EffectSet)> = {
                    let rules = EffectRules::new(self.hierarchies, &table);
                    Category::ALL
                        .iter()
                        .map(|&category| {
                            (category, rules.accumulate(sites, category, SiteFilter::All))
                        })
                        .collect()
                };
                if let Some(effects) = table.get_mut(id) {
                    let mut grew = false;
                    for (category, set) in &computed {
                        grew |= effects.get_mut(*category).absorb(set);
                    }
                    if grew {
                        grown.push(id.clone());
                    }
                }
            }

            metrics.passes += 1;
            observer.on_pass(metrics.passes, &table);
            tracing::debug!(
                unit = %self.program.unit,
                pass = metrics.passes,
                changed = grown.len(),
                "effect inference pass"
            );

            if grown.is_empty() {
                metrics.converged = metrics.widened == 0;
                break;
            }

            if metrics.passes >= bound {
                tracing::warn!(
                    unit = %self.program.unit,
                    bound,
                    routines = grown.len(),
                    "pass bound reached, widening to Unknown"
                );
                for id in &grown {
                    if let Some(effects) = table.get_mut(id) {
                        if !effects.raises.inferred.is_unknown()
                            || !effects.tags.inferred.is_unknown()
                        {
                            metrics.widened += 1;
                        }
                        effects.raises.widen();
                        effects.tags.widen();
                    }
                }
            }
        }

        metrics.total_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        tracing::info!(
            unit = %self.program.unit,
            summary = %metrics.summary(),
            "effect inference finished"
        );

        InferenceOutcome { table, metrics }
    }

    fn seed(&self, metrics: &mut InferenceMetrics) -> EffectTable {
        let mut table = EffectTable::new();
        for routine in &self.program.routines {
            let analyzed = routine.has_body();
            let raises = self.seed_category(routine, Category::Raises, metrics);
            let tags = self.seed_category(routine, Category::Tags, metrics);
            table.insert(RoutineEffects {
                routine: routine.id.clone(),
                raises,
                tags,
                analyzed,
                dispatched: routine.kind.is_dynamically_dispatched(),
            });
        }
        table
    }

    fn seed_category(
        &self,
        routine: &Routine,
        category: Category,
        metrics: &mut InferenceMetrics,
    ) -> CategoryEffects {
        let hierarchy = self.hierarchies.get(category);
        if let Some(kinds) = routine.declared(category) {
            let declared = EffectSet::from_kinds(kinds.iter().cloned(), hierarchy);
            let mut effects = CategoryEffects::declared(declared.clone());
            if !routine.has_body() {
                effects.inferred = declared;
            }
            return effects;
        }

        if routine.has_body() {
            return CategoryEffects::inferred(EffectSet::empty());
        }

        if routine.origin == RoutineOrigin::Imported {
            if let Some(set) = self.published.lookup(&routine.id, category) {
                metrics.published_hits += 1;
                tracing::debug!(
                    routine = %routine.id,
                    source = self.published.source_name(),
                    category = %category,
                    "resolved from published effects"
                );
                return CategoryEffects::inferred(set.normalized(hierarchy));
            }
        }

        CategoryEffects::inferred(EffectSet::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::call_graph::CallGraphBuilder;
    use crate::features::effect_inference::domain::PublishedEffects;
    use crate::features::effect_lattice::HierarchyOptions;
    use crate::shared::models::{EffectAnnotation, Expr, Kind, Routine, RoutineKind, Stmt};

    fn infer(program: &Program, config: &EffectConfig) -> InferenceOutcome {
        let hierarchies = Hierarchies::from_program(program, HierarchyOptions::default()).unwrap();
        let graph = CallGraphBuilder::new(program, &hierarchies).build().unwrap();
        FixpointEngine::new(program, &graph, &hierarchies, config).run()
    }

    fn raising(id: &str, kind: &str) -> Routine {
        let mut r = Routine::new(id);
        r.body = Some(vec![Stmt::raise(kind)]);
        r
    }

    fn calling(id: &str, callees: &[&str]) -> Routine {
        let mut r = Routine::new(id);
        r.body = Some(callees.iter().map(|c| Stmt::call(c)).collect());
        r
    }

    #[test]
    fn test_transitive_propagation() {
        let program = Program::new("unit")
            .with_routine(calling("main", &["mid"]))
            .with_routine(calling("mid", &["leaf"]))
            .with_routine(raising("leaf", "IOError"));
        let outcome = infer(&program, &EffectConfig::default());
        let raises = outcome.table.resolved(&"main".into(), Category::Raises);
        assert_eq!(raises.to_string(), "{IOError}");
        assert!(outcome.metrics.converged);
    }

    #[test]
    fn test_mutual_recursion_converges() {
        let mut even = calling("even", &["odd"]);
        even.body
            .as_mut()
            .unwrap()
            .push(Stmt::raise("ValueError"));
        let program = Program::new("unit")
            .with_routine(even)
            .with_routine(calling("odd", &["even"]));
        let outcome = infer(&program, &EffectConfig::default());
        for id in ["even", "odd"] {
            assert_eq!(
                outcome.table.resolved(&id.into(), Category::Raises).to_string(),
                "{ValueError}"
            );
        }
    }

    #[test]
    fn test_forward_declared_callee_is_unknown() {
        let mut fwd = Routine::new("fwd");
        fwd.body = None;
        let program = Program::new("unit")
            .with_routine(calling("p", &["fwd"]))
            .with_routine(fwd);
        let outcome = infer(&program, &EffectConfig::default());
        assert!(outcome
            .table
            .resolved(&"p".into(), Category::Raises)
            .is_unknown());
        assert!(outcome.table.resolved(&"p".into(), Category::Tags).is_unknown());
    }

    #[test]
    fn test_declared_set_is_authoritative() {
        let mut r = raising("r", "IOError");
        r.effects = EffectAnnotation::default().raises(&["OSError"]);
        let program = Program::new("unit")
            .with_routine(r)
            .with_routine(calling("caller", &["r"]));
        let outcome = infer(&program, &EffectConfig::default());
        let r = outcome.table.get(&"r".into()).unwrap();
        assert_eq!(r.resolved(Category::Raises).to_string(), "{OSError}");
        assert_eq!(r.inferred(Category::Raises).to_string(), "{IOError}");
        assert_eq!(
            outcome
                .table
                .resolved(&"caller".into(), Category::Raises)
                .to_string(),
            "{OSError}"
        );
    }

    #[test]
    fn test_imported_routine_uses_published_set() {
        let mut imported = Routine::new("readLine");
        imported.body = None;
        imported.origin = RoutineOrigin::Imported;
        let program = Program::new("unit")
            .with_routine(imported)
            .with_routine(calling("main", &["readLine"]));
        let hierarchies = Hierarchies::builtin();
        let published = PublishedEffects::new("streams").with_entry(
            "readLine",
            EffectSet::singleton("IOError", hierarchies.get(Category::Raises)),
            EffectSet::empty(),
        );
        let graph = CallGraphBuilder::new(&program, &hierarchies).build().unwrap();
        let config = EffectConfig::default();
        let outcome = FixpointEngine::new(&program, &graph, &hierarchies, &config)
            .with_published(&published)
            .run();
        assert_eq!(
            outcome
                .table
                .resolved(&"main".into(), Category::Raises)
                .to_string(),
            "{IOError}"
        );
        assert!(outcome.table.resolved(&"main".into(), Category::Tags).is_empty());
        assert_eq!(outcome.metrics.published_hits, 2);
    }

    #[test]
    fn test_pass_bound_widens() {
        let program = Program::new("unit")
            .with_routine(calling("a", &["b"]))
            .with_routine(calling("b", &["c"]))
            .with_routine(raising("c", "IOError"));
        let config = EffectConfig::default()
            .max_passes(1)
            .visit_order(VisitOrder::Declaration);
        let outcome = infer(&program, &config);
        assert!(!outcome.metrics.converged);
        assert!(outcome.metrics.widened > 0);
        assert!(outcome
            .table
            .resolved(&"c".into(), Category::Raises)
            .is_unknown());
    }

    #[test]
    fn test_mention_contributes_target_set() {
        let mut user = Routine::new("use");
        user.body = Some(vec![Stmt::let_value("f", None, Expr::routine("doRaise"))]);
        let program = Program::new("unit")
            .with_routine(raising("doRaise", "IOError"))
            .with_routine(user);
        let outcome = infer(&program, &EffectConfig::default());
        assert_eq!(
            outcome
                .table
                .resolved(&"use".into(), Category::Raises)
                .to_string(),
            "{IOError}"
        );
    }

    #[test]
    fn test_method_through_alias_is_unknown() {
        let mut draw = Routine::new("draw");
        draw.kind = RoutineKind::Method;
        draw.body = Some(Vec::new());
        let mut direct = calling("direct", &["draw"]);
        direct.effects = EffectAnnotation::default().raises(&[]);
        let mut aliased = Routine::new("aliased");
        aliased.effects = EffectAnnotation::default().raises(&[]);
        aliased.body = Some(vec![
            Stmt::let_value("f", None, Expr::routine("draw")),
            Stmt::expr(Expr::call_binding("f", vec![])),
        ]);
        let program = Program::new("unit")
            .with_routine(draw)
            .with_routine(direct)
            .with_routine(aliased);

        let outcome = infer(&program, &EffectConfig::default());
        for id in ["direct", "aliased"] {
            let effects = outcome.table.get(&id.into()).unwrap();
            assert!(effects.inferred(Category::Raises).is_unknown(), "{id}");
            assert!(effects.inferred(Category::Tags).is_unknown(), "{id}");
        }
    }

    #[test]
    fn test_declared_method_through_alias_uses_declaration() {
        let mut draw = raising("draw", "IOError");
        draw.kind = RoutineKind::Method;
        draw.effects = EffectAnnotation::default().raises(&["OSError"]).tags(&[]);
        let mut user = Routine::new("use");
        user.body = Some(vec![
            Stmt::let_value("f", None, Expr::routine("draw")),
            Stmt::expr(Expr::call_binding("f", vec![])),
        ]);
        let program = Program::new("unit").with_routine(draw).with_routine(user);

        let outcome = infer(&program, &EffectConfig::default());
        assert_eq!(
            outcome.table.resolved(&"use".into(), Category::Raises).to_string(),
            "{OSError}"
        );
        assert!(outcome.table.resolved(&"use".into(), Category::Tags).is_empty());
    }

    #[test]
    fn test_published_sets_are_normalized() {
        let known = |kinds: &[&str]| EffectSet::Known(kinds.iter().map(|k| Kind::from(*k)).collect());
        let mut imported = Routine::new("readLine");
        imported.body = None;
        imported.origin = RoutineOrigin::Imported;
        let program = Program::new("unit")
            .with_routine(imported)
            .with_routine(calling("main", &["readLine"]));
        let hierarchies = Hierarchies::builtin();
        let published = PublishedEffects::new("streams").with_entry(
            "readLine",
            known(&["IndexDefect", "IOError"]),
            known(&["RootEffect"]),
        );
        let graph = CallGraphBuilder::new(&program, &hierarchies).build().unwrap();
        let config = EffectConfig::default();
        let outcome = FixpointEngine::new(&program, &graph, &hierarchies, &config)
            .with_published(&published)
            .run();

        let main = outcome.table.get(&"main".into()).unwrap();
        assert_eq!(main.resolved(Category::Raises).to_string(), "{IOError}");
        assert!(main.resolved(Category::Tags).is_unknown());
    }
}
