//! Call graph construction
//!
//! One pre-order walk per routine body. The walk classifies every call and
//! mention, records raise and marker sites, tracks the enclosing control-flow
//! arms and handler guards, and collects proc-value bindings for the
//! compatibility checker.
//!
//! Name resolution for bindings is flat per routine: locals shadow parameters,
//! parameters shadow globals.

use crate::errors::{EffectgraphError, Result};
use crate::features::call_graph::domain::{
    Arm, ArmRef, BindingSite, BindingTarget, BoundValue, CallSite, ConstructId, EdgeKind,
    EdgeTarget, HandlerGuard, MarkerSite, RaiseSite, Raised, RoutineSites, SiteContext,
};
use crate::features::call_graph::infrastructure::call_graph::CallGraph;
use crate::features::effect_lattice::{Coverage, Hierarchies, KindHierarchy};
use crate::shared::models::{
    Callee, Category, EffectAnnotation, Expr, IfArm, ProcType, Program, Routine, RoutineId,
    Span, Stmt,
};
use rustc_hash::{FxHashMap, FxHashSet};

/// Builds the call graph of one compilation unit
pub struct CallGraphBuilder<'p> {
    program: &'p Program,
    hierarchies: &'p Hierarchies,
    routines: FxHashMap<&'p RoutineId, &'p Routine>,
}

impl<'p> CallGraphBuilder<'p> {
    pub fn new(program: &'p Program, hierarchies: &'p Hierarchies) -> Self {
        let routines = program.routines.iter().map(|r| (&r.id, r)).collect();
        Self {
            program,
            hierarchies,
            routines,
        }
    }

    /// Walk every routine, in declaration order
    pub fn build(&self) -> Result<CallGraph> {
        let mut seen = FxHashSet::default();
        for routine in &self.program.routines {
            if !seen.insert(&routine.id) {
                return Err(EffectgraphError::DuplicateRoutine(routine.id.clone()));
            }
        }

        for global in &self.program.globals {
            self.check_annotation(&global.proc_type.effects, &global.name)?;
        }

        let sites = self
            .program
            .routines
            .iter()
            .map(|routine| self.collect_sites(routine))
            .collect::<Result<Vec<_>>>()?;

        let graph = CallGraph::new(sites);
        tracing::debug!(
            unit = %self.program.unit,
            routines = graph.len(),
            edges = graph.edge_count(),
            "call graph built"
        );
        Ok(graph)
    }

    /// Sites of one routine (empty for routines without a body)
    pub fn collect_sites(&self, routine: &'p Routine) -> Result<RoutineSites> {
        self.check_annotation(&routine.effects, routine.id.as_str())?;
        for param in &routine.params {
            if let Some(ty) = param.proc_type() {
                self.check_annotation(&ty.effects, routine.id.as_str())?;
            }
        }

        let mut walker = BodyWalker::new(self, routine);
        if let Some(body) = &routine.body {
            walker.walk_block(body)?;
        }
        Ok(walker.sites)
    }

    fn hierarchy(&self, category: Category) -> &KindHierarchy {
        self.hierarchies.get(category)
    }

    fn check_annotation(&self, effects: &EffectAnnotation, context: &str) -> Result<()> {
        for category in Category::ALL {
            if let Some(kinds) = effects.declared(category) {
                for kind in kinds {
                    self.hierarchy(category).check_kind(kind, context)?;
                }
            }
        }
        for kind in &effects.forbids {
            self.hierarchy(Category::Tags).check_kind(kind, context)?;
        }
        Ok(())
    }
}

/// Local variable as seen by the walker
#[derive(Debug, Clone)]
struct LocalBinding {
    proc_type: Option<ProcType>,
    /// Routine the untyped local was initialized with
    alias: Option<RoutineId>,
}

struct BodyWalker<'b, 'p> {
    builder: &'b CallGraphBuilder<'p>,
    routine: &'p Routine,
    sites: RoutineSites,
    next_ordinal: usize,
    next_construct: usize,
    arms: Vec<ArmRef>,
    guards: Vec<HandlerGuard>,
    /// Coverage of the handlers enclosing the current statement, innermost last
    handlers: Vec<Coverage>,
    locals: FxHashMap<String, LocalBinding>,
}

impl<'b, 'p> BodyWalker<'b, 'p> {
    fn new(builder: &'b CallGraphBuilder<'p>, routine: &'p Routine) -> Self {
        Self {
            builder,
            routine,
            sites: RoutineSites::new(routine.id.clone()),
            next_ordinal: 0,
            next_construct: 0,
            arms: Vec::new(),
            guards: Vec::new(),
            handlers: Vec::new(),
            locals: FxHashMap::default(),
        }
    }

    fn ordinal(&mut self) -> usize {
        let ordinal = self.next_ordinal;
        self.next_ordinal += 1;
        ordinal
    }

    fn construct(&mut self) -> ConstructId {
        let id = ConstructId(self.next_construct);
        self.next_construct += 1;
        id
    }

    fn context(&self) -> SiteContext {
        SiteContext {
            arms: self.arms.clone(),
            guards: self.guards.clone(),
        }
    }

    fn enter(&mut self, construct: ConstructId, arm: Arm) {
        self.arms.push(ArmRef { construct, arm });
    }

    fn leave(&mut self) {
        self.arms.pop();
    }

    fn lookup(&self, id: &RoutineId) -> Result<&'p Routine> {
        self.builder
            .routines
            .get(id)
            .copied()
            .ok_or_else(|| EffectgraphError::UnknownRoutine {
                routine: id.clone(),
                referenced_from: self.routine.id.clone(),
            })
    }

    fn push_edge(&mut self, kind: EdgeKind, target: EdgeTarget, span: Span) {
        let site = CallSite {
            ordinal: self.ordinal(),
            kind,
            target,
            context: self.context(),
            span,
        };
        self.sites.edges.push(site);
    }

    fn walk_block(&mut self, stmts: &'p [Stmt]) -> Result<()> {
        for stmt in stmts {
            self.walk_stmt(stmt)?;
        }
        Ok(())
    }

    fn walk_stmt(&mut self, stmt: &'p Stmt) -> Result<()> {
        match stmt {
            Stmt::Expr { expr } => self.walk_expr(expr),
            Stmt::Let {
                name,
                proc_type,
                value,
                span,
            } => {
                if let Some(ty) = proc_type {
                    self.builder
                        .check_annotation(&ty.effects, self.routine.id.as_str())?;
                }
                if let Some(value) = value {
                    self.walk_expr(value)?;
                }
                let alias = match (proc_type, value) {
                    (None, Some(value)) => self.alias_of(value),
                    _ => None,
                };
                if let (Some(expected), Some(value)) = (proc_type, value) {
                    self.record_binding(BindingTarget::Local(name.clone()), expected, value, *span);
                }
                self.locals.insert(
                    name.clone(),
                    LocalBinding {
                        proc_type: proc_type.clone(),
                        alias,
                    },
                );
                Ok(())
            }
            Stmt::Assign {
                target,
                value,
                span,
            } => {
                self.walk_expr(value)?;
                if let Some((binding, expected)) = self.assign_target(target) {
                    self.record_binding(binding, &expected, value, *span);
                }
                // an untyped local no longer names a single routine
                if let Some(local) = self.locals.get_mut(target) {
                    if local.proc_type.is_none() {
                        local.alias = None;
                    }
                }
                Ok(())
            }
            Stmt::Raise { kind, args, span } => {
                for arg in args {
                    self.walk_expr(arg)?;
                }
                let raised = match kind {
                    Some(kind) => {
                        self.builder
                            .hierarchy(Category::Raises)
                            .check_kind(kind, self.routine.id.as_str())?;
                        Raised::Kind(kind.clone())
                    }
                    None => Raised::Reraise(self.handlers.last().cloned().unwrap_or(Coverage::All)),
                };
                let site = RaiseSite {
                    ordinal: self.ordinal(),
                    raised,
                    context: self.context(),
                    span: *span,
                };
                self.sites.raises.push(site);
                Ok(())
            }
            Stmt::If { arms, else_body } => self.walk_if(arms, else_body.as_deref()),
            Stmt::While { cond, body } => {
                self.walk_expr(cond)?;
                let construct = self.construct();
                self.enter(construct, Arm::LoopBody);
                self.walk_block(body)?;
                self.leave();
                Ok(())
            }
            Stmt::Try {
                body,
                handlers,
                finally,
            } => {
                let construct = self.construct();
                let raises = self.builder.hierarchy(Category::Raises);
                let mut coverages = Vec::with_capacity(handlers.len());
                for handler in handlers {
                    for kind in &handler.kinds {
                        raises.check_kind(kind, self.routine.id.as_str())?;
                    }
                    coverages.push(Coverage::of_handler(&handler.kinds, raises));
                }

                let guard_depth = self.guards.len();
                self.guards
                    .extend(coverages.iter().cloned().map(|coverage| HandlerGuard {
                        construct,
                        coverage,
                    }));
                self.enter(construct, Arm::TryBody);
                self.walk_block(body)?;
                self.leave();
                self.guards.truncate(guard_depth);

                for (i, (handler, coverage)) in handlers.iter().zip(coverages).enumerate() {
                    self.enter(construct, Arm::Handler(i));
                    self.handlers.push(coverage);
                    self.walk_block(&handler.body)?;
                    self.handlers.pop();
                    self.leave();
                }

                if let Some(finally) = finally {
                    self.enter(construct, Arm::Finally);
                    self.walk_block(finally)?;
                    self.leave();
                }
                Ok(())
            }
            Stmt::Block { body } => self.walk_block(body),
            Stmt::Return { value } => match value {
                Some(value) => self.walk_expr(value),
                None => Ok(()),
            },
            Stmt::EffectsMarker { label, span } => {
                let site = MarkerSite {
                    ordinal: self.ordinal(),
                    index: self.sites.markers.len(),
                    label: label.clone(),
                    context: self.context(),
                    span: *span,
                };
                self.sites.markers.push(site);
                Ok(())
            }
        }
    }

    /// `if a: A elif b: B else: C` is walked as `if a: A else: (if b: B else: C)`
    /// so each condition only belongs to the paths that evaluate it.
    fn walk_if(&mut self, arms: &'p [IfArm], else_body: Option<&'p [Stmt]>) -> Result<()> {
        let Some((first, rest)) = arms.split_first() else {
            return match else_body {
                Some(body) => self.walk_block(body),
                None => Ok(()),
            };
        };

        self.walk_expr(&first.cond)?;
        let construct = self.construct();
        self.enter(construct, Arm::Branch(0));
        self.walk_block(&first.body)?;
        self.leave();

        if !rest.is_empty() || else_body.is_some() {
            self.enter(construct, Arm::Branch(1));
            self.walk_if(rest, else_body)?;
            self.leave();
        }
        Ok(())
    }

    fn walk_expr(&mut self, expr: &'p Expr) -> Result<()> {
        match expr {
            Expr::Nil | Expr::Literal { .. } => Ok(()),
            Expr::Local { name } => {
                if let Some(target) = self.mention_target(name) {
                    self.push_edge(EdgeKind::Mention, target, Span::zero());
                }
                Ok(())
            }
            Expr::Routine { id } => {
                self.lookup(id)?;
                self.push_edge(EdgeKind::Mention, EdgeTarget::Routine(id.clone()), Span::zero());
                Ok(())
            }
            Expr::Call { callee, args, span } => {
                match callee {
                    Callee::Routine(id) => {
                        let target = self.lookup(id)?;
                        let kind = if target.kind.is_dynamically_dispatched() {
                            EdgeKind::Method
                        } else {
                            EdgeKind::Direct
                        };
                        self.push_edge(kind, EdgeTarget::Routine(id.clone()), *span);
                        for (param, arg) in target.params.iter().zip(args) {
                            if let Some(expected) = param.proc_type() {
                                let binding = BindingTarget::Param {
                                    callee: id.clone(),
                                    param: param.name.clone(),
                                };
                                self.record_binding(binding, expected, arg, *span);
                            }
                        }
                    }
                    Callee::Binding(name) => {
                        let (kind, target) = self.call_target(name);
                        self.push_edge(kind, target, *span);
                    }
                    Callee::Computed(inner) => {
                        self.push_edge(EdgeKind::IndirectLocal, EdgeTarget::Computed, *span);
                        self.walk_expr(inner)?;
                    }
                }
                for arg in args {
                    self.walk_expr(arg)?;
                }
                Ok(())
            }
        }
    }

    /// Target of a proc-typed name in value position; `None` for plain values
    fn mention_target(&self, name: &str) -> Option<EdgeTarget> {
        if let Some(local) = self.locals.get(name) {
            return match (&local.proc_type, &local.alias) {
                (Some(ty), _) => Some(EdgeTarget::Binding {
                    name: name.to_string(),
                    bound: ty.clone(),
                    alias: None,
                }),
                (None, Some(alias)) => Some(EdgeTarget::Binding {
                    name: name.to_string(),
                    bound: ProcType::unconstrained(),
                    alias: Some(alias.clone()),
                }),
                (None, None) => None,
            };
        }
        if let Some(param) = self.routine.param(name) {
            return param
                .proc_type()
                .map(|_| EdgeTarget::Param(name.to_string()));
        }
        self.builder
            .program
            .global(name)
            .map(|global| EdgeTarget::Binding {
                name: name.to_string(),
                bound: global.proc_type.clone(),
                alias: None,
            })
    }

    /// Classification of `name(...)`
    fn call_target(&self, name: &str) -> (EdgeKind, EdgeTarget) {
        if !self.locals.contains_key(name) && self.routine.param(name).is_some() {
            return (EdgeKind::IndirectParam, EdgeTarget::Param(name.to_string()));
        }
        let target = self
            .mention_target(name)
            .unwrap_or_else(|| EdgeTarget::Binding {
                name: name.to_string(),
                bound: ProcType::unconstrained(),
                alias: None,
            });
        (EdgeKind::IndirectLocal, target)
    }

    fn alias_of(&self, value: &Expr) -> Option<RoutineId> {
        match value {
            Expr::Routine { id } => Some(id.clone()),
            Expr::Local { name } => self
                .locals
                .get(name.as_str())
                .filter(|local| local.proc_type.is_none())
                .and_then(|local| local.alias.clone()),
            _ => None,
        }
    }

    /// Declared proc type of an assignment target, if it constrains anything
    fn assign_target(&self, target: &str) -> Option<(BindingTarget, ProcType)> {
        if let Some(local) = self.locals.get(target) {
            return local
                .proc_type
                .clone()
                .map(|ty| (BindingTarget::Local(target.to_string()), ty));
        }
        if let Some(param) = self.routine.param(target) {
            return param
                .proc_type()
                .map(|ty| (BindingTarget::Local(target.to_string()), ty.clone()));
        }
        self.builder
            .program
            .global(target)
            .map(|global| (BindingTarget::Global(target.to_string()), global.proc_type.clone()))
    }

    fn bound_value(&self, value: &Expr) -> Option<BoundValue> {
        match value {
            Expr::Routine { id } => Some(BoundValue::Routine(id.clone())),
            Expr::Local { name } => match self.mention_target(name)? {
                EdgeTarget::Binding {
                    alias: Some(id), ..
                } => Some(BoundValue::Routine(id)),
                EdgeTarget::Binding { name, bound, .. } => Some(BoundValue::Proc { name, ty: bound }),
                EdgeTarget::Param(name) => {
                    let ty = self.routine.param(&name)?.proc_type()?.clone();
                    Some(BoundValue::Proc { name, ty })
                }
                EdgeTarget::Routine(id) => Some(BoundValue::Routine(id)),
                EdgeTarget::Computed => None,
            },
            // a returned proc value carries no declared effects
            Expr::Call { callee, .. } => {
                let name = match callee {
                    Callee::Routine(id) => format!("{}(...)", id),
                    Callee::Binding(name) => format!("{}(...)", name),
                    Callee::Computed(_) => "(...)(...)".to_string(),
                };
                Some(BoundValue::Proc {
                    name,
                    ty: ProcType::unconstrained(),
                })
            }
            Expr::Nil | Expr::Literal { .. } => None,
        }
    }

    fn record_binding(
        &mut self,
        target: BindingTarget,
        expected: &ProcType,
        value: &Expr,
        span: Span,
    ) {
        if expected.effects.is_unconstrained() {
            return;
        }
        if let Some(value) = self.bound_value(value) {
            let site = BindingSite {
                ordinal: self.ordinal(),
                target,
                expected: expected.clone(),
                value,
                span,
            };
            self.sites.bindings.push(site);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::effect_lattice::HierarchyOptions;
    use crate::shared::models::{EffectAnnotation, GlobalBinding, Handler, Param, RoutineKind};

    fn build(program: &Program) -> Result<CallGraph> {
        let hierarchies = Hierarchies::from_program(program, HierarchyOptions::default())?;
        CallGraphBuilder::new(program, &hierarchies).build()
    }

    fn proc_type(raises: &[&str]) -> ProcType {
        ProcType::new(EffectAnnotation::default().raises(raises))
    }

    #[test]
    fn test_edge_classification() {
        let mut caller = Routine::new("caller");
        caller.params.push(Param::proc("cb", ProcType::unconstrained()));
        caller.body = Some(vec![
            Stmt::call("helper"),
            Stmt::call("dispatch"),
            Stmt::expr(Expr::call_binding("cb", vec![])),
            Stmt::expr(Expr::routine("helper")),
            Stmt::expr(Expr::local("cb")),
        ]);
        let mut dispatch = Routine::new("dispatch");
        dispatch.kind = RoutineKind::Method;
        let program = Program::new("unit")
            .with_routine(caller)
            .with_routine(Routine::new("helper"))
            .with_routine(dispatch);

        let graph = build(&program).unwrap();
        let sites = graph.sites(&"caller".into()).unwrap();
        let kinds: Vec<EdgeKind> = sites.edges.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EdgeKind::Direct,
                EdgeKind::Method,
                EdgeKind::IndirectParam,
                EdgeKind::Mention,
                EdgeKind::Mention,
            ]
        );
        assert_eq!(sites.edges[4].target, EdgeTarget::Param("cb".to_string()));
    }

    #[test]
    fn test_unknown_routine_rejected() {
        let mut caller = Routine::new("caller");
        caller.body = Some(vec![Stmt::call("missing")]);
        let err = build(&Program::new("unit").with_routine(caller)).unwrap_err();
        assert!(matches!(err, EffectgraphError::UnknownRoutine { .. }));
    }

    #[test]
    fn test_duplicate_routine_rejected() {
        let program = Program::new("unit")
            .with_routine(Routine::new("a"))
            .with_routine(Routine::new("a"));
        assert!(matches!(
            build(&program).unwrap_err(),
            EffectgraphError::DuplicateRoutine(_)
        ));
    }

    #[test]
    fn test_value_locals_are_not_mentions() {
        let mut r = Routine::new("r");
        r.params.push(Param::value("n"));
        r.body = Some(vec![
            Stmt::let_value("x", None, Expr::literal("1")),
            Stmt::expr(Expr::local("x")),
            Stmt::expr(Expr::local("n")),
        ]);
        let graph = build(&Program::new("unit").with_routine(r)).unwrap();
        assert!(graph.sites(&"r".into()).unwrap().edges.is_empty());
    }

    #[test]
    fn test_untyped_local_aliases_routine() {
        let mut r = Routine::new("r");
        r.body = Some(vec![
            Stmt::let_value("f", None, Expr::routine("helper")),
            Stmt::expr(Expr::call_binding("f", vec![])),
        ]);
        let program = Program::new("unit")
            .with_routine(r)
            .with_routine(Routine::new("helper"));
        let graph = build(&program).unwrap();
        let call = &graph.sites(&"r".into()).unwrap().edges[1];
        assert_eq!(call.kind, EdgeKind::IndirectLocal);
        assert_eq!(call.target.routine(), Some(&RoutineId::from("helper")));
    }

    #[test]
    fn test_try_guards_and_reraise_coverage() {
        let mut r = Routine::new("r");
        r.body = Some(vec![Stmt::try_except(
            vec![Stmt::raise("IOError")],
            vec![Handler::catching(&["IOError"], vec![Stmt::reraise()])],
        )]);
        let graph = build(&Program::new("unit").with_routine(r)).unwrap();
        let raises = &graph.sites(&"r".into()).unwrap().raises;
        assert_eq!(raises[0].context.guards.len(), 1);
        assert!(raises[1].context.guards.is_empty());
        assert_eq!(
            raises[1].raised,
            Raised::Reraise(Coverage::Kinds(vec!["IOError".into()]))
        );
    }

    #[test]
    fn test_elif_condition_belongs_to_else_path() {
        let mut r = Routine::new("r");
        r.body = Some(vec![Stmt::If {
            arms: vec![
                IfArm {
                    cond: Expr::literal("a"),
                    body: vec![Stmt::marker()],
                },
                IfArm {
                    cond: Expr::call("check", vec![]),
                    body: vec![],
                },
            ],
            else_body: None,
        }]);
        let program = Program::new("unit")
            .with_routine(r)
            .with_routine(Routine::new("check"));
        let graph = build(&program).unwrap();
        let sites = graph.sites(&"r".into()).unwrap();
        assert!(sites.markers[0]
            .context
            .is_exclusive_with(&sites.edges[0].context));
    }

    #[test]
    fn test_bindings_collected() {
        let mut callee = Routine::new("noRaise");
        callee.params.push(Param::proc("x", proc_type(&[])));
        let mut r = Routine::new("r");
        r.body = Some(vec![
            Stmt::let_value("f", Some(proc_type(&[])), Expr::routine("doRaise")),
            Stmt::expr(Expr::call("noRaise", vec![Expr::routine("doRaise")])),
            Stmt::assign("handler", Expr::routine("doRaise")),
            Stmt::let_value("g", Some(ProcType::unconstrained()), Expr::routine("doRaise")),
        ]);
        let program = Program::new("unit")
            .with_routine(callee)
            .with_routine(r)
            .with_routine(Routine::new("doRaise"))
            .with_global(GlobalBinding {
                name: "handler".to_string(),
                proc_type: proc_type(&["ValueError"]),
                span: Span::zero(),
            });
        let graph = build(&program).unwrap();
        let bindings = &graph.sites(&"r".into()).unwrap().bindings;
        assert_eq!(bindings.len(), 3);
        assert_eq!(bindings[0].target, BindingTarget::Local("f".to_string()));
        assert!(matches!(bindings[1].target, BindingTarget::Param { .. }));
        assert_eq!(bindings[2].target, BindingTarget::Global("handler".to_string()));
    }

    #[test]
    fn test_returned_proc_bound_as_unconstrained() {
        let mut r = Routine::new("r");
        r.body = Some(vec![
            Stmt::let_value("f", Some(proc_type(&[])), Expr::call("makeHandler", vec![])),
            Stmt::let_value("g", Some(proc_type(&[])), Expr::Nil),
        ]);
        let program = Program::new("unit")
            .with_routine(r)
            .with_routine(Routine::new("makeHandler"));
        let graph = build(&program).unwrap();
        let bindings = &graph.sites(&"r".into()).unwrap().bindings;
        assert_eq!(bindings.len(), 1);
        assert_eq!(
            bindings[0].value,
            BoundValue::Proc {
                name: "makeHandler(...)".to_string(),
                ty: ProcType::unconstrained(),
            }
        );
    }

    #[test]
    fn test_strict_kinds_reject_undeclared_raise() {
        let mut r = Routine::new("r");
        r.body = Some(vec![Stmt::raise("NotDeclared")]);
        let program = Program::new("unit").with_routine(r);
        let hierarchies = Hierarchies::from_program(
            &program,
            HierarchyOptions {
                strict_kinds: true,
                ..Default::default()
            },
        )
        .unwrap();
        let err = CallGraphBuilder::new(&program, &hierarchies)
            .build()
            .unwrap_err();
        assert!(matches!(err, EffectgraphError::UnknownKind { .. }));
    }
}
