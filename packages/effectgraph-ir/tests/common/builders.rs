//! Test data builders

use effectgraph_ir::config::EffectConfig;
use effectgraph_ir::pipeline::{UnitAnalyzer, UnitResult};
use effectgraph_ir::shared::models::{
    EffectAnnotation, Param, ProcType, Routine, RoutineKind, RoutineOrigin, Stmt,
};

/// Builder for Routine
#[derive(Debug)]
pub struct RoutineBuilder {
    routine: Routine,
}

impl RoutineBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            routine: Routine::new(id),
        }
    }

    /// Declared exception list
    pub fn raises(mut self, kinds: &[&str]) -> Self {
        self.routine.effects = self.routine.effects.raises(kinds);
        self
    }

    /// Declared tag list
    pub fn tags(mut self, kinds: &[&str]) -> Self {
        self.routine.effects = self.routine.effects.tags(kinds);
        self
    }

    pub fn forbids(mut self, kinds: &[&str]) -> Self {
        self.routine.effects = self.routine.effects.forbids(kinds);
        self
    }

    pub fn param(mut self, name: &str) -> Self {
        self.routine.params.push(Param::value(name));
        self
    }

    pub fn proc_param(mut self, name: &str, ty: ProcType) -> Self {
        self.routine.params.push(Param::proc(name, ty));
        self
    }

    /// Forward declaration: no body
    pub fn forward(mut self) -> Self {
        self.routine.body = None;
        self
    }

    /// Bodiless routine from another unit
    pub fn imported(mut self) -> Self {
        self.routine.body = None;
        self.routine.origin = RoutineOrigin::Imported;
        self
    }

    pub fn method(mut self) -> Self {
        self.routine.kind = RoutineKind::Method;
        self
    }

    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.routine.body.get_or_insert_with(Vec::new).push(stmt);
        self
    }

    pub fn stmts(mut self, stmts: Vec<Stmt>) -> Self {
        self.routine.body.get_or_insert_with(Vec::new).extend(stmts);
        self
    }

    pub fn build(self) -> Routine {
        self.routine
    }
}

/// Proc type declaring an exception list
pub fn proc_raising(kinds: &[&str]) -> ProcType {
    ProcType::new(EffectAnnotation::default().raises(kinds))
}

/// Proc type declaring a tag list
pub fn proc_tagged(kinds: &[&str]) -> ProcType {
    ProcType::new(EffectAnnotation::default().tags(kinds))
}

/// Run the whole pipeline with the standard preset
pub fn analyze(program: &effectgraph_ir::Program) -> UnitResult {
    analyze_with(program, EffectConfig::default())
}

pub fn analyze_with(program: &effectgraph_ir::Program, config: EffectConfig) -> UnitResult {
    UnitAnalyzer::new(config)
        .analyze(program)
        .expect("program should analyze")
}
