//! Shared models

mod kind;
mod program;
mod span;

pub use kind::{Category, Kind, KindList};
pub use program::{
    Callee, EffectAnnotation, Expr, GlobalBinding, Handler, IfArm, KindDecl, Param, ParamType,
    ProcType, Program, Routine, RoutineId, RoutineKind, RoutineOrigin, Stmt,
};
pub use span::Span;
