//! Program representation consumed by the effect analyzer
//!
//! Built by the front end (parsing, name resolution and type checking are
//! external). The analyzer treats every value here as read-only input.
//!
//! Serialized form is internally tagged so it can be hand-written in JSON or
//! YAML:
//!
//! ```text
//! { "stmt": "raise", "kind": "IOError" }
//! { "stmt": "expr", "expr": { "expr": "call", "callee": { "routine": "readLine" } } }
//! ```

use super::kind::{Category, Kind};
use super::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_true() -> bool {
    true
}

/// Stable routine identifier (name or mangled signature)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoutineId(String);

impl RoutineId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoutineId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for RoutineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routine flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineKind {
    #[default]
    Proc,
    Func,
    Iterator,
    /// Dynamically dispatched; the concrete override is unknown at call sites
    Method,
    Converter,
}

impl RoutineKind {
    pub fn is_dynamically_dispatched(&self) -> bool {
        matches!(self, Self::Method)
    }
}

/// Where a routine's implementation lives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutineOrigin {
    /// Defined in this compilation unit (body may still be a forward declaration)
    #[default]
    Defined,
    /// Implemented outside the language (FFI)
    Foreign,
    /// Defined in another compilation unit
    Imported,
}

/// Explicit effect annotation on a routine or proc type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectAnnotation {
    /// Declared exception list; `Some([])` means "raises nothing"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raises: Option<Vec<Kind>>,

    /// Declared tag list; `Some([])` means "produces no tag"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Kind>>,

    /// Tags that must never be produced
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbids: Vec<Kind>,
}

impl EffectAnnotation {
    pub fn declared(&self, category: Category) -> Option<&[Kind]> {
        match category {
            Category::Raises => self.raises.as_deref(),
            Category::Tags => self.tags.as_deref(),
        }
    }

    pub fn raises(mut self, kinds: &[&str]) -> Self {
        self.raises = Some(kinds.iter().map(|k| Kind::from(*k)).collect());
        self
    }

    pub fn tags(mut self, kinds: &[&str]) -> Self {
        self.tags = Some(kinds.iter().map(|k| Kind::from(*k)).collect());
        self
    }

    pub fn forbids(mut self, kinds: &[&str]) -> Self {
        self.forbids = kinds.iter().map(|k| Kind::from(*k)).collect();
        self
    }

    /// True when nothing is declared or forbidden
    pub fn is_unconstrained(&self) -> bool {
        self.raises.is_none() && self.tags.is_none() && self.forbids.is_empty()
    }
}

/// Type of a routine used as a first-class value
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProcType {
    #[serde(flatten)]
    pub effects: EffectAnnotation,
}

impl ProcType {
    pub fn new(effects: EffectAnnotation) -> Self {
        Self { effects }
    }

    /// Proc type without any effect annotation
    pub fn unconstrained() -> Self {
        Self::default()
    }
}

/// Parameter type, as far as the analyzer cares
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    #[default]
    Value,
    Proc(ProcType),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub ty: ParamType,
}

impl Param {
    pub fn value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Value,
        }
    }

    pub fn proc(name: impl Into<String>, ty: ProcType) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Proc(ty),
        }
    }

    pub fn proc_type(&self) -> Option<&ProcType> {
        match &self.ty {
            ParamType::Proc(ty) => Some(ty),
            ParamType::Value => None,
        }
    }
}

/// Routine (procedure, function, iterator, method or converter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Routine {
    pub id: RoutineId,

    #[serde(default)]
    pub kind: RoutineKind,

    #[serde(default)]
    pub origin: RoutineOrigin,

    #[serde(default)]
    pub params: Vec<Param>,

    #[serde(default)]
    pub effects: EffectAnnotation,

    /// `None` for forward declarations, foreign and imported routines
    #[serde(default)]
    pub body: Option<Vec<Stmt>>,

    #[serde(default)]
    pub span: Span,
}

impl Routine {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: RoutineId::new(id),
            kind: RoutineKind::Proc,
            origin: RoutineOrigin::Defined,
            params: Vec::new(),
            effects: EffectAnnotation::default(),
            body: Some(Vec::new()),
            span: Span::zero(),
        }
    }

    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    pub fn param(&self, name: &str) -> Option<&Param> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn declared(&self, category: Category) -> Option<&[Kind]> {
        self.effects.declared(category)
    }
}

/// Module-level proc-typed variable or object field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalBinding {
    pub name: String,
    #[serde(default)]
    pub proc_type: ProcType,
    #[serde(default)]
    pub span: Span,
}

/// Declaration of an exception or tag kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindDecl {
    pub name: Kind,

    /// Parent kind; `None` means a direct child of the root
    #[serde(default)]
    pub parent: Option<Kind>,

    /// Untracked kinds (defects) never show up in inferred sets
    #[serde(default = "default_true")]
    pub tracked: bool,
}

impl KindDecl {
    pub fn new(name: &str, parent: Option<&str>) -> Self {
        Self {
            name: Kind::from(name),
            parent: parent.map(Kind::from),
            tracked: true,
        }
    }

    pub fn untracked(mut self) -> Self {
        self.tracked = false;
        self
    }
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stmt", rename_all = "snake_case")]
pub enum Stmt {
    Expr {
        expr: Expr,
    },
    Let {
        name: String,
        #[serde(default)]
        proc_type: Option<ProcType>,
        #[serde(default)]
        value: Option<Expr>,
        #[serde(default)]
        span: Span,
    },
    Assign {
        target: String,
        value: Expr,
        #[serde(default)]
        span: Span,
    },
    /// `raise K(...)`; no kind is a bare re-raise inside a handler
    Raise {
        #[serde(default)]
        kind: Option<Kind>,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
    If {
        arms: Vec<IfArm>,
        #[serde(default)]
        else_body: Option<Vec<Stmt>>,
    },
    While {
        cond: Expr,
        body: Vec<Stmt>,
    },
    Try {
        body: Vec<Stmt>,
        #[serde(default)]
        handlers: Vec<Handler>,
        #[serde(default)]
        finally: Option<Vec<Stmt>>,
    },
    Block {
        body: Vec<Stmt>,
    },
    Return {
        #[serde(default)]
        value: Option<Expr>,
    },
    /// Diagnostic emission point
    EffectsMarker {
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        span: Span,
    },
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Self::Expr { expr }
    }

    /// `id()` as a statement
    pub fn call(id: &str) -> Self {
        Self::expr(Expr::call(id, Vec::new()))
    }

    pub fn raise(kind: &str) -> Self {
        Self::Raise {
            kind: Some(Kind::from(kind)),
            args: Vec::new(),
            span: Span::zero(),
        }
    }

    pub fn reraise() -> Self {
        Self::Raise {
            kind: None,
            args: Vec::new(),
            span: Span::zero(),
        }
    }

    pub fn marker() -> Self {
        Self::EffectsMarker {
            label: None,
            span: Span::zero(),
        }
    }

    pub fn labeled_marker(label: &str) -> Self {
        Self::EffectsMarker {
            label: Some(label.to_string()),
            span: Span::zero(),
        }
    }

    pub fn let_value(name: &str, proc_type: Option<ProcType>, value: Expr) -> Self {
        Self::Let {
            name: name.to_string(),
            proc_type,
            value: Some(value),
            span: Span::zero(),
        }
    }

    pub fn assign(target: &str, value: Expr) -> Self {
        Self::Assign {
            target: target.to_string(),
            value,
            span: Span::zero(),
        }
    }

    pub fn if_else(cond: Expr, then_body: Vec<Stmt>, else_body: Option<Vec<Stmt>>) -> Self {
        Self::If {
            arms: vec![IfArm {
                cond,
                body: then_body,
            }],
            else_body,
        }
    }

    pub fn try_except(body: Vec<Stmt>, handlers: Vec<Handler>) -> Self {
        Self::Try {
            body,
            handlers,
            finally: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IfArm {
    pub cond: Expr,
    pub body: Vec<Stmt>,
}

/// `except K1, K2:` handler; no kinds catches everything
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Handler {
    #[serde(default)]
    pub kinds: Vec<Kind>,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

impl Handler {
    pub fn catching(kinds: &[&str], body: Vec<Stmt>) -> Self {
        Self {
            kinds: kinds.iter().map(|k| Kind::from(*k)).collect(),
            body,
        }
    }

    pub fn catch_all(body: Vec<Stmt>) -> Self {
        Self {
            kinds: Vec::new(),
            body,
        }
    }
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "expr", rename_all = "snake_case")]
pub enum Expr {
    Nil,
    Literal {
        text: String,
    },
    /// Parameter, local or global binding
    Local {
        name: String,
    },
    /// Routine symbol in value position
    Routine {
        id: RoutineId,
    },
    Call {
        callee: Callee,
        #[serde(default)]
        args: Vec<Expr>,
        #[serde(default)]
        span: Span,
    },
}

impl Expr {
    pub fn call(id: &str, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: Callee::Routine(RoutineId::from(id)),
            args,
            span: Span::zero(),
        }
    }

    pub fn call_binding(name: &str, args: Vec<Expr>) -> Self {
        Self::Call {
            callee: Callee::Binding(name.to_string()),
            args,
            span: Span::zero(),
        }
    }

    pub fn routine(id: &str) -> Self {
        Self::Routine {
            id: RoutineId::from(id),
        }
    }

    pub fn local(name: &str) -> Self {
        Self::Local {
            name: name.to_string(),
        }
    }

    pub fn literal(text: &str) -> Self {
        Self::Literal {
            text: text.to_string(),
        }
    }
}

/// What a call expression invokes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Callee {
    /// Statically named routine
    Routine(RoutineId),
    /// Parameter, local or global of proc type
    Binding(String),
    /// Any other proc-valued expression (`table[i]()`, `make()()`)
    Computed(Box<Expr>),
}

/// One compilation unit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    pub unit: String,

    #[serde(default)]
    pub exception_kinds: Vec<KindDecl>,

    #[serde(default)]
    pub tag_kinds: Vec<KindDecl>,

    #[serde(default)]
    pub routines: Vec<Routine>,

    #[serde(default)]
    pub globals: Vec<GlobalBinding>,
}

impl Program {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            ..Default::default()
        }
    }

    pub fn with_routine(mut self, routine: Routine) -> Self {
        self.routines.push(routine);
        self
    }

    pub fn with_tag_kind(mut self, decl: KindDecl) -> Self {
        self.tag_kinds.push(decl);
        self
    }

    pub fn with_exception_kind(mut self, decl: KindDecl) -> Self {
        self.exception_kinds.push(decl);
        self
    }

    pub fn with_global(mut self, global: GlobalBinding) -> Self {
        self.globals.push(global);
        self
    }

    pub fn routine(&self, id: &RoutineId) -> Option<&Routine> {
        self.routines.iter().find(|r| &r.id == id)
    }

    pub fn global(&self, name: &str) -> Option<&GlobalBinding> {
        self.globals.iter().find(|g| g.name == name)
    }

    pub fn kind_decls(&self, category: Category) -> &[KindDecl] {
        match category {
            Category::Raises => &self.exception_kinds,
            Category::Tags => &self.tag_kinds,
        }
    }
}
