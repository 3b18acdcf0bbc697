/// Call graph sites
///
/// Everything the inference rules need from a routine body, flattened into
/// ordered site lists. Each site remembers where it sits in the control flow
/// (`SiteContext`) so both the whole-routine fixpoint and the position-scoped
/// marker reports can be computed from the same data.
use crate::features::effect_lattice::Coverage;
use crate::shared::models::{Kind, ProcType, RoutineId, Span};
use serde::{Deserialize, Serialize};

/// Control-flow construct (`if`, `while`, `try`) inside one routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConstructId(pub usize);

/// Arm of a construct
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    /// `if` arm i; the `else` arm is the last index
    Branch(usize),
    LoopBody,
    TryBody,
    Handler(usize),
    Finally,
}

impl Arm {
    /// Arms that never both execute on one path
    ///
    /// A try body and its handlers are not exclusive: a handler runs after
    /// part of the body.
    pub fn excludes(&self, other: &Arm) -> bool {
        match (self, other) {
            (Arm::Branch(a), Arm::Branch(b)) => a != b,
            (Arm::Handler(a), Arm::Handler(b)) => a != b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArmRef {
    pub construct: ConstructId,
    pub arm: Arm,
}

/// Handler enclosing a site of a `try` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerGuard {
    pub construct: ConstructId,
    pub coverage: Coverage,
}

/// Enclosing arms (outermost first) and active handler guards
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SiteContext {
    pub arms: Vec<ArmRef>,
    pub guards: Vec<HandlerGuard>,
}

impl SiteContext {
    /// True if the two contexts sit in mutually exclusive arms of a shared construct
    pub fn is_exclusive_with(&self, other: &SiteContext) -> bool {
        self.arms.iter().any(|mine| {
            other
                .arms
                .iter()
                .any(|theirs| mine.construct == theirs.construct && mine.arm.excludes(&theirs.arm))
        })
    }

    /// True if this context lies in the protected body of `construct`
    pub fn in_try_body_of(&self, construct: ConstructId) -> bool {
        self.arms
            .iter()
            .any(|a| a.construct == construct && a.arm == Arm::TryBody)
    }
}

/// Edge classification, fixed at graph construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Call of a statically known, statically dispatched routine
    Direct,
    /// Call of a dynamically dispatched method
    Method,
    /// Call through one of the routine's own parameters
    IndirectParam,
    /// Call through a local or global binding, or through a computed value
    IndirectLocal,
    /// Proc-typed value in non-call position
    Mention,
}

/// What an edge points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeTarget {
    Routine(RoutineId),
    /// One of the analyzed routine's own parameters
    Param(String),
    /// Local or global proc-typed binding
    Binding {
        name: String,
        /// Declared proc type of the binding (unconstrained if none)
        bound: ProcType,
        /// Routine the binding was initialized with, when its type comes from it
        alias: Option<RoutineId>,
    },
    /// Proc value produced by an arbitrary expression
    Computed,
}

impl EdgeTarget {
    /// Routine this edge resolves to statically, if any
    pub fn routine(&self) -> Option<&RoutineId> {
        match self {
            EdgeTarget::Routine(id) => Some(id),
            EdgeTarget::Binding {
                alias: Some(id), ..
            } => Some(id),
            _ => None,
        }
    }
}

/// Call or mention
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub ordinal: usize,
    pub kind: EdgeKind,
    pub target: EdgeTarget,
    pub context: SiteContext,
    pub span: Span,
}

/// What a `raise` statement raises
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Raised {
    Kind(Kind),
    /// Bare re-raise; coverage of the enclosing handler (`All` outside one)
    Reraise(Coverage),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaiseSite {
    pub ordinal: usize,
    pub raised: Raised,
    pub context: SiteContext,
    pub span: Span,
}

/// Diagnostic emission point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerSite {
    pub ordinal: usize,
    /// Position among the routine's markers (0-based)
    pub index: usize,
    pub label: Option<String>,
    pub context: SiteContext,
    pub span: Span,
}

/// Where a proc value gets bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingTarget {
    Local(String),
    Global(String),
    /// Argument bound to `param` of `callee`
    Param { callee: RoutineId, param: String },
}

impl std::fmt::Display for BindingTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingTarget::Local(name) => write!(f, "local '{}'", name),
            BindingTarget::Global(name) => write!(f, "global '{}'", name),
            BindingTarget::Param { callee, param } => {
                write!(f, "parameter '{}' of '{}'", param, callee)
            }
        }
    }
}

/// Proc value being bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundValue {
    Routine(RoutineId),
    /// Named binding whose effects come from its declared proc type
    Proc { name: String, ty: ProcType },
}

impl std::fmt::Display for BoundValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundValue::Routine(id) => write!(f, "'{}'", id),
            BoundValue::Proc { name, .. } => write!(f, "'{}'", name),
        }
    }
}

/// Assignment of a proc value to something with a constrained proc type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSite {
    pub ordinal: usize,
    pub target: BindingTarget,
    pub expected: ProcType,
    pub value: BoundValue,
    pub span: Span,
}

/// All sites of one routine, each list in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineSites {
    pub routine: RoutineId,
    pub edges: Vec<CallSite>,
    pub raises: Vec<RaiseSite>,
    pub markers: Vec<MarkerSite>,
    pub bindings: Vec<BindingSite>,
}

impl RoutineSites {
    pub fn new(routine: RoutineId) -> Self {
        Self {
            routine,
            edges: Vec::new(),
            raises: Vec::new(),
            markers: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn marker(&self, index: usize) -> Option<&MarkerSite> {
        self.markers.get(index)
    }

    pub fn marker_by_label(&self, label: &str) -> Option<&MarkerSite> {
        self.markers
            .iter()
            .find(|m| m.label.as_deref() == Some(label))
    }
}
