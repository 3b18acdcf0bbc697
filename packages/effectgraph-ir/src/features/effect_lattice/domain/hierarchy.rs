//! Kind hierarchy
//!
//! "Is-covered-by" relation between kinds of one category. A kind is covered
//! by itself, by any ancestor, and by the root. The relation is kept as a
//! plain parent map rather than a type hierarchy so the lattice operations
//! stay total: a kind nobody declared hangs directly off the root.

use crate::errors::{EffectgraphError, Result};
use crate::shared::models::{Category, Kind, KindDecl, Program};
use once_cell::sync::Lazy;
use rustc_hash::{FxHashMap, FxHashSet};

/// Root of the exception hierarchy
pub const EXCEPTION_ROOT: &str = "Exception";

/// Root of the tag hierarchy
pub const TAG_ROOT: &str = "RootEffect";

/// Built-in exception kinds (name, parent, tracked)
static BUILTIN_EXCEPTIONS: Lazy<Vec<KindDecl>> = Lazy::new(|| {
    vec![
        KindDecl::new("CatchableError", None),
        KindDecl::new("Defect", None).untracked(),
        KindDecl::new("IOError", Some("CatchableError")),
        KindDecl::new("EOFError", Some("IOError")),
        KindDecl::new("OSError", Some("CatchableError")),
        KindDecl::new("ValueError", Some("CatchableError")),
        KindDecl::new("KeyError", Some("ValueError")),
        KindDecl::new("ResourceExhaustedError", Some("CatchableError")),
        KindDecl::new("AssertionDefect", Some("Defect")),
        KindDecl::new("IndexDefect", Some("Defect")),
        KindDecl::new("OverflowDefect", Some("Defect")),
    ]
});

/// Built-in tag kinds
static BUILTIN_TAGS: Lazy<Vec<KindDecl>> = Lazy::new(|| {
    vec![
        KindDecl::new("IOEffect", None),
        KindDecl::new("ReadIOEffect", Some("IOEffect")),
        KindDecl::new("WriteIOEffect", Some("IOEffect")),
        KindDecl::new("ExecIOEffect", Some("IOEffect")),
        KindDecl::new("ReadDirEffect", Some("ReadIOEffect")),
        KindDecl::new("WriteDirEffect", Some("WriteIOEffect")),
        KindDecl::new("ReadEnvEffect", None),
        KindDecl::new("WriteEnvEffect", None),
        KindDecl::new("TimeEffect", None),
    ]
});

/// Options controlling how a hierarchy treats unusual kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HierarchyOptions {
    /// Undeclared kinds are an error instead of an implicit child of the root
    pub strict_kinds: bool,
    /// Track kinds declared `tracked: false` like any other kind
    pub track_defects: bool,
}

/// Kind hierarchy of one category
#[derive(Debug, Clone)]
pub struct KindHierarchy {
    category: Category,
    root: Kind,
    parents: FxHashMap<Kind, Kind>,
    untracked: FxHashSet<Kind>,
    options: HierarchyOptions,
}

impl KindHierarchy {
    /// Hierarchy containing only the root
    pub fn new(category: Category, root: impl Into<Kind>) -> Self {
        Self {
            category,
            root: root.into(),
            parents: FxHashMap::default(),
            untracked: FxHashSet::default(),
            options: HierarchyOptions::default(),
        }
    }

    /// Built-in base hierarchy for the category
    pub fn builtin(category: Category) -> Self {
        let (root, decls) = match category {
            Category::Raises => (EXCEPTION_ROOT, &*BUILTIN_EXCEPTIONS),
            Category::Tags => (TAG_ROOT, &*BUILTIN_TAGS),
        };
        let mut hierarchy = Self::new(category, root);
        for decl in decls {
            hierarchy.insert(decl);
        }
        hierarchy
    }

    pub fn with_options(mut self, options: HierarchyOptions) -> Self {
        self.options = options;
        self
    }

    /// Add declarations, then check parents and cycles
    ///
    /// Declarations may reference parents declared later in the list.
    pub fn extend(&mut self, decls: &[KindDecl]) -> Result<()> {
        for decl in decls {
            if decl.name == self.root {
                continue;
            }
            self.insert(decl);
        }

        for decl in decls {
            if let Some(parent) = &decl.parent {
                if self.options.strict_kinds && !self.contains(parent) {
                    return Err(EffectgraphError::UnknownKind {
                        kind: parent.clone(),
                        category: self.category,
                        context: format!("parent of {}", decl.name),
                    });
                }
            }
        }

        self.check_acyclic()
    }

    fn insert(&mut self, decl: &KindDecl) {
        let parent = decl.parent.clone().unwrap_or_else(|| self.root.clone());
        if parent != decl.name {
            self.parents.insert(decl.name.clone(), parent);
        }
        if decl.tracked {
            self.untracked.remove(&decl.name);
        } else {
            self.untracked.insert(decl.name.clone());
        }
    }

    fn check_acyclic(&self) -> Result<()> {
        let limit = self.parents.len() + 1;
        let mut names: Vec<&Kind> = self.parents.keys().collect();
        names.sort();
        for start in names {
            let mut current = start;
            let mut steps = 0;
            while let Some(parent) = self.parents.get(current) {
                steps += 1;
                if steps > limit {
                    return Err(EffectgraphError::KindCycle {
                        kind: start.clone(),
                        category: self.category,
                    });
                }
                current = parent;
            }
        }
        Ok(())
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn root(&self) -> &Kind {
        &self.root
    }

    pub fn is_root(&self, kind: &Kind) -> bool {
        kind == &self.root
    }

    /// Declared (or built-in) kind, including the root
    pub fn contains(&self, kind: &Kind) -> bool {
        self.is_root(kind) || self.parents.contains_key(kind)
    }

    /// True iff `kind` is `by`, a descendant of `by`, or `by` is the root
    pub fn is_covered_by(&self, kind: &Kind, by: &Kind) -> bool {
        if self.is_root(by) {
            return true;
        }
        let mut current = kind;
        let mut steps = 0;
        loop {
            if current == by {
                return true;
            }
            match self.parents.get(current) {
                Some(parent) if steps <= self.parents.len() => {
                    current = parent;
                    steps += 1;
                }
                _ => return false,
            }
        }
    }

    /// Untracked kinds (and their descendants) never enter an effect set
    pub fn is_tracked(&self, kind: &Kind) -> bool {
        if self.options.track_defects || self.untracked.is_empty() {
            return true;
        }
        let mut current = kind;
        let mut steps = 0;
        loop {
            if self.untracked.contains(current) {
                return false;
            }
            match self.parents.get(current) {
                Some(parent) if steps <= self.parents.len() => {
                    current = parent;
                    steps += 1;
                }
                _ => return true,
            }
        }
    }

    /// Check a kind mentioned by the program (strict kinds only)
    pub fn check_kind(&self, kind: &Kind, context: &str) -> Result<()> {
        if self.options.strict_kinds && !self.contains(kind) {
            return Err(EffectgraphError::UnknownKind {
                kind: kind.clone(),
                category: self.category,
                context: context.to_string(),
            });
        }
        Ok(())
    }

    /// Number of known kinds including the root
    pub fn len(&self) -> usize {
        self.parents.len() + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Upper bound on how often a set can grow before reaching `Unknown`
    pub fn lattice_height(&self) -> usize {
        self.len() + 1
    }
}

/// Both category hierarchies of one compilation unit
#[derive(Debug, Clone)]
pub struct Hierarchies {
    raises: KindHierarchy,
    tags: KindHierarchy,
}

impl Hierarchies {
    pub fn builtin() -> Self {
        Self {
            raises: KindHierarchy::builtin(Category::Raises),
            tags: KindHierarchy::builtin(Category::Tags),
        }
    }

    /// Built-in hierarchies extended with the program's declarations
    pub fn from_program(program: &Program, options: HierarchyOptions) -> Result<Self> {
        let mut raises = KindHierarchy::builtin(Category::Raises).with_options(options);
        raises.extend(&program.exception_kinds)?;

        let mut tags = KindHierarchy::builtin(Category::Tags).with_options(options);
        tags.extend(&program.tag_kinds)?;

        Ok(Self { raises, tags })
    }

    pub fn get(&self, category: Category) -> &KindHierarchy {
        match category {
            Category::Raises => &self.raises,
            Category::Tags => &self.tags,
        }
    }

    /// Sum of both lattice heights
    pub fn lattice_height(&self) -> usize {
        self.raises.lattice_height() + self.tags.lattice_height()
    }
}

impl Default for Hierarchies {
    fn default() -> Self {
        Self::builtin()
    }
}
