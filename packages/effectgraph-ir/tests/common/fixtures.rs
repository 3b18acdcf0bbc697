//! Program fixtures

use super::builders::RoutineBuilder;
use effectgraph_ir::shared::models::{
    Expr, KindDecl, Param, ProcType, Program, Stmt,
};

/// `doRaise` {IOError}, `noRaise(x: proc)` {} calling `x()`, `use` {}
/// passing `doRaise` as a value, `main` calling `noRaise(doRaise)`
pub fn scenario_proc_params() -> Program {
    Program::new("scenario_a")
        .with_routine(
            RoutineBuilder::new("doRaise")
                .raises(&["IOError"])
                .stmt(Stmt::raise("IOError"))
                .build(),
        )
        .with_routine(
            RoutineBuilder::new("noRaise")
                .raises(&[])
                .proc_param("x", ProcType::unconstrained())
                .stmt(Stmt::expr(Expr::call_binding("x", vec![])))
                .build(),
        )
        .with_routine(
            RoutineBuilder::new("use")
                .raises(&[])
                .stmt(Stmt::let_value("stored", None, Expr::routine("doRaise")))
                .build(),
        )
        .with_routine(
            RoutineBuilder::new("main")
                .stmt(Stmt::expr(Expr::call(
                    "noRaise",
                    vec![Expr::routine("doRaise")],
                )))
                .build(),
        )
}

/// Tag `IO`, `readLine` {IO}, `noIoPlease` declared to produce no tag
pub fn scenario_tags() -> Program {
    Program::new("scenario_b")
        .with_tag_kind(KindDecl::new("IO", None))
        .with_routine(RoutineBuilder::new("readLine").tags(&["IO"]).build())
        .with_routine(
            RoutineBuilder::new("noIoPlease")
                .tags(&[])
                .stmt(Stmt::call("readLine"))
                .build(),
        )
}

/// `p(what)`: IOError in the `if` branch with a marker after it, OSError in `else`
pub fn scenario_branch_marker() -> Program {
    let mut p = RoutineBuilder::new("p").build();
    p.params.push(Param::value("what"));
    p.body = Some(vec![Stmt::if_else(
        Expr::local("what"),
        vec![Stmt::raise("IOError"), Stmt::labeled_marker("in_if")],
        Some(vec![Stmt::raise("OSError")]),
    )]);
    Program::new("scenario_c").with_routine(p)
}

/// `r0 -> r1 -> ... -> r{n-1}`, the last one raising `kind`
pub fn chain(n: usize, kind: &str) -> Program {
    let mut program = Program::new(format!("chain_{n}"));
    for i in 0..n {
        let builder = RoutineBuilder::new(&format!("r{i}"));
        let builder = if i + 1 < n {
            builder.stmt(Stmt::call(&format!("r{}", i + 1)))
        } else {
            builder.stmt(Stmt::raise(kind))
        };
        program = program.with_routine(builder.build());
    }
    program
}

/// `r0 -> r1 -> ... -> r{n-1} -> r0`, routine `ri` raising `kinds[i % len]`
pub fn cycle(n: usize, kinds: &[&str]) -> Program {
    let mut program = Program::new(format!("cycle_{n}"));
    for i in 0..n {
        let mut builder =
            RoutineBuilder::new(&format!("r{i}")).stmt(Stmt::call(&format!("r{}", (i + 1) % n)));
        if !kinds.is_empty() {
            builder = builder.stmt(Stmt::raise(kinds[i % kinds.len()]));
        }
        program = program.with_routine(builder.build());
    }
    program
}

/// Scenario B as a front-end YAML dump
pub const SCENARIO_TAGS_YAML: &str = r#"
unit: streams
tag_kinds:
  - name: IO
routines:
  - id: readLine
    effects:
      tags: [IO]
    body: []
  - id: noIoPlease
    effects:
      tags: []
    span: { start_line: 7, start_col: 1, end_line: 9, end_col: 1 }
    body:
      - stmt: expr
        expr:
          expr: call
          callee:
            routine: readLine
"#;
