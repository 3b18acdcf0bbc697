//! Program loading
//!
//! The front end hands over one `Program` per compilation unit, serialized as
//! JSON or YAML. The format follows the file extension; anything other than
//! `.yaml`/`.yml` is read as JSON.

use crate::errors::{EffectgraphError, Result};
use crate::shared::models::Program;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramFormat {
    Json,
    Yaml,
}

impl ProgramFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => ProgramFormat::Yaml,
            _ => ProgramFormat::Json,
        }
    }
}

pub fn parse_program(content: &str, format: ProgramFormat) -> Result<Program> {
    let program: Program = match format {
        ProgramFormat::Json => serde_json::from_str(content)?,
        ProgramFormat::Yaml => serde_yaml::from_str(content)?,
    };
    if program.unit.trim().is_empty() {
        return Err(EffectgraphError::program("unit name is empty"));
    }
    Ok(program)
}

pub fn load_program(path: impl AsRef<Path>) -> Result<Program> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let program = parse_program(&content, ProgramFormat::from_path(path))?;
    tracing::debug!(
        path = %path.display(),
        unit = %program.unit,
        routines = program.routines.len(),
        "program loaded"
    );
    Ok(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::models::{RoutineId, Stmt};
    use std::io::Write;
    use tempfile::Builder;

    const YAML: &str = r#"
unit: streams
tag_kinds:
  - name: IO
routines:
  - id: readLine
    effects:
      tags: [IO]
  - id: noIoPlease
    effects:
      tags: []
    body:
      - stmt: expr
        expr:
          expr: call
          callee:
            routine: readLine
"#;

    #[test]
    fn test_parse_yaml_program() {
        let program = parse_program(YAML, ProgramFormat::Yaml).unwrap();
        assert_eq!(program.unit, "streams");
        assert_eq!(program.tag_kinds.len(), 1);
        let caller = program.routine(&RoutineId::from("noIoPlease")).unwrap();
        assert!(matches!(
            caller.body.as_deref(),
            Some([Stmt::Expr { .. }])
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ProgramFormat::from_path(Path::new("a.yml")), ProgramFormat::Yaml);
        assert_eq!(ProgramFormat::from_path(Path::new("a.yaml")), ProgramFormat::Yaml);
        assert_eq!(ProgramFormat::from_path(Path::new("a.json")), ProgramFormat::Json);
        assert_eq!(ProgramFormat::from_path(Path::new("a")), ProgramFormat::Json);
    }

    #[test]
    fn test_load_json_file() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"unit": "m", "routines": [{{"id": "p"}}]}}"#).unwrap();
        let program = load_program(file.path()).unwrap();
        assert_eq!(program.routines.len(), 1);
        assert!(program.routines[0].body.is_none());
    }

    #[test]
    fn test_empty_unit_rejected() {
        let err = parse_program(r#"{"unit": " "}"#, ProgramFormat::Json).unwrap_err();
        assert!(matches!(err, EffectgraphError::Program(_)));
    }
}
