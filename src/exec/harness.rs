//! Interpreter harness and its wire envelope
//!
//! The candidate script never runs inside this process. A small Python
//! harness is started as `python -c <HARNESS_SOURCE>`, receives a JSON
//! request on stdin, runs the script in a fresh namespace, and writes a
//! single-line JSON report to stdout. The harness catches BaseException so
//! even `sys.exit()` inside a script comes back as a report instead of
//! taking down the run.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Python program executed with `-c`. Protocol:
/// stdin:  {"source": str, "context": {name: value}, "export_variables": bool}
/// stdout: {"is_error": bool, "returned_value": any, "captured_output": str,
///          "error_message": str, "variables": {name: value}}
///
/// Expression sources are compiled in eval mode first so their value comes
/// back; anything else falls back to exec. Printed output is captured via a
/// StringIO swap and the real stdout is restored before the report is
/// written, so scripts cannot corrupt the report line by printing.
pub(crate) const HARNESS_SOURCE: &str = r##"
import io
import json
import sys
import types


def _jsonable(value):
    if value is None:
        return None
    try:
        json.dumps(value, allow_nan=False)
        return value
    except (TypeError, ValueError):
        return repr(value)


def _exportable(namespace):
    exported = {}
    for name, value in namespace.items():
        if name.startswith("_"):
            continue
        if isinstance(value, types.ModuleType):
            continue
        try:
            json.dumps(value, allow_nan=False)
        except (TypeError, ValueError):
            continue
        exported[name] = value
    return exported


def _main():
    request = json.loads(sys.stdin.read())
    source = request.get("source", "")
    namespace = dict(request.get("context") or {})
    export = bool(request.get("export_variables"))

    report = {
        "is_error": False,
        "returned_value": None,
        "captured_output": "",
        "error_message": "",
        "variables": {},
    }

    real_stdout = sys.stdout
    captured = io.StringIO()
    sys.stdout = captured
    try:
        try:
            code = compile(source, "<script>", "eval")
        except SyntaxError:
            code = None
        if code is not None:
            report["returned_value"] = _jsonable(eval(code, namespace))
        else:
            exec(compile(source, "<script>", "exec"), namespace)
    except BaseException as exc:
        detail = str(exc)
        kind = type(exc).__name__
        report["is_error"] = True
        report["error_message"] = kind + ": " + detail if detail else kind
    finally:
        sys.stdout = real_stdout

    if not report["is_error"]:
        report["captured_output"] = captured.getvalue().strip()
        if export:
            report["variables"] = _exportable(namespace)

    json.dump(report, sys.stdout)
    sys.stdout.write("\n")


_main()
"##;

/// Request written to the harness on stdin
#[derive(Debug, Serialize)]
pub(crate) struct HarnessRequest<'a> {
    pub source: &'a str,
    pub context: &'a Map<String, Value>,
    pub export_variables: bool,
}

/// Report read back from the harness stdout
#[derive(Debug, Deserialize)]
pub(crate) struct HarnessReport {
    pub is_error: bool,
    #[serde(default)]
    pub returned_value: Option<Value>,
    #[serde(default)]
    pub captured_output: String,
    #[serde(default)]
    pub error_message: String,
    #[serde(default)]
    pub variables: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serialization() {
        let mut context = Map::new();
        context.insert("n".to_string(), json!(10));

        let request = HarnessRequest {
            source: "print(n)",
            context: &context,
            export_variables: true,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["source"], json!("print(n)"));
        assert_eq!(value["context"]["n"], json!(10));
        assert_eq!(value["export_variables"], json!(true));
    }

    #[test]
    fn test_report_deserialization() {
        let report: HarnessReport = serde_json::from_str(
            r#"{"is_error":false,"returned_value":4,"captured_output":"","error_message":"","variables":{"x":1}}"#,
        )
        .unwrap();

        assert!(!report.is_error);
        assert_eq!(report.returned_value, Some(json!(4)));
        assert_eq!(report.variables.get("x"), Some(&json!(1)));
    }

    #[test]
    fn test_report_missing_fields_default() {
        let report: HarnessReport = serde_json::from_str(r#"{"is_error":true}"#).unwrap();
        assert!(report.is_error);
        assert!(report.returned_value.is_none());
        assert!(report.captured_output.is_empty());
        assert!(report.variables.is_empty());
    }

    #[test]
    fn test_harness_source_shape() {
        // The harness must read stdin, catch everything, and emit one report
        assert!(HARNESS_SOURCE.contains("sys.stdin.read()"));
        assert!(HARNESS_SOURCE.contains("BaseException"));
        assert!(HARNESS_SOURCE.contains("export_variables"));
        assert!(HARNESS_SOURCE.contains("json.dump(report, sys.stdout)"));
    }
}
