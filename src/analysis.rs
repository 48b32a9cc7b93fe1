//! Structural outline of generated Python scripts
//!
//! Line-and-indent scanning, deliberately not a real parser: it only has
//! to support naming saved scripts and summarizing what a run produced.
//! Every `def` at any depth is listed, so nested functions show up both
//! inside their parent's source and as entries of their own.

use serde::Serialize;

/// One function found in a script
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    /// The `def` line as written, indentation included
    pub header: String,
    /// Parameter names, annotations and defaults stripped
    pub params: Vec<String>,
    /// Trimmed `return` statement lines inside the body
    pub returns: Vec<String>,
    /// Full source of the function, signature through body
    pub source: String,
}

/// List every function definition in the script
pub fn outline(source: &str) -> Vec<FunctionInfo> {
    let lines: Vec<&str> = source.lines().collect();
    let mut functions = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if !is_def_line(trimmed) {
            continue;
        }
        let Some(name) = function_name(trimmed) else {
            continue;
        };
        let indent = line.len() - trimmed.len();

        // The signature may span lines; it ends at the colon line
        let mut signature = String::new();
        let mut sig_end = i;
        for (j, sig_line) in lines.iter().enumerate().skip(i) {
            if !signature.is_empty() {
                signature.push(' ');
            }
            signature.push_str(sig_line.trim());
            sig_end = j;
            if sig_line.trim_end().ends_with(':') {
                break;
            }
        }

        // Body runs until the next non-blank line at or left of the def
        let mut end = lines.len();
        for (j, body_line) in lines.iter().enumerate().skip(sig_end + 1) {
            if body_line.trim().is_empty() {
                continue;
            }
            let body_indent = body_line.len() - body_line.trim_start().len();
            if body_indent <= indent {
                end = j;
                break;
            }
        }

        let mut func_lines: Vec<&str> = lines[i..end].to_vec();
        while matches!(func_lines.last(), Some(l) if l.trim().is_empty()) {
            func_lines.pop();
        }

        let returns = func_lines
            .iter()
            .skip(sig_end - i + 1)
            .map(|l| l.trim())
            .filter(|l| is_return_line(l))
            .map(|l| l.to_string())
            .collect();

        functions.push(FunctionInfo {
            name,
            header: (*line).to_string(),
            params: parse_params(&signature),
            returns,
            source: func_lines.join("\n"),
        });
    }

    functions
}

/// Split a script into its top-level-to-nested function sources
pub fn split_functions(source: &str) -> Vec<String> {
    outline(source).into_iter().map(|f| f.source).collect()
}

/// Name of the first function defined in the script, if any
pub fn first_function_name(source: &str) -> Option<String> {
    outline(source).into_iter().next().map(|f| f.name)
}

fn is_def_line(trimmed: &str) -> bool {
    trimmed.starts_with("def ") || trimmed.starts_with("async def ")
}

fn function_name(def_line: &str) -> Option<String> {
    let rest = def_line.strip_prefix("async ").unwrap_or(def_line);
    let rest = rest.strip_prefix("def ")?;
    let end = rest
        .find(|c: char| c == '(' || c == ':' || c.is_whitespace())
        .unwrap_or(rest.len());
    let name = rest[..end].trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn is_return_line(trimmed: &str) -> bool {
    match trimmed.strip_prefix("return") {
        Some(rest) => rest.is_empty() || rest.starts_with(' ') || rest.starts_with('('),
        None => false,
    }
}

fn parse_params(signature: &str) -> Vec<String> {
    let Some(open) = signature.find('(') else {
        return Vec::new();
    };
    let inner = &signature[open + 1..];

    let mut depth = 1;
    let mut close = inner.len();
    for (idx, c) in inner.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    close = idx;
                    break;
                }
            }
            _ => {}
        }
    }
    let inner = &inner[..close];

    let mut params = Vec::new();
    let mut depth = 0;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' | '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                push_param(&mut params, &current);
                current.clear();
            }
            _ => current.push(c),
        }
    }
    push_param(&mut params, &current);
    params
}

fn push_param(params: &mut Vec<String>, raw: &str) {
    let stripped = raw.trim().trim_start_matches('*');
    let end = stripped.find([':', '=']).unwrap_or(stripped.len());
    let name = stripped[..end].trim();
    if !name.is_empty() && name != "/" {
        params.push(name.to_string());
    }
}
