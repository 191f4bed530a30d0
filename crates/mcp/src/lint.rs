//! Checks that a tool description follows the house layout.
//!
//! Problems are reported, never enforced: a tool with a thin description
//! still registers.

use crate::protocol::ToolSchema;

const MIN_SUMMARY_LEN: usize = 10;
const MIN_LINES: usize = 3;
const SECTIONS: &[&str] = &["Format requirements:", "Example:", "Args:", "Returns:"];

/// Every problem found in `schema.description`, as human readable warnings.
pub fn lint_description(schema: &ToolSchema) -> Vec<String> {
    let name = &schema.name;
    let description = schema.description.trim();
    if description.is_empty() {
        return vec![format!("Tool '{name}' has no description")];
    }

    let mut warnings = Vec::new();
    let lines: Vec<&str> = description.lines().collect();

    if lines.first().map_or(0, |l| l.trim().len()) < MIN_SUMMARY_LEN {
        warnings.push(format!("Tool '{name}' is missing a clear one-line summary"));
    }
    if lines.len() < MIN_LINES {
        warnings.push(format!("Tool '{name}' is missing a detailed description"));
    }

    for section in SECTIONS {
        let present = lines
            .iter()
            .any(|line| line.trim().eq_ignore_ascii_case(section));
        if !present {
            warnings.push(format!("Tool '{name}' is missing '{section}' section"));
        }
    }

    if let Some(properties) = schema
        .input_schema
        .get("properties")
        .and_then(|p| p.as_object())
    {
        for param in properties.keys() {
            if !documents_param(&lines, param) {
                warnings.push(format!(
                    "Parameter '{param}' is not documented in the description"
                ));
            }
        }
    }

    warnings
}

/// A parameter counts as documented when some line starts with `param:`.
fn documents_param(lines: &[&str], param: &str) -> bool {
    lines.iter().any(|line| {
        line.trim_start()
            .strip_prefix(param)
            .is_some_and(|rest| rest.starts_with(':'))
    })
}
