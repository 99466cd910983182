//! `{{ variable }}` substitution for issued documents.

use std::collections::HashMap;

use crate::error::{HrError, HrResult};

/// Replace every `{{ name }}` placeholder in `content`.
///
/// Each variable in `declared` must have a value. Placeholders that are
/// neither declared nor supplied are left as they are.
pub fn render_template(
    content: &str,
    declared: &[String],
    values: &HashMap<String, String>,
) -> HrResult<String> {
    if let Some(missing) = declared.iter().find(|name| !values.contains_key(name.as_str())) {
        return Err(HrError::MissingTemplateVariable(missing.clone()));
    }

    let mut out = String::with_capacity(content.len());
    let mut rest = content;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        let name = rest[open + 2..open + 2 + close].trim();
        out.push_str(&rest[..open]);
        match values.get(name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &rest[open + 2 + close + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn placeholders_are_substituted() {
        let rendered = render_template(
            "This certifies that {{employee_name}} ({{ employee_id }}) works in {{department}}.",
            &["employee_name".into(), "employee_id".into()],
            &values(&[
                ("employee_name", "Kim Jisoo"),
                ("employee_id", "E-001"),
                ("department", "Finance"),
            ]),
        )
        .unwrap();
        assert_eq!(
            rendered,
            "This certifies that Kim Jisoo (E-001) works in Finance."
        );
    }

    #[test]
    fn declared_variables_must_have_values() {
        let err = render_template("{{purpose}}", &["purpose".into()], &HashMap::new()).unwrap_err();
        assert_eq!(err, HrError::MissingTemplateVariable("purpose".into()));
    }

    #[test]
    fn unknown_and_unclosed_placeholders_survive() {
        let rendered =
            render_template("{{ unknown }} and {{ open", &[], &values(&[("x", "y")])).unwrap();
        assert_eq!(rendered, "{{ unknown }} and {{ open");
    }
}
