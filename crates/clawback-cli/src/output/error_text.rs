use clawback_client::ClientError;
use serde_json::Value;

const MAX_ISSUE_LINES: usize = 10;

pub fn render_error(error: &ClientError) -> String {
    let headline = if error.is_internal() {
        "Clawback could not use its ledger store."
    } else {
        "Something went wrong, but it's easy to fix."
    };
    let mut lines = vec![
        headline.to_string(),
        String::new(),
        format!("  Error:    {}", error.code),
        format!("  Details:  {}", error.message),
    ];

    let issues = render_issues(error.data.as_ref());
    if !issues.is_empty() {
        lines.push(String::new());
        lines.push("Rows to fix:".to_string());
        lines.extend(issues);
    }

    lines.push(String::new());
    lines.push("What to do next:".to_string());
    if error.recovery_steps.is_empty() {
        lines.push("  1. Retry the command.".to_string());
    } else {
        for (index, step) in error.recovery_steps.iter().enumerate() {
            lines.push(format!("  {}. {step}", index + 1));
        }
    }

    lines.join("\n")
}

fn render_issues(data: Option<&Value>) -> Vec<String> {
    let Some(issues) = data
        .and_then(|value| value.get("issues"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    let mut lines = issues
        .iter()
        .take(MAX_ISSUE_LINES)
        .map(|issue| {
            let row = issue.get("row").and_then(Value::as_i64).unwrap_or(0);
            let field = issue.get("field").and_then(Value::as_str).unwrap_or("?");
            let description = issue
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("invalid value");
            format!("  row {row}, {field}: {description}")
        })
        .collect::<Vec<String>>();

    if issues.len() > MAX_ISSUE_LINES {
        lines.push(format!(
            "  ... and {} more (use --json for the full list)",
            issues.len() - MAX_ISSUE_LINES
        ));
    }
    lines
}
