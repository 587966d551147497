use ariadne::{Color, Label, Report, ReportKind, Source};
use tributary::TributaryError;

/// Format a TributaryError for the terminal, with a source excerpt for parse errors
pub fn format_error(error: &TributaryError) -> String {
    match error {
        TributaryError::Parse(details) => {
            let mut output = Vec::new();

            let message = format!(
                "Parse error: {} (at {}:{}:{})",
                details.message, details.source_id, details.span.line, details.span.col
            );
            let end = details.span.end.max(details.span.start + 1);

            let mut report =
                Report::build(ReportKind::Error, &details.source_id, details.span.start)
                    .with_message(message)
                    .with_label(
                        Label::new((&details.source_id, details.span.start..end))
                            .with_message("")
                            .with_color(Color::Red),
                    );

            if let Some(suggestion) = &details.suggestion {
                report = report.with_help(suggestion);
            }

            match report.finish().write(
                (
                    &details.source_id,
                    Source::from(details.source_text.as_ref()),
                ),
                &mut output,
            ) {
                Ok(_) => String::from_utf8_lossy(&output).to_string(),
                Err(_) => format!("{}", error),
            }
        }
        TributaryError::ResourceLimitExceeded {
            limit_name,
            limit_value,
            actual_value,
            suggestion,
        } => {
            format!(
                "Resource limit exceeded: {}\n  Limit: {}\n  Actual: {}\n  {}",
                limit_name, limit_value, actual_value, suggestion
            )
        }
        other => format!("Error: {}", other),
    }
}
