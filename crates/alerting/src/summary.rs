//! Alert digest of recent failures

use failure_store::FailureEvent;

/// Default number of failures listed in an alert
pub const DEFAULT_MAX_ERRORS: usize = 5;

/// Shown in place of an absent classification field
pub const PLACEHOLDER: &str = "N/A";

/// One line per event for the `max_errors` most recent events, oldest first.
///
/// Older events are left out of the digest even though they counted toward the threshold.
pub fn render(events: &[FailureEvent], max_errors: usize) -> Vec<String> {
    let skip = events.len().saturating_sub(max_errors);
    events[skip..].iter().map(summarize).collect()
}

/// `"<class> (code: <code>, provider: <provider>)"`
pub fn summarize(event: &FailureEvent) -> String {
    format!(
        "{} (code: {}, provider: {})",
        event.error_class().unwrap_or(PLACEHOLDER),
        event.error_code().unwrap_or(PLACEHOLDER),
        event.error_provider().unwrap_or(PLACEHOLDER),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use failure_store::IdentityFields;
    use proptest::prelude::*;

    fn event(class: Option<&str>, code: Option<&str>, provider: Option<&str>) -> FailureEvent {
        FailureEvent::new(
            Utc::now(),
            class.map(str::to_string),
            code.map(str::to_string),
            provider.map(str::to_string),
            IdentityFields::default(),
        )
    }

    #[test]
    fn test_summary_line() {
        let line = summarize(&event(Some("ValueError"), Some("500"), Some("openai")));
        assert_eq!(line, "ValueError (code: 500, provider: openai)");
    }

    #[test]
    fn test_absent_fields_use_placeholder() {
        assert_eq!(summarize(&event(None, None, None)), "N/A (code: N/A, provider: N/A)");
        assert_eq!(
            summarize(&event(Some("RateLimitError"), None, Some("anthropic"))),
            "RateLimitError (code: N/A, provider: anthropic)"
        );
    }

    #[test]
    fn test_keeps_most_recent() {
        let events: Vec<_> = (0..8)
            .map(|i| event(Some(&format!("E{}", i)), None, None))
            .collect();

        let lines = render(&events, DEFAULT_MAX_ERRORS);

        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("E3 "));
        assert!(lines[4].starts_with("E7 "));
    }

    #[test]
    fn test_fewer_events_than_limit() {
        let events = vec![event(Some("A"), None, None)];
        assert_eq!(render(&events, DEFAULT_MAX_ERRORS).len(), 1);
        assert!(render(&[], DEFAULT_MAX_ERRORS).is_empty());
    }

    proptest! {
        #[test]
        fn prop_render_is_bounded(count in 0usize..40, max in 0usize..10) {
            let events: Vec<_> = (0..count)
                .map(|i| event(Some(&i.to_string()), None, None))
                .collect();

            let lines = render(&events, max);

            prop_assert_eq!(lines.len(), count.min(max));
            if let Some(last) = lines.last() {
                let expected = format!("{} (code: N/A, provider: N/A)", count - 1);
                prop_assert_eq!(last, &expected);
            }
        }
    }
}
