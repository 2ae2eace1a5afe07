//! Building the end-of-run notification from the run log.

use cloud_client::PushMessage;

use crate::capacity::CapacityReport;
use crate::log::RunLog;

pub const TITLE_SEPARATOR: &str = " ☁ ";

/// Line `index` of `text`, trimmed. Out-of-range indices yield `""`.
pub fn line_at(text: &str, index: isize) -> &str {
    usize::try_from(index)
        .ok()
        .and_then(|i| text.split('\n').nth(i))
        .map(str::trim)
        .unwrap_or("")
}

/// Characters `[start, end)` of `s`, clamped to its length.
pub fn char_slice(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end.saturating_sub(start)).collect()
}

/// The last `n` characters of `s`, or all of it when shorter.
pub fn last_chars(s: &str, n: usize) -> String {
    let len = s.chars().count();
    s.chars().skip(len.saturating_sub(n)).collect()
}

/// Title scraped from fixed positions near the end of the log.
///
/// With the capacity report block closing the log, line `n-6` is the
/// account header and line `n-3` the capacity change line. Short or missing
/// lines give empty fragments.
pub fn title_from_log(text: &str) -> String {
    let n = text.split('\n').count() as isize;
    let head = char_slice(line_at(text, n - 6), 10, 14);
    let tail = last_chars(line_at(text, n - 3), 9);
    format!("{head}{TITLE_SEPARATOR}{tail}")
}

/// Title built from one primary account's capacity report.
pub fn title_from_report(report: &CapacityReport) -> String {
    format!(
        "{}{TITLE_SEPARATOR}personal {:+}M, family {:+}M",
        last_chars(&report.account, 4),
        report.personal_delta_mib(),
        report.family_delta_mib()
    )
}

/// Assemble the notification: the last capacity report drives the title when
/// there is one, otherwise the title is scraped from the log tail. The body
/// is the log text followed by the rendered event replay.
pub fn build_notification(log: &RunLog, reports: &[CapacityReport]) -> PushMessage {
    let text = log.read_all();
    let title = reports
        .last()
        .map(title_from_report)
        .unwrap_or_else(|| title_from_log(&text));
    let body = text + &log.render_replay();
    PushMessage { title, body }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capacity::CapacitySnapshot;

    #[test]
    fn line_at_handles_bounds_and_crlf() {
        let text = "a\r\n  b  \nc";
        assert_eq!(line_at(text, 0), "a");
        assert_eq!(line_at(text, 1), "b");
        assert_eq!(line_at(text, 3), "");
        assert_eq!(line_at(text, -1), "");
    }

    #[test]
    fn slices_count_characters_not_bytes() {
        assert_eq!(char_slice("账号 138****5678:", 10, 14), "5678");
        assert_eq!(char_slice("short", 10, 14), "");
        assert_eq!(char_slice("abcdefghijkl", 10, 14), "kl");
        assert_eq!(
            last_chars("个人总容量增加：10M,家庭容量增加：0M", 9),
            "家庭容量增加：0M"
        );
        assert_eq!(last_chars("ab", 9), "ab");
    }

    #[test]
    fn positional_title_from_report_block() {
        let text = "1. 账号 138****5678\n\
                    账号 138****5678:\n\
                    前 个人：1.000G, 家庭：2.000G\n\
                    后 个人：1.010G, 家庭：2.000G\n\
                    个人总容量增加：10M,家庭容量增加：0M\n \n";
        assert_eq!(
            title_from_log(text),
            format!("5678{TITLE_SEPARATOR}家庭容量增加：0M")
        );
    }

    #[test]
    fn positional_title_never_fails_on_short_logs() {
        assert_eq!(title_from_log(""), TITLE_SEPARATOR);
        assert_eq!(title_from_log("one line\n"), TITLE_SEPARATOR);
        let text = "x\ny\nz\nabc\n \n";
        assert_eq!(title_from_log(text), format!("{TITLE_SEPARATOR}abc"));
    }

    #[test]
    fn report_title_shows_signed_deltas() {
        let report = CapacityReport::new(
            "138****5678",
            CapacitySnapshot {
                personal_total_bytes: 0,
                family_total_bytes: 5 << 20,
            },
            CapacitySnapshot {
                personal_total_bytes: 10 << 20,
                family_total_bytes: 0,
            },
        );
        assert_eq!(
            title_from_report(&report),
            format!("5678{TITLE_SEPARATOR}personal +10M, family -5M")
        );
    }

    #[test]
    fn notification_body_is_log_then_replay() {
        let log = RunLog::new();
        let logger = log.logger("acct");
        logger.log("first");
        logger.info("second");

        let payload = build_notification(&log, &[]);
        assert_eq!(payload.body, "first\nsecond\nfirst  \nsecond");
        assert_eq!(payload.title, format!("{TITLE_SEPARATOR}first"));
    }

    #[test]
    fn title_names_the_last_reported_account() {
        let log = RunLog::new();
        let grown = CapacitySnapshot {
            personal_total_bytes: 3 << 20,
            family_total_bytes: 0,
        };
        let reports = [
            CapacityReport::new("138****1111", Default::default(), Default::default()),
            CapacityReport::new("139****2222", Default::default(), grown),
        ];

        let payload = build_notification(&log, &reports);
        assert_eq!(
            payload.title,
            format!("2222{TITLE_SEPARATOR}personal +3M, family +0M")
        );
    }

    #[test]
    fn structured_report_takes_precedence_over_scraping() {
        let log = RunLog::new();
        log.logger("acct").log("unrelated");
        let report = CapacityReport::new("abcd", Default::default(), Default::default());

        let payload = build_notification(&log, &[report]);
        assert_eq!(
            payload.title,
            format!("abcd{TITLE_SEPARATOR}personal +0M, family +0M")
        );
    }
}
