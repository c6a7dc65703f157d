// Copyright (c) The gotest-bridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{FileLocation, TestAction, TestEvent};
use crate::{
    identity::{RuntimeId, RuntimeIdentity},
    styles::OutputStyles,
};
use gotest_bridge_metadata::TestStatus;
use indexmap::IndexMap;
use serde::Serialize;
use std::{collections::BTreeMap, io, io::BufRead};
use tracing::{debug, warn};

/// Removes newlines and tabs from a raw output string.
pub fn sanitize_output(raw: &str) -> String {
    raw.replace(['\n', '\t'], "")
}

/// Accumulated state for a single test or subtest.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct AggregatedTest {
    /// The last terminal status seen, if any.
    pub status: Option<TestStatus>,

    /// Sanitized and decorated output, including output fanned out from subtests.
    pub output: Vec<String>,

    /// Every action reported for this test, in order.
    pub progress: Vec<TestAction>,

    /// Output fragments attributed to a `file:line:` location, keyed by file name and then by
    /// line number.
    pub file_output: BTreeMap<String, BTreeMap<u32, Vec<String>>>,

    /// Elapsed seconds from the last terminal event that reported it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
}

/// Why a run switched over to the raw-log fallback.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StreamFallback {
    /// The 1-based line number of the first line that failed to decode.
    pub line_number: usize,

    /// The decode error.
    pub message: String,
}

/// The outcome of aggregating an event stream.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AggregatedRun {
    tests: IndexMap<RuntimeId, AggregatedTest>,
    log: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback: Option<StreamFallback>,
}

impl AggregatedRun {
    /// Returns the aggregated tests in first-seen order.
    ///
    /// Always empty if the run fell back to the raw log.
    pub fn tests(&self) -> &IndexMap<RuntimeId, AggregatedTest> {
        &self.tests
    }

    /// Looks up a test by runtime identity.
    pub fn get(&self, id: &str) -> Option<&AggregatedTest> {
        self.tests.get(id)
    }

    /// Returns true if no tests were tracked.
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    /// Returns the run-wide log: every decorated output line, or every decorated raw line after a
    /// fallback.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Returns the fallback reason, if the stream could not be decoded.
    pub fn fallback(&self) -> Option<&StreamFallback> {
        self.fallback.as_ref()
    }
}

/// Folds an event stream, one line at a time, into per-test state.
///
/// The first line that fails to decode discards everything aggregated so far. From then on the
/// aggregator only collects decorated raw lines.
#[derive(Debug)]
pub struct EventAggregator {
    styles: OutputStyles,
    line_number: usize,
    state: AggregatorState,
}

#[derive(Debug)]
enum AggregatorState {
    Structured {
        tests: IndexMap<RuntimeId, AggregatedTest>,
        log: Vec<String>,
        // Kept so that the log can be rebuilt from scratch on fallback.
        raw_lines: Vec<String>,
    },
    Fallback {
        log: Vec<String>,
        reason: StreamFallback,
    },
}

impl EventAggregator {
    /// Creates a new aggregator decorating output with `styles`.
    pub fn new(styles: OutputStyles) -> Self {
        Self {
            styles,
            line_number: 0,
            state: AggregatorState::Structured {
                tests: IndexMap::new(),
                log: Vec::new(),
                raw_lines: Vec::new(),
            },
        }
    }

    /// Returns true if the aggregator has switched over to the raw-log fallback.
    pub fn is_fallback(&self) -> bool {
        matches!(self.state, AggregatorState::Fallback { .. })
    }

    /// Feeds a single line of the stream. A trailing line terminator is ignored, and empty lines
    /// are skipped.
    pub fn push_line(&mut self, line: &str) {
        self.line_number += 1;
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            return;
        }

        let next_state = match &mut self.state {
            AggregatorState::Fallback { log, .. } => {
                log.push(self.styles.decorate(line));
                None
            }
            AggregatorState::Structured {
                tests,
                log,
                raw_lines,
            } => match TestEvent::decode(line) {
                Ok(event) => {
                    raw_lines.push(line.to_owned());
                    fold_event(&self.styles, tests, log, event);
                    None
                }
                Err(error) => {
                    warn!(
                        "line {} of the test event stream could not be decoded ({error}), \
                         falling back to raw output",
                        self.line_number,
                    );
                    let log = raw_lines
                        .iter()
                        .map(String::as_str)
                        .chain(std::iter::once(line))
                        .map(|raw| self.styles.decorate(raw))
                        .collect();
                    Some(AggregatorState::Fallback {
                        log,
                        reason: StreamFallback {
                            line_number: self.line_number,
                            message: error.to_string(),
                        },
                    })
                }
            },
        };

        if let Some(next_state) = next_state {
            self.state = next_state;
        }
    }

    /// Feeds every line from `reader`. Invalid UTF-8 is replaced rather than rejected, so that
    /// such a line reaches the decoder (and triggers the fallback) like any other bad line.
    pub fn push_reader(&mut self, mut reader: impl BufRead) -> io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                return Ok(());
            }
            self.push_line(&String::from_utf8_lossy(&buf));
        }
    }

    /// Finishes aggregation.
    pub fn finish(self) -> AggregatedRun {
        match self.state {
            AggregatorState::Structured { tests, log, .. } => AggregatedRun {
                tests,
                log,
                fallback: None,
            },
            AggregatorState::Fallback { log, reason } => AggregatedRun {
                tests: IndexMap::new(),
                log,
                fallback: Some(reason),
            },
        }
    }
}

/// Aggregates a fully materialized stream.
pub fn aggregate<I>(lines: I, styles: &OutputStyles) -> AggregatedRun
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut aggregator = EventAggregator::new(styles.clone());
    for line in lines {
        aggregator.push_line(line.as_ref());
    }
    aggregator.finish()
}

fn fold_event(
    styles: &OutputStyles,
    tests: &mut IndexMap<RuntimeId, AggregatedTest>,
    log: &mut Vec<String>,
    event: TestEvent,
) {
    let output = event
        .output
        .as_deref()
        .map(|raw| styles.decorate(&sanitize_output(raw)));
    if let Some(output) = &output {
        log.push(output.clone());
    }

    let Some(test) = event.test.as_deref() else {
        return;
    };
    let identity = RuntimeIdentity::new(event.package.as_deref().unwrap_or_default(), test);

    let entry = tests.entry(identity.id().clone()).or_default();
    if let Some(location) = event.output.as_deref().and_then(FileLocation::extract) {
        let message = sanitize_output(location.message);
        entry
            .file_output
            .entry(location.file.to_owned())
            .or_default()
            .entry(location.line)
            .or_default()
            .push(styles.decorate(message.trim()));
    }
    if let Some(action) = event.action {
        entry.progress.push(action);
        if let Some(status) = action.terminal_status() {
            entry.status = Some(status);
            if event.elapsed.is_some() {
                entry.elapsed = event.elapsed;
            }
        }
    }

    let Some(output) = output else {
        return;
    };
    entry.output.push(output.clone());
    for ancestor in identity.ancestors() {
        match tests.get_mut(ancestor) {
            Some(parent) => parent.output.push(output.clone()),
            None => debug!("`{ancestor}` is not tracked, not forwarding output from `{test}`"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn plain(lines: &str) -> AggregatedRun {
        aggregate(lines.lines(), &OutputStyles::default())
    }

    #[test]
    fn run_then_pass() {
        let run = plain(indoc! {r#"
            {"Action":"run","Package":"p","Test":"TestA"}
            {"Action":"pass","Package":"p","Test":"TestA","Elapsed":0.01}
        "#});
        assert!(run.fallback().is_none());
        let test = run.get("p::TestA").expect("TestA tracked");
        assert_eq!(test.status, Some(TestStatus::Passed));
        assert!(test.output.is_empty());
        assert_eq!(test.progress, vec![TestAction::Run, TestAction::Pass]);
        assert_eq!(test.elapsed, Some(0.01));
    }

    #[test]
    fn transitional_actions_leave_status_unset() {
        let run = plain(indoc! {r#"
            {"Action":"run","Package":"p","Test":"TestA"}
            {"Action":"pause","Package":"p","Test":"TestA"}
            {"Action":"cont","Package":"p","Test":"TestA"}
            {"Action":"output","Package":"p","Test":"TestA","Output":"=== CONT  TestA\n"}
        "#});
        let test = run.get("p::TestA").expect("TestA tracked");
        assert_eq!(test.status, None);
        assert_eq!(
            test.progress,
            vec![
                TestAction::Run,
                TestAction::Pause,
                TestAction::Cont,
                TestAction::Output
            ]
        );
    }

    #[test_case("pass", TestStatus::Passed)]
    #[test_case("fail", TestStatus::Failed)]
    #[test_case("skip", TestStatus::Skipped)]
    fn terminal_action_sets_status(action: &str, expected: TestStatus) {
        let run = plain(&format!(
            "{{\"Action\":\"run\",\"Package\":\"p\",\"Test\":\"TestA\"}}\n\
             {{\"Action\":\"{action}\",\"Package\":\"p\",\"Test\":\"TestA\"}}\n"
        ));
        assert_eq!(run.get("p::TestA").and_then(|t| t.status), Some(expected));
    }

    #[test]
    fn last_terminal_action_wins() {
        let run = plain(indoc! {r#"
            {"Action":"fail","Package":"p","Test":"TestA","Elapsed":1}
            {"Action":"run","Package":"p","Test":"TestA"}
            {"Action":"pass","Package":"p","Test":"TestA"}
        "#});
        let test = run.get("p::TestA").expect("TestA tracked");
        assert_eq!(test.status, Some(TestStatus::Passed));
        // The later terminal event did not report an elapsed time.
        assert_eq!(test.elapsed, Some(1.0));
    }

    #[test]
    fn file_attributed_output() {
        let run = plain(indoc! {r#"
            {"Action":"run","Package":"p","Test":"TestA"}
            {"Action":"output","Package":"p","Test":"TestA","Output":"    a_test.go:10: boom\n"}
            {"Action":"output","Package":"p","Test":"TestA","Output":"    a_test.go:10: \tagain\n"}
            {"Action":"output","Package":"p","Test":"TestA","Output":"    a_test.go:12: other\n"}
            {"Action":"fail","Package":"p","Test":"TestA"}
        "#});
        let test = run.get("p::TestA").expect("TestA tracked");
        let lines = &test.file_output["a_test.go"];
        assert_eq!(lines[&10], vec!["boom", "again"]);
        assert_eq!(lines[&12], vec!["other"]);
        assert_eq!(
            test.output,
            vec!["    a_test.go:10: boom", "    a_test.go:10: again", "    a_test.go:12: other"]
        );
    }

    #[test]
    fn subtest_output_fans_out_in_order() {
        let run = plain(indoc! {r#"
            {"Action":"run","Package":"p","Test":"TestP"}
            {"Action":"output","Package":"p","Test":"TestP","Output":"=== RUN   TestP\n"}
            {"Action":"run","Package":"p","Test":"TestP/a"}
            {"Action":"output","Package":"p","Test":"TestP/a","Output":"=== RUN   TestP/a\n"}
            {"Action":"run","Package":"p","Test":"TestP/a/deep"}
            {"Action":"output","Package":"p","Test":"TestP/a/deep","Output":"deep line\n"}
            {"Action":"output","Package":"p","Test":"TestP","Output":"parent only\n"}
            {"Action":"output","Package":"p","Test":"TestP/a","Output":"    --- PASS: TestP/a (0.00s)\n"}
            {"Action":"pass","Package":"p","Test":"TestP/a"}
            {"Action":"pass","Package":"p","Test":"TestP"}
        "#});

        assert_eq!(
            run.get("p::TestP").expect("parent tracked").output,
            vec![
                "=== RUN   TestP",
                "=== RUN   TestP/a",
                "deep line",
                "parent only",
                "    --- PASS: TestP/a (0.00s)",
            ]
        );
        assert_eq!(
            run.get("p::TestP::a").expect("child tracked").output,
            vec!["=== RUN   TestP/a", "deep line", "    --- PASS: TestP/a (0.00s)"]
        );
        assert_eq!(
            run.get("p::TestP::a::deep").expect("grandchild tracked").output,
            vec!["deep line"]
        );
        let ids: Vec<_> = run.tests().keys().map(RuntimeId::as_str).collect();
        assert_eq!(ids, vec!["p::TestP", "p::TestP::a", "p::TestP::a::deep"]);
    }

    #[test]
    fn untracked_parent_is_skipped() {
        let run = plain(indoc! {r#"
            {"Action":"output","Package":"p","Test":"TestP/a","Output":"child\n"}
        "#});
        assert!(run.get("p::TestP").is_none());
        assert_eq!(run.get("p::TestP::a").expect("child tracked").output, vec!["child"]);
    }

    #[test]
    fn package_events_only_reach_the_log() {
        let run = plain(indoc! {r#"
            {"Action":"start","Package":"p"}
            {"Action":"output","Package":"p","Output":"PASS\n"}
            {"Action":"output","Package":"p","Output":"ok  \tp\t0.010s\n"}
            {"Action":"pass","Package":"p","Elapsed":0.01}
        "#});
        assert!(run.is_empty());
        assert!(run.fallback().is_none());
        assert_eq!(run.log(), ["PASS", "ok  p0.010s"]);
    }

    #[test]
    fn log_includes_test_output() {
        let run = plain(indoc! {r#"
            {"Action":"output","Package":"p","Test":"TestA","Output":"hello\n"}
            {"Action":"output","Package":"p","Output":"FAIL\n"}
        "#});
        assert_eq!(run.log(), ["hello", "FAIL"]);
    }

    #[test]
    fn malformed_line_falls_back() {
        let input = indoc! {r#"
            {"Action":"run","Package":"p","Test":"TestA"}

            {"Action":"output","Package":"p","Test":"TestA","Output":"--- FAIL: TestA\n"}
            # command-line-arguments
            ./a_test.go:3:1: syntax error
            {"Action":"pass","Package":"p","Test":"TestA"}
        "#};
        let styles = OutputStyles::colorized();
        let run = aggregate(input.lines(), &styles);

        assert!(run.is_empty());
        let fallback = run.fallback().expect("fell back");
        assert_eq!(fallback.line_number, 4);

        let non_empty: Vec<_> = input.lines().filter(|line| !line.is_empty()).collect();
        assert_eq!(run.log().len(), non_empty.len());
        for (logged, raw) in run.log().iter().zip(&non_empty) {
            assert_eq!(logged, &styles.decorate(raw));
        }
        // The third line contains FAIL and is colored in the log.
        assert_ne!(run.log()[1], non_empty[1]);
    }

    #[test]
    fn fallback_is_sticky() {
        let mut aggregator = EventAggregator::new(OutputStyles::default());
        aggregator.push_line("not json");
        assert!(aggregator.is_fallback());
        aggregator.push_line(r#"{"Action":"pass","Package":"p","Test":"TestA"}"#);
        let run = aggregator.finish();
        assert!(run.is_empty());
        assert_eq!(
            run.log(),
            ["not json", r#"{"Action":"pass","Package":"p","Test":"TestA"}"#]
        );
    }

    #[test]
    fn well_formed_json_never_falls_back() {
        let run = plain(indoc! {r#"
            {"Action":"run","Package":"p","Test":"TestA"}
            {"Action":"output","Package":"p","Test":"TestA","Output":42}
            [1, 2]
            {"Action":"pass","Package":"p","Test":"TestA"}
        "#});
        assert_eq!(run.fallback(), None);
        let test = run.get("p::TestA").expect("TestA tracked");
        assert_eq!(test.status, Some(TestStatus::Passed));
        assert!(test.output.is_empty(), "mistyped output is dropped");
        assert_eq!(
            test.progress,
            [TestAction::Run, TestAction::Output, TestAction::Pass]
        );
    }

    #[test]
    fn empty_input() {
        let run = plain("");
        assert!(run.is_empty());
        assert!(run.log().is_empty());
        assert!(run.fallback().is_none());
    }

    #[test]
    fn incremental_matches_batch() {
        let input = indoc! {r#"
            {"Action":"run","Package":"p","Test":"TestA"}
            {"Action":"output","Package":"p","Test":"TestA","Output":"    a_test.go:4: nope\n"}
            {"Action":"fail","Package":"p","Test":"TestA"}
        "#};
        let batch = plain(input);

        let mut aggregator = EventAggregator::new(OutputStyles::default());
        aggregator
            .push_reader(input.as_bytes())
            .expect("reading from a slice succeeds");
        let incremental = aggregator.finish();

        assert_eq!(batch.tests(), incremental.tests());
        assert_eq!(batch.log(), incremental.log());
    }

    #[test]
    fn invalid_utf8_triggers_fallback() {
        let mut aggregator = EventAggregator::new(OutputStyles::default());
        aggregator
            .push_reader(&b"{\"Action\":\"run\",\"Package\":\"p\",\"Test\":\"TestA\"}\n\xff\xfe\n"[..])
            .expect("reading from a slice succeeds");
        let run = aggregator.finish();
        assert_eq!(run.fallback().map(|f| f.line_number), Some(2));
        assert_eq!(run.log().len(), 2);
    }

    #[test_case("a\tb\n", "ab" ; "tab and newline")]
    #[test_case("\n", "" ; "only newline")]
    #[test_case("  keep  spaces  ", "  keep  spaces  " ; "spaces kept")]
    fn sanitize(raw: &str, expected: &str) {
        assert_eq!(sanitize_output(raw), expected);
    }
}
