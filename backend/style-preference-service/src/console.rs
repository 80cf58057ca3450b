// ============================================
// Console quiz
// ============================================
//
// Terminal counterpart of the HTTP flow: y/n answers read line by line,
// results and catalog counts rendered as plain text. Reader and writer are
// generic so the same code runs against stdin/stdout and in tests.

use preference_engine::{FeedbackKind, FeedbackSource, Selection, SessionSummary};
use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};

const WIDE_RULE: usize = 50;
const NARROW_RULE: usize = 30;
const REPORT_RULE: usize = 40;

/// Reads `y` / `n` answers, re-prompting on anything else.
///
/// End of input (or an I/O error) counts as no feedback for the turn.
pub struct ConsoleFeedback<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsoleFeedback<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn show(&mut self, selection: &Selection) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "[{}] Style: {}", selection.turn, selection.category)?;
        writeln!(self.output, "    Image: {}", selection.item)
    }

    fn ask(&mut self) -> io::Result<Option<FeedbackKind>> {
        loop {
            write!(self.output, "Do you like this style? (y/n): ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match line.trim().to_lowercase().as_str() {
                "y" => return Ok(Some(FeedbackKind::Like)),
                "n" => return Ok(Some(FeedbackKind::Dislike)),
                _ => writeln!(
                    self.output,
                    "Invalid input. Please enter 'y' for like or 'n' for dislike."
                )?,
            }
        }
    }
}

impl<R: BufRead, W: Write> FeedbackSource for ConsoleFeedback<R, W> {
    fn feedback(&mut self, selection: &Selection) -> Option<FeedbackKind> {
        self.show(selection).ok()?;
        self.ask().ok().flatten()
    }
}

fn rule(out: &mut impl Write, width: usize) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(width))
}

/// Top styles out of 10 followed by the turn-by-turn history
pub fn render_results(out: &mut impl Write, summary: &SessionSummary) -> io::Result<()> {
    writeln!(out, "\nYour Style Analysis:")?;
    rule(out, WIDE_RULE)?;

    let labels = ["Primary", "Secondary"];
    for (label, ranked) in labels.iter().zip(&summary.ranked_top_categories) {
        writeln!(
            out,
            "{} Style: {} (Score: {:.2}/10)",
            label, ranked.category, ranked.score
        )?;
    }

    writeln!(out, "\nYour Selection History:")?;
    rule(out, WIDE_RULE)?;
    for (idx, entry) in summary.history.iter().enumerate() {
        let response = match entry.feedback {
            FeedbackKind::Dislike => "👎 Dislike",
            _ => "👍 Like",
        };
        writeln!(out, "{}. Style: {}", idx + 1, entry.category)?;
        writeln!(out, "   Response: {}", response)?;
        writeln!(out, "   Score Change: {:.2}", entry.score_delta)?;
        writeln!(out, "   Image: {}", entry.item)?;
        rule(out, NARROW_RULE)?;
    }
    Ok(())
}

/// `segment/style-style: N files` per line plus a total
pub fn render_counts(
    out: &mut impl Write,
    counts: &BTreeMap<(String, String), usize>,
) -> io::Result<()> {
    writeln!(out, "\nFile counts by category:")?;
    rule(out, REPORT_RULE)?;
    for ((segment, style), count) in counts {
        writeln!(out, "{}/{}-style: {} files", segment, style, count)?;
    }
    rule(out, REPORT_RULE)?;
    writeln!(out, "Total files: {}", counts.values().sum::<usize>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use preference_engine::{RankedCategory, SelectionHistoryEntry};
    use std::io::Cursor;

    fn selection() -> Selection {
        Selection {
            item: "Styles/women/street-style/1.jpg".to_string(),
            category: "street".to_string(),
            turn: 3,
            shown_at: Utc::now(),
        }
    }

    fn feedback_for(input: &str) -> (Option<FeedbackKind>, String) {
        let mut console = ConsoleFeedback::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let answer = console.feedback(&selection());
        (answer, String::from_utf8(console.into_output()).unwrap())
    }

    #[test]
    fn test_reads_yes_and_no() {
        assert_eq!(feedback_for("y\n").0, Some(FeedbackKind::Like));
        assert_eq!(feedback_for("N\n").0, Some(FeedbackKind::Dislike));
    }

    #[test]
    fn test_reprompts_on_invalid_input() {
        let (answer, output) = feedback_for("maybe\n\ny\n");
        assert_eq!(answer, Some(FeedbackKind::Like));
        assert_eq!(output.matches("Invalid input").count(), 2);
        assert!(output.contains("[3] Style: street"));
    }

    #[test]
    fn test_end_of_input_is_no_feedback() {
        let (answer, _) = feedback_for("");
        assert_eq!(answer, None);
    }

    #[test]
    fn test_render_results() {
        let summary = SessionSummary {
            ranked_top_categories: vec![
                RankedCategory::new("street", 10.0),
                RankedCategory::new("modern", 4.25),
            ],
            history: vec![SelectionHistoryEntry {
                item: "s1.jpg".to_string(),
                category: "street".to_string(),
                feedback: FeedbackKind::Like,
                score_delta: 2.4,
                resulting_score: 2.4,
                timestamp: Utc::now(),
            }],
        };

        let mut out = Vec::new();
        render_results(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Primary Style: street (Score: 10.00/10)"));
        assert!(text.contains("Secondary Style: modern (Score: 4.25/10)"));
        assert!(text.contains("1. Style: street"));
        assert!(text.contains("Response: 👍 Like"));
        assert!(text.contains("Score Change: 2.40"));
        assert!(text.contains("Image: s1.jpg"));
    }

    #[test]
    fn test_render_counts() {
        let mut counts = BTreeMap::new();
        counts.insert(("women".to_string(), "classic".to_string()), 12);
        counts.insert(("men".to_string(), "street".to_string()), 3);

        let mut out = Vec::new();
        render_counts(&mut out, &counts).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("men/street-style: 3 files"));
        assert!(text.contains("women/classic-style: 12 files"));
        assert!(text.contains("Total files: 15"));
    }

    #[test]
    fn test_console_drives_a_whole_session() {
        use preference_engine::{AlgorithmParams, ItemPool, SessionController, SessionSettings};

        let mut pool = ItemPool::new();
        pool.insert("classic".to_string(), vec!["c1".to_string(), "c2".to_string()]);
        pool.insert("street".to_string(), vec!["s1".to_string()]);

        let settings = SessionSettings::new(vec!["classic".to_string()])
            .with_max_turns(5)
            .with_seed(3);
        let mut session = SessionController::new("women", AlgorithmParams::reference(), settings);
        let mut console = ConsoleFeedback::new(Cursor::new(b"y\nn\ny\n".to_vec()), Vec::new());

        let summary = session.run(&pool, &mut console);
        assert_eq!(summary.history.len(), 3);
        assert!(session.is_exhausted());
    }
}
