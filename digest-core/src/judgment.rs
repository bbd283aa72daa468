//! Judgment classification and verdict aggregation for AITA threads.
//!
//! Comments are scanned for the community's judgment acronyms and each
//! thread's tallies are reduced to a single verdict label.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Judged totals below this stay "Mixed / Few Judgments".
const MIN_JUDGMENTS_FOR_VERDICT: u32 = 10;

/// Share of the judged total the leading label must reach.
const PLURALITY_THRESHOLD: f64 = 0.40;

/// The five judgment acronyms used by r/AmItheAsshole commenters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Judgment {
    Yta,
    Nta,
    Esh,
    Nah,
    Info,
}

impl Judgment {
    /// Classification priority order: a comment carrying several acronyms
    /// is counted as the first one listed here.
    pub const ALL: [Judgment; 5] = [
        Judgment::Yta,
        Judgment::Nta,
        Judgment::Esh,
        Judgment::Nah,
        Judgment::Info,
    ];

    pub fn acronym(&self) -> &'static str {
        match self {
            Judgment::Yta => "YTA",
            Judgment::Nta => "NTA",
            Judgment::Esh => "ESH",
            Judgment::Nah => "NAH",
            Judgment::Info => "INFO",
        }
    }

    /// The verdict this judgment produces when it carries the thread.
    /// INFO requests never become a verdict.
    pub fn as_verdict(&self) -> Option<Verdict> {
        match self {
            Judgment::Yta => Some(Verdict::Yta),
            Judgment::Nta => Some(Verdict::Nta),
            Judgment::Esh => Some(Verdict::Esh),
            Judgment::Nah => Some(Verdict::Nah),
            Judgment::Info => None,
        }
    }
}

/// Matches judgment acronyms case-insensitively on word boundaries, so
/// "nta." counts but "fantastic" does not.
pub struct CommentClassifier {
    patterns: Vec<(Judgment, Regex)>,
}

impl CommentClassifier {
    pub fn new() -> Self {
        let patterns = Judgment::ALL
            .iter()
            .map(|judgment| {
                let pattern = format!(r"\b{}\b", judgment.acronym().to_lowercase());
                let regex = Regex::new(&pattern).expect("acronym patterns are valid regexes");
                (*judgment, regex)
            })
            .collect();
        Self { patterns }
    }

    /// First judgment whose acronym appears in `text`, scanning in
    /// priority order. Empty comments are unjudged.
    pub fn classify(&self, text: &str) -> Option<Judgment> {
        if text.is_empty() {
            return None;
        }
        let lowered = text.to_lowercase();
        self.patterns
            .iter()
            .find(|(_, regex)| regex.is_match(&lowered))
            .map(|(judgment, _)| *judgment)
    }
}

impl Default for CommentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-thread judgment tallies. `TotalJudged` counts only the four
/// verdict-eligible labels; INFO requests are reported alongside but carry
/// no weight.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentCounts {
    #[serde(rename = "YTA")]
    pub yta: u32,
    #[serde(rename = "NTA")]
    pub nta: u32,
    #[serde(rename = "ESH")]
    pub esh: u32,
    #[serde(rename = "NAH")]
    pub nah: u32,
    #[serde(rename = "INFO")]
    pub info: u32,
    #[serde(rename = "TotalJudged")]
    pub total_judged: u32,
}

impl JudgmentCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, judgment: Judgment) {
        match judgment {
            Judgment::Yta => self.yta += 1,
            Judgment::Nta => self.nta += 1,
            Judgment::Esh => self.esh += 1,
            Judgment::Nah => self.nah += 1,
            Judgment::Info => {
                self.info += 1;
                return;
            }
        }
        self.total_judged += 1;
    }

    pub fn count(&self, judgment: Judgment) -> u32 {
        match judgment {
            Judgment::Yta => self.yta,
            Judgment::Nta => self.nta,
            Judgment::Esh => self.esh,
            Judgment::Nah => self.nah,
            Judgment::Info => self.info,
        }
    }

    /// Reduce the tallies to a verdict label.
    ///
    /// Thin samples stay "Mixed / Few Judgments", and a plurality holding
    /// less than 40% of the judged total stays "Mixed". Ties keep the
    /// earlier label in priority order.
    pub fn verdict(&self) -> Verdict {
        if self.total_judged == 0 {
            return Verdict::NoJudgmentsFound;
        }
        if self.total_judged < MIN_JUDGMENTS_FOR_VERDICT {
            return Verdict::MixedFewJudgments;
        }

        let mut leader: Option<Verdict> = None;
        let mut highest = 0;
        for judgment in Judgment::ALL {
            let Some(verdict) = judgment.as_verdict() else {
                continue;
            };
            let count = self.count(judgment);
            if count > highest {
                highest = count;
                leader = Some(verdict);
            }
        }

        let plurality = f64::from(highest) / f64::from(self.total_judged);
        if plurality < PLURALITY_THRESHOLD {
            return Verdict::Mixed;
        }
        leader.unwrap_or(Verdict::Mixed)
    }
}

/// Thread-level outcome labels, spelled the way they appear in the output
/// file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "YTA")]
    Yta,
    #[serde(rename = "NTA")]
    Nta,
    #[serde(rename = "ESH")]
    Esh,
    #[serde(rename = "NAH")]
    Nah,
    Mixed,
    #[serde(rename = "Mixed / Few Judgments")]
    MixedFewJudgments,
    #[serde(rename = "No Judgments Found")]
    NoJudgmentsFound,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Yta => "YTA",
            Verdict::Nta => "NTA",
            Verdict::Esh => "ESH",
            Verdict::Nah => "NAH",
            Verdict::Mixed => "Mixed",
            Verdict::MixedFewJudgments => "Mixed / Few Judgments",
            Verdict::NoJudgmentsFound => "No Judgments Found",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> CommentClassifier {
        CommentClassifier::new()
    }

    fn tally(yta: u32, nta: u32, esh: u32, nah: u32, info: u32) -> JudgmentCounts {
        let mut counts = JudgmentCounts::new();
        for (judgment, n) in [
            (Judgment::Yta, yta),
            (Judgment::Nta, nta),
            (Judgment::Esh, esh),
            (Judgment::Nah, nah),
            (Judgment::Info, info),
        ] {
            for _ in 0..n {
                counts.record(judgment);
            }
        }
        counts
    }

    #[test]
    fn classifies_each_acronym() {
        let c = classifier();
        assert_eq!(c.classify("YTA for ignoring her all week"), Some(Judgment::Yta));
        assert_eq!(c.classify("Definitely NTA here"), Some(Judgment::Nta));
        assert_eq!(c.classify("honestly ESH in this mess"), Some(Judgment::Esh));
        assert_eq!(c.classify("NAH, just bad timing"), Some(Judgment::Nah));
        assert_eq!(
            c.classify("INFO: how old is your brother?"),
            Some(Judgment::Info)
        );
    }

    #[test]
    fn classification_is_case_insensitive() {
        let c = classifier();
        assert_eq!(c.classify("yta and you know it"), Some(Judgment::Yta));
        assert_eq!(c.classify("Nta, your house your rules"), Some(Judgment::Nta));
    }

    #[test]
    fn punctuation_counts_as_word_boundary() {
        let c = classifier();
        assert_eq!(c.classify("nta."), Some(Judgment::Nta));
        assert_eq!(c.classify("(YTA)"), Some(Judgment::Yta));
        assert_eq!(c.classify("esh, all of you"), Some(Judgment::Esh));
    }

    #[test]
    fn embedded_acronyms_do_not_match() {
        let c = classifier();
        assert_eq!(c.classify("what a fantastic mess"), None);
        assert_eq!(c.classify("representing the intake team"), None);
        assert_eq!(c.classify("check the infographic"), None);
    }

    #[test]
    fn earlier_acronym_in_priority_order_wins() {
        let c = classifier();
        assert_eq!(
            c.classify("I said NTA before but YTA after the edit"),
            Some(Judgment::Yta)
        );
        assert_eq!(c.classify("NAH or maybe ESH honestly"), Some(Judgment::Esh));
        assert_eq!(c.classify("INFO needed, leaning NAH"), Some(Judgment::Nah));
    }

    #[test]
    fn empty_and_plain_comments_are_unjudged() {
        let c = classifier();
        assert_eq!(c.classify(""), None);
        assert_eq!(c.classify("You are the asshole here, full stop"), None);
    }

    #[test]
    fn info_is_tracked_but_never_judged() {
        let counts = tally(0, 0, 0, 0, 3);
        assert_eq!(counts.info, 3);
        assert_eq!(counts.total_judged, 0);
        assert_eq!(counts.verdict(), Verdict::NoJudgmentsFound);
    }

    #[test]
    fn no_comments_means_no_judgments_found() {
        assert_eq!(JudgmentCounts::new().verdict(), Verdict::NoJudgmentsFound);
    }

    #[test]
    fn thin_samples_stay_mixed_few_judgments() {
        // Nine unanimous judgments are still below the confidence floor.
        assert_eq!(tally(9, 0, 0, 0, 0).verdict(), Verdict::MixedFewJudgments);
        assert_eq!(tally(2, 3, 1, 0, 4).verdict(), Verdict::MixedFewJudgments);
    }

    #[test]
    fn clear_majority_wins_at_ten_or_more() {
        assert_eq!(tally(10, 0, 0, 0, 0).verdict(), Verdict::Yta);
        assert_eq!(tally(3, 8, 1, 0, 2).verdict(), Verdict::Nta);
    }

    #[test]
    fn plurality_at_exactly_forty_percent_holds() {
        // 4 of 10 sits exactly on the threshold.
        assert_eq!(tally(4, 3, 2, 1, 0).verdict(), Verdict::Yta);
    }

    #[test]
    fn weak_plurality_collapses_to_mixed() {
        // 5 of 17 is the largest share but well under 40%.
        assert_eq!(tally(5, 5, 4, 3, 0).verdict(), Verdict::Mixed);
    }

    #[test]
    fn ties_keep_the_earlier_label() {
        assert_eq!(tally(5, 5, 0, 0, 0).verdict(), Verdict::Yta);
        assert_eq!(tally(0, 6, 6, 0, 0).verdict(), Verdict::Nta);
    }

    #[test]
    fn info_does_not_dilute_the_plurality() {
        // 5 of 10 judged is 50% even with a pile of INFO requests.
        assert_eq!(tally(5, 3, 1, 1, 30).verdict(), Verdict::Yta);
    }

    #[test]
    fn counts_serialize_with_output_keys() {
        let value = serde_json::to_value(tally(5, 5, 4, 3, 2)).unwrap();
        assert_eq!(value["YTA"], 5);
        assert_eq!(value["NTA"], 5);
        assert_eq!(value["ESH"], 4);
        assert_eq!(value["NAH"], 3);
        assert_eq!(value["INFO"], 2);
        assert_eq!(value["TotalJudged"], 17);
    }

    #[test]
    fn verdict_labels_serialize_as_output_strings() {
        assert_eq!(serde_json::to_value(Verdict::Yta).unwrap(), "YTA");
        assert_eq!(serde_json::to_value(Verdict::Mixed).unwrap(), "Mixed");
        assert_eq!(
            serde_json::to_value(Verdict::MixedFewJudgments).unwrap(),
            "Mixed / Few Judgments"
        );
        assert_eq!(
            serde_json::to_value(Verdict::NoJudgmentsFound).unwrap(),
            "No Judgments Found"
        );
    }
}
