use log::{debug, info, warn};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::config::*;
use crate::duration::format_minutes;

// Running totals for one interviewer.
#[derive(Debug, Clone)]
struct Accumulator {
    interviewer_id: String,
    interviewer_name: Option<String>,
    count: u64,
    sum_duration: i64,
    min_duration: i64,
    max_duration: i64,
    sum_questions: u64,
    counts: ResponseCounts,
}

impl Accumulator {
    fn new(interviewer_id: String) -> Accumulator {
        Accumulator {
            interviewer_id,
            interviewer_name: None,
            count: 0,
            sum_duration: 0,
            min_duration: i64::MAX,
            max_duration: i64::MIN,
            sum_questions: 0,
            counts: ResponseCounts::default(),
        }
    }

    fn add(&mut self, event: &InterviewEvent) {
        if self.interviewer_name.is_none() {
            self.interviewer_name = event.interviewer_name.clone();
        }
        self.count += 1;
        self.sum_duration += event.duration_minutes;
        self.min_duration = self.min_duration.min(event.duration_minutes);
        self.max_duration = self.max_duration.max(event.duration_minutes);
        self.sum_questions += event.questions_answered;
        self.counts.dont_know += event.counts.dont_know;
        self.counts.refuse += event.counts.refuse;
        self.counts.not_applicable += event.counts.not_applicable;
    }

    // Only called on accumulators that saw at least one event.
    fn finish(self, rounding: RoundingMode) -> InterviewerSummary {
        let n = self.count as f64;
        InterviewerSummary {
            interviewer_id: self.interviewer_id,
            interviewer_name: self.interviewer_name,
            total_interviews: self.count,
            min_duration_minutes: self.min_duration,
            avg_duration_minutes: self.sum_duration as f64 / n,
            max_duration_minutes: self.max_duration,
            avg_questions: rounding.round(self.sum_questions as f64 / n) as i64,
            total_dont_know: self.counts.dont_know,
            total_refuse: self.counts.refuse,
            total_not_applicable: self.counts.not_applicable,
        }
    }
}

/// The numeric value of an interviewer id, if it has one.
fn numeric_id(id: &str) -> Option<f64> {
    id.trim().parse::<f64>().ok().filter(|x| !x.is_nan())
}

/// Numeric ids in increasing order first, then the non-numeric ones.
/// Ties keep their relative order.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (numeric_id(a), numeric_id(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Groups the long-form events by interviewer id.
///
/// Returns the summaries sorted by numeric id (groups in first-seen order
/// before the stable sort) and the number of events that had no interviewer
/// id.
pub fn aggregate_interviewers(
    events: &[InterviewEvent],
    rules: &PipelineRules,
) -> (Vec<InterviewerSummary>, u64) {
    let mut groups: Vec<Accumulator> = Vec::new();
    // The bucket for missing ids is keyed apart from the real ids.
    let mut index: HashMap<(bool, String), usize> = HashMap::new();
    let mut without_id: u64 = 0;

    for event in events.iter() {
        let key: (bool, String) = match (&event.interviewer_id, &rules.missing_id_policy) {
            (Some(id), _) => (false, id.clone()),
            (None, MissingIdPolicy::Bucket(label)) => {
                without_id += 1;
                (true, label.clone())
            }
            (None, MissingIdPolicy::Drop) => {
                without_id += 1;
                continue;
            }
        };
        let pos = match index.get(&key) {
            Some(pos) => *pos,
            None => {
                groups.push(Accumulator::new(key.1.clone()));
                index.insert(key, groups.len() - 1);
                groups.len() - 1
            }
        };
        groups[pos].add(event);
    }

    if let MissingIdPolicy::Bucket(label) = &rules.missing_id_policy {
        if without_id > 0 && index.contains_key(&(false, label.clone())) {
            warn!(
                "Interviewer id {:?} is also the label for missing ids: the two are reported as separate lines",
                label
            );
        }
    }

    if without_id > 0 {
        match &rules.missing_id_policy {
            MissingIdPolicy::Drop => warn!(
                "{} interview events have no interviewer id and are not counted",
                without_id
            ),
            MissingIdPolicy::Bucket(label) => warn!(
                "{} interview events have no interviewer id and are counted under {:?}",
                without_id, label
            ),
        }
    }

    let mut summaries: Vec<InterviewerSummary> = groups
        .into_iter()
        .map(|acc| acc.finish(rules.avg_questions_rounding))
        .collect();
    summaries.sort_by(|a, b| compare_ids(&a.interviewer_id, &b.interviewer_id));
    debug!("aggregate_interviewers: summaries: {:?}", summaries);
    info!(
        "Aggregated {} interview events into {} interviewers",
        events.len(),
        summaries.len()
    );
    (summaries, without_id)
}

/// Formats an average duration: rounded to two decimals, with the shortest
/// decimal form and at least one fractional digit (`12.5 min`, `12.0 min`).
/// Exact halves go to the even hundredth: 0.125 is `0.12 min`.
pub fn format_average_minutes(avg: f64) -> String {
    let rounded = RoundingMode::HalfEven.round(avg * 100.0) / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.1} min", rounded)
    } else {
        format!("{} min", rounded)
    }
}

impl InterviewerSummary {
    pub fn display(&self) -> SummaryDisplay {
        SummaryDisplay {
            int_id: self.interviewer_id.clone(),
            int_name: self.interviewer_name.clone().unwrap_or_default(),
            total_interviews: self.total_interviews,
            min_duration_display: format_minutes(self.min_duration_minutes),
            avg_duration_display: format_average_minutes(self.avg_duration_minutes),
            max_duration_display: format_minutes(self.max_duration_minutes),
            avg_questions: self.avg_questions,
            total_dk: self.total_dont_know,
            total_rf: self.total_refuse,
            total_na: self.total_not_applicable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: Option<&str>, name: Option<&str>, duration: i64, questions: u64) -> InterviewEvent {
        InterviewEvent {
            respondent_id: None,
            role: "F".to_string(),
            interviewer_id: id.map(|s| s.to_string()),
            interviewer_name: name.map(|s| s.to_string()),
            duration_minutes: duration,
            counts: ResponseCounts {
                dont_know: 1,
                refuse: 0,
                not_applicable: 2,
            },
            questions_answered: questions,
        }
    }

    fn ids(summaries: &[InterviewerSummary]) -> Vec<&str> {
        summaries.iter().map(|s| s.interviewer_id.as_str()).collect()
    }

    #[test]
    fn numeric_sort_of_ids() {
        let events = vec![event(Some("5"), None, 10, 3), event(Some("3"), None, 20, 3)];
        let (summaries, _) = aggregate_interviewers(&events, &PipelineRules::default());
        assert_eq!(ids(&summaries), vec!["3", "5"]);
        assert!(summaries.iter().all(|s| s.total_interviews == 1));
    }

    #[test]
    fn non_numeric_ids_sort_last_in_first_seen_order() {
        let events = vec![
            event(Some("b"), None, 1, 1),
            event(Some("10"), None, 1, 1),
            event(Some("a"), None, 1, 1),
            event(Some("9"), None, 1, 1),
        ];
        let (summaries, _) = aggregate_interviewers(&events, &PipelineRules::default());
        assert_eq!(ids(&summaries), vec!["9", "10", "b", "a"]);
    }

    #[test]
    fn statistics_per_interviewer() {
        let events = vec![
            event(Some("7"), None, 10, 4),
            event(Some("7"), Some("Kofi"), 25, 5),
            event(Some("7"), Some("Other"), -2, 5),
        ];
        let (summaries, _) = aggregate_interviewers(&events, &PipelineRules::default());
        assert_eq!(summaries.len(), 1);
        let s = &summaries[0];
        assert_eq!(s.interviewer_name, Some("Kofi".to_string()));
        assert_eq!(s.total_interviews, 3);
        assert_eq!(s.min_duration_minutes, -2);
        assert_eq!(s.max_duration_minutes, 25);
        assert!((s.avg_duration_minutes - 11.0).abs() < 1e-9);
        // 14 / 3 = 4.67
        assert_eq!(s.avg_questions, 5);
        assert_eq!(s.total_dont_know, 3);
        assert_eq!(s.total_refuse, 0);
        assert_eq!(s.total_not_applicable, 6);

        let d = s.display();
        assert_eq!(d.min_duration_display, "-2 min");
        assert_eq!(d.avg_duration_display, "11.0 min");
        assert_eq!(d.max_duration_display, "25 min");
        assert_eq!(d.int_name, "Kofi");
    }

    #[test]
    fn missing_ids_follow_the_policy() {
        let events = vec![event(None, None, 10, 1), event(Some("1"), None, 20, 1)];

        let (summaries, without) = aggregate_interviewers(&events, &PipelineRules::default());
        assert_eq!(ids(&summaries), vec!["1"]);
        assert_eq!(without, 1);

        let rules = PipelineRules {
            missing_id_policy: MissingIdPolicy::Bucket("unknown".to_string()),
            ..PipelineRules::default()
        };
        let (summaries, without) = aggregate_interviewers(&events, &rules);
        assert_eq!(ids(&summaries), vec!["1", "unknown"]);
        assert_eq!(without, 1);
    }

    #[test]
    fn real_id_equal_to_the_bucket_label_stays_apart() {
        let events = vec![
            event(Some("unknown"), Some("Kofi"), 10, 1),
            event(None, None, 20, 1),
        ];
        let rules = PipelineRules {
            missing_id_policy: MissingIdPolicy::Bucket("unknown".to_string()),
            ..PipelineRules::default()
        };
        let (summaries, without) = aggregate_interviewers(&events, &rules);
        assert_eq!(without, 1);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].interviewer_name, Some("Kofi".to_string()));
        assert_eq!(summaries[0].max_duration_minutes, 10);
        assert_eq!(summaries[1].interviewer_name, None);
        assert_eq!(summaries[1].max_duration_minutes, 20);
        assert!(summaries.iter().all(|s| s.total_interviews == 1));
    }

    #[test]
    fn average_questions_rounding_modes() {
        let events = vec![event(Some("1"), None, 1, 2), event(Some("1"), None, 1, 3)];
        let (summaries, _) = aggregate_interviewers(&events, &PipelineRules::default());
        assert_eq!(summaries[0].avg_questions, 3);

        let rules = PipelineRules {
            avg_questions_rounding: RoundingMode::HalfEven,
            ..PipelineRules::default()
        };
        let (summaries, _) = aggregate_interviewers(&events, &rules);
        assert_eq!(summaries[0].avg_questions, 2);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        let (summaries, without) = aggregate_interviewers(&[], &PipelineRules::default());
        assert!(summaries.is_empty());
        assert_eq!(without, 0);
    }

    #[test]
    fn average_formatting() {
        assert_eq!(format_average_minutes(12.5), "12.5 min");
        assert_eq!(format_average_minutes(12.0), "12.0 min");
        assert_eq!(format_average_minutes(10.0 / 3.0), "3.33 min");
        assert_eq!(format_average_minutes(2.0 / 3.0), "0.67 min");
        // Exact halves go to the even hundredth
        assert_eq!(format_average_minutes(0.125), "0.12 min");
        assert_eq!(format_average_minutes(0.375), "0.38 min");
    }

    #[test]
    fn average_of_exact_half_hundredth() {
        let mut events = vec![event(Some("1"), None, 1, 1)];
        for _ in 0..7 {
            events.push(event(Some("1"), None, 0, 1));
        }
        let (summaries, _) = aggregate_interviewers(&events, &PipelineRules::default());
        assert!((summaries[0].avg_duration_minutes - 0.125).abs() < 1e-12);
        assert_eq!(summaries[0].display().avg_duration_display, "0.12 min");
    }
}
