use super::PrMetrics;

/// A column of the flattened analysis table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    TotalChanges,
    AnalysisTimeHours,
    DescriptionSize,
    Interactions,
    ReviewCount,
    /// Categorical; has no numeric value.
    State,
}

impl Metric {
    /// Numeric columns summarized in the statistics table, in print order.
    pub const SUMMARIZED: [Metric; 5] = [
        Metric::TotalChanges,
        Metric::AnalysisTimeHours,
        Metric::DescriptionSize,
        Metric::Interactions,
        Metric::ReviewCount,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Metric::TotalChanges => "total_changes",
            Metric::AnalysisTimeHours => "analysis_time_hours",
            Metric::DescriptionSize => "descriptionSize",
            Metric::Interactions => "interactions",
            Metric::ReviewCount => "reviewCount",
            Metric::State => "state",
        }
    }

    pub fn axis_label(self) -> &'static str {
        match self {
            Metric::TotalChanges => "Lines added + removed",
            Metric::AnalysisTimeHours => "Analysis time (hours)",
            Metric::DescriptionSize => "Description size (characters)",
            Metric::Interactions => "Total interactions",
            Metric::ReviewCount => "Number of reviews",
            Metric::State => "PR status",
        }
    }

    pub fn is_numeric(self) -> bool {
        self != Metric::State
    }

    pub fn value(self, row: &PrMetrics) -> Option<f64> {
        match self {
            Metric::TotalChanges => Some(row.total_changes as f64),
            Metric::AnalysisTimeHours => Some(row.analysis_time_hours),
            Metric::DescriptionSize => Some(row.description_size as f64),
            Metric::Interactions => Some(row.interactions as f64),
            Metric::ReviewCount => Some(row.review_count as f64),
            Metric::State => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chart {
    /// Box plot of a metric grouped by PR state.
    ByState(Metric),
    Scatter { x: Metric, y: Metric },
}

/// One research question: the chart drawn for it and the pair correlated.
#[derive(Debug, Clone, Copy)]
pub struct Question {
    pub id: &'static str,
    pub title: &'static str,
    pub chart: Chart,
    pub correlation: (Metric, Metric),
}

impl Question {
    pub fn chart_file_name(&self) -> String {
        format!("grafico_{}.svg", self.id)
    }
}

pub const QUESTIONS: [Question; 8] = [
    Question {
        id: "RQ01",
        title: "RQ01 - PR size vs final status",
        chart: Chart::ByState(Metric::TotalChanges),
        correlation: (Metric::TotalChanges, Metric::State),
    },
    Question {
        id: "RQ02",
        title: "RQ02 - Analysis time vs final status",
        chart: Chart::ByState(Metric::AnalysisTimeHours),
        correlation: (Metric::AnalysisTimeHours, Metric::ReviewCount),
    },
    Question {
        id: "RQ03",
        title: "RQ03 - Description vs final status",
        chart: Chart::ByState(Metric::DescriptionSize),
        correlation: (Metric::DescriptionSize, Metric::ReviewCount),
    },
    Question {
        id: "RQ04",
        title: "RQ04 - Interactions vs final status",
        chart: Chart::ByState(Metric::Interactions),
        correlation: (Metric::Interactions, Metric::ReviewCount),
    },
    Question {
        id: "RQ05",
        title: "RQ05 - PR size vs reviews",
        chart: Chart::Scatter {
            x: Metric::TotalChanges,
            y: Metric::ReviewCount,
        },
        correlation: (Metric::TotalChanges, Metric::ReviewCount),
    },
    Question {
        id: "RQ06",
        title: "RQ06 - Analysis time vs reviews",
        chart: Chart::Scatter {
            x: Metric::AnalysisTimeHours,
            y: Metric::ReviewCount,
        },
        correlation: (Metric::AnalysisTimeHours, Metric::ReviewCount),
    },
    Question {
        id: "RQ07",
        title: "RQ07 - Description vs reviews",
        chart: Chart::Scatter {
            x: Metric::DescriptionSize,
            y: Metric::ReviewCount,
        },
        correlation: (Metric::DescriptionSize, Metric::ReviewCount),
    },
    Question {
        id: "RQ08",
        title: "RQ08 - Interactions vs reviews",
        chart: Chart::Scatter {
            x: Metric::Interactions,
            y: Metric::ReviewCount,
        },
        correlation: (Metric::Interactions, Metric::ReviewCount),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_file_names_are_unique() {
        let mut names: Vec<String> = QUESTIONS.iter().map(Question::chart_file_name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 8);
        assert_eq!(QUESTIONS[0].chart_file_name(), "grafico_RQ01.svg");
    }

    #[test]
    fn test_only_first_question_is_categorical() {
        let categorical: Vec<&str> = QUESTIONS
            .iter()
            .filter(|q| !q.correlation.0.is_numeric() || !q.correlation.1.is_numeric())
            .map(|q| q.id)
            .collect();
        assert_eq!(categorical, vec!["RQ01"]);
    }

    #[test]
    fn test_state_has_no_numeric_value() {
        let row = PrMetrics {
            state: crate::dataset::PullRequestState::Merged,
            analysis_time_hours: 1.5,
            total_changes: 30,
            description_size: 12,
            interactions: 4,
            review_count: 2,
        };
        assert_eq!(Metric::State.value(&row), None);
        assert_eq!(Metric::AnalysisTimeHours.value(&row), Some(1.5));
        assert_eq!(Metric::TotalChanges.value(&row), Some(30.0));
    }
}
