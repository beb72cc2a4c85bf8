//! Scroll-driven story steps.
//!
//! Each step of the narrative implies a year and a dataset. Entering a step
//! replaces the year selector and switches datasets; the other dropdown
//! selections carry over.

use crash_map_crash_models::{DatasetKind, FilterCriteria, Selector};
use serde::Serialize;

/// One narrative section of the story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStep {
    /// Section heading.
    pub title: &'static str,
    /// Year the section focuses on.
    pub year: Selector<i32>,
    /// Dataset shown during the section.
    pub dataset: DatasetKind,
}

/// The story, in scroll order.
pub const STORY_STEPS: &[StoryStep] = &[
    StoryStep {
        title: "Nashville's crashes at a glance",
        year: Selector::All,
        dataset: DatasetKind::AllIncidents,
    },
    StoryStep {
        title: "2019: the baseline",
        year: Selector::Only(2019),
        dataset: DatasetKind::AllIncidents,
    },
    StoryStep {
        title: "2020: emptier roads",
        year: Selector::Only(2020),
        dataset: DatasetKind::AllIncidents,
    },
    StoryStep {
        title: "2021: traffic returns",
        year: Selector::Only(2021),
        dataset: DatasetKind::AllIncidents,
    },
    StoryStep {
        title: "2022",
        year: Selector::Only(2022),
        dataset: DatasetKind::AllIncidents,
    },
    StoryStep {
        title: "2023",
        year: Selector::Only(2023),
        dataset: DatasetKind::AllIncidents,
    },
    StoryStep {
        title: "When crashes hurt",
        year: Selector::All,
        dataset: DatasetKind::InjuryFatality,
    },
];

/// Returns the step at `index`, if there is one.
#[must_use]
pub fn story_step(index: usize) -> Option<&'static StoryStep> {
    STORY_STEPS.get(index)
}

impl StoryStep {
    /// Returns `criteria` with this step's year; all other selectors are
    /// kept.
    #[must_use]
    pub fn apply(&self, criteria: &FilterCriteria) -> FilterCriteria {
        criteria.clone().with_year(self.year.clone())
    }
}
