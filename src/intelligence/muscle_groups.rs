// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Keyword-based categorization of exercise names into muscle groups.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse muscle group an exercise primarily trains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MuscleGroup {
    Chest,
    Back,
    Shoulders,
    Biceps,
    Triceps,
    Legs,
    Core,
    Cardio,
    Other,
}

impl MuscleGroup {
    /// All groups, in presentation order.
    pub const ALL: [MuscleGroup; 9] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Legs,
        MuscleGroup::Core,
        MuscleGroup::Cardio,
        MuscleGroup::Other,
    ];

    /// The six groups tracked for volume trends and recovery.
    pub const TRAINABLE: [MuscleGroup; 6] = [
        MuscleGroup::Chest,
        MuscleGroup::Back,
        MuscleGroup::Shoulders,
        MuscleGroup::Biceps,
        MuscleGroup::Triceps,
        MuscleGroup::Legs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Back => "Back",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Core => "Core",
            MuscleGroup::Cardio => "Cardio",
            MuscleGroup::Other => "Other",
        }
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const BICEPS_KEYWORDS: &[&str] = &["bicep", "curl", "chin up", "chin-up"];

const TRICEPS_KEYWORDS: &[&str] = &[
    "tricep",
    "pushdown",
    "push down",
    "skullcrusher",
    "skull crusher",
    "close grip",
    "close-grip",
    "dip",
];

/// Remaining groups, matched in order after the biceps/triceps checks.
const GROUP_KEYWORDS: &[(MuscleGroup, &[&str])] = &[
    (
        MuscleGroup::Chest,
        &["bench", "chest", "fly", "flye", "push up", "push-up", "pushup", "pec"],
    ),
    (
        MuscleGroup::Back,
        &[
            "row",
            "pull up",
            "pull-up",
            "pullup",
            "pulldown",
            "pull down",
            "deadlift",
            "shrug",
            "back extension",
            "good morning",
        ],
    ),
    (
        MuscleGroup::Shoulders,
        &[
            "shoulder",
            "overhead press",
            "ohp",
            "military press",
            "arnold",
            "lateral raise",
            "front raise",
            "rear delt",
            "face pull",
            "upright",
        ],
    ),
    (
        MuscleGroup::Legs,
        &[
            "squat",
            "leg",
            "lunge",
            "calf",
            "hamstring",
            "quad",
            "glute",
            "hip thrust",
            "hip abduct",
            "rdl",
            "romanian",
        ],
    ),
    (
        MuscleGroup::Core,
        &[
            "crunch",
            "plank",
            "sit up",
            "sit-up",
            "situp",
            "ab wheel",
            "abs",
            "oblique",
            "russian twist",
            "hollow",
        ],
    ),
    (
        MuscleGroup::Cardio,
        &[
            "run",
            "treadmill",
            "bike",
            "cycling",
            "elliptical",
            "stair",
            "jump rope",
            "sprint",
            "walk",
            "swim",
        ],
    ),
];

/// Categorize an exercise name. Matching is case-insensitive substring
/// matching. Biceps keywords are checked first but suppressed when the name
/// also mentions triceps (so "Tricep Curl Machine" lands in Triceps), then
/// triceps, then the remaining groups in table order. Unmatched names fall
/// through to [`MuscleGroup::Other`].
pub fn categorize(name: &str) -> MuscleGroup {
    let lowered = name.to_lowercase();

    if BICEPS_KEYWORDS.iter().any(|k| lowered.contains(k)) && !lowered.contains("tricep") {
        return MuscleGroup::Biceps;
    }
    if TRICEPS_KEYWORDS.iter().any(|k| lowered.contains(k)) {
        return MuscleGroup::Triceps;
    }

    for (group, keywords) in GROUP_KEYWORDS {
        if keywords.iter().any(|k| lowered.contains(k)) {
            return *group;
        }
    }

    MuscleGroup::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_categorization() {
        assert_eq!(categorize("Bench Press (Barbell)"), MuscleGroup::Chest);
        assert_eq!(categorize("Lat Pulldown (Cable)"), MuscleGroup::Back);
        assert_eq!(categorize("Seated Overhead Press"), MuscleGroup::Shoulders);
        assert_eq!(categorize("Squat (Barbell)"), MuscleGroup::Legs);
        assert_eq!(categorize("Plank"), MuscleGroup::Core);
        assert_eq!(categorize("Treadmill Run"), MuscleGroup::Cardio);
    }

    #[test]
    fn test_biceps_before_triceps() {
        assert_eq!(categorize("Hammer Curl"), MuscleGroup::Biceps);
        // "curl" alone would match biceps, but tricep wins on conflict.
        assert_eq!(categorize("Tricep Curl Machine"), MuscleGroup::Triceps);
        assert_eq!(categorize("Triceps Pushdown"), MuscleGroup::Triceps);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(categorize("BENCH PRESS"), MuscleGroup::Chest);
        assert_eq!(categorize("hammer CURL"), MuscleGroup::Biceps);
    }

    #[test]
    fn test_unknown_falls_to_other() {
        assert_eq!(categorize("Farmer's Carry"), MuscleGroup::Other);
        assert_eq!(categorize(""), MuscleGroup::Other);
    }

    #[test]
    fn test_serialized_label() {
        let json = serde_json::to_string(&MuscleGroup::Shoulders).unwrap();
        assert_eq!(json, "\"Shoulders\"");
    }
}
