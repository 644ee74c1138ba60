//! Bundled activity content.
//!
//! Every activity ships as a JSON manifest compiled into the binary. Manifests
//! are validated once at startup; a malformed one fails the whole catalog.

use std::time::Duration;

use quiz_core::ContentProvider;
use quiz_core::model::{
    ActivityError, ActivityId, ActivityKey, GradeLevel, Item, ItemDraft, ItemError, ItemId,
    Subject,
};
use serde::Deserialize;
use services::{EngineConfig, EngineConfigError, ReportPolicy, Rounds};
use thiserror::Error;

const BUNDLED: &[(&str, &str)] = &[
    (
        "multiplication_facts.json",
        include_str!("../content/multiplication_facts.json"),
    ),
    (
        "vocabulary_builder.json",
        include_str!("../content/vocabulary_builder.json"),
    ),
    (
        "states_and_capitals.json",
        include_str!("../content/states_and_capitals.json"),
    ),
    ("solar_system.json", include_str!("../content/solar_system.json")),
    (
        "history_timeline.json",
        include_str!("../content/history_timeline.json"),
    ),
];

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("{origin}: invalid manifest: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{origin}: {source}")]
    Activity {
        origin: String,
        #[source]
        source: ActivityError,
    },

    #[error("{origin}: item {index}: {source}")]
    Item {
        origin: String,
        index: usize,
        #[source]
        source: ItemError,
    },

    #[error("{origin}: {source}")]
    Config {
        origin: String,
        #[source]
        source: EngineConfigError,
    },

    #[error("{origin}: activity has no items")]
    Empty { origin: String },

    #[error("duplicate activity {0}")]
    Duplicate(ActivityKey),
}

//
// ─── MANIFEST ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Deserialize)]
struct Manifest {
    name: String,
    grade: GradeLevel,
    subject: Subject,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    config: ManifestConfig,
    items: Vec<ItemDraft>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestConfig {
    items_per_round: Option<usize>,
    distractor_count: Option<usize>,
    auto_advance_ms: Option<u64>,
    rounds: Rounds,
    report_policy: ReportPolicy,
    shuffle_choices: bool,
}

impl ManifestConfig {
    fn build(self) -> Result<EngineConfig, EngineConfigError> {
        let mut builder = EngineConfig::builder()
            .rounds(self.rounds)
            .report_policy(self.report_policy)
            .shuffle_choices(self.shuffle_choices);
        if let Some(n) = self.items_per_round {
            builder = builder.items_per_round(n);
        }
        if let Some(n) = self.distractor_count {
            builder = builder.distractor_count(n);
        }
        if let Some(ms) = self.auto_advance_ms {
            builder = builder.auto_advance_delay(Duration::from_millis(ms));
        }
        builder.build()
    }
}

//
// ─── ACTIVITY ──────────────────────────────────────────────────────────────────
//

/// One playable activity: its identity, engine settings and items.
#[derive(Debug, Clone)]
pub struct Activity {
    key: ActivityKey,
    name: String,
    description: Option<String>,
    config: EngineConfig,
    items: Vec<Item>,
}

impl Activity {
    /// Parse and validate one manifest. `origin` names it in errors.
    ///
    /// Items get sequential ids starting at 1.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the JSON, the name, any item or the engine
    /// settings are invalid, or if there are no items.
    pub fn from_manifest(origin: &str, json: &str) -> Result<Self, CatalogError> {
        let manifest: Manifest = serde_json::from_str(json).map_err(|source| CatalogError::Json {
            origin: origin.to_string(),
            source,
        })?;

        let activity =
            ActivityId::from_display_name(&manifest.name).map_err(|source| CatalogError::Activity {
                origin: origin.to_string(),
                source,
            })?;
        let key = ActivityKey::new(manifest.grade, manifest.subject, activity);

        let config = manifest
            .config
            .build()
            .map_err(|source| CatalogError::Config {
                origin: origin.to_string(),
                source,
            })?;

        if manifest.items.is_empty() {
            return Err(CatalogError::Empty {
                origin: origin.to_string(),
            });
        }
        let items = manifest
            .items
            .into_iter()
            .zip(1u64..)
            .enumerate()
            .map(|(index, (draft, id))| {
                draft
                    .validate(ItemId::new(id))
                    .map_err(|source| CatalogError::Item {
                        origin: origin.to_string(),
                        index,
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            key,
            name: manifest.name.trim().to_string(),
            description: manifest.description,
            config,
            items,
        })
    }

    #[must_use]
    pub fn key(&self) -> &ActivityKey {
        &self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl ContentProvider for Activity {
    type Item = Item;

    fn items(&self) -> Vec<Item> {
        self.items.clone()
    }
}

//
// ─── CATALOG ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    activities: Vec<Activity>,
}

impl Catalog {
    /// The activities compiled into this binary.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if any bundled manifest is invalid.
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_manifests(BUNDLED.iter().copied())
    }

    /// Build a catalog from `(origin, json)` pairs, sorted by grade, subject
    /// and activity id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` on the first invalid manifest or when two
    /// manifests resolve to the same activity key.
    pub fn from_manifests<'a>(
        manifests: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, CatalogError> {
        let mut activities: Vec<Activity> = Vec::new();
        for (origin, json) in manifests {
            let activity = Activity::from_manifest(origin, json)?;
            if activities.iter().any(|a| a.key == activity.key) {
                return Err(CatalogError::Duplicate(activity.key));
            }
            activities.push(activity);
        }
        activities.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(Self { activities })
    }

    #[must_use]
    pub fn activities(&self) -> &[Activity] {
        &self.activities
    }

    /// Activities of one grade, or all of them.
    pub fn for_grade(&self, grade: Option<GradeLevel>) -> impl Iterator<Item = &Activity> {
        self.activities
            .iter()
            .filter(move |a| grade.is_none_or(|g| a.key.grade == g))
    }

    /// Look an activity up by display name or id, e.g. `"States and Capitals"`
    /// or `states-and-capitals`.
    ///
    /// Returns `None` when nothing matches or when the name is ambiguous
    /// across grades and no grade was given.
    #[must_use]
    pub fn find(&self, grade: Option<GradeLevel>, name: &str) -> Option<&Activity> {
        let wanted = ActivityId::from_display_name(name).ok()?;
        let mut matches = self.for_grade(grade).filter(|a| a.key.activity == wanted);
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{QuizItem, ScoreSummary};
    use services::{EnginePhase, ProgressionEngine};
    use std::sync::{Arc, Mutex};

    const MINIMAL: &str = r#"{
        "name": "Tiny Quiz",
        "grade": "third",
        "subject": "math",
        "items": [
            { "prompt": "1 + 1 = ?", "answer": "2" },
            { "prompt": "2 + 2 = ?", "answer": "4", "explanation": "Count on your fingers." }
        ]
    }"#;

    #[test]
    fn bundled_catalog_is_valid() {
        let catalog = Catalog::bundled().unwrap();
        assert_eq!(catalog.activities().len(), BUNDLED.len());
        assert!(catalog.activities().iter().all(|a| !a.is_empty()));
    }

    #[test]
    fn bundled_catalog_covers_both_grades() {
        let catalog = Catalog::bundled().unwrap();
        for grade in GradeLevel::ALL {
            assert!(catalog.for_grade(Some(grade)).next().is_some());
        }
    }

    #[test]
    fn states_activity_deals_ten_per_round_forever() {
        let catalog = Catalog::bundled().unwrap();
        let states = catalog
            .find(Some(GradeLevel::Fifth), "States and Capitals")
            .unwrap();
        assert_eq!(states.key().subject, Subject::SocialStudies);
        assert_eq!(states.config().items_per_round(), Some(10));
        assert_eq!(states.config().rounds(), Rounds::Unlimited);
        assert!(states.items().iter().all(|i| i.choices().is_none()));
    }

    #[test]
    fn science_items_carry_curated_choices() {
        let catalog = Catalog::bundled().unwrap();
        let science = catalog.find(None, "solar-system").unwrap();
        assert!(science.items().iter().all(|i| i.choices().is_some()));
        assert!(science.items().iter().any(|i| i.fun_fact().is_some()));
    }

    #[test]
    fn minimal_manifest_uses_default_config() {
        let activity = Activity::from_manifest("tiny.json", MINIMAL).unwrap();
        assert_eq!(activity.key().to_string(), "third/math/tiny-quiz");
        assert_eq!(activity.config(), &EngineConfig::default());
        let ids: Vec<u64> = activity.items().iter().map(|i| i.id().value()).collect();
        assert_eq!(ids, [1, 2]);
        assert_eq!(
            activity.items()[1].explanation(),
            Some("Count on your fingers.")
        );
    }

    #[test]
    fn timeline_config_parses_fixed_rounds() {
        let catalog = Catalog::bundled().unwrap();
        let timeline = catalog.find(None, "American History Timeline").unwrap();
        assert_eq!(timeline.config().rounds(), Rounds::Fixed(2));
        assert_eq!(timeline.config().report_policy(), ReportPolicy::EveryPass);
    }

    #[test]
    fn single_pass_activities_report_every_item() {
        let catalog = Catalog::bundled().unwrap();
        let single: Vec<&Activity> = catalog
            .activities()
            .iter()
            .filter(|a| a.config().rounds() == Rounds::Single)
            .collect();
        assert!(!single.is_empty());

        for activity in single {
            let reports = Arc::new(Mutex::new(Vec::new()));
            let sink = Arc::clone(&reports);
            let mut engine = ProgressionEngine::new(activity.config().clone())
                .with_seed(3)
                .with_reporter(move |s: &ScoreSummary| sink.lock().unwrap().push(*s));
            engine.start_from(activity);

            while engine.phase() != EnginePhase::Completed {
                engine.submit_choice(0).unwrap();
                engine.advance();
            }

            let reports = reports.lock().unwrap();
            assert_eq!(reports.len(), 1, "{}", activity.name());
            assert_eq!(
                reports[0].total() as usize,
                activity.len(),
                "{}",
                activity.name()
            );
        }
    }

    #[test]
    fn truncated_single_pass_manifest_is_rejected() {
        let json = r#"{ "name": "Short", "grade": "third", "subject": "math",
            "config": { "rounds": "single", "items_per_round": 1 },
            "items": [ { "prompt": "1 + 1", "answer": "2" }, { "prompt": "2 + 2", "answer": "4" } ] }"#;
        let err = Activity::from_manifest("short.json", json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Config {
                source: EngineConfigError::PartialSinglePass(1),
                ..
            }
        ));
    }

    #[test]
    fn curated_answer_must_be_among_choices() {
        let json = r#"{ "name": "Planets", "grade": "fifth", "subject": "science",
            "items": [ { "prompt": "Largest planet?", "answer": "Jupiter", "choices": ["Mars", "Venus"] } ] }"#;
        let err = Activity::from_manifest("planets.json", json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Item {
                index: 0,
                source: ItemError::AnswerNotInChoices { .. },
                ..
            }
        ));
    }

    #[test]
    fn invalid_item_names_its_position() {
        let json = r#"{ "name": "Broken", "grade": "fifth", "subject": "science",
            "items": [ { "prompt": "ok?", "answer": "yes" }, { "prompt": " ", "answer": "x" } ] }"#;
        let err = Activity::from_manifest("broken.json", json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Item {
                index: 1,
                source: ItemError::EmptyPrompt,
                ..
            }
        ));
    }

    #[test]
    fn out_of_range_config_is_rejected() {
        let json = r#"{ "name": "Too Many", "grade": "third", "subject": "reading",
            "config": { "distractor_count": 12 },
            "items": [ { "prompt": "a", "answer": "b" } ] }"#;
        let err = Activity::from_manifest("many.json", json).unwrap_err();
        assert!(matches!(err, CatalogError::Config { .. }));
    }

    #[test]
    fn empty_and_malformed_manifests_fail() {
        let empty = r#"{ "name": "Nothing", "grade": "third", "subject": "math", "items": [] }"#;
        assert!(matches!(
            Activity::from_manifest("empty.json", empty).unwrap_err(),
            CatalogError::Empty { .. }
        ));
        assert!(matches!(
            Activity::from_manifest("bad.json", "{ not json").unwrap_err(),
            CatalogError::Json { .. }
        ));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = Catalog::from_manifests([("a.json", MINIMAL), ("b.json", MINIMAL)]).unwrap_err();
        assert!(matches!(err, CatalogError::Duplicate(_)));
    }

    #[test]
    fn find_is_scoped_by_grade() {
        let catalog = Catalog::bundled().unwrap();
        assert!(catalog.find(Some(GradeLevel::Third), "States and Capitals").is_none());
        assert!(catalog.find(None, "no such activity").is_none());
        assert!(catalog.find(None, "   ").is_none());
    }
}
