//! Default catalog of exercises, workout definitions and cycles.
//!
//! This is the seed data loaded by `liftloop seed`. Ids are derived from
//! names (UUIDv5) so seeding twice never duplicates anything.

use crate::store::CycleRecord;
use crate::types::*;
use crate::{Error, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use uuid::Uuid;

/// Namespace for seed ids
const SEED_NAMESPACE: Uuid = Uuid::from_u128(0x6c69_6674_6c6f_6f70_0000_0000_0000_0001);

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<std::result::Result<Catalog, String>> =
    Lazy::new(|| build_default_catalog_internal().map_err(|e| e.to_string()));

/// Seed data: exercises, variants, definitions and cycles
#[derive(Clone, Debug)]
pub struct Catalog {
    pub exercises: HashMap<String, Exercise>,
    pub variants: HashMap<String, Variant>,
    pub definitions: Vec<WorkoutDefinition>,
    pub cycles: Vec<CycleRecord>,
}

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> Result<&'static Catalog> {
    (*DEFAULT_CATALOG)
        .as_ref()
        .map_err(|message| Error::Invariant(message.clone()))
}

/// Builds the default catalog
///
/// Prefer `get_default_catalog()` outside of tests.
pub fn build_default_catalog() -> Result<Catalog> {
    build_default_catalog_internal()
}

fn seed_id(kind: &str, key: &str) -> Uuid {
    Uuid::new_v5(&SEED_NAMESPACE, format!("{}:{}", kind, key).as_bytes())
}

/// One slot of a seed definition: exercise, variants, limit
type SlotSpec<'a> = (&'a str, &'a [&'a str], LimitType, f64);

struct BlockSpec<'a> {
    name: &'a str,
    description: Option<&'a str>,
    sets: u32,
    transition_time: Option<f64>,
    slots: &'a [SlotSpec<'a>],
}

const REPS: LimitType = LimitType::Reps;
const SECS: LimitType = LimitType::TimeSeconds;
const LEFT: &[&str] = &["left side"];
const RIGHT: &[&str] = &["right side"];
const NONE: &[&str] = &[];

struct Builder {
    exercises: HashMap<String, Exercise>,
    variants: HashMap<String, Variant>,
}

impl Builder {
    fn lookup_exercise(&self, name: &str) -> Result<Exercise> {
        self.exercises
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Invariant(format!("Seed data uses unknown exercise '{}'", name)))
    }

    fn lookup_variant(&self, name: &str) -> Result<Variant> {
        self.variants
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Invariant(format!("Seed data uses unknown variant '{}'", name)))
    }

    fn exercise(&mut self, name: &str, description: Option<&str>) {
        self.exercises.insert(
            name.into(),
            Exercise {
                id: seed_id("exercise", name),
                name: name.into(),
                description: description.map(Into::into),
            },
        );
    }

    fn variant(&mut self, name: &str) {
        self.variants.insert(
            name.into(),
            Variant {
                id: seed_id("variant", name),
                name: name.into(),
                description: None,
            },
        );
    }

    fn definition(
        &self,
        name: &str,
        description: Option<&str>,
        blocks: &[BlockSpec],
    ) -> Result<WorkoutDefinition> {
        let mut built = Vec::with_capacity(blocks.len());
        for (block_idx, plan) in blocks.iter().enumerate() {
            let block_key = format!("{}/{}", name, block_idx);
            let mut exercises = Vec::with_capacity(plan.slots.len());
            for (slot_idx, (exercise, variants, limit_type, limit_value)) in
                plan.slots.iter().enumerate()
            {
                exercises.push(ExerciseSlot {
                    id: seed_id("slot", &format!("{}/{}", block_key, slot_idx)),
                    description: None,
                    exercise: self.lookup_exercise(exercise)?,
                    variants: variants
                        .iter()
                        .map(|v| self.lookup_variant(v))
                        .collect::<Result<_>>()?,
                    limit_type: *limit_type,
                    limit_value: *limit_value,
                });
            }
            built.push(Block {
                id: seed_id("block", &block_key),
                name: Some(plan.name.into()),
                description: plan.description.map(Into::into),
                sets_count: plan.sets,
                transition_time_seconds: plan.transition_time,
                exercises,
            });
        }

        Ok(WorkoutDefinition {
            id: seed_id("definition", name),
            name: name.into(),
            description: description.map(Into::into),
            blocks: built,
            last_finished: None,
        })
    }
}

/// Internal function that actually builds the catalog
fn build_default_catalog_internal() -> Result<Catalog> {
    let mut b = Builder {
        exercises: HashMap::new(),
        variants: HashMap::new(),
    };

    // ========================================================================
    // Exercises
    // ========================================================================

    b.exercise(
        "lower back stretch",
        Some("Lie on your back. Lift one leg up and twist over to one side."),
    );
    b.exercise(
        "crossbody lat stretch",
        Some("Lie in a child's pose. Clasp both hands together and twist into one side."),
    );
    b.exercise(
        "lateral hip openers",
        Some("In a wide-legged stance, bend from side-to-side, extending your hips."),
    );
    b.exercise(
        "airplanes",
        Some("Balanced on one foot, lean forward until the other leg is straight back and your arms are extended outwards."),
    );
    b.exercise(
        "single leg knee tuck",
        Some("Lying flat on your back, tuck one knee into your chest."),
    );
    b.exercise(
        "pigeon pose",
        Some("Sit with one leg stuck back on the ground and the other bent and tucked into your torso. Sit back."),
    );
    b.exercise(
        "cat camel",
        Some("On hands and knees, alternate between arching the back up (cat) and letting it sag (camel)."),
    );
    for name in [
        "recover",
        "high plank",
        "isometric bear crawl with shoulder taps",
        "side plank",
        "barbell bench press",
        "single-arm dumbbell incline bench press",
        "dumbbell front raise",
        "tricep dips",
        "dumbbell goblet squats",
        "dumbbell split squats",
        "barbell romanian deadlift",
    ] {
        b.exercise(name, None);
    }

    // ========================================================================
    // Variants
    // ========================================================================

    for name in ["left side", "right side", "5 second tempo", "4 second tempo"] {
        b.variant(name);
    }

    // ========================================================================
    // Workout definitions
    // ========================================================================

    let push = b.definition(
        "upper-body push",
        Some("push push push"),
        &[
            BlockSpec {
                name: "stretch",
                description: Some("get stretched"),
                sets: 1,
                transition_time: Some(5.0),
                slots: &[
                    ("lower back stretch", LEFT, SECS, 30.0),
                    ("lower back stretch", RIGHT, SECS, 30.0),
                    ("crossbody lat stretch", LEFT, SECS, 30.0),
                    ("crossbody lat stretch", RIGHT, SECS, 30.0),
                    ("recover", NONE, SECS, 30.0),
                ],
            },
            BlockSpec {
                name: "core",
                description: None,
                sets: 2,
                transition_time: None,
                slots: &[
                    ("high plank", NONE, SECS, 30.0),
                    ("isometric bear crawl with shoulder taps", NONE, SECS, 30.0),
                    ("recover", NONE, SECS, 15.0),
                ],
            },
            BlockSpec {
                name: "bench",
                description: None,
                sets: 3,
                transition_time: None,
                slots: &[
                    ("barbell bench press", &["5 second tempo"], REPS, 8.0),
                    ("recover", NONE, SECS, 60.0),
                ],
            },
            BlockSpec {
                name: "accessory",
                description: None,
                sets: 3,
                transition_time: None,
                slots: &[
                    (
                        "single-arm dumbbell incline bench press",
                        &["left side", "4 second tempo"],
                        REPS,
                        8.0,
                    ),
                    (
                        "single-arm dumbbell incline bench press",
                        &["right side", "4 second tempo"],
                        REPS,
                        8.0,
                    ),
                    ("recover", NONE, SECS, 30.0),
                    ("dumbbell front raise", NONE, REPS, 8.0),
                    ("recover", NONE, SECS, 30.0),
                    ("tricep dips", NONE, REPS, 15.0),
                    ("recover", NONE, SECS, 30.0),
                ],
            },
        ],
    )?;

    let legs = b.definition(
        "lower-body",
        None,
        &[
            BlockSpec {
                name: "stretch",
                description: None,
                sets: 1,
                transition_time: Some(5.0),
                slots: &[
                    ("lateral hip openers", NONE, SECS, 30.0),
                    ("airplanes", LEFT, SECS, 30.0),
                    ("airplanes", RIGHT, SECS, 30.0),
                    ("recover", NONE, SECS, 30.0),
                ],
            },
            BlockSpec {
                name: "core",
                description: None,
                sets: 2,
                transition_time: None,
                slots: &[
                    ("side plank", LEFT, SECS, 30.0),
                    ("side plank", RIGHT, SECS, 30.0),
                    ("recover", NONE, SECS, 15.0),
                ],
            },
            BlockSpec {
                name: "squats",
                description: None,
                sets: 3,
                transition_time: None,
                slots: &[
                    ("dumbbell goblet squats", &["5 second tempo"], REPS, 8.0),
                    ("recover", NONE, SECS, 30.0),
                ],
            },
            BlockSpec {
                name: "accessory",
                description: None,
                sets: 3,
                transition_time: None,
                slots: &[
                    ("dumbbell split squats", LEFT, REPS, 8.0),
                    ("dumbbell split squats", RIGHT, REPS, 8.0),
                    ("recover", NONE, SECS, 45.0),
                    ("barbell romanian deadlift", NONE, REPS, 8.0),
                    ("recover", NONE, SECS, 60.0),
                ],
            },
        ],
    )?;

    let stretch = b.definition(
        "daily stretch",
        None,
        &[BlockSpec {
            name: "stretch",
            description: None,
            sets: 1,
            transition_time: Some(5.0),
            slots: &[
                ("single leg knee tuck", LEFT, SECS, 15.0),
                ("single leg knee tuck", RIGHT, SECS, 15.0),
                ("pigeon pose", LEFT, SECS, 30.0),
                ("pigeon pose", RIGHT, SECS, 30.0),
                ("cat camel", NONE, SECS, 30.0),
            ],
        }],
    )?;

    // ========================================================================
    // Cycles
    // ========================================================================

    let cycles = vec![
        CycleRecord {
            id: seed_id("cycle", "default"),
            name: "default".into(),
            description: Some("Your weekday grind".into()),
            definition_ids: vec![push.id, legs.id],
        },
        CycleRecord {
            id: seed_id("cycle", "stretch"),
            name: "stretch".into(),
            description: None,
            definition_ids: vec![stretch.id],
        },
    ];

    Ok(Catalog {
        exercises: b.exercises,
        variants: b.variants,
        definitions: vec![push, legs, stretch],
        cycles,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::related::related_slot_ids;
    use crate::sequence::fixtures::full_instance;

    fn named<'a>(catalog: &'a Catalog, name: &str) -> &'a WorkoutDefinition {
        catalog
            .definitions
            .iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("no definition named {}", name))
    }

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = build_default_catalog().unwrap();
        for definition in &catalog.definitions {
            assert!(definition.validate().is_empty(), "{}", definition.name);
        }
        assert!(catalog.exercises.contains_key("recover"));
        assert_eq!(catalog.variants.len(), 4);
    }

    #[test]
    fn test_unknown_seed_name_is_an_error() {
        let mut b = Builder {
            exercises: HashMap::new(),
            variants: HashMap::new(),
        };
        b.exercise("lunge", None);
        let result = b.definition(
            "typo",
            None,
            &[BlockSpec {
                name: "main",
                description: None,
                sets: 1,
                transition_time: None,
                slots: &[("lunge", &["left sdie"], REPS, 8.0)],
            }],
        );
        assert!(matches!(result, Err(Error::Invariant(msg)) if msg.contains("left sdie")));
    }

    #[test]
    fn test_ids_are_stable_across_builds() {
        let a = build_default_catalog().unwrap();
        let b = build_default_catalog().unwrap();
        let ids = |c: &Catalog| c.definitions.iter().map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(ids(&a), ids(&b));
        assert_eq!(
            named(&a, "lower-body").blocks[3].exercises[1].id,
            named(&b, "lower-body").blocks[3].exercises[1].id,
        );
    }

    #[test]
    fn test_slot_ids_are_unique() {
        let catalog = get_default_catalog().unwrap();
        let mut seen = std::collections::HashSet::new();
        for definition in &catalog.definitions {
            for block in &definition.blocks {
                for slot in &block.exercises {
                    assert!(seen.insert(slot.id), "duplicate slot id {}", slot.id);
                }
            }
        }
    }

    #[test]
    fn test_tempo_incline_press_sides_pair_up() {
        let catalog = get_default_catalog().unwrap();
        let push = named(catalog, "upper-body push").clone();
        let accessory = push.blocks[3].clone();
        let workout = full_instance(push);
        let left = workout
            .exercise_instances
            .iter()
            .find(|e| e.slot_id == accessory.exercises[0].id)
            .unwrap();

        let related = related_slot_ids(&workout, left).unwrap();
        assert_eq!(
            related,
            std::collections::HashSet::from([accessory.exercises[0].id, accessory.exercises[1].id])
        );
    }

    #[test]
    fn test_cycles_reference_known_definitions() {
        let catalog = get_default_catalog().unwrap();
        for cycle in &catalog.cycles {
            for id in &cycle.definition_ids {
                assert!(catalog.definitions.iter().any(|d| d.id == *id));
            }
        }
    }
}
