//! End-to-end session flows over a small scripted story.
use std::sync::Arc;

use harrowlight_game::{
    Chapter, Effect, EventPool, Position, RESUME_TEXT, SessionError, StoryEngine, StoryEvent,
    StoryStore, StorySession, TransitionError,
};

const CHAPTER01: &str = r#"{
    "start_node": "shore",
    "initial_state": {
        "sanity": 100,
        "inventory": [],
        "stats": { "str": 10, "dex": 10, "int": 10, "cha": 10 }
    },
    "nodes": {
        "shore": {
            "text": "The ferry leaves you on wet shale below the Harrowlight.",
            "visual": "shoreline",
            "choices": [
                { "text": "Follow the cart track", "next_node": "gate" }
            ]
        },
        "gate": {
            "text": "A rusted gate bars the lighthouse yard.",
            "choices": [
                { "text": "Call out", "next_node": "shore" },
                {
                    "text": "Unlock the wicket",
                    "condition": { "has_item": "key" },
                    "next_node": "sanctum"
                },
                { "text": "Climb the wall", "next_node": "courtyard" }
            ]
        },
        "courtyard": {
            "text": "Gravel and gull bones. A key glints under the cistern.",
            "choices": [
                {
                    "text": "Take the key",
                    "effect": { "sanity": -10, "add_item": "key" },
                    "next_node": "gate"
                },
                { "text": "Knock on the keeper's door", "next_chapter": "chapter02_tower" },
                {
                    "text": "Squeeze through the coal chute",
                    "roll": {
                        "dice": "1d20",
                        "bonus_stat": "dex",
                        "target": 12,
                        "condition": "gte",
                        "success_node": "sanctum",
                        "failure_node": "gate"
                    },
                    "next_node": "dummy"
                },
                { "text": "Give up and swim for the mainland", "effect": { "reset": true } }
            ]
        },
        "sanctum": {
            "text": "Inside the yard at last. The tower door stands open.",
            "choices": [
                { "text": "Enter the tower", "next_chapter": "chapter02_tower" }
            ]
        }
    }
}"#;

const CHAPTER02: &str = r#"{
    "start_node": "stair",
    "nodes": {
        "stair": {
            "text": "One hundred and nine steps spiral into the dark.",
            "choices": []
        }
    }
}"#;

fn fixture_store() -> StoryStore {
    let store = StoryStore::new();
    store.insert_chapter("chapter01_arrival", Chapter::from_json(CHAPTER01).unwrap());
    store.insert_chapter("chapter02_tower", Chapter::from_json(CHAPTER02).unwrap());
    store
}

fn fixture_session(seed: u64) -> StorySession {
    StoryEngine::new(fixture_store()).new_session(seed)
}

#[test]
fn session_starts_at_the_declared_start_node() {
    let mut session = fixture_session(1);
    let view = session.start().unwrap();

    assert!(view.text.contains("wet shale"));
    assert_eq!(view.visual, "shoreline");
    assert_eq!(view.stats.sanity, 100);
    assert!(view.stats.inventory.is_empty());
    for stat in ["str", "dex", "int", "cha"] {
        assert_eq!(view.stats.attributes.get(stat), Some(&10));
    }
    assert_eq!(view.choices.len(), 1);
    assert_eq!(view.choices[0].index, 0);
    assert_eq!(
        session.state().unwrap().position,
        Position::positioned("chapter01_arrival", "shore")
    );
}

#[test]
fn condition_free_choice_reaches_its_destination() {
    let mut session = fixture_session(2);
    session.start().unwrap();
    let view = session.choose(0).unwrap();

    assert!(view.text.contains("rusted gate"));
    // The key-gated choice is filtered out of the recomputed list.
    assert_eq!(view.choices.len(), 2);
    assert!(view.choices.iter().all(|choice| choice.text != "Unlock the wicket"));
}

#[test]
fn presented_index_remaps_around_the_gated_choice() {
    let mut session = fixture_session(3);
    session.start().unwrap();
    session.choose(0).unwrap();

    // Without the key, presented index 1 is the third underlying choice.
    let view = session.choose(1).unwrap();
    assert!(view.text.contains("Gravel and gull bones"));

    // Taking the key costs sanity and unlocks the gated choice.
    let view = session.choose(0).unwrap();
    assert!(view.text.contains("rusted gate"));
    assert_eq!(view.stats.sanity, 90);
    assert_eq!(view.stats.inventory, vec!["key"]);
    assert_eq!(view.choices.len(), 3);

    // Now presented index 1 is the gated choice itself.
    let view = session.choose(1).unwrap();
    assert!(view.text.contains("Inside the yard"));
}

#[test]
fn chapter_crossing_lands_on_the_new_start_node() {
    let mut session = fixture_session(4);
    session.start().unwrap();
    session.choose(0).unwrap();
    session.choose(1).unwrap(); // climb the wall -> courtyard
    let view = session.choose(1).unwrap(); // knock -> chapter02_tower

    assert!(view.text.contains("spiral into the dark"));
    assert_eq!(
        session.state().unwrap().position,
        Position::positioned("chapter02_tower", "stair")
    );
}

#[test]
fn roll_choices_surface_a_summary_and_land_on_a_roll_target() {
    let mut session = fixture_session(5);
    session.start().unwrap();
    session.choose(0).unwrap();
    session.choose(1).unwrap(); // -> courtyard
    let view = session.choose(2).unwrap(); // coal chute roll

    let summary = view.roll.expect("roll summary attached");
    assert!(summary.starts_with("Rolled "));
    assert!(summary.contains("(dex)"));
    assert!(summary.contains(">= 12") || summary.contains("vs 12"));
    let landed = &session.state().unwrap().position;
    assert!(
        *landed == Position::positioned("chapter01_arrival", "sanctum")
            || *landed == Position::positioned("chapter01_arrival", "gate"),
        "unexpected landing {landed:?}"
    );
}

#[test]
fn reset_effect_restores_the_canonical_start() {
    let mut session = fixture_session(7);
    session.start().unwrap();
    session.choose(0).unwrap();
    session.choose(1).unwrap(); // -> courtyard
    session.choose(0).unwrap(); // take key: sanity 90, inventory [key]
    session.choose(2).unwrap(); // climb the wall -> courtyard
    let view = session.choose(3).unwrap(); // give up: reset

    assert_eq!(view.stats.sanity, 100);
    assert!(view.stats.inventory.is_empty());
    assert!(view.text.contains("wet shale"));
    assert_eq!(
        session.state().unwrap().position,
        Position::positioned("chapter01_arrival", "shore")
    );
}

#[test]
fn stale_index_is_refiltered_at_selection_time() {
    let mut session = fixture_session(8);
    session.start().unwrap();
    session.choose(0).unwrap();
    session.choose(1).unwrap(); // -> courtyard
    let view = session.choose(0).unwrap(); // take key, back at the gate
    assert_eq!(view.choices.len(), 3);

    // The key is lost between render and selection; index 2 was valid
    // on the stale list but only two choices are visible now.
    session.state_mut().unwrap().inventory.clear();
    let err = session.choose(2).unwrap_err();
    assert!(matches!(err, SessionError::InvalidChoice { index: 2 }));
}

#[test]
fn missing_content_is_a_hard_error_not_a_silent_deref() {
    let store = fixture_store();
    let mut session = StoryEngine::new(store).new_session(9);
    session.start().unwrap();
    session.state_mut().unwrap().position = Position::positioned("chapter01_arrival", "gone");
    let err = session.choose(0).unwrap_err();
    assert!(matches!(
        err,
        SessionError::Transition(TransitionError::NodeNotFound { .. })
    ));
}

fn eerie_pool() -> EventPool {
    EventPool {
        events: vec![StoryEvent {
            text: "Far out on the water, a second light answers the Harrowlight.".to_string(),
            visual: Some("twin-light".to_string()),
            effect: Some(Effect {
                sanity: -3,
                ..Effect::default()
            }),
        }],
    }
}

#[test]
fn interrupts_store_the_exact_destination_and_resume_to_it() {
    let store = Arc::new(fixture_store());
    store.set_events(eerie_pool());

    let mut interrupted_seen = false;
    let mut normal_seen = false;
    for seed in 0..300 {
        let mut session = StorySession::new(store.clone(), seed);
        session.start().unwrap();
        let view = session.choose(0).unwrap(); // shore -> gate, same chapter

        match session.state().unwrap().position.clone() {
            Position::Interrupted {
                pending_chapter,
                pending_node,
                ..
            } => {
                interrupted_seen = true;
                assert_eq!(pending_chapter, "chapter01_arrival");
                assert_eq!(pending_node, "gate");
                assert_eq!(view.choices.len(), 1);
                assert_eq!(view.choices[0].text, RESUME_TEXT);
                assert!(view.text.contains("second light"));

                let sanity_before = view.stats.sanity;
                let resumed = session.choose(0).unwrap();
                assert!(resumed.text.contains("rusted gate"));
                assert_eq!(resumed.stats.sanity, sanity_before - 3);
                assert_eq!(
                    session.state().unwrap().position,
                    Position::positioned("chapter01_arrival", "gate")
                );
            }
            Position::Positioned { node, .. } => {
                normal_seen = true;
                assert_eq!(node, "gate");
            }
        }
        if interrupted_seen && normal_seen {
            break;
        }
    }
    assert!(interrupted_seen, "no seed triggered an interrupt");
    assert!(normal_seen, "every seed triggered an interrupt");
}

#[test]
fn chapter_crossings_are_never_interrupted() {
    let store = Arc::new(fixture_store());
    store.set_events(eerie_pool());

    for seed in 0..120 {
        let mut session = StorySession::new(store.clone(), seed);
        session.start().unwrap();
        session.choose(0).unwrap();
        if session.state().unwrap().position.is_interrupted() {
            continue; // this walk detoured before the crossing
        }
        session.choose(1).unwrap(); // -> courtyard
        if session.state().unwrap().position.is_interrupted() {
            continue;
        }
        session.choose(1).unwrap(); // knock -> chapter02_tower
        assert_eq!(
            session.state().unwrap().position,
            Position::positioned("chapter02_tower", "stair"),
            "crossing was interrupted for seed {seed}"
        );
    }
}

#[test]
fn resume_with_a_dead_pending_node_falls_back_to_chapter_start() {
    let mut session = fixture_session(10);
    session.start().unwrap();
    session.state_mut().unwrap().position = Position::Interrupted {
        event: eerie_pool().events[0].clone(),
        pending_chapter: "chapter01_arrival".to_string(),
        pending_node: "vanished".to_string(),
    };
    let view = session.choose(0).unwrap();
    assert!(view.text.contains("wet shale"));
    assert_eq!(
        session.state().unwrap().position,
        Position::positioned("chapter01_arrival", "shore")
    );
}
