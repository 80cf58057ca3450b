use preference_engine::{
    AlgorithmParams, FeedbackKind, ItemPool, Selection, SessionController, SessionSettings,
    TurnOutcome,
};
use std::collections::HashSet;

const STYLES: [&str; 6] = [
    "classic",
    "creative",
    "fashionista",
    "modern",
    "sophisticated",
    "street",
];

fn catalog(styles: &[&str], per_style: usize) -> ItemPool {
    styles
        .iter()
        .map(|style| {
            let items = (0..per_style)
                .map(|i| format!("Styles/women/{}-style/{:02}.jpg", style, i))
                .collect();
            (style.to_string(), items)
        })
        .collect()
}

fn quiz(seed: u64) -> SessionController {
    let settings =
        SessionSettings::new(STYLES.iter().map(|s| s.to_string()).collect()).with_seed(seed);
    SessionController::new("women", AlgorithmParams::reference(), settings)
}

#[test]
fn test_full_quiz_covers_mandatory_styles_first() {
    for seed in 0..20 {
        let mut session = quiz(seed);
        let pool = catalog(&STYLES, 20);

        let mut order = Vec::new();
        let summary = session.run(&pool, &mut |selection: &Selection| {
            order.push(selection.category.clone());
            Some(if selection.category == "street" {
                FeedbackKind::Like
            } else {
                FeedbackKind::Dislike
            })
        });

        assert_eq!(summary.history.len(), 30, "seed {}", seed);

        let first_six: HashSet<&String> = order.iter().take(6).collect();
        assert_eq!(first_six.len(), 6, "seed {} order {:?}", seed, order);

        assert_eq!(summary.ranked_top_categories.len(), 2);
        assert_eq!(summary.ranked_top_categories[0].category, "street");
    }
}

#[test]
fn test_second_cycle_repeats_coverage() {
    let mut session = quiz(5);
    let pool = catalog(&STYLES, 20);

    let mut order = Vec::new();
    session.run(&pool, &mut |selection: &Selection| {
        order.push(selection.category.clone());
        Some(FeedbackKind::Like)
    });

    // With fresh items everywhere, every turn is served by a cycle
    let second: HashSet<&String> = order.iter().skip(6).take(6).collect();
    assert_eq!(second.len(), 6);
    assert_eq!(session.cycler().cycle(), 5);
}

#[test]
fn test_items_never_repeat_within_session() {
    let mut session = quiz(77);
    let pool = catalog(&STYLES, 5);

    let summary = session.run(&pool, &mut |_: &Selection| Some(FeedbackKind::Like));

    let unique: HashSet<&String> = summary.history.iter().map(|e| &e.item).collect();
    assert_eq!(unique.len(), summary.history.len());
}

#[test]
fn test_session_ends_early_when_pool_runs_dry() {
    let mut session = quiz(3);
    let pool = catalog(&["classic", "modern"], 2);

    let summary = session.run(&pool, &mut |_: &Selection| Some(FeedbackKind::Dislike));

    assert_eq!(summary.history.len(), 4);
    assert!(session.is_exhausted());
    assert!(session.is_complete());
    assert_eq!(session.next_turn(&pool), TurnOutcome::NoMoreItems);
}

#[test]
fn test_empty_catalog() {
    let mut session = quiz(1);
    let summary = session.run(&ItemPool::new(), &mut |_: &Selection| Some(FeedbackKind::Like));

    assert!(summary.history.is_empty());
    assert!(summary.ranked_top_categories.is_empty());
}

#[test]
fn test_history_matches_tracker_state() {
    let mut session = quiz(42);
    let pool = catalog(&STYLES, 10);

    let summary = session.run(&pool, &mut |selection: &Selection| {
        Some(FeedbackKind::from(if selection.turn % 3 == 0 { "dislike" } else { "like" }))
    });

    for style in STYLES {
        let recorded = summary.history.iter().filter(|e| e.category == style).count();
        assert_eq!(session.tracker().interaction_count(style) as usize, recorded);
    }

    for window in summary.history.windows(2) {
        assert!(window[0].timestamp <= window[1].timestamp);
    }

    for ranked in &summary.ranked_top_categories {
        assert!((-10.0..=10.0).contains(&ranked.score));
    }
}

#[test]
fn test_same_seed_same_session() {
    let pool = catalog(&STYLES, 10);
    let like_modern = |selection: &Selection| {
        Some(if selection.category == "modern" {
            FeedbackKind::Like
        } else {
            FeedbackKind::Dislike
        })
    };

    let a = quiz(1234).run(&pool, &mut like_modern.clone());
    let b = quiz(1234).run(&pool, &mut like_modern.clone());

    let items_a: Vec<&String> = a.history.iter().map(|e| &e.item).collect();
    let items_b: Vec<&String> = b.history.iter().map(|e| &e.item).collect();
    assert_eq!(items_a, items_b);
}

#[test]
fn test_summary_serializes() {
    let mut session = quiz(8);
    let pool = catalog(&STYLES, 3);
    let summary = session.run(&pool, &mut |_: &Selection| Some(FeedbackKind::Like));

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["history"][0]["feedback"], "like");
    assert!(json["ranked_top_categories"].is_array());
}
