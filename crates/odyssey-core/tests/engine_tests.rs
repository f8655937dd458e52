//! Tests for the mission-completion transaction and engine queries.

use odyssey_core::{
    apply_attempt, Catalog, ContentCatalog, EngineSettings, ErrorClass, InMemoryRepository,
    JsonFileRepository, MissionAttempt, OdysseyError, ProgressDefaults, ProgressRepository,
    ProgressionEngine, SkillTrack, UserProgress,
};
use std::sync::atomic::{AtomicBool, Ordering};

const CATALOG: &str = r#"
[[planets]]
id = "earth"
name = "Earth"
order = 1

[[planets]]
id = "mars"
name = "Mars"
order = 2
unlock = { type = "mission_count_on_planet", planet_id = "earth", count = 2 }

[[planets]]
id = "venus"
name = "Venus"
order = 3
unlock = { type = "min_level", level = 2 }

[[missions]]
id = "html-basics"
planet_id = "earth"
tech_type = "fullStack"
xp_reward = 50

[[missions]]
id = "css-basics"
planet_id = "earth"
tech_type = "fullStack"
xp_reward = 30
prerequisites = ["html-basics"]

[[missions]]
id = "warmup"
planet_id = "earth"
tech_type = "algorithms"
xp_reward = 140

[[missions]]
id = "timed-sort"
planet_id = "mars"
tech_type = "algorithms"
xp_reward = 100
time_limit = 60

[[achievements]]
id = "first-steps"
name = "First Steps"
criteria = { type = "total_mission_count", count = 1 }

[[achievements]]
id = "algorithmist"
name = "Algorithmist"
criteria = { type = "category_xp", category = "algorithms", amount = 200 }
"#;

fn engine() -> ProgressionEngine<Catalog, InMemoryRepository> {
    ProgressionEngine::new(
        Catalog::from_toml_str(CATALOG).unwrap(),
        InMemoryRepository::new(ProgressDefaults::default()),
    )
}

#[test]
fn test_fresh_user_completes_html_basics() {
    let engine = engine();
    let result = engine
        .complete_mission(&MissionAttempt::completed("alice", "html-basics", 42.0, 0))
        .unwrap();

    assert_eq!(result.score, 100);
    assert_eq!(result.xp_earned, 50);
    assert_eq!(result.total_xp, 50);
    assert_eq!(result.new_level.value(), 1);
    assert!(!result.leveled_up);
    assert_eq!(result.newly_unlocked_achievements, vec!["first-steps"]);
    assert!(result.newly_unlocked_planets.is_empty());

    let stored = engine.repository().load("alice").unwrap();
    assert_eq!(stored.xp().total(), 50);
    assert_eq!(stored.xp().track(SkillTrack::FullStack), 50);
    assert_eq!(stored.level().value(), 1);
    assert_eq!(
        stored.completed_missions().iter().collect::<Vec<_>>(),
        vec!["html-basics"]
    );
}

#[test]
fn test_level_up_from_140_to_170() {
    let engine = engine();
    engine
        .complete_mission(&MissionAttempt::completed("bob", "warmup", 10.0, 0))
        .unwrap();
    assert_eq!(engine.repository().load("bob").unwrap().xp().total(), 140);

    let result = engine
        .complete_mission(&MissionAttempt::completed("bob", "css-basics", 10.0, 0))
        .unwrap();
    assert_eq!(result.total_xp, 170);
    assert_eq!(result.previous_level.value(), 1);
    assert_eq!(result.new_level.value(), 2);
    assert!(result.leveled_up);
    // Both the level gate and the mission-count gate open on this completion
    assert_eq!(result.newly_unlocked_planets, vec!["mars", "venus"]);
}

#[test]
fn test_second_completion_is_rejected_without_credit() {
    let engine = engine();
    let attempt = MissionAttempt::completed("carol", "html-basics", 5.0, 0);
    engine.complete_mission(&attempt).unwrap();

    let err = engine.complete_mission(&attempt).unwrap_err();
    assert_eq!(
        err,
        OdysseyError::AlreadyCompleted {
            user_id: "carol".into(),
            mission_id: "html-basics".into()
        }
    );
    assert_eq!(err.class(), ErrorClass::Validation);

    let stored = engine.repository().load("carol").unwrap();
    assert_eq!(stored.xp().total(), 50);
    assert_eq!(stored.version(), 1);
}

#[test]
fn test_unknown_mission() {
    let engine = engine();
    let err = engine
        .complete_mission(&MissionAttempt::completed("dave", "time-travel", 1.0, 0))
        .unwrap_err();
    assert_eq!(err, OdysseyError::MissionNotFound("time-travel".into()));
    assert_eq!(err.status_code(), 404);
}

#[test]
fn test_failed_attempt_earns_nothing_and_is_not_recorded() {
    let engine = engine();
    let result = engine
        .complete_mission(&MissionAttempt::failed("erin", "html-basics", 5.0, 0))
        .unwrap();
    assert_eq!(result.score, 0);
    assert_eq!(result.xp_earned, 0);
    assert!(result.newly_unlocked_achievements.is_empty());

    let stored = engine.repository().load("erin").unwrap();
    assert!(!stored.has_completed("html-basics"));
    assert_eq!(stored.xp().total(), 0);
    // Nothing changed, nothing written
    assert_eq!(stored.version(), 0);

    // The mission can still be completed afterwards
    let result = engine
        .complete_mission(&MissionAttempt::completed("erin", "html-basics", 5.0, 0))
        .unwrap();
    assert_eq!(result.xp_earned, 50);
}

#[test]
fn test_completed_with_zero_score_is_still_recorded() {
    let engine = engine();
    let result = engine
        .complete_mission(&MissionAttempt::completed("frank", "html-basics", 5.0, 30))
        .unwrap();
    assert_eq!(result.score, 0);
    assert_eq!(result.xp_earned, 0);
    let stored = engine.repository().load("frank").unwrap();
    assert!(stored.has_completed("html-basics"));
    assert_eq!(stored.mission_score("html-basics"), Some(0));
}

#[test]
fn test_time_limit_scoring_flows_into_xp() {
    let engine = engine();
    // 100 + floor((1 - 30/60) * 20) - 3 * 5 = 95 -> 95 XP of 100
    let result = engine
        .complete_mission(&MissionAttempt::completed("gina", "timed-sort", 30.0, 3))
        .unwrap();
    assert_eq!(result.score, 95);
    assert_eq!(result.xp_earned, 95);

    // Overtime: 100 - 20 = 80
    let result = engine
        .complete_mission(&MissionAttempt::completed("hank", "timed-sort", 90.0, 0))
        .unwrap();
    assert_eq!(result.score, 80);
}

#[test]
fn test_invalid_inputs_rejected_before_load() {
    let engine = engine();
    assert!(matches!(
        engine.complete_mission(&MissionAttempt::completed("", "html-basics", 1.0, 0)),
        Err(OdysseyError::InvalidUserId(_))
    ));
    assert!(matches!(
        engine.complete_mission(&MissionAttempt::completed("ivan", "html-basics", -3.0, 0)),
        Err(OdysseyError::InvalidAttempt(_))
    ));
    assert!(engine.repository().is_empty());
}

#[test]
fn test_prerequisites_enforced_when_configured() {
    let engine = ProgressionEngine::with_settings(
        Catalog::from_toml_str(CATALOG).unwrap(),
        InMemoryRepository::default(),
        EngineSettings {
            enforce_prerequisites: true,
        },
    );
    let err = engine
        .complete_mission(&MissionAttempt::completed("judy", "css-basics", 1.0, 0))
        .unwrap_err();
    assert_eq!(
        err,
        OdysseyError::PrerequisitesNotMet {
            mission_id: "css-basics".into(),
            missing: vec!["html-basics".into()],
        }
    );

    engine
        .complete_mission(&MissionAttempt::completed("judy", "html-basics", 1.0, 0))
        .unwrap();
    assert!(engine
        .complete_mission(&MissionAttempt::completed("judy", "css-basics", 1.0, 0))
        .is_ok());
}

#[test]
fn test_prerequisites_ignored_by_default() {
    let engine = engine();
    assert!(engine
        .complete_mission(&MissionAttempt::completed("kim", "css-basics", 1.0, 0))
        .is_ok());
}

#[test]
fn test_dedicated_student_unlocks_on_tenth_mission() {
    let mut toml = String::from(
        r#"
[[planets]]
id = "earth"

[[achievements]]
id = "dedicated-student"
criteria = { type = "total_mission_count", count = 10 }
"#,
    );
    for i in 1..=10 {
        toml.push_str(&format!(
            "\n[[missions]]\nid = \"lesson-{i}\"\nplanet_id = \"earth\"\ntech_type = \"ai\"\nxp_reward = 5\n"
        ));
    }
    let engine = ProgressionEngine::new(
        Catalog::from_toml_str(&toml).unwrap(),
        InMemoryRepository::default(),
    );

    for i in 1..=9 {
        let result = engine
            .complete_mission(&MissionAttempt::completed("lena", &format!("lesson-{i}"), 1.0, 0))
            .unwrap();
        assert!(result.newly_unlocked_achievements.is_empty());
    }
    let result = engine
        .complete_mission(&MissionAttempt::completed("lena", "lesson-10", 1.0, 0))
        .unwrap();
    assert_eq!(result.newly_unlocked_achievements, vec!["dedicated-student"]);
}

#[test]
fn test_evaluate_unlocks_is_read_only() {
    let engine = engine();
    engine
        .complete_mission(&MissionAttempt::completed("mia", "html-basics", 1.0, 0))
        .unwrap();

    // Seed a document that is eligible for more than it has recorded
    let mut stale = engine.repository().load("mia").unwrap();
    let applied = apply_attempt(
        engine.catalog(),
        engine.settings(),
        &stale,
        &MissionAttempt::completed("mia", "warmup", 1.0, 0),
    )
    .unwrap();
    assert!(applied.changed);
    stale = applied.progress;
    let report_before = engine.evaluate_unlocks("mia").unwrap();
    assert!(report_before.pending_planets.is_empty());
    assert!(report_before.planets.contains(&"earth".to_string()));
    assert_eq!(report_before.achievements, vec!["first-steps"]);

    // The pure apply never touched the repository
    assert!(!engine.repository().load("mia").unwrap().has_completed("warmup"));
    assert!(stale.has_completed("warmup"));

    let version = engine.repository().load("mia").unwrap().version();
    engine.evaluate_unlocks("mia").unwrap();
    assert_eq!(engine.repository().load("mia").unwrap().version(), version);
}

#[test]
fn test_evaluate_unlocks_reports_pending_after_catalog_change() {
    let repo = InMemoryRepository::default();
    let old_engine = ProgressionEngine::new(Catalog::from_toml_str(CATALOG).unwrap(), &repo);
    old_engine
        .complete_mission(&MissionAttempt::completed("nora", "html-basics", 1.0, 0))
        .unwrap();

    // New content: a planet that opens for anyone with one mission done
    let updated = format!(
        "{}\n[[planets]]\nid = \"moon\"\nunlock = {{ type = \"mission_count_on_planet\", planet_id = \"earth\", count = 1 }}\n",
        CATALOG
    );
    let new_engine = ProgressionEngine::new(Catalog::from_toml_str(&updated).unwrap(), &repo);
    let report = new_engine.evaluate_unlocks("nora").unwrap();
    assert_eq!(report.pending_planets, vec!["moon"]);
    assert!(report.planets.contains(&"moon".to_string()));
    assert!(!repo.load("nora").unwrap().unlocked_planets().contains("moon"));

    // The next completion records it
    let result = new_engine
        .complete_mission(&MissionAttempt::completed("nora", "css-basics", 1.0, 0))
        .unwrap();
    assert!(result.newly_unlocked_planets.contains(&"moon".to_string()));
}

#[test]
fn test_set_primary_path() {
    let engine = engine();
    assert_eq!(engine.set_primary_path("omar", "cyber-security").unwrap(), SkillTrack::Cybersecurity);
    let stored = engine.repository().load("omar").unwrap();
    assert_eq!(stored.primary_path(), SkillTrack::Cybersecurity);
    assert!(stored.unlocked_achievements().is_empty());

    let err = engine.set_primary_path("omar", "basket-weaving").unwrap_err();
    assert_eq!(err, OdysseyError::InvalidPath("basket-weaving".into()));
    assert_eq!(
        engine.repository().load("omar").unwrap().primary_path(),
        SkillTrack::Cybersecurity
    );
}

#[test]
fn test_status_summary() {
    let engine = engine();
    engine
        .complete_mission(&MissionAttempt::completed("pat", "warmup", 1.0, 0))
        .unwrap();
    let summary = engine.status("pat").unwrap();

    assert_eq!(summary.total_xp, 140);
    assert_eq!(summary.level.value(), 1);
    assert_eq!(summary.title, "Cadet");
    assert_eq!(summary.xp_to_next_level, 25);
    assert_eq!(summary.progress_percent, 85);
    assert_eq!(summary.xp_by_track[&SkillTrack::Algorithms], 140);
    assert_eq!(summary.xp_by_track[&SkillTrack::Ai], 0);
    assert_eq!(summary.completed_missions, 1);

    let algorithmist = summary
        .achievements
        .iter()
        .find(|a| a.id == "algorithmist")
        .unwrap();
    assert!(!algorithmist.unlocked);
    assert_eq!(algorithmist.progress_percent, 70);

    let earth = summary.planets.iter().find(|p| p.id == "earth").unwrap();
    assert!(earth.unlocked);
    assert_eq!(earth.progress_percent, 33);
}

#[test]
fn test_leaderboard() {
    let engine = engine();
    engine
        .complete_mission(&MissionAttempt::completed("quinn", "warmup", 1.0, 0))
        .unwrap();
    engine
        .complete_mission(&MissionAttempt::completed("rosa", "html-basics", 1.0, 0))
        .unwrap();

    let board = engine.leaderboard(None, 10).unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].user_id, "quinn");
    assert_eq!(board[1].user_id, "rosa");

    let board = engine.leaderboard(Some(SkillTrack::FullStack), 10).unwrap();
    assert_eq!(board[0].user_id, "rosa");
}

#[test]
fn test_racing_completions_cannot_both_commit() {
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    let repo = InMemoryRepository::default();
    let settings = EngineSettings::default();

    let snapshot = repo.load("sam").unwrap();
    let first = apply_attempt(
        &catalog,
        &settings,
        &snapshot,
        &MissionAttempt::completed("sam", "html-basics", 1.0, 0),
    )
    .unwrap();
    let second = apply_attempt(
        &catalog,
        &settings,
        &snapshot,
        &MissionAttempt::completed("sam", "warmup", 1.0, 0),
    )
    .unwrap();

    repo.save(&first.progress).unwrap();
    let err = repo.save(&second.progress).unwrap_err();
    assert_eq!(err.class(), ErrorClass::Conflict);

    let stored = repo.load("sam").unwrap();
    assert_eq!(stored.xp().total(), 50);
    assert!(!stored.has_completed("warmup"));
}

/// Repository whose writes can be switched off
struct FlakyRepository {
    inner: InMemoryRepository,
    down: AtomicBool,
}

impl ProgressRepository for FlakyRepository {
    fn load(&self, user_id: &str) -> odyssey_core::Result<UserProgress> {
        self.inner.load(user_id)
    }

    fn save(&self, progress: &UserProgress) -> odyssey_core::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(OdysseyError::RepositoryUnavailable("connection refused".into()));
        }
        self.inner.save(progress)
    }

    fn snapshots(&self) -> odyssey_core::Result<Vec<UserProgress>> {
        self.inner.snapshots()
    }
}

#[test]
fn test_repository_failure_propagates_and_commits_nothing() {
    let repo = FlakyRepository {
        inner: InMemoryRepository::default(),
        down: AtomicBool::new(true),
    };
    let engine = ProgressionEngine::new(Catalog::from_toml_str(CATALOG).unwrap(), &repo);

    let err = engine
        .complete_mission(&MissionAttempt::completed("tess", "html-basics", 1.0, 0))
        .unwrap_err();
    assert_eq!(err, OdysseyError::RepositoryUnavailable("connection refused".into()));
    assert_eq!(err.class(), ErrorClass::Infrastructure);

    let stored = repo.load("tess").unwrap();
    assert!(!stored.has_completed("html-basics"));
    assert_eq!(stored.xp().total(), 0);

    repo.down.store(false, Ordering::SeqCst);
    assert!(engine
        .complete_mission(&MissionAttempt::completed("tess", "html-basics", 1.0, 0))
        .is_ok());
}

#[test]
fn test_engine_over_json_files() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path(), ProgressDefaults::default());
    let catalog = Catalog::from_toml_str(CATALOG).unwrap();
    assert_eq!(catalog.missions().len(), 4);

    let engine = ProgressionEngine::new(catalog, repo);
    engine
        .complete_mission(&MissionAttempt::completed("uma", "html-basics", 1.0, 0))
        .unwrap();
    engine
        .complete_mission(&MissionAttempt::completed("uma", "warmup", 1.0, 0))
        .unwrap();

    let stored = engine.repository().load("uma").unwrap();
    assert_eq!(stored.version(), 2);
    assert_eq!(stored.xp().total(), 190);
    assert_eq!(stored.level().value(), 2);
    assert!(stored.unlocked_planets().contains("venus"));
    assert!(stored.check_invariants().is_ok());
}

#[test]
fn test_shipped_catalog() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../content/catalog.toml");
    let catalog = Catalog::load(&path).unwrap();
    assert!(catalog.planet("earth").is_some());
    assert!(catalog.achievement("dedicated-student").is_some());

    let repo = InMemoryRepository::default();
    let engine = ProgressionEngine::new(&catalog, &repo);

    let result = engine
        .complete_mission(&MissionAttempt::completed("vera", "html-basics", 120.0, 0))
        .unwrap();
    assert_eq!(result.xp_earned, 50);
    assert_eq!(result.new_level.value(), 1);
    assert_eq!(result.newly_unlocked_achievements, vec!["first-steps".to_string()]);

    // 60 s limit, half the time, one error: 100 + 10 - 5 clamps to 100
    let result = engine
        .complete_mission(&MissionAttempt::completed("vera", "sorting-race", 30.0, 1))
        .unwrap();
    assert_eq!(result.score, 100);
    assert_eq!(result.xp_earned, 140);
    assert_eq!(result.total_xp, 190);
    assert!(result.leveled_up);
}

#[test]
fn test_separate_engines_on_one_data_dir_keep_every_commit() {
    let mut toml = String::from("[[planets]]\nid = \"earth\"\n");
    for w in 0..4 {
        for i in 0..20 {
            toml.push_str(&format!(
                "\n[[missions]]\nid = \"w{}-m{}\"\nplanet_id = \"earth\"\ntech_type = \"devops\"\nxp_reward = 10\n",
                w, i
            ));
        }
    }
    let catalog = Catalog::from_toml_str(&toml).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let committed: u64 = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|w| {
                let catalog = &catalog;
                let path = dir.path();
                scope.spawn(move || {
                    // Each worker plays a separate odysseyctl process
                    let repo = JsonFileRepository::new(path, ProgressDefaults::default());
                    let engine = ProgressionEngine::new(catalog, repo);
                    let mut ok = 0u64;
                    for i in 0..20 {
                        let attempt = MissionAttempt::completed("alice", &format!("w{}-m{}", w, i), 1.0, 0);
                        loop {
                            match engine.complete_mission(&attempt) {
                                Ok(_) => {
                                    ok += 1;
                                    break;
                                }
                                Err(OdysseyError::StaleWrite { .. }) => continue,
                                Err(e) => panic!("unexpected error: {}", e),
                            }
                        }
                    }
                    ok
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).sum()
    });

    let stored = JsonFileRepository::new(dir.path(), ProgressDefaults::default())
        .load("alice")
        .unwrap();
    assert_eq!(committed, 80);
    assert_eq!(stored.completed_missions().len() as u64, committed);
    assert_eq!(stored.version(), committed);
    assert_eq!(stored.xp().total(), 10 * committed);
}
