use std::fs;
use std::path::{Path, PathBuf};

use kirikae_core::fs::sha256sum;
use kirikae_core::oracle::FixedEpisodeList;
use kirikae_core::plan::{CONFLICT_REASON, PlanBuilder, PlexRuleSet};
use kirikae_core::{
    ApplyOptions, EpisodeCandidate, KirikaeError, ManualReason, MediaFile, MediaType, PlanItem,
    PlanStatus, RenamePlan, RuleSetConfig, apply_plan, load_plan, save_plan, undo_plan,
};

fn write(path: &Path, content: &[u8]) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
    path.to_path_buf()
}

fn paw_patrol() -> FixedEpisodeList {
    FixedEpisodeList::named(
        "tvdb-export",
        vec![
            EpisodeCandidate::new(0, 1, "Special"),
            EpisodeCandidate::new(1, 5, "Pups and the Kitty-tastrophe"),
            EpisodeCandidate::new(1, 6, "Pups Save a Train"),
        ],
    )
}

/// Three pending moves whose files exist on disk, with recorded hashes.
fn hashed_plan(root: &Path) -> RenamePlan {
    let mut plan = RenamePlan::new(root, "plex");
    for name in ["a.mkv", "b.mkv", "c.mkv"] {
        let source = write(&root.join("in").join(name), name.as_bytes());
        let file = MediaFile::new(&source, MediaType::Tv).with_hash(sha256sum(&source).unwrap());
        plan.push(PlanItem::pending(file, root.join("out").join(name)));
    }
    plan
}

#[test]
fn paw_patrol_anthology_plan_applies_and_undoes() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = write(
        &root.join("incoming/Paw Patrol-S01E01-Pups And The Kitty Tastrophe Pups Save A Train.mp4"),
        b"double episode",
    );

    let rules = PlexRuleSet::new().unwrap();
    let config = RuleSetConfig::new().with_anthology(true);
    let mut oracle = paw_patrol();
    let mut builder = PlanBuilder::new(&rules, &config, &mut oracle).unwrap();
    let mut file = MediaFile::new(&source, MediaType::Tv);
    file.hash = Some(sha256sum(&source).unwrap());
    let mut plan = builder.build(root, vec![file]).unwrap();

    assert_eq!(plan.items.len(), 1);
    let item = &plan.items[0];
    assert_eq!(item.status, PlanStatus::Pending);
    assert_eq!(item.episode.as_deref(), Some("05-E06"));
    assert_eq!(
        item.episode_title.as_deref(),
        Some("Pups and the Kitty-tastrophe & Pups Save a Train")
    );
    let expected = root.join(
        "TV Shows/Paw Patrol/Season 01/Paw Patrol - S01E05-E06 - Pups and the Kitty-tastrophe & Pups Save a Train.mp4",
    );
    assert_eq!(item.destination, expected);

    let result = apply_plan(&mut plan, &ApplyOptions::new().with_verify_hash(true));
    assert!(result.success);
    assert_eq!(result.moved, 1);
    assert!(expected.exists());
    assert!(!source.exists());

    let saved = save_plan(&plan, &root.join("plans")).unwrap();
    let mut loaded = load_plan(&saved).unwrap();
    let report = undo_plan(&mut loaded).unwrap();
    assert_eq!(report.restored, 1);
    assert!(source.exists());
    assert!(!expected.exists());
}

#[test]
fn corrupted_hash_on_second_item_rolls_everything_back() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = hashed_plan(dir.path());
    // The second file will not match its recorded digest once it lands.
    plan.items[1].media_file.hash = Some("f".repeat(64));

    let result = apply_plan(&mut plan, &ApplyOptions::new().with_verify_hash(true));

    assert!(!result.success);
    assert_eq!(result.failed, 1);
    assert_eq!(result.moved, 0);
    assert_eq!(result.rolled_back, 2);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].source, plan.items[1].source);

    assert_eq!(plan.items[0].status, PlanStatus::Pending);
    assert_eq!(plan.items[1].status, PlanStatus::Failed);
    assert_eq!(plan.items[2].status, PlanStatus::Pending);
    for item in &plan.items {
        assert!(item.source.exists(), "{} should be back", item.source.display());
        assert!(!item.destination.exists());
    }
}

#[test]
fn undo_aborts_without_touching_files_when_source_exists() {
    let dir = tempfile::tempdir().unwrap();
    let mut plan = hashed_plan(dir.path());
    assert!(apply_plan(&mut plan, &ApplyOptions::new()).success);

    write(&plan.items[0].source, b"a new file took its place");

    let err = undo_plan(&mut plan).unwrap_err();
    assert!(matches!(err, KirikaeError::UndoSourceExists(_)));
    assert_eq!(
        fs::read(&plan.items[0].source).unwrap(),
        b"a new file took its place"
    );
    for item in &plan.items {
        assert!(item.destination.exists());
        assert_eq!(item.status, PlanStatus::Moved);
    }
    assert!(!plan.items[1].source.exists());
}

#[test]
fn colliding_destinations_are_never_moved() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let first = write(&root.join("one/Heat (1995).mkv"), b"cut one");
    let second = write(&root.join("two/Heat (1995).MKV"), b"cut two");
    let other = write(&root.join("two/Alien (1979).mkv"), b"alien");

    let rules = PlexRuleSet::new().unwrap();
    let config = RuleSetConfig::new();
    let mut oracle = FixedEpisodeList::new(Vec::new());
    let mut builder = PlanBuilder::new(&rules, &config, &mut oracle).unwrap();
    let mut plan = builder
        .build(
            root,
            vec![
                MediaFile::new(&first, MediaType::Movie),
                MediaFile::new(&second, MediaType::Movie),
                MediaFile::new(&other, MediaType::Movie),
            ],
        )
        .unwrap();

    assert_eq!(plan.items[0].status, PlanStatus::Conflict);
    assert_eq!(plan.items[1].status, PlanStatus::Conflict);
    assert_eq!(plan.items[0].reason.as_deref(), Some(CONFLICT_REASON));
    assert_eq!(plan.items[2].status, PlanStatus::Pending);

    let result = apply_plan(&mut plan, &ApplyOptions::new());
    assert!(result.success);
    assert_eq!(result.moved, 1);
    assert!(first.exists());
    assert!(second.exists());
    assert!(!other.exists());
}

#[test]
fn unmatched_file_is_planned_for_review() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = write(&root.join("Mystery Show - S02E01 - Pilot.mkv"), b"x");

    let rules = PlexRuleSet::new().unwrap();
    let config = RuleSetConfig::new();
    let mut oracle = FixedEpisodeList::new(Vec::new());
    let mut builder = PlanBuilder::new(&rules, &config, &mut oracle).unwrap();
    let mut plan = builder
        .build(root, vec![MediaFile::new(&source, MediaType::Tv)])
        .unwrap();

    let item = &plan.items[0];
    assert_eq!(item.status, PlanStatus::Manual);
    assert_eq!(item.destination, source);
    assert!(item.manual_reason.is_some());

    let result = apply_plan(&mut plan, &ApplyOptions::new());
    assert!(result.success);
    assert_eq!(result.moved, 0);
    assert!(source.exists());
}

#[test]
fn runtime_paired_plan_moves_the_file_once() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let source = write(&root.join("incoming/Sea Tales - S01E01 - Whatever.mp4"), b"two stories");

    let rules = PlexRuleSet::new().unwrap();
    let config = RuleSetConfig::new().with_untrusted_titles(24);
    let mut oracle = FixedEpisodeList::new(
        (1..=4)
            .map(|n| EpisodeCandidate::new(1, n, format!("Story {n}")).with_duration_ms(11 * 60_000))
            .collect(),
    );
    let mut builder = PlanBuilder::new(&rules, &config, &mut oracle).unwrap();
    let mut plan = builder
        .build(root, vec![MediaFile::new(&source, MediaType::Tv)])
        .unwrap();

    assert_eq!(plan.items.len(), 2);
    assert_eq!(plan.items[0].status, PlanStatus::Pending);
    assert_eq!(plan.items[0].episode.as_deref(), Some("01-E02"));
    assert_eq!(plan.items[1].status, PlanStatus::Manual);
    assert_eq!(plan.items[1].episode.as_deref(), Some("03-E04"));
    assert_eq!(
        plan.items[1].manual_reason,
        Some(ManualReason::SharedSource.to_string())
    );

    let result = apply_plan(&mut plan, &ApplyOptions::new());
    assert!(result.success, "{:?}", result.failures);
    assert_eq!(result.moved, 1);
    assert!(plan.items[0].destination.exists());
    assert!(!source.exists());
    assert_eq!(plan.items[1].status, PlanStatus::Manual);
}

#[test]
fn specials_never_take_part_in_planning() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let special = write(&root.join("Sea Tales - S01E07 - Backstage Special.mkv"), b"special");
    let regular = write(&root.join("Sea Tales - S01E01 - Ghost Ship.mkv"), b"ghost ship");

    let rules = PlexRuleSet::new().unwrap();
    let config = RuleSetConfig::new();
    let mut oracle = FixedEpisodeList::new(vec![
        EpisodeCandidate::new(1, 0, "Backstage Special"),
        EpisodeCandidate::new(1, 1, "Ghost Ship"),
        EpisodeCandidate::new(1, 2, "Big Race"),
    ]);
    let mut builder = PlanBuilder::new(&rules, &config, &mut oracle).unwrap();
    let plan = builder
        .build(
            root,
            vec![
                MediaFile::new(&special, MediaType::Tv),
                MediaFile::new(&regular, MediaType::Tv),
            ],
        )
        .unwrap();

    assert_eq!(plan.items.len(), 2);
    assert_eq!(plan.items[0].status, PlanStatus::Manual);
    assert_ne!(plan.items[0].media_file.episode, Some(0));
    assert_eq!(plan.items[1].status, PlanStatus::Pending);
    assert_eq!(plan.items[1].episode.as_deref(), Some("E01"));
    for item in &plan.items {
        assert!(!item.destination.to_string_lossy().contains("Backstage Special"));
    }
}
