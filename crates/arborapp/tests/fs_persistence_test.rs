use arborapp::api::ArborApi;
use arborapp::config::ArborConfig;
use arborapp::model::{Color, NodeAttrs, PlanSlot, RowKind};
use arborapp::persist::CURRENT_VERSION;
use arborapp::registry::RefKind;
use arborapp::store::{DocumentBackend, FsBackend};
use chrono::NaiveDate;
use std::fs;
use tempfile::TempDir;

fn setup() -> (TempDir, FsBackend) {
    let dir = TempDir::new().unwrap();
    let backend = FsBackend::in_dir(dir.path(), "tree.json");
    (dir, backend)
}

fn open(backend: FsBackend, dir: &TempDir) -> ArborApi<FsBackend> {
    ArborApi::open(backend, &ArborConfig::default(), dir.path().join("backups")).unwrap()
}

#[test]
fn test_missing_file_opens_empty_outline() {
    let (dir, backend) = setup();
    let api = open(backend, &dir);
    assert!(api.session().store().is_empty());
    assert!(!api.is_dirty());
    assert!(!dir.path().join("tree.json").exists());
}

#[test]
fn test_save_writes_document_atomically() {
    let (dir, backend) = setup();
    let mut api = open(backend, &dir);
    let root = api.session().root();
    api.session_mut()
        .append(root, NodeAttrs::new("groceries").with_color(Color::Green))
        .unwrap();
    api.save().unwrap();

    let on_disk = fs::read_to_string(dir.path().join("tree.json")).unwrap();
    let value: serde_json::Value = serde_json::from_str(&on_disk).unwrap();
    assert_eq!(value["version"], CURRENT_VERSION);
    assert_eq!(value["root"]["children"][0]["text"], "groceries");
    assert_eq!(value["root"]["children"][0]["color"], "green");

    for entry in fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(!name.ends_with(".tmp"), "Found leftover tmp file: {}", name);
    }
}

#[test]
fn test_outline_and_bookmarks_survive_reopen() {
    let (dir, backend) = setup();
    let mut api = open(backend, &dir);
    let root = api.session().root();
    let project = api
        .session_mut()
        .append(
            root,
            NodeAttrs::new("garden").with_kind(RowKind::SequentialProject),
        )
        .unwrap();
    let task = api
        .session_mut()
        .append(project, NodeAttrs::new("dig").with_kind(RowKind::Todo).with_estimate(90))
        .unwrap();
    api.session_mut()
        .add_reference(RefKind::QuickLink, "dig", task)
        .unwrap();
    api.save().unwrap();

    let reopened = open(FsBackend::in_dir(dir.path(), "tree.json"), &dir);
    assert_eq!(reopened.session().store(), api.session().store());
    assert_eq!(
        reopened
            .session()
            .resolve_reference(RefKind::QuickLink, 0)
            .unwrap(),
        task
    );
}

#[test]
fn test_legacy_document_is_migrated_on_open() {
    let (dir, backend) = setup();
    fs::write(
        backend.path(),
        r##"[
            {
                "text": "",
                "type": "note",
                "creation_date_time": 1709251200.0,
                "expanded": true,
                "planned": 0,
                "planned_order": 0,
                "childItems": [
                    {
                        "text": "pay rent repeat=1m",
                        "type": "todo",
                        "color": "#ff9500",
                        "date": "01.03.24",
                        "estimate": "5",
                        "expanded": true,
                        "quicklink_expanded": false,
                        "search_text": "",
                        "shortcut": null,
                        "saved_root_item_creation_date_time": null,
                        "creation_date_time": 1709251260.123456,
                        "selected": false,
                        "planned": 1,
                        "planned_order": 0,
                        "childItems": []
                    }
                ]
            },
            {
                "text": "",
                "type": "note",
                "creation_date_time": 1709251200.5,
                "childItems": [
                    {
                        "text": "rent",
                        "search_text": "",
                        "shortcut": null,
                        "saved_root_item_creation_date_time": 1709251260.123456,
                        "creation_date_time": 1709251300.0,
                        "childItems": []
                    }
                ]
            }
        ]"##,
    )
    .unwrap();

    let mut api = open(backend, &dir);
    let store = api.session().store();
    let rent = store.children_of(store.root()).unwrap()[0];
    let attrs = store.get(rent).unwrap();
    assert_eq!(attrs.text, "pay rent");
    assert_eq!(attrs.kind, RowKind::Todo);
    assert_eq!(attrs.color, Color::Orange);
    assert_eq!(attrs.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
    assert_eq!(attrs.estimate, Some(5));
    assert!(attrs.repeat.is_some());
    assert!(!attrs.collapsed);
    assert_eq!(attrs.planned, Some(PlanSlot::new(1, 0)));
    assert_eq!(
        api.session().resolve_reference(RefKind::Bookmark, 0).unwrap(),
        rent
    );

    // The upgrade is written back in the current format on the next save.
    api.save().unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&api.backend().load().unwrap().unwrap()).unwrap();
    assert_eq!(value["version"], CURRENT_VERSION);
}

#[test]
fn test_malformed_file_is_left_untouched() {
    let (dir, backend) = setup();
    fs::write(backend.path(), "{ not json").unwrap();

    let result = ArborApi::open(backend, &ArborConfig::default(), dir.path().join("backups"));
    assert!(result.err().is_some_and(|e| e.is_malformed()));
    assert_eq!(
        fs::read_to_string(dir.path().join("tree.json")).unwrap(),
        "{ not json"
    );
}

#[test]
fn test_backup_now_writes_a_loadable_copy() {
    let (dir, backend) = setup();
    let mut api = open(backend, &dir);
    let root = api.session().root();
    api.session_mut().append(root, NodeAttrs::new("keep me")).unwrap();

    let path = api.backup_now().unwrap();
    assert!(path.starts_with(dir.path().join("backups")));

    let copy = open(FsBackend::new(path), &dir);
    assert_eq!(copy.session().store(), api.session().store());
}
