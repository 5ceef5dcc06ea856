//! Tests for the in-memory backend and its snapshots

use super::*;
use chrono::{TimeZone, Utc};
use coursesync_core::{AggregationMethod, CourseLayout, PageDisplay, TextFormat};
use tempfile::tempdir;

fn course(idnumber: &str, category: CategoryId) -> Course {
    Course {
        id: None,
        idnumber: idnumber.to_string(),
        shortname: format!("S-{idnumber}"),
        fullname: format!("Course {idnumber}"),
        summary: "  <p>Summary</p><script>x()</script>\r\n".to_string(),
        summary_format: TextFormat::Html,
        visible: true,
        tags: ["a".to_string(), "b".to_string()].into_iter().collect(),
        category,
        layout: CourseLayout::default(),
        start_date: Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap(),
    }
}

fn page(course: CourseId, name: &str) -> Page {
    Page {
        id: None,
        course: Some(course),
        module: None,
        name: name.to_string(),
        intro: "intro".to_string(),
        content: "<p>content</p>".to_string(),
        content_format: TextFormat::Html,
        display: PageDisplay::default(),
    }
}

#[test]
fn test_new_site_has_default_category() {
    let backend = MemoryBackend::new();
    let default = backend.default_category().unwrap();
    assert_eq!(default, Some(1));
    assert!(backend.category_exists(1).unwrap());
    assert_eq!(backend.categories().next().unwrap().name, DEFAULT_CATEGORY_NAME);

    let empty = MemoryBackend::empty();
    assert_eq!(empty.default_category().unwrap(), None);
}

#[test]
fn test_category_idnumber_is_unique() {
    let mut backend = MemoryBackend::new();
    let created = backend.create_category(1, "Science", "SCI").unwrap();
    assert_eq!(created.parent, Some(1));
    assert_eq!(created.idnumber.as_deref(), Some("SCI"));

    let found = backend.find_category_by_idnumber("SCI").unwrap().unwrap();
    assert_eq!(found.id, created.id);

    let err = backend.create_category(1, "Other", "SCI").unwrap_err();
    assert!(matches!(err, BackendError::Conflict(_)));

    let err = backend.create_category(99, "Orphan", "ORPH").unwrap_err();
    assert!(matches!(err, BackendError::NotFound { entity: "category", .. }));
}

#[test]
fn test_course_create_normalizes_summary_and_assigns_id() {
    let mut backend = MemoryBackend::new();
    let saved = backend.create_course(&course("C1", 1)).unwrap();
    assert_eq!(saved.id, Some(1));
    assert_eq!(saved.summary, "<p>Summary</p>");

    let found = backend.find_course_by_idnumber("C1").unwrap().unwrap();
    assert_eq!(found, saved);
    assert!(backend.find_course_by_idnumber("c1").unwrap().is_none());
}

#[test]
fn test_course_idnumber_conflicts() {
    let mut backend = MemoryBackend::new();
    backend.create_course(&course("C1", 1)).unwrap();
    let err = backend.create_course(&course("C1", 1)).unwrap_err();
    assert!(matches!(err, BackendError::Conflict(_)));

    let second = backend.create_course(&course("C2", 1)).unwrap();
    let mut renamed = second.clone();
    renamed.idnumber = "C1".to_string();
    let err = backend.update_course(&renamed).unwrap_err();
    assert!(matches!(err, BackendError::Conflict(_)));
}

#[test]
fn test_update_course_replaces_fields() {
    let mut backend = MemoryBackend::new();
    let mut saved = backend.create_course(&course("C1", 1)).unwrap();
    saved.fullname = "Renamed".to_string();
    saved.visible = false;
    backend.update_course(&saved).unwrap();

    let stored = backend.course(saved.id.unwrap()).unwrap();
    assert_eq!(stored.fullname, "Renamed");
    assert!(!stored.visible);

    let mut unsaved = course("C9", 1);
    unsaved.id = Some(77);
    assert!(matches!(
        backend.update_course(&unsaved).unwrap_err(),
        BackendError::NotFound { entity: "course", .. }
    ));
}

#[test]
fn test_page_activity_gets_module_and_idnumber() {
    let mut backend = MemoryBackend::new();
    let c = backend.create_course(&course("C1", 1)).unwrap().id.unwrap();

    let created = backend.create_page_activity(&page(c, "P1")).unwrap();
    backend.link_module_idnumber(created.module, "C1").unwrap();

    let module = backend.module(created.module).unwrap();
    assert_eq!(module.instance, created.page);
    assert_eq!(module.module_type, "page");
    assert_eq!(module.idnumber.as_deref(), Some("C1"));

    let found = backend.find_page("P1", c).unwrap().unwrap();
    assert_eq!(found.id, Some(created.page));
    assert_eq!(found.module, Some(created.module));

    let err = backend.create_page_activity(&page(c, "P1")).unwrap_err();
    assert!(matches!(err, BackendError::Conflict(_)));
    assert_eq!(backend.pages_of(c).len(), 1);
}

#[test]
fn test_page_update_keeps_module() {
    let mut backend = MemoryBackend::new();
    let c = backend.create_course(&course("C1", 1)).unwrap().id.unwrap();
    backend.create_page_activity(&page(c, "P1")).unwrap();

    let mut stored = backend.find_page("P1", c).unwrap().unwrap();
    stored.intro = "new intro".to_string();
    backend.update_page_activity(&stored).unwrap();

    let reloaded = backend.find_page("P1", c).unwrap().unwrap();
    assert_eq!(reloaded.intro, "new intro");
    assert_eq!(reloaded.module, stored.module);
}

#[test]
fn test_completion_records_are_unique() {
    let mut backend = MemoryBackend::new();
    let criterion = CompletionCriterion {
        course: 1,
        module: 3,
        module_type: "page".to_string(),
    };
    backend.save_completion_criterion(&criterion).unwrap();
    assert!(backend.find_completion_criterion(1, 3).unwrap().is_some());
    assert!(backend.save_completion_criterion(&criterion).is_err());

    let rule = AggregationRule {
        course: 1,
        criteria_type: CriteriaType::Overall,
        method: AggregationMethod::Any,
    };
    backend.save_aggregation_rule(&rule).unwrap();
    backend
        .save_aggregation_rule(&AggregationRule {
            method: AggregationMethod::All,
            ..rule.clone()
        })
        .unwrap();
    assert_eq!(backend.aggregation_rules().len(), 1);
    assert_eq!(
        backend
            .find_aggregation_rule(1, CriteriaType::Overall)
            .unwrap()
            .unwrap()
            .method,
        AggregationMethod::All
    );
}

#[test]
fn test_snapshot_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("store.json");

    let mut backend = MemoryBackend::new();
    let cat = backend.create_category(1, "Science", "SCI").unwrap();
    let c = backend.create_course(&course("C1", cat.id)).unwrap().id.unwrap();
    backend.create_page_activity(&page(c, "P1")).unwrap();
    snapshot::save(&backend, &path).unwrap();

    let mut reloaded = snapshot::load(&path).unwrap();
    assert_eq!(reloaded.courses().count(), 1);
    assert_eq!(reloaded.modules().count(), 1);
    assert!(reloaded.find_category_by_idnumber("SCI").unwrap().is_some());

    // Sequences survive, so new ids never collide with loaded ones.
    let next = reloaded.create_course(&course("C2", 1)).unwrap();
    assert_eq!(next.id, Some(2));
}

#[test]
fn test_missing_snapshot_is_fresh_site() {
    let dir = tempdir().unwrap();
    let backend = snapshot::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(backend.default_category().unwrap(), Some(1));
    assert_eq!(backend.courses().count(), 0);
}

#[test]
fn test_corrupt_snapshot_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("store.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(
        snapshot::load(&path).unwrap_err(),
        SnapshotError::Json(_)
    ));
}
