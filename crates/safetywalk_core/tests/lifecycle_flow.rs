mod common;

use common::{config, deferred_type, harness, instruction_type, resolved_type, RESOLVED_ID};
use safetywalk_core::{
    ContextAction, IssueStatus, LifecycleError, MenuSection, Placement, Record, RecordFields,
    ReportPolicy, SafetyWalkApp,
};
use serde_json::json;
use std::sync::atomic::Ordering;

fn issue(title: &str, description: &str, status: IssueStatus, notified: bool) -> Record {
    let mut record = Record::draft(deferred_type(), &RecordFields::new(title, description));
    record.status = Some(status);
    record.notified = notified;
    record
}

#[test]
fn reported_issue_is_announced_once_after_create() {
    let h = harness();
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();

    let mut entry = app.begin(ContextAction::ReportIssue);
    let fields = entry.form_mut().fields_mut();
    fields.title = "Broken light".to_string();
    fields.description = "Hallway 2B".to_string();
    let created = app.submit(&mut entry).unwrap().expect("dialog was open");

    assert_eq!(created.status, Some(IssueStatus::Reported));
    assert!(!created.notified);
    assert!(h.view.calls().contains(&"go_to:Broken light".to_string()));

    let stored = h.records.get(created.id.unwrap()).unwrap();
    assert!(stored.notified);
    assert_eq!(h.sink.labels(), vec!["form-report", "new-issue"]);
    assert_eq!(
        serde_json::to_value(&h.sink.sent()[1]).unwrap(),
        json!({"type": "new-issue", "title": "Broken light", "description": "Hallway 2B"})
    );

    app.refresh().unwrap();
    assert_eq!(h.sink.count("new-issue"), 1);
}

#[test]
fn create_advance_resolve_delete_sends_each_notice_once() {
    let h = harness();
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();

    let mut entry = app.begin(ContextAction::ReportIssue);
    let fields = entry.form_mut().fields_mut();
    fields.title = "Broken light".to_string();
    fields.description = "Hallway 2B".to_string();
    let created = app.submit(&mut entry).unwrap().unwrap();
    assert!(!created.notified);

    let advanced = app.lifecycle().advance_status(&created).unwrap();
    assert_eq!(advanced.status, Some(IssueStatus::BeingResolved));
    assert!(advanced.notified);
    assert!(h.records.get(created.id.unwrap()).unwrap().notified);

    let resolved = app.lifecycle().resolve(&advanced).unwrap();
    assert_eq!(resolved.status, Some(IssueStatus::Resolved));
    app.lifecycle().delete_record(&resolved).unwrap();

    assert_eq!(
        h.sink.labels(),
        vec!["form-report", "new-issue", "fix-issue", "resolve-issue"]
    );
    assert!(h.records.all().is_empty());
}

#[test]
fn editing_a_freshly_created_issue_does_not_announce_it_again() {
    let h = harness();
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();

    let mut entry = app.begin(ContextAction::ReportIssue);
    entry.form_mut().fields_mut().title = "Wet floor".to_string();
    let created = app.submit(&mut entry).unwrap().unwrap();

    let mut session = app.open_edit(&created);
    session.form_mut().fields_mut().description = "Near the stairs".to_string();
    app.submit_edit(&mut session).unwrap().unwrap();
    app.refresh().unwrap();

    assert_eq!(
        h.sink.labels(),
        vec!["form-report", "new-issue", "form-report"]
    );
    assert!(h.records.get(created.id.unwrap()).unwrap().notified);
}

#[test]
fn advance_status_twice_only_acts_once() {
    let h = harness();
    let seeded = h
        .records
        .seed(issue("Leaking pipe", "", IssueStatus::Reported, true));
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();

    let advanced = app.lifecycle().advance_status(&seeded).unwrap();
    assert_eq!(advanced.status, Some(IssueStatus::BeingResolved));
    assert_eq!(h.sink.labels(), vec!["fix-issue"]);
    let saves = h.records.save_calls.load(Ordering::SeqCst);

    let again = app.lifecycle().advance_status(&advanced).unwrap();
    assert_eq!(again, advanced);
    assert_eq!(h.sink.count("fix-issue"), 1);
    assert_eq!(h.records.save_calls.load(Ordering::SeqCst), saves);
}

#[test]
fn resolve_then_delete_clears_every_partition() {
    let h = harness();
    let seeded = h
        .records
        .seed(issue("Loose tile", "Lobby", IssueStatus::BeingResolved, true));
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();

    let resolved = app.lifecycle().resolve(&seeded).unwrap();
    assert_eq!(resolved.poi_type.id, RESOLVED_ID);
    assert_eq!(resolved.status, Some(IssueStatus::Resolved));
    assert_eq!(
        serde_json::to_value(&h.sink.sent()[0]).unwrap(),
        json!({"type": "resolve-issue", "title": "Loose tile", "description": "Lobby"})
    );
    let snapshot = app.snapshot();
    assert!(snapshot.partitions.deferred.is_empty());
    assert_eq!(snapshot.partitions.resolved.len(), 1);

    let unchanged = app.lifecycle().resolve(&resolved).unwrap();
    assert_eq!(unchanged, resolved);
    assert_eq!(h.sink.count("resolve-issue"), 1);

    app.lifecycle().delete_record(&resolved).unwrap();
    assert!(h.records.all().is_empty());
    let snapshot = app.snapshot();
    assert!(snapshot.partitions.deferred.is_empty());
    assert!(snapshot.partitions.resolved.is_empty());
    assert!(snapshot.partitions.instruction.is_empty());
    assert!(snapshot.menus.iter().all(|menu| menu.template.is_some()));
}

#[test]
fn reported_issue_can_be_resolved_directly() {
    let h = harness();
    let seeded = h.records.seed(issue("Spill", "", IssueStatus::Reported, true));
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();

    let resolved = app.lifecycle().resolve(&seeded).unwrap();
    assert_eq!(resolved.status, Some(IssueStatus::Resolved));
    assert_eq!(h.sink.labels(), vec!["resolve-issue"]);
}

#[test]
fn delete_and_resolve_reject_wrong_record_kinds() {
    let h = harness();
    let open_issue = h.records.seed(issue("Open", "", IssueStatus::Reported, true));
    let instruction = h
        .records
        .seed(Record::draft(instruction_type(), &RecordFields::new("Exit route", "")));
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();

    assert!(matches!(
        app.lifecycle().delete_record(&open_issue),
        Err(LifecycleError::DeleteNotAllowed(_))
    ));
    assert!(matches!(
        app.lifecycle().resolve(&instruction),
        Err(LifecycleError::NotAnIssue(_))
    ));
    assert_eq!(h.records.all().len(), 2);
    assert!(h.sink.sent().is_empty());
}

#[test]
fn refresh_partitions_by_type_and_keeps_repository_order() {
    let h = harness();
    let legacy = safetywalk_core::PoiType::new("legacy", "Safety Walks");
    let foreign = safetywalk_core::PoiType::new("parking", "Parking");
    h.records.seed(issue("zeta", "", IssueStatus::Reported, true));
    h.records
        .seed(Record::draft(foreign, &RecordFields::new("car park", "")));
    let mut done = Record::draft(resolved_type(), &RecordFields::new("fixed", ""));
    done.status = Some(IssueStatus::Resolved);
    done.notified = true;
    h.records.seed(done);
    h.records
        .seed(Record::draft(legacy, &RecordFields::new("old walk", "")));
    h.records.seed(issue("alpha", "", IssueStatus::BeingResolved, true));

    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();
    let snapshot = app.snapshot();

    let deferred = snapshot.menu(MenuSection::DeferredIssues).unwrap();
    assert_eq!(deferred.item_titles(), vec!["zeta", "old walk", "alpha"]);
    assert_eq!(
        snapshot.menu(MenuSection::ResolvedIssues).unwrap().item_titles(),
        vec!["fixed"]
    );
    let instructions = snapshot.menu(MenuSection::Instructions).unwrap();
    assert!(instructions.items.is_empty());
    assert_eq!(instructions.template, Some("./menu.html"));
    assert_eq!(snapshot.partitions.ignored, 1);

    assert_eq!(h.view.last_highlighted(), vec!["zeta", "old walk", "alpha"]);
    assert!(h.view.calls().contains(&"unhighlight:1".to_string()));
    // Only the legacy record started un-notified.
    assert_eq!(h.sink.labels(), vec!["new-issue"]);
}

#[test]
fn menu_item_activation_closes_menu_and_navigates() {
    let h = harness();
    h.records.seed(issue("Broken light", "", IssueStatus::Reported, true));
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();
    h.view.clear_calls();

    let snapshot = app.snapshot();
    let item = &snapshot.menu(MenuSection::DeferredIssues).unwrap().items[0];
    item.activate(h.view.as_ref());
    assert_eq!(h.view.calls(), vec!["close_menu", "go_to:Broken light"]);
}

#[test]
fn failed_save_propagates_and_skips_navigation() {
    let h = harness();
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();
    h.records.fail_saves.store(true, Ordering::SeqCst);
    h.view.clear_calls();

    let mut entry = app.begin(ContextAction::ReportIssue);
    entry.form_mut().fields_mut().title = "Cracked step".to_string();
    let err = app.submit(&mut entry).unwrap_err();

    assert!(matches!(err, LifecycleError::Repo(_)));
    assert_eq!(h.view.count("go_to"), 0);
    assert_eq!(h.view.count("render_menu"), 0);
    assert!(h.records.all().is_empty());
}

#[test]
fn rejected_navigation_does_not_abort_create_or_refresh() {
    let h = harness();
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();
    h.view.fail_navigation.store(true, Ordering::SeqCst);
    h.view.clear_calls();

    let mut entry = app.begin(ContextAction::ReportIssue);
    entry.form_mut().fields_mut().title = "Blocked exit".to_string();
    let created = app.submit(&mut entry).unwrap().unwrap();

    assert!(created.is_persisted());
    assert_eq!(h.view.count("render_menu"), 3);
    assert_eq!(h.sink.count("new-issue"), 1);
}

#[test]
fn caller_decides_policy_sends_only_lifecycle_notices() {
    let h = harness();
    let mut config = config();
    config.report_policy = ReportPolicy::CallerDecides;
    let app = SafetyWalkApp::start(h.ctx.clone(), config).unwrap();

    let mut entry = app.begin(ContextAction::ReportIssue);
    entry.form_mut().fields_mut().title = "Frayed cable".to_string();
    app.submit(&mut entry).unwrap().unwrap();

    assert_eq!(h.sink.labels(), vec!["new-issue"]);
}

#[test]
fn instruction_uses_cursor_from_open_time_and_current_viewpoint() {
    let h = harness();
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();
    let at_open = Placement::new(json!({"location": [1.0, 2.0, 0.0]}));
    let pov = Placement::new(json!({"camera": [0.0, 1.6, 3.0], "fov": 90}));
    *h.view.cursor.lock().unwrap() = Some(at_open.clone());
    *h.view.point_of_view.lock().unwrap() = Some(pov.clone());

    let mut entry = app.begin(ContextAction::AddInstruction);
    *h.view.cursor.lock().unwrap() = Some(Placement::new(json!({"location": [9.0, 9.0, 9.0]})));
    entry.form_mut().fields_mut().title = "Fire extinguisher".to_string();
    entry.form_mut().set_use_current_viewpoint(true);
    let created = app.submit(&mut entry).unwrap().unwrap();

    assert_eq!(created.status, None);
    assert_eq!(created.placement, Some(at_open));
    assert_eq!(created.point_of_view, Some(pov));
    assert_eq!(h.sink.labels(), vec!["form-report"]);
    assert_eq!(
        app.snapshot()
            .menu(MenuSection::Instructions)
            .unwrap()
            .item_titles(),
        vec!["Fire extinguisher"]
    );
}

#[test]
fn instruction_without_viewpoint_flag_stores_no_point_of_view() {
    let h = harness();
    let app = SafetyWalkApp::start(h.ctx.clone(), config()).unwrap();
    *h.view.point_of_view.lock().unwrap() = Some(Placement::new(json!({"fov": 60})));

    let mut entry = app.begin(ContextAction::AddInstruction);
    let created = app.submit(&mut entry).unwrap().unwrap();
    assert_eq!(created.point_of_view, None);

    assert!(app.submit(&mut entry).unwrap().is_none());
}
