//! Meeting registry tests — creation validation, the status state machine,
//! participant mutation, upcoming/due queries.

mod common;

use chrono::{Duration, TimeZone, Utc};
use common::*;
use huddle::auth::permissions::Role;
use huddle::errors::AppError;
use huddle::models::meeting::{
    self, MeetingStatus, NewMeeting, NewParticipant, Platform,
};

fn meeting_spec(created_by: i64, link: &str) -> NewMeeting {
    NewMeeting {
        title: "Weekly sync".to_string(),
        description: Some("Agenda in the doc".to_string()),
        platform: Platform::Google,
        meeting_link: link.to_string(),
        date: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap(),
        duration: 60,
        created_by,
        external_event_id: Some("evt-1".to_string()),
    }
}

fn participant(email: &str) -> NewParticipant {
    NewParticipant {
        user_id: None,
        email: email.to_string(),
        role: String::new(),
    }
}

#[test]
fn test_create_meeting() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);

    let m = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/abc"))
        .expect("Failed to create meeting");

    assert!(m.id > 0);
    assert_eq!(m.status, MeetingStatus::Scheduled);
    assert_eq!(m.meeting_link, "https://meet.example/abc");
    assert_eq!(m.duration, 60);
    assert_eq!(m.created_by, creator.id);
    assert!(m.can_edit());
}

#[test]
fn test_create_requires_meeting_link() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);

    let mut spec = meeting_spec(creator.id, "");
    spec.meeting_link = "   ".to_string();
    let result = meeting::create(&conn, &spec);

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(meeting::count(&conn).unwrap(), 0);
}

#[test]
fn test_create_rejects_duplicate_link() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);

    meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/same")).unwrap();
    let result = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/same"));

    assert!(matches!(result, Err(AppError::Validation(_))));
    assert_eq!(meeting::count(&conn).unwrap(), 1);
}

#[test]
fn test_create_rejects_nonpositive_duration() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);

    for bad in [0, -30] {
        let mut spec = meeting_spec(creator.id, "https://meet.example/dur");
        spec.duration = bad;
        let result = meeting::create(&conn, &spec);
        assert!(matches!(result, Err(AppError::Validation(_))), "duration {bad}");
    }
    assert_eq!(meeting::count(&conn).unwrap(), 0);
}

#[test]
fn test_lifecycle_happy_paths() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);

    let m = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/a")).unwrap();
    let m = meeting::transition(&conn, m.id, MeetingStatus::Ongoing).unwrap();
    assert_eq!(m.status, MeetingStatus::Ongoing);
    assert!(!m.can_edit());
    let m = meeting::transition(&conn, m.id, MeetingStatus::Completed).unwrap();
    assert_eq!(m.status, MeetingStatus::Completed);

    // Cancellation is reachable from both non-terminal states.
    let c = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/b")).unwrap();
    let c = meeting::transition(&conn, c.id, MeetingStatus::Cancelled).unwrap();
    assert_eq!(c.status, MeetingStatus::Cancelled);

    let d = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/c")).unwrap();
    meeting::transition(&conn, d.id, MeetingStatus::Ongoing).unwrap();
    let d = meeting::transition(&conn, d.id, MeetingStatus::Cancelled).unwrap();
    assert_eq!(d.status, MeetingStatus::Cancelled);
}

#[test]
fn test_off_graph_transitions_rejected_and_state_unchanged() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);

    // SCHEDULED cannot skip straight to COMPLETED.
    let m = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/x")).unwrap();
    let result = meeting::transition(&conn, m.id, MeetingStatus::Completed);
    assert!(matches!(result, Err(AppError::InvalidTransition { .. })));
    let m = meeting::find_by_id(&conn, m.id).unwrap().unwrap();
    assert_eq!(m.status, MeetingStatus::Scheduled);

    // Terminal states reject everything, including self-transitions.
    let m = meeting::transition(&conn, m.id, MeetingStatus::Cancelled).unwrap();
    for target in [
        MeetingStatus::Scheduled,
        MeetingStatus::Ongoing,
        MeetingStatus::Completed,
        MeetingStatus::Cancelled,
    ] {
        let result = meeting::transition(&conn, m.id, target);
        assert!(
            matches!(result, Err(AppError::InvalidTransition { .. })),
            "CANCELLED -> {target:?} must be rejected"
        );
    }
    let unchanged = meeting::find_by_id(&conn, m.id).unwrap().unwrap();
    assert_eq!(unchanged.status, MeetingStatus::Cancelled);
}

#[test]
fn test_transition_unknown_meeting_is_not_found() {
    let (_dir, conn) = setup_test_db();
    let result = meeting::transition(&conn, 99999, MeetingStatus::Ongoing);
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[test]
fn test_add_participants_appends_in_order() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);
    let member = create_active_user(&conn, "member@example.com", Role::Student);

    let m = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/p")).unwrap();
    let first = vec![participant("a@x.com"), participant("b@x.com")];
    meeting::add_participants(&conn, m.id, &first).unwrap();

    let second = vec![NewParticipant {
        user_id: Some(member.id),
        email: "member@example.com".to_string(),
        role: "mentee".to_string(),
    }];
    let all = meeting::add_participants(&conn, m.id, &second).unwrap();

    assert_eq!(all.len(), 3);
    assert_eq!(all[0].email, "a@x.com");
    assert_eq!(all[1].email, "b@x.com");
    assert_eq!(all[2].email, "member@example.com");
    assert_eq!(all[2].user_id, Some(member.id));
    assert!(all[0].user_id.is_none()); // external attendee, no account
}

#[test]
fn test_add_participants_requires_editable_meeting() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);

    let m = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/e")).unwrap();
    meeting::add_participants(&conn, m.id, &[participant("a@x.com")]).unwrap();
    meeting::transition(&conn, m.id, MeetingStatus::Ongoing).unwrap();
    meeting::transition(&conn, m.id, MeetingStatus::Completed).unwrap();

    let result = meeting::add_participants(&conn, m.id, &[participant("late@x.com")]);
    assert!(matches!(result, Err(AppError::NotEditable(_))));

    // Participant list unchanged.
    let list = meeting::find_participants(&conn, m.id).unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].email, "a@x.com");
}

#[test]
fn test_add_participants_rejects_empty_email() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);

    let m = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/v")).unwrap();
    let entries = vec![participant("ok@x.com"), participant("  ")];
    let result = meeting::add_participants(&conn, m.id, &entries);

    assert!(matches!(result, Err(AppError::Validation(_))));
    // Nothing written: the batch is checked before any insert.
    assert!(meeting::find_participants(&conn, m.id).unwrap().is_empty());
}

#[test]
fn test_find_upcoming_filters_by_status_and_window() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();

    let mut in_window = meeting_spec(creator.id, "https://meet.example/1");
    in_window.date = now + Duration::minutes(3);
    let in_window = meeting::create(&conn, &in_window).unwrap();

    let mut earlier = meeting_spec(creator.id, "https://meet.example/2");
    earlier.date = now - Duration::minutes(10);
    let earlier = meeting::create(&conn, &earlier).unwrap();

    let mut beyond = meeting_spec(creator.id, "https://meet.example/3");
    beyond.date = now + Duration::minutes(30);
    meeting::create(&conn, &beyond).unwrap();

    // In the window, but no longer SCHEDULED.
    let mut cancelled = meeting_spec(creator.id, "https://meet.example/4");
    cancelled.date = now + Duration::minutes(2);
    let cancelled = meeting::create(&conn, &cancelled).unwrap();
    meeting::transition(&conn, cancelled.id, MeetingStatus::Cancelled).unwrap();

    let upcoming = meeting::find_upcoming(&conn, now, Duration::minutes(5)).unwrap();
    let ids: Vec<i64> = upcoming.iter().map(|m| m.id).collect();

    // Date ascending: the already-started meeting sorts first.
    assert_eq!(ids, vec![earlier.id, in_window.id]);
}

#[test]
fn test_due_reminders_and_mark_sent() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();

    let m = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/r")).unwrap();
    let due = meeting::add_reminder(&conn, m.id, now - Duration::minutes(5)).unwrap();
    let also_due = meeting::add_reminder(&conn, m.id, now).unwrap();
    meeting::add_reminder(&conn, m.id, now + Duration::minutes(10)).unwrap();

    let pending = meeting::due_reminders(&conn, now).unwrap();
    let ids: Vec<i64> = pending.iter().map(|(_, r)| r.id).collect();
    assert_eq!(ids, vec![due.id, also_due.id]);
    assert_eq!(pending[0].0.id, m.id);

    // The query itself marks nothing; a second call returns the same rows.
    assert_eq!(meeting::due_reminders(&conn, now).unwrap().len(), 2);

    meeting::mark_reminder_sent(&conn, due.id).unwrap();
    let remaining = meeting::due_reminders(&conn, now).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].1.id, also_due.id);
}

#[test]
fn test_reminders_allowed_on_non_editable_meeting() {
    let (_dir, conn) = setup_test_db();
    let creator = create_active_user(&conn, "mentor@example.com", Role::Mentor);
    let now = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();

    let m = meeting::create(&conn, &meeting_spec(creator.id, "https://meet.example/z")).unwrap();
    meeting::transition(&conn, m.id, MeetingStatus::Ongoing).unwrap();

    // Append-only bookkeeping is exempt from the editable check.
    meeting::add_reminder(&conn, m.id, now).expect("reminder append should be allowed");
    assert_eq!(meeting::due_reminders(&conn, now).unwrap().len(), 1);
}
