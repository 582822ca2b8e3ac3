use chrono::{Duration, Local, NaiveDate, Weekday};
use rusqlite::Connection;
use tempfile::TempDir;

use tasknest::api::mutations::{self, NewTask, TaskPatch};
use tasknest::api::views;
use tasknest::db::{connection, routine_repo, task_repo};
use tasknest::engine;
use tasknest::models::{RecurrenceRule, Routine, Scope, Task};
use tasknest::ErrorCode;

// ─── helpers ───────────────────────────────────────────────────────

struct TestEnv {
    dir: TempDir,
    conn: Connection,
}

impl TestEnv {
    fn new() -> Self {
        let dir = TempDir::new().expect("create tempdir");
        let conn = connection::init_db(&dir.path().join("tasknest.db")).expect("init db");
        Self { dir, conn }
    }

    /// Second connection to the same database file.
    fn reconnect(&self) -> Connection {
        connection::open_db(&self.dir.path().join("tasknest.db")).expect("open db")
    }

    fn add_task_on(&self, owner: &str, title: &str, due: NaiveDate) -> Task {
        let raw = due.to_string();
        mutations::add_task(
            &self.conn,
            owner,
            NewTask {
                title,
                details: None,
                due_date: Some(&raw),
            },
            Scope::All,
        )
        .expect("add task")
        .task
    }

    fn add_routine(&self, owner: &str, title: &str, rule: RecurrenceRule) -> Routine {
        let id = ulid::Ulid::new().to_string();
        routine_repo::create_routine(&self.conn, &id, owner, title, Some("from routine"), &rule)
            .expect("create routine")
    }

    fn all_owned(&self, owner: &str) -> Vec<Task> {
        views::all_tasks(&self.conn, owner, None)
            .expect("all view")
            .user_tasks
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
}

// ─── materialization engine ────────────────────────────────────────

#[test]
fn materialize_is_idempotent() {
    let env = TestEnv::new();
    let routine = env.add_routine(
        "amr",
        "Weekly review",
        RecurrenceRule::Weekdays {
            days: vec![Weekday::Mon],
        },
    );

    for _ in 0..3 {
        engine::apply_routines(&env.conn, "amr", monday()).expect("apply");
    }

    let tasks = env.all_owned("amr");
    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.title, "Weekly review");
    assert_eq!(task.details.as_deref(), Some("from routine"));
    assert_eq!(task.due_date, monday());
    assert!(!task.completed);
    assert_eq!(task.source_routine.as_deref(), Some(routine.id.as_str()));
    assert_eq!(task.materialized_for, Some(monday()));
}

#[test]
fn materialize_creates_one_task_per_firing_date() {
    let env = TestEnv::new();
    env.add_routine(
        "amr",
        "Standup notes",
        RecurrenceRule::Weekdays {
            days: vec![Weekday::Mon, Weekday::Tue],
        },
    );

    let tuesday = monday() + Duration::days(1);
    let wednesday = monday() + Duration::days(2);

    assert_eq!(engine::apply_routines(&env.conn, "amr", monday()).unwrap(), 1);
    assert_eq!(engine::apply_routines(&env.conn, "amr", tuesday).unwrap(), 1);
    // Rule does not fire on Wednesday.
    assert_eq!(engine::apply_routines(&env.conn, "amr", wednesday).unwrap(), 0);
    // Re-running a materialized date is a no-op.
    assert_eq!(engine::apply_routines(&env.conn, "amr", monday()).unwrap(), 0);

    assert_eq!(env.all_owned("amr").len(), 2);
}

#[test]
fn materialize_is_idempotent_across_connections() {
    let env = TestEnv::new();
    env.add_routine(
        "amr",
        "Backup",
        RecurrenceRule::Weekdays {
            days: vec![Weekday::Mon],
        },
    );

    let second = env.reconnect();
    engine::apply_routines(&env.conn, "amr", monday()).expect("apply on conn 1");
    engine::apply_routines(&second, "amr", monday()).expect("apply on conn 2");

    assert_eq!(env.all_owned("amr").len(), 1);
}

#[test]
fn materialized_tasks_keep_their_template_after_routine_edit() {
    let env = TestEnv::new();
    let routine = env.add_routine(
        "amr",
        "Water plants",
        RecurrenceRule::Weekdays {
            days: vec![Weekday::Mon],
        },
    );
    engine::apply_routines(&env.conn, "amr", monday()).unwrap();

    routine_repo::update_routine(
        &env.conn,
        "amr",
        &routine.id,
        "Water ALL plants",
        None,
        &routine.rule,
    )
    .expect("update routine");

    // The already-materialized task is untouched.
    let tasks = env.all_owned("amr");
    assert_eq!(tasks[0].title, "Water plants");

    // The next firing date picks up the edited template.
    let next_monday = monday() + Duration::days(7);
    engine::apply_routines(&env.conn, "amr", next_monday).unwrap();
    let tasks = env.all_owned("amr");
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().any(|t| t.title == "Water ALL plants"));
}

#[test]
fn deleting_a_routine_leaves_materialized_tasks() {
    let env = TestEnv::new();
    let routine = env.add_routine(
        "amr",
        "Inbox zero",
        RecurrenceRule::Weekdays {
            days: vec![Weekday::Mon],
        },
    );
    engine::apply_routines(&env.conn, "amr", monday()).unwrap();

    routine_repo::delete_routine(&env.conn, "amr", &routine.id).expect("delete routine");

    let tasks = env.all_owned("amr");
    assert_eq!(tasks.len(), 1);
    // Nothing fires any more, the existing task just stays.
    assert_eq!(engine::apply_routines(&env.conn, "amr", monday() + Duration::days(7)).unwrap(), 0);
    assert_eq!(env.all_owned("amr").len(), 1);
}

#[test]
fn today_view_materializes_but_all_view_does_not() {
    let env = TestEnv::new();
    env.add_routine(
        "amr",
        "Daily journal",
        RecurrenceRule::EveryNDays {
            anchor: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            interval: 1,
        },
    );

    let all = views::all_tasks(&env.conn, "amr", None).unwrap();
    assert_eq!(all.counts.total_number_tasks, 0);

    let today_view = views::today_tasks(&env.conn, "amr", None).unwrap();
    assert_eq!(today_view.counts.total_number_tasks, 1);
    assert_eq!(today_view.user_tasks[0].due_date, today());
}

// ─── views & pagination ────────────────────────────────────────────

#[test]
fn today_view_includes_overdue_incomplete_tasks() {
    let env = TestEnv::new();
    let t1 = env.add_task_on("amr", "due today a", today());
    env.add_task_on("amr", "due today b", today());
    env.add_task_on("amr", "due today c", today());
    let overdue = env.add_task_on("amr", "overdue", today() - Duration::days(1));
    // Excluded: future task and overdue-but-completed task.
    env.add_task_on("amr", "tomorrow", today() + Duration::days(1));
    let done_yesterday = env.add_task_on("amr", "old done", today() - Duration::days(2));
    mutations::toggle_complete(&env.conn, "amr", &done_yesterday.id, Scope::All).unwrap();
    mutations::toggle_complete(&env.conn, "amr", &t1.id, Scope::All).unwrap();

    let view = views::today_tasks(&env.conn, "amr", None).unwrap();
    assert_eq!(view.counts.total_number_tasks, 4);
    assert_eq!(view.counts.completed_tasks_count, 1);
    assert_eq!(view.counts.pending_tasks, 3);
    assert_eq!(view.user_tasks.len(), 4);

    // Incomplete before complete, then due date ascending.
    let completed: Vec<bool> = view.user_tasks.iter().map(|t| t.completed).collect();
    assert_eq!(completed, vec![false, false, false, true]);
    assert_eq!(view.user_tasks[0].id, overdue.id);
    assert_eq!(view.user_tasks[3].id, t1.id);
}

#[test]
fn upcoming_view_window_is_inclusive() {
    let env = TestEnv::new();
    env.add_task_on("amr", "today", today());
    env.add_task_on("amr", "edge", today() + Duration::days(7));
    env.add_task_on("amr", "beyond", today() + Duration::days(8));
    env.add_task_on("amr", "past", today() - Duration::days(1));

    let view = views::next_week_tasks(&env.conn, "amr", None).unwrap();
    let titles: Vec<&str> = view.user_tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["today", "edge"]);
    assert_eq!(view.counts.total_number_tasks, 2);
}

#[test]
fn pagination_falls_back_to_first_page() {
    let env = TestEnv::new();
    for i in 0..25 {
        env.add_task_on("amr", &format!("task {i:02}"), today());
    }

    let first = views::all_tasks(&env.conn, "amr", None).unwrap();
    assert_eq!(first.pagination.page, 1);
    assert_eq!(first.pagination.num_pages, 2);
    assert_eq!(first.pagination.per_page, 20);
    assert_eq!(first.user_tasks.len(), 20);

    let second = views::all_tasks(&env.conn, "amr", Some("2")).unwrap();
    assert_eq!(second.pagination.page, 2);
    assert_eq!(second.user_tasks.len(), 5);
    // Counts come from the unpaginated set, whatever the page.
    assert_eq!(second.counts.total_number_tasks, 25);
    assert_eq!(second.counts.pending_tasks, 25);

    for bad in ["abc", "9999", "0", "-3"] {
        let view = views::all_tasks(&env.conn, "amr", Some(bad)).unwrap();
        assert_eq!(view.pagination.page, 1, "page {bad:?} should fall back");
        assert_eq!(view.user_tasks.len(), 20);
    }
}

// ─── mutations ─────────────────────────────────────────────────────

#[test]
fn add_task_defaults_due_date_to_today() {
    let env = TestEnv::new();

    let absent = mutations::add_task(
        &env.conn,
        "amr",
        NewTask {
            title: "no date",
            ..Default::default()
        },
        Scope::All,
    )
    .unwrap();
    assert_eq!(absent.task.due_date, today());

    let garbled = mutations::add_task(
        &env.conn,
        "amr",
        NewTask {
            title: "bad date",
            details: Some("still fine"),
            due_date: Some("soonish"),
        },
        Scope::All,
    )
    .unwrap();
    assert_eq!(garbled.task.due_date, today());
    assert_eq!(garbled.counts.total_number_tasks, 2);
}

#[test]
fn add_task_requires_a_title() {
    let env = TestEnv::new();
    let err = mutations::add_task(
        &env.conn,
        "amr",
        NewTask {
            title: "   ",
            ..Default::default()
        },
        Scope::All,
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);
}

#[test]
fn update_task_keeps_omitted_fields() {
    let env = TestEnv::new();
    let raw = today().to_string();
    let task = mutations::add_task(
        &env.conn,
        "amr",
        NewTask {
            title: "original",
            details: Some("keep me"),
            due_date: Some(&raw),
        },
        Scope::All,
    )
    .unwrap()
    .task;

    let updated = mutations::update_task(
        &env.conn,
        "amr",
        &task.id,
        TaskPatch {
            title: Some("renamed"),
            ..Default::default()
        },
        Scope::All,
    )
    .unwrap()
    .task;

    assert_eq!(updated.title, "renamed");
    assert_eq!(updated.details.as_deref(), Some("keep me"));
    assert_eq!(updated.due_date, today());
}

#[test]
fn update_task_rejects_explicit_bad_date() {
    let env = TestEnv::new();
    let task = env.add_task_on("amr", "stays put", today());

    let err = mutations::update_task(
        &env.conn,
        "amr",
        &task.id,
        TaskPatch {
            due_date: Some("whenever"),
            ..Default::default()
        },
        Scope::All,
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let stored = task_repo::get_task(&env.conn, "amr", &task.id).unwrap();
    assert_eq!(stored.due_date, today());
}

#[test]
fn bulk_date_update_moves_all_tasks() {
    let env = TestEnv::new();
    let a = env.add_task_on("amr", "a", today());
    let b = env.add_task_on("amr", "b", today() + Duration::days(1));
    let target = today() + Duration::days(3);
    let raw = target.to_string();

    let resp = mutations::update_task_dates(
        &env.conn,
        "amr",
        &[a.id.clone(), b.id.clone()],
        Some(&raw),
        Scope::All,
    )
    .unwrap();

    assert_eq!(resp.tasks.len(), 2);
    assert!(resp.tasks.iter().all(|t| t.due_date == target));
}

#[test]
fn bulk_date_update_rejects_whole_batch_on_bad_date() {
    let env = TestEnv::new();
    let a = env.add_task_on("amr", "a", today());
    let b = env.add_task_on("amr", "b", today() + Duration::days(1));

    let err = mutations::update_task_dates(
        &env.conn,
        "amr",
        &[a.id.clone(), b.id.clone()],
        Some("not-a-date"),
        Scope::All,
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    // Nothing was written.
    assert_eq!(task_repo::get_task(&env.conn, "amr", &a.id).unwrap().due_date, today());
    assert_eq!(
        task_repo::get_task(&env.conn, "amr", &b.id).unwrap().due_date,
        today() + Duration::days(1)
    );
}

#[test]
fn bulk_date_update_validates_id_set() {
    let env = TestEnv::new();
    let raw = today().to_string();

    let err =
        mutations::update_task_dates(&env.conn, "amr", &[], Some(&raw), Scope::All).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = mutations::update_task_dates(
        &env.conn,
        "amr",
        &["nonexistent".to_string()],
        Some(&raw),
        Scope::All,
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::TaskNotFound);
}

#[test]
fn delete_single_and_bulk() {
    let env = TestEnv::new();
    let a = env.add_task_on("amr", "a", today());
    let b = env.add_task_on("amr", "b", today());
    let c = env.add_task_on("amr", "c", today());

    let resp = mutations::delete_task(&env.conn, "amr", &a.id, Scope::All).unwrap();
    assert_eq!(resp.message, "Task deleted");
    assert_eq!(resp.counts.total_number_tasks, 2);

    let err = mutations::delete_tasks(&env.conn, "amr", &[], Scope::All).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let resp =
        mutations::delete_tasks(&env.conn, "amr", &[b.id.clone(), c.id.clone()], Scope::All)
            .unwrap();
    assert_eq!(resp.counts.total_number_tasks, 0);
}

#[test]
fn toggle_sets_and_clears_completed_on() {
    let env = TestEnv::new();
    let task = env.add_task_on("amr", "flip me", today());

    let done = mutations::toggle_complete(&env.conn, "amr", &task.id, Scope::All).unwrap();
    assert!(done.task.completed);
    assert_eq!(done.task.completed_on, Some(today()));

    let undone = mutations::toggle_complete(&env.conn, "amr", &task.id, Scope::All).unwrap();
    assert!(!undone.task.completed);
    assert_eq!(undone.task.completed_on, None);
}

#[test]
fn bulk_toggle_flips_each_task_independently() {
    let env = TestEnv::new();
    let open = env.add_task_on("amr", "open", today());
    let done = env.add_task_on("amr", "done", today());
    mutations::toggle_complete(&env.conn, "amr", &done.id, Scope::All).unwrap();

    let resp = mutations::toggle_tasks_complete(
        &env.conn,
        "amr",
        &[open.id.clone(), done.id.clone()],
        Scope::All,
    )
    .unwrap();

    let flipped_open = resp.tasks.iter().find(|t| t.id == open.id).unwrap();
    let flipped_done = resp.tasks.iter().find(|t| t.id == done.id).unwrap();
    assert!(flipped_open.completed);
    assert_eq!(flipped_open.completed_on, Some(today()));
    assert!(!flipped_done.completed);
    assert_eq!(flipped_done.completed_on, None);
}

#[test]
fn mutation_counts_follow_requested_scope() {
    let env = TestEnv::new();
    let near = env.add_task_on("amr", "near", today());
    env.add_task_on("amr", "far", today() + Duration::days(30));

    let resp = mutations::toggle_complete(&env.conn, "amr", &near.id, Scope::Today).unwrap();
    // The far task is outside the today scope.
    assert_eq!(resp.counts.total_number_tasks, 1);
    assert_eq!(resp.counts.completed_tasks_count, 1);
    assert_eq!(resp.counts.pending_tasks, 0);

    let resp = mutations::toggle_complete(&env.conn, "amr", &near.id, Scope::All).unwrap();
    assert_eq!(resp.counts.total_number_tasks, 2);
    assert_eq!(resp.counts.completed_tasks_count, 0);
}

// ─── ownership isolation ───────────────────────────────────────────

#[test]
fn owners_cannot_touch_each_others_tasks() {
    let env = TestEnv::new();
    let theirs = env.add_task_on("alice", "private", today());

    // Every single-task operation surfaces as not-found for the intruder.
    let err = mutations::update_task(
        &env.conn,
        "bob",
        &theirs.id,
        TaskPatch::default(),
        Scope::All,
    )
    .unwrap_err();
    assert_eq!(err.code, ErrorCode::TaskNotFound);

    let err = mutations::toggle_complete(&env.conn, "bob", &theirs.id, Scope::All).unwrap_err();
    assert_eq!(err.code, ErrorCode::TaskNotFound);

    let err = mutations::delete_task(&env.conn, "bob", &theirs.id, Scope::All).unwrap_err();
    assert_eq!(err.code, ErrorCode::TaskNotFound);

    // Bulk delete of a foreign id deletes nothing.
    mutations::delete_tasks(&env.conn, "bob", &[theirs.id.clone()], Scope::All).unwrap();
    assert!(task_repo::get_task(&env.conn, "alice", &theirs.id).is_ok());

    // Views never leak across owners.
    assert!(env.all_owned("bob").is_empty());
    assert_eq!(env.all_owned("alice").len(), 1);
}

#[test]
fn routines_are_owner_scoped_too() {
    let env = TestEnv::new();
    let routine = env.add_routine(
        "alice",
        "Private habit",
        RecurrenceRule::Weekdays {
            days: vec![Weekday::Mon],
        },
    );

    let err = routine_repo::delete_routine(&env.conn, "bob", &routine.id).unwrap_err();
    assert_eq!(err.code, ErrorCode::RoutineNotFound);

    // Bob's materialization pass sees none of Alice's routines.
    assert_eq!(engine::apply_routines(&env.conn, "bob", monday()).unwrap(), 0);
    assert!(env.all_owned("bob").is_empty());
}
