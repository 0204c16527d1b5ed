//! State machine tests for the TUI App.
//!
//! Each test spawns a test server on a separate thread (to avoid nested
//! tokio runtime panics), seeds the backing store, creates a
//! BlockingHttpService, builds an App, and simulates key events.

use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use treekeeper_core::health::HealthStatus;
use treekeeper_core::maintenance::YesNo;
use treekeeper_core::session::SessionState;
use treekeeper_core::tree::TreeRecord;
use treekeeper_server::store::MemoryStore;
use treekeeper_service::BlockingHttpService;
use treekeeper_tui::app::{App, MaintenanceFocus, Mode};
use treekeeper_tui::auth::StaticAuth;

/// Spawn the test server on a separate thread, return the base URL and the
/// store handle. BlockingHttpService creates its own tokio Runtime, so the
/// server must live in a separate thread's Runtime to avoid nesting.
fn spawn_server() -> (String, Arc<MemoryStore>) {
    let (tx, rx) = std::sync::mpsc::sync_channel(1);
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let server = treekeeper_server::test_helpers::spawn_test_server().await;
            tx.send((server.base_url.clone(), server.store.clone()))
                .unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn char_key(c: char) -> KeyEvent {
    key(KeyCode::Char(c))
}

fn ctrl_s() -> KeyEvent {
    KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL)
}

fn signed_in(user: &str) -> Box<StaticAuth> {
    Box::new(StaticAuth {
        authenticated: true,
        user: Some(user.to_string()),
    })
}

fn signed_out() -> Box<StaticAuth> {
    Box::new(StaticAuth {
        authenticated: false,
        user: None,
    })
}

/// A record with no notes and no health, for edge-case tests.
fn bare_tree(id: &str) -> TreeRecord {
    TreeRecord {
        id_tree: id.to_string(),
        common: Some("Ghost Elm".into()),
        scientific: None,
        date_planted: None,
        health: None,
        health_num: None,
        address: None,
        city: None,
        neighborhood: None,
        lat: None,
        lng: None,
        owner: None,
        id_reference: None,
        who: None,
        country: None,
        zip: None,
        notes: None,
    }
}

/// App over a freshly seeded tree "1", signed in as "Sam".
fn make_app() -> (App, Arc<MemoryStore>) {
    let (url, store) = spawn_server();
    store.seed_demo();
    let svc = BlockingHttpService::new(&url);
    let app = App::new(svc, signed_in("Sam"), "1").unwrap();
    (app, store)
}

// ---- Startup ----

#[test]
fn app_starts_in_detail_for_existing_tree() {
    let (app, _store) = make_app();
    assert!(matches!(app.mode(), Mode::Detail));
    assert!(app.current_tree().is_some());
}

#[test]
fn missing_tree_starts_no_data() {
    let (url, _store) = spawn_server();
    let svc = BlockingHttpService::new(&url);
    let app = App::new(svc, signed_in("Sam"), "404").unwrap();
    assert!(matches!(app.mode(), Mode::NoData));
}

#[test]
fn no_data_retry_finds_late_record() {
    let (url, store) = spawn_server();
    let svc = BlockingHttpService::new(&url);
    let mut app = App::new(svc, signed_in("Sam"), "1").unwrap();
    assert!(matches!(app.mode(), Mode::NoData));

    store.seed_demo();
    app.handle_key(char_key('r'));
    assert!(matches!(app.mode(), Mode::Detail));
}

// ---- Mode transitions ----

#[test]
fn n_enters_notes_editor() {
    let (mut app, _store) = make_app();
    app.handle_key(char_key('n'));
    assert!(matches!(app.mode(), Mode::EditNotes));
    assert!(app.is_input_mode());
}

#[test]
fn notes_esc_returns_to_detail_and_discards_edits() {
    let (mut app, _store) = make_app();
    app.handle_key(char_key('n'));
    app.handle_key(char_key('x'));
    assert!(matches!(app.notes_state(), SessionState::Dirty));
    app.handle_key(key(KeyCode::Esc));
    assert!(matches!(app.mode(), Mode::Detail));
    assert!(matches!(app.notes_state(), SessionState::Idle));
}

#[test]
fn m_enters_maintenance_form() {
    let (mut app, _store) = make_app();
    app.handle_key(char_key('m'));
    assert!(matches!(
        app.mode(),
        Mode::Maintenance {
            focus: MaintenanceFocus::Toggles
        }
    ));
    assert!(app.is_input_mode());
}

#[test]
fn maintenance_tab_cycles_focus() {
    let (mut app, _store) = make_app();
    app.handle_key(char_key('m'));
    app.handle_key(key(KeyCode::Tab));
    assert!(matches!(
        app.mode(),
        Mode::Maintenance {
            focus: MaintenanceFocus::Volunteer
        }
    ));
    app.handle_key(key(KeyCode::Tab));
    assert!(matches!(
        app.mode(),
        Mode::Maintenance {
            focus: MaintenanceFocus::Comment
        }
    ));
    app.handle_key(key(KeyCode::Tab));
    assert!(matches!(
        app.mode(),
        Mode::Maintenance {
            focus: MaintenanceFocus::Toggles
        }
    ));
}

// ---- Auth gating ----

#[test]
fn signed_out_edit_attempts_show_login_hint() {
    let (url, store) = spawn_server();
    store.seed_demo();
    let svc = BlockingHttpService::new(&url);
    let mut app = App::new(svc, signed_out(), "1").unwrap();

    app.handle_key(char_key('n'));
    assert!(matches!(app.mode(), Mode::Detail));
    assert!(app.status_message().is_some());

    app.handle_key(char_key('m'));
    assert!(matches!(app.mode(), Mode::Detail));

    // Slider is gated too, and nothing was written.
    app.handle_key(key(KeyCode::Right));
    let tree = store.get_tree("1").unwrap();
    assert_eq!(tree.health_num, Some(3));
}

// ---- Health slider ----

#[test]
fn slider_move_saves_newly_derived_label() {
    // Seeded record has healthNum 3 (stump). Moving to 5 must persist
    // "fair" (the new label), not "stump".
    let (mut app, store) = make_app();
    app.handle_key(key(KeyCode::Right));
    app.handle_key(key(KeyCode::Right));

    let tree = store.get_tree("1").unwrap();
    assert_eq!(tree.health, Some(HealthStatus::Fair));
    assert_eq!(tree.health_num, Some(5));

    // The cache was invalidated and refetched after the write.
    assert_eq!(
        app.current_tree().unwrap().health,
        Some(HealthStatus::Fair)
    );
}

#[test]
fn slider_shows_success_feedback_after_save() {
    let (mut app, _store) = make_app();
    app.handle_key(key(KeyCode::Right));
    assert!(matches!(app.health_state(), SessionState::Success));
    assert!(app.needs_polling());
}

#[test]
fn slider_at_bound_writes_nothing() {
    let (url, store) = spawn_server();
    let mut tree = bare_tree("9");
    tree.health_num = Some(6);
    tree.health = Some(HealthStatus::Good);
    store.insert_tree(tree);

    let svc = BlockingHttpService::new(&url);
    let mut app = App::new(svc, signed_in("Sam"), "9").unwrap();
    app.handle_key(key(KeyCode::Right));

    assert!(matches!(app.health_state(), SessionState::Idle));
    assert_eq!(store.get_tree("9").unwrap().health_num, Some(6));
}

// ---- Notes ----

#[test]
fn notes_save_roundtrip() {
    let (url, store) = spawn_server();
    store.insert_tree(bare_tree("9"));
    let svc = BlockingHttpService::new(&url);
    let mut app = App::new(svc, signed_in("Sam"), "9").unwrap();

    app.handle_key(char_key('n'));
    for c in "new leader".chars() {
        app.handle_key(char_key(c));
    }
    app.handle_key(ctrl_s());

    assert!(matches!(app.notes_state(), SessionState::Success));
    assert_eq!(
        store.get_tree("9").unwrap().notes.as_deref(),
        Some("new leader")
    );
    // Sibling read side observes the write.
    assert_eq!(
        app.current_tree().unwrap().notes.as_deref(),
        Some("new leader")
    );
}

#[test]
fn empty_notes_submit_is_skipped() {
    let (url, store) = spawn_server();
    store.insert_tree(bare_tree("9"));
    let svc = BlockingHttpService::new(&url);
    let mut app = App::new(svc, signed_in("Sam"), "9").unwrap();

    app.handle_key(char_key('n'));
    app.handle_key(ctrl_s());

    assert!(matches!(app.notes_state(), SessionState::Idle));
    assert!(store.get_tree("9").unwrap().notes.is_none());
}

// ---- Maintenance form ----

#[test]
fn watered_only_submit_stores_flag_without_comment() {
    let (mut app, store) = make_app();
    app.handle_key(char_key('m'));
    app.handle_key(char_key('1'));
    app.handle_key(ctrl_s());

    assert!(matches!(app.maintenance_state(), SessionState::Success));

    let history = store.visit_history("1").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].watered, Some(YesNo::Yes));
    assert!(history[0].comment.is_none());
    assert_eq!(history[0].volunteer.as_deref(), Some("Sam"));
    assert_eq!(history[0].maintenance_summary(), "watered");
}

#[test]
fn empty_maintenance_submit_makes_no_network_call() {
    let (mut app, store) = make_app();
    app.handle_key(char_key('m'));
    app.handle_key(ctrl_s());

    // Silently skipped: no request, no error, no feedback.
    assert!(matches!(app.maintenance_state(), SessionState::Idle));
    assert!(store.visit_history("1").unwrap().is_empty());
}

#[test]
fn flag_toggled_on_and_off_still_submits() {
    // Key presence, not truthiness: a touched flag makes the payload
    // qualify even at "no".
    let (mut app, store) = make_app();
    app.handle_key(char_key('m'));
    app.handle_key(char_key('2'));
    app.handle_key(char_key('2'));
    app.handle_key(ctrl_s());

    let history = store.visit_history("1").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].mulched, Some(YesNo::No));
    assert_eq!(history[0].maintenance_summary(), "");
}

#[test]
fn comment_only_submit_qualifies() {
    let (mut app, store) = make_app();
    app.handle_key(char_key('m'));
    app.handle_key(key(KeyCode::Tab));
    app.handle_key(key(KeyCode::Tab));
    for c in "trimmed".chars() {
        app.handle_key(char_key(c));
    }
    app.handle_key(ctrl_s());

    let history = store.visit_history("1").unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].comment.as_deref(), Some("trimmed"));
}

#[test]
fn new_visit_refreshes_the_history_cache() {
    let (mut app, _store) = make_app();
    assert_eq!(app.current_history().map(|h| h.len()), Some(0));

    app.handle_key(char_key('m'));
    app.handle_key(char_key('1'));
    app.handle_key(ctrl_s());

    assert_eq!(app.current_history().map(|h| h.len()), Some(1));
}

// ---- Feedback tick ----

#[test]
fn feedback_clears_after_tick_past_delay() {
    let (mut app, _store) = make_app();
    app.handle_key(key(KeyCode::Right));
    assert!(app.needs_polling());

    // The configured feedback delay is 800ms; sleep past it, then tick.
    std::thread::sleep(std::time::Duration::from_millis(850));
    app.tick();
    assert!(matches!(app.health_state(), SessionState::Idle));
    assert!(!app.needs_polling());
}
