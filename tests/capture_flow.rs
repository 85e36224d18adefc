use egui::{PointerButton, Pos2, Vec2, pos2};
use forensic_markings::config::CursorMode;
use forensic_markings::input::PointerEvent;
use forensic_markings::marking::MarkingClass;
use forensic_markings::state::{CanvasId, Session};

// A session in marking mode with an 800x600 image on both canvases, shown 1:1
fn marking_session(type_id: &str) -> Session {
    let mut session = Session::default();
    session.set_cursor_mode(CursorMode::Marking);
    for id in CanvasId::BOTH {
        session.load_image(id, Vec2::new(800.0, 600.0));
    }
    assert!(session.select_marking_type(type_id));
    session
}

fn down(session: &mut Session, pos: Pos2) {
    session.handle_pointer(CanvasId::Left, PointerEvent::moved(pos));
    session.handle_pointer(CanvasId::Left, PointerEvent::down(pos, PointerButton::Primary));
}

fn up(session: &mut Session, pos: Pos2) {
    session.handle_pointer(CanvasId::Left, PointerEvent::up(pos, PointerButton::Primary));
}

fn click(session: &mut Session, pos: Pos2) {
    down(session, pos);
    up(session, pos);
}

#[test]
fn test_point_capture_undo_redo() {
    let mut session = marking_session("point");

    click(&mut session, pos2(120.0, 80.0));
    let committed = session.markings(CanvasId::Left).to_vec();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].label, 1);
    assert_eq!(committed[0].marking_class(), MarkingClass::Point);
    assert_eq!(committed[0].origin, pos2(120.0, 80.0));
    assert!(session.canvas(CanvasId::Left).store.temporary().is_none());

    assert!(session.undo());
    assert!(session.markings(CanvasId::Left).is_empty());

    assert!(session.redo());
    assert_eq!(session.markings(CanvasId::Left), committed.as_slice());
}

#[test]
fn test_labels_keep_counting_after_undo() {
    let mut session = marking_session("point");
    click(&mut session, pos2(10.0, 10.0));
    session.undo();
    click(&mut session, pos2(20.0, 20.0));
    assert_eq!(session.markings(CanvasId::Left)[0].label, 2);
}

#[test]
fn test_polygon_closes_on_first_vertex() {
    let mut session = marking_session("polygon");

    click(&mut session, pos2(0.0, 0.0));
    click(&mut session, pos2(100.0, 0.0));
    click(&mut session, pos2(100.0, 100.0));
    assert!(session.markings(CanvasId::Left).is_empty());

    click(&mut session, pos2(5.0, 5.0));
    let markings = session.markings(CanvasId::Left);
    assert_eq!(markings.len(), 1);
    assert_eq!(
        markings[0].points(),
        &[pos2(0.0, 0.0), pos2(100.0, 0.0), pos2(100.0, 100.0)]
    );
    assert!(session.history().can_undo());
}

#[test]
fn test_polygon_far_click_appends_vertex() {
    let mut session = marking_session("polygon");

    click(&mut session, pos2(0.0, 0.0));
    click(&mut session, pos2(100.0, 0.0));
    click(&mut session, pos2(100.0, 100.0));
    click(&mut session, pos2(50.0, 50.0));

    assert!(session.markings(CanvasId::Left).is_empty());
    let capture = session.canvas(CanvasId::Left).capture.current().unwrap();
    assert_eq!(capture.vertices().len(), 4);
}

#[test]
fn test_ray_commits_on_second_press() {
    let mut session = marking_session("ray");

    click(&mut session, pos2(200.0, 200.0));
    assert!(session.markings(CanvasId::Left).is_empty());

    session.handle_pointer(CanvasId::Left, PointerEvent::moved(pos2(300.0, 200.0)));
    down(&mut session, pos2(300.0, 200.0));

    let ray = &session.markings(CanvasId::Left)[0];
    assert_eq!(ray.origin, pos2(200.0, 200.0));
    assert!(ray.angle_rad().unwrap().abs() < 1e-5);
}

#[test]
fn test_rectangle_follows_screen_axes_when_rotated() {
    let mut session = marking_session("rectangle");
    session.rotate_canvas(CanvasId::Left, std::f32::consts::PI);

    down(&mut session, pos2(300.0, 200.0));
    up(&mut session, pos2(300.0, 200.0));
    down(&mut session, pos2(350.0, 250.0));

    let rectangle = &session.markings(CanvasId::Left)[0];
    let expected = [pos2(500.0, 400.0), pos2(500.0, 350.0), pos2(450.0, 350.0), pos2(450.0, 400.0)];
    for (actual, expected) in rectangle.points().iter().zip(expected) {
        assert!(actual.distance(expected) < 1e-3, "{actual:?} != {expected:?}");
    }
}

#[test]
fn test_interrupt_discards_without_commit() {
    let mut session = marking_session("line-segment");

    click(&mut session, pos2(10.0, 10.0));
    assert!(session.canvas(CanvasId::Left).capture.is_active());

    session.interrupt_marking();
    assert!(!session.canvas(CanvasId::Left).capture.is_active());
    assert!(session.canvas(CanvasId::Left).store.temporary().is_none());

    down(&mut session, pos2(50.0, 50.0));
    assert!(session.markings(CanvasId::Left).is_empty());
    assert!(!session.history().can_undo());
}

#[test]
fn test_no_selected_type_refuses_capture() {
    let mut session = marking_session("point");
    session.settings_mut().marking_types.clear_selection();

    click(&mut session, pos2(10.0, 10.0));
    assert!(session.markings(CanvasId::Left).is_empty());
    assert!(session.canvas(CanvasId::Left).store.temporary().is_none());
}

#[test]
fn test_canvases_capture_independently() {
    let mut session = marking_session("bounding-box");
    click(&mut session, pos2(10.0, 10.0));
    assert!(session.canvas(CanvasId::Left).capture.is_active());
    assert!(!session.canvas(CanvasId::Right).capture.is_active());

    session.handle_pointer(CanvasId::Right, PointerEvent::down(pos2(1.0, 1.0), PointerButton::Primary));
    assert!(session.canvas(CanvasId::Right).capture.is_active());
}
