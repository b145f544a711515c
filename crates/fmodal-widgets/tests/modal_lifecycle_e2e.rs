#![forbid(unsafe_code)]

//! End-to-end lifecycle tests against the in-memory host.

use std::cell::RefCell;
use std::rc::Rc;

use fmodal_backend::{DocumentHost, ListenerTarget, StyleValue};
use fmodal_core::event::{HostEvent, KeyCode, KeyEvent, ListenerKind};
use fmodal_core::geometry::{Point, Size};
use fmodal_core::node::NodeId;
use fmodal_web::{ImageOutcome, WebBackend, WebViewport};
use fmodal_widgets::modal::{
    ContentOptions, Emitter, ModalConfig, ModalController, ModalError, Notification, ShowState,
};
use pretty_assertions::assert_eq;

type Modal = ModalController<WebBackend>;

fn modal_in(viewport: WebViewport) -> Modal {
    let mut modal = ModalController::new(ModalConfig::default(), WebBackend::new(viewport));
    modal.attach().expect("attach");
    modal
}

fn block(modal: &mut Modal, width: f64, height: f64) -> NodeId {
    modal
        .backend_mut()
        .document
        .create_block(Size::new(width, height))
}

fn gallery(modal: &mut Modal, sources: &[(&str, f64, f64)]) -> NodeId {
    let doc = &mut modal.backend_mut().document;
    let container = doc.create_element("div").expect("container");
    for (src, w, h) in sources {
        let img = doc.create_image(src, Size::new(*w, *h));
        doc.append_child(container, img).expect("append img");
    }
    container
}

fn escape() -> HostEvent {
    HostEvent::Key(KeyEvent::new(KeyCode::Escape))
}

/// Panel and overlay styles relevant to layout.
#[derive(Debug, Clone, PartialEq)]
struct LayoutSnapshot {
    overlay_width: Option<StyleValue>,
    overlay_height: Option<StyleValue>,
    panel_left: Option<StyleValue>,
    panel_top: Option<StyleValue>,
    panel_width: Option<StyleValue>,
    panel_height: Option<StyleValue>,
    panel_overflow: Option<StyleValue>,
}

fn snapshot(modal: &Modal) -> LayoutSnapshot {
    let doc = &modal.backend().document;
    let overlay = modal.overlay().expect("overlay");
    let panel = modal.panel().expect("panel");
    let get = |node: NodeId, prop: &str| doc.style(node, prop).cloned();
    LayoutSnapshot {
        overlay_width: get(overlay, "width"),
        overlay_height: get(overlay, "height"),
        panel_left: get(panel, "left"),
        panel_top: get(panel, "top"),
        panel_width: get(panel, "width"),
        panel_height: get(panel, "height"),
        panel_overflow: get(panel, "overflow"),
    }
}

fn active_listeners(modal: &Modal) -> [usize; 4] {
    let doc = &modal.backend().document;
    let overlay = modal.overlay().expect("overlay");
    [
        doc.listener_count_for(ListenerTarget::Window, ListenerKind::Resize),
        doc.listener_count_for(ListenerTarget::Window, ListenerKind::Scroll),
        doc.listener_count_for(ListenerTarget::Document, ListenerKind::KeyDown),
        doc.listener_count_for(ListenerTarget::Node(overlay), ListenerKind::Click),
    ]
}

#[test]
fn default_panel_is_centred_in_1024x768() {
    let mut modal = modal_in(WebViewport::new(1024.0, 768.0));
    let content = block(&mut modal, 100.0, 100.0);
    modal
        .load_content(content, ContentOptions::new())
        .expect("load");

    let geometry = modal.geometry().expect("showing");
    assert_eq!(geometry.x_margin, 212.0);
    assert_eq!(geometry.y_margin, 84.0);
    assert_eq!(geometry.size(), Size::new(600.0, 600.0));
    assert_eq!(
        snapshot(&modal),
        LayoutSnapshot {
            overlay_width: Some(StyleValue::Px(1024.0)),
            overlay_height: Some(StyleValue::Px(768.0)),
            panel_left: Some(StyleValue::Px(212.0)),
            panel_top: Some(StyleValue::Px(84.0)),
            panel_width: Some(StyleValue::Px(600.0)),
            panel_height: Some(StyleValue::Px(600.0)),
            panel_overflow: Some(StyleValue::keyword("auto")),
        }
    );
}

#[test]
fn narrow_viewport_clamps_panel_width() {
    let mut modal = modal_in(WebViewport::new(500.0, 768.0));
    modal.show().expect("show");

    let geometry = modal.geometry().expect("showing");
    assert_eq!(geometry.width, 500.0);
    assert_eq!(geometry.x_margin, 0.0);
    assert_eq!(geometry.actual_width, 600.0);
    assert_eq!(geometry.height, 600.0);
    let panel = modal.panel().expect("panel");
    assert_eq!(
        modal.backend().document.style(panel, "overflow"),
        Some(&StyleValue::keyword("scroll"))
    );
}

#[test]
fn overlay_tracks_scrollable_document() {
    let viewport = WebViewport::new(1024.0, 768.0).with_document_size(1400.0, 3000.0);
    let mut modal = modal_in(viewport);
    let content = block(&mut modal, 200.0, 100.0);
    modal
        .load_content(content, ContentOptions::new().size(200.0, 100.0))
        .expect("show with small panel");
    let before = snapshot(&modal);
    assert_eq!(before.overlay_width, Some(StyleValue::Px(1400.0)));
    assert_eq!(before.overlay_height, Some(StyleValue::Px(3000.0)));

    modal
        .backend_mut()
        .viewport
        .set_document_size(1400.0, 5000.0);
    modal
        .handle_event(&HostEvent::Scroll { target: None })
        .expect("scroll");
    let after = snapshot(&modal);
    assert_eq!(after.overlay_height, Some(StyleValue::Px(5000.0)));
    assert_eq!(after.panel_width, before.panel_width);
}

#[test]
fn hide_then_show_reproduces_geometry() {
    let mut modal = modal_in(WebViewport::new(1280.0, 720.0));
    let options = ContentOptions::new().size(400.0, 300.0).offset(10.0, 20.0);

    let first = block(&mut modal, 1.0, 1.0);
    modal.load_content(first, options.clone()).expect("load");
    let geometry = modal.geometry();
    let styles = snapshot(&modal);

    modal.hide().expect("hide");
    let second = block(&mut modal, 1.0, 1.0);
    modal.load_content(second, options).expect("reload");

    assert_eq!(modal.geometry(), geometry);
    assert_eq!(snapshot(&modal), styles);
}

#[test]
fn listener_count_is_stable_across_cycles() {
    let mut modal = modal_in(WebViewport::default());
    let mut showing_counts = Vec::new();
    let mut hidden_totals = Vec::new();
    for _ in 0..10 {
        let content = block(&mut modal, 50.0, 50.0);
        modal
            .load_content(content, ContentOptions::new())
            .expect("load");
        // A second show while showing must not re-bind.
        modal.show().expect("show again");
        showing_counts.push(active_listeners(&modal));
        modal.hide().expect("hide");
        hidden_totals.push(modal.backend().document.listener_count());
    }
    assert!(showing_counts.iter().all(|c| *c == [1, 1, 1, 1]));
    assert!(hidden_totals.iter().all(|n| *n == 0));
}

#[test]
fn reshow_loads_do_not_leak_listeners() {
    let mut modal = modal_in(WebViewport::default());
    for _ in 0..5 {
        let content = block(&mut modal, 50.0, 50.0);
        modal
            .load_content(content, ContentOptions::new())
            .expect("load while showing");
    }
    assert_eq!(active_listeners(&modal), [1, 1, 1, 1]);
    assert_eq!(modal.backend().document.listener_count(), 4);
}

#[test]
fn scroll_inside_panel_keeps_position() {
    let viewport = WebViewport::new(1024.0, 768.0).with_document_size(1024.0, 3000.0);
    let mut modal = modal_in(viewport);
    let doc = &mut modal.backend_mut().document;
    let content = doc.create_element("div").expect("content");
    let scroller = doc.create_block(Size::new(100.0, 2000.0));
    doc.append_child(content, scroller).expect("append");
    modal
        .load_content(content, ContentOptions::new())
        .expect("load");
    let before = snapshot(&modal);

    modal
        .backend_mut()
        .viewport
        .scroll_to(Point::new(0.0, 500.0));
    modal
        .handle_event(&HostEvent::Scroll {
            target: Some(scroller),
        })
        .expect("inner scroll");
    assert_eq!(snapshot(&modal), before);

    modal
        .handle_event(&HostEvent::Scroll { target: None })
        .expect("window scroll");
    assert_eq!(snapshot(&modal).panel_top, Some(StyleValue::Px(584.0)));
}

#[test]
fn scroll_outside_panel_repositions() {
    let viewport = WebViewport::new(1024.0, 768.0).with_document_size(1024.0, 3000.0);
    let mut modal = modal_in(viewport);
    modal.show().expect("show");
    let elsewhere = block(&mut modal, 10.0, 10.0);
    let root = modal.backend().document.root();
    modal
        .backend_mut()
        .document
        .append_child(root, elsewhere)
        .expect("append");

    modal
        .backend_mut()
        .viewport
        .scroll_to(Point::new(0.0, 100.0));
    modal
        .handle_event(&HostEvent::Scroll {
            target: Some(elsewhere),
        })
        .expect("scroll");
    assert_eq!(snapshot(&modal).panel_top, Some(StyleValue::Px(184.0)));
}

#[test]
fn escape_hides_once_and_is_inert_while_hidden() {
    let mut modal = modal_in(WebViewport::default());
    let hidden = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&hidden);
    modal.subscribe(Notification::Hidden, move |_| *counter.borrow_mut() += 1);

    modal.show().expect("show");
    modal.handle_event(&escape()).expect("escape");
    assert_eq!(modal.state(), ShowState::Hidden);
    modal.handle_event(&escape()).expect("escape while hidden");
    assert_eq!(modal.state(), ShowState::Hidden);
    assert_eq!(*hidden.borrow(), 1);
}

#[test]
fn overlay_click_hides_but_panel_click_does_not() {
    let mut modal = modal_in(WebViewport::default());
    modal.show().expect("show");
    let panel = modal.panel().expect("panel");
    let overlay = modal.overlay().expect("overlay");
    modal
        .handle_event(&HostEvent::Click { target: panel })
        .expect("panel click");
    assert!(modal.is_showing());
    modal
        .handle_event(&HostEvent::Click { target: overlay })
        .expect("overlay click");
    assert!(!modal.is_showing());
}

#[test]
fn resize_relayout_may_shrink_autosized_panel() {
    let mut modal = modal_in(WebViewport::default());
    let content = block(&mut modal, 400.0, 300.0);
    modal
        .load_content_auto_size(content, ContentOptions::new())
        .expect("auto load");
    assert_eq!(
        modal.geometry().map(|g| g.size()),
        Some(Size::new(400.0, 300.0))
    );

    modal
        .backend_mut()
        .document
        .set_intrinsic_size(content, Size::new(200.0, 100.0))
        .expect("reflow");
    modal.handle_event(&HostEvent::Resize).expect("resize");
    assert_eq!(
        modal.geometry().map(|g| g.size()),
        Some(Size::new(200.0, 100.0))
    );
}

#[test]
fn content_change_relayout_never_shrinks() {
    let mut modal = modal_in(WebViewport::default());
    let content = block(&mut modal, 400.0, 300.0);
    modal
        .load_content_auto_size(content, ContentOptions::new())
        .expect("auto load");

    modal
        .backend_mut()
        .document
        .set_intrinsic_size(content, Size::new(350.0, 250.0))
        .expect("smaller");
    modal.notify_content_changed().expect("changed");
    assert_eq!(
        modal.geometry().map(|g| g.size()),
        Some(Size::new(400.0, 300.0))
    );

    modal
        .backend_mut()
        .document
        .set_intrinsic_size(content, Size::new(500.0, 200.0))
        .expect("wider");
    modal.notify_content_changed().expect("changed");
    assert_eq!(
        modal.geometry().map(|g| g.size()),
        Some(Size::new(500.0, 300.0))
    );
}

#[test]
fn content_change_without_autosize_is_ignored() {
    let mut modal = modal_in(WebViewport::default());
    let content = block(&mut modal, 400.0, 300.0);
    modal
        .load_content(content, ContentOptions::new())
        .expect("load");
    let before = modal.geometry();
    modal
        .backend_mut()
        .document
        .set_intrinsic_size(content, Size::new(900.0, 900.0))
        .expect("grow");
    modal.notify_content_changed().expect("changed");
    assert_eq!(modal.geometry(), before);
}

#[test]
fn remeasure_clones_are_released() {
    let mut modal = modal_in(WebViewport::default());
    let content = block(&mut modal, 400.0, 300.0);
    modal
        .load_content_auto_size(content, ContentOptions::new())
        .expect("auto load");
    let nodes = modal.backend().document.node_count();
    for _ in 0..3 {
        modal.handle_event(&HostEvent::Resize).expect("resize");
    }
    assert_eq!(modal.backend().document.node_count(), nodes);
}

#[test]
fn autosize_waits_for_images() {
    let mut modal = modal_in(WebViewport::default());
    let content = gallery(&mut modal, &[("a.png", 320.0, 200.0), ("b.png", 300.0, 100.0)]);
    modal
        .load_content_auto_size(content, ContentOptions::new())
        .expect("auto load");
    assert!(!modal.is_showing());
    assert!(modal.is_measuring());
    assert_eq!(
        modal.backend().images.pending_urls(),
        vec!["a.png".to_owned(), "b.png".to_owned()]
    );

    modal
        .backend_mut()
        .images
        .settle("a.png", ImageOutcome::Loaded);
    assert!(!modal.poll().expect("poll"));
    assert!(!modal.is_showing());

    // A failed image still lets the measurement through.
    modal
        .backend_mut()
        .images
        .settle("b.png", ImageOutcome::Failed);
    assert!(modal.poll().expect("poll"));
    assert!(modal.is_showing());
    assert_eq!(
        modal.geometry().map(|g| g.size()),
        Some(Size::new(320.0, 300.0))
    );
    let options = modal.content_options().expect("options");
    assert!(options.autosize);
    assert_eq!(options.panel_width, Some(320.0));
}

#[test]
fn later_load_supersedes_pending_measurement() {
    let mut modal = modal_in(WebViewport::default());
    let slow = gallery(&mut modal, &[("slow.png", 800.0, 600.0)]);
    modal
        .load_content_auto_size(slow, ContentOptions::new())
        .expect("slow load");
    let quick = block(&mut modal, 120.0, 80.0);
    modal
        .load_content_auto_size(quick, ContentOptions::new())
        .expect("quick load");
    assert_eq!(
        modal.geometry().map(|g| g.size()),
        Some(Size::new(120.0, 80.0))
    );
    assert_eq!(modal.backend().images.pending_batches(), 0);

    modal
        .backend_mut()
        .images
        .settle("slow.png", ImageOutcome::Loaded);
    assert!(!modal.poll().expect("stale poll"));
    let panel = modal.panel().expect("panel");
    assert_eq!(modal.backend().document.children(panel), vec![quick]);
    assert_eq!(
        modal.geometry().map(|g| g.size()),
        Some(Size::new(120.0, 80.0))
    );
}

#[test]
fn plain_load_cancels_pending_auto_load() {
    let mut modal = modal_in(WebViewport::default());
    let slow = gallery(&mut modal, &[("slow.png", 800.0, 600.0)]);
    modal
        .load_content_auto_size(slow, ContentOptions::new())
        .expect("slow load");
    let plain = block(&mut modal, 10.0, 10.0);
    modal
        .load_content(plain, ContentOptions::new())
        .expect("plain load");
    assert!(!modal.is_measuring());

    modal
        .backend_mut()
        .images
        .settle_all(ImageOutcome::Loaded);
    assert!(!modal.poll().expect("poll"));
    let panel = modal.panel().expect("panel");
    assert_eq!(modal.backend().document.children(panel), vec![plain]);
}

/// Shows `first` auto-sized, then starts an auto-size load of a gallery
/// that waits on `b.png`.
fn pending_auto_load(modal: &mut Modal) -> (NodeId, NodeId) {
    let first = block(modal, 100.0, 100.0);
    modal
        .load_content_auto_size(first, ContentOptions::new())
        .expect("first load");
    let second = gallery(modal, &[("b.png", 300.0, 200.0)]);
    modal
        .load_content_auto_size(second, ContentOptions::new())
        .expect("second load");
    assert!(modal.is_measuring());
    (first, second)
}

fn settle_and_drain(modal: &mut Modal) {
    modal
        .backend_mut()
        .images
        .settle_all(ImageOutcome::Loaded);
    while modal.poll().expect("poll") {}
}

#[test]
fn resize_does_not_drop_pending_auto_load() {
    let mut modal = modal_in(WebViewport::new(1024.0, 768.0));
    let (first, second) = pending_auto_load(&mut modal);

    modal.backend_mut().viewport.set_size(900.0, 700.0);
    modal.handle_event(&HostEvent::Resize).expect("resize");
    assert!(modal.is_measuring());
    let panel = modal.panel().expect("panel");
    assert_eq!(modal.backend().document.children(panel), vec![first]);

    settle_and_drain(&mut modal);
    assert!(!modal.is_measuring());
    assert_eq!(modal.backend().document.children(panel), vec![second]);
    let geometry = modal.geometry().expect("showing");
    assert_eq!(geometry.size(), Size::new(300.0, 200.0));
    assert_eq!(geometry.x_margin, 300.0);
}

#[test]
fn content_change_does_not_drop_pending_auto_load() {
    let mut modal = modal_in(WebViewport::new(1024.0, 768.0));
    let (first, second) = pending_auto_load(&mut modal);

    modal
        .backend_mut()
        .document
        .set_intrinsic_size(first, Size::new(150.0, 150.0))
        .expect("reflow");
    modal.notify_content_changed().expect("changed");
    assert!(modal.is_measuring());

    settle_and_drain(&mut modal);
    let panel = modal.panel().expect("panel");
    assert_eq!(modal.backend().document.children(panel), vec![second]);
    assert_eq!(
        modal.geometry().map(|g| g.size()),
        Some(Size::new(300.0, 200.0))
    );
}

#[test]
fn notifications_follow_lifecycle() {
    let mut modal = modal_in(WebViewport::default());
    let log = Rc::new(RefCell::new(Vec::new()));
    for n in [Notification::Shown, Notification::Hidden] {
        let log = Rc::clone(&log);
        modal.subscribe(n, move |n| log.borrow_mut().push(n.as_str()));
    }
    modal.show().expect("show");
    modal.show().expect("show is idempotent");
    modal.hide().expect("hide");
    modal.hide().expect("hide is idempotent");
    assert_eq!(*log.borrow(), vec!["shown", "hidden"]);
}

#[test]
fn destroyed_modal_rejects_everything() {
    let mut modal = modal_in(WebViewport::default());
    let content = block(&mut modal, 10.0, 10.0);
    modal
        .load_content(content, ContentOptions::new())
        .expect("load");
    modal.destroy().expect("destroy");

    assert_eq!(modal.backend().document.listener_count(), 0);
    assert!(matches!(modal.show(), Err(ModalError::Destroyed)));
    assert!(matches!(modal.hide(), Err(ModalError::Destroyed)));
    assert!(matches!(
        modal.load_content(content, ContentOptions::new()),
        Err(ModalError::Destroyed)
    ));
    assert!(matches!(
        modal.load_content_auto_size(content, ContentOptions::new()),
        Err(ModalError::Destroyed)
    ));
    assert!(matches!(modal.in_panel(content), Err(ModalError::Destroyed)));
    assert!(matches!(
        modal.handle_event(&HostEvent::Resize),
        Err(ModalError::Destroyed)
    ));
    assert!(matches!(modal.poll(), Err(ModalError::Destroyed)));
    assert!(matches!(modal.destroy(), Err(ModalError::Destroyed)));
}
