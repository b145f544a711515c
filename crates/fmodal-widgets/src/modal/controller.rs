#![forbid(unsafe_code)]

//! Modal lifecycle controller.
//!
//! [`ModalController`] owns the overlay and panel nodes, the display state,
//! the event bridge, and the content measurer. All host interaction goes
//! through a [`ModalBackend`], so the same controller drives a real browser
//! shim or the in-memory `fmodal-web` host.
//!
//! ```text
//! Detached ──attach──▶ Hidden ◀──hide── Showing
//!                        │                 ▲
//!                        └──show / load────┘
//! any ──destroy──▶ Destroyed
//! ```

use fmodal_backend::{DocumentHost, ModalBackend, StyleValue, ViewportHost};
use fmodal_core::event::HostEvent;
use fmodal_core::node::NodeId;
use fmodal_layout::{PanelGeometry, overflow_policy, overlay_rect, panel_geometry, panel_position};

use super::bridge::{BridgeAction, EventBridge, Recompute};
use super::config::{Configurable, ContentOptions, LoadMode, ModalConfig};
use super::measure::{ContentMeasurer, MeasurePurpose, SizePolicy};
use super::notify::{Emitter, Notification, Notifier, SubscriptionId};

/// Errors returned by [`ModalController`] operations.
#[derive(Debug)]
pub enum ModalError {
    /// The modal nodes have not been built yet.
    NotAttached,
    /// `attach()` was called twice.
    AlreadyAttached,
    /// The instance was destroyed.
    Destroyed,
    /// The host document rejected an operation.
    Host(Box<dyn std::error::Error + Send + Sync>),
}

impl ModalError {
    fn host<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Host(Box::new(err))
    }
}

impl std::fmt::Display for ModalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAttached => write!(f, "modal is not attached"),
            Self::AlreadyAttached => write!(f, "modal is already attached"),
            Self::Destroyed => write!(f, "modal was destroyed"),
            Self::Host(e) => write!(f, "host error: {e}"),
        }
    }
}

impl std::error::Error for ModalError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Host(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Visibility of an attached modal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShowState {
    #[default]
    Hidden,
    Showing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ModalNodes {
    overlay: NodeId,
    panel: NodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Detached,
    Attached(ModalNodes),
    Destroyed,
}

/// Options and geometry of the current display cycle.
#[derive(Debug, Clone, PartialEq)]
struct Display {
    options: ContentOptions,
    geometry: PanelGeometry,
}

/// A modal dialog bound to one host document.
#[derive(Debug)]
pub struct ModalController<B: ModalBackend> {
    config: ModalConfig,
    backend: B,
    phase: Phase,
    display: Option<Display>,
    bridge: EventBridge,
    measurer: ContentMeasurer,
    notifier: Notifier,
}

impl<B: ModalBackend> ModalController<B> {
    /// Create a detached controller. Call [`attach`](Self::attach) next.
    pub fn new(config: ModalConfig, backend: B) -> Self {
        Self {
            config,
            backend,
            phase: Phase::Detached,
            display: None,
            bridge: EventBridge::new(),
            measurer: ContentMeasurer::new(),
            notifier: Notifier::new(),
        }
    }

    fn nodes(&self) -> Result<ModalNodes, ModalError> {
        match self.phase {
            Phase::Attached(nodes) => Ok(nodes),
            Phase::Detached => Err(ModalError::NotAttached),
            Phase::Destroyed => Err(ModalError::Destroyed),
        }
    }

    /// Build the hidden overlay and panel and append them to the document root.
    pub fn attach(&mut self) -> Result<(), ModalError> {
        match self.phase {
            Phase::Detached => {}
            Phase::Attached(_) => return Err(ModalError::AlreadyAttached),
            Phase::Destroyed => return Err(ModalError::Destroyed),
        }
        let nodes =
            build_nodes(self.backend.document_mut(), &self.config).map_err(ModalError::host)?;
        self.phase = Phase::Attached(nodes);
        tracing::debug!(
            message = "modal.attach",
            overlay = nodes.overlay.get(),
            panel = nodes.panel.get()
        );
        Ok(())
    }

    /// Put `content` in the panel and show it.
    ///
    /// A pending auto-size load is abandoned: the last load wins.
    pub fn load_content(
        &mut self,
        content: NodeId,
        options: ContentOptions,
    ) -> Result<(), ModalError> {
        let nodes = self.nodes()?;
        self.measurer
            .cancel(self.backend.document_mut())
            .map_err(ModalError::host)?;
        self.install(nodes, content, options)
    }

    /// Measure `content` once its images settle, then load it at that size.
    ///
    /// With no images the load happens before this returns; otherwise the
    /// host settles the images and calls [`poll`](Self::poll).
    pub fn load_content_auto_size(
        &mut self,
        content: NodeId,
        options: ContentOptions,
    ) -> Result<(), ModalError> {
        self.nodes()?;
        let options = options.autosize(true);
        let (doc, images) = self.backend.document_and_images();
        self.measurer
            .begin(doc, images, content, false, MeasurePurpose::Load { options })
            .map_err(ModalError::host)?;
        self.poll().map(drop)
    }

    /// Show with default options. No-op while showing.
    pub fn show(&mut self) -> Result<(), ModalError> {
        let nodes = self.nodes()?;
        if self.display.is_some() {
            return Ok(());
        }
        self.reveal(nodes, ContentOptions::default())
    }

    /// Hide, unbind listeners, and empty the panel. No-op while hidden.
    ///
    /// The modal is hidden afterwards even when the host reports an error;
    /// the first error is returned.
    pub fn hide(&mut self) -> Result<(), ModalError> {
        let nodes = self.nodes()?;
        if self.display.is_none() {
            return Ok(());
        }
        let doc = self.backend.document_mut();
        let cancelled = if matches!(
            self.measurer.pending_purpose(),
            Some(MeasurePurpose::Relayout { .. })
        ) {
            self.measurer.cancel(doc).map(drop)
        } else {
            Ok(())
        };
        let unbound = self.bridge.unbind(doc).map(drop);
        let concealed = conceal(doc, nodes);
        self.display = None;
        tracing::debug!(message = "modal.hide");
        self.notifier.emit(Notification::Hidden);
        cancelled
            .and(unbound)
            .and(concealed)
            .map_err(ModalError::host)
    }

    /// Hide if showing and release both nodes. The instance is unusable after.
    pub fn destroy(&mut self) -> Result<(), ModalError> {
        let nodes = match self.phase {
            Phase::Destroyed => return Err(ModalError::Destroyed),
            Phase::Detached => {
                self.phase = Phase::Destroyed;
                return Ok(());
            }
            Phase::Attached(nodes) => nodes,
        };
        self.hide()?;
        self.phase = Phase::Destroyed;
        let doc = self.backend.document_mut();
        self.measurer.cancel(doc).map_err(ModalError::host)?;
        doc.destroy(nodes.overlay).map_err(ModalError::host)?;
        doc.destroy(nodes.panel).map_err(ModalError::host)?;
        tracing::debug!(message = "modal.destroy");
        Ok(())
    }

    /// Refresh layout after a host change. No-op while hidden.
    pub fn recompute(&mut self, trigger: Recompute) -> Result<(), ModalError> {
        let nodes = self.nodes()?;
        let Some(display) = &self.display else {
            return Ok(());
        };
        // A pending auto-size load lays itself out when it lands; a re-measure
        // must not take its slot.
        let remeasure = display.options.autosize
            && !matches!(
                self.measurer.pending_purpose(),
                Some(MeasurePurpose::Load { .. })
            );
        let geometry = display.geometry;
        match trigger {
            Recompute::Resize if remeasure => self.remeasure(nodes, SizePolicy::MayShrink),
            Recompute::Resize => self.relayout(nodes).map_err(ModalError::host),
            Recompute::ContentChanged if remeasure => self.remeasure(nodes, SizePolicy::GrowOnly),
            Recompute::ContentChanged => Ok(()),
            Recompute::Scroll { target } => {
                if let Some(target) = target
                    && self.backend.document().contains(nodes.panel, target)
                {
                    tracing::debug!(message = "modal.scroll.ignored", target = target.get());
                    return Ok(());
                }
                self.apply_layout(nodes, geometry, false)
                    .map_err(ModalError::host)
            }
        }
    }

    /// Route a host event through the bridge.
    pub fn handle_event(&mut self, event: &HostEvent) -> Result<(), ModalError> {
        let nodes = self.nodes()?;
        match self.bridge.route(event, nodes.overlay) {
            None => Ok(()),
            Some(BridgeAction::Hide) => self.hide(),
            Some(BridgeAction::Recompute(trigger)) => self.recompute(trigger),
        }
    }

    /// Finish a pending measurement whose images have settled.
    ///
    /// Returns `true` when a measurement was applied.
    pub fn poll(&mut self) -> Result<bool, ModalError> {
        let nodes = self.nodes()?;
        let measured = self
            .measurer
            .poll(
                self.backend.document_mut(),
                self.config.measure_layers.extents(),
                self.config.panel_css_class.as_deref(),
            )
            .map_err(ModalError::host)?;
        let Some(measured) = measured else {
            return Ok(false);
        };

        match measured.purpose {
            MeasurePurpose::Load { mut options } => {
                options.panel_width = Some(measured.size.width);
                options.panel_height = Some(measured.size.height);
                self.install(nodes, measured.node, options)?;
            }
            MeasurePurpose::Relayout { policy } => {
                let Some(display) = self.display.as_mut() else {
                    return Ok(false);
                };
                let current = display.options.requested_size(&self.config);
                let next = policy.apply(current, measured.size);
                display.options.panel_width = Some(next.width);
                display.options.panel_height = Some(next.height);
                self.relayout(nodes).map_err(ModalError::host)?;
            }
        }
        Ok(true)
    }

    /// Inclusive: the panel itself counts as inside.
    pub fn in_panel(&self, node: NodeId) -> Result<bool, ModalError> {
        let nodes = self.nodes()?;
        Ok(self.backend.document().contains(nodes.panel, node))
    }

    /// Shorthand for routing [`HostEvent::ContentChanged`].
    pub fn notify_content_changed(&mut self) -> Result<(), ModalError> {
        self.handle_event(&HostEvent::ContentChanged)
    }

    #[must_use]
    pub fn state(&self) -> ShowState {
        if self.display.is_some() {
            ShowState::Showing
        } else {
            ShowState::Hidden
        }
    }

    #[must_use]
    pub fn is_showing(&self) -> bool {
        self.display.is_some()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.phase == Phase::Destroyed
    }

    /// Geometry of the current display cycle.
    #[must_use]
    pub fn geometry(&self) -> Option<PanelGeometry> {
        self.display.as_ref().map(|d| d.geometry)
    }

    /// Options of the current display cycle.
    #[must_use]
    pub fn content_options(&self) -> Option<&ContentOptions> {
        self.display.as_ref().map(|d| &d.options)
    }

    #[must_use]
    pub fn overlay(&self) -> Option<NodeId> {
        self.nodes().ok().map(|n| n.overlay)
    }

    #[must_use]
    pub fn panel(&self) -> Option<NodeId> {
        self.nodes().ok().map(|n| n.panel)
    }

    /// True while an auto-size load or re-measure waits on images.
    #[must_use]
    pub fn is_measuring(&self) -> bool {
        self.measurer.is_pending()
    }

    #[must_use]
    pub fn config(&self) -> &ModalConfig {
        &self.config
    }

    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable host access for pushing viewport changes and image outcomes.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn install(
        &mut self,
        nodes: ModalNodes,
        content: NodeId,
        options: ContentOptions,
    ) -> Result<(), ModalError> {
        if self.display.is_some() {
            let mode = self.config.load_mode;
            match mode {
                LoadMode::Reshow => self.hide()?,
                LoadMode::InPlace => {
                    replace_content(self.backend.document_mut(), nodes.panel, content)
                        .map_err(ModalError::host)?;
                    if let Some(display) = self.display.as_mut() {
                        display.options = options;
                    }
                    return self.relayout(nodes).map_err(ModalError::host);
                }
            }
        }
        replace_content(self.backend.document_mut(), nodes.panel, content)
            .map_err(ModalError::host)?;
        self.reveal(nodes, options)
    }

    fn reveal(&mut self, nodes: ModalNodes, options: ContentOptions) -> Result<(), ModalError> {
        let geometry = self.compute_geometry(&options);
        self.apply_layout(nodes, geometry, true)
            .map_err(ModalError::host)?;
        self.bridge
            .bind(self.backend.document_mut(), nodes.overlay)
            .map_err(ModalError::host)?;
        self.display = Some(Display { options, geometry });
        tracing::debug!(
            message = "modal.show",
            width = geometry.width,
            height = geometry.height,
            x_margin = geometry.x_margin,
            y_margin = geometry.y_margin,
            clamped = geometry.is_clamped()
        );
        self.notifier.emit(Notification::Shown);
        Ok(())
    }

    fn remeasure(&mut self, nodes: ModalNodes, policy: SizePolicy) -> Result<(), ModalError> {
        let Some(content) = self.backend.document().children(nodes.panel).first().copied() else {
            return self.relayout(nodes).map_err(ModalError::host);
        };
        let (doc, images) = self.backend.document_and_images();
        let clone = doc.clone_node(content, true).map_err(ModalError::host)?;
        self.measurer
            .begin(doc, images, clone, true, MeasurePurpose::Relayout { policy })
            .map_err(ModalError::host)?;
        self.poll().map(drop)
    }

    fn compute_geometry(&self, options: &ContentOptions) -> PanelGeometry {
        panel_geometry(
            self.backend.viewport().viewport_size(),
            options.resolve(&self.config),
        )
    }

    /// Recompute geometry from the current options and viewport, then apply it.
    fn relayout(&mut self, nodes: ModalNodes) -> Result<(), B::Error> {
        let Some(options) = self.display.as_ref().map(|d| &d.options) else {
            return Ok(());
        };
        let geometry = self.compute_geometry(options);
        if let Some(display) = self.display.as_mut() {
            display.geometry = geometry;
        }
        tracing::debug!(
            message = "modal.relayout",
            width = geometry.width,
            height = geometry.height,
            clamped = geometry.is_clamped()
        );
        self.apply_layout(nodes, geometry, false)
    }

    fn apply_layout(
        &mut self,
        nodes: ModalNodes,
        geometry: PanelGeometry,
        reveal: bool,
    ) -> Result<(), B::Error> {
        let viewport = self.backend.viewport();
        let scroll = viewport.scroll_offset();
        let scroll_size = viewport.scroll_size();
        let overlay = overlay_rect(scroll_size);
        let position = panel_position(&geometry, scroll, scroll_size);
        let overflow = overflow_policy(&geometry);

        let doc = self.backend.document_mut();
        doc.set_styles(
            nodes.overlay,
            [
                ("width", StyleValue::Px(overlay.width)),
                ("height", StyleValue::Px(overlay.height)),
            ],
        )?;
        doc.set_styles(
            nodes.panel,
            [
                ("width", StyleValue::Px(geometry.width)),
                ("height", StyleValue::Px(geometry.height)),
                ("overflow", StyleValue::from(overflow.as_str())),
            ],
        )?;
        if let Some(left) = position.left {
            doc.set_style(nodes.panel, "left", StyleValue::Px(left))?;
        }
        if let Some(top) = position.top {
            doc.set_style(nodes.panel, "top", StyleValue::Px(top))?;
        }
        if reveal {
            doc.set_style(nodes.overlay, "display", StyleValue::from("block"))?;
            doc.set_style(nodes.panel, "display", StyleValue::from("block"))?;
        }
        Ok(())
    }
}

impl<B: ModalBackend> Configurable for ModalController<B> {
    type Options = ModalConfig;

    fn options(&self) -> &ModalConfig {
        &self.config
    }
}

impl<B: ModalBackend> Emitter for ModalController<B> {
    fn subscribe<F>(&mut self, notification: Notification, handler: F) -> SubscriptionId
    where
        F: FnMut(Notification) + 'static,
    {
        self.notifier.subscribe(notification, handler)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }
}

fn build_nodes<D: DocumentHost>(doc: &mut D, config: &ModalConfig) -> Result<ModalNodes, D::Error> {
    let overlay = doc.create_element("div")?;
    doc.set_styles(
        overlay,
        [
            ("display", StyleValue::from("none")),
            ("top", StyleValue::Px(0.0)),
            ("left", StyleValue::Px(0.0)),
            ("z-index", StyleValue::Number(f64::from(config.overlay_z_index))),
            ("margin", StyleValue::Px(0.0)),
            ("padding", StyleValue::Px(0.0)),
            ("position", StyleValue::from("absolute")),
            ("opacity", StyleValue::Number(config.overlay_opacity)),
            (
                "background-color",
                StyleValue::keyword(config.overlay_background_color.as_str()),
            ),
        ],
    )?;
    if let Some(class) = &config.overlay_css_class {
        doc.add_class(overlay, class)?;
    }

    let panel = doc.create_element("div")?;
    doc.set_styles(
        panel,
        [
            ("display", StyleValue::from("none")),
            ("z-index", StyleValue::Number(f64::from(config.panel_z_index))),
            ("margin", StyleValue::Px(0.0)),
            ("padding", StyleValue::Px(0.0)),
            ("position", StyleValue::from("absolute")),
            (
                "background-color",
                StyleValue::keyword(config.panel_background_color.as_str()),
            ),
        ],
    )?;
    if let Some(class) = &config.panel_css_class {
        doc.add_class(panel, class)?;
    }

    let root = doc.root();
    doc.append_child(root, overlay)?;
    doc.append_child(root, panel)?;
    Ok(ModalNodes { overlay, panel })
}

fn replace_content<D: DocumentHost>(doc: &mut D, panel: NodeId, content: NodeId) -> Result<(), D::Error> {
    doc.clear_children(panel)?;
    doc.append_child(panel, content)
}

fn conceal<D: DocumentHost>(doc: &mut D, nodes: ModalNodes) -> Result<(), D::Error> {
    doc.set_style(nodes.panel, "display", StyleValue::from("none"))?;
    doc.set_style(nodes.overlay, "display", StyleValue::from("none"))?;
    doc.clear_children(nodes.panel)
}
