#![forbid(unsafe_code)]

//! Content measurement.
//!
//! Measuring content waits for every image in it to settle, then lays the
//! node out in a hidden offscreen container styled like the panel and reads
//! its size. The wait is host-driven: [`ContentMeasurer::begin`] stores one
//! pending measurement and [`ContentMeasurer::poll`] completes it once the
//! image batch has resolved.
//!
//! Only one measurement is ever pending. Starting another supersedes the
//! previous one, so the last request always wins and a late image batch can
//! never apply stale geometry.

use fmodal_backend::{BoxExtents, DocumentHost, ImageLoader, PreloadReport, StyleValue};
use fmodal_core::completion::Completion;
use fmodal_core::geometry::Size;
use fmodal_core::node::NodeId;
use web_time::Instant;

use super::config::ContentOptions;

const OFFSCREEN_PX: f64 = -10_000.0;

/// How a fresh measurement combines with the current panel size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizePolicy {
    /// Take the measured size as is.
    MayShrink,
    /// Never shrink below the current size on either axis.
    GrowOnly,
}

impl SizePolicy {
    #[must_use]
    pub fn apply(self, current: Size, measured: Size) -> Size {
        match self {
            Self::MayShrink => measured,
            Self::GrowOnly => current.max(measured),
        }
    }
}

/// Why a measurement was started.
#[derive(Debug, Clone, PartialEq)]
pub enum MeasurePurpose {
    /// Load the measured node with these options once sized.
    Load { options: ContentOptions },
    /// Re-size the content already showing.
    Relayout { policy: SizePolicy },
}

/// Identifies one measurement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeasureTicket(u64);

impl MeasureTicket {
    #[must_use]
    pub const fn generation(self) -> u64 {
        self.0
    }
}

/// A finished measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Measured {
    pub ticket: MeasureTicket,
    pub node: NodeId,
    pub purpose: MeasurePurpose,
    pub size: Size,
    pub images: PreloadReport,
}

#[derive(Debug)]
struct Pending {
    ticket: MeasureTicket,
    node: NodeId,
    /// The node is a throwaway clone to destroy once measured.
    dispose: bool,
    images: Completion<PreloadReport>,
    image_count: usize,
    purpose: MeasurePurpose,
    started: Instant,
}

/// Single-slot measurement scheduler.
#[derive(Debug, Default)]
pub struct ContentMeasurer {
    generation: u64,
    pending: Option<Pending>,
}

impl ContentMeasurer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the most recent request.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Ticket of the measurement currently waiting, if any.
    #[must_use]
    pub fn pending_ticket(&self) -> Option<MeasureTicket> {
        self.pending.as_ref().map(|p| p.ticket)
    }

    /// Why the pending measurement was started.
    #[must_use]
    pub fn pending_purpose(&self) -> Option<&MeasurePurpose> {
        self.pending.as_ref().map(|p| &p.purpose)
    }

    /// Start measuring `node`, superseding any pending measurement.
    ///
    /// When `dispose` is set the node is destroyed after measuring (or when
    /// superseded).
    pub fn begin<D, I>(
        &mut self,
        doc: &mut D,
        images: &mut I,
        node: NodeId,
        dispose: bool,
        purpose: MeasurePurpose,
    ) -> Result<MeasureTicket, D::Error>
    where
        D: DocumentHost,
        I: ImageLoader,
    {
        if let Some(stale) = self.pending.take() {
            tracing::debug!(
                message = "modal.measure.superseded",
                generation = stale.ticket.generation()
            );
            if stale.dispose {
                doc.destroy(stale.node)?;
            }
        }

        self.generation += 1;
        let ticket = MeasureTicket(self.generation);
        let sources = doc.image_sources(node);
        let completion = images.preload(&sources);
        self.pending = Some(Pending {
            ticket,
            node,
            dispose,
            images: completion,
            image_count: sources.len(),
            purpose,
            started: Instant::now(),
        });
        Ok(ticket)
    }

    /// Drop the pending measurement without applying it.
    pub fn cancel<D: DocumentHost>(&mut self, doc: &mut D) -> Result<bool, D::Error> {
        let Some(stale) = self.pending.take() else {
            return Ok(false);
        };
        tracing::debug!(
            message = "modal.measure.superseded",
            generation = stale.ticket.generation()
        );
        if stale.dispose {
            doc.destroy(stale.node)?;
        }
        Ok(true)
    }

    /// Finish the pending measurement if its images have settled.
    ///
    /// A batch whose resolver was dropped counts as settled with an empty
    /// report.
    pub fn poll<D: DocumentHost>(
        &mut self,
        doc: &mut D,
        extents: BoxExtents,
        panel_class: Option<&str>,
    ) -> Result<Option<Measured>, D::Error> {
        let ready = self
            .pending
            .as_ref()
            .is_some_and(|p| p.images.is_settled() || p.images.is_abandoned());
        if !ready {
            return Ok(None);
        }
        let Some(mut pending) = self.pending.take() else {
            return Ok(None);
        };

        let span = tracing::debug_span!(
            "modal.measure",
            generation = pending.ticket.generation(),
            images = pending.image_count,
            measure_duration_us = tracing::field::Empty
        );
        let _guard = span.enter();

        let report = pending.images.take().unwrap_or_default();
        let measured = measure_offscreen(doc, pending.node, extents, panel_class);
        let disposed = if pending.dispose {
            doc.destroy(pending.node)
        } else {
            Ok(())
        };
        let size = measured?;
        disposed?;

        let elapsed_us = pending.started.elapsed().as_micros() as u64;
        span.record("measure_duration_us", elapsed_us);

        Ok(Some(Measured {
            ticket: pending.ticket,
            node: pending.node,
            purpose: pending.purpose,
            size,
            images: report,
        }))
    }
}

/// Measure `node` inside a hidden offscreen container styled like the panel.
///
/// The node goes back to where it was (parent and sibling position), or is
/// left detached if it had no parent.
pub fn measure_offscreen<D: DocumentHost>(
    doc: &mut D,
    node: NodeId,
    extents: BoxExtents,
    panel_class: Option<&str>,
) -> Result<Size, D::Error> {
    let home = doc.parent(node);
    let before = doc.next_sibling(node);

    let container = doc.create_element("div")?;
    doc.set_styles(
        container,
        [
            ("position", StyleValue::from("absolute")),
            ("left", StyleValue::Px(OFFSCREEN_PX)),
            ("top", StyleValue::Px(OFFSCREEN_PX)),
            ("visibility", StyleValue::from("hidden")),
            ("display", StyleValue::from("inline-block")),
        ],
    )?;
    if let Some(class) = panel_class {
        doc.add_class(container, class)?;
    }
    let root = doc.root();
    doc.append_child(root, container)?;
    doc.append_child(container, node)?;

    let size = doc.measure(container, extents);

    let restored = match home {
        Some(parent) => doc.insert_before(parent, node, before),
        None => doc.detach(node),
    };
    let released = doc.destroy(container);
    let size = size?;
    restored?;
    released?;
    Ok(size)
}
