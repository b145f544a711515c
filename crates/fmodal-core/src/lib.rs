#![forbid(unsafe_code)]

//! Core: geometry, node handles, host events, and completions.
//!
//! # Role in FrankenModal
//! `fmodal-core` is the vocabulary layer. It owns the pixel geometry types
//! the layout engine computes with, the canonical [`event::HostEvent`] values
//! the embedding host pushes into a modal, and the resolve-once
//! [`completion::Completion`] used for asynchronous image preloads.
//!
//! # How it fits in the system
//! `fmodal-backend` describes the host collaborators in terms of these types,
//! `fmodal-layout` maps them to panel geometry, and `fmodal-widgets` drives
//! the modal lifecycle on top of both.

pub mod completion;
pub mod event;
pub mod geometry;
pub mod node;
