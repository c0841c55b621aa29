#![doc = "htmlpatch-core: core rewrite pipeline for htmlpatch."]

//! This crate holds the document model, the rule abstraction and its concrete
//! kinds, the executor that folds rules over a document, the image inventory,
//! and the named presets the CLI exposes.
//! The CLI crate only parses arguments, loads configuration and prints reports.
//!
//! # Usage
//! Build a [`executor::Pipeline`] (by hand or from a [`presets::Preset`]) and
//! hand it to [`patch::patch_file`] together with a [`contract::DocumentStore`].

pub mod config;
pub mod contract;
pub mod document;
pub mod executor;
pub mod inventory;
pub mod patch;
pub mod presets;
pub mod rules;
