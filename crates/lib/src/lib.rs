//! stitch-lib: module graph resolution and artifact assembly
//!
//! This crate provides the building blocks used by the `stitch` CLI:
//! - `ModuleSet`: the immutable set of modules and their scoped dependency edges
//! - `Resolver`: computes compile, runtime, exported and test classpaths per module
//! - `Assembler`: merges aggregated module outputs into one deterministic jar
//! - `PublicationDescriptor`: the POM and JSON describing the artifact to a repository

pub mod assemble;
pub mod cancel;
pub mod config;
pub mod consts;
pub mod coord;
pub mod module;
pub mod publish;
pub mod repository;
pub mod resolve;
pub mod util;
