//! pomalign-lib: Maven POM governance engine
//!
//! Rewrites a batch of POMs so that versions, parents, plugins and
//! dependencies follow a set of governance descriptors:
//! - `pom`: the POM document model, its reader and writer
//! - `project`: a loaded POM with resolved coordinates and the batch ancestry graph
//! - `session`: run options, the managed-version registry and the change registry
//! - `modders`: the catalog of transformations and their precedence
//! - `manager`: discovery, ordering, writing and the end-to-end run
//! - `capture`, `report`: the descriptor and reports a run leaves behind

pub mod capture;
pub mod config;
pub mod coord;
pub mod manager;
pub mod modders;
pub mod pom;
pub mod project;
pub mod report;
pub mod session;
