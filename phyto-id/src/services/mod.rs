//! Service modules for species identification

pub mod species_resolver;

pub use species_resolver::{ResolveError, ResolvedIdentity, SpeciesResolver};
