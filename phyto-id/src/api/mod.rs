//! HTTP API handlers for phyto-id

pub mod health;
pub mod identify;
pub mod species;
pub mod tags;

pub use health::health_routes;
pub use identify::identify_routes;
pub use species::species_routes;
pub use tags::tag_routes;
