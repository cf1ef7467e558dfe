//! IO modules - external system interfaces
//!
//! - `catalog` - garment measurement catalog (TOML)
//! - `profile_store` - saved shopper profiles (JSON documents)
//! - `surface` - focus stream and hover events to/from the rendering surface

pub mod catalog;
pub mod profile_store;
pub mod surface;

// Re-export commonly used types
pub use catalog::{CatalogError, GarmentCatalog, TomlCatalog};
pub use profile_store::{InMemoryProfiles, JsonProfileStore, ProfileError, ProfileProvider};
pub use surface::{FocusEvent, FocusSender, SessionHandle, SurfaceEvent};
