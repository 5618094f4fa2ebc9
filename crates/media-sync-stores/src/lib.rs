pub mod error;
pub mod jellyfin;
pub mod kodi;
pub mod traits;

pub use error::StoreError;
pub use jellyfin::JellyfinLibrary;
pub use kodi::KodiLibrary;
pub use traits::{SourceStore, TargetStore};
