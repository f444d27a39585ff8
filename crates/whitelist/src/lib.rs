//! Whitelist model for the kiosk monitor.
//!
//! The effective whitelist is the union of two sets:
//! - the **system allowlist**: launchers, system UI and the kiosk's own
//!   package. Fixed at construction, never persisted, always allowed.
//! - the **user whitelist**: packages the operator picked. Owned by a
//!   [`WhitelistStore`] implementation; the monitor only reads it.
//!
//! # Example
//!
//! ```
//! use kiosk_whitelist::{InMemoryWhitelist, PackageId, SystemAllowlist, WhitelistEditor, WhitelistStore};
//!
//! let system = SystemAllowlist::new(PackageId::from("com.kiosk.kioskmode"));
//! let store = InMemoryWhitelist::new(system);
//! store.add(&PackageId::from("com.maps.app")).unwrap();
//!
//! assert!(store.is_allowed(&PackageId::from("com.maps.app")).unwrap());
//! assert!(store.is_allowed(&PackageId::from("com.kiosk.kioskmode")).unwrap());
//! assert!(!store.is_allowed(&PackageId::from("com.other.app")).unwrap());
//! ```

mod error;
mod memory;
mod package;
mod store;
mod system;

pub use error::{Result, WhitelistError};
pub use memory::InMemoryWhitelist;
pub use package::PackageId;
pub use store::{WhitelistEditor, WhitelistStore, WhitelistStoreRef};
pub use system::{SystemAllowlist, SYSTEM_PACKAGES};
