//! UniGet - Unity package materialization
//!
//! This library turns downloaded Unity package archives into files inside a
//! Unity project. It reconstructs logical paths from identifier-keyed
//! `.unitypackage` archives or walks flat source archives, applies the
//! package manifest's `extra`/`merged` classification, copies only newer
//! content and keeps a `.meta` sidecar next to every materialized directory.
//!
//! # Example
//!
//! ```no_run
//! use uniget::manager::{MaterializeRequest, MaterializerConfig, PackageMaterializer};
//! use uniget::package::InclusionPolicy;
//!
//! let request = MaterializeRequest::new("Foo.1.0.0.unitypackage", "Foo", "/projects/game")?
//!     .with_inclusion(InclusionPolicy::new(false, true));
//! let report = PackageMaterializer::new(MaterializerConfig::default()).materialize(&request)?;
//! println!("copied {} files", report.files_copied);
//! # Ok::<(), uniget::manager::ManagerError>(())
//! ```

pub mod config;
pub mod logging;
pub mod manager;
pub mod package;
pub mod source;
