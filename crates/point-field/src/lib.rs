//! Editable 2D point cloud exposed to a fixed catalog of field-fitting passes.
//!
//! [`DataManager`] owns the points, a [`KdTree`] rebuilt on demand and one
//! instance of every pass in the [`PassKind`] catalog.

mod config;
mod error;
pub mod io;
pub mod kdtree;
mod manager;
pub mod normals;
pub mod passes;
mod point;
mod store;

pub use config::{DataManagerConfig, PassDefaults};
pub use error::{CloudIoError, ConfigError, RangeError};
pub use kdtree::{KdTree, Neighbor};
pub use manager::DataManager;
pub use passes::{ConcretePass, DrawingPass, FittingPass, PASS_COUNT, PassKind, PassVisitor};
pub use point::{DEFAULT_POINT_ANGLE, DataPoint};
pub use store::{PointStore, Range};
