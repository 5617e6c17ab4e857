pub mod camera;
pub mod cloud;
pub mod depth_key;
pub mod error;
pub mod gpu;
pub mod png_writer;
pub mod render;
pub mod settings;

pub use camera::Camera;
pub use cloud::{Gaussian, GaussianCloud, Point, PointCloud};
pub use error::{BufferError, LoadError, RenderError, SortError};
pub use render::{PointRenderer, SplatRenderer};
pub use settings::{KeyStrategy, RenderSettings};
