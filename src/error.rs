use std::path::PathBuf;

use thiserror::Error;

/// Failures while building a renderer. A renderer that failed to load is never
/// handed out, so there is nothing to retry against.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read shader `{path}`")]
    ShaderIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("shader `{label}` failed to compile:\n{messages}")]
    ShaderCompile { label: String, messages: String },
    #[error("program `{label}` declares `{name}` with a type the host cannot write")]
    UnsupportedDeclaration { label: String, name: String },
    #[error("cloud has {count} primitives, more than a u32 index can address")]
    TooManyPrimitives { count: usize },
    #[error("program `{label}` has no attribute `{name}`")]
    MissingAttribute { label: String, name: String },
    #[error("`{label}` reads `{name}` with a {expected}-byte stride, buffer elements are {actual}")]
    AttributeStride {
        label: String,
        name: String,
        expected: u64,
        actual: u64,
    },
    #[error("sorter capacity {capacity} needs a storage binding over {max_binding} bytes")]
    SorterTooLarge { capacity: u32, max_binding: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SortError {
    #[error("sort of {count} elements exceeds sorter capacity {capacity}")]
    CapacityExceeded { count: u32, capacity: u32 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    #[error("`{label}` holds {expected} elements, update provided {actual}")]
    LengthMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
    #[error("`{label}` was created static and cannot be updated")]
    Immutable { label: String },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Sort(#[from] SortError),
    #[error(transparent)]
    Buffer(#[from] BufferError),
}
