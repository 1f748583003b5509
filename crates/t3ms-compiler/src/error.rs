use std::path::PathBuf;

/// Errors that can occur while compiling a mesh to T3MS.
#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// I/O error reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse an OBJ mesh file.
    #[error("OBJ parse error for {path}: {message}")]
    ObjParse { path: PathBuf, message: String },

    /// Material JSON was syntactically invalid.
    #[error("Material JSON error for {path}: {message}")]
    MaterialJson { path: PathBuf, message: String },

    /// A material field failed validation.
    #[error("{path} {message}")]
    MaterialValidation { path: String, message: String },

    /// Mesh geometry violates its invariants (lengths, index bounds).
    #[error("Malformed mesh: {0}")]
    MalformedMesh(String),

    /// A vertex attribute does not fit its fixed-point encoding.
    #[error("Quantization error: {0}")]
    Quantization(String),

    /// A count or offset does not fit its field in the T3MS format.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A triangle referenced a vertex that is not resident in the slot array.
    #[error("Vertex {vertex} is not resident in the slot array")]
    SlotResolution { vertex: u32 },

    /// A T3MS stream could not be decoded.
    #[error("T3MS decode error: {0}")]
    Decode(String),
}
