// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types for shader loading and GPU resource handling.

use std::fmt;

/// An error related to locating, loading or compiling a shader module.
#[derive(Debug)]
pub enum ShaderError {
    /// No `<name>.wgsl` file was found in any of the search paths.
    NotFound {
        /// The module name that was looked up.
        module: String,
        /// Every directory that was searched, in order.
        searched: Vec<String>,
    },
    /// The shader file exists but could not be read.
    LoadError {
        /// The path of the file that failed to load.
        path: String,
        /// The underlying I/O error.
        source_error: String,
    },
    /// The shader source failed to compile into a backend module.
    CompilationError {
        /// A descriptive label for the shader.
        label: String,
        /// Detailed messages from the shader compiler.
        details: String,
    },
    /// The entry point could not be linked into a compute pipeline.
    InvalidEntryPoint {
        /// The module label.
        module: String,
        /// The entry point name that was requested.
        entry_point: String,
        /// Messages reported by the backend.
        details: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::NotFound { module, searched } => {
                write!(
                    f,
                    "Shader module '{module}' not found (searched: {})",
                    searched.join(", ")
                )
            }
            ShaderError::LoadError { path, source_error } => {
                write!(
                    f,
                    "Failed to load shader source from '{path}': {source_error}"
                )
            }
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::InvalidEntryPoint {
                module,
                entry_point,
                details,
            } => {
                write!(
                    f,
                    "Invalid entry point '{entry_point}' for shader module '{module}': {details}"
                )
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// An error originating from the graphics backend.
    BackendError(String),
    /// An access fell outside the bounds of a buffer.
    OutOfBounds,
    /// A copy range violated the backend's copy alignment.
    Misaligned {
        /// Offending byte offset or size.
        value: u64,
        /// Required alignment in bytes.
        alignment: u64,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::Misaligned { value, alignment } => {
                write!(f, "Value {value} is not aligned to {alignment} bytes.")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_error_display() {
        let err = ShaderError::NotFound {
            module: "reduce".to_string(),
            searched: vec![".".to_string(), "./shaders".to_string()],
        };
        assert_eq!(
            format!("{err}"),
            "Shader module 'reduce' not found (searched: ., ./shaders)"
        );

        let err_comp = ShaderError::CompilationError {
            label: "add".to_string(),
            details: "expected ';'".to_string(),
        };
        assert_eq!(
            format!("{err_comp}"),
            "Shader compilation failed for 'add': expected ';'"
        );
    }

    #[test]
    fn resource_error_display() {
        assert_eq!(
            ResourceError::Misaligned {
                value: 6,
                alignment: 4
            }
            .to_string(),
            "Value 6 is not aligned to 4 bytes."
        );
        assert_eq!(
            ResourceError::BackendError("device lost".to_string()).to_string(),
            "Backend-specific resource error: device lost"
        );
    }
}
