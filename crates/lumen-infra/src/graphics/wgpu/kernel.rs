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

//! WGSL shader lookup and compute kernel creation.

use std::fs;
use std::path::PathBuf;

use lumen_core::math::divide_and_round_up;
use lumen_core::ShaderError;

use super::context::WgpuComputeContext;

/// Directories searched after any caller-provided paths, in order.
pub const DEFAULT_SEARCH_PATHS: [&str; 3] = [".", "./shaders", "./assets/shaders"];

const SHADER_EXTENSION: &str = "wgsl";

/// Resolves shader module names to WGSL files on disk.
///
/// A module `name` resolves to the first `<dir>/<name>.wgsl` that exists,
/// trying the extra search paths before [`DEFAULT_SEARCH_PATHS`].
#[derive(Debug, Clone, Default)]
pub struct ShaderLibrary {
    extra_search_paths: Vec<PathBuf>,
}

impl ShaderLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a directory searched before the defaults and any path added later.
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.add_search_path(path);
        self
    }

    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.extra_search_paths.push(path.into());
    }

    /// Every directory that is searched, in lookup order.
    pub fn search_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.extra_search_paths
            .iter()
            .cloned()
            .chain(DEFAULT_SEARCH_PATHS.iter().map(PathBuf::from))
    }

    /// Finds the file backing `module_name`.
    pub fn resolve(&self, module_name: &str) -> Result<PathBuf, ShaderError> {
        let file_name = format!("{module_name}.{SHADER_EXTENSION}");
        for dir in self.search_paths() {
            let candidate = dir.join(&file_name);
            if candidate.is_file() {
                log::debug!(
                    "Resolved shader module '{module_name}' to {}",
                    candidate.display()
                );
                return Ok(candidate);
            }
        }
        Err(ShaderError::NotFound {
            module: module_name.to_string(),
            searched: self
                .search_paths()
                .map(|path| path.display().to_string())
                .collect(),
        })
    }

    /// Resolves and reads the WGSL source of `module_name`.
    pub fn load_source(&self, module_name: &str) -> Result<(PathBuf, String), ShaderError> {
        let path = self.resolve(module_name)?;
        let source = fs::read_to_string(&path).map_err(|e| ShaderError::LoadError {
            path: path.display().to_string(),
            source_error: e.to_string(),
        })?;
        Ok((path, source))
    }

    /// Loads and compiles `module_name` on the context's device.
    pub fn load_module(
        &self,
        context: &WgpuComputeContext,
        module_name: &str,
    ) -> Result<wgpu::ShaderModule, ShaderError> {
        let (path, source) = self.load_source(module_name)?;
        log::info!("Compiling shader module '{module_name}' from {}", path.display());
        compile_module(&context.device, module_name, &source)
    }
}

/// Compiles WGSL `source`, turning compiler diagnostics into a [`ShaderError`].
pub fn compile_module(
    device: &wgpu::Device,
    label: &str,
    source: &str,
) -> Result<wgpu::ShaderModule, ShaderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    let info = pollster::block_on(module.get_compilation_info());
    let scope_error = pollster::block_on(device.pop_error_scope());

    let errors: Vec<String> = info
        .messages
        .iter()
        .filter(|message| matches!(message.message_type, wgpu::CompilationMessageType::Error))
        .map(|message| match &message.location {
            Some(location) => format!(
                "{}:{}: {}",
                location.line_number, location.line_position, message.message
            ),
            None => message.message.clone(),
        })
        .collect();
    if !errors.is_empty() {
        return Err(ShaderError::CompilationError {
            label: label.to_string(),
            details: errors.join("; "),
        });
    }
    if let Some(err) = scope_error {
        return Err(ShaderError::CompilationError {
            label: label.to_string(),
            details: err.to_string(),
        });
    }
    Ok(module)
}

/// A compute pipeline built from one shader entry point.
///
/// The bind group layout is inferred from the shader.
#[derive(Debug)]
pub struct Kernel {
    pipeline: wgpu::ComputePipeline,
    entry_point: String,
    workgroup_size: u32,
}

impl Kernel {
    /// Links `entry_point` of `module` into a compute pipeline.
    ///
    /// `workgroup_size` must match the `@workgroup_size` declared by the entry
    /// point; it is only used to size dispatches.
    pub fn load(
        context: &WgpuComputeContext,
        module_name: &str,
        module: &wgpu::ShaderModule,
        entry_point: &str,
        workgroup_size: u32,
    ) -> Result<Self, ShaderError> {
        let device = &context.device;
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(entry_point),
            layout: None,
            module,
            entry_point: Some(entry_point),
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });
        if let Some(err) = pollster::block_on(device.pop_error_scope()) {
            return Err(ShaderError::InvalidEntryPoint {
                module: module_name.to_string(),
                entry_point: entry_point.to_string(),
                details: err.to_string(),
            });
        }
        log::debug!("Created compute kernel '{module_name}::{entry_point}'.");
        Ok(Self {
            pipeline,
            entry_point: entry_point.to_string(),
            workgroup_size,
        })
    }

    /// Resolves, compiles and links `module_name::entry_point` in one go.
    pub fn from_library(
        context: &WgpuComputeContext,
        library: &ShaderLibrary,
        module_name: &str,
        entry_point: &str,
        workgroup_size: u32,
    ) -> Result<Self, ShaderError> {
        let module = library.load_module(context, module_name)?;
        Self::load(context, module_name, &module, entry_point, workgroup_size)
    }

    pub fn pipeline(&self) -> &wgpu::ComputePipeline {
        &self.pipeline
    }

    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    pub fn workgroup_size(&self) -> u32 {
        self.workgroup_size
    }

    /// Workgroups needed to cover `elements` invocations.
    pub fn group_count(&self, elements: u32) -> u32 {
        divide_and_round_up(elements, self.workgroup_size)
    }

    /// Creates a bind group for group 0 of this kernel.
    pub fn bind_group(
        &self,
        context: &WgpuComputeContext,
        label: &str,
        entries: &[wgpu::BindGroupEntry<'_>],
    ) -> wgpu::BindGroup {
        let layout = self.pipeline.get_bind_group_layout(0);
        context.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout: &layout,
            entries,
        })
    }
}
