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

use anyhow::{anyhow, Result};
use wgpu::{Adapter, Features, Instance};

/// Settings used when bootstrapping a [`WgpuComputeContext`].
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Which adapter class to prefer.
    pub power_preference: wgpu::PowerPreference,
    /// Backends the instance is allowed to use.
    pub backends: wgpu::Backends,
    /// Debug label of the logical device.
    pub device_label: String,
    /// Whether to enable the timestamp query features the adapter offers.
    pub request_timestamps: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            power_preference: wgpu::PowerPreference::HighPerformance,
            backends: wgpu::Backends::all(),
            device_label: "Lumen Compute Device".to_string(),
            request_timestamps: true,
        }
    }
}

/// The timestamp features the context asks for when available.
pub fn timestamp_features() -> Features {
    Features::TIMESTAMP_QUERY
        | Features::TIMESTAMP_QUERY_INSIDE_ENCODERS
        | Features::TIMESTAMP_QUERY_INSIDE_PASSES
}

/// Headless wgpu state for compute workloads.
#[derive(Debug)]
pub struct WgpuComputeContext {
    pub instance: Instance,
    pub adapter: Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,

    pub adapter_name: String,
    pub adapter_backend: wgpu::Backend,
    pub active_device_features: Features,
}

impl WgpuComputeContext {
    /// Creates a context, blocking the current thread on adapter and device
    /// requests.
    pub fn new_blocking(config: &ContextConfig) -> Result<Self> {
        pollster::block_on(Self::new(config))
    }

    /// Asynchronously picks an adapter and creates the device and queue.
    ///
    /// Fails if no adapter is found or the adapter cannot run compute shaders.
    pub async fn new(config: &ContextConfig) -> Result<Self> {
        log::info!("Initializing wgpu compute context...");

        let instance = Instance::new(&wgpu::InstanceDescriptor {
            backends: config.backends,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: config.power_preference,
                force_fallback_adapter: false,
                compatible_surface: None,
            })
            .await
            .map_err(|e| anyhow!("Unable to find a suitable GPU adapter: {e}"))?;

        let adapter_info = adapter.get_info();
        log::info!(
            "Using graphics adapter: \"{}\" (Backend: {:?})",
            adapter_info.name,
            adapter_info.backend
        );

        let capabilities = adapter.get_downlevel_capabilities();
        if !capabilities
            .flags
            .contains(wgpu::DownlevelFlags::COMPUTE_SHADERS)
        {
            return Err(anyhow!(
                "Adapter \"{}\" does not support compute shaders",
                adapter_info.name
            ));
        }

        let features_to_enable = if config.request_timestamps {
            adapter.features() & timestamp_features()
        } else {
            Features::empty()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some(config.device_label.as_str()),
                required_features: features_to_enable,
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {e}"))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("wgpu uncaptured error: {e:?}");
        }));

        let active_device_features = device.features();
        log::debug!("Active device features: {active_device_features:?}");
        if config.request_timestamps && !active_device_features.contains(Features::TIMESTAMP_QUERY)
        {
            log::warn!("Adapter does not offer timestamp queries; GPU timings will be unavailable.");
        }

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            adapter_name: adapter_info.name,
            adapter_backend: adapter_info.backend,
            active_device_features,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Blocks until every submitted command buffer has finished executing.
    pub fn wait_idle(&self) -> Result<()> {
        self.device
            .poll(wgpu::PollType::Wait)
            .map_err(|e| anyhow!("Failed to wait for the device: {e:?}"))?;
        Ok(())
    }

    /// Submits `encoder` and blocks until the device is idle.
    pub fn submit_and_wait(&self, encoder: wgpu::CommandEncoder) -> Result<()> {
        self.queue.submit(Some(encoder.finish()));
        self.wait_idle()
    }
}
