//! # GPU Deformer: wgpu Compute Backend
//!
//! Owns the two compute pipelines and their small uniform buffers. Each
//! [`deform`](MeshDeformer::deform) call encodes and submits two command
//! buffers in order on the shared queue:
//!
//! 1. `displace` over every vertex, A → B
//! 2. `recompute_normals` over whole triangles, B → normals + A
//!
//! The normal kernel's group size must divide the vertex count, so one
//! pipeline is specialised per candidate size through the `GROUP_SIZE`
//! override constant and picked per call.
//!
//! Bind groups are built once per mesh and cached on it, tagged with the
//! deformer that owns the layouts and uniform buffers they reference. A mesh
//! handed to a different deformer is rebound on its first call there.
//!
//! Pipeline creation runs inside a validation error scope and surfaces
//! failures as [`DeformError::Pipeline`]. Faults after construction go to
//! wgpu's uncaptured error handler.

use std::sync::atomic::{AtomicU64, Ordering};

use super::dispatch::{NORMAL_GROUP_CANDIDATES, displacement_plan, normal_plan};
use super::params::{DeformParams, DispatchParams};
use super::{DeformRequest, MeshDeformer};
use crate::config::DeformerConfig;
use crate::error::{DeformError, DeformResult};
use crate::mesh::{DeformableMesh, PlaneGeometry};
use crate::render::GpuContext;

const DISPLACE_SHADER: &str = include_str!("shaders/displace.wgsl");
const NORMALS_SHADER: &str = include_str!("shaders/normals.wgsl");

static NEXT_DEFORMER_ID: AtomicU64 = AtomicU64::new(1);

/// Both passes' bind groups for one mesh.
pub(crate) struct DeformBindings {
    owner: u64,
    displace: wgpu::BindGroup,
    normals: wgpu::BindGroup,
}

/// Two-pass deformation on wgpu compute.
pub struct GpuDeformer {
    id: u64,
    gpu: GpuContext,
    execution_width: u32,
    max_groups_per_dimension: u32,
    displace_layout: wgpu::BindGroupLayout,
    normals_layout: wgpu::BindGroupLayout,
    displace_pipeline: wgpu::ComputePipeline,
    /// One pipeline per entry of [`NORMAL_GROUP_CANDIDATES`], same order.
    normal_pipelines: Vec<(u32, wgpu::ComputePipeline)>,
    params_buffer: wgpu::Buffer,
    displace_bounds: wgpu::Buffer,
    normals_bounds: wgpu::Buffer,
    #[cfg(feature = "diagnostics")]
    stats: crate::diag::DeformStats,
}

impl GpuDeformer {
    /// Compile both kernels and allocate the uniform buffers.
    ///
    /// The configured execution width is clamped to what the device allows
    /// for a single workgroup.
    pub fn new(gpu: &GpuContext, config: DeformerConfig) -> DeformResult<Self> {
        config.validate()?;
        let limits = gpu.limits();
        let device_width = limits
            .max_compute_workgroup_size_x
            .min(limits.max_compute_invocations_per_workgroup);
        let execution_width = config.execution_width.min(device_width).max(1);
        if execution_width != config.execution_width {
            log::warn!(
                "execution width {} exceeds device limit, clamped to {execution_width}",
                config.execution_width
            );
        }

        let displace_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("deform displace bind group layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, false),
                uniform_entry(2),
                uniform_entry(3),
            ],
        });
        let normals_layout = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("deform normals bind group layout"),
            entries: &[
                storage_entry(0, true),
                storage_entry(1, false),
                storage_entry(2, false),
                uniform_entry(3),
            ],
        });

        gpu.device.push_error_scope(wgpu::ErrorFilter::Validation);

        let displace_module = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("deform displace shader"),
            source: wgpu::ShaderSource::Wgsl(DISPLACE_SHADER.into()),
        });
        let normals_module = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("deform normals shader"),
            source: wgpu::ShaderSource::Wgsl(NORMALS_SHADER.into()),
        });

        let displace_pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("deform displace pipeline layout"),
            bind_group_layouts: &[&displace_layout],
            push_constant_ranges: &[],
        });
        let normals_pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("deform normals pipeline layout"),
            bind_group_layouts: &[&normals_layout],
            push_constant_ranges: &[],
        });

        let displace_pipeline = gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("deform displace pipeline"),
            layout: Some(&displace_pipeline_layout),
            module: &displace_module,
            entry_point: Some("displace"),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &[("WORKGROUP_WIDTH", execution_width as f64)],
                zero_initialize_workgroup_memory: true,
            },
            cache: None,
        });

        let normal_pipelines = NORMAL_GROUP_CANDIDATES
            .iter()
            .map(|&size| {
                let pipeline = gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                    label: Some(&format!("deform normals pipeline ({size})")),
                    layout: Some(&normals_pipeline_layout),
                    module: &normals_module,
                    entry_point: Some("recompute_normals"),
                    compilation_options: wgpu::PipelineCompilationOptions {
                        constants: &[("GROUP_SIZE", size as f64)],
                        zero_initialize_workgroup_memory: true,
                    },
                    cache: None,
                });
                (size, pipeline)
            })
            .collect();

        if let Some(err) = pollster::block_on(gpu.device.pop_error_scope()) {
            return Err(DeformError::Pipeline {
                label: "deform compute".into(),
                message: err.to_string(),
            });
        }

        let params_buffer = uniform_buffer(gpu, "deform params", size_of::<DeformParams>());
        let displace_bounds = uniform_buffer(gpu, "deform displace bounds", size_of::<DispatchParams>());
        let normals_bounds = uniform_buffer(gpu, "deform normals bounds", size_of::<DispatchParams>());

        log::info!("GPU deformer ready: execution width {execution_width}");

        Ok(Self {
            id: NEXT_DEFORMER_ID.fetch_add(1, Ordering::Relaxed),
            gpu: gpu.clone(),
            execution_width,
            max_groups_per_dimension: limits.max_compute_workgroups_per_dimension,
            displace_layout,
            normals_layout,
            displace_pipeline,
            normal_pipelines,
            params_buffer,
            displace_bounds,
            normals_bounds,
            #[cfg(feature = "diagnostics")]
            stats: Default::default(),
        })
    }

    /// Displacement group width after clamping to device limits.
    pub fn execution_width(&self) -> u32 {
        self.execution_width
    }

    pub fn gpu(&self) -> &GpuContext {
        &self.gpu
    }

    #[cfg(feature = "diagnostics")]
    pub fn stats(&self) -> &crate::diag::DeformStats {
        &self.stats
    }

    fn normal_pipeline(&self, group_size: u32) -> DeformResult<&wgpu::ComputePipeline> {
        self.normal_pipelines
            .iter()
            .find(|(size, _)| *size == group_size)
            .map(|(_, pipeline)| pipeline)
            .ok_or_else(|| DeformError::Pipeline {
                label: "deform normals".into(),
                message: format!("no pipeline for group size {group_size}"),
            })
    }

    fn create_bindings(&self, current: &wgpu::Buffer, scratch: &wgpu::Buffer, normals: &wgpu::Buffer) -> DeformBindings {
        let device = &self.gpu.device;
        let displace = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("deform displace bind group"),
            layout: &self.displace_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: current.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: scratch.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: self.params_buffer.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: self.displace_bounds.as_entire_binding() },
            ],
        });
        let normals = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("deform normals bind group"),
            layout: &self.normals_layout,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: scratch.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: current.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: normals.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 3, resource: self.normals_bounds.as_entire_binding() },
            ],
        });
        log::debug!("bound mesh buffers for deformer {}", self.id);
        DeformBindings {
            owner: self.id,
            displace,
            normals,
        }
    }
}

impl MeshDeformer for GpuDeformer {
    type Mesh = DeformableMesh;

    fn name(&self) -> &str {
        "wgpu"
    }

    fn build_mesh(&self, geometry: &PlaneGeometry) -> DeformResult<DeformableMesh> {
        DeformableMesh::upload(&self.gpu, geometry)
    }

    fn deform(&mut self, mesh: &mut DeformableMesh, request: &DeformRequest) -> DeformResult<()> {
        let vertex_count = mesh.vertex_count();
        let displacement = displacement_plan(vertex_count, self.execution_width, self.max_groups_per_dimension);
        let normals = normal_plan(vertex_count, self.max_groups_per_dimension);
        if displacement.is_empty() || request.is_noop() {
            log::trace!("wgpu deform skipped on {vertex_count} vertices");
            #[cfg(feature = "diagnostics")]
            self.stats.record_skipped();
            return Ok(());
        }

        let bindings = match mesh.bindings.take() {
            Some(bindings) if bindings.owner == self.id => bindings,
            _ => {
                #[cfg(feature = "diagnostics")]
                self.stats.record_bindings();
                self.create_bindings(&mesh.current, &mesh.scratch, &mesh.normals)
            }
        };
        let normal_pipeline = self.normal_pipeline(normals.group_size)?;

        let queue = &self.gpu.queue;
        queue.write_buffer(&self.params_buffer, 0, bytemuck::bytes_of(&DeformParams::from(request)));
        queue.write_buffer(&self.displace_bounds, 0, bytemuck::bytes_of(&displacement.params(vertex_count)));
        queue.write_buffer(&self.normals_bounds, 0, bytemuck::bytes_of(&normals.params(vertex_count)));

        let device = &self.gpu.device;
        // Stage 1: A -> B.
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("deform displace encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("deform displace pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.displace_pipeline);
            pass.set_bind_group(0, &bindings.displace, &[]);
            pass.dispatch_workgroups(displacement.grid[0], displacement.grid[1], 1);
        }
        queue.submit(std::iter::once(encoder.finish()));

        // Stage 2: B -> normals + A.
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("deform normals encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("deform normals pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(normal_pipeline);
            pass.set_bind_group(0, &bindings.normals, &[]);
            pass.dispatch_workgroups(normals.grid[0], normals.grid[1], 1);
        }
        queue.submit(std::iter::once(encoder.finish()));
        mesh.bindings = Some(bindings);

        log::debug!(
            "wgpu deform: {vertex_count} vertices, displacement {:?}, normals {:?}",
            displacement,
            normals
        );
        #[cfg(feature = "diagnostics")]
        self.stats.record(vertex_count, displacement, normals);
        Ok(())
    }
}

fn storage_entry(binding: u32, read_only: bool) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::COMPUTE,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn uniform_buffer(gpu: &GpuContext, label: &str, size: usize) -> wgpu::Buffer {
    gpu.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: size as u64,
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}
