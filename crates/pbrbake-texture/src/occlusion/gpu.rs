//! Compute-shader occlusion backend.
//!
//! Runs the same march as the CPU backend, one invocation per pixel. The
//! height field and ray set are uploaded as storage buffers and the result is
//! read back through a staging buffer.

use std::borrow::Cow;
use std::sync::mpsc;

use bytemuck::{Pod, Zeroable};
use log::debug;
use wgpu::util::DeviceExt;

use super::{OcclusionError, OcclusionOptions, RaySet};
use crate::buffer::ScalarField;

const WORKGROUP_SIZE: u32 = 8;

const SHADER: &str = r#"
struct Params {
    width: u32,
    height: u32,
    steps: u32,
    ray_count: u32,
    z_scale: f32,
    z_bias: f32,
    hit_power: f32,
    wrap_x: u32,
    wrap_y: u32,
    pad0: u32,
    pad1: u32,
    pad2: u32,
};

@group(0) @binding(0) var<uniform> params: Params;
@group(0) @binding(1) var<storage, read> heights: array<f32>;
@group(0) @binding(2) var<storage, read> rays: array<vec4<f32>>;
@group(0) @binding(3) var<storage, read_write> output: array<f32>;

fn resolve(c: i32, len: i32, wrap: u32) -> i32 {
    if (wrap != 0u) {
        return ((c % len) + len) % len;
    }
    return clamp(c, 0, len - 1);
}

fn texel(x: i32, y: i32) -> f32 {
    let w = i32(params.width);
    let h = i32(params.height);
    let sx = resolve(x, w, params.wrap_x);
    let sy = resolve(y, h, params.wrap_y);
    return heights[u32(sy * w + sx)];
}

fn bilinear(px: f32, py: f32) -> f32 {
    let x0 = floor(px);
    let y0 = floor(py);
    let fx = px - x0;
    let fy = py - y0;
    let ix = i32(x0);
    let iy = i32(y0);
    let c00 = texel(ix, iy);
    let c10 = texel(ix + 1, iy);
    let c01 = texel(ix, iy + 1);
    let c11 = texel(ix + 1, iy + 1);
    let top = c00 + (c10 - c00) * fx;
    let bottom = c01 + (c11 - c01) * fx;
    return top + (bottom - top) * fy;
}

@compute @workgroup_size(8, 8, 1)
fn main(@builtin(global_invocation_id) id: vec3<u32>) {
    if (id.x >= params.width || id.y >= params.height) {
        return;
    }
    let index = id.y * params.width + id.x;
    let origin_z = heights[index] * params.z_scale + params.z_bias;

    var total: f32 = 0.0;
    for (var r: u32 = 0u; r < params.ray_count; r = r + 1u) {
        let dir = rays[r];
        var factor: f32 = 1.0;
        for (var i: u32 = 1u; i <= params.steps; i = i + 1u) {
            let t = f32(i);
            let z = origin_z + dir.z * t;
            if (z > params.z_scale) {
                break;
            }
            let surface = bilinear(f32(id.x) + dir.x * t, f32(id.y) + dir.y * t) * params.z_scale;
            if (z < surface) {
                if (i == 1u) {
                    factor = 0.0;
                } else {
                    factor = pow(f32(i - 1u) / f32(params.steps), params.hit_power);
                }
                break;
            }
        }
        total = total + factor;
    }
    output[index] = clamp(1.0 - total / f32(params.ray_count), 0.0, 1.0);
}
"#;

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct Params {
    width: u32,
    height: u32,
    steps: u32,
    ray_count: u32,
    z_scale: f32,
    z_bias: f32,
    hit_power: f32,
    wrap_x: u32,
    wrap_y: u32,
    _pad: [u32; 3],
}

/// A compute device ready to run the occlusion kernel.
pub struct GpuOcclusion {
    device: wgpu::Device,
    queue: wgpu::Queue,
    pipeline: wgpu::ComputePipeline,
}

impl GpuOcclusion {
    /// Acquire an adapter and compile the kernel.
    pub fn new() -> Result<Self, OcclusionError> {
        pollster::block_on(Self::new_async())
    }

    async fn new_async() -> Result<Self, OcclusionError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or_else(|| OcclusionError::GpuUnavailable("no compute adapter found".to_string()))?;

        let info = adapter.get_info();
        debug!("occlusion adapter: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("occlusion device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await
            .map_err(|e| OcclusionError::GpuUnavailable(e.to_string()))?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("occlusion shader"),
            source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(SHADER)),
        });
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("occlusion pipeline"),
            layout: None,
            module: &module,
            entry_point: "main",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        });

        Ok(Self {
            device,
            queue,
            pipeline,
        })
    }

    /// Run the kernel over `height` and read the result back.
    pub fn generate(
        &self,
        height: &ScalarField,
        options: &OcclusionOptions,
        rays: &RaySet,
    ) -> Result<ScalarField, OcclusionError> {
        let (width, rows) = (height.width, height.height);
        if width == 0 || rows == 0 || rays.is_empty() {
            return Ok(ScalarField::new(width, rows, 0.0));
        }

        let params = Params {
            width,
            height: rows,
            steps: options.steps as u32,
            ray_count: rays.len() as u32,
            z_scale: options.z_scale,
            z_bias: options.z_bias,
            hit_power: options.hit_power,
            wrap_x: options.edges.wrap_x as u32,
            wrap_y: options.edges.wrap_y as u32,
            _pad: [0; 3],
        };
        let directions: Vec<[f32; 4]> = rays
            .directions
            .iter()
            .map(|d| [d[0], d[1], d[2], 0.0])
            .collect();
        let output_size = (height.data.len() * std::mem::size_of::<f32>()) as wgpu::BufferAddress;

        let params_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("occlusion params"),
                contents: bytemuck::bytes_of(&params),
                usage: wgpu::BufferUsages::UNIFORM,
            });
        let height_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("occlusion heights"),
                contents: bytemuck::cast_slice(&height.data),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let ray_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("occlusion rays"),
                contents: bytemuck::cast_slice(&directions),
                usage: wgpu::BufferUsages::STORAGE,
            });
        let output_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("occlusion output"),
            size: output_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let staging_buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("occlusion staging"),
            size: output_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("occlusion bindings"),
            layout: &self.pipeline.get_bind_group_layout(0),
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: params_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: height_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: ray_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: output_buffer.as_entire_binding(),
                },
            ],
        });

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("occlusion encoder"),
            });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("occlusion pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(
                width.div_ceil(WORKGROUP_SIZE),
                rows.div_ceil(WORKGROUP_SIZE),
                1,
            );
        }
        encoder.copy_buffer_to_buffer(&output_buffer, 0, &staging_buffer, 0, output_size);
        self.queue.submit(Some(encoder.finish()));

        let slice = staging_buffer.slice(..);
        let (tx, rx) = mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        self.device.poll(wgpu::Maintain::Wait);
        rx.recv()
            .map_err(|e| OcclusionError::Gpu(e.to_string()))?
            .map_err(|e| OcclusionError::Gpu(e.to_string()))?;

        let data = {
            let mapped = slice.get_mapped_range();
            bytemuck::cast_slice::<u8, f32>(&mapped).to_vec()
        };
        staging_buffer.unmap();

        Ok(ScalarField {
            width,
            height: rows,
            data,
        })
    }
}
