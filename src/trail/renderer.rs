//! wgpu rendering for the trail pool.
//!
//! One shared circle mesh is drawn instanced for every visible slot, additive
//! and un-depth-tested, into an offscreen color target whose view is handed
//! to downstream passes each frame.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use wgpu::util::DeviceExt;

use super::camera::OrthoCamera;
use super::pool::{TrailPool, MAX_PARTICLES};
use crate::config::CanvasSize;
use crate::error::{RenderError, Result};

/// Circle sprite radius in scene units (pixels at 1:1 camera mapping).
const SPRITE_RADIUS: f32 = 64.0;
const SPRITE_SEGMENTS: u32 = 32;

/// Format of the trail target. Linear, since the texture is data (a
/// displacement map), not display color.
pub const TRAIL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

/// Mesh vertex layout matching the shader.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct SpriteVertex {
    position: [f32; 2],
}

impl SpriteVertex {
    const ATTRIBS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Per-slot render-state record uploaded once per frame (20 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct TrailInstance {
    pub translate: [f32; 3],
    pub scale: f32,
    pub opacity: f32,
}

impl TrailInstance {
    const ATTRIBS: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32, 3 => Float32];

    fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Self>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBS,
        }
    }
}

/// Uniform buffer layout matching the shader.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct TrailUniforms {
    view_proj: [[f32; 4]; 4],
}

/// The trail map renderer. Owns the particle pool and the offscreen target.
pub struct TrailMap {
    pipeline: wgpu::RenderPipeline,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    target: wgpu::Texture,
    target_view: wgpu::TextureView,
    canvas: CanvasSize,
    camera: OrthoCamera,
    pool: TrailPool,
    disposed: bool,
}

impl TrailMap {
    /// Create a trail map sized to the canvas.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, canvas: CanvasSize) -> Result<Self> {
        check_canvas(canvas)?;

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("trail_shader"),
            source: wgpu::ShaderSource::Wgsl(super::TRAIL_SHADER_WGSL.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("trail_bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("trail_pl"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("trail_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_trail"),
                buffers: &[SpriteVertex::layout(), TrailInstance::layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_trail"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: TRAIL_FORMAT,
                    // Additive: overlapping sprites accumulate intensity.
                    blend: Some(wgpu::BlendState {
                        color: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::SrcAlpha,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                        alpha: wgpu::BlendComponent {
                            src_factor: wgpu::BlendFactor::One,
                            dst_factor: wgpu::BlendFactor::One,
                            operation: wgpu::BlendOperation::Add,
                        },
                    }),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: Default::default(),
            multiview: None,
            cache: None,
        });

        let vertices = circle_vertices(SPRITE_RADIUS, SPRITE_SEGMENTS);
        let indices = circle_indices(SPRITE_SEGMENTS);

        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("trail_vb"),
            contents: bytemuck::cast_slice(&vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("trail_ib"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trail_instances"),
            size: (MAX_PARTICLES * std::mem::size_of::<TrailInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("trail_ub"),
            size: std::mem::size_of::<TrailUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("trail_bg"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let (target, target_view) = create_target(device, canvas);
        let camera = OrthoCamera::new(canvas);

        let map = Self {
            pipeline,
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
            instance_buffer,
            uniform_buffer,
            bind_group,
            target,
            target_view,
            canvas,
            camera,
            pool: TrailPool::new(),
            disposed: false,
        };
        map.upload_uniforms(queue);

        Ok(map)
    }

    /// Step one frame: emit along the pointer path, render every visible slot
    /// into the offscreen target, then age the pool. Newly emitted slots are
    /// rendered this frame at their spawn opacity/scale; aging starts next
    /// frame.
    ///
    /// Returns the target's texture view for downstream sampling.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pointer: Vec2,
    ) -> Result<&wgpu::TextureView> {
        self.check_live()?;
        if !pointer.is_finite() {
            return Err(RenderError::NonFinitePointer {
                x: pointer.x,
                y: pointer.y,
            }
            .into());
        }

        self.pool.emit(pointer);

        let instances = pack_instances(&self.pool);
        if !instances.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        }

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("trail_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("trail_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            if !instances.is_empty() {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.bind_group, &[]);
                pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
                pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..self.index_count, 0, 0..instances.len() as u32);
            }
        }

        queue.submit(std::iter::once(encoder.finish()));

        self.pool.advance();
        self.pool.set_prev_pointer(pointer);

        Ok(&self.target_view)
    }

    /// Refit the camera and recreate the offscreen target for a new canvas
    /// size. A no-op when the size is unchanged.
    pub fn resize(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        canvas: CanvasSize,
    ) -> Result<()> {
        self.check_live()?;
        check_canvas(canvas)?;

        if canvas == self.canvas {
            return Ok(());
        }

        tracing::debug!(
            "Resizing trail target {}x{} -> {}x{}",
            self.canvas.width,
            self.canvas.height,
            canvas.width,
            canvas.height
        );

        self.canvas = canvas;
        self.camera.set_canvas(canvas);
        self.target.destroy();
        let (target, target_view) = create_target(device, canvas);
        self.target = target;
        self.target_view = target_view;
        self.upload_uniforms(queue);

        Ok(())
    }

    /// Release every owned GPU resource. Further use of this trail map,
    /// including a second dispose, is an error.
    pub fn dispose(&mut self) -> Result<()> {
        self.check_live()?;
        self.disposed = true;

        self.target.destroy();
        self.vertex_buffer.destroy();
        self.index_buffer.destroy();
        self.instance_buffer.destroy();
        self.uniform_buffer.destroy();

        Ok(())
    }

    pub fn texture_view(&self) -> &wgpu::TextureView {
        &self.target_view
    }

    pub fn target_texture(&self) -> &wgpu::Texture {
        &self.target
    }

    pub fn canvas(&self) -> CanvasSize {
        self.canvas
    }

    pub fn pool(&self) -> &TrailPool {
        &self.pool
    }

    fn check_live(&self) -> Result<()> {
        if self.disposed {
            return Err(RenderError::Disposed.into());
        }
        Ok(())
    }

    fn upload_uniforms(&self, queue: &wgpu::Queue) {
        let uniforms = TrailUniforms {
            view_proj: self.camera.view_proj().to_cols_array_2d(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
    }
}

/// Pack every visible slot into instance records, in slot order.
fn pack_instances(pool: &TrailPool) -> Vec<TrailInstance> {
    pool.slots()
        .iter()
        .filter(|slot| slot.visible)
        .map(|slot| TrailInstance {
            translate: slot.position.to_array(),
            scale: slot.scale.x,
            opacity: slot.opacity,
        })
        .collect()
}

/// Circle mesh: center vertex plus a closed rim, `segments` triangles.
fn circle_vertices(radius: f32, segments: u32) -> Vec<SpriteVertex> {
    let mut vertices = Vec::with_capacity(segments as usize + 2);
    vertices.push(SpriteVertex {
        position: [0.0, 0.0],
    });
    for i in 0..=segments {
        let angle = i as f32 / segments as f32 * std::f32::consts::TAU;
        vertices.push(SpriteVertex {
            position: [radius * angle.cos(), radius * angle.sin()],
        });
    }
    vertices
}

fn circle_indices(segments: u32) -> Vec<u32> {
    let mut indices = Vec::with_capacity(segments as usize * 3);
    for i in 0..segments {
        indices.extend_from_slice(&[0, i + 1, i + 2]);
    }
    indices
}

fn create_target(device: &wgpu::Device, canvas: CanvasSize) -> (wgpu::Texture, wgpu::TextureView) {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("trail_target"),
        size: wgpu::Extent3d {
            width: canvas.width,
            height: canvas.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: TRAIL_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT
            | wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());
    (texture, view)
}

fn check_canvas(canvas: CanvasSize) -> Result<()> {
    if canvas.width == 0 || canvas.height == 0 {
        return Err(RenderError::InvalidCanvasSize {
            width: canvas.width,
            height: canvas.height,
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_mesh_shape() {
        let vertices = circle_vertices(64.0, 32);
        let indices = circle_indices(32);

        assert_eq!(vertices.len(), 34);
        assert_eq!(indices.len(), 96);
        assert_eq!(vertices[0].position, [0.0, 0.0]);

        for vertex in &vertices[1..] {
            let [x, y] = vertex.position;
            let radius = (x * x + y * y).sqrt();
            assert!((radius - 64.0).abs() < 1e-3);
        }

        let max_index = *indices.iter().max().unwrap();
        assert_eq!(max_index as usize, vertices.len() - 1);
    }

    #[test]
    fn test_pack_instances_takes_visible_slots_only() {
        let mut pool = TrailPool::new();
        assert!(pack_instances(&pool).is_empty());

        pool.emit(Vec2::new(25.0, 0.0));
        let instances = pack_instances(&pool);
        assert_eq!(instances.len(), 2);

        assert_eq!(instances[0].translate, [0.0, 0.0, 0.0]);
        assert_eq!(instances[0].scale, 0.0);
        assert_eq!(instances[0].opacity, 0.5);

        pool.advance();
        let instances = pack_instances(&pool);
        assert_eq!(instances.len(), 2);
        assert!((instances[0].scale - 0.016).abs() < 1e-6);
        assert!((instances[0].opacity - 0.48).abs() < 1e-6);
    }

    #[test]
    fn test_instance_record_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<TrailInstance>(), 20);
    }

    #[test]
    fn test_check_canvas_rejects_zero() {
        assert!(check_canvas(CanvasSize::new(0, 720)).is_err());
        assert!(check_canvas(CanvasSize::new(1280, 0)).is_err());
        assert!(check_canvas(CanvasSize::new(1280, 720)).is_ok());
    }
}
