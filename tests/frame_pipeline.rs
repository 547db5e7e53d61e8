//! End-to-end pipeline tests on the headless graphics server.

use luster::{
    color::Color,
    renderer::{
        error::RendererError,
        framework::{
            framebuffer::{CompareFunc, CullFace},
            gpu_texture::GpuTexture,
            headless::{
                GraphicsOp, HeadlessGraphicsServer, RecordedDrawCall, RecordedUniformValue,
            },
            server::GraphicsServer,
        },
        shadow::csm::NUM_CASCADES,
        SceneRenderer,
    },
    scene::{
        camera::Camera,
        light::{DirectionalLight, PointLight},
        material::{AlphaMode, Material},
        mesh::SurfaceData,
        model::{Model, ModelNode, Surface},
        particles::{Particle, ParticleEmitter},
        Scene,
    },
    settings::{QualitySettings, ShadowMapStrategy},
};
use approx::assert_relative_eq;
use nalgebra::{Matrix4, Vector3};
use std::rc::Rc;

const WIDTH: usize = 1280;
const HEIGHT: usize = 720;

fn make_camera() -> Camera {
    let mut camera = Camera::new(
        std::f32::consts::FRAC_PI_3,
        WIDTH as f32 / HEIGHT as f32,
        0.25,
        150.0,
    );
    camera
        .set_position(Vector3::new(0.0, 3.0, 10.0))
        .set_target(Vector3::zeros());
    camera
}

fn cube_model(material: Material) -> Rc<Model> {
    Rc::new(Model::new(ModelNode {
        local_transform: Matrix4::identity(),
        surfaces: vec![Surface {
            data: Rc::new(SurfaceData::make_cube()),
            material,
        }],
        children: Vec::new(),
    }))
}

fn basic_scene() -> Scene {
    let mut scene = Scene::new();
    scene
        .add_camera(make_camera())
        .add_directional_light(DirectionalLight::new(
            Vector3::new(-0.3, -1.0, -0.2),
            Color::WHITE,
            2.0,
        ))
        .add_model(cube_model(Material::default()));
    scene
}

fn make_renderer(
    settings: QualitySettings,
) -> (HeadlessGraphicsServer, SceneRenderer) {
    let server = HeadlessGraphicsServer::new();
    let renderer = SceneRenderer::new(Rc::new(server.clone()), WIDTH, HEIGHT, settings).unwrap();
    (server, renderer)
}

fn draws_with_program<'a>(
    draws: &'a [RecordedDrawCall],
    program: &str,
) -> Vec<&'a RecordedDrawCall> {
    draws.iter().filter(|d| d.program == program).collect()
}

fn lighting_draw(draws: &[RecordedDrawCall]) -> RecordedDrawCall {
    let lighting = draws_with_program(draws, "DeferredLightShader");
    assert_eq!(lighting.len(), 1);
    lighting[0].clone()
}

#[test]
fn directional_light_produces_four_increasing_cascades() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());
    server.reset_ops();

    renderer.render(&basic_scene()).unwrap();

    let draws = server.draws();
    let shadow_draws = draws_with_program(&draws, "ShadowMapShader");
    assert_eq!(shadow_draws.len(), NUM_CASCADES);
    let mut targets: Vec<u64> = shadow_draws.iter().map(|d| d.framebuffer).collect();
    targets.dedup();
    assert_eq!(targets.len(), NUM_CASCADES);

    let lighting = lighting_draw(&draws);
    assert!(matches!(
        lighting.uniform("shadowsEnabled"),
        Some(RecordedUniformValue::Bool(true))
    ));
    assert!(matches!(
        lighting.uniform("cascadedShadows"),
        Some(RecordedUniformValue::Bool(true))
    ));

    let mut previous = 0.0f32;
    for i in 0..NUM_CASCADES {
        let Some(RecordedUniformValue::Float(distance)) =
            lighting.uniform(&format!("cascadeDistances[{i}]"))
        else {
            panic!("cascade distance {i} not bound");
        };
        assert!(*distance > previous);
        previous = *distance;
    }
    assert_eq!(previous, 150.0);
}

#[test]
fn zero_lights_renders_without_shadows() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());
    server.reset_ops();

    let mut scene = Scene::new();
    scene
        .add_camera(make_camera())
        .add_model(cube_model(Material::default()));
    renderer.render(&scene).unwrap();

    let draws = server.draws();
    assert!(draws_with_program(&draws, "ShadowMapShader").is_empty());

    let lighting = lighting_draw(&draws);
    assert!(matches!(
        lighting.uniform("shadowsEnabled"),
        Some(RecordedUniformValue::Bool(false))
    ));
    assert!(matches!(
        lighting.uniform("directionalLightCount"),
        Some(RecordedUniformValue::Int(0))
    ));
}

#[test]
fn missing_camera_fails_before_any_gpu_work() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());
    server.reset_ops();

    let mut scene = Scene::new();
    scene
        .add_directional_light(DirectionalLight::default())
        .add_model(cube_model(Material::default()));

    assert!(matches!(
        renderer.render(&scene),
        Err(RendererError::NoCamera)
    ));
    assert!(server.ops().is_empty());
}

#[test]
fn passes_run_in_fixed_order() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());
    server.reset_ops();

    let skybox_texture = server
        .create_texture(
            luster::renderer::framework::gpu_texture::GpuTextureDescriptor::render_target(
                luster::renderer::framework::gpu_texture::GpuTextureKind::Cube { size: 4 },
                luster::renderer::framework::gpu_texture::PixelKind::RGBA16F,
            ),
        )
        .unwrap();

    let mut emitter = ParticleEmitter::new(Vector3::zeros());
    emitter.particles.push(Particle {
        position: Vector3::y(),
        size: 0.5,
        alpha: 1.0,
    });

    let mut scene = basic_scene();
    scene
        .add_environment(luster::scene::environment::Environment::from_skybox(
            skybox_texture,
        ))
        .add_particle_emitter(Rc::new(emitter));
    server.reset_ops();

    renderer.render(&scene).unwrap();

    let draws = server.draws();
    let index_of = |program: &str| {
        draws
            .iter()
            .position(|d| d.program == program)
            .unwrap_or_else(|| panic!("no draw with program {program}"))
    };
    let last_index_of = |program: &str| {
        draws.len() - 1 - draws.iter().rev().position(|d| d.program == program).unwrap()
    };

    assert!(last_index_of("ShadowMapShader") < index_of("GBufferShader"));
    assert!(last_index_of("GBufferShader") < index_of("DeferredLightShader"));
    assert!(index_of("DeferredLightShader") < index_of("SkyboxShader"));
    assert!(index_of("SkyboxShader") < index_of("ParticleShader"));

    // The depth blit happens after the G-buffer is filled and before shading.
    let ops = server.ops();
    let blit_index = ops
        .iter()
        .position(|op| matches!(op, GraphicsOp::BlitDepth { .. }))
        .unwrap();
    let lighting_op_index = ops
        .iter()
        .position(
            |op| matches!(op, GraphicsOp::Draw(d) if d.program == "DeferredLightShader"),
        )
        .unwrap();
    assert!(blit_index < lighting_op_index);
}

#[test]
fn frame_data_does_not_leak_between_scenes() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());

    let mut big = Scene::new();
    big.add_camera(make_camera())
        .add_directional_light(DirectionalLight::default())
        .add_point_light(PointLight::default())
        .add_point_light(PointLight::default())
        .add_model(cube_model(Material::default()))
        .add_model(cube_model(Material::default()));
    renderer.render(&big).unwrap();

    let mut small = Scene::new();
    small
        .add_camera(make_camera())
        .add_model(cube_model(Material::default()));
    server.reset_ops();
    let statistics = renderer.render(&small).unwrap();

    let draws = server.draws();
    assert_eq!(draws_with_program(&draws, "GBufferShader").len(), 1);
    assert!(draws_with_program(&draws, "ShadowMapShader").is_empty());
    assert_eq!(statistics.geometry.draw_calls, 1);

    let lighting = lighting_draw(&draws);
    assert!(matches!(
        lighting.uniform("pointLightCount"),
        Some(RecordedUniformValue::Int(0))
    ));
    assert!(matches!(
        lighting.uniform("directionalLightCount"),
        Some(RecordedUniformValue::Int(0))
    ));
}

#[test]
fn alpha_blended_surfaces_cast_no_shadows() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());

    let blended = cube_model(Material {
        alpha_mode: AlphaMode::Blend,
        ..Default::default()
    });
    let blended_id = blended.root.surfaces[0].data.id();

    let mut scene = basic_scene();
    scene.add_model(blended);
    server.reset_ops();
    renderer.render(&scene).unwrap();

    let draws = server.draws();
    for draw in draws_with_program(&draws, "ShadowMapShader") {
        assert_ne!(draw.geometry, blended_id);
    }
    // It is absent from the G-buffer as well; transparency is not deferred.
    for draw in draws_with_program(&draws, "GBufferShader") {
        assert_ne!(draw.geometry, blended_id);
    }
}

#[test]
fn double_sided_materials_disable_culling() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());

    let mut scene = Scene::new();
    scene
        .add_camera(make_camera())
        .add_directional_light(DirectionalLight::default())
        .add_model(cube_model(Material {
            double_sided: true,
            ..Default::default()
        }));
    server.reset_ops();
    renderer.render(&scene).unwrap();

    let draws = server.draws();
    for draw in draws_with_program(&draws, "GBufferShader")
        .into_iter()
        .chain(draws_with_program(&draws, "ShadowMapShader"))
    {
        assert_eq!(draw.parameters.cull_face, None);
    }
}

#[test]
fn single_map_strategy_produces_one_shadow_map() {
    let settings = QualitySettings {
        shadow_strategy: ShadowMapStrategy::Single,
        ..Default::default()
    };
    let (server, mut renderer) = make_renderer(settings);
    server.reset_ops();

    renderer.render(&basic_scene()).unwrap();

    let draws = server.draws();
    let shadow_draws = draws_with_program(&draws, "ShadowMapShader");
    assert_eq!(shadow_draws.len(), 1);

    let lighting = lighting_draw(&draws);
    assert!(matches!(
        lighting.uniform("shadowsEnabled"),
        Some(RecordedUniformValue::Bool(true))
    ));
    assert!(matches!(
        lighting.uniform("cascadedShadows"),
        Some(RecordedUniformValue::Bool(false))
    ));
}

#[test]
fn shadow_pass_culls_front_faces() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());
    server.reset_ops();
    renderer.render(&basic_scene()).unwrap();

    let draws = server.draws();
    for draw in draws_with_program(&draws, "ShadowMapShader") {
        assert_eq!(draw.parameters.cull_face, Some(CullFace::Front));
        assert!(!draw.parameters.color_write.red);
        assert!(draw.parameters.depth_write);
    }
}

#[test]
fn destroy_releases_all_resources() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());
    assert!(server.alive_resources().total() > 0);

    // Render once so the geometry cache holds an uploaded mesh too.
    renderer.render(&basic_scene()).unwrap();

    renderer.destroy();
    assert_eq!(server.alive_resources().total(), 0);
}

#[test]
fn statistics_accumulate_per_pass() {
    let (_server, mut renderer) = make_renderer(QualitySettings::default());

    let statistics = renderer.render(&basic_scene()).unwrap();
    assert_eq!(statistics.frames_rendered, 1);
    assert_eq!(statistics.shadow.draw_calls, NUM_CASCADES);
    assert_eq!(statistics.geometry.draw_calls, 1);
    assert_eq!(statistics.lighting.draw_calls, 1);
    assert_eq!(statistics.total().draw_calls, NUM_CASCADES + 2);

    let statistics = renderer.render(&basic_scene()).unwrap();
    assert_eq!(statistics.frames_rendered, 2);
}

#[test]
fn lighting_pass_skips_pixels_at_clear_depth() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());
    server.reset_ops();
    renderer.render(&basic_scene()).unwrap();

    let draws = server.draws();
    let lighting = lighting_draw(&draws);
    assert_eq!(lighting.parameters.depth_test, Some(CompareFunc::NotEqual));
    assert!(!lighting.parameters.depth_write);

    // The quad arrives at the far plane, so only the clear value below can
    // make background pixels fail the NotEqual test.
    let ops = server.ops();
    let target_clear = ops.iter().find_map(|op| match op {
        GraphicsOp::Clear {
            framebuffer, depth, ..
        } if *framebuffer == lighting.framebuffer => Some(*depth),
        _ => None,
    });
    assert_eq!(target_clear, Some(Some(1.0)));
}

#[test]
fn lighting_pass_receives_camera_forward_axis() {
    let (server, mut renderer) = make_renderer(QualitySettings::default());
    server.reset_ops();
    renderer.render(&basic_scene()).unwrap();

    let draws = server.draws();
    let lighting = lighting_draw(&draws);
    let Some(RecordedUniformValue::Vector3(forward)) = lighting.uniform("cameraForward") else {
        panic!("camera forward axis not bound");
    };
    // The camera sits at (0, 3, 10) looking at the origin.
    let expected = Vector3::new(0.0, -3.0, -10.0).normalize();
    assert_relative_eq!(*forward, expected, epsilon = 1e-6);
}

#[test]
fn shadow_textures_are_exposed_for_diagnostics() {
    let (_server, renderer) = make_renderer(QualitySettings::default());
    let cascades = renderer.shadow_textures();
    assert_eq!(cascades.len(), NUM_CASCADES);
    assert!(cascades
        .iter()
        .all(|texture| texture.pixel_kind().is_depth()));

    let (_server, renderer) = make_renderer(QualitySettings {
        shadow_strategy: ShadowMapStrategy::Single,
        ..Default::default()
    });
    let single = renderer.shadow_textures();
    assert_eq!(single.len(), 1);
    assert!(single[0].pixel_kind().is_depth());
}
