//! Scene-side data: cameras, lights, models, environment and particle
//! emitters, gathered into a flat ordered component list.

pub mod camera;
pub mod environment;
pub mod light;
pub mod material;
pub mod mesh;
pub mod model;
pub mod particles;

use crate::scene::{
    camera::Camera,
    environment::Environment,
    light::{DirectionalLight, PointLight, SpotLight},
    model::Model,
    particles::ParticleEmitter,
};
use std::rc::Rc;

/// Everything a scene can contain, as a closed tagged union. The renderer
/// matches on the variants while collecting per-frame data; adding a new kind
/// of component is a compile-time-checked change to this enum.
#[derive(Clone)]
pub enum SceneComponent {
    /// Observer; when a scene has several, the last one wins.
    Camera(Camera),
    /// Sun-like light, the shadow caster.
    DirectionalLight(DirectionalLight),
    /// Omnidirectional light.
    PointLight(PointLight),
    /// Cone light.
    SpotLight(SpotLight),
    /// Skybox and IBL cubemaps; the last one wins.
    Environment(Environment),
    /// Node tree with drawable surfaces, shared by reference count.
    Model(Rc<Model>),
    /// Particle emitter, shared by reference count.
    ParticleEmitter(Rc<ParticleEmitter>),
}

/// An ordered list of scene components. Order matters only for the
/// "last camera wins" rule; rendering order is fixed by the pipeline.
#[derive(Clone, Default)]
pub struct Scene {
    components: Vec<SceneComponent>,
}

impl Scene {
    /// Creates an empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a component to the scene.
    pub fn add(&mut self, component: SceneComponent) -> &mut Self {
        self.components.push(component);
        self
    }

    /// Adds a camera.
    pub fn add_camera(&mut self, camera: Camera) -> &mut Self {
        self.add(SceneComponent::Camera(camera))
    }

    /// Adds a directional light.
    pub fn add_directional_light(&mut self, light: DirectionalLight) -> &mut Self {
        self.add(SceneComponent::DirectionalLight(light))
    }

    /// Adds a point light.
    pub fn add_point_light(&mut self, light: PointLight) -> &mut Self {
        self.add(SceneComponent::PointLight(light))
    }

    /// Adds a spot light.
    pub fn add_spot_light(&mut self, light: SpotLight) -> &mut Self {
        self.add(SceneComponent::SpotLight(light))
    }

    /// Sets the scene environment.
    pub fn add_environment(&mut self, environment: Environment) -> &mut Self {
        self.add(SceneComponent::Environment(environment))
    }

    /// Adds a model.
    pub fn add_model(&mut self, model: Rc<Model>) -> &mut Self {
        self.add(SceneComponent::Model(model))
    }

    /// Adds a particle emitter.
    pub fn add_particle_emitter(&mut self, emitter: Rc<ParticleEmitter>) -> &mut Self {
        self.add(SceneComponent::ParticleEmitter(emitter))
    }

    /// Components in insertion order.
    pub fn components(&self) -> impl Iterator<Item = &SceneComponent> {
        self.components.iter()
    }
}
