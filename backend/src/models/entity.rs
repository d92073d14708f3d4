//! Scene entities
//!
//! An entity pairs a drawable [`Mesh`] with a physics body and a set of
//! event listeners. It is created detached; [`Entity::create`] puts the mesh
//! in the scene and the body in the world, [`Entity::update`] copies the
//! body pose back onto the mesh, [`Entity::destroy`] takes both out again.
//!
//! Handlers receive an [`EventContext`] so they can act on the entity and
//! the world it lives in, e.g. give a freshly created die its throw:
//!
//! ```rust
//! use dice_box_core_rs::events::EntityEvent;
//! use dice_box_core_rs::models::{EntityOptions, EntityRegistry};
//! use dice_box_core_rs::physics::SimpleWorld;
//! use dice_box_core_rs::render::NullRenderer;
//! use dice_box_core_rs::{DieCatalog, DieType};
//! use glam::Vec3;
//!
//! let catalog = DieCatalog::standard();
//! let d6 = catalog.kind(DieType::D6);
//! let mut registry = EntityRegistry::new();
//! let mut renderer = NullRenderer;
//! let mut world = SimpleWorld::default();
//!
//! let die = registry.create_or_replace(
//!     "die",
//!     d6.geometry().clone(),
//!     d6.materials().clone(),
//!     d6.shape().clone(),
//!     EntityOptions::with_mass(1.0),
//!     &mut renderer,
//!     &mut world,
//! );
//! die.on(EntityEvent::Create, |ctx, _| {
//!     if let Some(body) = ctx.body_mut() {
//!         body.position = Vec3::new(0.0, 0.0, 4.0);
//!     }
//! });
//! die.create(&mut renderer, &mut world);
//! ```

use crate::dice::DieType;
use crate::events::{EntityEvent, EventEmitter, EventPayload, HandlerId};
use crate::physics::{BodyHandle, BodyPose, PhysicsWorld, RigidBody};
use crate::render::{Mesh, Renderer};
use crate::settle::StopDetector;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::rc::Rc;

/// Listener callback
pub type Handler = Rc<dyn Fn(&mut EventContext<'_>, &EventPayload)>;

/// What a handler may touch while it runs
pub struct EventContext<'a> {
    pub entity: &'a mut Entity,
    pub world: &'a mut dyn PhysicsWorld,
}

impl EventContext<'_> {
    /// The entity's body, wherever it currently lives
    pub fn body_mut(&mut self) -> Option<&mut RigidBody> {
        match self.entity.handle {
            Some(handle) => self.world.body_mut(handle),
            None => Some(&mut self.entity.template),
        }
    }
}

/// Physical parameters of an entity's body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntityOptions {
    /// `0.0` makes the body static
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl EntityOptions {
    pub fn with_mass(mass: f32) -> Self {
        Self {
            mass,
            ..Self::default()
        }
    }
}

impl Default for EntityOptions {
    fn default() -> Self {
        Self {
            mass: 0.0,
            linear_damping: 0.01,
            angular_damping: 0.01,
        }
    }
}

/// Metadata carried by entities that are dice
#[derive(Debug, Clone, PartialEq)]
pub struct DieState {
    pub die_type: DieType,
    pub detector: StopDetector,
}

pub struct Entity {
    name: String,
    mesh: Mesh,
    /// Body state while detached; refreshed from the world on destroy
    template: RigidBody,
    handle: Option<BodyHandle>,
    options: EntityOptions,
    emitter: EventEmitter<Handler>,
    die: Option<DieState>,
}

impl Entity {
    pub(crate) fn new(
        name: String,
        mesh: Mesh,
        mut body: RigidBody,
        options: EntityOptions,
    ) -> Self {
        body.mass = options.mass;
        body.linear_damping = options.linear_damping;
        body.angular_damping = options.angular_damping;
        Self {
            name,
            mesh,
            template: body,
            handle: None,
            options,
            emitter: EventEmitter::new(),
            die: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn options(&self) -> &EntityOptions {
        &self.options
    }

    /// Handle of the body while attached to a world
    pub fn body_handle(&self) -> Option<BodyHandle> {
        self.handle
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_some()
    }

    /// The entity's body: the world's copy while attached, else the template
    pub fn body<'a>(&'a self, world: &'a dyn PhysicsWorld) -> Option<&'a RigidBody> {
        match self.handle {
            Some(handle) => world.body(handle),
            None => Some(&self.template),
        }
    }

    pub fn die(&self) -> Option<&DieState> {
        self.die.as_ref()
    }

    pub fn die_mut(&mut self) -> Option<&mut DieState> {
        self.die.as_mut()
    }

    pub fn set_die(&mut self, die: DieState) {
        self.die = Some(die);
    }

    /// Register a handler for every future `event`
    pub fn on(
        &mut self,
        event: EntityEvent,
        handler: impl Fn(&mut EventContext<'_>, &EventPayload) + 'static,
    ) -> HandlerId {
        self.emitter.on(event, Rc::new(handler))
    }

    /// Register a handler for the next `event` only
    pub fn once(
        &mut self,
        event: EntityEvent,
        handler: impl Fn(&mut EventContext<'_>, &EventPayload) + 'static,
    ) -> HandlerId {
        self.emitter.once(event, Rc::new(handler))
    }

    pub fn off(&mut self, event: &EntityEvent, id: HandlerId) {
        self.emitter.off(event, id);
    }

    pub fn listener_count(&self, event: &EntityEvent) -> usize {
        self.emitter.listener_count(event)
    }

    /// Run every handler of `event` in registration order
    ///
    /// Registration changes requested by the handlers take effect once the
    /// outermost emit returns.
    pub fn emit(
        &mut self,
        event: EntityEvent,
        payload: &EventPayload,
        world: &mut dyn PhysicsWorld,
    ) {
        let handlers = self.emitter.begin_dispatch(&event);
        for (_, handler) in handlers {
            let mut ctx = EventContext {
                entity: &mut *self,
                world: &mut *world,
            };
            (*handler)(&mut ctx, payload);
        }
        self.emitter.end_dispatch();
    }

    /// Add the mesh to the scene and the body to the world, then emit
    /// [`EntityEvent::Create`]
    pub fn create(&mut self, renderer: &mut dyn Renderer, world: &mut dyn PhysicsWorld) {
        if self.handle.is_none() {
            self.handle = Some(world.add_body(self.template.clone()));
            renderer.add_to_scene(&self.mesh);
        }
        self.emit(EntityEvent::Create, &EventPayload::None, world);
    }

    /// Copy the body pose onto the mesh, then emit [`EntityEvent::Update`]
    pub fn update(&mut self, world: &mut dyn PhysicsWorld) {
        self.sync_pose(world);
        self.emit(EntityEvent::Update, &EventPayload::None, world);
    }

    /// Copy the body pose onto the mesh without notifying anyone
    pub fn sync_pose(&mut self, world: &dyn PhysicsWorld) {
        if let Some(body) = self.handle.and_then(|h| world.body(h)) {
            self.mesh.position = body.position;
            self.mesh.orientation = body.orientation;
        }
    }

    /// Teleport the body (attached or not) and move the mesh with it
    pub fn place(
        &mut self,
        pose: BodyPose,
        linear_velocity: Vec3,
        angular_velocity: Vec3,
        world: &mut dyn PhysicsWorld,
    ) {
        let body = match self.handle {
            Some(handle) => world.body_mut(handle),
            None => Some(&mut self.template),
        };
        if let Some(body) = body {
            body.set_state(pose, linear_velocity, angular_velocity);
        }
        self.mesh.position = pose.position;
        self.mesh.orientation = pose.orientation;
    }

    /// Emit [`EntityEvent::Destroy`], then take the body out of the world and
    /// the mesh out of the scene
    pub fn destroy(&mut self, renderer: &mut dyn Renderer, world: &mut dyn PhysicsWorld) {
        self.emit(EntityEvent::Destroy, &EventPayload::None, world);
        if let Some(handle) = self.handle.take() {
            if let Some(body) = world.remove_body(handle) {
                self.template = body;
            }
            renderer.remove_from_scene(self.mesh.id);
        }
    }
}

impl std::fmt::Debug for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Entity")
            .field("name", &self.name)
            .field("mesh", &self.mesh.id)
            .field("handle", &self.handle)
            .field("die", &self.die)
            .field("emitter", &self.emitter)
            .finish()
    }
}
