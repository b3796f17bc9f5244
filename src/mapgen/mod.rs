//! Map generation pipeline: named steps over a shared generation context.
//!
//! A [`GenerationContext`] is a keyed registry of components (type plus
//! optional string tag). Each [`GenerationStep`] declares the components it
//! requires up front; a step run against a context missing one fails fast
//! with a configuration error naming the step and the missing component,
//! never silently skipping. The [`Generator`] seeds a context with an
//! all-opaque transparency grid and runs the steps in order; the finished
//! grid is what a [`FovEngine`](crate::fov::FovEngine) consumes as its
//! transparency source.

pub mod steps;

pub use steps::{RandomRoomsStep, RandomWalkStep};

use std::any::{Any, TypeId, type_name};
use std::fmt;

use thiserror::Error;

use crate::grid::Grid;

/// Tag under which the map's transparency grid is registered.
pub const TRANSPARENCY_TAG: &str = "transparency";

/// A component a generation step requires on the context before it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentRequirement {
    type_id: TypeId,
    type_name: &'static str,
    tag: Option<String>,
}

impl ComponentRequirement {
    /// Require a component of type `T` with any tag.
    pub fn of<T: Any>() -> Self {
        ComponentRequirement {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            tag: None,
        }
    }

    /// Require a component of type `T` registered under `tag`.
    pub fn tagged<T: Any>(tag: &str) -> Self {
        ComponentRequirement {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            tag: Some(tag.to_string()),
        }
    }
}

impl fmt::Display for ComponentRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "a component of type {} tagged \"{tag}\"", self.type_name),
            None => write!(f, "a component of type {}", self.type_name),
        }
    }
}

/// Errors raised while configuring or running generation steps.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// A step's declared requirement was not present on the context.
    #[error(
        "generation step \"{step}\" requires {requirement} on the generation \
         context, but no matching component was found"
    )]
    MissingComponent {
        step: String,
        requirement: ComponentRequirement,
    },
    /// A step parameter was misconfigured.
    #[error(
        "invalid configuration for generation step parameter:\n    \
         generation step: {step}\n    \
         parameter name : {parameter}\n    \
         message        : {message}"
    )]
    InvalidConfiguration {
        step: String,
        parameter: String,
        message: String,
    },
}

struct RegisteredComponent {
    type_id: TypeId,
    tag: Option<String>,
    value: Box<dyn Any>,
}

/// Shared context that generation steps read and write.
///
/// Components are registered explicitly under their concrete type plus an
/// optional tag; lookups match on both. No component is ever registered
/// implicitly.
pub struct GenerationContext {
    width: usize,
    height: usize,
    components: Vec<RegisteredComponent>,
}

impl fmt::Debug for GenerationContext {
    // Components are type-erased, so only the registry size is shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationContext")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("components", &self.components.len())
            .finish()
    }
}

impl GenerationContext {
    pub fn new(width: usize, height: usize) -> Self {
        GenerationContext {
            width,
            height,
            components: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Register `component` with no tag.
    pub fn add<T: Any>(&mut self, component: T) {
        self.insert(component, None);
    }

    /// Register `component` under `tag`.
    pub fn add_tagged<T: Any>(&mut self, component: T, tag: &str) {
        self.insert(component, Some(tag.to_string()));
    }

    fn insert<T: Any>(&mut self, component: T, tag: Option<String>) {
        self.components.push(RegisteredComponent {
            type_id: TypeId::of::<T>(),
            tag,
            value: Box::new(component),
        });
    }

    /// First component of type `T`, regardless of tag.
    pub fn get<T: Any>(&self) -> Option<&T> {
        self.find(TypeId::of::<T>(), None)
            .and_then(|c| c.value.downcast_ref())
    }

    /// Component of type `T` registered under `tag`.
    pub fn get_tagged<T: Any>(&self, tag: &str) -> Option<&T> {
        self.find(TypeId::of::<T>(), Some(tag))
            .and_then(|c| c.value.downcast_ref())
    }

    /// Mutable access to the component of type `T` registered under `tag`.
    pub fn get_tagged_mut<T: Any>(&mut self, tag: &str) -> Option<&mut T> {
        let type_id = TypeId::of::<T>();
        self.components
            .iter_mut()
            .find(|c| c.type_id == type_id && c.tag.as_deref() == Some(tag))
            .and_then(|c| c.value.downcast_mut())
    }

    /// Whether a component satisfying `requirement` is registered.
    pub fn satisfies(&self, requirement: &ComponentRequirement) -> bool {
        self.find(requirement.type_id, requirement.tag.as_deref())
            .is_some()
    }

    fn find(&self, type_id: TypeId, tag: Option<&str>) -> Option<&RegisteredComponent> {
        self.components.iter().find(|c| {
            c.type_id == type_id && (tag.is_none() || c.tag.as_deref() == tag)
        })
    }
}

/// One named step of the generation pipeline.
///
/// Implementations declare required components and do their work in
/// [`on_perform`](Self::on_perform); callers go through
/// [`perform`](Self::perform), which validates the requirements first.
pub trait GenerationStep {
    /// Human-readable step name, used in error messages and logs.
    fn name(&self) -> &str;

    /// Components that must already exist on the context when the step runs.
    fn required_components(&self) -> Vec<ComponentRequirement> {
        Vec::new()
    }

    /// The step's actual work. Only called once requirements are satisfied.
    fn on_perform(&mut self, context: &mut GenerationContext) -> Result<(), GenerationError>;

    /// Validate requirements, then run the step. Fails fast on the first
    /// missing component.
    fn perform(&mut self, context: &mut GenerationContext) -> Result<(), GenerationError> {
        for requirement in self.required_components() {
            if !context.satisfies(&requirement) {
                return Err(GenerationError::MissingComponent {
                    step: self.name().to_string(),
                    requirement,
                });
            }
        }
        self.on_perform(context)
    }
}

/// Runs a sequence of generation steps over one context.
///
/// The context starts with an all-opaque `Grid<bool>` registered under
/// [`TRANSPARENCY_TAG`]; steps carve it open.
pub struct Generator {
    context: GenerationContext,
    steps: Vec<Box<dyn GenerationStep>>,
}

impl Generator {
    pub fn new(width: usize, height: usize) -> Self {
        let mut context = GenerationContext::new(width, height);
        context.add_tagged(Grid::new(width, height, false), TRANSPARENCY_TAG);
        Generator {
            context,
            steps: Vec::new(),
        }
    }

    /// A generator over an empty context, with no pre-registered
    /// components. Steps relying on the transparency grid will fail their
    /// requirement check.
    pub fn with_empty_context(width: usize, height: usize) -> Self {
        Generator {
            context: GenerationContext::new(width, height),
            steps: Vec::new(),
        }
    }

    /// Append a step to the pipeline.
    pub fn add_step(mut self, step: impl GenerationStep + 'static) -> Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Run every step in order; the first failure aborts generation.
    pub fn generate(mut self) -> Result<GenerationContext, GenerationError> {
        for step in &mut self.steps {
            log::debug!("running generation step \"{}\"", step.name());
            step.perform(&mut self.context)?;
        }
        Ok(self.context)
    }
}
