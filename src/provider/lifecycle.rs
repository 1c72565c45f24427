//! Construction, initialization and destruction sequencing.

use crate::definition::ComponentDefinition;
use crate::error::{DiError, DiResult};
use crate::execution::ExecutionContext;
use crate::instance::ManagedInstance;
use crate::internal::StackGuard;
use crate::observer::LifecycleEvent;
use crate::provider::{Registry, ResolverContext};
use crate::traits::{CallbackResult, Lifecycle, LifecyclePhase};

impl Registry {
    /// Constructs an instance and runs the initialization phases in order.
    ///
    /// `on_constructed` sees the instance right after the factory returns,
    /// before any callback runs.
    pub(crate) fn create_instance(
        &self,
        definition: &ComponentDefinition,
        context: Option<&ExecutionContext>,
        on_constructed: &dyn Fn(&ManagedInstance),
    ) -> DiResult<ManagedInstance> {
        let _frame = StackGuard::enter(definition.name)?;

        let resolver = ResolverContext::new(self, context);
        let constructed = (definition.ctor)(&resolver)?;
        let instance = ManagedInstance::new(definition.name, definition.scope, constructed);
        tracing::debug!(
            component = definition.name,
            scope = %definition.scope,
            instance = %instance.id(),
            "constructed"
        );
        self.emit(&instance, LifecyclePhase::Constructed);
        on_constructed(&instance);

        for phase in LifecyclePhase::INITIALIZATION {
            self.run_phase(definition, &instance, phase)?;
        }
        Ok(instance)
    }

    /// Runs every destruction phase, even past a failing one, and reports
    /// the first failure.
    pub(crate) fn run_destruction(
        &self,
        definition: &ComponentDefinition,
        instance: &ManagedInstance,
    ) -> DiResult<()> {
        let mut first_failure = None;
        for phase in LifecyclePhase::DESTRUCTION {
            if let Err(error) = self.run_phase(definition, instance, phase) {
                tracing::warn!(
                    component = definition.name,
                    instance = %instance.id(),
                    phase = %phase,
                    error = %error,
                    "destruction callback failed"
                );
                first_failure.get_or_insert(error);
            }
        }

        match first_failure {
            Some(error) => Err(error),
            None => {
                tracing::debug!(
                    component = definition.name,
                    instance = %instance.id(),
                    "destroyed"
                );
                Ok(())
            }
        }
    }

    fn run_phase(
        &self,
        definition: &ComponentDefinition,
        instance: &ManagedInstance,
        phase: LifecyclePhase,
    ) -> DiResult<()> {
        let outcome = match phase.capability() {
            Some(required) => {
                if !instance.capabilities().contains(required) {
                    return Ok(());
                }
                let Some(lifecycle) = instance.lifecycle() else {
                    return Ok(());
                };
                self.invoke_lifecycle(lifecycle.as_ref(), definition, phase)
            }
            None => match phase {
                LifecyclePhase::BeforeInitialization | LifecyclePhase::AfterInitialization => {
                    if self.inner.post_processors.is_empty() {
                        return Ok(());
                    }
                    self.invoke_post_processors(instance, phase)
                }
                LifecyclePhase::CustomInit => match &definition.init_hook {
                    Some(hook) => hook(instance.value()),
                    None => return Ok(()),
                },
                LifecyclePhase::CustomDestroy => match &definition.destroy_hook {
                    Some(hook) => hook(instance.value()),
                    None => return Ok(()),
                },
                _ => return Ok(()),
            },
        };

        if let Err(source) = outcome {
            return Err(DiError::callback_failed(definition.name, phase, source));
        }
        self.emit(instance, phase);
        Ok(())
    }

    fn invoke_lifecycle(
        &self,
        lifecycle: &dyn Lifecycle,
        definition: &ComponentDefinition,
        phase: LifecyclePhase,
    ) -> CallbackResult {
        match phase {
            LifecyclePhase::NameAssigned => {
                lifecycle.set_component_name(definition.name);
                Ok(())
            }
            LifecyclePhase::RegistryAssigned => {
                lifecycle.set_registry(self);
                Ok(())
            }
            LifecyclePhase::ContextAssigned => {
                lifecycle.set_application_context(&self.application_context());
                Ok(())
            }
            LifecyclePhase::PostConstruct => lifecycle.post_construct(),
            LifecyclePhase::PropertiesSet => lifecycle.after_properties_set(),
            LifecyclePhase::PreDestroy => lifecycle.pre_destroy(),
            LifecyclePhase::Dispose => lifecycle.destroy(),
            _ => Ok(()),
        }
    }

    fn invoke_post_processors(
        &self,
        instance: &ManagedInstance,
        phase: LifecyclePhase,
    ) -> CallbackResult {
        for processor in &self.inner.post_processors {
            let result = if phase == LifecyclePhase::BeforeInitialization {
                processor.before_initialization(instance)
            } else {
                processor.after_initialization(instance)
            };
            result.map_err(|e| format!("{}: {}", processor.name(), e))?;
        }
        Ok(())
    }

    fn emit(&self, instance: &ManagedInstance, phase: LifecyclePhase) {
        tracing::trace!(
            component = instance.name(),
            instance = %instance.id(),
            phase = %phase,
            "lifecycle phase"
        );
        if self.inner.observers.has_observers() {
            self.inner.observers.phase(&LifecycleEvent {
                name: instance.name(),
                scope: instance.scope(),
                instance: instance.id(),
                phase,
            });
        }
    }
}
