use std::error::Error as StdError;
use std::sync::{Arc, Weak};

use async_trait::async_trait;

use crate::content::registry::{IdRange, RegistrySet};
use crate::host::constants::{HOST_NAME, HOST_VERSION};
use crate::package_system::descriptor::{DescriptorBuilder, PackageDescriptor, Side};
use crate::package_system::enabled::EnabledStore;
use crate::package_system::error::{LifecyclePhase, PackageSystemError};
use crate::package_system::version::parse_version;

/// Boxed error returned by package callbacks.
pub type RuntimeError = Box<dyn StdError + Send + Sync>;

/// The callbacks a package implements, declared at construction.
/// The orchestrator consults this set instead of inspecting the runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilitySet {
    pub load: bool,
    pub register_content: bool,
    pub post_setup: bool,
    pub unload: bool,
}

impl CapabilitySet {
    /// Every callback implemented.
    pub fn all() -> Self {
        Self {
            load: true,
            register_content: true,
            post_setup: true,
            unload: true,
        }
    }
}

/// Core trait an activated package implements.
///
/// Callbacks default to no-ops; the orchestrator only invokes the ones the
/// package declares in its [`CapabilitySet`].
#[async_trait]
pub trait PackageRuntime: Send + Sync {
    /// The declared capability set.
    fn capabilities(&self) -> CapabilitySet;

    /// Load phase: read bundled resources, register capability hooks.
    async fn load(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Register phase: reserve content ids. Counts only; backing storage is
    /// resized once after every package has registered.
    fn register_content(&self, _registries: &mut RegistrySet) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Finalize phase: every registry size is final; content registered by
    /// any other package may be referenced. Transient load-only resources
    /// should be released before returning.
    async fn post_setup(&self) -> Result<(), RuntimeError> {
        Ok(())
    }

    /// Teardown: release everything acquired during load.
    async fn unload(&self) -> Result<(), RuntimeError> {
        Ok(())
    }
}

/// Constructs runtime instances for resolved descriptors. This is the seam
/// to the external collaborator that turns a built package artifact into
/// executable content; the core never loads binaries itself.
#[async_trait]
pub trait InstanceFactory: Send + Sync {
    async fn instantiate(
        &self,
        descriptor: &Arc<PackageDescriptor>,
    ) -> Result<Arc<dyn PackageRuntime>, RuntimeError>;
}

/// Per-package lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseState {
    Unloaded,
    Instantiated,
    Loaded,
    ContentRegistered,
    SetupComplete,
    /// Absorbing: the package failed and the batch was aborted.
    Errored,
}

/// One activated package: phase state, runtime, and assigned id ranges.
pub struct RuntimeInstance {
    descriptor: Arc<PackageDescriptor>,
    runtime: Option<Arc<dyn PackageRuntime>>,
    state: PhaseState,
    id_ranges: Vec<(String, IdRange)>,
}

impl RuntimeInstance {
    pub fn descriptor(&self) -> &Arc<PackageDescriptor> {
        &self.descriptor
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    /// Content-id ranges assigned during the register phase, per registry key.
    pub fn id_ranges(&self) -> &[(String, IdRange)] {
        &self.id_ranges
    }
}

/// Built-in pseudo-package representing host-provided content. Declares no
/// callbacks; it exists so index 0 ranges belong to the host and teardown
/// accounting stays uniform.
struct HostRuntime;

#[async_trait]
impl PackageRuntime for HostRuntime {
    fn capabilities(&self) -> CapabilitySet {
        CapabilitySet::default()
    }
}

/// Drives load/unload batches through the multi-phase lifecycle.
///
/// Phases execute strictly sequentially in load order, one package at a
/// time. Activation is all-or-nothing: a failure in any phase marks the
/// package `Errored`, disables it persistently, tears the whole batch down,
/// and surfaces a structured [`PackageSystemError::LoadPhaseFailure`].
pub struct Orchestrator {
    factory: Arc<dyn InstanceFactory>,
    registries: RegistrySet,
    instances: Vec<RuntimeInstance>,
    host_descriptor: Arc<PackageDescriptor>,
}

impl Orchestrator {
    /// Create an orchestrator over the given factory and registry set.
    pub fn new(
        factory: Arc<dyn InstanceFactory>,
        registries: RegistrySet,
    ) -> Result<Self, PackageSystemError> {
        let host_version = parse_version(HOST_VERSION)?;
        let host_descriptor = Arc::new(
            DescriptorBuilder::new(HOST_NAME, host_version, Side::Both).build(),
        );
        Ok(Self {
            factory,
            registries,
            instances: Vec::new(),
            host_descriptor,
        })
    }

    /// Whether a batch is currently active.
    pub fn is_loaded(&self) -> bool {
        !self.instances.is_empty()
    }

    /// The active instances, in load order (host pseudo-package first).
    pub fn instances(&self) -> &[RuntimeInstance] {
        &self.instances
    }

    /// Names of the active packages, in load order.
    pub fn loaded_names(&self) -> Vec<String> {
        self.instances
            .iter()
            .map(|inst| inst.descriptor.name.clone())
            .collect()
    }

    pub fn registries(&self) -> &RegistrySet {
        &self.registries
    }

    /// Activate the given load order.
    pub async fn load_batch(
        &mut self,
        order: &[Arc<PackageDescriptor>],
        enabled: &mut EnabledStore,
    ) -> Result<(), PackageSystemError> {
        if self.is_loaded() {
            return Err(PackageSystemError::InternalError(
                "a batch is already active; unload it before loading again".to_string(),
            ));
        }

        // Phase 1: instantiate, host pseudo-package first.
        self.instances.push(RuntimeInstance {
            descriptor: self.host_descriptor.clone(),
            runtime: Some(Arc::new(HostRuntime)),
            state: PhaseState::Instantiated,
            id_ranges: Vec::new(),
        });
        for descriptor in order {
            match self.factory.instantiate(descriptor).await {
                Ok(runtime) => self.instances.push(RuntimeInstance {
                    descriptor: descriptor.clone(),
                    runtime: Some(runtime),
                    state: PhaseState::Instantiated,
                    id_ranges: Vec::new(),
                }),
                Err(cause) => {
                    self.instances.push(RuntimeInstance {
                        descriptor: descriptor.clone(),
                        runtime: None,
                        state: PhaseState::Errored,
                        id_ranges: Vec::new(),
                    });
                    let index = self.instances.len() - 1;
                    return Err(self
                        .fail_batch(index, LifecyclePhase::Instantiate, cause, enabled)
                        .await);
                }
            }
        }

        // Phase 2: load.
        for index in 0..self.instances.len() {
            let runtime = match self.instances[index].runtime.clone() {
                Some(runtime) => runtime,
                None => continue,
            };
            if runtime.capabilities().load {
                log::debug!("Loading package: {}", self.instances[index].descriptor.name);
                if let Err(cause) = runtime.load().await {
                    return Err(self
                        .fail_batch(index, LifecyclePhase::Load, cause, enabled)
                        .await);
                }
            }
            self.instances[index].state = PhaseState::Loaded;
        }

        // Phase 3: register content, then resize each registry exactly once.
        self.instances[0].id_ranges = self.registries.baseline_ranges();
        self.instances[0].state = PhaseState::ContentRegistered;
        for index in 1..self.instances.len() {
            let runtime = match self.instances[index].runtime.clone() {
                Some(runtime) => runtime,
                None => continue,
            };
            if runtime.capabilities().register_content {
                if let Err(cause) = runtime.register_content(&mut self.registries) {
                    return Err(self
                        .fail_batch(index, LifecyclePhase::Register, cause, enabled)
                        .await);
                }
                self.instances[index].id_ranges = self.registries.take_journal();
            }
            self.instances[index].state = PhaseState::ContentRegistered;
        }
        self.registries.resize_all();

        // Phase 4: finalize.
        for index in 0..self.instances.len() {
            let runtime = match self.instances[index].runtime.clone() {
                Some(runtime) => runtime,
                None => continue,
            };
            if runtime.capabilities().post_setup {
                if let Err(cause) = runtime.post_setup().await {
                    return Err(self
                        .fail_batch(index, LifecyclePhase::Finalize, cause, enabled)
                        .await);
                }
            }
            self.instances[index].state = PhaseState::SetupComplete;
        }

        log::info!("Activated {} package(s)", self.instances.len() - 1);
        Ok(())
    }

    /// Tear the active batch down in strict reverse load order. Unload
    /// callback errors are logged and aggregated, never short-circuited;
    /// registries are reset to baseline regardless.
    pub async fn unload_batch(&mut self) -> Result<(), PackageSystemError> {
        if !self.is_loaded() {
            return Ok(());
        }
        let errors = self.teardown().await;
        if errors.is_empty() {
            Ok(())
        } else {
            Err(PackageSystemError::InternalError(format!(
                "Errors during teardown: {}",
                errors.join("; ")
            )))
        }
    }

    /// Mark a failing package, disable it persistently, tear the batch down,
    /// and build the structured phase error.
    async fn fail_batch(
        &mut self,
        index: usize,
        phase: LifecyclePhase,
        cause: RuntimeError,
        enabled: &mut EnabledStore,
    ) -> PackageSystemError {
        self.instances[index].state = PhaseState::Errored;
        let descriptor = self.instances[index].descriptor.clone();
        if let Err(e) = enabled.disable(&descriptor.name) {
            log::warn!("Failed to persist disable for '{}': {}", descriptor.name, e);
        }
        log::error!(
            "{} phase failed for package '{}' (built for host {}): {}",
            phase,
            descriptor.name,
            descriptor.declared_host_version(),
            cause
        );
        self.teardown().await;
        PackageSystemError::LoadPhaseFailure {
            package: descriptor.name.clone(),
            phase,
            host_version: descriptor.declared_host_version(),
            source: cause,
        }
    }

    async fn teardown(&mut self) -> Vec<String> {
        let mut errors = Vec::new();
        for inst in self.instances.iter_mut().rev() {
            let reached_load = matches!(
                inst.state,
                PhaseState::Loaded | PhaseState::ContentRegistered | PhaseState::SetupComplete
            );
            if let Some(runtime) = inst.runtime.clone() {
                if reached_load && runtime.capabilities().unload {
                    log::debug!("Unloading package: {}", inst.descriptor.name);
                    if let Err(e) = runtime.unload().await {
                        let message = format!("{}: {}", inst.descriptor.name, e);
                        log::error!("Error unloading package {}", message);
                        errors.push(message);
                    }
                }
            }
            inst.state = PhaseState::Unloaded;
            inst.id_ranges.clear();
        }

        self.registries.reset_all();

        // Best-effort leak check: drop our references, then report runtimes
        // still reachable through surviving external references.
        let mut leak_checks: Vec<(String, Weak<dyn PackageRuntime>)> = Vec::new();
        for (index, inst) in self.instances.iter_mut().enumerate() {
            if let Some(runtime) = inst.runtime.take() {
                if index > 0 {
                    leak_checks.push((inst.descriptor.name.clone(), Arc::downgrade(&runtime)));
                }
            }
        }
        self.instances.clear();
        for (name, weak) in leak_checks {
            let holders = weak.strong_count();
            if holders > 0 {
                log::warn!(
                    "Package '{}' not fully unloaded: {} external holder(s) remain",
                    name,
                    holders
                );
            }
        }

        errors
    }
}
