//! Command dispatcher.
//!
//! Decodes one message, routes it to create, update or delete, and renders
//! the reply text. Owns the registry and the injected scene host for the
//! lifetime of one scene session.

use tracing::{error, info, warn};

use crate::{
    apply::{apply_all, ApplyReport, LocationBounds},
    config::{IdStrategy, ServerConfig},
    error::{CommandError, HostError, RegistryError},
    host::{EntityHandle, SceneHost},
    protocol::{decode_message, Command, ObjectId, ObjectPayload},
    registry::Registry,
};

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq)]
pub struct Applied {
    pub id: ObjectId,
    pub report: ApplyReport,
}

pub struct Dispatcher<H> {
    host: H,
    registry: Registry,
    bounds: LocationBounds,
}

impl<H: SceneHost> Dispatcher<H> {
    pub fn new(host: H, strategy: IdStrategy, bounds: LocationBounds) -> Self {
        Self {
            host,
            registry: Registry::new(strategy),
            bounds,
        }
    }

    pub fn from_config(host: H, cfg: &ServerConfig) -> Self {
        Self::new(
            host,
            cfg.id_strategy,
            LocationBounds::new(cfg.location_min, cfg.location_max),
        )
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Ends the session: drops every registry entry and hands the host back.
    /// Entities stay with the host, which owns them.
    pub fn teardown(mut self) -> H {
        let dropped = self.registry.clear();
        info!(entries = dropped.len(), "Registry torn down");
        self.host
    }

    /// Handles one raw message and returns the reply text. Never panics on
    /// client input.
    pub fn handle_message(&mut self, bytes: &[u8]) -> String {
        match decode_message(bytes).and_then(|msg| msg.into_command()) {
            Ok(cmd) => self.respond(cmd),
            Err(e) => {
                warn!(error = %e, "Rejected message");
                e.response()
            }
        }
    }

    /// Executes a routed command and renders the reply text.
    pub fn respond(&mut self, cmd: Command) -> String {
        let kind = cmd.kind();
        match self.execute(cmd) {
            Ok(done) => done.id.to_string(),
            Err(e) => {
                if e.is_client_fault() {
                    warn!(command = kind, error = %e, "Command rejected");
                } else {
                    error!(command = kind, error = %e, "Command failed");
                }
                e.response()
            }
        }
    }

    pub fn execute(&mut self, cmd: Command) -> Result<Applied, CommandError> {
        match cmd {
            Command::Create(payload) => self.create(&payload),
            Command::Update(id, payload) => self.update(&id, &payload),
            Command::Delete(id) => self.delete(&id).map(|()| Applied {
                id,
                report: ApplyReport::default(),
            }),
        }
    }

    /// Spawns a new entity, applies the payload and registers it.
    pub fn create(&mut self, payload: &ObjectPayload) -> Result<Applied, CommandError> {
        self.ensure_available()?;
        let id = self.registry.next_id();
        if self.registry.strategy() == IdStrategy::RegistrySize
            && id.as_str() != self.registry.len().to_string()
        {
            warn!(
                object_id = %id,
                entries = self.registry.len(),
                "Size-derived id is live, realigned"
            );
        }

        let handle = self.host.spawn_entity().map_err(|e| {
            error!(object_id = %id, error = %e, "Failed to spawn object");
            CommandError::Spawn(e)
        })?;
        info!(object_id = %id, %handle, "Spawned new object");

        let report = apply_all(&mut self.host, handle, payload, self.bounds);

        if let Err(RegistryError::Occupied(taken)) = self.registry.insert(id.clone(), handle) {
            self.destroy_quietly(handle);
            return Err(CommandError::IdInUse(taken));
        }
        Ok(Applied { id, report })
    }

    /// Applies the payload to an existing object.
    pub fn update(&mut self, id: &ObjectId, payload: &ObjectPayload) -> Result<Applied, CommandError> {
        let handle = self.live_handle(id)?;
        let report = apply_all(&mut self.host, handle, payload, self.bounds);
        info!(object_id = %id, %handle, failures = report.failures(), "Object updated");
        Ok(Applied {
            id: id.clone(),
            report,
        })
    }

    /// Destroys the entity and removes its entry. The entry is removed even
    /// when the host reports a destroy failure.
    pub fn delete(&mut self, id: &ObjectId) -> Result<(), CommandError> {
        let handle = self.live_handle(id)?;
        self.destroy_quietly(handle);
        self.registry.remove(id.as_str());
        info!(object_id = %id, %handle, "Object deleted");
        Ok(())
    }

    /// Looks up `id`, dropping the entry if the host no longer has the entity.
    fn live_handle(&mut self, id: &ObjectId) -> Result<EntityHandle, CommandError> {
        self.ensure_available()?;
        let handle = self
            .registry
            .find(id.as_str())
            .ok_or_else(|| CommandError::NotFound(id.clone()))?;
        if !self.host.is_alive(handle) {
            warn!(object_id = %id, %handle, "Dropping stale registry entry");
            self.registry.remove(id.as_str());
            return Err(CommandError::NotFound(id.clone()));
        }
        Ok(handle)
    }

    fn ensure_available(&self) -> Result<(), CommandError> {
        if self.host.is_available() {
            Ok(())
        } else {
            Err(HostError::WorldUnavailable.into())
        }
    }

    fn destroy_quietly(&mut self, handle: EntityHandle) {
        if let Err(e) = self.host.destroy_entity(handle) {
            warn!(%handle, error = %e, "Host failed to destroy entity");
        }
    }
}
