//! Managed end of the native UI event system
//!
//! The router remembers which event systems it attached to in each
//! direction, forwards outgoing events to the [`UiBackend`] and fans
//! incoming events out to its subscribers in subscription order.

use std::sync::Arc;

use crate::config::UiConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::events::{HandlerId, HandlerList};
use crate::native::UiBackend;
use crate::ui::events::{
    UiEventArgs, UiEventDescription, UiEventDirection, UiParameterDescription, UiParameterType,
    UiValue,
};

/// Subscriber callback for incoming events
pub type UiEventHandler = dyn FnMut(&UiEventArgs);

/// An event the router registered with native code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredUiEvent {
    /// Event system the event belongs to
    pub system: String,
    /// Direction it was registered for
    pub direction: UiEventDirection,
    /// Event name
    pub name: String,
    /// Id native code assigned
    pub id: i32,
}

/// Kind of member that exposes a port of a declared event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiPortKind {
    /// Called by the UI, makes the category listen in the to-system direction
    Method,
    /// Pushed to the UI, makes the event a to-UI event
    Field,
}

/// One port of a declared event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiPort {
    /// Port name
    pub name: String,
    /// Tooltip text
    pub description: String,
    /// Member kind
    pub kind: UiPortKind,
}

impl UiPort {
    /// Method port
    pub fn method(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: UiPortKind::Method,
        }
    }

    /// Field port
    pub fn field(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: UiPortKind::Field,
        }
    }
}

/// Explicit declaration of a scripted UI event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiEventDeclaration {
    /// Event name
    pub name: String,
    /// Tooltip text
    pub description: String,
    /// Event system the event is registered in
    pub category: String,
    /// Ports in declaration order
    pub ports: Vec<UiPort>,
}

impl UiEventDeclaration {
    /// Declaration without ports
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category: category.into(),
            ports: Vec::new(),
        }
    }

    /// Append a port
    #[must_use]
    pub fn with_port(mut self, port: UiPort) -> Self {
        self.ports.push(port);
        self
    }
}

/// Bidirectional named-event channel to native UI
pub struct UiEventRouter {
    backend: Arc<dyn UiBackend>,
    config: UiConfig,
    to_system: Vec<String>,
    to_ui: Vec<String>,
    events: Vec<RegisteredUiEvent>,
    handlers: HandlerList<UiEventHandler>,
}

impl UiEventRouter {
    /// Router talking to `backend`
    pub fn new(backend: Arc<dyn UiBackend>, config: UiConfig) -> Self {
        Self {
            backend,
            config,
            to_system: Vec::new(),
            to_ui: Vec::new(),
            events: Vec::new(),
            handlers: HandlerList::new(),
        }
    }

    /// Attach to an event system; repeated calls for the same direction do not reach native code
    pub fn register_to_event_system(&mut self, system: &str, direction: UiEventDirection) -> bool {
        if self.systems(direction).iter().any(|s| s == system) {
            return true;
        }
        if !self.backend.register_to_event_system(system, direction) {
            log::warn!("Native code refused to attach to event system {system} ({direction:?})");
            return false;
        }

        log::debug!("Attached to event system {system} ({direction:?})");
        self.systems_mut(direction).push(system.to_string());
        true
    }

    /// Detach from an event system
    pub fn unregister(&mut self, system: &str, direction: UiEventDirection) {
        let systems = self.systems_mut(direction);
        let before = systems.len();
        systems.retain(|s| s != system);
        if systems.len() == before {
            return;
        }

        self.backend.unregister_from_event_system(system, direction);
        self.events
            .retain(|event| event.system != system || event.direction != direction);
        log::debug!("Detached from event system {system} ({direction:?})");
    }

    /// Whether the router is attached to `system` in `direction`
    pub fn is_registered(&self, system: &str, direction: UiEventDirection) -> bool {
        self.systems(direction).iter().any(|s| s == system)
    }

    /// Register an event and return the id native code assigned
    pub fn register_event(
        &mut self,
        system: &str,
        direction: UiEventDirection,
        description: &UiEventDescription,
    ) -> BridgeResult<i32> {
        require_system(system)?;

        let id = self.backend.register_event(system, direction, description);
        if id < 0 {
            return Err(BridgeError::Native(format!(
                "Registration of UI event {}.{} failed",
                system, description.name
            )));
        }

        log::info!("Registered UI event {system}.{} with id {id}", description.name);
        self.events.push(RegisteredUiEvent {
            system: system.to_string(),
            direction,
            name: description.name.clone(),
            id,
        });
        Ok(id)
    }

    /// Events registered so far
    pub fn registered_events(&self) -> &[RegisteredUiEvent] {
        &self.events
    }

    /// Register a declared event, attaching its category in every direction its ports need
    ///
    /// Fails without registering the event when native code refuses one of
    /// the attachments.
    pub fn declare(&mut self, declaration: &UiEventDeclaration) -> BridgeResult<i32> {
        let mut description = UiEventDescription::new(
            declaration.name.as_str(),
            declaration.name.as_str(),
            declaration.description.as_str(),
        );
        let mut direction = UiEventDirection::ToSystem;

        for port in &declaration.ports {
            let port_direction = match port.kind {
                UiPortKind::Method => UiEventDirection::ToSystem,
                UiPortKind::Field => {
                    direction = UiEventDirection::ToUi;
                    UiEventDirection::ToUi
                }
            };
            if !self.register_to_event_system(&declaration.category, port_direction) {
                return Err(BridgeError::Native(format!(
                    "Could not attach to event system {} ({port_direction:?}) for event {}",
                    declaration.category, declaration.name
                )));
            }
            description.params.push(UiParameterDescription::new(
                port.name.as_str(),
                port.name.as_str(),
                port.description.as_str(),
                UiParameterType::String,
            ));
        }

        self.register_event(&declaration.category, direction, &description)
    }

    /// Raise an event by id
    pub fn send_event(&self, system: &str, event_id: i32, args: &[UiValue]) -> BridgeResult<()> {
        require_system(system)?;
        self.backend.send_event(system, event_id, args);
        Ok(())
    }

    /// Raise an event by name
    pub fn send_named_event(&self, system: &str, event_name: &str, args: &[UiValue]) -> BridgeResult<()> {
        require_system(system)?;
        if event_name.is_empty() {
            return Err(BridgeError::argument("event_name", "Event name cannot be empty."));
        }
        self.backend.send_named_event(system, event_name, args);
        Ok(())
    }

    /// Receive incoming events
    pub fn subscribe(&mut self, handler: Box<UiEventHandler>) -> HandlerId {
        self.handlers.add(handler)
    }

    /// Stop receiving incoming events
    pub fn unsubscribe(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id)
    }

    /// Native entry point for events raised by the UI
    pub fn on_event(&mut self, system: &str, event_name: &str, event_id: i32, args: Vec<UiValue>) {
        let event = UiEventArgs {
            system: system.to_string(),
            event_name: event_name.to_string(),
            event_id,
            args,
        };

        log::info!("Event: {system}.{event_name} = {event_id}");
        if self.config.log_event_arguments {
            let count = event.args.len();
            for (index, arg) in event.args.iter().enumerate() {
                log::info!("Arg {}/{count}: {} {arg}", index + 1, arg.type_name());
            }
        }

        for handler in self.handlers.iter_mut() {
            handler(&event);
        }
    }

    /// Detach from every event system
    pub fn shutdown(&mut self) {
        for direction in [UiEventDirection::ToSystem, UiEventDirection::ToUi] {
            for system in std::mem::take(self.systems_mut(direction)) {
                self.backend.unregister_from_event_system(&system, direction);
            }
        }
        self.events.clear();
        self.handlers.clear();
    }

    fn systems(&self, direction: UiEventDirection) -> &Vec<String> {
        match direction {
            UiEventDirection::ToSystem => &self.to_system,
            UiEventDirection::ToUi => &self.to_ui,
        }
    }

    fn systems_mut(&mut self, direction: UiEventDirection) -> &mut Vec<String> {
        match direction {
            UiEventDirection::ToSystem => &mut self.to_system,
            UiEventDirection::ToUi => &mut self.to_ui,
        }
    }
}

fn require_system(system: &str) -> BridgeResult<()> {
    if system.is_empty() {
        return Err(BridgeError::argument("system", "Event system name cannot be empty."));
    }
    Ok(())
}
