//! Managed end of the native console
//!
//! Commands registered here are added to the native console; when one of
//! them is typed, native code hands the whole command line back through
//! [`Console::execute_managed_command`], which tokenizes it and calls the
//! matching handler. Console variables live in native memory and are
//! reached through [`ConsoleVariable`] handles.

pub mod variable;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::ConsoleConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::native::{ConsoleBackend, NativeHandle};

pub use variable::{ConsoleFlags, ConsoleValue, ConsoleValueKind, ConsoleVariable};

/// Handler of a managed console command
pub type ConsoleCommandHandler = dyn FnMut(&ConsoleCommandArgs) -> BridgeResult<()>;

/// Callback run when native code reports a changed variable
pub type VariableChangeHandler = dyn FnMut(&ConsoleVariable);

/// Tokenized command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleCommandArgs {
    /// Line as typed
    pub command_line: String,
    /// Command name followed by its arguments
    tokens: Vec<String>,
}

impl ConsoleCommandArgs {
    /// Split a command line on whitespace; double quotes group words
    ///
    /// Returns `None` for a blank line.
    pub fn parse(command_line: &str) -> Option<Self> {
        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut quoted = false;
        let mut pending = false;

        for c in command_line.chars() {
            match c {
                '"' => {
                    quoted = !quoted;
                    pending = true;
                }
                c if c.is_whitespace() && !quoted => {
                    if pending {
                        tokens.push(std::mem::take(&mut current));
                        pending = false;
                    }
                }
                c => {
                    current.push(c);
                    pending = true;
                }
            }
        }
        if pending {
            tokens.push(current);
        }

        if tokens.is_empty() {
            return None;
        }
        Some(Self {
            command_line: command_line.to_string(),
            tokens,
        })
    }

    /// Command name
    pub fn name(&self) -> &str {
        &self.tokens[0]
    }

    /// Argument at `index`, not counting the command name
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.tokens.get(index + 1).map(String::as_str)
    }

    /// Arguments, not counting the command name
    pub fn args(&self) -> &[String] {
        &self.tokens[1..]
    }
}

struct Watch {
    variable: ConsoleVariable,
    handler: Box<VariableChangeHandler>,
}

/// Commands and variables registered from managed code
pub struct Console {
    backend: Arc<dyn ConsoleBackend>,
    config: ConsoleConfig,
    commands: HashMap<String, Box<ConsoleCommandHandler>>,
    watches: HashMap<NativeHandle, Watch>,
}

impl Console {
    /// Console talking to `backend`
    pub fn new(backend: Arc<dyn ConsoleBackend>, config: ConsoleConfig) -> Self {
        Self {
            backend,
            config,
            commands: HashMap::new(),
            watches: HashMap::new(),
        }
    }

    /// Add a command to the native console; blank help falls back to the configured text
    pub fn register_command(
        &mut self,
        name: &str,
        help: &str,
        flags: ConsoleFlags,
        handler: Box<ConsoleCommandHandler>,
    ) -> BridgeResult<()> {
        require_name("name", name, "Name of the command cannot be empty.")?;
        if self.commands.contains_key(name) {
            return Err(BridgeError::Registration(format!(
                "Console command {name} is already registered"
            )));
        }

        let help = if help.trim().is_empty() {
            self.config.default_help.as_str()
        } else {
            help
        };
        if !self.backend.add_command(name, help, flags) {
            return Err(BridgeError::Native(format!(
                "Native console refused the command {name}"
            )));
        }

        log::info!("Registered console command {name}");
        self.commands.insert(name.to_string(), handler);
        Ok(())
    }

    /// Remove a command, returning whether it was registered here
    pub fn unregister_command(&mut self, name: &str) -> bool {
        if self.commands.remove(name).is_none() {
            return false;
        }
        self.backend.remove_command(name);
        log::debug!("Unregistered console command {name}");
        true
    }

    /// Whether a managed command named `name` exists
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Run a command line through the native console
    pub fn execute(&self, command: &str, silent: bool, deferred: bool) -> BridgeResult<()> {
        require_name("command", command, "Name of the command to execute cannot be empty.")?;
        self.backend.execute_string(command, silent, deferred);
        Ok(())
    }

    /// Native entry point for managed commands typed into the console
    ///
    /// Returns whether a handler ran. Handler failures are logged and
    /// stay on the managed side.
    pub fn execute_managed_command(&mut self, command_line: &str) -> bool {
        let Some(args) = ConsoleCommandArgs::parse(command_line) else {
            return false;
        };
        if self.config.log_commands {
            log::info!("Console: {command_line}");
        } else {
            log::debug!("Console: {command_line}");
        }

        let Some(handler) = self.commands.get_mut(args.name()) else {
            log::warn!("No managed handler for console command {}", args.name());
            return false;
        };
        if let Err(e) = handler(&args) {
            log::error!("Console command {} failed: {e}", args.name());
        }
        true
    }

    /// Register a console variable
    pub fn register_variable(
        &mut self,
        name: &str,
        value: impl Into<ConsoleValue>,
        flags: ConsoleFlags,
        help: &str,
    ) -> BridgeResult<ConsoleVariable> {
        require_name("name", name, "Cannot register a console variable using an empty name.")?;
        let value = value.into();

        let handle = self
            .backend
            .register_variable(name, &value, flags, help)
            .ok_or_else(|| {
                BridgeError::Registration(format!("Console variable {name} could not be registered"))
            })?;
        log::info!("Registered console variable {name} = {value}");
        Ok(ConsoleVariable::new(
            self.backend.clone(),
            handle,
            name,
            value.kind(),
        ))
    }

    /// Register a console variable and call `on_change` whenever native code changes it
    pub fn register_watched_variable(
        &mut self,
        name: &str,
        value: impl Into<ConsoleValue>,
        flags: ConsoleFlags,
        help: &str,
        on_change: Box<VariableChangeHandler>,
    ) -> BridgeResult<ConsoleVariable> {
        let variable = self.register_variable(name, value, flags, help)?;
        self.watches.insert(
            variable.handle(),
            Watch {
                variable: variable.clone(),
                handler: on_change,
            },
        );
        Ok(variable)
    }

    /// Native entry point for variable change notifications
    pub fn variable_changed(&mut self, variable: NativeHandle) {
        match self.watches.get_mut(&variable) {
            Some(watch) => (watch.handler)(&watch.variable),
            None => log::trace!("Change of unwatched console variable {variable}"),
        }
    }

    /// Unregister a console variable; `delete` also frees it in native memory
    pub fn unregister_variable(&mut self, name: &str, delete: bool) -> BridgeResult<()> {
        require_name(
            "name",
            name,
            "Name of the console variable to unregister cannot be empty.",
        )?;
        self.watches.retain(|_, watch| watch.variable.name() != name);
        self.backend.unregister_variable(name, delete);
        Ok(())
    }

    /// Variable registered under `name`, by managed or native code
    pub fn variable(&self, name: &str) -> BridgeResult<Option<ConsoleVariable>> {
        require_name("name", name, "Cannot get a console variable using an empty name.")?;
        let Some(handle) = self.backend.find_variable(name) else {
            return Ok(None);
        };
        let value = self.backend.variable_value(handle).ok_or_else(|| {
            BridgeError::Native(format!("Console variable {name} has no value"))
        })?;
        let name = self
            .backend
            .variable_name(handle)
            .unwrap_or_else(|| name.to_string());
        Ok(Some(ConsoleVariable::new(
            self.backend.clone(),
            handle,
            name,
            value.kind(),
        )))
    }

    /// Remove every managed command from the native console
    pub fn shutdown(&mut self) {
        for name in self.commands.keys() {
            self.backend.remove_command(name);
        }
        self.commands.clear();
        self.watches.clear();
    }
}

fn require_name(argument: &'static str, value: &str, message: &str) -> BridgeResult<()> {
    if value.trim().is_empty() {
        return Err(BridgeError::argument(argument, message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::headless::HeadlessEngine;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn console() -> (Arc<HeadlessEngine>, Console) {
        let engine = Arc::new(HeadlessEngine::new());
        let console = Console::new(engine.clone(), ConsoleConfig::default());
        (engine, console)
    }

    #[test]
    fn test_tokenize_command_line() {
        let args = ConsoleCommandArgs::parse("  spawn  \"Supply Crate\" 3 \"\"").unwrap();
        assert_eq!(args.name(), "spawn");
        assert_eq!(args.args(), ["Supply Crate", "3", ""]);
        assert_eq!(args.arg(1), Some("3"));
        assert_eq!(args.arg(3), None);
        assert!(ConsoleCommandArgs::parse("   ").is_none());
    }

    #[test]
    fn test_managed_command_dispatch() {
        let (engine, mut console) = console();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        console
            .register_command(
                "give",
                "Give an item",
                ConsoleFlags::CHEAT,
                Box::new(move |args: &ConsoleCommandArgs| -> BridgeResult<()> {
                    sink.borrow_mut().push(args.args().join("|"));
                    Ok(())
                }),
            )
            .unwrap();

        assert_eq!(engine.console_commands(), vec![("give".to_string(), ConsoleFlags::CHEAT)]);
        assert!(console.execute_managed_command("give ammo 30"));
        assert!(!console.execute_managed_command("take ammo"));
        assert!(!console.execute_managed_command(""));
        assert_eq!(*seen.borrow(), vec!["ammo|30"]);
    }

    #[test]
    fn test_failing_handler_stays_managed() {
        let (_, mut console) = console();
        console
            .register_command(
                "explode",
                "",
                ConsoleFlags::empty(),
                Box::new(|_: &ConsoleCommandArgs| -> BridgeResult<()> {
                    Err(BridgeError::Native("boom".to_string()))
                }),
            )
            .unwrap();
        assert!(console.execute_managed_command("explode"));
    }

    #[test]
    fn test_command_registration_errors() {
        let (engine, mut console) = console();
        let noop = || -> Box<ConsoleCommandHandler> {
            Box::new(|_: &ConsoleCommandArgs| -> BridgeResult<()> { Ok(()) })
        };

        assert!(matches!(
            console.register_command(" ", "", ConsoleFlags::empty(), noop()),
            Err(BridgeError::Argument { argument: "name", .. })
        ));
        console
            .register_command("quit", "", ConsoleFlags::empty(), noop())
            .unwrap();
        assert!(matches!(
            console.register_command("quit", "", ConsoleFlags::empty(), noop()),
            Err(BridgeError::Registration(_))
        ));

        engine.add_native_command("map");
        assert!(matches!(
            console.register_command("map", "", ConsoleFlags::empty(), noop()),
            Err(BridgeError::Native(_))
        ));
        assert!(!console.has_command("map"));
    }

    #[test]
    fn test_execute_and_unregister() {
        let (engine, mut console) = console();
        console
            .register_command(
                "kill",
                "",
                ConsoleFlags::empty(),
                Box::new(|_: &ConsoleCommandArgs| -> BridgeResult<()> { Ok(()) }),
            )
            .unwrap();

        console.execute("kill", true, false).unwrap();
        assert!(matches!(
            console.execute("", false, false),
            Err(BridgeError::Argument { argument: "command", .. })
        ));
        assert_eq!(engine.executed_commands().len(), 1);
        assert!(engine.executed_commands()[0].silent);

        assert!(console.unregister_command("kill"));
        assert!(!console.unregister_command("kill"));
        assert!(engine.console_commands().is_empty());
    }

    #[test]
    fn test_variables() {
        let (_, mut console) = console();
        let gravity = console
            .register_variable("g_gravity", -9.81f32, ConsoleFlags::empty(), "Gravity")
            .unwrap();
        let lives = console
            .register_variable("g_lives", 3, ConsoleFlags::READ_ONLY, "")
            .unwrap();

        assert_eq!(gravity.value().unwrap(), ConsoleValue::Float(-9.81));
        gravity.set_text("-1.5").unwrap();
        assert_eq!(gravity.value().unwrap(), ConsoleValue::Float(-1.5));
        assert!(matches!(gravity.set(2), Err(BridgeError::Argument { .. })));
        assert!(matches!(lives.set(5), Err(BridgeError::Native(_))));

        let found = console.variable("g_gravity").unwrap().unwrap();
        assert_eq!(found.handle(), gravity.handle());
        assert_eq!(found.kind(), ConsoleValueKind::Float);
        assert!(console.variable("g_missing").unwrap().is_none());
        assert!(console.variable("").is_err());

        assert!(matches!(
            console.register_variable("g_lives", 1, ConsoleFlags::empty(), ""),
            Err(BridgeError::Registration(_))
        ));

        console.unregister_variable("g_gravity", true).unwrap();
        assert!(gravity.value().unwrap_err().is_invalid_state());
        assert!(console.unregister_variable("", false).is_err());
    }

    #[test]
    fn test_change_notifications() {
        let (engine, mut console) = console();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let name = console
            .register_watched_variable(
                "sv_name",
                "lobby",
                ConsoleFlags::empty(),
                "",
                Box::new(move |variable: &ConsoleVariable| {
                    sink.borrow_mut().push(variable.value().unwrap().to_string());
                }),
            )
            .unwrap();

        assert!(engine.set_variable_value(name.handle(), &ConsoleValue::from("arena")));
        console.variable_changed(name.handle());
        assert_eq!(*seen.borrow(), vec!["arena"]);

        console.unregister_variable("sv_name", false).unwrap();
        console.variable_changed(name.handle());
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_shutdown_removes_commands() {
        let (engine, mut console) = console();
        for name in ["a", "b"] {
            console
                .register_command(
                    name,
                    "",
                    ConsoleFlags::empty(),
                    Box::new(|_: &ConsoleCommandArgs| -> BridgeResult<()> { Ok(()) }),
                )
                .unwrap();
        }
        console.shutdown();
        assert!(engine.console_commands().is_empty());
        assert!(!console.has_command("a"));
    }
}
