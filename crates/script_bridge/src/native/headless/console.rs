// Console commands and variables kept by the headless engine

use std::collections::HashMap;

use crate::console::{ConsoleFlags, ConsoleValue};
use crate::native::{ConsoleBackend, NativeHandle};

use super::HeadlessEngine;

/// Command line passed to [`ConsoleBackend::execute_string`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedCommand {
    /// Line as passed
    pub line: String,
    /// Output suppressed
    pub silent: bool,
    /// Run at the start of the next frame
    pub deferred: bool,
}

struct VariableRecord {
    name: String,
    value: ConsoleValue,
    flags: ConsoleFlags,
}

#[derive(Default)]
pub(super) struct ConsoleState {
    commands: Vec<(String, ConsoleFlags)>,
    native_commands: Vec<String>,
    executed: Vec<ExecutedCommand>,
    variables: HashMap<NativeHandle, VariableRecord>,
}

impl ConsoleState {
    fn has_command(&self, name: &str) -> bool {
        self.commands
            .iter()
            .map(|(command, _)| command)
            .chain(&self.native_commands)
            .any(|command| command.eq_ignore_ascii_case(name))
    }

    fn find_variable(&self, name: &str) -> Option<NativeHandle> {
        self.variables
            .iter()
            .find(|(_, record)| record.name.eq_ignore_ascii_case(name))
            .map(|(handle, _)| *handle)
    }
}

impl HeadlessEngine {
    /// Add a command the engine itself owns
    pub fn add_native_command(&self, name: &str) {
        self.console.lock().native_commands.push(name.to_string());
    }

    /// Commands added through [`ConsoleBackend::add_command`], in order
    pub fn console_commands(&self) -> Vec<(String, ConsoleFlags)> {
        self.console.lock().commands.clone()
    }

    /// Every command line executed so far
    pub fn executed_commands(&self) -> Vec<ExecutedCommand> {
        self.console.lock().executed.clone()
    }
}

impl ConsoleBackend for HeadlessEngine {
    fn add_command(&self, name: &str, _help: &str, flags: ConsoleFlags) -> bool {
        let mut console = self.console.lock();
        if name.is_empty() || console.has_command(name) {
            return false;
        }
        console.commands.push((name.to_string(), flags));
        true
    }

    fn remove_command(&self, name: &str) {
        self.console
            .lock()
            .commands
            .retain(|(command, _)| !command.eq_ignore_ascii_case(name));
    }

    fn execute_string(&self, command: &str, silent: bool, deferred: bool) {
        log::debug!("Executing `{command}` (silent: {silent}, deferred: {deferred})");
        self.console.lock().executed.push(ExecutedCommand {
            line: command.to_string(),
            silent,
            deferred,
        });
    }

    fn register_variable(
        &self,
        name: &str,
        value: &ConsoleValue,
        flags: ConsoleFlags,
        _help: &str,
    ) -> Option<NativeHandle> {
        let mut console = self.console.lock();
        if name.is_empty() || console.find_variable(name).is_some() {
            log::warn!("Console variable `{name}` cannot be registered");
            return None;
        }

        let handle = self.allocate_handle();
        console.variables.insert(
            handle,
            VariableRecord {
                name: name.to_string(),
                value: value.clone(),
                flags,
            },
        );
        Some(handle)
    }

    fn unregister_variable(&self, name: &str, delete: bool) {
        let mut console = self.console.lock();
        if let Some(handle) = console.find_variable(name) {
            console.variables.remove(&handle);
            log::debug!("Unregistered console variable {name} (delete: {delete})");
        }
    }

    fn find_variable(&self, name: &str) -> Option<NativeHandle> {
        self.console.lock().find_variable(name)
    }

    fn variable_name(&self, variable: NativeHandle) -> Option<String> {
        self.console
            .lock()
            .variables
            .get(&variable)
            .map(|record| record.name.clone())
    }

    fn variable_value(&self, variable: NativeHandle) -> Option<ConsoleValue> {
        self.console
            .lock()
            .variables
            .get(&variable)
            .map(|record| record.value.clone())
    }

    fn set_variable_value(&self, variable: NativeHandle, value: &ConsoleValue) -> bool {
        let mut console = self.console.lock();
        let Some(record) = console.variables.get_mut(&variable) else {
            return false;
        };
        if record.flags.contains(ConsoleFlags::READ_ONLY) || record.value.kind() != value.kind() {
            return false;
        }
        record.value = value.clone();
        true
    }
}
