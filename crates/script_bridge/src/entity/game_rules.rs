//! Game rule sets: named entity classes with aliases and level folders

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{BridgeError, BridgeResult};
use crate::native::ClassRegistrar;

/// Declaration of one game rule set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRulesClass {
    /// Name the rule set is registered under
    pub name: String,
    /// Name of the entity class that implements it
    pub type_name: String,
    /// Other names the rule set goes by
    pub aliases: Vec<String>,
    /// Folders where levels supporting this rule set live
    pub level_locations: Vec<String>,
}

impl GameRulesClass {
    /// Rule set `name` implemented by entity class `type_name`
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            aliases: Vec::new(),
            level_locations: Vec::new(),
        }
    }

    /// Add an alias; blank aliases are ignored
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        push_non_blank(&mut self.aliases, alias.into());
        self
    }

    /// Add a level folder; blank paths are ignored
    #[must_use]
    pub fn with_level_location(mut self, path: impl Into<String>) -> Self {
        push_non_blank(&mut self.level_locations, path.into());
        self
    }
}

fn push_non_blank(list: &mut Vec<String>, value: String) {
    if !value.trim().is_empty() {
        list.push(value);
    }
}

fn require_non_empty(argument: &'static str, value: &str, message: &str) -> BridgeResult<()> {
    if value.is_empty() {
        return Err(BridgeError::argument(argument, message));
    }
    Ok(())
}

fn known_mut<'a>(
    rules: &'a mut HashMap<String, GameRulesClass>,
    game_rules: &str,
) -> BridgeResult<&'a mut GameRulesClass> {
    rules
        .get_mut(game_rules)
        .ok_or_else(|| BridgeError::Registration(format!("Unknown game rules {game_rules}")))
}

/// Registered game rule sets, mirrored to native code
pub struct GameRulesCatalog {
    registrar: Arc<dyn ClassRegistrar>,
    rules: HashMap<String, GameRulesClass>,
    current: Option<String>,
}

impl GameRulesCatalog {
    /// Empty catalog forwarding to `registrar`
    pub fn new(registrar: Arc<dyn ClassRegistrar>) -> Self {
        Self {
            registrar,
            rules: HashMap::new(),
            current: None,
        }
    }

    /// Declare a rule set; blank names are skipped like undeclared ones
    pub fn register(&mut self, rules: GameRulesClass) -> BridgeResult<bool> {
        if rules.name.trim().is_empty() {
            log::warn!("Skipping game rules of type {} with a blank name", rules.type_name);
            return Ok(false);
        }
        if self.rules.contains_key(&rules.name) {
            return Err(BridgeError::Registration(format!(
                "Game rules {} are already registered",
                rules.name
            )));
        }

        self.registrar.register_game_rules(
            &rules.name,
            &rules.type_name,
            &rules.aliases,
            &rules.level_locations,
        )?;
        log::info!(
            "Registered game rules {} ({} aliases, {} level locations)",
            rules.name,
            rules.aliases.len(),
            rules.level_locations.len()
        );
        self.rules.insert(rules.name.clone(), rules);
        Ok(true)
    }

    /// Add an alias to a registered rule set; unknown names are a registration error
    pub fn add_alias(&mut self, game_rules: &str, alias: &str) -> BridgeResult<()> {
        require_non_empty("game_rules", game_rules, "Game rule set name cannot be empty.")?;
        require_non_empty("alias", alias, "Alias cannot be empty.")?;
        let rules = known_mut(&mut self.rules, game_rules)?;

        self.registrar.add_game_rules_alias(game_rules, alias);
        rules.aliases.push(alias.to_string());
        Ok(())
    }

    /// Add a folder of levels that support a registered rule set
    pub fn add_level_location(&mut self, game_rules: &str, path: &str) -> BridgeResult<()> {
        require_non_empty("game_rules", game_rules, "Game rule set name cannot be empty.")?;
        require_non_empty("path", path, "Path cannot be empty.")?;
        let rules = known_mut(&mut self.rules, game_rules)?;

        self.registrar.add_game_rules_level_location(game_rules, path);
        rules.level_locations.push(path.to_string());
        Ok(())
    }

    /// Level folder by index, `None` when out of range
    pub fn level_location(&self, game_rules: &str, index: usize) -> Option<&str> {
        self.rules
            .get(game_rules)?
            .level_locations
            .get(index)
            .map(String::as_str)
    }

    /// Every level folder of a rule set
    pub fn level_locations(&self, game_rules: &str) -> &[String] {
        self.rules
            .get(game_rules)
            .map(|rules| rules.level_locations.as_slice())
            .unwrap_or_default()
    }

    /// Name of the rule set that goes by `alias`
    pub fn name_for_alias(&self, alias: &str) -> Option<&str> {
        if let Some(rules) = self.rules.get(alias) {
            return Some(&rules.name);
        }
        self.rules
            .values()
            .find(|rules| rules.aliases.iter().any(|a| a.eq_ignore_ascii_case(alias)))
            .map(|rules| rules.name.as_str())
    }

    /// Whether a rule set is registered under `game_rules`
    pub fn is_registered(&self, game_rules: &str) -> bool {
        self.rules.contains_key(game_rules)
    }

    /// Make a registered rule set (or one of its aliases) the current one
    pub fn set_current(&mut self, game_rules: &str) -> BridgeResult<()> {
        let name = self
            .name_for_alias(game_rules)
            .ok_or_else(|| BridgeError::Registration(format!("Unknown game rules {game_rules}")))?
            .to_string();
        log::info!("Current game rules set to {name}");
        self.current = Some(name);
        Ok(())
    }

    /// Name of the current rule set
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::headless::HeadlessEngine;

    fn catalog() -> (Arc<HeadlessEngine>, GameRulesCatalog) {
        let engine = Arc::new(HeadlessEngine::new());
        let catalog = GameRulesCatalog::new(engine.clone());
        (engine, catalog)
    }

    #[test]
    fn test_register_filters_blank_entries() {
        let (engine, mut catalog) = catalog();
        let rules = GameRulesClass::new("DeathMatch", "DeathMatchRules")
            .with_alias("dm")
            .with_alias("   ")
            .with_level_location("levels/dm")
            .with_level_location("");

        assert!(catalog.register(rules).unwrap());
        assert!(catalog.is_registered("DeathMatch"));
        assert_eq!(catalog.level_locations("DeathMatch"), ["levels/dm".to_string()]);

        let declared = engine.registered_game_rules();
        assert_eq!(declared.len(), 1);
        assert_eq!(declared[0].aliases, vec!["dm".to_string()]);
    }

    #[test]
    fn test_blank_name_is_skipped() {
        let (engine, mut catalog) = catalog();
        assert!(!catalog.register(GameRulesClass::new(" ", "Nameless")).unwrap());
        assert!(engine.registered_game_rules().is_empty());
    }

    #[test]
    fn test_aliases_and_locations() {
        let (_, mut catalog) = catalog();
        catalog
            .register(GameRulesClass::new("Assault", "AssaultRules"))
            .unwrap();

        catalog.add_alias("Assault", "as").unwrap();
        catalog.add_level_location("Assault", "levels/assault").unwrap();

        assert_eq!(catalog.name_for_alias("AS"), Some("Assault"));
        assert_eq!(catalog.name_for_alias("Assault"), Some("Assault"));
        assert_eq!(catalog.name_for_alias("ctf"), None);
        assert_eq!(catalog.level_location("Assault", 0), Some("levels/assault"));
        assert_eq!(catalog.level_location("Assault", 1), None);

        catalog.set_current("as").unwrap();
        assert_eq!(catalog.current(), Some("Assault"));
    }

    #[test]
    fn test_unknown_rules_are_not_forwarded() {
        let (engine, mut catalog) = catalog();
        catalog
            .register(GameRulesClass::new("Assault", "AssaultRules"))
            .unwrap();

        assert!(matches!(
            catalog.add_alias("CaptureTheFlag", "ctf"),
            Err(BridgeError::Registration(_))
        ));
        assert!(matches!(
            catalog.add_level_location("CaptureTheFlag", "levels/ctf"),
            Err(BridgeError::Registration(_))
        ));

        let declared = engine.registered_game_rules();
        assert_eq!(declared.len(), 1);
        assert!(declared[0].aliases.is_empty());
        assert!(declared[0].level_locations.is_empty());
        assert_eq!(catalog.name_for_alias("ctf"), None);
    }

    #[test]
    fn test_empty_arguments_rejected() {
        let (_, mut catalog) = catalog();
        assert!(matches!(
            catalog.add_alias("", "x"),
            Err(BridgeError::Argument { argument: "game_rules", .. })
        ));
        assert!(matches!(
            catalog.add_level_location("Assault", ""),
            Err(BridgeError::Argument { argument: "path", .. })
        ));
    }
}
