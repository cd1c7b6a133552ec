// Entity classes used by the simulation session

use std::any::Any;

use script_bridge::entity::{
    EditableProperty, EditablePropertyType, EntityClass, EntityClassRegistry, EntityExtension,
    EntityLogic, PropertyAttribute, PropertyTable, ShadowInfo, SpawnParameters, SyncContext,
    UiControl, UpdateContext,
};
use script_bridge::foundation::math::Vec3;
use script_bridge::BridgeResult;

/// Destructible crate that loses integrity over time
pub struct SupplyCrate {
    pub health: i32,
    pub label: String,
    age: f32,
}

impl Default for SupplyCrate {
    fn default() -> Self {
        Self {
            health: 50,
            label: "supplies".to_string(),
            age: 0.0,
        }
    }
}

impl EntityLogic for SupplyCrate {
    fn update(&mut self, info: &ShadowInfo, context: &mut UpdateContext) -> BridgeResult<()> {
        self.age += context.frame_time;
        if self.age >= 1.0 {
            self.age -= 1.0;
            self.health = (self.health - 1).max(0);
            log::debug!("{} {} decays to {}", info.class_name(), info.id(), self.health);
        }
        Ok(())
    }

    fn reload(&mut self, _info: &ShadowInfo, parameters: &mut SpawnParameters) -> BridgeResult<bool> {
        // only intact crates go back into the pool
        Ok(self.health > 0 || parameters.property("health").is_some())
    }

    fn post_reload(&mut self, _info: &ShadowInfo, parameters: &mut SpawnParameters) -> BridgeResult<()> {
        if let Some(health) = parameters.property("health").and_then(|text| text.parse().ok()) {
            self.health = health;
        }
        self.age = 0.0;
        Ok(())
    }

    fn synchronize(&mut self, _info: &ShadowInfo, context: &mut dyn SyncContext) -> BridgeResult<()> {
        context.begin_group("supply_crate")?;
        context.value_i32("health", &mut self.health)?;
        context.value_string("label", &mut self.label)?;
        context.value_f32("age", &mut self.age)?;
        context.end_group()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Patrolling drone moving along the x axis
pub struct Drone {
    pub position: Vec3,
    pub speed: f32,
}

impl Default for Drone {
    fn default() -> Self {
        Self {
            position: Vec3::zeros(),
            speed: 2.0,
        }
    }
}

impl EntityLogic for Drone {
    fn update(&mut self, _info: &ShadowInfo, context: &mut UpdateContext) -> BridgeResult<()> {
        self.position.x += self.speed * context.frame_time;
        Ok(())
    }

    fn dispose(&mut self, info: &ShadowInfo, invoked_from_native: bool) {
        log::info!(
            "Drone {} stopped at x = {:.2} (removed by engine: {invoked_from_native})",
            info.id(),
            self.position.x
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Extension counting the ticks its entity received
#[derive(Default)]
pub struct Beacon {
    pub ticks: u64,
}

impl EntityExtension for Beacon {
    fn update(&mut self, _info: &ShadowInfo, _context: &mut UpdateContext) -> BridgeResult<()> {
        self.ticks += 1;
        Ok(())
    }

    fn release(&mut self, info: &ShadowInfo) {
        log::debug!("Beacon on {} released after {} ticks", info.id(), self.ticks);
    }

    fn name(&self) -> &str {
        "Beacon"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn supply_crate_properties() -> BridgeResult<PropertyTable> {
    let health = EditableProperty::new(
        "health",
        EditablePropertyType::Int,
        Some(
            PropertyAttribute::new(UiControl::IntEdit, "Remaining hit points")
                .with_limits(0.0, 100.0)
                .with_default(50),
        ),
        |logic: &SupplyCrate| logic.health,
        |logic: &mut SupplyCrate, value| logic.health = value,
    )?;
    let label = EditableProperty::new(
        "label",
        EditablePropertyType::String,
        Some(PropertyAttribute::new(UiControl::TextEdit, "Text printed on the lid")),
        |logic: &SupplyCrate| logic.label.clone(),
        |logic: &mut SupplyCrate, value| logic.label = value,
    )?;

    Ok(PropertyTable::new()
        .begin_folder("Crate")
        .with(health)
        .with(label)
        .end_folder("Crate"))
}

fn drone_properties() -> BridgeResult<PropertyTable> {
    let speed = EditableProperty::new(
        "speed",
        EditablePropertyType::Float,
        Some(PropertyAttribute::new(UiControl::NumberEdit, "Meters per second").with_limits(0.0, 20.0)),
        |logic: &Drone| logic.speed,
        |logic: &mut Drone, value| logic.speed = value,
    )?;
    Ok(PropertyTable::new().with(speed))
}

/// Every class the simulation spawns
pub fn registry() -> BridgeResult<EntityClassRegistry> {
    let mut classes = EntityClassRegistry::new();
    classes.register(
        EntityClass::new("SupplyCrate", |_, _| Ok(Box::new(SupplyCrate::default())))
            .with_properties(supply_crate_properties()?),
    )?;
    classes.register(
        EntityClass::new("Drone", |_, _| Ok(Box::new(Drone::default())))
            .with_properties(drone_properties()?),
    )?;
    Ok(classes)
}
