//! Headless bridge session
//!
//! Plays the native side of the bridge with the in-process engine: classes
//! and game rules are declared, a handful of entities is spawned and ticked,
//! one of them is recycled through the pool, UI events flow both ways, the
//! console, level system and mouse are driven from the native side and a
//! few physical and render resources are built and queried.
//!
//! Usage: `host_sim [config.toml|config.ron]`

mod classes;

use std::sync::Arc;

use script_bridge::config::{BridgeConfig, Config, ConfigError};
use script_bridge::console::{Console, ConsoleCommandArgs, ConsoleFlags, ConsoleVariable};
use script_bridge::entity::{
    GameRulesCatalog, GameRulesClass, MemorySync, ShadowHost, SpawnParameters, UpdateContext,
};
use script_bridge::foundation::logging;
use script_bridge::foundation::math::{Vec2, Vec3};
use script_bridge::foundation::time::FrameTimer;
use script_bridge::input::{HardwareMouseEvent, Mouse, MouseEvent};
use script_bridge::level::{LevelEvent, LevelSystem};
use script_bridge::mesh::{StaticMesh, TexturePosition};
use script_bridge::native::headless::HeadlessEngine;
use script_bridge::native::EntityId;
use script_bridge::physics::{
    BoxificationParameters, GeometryShape, MeshDescription, Plane, Primitive, Sphere,
};
use script_bridge::render::{Material, SubMaterials};
use script_bridge::ui::{UiEventDeclaration, UiEventDirection, UiEventRouter, UiPort, UiValue};
use script_bridge::BridgeError;

use classes::{Beacon, Drone};

const FRAMES: i64 = 90;
// one 60 Hz frame in engine ticks
const FRAME_TICKS: i64 = 166_667;

#[derive(thiserror::Error, Debug)]
enum SimError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Spawn of {0} entity {1} was rejected")]
    Spawn(&'static str, EntityId),
}

fn load_config() -> Result<BridgeConfig, SimError> {
    let config = match std::env::args().nth(1) {
        Some(path) => BridgeConfig::load_from_file(&path)?,
        None => BridgeConfig::default(),
    };
    config.validate()?;
    Ok(config)
}

fn spawn(
    host: &mut ShadowHost,
    engine: &HeadlessEngine,
    class_name: &'static str,
    id: EntityId,
) -> Result<EntityId, SimError> {
    let handle = engine.allocate_entity();
    let id = host
        .create_shadow(class_name, id, handle)
        .ok_or(SimError::Spawn(class_name, id))?;
    host.initializing(id)?;
    host.initialized(id)?;
    Ok(id)
}

fn run_entities(engine: &Arc<HeadlessEngine>, config: &BridgeConfig) -> Result<(), SimError> {
    let classes = classes::registry()?;
    classes.register_with(engine.as_ref())?;

    let mut rules = GameRulesCatalog::new(engine.clone());
    rules.register(
        GameRulesClass::new("Skirmish", "host_sim::Skirmish")
            .with_alias("sk")
            .with_level_location("levels/skirmish"),
    )?;
    rules.set_current("sk")?;

    let mut host = ShadowHost::new(Arc::new(classes), engine.clone());
    let crate_id = spawn(&mut host, engine, "SupplyCrate", EntityId::new(1))?;
    let drone_id = spawn(&mut host, engine, "Drone", EntityId::new(2))?;
    let scout_id = spawn(&mut host, engine, "Drone", EntityId::new(3))?;

    let beacon = host
        .shadow_mut(drone_id)
        .ok_or(SimError::Spawn("Drone", drone_id))?
        .add_extension(Box::new(Beacon::default()))?;
    host.set_editable_property(scout_id, 0, "6.5")?;

    let mut timer = FrameTimer::new(engine.clone(), &config.time);
    for frame in 0..FRAMES {
        let start = FRAME_TICKS * frame;
        timer.set_timings(start, start, FRAME_TICKS, FRAME_TICKS, timer.scale(), 60.0);
        if frame == FRAMES / 2 {
            timer.set_scale(0.5);
        }

        let frame_time = timer.frame().as_secs_f32() * timer.scale();
        let mut context = UpdateContext::new(frame_time, timer.frame_count());
        host.update_all(&mut context)?;
        host.post_update_all()?;
    }
    timer.clear_scaling();

    log::info!(
        "After {} frames: crate health {}, scout speed {}",
        timer.frame_count(),
        host.get_editable_property(crate_id, 1)?,
        host.get_editable_property(scout_id, 0)?
    );
    if let Some(beacon) = host
        .shadow(drone_id)
        .and_then(|drone| drone.extensions().get(beacon))
        .and_then(|extension| extension.as_any().downcast_ref::<Beacon>())
    {
        log::info!("Beacon counted {} ticks", beacon.ticks);
    }
    if let Some(drone) = host.shadow(drone_id).and_then(|shadow| shadow.logic_as::<Drone>()) {
        log::info!("Drone travelled to {:?}", drone.position);
    }

    let mut writer = MemorySync::writer();
    host.synchronize(crate_id, &mut writer)?;
    log::info!("Crate state: {}", writer.snapshot()?);

    let mut parameters = SpawnParameters::new("SupplyCrate", "restocked");
    parameters.set_property("health", "80");
    if host.reloading(crate_id, &mut parameters)? {
        host.reloaded(crate_id, &mut parameters)?;
        log::info!("Crate recycled with health {}", host.get_editable_property(crate_id, 1)?);
    }

    host.dispose(scout_id)?;
    host.shutdown();
    log::info!("Engine removed {:?}", engine.removed_entities());
    Ok(())
}

fn run_ui(engine: &Arc<HeadlessEngine>, config: &BridgeConfig) -> Result<(), SimError> {
    let mut router = UiEventRouter::new(engine.clone(), config.ui.clone());
    let score = router.declare(
        &UiEventDeclaration::new("ScoreChanged", "Pushes the current score", "Hud")
            .with_port(UiPort::field("score", "New score")),
    )?;
    router.register_to_event_system("Menu", UiEventDirection::ToSystem);
    router.subscribe(Box::new(|event| {
        log::info!("Menu event {} with {} arguments", event.event_name, event.args.len());
    }));

    router.send_event("Hud", score, &[UiValue::Int(1200)])?;
    router.on_event("Menu", "StartPressed", 0, vec![UiValue::Bool(true)]);
    log::info!("UI received {} events", engine.sent_ui_events().len());
    router.shutdown();
    Ok(())
}

fn run_console(engine: &Arc<HeadlessEngine>, config: &BridgeConfig) -> Result<(), SimError> {
    let mut console = Console::new(engine.clone(), config.console.clone());
    console.register_command(
        "sim_echo",
        "Echo the arguments back",
        ConsoleFlags::empty(),
        Box::new(|args: &ConsoleCommandArgs| -> Result<(), BridgeError> {
            log::info!("echo: {}", args.args().join(" "));
            Ok(())
        }),
    )?;
    let gravity = console.register_watched_variable(
        "sim_gravity",
        -9.81_f32,
        ConsoleFlags::CHEAT,
        "Gravity along z",
        Box::new(|variable: &ConsoleVariable| match variable.value() {
            Ok(value) => log::info!("{} is now {value}", variable.name()),
            Err(e) => log::warn!("{} changed but could not be read: {e}", variable.name()),
        }),
    )?;

    console.execute_managed_command("sim_echo \"hello there\" 42");
    gravity.set_text("-1.62")?;
    console.variable_changed(gravity.handle());
    console.execute("sim_echo from native", true, false)?;
    log::info!("Console executed {} lines", engine.executed_commands().len());
    console.shutdown();
    Ok(())
}

fn run_level(engine: &Arc<HeadlessEngine>) -> Result<(), SimError> {
    let harbor = engine.add_level("harbor");
    engine.set_level_load_time(1.25);

    let mut levels = LevelSystem::new(engine.clone());
    levels.subscribe(Box::new(|event: &LevelEvent| {
        if let LevelEvent::LoadingProgress { level, progress } = event {
            log::info!("{} at {progress}%", level.name);
        }
    }));

    levels.prepare("harbor")?;
    let level = levels.load("harbor")?;
    levels.on_loading_start(harbor);
    for progress in [25, 50, 100] {
        levels.on_loading_progress(harbor, progress);
    }
    levels.on_loading_complete(harbor);
    log::info!("Level {} took {:?}", level.name, levels.last_load_time()?);

    levels.unload();
    levels.on_unload_complete(harbor);
    levels.shutdown();
    Ok(())
}

fn run_mouse(engine: &Arc<HeadlessEngine>) {
    engine.set_window_origin(Vec2::new(200.0, 100.0));
    let mut mouse = Mouse::new(engine.clone());
    mouse.reset(true);
    mouse.confine_cursor(true);
    mouse.subscribe(Box::new(|event: &MouseEvent| {
        log::debug!("Mouse {event:?}");
        matches!(event, MouseEvent::ButtonDown { .. })
    }));

    mouse.set_client_position(Vec2::new(64.0, 48.0));
    let consumed = mouse.on_hardware_event(64, 48, HardwareMouseEvent::LeftButtonDown as i32, 0);
    log::info!(
        "Click consumed: {consumed}, cursor at {:?} on the desktop",
        mouse.absolute_position()
    );
    mouse.shutdown();
}

fn cube(half: f32) -> (Vec<Vec3>, Vec<u16>) {
    let vertices = (0..8u8)
        .map(|corner| {
            let pick = |bit: u8| if corner & bit == 0 { -half } else { half };
            Vec3::new(pick(1), pick(2), pick(4))
        })
        .collect();
    let indices = vec![
        0, 2, 1, 1, 2, 3, // -z
        4, 5, 6, 5, 7, 6, // +z
        0, 1, 4, 1, 5, 4, // -y
        2, 6, 3, 3, 6, 7, // +y
        0, 4, 2, 2, 4, 6, // -x
        1, 3, 5, 3, 7, 5, // +x
    ];
    (vertices, indices)
}

fn run_resources(engine: &Arc<HeadlessEngine>, config: &BridgeConfig) -> Result<(), SimError> {
    let (vertices, indices) = cube(1.0);
    let hull = GeometryShape::mesh(
        engine.clone(),
        MeshDescription::with_defaults(vertices, indices, &config.geometry),
    )?;
    let ball = GeometryShape::primitive(
        engine.clone(),
        &Primitive::Sphere(Sphere {
            center: Vec3::new(1.2, 0.0, 0.0),
            radius: 0.5,
        }),
    )?;

    {
        let _lock = hull.lock_read()?;
        log::info!(
            "Hull: volume {:.2}, convex {}, {} contacts with the ball",
            hull.volume()?,
            hull.is_convex(0.01)?,
            hull.intersection(&ball)?.len()
        );
    }
    let buoyancy = hull.calculate_buoyancy(&Plane::new(Vec3::new(0.0, 0.0, 1.0), Vec3::zeros()))?;
    log::info!("Submerged volume {:.2}", buoyancy.submerged_volume);
    let boxes = hull.boxify(4, &BoxificationParameters::default())?;
    log::info!("Hull covered by {} boxes", boxes.len());
    if hull.subtract(&ball)? {
        log::info!("Ball carved out of the hull");
    }
    ball.decrement_reference_count()?;
    hull.decrement_reference_count()?;

    let sub_materials = SubMaterials::new(engine.clone(), Some(engine.create_material(0)));
    for _ in 0..3 {
        sub_materials.push(Material::from_handle(Some(engine.create_material(0))))?;
    }
    sub_materials.remove_at(1)?;
    log::info!("Material has {} sub-materials", sub_materials.len()?);

    let mesh = StaticMesh::new(engine.clone(), Some(engine.create_static_mesh()));
    let uvs = mesh.texture_positions();
    uvs.set_len(4)?;
    for (index, (u, v)) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)].into_iter().enumerate() {
        uvs.set(index, TexturePosition::new(u, v))?;
    }
    log::info!("Texture positions: {:?}", uvs.iter()?.collect::<Vec<_>>());
    Ok(())
}

fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    logging::init(&config.logging);
    log::info!("Starting headless bridge session");

    let engine = Arc::new(HeadlessEngine::new());
    let result = run_entities(&engine, &config)
        .and_then(|()| run_ui(&engine, &config))
        .and_then(|()| run_console(&engine, &config))
        .and_then(|()| run_level(&engine))
        .and_then(|()| {
            run_mouse(&engine);
            Ok(())
        })
        .and_then(|()| run_resources(&engine, &config));

    if let Err(e) = result {
        log::error!("Session failed: {e}");
        std::process::exit(1);
    }
    log::info!("Session finished");
}
