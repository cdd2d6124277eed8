//! Node Core: generated-code interpreter and main loop.
//!
//! `NodeCore` executes the statements produced by `rtc_common::codegen`:
//! it opens buses, instantiates drivers through the `DriverRegistry`,
//! binds actions to their parents and builds automations. Afterwards it
//! sets components up and polls them from a single-threaded loop.

use crate::bus::{BusProvider, SharedBus};
use crate::clock::WallClock;
use crate::driver::{I2cDevice, RtcDriver};
use crate::driver_registry::DriverRegistry;
use crate::error::HalError;
use parking_lot::Mutex;
use rtc_common::codegen::statement::{GeneratedCode, Statement, Trigger};
use rtc_common::consts::{RX8025_READ_ACTION_CLASS, RX8025_WRITE_ACTION_CLASS};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Driver handle shared by the component list and bound actions.
pub type SharedDriver = Arc<Mutex<Box<dyn RtcDriver>>>;

/// Loop sleep between ticks.
const LOOP_PERIOD: Duration = Duration::from_millis(100);

/// Operation an action performs on its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Write the parent's current time to the chip.
    WriteTime,
    /// Read the chip and synchronize the parent's clock.
    ReadTime,
}

impl ActionKind {
    /// Action kind of a generated-code class.
    pub fn from_class(class: &str) -> Option<Self> {
        match class {
            RX8025_WRITE_ACTION_CLASS => Some(Self::WriteTime),
            RX8025_READ_ACTION_CLASS => Some(Self::ReadTime),
            _ => None,
        }
    }
}

struct BoundAction {
    kind: ActionKind,
    parent: SharedDriver,
}

struct ScheduledComponent {
    id: String,
    driver: SharedDriver,
    interval: Option<Duration>,
    next_update: Option<Instant>,
}

struct ScheduledAutomation {
    id: String,
    trigger: Trigger,
    actions: Vec<String>,
    next_run: Option<Instant>,
}

/// Runtime of one node.
pub struct NodeCore {
    /// Opened buses by id
    buses: HashMap<String, SharedBus>,
    /// Instantiated drivers by variable id
    drivers: HashMap<String, SharedDriver>,
    /// Components in registration order
    components: Vec<ScheduledComponent>,
    /// Occupied (bus, address) pairs and their owner
    i2c_devices: HashMap<(String, u8), String>,
    /// Ids registered as time providers
    time_providers: Vec<String>,
    /// Actions created but not yet bound to a parent
    pending_actions: HashMap<String, ActionKind>,
    /// Actions bound to their parent
    actions: HashMap<String, BoundAction>,
    /// Automations in declaration order
    automations: Vec<ScheduledAutomation>,
    /// Running flag for loop control
    running: Arc<AtomicBool>,
    /// Whether `setup()` ran
    set_up: bool,
}

impl NodeCore {
    /// Interpret `code`.
    ///
    /// Buses are opened through `buses`; drivers are created from
    /// `registry` and read time from `wall`.
    ///
    /// # Errors
    /// - `HalError::ConfigError` for duplicate or unknown variables,
    ///   unknown buses, address conflicts and unbound actions
    /// - `HalError::DriverNotFound` for unknown classes
    /// - `HalError::CommunicationError` if a bus cannot be opened
    pub fn from_code(
        code: &GeneratedCode,
        registry: &DriverRegistry,
        buses: &dyn BusProvider,
        wall: Arc<dyn WallClock>,
    ) -> Result<Self, HalError> {
        let mut core = Self {
            buses: HashMap::new(),
            drivers: HashMap::new(),
            components: Vec::new(),
            i2c_devices: HashMap::new(),
            time_providers: Vec::new(),
            pending_actions: HashMap::new(),
            actions: HashMap::new(),
            automations: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            set_up: false,
        };
        let mut variables = HashSet::new();

        for statement in code.statements() {
            debug!("exec: {}", statement);
            match statement {
                Statement::NewI2cBus { id, device } => {
                    declare(&mut variables, id)?;
                    let bus = buses.open(id, device)?;
                    info!("Opened I2C bus '{}' ({})", id, device.display());
                    core.buses.insert(id.clone(), bus);
                }
                Statement::NewVariable { id, class } => {
                    declare(&mut variables, id)?;
                    match ActionKind::from_class(class) {
                        Some(kind) => {
                            core.pending_actions.insert(id.clone(), kind);
                        }
                        None => {
                            let driver = registry.create_driver(class, id, Arc::clone(&wall))?;
                            core.drivers.insert(id.clone(), Arc::new(Mutex::new(driver)));
                        }
                    }
                }
                Statement::SetVdsl { id, value } => {
                    core.driver(id)?.lock().set_vdsl(*value);
                }
                Statement::RegisterComponent {
                    id,
                    update_interval_ms,
                } => core.register_component(id, *update_interval_ms)?,
                Statement::RegisterI2cDevice { id, bus, address } => {
                    core.register_i2c_device(id, bus, *address)?
                }
                Statement::RegisterTime { id, timezone } => {
                    core.driver(id)?.lock().set_timezone(timezone);
                    core.time_providers.push(id.clone());
                }
                Statement::RegisterParented { id, parent } => {
                    let kind = core.pending_actions.remove(id).ok_or_else(|| {
                        HalError::ConfigError(format!("'{id}' is not an unbound action"))
                    })?;
                    let parent = Arc::clone(core.driver(parent)?);
                    core.actions.insert(id.clone(), BoundAction { kind, parent });
                }
                Statement::NewAutomation {
                    id,
                    trigger,
                    actions,
                } => {
                    declare(&mut variables, id)?;
                    if let Some(missing) = actions.iter().find(|a| !core.actions.contains_key(*a)) {
                        return Err(HalError::ConfigError(format!(
                            "Automation '{id}' uses unbound action '{missing}'"
                        )));
                    }
                    core.automations.push(ScheduledAutomation {
                        id: id.clone(),
                        trigger: *trigger,
                        actions: actions.clone(),
                        next_run: None,
                    });
                }
            }
        }

        if let Some(id) = core.pending_actions.keys().min() {
            return Err(HalError::ConfigError(format!("Action '{id}' has no parent")));
        }

        info!(
            "NodeCore created: {} buses, {} components, {} automations",
            core.buses.len(),
            core.components.len(),
            core.automations.len()
        );
        Ok(core)
    }

    fn driver(&self, id: &str) -> Result<&SharedDriver, HalError> {
        self.drivers
            .get(id)
            .ok_or_else(|| HalError::ConfigError(format!("Unknown component '{id}'")))
    }

    fn register_component(&mut self, id: &str, interval_ms: Option<u64>) -> Result<(), HalError> {
        let driver = Arc::clone(self.driver(id)?);
        if self.components.iter().any(|c| c.id == id) {
            return Err(HalError::ConfigError(format!("Component '{id}' registered twice")));
        }
        self.components.push(ScheduledComponent {
            id: id.to_string(),
            driver,
            interval: interval_ms.map(Duration::from_millis),
            next_update: None,
        });
        Ok(())
    }

    fn register_i2c_device(&mut self, id: &str, bus_id: &str, address: u8) -> Result<(), HalError> {
        let driver = Arc::clone(self.driver(id)?);
        let bus = self
            .buses
            .get(bus_id)
            .ok_or_else(|| HalError::ConfigError(format!("Unknown I2C bus '{bus_id}'")))?;

        let key = (bus_id.to_string(), address);
        if let Some(owner) = self.i2c_devices.get(&key) {
            return Err(HalError::ConfigError(format!(
                "Address 0x{address:02X} on bus '{bus_id}' used by both '{owner}' and '{id}'"
            )));
        }

        driver
            .lock()
            .attach_i2c(I2cDevice::new(bus_id, bus.clone(), address));
        self.i2c_devices.insert(key, id.to_string());
        Ok(())
    }

    /// Set up every component, dump configs, then run boot automations.
    ///
    /// Components are set up in descending setup priority, ties keep
    /// registration order. A failed setup marks the component failed and
    /// is not fatal.
    pub fn setup(&mut self) {
        let mut order: Vec<usize> = (0..self.components.len()).collect();
        order.sort_by(|&a, &b| {
            let pa = self.components[a].driver.lock().setup_priority();
            let pb = self.components[b].driver.lock().setup_priority();
            pb.total_cmp(&pa)
        });

        for index in order {
            let component = &self.components[index];
            let mut driver = component.driver.lock();
            if let Err(e) = driver.setup() {
                if !driver.is_failed() {
                    driver.mark_failed();
                }
                error!("Setup of '{}' failed: {}", component.id, e);
            }
        }

        for component in &self.components {
            component.driver.lock().dump_config();
        }

        self.set_up = true;

        let boot: Vec<usize> = self
            .automations
            .iter()
            .enumerate()
            .filter(|(_, a)| a.trigger == Trigger::Boot)
            .map(|(i, _)| i)
            .collect();
        for index in boot {
            self.run_automation(index);
        }
    }

    /// Run everything due at `now`.
    ///
    /// Components update on their first tick and then every update
    /// interval; failed components and those with interval `never` are
    /// skipped. Interval automations first fire one period after their
    /// first tick.
    pub fn tick(&mut self, now: Instant) {
        for component in &mut self.components {
            let Some(interval) = component.interval else {
                continue;
            };
            if component.next_update.is_some_and(|due| now < due) {
                continue;
            }
            component.next_update = Some(now + interval);

            let mut driver = component.driver.lock();
            if driver.is_failed() {
                continue;
            }
            if let Err(e) = driver.update() {
                warn!("Update of '{}' failed: {}", component.id, e);
            }
        }

        let mut due = Vec::new();
        for (index, automation) in self.automations.iter_mut().enumerate() {
            let Trigger::Interval { period_ms } = automation.trigger else {
                continue;
            };
            let period = Duration::from_millis(period_ms);
            match automation.next_run {
                None => automation.next_run = Some(now + period),
                Some(next) if now >= next => {
                    automation.next_run = Some(now + period);
                    due.push(index);
                }
                Some(_) => {}
            }
        }
        for index in due {
            self.run_automation(index);
        }
    }

    fn run_automation(&self, index: usize) {
        let automation = &self.automations[index];
        debug!("Running automation '{}'", automation.id);
        for action in &automation.actions {
            if let Err(e) = self.play_action(action) {
                warn!(
                    "Action '{}' of automation '{}' failed: {}",
                    action, automation.id, e
                );
            }
        }
    }

    /// Run one bound action.
    ///
    /// # Errors
    /// `HalError::ConfigError` for unknown actions, `HalError::Action`
    /// when the parent component fails to perform it.
    pub fn play_action(&self, id: &str) -> Result<(), HalError> {
        let action = self
            .actions
            .get(id)
            .ok_or_else(|| HalError::ConfigError(format!("Unknown action '{id}'")))?;

        let mut parent = action.parent.lock();
        match action.kind {
            ActionKind::WriteTime => parent.write_time()?,
            ActionKind::ReadTime => {
                parent.read_time()?;
            }
        }
        Ok(())
    }

    /// Run `tick` until the running flag is cleared.
    ///
    /// # Errors
    /// Returns `HalError::InitFailed` if `setup()` was not called.
    pub fn run(&mut self) -> Result<(), HalError> {
        if !self.set_up {
            return Err(HalError::InitFailed("NodeCore not set up".to_string()));
        }

        info!("Starting NodeCore loop...");
        self.running.store(true, Ordering::SeqCst);

        let mut ticks: u64 = 0;
        while self.running.load(Ordering::SeqCst) {
            self.tick(Instant::now());
            ticks += 1;
            std::thread::sleep(LOOP_PERIOD);
        }

        info!("NodeCore loop stopped after {} ticks", ticks);
        Ok(())
    }

    /// Request the loop to stop.
    pub fn shutdown(&mut self) {
        info!("Shutdown requested");
        self.running.store(false, Ordering::SeqCst);
    }

    /// Get the running flag for signal handlers.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Driver instance by variable id.
    pub fn component(&self, id: &str) -> Option<SharedDriver> {
        self.drivers.get(id).cloned()
    }

    /// Registered component ids in registration order.
    pub fn component_ids(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.id.as_str()).collect()
    }

    /// Ids registered as time providers.
    pub fn time_providers(&self) -> &[String] {
        &self.time_providers
    }

    /// Ids of bound actions, sorted.
    pub fn action_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.actions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Automation ids in declaration order.
    pub fn automation_ids(&self) -> Vec<&str> {
        self.automations.iter().map(|a| a.id.as_str()).collect()
    }
}

fn declare(variables: &mut HashSet<String>, id: &str) -> Result<(), HalError> {
    if !variables.insert(id.to_string()) {
        return Err(HalError::ConfigError(format!("Variable '{id}' declared twice")));
    }
    Ok(())
}
