//! System-wide constants shared across the scheduler, control loop, safety
//! monitor and system controller. Centralised here so cadence and capacity
//! numbers are defined exactly once.

use static_assertions::const_assert;

/// Scheduler tick period, microseconds. The dispatcher wakes this often.
pub const SCHEDULER_TICK_US: u64 = 1_000;

/// Default task-table capacity.
pub const DEFAULT_TASK_TABLE_CAPACITY: usize = 16;

/// Maximum task name length (bytes).
pub const MAX_TASK_NAME_LEN: usize = 32;

/// Control-loop period and deadline, microseconds (1 ms hard-real-time cycle).
pub const CONTROL_LOOP_PERIOD_US: u64 = 1_000;
pub const CONTROL_LOOP_DEADLINE_US: u64 = 1_000;

/// Default size of the control-loop latency ring buffer.
pub const DEFAULT_LATENCY_SAMPLES: usize = 1_000;

/// Safety monitor cadences, microseconds.
pub const ESTOP_SAMPLE_PERIOD_US: u64 = 100;
pub const ZONE_CHECK_PERIOD_US: u64 = 50_000;
pub const INTERLOCK_CHECK_PERIOD_US: u64 = 20_000;
pub const SENSOR_CHECK_PERIOD_US: u64 = 100_000;
pub const WATCHDOG_CHECK_PERIOD_US: u64 = 1_000_000;
pub const MODULE_HEALTH_CHECK_PERIOD_US: u64 = 100_000;

/// Safety monitor budgets, microseconds (soft targets, logged if exceeded).
pub const ESTOP_SAMPLE_BUDGET_US: u64 = 10;
pub const ZONE_CHECK_BUDGET_US: u64 = 200;
pub const INTERLOCK_CHECK_BUDGET_US: u64 = 50;
pub const SENSOR_CHECK_BUDGET_US: u64 = 200;
pub const WATCHDOG_CHECK_BUDGET_US: u64 = 10;
pub const MODULE_HEALTH_CHECK_BUDGET_US: u64 = 100;

/// Fixed bounds on safety monitor configuration arrays.
pub const MAX_ZONE_CONFIGS: usize = 8;
pub const MAX_INTERLOCK_CONFIGS: usize = 16;
pub const MAX_SENSOR_CONFIGS: usize = 32;

/// Factory-default basic zone thresholds, millimetres.
pub const FACTORY_EMERGENCY_ZONE_MM: u32 = 500;
pub const FACTORY_WARNING_ZONE_MM: u32 = 1_000;
pub const FACTORY_SAFE_ZONE_MM: u32 = 2_000;

/// System controller update cadence, microseconds.
pub const CONTROLLER_UPDATE_PERIOD_US: u64 = 10_000;
/// Cadence at which performance metrics (CPU%, memory%, ...) are recomputed.
pub const CONTROLLER_PERFORMANCE_PERIOD_US: u64 = 1_000_000;

/// Default event queue capacity and per-cycle drain limit.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 32;
pub const MAX_EVENTS_DRAINED_PER_CYCLE: usize = 8;

/// Default rolling-window error threshold before forced fault transition.
pub const DEFAULT_MAX_ERROR_COUNT: u32 = 10;

/// Field bus address ranges.
pub const MODULE_ADDR_MAX: u8 = 0xFF;
pub const REGISTER_ADDR_MAX: u16 = 0xFFFF;

/// Process exit codes, one per hard-blocking subsystem init failure.
pub const EXIT_OK: i32 = 0;
pub const EXIT_CONFIG_ERROR: i32 = 2;
pub const EXIT_SCHEDULER_INIT_FAILED: i32 = 3;
pub const EXIT_SAFETY_INIT_FAILED: i32 = 4;
pub const EXIT_CONTROLLER_INIT_FAILED: i32 = 5;

const_assert!(FACTORY_EMERGENCY_ZONE_MM < FACTORY_WARNING_ZONE_MM);
const_assert!(FACTORY_WARNING_ZONE_MM < FACTORY_SAFE_ZONE_MM);
const_assert!(CONTROL_LOOP_DEADLINE_US >= CONTROL_LOOP_PERIOD_US);
const_assert!(MAX_EVENTS_DRAINED_PER_CYCLE <= DEFAULT_EVENT_QUEUE_CAPACITY);
