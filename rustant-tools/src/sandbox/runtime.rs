//! WASM runtime engine using wasmi for sandboxed execution.
//!
//! Manages the `wasmi` engine lifecycle, compiles WASM modules, and executes
//! them with fuel metering and resource limits.

use super::config::SandboxConfig;
use super::host::{register_host_functions, HostState};

/// Errors that can occur during sandbox operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SandboxError {
    /// The WASM binary is malformed or invalid.
    #[error("invalid WASM module: {0}")]
    ModuleInvalid(String),

    /// The module could not be instantiated (e.g. missing imports).
    #[error("instantiation failed: {0}")]
    InstantiationFailed(String),

    /// Execution returned an error.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The fuel (instruction) budget was exhausted.
    #[error("out of fuel: instruction budget exhausted")]
    OutOfFuel,

    /// The memory limit was exceeded.
    #[error("out of memory: memory limit exceeded")]
    OutOfMemory,

    /// Execution timed out.
    #[error("execution timed out")]
    Timeout,

    /// The guest attempted a forbidden operation.
    #[error("capability denied: {0}")]
    CapabilityDenied(String),

    /// A host function returned an error.
    #[error("host error: {0}")]
    HostError(String),
}

/// The result of a successful WASM module execution.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Raw output bytes written by the module via `host_write_output`.
    pub output: Vec<u8>,
    /// Number of fuel units consumed during execution.
    pub fuel_consumed: u64,
    /// Peak linear memory usage in bytes.
    pub memory_peak_bytes: usize,
}

/// The WASM runtime engine backed by `wasmi`.
///
/// Maintains a configured `wasmi::Engine` with fuel metering enabled.
/// Use [`WasmRuntime::execute`] to run WASM modules with resource limits.
pub struct WasmRuntime {
    engine: wasmi::Engine,
}

impl WasmRuntime {
    /// Create a new `WasmRuntime` with fuel metering enabled.
    pub fn new() -> Self {
        let mut config = wasmi::Config::default();
        config.consume_fuel(true);
        let engine = wasmi::Engine::new(&config);
        Self { engine }
    }

    /// Validate a WASM module without executing it.
    ///
    /// Accepts both `.wasm` binary and `.wat` text format (when the `wat`
    /// feature is enabled, which it is by default).
    pub fn validate_module(&self, wasm_bytes: &[u8]) -> Result<(), SandboxError> {
        wasmi::Module::new(&self.engine, wasm_bytes)
            .map(|_| ())
            .map_err(|e| SandboxError::ModuleInvalid(e.to_string()))
    }

    /// Execute a WASM module with the given input and configuration.
    ///
    /// # Execution flow
    ///
    /// 1. Compile the module
    /// 2. Create a store with fuel limit from config
    /// 3. Register host functions via the linker
    /// 4. Instantiate the module
    /// 5. Call the exported `_start` function
    /// 6. Collect results (output, fuel consumed, memory peak)
    pub fn execute(
        &self,
        wasm_bytes: &[u8],
        input: &[u8],
        config: &SandboxConfig,
    ) -> Result<ExecutionResult, SandboxError> {
        // 1. Compile module
        let module = wasmi::Module::new(&self.engine, wasm_bytes)
            .map_err(|e| SandboxError::ModuleInvalid(e.to_string()))?;

        // 2. Create store with host state and fuel
        let host_state = HostState::new(input.to_vec(), config.capabilities.clone());
        let mut store = wasmi::Store::new(&self.engine, host_state);
        store
            .set_fuel(config.resource_limits.max_fuel)
            .map_err(|e| SandboxError::ExecutionFailed(e.to_string()))?;

        // 3. Create linker and register host functions
        let mut linker = wasmi::Linker::new(&self.engine);
        register_host_functions(&mut linker)
            .map_err(|e| SandboxError::InstantiationFailed(e.to_string()))?;

        // 4. Instantiate and start module
        let instance =
            linker
                .instantiate_and_start(&mut store, &module)
                .map_err(|e: wasmi::Error| {
                    let msg = e.to_string();
                    if msg.contains("fuel") {
                        SandboxError::OutOfFuel
                    } else {
                        SandboxError::InstantiationFailed(msg)
                    }
                })?;

        // 5. Call _start export
        let start_func = instance
            .get_typed_func::<(), ()>(&store, "_start")
            .map_err(|e: wasmi::Error| {
                SandboxError::ExecutionFailed(format!("missing _start export: {}", e))
            })?;

        match start_func.call(&mut store, ()) {
            Ok(()) => {}
            Err(err) => {
                let msg = err.to_string();
                if msg.contains("fuel") {
                    return Err(SandboxError::OutOfFuel);
                }
                return Err(SandboxError::ExecutionFailed(msg));
            }
        }

        // 6. Collect results
        let fuel_remaining = store.get_fuel().unwrap_or(0);
        let fuel_consumed = config
            .resource_limits
            .max_fuel
            .saturating_sub(fuel_remaining);

        // Track final memory size
        if let Some(memory) = instance.get_memory(&store, "memory") {
            let mem_bytes = memory.data(&store as &wasmi::Store<HostState>).len();
            store.data_mut().track_memory(mem_bytes);
        }

        let host_state = store.into_data();
        Ok(ExecutionResult {
            output: host_state.output,
            fuel_consumed,
            memory_peak_bytes: host_state.memory_peak,
        })
    }
}

impl Default for WasmRuntime {
    fn default() -> Self {
        Self::new()
    }
}
