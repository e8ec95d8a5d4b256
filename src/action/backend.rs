//! Invocation backends
//!
//! [`InvocationBackend`] performs the side effects of triggering an action.
//! [`SystemBackend`] spawns processes directly and reaches the session bus
//! through the `gdbus` command line client.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use super::error::{InvocationError, InvocationResult};
use super::invocation::{
    ActivationMethod, BusActivation, BusMethodCall, ExecCommand, Invocation,
    ServiceFrameworkCall, APPLICATION_INTERFACE,
};

/// Bus name of the service mapper
pub const SERVICE_MAPPER_NAME: &str = "com.nokia.MServiceFw";
pub const SERVICE_MAPPER_PATH: &str = "/";
pub const SERVICE_MAPPER_INTERFACE: &str = "com.nokia.MServiceFwIf";
pub const SERVICE_MAPPER_METHOD: &str = "serviceName";

const BUS_CLIENT: &str = "gdbus";

/// Performs invocations. `wait` asks the backend to block until the
/// process exits or the bus call replies.
pub trait InvocationBackend: Send + Sync {
    fn exec(&self, command: &ExecCommand, wait: bool) -> InvocationResult<()>;

    fn call_method(
        &self,
        call: &BusMethodCall,
        params: &[String],
        wait: bool,
    ) -> InvocationResult<()>;

    fn activate(
        &self,
        activation: &BusActivation,
        params: &[String],
        wait: bool,
    ) -> InvocationResult<()>;

    fn call_service(
        &self,
        call: &ServiceFrameworkCall,
        params: &[String],
        wait: bool,
    ) -> InvocationResult<()>;
}

/// Route an invocation to the matching backend operation
pub fn dispatch(
    backend: &dyn InvocationBackend,
    invocation: &Invocation,
    params: &[String],
    wait: bool,
) -> InvocationResult<()> {
    match invocation {
        Invocation::Exec(command) => backend.exec(command, wait),
        Invocation::BusMethodCall(call) => backend.call_method(call, params, wait),
        Invocation::BusActivation(activation) => backend.activate(activation, params, wait),
        Invocation::ServiceFrameworkCall(call) => backend.call_service(call, params, wait),
        Invocation::Invalid => Err(InvocationError::InvalidAction),
    }
}

// ============================================================================
// GVariant text encoding
// ============================================================================

/// A string in GVariant text form: single quoted with `\` and `'` escaped
pub fn variant_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

/// A string array in GVariant text form. Empty arrays carry a type annotation.
pub fn variant_string_array(values: &[String]) -> String {
    if values.is_empty() {
        return "@as []".to_string();
    }
    let items: Vec<String> = values.iter().map(|v| variant_string(v)).collect();
    format!("[{}]", items.join(", "))
}

/// Empty `a{sv}` platform data
pub const EMPTY_PLATFORM_DATA: &str = "@a{sv} {}";

/// Extract the first string of a reply such as `('org.example.Service',)`
pub fn parse_string_reply(reply: &str) -> Option<String> {
    let reply = reply.trim();
    let start = reply.find('\'')?;
    let mut value = String::new();
    let mut chars = reply[start + 1..].chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => value.push(chars.next()?),
            '\'' => return Some(value),
            other => value.push(other),
        }
    }
    None
}

// ============================================================================
// System backend
// ============================================================================

/// Backend talking to the real system
#[derive(Debug, Default)]
pub struct SystemBackend {
    /// interface -> implementing bus name
    implementors: Mutex<HashMap<String, String>>,
}

impl SystemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn bus_call_args(
        bus_name: &str,
        object_path: &str,
        interface: &str,
        method: &str,
        args: Vec<String>,
    ) -> Vec<String> {
        let mut argv = vec![
            "call".to_string(),
            "--session".to_string(),
            "--dest".to_string(),
            bus_name.to_string(),
            "--object-path".to_string(),
            object_path.to_string(),
            "--method".to_string(),
            format!("{}.{}", interface, method),
        ];
        argv.extend(args);
        argv
    }

    /// Run the bus client. With `wait` the reply is returned.
    fn bus_call(&self, target: String, args: Vec<String>, wait: bool) -> InvocationResult<String> {
        debug!("Bus call {} {:?}", target, args);

        let mut command = Command::new(BUS_CLIENT);
        command.args(&args).stdin(Stdio::null());

        if !wait {
            command.stdout(Stdio::null()).stderr(Stdio::null());
            command.spawn().map_err(|e| InvocationError::Spawn {
                program: BUS_CLIENT.to_string(),
                source: e,
            })?;
            return Ok(String::new());
        }

        let output = command.output().map_err(|e| InvocationError::Spawn {
            program: BUS_CLIENT.to_string(),
            source: e,
        })?;
        if !output.status.success() {
            return Err(InvocationError::Bus {
                target,
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Bus name currently implementing `interface`, cached per interface
    fn implementor(&self, interface: &str) -> InvocationResult<String> {
        if let Some(name) = self.implementors.lock().get(interface) {
            return Ok(name.clone());
        }

        let args = Self::bus_call_args(
            SERVICE_MAPPER_NAME,
            SERVICE_MAPPER_PATH,
            SERVICE_MAPPER_INTERFACE,
            SERVICE_MAPPER_METHOD,
            vec![variant_string(interface)],
        );
        let target = format!("{}.{}", SERVICE_MAPPER_INTERFACE, SERVICE_MAPPER_METHOD);
        let reply = self.bus_call(target, args, true)?;

        let name = parse_string_reply(&reply)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| InvocationError::NoImplementor {
                interface: interface.to_string(),
            })?;
        self.implementors
            .lock()
            .insert(interface.to_string(), name.clone());
        Ok(name)
    }
}

impl InvocationBackend for SystemBackend {
    fn exec(&self, command: &ExecCommand, wait: bool) -> InvocationResult<()> {
        let Some(program) = command.program() else {
            return Err(InvocationError::InvalidAction);
        };
        debug!("Executing {:?}", command.argv);

        let mut process = Command::new(program);
        process.args(command.args()).stdin(Stdio::null());

        let spawn_error = |e| InvocationError::Spawn {
            program: program.to_string(),
            source: e,
        };
        if !wait {
            process.spawn().map_err(spawn_error)?;
            return Ok(());
        }

        let status = process.status().map_err(spawn_error)?;
        if !status.success() {
            return Err(InvocationError::Exit {
                program: program.to_string(),
                status: status.to_string(),
            });
        }
        Ok(())
    }

    fn call_method(
        &self,
        call: &BusMethodCall,
        params: &[String],
        wait: bool,
    ) -> InvocationResult<()> {
        let arguments = call.arguments(params);
        let encoded = if call.vararg {
            arguments.iter().map(|a| variant_string(a)).collect()
        } else {
            vec![variant_string_array(&arguments)]
        };
        let args = Self::bus_call_args(
            &call.bus_name,
            &call.object_path,
            &call.interface,
            &call.method,
            encoded,
        );
        self.bus_call(call.target(), args, wait).map(|_| ())
    }

    fn activate(
        &self,
        activation: &BusActivation,
        params: &[String],
        wait: bool,
    ) -> InvocationResult<()> {
        let mut encoded = Vec::new();
        if activation.method == ActivationMethod::Open {
            encoded.push(variant_string_array(params));
        }
        encoded.push(EMPTY_PLATFORM_DATA.to_string());

        let args = Self::bus_call_args(
            &activation.bus_name,
            &activation.object_path,
            APPLICATION_INTERFACE,
            activation.method.as_str(),
            encoded,
        );
        self.bus_call(activation.target(), args, wait).map(|_| ())
    }

    fn call_service(
        &self,
        call: &ServiceFrameworkCall,
        params: &[String],
        wait: bool,
    ) -> InvocationResult<()> {
        let implementor = match self.implementor(&call.interface) {
            Ok(name) => name,
            Err(e) => {
                warn!("Service lookup for {} failed: {}", call.interface, e);
                return Err(e);
            }
        };

        let args = Self::bus_call_args(
            &implementor,
            "/",
            &call.interface,
            &call.method,
            vec![variant_string_array(params)],
        );
        let target = format!("{}/ {}.{}", implementor, call.interface, call.method);
        self.bus_call(target, args, wait).map(|_| ())
    }
}
