//! Invocation descriptors
//!
//! How an action reaches its application. Each variant carries everything
//! a backend needs except the action parameters.

use serde::{Deserialize, Serialize};

/// Interface implemented by activatable applications
pub const APPLICATION_INTERFACE: &str = "org.freedesktop.Application";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Invocation {
    Exec(ExecCommand),
    BusMethodCall(BusMethodCall),
    BusActivation(BusActivation),
    ServiceFrameworkCall(ServiceFrameworkCall),
    Invalid,
}

impl Invocation {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Invocation::Invalid)
    }

    /// Short label used in logs and by `lca-tool`
    pub fn kind(&self) -> &'static str {
        match self {
            Invocation::Exec(_) => "exec",
            Invocation::BusMethodCall(_) => "dbus",
            Invocation::BusActivation(_) => "dbus-activation",
            Invocation::ServiceFrameworkCall(_) => "service-framework",
            Invocation::Invalid => "invalid",
        }
    }
}

/// A process to spawn. Parameters are already expanded into `argv`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecCommand {
    pub argv: Vec<String>,
    /// Booster type handed to the process supervisor
    pub app_type: String,
    pub single_instance: bool,
    pub terminal: bool,
}

impl ExecCommand {
    pub fn program(&self) -> Option<&str> {
        self.argv.first().map(String::as_str)
    }

    pub fn args(&self) -> &[String] {
        self.argv.get(1..).unwrap_or(&[])
    }
}

/// A method call on a named bus service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusMethodCall {
    pub bus_name: String,
    pub object_path: String,
    pub interface: String,
    pub method: String,
    /// Arguments placed before the action parameters
    pub fixed_args: Vec<String>,
    /// Pass each argument separately instead of one string array
    pub vararg: bool,
}

impl BusMethodCall {
    /// Fixed arguments followed by the action parameters
    pub fn arguments(&self, params: &[String]) -> Vec<String> {
        self.fixed_args.iter().chain(params).cloned().collect()
    }

    pub fn target(&self) -> String {
        format!("{}{} {}.{}", self.bus_name, self.object_path, self.interface, self.method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationMethod {
    /// `Activate(platform_data)`
    Activate,
    /// `Open(uris, platform_data)`
    Open,
}

impl ActivationMethod {
    pub fn for_params(params: &[String]) -> Self {
        if params.is_empty() {
            ActivationMethod::Activate
        } else {
            ActivationMethod::Open
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationMethod::Activate => "Activate",
            ActivationMethod::Open => "Open",
        }
    }
}

/// Activation of an `org.freedesktop.Application` service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusActivation {
    pub bus_name: String,
    pub object_path: String,
    pub method: ActivationMethod,
}

impl BusActivation {
    pub fn target(&self) -> String {
        format!(
            "{}{} {}.{}",
            self.bus_name,
            self.object_path,
            APPLICATION_INTERFACE,
            self.method.as_str()
        )
    }
}

/// A call routed to whichever service currently implements `interface`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFrameworkCall {
    pub interface: String,
    pub method: String,
}

/// Split `interface.method` on its last dot. A missing dot or one at
/// position 0 is rejected.
pub fn split_interface_method(value: &str) -> Option<(&str, &str)> {
    let dot = value.rfind('.')?;
    if dot < 1 {
        return None;
    }
    Some((&value[..dot], &value[dot + 1..]))
}

/// `/` followed by the bus name with dots turned into slashes and hyphens
/// into underscores
pub fn bus_name_to_object_path(bus_name: &str) -> String {
    format!("/{}", bus_name.replace('.', "/").replace('-', "_"))
}
