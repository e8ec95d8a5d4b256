//! Desktop entry classification
//!
//! Decides how an application is invoked. Checked in this order:
//! bus activation, legacy `X-Osso-Service`, `X-Maemo-Service`, service
//! framework (`X-Maemo-Method` alone), `Exec`.

use std::fs;
use std::path::{Component, Path};
use tracing::{debug, warn};

use super::error::{InvocationError, InvocationResult};
use super::invocation::{
    bus_name_to_object_path, split_interface_method, ActivationMethod, BusActivation,
    BusMethodCall, ExecCommand, Invocation, ServiceFrameworkCall,
};
use crate::core::Settings;
use crate::desktop::{expand_exec, DesktopEntry, DESKTOP_SUFFIX};

pub const SAILJAIL_SECTION: &str = "X-Sailjail";
pub const ORGANIZATION_NAME_KEY: &str = "OrganizationName";
pub const APPLICATION_NAME_KEY: &str = "ApplicationName";
pub const DBUS_ACTIVATABLE_KEY: &str = "DBusActivatable";
pub const OSSO_SERVICE_KEY: &str = "X-Osso-Service";
pub const MAEMO_SERVICE_KEY: &str = "X-Maemo-Service";
pub const MAEMO_METHOD_KEY: &str = "X-Maemo-Method";
pub const MAEMO_OBJECT_PATH_KEY: &str = "X-Maemo-Object-Path";
pub const MAEMO_FIXED_ARGS_KEY: &str = "X-Maemo-Fixed-Args";
pub const APPLICATION_TYPE_KEY: &str = "X-Nemo-Application-Type";
pub const SINGLE_INSTANCE_KEY: &str = "X-Nemo-Single-Instance";

pub const OSSO_METHOD: &str = "mime_open";
pub const DUI_INTERFACE: &str = "com.nokia.DuiApplicationIf";
pub const DUI_METHOD: &str = "launch";
pub const DUI_OBJECT_PATH: &str = "/org/maemo/dui";

/// Supervisor type used when the entry does not declare one
pub const GENERIC_APP_TYPE: &str = "generic";
/// Application type that bypasses the supervisor
pub const NO_INVOKER_APP_TYPE: &str = "no-invoker";

/// Classify `entry` for the given parameters.
///
/// `Err` means the entry is malformed and the application should be dropped
/// from candidate lists. `Ok(Invocation::Invalid)` means the application
/// exists but can not be invoked.
pub fn classify(
    entry: &DesktopEntry,
    params: &[String],
    settings: &Settings,
) -> InvocationResult<Invocation> {
    if !is_allowed(entry.path(), settings.allowed_entry_dirs.as_slice()) {
        warn!(
            "Desktop entry {} is outside the allowed directories",
            entry.path().display()
        );
        return Ok(Invocation::Invalid);
    }

    if wants_activation(entry) {
        return Ok(activation(entry, params));
    }

    let osso_service = entry.get_nonempty(OSSO_SERVICE_KEY);
    let maemo_service = entry.get_nonempty(MAEMO_SERVICE_KEY);
    let maemo_method = entry.get_nonempty(MAEMO_METHOD_KEY);

    if let (Some(service), None) = (osso_service, maemo_method) {
        return Ok(Invocation::BusMethodCall(BusMethodCall {
            bus_name: service.to_string(),
            object_path: format!("/{}", service.replace('.', "/")),
            interface: service.to_string(),
            method: OSSO_METHOD.to_string(),
            fixed_args: Vec::new(),
            vararg: true,
        }));
    }

    if let Some(service) = maemo_service {
        return maemo_call(entry, service, maemo_method).map(Invocation::BusMethodCall);
    }

    if let Some(value) = maemo_method {
        let (interface, method) = parse_method(entry, value)?;
        return Ok(Invocation::ServiceFrameworkCall(ServiceFrameworkCall {
            interface: interface.to_string(),
            method: method.to_string(),
        }));
    }

    if entry.exec().is_some() {
        return Ok(exec_command(entry, params, settings));
    }

    debug!("{} declares no invocation method", entry.id());
    Ok(Invocation::Invalid)
}

/// Whether `path` lies inside one of `allowed`. An empty list allows all.
///
/// Paths with `..` components are always rejected. When the entry file
/// exists, symlinks are resolved on both sides before comparing.
pub fn is_allowed(path: &Path, allowed: &[impl AsRef<Path>]) -> bool {
    if allowed.is_empty() {
        return true;
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return false;
    }

    let resolved = fs::canonicalize(path).ok();
    allowed.iter().any(|dir| {
        let dir = dir.as_ref();
        match &resolved {
            Some(real) => {
                let real_dir = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
                real.starts_with(real_dir)
            }
            None => path.starts_with(dir),
        }
    })
}

fn wants_activation(entry: &DesktopEntry) -> bool {
    entry.has_section(SAILJAIL_SECTION) || entry.get_bool(DBUS_ACTIVATABLE_KEY)
}

/// Bus name for an activatable entry.
///
/// A file name like `org.example.Viewer.desktop` is used as is. Otherwise
/// the sandbox section's organization and application names are joined.
pub fn activation_bus_name(entry: &DesktopEntry) -> Option<String> {
    let id = entry.id();
    let is_desktop_file = entry
        .path()
        .to_str()
        .is_some_and(|path| path.ends_with(DESKTOP_SUFFIX));
    if is_desktop_file && id.matches('.').count() >= 2 {
        return Some(id.to_string());
    }

    let organization = entry
        .get_in(SAILJAIL_SECTION, ORGANIZATION_NAME_KEY)
        .filter(|org| org.contains('.'))?;
    let application = entry
        .get_in(SAILJAIL_SECTION, APPLICATION_NAME_KEY)
        .filter(|app| !app.is_empty())?;
    Some(format!("{}.{}", organization, application))
}

fn activation(entry: &DesktopEntry, params: &[String]) -> Invocation {
    match activation_bus_name(entry) {
        Some(bus_name) => Invocation::BusActivation(BusActivation {
            object_path: bus_name_to_object_path(&bus_name),
            bus_name,
            method: ActivationMethod::for_params(params),
        }),
        None => {
            warn!(
                "Cannot derive a bus name for activatable entry {}",
                entry.path().display()
            );
            Invocation::Invalid
        }
    }
}

fn parse_method<'a>(entry: &DesktopEntry, value: &'a str) -> InvocationResult<(&'a str, &'a str)> {
    split_interface_method(value).ok_or_else(|| {
        warn!("Invalid {} '{}' in {}", MAEMO_METHOD_KEY, value, entry.id());
        InvocationError::InvalidMethod {
            entry: entry.id().to_string(),
            value: value.to_string(),
        }
    })
}

fn maemo_call(
    entry: &DesktopEntry,
    service: &str,
    method: Option<&str>,
) -> InvocationResult<BusMethodCall> {
    let fixed_args = entry.get_list(MAEMO_FIXED_ARGS_KEY);

    let (object_path, interface, method) = match method {
        Some(value) => {
            let (interface, method) = parse_method(entry, value)?;
            let path = entry.get_nonempty(MAEMO_OBJECT_PATH_KEY).unwrap_or("/");
            (path.to_string(), interface.to_string(), method.to_string())
        }
        None => (
            DUI_OBJECT_PATH.to_string(),
            DUI_INTERFACE.to_string(),
            DUI_METHOD.to_string(),
        ),
    };

    Ok(BusMethodCall {
        bus_name: service.to_string(),
        object_path,
        interface,
        method,
        fixed_args,
        vararg: false,
    })
}

fn exec_command(entry: &DesktopEntry, params: &[String], settings: &Settings) -> Invocation {
    let Some(expanded) = expand_exec(entry, params) else {
        warn!("Malformed Exec line in {}", entry.path().display());
        return Invocation::Invalid;
    };
    if expanded.is_empty() {
        return Invocation::Invalid;
    }

    let app_type = entry
        .get_nonempty(APPLICATION_TYPE_KEY)
        .unwrap_or(GENERIC_APP_TYPE)
        .to_string();
    let single_instance = !matches!(
        entry.get(SINGLE_INSTANCE_KEY).map(str::to_ascii_lowercase).as_deref(),
        Some("no") | Some("false") | Some("0")
    );
    let terminal = entry.terminal();

    let mut argv = Vec::new();
    let supervised = settings.supervisor.as_deref().filter(|supervisor| {
        app_type != NO_INVOKER_APP_TYPE && expanded.first().map(String::as_str) != Some(*supervisor)
    });
    if let Some(supervisor) = supervised {
        argv.push(supervisor.to_string());
        argv.push(format!("--type={}", app_type));
        if single_instance {
            argv.push("--single-instance".to_string());
        }
    }
    if terminal {
        argv.extend(settings.terminal_command.iter().cloned());
    }
    argv.extend(expanded);

    Invocation::Exec(ExecCommand {
        argv,
        app_type,
        single_instance,
        terminal,
    })
}
