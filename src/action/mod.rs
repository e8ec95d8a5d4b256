//! Actions
//!
//! An [`Action`] is an application bound to parameters together with the
//! [`Invocation`] that reaches it. Classification of desktop entries into
//! invocations lives in [`classify`], side effects in [`InvocationBackend`].

#[allow(clippy::module_inception)]
mod action;
mod backend;
mod classify;
mod error;
mod invocation;
#[cfg(test)]
mod tests;

pub use action::Action;
pub use backend::{
    dispatch, parse_string_reply, variant_string, variant_string_array, InvocationBackend,
    SystemBackend, EMPTY_PLATFORM_DATA, SERVICE_MAPPER_INTERFACE, SERVICE_MAPPER_METHOD,
    SERVICE_MAPPER_NAME, SERVICE_MAPPER_PATH,
};
pub use classify::{activation_bus_name, classify, is_allowed, GENERIC_APP_TYPE};
pub use error::{InvocationError, InvocationResult};
pub use invocation::{
    bus_name_to_object_path, split_interface_method, ActivationMethod, BusActivation,
    BusMethodCall, ExecCommand, Invocation, ServiceFrameworkCall, APPLICATION_INTERFACE,
};
