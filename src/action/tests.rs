//! Tests for actions and invocation classification

use super::*;
use crate::core::Settings;
use crate::desktop::DesktopEntry;
use parking_lot::Mutex;
use proptest::prelude::*;
use std::path::Path;
use std::sync::Arc;

/// Records every backend call instead of performing it
#[derive(Default)]
struct RecordingBackend {
    calls: Mutex<Vec<(String, Vec<String>, bool)>>,
    fail: bool,
}

impl RecordingBackend {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn record(&self, kind: &str, params: &[String], wait: bool) -> InvocationResult<()> {
        self.calls
            .lock()
            .push((kind.to_string(), params.to_vec(), wait));
        if self.fail {
            return Err(InvocationError::Bus {
                target: kind.to_string(),
                reason: "unreachable".to_string(),
            });
        }
        Ok(())
    }
}

impl InvocationBackend for RecordingBackend {
    fn exec(&self, command: &ExecCommand, wait: bool) -> InvocationResult<()> {
        self.record("exec", &command.argv, wait)
    }

    fn call_method(&self, call: &BusMethodCall, params: &[String], wait: bool) -> InvocationResult<()> {
        self.record("method", &call.arguments(params), wait)
    }

    fn activate(&self, _: &BusActivation, params: &[String], wait: bool) -> InvocationResult<()> {
        self.record("activate", params, wait)
    }

    fn call_service(&self, _: &ServiceFrameworkCall, params: &[String], wait: bool) -> InvocationResult<()> {
        self.record("service", params, wait)
    }
}

fn entry(file: &str, body: &str) -> DesktopEntry {
    DesktopEntry::parse(
        format!("/usr/share/applications/{}", file),
        &format!("[Desktop Entry]\nType=Application\nName=App\n{}", body),
    )
}

fn settings() -> Settings {
    Settings::rooted(Path::new("/nonexistent"))
        .with_supervisor(Some("/usr/bin/invoker".to_string()))
        .with_terminal_command(vec!["fingerterm".to_string(), "-e".to_string()])
        .with_allowed_entry_dirs(Vec::new())
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn classified(file: &str, body: &str, params: &[&str]) -> Invocation {
    classify(&entry(file, body), &strings(params), &settings()).unwrap()
}

// ============================================================================
// Helpers
// ============================================================================

#[test]
fn test_split_interface_method() {
    assert_eq!(
        split_interface_method("com.example.Viewer.show"),
        Some(("com.example.Viewer", "show"))
    );
    assert_eq!(split_interface_method("noDot"), None);
    assert_eq!(split_interface_method(".method"), None);
}

#[test]
fn test_bus_name_to_object_path() {
    assert_eq!(
        bus_name_to_object_path("org.example.my-app"),
        "/org/example/my_app"
    );
}

#[test]
fn test_variant_encoding() {
    assert_eq!(variant_string("it's a \\ test"), r"'it\'s a \\ test'");
    assert_eq!(variant_string_array(&[]), "@as []");
    assert_eq!(variant_string_array(&strings(&["a", "b"])), "['a', 'b']");
    assert_eq!(
        parse_string_reply("('com.example.Impl',)\n").as_deref(),
        Some("com.example.Impl")
    );
    assert_eq!(parse_string_reply("()"), None);
}

// ============================================================================
// Classification
// ============================================================================

#[test]
fn test_activation_from_file_name() {
    let invocation = classified(
        "org.example.my-viewer.desktop",
        "DBusActivatable=true\nExec=viewer %U\n",
        &["file:///tmp/a.png"],
    );
    assert_eq!(
        invocation,
        Invocation::BusActivation(BusActivation {
            bus_name: "org.example.my-viewer".to_string(),
            object_path: "/org/example/my_viewer".to_string(),
            method: ActivationMethod::Open,
        })
    );

    let invocation = classified(
        "org.example.my-viewer.desktop",
        "DBusActivatable=true\n",
        &[],
    );
    assert!(matches!(
        invocation,
        Invocation::BusActivation(BusActivation { method: ActivationMethod::Activate, .. })
    ));
}

#[test]
fn test_activation_from_sandbox_section() {
    let invocation = classified(
        "viewer.desktop",
        "Exec=viewer\n[X-Sailjail]\nOrganizationName=org.example\nApplicationName=Viewer\n",
        &[],
    );
    assert_eq!(
        invocation,
        Invocation::BusActivation(BusActivation {
            bus_name: "org.example.Viewer".to_string(),
            object_path: "/org/example/Viewer".to_string(),
            method: ActivationMethod::Activate,
        })
    );
}

#[test]
fn test_activation_without_bus_name_is_invalid() {
    let invocation = classified(
        "viewer.desktop",
        "Exec=viewer\n[X-Sailjail]\nOrganizationName=example\nApplicationName=Viewer\n",
        &[],
    );
    assert_eq!(invocation, Invocation::Invalid);
}

#[test]
fn test_osso_service_is_vararg_mime_open() {
    let invocation = classified("notes.desktop", "X-Osso-Service=com.example.notes\n", &[]);
    assert_eq!(
        invocation,
        Invocation::BusMethodCall(BusMethodCall {
            bus_name: "com.example.notes".to_string(),
            object_path: "/com/example/notes".to_string(),
            interface: "com.example.notes".to_string(),
            method: "mime_open".to_string(),
            fixed_args: Vec::new(),
            vararg: true,
        })
    );
}

#[test]
fn test_maemo_service_defaults() {
    let invocation = classified("mail.desktop", "X-Maemo-Service=com.example.mail\n", &[]);
    let Invocation::BusMethodCall(call) = invocation else {
        panic!("expected a method call");
    };
    assert_eq!(call.interface, "com.nokia.DuiApplicationIf");
    assert_eq!(call.method, "launch");
    assert_eq!(call.object_path, "/org/maemo/dui");
    assert!(!call.vararg);
}

#[test]
fn test_maemo_service_with_method_and_fixed_args() {
    let invocation = classified(
        "mail.desktop",
        "X-Maemo-Service=com.example.mail\nX-Maemo-Method=com.example.Mail.compose\n\
         X-Maemo-Object-Path=/compose\nX-Maemo-Fixed-Args=new;draft;\n",
        &[],
    );
    let Invocation::BusMethodCall(call) = invocation else {
        panic!("expected a method call");
    };
    assert_eq!(call.interface, "com.example.Mail");
    assert_eq!(call.method, "compose");
    assert_eq!(call.object_path, "/compose");
    assert_eq!(
        call.arguments(&strings(&["mailto:a@b.com"])),
        strings(&["new", "draft", "mailto:a@b.com"])
    );
}

#[test]
fn test_malformed_method_drops_entry() {
    for method in ["compose", ".compose"] {
        let result = classify(
            &entry(
                "mail.desktop",
                &format!("X-Maemo-Service=com.example.mail\nX-Maemo-Method={}\n", method),
            ),
            &[],
            &settings(),
        );
        assert!(matches!(result, Err(InvocationError::InvalidMethod { .. })));
    }
}

#[test]
fn test_method_only_is_service_framework_call() {
    let invocation = classified("share.desktop", "X-Maemo-Method=com.example.Share.share\n", &[]);
    assert_eq!(
        invocation,
        Invocation::ServiceFrameworkCall(ServiceFrameworkCall {
            interface: "com.example.Share".to_string(),
            method: "share".to_string(),
        })
    );
}

#[test]
fn test_exec_is_supervised() {
    let invocation = classified(
        "viewer.desktop",
        "Exec=viewer %f\nX-Nemo-Application-Type=silica-qt5\n",
        &["/tmp/a.png"],
    );
    let Invocation::Exec(command) = invocation else {
        panic!("expected exec");
    };
    assert_eq!(
        command.argv,
        strings(&[
            "/usr/bin/invoker",
            "--type=silica-qt5",
            "--single-instance",
            "viewer",
            "/tmp/a.png"
        ])
    );
    assert_eq!(command.app_type, "silica-qt5");
}

#[test]
fn test_exec_supervisor_exceptions() {
    let Invocation::Exec(command) = classified(
        "viewer.desktop",
        "Exec=/usr/bin/invoker --type=generic viewer\n",
        &[],
    ) else {
        panic!("expected exec");
    };
    assert_eq!(command.argv, strings(&["/usr/bin/invoker", "--type=generic", "viewer"]));

    let Invocation::Exec(command) = classified(
        "viewer.desktop",
        "Exec=viewer\nX-Nemo-Application-Type=no-invoker\n",
        &[],
    ) else {
        panic!("expected exec");
    };
    assert_eq!(command.argv, strings(&["viewer"]));

    let Invocation::Exec(command) = classified(
        "viewer.desktop",
        "Exec=viewer\nX-Nemo-Single-Instance=no\n",
        &[],
    ) else {
        panic!("expected exec");
    };
    assert!(!command.single_instance);
    assert_eq!(command.argv, strings(&["/usr/bin/invoker", "--type=generic", "viewer"]));
}

#[test]
fn test_exec_in_terminal() {
    let invocation = classify(
        &entry("top.desktop", "Exec=top\nTerminal=true\n"),
        &[],
        &settings().with_supervisor(None),
    )
    .unwrap();
    let Invocation::Exec(command) = invocation else {
        panic!("expected exec");
    };
    assert!(command.terminal);
    assert_eq!(command.argv, strings(&["fingerterm", "-e", "top"]));
}

#[test]
fn test_no_invocation_method_is_invalid() {
    assert_eq!(classified("link.desktop", "Type=Link\n", &[]), Invocation::Invalid);
}

#[test]
fn test_allow_list() {
    let allowed = settings().with_allowed_entry_dirs(vec!["/usr/share/applications".into()]);
    let denied = settings().with_allowed_entry_dirs(vec!["/opt/apps".into()]);
    let viewer = entry("viewer.desktop", "Exec=viewer\n");

    assert!(classify(&viewer, &[], &allowed).unwrap().is_valid());
    assert_eq!(classify(&viewer, &[], &denied).unwrap(), Invocation::Invalid);
}

#[test]
fn test_allow_list_rejects_parent_components() {
    let allowed = settings().with_allowed_entry_dirs(vec!["/usr/share/applications".into()]);
    let escaped = DesktopEntry::parse(
        "/usr/share/applications/../../../tmp/evil.desktop",
        "[Desktop Entry]\nType=Application\nExec=/tmp/evil %U\n",
    );

    assert!(!is_allowed(escaped.path(), allowed.allowed_entry_dirs.as_slice()));
    assert_eq!(classify(&escaped, &[], &allowed).unwrap(), Invocation::Invalid);
}

#[test]
fn test_allow_list_resolves_symlinks() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let allowed_dir = temp_dir.path().join("applications");
    let outside_dir = temp_dir.path().join("outside");
    std::fs::create_dir_all(&allowed_dir).unwrap();
    std::fs::create_dir_all(&outside_dir).unwrap();

    let real = outside_dir.join("evil.desktop");
    std::fs::write(&real, "[Desktop Entry]\nExec=evil\n").unwrap();
    let inside = allowed_dir.join("viewer.desktop");
    std::fs::write(&inside, "[Desktop Entry]\nExec=viewer\n").unwrap();

    assert!(is_allowed(&inside, &[&allowed_dir]));
    assert!(!is_allowed(&real, &[&allowed_dir]));

    #[cfg(unix)]
    {
        let link = allowed_dir.join("evil.desktop");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        assert!(!is_allowed(&link, &[&allowed_dir]));
    }
}

// ============================================================================
// Triggering
// ============================================================================

#[test]
fn test_trigger_dispatches_to_backend() {
    let backend = Arc::new(RecordingBackend::default());
    let params = strings(&["file:///tmp/a.png"]);
    let viewer = entry("org.example.Viewer.desktop", "DBusActivatable=true\n");
    let invocation = classify(&viewer, &params, &settings()).unwrap();
    let action = Action::new(viewer, params.clone(), invocation, backend.clone());

    assert!(action.is_valid());
    assert_eq!(action.name(), "org.example.Viewer");
    assert!(action.trigger());
    assert!(action.trigger_and_wait());

    let calls = backend.calls.lock();
    assert_eq!(
        *calls,
        vec![
            ("activate".to_string(), params.clone(), false),
            ("activate".to_string(), params, true),
        ]
    );
}

#[test]
fn test_trigger_failure_is_reported() {
    let backend = Arc::new(RecordingBackend::failing());
    let notes = entry("notes.desktop", "X-Osso-Service=com.example.notes\n");
    let invocation = classify(&notes, &[], &settings()).unwrap();
    let action = Action::new(notes, Vec::new(), invocation, backend.clone());

    assert!(!action.trigger());
    assert!(matches!(action.try_trigger(false), Err(InvocationError::Bus { .. })));
    assert_eq!(backend.calls.lock().len(), 2);
}

#[test]
fn test_invalid_action() {
    let action = Action::invalid();
    assert!(!action.is_valid());
    assert_eq!(action.name(), "");
    assert!(!action.trigger());
    assert!(matches!(action.try_trigger(true), Err(InvocationError::InvalidAction)));
    assert_eq!(action, Action::default());
}

#[test]
fn test_action_metadata() {
    let backend: Arc<dyn InvocationBackend> = Arc::new(RecordingBackend::default());
    let viewer = DesktopEntry::parse(
        "/usr/share/applications/viewer.desktop",
        "[Desktop Entry]\nName=Viewer\nName[fi]=Katselin\nIcon=viewer-icon\nExec=viewer\n",
    );
    let action = Action::new(viewer, strings(&["x"]), Invocation::Invalid, backend);

    assert_eq!(action.localized_name("fi"), "Katselin");
    assert_eq!(action.localized_name("sv"), "Viewer");
    assert_eq!(action.icon(), Some("viewer-icon"));
    assert_eq!(action.params(), strings(&["x"]).as_slice());
    assert!(!action.is_valid());
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Object paths only contain path-safe characters and never a hyphen
    #[test]
    fn prop_object_path_is_well_formed(name in "[a-z][a-z0-9-]{0,8}(\\.[a-z][a-z0-9-]{0,8}){1,4}") {
        let path = bus_name_to_object_path(&name);
        prop_assert!(path.starts_with('/'));
        prop_assert!(!path.contains('-'));
        prop_assert!(!path.contains('.'));
        prop_assert_eq!(path.matches('/').count(), name.matches('.').count() + 1);
    }

    /// Escaped strings always decode back through the reply parser
    #[test]
    fn prop_variant_string_round_trips(value in "[ -~]{0,20}") {
        let reply = format!("({},)", variant_string(&value));
        prop_assert_eq!(parse_string_reply(&reply), Some(value));
    }
}
