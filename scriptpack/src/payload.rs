//! Payloads compiled into the executable.

use scriptpack_core::Catalog;

static RESOURCES: &[(&str, &[u8])] = &[
    (
        "runtime/VERSION",
        include_bytes!("../payload/runtime/VERSION"),
    ),
    (
        "runtime/modules/text.rhai",
        include_bytes!("../payload/runtime/modules/text.rhai"),
    ),
    (
        "runtime/modules/checksum.rhai",
        include_bytes!("../payload/runtime/modules/checksum.rhai"),
    ),
    (
        "script/main.rhai",
        include_bytes!("../payload/script/main.rhai"),
    ),
];

/// The catalog of everything embedded in this build.
pub fn catalog() -> Catalog {
    Catalog::from_static(RESOURCES)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptpack_core::catalog::logical_to_relative_path;
    use scriptpack_core::{RUNTIME_PREFIX, SCRIPT_RESOURCE};

    #[test]
    fn test_catalog_has_script_and_runtime() {
        let catalog = catalog();
        assert!(catalog.contains(SCRIPT_RESOURCE));
        assert!(catalog.read_to_string(SCRIPT_RESOURCE).is_ok());
        let runtime: Vec<&str> = catalog
            .list()
            .into_iter()
            .filter(|n| n.starts_with(RUNTIME_PREFIX))
            .collect();
        assert_eq!(runtime.len(), 3);
        for name in runtime {
            assert!(logical_to_relative_path(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_embedded_script_end_to_end() {
        use scriptpack_runtime::{ExitOutcome, Launcher, RhaiEngine};
        use scriptpack_core::RuntimeLayout;

        let tmp = tempfile::tempdir().unwrap();
        let layout = RuntimeLayout::from_base_dir(tmp.path().join("app"));
        let target = tmp.path().join("data.txt");
        std::fs::write(&target, "abc").unwrap();
        let missing = tmp.path().join("missing.txt");
        let catalog = catalog();
        let engine = RhaiEngine::new();
        let launcher = Launcher::new(&catalog, &engine);

        let ok = launcher.launch(&layout, &[target.to_string_lossy().into_owned()]);
        assert!(ok.outcome.is_success(), "{:?}", ok.outcome);
        assert_eq!(ok.output.len(), 1);
        assert!(ok.output[0]
            .ends_with("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"));
        assert!(layout.runtime_home().join("modules").join("text.rhai").is_file());

        let failed = launcher.launch(&layout, &[missing.to_string_lossy().into_owned()]);
        match failed.outcome {
            ExitOutcome::ScriptFailed(entries) => {
                assert_eq!(entries.len(), 1);
                assert!(entries[0].message.contains("not found"), "{}", entries[0]);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(failed.output.is_empty());
    }
}
