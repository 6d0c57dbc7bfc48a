#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;
    use std::path::Path;

    use anyhow::Result;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use zip::ZipArchive;

    use api_shim::classfile::types::{
        ACC_PRIVATE, ACC_PUBLIC, ACC_SUPER, Annotation, ClassRecord, FieldRecord, MethodRecord,
    };
    use api_shim::classfile::{parse_class, write_class};
    use api_shim::error::ExtractError;
    use api_shim::extractor::StubExtractor;
    use api_shim::resolver::ExplodedResolver;
    use api_shim::stub::transformer::{BASELINE_MAJOR_VERSION, PREVIEW_MARKER_DESCRIPTOR};
    use api_shim::utils::hash_utils;

    fn class(name: &str, access_flags: u16, super_name: &str, interfaces: &[&str]) -> ClassRecord {
        ClassRecord {
            minor_version: 0,
            major_version: 63,
            access_flags,
            name: name.to_string(),
            super_name: Some(super_name.to_string()),
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            permitted_subclasses: Vec::new(),
            signature: None,
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
        }
    }

    fn field(name: &str, access_flags: u16) -> FieldRecord {
        FieldRecord {
            access_flags,
            name: name.to_string(),
            descriptor: "I".to_string(),
            signature: None,
            constant_value: None,
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
        }
    }

    fn method(name: &str, access_flags: u16) -> MethodRecord {
        MethodRecord {
            access_flags,
            name: name.to_string(),
            descriptor: "()V".to_string(),
            signature: None,
            exceptions: Vec::new(),
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
        }
    }

    fn marker() -> Annotation {
        Annotation {
            type_descriptor: PREVIEW_MARKER_DESCRIPTOR.to_string(),
            elements: Vec::new(),
        }
    }

    fn write_fixture(module_root: &Path, record: &ClassRecord) -> Result<()> {
        let path = module_root.join(format!("{}.class", record.name));
        fs::create_dir_all(path.parent().expect("parent"))?;
        fs::write(&path, write_class(record)?)?;
        Ok(())
    }

    /// A `java.base` image holding `Foo` (public, extends `Base`,
    /// implements `Closeable`, one public and one private field, one public
    /// method), `Base` (public), and `Hidden` (package-private).
    fn populate_base_module(root: &Path) -> Result<()> {
        let module_root = root.join("java.base");

        let mut foo = class(
            "java/lang/foreign/Foo",
            ACC_PUBLIC | ACC_SUPER,
            "java/lang/foreign/Base",
            &["java/io/Closeable"],
        );
        foo.fields = vec![field("x", ACC_PUBLIC), field("y", ACC_PRIVATE)];
        foo.methods = vec![method("m", ACC_PUBLIC)];
        foo.invisible_annotations = vec![
            marker(),
            Annotation {
                type_descriptor: "Ljdk/internal/ValueBased;".to_string(),
                elements: Vec::new(),
            },
        ];
        write_fixture(&module_root, &foo)?;

        let base = class(
            "java/lang/foreign/Base",
            ACC_PUBLIC | ACC_SUPER,
            "java/lang/Object",
            &[],
        );
        write_fixture(&module_root, &base)?;

        let hidden = class(
            "java/lang/foreign/Hidden",
            ACC_SUPER,
            "java/lang/Object",
            &[],
        );
        write_fixture(&module_root, &hidden)?;

        Ok(())
    }

    fn archive_names(path: &Path) -> Result<Vec<String>> {
        let mut archive = ZipArchive::new(fs::File::open(path)?)?;
        let mut names = Vec::new();
        for index in 0..archive.len() {
            names.push(archive.by_index(index)?.name().to_string());
        }
        Ok(names)
    }

    fn archive_entry(path: &Path, name: &str) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(fs::File::open(path)?)?;
        let mut entry = archive.by_name(name)?;
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    #[test]
    fn extracts_visible_stubs_end_to_end() -> Result<()> {
        let dir = tempdir()?;
        populate_base_module(dir.path())?;
        let output = dir.path().join("out").join("api.zip");

        let extractor = StubExtractor::new(ExplodedResolver::new(dir.path()));
        let stats = extractor.run(19, 19, &output)?;

        assert_eq!(stats.modules_processed, 1);
        assert_eq!(stats.candidate_files, 3);
        assert_eq!(stats.parsed_classes, 3);
        assert_eq!(stats.visible_classes, 2);
        assert_eq!(stats.stubs_written, 2);

        // Hidden is not visible and never referenced as a supertype;
        // Closeable and Object are referenced but were never scanned.
        let names = archive_names(&output)?;
        assert_eq!(
            names,
            [
                "java/lang/foreign/Base.class",
                "java/lang/foreign/Foo.class",
            ]
        );

        let foo = parse_class(&archive_entry(&output, "java/lang/foreign/Foo.class")?)?;
        assert_eq!(foo.major_version, BASELINE_MAJOR_VERSION);
        assert_eq!(foo.super_name.as_deref(), Some("java/lang/foreign/Base"));
        assert_eq!(foo.interfaces, vec!["java/io/Closeable".to_string()]);

        let field_names: Vec<&str> = foo.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(field_names, ["x"]);
        let method_names: Vec<&str> = foo.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(method_names, ["m"]);

        let annotations: Vec<&str> = foo
            .invisible_annotations
            .iter()
            .map(|a| a.type_descriptor.as_str())
            .collect();
        assert_eq!(annotations, ["Ljdk/internal/ValueBased;"]);

        Ok(())
    }

    #[test]
    fn archive_entries_carry_the_fixed_timestamp() -> Result<()> {
        let dir = tempdir()?;
        populate_base_module(dir.path())?;
        let output = dir.path().join("api.zip");

        let extractor = StubExtractor::new(ExplodedResolver::new(dir.path()));
        extractor.run(19, 19, &output)?;

        let mut archive = ZipArchive::new(fs::File::open(&output)?)?;
        for index in 0..archive.len() {
            let entry = archive.by_index(index)?;
            let modified = entry.last_modified();
            assert_eq!(
                (modified.year(), modified.month(), modified.day()),
                (2022, 1, 1)
            );
        }
        Ok(())
    }

    #[test]
    fn repeated_runs_produce_byte_identical_archives() -> Result<()> {
        let dir = tempdir()?;
        populate_base_module(dir.path())?;
        let first = dir.path().join("first.zip");
        let second = dir.path().join("second.zip");

        let extractor = StubExtractor::new(ExplodedResolver::new(dir.path()));
        extractor.run(19, 19, &first)?;
        extractor.run(19, 19, &second)?;

        assert_eq!(hash_utils::hash_file(&first)?, hash_utils::hash_file(&second)?);
        Ok(())
    }

    #[test]
    fn version_mismatch_leaves_no_output_behind() -> Result<()> {
        let dir = tempdir()?;
        populate_base_module(dir.path())?;
        let output = dir.path().join("api.zip");

        let extractor = StubExtractor::new(ExplodedResolver::new(dir.path()));
        let result = extractor.run(20, 19, &output);

        assert!(matches!(
            result,
            Err(ExtractError::VersionMismatch {
                running: 19,
                requested: 20
            })
        ));
        assert!(!output.exists());
        Ok(())
    }

    #[test]
    fn malformed_class_files_abort_the_whole_run() -> Result<()> {
        let dir = tempdir()?;
        populate_base_module(dir.path())?;
        let broken = dir
            .path()
            .join("java.base")
            .join("java/lang/foreign/Broken.class");
        fs::write(&broken, b"not a class file")?;
        let output = dir.path().join("api.zip");

        let extractor = StubExtractor::new(ExplodedResolver::new(dir.path()));
        let result = extractor.run(19, 19, &output);

        assert!(matches!(result, Err(ExtractError::Parse { .. })));
        assert!(!output.exists());
        Ok(())
    }
}
