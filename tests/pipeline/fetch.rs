use std::fs;
use std::path::Path;

use busbar_sf_fetch::aura::{manifest_path, BundleManifest};
use busbar_sf_fetch::{run_fetch, ErrorKind, FetchRequest, FolderType, QueryElement, Retrieval};

use crate::fake::{bundle, definition, sobject, zip_of, FakeOrg, PACKAGE_XML, ZIP_DESCRIPTOR};

fn request(root: &Path, types: &[&str]) -> FetchRequest {
    FetchRequest {
        root: root.to_path_buf(),
        types: types.iter().map(|t| t.to_string()).collect(),
        ..FetchRequest::default()
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_fetch_single_type_is_a_wildcard() {
    let dir = tempfile::tempdir().unwrap();
    let org = FakeOrg::new().with_files(&[
        ("package.xml", PACKAGE_XML),
        ("classes/Foo.cls", b"public class Foo {}"),
    ]);

    let outcome = run_fetch(&org, &request(dir.path(), &["ApexClass"])).await.unwrap();

    assert_eq!(org.last_query(), [QueryElement::wildcard("ApexClass")]);
    assert_eq!(org.calls_to("get_all_folders"), 0);
    assert_eq!(outcome.written.len(), 2);
    assert!(dir.path().join("classes/Foo.cls").is_file());
}

#[tokio::test]
async fn test_fetch_named_members() {
    let dir = tempfile::tempdir().unwrap();
    let org = FakeOrg::new().with_files(&[("objects/Book__c.object", b"<CustomObject/>")]);
    let request = FetchRequest {
        names: strings(&["Book__c", "Author__c"]),
        ..request(dir.path(), &["CustomObject"])
    };

    run_fetch(&org, &request).await.unwrap();

    assert_eq!(
        org.last_query(),
        [QueryElement::new(
            strings(&["CustomObject"]),
            strings(&["Book__c", "Author__c"])
        )]
    );
    assert_eq!(org.calls_to("list_sobjects"), 0);
}

#[tokio::test]
async fn test_fetch_custom_object_includes_standard_objects() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new().with_files(&[("objects/Account.object", b"")]);
    org.sobjects = vec![sobject("Account", false), sobject("Book__c", true)];

    run_fetch(&org, &request(dir.path(), &["CustomObject"])).await.unwrap();

    assert_eq!(
        org.last_query(),
        [QueryElement::new(
            strings(&["CustomObject"]),
            strings(&["*", "Account"])
        )]
    );
}

#[tokio::test]
async fn test_fetch_foldered_types_share_one_folder_lookup() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new().with_files(&[("email/Templates/Welcome.email", b"Hi")]);
    org.folders.insert(FolderType::Email, strings(&["Templates"]));
    org.folders.insert(FolderType::Report, strings(&["Sales"]));
    org.folder_contents
        .insert(FolderType::Email, strings(&["Templates/Welcome"]));
    org.folder_contents
        .insert(FolderType::Report, strings(&["Sales/Pipeline"]));

    run_fetch(&org, &request(dir.path(), &["EmailTemplate", "Report", "ApexPage"]))
        .await
        .unwrap();

    assert_eq!(
        org.last_query(),
        [
            QueryElement::new(
                strings(&["EmailTemplate"]),
                strings(&["Templates", "Templates/Welcome"])
            ),
            QueryElement::new(strings(&["Report"]), strings(&["Sales", "Sales/Pipeline"])),
            QueryElement::wildcard("ApexPage"),
        ]
    );
    assert_eq!(org.calls_to("get_all_folders"), 1);
    assert_eq!(org.calls_to("get_metadata_in_folders"), 2);
}

#[tokio::test]
async fn test_fetch_usage_errors_precede_remote_calls() {
    let dir = tempfile::tempdir().unwrap();
    let org = FakeOrg::new();

    let too_many = FetchRequest {
        names: strings(&["A", "B"]),
        ..request(dir.path(), &["ApexClass", "ApexPage"])
    };
    for bad in [request(dir.path(), &[]), too_many, request(dir.path(), &["package"])] {
        let err = run_fetch(&org, &bad).await.unwrap_err();
        assert!(err.is_usage(), "{err}");
    }
    assert!(org.calls.borrow().is_empty());
}

#[tokio::test]
async fn test_fetch_lone_package_xml_is_no_match() {
    let dir = tempfile::tempdir().unwrap();
    let org = FakeOrg::new().with_files(&[("package.xml", PACKAGE_XML)]);

    let err = run_fetch(&org, &request(dir.path(), &["ApexClas"]))
        .await
        .unwrap_err();

    assert!(matches!(&err.kind, ErrorKind::NoMatch { types } if types == "ApexClas"));
    assert_eq!(
        err.to_string(),
        "Could not find any objects for ApexClas. (Is the metadata type correct?)"
    );
    assert!(!dir.path().join("package.xml").exists());
}

#[tokio::test]
async fn test_fetch_by_package_xml() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("wanted.xml");
    fs::write(&manifest, PACKAGE_XML).unwrap();
    let org = FakeOrg::new().with_files(&[("classes/Foo.cls", b"")]);
    let request = FetchRequest {
        package_xml: Some(manifest.clone()),
        ..request(&dir.path().join("src"), &[])
    };

    run_fetch(&org, &request).await.unwrap();

    assert_eq!(*org.package_xml_paths.borrow(), [manifest]);
    assert_eq!(org.calls_to("retrieve"), 0);
    assert!(dir.path().join("src/classes/Foo.cls").is_file());
}

#[tokio::test]
async fn test_fetch_empty_package_xml_names_the_manifest() {
    let dir = tempfile::tempdir().unwrap();
    let manifest = dir.path().join("wanted.xml");
    let org = FakeOrg::new().with_files(&[("package.xml", PACKAGE_XML)]);
    let request = FetchRequest {
        package_xml: Some(manifest.clone()),
        ..request(dir.path(), &[])
    };

    let err = run_fetch(&org, &request).await.unwrap_err();

    assert!(err.to_string().contains(&manifest.display().to_string()));
}

#[tokio::test]
async fn test_fetch_aura_by_name() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new();
    org.aura.bundles = vec![bundle("0Ab1", "MyCmp"), bundle("0Ab2", "Other")];
    org.aura.definitions = vec![
        definition("0Ad1", "0Ab1", "COMPONENT", "<aura:component/>"),
        definition("0Ad2", "0Ab1", "CONTROLLER", "({})"),
        definition("0Ad3", "0Ab2", "COMPONENT", "<aura:component/>"),
    ];
    let request = FetchRequest {
        names: strings(&["MyCmp"]),
        ..request(dir.path(), &["Aura"])
    };

    let outcome = run_fetch(&org, &request).await.unwrap();

    let bundle_dir = dir.path().join("aura/MyCmp");
    assert_eq!(
        fs::read_to_string(bundle_dir.join("MyCmp.cmp")).unwrap(),
        "<aura:component/>"
    );
    assert_eq!(
        fs::read_to_string(bundle_dir.join("MyCmpController.js")).unwrap(),
        "({})"
    );
    assert!(!dir.path().join("aura/Other").exists());

    let manifest: BundleManifest =
        serde_json::from_slice(&fs::read(manifest_path(dir.path(), "MyCmp")).unwrap()).unwrap();
    assert_eq!(manifest, outcome.bundles[0]);
    assert_eq!(manifest.id, "0Ab1");
    assert_eq!(manifest.files.len(), 2);
    assert_eq!(org.calls_to("retrieve"), 0);
}

#[tokio::test]
async fn test_fetch_all_aura_bundles() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new();
    org.aura.bundles = vec![bundle("0Ab1", "MyCmp"), bundle("0Ab2", "Other")];
    org.aura.definitions = vec![definition("0Ad3", "0Ab2", "STYLE", ".THIS {}")];

    let outcome = run_fetch(&org, &request(dir.path(), &["aura"])).await.unwrap();

    assert_eq!(outcome.bundles.len(), 2);
    assert_eq!(org.calls_to("get_aura_bundles"), 1);
    assert!(dir.path().join("aura/Other/OtherStyle.css").is_file());
    assert!(manifest_path(dir.path(), "MyCmp").is_file());
}

#[tokio::test]
async fn test_fetch_package_preserves_archive() {
    let dir = tempfile::tempdir().unwrap();
    let archive = zip_of(&[("MyPkg/classes/Foo.cls", b"")]);
    let mut org = FakeOrg::new();
    org.packages.insert(
        "MyPkg".to_string(),
        Retrieval {
            files: [("MyPkg/classes/Foo.cls".to_string(), Vec::new())].into(),
            problems: Vec::new(),
            archive: archive.clone(),
        },
    );
    let request = FetchRequest {
        names: strings(&["MyPkg"]),
        preserve: true,
        ..request(dir.path(), &["package"])
    };

    run_fetch(&org, &request).await.unwrap();

    assert_eq!(fs::read(dir.path().join("MyPkg.zip")).unwrap(), archive);
    assert!(dir.path().join("MyPkg/classes/Foo.cls").is_file());
}

#[tokio::test]
async fn test_fetch_package_without_preserve_leaves_no_zip() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new();
    org.packages.insert(
        "MyPkg".to_string(),
        Retrieval {
            files: [("MyPkg/classes/Foo.cls".to_string(), Vec::new())].into(),
            ..Retrieval::default()
        },
    );
    let request = FetchRequest {
        names: strings(&["MyPkg"]),
        ..request(dir.path(), &["Package"])
    };

    run_fetch(&org, &request).await.unwrap();

    assert!(!dir.path().join("MyPkg.zip").exists());
}

#[tokio::test]
async fn test_fetch_unpacks_zipped_static_resources() {
    let dir = tempfile::tempdir().unwrap();
    let lib = zip_of(&[("js/app.js", b"console.log(1)"), ("__MACOSX/._app.js", b"")]);
    let org = FakeOrg::new().with_files(&[
        ("staticresources/lib.resource", &lib),
        ("staticresources/lib.resource-meta.xml", ZIP_DESCRIPTOR),
    ]);
    let request = FetchRequest {
        unpack: true,
        ..request(dir.path(), &["StaticResource"])
    };

    let outcome = run_fetch(&org, &request).await.unwrap();

    let extracted = dir.path().join("staticresources/lib/js/app.js");
    assert_eq!(outcome.expanded, [extracted.clone()]);
    assert_eq!(fs::read(extracted).unwrap(), b"console.log(1)");
    assert!(dir.path().join("staticresources/lib.resource").is_file());
}

#[tokio::test]
async fn test_fetch_without_unpack_leaves_resources_zipped() {
    let dir = tempfile::tempdir().unwrap();
    let lib = zip_of(&[("js/app.js", b"console.log(1)")]);
    let org = FakeOrg::new().with_files(&[
        ("staticresources/lib.resource", &lib),
        ("staticresources/lib.resource-meta.xml", ZIP_DESCRIPTOR),
    ]);

    let outcome = run_fetch(&org, &request(dir.path(), &["StaticResource"]))
        .await
        .unwrap();

    assert!(outcome.expanded.is_empty());
    assert!(!dir.path().join("staticresources/lib").exists());
}

#[tokio::test]
async fn test_fetch_warnings_only_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new().with_files(&[("classes/Foo.cls", b"")]);
    org.problems = vec!["classes/Bar.cls: Bar cannot be retrieved".to_string()];

    let quiet = run_fetch(&org, &request(dir.path(), &["ApexClass"])).await.unwrap();
    assert!(quiet.problems.is_empty());

    let loud = FetchRequest {
        show_warnings: true,
        ..request(dir.path(), &["ApexClass"])
    };
    assert_eq!(run_fetch(&org, &loud).await.unwrap().problems, org.problems);
}
