use std::fs;

use busbar_sf_fetch::{run_export, ExportRequest, FolderType, QueryElement};

use crate::fake::{sobject, FakeOrg, PACKAGE_XML};

fn request(root: &std::path::Path) -> ExportRequest {
    ExportRequest {
        root: root.to_path_buf(),
        ..ExportRequest::default()
    }
}

fn types_of(query: &[QueryElement]) -> Vec<String> {
    query.iter().flat_map(|e| e.types.clone()).collect()
}

#[tokio::test]
async fn test_export_writes_every_retrieved_file() {
    let dir = tempfile::tempdir().unwrap();
    let org = FakeOrg::new().with_files(&[
        ("package.xml", PACKAGE_XML),
        ("classes/Foo.cls", b"public class Foo {}"),
        ("objects/Account.object", b"<CustomObject/>"),
    ]);

    let outcome = run_export(&org, &request(dir.path())).await.unwrap();

    assert_eq!(outcome.written.len(), 3);
    assert_eq!(
        fs::read(dir.path().join("classes/Foo.cls")).unwrap(),
        b"public class Foo {}"
    );
    assert!(dir.path().join("package.xml").is_file());
    assert_eq!(org.calls_to("retrieve"), 1);
}

#[tokio::test]
async fn test_export_custom_object_lists_standard_objects() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new().with_files(&[("classes/Foo.cls", b"")]);
    org.sobjects = vec![
        sobject("Account", false),
        sobject("Book__c", true),
        sobject("Account__History", false),
        sobject("Contact", false),
    ];

    run_export(&org, &request(dir.path())).await.unwrap();

    let query = org.last_query();
    let custom_object = query
        .iter()
        .find(|e| e.types == ["CustomObject"])
        .expect("CustomObject element");
    assert_eq!(custom_object.members, ["*", "Account", "Contact"]);
    assert!(query.contains(&QueryElement::wildcard("ApexClass")));
}

#[tokio::test]
async fn test_export_honors_exclusions() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new().with_files(&[("classes/Foo.cls", b"")]);
    org.folders.insert(FolderType::Report, vec!["Sales".to_string()]);

    let request = ExportRequest {
        exclude: vec![
            "ApexClass".to_string(),
            " CustomObject ".to_string(),
            "Report".to_string(),
        ],
        ..request(dir.path())
    };
    run_export(&org, &request).await.unwrap();

    let types = types_of(&org.last_query());
    assert!(!types.iter().any(|t| t == "ApexClass"));
    assert!(!types.iter().any(|t| t == "CustomObject"));
    assert!(!types.iter().any(|t| t == "Report"));
    assert!(types.iter().any(|t| t == "ApexTrigger"));
    assert_eq!(org.calls_to("list_sobjects"), 0);
    assert_eq!(org.calls_to("get_metadata_in_folders"), 0);
}

#[tokio::test]
async fn test_export_includes_foldered_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new().with_files(&[("classes/Foo.cls", b"")]);
    org.folders.insert(FolderType::Email, vec!["Templates".to_string()]);
    org.folders.insert(FolderType::Dashboard, vec!["Exec".to_string()]);
    org.folder_contents.insert(
        FolderType::Email,
        vec!["Templates/Welcome".to_string()],
    );

    run_export(&org, &request(dir.path())).await.unwrap();

    let query = org.last_query();
    assert!(query.contains(&QueryElement::new(
        vec!["EmailTemplate".to_string()],
        vec!["Templates".to_string(), "Templates/Welcome".to_string()],
    )));
    assert!(query.contains(&QueryElement::new(
        vec!["Dashboard".to_string()],
        vec!["Exec".to_string()],
    )));
    assert!(!types_of(&query).iter().any(|t| t == "Report"));
    assert_eq!(org.calls_to("get_all_folders"), 1);
    assert_eq!(org.calls_to("get_metadata_in_folders"), 2);
}

#[tokio::test]
async fn test_export_keeps_existing_package_xml() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("package.xml"), b"mine").unwrap();
    let org = FakeOrg::new().with_files(&[
        ("package.xml", PACKAGE_XML),
        ("classes/Foo.cls", b""),
    ]);

    let outcome = run_export(&org, &request(dir.path())).await.unwrap();

    assert_eq!(outcome.written, [dir.path().join("classes/Foo.cls")]);
    assert_eq!(fs::read(dir.path().join("package.xml")).unwrap(), b"mine");
}

#[tokio::test]
async fn test_export_warnings_only_when_requested() {
    let dir = tempfile::tempdir().unwrap();
    let mut org = FakeOrg::new().with_files(&[("classes/Foo.cls", b"")]);
    org.problems = vec!["objects/Idea.object: Entity type Idea is not available".to_string()];

    let quiet = run_export(&org, &request(dir.path())).await.unwrap();
    assert!(quiet.problems.is_empty());

    let loud = ExportRequest {
        show_warnings: true,
        ..request(dir.path())
    };
    let outcome = run_export(&org, &loud).await.unwrap();
    assert_eq!(outcome.problems, org.problems);
}

#[tokio::test]
async fn test_export_folder_failure_is_reported_with_context() {
    let dir = tempfile::tempdir().unwrap();
    let org = FakeOrg {
        fail_folders: true,
        ..FakeOrg::new()
    };

    let err = run_export(&org, &request(dir.path())).await.unwrap_err();

    assert!(err.to_string().starts_with("Could not get folders"));
    assert_eq!(org.calls_to("retrieve"), 0);
}
