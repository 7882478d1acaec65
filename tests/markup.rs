mod common;

use common::fixture;
use gdrive_catalog::{DriveMarkup, Error, Markup, NodeKind};

const ROOT_URL: &str =
    "https://drive.google.com/drive/folders/1EP6oEabyZRamveGNyzYU0u6qJ-N43Qfq?hl=en&hl=en";

#[test]
fn parses_captured_folder_page() {
    let page = DriveMarkup
        .parse_folder_page(ROOT_URL, &fixture("root_folder.html"))
        .unwrap();

    assert_eq!(page.folder.id, "1EP6oEabyZRamveGNyzYU0u6qJ-N43Qfq");
    assert_eq!(page.folder.name, "Release 2023");
    assert!(page.folder.children.is_empty());

    let listed: Vec<(&str, NodeKind)> = page
        .children
        .iter()
        .map(|child| (child.name.as_str(), child.kind))
        .collect();
    assert_eq!(
        listed,
        [
            ("SignalDoc.csv", NodeKind::File),
            ("Portfolios", NodeKind::Folder),
            ("Firm Level Characteristics", NodeKind::Folder),
            ("Données & notes \"v2\".csv", NodeKind::File),
        ]
    );
    assert_eq!(page.children[0].id, "1EReSLb0gwUNv_7m82hoPk6AUlHnud4-s");
}

#[test]
fn folder_id_ignores_trailing_slash_and_query() {
    let url = "https://drive.google.com/drive/folders/1EP6oEabyZRamveGNyzYU0u6qJ-N43Qfq/?usp=sharing&hl=en";
    let page = DriveMarkup
        .parse_folder_page(url, &fixture("root_folder.html"))
        .unwrap();
    assert_eq!(page.folder.id, "1EP6oEabyZRamveGNyzYU0u6qJ-N43Qfq");
}

#[test]
fn sign_in_page_is_unavailable() {
    let html = "<!DOCTYPE html><html><head><title>Google Drive - Sign in</title></head>\
                <body><script nonce=\"x\">window.WIZ_global_data = {'a': 'b'};</script></body></html>";
    assert!(matches!(
        DriveMarkup.parse_folder_page(ROOT_URL, html),
        Err(Error::FolderUnavailable)
    ));
}

#[test]
fn embedded_view_lists_only_csv_signals() {
    let entries = DriveMarkup
        .parse_embedded_listing(&fixture("predictors_embedded.html"))
        .unwrap();

    let names: Vec<&str> = entries.iter().map(|entry| entry.name.as_str()).collect();
    assert_eq!(names, ["AM", "AOP", "Accruals", "Mom12m"]);
    assert_eq!(entries[3].id, "1mbGMHb7iXoxLrkeb9xZ-L8B-Vl2CrGnf");
}

#[test]
fn confirmation_form_is_rebuilt_with_hidden_fields() {
    assert_eq!(
        DriveMarkup
            .parse_interstitial(&fixture("confirm_form.html"))
            .unwrap(),
        "https://drive.usercontent.google.com/download?id=1JyrCHWeyQSH4yG64LxxuS-t1FGmwef0k\
         &export=download&confirm=t&uuid=3f0c5e0b-8d1e-4b8a-9d0c-6a2f1c7e9b41"
    );
}

#[test]
fn confirmation_anchor_points_at_docs() {
    assert_eq!(
        DriveMarkup
            .parse_interstitial(&fixture("confirm_anchor.html"))
            .unwrap(),
        "https://docs.google.com/uc?export=download&confirm=Nq3k&id=1ETUr7dwJvF8TCiS3hBDEqlrG36pvhKME"
    );
}

#[test]
fn confirmation_json_is_unescaped() {
    assert_eq!(
        DriveMarkup
            .parse_interstitial(&fixture("confirm_json.html"))
            .unwrap(),
        "https://doc-0s-bk-docs.googleusercontent.com/docs/securesc/ha0ro937gcuc7l7deffksulhg5h7mbp1/\
         q2t0ff0gn4dv3rdbf6i0n0llu5a0a2ee/1693526400000/0/*/1KxkLQi8Wq0NhAbZq2JvP4SDzRf6cx-Tc\
         ?e=download&uuid=7b0e5d55"
    );
}

#[test]
fn quota_page_reports_caption() {
    match DriveMarkup.parse_interstitial(&fixture("confirm_error.html")) {
        Err(Error::AccessDenied(caption)) => assert_eq!(
            caption,
            "Too many users have viewed or downloaded this file recently. \
             Please try accessing the file again later."
        ),
        other => panic!("unexpected result: {other:?}"),
    }
}
