use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use itdashboard_lib::{ExportConfig, Exporter};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TILES_PATH: &str = "/api/v1/ITDB2/visualization/govwide/agencyTiles";
const INVESTMENTS_007: &str = "/api/v1/ITDB2/visualization/agency/investmentsTable/agencyCode/007";
const INVESTMENTS_012: &str = "/api/v1/ITDB2/visualization/agency/investmentsTable/agencyCode/012";

fn agencies_body() -> String {
    r#"{"result": [
        {"agencyCode": "007", "agencyName": "Department Of Veterans Affairs", "totalSpending": 4441.57},
        {"agencyCode": "012", "agencyName": "Department of Agriculture", "totalSpending": 1915.74}
    ]}"#
    .to_string()
}

fn investments_body() -> String {
    r#"{"result": [
        {"agencyCode": "007", "UII": "007-000000001", "businessCaseId": null, "numberOfProjects": 2, "investmentTitle": "Legacy Payroll"},
        {"agencyCode": "007", "UII": "007-000000002", "businessCaseId": 99, "numberOfProjects": 0, "investmentTitle": "Claims Portal"}
    ]}"#
    .to_string()
}

fn qualifying_investments_body() -> String {
    r#"{"result": [
        {"agencyCode": "007", "UII": "007-000000003", "businessCaseId": 42, "numberOfProjects": 3, "investmentTitle": "Claims Modernization"}
    ]}"#
    .to_string()
}

/// Assembles a minimal single-page PDF whose page renders `line`, with a
/// correct xref table so the extractor can open it.
fn minimal_pdf(line: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", line);
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R \
         /Resources << /Font << /F1 5 0 R >> >> >>"
            .to_string(),
        format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            stream.len(),
            stream
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
    }
    let startxref = pdf.len();
    pdf.push_str(&format!(
        "xref\n0 {}\n0000000000 65535 f \n",
        objects.len() + 1
    ));
    for offset in offsets {
        pdf.push_str(&format!("{:010} 00000 n \n", offset));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        startxref
    ));
    pdf.into_bytes()
}

async fn mount_bootstrap(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .mount(server)
        .await;
}

fn config_for(folder: &Path) -> ExportConfig {
    ExportConfig {
        output_folder: folder.to_path_buf(),
        delay: Duration::ZERO,
        ..ExportConfig::default()
    }
}

fn exporter_for(server: &MockServer, config: ExportConfig) -> Exporter {
    let base = format!("{}/api/v1/ITDB2", server.uri());
    Exporter::with_base_urls(&base, &server.uri(), config)
}

#[tokio::test]
async fn export_writes_workbook_and_cache_files() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_bootstrap(&server).await;

    Mock::given(method("GET"))
        .and(path(TILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(agencies_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_007))
        .respond_with(ResponseTemplate::new(200).set_body_string(investments_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_012))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result": []}"#))
        .mount(&server)
        .await;

    let config = config_for(dir.path());
    let exporter = exporter_for(&server, config);
    let workbook = exporter.run().await.unwrap();

    assert!(workbook.ends_with("itdashboard_gov.xlsx"));
    assert!(workbook.is_file());
    assert!(dir
        .path()
        .join("json/ITDB2_visualization_govwide_agencyTiles.json")
        .is_file());
    assert!(dir
        .path()
        .join("json/agency_investmentsTable_agencyCode_007.json")
        .is_file());
}

#[tokio::test]
async fn allow_list_skips_excluded_agency_fetches() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_bootstrap(&server).await;

    Mock::given(method("GET"))
        .and(path(TILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(agencies_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_007))
        .respond_with(ResponseTemplate::new(200).set_body_string(investments_body()))
        .expect(1)
        .mount(&server)
        .await;
    // Agency 012 is in the summary but outside the allow-list: its
    // investments endpoint must never be hit.
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_012))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"result": []}"#))
        .expect(0)
        .mount(&server)
        .await;

    let config = ExportConfig {
        agency_codes: vec!["007".to_string()],
        ..config_for(dir.path())
    };
    let exporter = exporter_for(&server, config);
    exporter.run().await.unwrap();
}

#[tokio::test]
async fn second_run_is_served_from_cache() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_bootstrap(&server).await;

    // One network fetch per resource across both runs; the engine's second
    // agency-list read within each run is also a cache hit.
    Mock::given(method("GET"))
        .and(path(TILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(agencies_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_007))
        .respond_with(ResponseTemplate::new(200).set_body_string(investments_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = ExportConfig {
        agency_codes: vec!["007".to_string()],
        ..config_for(dir.path())
    };
    for _ in 0..2 {
        let exporter = exporter_for(&server, config.clone());
        exporter.run().await.unwrap();
    }
}

#[tokio::test]
async fn force_reload_refetches_every_read() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_bootstrap(&server).await;

    // With reload on, both observable agency-list reads hit the network.
    Mock::given(method("GET"))
        .and(path(TILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(agencies_body()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_007))
        .respond_with(ResponseTemplate::new(200).set_body_string(investments_body()))
        .expect(1)
        .mount(&server)
        .await;

    let config = ExportConfig {
        reload_files: true,
        agency_codes: vec!["007".to_string()],
        ..config_for(dir.path())
    };
    let exporter = exporter_for(&server, config);
    exporter.run().await.unwrap();
}

#[tokio::test]
async fn server_error_aborts_before_workbook_is_written() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_bootstrap(&server).await;

    Mock::given(method("GET"))
        .and(path(TILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(agencies_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_007))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&server)
        .await;

    let config = ExportConfig {
        agency_codes: vec!["007".to_string()],
        ..config_for(dir.path())
    };
    let exporter = exporter_for(&server, config);
    assert!(exporter.run().await.is_err());
    assert!(!dir.path().join("itdashboard_gov.xlsx").exists());
}

#[tokio::test]
async fn qualifying_investment_is_enriched_from_its_pdf() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_bootstrap(&server).await;

    Mock::given(method("GET"))
        .and(path(TILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(agencies_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_007))
        .respond_with(ResponseTemplate::new(200).set_body_string(qualifying_investments_body()))
        .mount(&server)
        .await;
    // Both gating fields are truthy, so the business-case PDF must be
    // fetched exactly once and scanned for the configured label.
    Mock::given(method("GET"))
        .and(path(
            "/api/v1/ITDB2/businesscase/pdf/generate/uii/007-000000003",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(minimal_pdf(
            "1. Name of this Investment: Claims Modernization",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let config = ExportConfig {
        agency_codes: vec!["007".to_string()],
        pdf_fields: BTreeMap::from([(
            "1. Name of this Investment".to_string(),
            "PDF Investment".to_string(),
        )]),
        ..config_for(dir.path())
    };
    let exporter = exporter_for(&server, config);
    let workbook = exporter.run().await.unwrap();

    assert!(workbook.is_file());
    assert!(dir
        .path()
        .join("pdf/generate_uii_007-000000003.pdf")
        .is_file());
}

#[tokio::test]
async fn unqualified_investments_trigger_no_pdf_traffic() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_bootstrap(&server).await;

    Mock::given(method("GET"))
        .and(path(TILES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(agencies_body()))
        .mount(&server)
        .await;
    // Fixture records have businessCaseId null / numberOfProjects 0, so
    // even with a configured label map no PDF may be fetched.
    Mock::given(method("GET"))
        .and(path(INVESTMENTS_007))
        .respond_with(ResponseTemplate::new(200).set_body_string(investments_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/api/v1/ITDB2/businesscase/"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let config = ExportConfig {
        agency_codes: vec!["007".to_string()],
        pdf_fields: BTreeMap::from([(
            "1. Name of this Investment".to_string(),
            "PDF Investment".to_string(),
        )]),
        ..config_for(dir.path())
    };
    let exporter = exporter_for(&server, config);
    exporter.run().await.unwrap();
}
