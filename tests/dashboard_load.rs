use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use httptest::matchers::{all_of, request};
use httptest::responders::{json_encoded, status_code};
use httptest::{Expectation, Server};
use serde_json::json;
use tempfile::tempdir;

use contract_map_lib::{
    group_by_location, parse_contracts, AppConfig, DashboardApp, DashboardController, DataPaths,
    DatasetSchema, FilterSelector, FlagField, HttpSource, RefreshOutcome, SchemaVersion,
};

const EXPORT: &str = "계약번호,업체명,주소,렌탈기기,연체일수,위도,경도,토너체크,비코체크\n\
C-001,\"가나상사, 본점\",서울 중구,MX-3050,120,37.5665,126.978,1,0\n\
C-002,다라물산,서울 중구,MX-2651,15,37.5665,126.978,0,1\n\
C-003,마바,부산 해운대구,MX-4071,abc,35.1631,129.1636,0,0\n\
C-004,사아,주소 미상,MX-2651,200,,,1,1\n";

fn app_config(data_base: String) -> AppConfig {
    AppConfig {
        data_base,
        schema: SchemaVersion::Viko,
        default_delay_days: 90,
        contract_file: Some("data/contract.csv".into()),
        inventory_file: "data/warehouse.csv".into(),
        date_file: "data/date.txt".into(),
        map_config_file: "config.json".into(),
        contract_lookup_url: "https://erp.example.com/contract/view".into(),
        commits_api_url: None,
        http_timeout_secs: 5,
    }
}

#[tokio::test]
async fn http_refresh_then_filter_roundtrip() {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of!(
            request::method("GET"),
            request::path("/dash/data_20240621.csv")
        ))
        .respond_with(status_code(200).body(EXPORT)),
    );
    server.expect(
        Expectation::matching(request::path("/dash/data_20240622.csv"))
            .respond_with(status_code(500)),
    );

    let source = HttpSource::new(&server.url("/dash").to_string(), Duration::from_secs(5))
        .expect("http source");
    let controller = DashboardController::new(
        Arc::new(source),
        DatasetSchema::for_version(SchemaVersion::Viko),
        DataPaths {
            contract_file: None,
            inventory_file: "data/warehouse.csv".into(),
            date_file: "data/date.txt".into(),
        },
    );

    let june_21 = NaiveDate::from_ymd_opt(2024, 6, 21).unwrap();
    let outcome = controller.refresh(Some(june_21)).await.expect("refresh");
    // four contracts plus the blank line after the final newline
    assert_eq!(outcome, RefreshOutcome::Applied { records: 5, visible: 2 });

    let plan = controller.render();
    assert_eq!(plan.markers.len(), 1);
    assert_eq!(plan.markers[0].contract_numbers, vec!["C-001"]);
    assert_eq!(plan.unmapped, vec!["C-004"]);
    assert_eq!(plan.rows[0].cells[1], "가나상사, 본점");

    let plan = controller.apply_filter(FilterSelector::Flag(FlagField::Toner));
    assert_eq!(plan.visible_count, 2);

    let plan = controller.apply_filter(FilterSelector::All);
    assert_eq!(plan.visible_count, 5);
    let shared = plan
        .markers
        .iter()
        .find(|marker| marker.contract_numbers.len() == 2)
        .expect("shared marker");
    let group = controller
        .marker_clicked(&shared.key)
        .expect("clicked group");
    assert_eq!(group.label(), "C-001, C-002");

    let plan = controller.show_selected();
    assert_eq!(plan.visible_count, 2);
    assert!(plan.rows.iter().all(|row| row.selected));

    let june_22 = NaiveDate::from_ymd_opt(2024, 6, 22).unwrap();
    let outcome = controller.refresh(Some(june_22)).await.expect("refresh");
    assert_eq!(outcome, RefreshOutcome::Failed);
    assert_eq!(controller.render().visible_count, 0);
}

#[tokio::test]
async fn app_loads_from_local_directory() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("contract.csv"), EXPORT).unwrap();
    std::fs::write(
        data.join("warehouse.csv"),
        "구분,제품명,모델,색상,재고\n토너,정품 토너,TN-3050,Black,7\n",
    )
    .unwrap();
    std::fs::write(data.join("date.txt"), "2024-06-21\n").unwrap();

    let app = DashboardApp::initialize(app_config(dir.path().display().to_string()))
        .expect("initialize");
    let snapshot = app.load(None).await.expect("load");

    assert_eq!(snapshot.refresh, RefreshOutcome::Applied { records: 5, visible: 2 });
    assert_eq!(snapshot.inventory.len(), 1);
    assert_eq!(snapshot.inventory[0].stock, "7");
    assert_eq!(snapshot.data_date.as_deref(), Some("2024-06-21"));
    assert!(snapshot.last_updated.is_none());
    assert_eq!(
        app.links().contract_lookup("C-001"),
        "https://erp.example.com/contract/view?contractNo=C-001"
    );

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["plan"]["filter_label"], "delay >= 90");
    assert_eq!(json["config"]["schema"], "viko");
}

#[tokio::test]
async fn app_reports_last_update_from_commit_history() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::path("/commits")).respond_with(json_encoded(json!([
            {"commit": {"author": {"date": "2024-06-21T00:15:00+09:00"}}}
        ]))),
    );
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/contract.csv"), EXPORT).unwrap();

    let mut config = app_config(dir.path().display().to_string());
    config.commits_api_url = Some(server.url("/commits").to_string());
    let app = DashboardApp::initialize(config).expect("initialize");
    let snapshot = app.load(None).await.expect("load");

    assert!(snapshot.inventory.is_empty());
    assert!(snapshot.data_date.is_none());
    assert_eq!(
        snapshot.last_updated.map(|ts| ts.to_rfc3339()),
        Some("2024-06-20T15:15:00+00:00".to_string())
    );
}

#[test]
fn decoded_groups_cover_every_record() {
    let records = parse_contracts(EXPORT, &DatasetSchema::for_version(SchemaVersion::Viko));
    let groups = group_by_location(&records);
    let total: usize = groups.iter().map(|group| group.len()).sum();
    assert_eq!(total, records.len());
    assert_eq!(groups[0].contract_numbers(), vec!["C-001", "C-002"]);
}
