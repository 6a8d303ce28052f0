use std::sync::Arc;

use actix_web::{App, http::StatusCode, test, web};
use byteorder::{ByteOrder, LittleEndian};
use serde_json::{Value, json};

use electrode_interpol::app_state::AppState;
use electrode_interpol::config::ElectrodeConfig;
use electrode_interpol::parser_registry::ParserRegistry;
use electrode_interpol::parsers::save_mask;
use electrode_interpol::pipeline::PipelineOptions;
use electrode_interpol::routes;
use electrode_interpol::task::JobStore;
use electrode_interpol::voxel_grid::VoxelMask;

fn state(config: ElectrodeConfig) -> web::Data<AppState> {
    web::Data::new(AppState {
        parser_registry: Arc::new(ParserRegistry::new()),
        config: Arc::new(config),
        options: PipelineOptions::default(),
        job_store: Arc::new(JobStore::new()),
    })
}

#[actix_web::test]
async fn interpolate_endpoint_returns_contacts() {
    let app = test::init_service(
        App::new()
            .app_data(state(ElectrodeConfig::default()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/interpolate")
        .set_json(json!({"grid_config": "1x5", "A": [0, 0, 0], "B": [10, 0, 0]}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let xs: Vec<f64> = body["contacts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["position"][0].as_f64().unwrap())
        .collect();
    assert_eq!(xs, vec![0.0, 2.5, 5.0, 7.5, 10.0]);
}

#[actix_web::test]
async fn interpolate_endpoint_rejects_bad_shape() {
    let app = test::init_service(
        App::new()
            .app_data(state(ElectrodeConfig::default()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/interpolate")
        .set_json(json!({"grid_config": "3x3", "A": [0, 0, 0], "B": [4, 0, 0]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "invalid_shape");
}

#[actix_web::test]
async fn interpolate_endpoint_caps_contact_count() {
    let app = test::init_service(
        App::new()
            .app_data(state(ElectrodeConfig::default()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/interpolate")
        .set_json(json!({
            "grid_config": "100000x100000",
            "A": [0, 0, 0],
            "B": [4, 0, 0],
            "C": [0, 4, 0]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "invalid_shape");

    let req = test::TestRequest::post()
        .uri("/interpolate")
        .set_json(json!({"grid_config": "1 by 5", "A": [0, 0, 0], "B": [4, 0, 0]}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["kind"], "grid_config");
}

#[actix_web::test]
async fn patient_run_stores_job() {
    let dir = tempfile::tempdir().unwrap();
    let seg = dir.path().join("HUP64_unburied_electrode_seg.nii.gz");
    let identity = [
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ];
    save_mask(&seg, &VoxelMask::zeros([32, 32, 32]).unwrap(), &identity).unwrap();

    let config = ElectrodeConfig::from_json_str(&format!(
        r#"{{"DATA_DIR": "{}",
            "HUP64": {{"1": {{"grid_config": "2x2", "A": [4, 4, 4], "B": [20, 4, 4], "C": [4, 20, 4]}}}}}}"#,
        dir.path().display()
    ))
    .unwrap();
    let app = test::init_service(App::new().app_data(state(config)).configure(routes::configure)).await;

    let req = test::TestRequest::post().uri("/patients/HUP64/run").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let job_id = body["job_id"].as_str().unwrap().to_string();
    assert_eq!(body["report"]["contact_count"], 4);

    let req = test::TestRequest::get()
        .uri(&format!("/jobs/{}/contacts", job_id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get("X-Contact-Count").unwrap(), "4");
    let bytes = test::read_body(resp).await;
    let mut values = vec![0.0; 12];
    LittleEndian::read_f64_into(&bytes, &mut values);
    // (0,0) (0,1) (1,0) (1,1)
    assert_eq!(&values[3..6], &[4.0, 20.0, 4.0]);
    assert_eq!(&values[6..9], &[20.0, 4.0, 4.0]);

    let req = test::TestRequest::get()
        .uri(&format!("/performance?job_id={}", job_id))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let stages: Vec<&str> = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["stage"].as_str().unwrap())
        .collect();
    assert_eq!(stages, vec!["preprocess", "interpolate", "postprocess"]);
}

#[actix_web::test]
async fn unknown_patient_and_job_are_not_found() {
    let app = test::init_service(
        App::new()
            .app_data(state(ElectrodeConfig::default()))
            .configure(routes::configure),
    )
    .await;

    let req = test::TestRequest::post().uri("/patients/HUP99/run").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/jobs/nope/contacts").to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get().uri("/performance?job_id=nope").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["records"], json!([]));
}
