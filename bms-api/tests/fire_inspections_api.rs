use rocket::http::Status;
use serde_json::json;

use bms_api::models::{FindingSeverity, FireInspection, InspectionStatus, UserRole};

mod common;
use common::{client, create_building, get_list, grant, ids, login, login_admin, login_as};

#[rocket::async_test]
async fn test_staff_record_inspections_with_findings() {
    let client = client().await;
    let (_, admin_cookie) = login_admin(&client).await;
    let building = create_building(&client, &admin_cookie, "Tower").await;
    let (inspector, inspector_cookie) =
        login_as(&client, &admin_cookie, "idp|inspector", UserRole::BuildingWorker).await;
    let (occupant, occupant_cookie) = login(&client, "idp|resident").await;
    grant(&client, &admin_cookie, inspector.id, building.id).await;
    grant(&client, &admin_cookie, occupant.id, building.id).await;

    let body = json!({
        "building_id": building.id,
        "inspection_date": "2025-03-01T09:00:00",
        "notes": "Annual inspection",
        "findings": [
            { "category": "exits", "description": "Blocked door", "severity": "high", "action_required": true }
        ]
    });

    let response = client
        .post("/api/1/FireInspections")
        .cookie(occupant_cookie.clone())
        .json(&body)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .post("/api/1/FireInspections")
        .cookie(inspector_cookie.clone())
        .json(&body)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    let inspection: FireInspection = response.into_json().await.expect("valid inspection JSON");
    assert_eq!(inspection.inspector_id, inspector.id);
    assert_eq!(inspection.status, InspectionStatus::Pending);
    assert_eq!(inspection.findings.len(), 1);
    assert_eq!(inspection.findings[0].severity, FindingSeverity::High);

    // Occupants of the building can read it.
    let url = format!("/api/1/FireInspections/{}", inspection.id);
    let response = client.get(&url).cookie(occupant_cookie.clone()).dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .put(&url)
        .cookie(inspector_cookie.clone())
        .json(&json!({ "status": "completed", "findings": [] }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let updated: FireInspection = response.into_json().await.expect("valid inspection JSON");
    assert_eq!(updated.status, InspectionStatus::Completed);
    assert!(updated.findings.is_empty());
    assert_eq!(updated.notes.as_deref(), Some("Annual inspection"));

    let response = client.delete(&url).cookie(inspector_cookie).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);
    let response = client.delete(&url).cookie(admin_cookie.clone()).dispatch().await;
    assert_eq!(response.status(), Status::NoContent);
    let response = client.delete(&url).cookie(admin_cookie).dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_building_inspections_newest_first() {
    let client = client().await;
    let (_, admin_cookie) = login_admin(&client).await;
    let building = create_building(&client, &admin_cookie, "Annex").await;

    let mut created = Vec::new();
    for date in ["2024-01-15T10:00:00", "2025-01-15T10:00:00", "2023-01-15T10:00:00"] {
        let response = client
            .post("/api/1/FireInspections")
            .cookie(admin_cookie.clone())
            .json(&json!({ "building_id": building.id, "inspection_date": date }))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Created);
        let inspection: FireInspection = response.into_json().await.expect("valid inspection JSON");
        created.push(inspection.id as i64);
    }

    let url = format!("/api/1/Buildings/{}/FireInspections", building.id);
    let listed = get_list(&client, &admin_cookie, &url).await;
    assert_eq!(ids(&listed), vec![created[1], created[0], created[2]]);
}

#[rocket::async_test]
async fn test_inspection_of_other_building_is_forbidden() {
    let client = client().await;
    let (_, admin_cookie) = login_admin(&client).await;
    let building = create_building(&client, &admin_cookie, "Remote").await;
    let (_, worker_cookie) =
        login_as(&client, &admin_cookie, "idp|roaming", UserRole::BuildingWorker).await;

    let response = client
        .post("/api/1/FireInspections")
        .cookie(worker_cookie.clone())
        .json(&json!({ "building_id": building.id, "inspection_date": "2025-03-01T09:00:00" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .post("/api/1/FireInspections")
        .cookie(admin_cookie.clone())
        .json(&json!({ "building_id": building.id, "inspection_date": "2025-03-01T09:00:00" }))
        .dispatch()
        .await;
    let inspection: FireInspection = response.into_json().await.expect("valid inspection JSON");

    let url = format!("/api/1/FireInspections/{}", inspection.id);
    let response = client.get(&url).cookie(worker_cookie).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .get("/api/1/FireInspections/9999")
        .cookie(admin_cookie)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}
