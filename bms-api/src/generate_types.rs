//! TypeScript type generation.
//!
//! Running the test suite writes a `.ts` file for every API type into
//! `BMS_TS_OUTPUT_DIR`, or `../ts-bindings` when that is unset.

#[cfg(test)]
mod tests {
    use std::{env, path::Path};

    use ts_rs::TS;

    #[test]
    fn generate_typescript_types() {
        let output_dir_str = match env::var("BMS_TS_OUTPUT_DIR") {
            Ok(env_dir) => {
                println!("Using TypeScript output directory from BMS_TS_OUTPUT_DIR: {}", env_dir);
                env_dir
            }
            Err(_) => "../ts-bindings".to_string(),
        };
        let output_dir = Path::new(&output_dir_str);

        if !output_dir.exists() {
            std::fs::create_dir_all(output_dir).expect("Failed to create output directory");
        }

        // Remove stale definitions of renamed or deleted types
        for entry in std::fs::read_dir(output_dir).expect("Failed to read output directory") {
            let path = entry.expect("Failed to read directory entry").path();
            if path.extension().and_then(|s| s.to_str()) == Some("ts") {
                std::fs::remove_file(&path)
                    .unwrap_or_else(|e| panic!("Failed to remove {:?}: {}", path, e));
            }
        }

        unsafe {
            env::set_var("TS_RS_EXPORT_DIR", output_dir);
        }

        use crate::api::ErrorResponse;
        use crate::api::building::GrantAccessRequest;
        use crate::api::dashboard::DashboardSummary;
        use crate::api::status::HealthStatus;
        use crate::api::substance::AssignSubstanceRequest;
        use crate::models::*;
        use crate::orm::login::IdentityClaims;

        // Users and sessions
        User::export().expect("Failed to export User type");
        UserRole::export().expect("Failed to export UserRole type");
        UserInput::export().expect("Failed to export UserInput type");
        UserUpdate::export().expect("Failed to export UserUpdate type");
        IdentityClaims::export().expect("Failed to export IdentityClaims type");

        // Buildings and grants
        Building::export().expect("Failed to export Building type");
        BuildingInput::export().expect("Failed to export BuildingInput type");
        BuildingUpdate::export().expect("Failed to export BuildingUpdate type");
        BuildingAccess::export().expect("Failed to export BuildingAccess type");
        GrantAccessRequest::export().expect("Failed to export GrantAccessRequest type");

        // Deviations
        Deviation::export().expect("Failed to export Deviation type");
        DeviationStatus::export().expect("Failed to export DeviationStatus type");
        DeviationPriority::export().expect("Failed to export DeviationPriority type");
        DeviationInput::export().expect("Failed to export DeviationInput type");
        DeviationUpdate::export().expect("Failed to export DeviationUpdate type");

        // Substances
        Substance::export().expect("Failed to export Substance type");
        SubstanceInput::export().expect("Failed to export SubstanceInput type");
        SubstanceUpdate::export().expect("Failed to export SubstanceUpdate type");
        BuildingSubstance::export().expect("Failed to export BuildingSubstance type");
        AssignSubstanceRequest::export().expect("Failed to export AssignSubstanceRequest type");

        // Fire inspections
        FireInspection::export().expect("Failed to export FireInspection type");
        InspectionStatus::export().expect("Failed to export InspectionStatus type");
        Finding::export().expect("Failed to export Finding type");
        FindingSeverity::export().expect("Failed to export FindingSeverity type");
        FireInspectionInput::export().expect("Failed to export FireInspectionInput type");
        FireInspectionUpdate::export().expect("Failed to export FireInspectionUpdate type");

        // Maintenance
        MaintenanceSchedule::export().expect("Failed to export MaintenanceSchedule type");
        MaintenanceFrequency::export().expect("Failed to export MaintenanceFrequency type");
        MaintenanceScheduleInput::export().expect("Failed to export MaintenanceScheduleInput type");
        MaintenanceScheduleUpdate::export()
            .expect("Failed to export MaintenanceScheduleUpdate type");

        // Shared responses
        ErrorResponse::export().expect("Failed to export ErrorResponse type");
        DashboardSummary::export().expect("Failed to export DashboardSummary type");
        HealthStatus::export().expect("Failed to export HealthStatus type");

        println!("TypeScript types generated successfully in {:?}", output_dir);
    }
}
